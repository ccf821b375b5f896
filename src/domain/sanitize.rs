use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidateEmail;

/// ASCII control characters, CR/LF/TAB included.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("control character pattern is valid"));

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];
const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];
const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il", "hotmail.co.nz",
    "hotmail.co.th", "hotmail.co.uk", "hotmail.com", "hotmail.com.ar", "hotmail.com.au",
    "hotmail.com.br", "hotmail.com.gr", "hotmail.com.mx", "hotmail.com.pe", "hotmail.com.tr",
    "hotmail.com.vn", "hotmail.cz", "hotmail.de", "hotmail.dk", "hotmail.es", "hotmail.fr",
    "hotmail.hu", "hotmail.id", "hotmail.ie", "hotmail.in", "hotmail.it", "hotmail.jp",
    "hotmail.kr", "hotmail.lv", "hotmail.my", "hotmail.ph", "hotmail.pt", "hotmail.sa",
    "hotmail.sg", "hotmail.sk", "live.be", "live.co.uk", "live.com", "live.com.ar",
    "live.com.mx", "live.de", "live.es", "live.eu", "live.fr", "live.it", "live.nl", "msn.com",
    "outlook.at", "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.br", "outlook.com.gr",
    "outlook.com.pe", "outlook.com.tr", "outlook.com.vn", "outlook.cz", "outlook.de",
    "outlook.dk", "outlook.es", "outlook.fr", "outlook.hu", "outlook.id", "outlook.ie",
    "outlook.in", "outlook.it", "outlook.jp", "outlook.kr", "outlook.lv", "outlook.my",
    "outlook.ph", "outlook.pt", "outlook.sa", "outlook.sg", "outlook.sk", "passport.com",
];
const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de", "yahoo.fr",
    "yahoo.in", "yahoo.it", "ymail.com",
];
const YANDEX_DOMAINS: &[&str] = &[
    "yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru",
];

/// Remove every ASCII control character from `input`.
///
/// Keeps CR/LF sequences out of anything that ends up in a mail header,
/// e.g. `"Attacker\r\nBcc: x@evil.com"` becomes `"AttackerBcc: x@evil.com"`.
pub fn strip_control_chars(input: &str) -> String {
    CONTROL_CHARS.replace_all(input, "").into_owned()
}

/// Syntax check for a trimmed address: RFC 5322-like grammar and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && email.validate_email()
}

/// Canonical form of an address: lower-cased, with provider-specific
/// sub-addressing (and Gmail's dots) removed.
///
/// Returns `None` when nothing usable is left, e.g. `"+tag@gmail.com"`.
/// Applying it to its own output changes nothing.
pub fn normalize_email(email: &str) -> Option<String> {
    let (local, domain) = email.rsplit_once('@')?;
    let mut domain = domain.to_lowercase();
    let mut local = local.to_string();

    if GMAIL_DOMAINS.contains(&domain.as_str()) {
        local = before(&local, '+').replace('.', "");
        domain = "gmail.com".to_string();
    } else if ICLOUD_DOMAINS.contains(&domain.as_str())
        || OUTLOOK_DOMAINS.contains(&domain.as_str())
    {
        local = before(&local, '+').to_string();
    } else if YAHOO_DOMAINS.contains(&domain.as_str()) {
        local = before(&local, '-').to_string();
    } else if YANDEX_DOMAINS.contains(&domain.as_str()) {
        domain = "yandex.ru".to_string();
    }

    if local.is_empty() {
        return None;
    }

    Some(format!("{}@{}", local.to_lowercase(), domain))
}

fn before(value: &str, separator: char) -> &str {
    value.split(separator).next().unwrap_or(value)
}
