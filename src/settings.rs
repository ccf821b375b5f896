use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Missing key is not a startup error: every send answers 500 instead.
    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_resend_api_url")]
    pub resend_api_url: String,

    #[serde(default = "default_email_from")]
    pub email_from: String,

    #[serde(default)]
    pub email_to: Option<String>,

    #[serde(default = "default_mail_timeout")]
    pub mail_timeout_secs: u64,

    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_rate_limit_sweep")]
    pub rate_limit_sweep_secs: u64,
}

pub const DEFAULT_EMAIL_FROM: &str = "onboarding@resend.dev";
pub const DEFAULT_EMAIL_TO: &str = "contato@example.com";

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_resend_api_url() -> String {
    "https://api.resend.com".to_string()
}
fn default_email_from() -> String {
    DEFAULT_EMAIL_FROM.to_string()
}
fn default_mail_timeout() -> u64 {
    30
}
fn default_rate_limit_max() -> u32 {
    5
}
fn default_rate_limit_window() -> u64 {
    60 * 60
}
fn default_rate_limit_sweep() -> u64 {
    5 * 60
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            resend_api_key: None,
            resend_api_url: default_resend_api_url(),
            email_from: default_email_from(),
            email_to: None,
            mail_timeout_secs: default_mail_timeout(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window(),
            rate_limit_sweep_secs: default_rate_limit_sweep(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name.to_string().to_lowercase())).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // The provider's own variable names are honoured when the APP_ ones are absent
        config.resend_api_key = config.resend_api_key.or_else(|| env_opt("RESEND_API_KEY"));
        config.email_to = config.email_to.or_else(|| env_opt("EMAIL_TO"));
        if let Some(from) = env_opt("EMAIL_FROM") {
            if config.email_from == DEFAULT_EMAIL_FROM {
                config.email_from = from;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.rate_limit_max == 0 {
            errors.push("RATE_LIMIT_MAX must be greater than zero");
        }
        if self.rate_limit_window_secs == 0 {
            errors.push("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }
        if self.rate_limit_sweep_secs == 0 {
            errors.push("RATE_LIMIT_SWEEP_SECS must be greater than zero");
        }
        if Url::parse(&self.resend_api_url).is_err() {
            errors.push("RESEND_API_URL must be an absolute URL");
        }
        if self.email_from.trim().is_empty() {
            errors.push("EMAIL_FROM cannot be empty");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Recipient of contact messages, falling back to the built-in address.
    pub fn recipient(&self) -> String {
        self.email_to
            .as_deref()
            .map(str::trim)
            .filter(|to| !to.is_empty())
            .unwrap_or(DEFAULT_EMAIL_TO)
            .to_string()
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout_secs)
    }

    pub fn has_mail_credentials(&self) -> bool {
        self.resend_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.trim().is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        self.as_deref().unwrap_or("").redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("resend_api_url", &self.resend_api_url)
            .field("email_from", &self.email_from)
            .field("email_to", &self.recipient())
            .field("mail_timeout_secs", &self.mail_timeout_secs)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_sweep_secs", &self.rate_limit_sweep_secs)
            .finish()
    }
}
