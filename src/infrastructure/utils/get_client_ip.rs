use actix_web::http::header::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit key for a request from proxy headers.
///
/// First entry of `X-Forwarded-For`, else `X-Real-IP`, else `"unknown"`.
/// Every request without either header shares the `"unknown"` bucket.
pub fn get_client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
