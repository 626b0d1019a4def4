use http::HeaderMap;

/// Key used when no client address can be derived.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client address.
///
/// Order: first entry of `x-forwarded-for`, then `x-real-ip`, then
/// [`UNKNOWN_CLIENT`]. These headers are caller-controlled, so the result is
/// only good enough for rate-limit keys and verification hints.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
