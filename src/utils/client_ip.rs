//! Client address extraction from HTTP requests.

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};
use std::net::SocketAddr;

/// Returns the client IP address for a request, if one can be determined.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` (or
/// `X-Real-IP`) wins. Otherwise the peer socket address recorded by
/// `into_make_service_with_connect_info` is used.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let ip = client_ip(&headers, &Extensions::new(), true);
/// assert_eq!(ip.as_deref(), Some("203.0.113.7"));
/// ```
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, behind_proxy: bool) -> Option<String> {
    if behind_proxy && let Some(ip) = forwarded_ip(headers) {
        return Some(ip);
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
}
