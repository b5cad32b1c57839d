use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use std::net::SocketAddr;

/// Derive the real client IP for a request.
///
/// Trust order: first comma-separated entry of `X-Forwarded-For`, then
/// `X-Real-IP`, then the transport-level peer address. Proxy-supplied headers
/// outrank the raw socket address because the server normally sits behind a
/// reverse proxy. This is the single IP-derivation path for the whole server;
/// the resolver's affinity reads and writes both go through it.
pub(crate) fn client_ip(parts: &Parts) -> Option<String> {
    if let Some(forwarded) = header_value(parts, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    if let Some(real_ip) = header_value(parts, "x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return Some(real_ip.to_string());
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
