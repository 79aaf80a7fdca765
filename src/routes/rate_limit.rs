use axum::http::Request;
use std::net::IpAddr;
use tower_governor::{GovernorError, key_extractor::KeyExtractor};

/// IP key extractor that tolerates reverse proxies and Docker networks.
///
/// Tries `X-Forwarded-For`, then `X-Real-IP`, then the peer address.
/// Requests with no identifiable IP share one localhost bucket instead of
/// being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackIpKeyExtractor;

impl KeyExtractor for FallbackIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(forwarded_ip(req)
            .or_else(|| peer_ip(req))
            .unwrap_or(IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)))
    }
}

fn forwarded_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    let from_xff = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());

    from_xff.or_else(|| {
        req.headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    })
}

fn peer_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    req.extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip())
}
