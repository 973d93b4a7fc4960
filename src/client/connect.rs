//! Connection-step override for the candidate probe
//!
//! The candidate request keeps its URL, so `Host` and SNI stay the original
//! hostname. Only the dial target changes: every name the client resolves is
//! answered with the replacement address.

use crate::{
    error::{AppError, Result},
    types::ResolvedAddress,
};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, SocketAddr};
use url::{Host, Url};

/// DNS override answering every lookup with one address.
///
/// The answer carries port 0 so the connector keeps the port of the
/// connection it is making (including redirect hops to another scheme).
#[derive(Debug, Clone, Copy)]
pub struct OverrideResolver {
    ip: IpAddr,
}

impl OverrideResolver {
    pub fn new(resolved: &ResolvedAddress) -> Self {
        Self { ip: resolved.ip() }
    }
}

impl Resolve for OverrideResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let addr = SocketAddr::new(self.ip, 0);
        let addrs: Addrs = Box::new(std::iter::once(addr));
        Box::pin(futures::future::ready(Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)))
    }
}

/// The `host:port` string a transport would dial for `url`.
///
/// The port is the explicit one or the scheme's default; when neither exists
/// the result is the bare host, which [`split_host_port`] rejects.
pub fn connect_target(url: &Url) -> Result<String> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => format!("[{}]", ip),
        None => return Err(AppError::validation(format!("endpoint {} has no host", url))),
    };

    Ok(match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Split `host:port` / `[v6]:port`. A missing or unparseable port is an error.
pub fn split_host_port(target: &str) -> Result<(String, u16)> {
    let missing_port = || AppError::network(format!("address {}: missing port in address", target));

    let (host, port) = if let Some(rest) = target.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| AppError::network(format!("address {}: missing ']' in address", target)))?;
        let port = rest[end + 1..].strip_prefix(':').ok_or_else(missing_port)?;
        (&rest[..end], port)
    } else {
        let idx = target.rfind(':').ok_or_else(missing_port)?;
        let host = &target[..idx];
        if host.contains(':') {
            return Err(AppError::network(format!("address {}: too many colons in address", target)));
        }
        (host, &target[idx + 1..])
    };

    let port = port
        .parse::<u16>()
        .map_err(|_| AppError::network(format!("address {}: invalid port", target)))?;
    Ok((host.to_string(), port))
}

/// Dial target for the candidate: the resolved address with the original port
pub fn override_dial_target(target: &str, resolved: &ResolvedAddress) -> Result<SocketAddr> {
    let (_, port) = split_host_port(target)?;
    Ok(SocketAddr::new(resolved.ip(), port))
}

/// Request URL and `Host` header for the candidate probe.
///
/// Hostname endpoints are returned untouched and go through
/// [`OverrideResolver`]. IP-literal endpoints are never resolved by the
/// client, so the URL host is swapped for the resolved address and the
/// original authority is sent as `Host`. Over `https` such an endpoint has
/// its certificate verified against the resolved address instead of the
/// original literal; hostname endpoints keep their server name.
pub fn candidate_url(endpoint: &Url, resolved: &ResolvedAddress) -> Result<(Url, Option<String>)> {
    match endpoint.host() {
        Some(Host::Domain(_)) => Ok((endpoint.clone(), None)),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {
            let authority = match (endpoint.host_str(), endpoint.port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => return Err(AppError::validation(format!("endpoint {} has no host", endpoint))),
            };
            let mut url = endpoint.clone();
            url.set_ip_host(resolved.ip())
                .map_err(|_| AppError::internal(format!("cannot set host of {}", endpoint)))?;
            Ok((url, Some(authority)))
        }
        None => Err(AppError::validation(format!("endpoint {} has no host", endpoint))),
    }
}
