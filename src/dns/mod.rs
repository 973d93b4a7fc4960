//! Replacement-target resolution
//!
//! Turns the user-supplied `new` target into the address the candidate probe
//! connects to:
//! - `localhost` maps to `127.0.0.1` without a lookup
//! - IP literals (v4 or v6) are returned unchanged
//! - anything else is looked up through the host's resolver configuration and
//!   the first IPv4 answer wins

use crate::{
    error::{AppError, Result},
    types::ResolvedAddress,
};
use async_trait::async_trait;
use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
};
use tokio::sync::OnceCell;
use trust_dns_resolver::{system_conf, TokioAsyncResolver};

/// Forward lookup backend
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Resolve a hostname to every address the backend returns, in order
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Lookup through the system resolver configuration (resolv.conf, hosts file).
///
/// The underlying resolver is built on first use, so literal and `localhost`
/// targets never read resolver configuration.
pub struct SystemLookup {
    resolver: OnceCell<TokioAsyncResolver>,
}

impl SystemLookup {
    pub fn new() -> Self {
        Self {
            resolver: OnceCell::new(),
        }
    }

    async fn resolver(&self) -> Result<&TokioAsyncResolver> {
        self.resolver
            .get_or_try_init(|| async {
                let (config, opts) = system_conf::read_system_conf()
                    .map_err(|e| AppError::dns_resolution(format!("Failed to read system DNS config: {}", e)))?;
                Ok::<_, AppError>(TokioAsyncResolver::tokio(config, opts))
            })
            .await
    }
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        let resolver = self.resolver().await?;
        let response = resolver.lookup_ip(host).await?;
        Ok(response.iter().collect())
    }
}

/// Resolves the replacement target of one run
pub struct AddressResolver {
    lookup: Arc<dyn HostLookup>,
}

impl AddressResolver {
    /// Resolver backed by the system configuration
    pub fn system() -> Self {
        Self::with_lookup(Arc::new(SystemLookup::new()))
    }

    /// Resolver backed by a custom lookup (tests, alternative backends)
    pub fn with_lookup(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve `target` to the address the candidate probe must dial.
    ///
    /// Single attempt; lookup errors are returned as-is.
    pub async fn resolve(&self, target: &str) -> Result<ResolvedAddress> {
        if target.is_empty() {
            return Err(AppError::validation("no new ip provided"));
        }

        if target == "localhost" {
            return Ok(ResolvedAddress::new(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        }

        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ResolvedAddress::new(ip));
        }

        let addrs = self.lookup.lookup_ip(target).await?;
        first_ipv4(&addrs)
            .map(|ip| ResolvedAddress::new(IpAddr::V4(ip)))
            .ok_or_else(|| AppError::dns_resolution(format!("no IPv4 address found for {}", target)))
    }
}

/// First IPv4 address in `addrs`, preserving order
pub fn first_ipv4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        // v4-mapped v6 answers count as IPv4
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Lookup stub returning fixed answers and counting calls
    struct StubLookup {
        answer: std::result::Result<Vec<IpAddr>, String>,
        calls: AtomicUsize,
    }

    impl StubLookup {
        fn answering(addrs: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(addrs.iter().map(|a| a.parse().unwrap()).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HostLookup for StubLookup {
        async fn lookup_ip(&self, _host: &str) -> Result<Vec<IpAddr>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(AppError::dns_resolution)
        }
    }

    #[tokio::test]
    async fn test_localhost_maps_to_loopback_without_lookup() {
        let stub = StubLookup::answering(&["10.0.0.1"]);
        let resolver = AddressResolver::with_lookup(stub.clone());

        let resolved = resolver.resolve("localhost").await.unwrap();
        assert_eq!(resolved.ip(), "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_ipv4_literal_passthrough() {
        let stub = StubLookup::answering(&["10.0.0.1"]);
        let resolver = AddressResolver::with_lookup(stub.clone());

        let resolved = resolver.resolve("203.0.113.5").await.unwrap();
        assert_eq!(resolved.to_string(), "203.0.113.5");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_ipv6_literal_passthrough() {
        let stub = StubLookup::answering(&[]);
        let resolver = AddressResolver::with_lookup(stub.clone());

        let resolved = resolver.resolve("2001:db8::10").await.unwrap();
        assert_eq!(resolved.to_string(), "2001:db8::10");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_hostname_picks_first_ipv4_in_order() {
        let stub = StubLookup::answering(&["2001:db8::1", "198.51.100.20", "198.51.100.21"]);
        let resolver = AddressResolver::with_lookup(stub.clone());

        let resolved = resolver.resolve("new-lb.example.net").await.unwrap();
        assert_eq!(resolved.to_string(), "198.51.100.20");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_hostname_without_ipv4_fails() {
        let stub = StubLookup::answering(&["2001:db8::1", "2001:db8::2"]);
        let resolver = AddressResolver::with_lookup(stub);

        let error = resolver.resolve("v6-only.example.net").await.unwrap_err();
        assert!(matches!(error, AppError::DnsResolution(_)));
        assert!(error.to_string().contains("no IPv4 address found for v6-only.example.net"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_surfaced() {
        let stub = StubLookup::failing("no record found for missing.example.net");
        let resolver = AddressResolver::with_lookup(stub.clone());

        let error = resolver.resolve("missing.example.net").await.unwrap_err();
        assert!(matches!(error, AppError::DnsResolution(_)));
        assert!(error.to_string().contains("no record found for missing.example.net"));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_localhost_with_system_lookup() {
        // System resolver is never built for the special case
        let resolver = AddressResolver::system();
        let resolved = resolver.resolve("localhost").await.unwrap();
        assert_eq!(resolved.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_first_ipv4() {
        let addrs: Vec<IpAddr> = vec![
            "::1".parse().unwrap(),
            "::ffff:192.0.2.9".parse().unwrap(),
            "192.0.2.1".parse().unwrap(),
        ];
        assert_eq!(first_ipv4(&addrs), Some("192.0.2.9".parse().unwrap()));
        assert_eq!(first_ipv4(&[]), None);
        assert_eq!(first_ipv4(&["::1".parse().unwrap()]), None);
    }
}
