//! HTTP probes for the two sides of a preflight
//!
//! The current probe sends the job's request through normal name resolution.
//! The candidate probe sends the identical request but every connection is
//! dialed to the resolved replacement address; the URL, `Host` header and TLS
//! server name are left untouched.

pub mod connect;


use crate::{
    error::{AppError, Result},
    models::{Job, ProbeOutcome},
    types::ResolvedAddress,
};
use async_trait::async_trait;
use reqwest::{header::HOST, Client, ClientBuilder, RequestBuilder, Response};
use std::{sync::Arc, time::Duration};
use tokio::time::{timeout_at, Instant};
use url::Url;

use self::connect::{candidate_url, connect_target, override_dial_target, OverrideResolver};

/// Default `User-Agent`; a job header of the same name takes precedence
pub const USER_AGENT: &str = concat!("preflight-dns/", env!("CARGO_PKG_VERSION"));

/// Executes the two probes of a run
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Send the job's request to the endpoint as normally resolved
    async fn probe_current(&self, job: &Job) -> Result<ProbeOutcome>;

    /// Send the job's request with connections forced to `resolved`
    async fn probe_candidate(&self, job: &Job, resolved: &ResolvedAddress) -> Result<ProbeOutcome>;
}

/// reqwest-backed probe client.
///
/// A fresh `reqwest::Client` is built for every probe so the two sides never
/// share a connection pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkClient;

impl NetworkClient {
    pub fn new() -> Self {
        Self
    }

    fn base_builder(timeout: Duration) -> ClientBuilder {
        Client::builder().timeout(timeout).user_agent(USER_AGENT)
    }

    /// Method, headers and body are identical for both probes
    fn build_request(client: &Client, job: &Job, url: Url) -> RequestBuilder {
        let request = client
            .request(job.method().clone(), url)
            .headers(job.headers().clone());

        match job.body() {
            Some(body) => request.body(body.to_string()),
            None => request,
        }
    }

    /// Keep the status code, discard the response body
    fn finish(response: Response, outcome: fn(u16) -> ProbeOutcome) -> ProbeOutcome {
        let status = response.status().as_u16();
        drop(response);
        outcome(status)
    }
}

#[async_trait]
impl ProbeClient for NetworkClient {
    async fn probe_current(&self, job: &Job) -> Result<ProbeOutcome> {
        let client = Self::base_builder(job.timeout())
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        let response = Self::build_request(&client, job, job.endpoint().clone())
            .send()
            .await?;

        Ok(Self::finish(response, ProbeOutcome::current))
    }

    async fn probe_candidate(&self, job: &Job, resolved: &ResolvedAddress) -> Result<ProbeOutcome> {
        // Fails hard when the connection target carries no port
        let target = connect_target(job.endpoint())?;
        let dial = override_dial_target(&target, resolved)?;

        let deadline = Instant::now() + job.timeout();
        // Proxies are bypassed; every connection goes straight to the override
        let client = Self::base_builder(job.timeout())
            .no_proxy()
            .connect_timeout(job.timeout())
            .dns_resolver(Arc::new(OverrideResolver::new(resolved)))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        let (url, host) = candidate_url(job.endpoint(), resolved)?;
        let mut request = Self::build_request(&client, job, url);
        if let Some(host) = host {
            request = request.header(HOST, host);
        }

        let response = timeout_at(deadline, request.send())
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "candidate request to {} via {} exceeded {:?}",
                    target,
                    dial,
                    job.timeout()
                ))
            })??;

        Ok(Self::finish(response, ProbeOutcome::candidate))
    }
}
