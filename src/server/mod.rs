//! HTTP service mode
//!
//! `GET /healthz` answers 200. Any other request carries one job as JSON in
//! its body and is run as a fresh preflight:
//! - undecodable body: 400
//! - run failure (validation, resolution, transport, mismatch): 500 with the error text
//! - pass: 200 with an empty body

use crate::{
    client::{NetworkClient, ProbeClient},
    dns::{AddressResolver, HostLookup, SystemLookup},
    equiv::equivalent_command,
    error::{AppError, Result},
    executor::PreflightRunner,
    logging::{LogSettings, Logger, ProbeLogger},
    models::{Job, JobSpec},
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};

/// Collaborators shared by every request; each request still gets its own
/// runner and logger
#[derive(Clone)]
pub struct ServerState {
    client: Arc<dyn ProbeClient>,
    lookup: Arc<dyn HostLookup>,
    settings: LogSettings,
}

impl ServerState {
    pub fn new(client: Arc<dyn ProbeClient>, lookup: Arc<dyn HostLookup>, settings: LogSettings) -> Self {
        Self { client, lookup, settings }
    }

    /// Network client and system resolver
    pub fn system(settings: LogSettings) -> Self {
        Self::new(Arc::new(NetworkClient::new()), Arc::new(SystemLookup::new()), settings)
    }

    fn runner(&self) -> PreflightRunner {
        PreflightRunner::new(
            self.client.clone(),
            AddressResolver::with_lookup(self.lookup.clone()),
            ProbeLogger::new(self.settings.clone()),
        )
    }
}

/// Create the router for service mode
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(submit)
        .with_state(state)
}

/// Bind `addr` and serve until the process exits
pub async fn serve(addr: SocketAddr, settings: LogSettings) -> Result<()> {
    let mut logger = Logger::with_settings("server", settings.clone());
    logger.add_context_field("mode", "server");
    let app = create_router(ServerState::system(settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::io(format!("Failed to bind {}: {}", addr, e)))?;
    logger.info(&format!("listening on {}", addr)).field("addr", addr.to_string()).log();

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::io(format!("Server error: {}", e)))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn submit(State(state): State<ServerState>, body: Bytes) -> Response {
    let runner = state.runner();
    let logger = runner.logger();

    let spec: JobSpec = match serde_json::from_slice(&body) {
        Ok(spec) => spec,
        Err(e) => {
            logger.log_error("decoding request", &AppError::from(e));
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if spec.equiv {
        return match Job::from_spec(&spec).and_then(|job| equivalent_command(&job)) {
            Ok(command) => (StatusCode::OK, command).into_response(),
            Err(e) => failure(logger, e),
        };
    }

    match runner.run_spec(&spec).await.and_then(|verdict| verdict.into_result()) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => failure(logger, e),
    }
}

fn failure(logger: &ProbeLogger, error: AppError) -> Response {
    logger.log_error("running preflight", &error);
    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logging::LogLevel,
        models::ProbeOutcome,
        types::ResolvedAddress,
    };
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::{
        net::IpAddr,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use tower::ServiceExt;

    struct FixedClient {
        current: u16,
        candidate: u16,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProbeClient for FixedClient {
        async fn probe_current(&self, _job: &Job) -> Result<ProbeOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProbeOutcome::current(self.current))
        }

        async fn probe_candidate(&self, _job: &Job, _resolved: &ResolvedAddress) -> Result<ProbeOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProbeOutcome::candidate(self.candidate))
        }
    }

    struct NoLookup;

    #[async_trait]
    impl HostLookup for NoLookup {
        async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
            Err(AppError::dns_resolution(format!("no record found for {}", host)))
        }
    }

    fn app(current: u16, candidate: u16) -> (Router, Arc<FixedClient>) {
        let client = Arc::new(FixedClient { current, candidate, calls: AtomicUsize::new(0) });
        let (settings, _) = LogSettings::in_memory(LogLevel::Debug);
        (create_router(ServerState::new(client.clone(), Arc::new(NoLookup), settings)), client)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (app, client) = app(200, 200);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_passing_job_returns_ok() {
        let (app, client) = app(200, 200);
        let response = app
            .oneshot(post("/", r#"{"endpoint":"https://app.example.com","new":"203.0.113.5"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_any_path_accepts_jobs() {
        let (app, _) = app(200, 200);
        let response = app
            .oneshot(post("/check/anything", r#"{"endpoint":"https://app.example.com","new":"localhost"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mismatch_returns_500_with_reason() {
        let (app, _) = app(200, 404);
        let response = app
            .oneshot(post("/", r#"{"endpoint":"https://app.example.com","new":"203.0.113.5"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("failed - expected: 200, got: 404"));
    }

    #[tokio::test]
    async fn test_validation_error_returns_500() {
        let (app, client) = app(200, 200);
        let response = app.oneshot(post("/", r#"{"new":"203.0.113.5"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("no endpoint provided"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolution_error_returns_500() {
        let (app, _) = app(200, 200);
        let response = app
            .oneshot(post("/", r#"{"endpoint":"https://app.example.com","new":"missing.example.net"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("missing.example.net"));
    }

    #[tokio::test]
    async fn test_job_with_null_fields_is_accepted() {
        let (app, client) = app(200, 200);
        let body = r#"{"endpoint":"https://app.example.com","headers":null,"body":"","method":"","new":"203.0.113.5","timeout":0,"lowerIsBetter":false,"equiv":false}"#;
        let response = app.oneshot(post("/", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_undecodable_body_returns_400() {
        let (app, client) = app(200, 200);
        let response = app.oneshot(post("/", "{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_equiv_job_returns_command_without_probing() {
        let (app, client) = app(200, 200);
        let response = app
            .oneshot(post("/", r#"{"endpoint":"https://app.example.com","new":"203.0.113.5","equiv":true}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.starts_with("sh -c '"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}
