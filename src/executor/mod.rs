//! Preflight run orchestration
//!
//! A run walks a fixed, linear sequence of states:
//! `Init -> ResolveCheck -> ProbeCurrent -> ProbeCandidate -> Compare -> Done`.
//! Any step may end the run early with an error. Nothing is retried.

use crate::{
    client::{NetworkClient, ProbeClient},
    comparison::compare_outcomes,
    dns::AddressResolver,
    error::{AppError, Result},
    logging::{LogSettings, ProbeLogger},
    models::{Job, JobSpec, ProbeOutcome, Verdict},
    types::RunState,
};
use std::{sync::Arc, time::Instant};

/// Runs preflights with an injected client, resolver and logger
pub struct PreflightRunner {
    client: Arc<dyn ProbeClient>,
    resolver: AddressResolver,
    logger: ProbeLogger,
}

impl PreflightRunner {
    pub fn new(client: Arc<dyn ProbeClient>, resolver: AddressResolver, logger: ProbeLogger) -> Self {
        Self { client, resolver, logger }
    }

    /// Runner using the network client and the system resolver
    pub fn with_settings(settings: LogSettings) -> Self {
        Self::new(
            Arc::new(NetworkClient::new()),
            AddressResolver::system(),
            ProbeLogger::new(settings),
        )
    }

    pub fn logger(&self) -> &ProbeLogger {
        &self.logger
    }

    /// Validate a raw spec, then run it
    pub async fn run_spec(&self, spec: &JobSpec) -> Result<Verdict> {
        self.logger.log_state(RunState::Init);
        let job = Job::from_spec(spec).map_err(|e| self.fail("validation", e))?;
        self.run(&job).await
    }

    /// Run one preflight.
    ///
    /// Returns the verdict whether it passed or not; transport and resolution
    /// failures are errors.
    pub async fn run(&self, job: &Job) -> Result<Verdict> {
        self.logger.log_run_start(job);

        self.logger.log_state(RunState::ResolveCheck);
        let resolved = self
            .resolver
            .resolve(job.new_target())
            .await
            .map_err(|e| self.fail("resolving new target", e))?;
        self.logger.log_resolution(job.new_target(), &resolved);

        self.logger.log_state(RunState::ProbeCurrent);
        let started = Instant::now();
        let current = self
            .client
            .probe_current(job)
            .await
            .map_err(|e| self.fail("current request", e))?;
        self.log_outcome(&current, started);

        self.logger.log_state(RunState::ProbeCandidate);
        let started = Instant::now();
        let candidate = self
            .client
            .probe_candidate(job, &resolved)
            .await
            .map_err(|e| self.fail("candidate request", e))?;
        self.log_outcome(&candidate, started);

        self.logger.log_state(RunState::Compare);
        let verdict = compare_outcomes(&current, &candidate, job.lower_is_better());
        self.logger.log_state(RunState::Done(verdict.passed));
        self.logger.log_verdict(&verdict);

        Ok(verdict)
    }

    fn log_outcome(&self, outcome: &ProbeOutcome, started: Instant) {
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.logger.log_probe(outcome.kind, outcome.status_code, duration_ms);
    }

    fn fail(&self, context: &str, error: AppError) -> AppError {
        self.logger.log_error(context, &error);
        self.logger.log_state(RunState::Done(false));
        error
    }
}

/// Run one preflight with default collaborators. `Ok` only on pass.
pub async fn run_preflight(spec: &JobSpec, settings: LogSettings) -> Result<()> {
    PreflightRunner::with_settings(settings)
        .run_spec(spec)
        .await?
        .into_result()
        .map(|_| ())
}
