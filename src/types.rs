//! Type definitions and aliases

use std::fmt;
use std::net::IpAddr;
use serde::{Deserialize, Serialize};

/// Address the candidate probe connects to, computed once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress(IpAddr);

impl ResolvedAddress {
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which side of the comparison a probe belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Request through the endpoint's normal resolution
    Current,
    /// Request forced to the replacement address
    Candidate,
}

impl ProbeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Current => "current",
            ProbeKind::Candidate => "candidate",
        }
    }
}

/// Stages of a single preflight run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ResolveCheck,
    ProbeCurrent,
    ProbeCandidate,
    Compare,
    /// Terminal; `true` on pass
    Done(bool),
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::ResolveCheck => "resolve_check",
            RunState::ProbeCurrent => "probe_current",
            RunState::ProbeCandidate => "probe_candidate",
            RunState::Compare => "compare",
            RunState::Done(true) => "done_pass",
            RunState::Done(false) => "done_fail",
        }
    }
}
