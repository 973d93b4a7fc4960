//! Probe outcomes and the comparison verdict

use crate::error::{AppError, Result};
use crate::types::ProbeKind;
use serde::{Deserialize, Serialize};

/// Result of one HTTP exchange, reduced to its status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub kind: ProbeKind,
    pub status_code: u16,
}

impl ProbeOutcome {
    pub fn current(status_code: u16) -> Self {
        Self { kind: ProbeKind::Current, status_code }
    }

    pub fn candidate(status_code: u16) -> Self {
        Self { kind: ProbeKind::Candidate, status_code }
    }
}

/// Pass/fail decision for a current/candidate pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub current_status: u16,
    pub candidate_status: u16,
    /// Set only when the pair failed
    pub reason: Option<String>,
}

impl Verdict {
    pub fn pass(current_status: u16, candidate_status: u16) -> Self {
        Self {
            passed: true,
            current_status,
            candidate_status,
            reason: None,
        }
    }

    pub fn fail(current_status: u16, candidate_status: u16) -> Self {
        Self {
            passed: false,
            current_status,
            candidate_status,
            reason: Some(format!(
                "failed - expected: {}, got: {}",
                current_status, candidate_status
            )),
        }
    }

    /// Human-readable summary, `passed` or the failure reason
    pub fn summary(&self) -> &str {
        self.reason.as_deref().unwrap_or("passed")
    }

    /// `Ok` on pass, a mismatch error carrying the reason otherwise
    pub fn into_result(self) -> Result<Verdict> {
        if self.passed {
            Ok(self)
        } else {
            Err(AppError::mismatch(self.summary().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert_eq!(ProbeOutcome::current(200).kind, ProbeKind::Current);
        assert_eq!(ProbeOutcome::candidate(503).kind, ProbeKind::Candidate);
        assert_eq!(ProbeOutcome::candidate(503).status_code, 503);
    }

    #[test]
    fn test_fail_reason_embeds_both_codes() {
        let verdict = Verdict::fail(200, 503);
        assert!(!verdict.passed);
        assert_eq!(verdict.summary(), "failed - expected: 200, got: 503");
    }

    #[test]
    fn test_pass_has_no_reason() {
        let verdict = Verdict::pass(200, 200);
        assert!(verdict.passed);
        assert!(verdict.reason.is_none());
        assert_eq!(verdict.summary(), "passed");
    }
}
