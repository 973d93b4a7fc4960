//! Status comparison policy
//!
//! A candidate passes when it returns exactly the current status, or, with
//! `lower_is_better`, a numerically lower one.

use crate::models::{ProbeOutcome, Verdict};

/// Compare two status codes
pub fn compare(current: u16, candidate: u16, lower_is_better: bool) -> Verdict {
    if lower_is_better && candidate < current {
        return Verdict::pass(current, candidate);
    }
    if candidate == current {
        return Verdict::pass(current, candidate);
    }
    Verdict::fail(current, candidate)
}

/// Compare the outcomes of a current/candidate probe pair
pub fn compare_outcomes(current: &ProbeOutcome, candidate: &ProbeOutcome, lower_is_better: bool) -> Verdict {
    compare(current.status_code, candidate.status_code, lower_is_better)
}
