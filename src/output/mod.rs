//! Console output for single-run mode

use crate::models::Verdict;
use colored::*;

/// Formats verdicts for the terminal, colored or plain
#[derive(Debug, Clone, Copy)]
pub struct VerdictFormatter {
    use_color: bool,
}

impl VerdictFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// `passed`, or the failure reason
    pub fn format_verdict(&self, verdict: &Verdict) -> String {
        let text = verdict.summary();
        if !self.use_color {
            return text.to_string();
        }
        if verdict.passed {
            text.green().bold().to_string()
        } else {
            text.red().bold().to_string()
        }
    }

    /// One-line status comparison, e.g. `current 200 -> candidate 404`
    pub fn format_statuses(&self, verdict: &Verdict) -> String {
        let candidate = verdict.candidate_status.to_string();
        let candidate = match (self.use_color, verdict.passed) {
            (false, _) => candidate,
            (true, true) => candidate.green().to_string(),
            (true, false) => candidate.red().to_string(),
        };
        format!("current {} -> candidate {}", verdict.current_status, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_verdicts() {
        let formatter = VerdictFormatter::new(false);
        assert_eq!(formatter.format_verdict(&Verdict::pass(200, 200)), "passed");
        assert_eq!(
            formatter.format_verdict(&Verdict::fail(200, 404)),
            "failed - expected: 200, got: 404"
        );
        assert_eq!(
            formatter.format_statuses(&Verdict::fail(200, 404)),
            "current 200 -> candidate 404"
        );
    }

    #[test]
    fn test_colored_verdict_keeps_text() {
        colored::control::set_override(true);
        let formatted = VerdictFormatter::new(true).format_verdict(&Verdict::pass(200, 200));
        colored::control::unset_override();

        assert!(formatted.contains("passed"));
        assert!(formatted.contains("\x1b["));
    }
}
