//! Acceptance evaluation
//!
//! Decides whether an edited snippet satisfies a mission. The checks are
//! textual heuristics; nothing is executed.
//!
//! Rule precedence (first match wins):
//! 1. loose-equal to the starting snippet: `Unchanged`
//! 2. strict-equal to the reference, or keyword rule satisfied: `Accepted`
//! 3. a required keyword is missing: `MissingRequired`
//! 4. a forbidden keyword is present: `ForbiddenPresent`
//! 5. otherwise: `Rejected`

use crate::config::EngineConfig;
use crate::mission::{Mission, MissionId};
use crate::normalize::{normalize_loose, normalize_strict_with, DEFAULT_COMMENT_MARKER};
use serde::{Deserialize, Serialize};

/// Outcome tag for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Submitted without editing
    Unchanged,
    /// A required substring is absent
    MissingRequired,
    /// A forbidden substring is still present
    ForbiddenPresent,
    /// Catch-all failure
    Rejected,
    /// Evaluation itself failed; only produced by the session layer
    EvaluationFault,
    /// Rule satisfied
    Accepted,
}

impl Outcome {
    /// Whether the submission passed
    #[inline]
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether the submission carries the accuracy penalty
    #[inline]
    #[must_use]
    pub fn is_failure(self) -> bool {
        !self.is_accepted()
    }

    /// Generic failures with no specific guidance
    #[inline]
    #[must_use]
    pub fn is_rejected_class(self) -> bool {
        matches!(self, Self::Rejected | Self::EvaluationFault)
    }

    /// Stable machine-readable reason code
    #[must_use]
    pub fn reason_code(self) -> Option<&'static str> {
        match self {
            Self::Unchanged => Some("unchanged"),
            Self::MissingRequired => Some("missing_required"),
            Self::ForbiddenPresent => Some("forbidden_present"),
            Self::Rejected => Some("rejected"),
            Self::EvaluationFault => Some("evaluation_fault"),
            Self::Accepted => None,
        }
    }

    /// Learner-facing message
    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Unchanged => {
                Some("The code has not been modified. Use the hint to fix the snippet.")
            }
            Self::MissingRequired => Some(
                "Logic error: the change a correct answer needs was not found. Check the hint again.",
            ),
            Self::ForbiddenPresent => {
                Some("Logic error: the problematic code that should be fixed is still there.")
            }
            Self::Rejected => {
                Some("Logic error: the implementation does not meet the exercise requirements.")
            }
            Self::EvaluationFault => Some("System error: the snippet could not be evaluated."),
            Self::Accepted => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason_code().unwrap_or("accepted"))
    }
}

/// Which parts of the rule a submission satisfied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    /// Required substrings not found
    pub missing_required: Vec<String>,
    /// Forbidden substrings still present
    pub forbidden_present: Vec<String>,
    /// Strict-normalized equality with the reference
    pub structural_match: bool,
}

impl RuleReport {
    /// All required substrings are present
    #[inline]
    #[must_use]
    pub fn has_all_required(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// No forbidden substring is present
    #[inline]
    #[must_use]
    pub fn none_forbidden(&self) -> bool {
        self.forbidden_present.is_empty()
    }
}

/// Result of evaluating one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Mission evaluated
    pub mission_id: MissionId,
    /// Verdict
    pub outcome: Outcome,
    /// Rule breakdown (empty for `Unchanged` and `EvaluationFault`)
    pub report: RuleReport,
}

impl SubmissionResult {
    /// Result for an evaluation that could not complete
    #[must_use]
    pub fn fault(mission_id: MissionId) -> Self {
        Self {
            mission_id,
            outcome: Outcome::EvaluationFault,
            report: RuleReport::default(),
        }
    }

    /// Reason code for non-accepted outcomes
    #[inline]
    #[must_use]
    pub fn reason_code(&self) -> Option<&'static str> {
        self.outcome.reason_code()
    }
}

/// Acceptance evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluator {
    comment_marker: String,
}

impl Evaluator {
    /// Create evaluator from engine configuration
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            comment_marker: config.comment_marker.clone(),
        }
    }

    /// Evaluate a submission against a mission
    #[must_use]
    pub fn evaluate(&self, submitted: &str, mission: &Mission) -> SubmissionResult {
        if normalize_loose(submitted) == normalize_loose(&mission.starting_snippet) {
            tracing::debug!(mission = %mission.id, "submission unchanged");
            return SubmissionResult {
                mission_id: mission.id,
                outcome: Outcome::Unchanged,
                report: RuleReport::default(),
            };
        }

        let report = self.inspect(submitted, mission);
        let outcome = if report.structural_match
            || (report.has_all_required() && report.none_forbidden())
        {
            Outcome::Accepted
        } else if !report.has_all_required() {
            Outcome::MissingRequired
        } else if !report.none_forbidden() {
            Outcome::ForbiddenPresent
        } else {
            Outcome::Rejected
        };

        tracing::debug!(
            mission = %mission.id,
            %outcome,
            structural = report.structural_match,
            missing = report.missing_required.len(),
            forbidden = report.forbidden_present.len(),
            "submission evaluated"
        );

        SubmissionResult {
            mission_id: mission.id,
            outcome,
            report,
        }
    }

    /// Break a submission down against the mission rule without deciding
    ///
    /// Keyword checks are verbatim and case-sensitive on the raw text.
    #[must_use]
    pub fn inspect(&self, submitted: &str, mission: &Mission) -> RuleReport {
        let missing_required = mission
            .keywords
            .iter()
            .filter(|kw| !submitted.contains(kw.as_str()))
            .cloned()
            .collect();
        let forbidden_present = mission
            .remove_keywords
            .iter()
            .filter(|kw| submitted.contains(kw.as_str()))
            .cloned()
            .collect();
        let structural_match = normalize_strict_with(submitted, &self.comment_marker)
            == normalize_strict_with(&mission.reference_snippet, &self.comment_marker);

        RuleReport {
            missing_required,
            forbidden_present,
            structural_match,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }
}

/// Evaluate with the default configuration
#[must_use]
pub fn evaluate(submitted: &str, mission: &Mission) -> SubmissionResult {
    Evaluator::default().evaluate(submitted, mission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destructive_sort() -> Mission {
        Mission::new(
            1,
            "Remove destructive methods",
            "def f(d); d.sort!; d.reverse!; end",
            "def f(d)\n  d.sort.reverse\nend",
        )
        .with_keywords(["sort.reverse"])
        .with_remove_keywords(["sort!", "reverse!"])
    }

    #[test]
    fn unchanged_submission() {
        let mission = destructive_sort();
        let result = evaluate("def f(d); d.sort!; d.reverse!; end", &mission);
        assert_eq!(result.outcome, Outcome::Unchanged);
        assert_eq!(result.reason_code(), Some("unchanged"));
    }

    #[test]
    fn whitespace_only_edit_is_unchanged() {
        let mission = destructive_sort();
        let result = evaluate("def f(d);\n  d.sort!;   d.reverse!;\r\nend  ", &mission);
        assert_eq!(result.outcome, Outcome::Unchanged);
    }

    #[test]
    fn leading_byte_order_mark_is_unchanged() {
        let mission = Mission::new(2, "bom", "a = 1", "a = 2").with_keywords(["2"]);
        let result = evaluate("\u{FEFF}a = 1", &mission);
        assert_eq!(result.outcome, Outcome::Unchanged);
    }

    #[test]
    fn keyword_rule_accepts() {
        let result = evaluate("def f(d); d.sort.reverse; end", &destructive_sort());
        assert_eq!(result.outcome, Outcome::Accepted);
        assert_eq!(result.reason_code(), None);
    }

    #[test]
    fn missing_required_reported() {
        let result = evaluate("def f(d); d.sort; end", &destructive_sort());
        assert_eq!(result.outcome, Outcome::MissingRequired);
        assert_eq!(result.report.missing_required, vec!["sort.reverse".to_string()]);
        assert!(result.report.none_forbidden());
    }

    #[test]
    fn forbidden_present_reported() {
        let result = evaluate("def f(d); d.sort.reverse; d.sort!; end", &destructive_sort());
        assert_eq!(result.outcome, Outcome::ForbiddenPresent);
        assert_eq!(result.report.forbidden_present, vec!["sort!".to_string()]);
    }

    #[test]
    fn missing_required_wins_over_forbidden() {
        let result = evaluate("def f(d); d.sort!; end", &destructive_sort());
        assert_eq!(result.outcome, Outcome::MissingRequired);
    }

    #[test]
    fn structural_match_overrides_keywords() {
        let mission = Mission::new(7, "rename", "X = 1", "x = 1 # local")
            .with_keywords(["never_present"]);
        let result = evaluate("x=1", &mission);
        assert_eq!(result.outcome, Outcome::Accepted);
        assert!(result.report.structural_match);
    }

    #[test]
    fn empty_rule_accepts_any_edit() {
        let mission = Mission::new(2, "free", "a", "b");
        assert_eq!(evaluate("c", &mission).outcome, Outcome::Accepted);
        assert_eq!(evaluate(" a ", &mission).outcome, Outcome::Unchanged);
    }

    #[test]
    fn keyword_checks_are_case_sensitive() {
        let mission = Mission::new(3, "t", "x", "y").with_keywords(["Logger.error"]);
        assert_eq!(evaluate("logger.error", &mission).outcome, Outcome::MissingRequired);
    }

    #[test]
    fn custom_comment_marker() {
        let config = EngineConfig::new().with_comment_marker("//");
        let evaluator = Evaluator::new(&config);
        let mission = Mission::new(4, "t", "let x = 0;", "let x = 1; // fixed")
            .with_keywords(["unused"]);
        let result = evaluator.evaluate("let x = 1;", &mission);
        assert_eq!(result.outcome, Outcome::Accepted);
    }

    #[test]
    fn fault_result_is_rejected_class() {
        let result = SubmissionResult::fault(MissionId(9));
        assert!(result.outcome.is_rejected_class());
        assert!(result.outcome.is_failure());
        assert_eq!(result.reason_code(), Some("evaluation_fault"));
    }

    #[test]
    fn every_failure_has_a_message() {
        for outcome in [
            Outcome::Unchanged,
            Outcome::MissingRequired,
            Outcome::ForbiddenPresent,
            Outcome::Rejected,
            Outcome::EvaluationFault,
        ] {
            assert!(outcome.message().is_some(), "{outcome:?}");
        }
        assert!(Outcome::Accepted.message().is_none());
    }
}
