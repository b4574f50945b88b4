//! Validation results and report rendering.
//!
//! One [`ValidationResult`] per contract; a [`Report`] aggregates them and
//! renders the human-readable listing, the one-line summary, and the
//! machine-readable JSON form. Printing is the caller's concern.

use std::fmt::Write as _;

use serde::Serialize;

/// One schema violation inside a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// JSON pointer into the contract (`""` for the document root).
    pub path: String,
    pub message: String,
    /// The schema rule that was violated (`type`, `required`, `enum`, ...).
    pub rule: String,
}

impl ValidationError {
    pub fn new(
        path: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            rule: rule.into(),
        }
    }
}

/// Outcome of validating one contract. Zero errors means pass; there is no
/// partial tier. Warnings ride along for strict mode only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub contract: String,
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn pass(contract: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            contract: contract.into(),
            ok: true,
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn fail(
        contract: impl Into<String>,
        errors: Vec<ValidationError>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            contract: contract.into(),
            ok: false,
            errors,
            warnings,
        }
    }

    /// Whether this result counts as a failure under the given strictness.
    pub fn failed(&self, strict: bool) -> bool {
        !self.ok || (strict && !self.warnings.is_empty())
    }
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub checked: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
}

/// Full batch report: per-contract results in validation order plus the
/// summary.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub results: Vec<ValidationResult>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn new(results: Vec<ValidationResult>, strict: bool) -> Self {
        let checked = results.len();
        let valid = results.iter().filter(|r| !r.failed(strict)).count();
        let errors: usize = results.iter().map(|r| r.errors.len()).sum();
        let summary = ReportSummary {
            checked,
            valid,
            invalid: checked - valid,
            errors,
        };
        Self { results, summary }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.invalid > 0
    }

    /// Render the per-contract listing and summary line.
    pub fn render_text(&self, strict: bool) -> String {
        let mut out = String::new();
        for result in &self.results {
            if result.failed(strict) {
                let _ = writeln!(out, "invalid: {}", result.contract);
                for error in &result.errors {
                    let at = if error.path.is_empty() {
                        "(root)"
                    } else {
                        &error.path
                    };
                    let _ = writeln!(out, "    {at}: {}", error.message);
                }
                if strict {
                    for warning in &result.warnings {
                        let _ =
                            writeln!(out, "    warning (treated as error): {warning}");
                    }
                }
            } else {
                let _ = writeln!(out, "valid: {}", result.contract);
                for warning in &result.warnings {
                    let _ = writeln!(out, "    warning: {warning}");
                }
            }
        }
        let s = self.summary;
        let _ = writeln!(
            out,
            "\nSummary: {} files checked | {} valid | {} invalid | {} errors",
            s.checked, s.valid, s.invalid, s.errors
        );
        out
    }

    /// Machine-readable form of the whole report.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "summary": self.summary,
            "results": self.results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Report {
        Report::new(
            vec![
                ValidationResult::pass("rooms/entry_room.json", vec![]),
                ValidationResult::fail(
                    "rooms/exit_room.json",
                    vec![ValidationError::new(
                        "",
                        "required",
                        "missing required member \"name\"",
                    )],
                    vec![],
                ),
            ],
            false,
        )
    }

    #[test]
    fn test_summary_counts() {
        let report = sample();
        assert_eq!(
            report.summary,
            ReportSummary {
                checked: 2,
                valid: 1,
                invalid: 1,
                errors: 1
            }
        );
        assert!(report.has_failures());
    }

    #[test]
    fn test_render_text() {
        let text = sample().render_text(false);
        assert!(text.contains("valid: rooms/entry_room.json"));
        assert!(text.contains("invalid: rooms/exit_room.json"));
        assert!(text.contains("    (root): missing required member \"name\""));
        assert!(text.contains("Summary: 2 files checked | 1 valid | 1 invalid | 1 errors"));
    }

    #[test]
    fn test_strict_promotes_warnings() {
        let results = vec![ValidationResult::pass(
            "rooms/entry_room.json",
            vec!["non-draft-07 $schema: x".into()],
        )];
        let lax = Report::new(results.clone(), false);
        assert!(!lax.has_failures());
        let strict = Report::new(results, true);
        assert!(strict.has_failures());
        assert!(strict
            .render_text(true)
            .contains("warning (treated as error)"));
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json();
        assert_eq!(json["summary"]["checked"], 2);
        assert_eq!(json["results"][1]["ok"], false);
        assert_eq!(json["results"][1]["errors"][0]["rule"], "required");
    }
}
