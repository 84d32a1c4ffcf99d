//! Rule engine seam — textual detectors consumed by the pipeline.
//!
//! The pipeline never looks inside a detector. It only calls the three scans
//! exposed by [`RuleEngine`] and reads the returned [`Violation`] lists.
//! [`PatternRuleEngine`] is the default implementation, backed by the static
//! tables in [`catalogue`] and the comment/string masking in [`mask`].

pub mod catalogue;
pub mod engine;
pub mod mask;

pub use engine::PatternRuleEngine;
pub use mask::{mask, Language, MaskMode};

use crate::error::QcError;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Severity level for a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the gate.
    Error,
    /// Reported, never blocking on its own.
    Warning,
    /// Informational.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single rule hit in one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule ID (e.g., "R03", "P05")
    pub rule_id: String,
    /// Short rule name
    pub name: String,
    pub severity: Severity,
    /// File path as supplied in the run input
    pub file: String,
    /// 1-indexed line
    pub line: usize,
    /// 1-indexed column
    pub column: usize,
    pub message: String,
    /// Offending source line (truncated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Violation {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// One-line rendering used for raw step logs.
    pub fn log_line(&self) -> String {
        match &self.snippet {
            Some(snippet) => format!(
                "{}:{}:{} [{}] {} :: {}",
                self.file, self.line, self.column, self.rule_id, self.message, snippet
            ),
            None => format!(
                "{}:{}:{} [{}] {}",
                self.file, self.line, self.column, self.rule_id, self.message
            ),
        }
    }
}

/// External rule engine: three stateless scans over file text.
pub trait RuleEngine: Send + Sync {
    /// Full redline table (hard violations, must be zero).
    fn scan_redlines(&self, source: &str, path: &str) -> Vec<Violation>;
    /// Anti-fraud subset: empty stubs, hardcoded fraud objects, bypass markers.
    fn scan_fraud(&self, source: &str, path: &str) -> Vec<Violation>;
    /// Prohibition/style table.
    fn scan_prohibitions(&self, source: &str, path: &str) -> Vec<Violation>;
}

/// Which of the three scans to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Redlines,
    Fraud,
    Prohibitions,
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redlines => write!(f, "redline"),
            Self::Fraud => write!(f, "fraud"),
            Self::Prohibitions => write!(f, "prohibition"),
        }
    }
}

/// Run one scan on one file, turning a panicking detector into an error.
pub fn guarded_scan(
    engine: &dyn RuleEngine,
    kind: ScanKind,
    source: &str,
    path: &str,
) -> Result<Vec<Violation>, QcError> {
    catch_unwind(AssertUnwindSafe(|| match kind {
        ScanKind::Redlines => engine.scan_redlines(source, path),
        ScanKind::Fraud => engine.scan_fraud(source, path),
        ScanKind::Prohibitions => engine.scan_prohibitions(source, path),
    }))
    .map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "detector panicked".to_string());
        tracing::warn!(scan = %kind, path, %message, "Rule engine fault");
        QcError::RuleEngine {
            scan: kind.to_string(),
            path: path.to_string(),
            message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingEngine;

    impl RuleEngine for PanickingEngine {
        fn scan_redlines(&self, _source: &str, _path: &str) -> Vec<Violation> {
            panic!("table corrupted")
        }
        fn scan_fraud(&self, _source: &str, _path: &str) -> Vec<Violation> {
            Vec::new()
        }
        fn scan_prohibitions(&self, _source: &str, _path: &str) -> Vec<Violation> {
            Vec::new()
        }
    }

    #[test]
    fn test_guarded_scan_converts_panic() {
        let err = guarded_scan(&PanickingEngine, ScanKind::Redlines, "", "src/a.rs").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("table corrupted"), "{text}");
        assert!(text.contains("src/a.rs"), "{text}");
    }

    #[test]
    fn test_guarded_scan_passes_through() {
        let hits = guarded_scan(&PanickingEngine, ScanKind::Fraud, "", "src/a.rs").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Info), "info");
    }

    #[test]
    fn test_violation_log_line() {
        let v = Violation {
            rule_id: "R03".to_string(),
            name: "empty_catch".to_string(),
            severity: Severity::Error,
            file: "src/app.ts".to_string(),
            line: 4,
            column: 3,
            message: "Empty catch block swallows errors".to_string(),
            snippet: Some("} catch (e) {}".to_string()),
            suggestion: None,
        };
        assert_eq!(
            v.log_line(),
            "src/app.ts:4:3 [R03] Empty catch block swallows errors :: } catch (e) {}"
        );
    }
}
