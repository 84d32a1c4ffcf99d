//! Run input — file contents plus externally produced tool results.
//!
//! The gate never runs build, lint, test, coverage, audit, package or run
//! tools itself. Callers pass their outcomes here; anything left `None` is
//! treated as missing evidence.

use crate::error::{QcError, QcResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Product grade; selects the integrity target and coverage threshold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProductGrade {
    #[default]
    Commercial,
    #[serde(rename = "deeptech", alias = "deep_tech")]
    DeepTech,
}

impl ProductGrade {
    /// Integrity ladder level this grade must reach.
    pub fn target_level(&self) -> u8 {
        match self {
            Self::Commercial => 5,
            Self::DeepTech => 9,
        }
    }
}

impl std::fmt::Display for ProductGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commercial => write!(f, "commercial"),
            Self::DeepTech => write!(f, "deeptech"),
        }
    }
}

/// One source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Outcome of the project build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BuildResult {
    pub exit_code: i32,
    #[serde(default)]
    pub errors: usize,
    #[serde(default)]
    pub warnings: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

/// Outcome of an external linter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LintResult {
    pub errors: usize,
    #[serde(default)]
    pub warnings: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

/// Test run counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TestResult {
    pub total: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl TestResult {
    pub fn validate(&self) -> QcResult<()> {
        if self.failed > self.total {
            return Err(QcError::malformed(
                "test",
                format!(
                    "failed ({}) exceeds total ({})",
                    self.failed, self.total
                ),
            ));
        }
        Ok(())
    }

    /// Passing share in percent; 0 when nothing ran.
    pub fn pass_ratio(&self) -> f64 {
        if self.total == 0 || self.failed > self.total {
            return 0.0;
        }
        (self.total - self.failed) as f64 / self.total as f64 * 100.0
    }
}

/// Line coverage measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoverageResult {
    pub percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl CoverageResult {
    pub fn validate(&self) -> QcResult<()> {
        if !self.percent.is_finite() || !(0.0..=100.0).contains(&self.percent) {
            return Err(QcError::malformed(
                "coverage",
                format!("percent {} outside 0..=100", self.percent),
            ));
        }
        Ok(())
    }
}

/// Dependency / security audit finding counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditResult {
    #[serde(default)]
    pub critical: usize,
    #[serde(default)]
    pub high: usize,
    #[serde(default)]
    pub moderate: usize,
    #[serde(default)]
    pub low: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl AuditResult {
    /// Zero critical and zero high findings.
    pub fn is_clean(&self) -> bool {
        self.critical == 0 && self.high == 0
    }
}

/// Exit status of a packaging or run command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessResult {
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl ProcessResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// One completion checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChecklistItem {
    pub item: String,
    pub done: bool,
}

/// Expected surface of the implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpecMetadata {
    /// Function names that must appear in the source
    #[serde(default)]
    pub expected_functions: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

impl SpecMetadata {
    /// Expected function names, trimmed, with blank entries dropped.
    pub fn named_functions(&self) -> Vec<&str> {
        self.expected_functions
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// Authenticity judgements made outside the gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProofJudgements {
    /// Identity five-question check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_check: Option<bool>,
    /// Realism score, 0–5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realism_score: Option<f64>,
    /// Every data source traceable to its origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceable: Option<bool>,
}

/// Everything one gate run looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunInput {
    #[serde(default)]
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub grade: ProductGrade,
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint: Option<LintResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<ProcessResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<ProcessResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<SpecMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofJudgements>,
    /// Caller-supplied anti-replay token; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Raw proof log folded into the evidence hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_log: Option<String>,
}

fn default_evidence_dir() -> String {
    "evidence".to_string()
}

impl Default for RunInput {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            grade: ProductGrade::default(),
            evidence_dir: default_evidence_dir(),
            build: None,
            lint: None,
            test: None,
            coverage: None,
            audit: None,
            package: None,
            run: None,
            spec: None,
            proof: None,
            nonce: None,
            proof_log: None,
        }
    }
}

impl RunInput {
    pub fn new(grade: ProductGrade) -> Self {
        Self {
            grade,
            ..Default::default()
        }
    }

    /// Add a file (builder style).
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push(SourceFile::new(path, content));
        self
    }

    /// Conventional evidence log path for `name`.
    pub fn evidence_path(&self, name: &str) -> String {
        let dir = self.evidence_dir.trim_end_matches(['/', '\\']);
        if dir.is_empty() {
            format!("{name}.log")
        } else {
            format!("{dir}/{name}.log")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_targets_and_serde() {
        assert_eq!(ProductGrade::Commercial.target_level(), 5);
        assert_eq!(ProductGrade::DeepTech.target_level(), 9);
        assert_eq!(
            serde_json::to_string(&ProductGrade::DeepTech).unwrap(),
            "\"deeptech\""
        );
        let parsed: ProductGrade = serde_json::from_str("\"deep_tech\"").unwrap();
        assert_eq!(parsed, ProductGrade::DeepTech);
    }

    #[test]
    fn test_test_result_ratio_and_validation() {
        let t = TestResult {
            total: 8,
            failed: 2,
            log: None,
        };
        assert_eq!(t.pass_ratio(), 75.0);
        assert!(t.validate().is_ok());

        let none = TestResult::default();
        assert_eq!(none.pass_ratio(), 0.0);

        let bad = TestResult {
            total: 1,
            failed: 3,
            log: None,
        };
        assert!(bad.validate().is_err());
        assert_eq!(bad.pass_ratio(), 0.0);
    }

    #[test]
    fn test_coverage_validation() {
        assert!(CoverageResult { percent: 85.5, log: None }.validate().is_ok());
        assert!(CoverageResult { percent: 101.0, log: None }.validate().is_err());
        assert!(CoverageResult { percent: f64::NAN, log: None }.validate().is_err());
    }

    #[test]
    fn test_minimal_json_input() {
        let input: RunInput = serde_json::from_str(
            r#"{"files":[{"path":"src/a.rs","content":"fn a() {}"}],"build":{"exit_code":0}}"#,
        )
        .unwrap();
        assert_eq!(input.grade, ProductGrade::Commercial);
        assert_eq!(input.evidence_dir, "evidence");
        assert_eq!(input.build.as_ref().map(|b| b.errors), Some(0));
        assert!(input.test.is_none());
    }

    #[test]
    fn test_evidence_path() {
        let mut input = RunInput::default();
        assert_eq!(input.evidence_path("scan"), "evidence/scan.log");
        input.evidence_dir = "out/proof/".to_string();
        assert_eq!(input.evidence_path("run"), "out/proof/run.log");
        input.evidence_dir = String::new();
        assert_eq!(input.evidence_path("run"), "run.log");
    }
}
