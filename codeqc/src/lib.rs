//! CodeQC quality gate library
//!
//! This library provides:
//! - A ten-step verification pipeline over source files and externally
//!   produced build/lint/test/coverage/audit/package/run results
//! - Four AND-gated checkpoints (G1–G4) and an eight-point Definition of Done
//! - A nine-level integrity ladder sealed by a nonce and a SHA-256 evidence hash
//! - A proof-pack manifest listing each evidence file under a Merkle root
//! - A three-channel weighted score report
//!
//! # Steps
//!
//! 1. `fake_scan` — placeholder and fabricated-data redlines
//! 2. `fraud_scan` — empty stubs, hardcoded fraud objects, bypass markers
//! 3. `build` — external build result
//! 4. `lint` — external lint result or the built-in prohibition scan (non-fatal)
//! 5. `test` — external test counts
//! 6. `coverage` — external coverage against the grade threshold (non-fatal)
//! 7. `redline` — full redline scan
//! 8. `interface_contact` — disconnected-interface markers
//! 9. `spec_coverage` — expected functions and completion checklist
//! 10. `delivery` — all fatal steps plus package and run exit codes
//!
//! # Usage
//!
//! ```
//! use codeqc::{ProductGrade, QcConfig, QualityGate, RunInput};
//!
//! let input = RunInput::new(ProductGrade::Commercial)
//!     .with_file("src/lib.rs", "pub fn add(a: u32, b: u32) -> u32 { a + b }\n");
//! let result = QualityGate::new(QcConfig::default()).run(&input);
//! assert_eq!(result.steps.len(), 10);
//! // No build or test results were supplied.
//! assert!(!result.passed);
//! ```

pub mod config;
pub mod dod;
pub mod error;
pub mod evidence;
pub mod gatekeeper;
pub mod gates;
pub mod ladder;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod score;
pub mod tamper;

// Re-export configuration and errors
pub use config::{QcConfig, ScoreWeights};
pub use error::{QcError, QcResult};

// Re-export the orchestrator and its output
pub use gatekeeper::QualityGate;
pub use report::RunResult;

// Re-export pipeline types
pub use pipeline::{
    AuditResult, BuildResult, ChecklistItem, CoverageResult, FaultMode, LintResult,
    PipelineRunner, ProcessResult, ProductGrade, ProofJudgements, RunInput, SourceFile,
    SpecMetadata, StepResult, TestResult,
};

// Re-export rule engine types
pub use rules::{PatternRuleEngine, RuleEngine, Severity, Violation};

// Re-export report component types
pub use dod::{DoDItem, DoDStatus};
pub use evidence::{EvidenceCatalogue, EvidenceRecord};
pub use gates::{GateReport, GateResult};
pub use ladder::{LadderCheck, LadderReport};
pub use manifest::{FileDigest, ManifestEnv, ProofManifest};
pub use score::{Channel, Reading, ReadingStatus, ScoreReport};
