//! Ten-step verification pipeline.
//!
//! - [`input`]: what a run looks at (files plus externally produced results)
//! - [`step`]: per-step results and the fixed step table
//! - [`runner`]: executes the steps in order

pub mod input;
pub mod runner;
pub mod step;

pub use input::{
    AuditResult, BuildResult, ChecklistItem, CoverageResult, LintResult, ProcessResult,
    ProductGrade, ProofJudgements, RunInput, SourceFile, SpecMetadata, TestResult,
};
pub use runner::PipelineRunner;
pub use step::{FaultMode, StepDef, StepResult, STEP_DEFS};
