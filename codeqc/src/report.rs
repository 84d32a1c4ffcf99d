//! Run result — the single serializable output of a gate run.

use crate::dod::DoDStatus;
use crate::evidence::EvidenceCatalogue;
use crate::gates::GateReport;
use crate::ladder::LadderReport;
use crate::pipeline::{ProductGrade, StepResult};
use crate::score::ScoreReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Wall-clock start; diagnostic only
    pub timestamp: DateTime<Utc>,
    pub grade: ProductGrade,
    pub achieved_level: u8,
    pub target_level: u8,
    pub nonce: String,
    /// SHA-256 hex of the canonical evidence payload
    pub evidence_hash: String,
    /// Always ten, ordered by step
    pub steps: Vec<StepResult>,
    pub gates: GateReport,
    pub evidence: EvidenceCatalogue,
    pub dod: DoDStatus,
    pub integrity: LadderReport,
    pub score: ScoreReport,
    /// Every fatal step and every gate passed
    pub passed: bool,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn step(&self, step: u8) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn failed_steps(&self) -> Vec<&StepResult> {
        self.steps.iter().filter(|s| !s.passed).collect()
    }

    /// Compact one-line summary for logs.
    pub fn summary(&self) -> String {
        let step_statuses: Vec<String> = self
            .steps
            .iter()
            .map(|s| format!("{}:{}", s.step, if s.passed { "PASS" } else { "FAIL" }))
            .collect();

        format!(
            "[{}] {} LV{}/{} {}/{} steps, {}/8 DoD, score {:.2} ({}ms) [{}]",
            if self.passed { "PASS" } else { "FAIL" },
            self.grade,
            self.achieved_level,
            self.target_level,
            self.steps.len() - self.failed_steps().len(),
            self.steps.len(),
            self.dod.passed_count(),
            self.score.composite,
            self.duration_ms,
            step_statuses.join(" "),
        )
    }
}
