//! Quality gate orchestrator.
//!
//! Data flow: rule engine → pipeline → gates and evidence → DoD, then the
//! evidence hash → integrity ladder, and the score report. A run never fails
//! with an error; every fault shows up inside the [`RunResult`].

use crate::config::QcConfig;
use crate::dod::DoDJudge;
use crate::evidence::EvidenceCollector;
use crate::gates::GateEvaluator;
use crate::ladder::IntegrityLadder;
use crate::pipeline::{PipelineRunner, RunInput};
use crate::report::RunResult;
use crate::rules::{PatternRuleEngine, RuleEngine};
use crate::score::ScoreSynthesizer;
use crate::tamper::{evidence_hash, generate_nonce, HashInputs};
use chrono::Utc;
use std::time::Instant;

pub struct QualityGate {
    config: QcConfig,
    engine: Box<dyn RuleEngine>,
}

impl QualityGate {
    /// Gate backed by the built-in [`PatternRuleEngine`].
    pub fn new(config: QcConfig) -> Self {
        Self::with_engine(config, Box::new(PatternRuleEngine::new()))
    }

    pub fn with_engine(config: QcConfig, engine: Box<dyn RuleEngine>) -> Self {
        Self { config, engine }
    }

    /// Run the full pipeline. Single-threaded and free of I/O.
    pub fn run(&self, input: &RunInput) -> RunResult {
        let start = Instant::now();
        let timestamp = Utc::now();
        let nonce = input.nonce.clone().unwrap_or_else(generate_nonce);

        tracing::info!(
            grade = %input.grade,
            files = input.files.len(),
            nonce = %nonce,
            "Starting quality gate run"
        );

        let engine = self.engine.as_ref();
        let steps = PipelineRunner::new(&self.config, engine).run(input);
        let gates = GateEvaluator::new(engine).evaluate(&steps, input);
        let evidence = EvidenceCollector::new(&self.config).collect(&steps, input);
        let dod = DoDJudge::judge(&evidence, &gates);

        let hash = evidence_hash(&HashInputs {
            grade: input.grade,
            nonce: &nonce,
            steps: &steps,
            gates: &gates,
            evidence: &evidence,
            dod: &dod,
            proof_log: input.proof_log.as_deref(),
        });
        let integrity = IntegrityLadder::evaluate(input.grade, &steps, &nonce, &hash);
        let score = ScoreSynthesizer::new(&self.config).synthesize(input, &steps, &evidence);

        let fatal_ok = steps.iter().filter(|s| s.fatal).all(|s| s.passed);
        let passed = fatal_ok && gates.all_passed;

        let result = RunResult {
            timestamp,
            grade: input.grade,
            achieved_level: integrity.achieved_level,
            target_level: integrity.target_level,
            nonce,
            evidence_hash: hash,
            steps,
            gates,
            evidence,
            dod,
            integrity,
            score,
            passed,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            passed = result.passed,
            level = result.achieved_level,
            composite = result.score.composite,
            mission_complete = result.dod.mission_complete,
            duration_ms = result.duration_ms,
            "Quality gate run finished"
        );
        result
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QcConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProductGrade;

    #[test]
    fn test_empty_input_fails_cleanly() {
        let result = QualityGate::default().run(&RunInput::default());
        assert_eq!(result.steps.len(), 10);
        assert!(!result.passed);
        assert!(result.nonce.starts_with("NONCE-"));
        assert_eq!(result.evidence_hash.len(), 64);
        assert_eq!(result.target_level, 5);

        // Nothing external supplied: build, test, spec coverage and delivery fail.
        let failed: Vec<u8> = result.failed_steps().iter().map(|s| s.step).collect();
        for step in [3, 5, 9, 10] {
            assert!(failed.contains(&step), "step {step} not in {failed:?}");
        }
        assert!(!failed.contains(&1));
    }

    #[test]
    fn test_supplied_nonce_is_kept() {
        let mut input = RunInput::new(ProductGrade::DeepTech);
        input.nonce = Some("ci-run-7".to_string());
        let result = QualityGate::default().run(&input);
        assert_eq!(result.nonce, "ci-run-7");
        assert_eq!(result.target_level, 9);
        assert_eq!(result.integrity.checks.len(), 9);
    }

    #[test]
    fn test_summary_line() {
        let result = QualityGate::default().run(&RunInput::default());
        let summary = result.summary();
        assert!(summary.starts_with("[FAIL] commercial LV"), "{summary}");
        assert!(summary.contains("/8 DoD"));
    }
}
