//! Gate evaluator — four AND-combined checkpoints over step outcomes.
//!
//! G3 re-runs the prohibition scan itself; a passing lint step may only
//! reflect an external linter.

use crate::pipeline::{RunInput, StepResult};
use crate::rules::{guarded_scan, RuleEngine, ScanKind};
use serde::{Deserialize, Serialize};

/// Static description of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const GATES: [GateDef; 4] = [
    GateDef {
        id: "G1",
        name: "interface_contact",
        description: "Every interface is connected to a live counterpart",
    },
    GateDef {
        id: "G2",
        name: "spec_coverage",
        description: "Every expected function exists and the checklist is complete",
    },
    GateDef {
        id: "G3",
        name: "code_integrity",
        description: "No fabrication, fraud, redline or blocking prohibition",
    },
    GateDef {
        id: "G4",
        name: "delivery",
        description: "G1-G3 hold, the build and tests pass and the artifact ships",
    },
];

/// Outcome of one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate ID (G1–G4)
    pub gate: String,
    pub passed: bool,
    /// What produced the verdict
    pub tool: String,
    pub detail: String,
}

impl GateResult {
    fn new(def: &GateDef, passed: bool, tool: &str, detail: impl Into<String>) -> Self {
        Self {
            gate: def.id.to_string(),
            passed,
            tool: tool.to_string(),
            detail: detail.into(),
        }
    }
}

/// All four gates plus the overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub g1: GateResult,
    pub g2: GateResult,
    pub g3: GateResult,
    pub g4: GateResult,
    pub all_passed: bool,
}

impl GateReport {
    pub fn gates(&self) -> [&GateResult; 4] {
        [&self.g1, &self.g2, &self.g3, &self.g4]
    }

    /// IDs of failed gates, in order.
    pub fn failed(&self) -> Vec<&str> {
        self.gates()
            .into_iter()
            .filter(|g| !g.passed)
            .map(|g| g.gate.as_str())
            .collect()
    }
}

pub struct GateEvaluator<'a> {
    engine: &'a dyn RuleEngine,
}

impl<'a> GateEvaluator<'a> {
    pub fn new(engine: &'a dyn RuleEngine) -> Self {
        Self { engine }
    }

    pub fn evaluate(&self, steps: &[StepResult], input: &RunInput) -> GateReport {
        let g1 = pass_through(&GATES[0], steps, 8);
        let g2 = pass_through(&GATES[1], steps, 9);
        let g3 = self.code_integrity(steps, input);

        let mut missing = Vec::new();
        for (label, ok) in [
            ("G1", g1.passed),
            ("G2", g2.passed),
            ("G3", g3.passed),
            ("build", step_passed(steps, 3)),
            ("test", step_passed(steps, 5)),
            ("delivery", step_passed(steps, 10)),
        ] {
            if !ok {
                missing.push(label);
            }
        }
        let g4 = if missing.is_empty() {
            GateResult::new(&GATES[3], true, "gates+build+test+delivery", "all delivery conditions hold")
        } else {
            GateResult::new(
                &GATES[3],
                false,
                "gates+build+test+delivery",
                format!("failed: {}", missing.join(", ")),
            )
        };

        let all_passed = g1.passed && g2.passed && g3.passed && g4.passed;
        let report = GateReport {
            g1,
            g2,
            g3,
            g4,
            all_passed,
        };
        if !all_passed {
            tracing::warn!(failed = ?report.failed(), "Gates failed");
        }
        report
    }

    /// G3: fake, fraud and redline steps plus a fresh prohibition re-scan.
    fn code_integrity(&self, steps: &[StepResult], input: &RunInput) -> GateResult {
        let mut failures = Vec::new();
        for (step, label) in [(1, "fake_scan"), (2, "fraud_scan"), (7, "redline")] {
            if !step_passed(steps, step) {
                failures.push(label.to_string());
            }
        }

        let mut errors = 0;
        let mut fault = None;
        for file in &input.files {
            match guarded_scan(self.engine, ScanKind::Prohibitions, &file.content, &file.path) {
                Ok(hits) => errors += hits.iter().filter(|v| v.is_error()).count(),
                Err(e) => {
                    fault = Some(e.to_string());
                    break;
                }
            }
        }
        if let Some(fault) = fault {
            failures.push(format!("prohibition_rescan (fault: {fault})"));
        } else if errors > 0 {
            failures.push(format!("prohibition_rescan ({errors} error-severity violations)"));
        }

        let tool = "fake_scan+fraud_scan+redline+prohibition_rescan";
        if failures.is_empty() {
            GateResult::new(
                &GATES[2],
                true,
                tool,
                format!("all integrity checks clean ({} files re-scanned)", input.files.len()),
            )
        } else {
            GateResult::new(&GATES[2], false, tool, format!("failed: {}", failures.join(", ")))
        }
    }
}

fn step_passed(steps: &[StepResult], step: u8) -> bool {
    steps.iter().any(|s| s.step == step && s.passed)
}

fn pass_through(def: &GateDef, steps: &[StepResult], step: u8) -> GateResult {
    match steps.iter().find(|s| s.step == step) {
        Some(s) => GateResult::new(def, s.passed, &s.name, s.details.clone()),
        None => GateResult::new(def, false, def.name, format!("step {step} did not run")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FaultMode, STEP_DEFS};
    use crate::rules::PatternRuleEngine;

    fn steps(failing: &[u8]) -> Vec<StepResult> {
        STEP_DEFS
            .iter()
            .map(|def| {
                if failing.contains(&def.step) {
                    StepResult::fail(def, FaultMode::ColdJoint, format!("{} broke", def.name))
                } else {
                    StepResult::pass(def, format!("{} ok", def.name))
                }
            })
            .collect()
    }

    fn clean_input() -> RunInput {
        RunInput::default().with_file("src/lib.rs", "pub fn one() -> u8 {\n    1\n}\n")
    }

    #[test]
    fn test_all_gates_pass() {
        let report = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps(&[]), &clean_input());
        assert!(report.all_passed);
        assert!(report.failed().is_empty());
        assert_eq!(report.g1.detail, "interface_contact ok");
    }

    #[test]
    fn test_pass_through_detail() {
        let report = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps(&[9]), &clean_input());
        assert!(report.g1.passed);
        assert!(!report.g2.passed);
        assert_eq!(report.g2.detail, "spec_coverage broke");
        assert!(!report.g4.passed);
        assert_eq!(report.g4.detail, "failed: G2");
        assert!(!report.all_passed);
    }

    #[test]
    fn test_g3_lists_failing_subchecks() {
        let report = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps(&[2, 7]), &clean_input());
        assert!(!report.g3.passed);
        assert_eq!(report.g3.detail, "failed: fraud_scan, redline");
    }

    #[test]
    fn test_g3_rescan_ignores_lint_step() {
        // Lint step passed (external linter), but the source still carries a suppression.
        let input = clean_input().with_file("web/app.ts", "// eslint-disable\nexport const a = 1;\n");
        let report = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps(&[]), &input);
        assert!(!report.g3.passed);
        assert!(report.g3.detail.contains("prohibition_rescan (1 error-severity violations)"));
        assert!(!report.g4.passed);
    }

    #[test]
    fn test_g4_requires_build_and_test() {
        let report = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps(&[3, 5]), &clean_input());
        assert!(report.g1.passed && report.g2.passed && report.g3.passed);
        assert!(!report.g4.passed);
        assert_eq!(report.g4.detail, "failed: build, test");
    }

    #[test]
    fn test_gate_table() {
        let ids: Vec<&str> = GATES.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["G1", "G2", "G3", "G4"]);
    }
}
