//! Definition of Done — eight completion criteria over evidence and gates.

use crate::evidence::EvidenceCatalogue;
use crate::gates::GateReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoDItem {
    /// 1–8
    pub id: u8,
    pub name: String,
    /// What was checked
    pub verification: String,
    pub passed: bool,
    pub evidence_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoDStatus {
    pub items: Vec<DoDItem>,
    pub mission_complete: bool,
}

impl DoDStatus {
    pub fn item(&self, id: u8) -> Option<&DoDItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn passed_count(&self) -> usize {
        self.items.iter().filter(|i| i.passed).count()
    }
}

pub struct DoDJudge;

impl DoDJudge {
    pub fn judge(evidence: &EvidenceCatalogue, gates: &GateReport) -> DoDStatus {
        let clean = |name: &str| evidence.is_clean(name);
        let path = |name: &str| {
            evidence
                .get(name)
                .map(|r| r.path.clone())
                .unwrap_or_default()
        };

        let items = vec![
            item(1, "zero_redlines", "redline record clean", clean("redline"), path("redline")),
            item(
                2,
                "spec_mapped",
                "mapping record clean and impl record exists",
                clean("mapping") && evidence.exists("impl"),
                path("mapping"),
            ),
            item(3, "spec_gate", "G2 passed", gates.g2.passed, path("mapping")),
            item(4, "interfaces_connected", "sync record clean", clean("sync"), path("sync")),
            item(5, "build_clean", "build record clean", clean("build"), path("build")),
            item(
                6,
                "delivered",
                "package and run records clean and G4 passed",
                clean("package") && clean("run") && gates.g4.passed,
                path("package"),
            ),
            item(
                7,
                "authentic",
                "iav and blds records clean",
                clean("iav") && clean("blds"),
                path("iav"),
            ),
            item(8, "fraud_free", "fraud record clean", clean("fraud"), path("fraud")),
        ];

        let mission_complete = items.iter().all(|i| i.passed);
        DoDStatus {
            items,
            mission_complete,
        }
    }
}

fn item(id: u8, name: &str, verification: &str, passed: bool, evidence_path: String) -> DoDItem {
    DoDItem {
        id,
        name: name.to_string(),
        verification: verification.to_string(),
        passed,
        evidence_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QcConfig;
    use crate::evidence::EvidenceCollector;
    use crate::gates::GateEvaluator;
    use crate::pipeline::{FaultMode, RunInput, StepResult, STEP_DEFS};
    use crate::rules::PatternRuleEngine;

    fn judge(failing: &[u8], input: &RunInput) -> DoDStatus {
        let steps: Vec<StepResult> = STEP_DEFS
            .iter()
            .map(|def| {
                if failing.contains(&def.step) {
                    StepResult::fail(def, FaultMode::ColdJoint, "broke")
                } else {
                    StepResult::pass(def, "ok")
                }
            })
            .collect();
        let evidence = EvidenceCollector::new(&QcConfig::default()).collect(&steps, input);
        let gates = GateEvaluator::new(&PatternRuleEngine).evaluate(&steps, input);
        DoDJudge::judge(&evidence, &gates)
    }

    #[test]
    fn test_eight_items() {
        let status = judge(&[], &RunInput::default());
        assert_eq!(status.items.len(), 8);
        let ids: Vec<u8> = status.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<u8>>());
        // No external data: build, mapping, delivery and authenticity cannot pass.
        assert!(!status.mission_complete);
        assert!(status.item(1).unwrap().passed);
        assert!(!status.item(5).unwrap().passed);
        assert!(status.item(8).unwrap().passed);
    }

    #[test]
    fn test_fraud_item_follows_step_two() {
        let status = judge(&[2], &RunInput::default());
        assert!(!status.item(8).unwrap().passed);
        assert_eq!(status.item(8).unwrap().evidence_path, "evidence/fraud.log");
    }

    #[test]
    fn test_mission_complete_needs_every_item() {
        let mut input = RunInput::default();
        input.proof = Some(crate::pipeline::ProofJudgements {
            identity_check: Some(true),
            realism_score: Some(4.5),
            traceable: Some(true),
        });
        let status = judge(&[], &input);
        assert!(status.item(7).unwrap().passed);
        assert!(!status.mission_complete);
        assert!(status.passed_count() < 8);
    }
}
