//! Integrity ladder — nine levels of increasing assurance.
//!
//! The achieved level is the highest level reached contiguously from LV1: the
//! first failing check caps the ladder even if a higher check would pass.
//! LV4 and LV5 inspect the shape of the nonce and hash only. LV6 and above
//! need machinery outside this process and always fail here.

use crate::pipeline::{ProductGrade, StepResult};
use crate::tamper::{is_hex_digest, validate_nonce};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelDef {
    pub level: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub const LEVELS: [LevelDef; 9] = [
    LevelDef { level: 1, name: "redline_clean", description: "Full redline scan passed" },
    LevelDef { level: 2, name: "lint_clean", description: "Lint or prohibition scan passed" },
    LevelDef { level: 3, name: "authentic_code", description: "Fake-implementation and fraud scans passed" },
    LevelDef { level: 4, name: "nonce_bound", description: "Run bound to a well-formed nonce" },
    LevelDef { level: 5, name: "evidence_hashed", description: "Evidence sealed by a SHA-256 digest" },
    LevelDef { level: 6, name: "external_replay", description: "Independent verifier replayed the evidence" },
    LevelDef { level: 7, name: "trusted_execution", description: "Run attested by a trusted execution environment" },
    LevelDef { level: 8, name: "adversarial_review", description: "Cross-model adversarial review" },
    LevelDef { level: 9, name: "formal_verification", description: "Formally verified" },
];

const NOT_AUTOMATABLE: &str = "not automatable at this tier";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderCheck {
    pub level: u8,
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderReport {
    pub target_level: u8,
    pub achieved_level: u8,
    /// Checks for levels 1..=target
    pub checks: Vec<LadderCheck>,
    pub passed: bool,
}

pub struct IntegrityLadder;

impl IntegrityLadder {
    pub fn evaluate(
        grade: ProductGrade,
        steps: &[StepResult],
        nonce: &str,
        evidence_hash: &str,
    ) -> LadderReport {
        let target = grade.target_level();
        let checks: Vec<LadderCheck> = LEVELS
            .iter()
            .take(target as usize)
            .map(|def| Self::check(def, steps, nonce, evidence_hash))
            .collect();

        let achieved_level = achieved_level(&checks);
        let passed = checks.iter().all(|c| c.passed);
        tracing::debug!(target_level = target, achieved_level, "Integrity ladder evaluated");
        LadderReport {
            target_level: target,
            achieved_level,
            checks,
            passed,
        }
    }

    fn check(def: &LevelDef, steps: &[StepResult], nonce: &str, evidence_hash: &str) -> LadderCheck {
        let (passed, detail) = match def.level {
            1 => step_check(steps, &[7]),
            2 => step_check(steps, &[4]),
            3 => step_check(steps, &[1, 2]),
            4 => match validate_nonce(nonce) {
                Ok(()) => (true, format!("nonce {nonce} supplied")),
                Err(e) => (false, e),
            },
            5 => {
                if is_hex_digest(evidence_hash) {
                    (true, "64-hex evidence hash present".to_string())
                } else {
                    (false, "evidence hash missing or not 64 hex characters".to_string())
                }
            }
            _ => (false, format!("{}: {NOT_AUTOMATABLE}", def.description)),
        };
        LadderCheck {
            level: def.level,
            name: def.name.to_string(),
            passed,
            detail,
        }
    }
}

/// Highest level L such that levels 1..=L all passed.
pub fn achieved_level(checks: &[LadderCheck]) -> u8 {
    checks
        .iter()
        .take_while(|c| c.passed)
        .map(|c| c.level)
        .last()
        .unwrap_or(0)
}

fn step_check(steps: &[StepResult], required: &[u8]) -> (bool, String) {
    let failed: Vec<String> = required
        .iter()
        .filter(|n| !steps.iter().any(|s| s.step == **n && s.passed))
        .map(|n| {
            steps
                .iter()
                .find(|s| s.step == *n)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("step {n}"))
        })
        .collect();
    if failed.is_empty() {
        let names: Vec<String> = required
            .iter()
            .filter_map(|n| steps.iter().find(|s| s.step == *n).map(|s| s.name.clone()))
            .collect();
        (true, format!("{} passed", names.join(" and ")))
    } else {
        (false, format!("{} failed", failed.join(" and ")))
    }
}
