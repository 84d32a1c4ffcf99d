//! Tamper proof: run nonces and the canonical evidence hash.

use crate::dod::DoDStatus;
use crate::evidence::EvidenceCatalogue;
use crate::gates::GateReport;
use crate::pipeline::{FaultMode, ProductGrade, StepResult};
use crate::rules::Violation;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Longest nonce accepted.
pub const MAX_NONCE_LEN: usize = 128;

/// Fresh nonce: `NONCE-` followed by 32 lowercase hex digits.
pub fn generate_nonce() -> String {
    format!("NONCE-{}", uuid::Uuid::new_v4().simple())
}

/// Shape check only; no replay registry is consulted.
pub fn validate_nonce(nonce: &str) -> Result<(), String> {
    if nonce.trim().is_empty() {
        return Err("nonce is empty".to_string());
    }
    if nonce.len() > MAX_NONCE_LEN {
        return Err(format!("nonce longer than {MAX_NONCE_LEN} characters"));
    }
    if let Some(bad) = nonce
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
    {
        return Err(format!("nonce contains invalid character {bad:?}"));
    }
    Ok(())
}

/// True for a 64-character hex string (SHA-256 digest).
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Step fields that enter the hash; durations are excluded.
#[derive(Serialize)]
struct HashedStep<'a> {
    step: u8,
    name: &'a str,
    passed: bool,
    fatal: bool,
    evidence_path: Option<&'a str>,
    details: &'a str,
    fault_mode: Option<FaultMode>,
    raw_log: Option<&'a str>,
    violations: &'a [Violation],
    stats: &'a BTreeMap<String, f64>,
}

impl<'a> From<&'a StepResult> for HashedStep<'a> {
    fn from(s: &'a StepResult) -> Self {
        Self {
            step: s.step,
            name: &s.name,
            passed: s.passed,
            fatal: s.fatal,
            evidence_path: s.evidence_path.as_deref(),
            details: &s.details,
            fault_mode: s.fault_mode,
            raw_log: s.raw_log.as_deref(),
            violations: &s.violations,
            stats: &s.stats,
        }
    }
}

#[derive(Serialize)]
struct HashPayload<'a> {
    grade: ProductGrade,
    nonce: &'a str,
    steps: Vec<HashedStep<'a>>,
    gates: &'a GateReport,
    evidence: &'a EvidenceCatalogue,
    dod: &'a DoDStatus,
    proof_log: &'a str,
}

/// Everything the evidence hash covers.
pub struct HashInputs<'a> {
    pub grade: ProductGrade,
    pub nonce: &'a str,
    pub steps: &'a [StepResult],
    pub gates: &'a GateReport,
    pub evidence: &'a EvidenceCatalogue,
    pub dod: &'a DoDStatus,
    pub proof_log: Option<&'a str>,
}

/// SHA-256 hex over the canonical JSON of the run.
///
/// Identical inputs (nonce included) always produce the same digest.
pub fn evidence_hash(inputs: &HashInputs<'_>) -> String {
    let payload = HashPayload {
        grade: inputs.grade,
        nonce: inputs.nonce,
        steps: inputs.steps.iter().map(HashedStep::from).collect(),
        gates: inputs.gates,
        evidence: inputs.evidence,
        dod: inputs.dod,
        proof_log: inputs.proof_log.unwrap_or(""),
    };
    // Struct fields serialize in declaration order and maps are BTreeMaps,
    // so the JSON text is stable.
    let canonical = match serde_json::to_vec(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Evidence payload failed to serialize; hashing diagnostic");
            format!("unserializable:{e}").into_bytes()
        }
    };
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    format!("{:x}", hasher.finalize())
}
