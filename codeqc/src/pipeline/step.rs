//! Step results and the fixed ten-step table.

use crate::rules::Violation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a step failed. Triage label only; never alters control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultMode {
    /// Fabricated implementation
    FabricatedSignal,
    /// Open interface or missing required evidence
    OpenCircuit,
    /// Failed build/test joint
    ColdJoint,
    /// Stale or copied evidence
    StaleEvidence,
    /// Unbounded resource
    Overload,
    /// Tight coupling
    ShortCircuit,
    /// Excessive complexity
    Overheat,
    /// Unclear naming or style noise
    Noise,
}

impl FaultMode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::FabricatedSignal => "fabricated implementation",
            Self::OpenCircuit => "open interface or missing evidence",
            Self::ColdJoint => "failed build/test joint",
            Self::StaleEvidence => "stale or copied evidence",
            Self::Overload => "unbounded resource",
            Self::ShortCircuit => "tight coupling",
            Self::Overheat => "excessive complexity",
            Self::Noise => "unclear naming",
        }
    }
}

impl std::fmt::Display for FaultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FabricatedSignal => write!(f, "fabricated signal"),
            Self::OpenCircuit => write!(f, "open circuit"),
            Self::ColdJoint => write!(f, "cold joint"),
            Self::StaleEvidence => write!(f, "stale evidence"),
            Self::Overload => write!(f, "overload"),
            Self::ShortCircuit => write!(f, "short circuit"),
            Self::Overheat => write!(f, "overheat"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

/// Static description of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDef {
    pub step: u8,
    pub name: &'static str,
    /// A failing fatal step fails the whole run.
    pub fatal: bool,
    /// Evidence log file stem
    pub log: &'static str,
}

pub const STEP_DEFS: [StepDef; 10] = [
    StepDef { step: 1, name: "fake_scan", fatal: true, log: "scan" },
    StepDef { step: 2, name: "fraud_scan", fatal: true, log: "fraud" },
    StepDef { step: 3, name: "build", fatal: true, log: "build" },
    StepDef { step: 4, name: "lint", fatal: false, log: "lint" },
    StepDef { step: 5, name: "test", fatal: true, log: "test" },
    StepDef { step: 6, name: "coverage", fatal: false, log: "coverage" },
    StepDef { step: 7, name: "redline", fatal: true, log: "redline" },
    StepDef { step: 8, name: "interface_contact", fatal: true, log: "sync" },
    StepDef { step: 9, name: "spec_coverage", fatal: true, log: "mapping" },
    StepDef { step: 10, name: "delivery", fatal: true, log: "delivery" },
];

/// Outcome of one pipeline step. Exactly one per step per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step index, 1–10
    pub step: u8,
    pub name: String,
    pub passed: bool,
    pub fatal: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_path: Option<String>,
    /// Human-readable outcome naming the failure cause
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault_mode: Option<FaultMode>,
    /// Offending lines, capped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_log: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<String, f64>,
}

impl StepResult {
    fn new(def: &StepDef, passed: bool, details: impl Into<String>) -> Self {
        Self {
            step: def.step,
            name: def.name.to_string(),
            passed,
            fatal: def.fatal,
            duration_ms: 0,
            evidence_path: None,
            details: details.into(),
            fault_mode: None,
            raw_log: None,
            violations: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    pub fn pass(def: &StepDef, details: impl Into<String>) -> Self {
        Self::new(def, true, details)
    }

    pub fn fail(def: &StepDef, fault: FaultMode, details: impl Into<String>) -> Self {
        let mut result = Self::new(def, false, details);
        result.fault_mode = Some(fault);
        result
    }

    /// Failing result for a step whose required input was never supplied.
    pub fn open_circuit(def: &StepDef, what: &str) -> Self {
        Self::fail(
            def,
            FaultMode::OpenCircuit,
            format!("open circuit: no {what} supplied; the gate cannot determine this itself"),
        )
    }

    pub fn with_stat(mut self, key: &str, value: impl Into<f64>) -> Self {
        self.stats.insert(key.to_string(), value.into());
        self
    }

    pub fn with_raw_log(mut self, raw: Option<String>) -> Self {
        self.raw_log = raw.filter(|r| !r.is_empty());
        self
    }

    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn stat(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied()
    }

    /// Fault label or "-" for display.
    pub fn fault_label(&self) -> String {
        self.fault_mode
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Join lines into a raw log, keeping at most `max` and noting the rest.
pub(crate) fn capped_log<I>(lines: I, max: usize) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let lines: Vec<String> = lines.into_iter().collect();
    if lines.is_empty() {
        return None;
    }
    let mut kept: Vec<String> = lines.iter().take(max).cloned().collect();
    if lines.len() > max {
        kept.push(format!("... {} more", lines.len() - max));
    }
    Some(kept.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_table_is_ordered() {
        for (idx, def) in STEP_DEFS.iter().enumerate() {
            assert_eq!(def.step as usize, idx + 1);
        }
        let non_fatal: Vec<u8> = STEP_DEFS.iter().filter(|d| !d.fatal).map(|d| d.step).collect();
        assert_eq!(non_fatal, vec![4, 6]);
    }

    #[test]
    fn test_open_circuit() {
        let result = StepResult::open_circuit(&STEP_DEFS[2], "build result");
        assert!(!result.passed);
        assert!(result.fatal);
        assert_eq!(result.fault_mode, Some(FaultMode::OpenCircuit));
        assert!(result.details.starts_with("open circuit"));
        assert_eq!(result.fault_label(), "open circuit");
    }

    #[test]
    fn test_builders() {
        let result = StepResult::pass(&STEP_DEFS[8], "all mapped")
            .with_stat("missing", 0u32)
            .with_raw_log(Some(String::new()));
        assert_eq!(result.stat("missing"), Some(0.0));
        assert!(result.raw_log.is_none());
        assert_eq!(result.fault_label(), "-");
    }

    #[test]
    fn test_capped_log() {
        assert_eq!(capped_log(Vec::<String>::new(), 5), None);
        let log = capped_log((1..=4).map(|i| format!("line {i}")), 2).unwrap();
        assert_eq!(log, "line 1\nline 2\n... 2 more");
    }

    #[test]
    fn test_fault_mode_serde() {
        let json = serde_json::to_string(&FaultMode::FabricatedSignal).unwrap();
        assert_eq!(json, "\"fabricated_signal\"");
        assert_eq!(FaultMode::ColdJoint.description(), "failed build/test joint");
    }
}
