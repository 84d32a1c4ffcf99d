//! Evidence collector — sixteen named proof records.
//!
//! Each record is a pure function of one step result or one externally
//! supplied field. Absent data never yields a blank record: the summary says
//! what was not provided.

use crate::config::QcConfig;
use crate::pipeline::{RunInput, StepResult};
use serde::{Deserialize, Serialize};

/// Record names in their fixed order.
pub const EVIDENCE_NAMES: [&str; 16] = [
    "scan",
    "fraud",
    "build",
    "lint",
    "test",
    "coverage",
    "redline",
    "sync",
    "mapping",
    "impl",
    "iav",
    "blds",
    "datasource",
    "package",
    "run",
    "audit",
];

const NOT_PROVIDED: &str = "NOT PROVIDED";

/// One category of proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub name: String,
    /// Conventional log path under the evidence directory
    pub path: String,
    /// The underlying data was available to the run
    pub exists: bool,
    /// Lines in the rendered log
    pub line_count: usize,
    pub zero_violations: bool,
    pub summary: String,
    /// Rendered log text, written by the caller
    #[serde(skip)]
    pub content: String,
}

impl EvidenceRecord {
    fn new(input: &RunInput, name: &str, exists: bool, clean: bool, summary: String, body: Option<&str>) -> Self {
        let status = if !exists {
            NOT_PROVIDED
        } else if clean {
            "CLEAN"
        } else {
            "VIOLATIONS"
        };
        let mut content = format!("# {name}\nstatus: {status}\nsummary: {summary}\n");
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            content.push_str(body);
            if !body.ends_with('\n') {
                content.push('\n');
            }
        }
        Self {
            name: name.to_string(),
            path: input.evidence_path(name),
            exists,
            line_count: content.lines().count(),
            zero_violations: exists && clean,
            summary,
            content,
        }
    }

    fn missing(input: &RunInput, name: &str, what: &str) -> Self {
        Self::new(input, name, false, false, format!("{NOT_PROVIDED}: no {what} supplied"), None)
    }
}

/// The sixteen records of one run, in fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceCatalogue {
    records: Vec<EvidenceRecord>,
}

impl EvidenceCatalogue {
    pub fn get(&self, name: &str) -> Option<&EvidenceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Whether the named record exists and has zero violations.
    pub fn is_clean(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| r.zero_violations)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some_and(|r| r.exists)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct EvidenceCollector<'a> {
    config: &'a QcConfig,
}

impl<'a> EvidenceCollector<'a> {
    pub fn new(config: &'a QcConfig) -> Self {
        Self { config }
    }

    pub fn collect(&self, steps: &[StepResult], input: &RunInput) -> EvidenceCatalogue {
        let records = EVIDENCE_NAMES
            .iter()
            .map(|name| self.record(name, steps, input))
            .collect();
        EvidenceCatalogue { records }
    }

    fn record(&self, name: &str, steps: &[StepResult], input: &RunInput) -> EvidenceRecord {
        match name {
            "scan" => step_record(input, name, steps, 1, true),
            "fraud" => step_record(input, name, steps, 2, true),
            "build" => step_record(input, name, steps, 3, input.build.is_some()),
            "lint" => step_record(input, name, steps, 4, true),
            "test" => step_record(input, name, steps, 5, input.test.is_some()),
            "coverage" => step_record(input, name, steps, 6, input.coverage.is_some()),
            "redline" => step_record(input, name, steps, 7, true),
            "sync" => step_record(input, name, steps, 8, true),
            "mapping" => mapping_record(input, steps),
            "impl" => impl_record(input, steps),
            "iav" => match input.proof.as_ref().and_then(|p| p.identity_check) {
                None => EvidenceRecord::missing(input, name, "identity check"),
                Some(ok) => EvidenceRecord::new(
                    input,
                    name,
                    true,
                    ok,
                    if ok {
                        "identity five-question check passed".to_string()
                    } else {
                        "identity five-question check failed".to_string()
                    },
                    None,
                ),
            },
            "blds" => match input.proof.as_ref().and_then(|p| p.realism_score) {
                None => EvidenceRecord::missing(input, name, "realism score"),
                Some(score) => {
                    let in_range = score.is_finite() && (0.0..=5.0).contains(&score);
                    let clean = in_range && score >= self.config.min_realism;
                    let summary = if !in_range {
                        format!("realism score {score} outside 0-5")
                    } else {
                        format!("realism score {score:.1}/5 (minimum {:.1})", self.config.min_realism)
                    };
                    EvidenceRecord::new(input, name, true, clean, summary, None)
                }
            },
            "datasource" => match input.proof.as_ref().and_then(|p| p.traceable) {
                None => EvidenceRecord::missing(input, name, "data-source traceability judgement"),
                Some(ok) => EvidenceRecord::new(
                    input,
                    name,
                    true,
                    ok,
                    if ok {
                        "every data source traceable".to_string()
                    } else {
                        "untraceable data source".to_string()
                    },
                    None,
                ),
            },
            "package" | "run" => {
                let result = if name == "package" { &input.package } else { &input.run };
                match result {
                    None => EvidenceRecord::missing(input, name, &format!("{name} result")),
                    Some(p) => EvidenceRecord::new(
                        input,
                        name,
                        true,
                        p.succeeded(),
                        format!("{name} exited {}", p.exit_code),
                        p.log.as_deref(),
                    ),
                }
            }
            "audit" => match &input.audit {
                None => EvidenceRecord::missing(input, name, "security audit"),
                Some(a) => EvidenceRecord::new(
                    input,
                    name,
                    true,
                    a.is_clean(),
                    format!(
                        "{} critical, {} high, {} moderate, {} low",
                        a.critical, a.high, a.moderate, a.low
                    ),
                    a.log.as_deref(),
                ),
            },
            other => EvidenceRecord::missing(input, other, "data for this record"),
        }
    }
}

fn find(steps: &[StepResult], step: u8) -> Option<&StepResult> {
    steps.iter().find(|s| s.step == step)
}

fn step_record(input: &RunInput, name: &str, steps: &[StepResult], step: u8, provided: bool) -> EvidenceRecord {
    match find(steps, step) {
        Some(s) if provided => {
            EvidenceRecord::new(input, name, true, s.passed, s.details.clone(), s.raw_log.as_deref())
        }
        Some(s) => EvidenceRecord::new(
            input,
            name,
            false,
            false,
            format!("{NOT_PROVIDED}: {}", s.details),
            None,
        ),
        None => EvidenceRecord::missing(input, name, &format!("step {step} result")),
    }
}

fn mapping_record(input: &RunInput, steps: &[StepResult]) -> EvidenceRecord {
    let Some(spec) = &input.spec else {
        return EvidenceRecord::missing(input, "mapping", "spec metadata");
    };
    let Some(s) = find(steps, 9) else {
        return EvidenceRecord::missing(input, "mapping", "spec coverage result");
    };
    let expected = spec.named_functions().len();
    let missing = s.stat("missing").unwrap_or(0.0);
    let clean = expected > 0 && missing == 0.0;
    let summary = format!(
        "{} expected, {} found, {} missing",
        expected,
        s.stat("found").unwrap_or(0.0),
        missing
    );
    EvidenceRecord::new(input, "mapping", true, clean, summary, s.raw_log.as_deref())
}

/// Synthesized from the spec-coverage step: the implementation exists when every
/// expected function is present and the checklist is done.
fn impl_record(input: &RunInput, steps: &[StepResult]) -> EvidenceRecord {
    match find(steps, 9) {
        Some(s) if input.spec.is_some() => EvidenceRecord::new(
            input,
            "impl",
            s.passed,
            s.passed,
            if s.passed {
                "implementation complete".to_string()
            } else {
                format!("implementation incomplete: {}", s.details)
            },
            None,
        ),
        _ => EvidenceRecord::missing(input, "impl", "spec metadata"),
    }
}
