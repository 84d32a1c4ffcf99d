//! Score synthesizer — three weighted channels of four readings each.

use crate::config::{QcConfig, ScoreWeights};
use crate::evidence::EvidenceCatalogue;
use crate::pipeline::{RunInput, StepResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadingStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warn => write!(f, "WARN"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// One sub-measurement, amplitude 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    pub amplitude: f64,
    pub status: ReadingStatus,
}

impl Reading {
    fn new(name: &str, amplitude: f64, status: ReadingStatus) -> Self {
        Self {
            name: name.to_string(),
            amplitude: amplitude.clamp(0.0, 100.0),
            status,
        }
    }

    /// 100 PASS when `ok`, else 0 with `otherwise`.
    fn binary(name: &str, ok: bool, otherwise: ReadingStatus) -> Self {
        if ok {
            Self::new(name, 100.0, ReadingStatus::Pass)
        } else {
            Self::new(name, 0.0, otherwise)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub readings: Vec<Reading>,
    /// Mean amplitude, 2 decimals
    pub score: f64,
    pub status: ReadingStatus,
}

impl Channel {
    pub fn new(name: &str, readings: Vec<Reading>) -> Self {
        let score = if readings.is_empty() {
            0.0
        } else {
            round2(readings.iter().map(|r| r.amplitude).sum::<f64>() / readings.len() as f64)
        };
        let status = if readings.iter().any(|r| r.status == ReadingStatus::Fail) {
            ReadingStatus::Fail
        } else if readings.iter().any(|r| r.status == ReadingStatus::Warn) {
            ReadingStatus::Warn
        } else {
            ReadingStatus::Pass
        };
        Self {
            name: name.to_string(),
            readings,
            score,
            status,
        }
    }

    pub fn reading(&self, name: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub functional: Channel,
    pub quality: Channel,
    pub authenticity: Channel,
    /// Every channel PASS
    pub passed: bool,
    pub composite: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted composite of the three channel scores, 2 decimals.
pub fn composite(weights: &ScoreWeights, functional: f64, quality: f64, authenticity: f64) -> f64 {
    round2(
        weights.functional * functional
            + weights.quality * quality
            + weights.authenticity * authenticity,
    )
}

pub struct ScoreSynthesizer<'a> {
    config: &'a QcConfig,
}

impl<'a> ScoreSynthesizer<'a> {
    pub fn new(config: &'a QcConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(
        &self,
        input: &RunInput,
        steps: &[StepResult],
        evidence: &EvidenceCatalogue,
    ) -> ScoreReport {
        let functional = self.functional(input, steps, evidence);
        let quality = Channel::new(
            "quality",
            vec![
                Reading::binary("build_clean", step_passed(steps, 3), ReadingStatus::Fail),
                Reading::binary("lint_clean", step_passed(steps, 4), ReadingStatus::Fail),
                Reading::binary("redline_clean", step_passed(steps, 7), ReadingStatus::Fail),
                Reading::binary(
                    "security_clean",
                    input.audit.as_ref().is_some_and(|a| a.is_clean()),
                    ReadingStatus::Fail,
                ),
            ],
        );
        let authenticity = self.authenticity(input, steps, evidence);

        let composite = composite(
            &self.config.weights,
            functional.score,
            quality.score,
            authenticity.score,
        );
        let passed = [&functional, &quality, &authenticity]
            .iter()
            .all(|c| c.status == ReadingStatus::Pass);
        ScoreReport {
            functional,
            quality,
            authenticity,
            passed,
            composite,
        }
    }

    fn functional(&self, input: &RunInput, steps: &[StepResult], evidence: &EvidenceCatalogue) -> Channel {
        let spec_mapped = match &input.spec {
            None => Reading::new("spec_mapped", 0.0, ReadingStatus::Fail),
            Some(_) => {
                let missing = steps
                    .iter()
                    .find(|s| s.step == 9)
                    .and_then(|s| s.stat("missing"))
                    .unwrap_or(0.0);
                let status = if evidence.is_clean("mapping") {
                    ReadingStatus::Pass
                } else {
                    ReadingStatus::Fail
                };
                Reading::new("spec_mapped", (100.0 - 20.0 * missing).max(0.0), status)
            }
        };

        let test_ratio = input.test.as_ref().map(|t| t.pass_ratio()).unwrap_or(0.0);
        let test_pass_ratio = Reading::new(
            "test_pass_ratio",
            test_ratio,
            if step_passed(steps, 5) {
                ReadingStatus::Pass
            } else {
                ReadingStatus::Fail
            },
        );

        let threshold = self.config.coverage_threshold(input.grade);
        let percent = input
            .coverage
            .as_ref()
            .map(|c| c.percent)
            .filter(|p| p.is_finite())
            .unwrap_or(0.0);
        let coverage = Reading::new(
            "coverage",
            percent,
            if input.coverage.is_some() && percent >= threshold {
                ReadingStatus::Pass
            } else {
                ReadingStatus::Warn
            },
        );

        let impl_complete = if evidence.exists("impl") {
            Reading::new("impl_complete", 100.0, ReadingStatus::Pass)
        } else {
            Reading::new("impl_complete", 50.0, ReadingStatus::Warn)
        };

        Channel::new(
            "functional",
            vec![spec_mapped, test_pass_ratio, coverage, impl_complete],
        )
    }

    fn authenticity(&self, input: &RunInput, steps: &[StepResult], evidence: &EvidenceCatalogue) -> Channel {
        let realism = match input.proof.as_ref().and_then(|p| p.realism_score) {
            Some(score) if score.is_finite() => Reading::new(
                "realism",
                score / 5.0 * 100.0,
                if evidence.is_clean("blds") {
                    ReadingStatus::Pass
                } else {
                    ReadingStatus::Fail
                },
            ),
            _ => Reading::new("realism", 0.0, ReadingStatus::Fail),
        };

        Channel::new(
            "authenticity",
            vec![
                Reading::binary("fraud_clean", step_passed(steps, 2), ReadingStatus::Fail),
                Reading::binary("identity_check", evidence.is_clean("iav"), ReadingStatus::Fail),
                realism,
                Reading::binary("traceability", evidence.is_clean("datasource"), ReadingStatus::Warn),
            ],
        )
    }
}

fn step_passed(steps: &[StepResult], step: u8) -> bool {
    steps.iter().any(|s| s.step == step && s.passed)
}
