//! Pipeline runner — executes the ten steps in order.
//!
//! Every step runs regardless of earlier failures so the full evidence set is
//! always collected. A step never propagates: errors and panics inside a step
//! become a failing [`StepResult`] carrying the diagnostic.

use super::input::RunInput;
use super::step::{capped_log, FaultMode, StepDef, StepResult, STEP_DEFS};
use crate::config::QcConfig;
use crate::error::{QcError, QcResult};
use crate::rules::catalogue::is_fabrication_rule;
use crate::rules::{guarded_scan, RuleEngine, ScanKind, Severity, Violation};
use regex::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;
use std::time::Instant;

/// Explicit "this interface is not wired" markers. Bare words are only
/// markers inside a comment, so fields like `disconnected: bool` pass.
static DISCONNECTED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(@disconnected\b|\[disconnected\]|(//|#|/\*|--)\s*(disconnected\s*[:!]|not[ _-](connected|wired)\b))",
    )
    .unwrap()
});

/// Work markers that promise a connection later.
static CONNECT_TODO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(TODO|FIXME)\b.*\b(connect|wire|wiring|hook up|integrate)\b").unwrap()
});

/// Runs the ten verification steps against one [`RunInput`].
pub struct PipelineRunner<'a> {
    config: &'a QcConfig,
    engine: &'a dyn RuleEngine,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: &'a QcConfig, engine: &'a dyn RuleEngine) -> Self {
        Self { config, engine }
    }

    /// Run all ten steps. Always returns exactly ten results, ordered by step.
    pub fn run(&self, input: &RunInput) -> Vec<StepResult> {
        let mut steps: Vec<StepResult> = Vec::with_capacity(STEP_DEFS.len());
        for def in STEP_DEFS.iter() {
            let result = self.execute(def, input, &steps);
            steps.push(result);
        }
        steps
    }

    fn execute(&self, def: &StepDef, input: &RunInput, prior: &[StepResult]) -> StepResult {
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(def, input, prior)));

        let mut result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let fault = match e {
                    QcError::MalformedInput { .. } => FaultMode::StaleEvidence,
                    _ => FaultMode::OpenCircuit,
                };
                StepResult::fail(def, fault, format!("internal fault: {e}"))
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                StepResult::fail(
                    def,
                    FaultMode::OpenCircuit,
                    format!("internal fault: step panicked: {message}"),
                )
            }
        };

        result.duration_ms = start.elapsed().as_millis() as u64;
        result.evidence_path = Some(input.evidence_path(def.log));

        if result.passed {
            tracing::debug!(step = def.step, name = def.name, details = %result.details, "Step passed");
        } else if def.fatal {
            tracing::warn!(
                step = def.step,
                name = def.name,
                fault = %result.fault_label(),
                details = %result.details,
                "Fatal step failed"
            );
        } else {
            tracing::debug!(step = def.step, name = def.name, details = %result.details, "Step failed");
        }
        result
    }

    fn dispatch(&self, def: &StepDef, input: &RunInput, prior: &[StepResult]) -> QcResult<StepResult> {
        match def.step {
            1 => self.fake_scan(def, input),
            2 => self.fraud_scan(def, input),
            3 => Ok(self.build(def, input)),
            4 => self.lint(def, input),
            5 => self.test(def, input),
            6 => self.coverage(def, input),
            7 => self.redline(def, input),
            8 => Ok(self.interface_contact(def, input)),
            9 => Ok(self.spec_coverage(def, input)),
            10 => Ok(self.delivery(def, input, prior)),
            other => Err(QcError::malformed("step", format!("unknown step index {other}"))),
        }
    }

    /// Run one scan over every file not rejected by `skip`.
    ///
    /// Returns the violations and the number of files scanned.
    fn scan_files(
        &self,
        input: &RunInput,
        kind: ScanKind,
        skip: impl Fn(&str) -> bool,
    ) -> QcResult<(Vec<Violation>, usize)> {
        let mut violations = Vec::new();
        let mut scanned = 0;
        for file in input.files.iter().filter(|f| !skip(&f.path)) {
            violations.extend(guarded_scan(self.engine, kind, &file.content, &file.path)?);
            scanned += 1;
        }
        Ok((violations, scanned))
    }

    fn scan_outcome(
        &self,
        def: &StepDef,
        what: &str,
        violations: Vec<Violation>,
        scanned: usize,
    ) -> StepResult {
        let count = violations.len();
        let raw = capped_log(violations.iter().map(Violation::log_line), self.config.max_log_lines);
        let result = if count == 0 {
            StepResult::pass(def, format!("0 {what} violations in {scanned} files"))
        } else {
            let mut rules: Vec<&str> = violations.iter().map(|v| v.rule_id.as_str()).collect();
            rules.sort_unstable();
            rules.dedup();
            StepResult::fail(
                def,
                FaultMode::FabricatedSignal,
                format!(
                    "{count} {what} violation(s) in {scanned} files (rules: {})",
                    rules.join(", ")
                ),
            )
        };
        result
            .with_stat("violations", count as f64)
            .with_stat("files_scanned", scanned as f64)
            .with_raw_log(raw)
            .with_violations(violations)
    }

    fn fake_scan(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        let (hits, scanned) =
            self.scan_files(input, ScanKind::Redlines, |p| self.config.is_scan_excluded(p))?;
        let hits = hits
            .into_iter()
            .filter(|v| v.is_error() && is_fabrication_rule(&v.rule_id))
            .collect();
        Ok(self.scan_outcome(def, "fake-implementation", hits, scanned))
    }

    fn fraud_scan(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        let (hits, scanned) =
            self.scan_files(input, ScanKind::Fraud, |p| self.config.is_scan_excluded(p))?;
        let hits = hits.into_iter().filter(Violation::is_error).collect();
        Ok(self.scan_outcome(def, "fraud", hits, scanned))
    }

    fn build(&self, def: &StepDef, input: &RunInput) -> StepResult {
        let Some(build) = &input.build else {
            return StepResult::open_circuit(def, "build result");
        };
        let result = if build.exit_code == 0 && build.errors == 0 {
            StepResult::pass(
                def,
                format!("build succeeded with {} warnings", build.warnings),
            )
        } else {
            StepResult::fail(
                def,
                FaultMode::ColdJoint,
                format!(
                    "build failed: exit code {}, {} errors",
                    build.exit_code, build.errors
                ),
            )
        };
        result
            .with_stat("exit_code", build.exit_code)
            .with_stat("errors", build.errors as f64)
            .with_stat("warnings", build.warnings as f64)
            .with_raw_log(self.external_log(build.log.as_deref()))
    }

    fn lint(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        if let Some(lint) = &input.lint {
            let result = if lint.errors == 0 {
                StepResult::pass(
                    def,
                    format!("external lint: 0 errors, {} warnings", lint.warnings),
                )
            } else {
                StepResult::fail(
                    def,
                    FaultMode::Noise,
                    format!(
                        "external lint: {} errors, {} warnings",
                        lint.errors, lint.warnings
                    ),
                )
            };
            return Ok(result
                .with_stat("errors", lint.errors as f64)
                .with_stat("warnings", lint.warnings as f64)
                .with_raw_log(self.external_log(lint.log.as_deref())));
        }

        // No external linter; fall back to the prohibition table.
        let (hits, scanned) = self.scan_files(input, ScanKind::Prohibitions, |_| false)?;
        let errors = hits.iter().filter(|v| v.is_error()).count();
        let warnings = hits.iter().filter(|v| v.severity == Severity::Warning).count();
        let raw = capped_log(hits.iter().map(Violation::log_line), self.config.max_log_lines);
        let result = if errors == 0 {
            StepResult::pass(
                def,
                format!("internal prohibition scan: 0 errors, {warnings} warnings in {scanned} files"),
            )
        } else {
            StepResult::fail(
                def,
                FaultMode::Noise,
                format!("internal prohibition scan: {errors} errors, {warnings} warnings in {scanned} files"),
            )
        };
        Ok(result
            .with_stat("errors", errors as f64)
            .with_stat("warnings", warnings as f64)
            .with_stat("files_scanned", scanned as f64)
            .with_raw_log(raw)
            .with_violations(hits))
    }

    fn test(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        let Some(test) = &input.test else {
            return Ok(StepResult::open_circuit(def, "test result"));
        };
        test.validate()?;

        let passed_count = test.total - test.failed;
        let result = if test.total == 0 {
            StepResult::fail(def, FaultMode::ColdJoint, "no tests ran (total = 0)")
        } else if test.failed > 0 {
            StepResult::fail(
                def,
                FaultMode::ColdJoint,
                format!("{} of {} tests failed", test.failed, test.total),
            )
        } else {
            StepResult::pass(def, format!("{} tests passed", test.total))
        };
        Ok(result
            .with_stat("total", test.total as f64)
            .with_stat("failed", test.failed as f64)
            .with_stat("passed", passed_count as f64)
            .with_raw_log(self.external_log(test.log.as_deref())))
    }

    fn coverage(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        let threshold = self.config.coverage_threshold(input.grade);
        let Some(coverage) = &input.coverage else {
            return Ok(StepResult::open_circuit(def, "coverage result")
                .with_stat("threshold", threshold));
        };
        coverage.validate()?;

        let result = if coverage.percent >= threshold {
            StepResult::pass(
                def,
                format!("coverage {:.2}% meets {threshold:.0}% ({})", coverage.percent, input.grade),
            )
        } else {
            StepResult::fail(
                def,
                FaultMode::ColdJoint,
                format!(
                    "coverage {:.2}% below {threshold:.0}% ({})",
                    coverage.percent, input.grade
                ),
            )
        };
        Ok(result
            .with_stat("percent", coverage.percent)
            .with_stat("threshold", threshold)
            .with_raw_log(self.external_log(coverage.log.as_deref())))
    }

    fn redline(&self, def: &StepDef, input: &RunInput) -> QcResult<StepResult> {
        let (hits, scanned) = self.scan_files(input, ScanKind::Redlines, |p| {
            self.config.is_rule_table_path(p) || self.config.is_scan_excluded(p)
        })?;
        let hits = hits.into_iter().filter(Violation::is_error).collect();
        Ok(self.scan_outcome(def, "redline", hits, scanned))
    }

    fn interface_contact(&self, def: &StepDef, input: &RunInput) -> StepResult {
        let mut hits = Vec::new();
        let mut scanned = 0;
        for file in input.files.iter().filter(|f| {
            !self.config.is_rule_table_path(&f.path)
                && !self.config.is_test_path(&f.path)
                && !self.config.is_mock_path(&f.path)
        }) {
            scanned += 1;
            for (idx, line) in file.content.lines().enumerate() {
                let found = DISCONNECTED_MARKER
                    .find(line)
                    .map(|m| (m.start(), "Interface marked as disconnected"))
                    .or_else(|| {
                        CONNECT_TODO
                            .find(line)
                            .map(|m| (m.start(), "Unresolved connect/wire work marker"))
                    });
                if let Some((offset, message)) = found {
                    hits.push(Violation {
                        rule_id: "SYNC".to_string(),
                        name: "disconnected_interface".to_string(),
                        severity: Severity::Error,
                        file: file.path.clone(),
                        line: idx + 1,
                        column: line[..offset].chars().count() + 1,
                        message: message.to_string(),
                        snippet: Some(crate::rules::engine::truncate_line(line, 120)),
                        suggestion: Some("Wire the interface to its real counterpart".to_string()),
                    });
                }
            }
        }

        let count = hits.len();
        let raw = capped_log(hits.iter().map(Violation::log_line), self.config.max_log_lines);
        let result = if count == 0 {
            StepResult::pass(def, format!("all interfaces connected ({scanned} files)"))
        } else {
            let files = {
                let mut f: Vec<&str> = hits.iter().map(|v| v.file.as_str()).collect();
                f.dedup();
                f.len()
            };
            StepResult::fail(
                def,
                FaultMode::OpenCircuit,
                format!("{count} disconnected interface marker(s) in {files} file(s)"),
            )
        };
        result
            .with_stat("violations", count as f64)
            .with_stat("files_scanned", scanned as f64)
            .with_raw_log(raw)
            .with_violations(hits)
    }

    fn spec_coverage(&self, def: &StepDef, input: &RunInput) -> StepResult {
        let Some(spec) = &input.spec else {
            return StepResult::open_circuit(def, "spec metadata (expected functions and checklist)");
        };

        let source = input
            .files
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let names = spec.named_functions();
        let mut missing = Vec::new();
        for name in &names {
            let present = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
                .map(|re| re.is_match(&source))
                .unwrap_or_else(|_| source.contains(*name));
            if !present {
                missing.push(name.to_string());
            }
        }
        let unchecked: Vec<&str> = spec
            .checklist
            .iter()
            .filter(|c| !c.done)
            .map(|c| c.item.as_str())
            .collect();

        let expected = names.len();
        let checklist_total = spec.checklist.len();
        let checklist_done = checklist_total - unchecked.len();

        let mut reasons = Vec::new();
        if expected == 0 {
            reasons.push("no expected functions supplied".to_string());
        }
        if checklist_total == 0 {
            reasons.push("completion checklist is empty".to_string());
        }
        if !missing.is_empty() {
            reasons.push(format!("missing functions: {}", missing.join(", ")));
        }
        if !unchecked.is_empty() {
            reasons.push(format!("{} checklist item(s) incomplete", unchecked.len()));
        }

        let raw = capped_log(
            missing
                .iter()
                .map(|m| format!("missing function: {m}"))
                .chain(unchecked.iter().map(|u| format!("unchecked: {u}"))),
            self.config.max_log_lines,
        );

        let result = if reasons.is_empty() {
            StepResult::pass(
                def,
                format!("{expected} expected functions mapped, {checklist_done}/{checklist_total} checklist items done"),
            )
        } else {
            StepResult::fail(def, FaultMode::OpenCircuit, reasons.join("; "))
        };
        result
            .with_stat("expected", expected as f64)
            .with_stat("found", (expected - missing.len()) as f64)
            .with_stat("missing", missing.len() as f64)
            .with_stat("checklist_total", checklist_total as f64)
            .with_stat("checklist_done", checklist_done as f64)
            .with_raw_log(raw)
    }

    fn delivery(&self, def: &StepDef, input: &RunInput, prior: &[StepResult]) -> StepResult {
        let failed_fatal: Vec<String> = prior
            .iter()
            .filter(|s| s.fatal && !s.passed)
            .map(|s| format!("{}:{}", s.step, s.name))
            .collect();

        let mut reasons = Vec::new();
        if !failed_fatal.is_empty() {
            reasons.push(format!("fatal steps failed: {}", failed_fatal.join(", ")));
        }
        match &input.package {
            None => reasons.push("no package result supplied".to_string()),
            Some(p) if !p.succeeded() => reasons.push(format!("package exited {}", p.exit_code)),
            Some(_) => {}
        }
        match &input.run {
            None => reasons.push("no run result supplied".to_string()),
            Some(r) if !r.succeeded() => reasons.push(format!("run exited {}", r.exit_code)),
            Some(_) => {}
        }

        let result = if reasons.is_empty() {
            StepResult::pass(def, "all fatal steps passed; package and run exited 0")
        } else {
            StepResult::fail(def, FaultMode::ColdJoint, reasons.join("; "))
        };
        let logs: Vec<String> = [("package", &input.package), ("run", &input.run)]
            .into_iter()
            .filter_map(|(name, p)| {
                p.as_ref()
                    .and_then(|p| p.log.as_deref())
                    .map(|log| format!("[{name}]\n{log}"))
            })
            .collect();
        result
            .with_stat("failed_fatal_steps", failed_fatal.len() as f64)
            .with_raw_log(self.external_log(Some(logs.join("\n").as_str())))
    }

    /// Cap an externally supplied log to the configured line count.
    fn external_log(&self, log: Option<&str>) -> Option<String> {
        log.and_then(|l| capped_log(l.lines().map(str::to_string), self.config.max_log_lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::{
        BuildResult, ChecklistItem, CoverageResult, LintResult, ProcessResult, ProductGrade,
        SpecMetadata, TestResult,
    };
    use crate::rules::PatternRuleEngine;

    fn run(input: &RunInput) -> Vec<StepResult> {
        let config = QcConfig::default();
        let engine = PatternRuleEngine::new();
        PipelineRunner::new(&config, &engine).run(input)
    }

    fn healthy_input() -> RunInput {
        let mut input = RunInput::new(ProductGrade::Commercial)
            .with_file("src/cart.rs", "pub fn add_item(cart: &mut Vec<u32>, id: u32) {\n    cart.push(id);\n}\n");
        input.build = Some(BuildResult::default());
        input.lint = Some(LintResult::default());
        input.test = Some(TestResult { total: 12, failed: 0, log: None });
        input.coverage = Some(CoverageResult { percent: 85.0, log: None });
        input.package = Some(ProcessResult::default());
        input.run = Some(ProcessResult::default());
        input.spec = Some(SpecMetadata {
            expected_functions: vec!["add_item".to_string()],
            checklist: vec![ChecklistItem { item: "cart".to_string(), done: true }],
        });
        input
    }

    #[test]
    fn test_ten_ordered_steps_even_when_empty() {
        let steps = run(&RunInput::default());
        assert_eq!(steps.len(), 10);
        for (idx, step) in steps.iter().enumerate() {
            assert_eq!(step.step as usize, idx + 1);
            assert!(step.evidence_path.is_some());
        }
    }

    #[test]
    fn test_healthy_input_passes_every_step() {
        let steps = run(&healthy_input());
        for step in &steps {
            assert!(step.passed, "step {} failed: {}", step.step, step.details);
        }
        assert_eq!(steps[0].evidence_path.as_deref(), Some("evidence/scan.log"));
        assert_eq!(steps[7].evidence_path.as_deref(), Some("evidence/sync.log"));
    }

    #[test]
    fn test_missing_external_results_open_circuit() {
        let mut input = healthy_input();
        input.build = None;
        input.test = None;
        input.coverage = None;
        let steps = run(&input);
        for idx in [2, 4, 5] {
            assert!(!steps[idx].passed);
            assert_eq!(steps[idx].fault_mode, Some(FaultMode::OpenCircuit));
            assert!(steps[idx].details.contains("open circuit"));
        }
        assert!(!steps[9].passed);
        assert!(steps[9].details.contains("3:build"));
    }

    #[test]
    fn test_build_failure_is_cold_joint() {
        let mut input = healthy_input();
        input.build = Some(BuildResult { exit_code: 1, errors: 4, warnings: 0, log: Some("error[E0308]".to_string()) });
        let steps = run(&input);
        assert!(!steps[2].passed);
        assert_eq!(steps[2].fault_mode, Some(FaultMode::ColdJoint));
        assert_eq!(steps[2].stat("errors"), Some(4.0));
        assert_eq!(steps[2].raw_log.as_deref(), Some("error[E0308]"));
    }

    #[test]
    fn test_zero_tests_fail() {
        let mut input = healthy_input();
        input.test = Some(TestResult::default());
        let steps = run(&input);
        assert!(!steps[4].passed);
        assert!(steps[4].details.contains("no tests ran"));
    }

    #[test]
    fn test_malformed_test_result_becomes_failing_step() {
        let mut input = healthy_input();
        input.test = Some(TestResult { total: 2, failed: 5, log: None });
        let steps = run(&input);
        assert_eq!(steps.len(), 10);
        assert!(!steps[4].passed);
        assert!(steps[4].details.starts_with("internal fault"));
        assert_eq!(steps[4].fault_mode, Some(FaultMode::StaleEvidence));
    }

    #[test]
    fn test_coverage_threshold_by_grade() {
        let mut input = healthy_input();
        input.coverage = Some(CoverageResult { percent: 85.0, log: None });
        assert!(run(&input)[5].passed);

        input.grade = ProductGrade::DeepTech;
        let steps = run(&input);
        assert!(!steps[5].passed);
        assert_eq!(steps[5].stat("threshold"), Some(90.0));
        assert_eq!(steps[5].fault_mode, Some(FaultMode::ColdJoint));
    }

    #[test]
    fn test_lint_falls_back_to_prohibitions() {
        let mut input = healthy_input();
        input.lint = None;
        input = input.with_file("web/app.ts", "// @ts-ignore\nconst a = 1;\n");
        let steps = run(&input);
        assert!(!steps[3].passed);
        assert!(steps[3].details.starts_with("internal prohibition scan"));
        assert_eq!(steps[3].stat("errors"), Some(1.0));
        assert!(!steps[3].fatal);
    }

    #[test]
    fn test_fake_scan_excludes_test_paths() {
        let input = healthy_input()
            .with_file("tests/fixtures.rs", "fn load() { let fake_data = vec![1]; }\n");
        let steps = run(&input);
        assert!(steps[0].passed, "{}", steps[0].details);

        let input = healthy_input().with_file("src/report.rs", "fn load() { let fake_data = vec![1]; }\n");
        let steps = run(&input);
        assert!(!steps[0].passed);
        assert_eq!(steps[0].fault_mode, Some(FaultMode::FabricatedSignal));
        assert!(steps[0].violations.iter().all(|v| is_fabrication_rule(&v.rule_id)));
    }

    #[test]
    fn test_redline_skips_rule_tables() {
        let table = "const PATTERN: &str = r#\"password = \"hunter22\"\"#;\n";
        let input = healthy_input().with_file("src/redlines.rs", table);
        assert!(run(&input)[6].passed);

        let input = healthy_input().with_file("src/db.ts", "const password = \"hunter22\";\n");
        let steps = run(&input);
        assert!(!steps[6].passed);
        assert!(steps[6].details.contains("R01"));
        assert!(steps[6].raw_log.as_deref().unwrap_or("").contains("src/db.ts:1"));
    }

    #[test]
    fn test_interface_contact_markers() {
        let input = healthy_input()
            .with_file("src/payments.ts", "// TODO: connect to the ledger service\nexport function pay() { return 1; }\n");
        let steps = run(&input);
        assert!(!steps[7].passed);
        assert_eq!(steps[7].fault_mode, Some(FaultMode::OpenCircuit));
        assert_eq!(steps[7].violations[0].line, 1);

        let input = healthy_input().with_file("src/api.py", "# @disconnected\ndef fetch():\n    return load()\n");
        assert!(!run(&input)[7].passed);

        let input = healthy_input().with_file("tests/api_test.py", "# @disconnected\n");
        assert!(run(&input)[7].passed);

        let input = healthy_input().with_file("src/sock.c", "/* DISCONNECTED: awaiting driver */\n");
        assert!(!run(&input)[7].passed);
    }

    #[test]
    fn test_interface_contact_ignores_identifiers() {
        let sources = [
            ("src/link.rs", "pub struct Link {\n    pub disconnected: bool,\n}\n"),
            ("src/session.py", "def close(self):\n    if self.disconnected:\n        return\n"),
            ("src/peer.ts", "interface Peer {\n  disconnected: boolean;\n  not_connected: number;\n}\n"),
            ("src/pool.rs", "// TODO: tune connection pool size\nfn pool() {}\n"),
            ("src/radio.rs", "// FIXME wireless retries are slow\nfn radio() {}\n"),
        ];
        for (path, content) in sources {
            let steps = run(&healthy_input().with_file(path, content));
            assert!(steps[7].passed, "{path}: {}", steps[7].details);
        }
    }

    #[test]
    fn test_spec_coverage_missing_function() {
        let mut input = RunInput::default().with_file("src/a.rs", "fn foo() {}\nfn foobar() {}\n");
        input.spec = Some(SpecMetadata {
            expected_functions: vec!["foo".to_string(), "bar".to_string()],
            checklist: vec![ChecklistItem { item: "a".to_string(), done: true }],
        });
        let steps = run(&input);
        assert!(!steps[8].passed);
        assert_eq!(steps[8].stat("missing"), Some(1.0));
        assert_eq!(steps[8].stat("found"), Some(1.0));
        assert!(steps[8].details.contains("bar"));
    }

    #[test]
    fn test_spec_coverage_requires_data() {
        let steps = run(&RunInput::default());
        assert!(!steps[8].passed);
        assert!(steps[8].details.contains("open circuit"));

        let mut input = RunInput::default();
        input.spec = Some(SpecMetadata::default());
        let steps = run(&input);
        assert!(!steps[8].passed);
        assert!(steps[8].details.contains("no expected functions"));
        assert!(steps[8].details.contains("checklist is empty"));
    }

    #[test]
    fn test_blank_function_names_do_not_count() {
        let mut input = RunInput::default().with_file("src/a.rs", "fn foo() {}\n");
        input.spec = Some(SpecMetadata {
            expected_functions: vec!["   ".to_string(), String::new()],
            checklist: vec![ChecklistItem { item: "a".to_string(), done: true }],
        });
        let steps = run(&input);
        assert!(!steps[8].passed);
        assert!(steps[8].details.contains("no expected functions"));
        assert_eq!(steps[8].stat("expected"), Some(0.0));

        if let Some(spec) = input.spec.as_mut() {
            spec.expected_functions.push(" foo ".to_string());
        }
        let steps = run(&input);
        assert!(steps[8].passed, "{}", steps[8].details);
        assert_eq!(steps[8].stat("expected"), Some(1.0));
        assert_eq!(steps[8].stat("found"), Some(1.0));
    }

    #[test]
    fn test_unchecked_checklist_fails() {
        let mut input = healthy_input();
        if let Some(spec) = input.spec.as_mut() {
            spec.checklist.push(ChecklistItem { item: "docs".to_string(), done: false });
        }
        let steps = run(&input);
        assert!(!steps[8].passed);
        assert_eq!(steps[8].stat("checklist_done"), Some(1.0));
        assert!(steps[8].raw_log.as_deref().unwrap_or("").contains("unchecked: docs"));
    }

    #[test]
    fn test_delivery_requires_package_and_run() {
        let mut input = healthy_input();
        input.run = Some(ProcessResult { exit_code: 2, log: None });
        let steps = run(&input);
        assert!(!steps[9].passed);
        assert!(steps[9].details.contains("run exited 2"));
    }

    #[test]
    fn test_non_fatal_failures_do_not_block_delivery() {
        let mut input = healthy_input();
        input.lint = Some(LintResult { errors: 3, warnings: 0, log: None });
        input.coverage = Some(CoverageResult { percent: 10.0, log: None });
        let steps = run(&input);
        assert!(!steps[3].passed);
        assert!(!steps[5].passed);
        assert!(steps[9].passed, "{}", steps[9].details);
    }

    struct PanickingEngine;

    impl RuleEngine for PanickingEngine {
        fn scan_redlines(&self, _source: &str, _path: &str) -> Vec<Violation> {
            panic!("detector crashed")
        }
        fn scan_fraud(&self, _source: &str, _path: &str) -> Vec<Violation> {
            Vec::new()
        }
        fn scan_prohibitions(&self, _source: &str, _path: &str) -> Vec<Violation> {
            Vec::new()
        }
    }

    #[test]
    fn test_engine_panic_isolated_to_step() {
        let config = QcConfig::default();
        let steps = PipelineRunner::new(&config, &PanickingEngine).run(&healthy_input());
        assert_eq!(steps.len(), 10);
        assert!(!steps[0].passed);
        assert!(steps[0].details.contains("detector crashed"));
        assert!(!steps[6].passed);
        assert!(steps[1].passed);
        assert!(steps[2].passed);
    }
}
