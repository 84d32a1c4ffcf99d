//! Rule catalogue — immutable redline, prohibition and axiom tables.
//!
//! Redlines are hard violations that must be zero. Prohibitions are style
//! limits; only their error-severity entries block a gate. Axioms are guiding
//! principles that cannot be checked mechanically and are listed for reports.

use super::mask::Language;
use super::Severity;
use serde::Serialize;

/// Which part of the source a rule is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanScope {
    /// Unmasked text, comments included (markers live in comments).
    Raw,
    /// Comments masked, string literals visible.
    CodeAndStrings,
    /// Comments and string contents masked.
    Code,
}

/// Redline sub-family, used by the fake-implementation and fraud steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedlineClass {
    General,
    /// Empty stub, hardcoded fraud object, bypass marker.
    Fraud,
    /// Placeholder or fabricated implementation.
    Fabrication,
}

/// How a rule detects violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Checker {
    /// Regex over the scoped text.
    Pattern(&'static str),
    /// Any line longer than this many characters.
    MaxLineLength(usize),
    /// Whole file longer than this many lines.
    MaxFileLines(usize),
}

/// A single entry in a rule table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub scope: ScanScope,
    pub checker: Checker,
    /// Restrict to these languages; empty means all.
    pub languages: &'static [Language],
    pub message: &'static str,
    pub suggestion: &'static str,
}

impl RuleDef {
    pub fn applies_to(&self, language: Language) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }
}

/// A redline entry with its sub-family.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RedlineDef {
    #[serde(flatten)]
    pub rule: RuleDef,
    pub class: RedlineClass,
}

/// A non-automatable guiding principle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AxiomDef {
    pub id: &'static str,
    pub name: &'static str,
    pub principle: &'static str,
}

const ALL: &[Language] = &[];

pub const REDLINES: &[RedlineDef] = &[
    RedlineDef {
        rule: RuleDef {
            id: "R01",
            name: "hardcoded_credential",
            severity: Severity::Error,
            scope: ScanScope::CodeAndStrings,
            checker: Checker::Pattern(
                r#"(?i)\b(password|passwd|pwd|secret|api[_-]?key|access[_-]?token|private[_-]?key)\b["']?\s*[:=]\s*["'][^"'\s]{4,}["']"#,
            ),
            languages: ALL,
            message: "Hardcoded credential in source",
            suggestion: "Load secrets from the environment or a secret store",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R02",
            name: "tls_verification_disabled",
            severity: Severity::Error,
            scope: ScanScope::CodeAndStrings,
            checker: Checker::Pattern(
                r"(?i)(\bverify\s*=\s*false\b|rejectUnauthorized\s*:\s*false|danger_accept_invalid_certs\s*\(\s*true\s*\)|InsecureSkipVerify\s*:\s*true|NODE_TLS_REJECT_UNAUTHORIZED)",
            ),
            languages: ALL,
            message: "TLS certificate verification disabled",
            suggestion: "Keep certificate verification on; trust a custom CA instead",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R03",
            name: "empty_catch",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(
                r"(?m)(\bcatch\s*(\([^)]*\))?\s*\{\s*\}|\bexcept\b[^:\n]*:\s*pass\s*$)",
            ),
            languages: ALL,
            message: "Empty catch block swallows errors",
            suggestion: "Handle, log or rethrow the error",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R04",
            name: "dynamic_code_execution",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(r"(\beval\s*\(|\bnew\s+Function\s*\()"),
            languages: &[Language::Script, Language::Python],
            message: "Dynamic code execution",
            suggestion: "Replace eval with explicit parsing or dispatch",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R05",
            name: "sql_concatenation",
            severity: Severity::Error,
            scope: ScanScope::CodeAndStrings,
            checker: Checker::Pattern(
                r#"(?i)["'`]\s*(select|insert|update|delete)\b[^"'`\n]*["'`]\s*\+\s*[A-Za-z_]"#,
            ),
            languages: ALL,
            message: "SQL built by string concatenation",
            suggestion: "Use parameterized queries",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R06",
            name: "shell_injection",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(
                r"(child_process\.exec\s*\(|\bos\.system\s*\(|\bsubprocess\.\w+\([^)]*shell\s*=\s*True)",
            ),
            languages: &[Language::Script, Language::Python],
            message: "Shell command built from program input",
            suggestion: "Pass an argument vector without a shell",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R07",
            name: "unsafe_deserialization",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(r"(\bpickle\.loads?\s*\(|\bmarshal\.loads?\s*\()"),
            languages: &[Language::Python],
            message: "Deserialization of untrusted data",
            suggestion: "Use a data-only format such as JSON",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R08",
            name: "security_check_disabled",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(
                r"(?i)\b(disable|skip)_?(csrf|auth|authentication|authorization|security)\b\s*[:=]\s*(true|1)\b",
            ),
            languages: ALL,
            message: "Security control switched off",
            suggestion: "Remove the switch; security controls are not configurable off",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R09",
            name: "swallowed_rejection",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(r"\.catch\s*\(\s*(\(\s*\w*\s*\)|\w+)\s*=>\s*\{\s*\}\s*\)"),
            languages: &[Language::Script],
            message: "Promise rejection silently discarded",
            suggestion: "Handle or propagate the rejection",
        },
        class: RedlineClass::General,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R10",
            name: "empty_stub",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(
                r"(?m)(\bfn\s+\w+\s*(<[^>{]*>)?\s*\([^)]*\)\s*(->\s*[^{;]+)?\{\s*\}|\bfunction\s+\w+\s*\([^)]*\)\s*\{\s*\}|\bdef\s+\w+\s*\([^)]*\)\s*(->\s*[^:]+)?:\s*(pass|\.\.\.)\s*$)",
            ),
            languages: ALL,
            message: "Function with an empty body",
            suggestion: "Implement the function or remove it",
        },
        class: RedlineClass::Fraud,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R11",
            name: "hardcoded_fraud_object",
            severity: Severity::Error,
            scope: ScanScope::CodeAndStrings,
            checker: Checker::Pattern(
                r#"(?i)\breturn\s+\{\s*["']?(success|ok|valid|verified|passed|authenticated)["']?\s*:\s*true\b"#,
            ),
            languages: ALL,
            message: "Hardcoded success object returned without doing the work",
            suggestion: "Return the outcome of the real operation",
        },
        class: RedlineClass::Fraud,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R12",
            name: "bypass_marker",
            severity: Severity::Error,
            scope: ScanScope::Raw,
            checker: Checker::Pattern(
                r"(?i)(\bcodeqc[-_:\s]*(ignore|disable|bypass|skip)\b|\b(bypass|skip)[_-]?(qc|gate|gates|verification|license[_-]?check)\b)",
            ),
            languages: ALL,
            message: "Quality-gate bypass marker",
            suggestion: "Remove the marker and fix the underlying finding",
        },
        class: RedlineClass::Fraud,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R13",
            name: "placeholder_implementation",
            severity: Severity::Error,
            scope: ScanScope::CodeAndStrings,
            checker: Checker::Pattern(
                r#"(\bunimplemented!\s*\(|\btodo!\s*\(|\braise\s+NotImplementedError\b|\bthrow\s+new\s+Error\s*\(\s*["'`](?i:not\s+implemented))"#,
            ),
            languages: ALL,
            message: "Placeholder in place of an implementation",
            suggestion: "Implement the behavior",
        },
        class: RedlineClass::Fabrication,
    },
    RedlineDef {
        rule: RuleDef {
            id: "R14",
            name: "fabricated_data",
            severity: Severity::Error,
            scope: ScanScope::Code,
            checker: Checker::Pattern(
                r"(?i)\b(fake|dummy|simulated)_?(data|response|result|results|user|users|payload|balance|score|metrics)\b",
            ),
            languages: ALL,
            message: "Fabricated data served as a real result",
            suggestion: "Wire the real data source",
        },
        class: RedlineClass::Fabrication,
    },
];

pub const PROHIBITIONS: &[RuleDef] = &[
    RuleDef {
        id: "P01",
        name: "debug_output",
        severity: Severity::Warning,
        scope: ScanScope::Code,
        checker: Checker::Pattern(r"(?m)(\bconsole\.(log|debug)\s*\(|\bprintln!\s*\(|\bdbg!\s*\(|^[ \t]*print\s*\()"),
        languages: ALL,
        message: "Debug output left in code",
        suggestion: "Use the project logger",
    },
    RuleDef {
        id: "P02",
        name: "todo_marker",
        severity: Severity::Warning,
        scope: ScanScope::Raw,
        checker: Checker::Pattern(r"\b(TODO|FIXME|XXX|HACK)\b"),
        languages: ALL,
        message: "Unresolved work marker",
        suggestion: "Resolve the item or track it in the issue tracker",
    },
    RuleDef {
        id: "P03",
        name: "long_line",
        severity: Severity::Info,
        scope: ScanScope::Raw,
        checker: Checker::MaxLineLength(160),
        languages: ALL,
        message: "Line longer than 160 characters",
        suggestion: "Wrap the line",
    },
    RuleDef {
        id: "P04",
        name: "oversized_file",
        severity: Severity::Warning,
        scope: ScanScope::Raw,
        checker: Checker::MaxFileLines(800),
        languages: ALL,
        message: "File longer than 800 lines",
        suggestion: "Split the file by responsibility",
    },
    RuleDef {
        id: "P05",
        name: "lint_suppression",
        severity: Severity::Error,
        scope: ScanScope::Raw,
        checker: Checker::Pattern(
            r"(@ts-ignore|@ts-nocheck|eslint-disable|#\[allow\(clippy::|#\s*noqa\b|#\s*type:\s*ignore\b)",
        ),
        languages: ALL,
        message: "Lint or type-check suppression",
        suggestion: "Fix the finding instead of suppressing it",
    },
    RuleDef {
        id: "P06",
        name: "debugger_statement",
        severity: Severity::Error,
        scope: ScanScope::Code,
        checker: Checker::Pattern(r"(?m)^[ \t]*debugger[ \t]*;?[ \t]*$"),
        languages: &[Language::Script],
        message: "Debugger statement left in code",
        suggestion: "Remove the statement",
    },
    RuleDef {
        id: "P07",
        name: "any_type",
        severity: Severity::Warning,
        scope: ScanScope::Code,
        checker: Checker::Pattern(r"(:\s*any\b|\bas\s+any\b|<any>)"),
        languages: &[Language::Script],
        message: "Untyped `any`",
        suggestion: "Declare a concrete type or `unknown`",
    },
    RuleDef {
        id: "P08",
        name: "unwrap_call",
        severity: Severity::Warning,
        scope: ScanScope::Code,
        checker: Checker::Pattern(r"\.unwrap\(\)"),
        languages: &[Language::Rust],
        message: "`unwrap()` outside tests",
        suggestion: "Propagate the error with `?`",
    },
];

pub const AXIOMS: &[AxiomDef] = &[
    AxiomDef {
        id: "A01",
        name: "evidence_over_assertion",
        principle: "A claim of completion counts only with reproducible evidence",
    },
    AxiomDef {
        id: "A02",
        name: "no_silent_failure",
        principle: "Every failure is surfaced, never swallowed",
    },
    AxiomDef {
        id: "A03",
        name: "every_interface_connected",
        principle: "Every declared interface has a live counterpart",
    },
    AxiomDef {
        id: "A04",
        name: "tests_exercise_real_paths",
        principle: "Tests run the production path, not a stand-in",
    },
    AxiomDef {
        id: "A05",
        name: "names_state_intent",
        principle: "Names say what a thing does",
    },
    AxiomDef {
        id: "A06",
        name: "bounded_resources",
        principle: "Every buffer, queue and retry has an explicit bound",
    },
];

/// Look up a redline by ID.
pub fn redline(id: &str) -> Option<&'static RedlineDef> {
    REDLINES.iter().find(|r| r.rule.id == id)
}

/// Whether a rule ID belongs to the fabrication family.
pub fn is_fabrication_rule(id: &str) -> bool {
    redline(id).is_some_and(|r| r.class == RedlineClass::Fabrication)
}
