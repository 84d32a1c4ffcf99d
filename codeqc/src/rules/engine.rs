//! Default pattern-based [`RuleEngine`] over the static catalogue.
//!
//! Regexes are compiled once per process. Each scan masks the source at most
//! twice (comments only, comments and strings) and reuses the masked text for
//! every rule with the same scope.

use super::catalogue::{Checker, RedlineClass, RuleDef, ScanScope, PROHIBITIONS, REDLINES};
use super::mask::{mask, Language, MaskMode};
use super::{RuleEngine, Violation};
use regex::Regex;
use std::sync::LazyLock;

/// A rule with its checker resolved.
struct CompiledRule {
    def: &'static RuleDef,
    class: Option<RedlineClass>,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn new(def: &'static RuleDef, class: Option<RedlineClass>) -> Self {
        let pattern = match def.checker {
            Checker::Pattern(src) => Some(
                Regex::new(src)
                    .unwrap_or_else(|e| panic!("rule {} has an invalid pattern: {e}", def.id)),
            ),
            Checker::MaxLineLength(_) | Checker::MaxFileLines(_) => None,
        };
        Self {
            def,
            class,
            pattern,
        }
    }
}

static COMPILED_REDLINES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    REDLINES
        .iter()
        .map(|r| CompiledRule::new(&r.rule, Some(r.class)))
        .collect()
});

static COMPILED_PROHIBITIONS: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    PROHIBITIONS
        .iter()
        .map(|p| CompiledRule::new(p, None))
        .collect()
});

/// Lazily masked views of one source file.
struct ScopedSource<'a> {
    raw: &'a str,
    language: Language,
    comments_masked: Option<String>,
    all_masked: Option<String>,
}

impl<'a> ScopedSource<'a> {
    fn new(raw: &'a str, path: &str) -> Self {
        Self {
            raw,
            language: Language::from_path(path),
            comments_masked: None,
            all_masked: None,
        }
    }

    fn text(&mut self, scope: ScanScope) -> &str {
        let (raw, language) = (self.raw, self.language);
        match scope {
            ScanScope::Raw => raw,
            ScanScope::CodeAndStrings => self
                .comments_masked
                .get_or_insert_with(|| mask(raw, language, MaskMode::Comments))
                .as_str(),
            ScanScope::Code => self
                .all_masked
                .get_or_insert_with(|| mask(raw, language, MaskMode::CommentsAndStrings))
                .as_str(),
        }
    }
}

/// Built-in rule engine over the redline and prohibition tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRuleEngine;

impl PatternRuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn scan<'r>(
        rules: impl Iterator<Item = &'r CompiledRule>,
        source: &str,
        path: &str,
    ) -> Vec<Violation> {
        let mut scoped = ScopedSource::new(source, path);
        let language = scoped.language;
        let mut violations = Vec::new();

        for rule in rules.filter(|r| r.def.applies_to(language)) {
            match (&rule.pattern, rule.def.checker) {
                (Some(regex), _) => {
                    let text = scoped.text(rule.def.scope);
                    let mut last_line = 0;
                    for m in regex.find_iter(text) {
                        let (line, column) = line_col(source, m.start());
                        // One hit per rule per line.
                        if line == last_line {
                            continue;
                        }
                        last_line = line;
                        violations.push(violation(rule.def, source, path, line, column));
                    }
                }
                (None, Checker::MaxLineLength(max)) => {
                    for (idx, line) in source.lines().enumerate() {
                        if line.chars().count() > max {
                            violations.push(violation(rule.def, source, path, idx + 1, max + 1));
                        }
                    }
                }
                (None, Checker::MaxFileLines(max)) => {
                    if source.lines().count() > max {
                        violations.push(violation(rule.def, source, path, max + 1, 1));
                    }
                }
                (None, Checker::Pattern(_)) => {}
            }
        }

        violations
    }
}

impl RuleEngine for PatternRuleEngine {
    fn scan_redlines(&self, source: &str, path: &str) -> Vec<Violation> {
        Self::scan(COMPILED_REDLINES.iter(), source, path)
    }

    fn scan_fraud(&self, source: &str, path: &str) -> Vec<Violation> {
        Self::scan(
            COMPILED_REDLINES
                .iter()
                .filter(|r| r.class == Some(RedlineClass::Fraud)),
            source,
            path,
        )
    }

    fn scan_prohibitions(&self, source: &str, path: &str) -> Vec<Violation> {
        Self::scan(COMPILED_PROHIBITIONS.iter(), source, path)
    }
}

fn violation(def: &RuleDef, source: &str, path: &str, line: usize, column: usize) -> Violation {
    Violation {
        rule_id: def.id.to_string(),
        name: def.name.to_string(),
        severity: def.severity,
        file: path.to_string(),
        line,
        column,
        message: def.message.to_string(),
        snippet: source
            .lines()
            .nth(line.saturating_sub(1))
            .map(|l| truncate_line(l, 120)),
        suggestion: Some(def.suggestion.to_string()),
    }
}

/// 1-indexed line and column (in characters) of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

pub(crate) fn truncate_line(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.rule_id.as_str()).collect()
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED_REDLINES.len(), REDLINES.len());
        assert_eq!(COMPILED_PROHIBITIONS.len(), PROHIBITIONS.len());
    }

    #[test]
    fn test_hardcoded_credential_detected() {
        let src = "const config = {\n  password: \"s3cr3t-value\",\n};\n";
        let hits = PatternRuleEngine.scan_redlines(src, "src/config.ts");
        let cred: Vec<_> = hits.iter().filter(|v| v.rule_id == "R01").collect();
        assert_eq!(cred.len(), 1, "{hits:?}");
        assert_eq!(cred[0].line, 2);
        assert_eq!(cred[0].column, 3);
        assert_eq!(cred[0].snippet.as_deref(), Some("password: \"s3cr3t-value\","));
    }

    #[test]
    fn test_credential_in_comment_ignored() {
        let src = "// password = \"s3cr3t-value\"\nlet x = 1;\n";
        let hits = PatternRuleEngine.scan_redlines(src, "src/lib.rs");
        assert!(!ids(&hits).contains(&"R01"), "{hits:?}");
    }

    #[test]
    fn test_empty_catch_detected() {
        let src = "try {\n  run();\n} catch (e) {\n}\n";
        let hits = PatternRuleEngine.scan_redlines(src, "src/app.js");
        assert!(ids(&hits).contains(&"R03"), "{hits:?}");
    }

    #[test]
    fn test_eval_inside_string_ignored() {
        let src = "const help = \"never call eval(x)\";\n";
        let hits = PatternRuleEngine.scan_redlines(src, "src/help.ts");
        assert!(!ids(&hits).contains(&"R04"), "{hits:?}");
    }

    #[test]
    fn test_fraud_subset_only() {
        let src = "function check() {}\nconst password = \"hunter22\";\n";
        let fraud = PatternRuleEngine.scan_fraud(src, "src/check.js");
        assert_eq!(ids(&fraud), vec!["R10"]);
        let all = PatternRuleEngine.scan_redlines(src, "src/check.js");
        assert!(ids(&all).contains(&"R01"));
        assert!(ids(&all).contains(&"R10"));
    }

    #[test]
    fn test_hardcoded_fraud_object() {
        let src = "def verify(token):\n    return {\"verified\": True}\n";
        let hits = PatternRuleEngine.scan_fraud(src, "svc/auth.py");
        assert!(ids(&hits).contains(&"R11"), "{hits:?}");
    }

    #[test]
    fn test_bypass_marker_in_comment() {
        let src = "// codeqc-ignore next line\nlet a = 1;\n";
        let hits = PatternRuleEngine.scan_fraud(src, "src/lib.rs");
        assert_eq!(ids(&hits), vec!["R12"]);
        assert_eq!(hits[0].line, 1);
    }

    #[test]
    fn test_placeholder_detected() {
        let src = "pub fn total(&self) -> u64 {\n    todo!()\n}\n";
        let hits = PatternRuleEngine.scan_redlines(src, "src/cart.rs");
        assert!(ids(&hits).contains(&"R13"), "{hits:?}");
    }

    #[test]
    fn test_prohibitions() {
        let src = "// TODO: tidy\n// @ts-ignore\nlet v: any = 1;\ndebugger;\n";
        let hits = PatternRuleEngine.scan_prohibitions(src, "web/app.ts");
        let found = ids(&hits);
        assert!(found.contains(&"P02"));
        assert!(found.contains(&"P05"));
        assert!(found.contains(&"P06"));
        assert!(found.contains(&"P07"));
        assert_eq!(hits.iter().filter(|v| v.is_error()).count(), 2);
    }

    #[test]
    fn test_long_line_and_oversized_file() {
        let long = "x".repeat(170);
        let hits = PatternRuleEngine.scan_prohibitions(&long, "notes.txt");
        assert_eq!(ids(&hits), vec!["P03"]);
        assert_eq!(hits[0].column, 161);

        let big = "a\n".repeat(801);
        let hits = PatternRuleEngine.scan_prohibitions(&big, "big.txt");
        assert_eq!(ids(&hits), vec!["P04"]);
        assert_eq!(hits[0].line, 801);
    }

    #[test]
    fn test_clean_source_has_no_redlines() {
        let src = "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        assert!(PatternRuleEngine.scan_redlines(src, "src/math.rs").is_empty());
    }

    #[test]
    fn test_line_col() {
        let src = "ab\ncdé\nf";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 3), (2, 1));
        assert_eq!(line_col(src, src.len() - 1), (3, 1));
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("hello", 10), "hello");
        assert_eq!(truncate_line("hello world abc", 10), "hello worl...");
        assert_eq!(truncate_line("  padded  ", 20), "padded");
    }
}
