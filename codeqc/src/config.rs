//! Gate configuration.
//!
//! Layering: [`QcConfig::default`] → optional TOML file → `CODEQC_*`
//! environment overrides. The CLI applies its own flags last.

use crate::error::{QcError, QcResult};
use crate::pipeline::input::ProductGrade;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Minimum line coverage (percent) for Commercial grade
    pub coverage_threshold_commercial: f64,
    /// Minimum line coverage (percent) for DeepTech grade
    pub coverage_threshold_deeptech: f64,
    /// Minimum realism score (0–5) for the authenticity channel and DoD item 7
    pub min_realism: f64,
    /// Directory names marking test code
    pub test_dirs: Vec<String>,
    /// File-name fragments marking test code (e.g. `.test.`, `_test.`)
    pub test_file_markers: Vec<String>,
    /// Directory names marking mocks and fakes
    pub mock_dirs: Vec<String>,
    /// File-name fragments marking mocks
    pub mock_file_markers: Vec<String>,
    /// Directory names marking UI code
    pub ui_dirs: Vec<String>,
    /// File extensions treated as UI assets
    pub ui_extensions: Vec<String>,
    /// Path fragments marking rule-table sources, which quote the patterns they detect
    pub rule_table_markers: Vec<String>,
    /// Cap on raw offending lines kept per step
    pub max_log_lines: usize,
    /// Composite score weights
    pub weights: ScoreWeights,
}

/// Channel weights for the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub functional: f64,
    pub quality: f64,
    pub authenticity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            functional: 0.4,
            quality: 0.3,
            authenticity: 0.3,
        }
    }
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            coverage_threshold_commercial: 80.0,
            coverage_threshold_deeptech: 90.0,
            min_realism: 4.0,
            test_dirs: strings(&["test", "tests", "__tests__", "spec", "specs", "testdata", "e2e"]),
            test_file_markers: strings(&[".test.", ".spec.", "_test.", "_spec.", "test_"]),
            mock_dirs: strings(&["mock", "mocks", "__mocks__", "fixtures", "fakes", "stubs"]),
            mock_file_markers: strings(&[".mock.", "_mock.", "mock_", ".stub."]),
            ui_dirs: strings(&["ui", "components", "views", "pages", "styles"]),
            ui_extensions: strings(&["css", "scss", "less", "html", "vue", "svelte"]),
            rule_table_markers: strings(&[
                "redlines",
                "prohibitions",
                "axioms",
                "rules/catalogue",
            ]),
            max_log_lines: 200,
            weights: ScoreWeights::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A path split into lowercase directory segments and file name.
struct PathParts {
    normalized: String,
    dirs: Vec<String>,
    file: String,
}

impl PathParts {
    fn new(path: &str) -> Self {
        let normalized = path.replace('\\', "/").to_lowercase();
        let mut segments: Vec<String> = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| s.to_string())
            .collect();
        let file = segments.pop().unwrap_or_default();
        Self {
            normalized,
            dirs: segments,
            file,
        }
    }

    fn in_dir(&self, names: &[String]) -> bool {
        self.dirs.iter().any(|d| names.iter().any(|n| n == d))
    }

    fn file_has(&self, markers: &[String]) -> bool {
        markers.iter().any(|m| {
            if m.ends_with('_') && !m.starts_with('_') {
                // prefix marker, e.g. `test_`
                self.file.starts_with(m.as_str())
            } else {
                self.file.contains(m.as_str())
            }
        })
    }
}

impl QcConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> QcResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| QcError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| QcError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `CODEQC_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("CODEQC_COVERAGE_COMMERCIAL") {
            if let Ok(n) = val.parse() {
                self.coverage_threshold_commercial = n;
            }
        }
        if let Ok(val) = std::env::var("CODEQC_COVERAGE_DEEPTECH") {
            if let Ok(n) = val.parse() {
                self.coverage_threshold_deeptech = n;
            }
        }
        if let Ok(val) = std::env::var("CODEQC_MIN_REALISM") {
            if let Ok(n) = val.parse() {
                self.min_realism = n;
            }
        }
        if let Ok(val) = std::env::var("CODEQC_MAX_LOG_LINES") {
            if let Ok(n) = val.parse() {
                self.max_log_lines = n;
            }
        }
    }

    /// Coverage threshold for a product grade.
    pub fn coverage_threshold(&self, grade: ProductGrade) -> f64 {
        match grade {
            ProductGrade::Commercial => self.coverage_threshold_commercial,
            ProductGrade::DeepTech => self.coverage_threshold_deeptech,
        }
    }

    pub fn is_test_path(&self, path: &str) -> bool {
        let parts = PathParts::new(path);
        parts.in_dir(&self.test_dirs) || parts.file_has(&self.test_file_markers)
    }

    pub fn is_mock_path(&self, path: &str) -> bool {
        let parts = PathParts::new(path);
        parts.in_dir(&self.mock_dirs) || parts.file_has(&self.mock_file_markers)
    }

    pub fn is_ui_path(&self, path: &str) -> bool {
        let parts = PathParts::new(path);
        let ext = parts.file.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
        parts.in_dir(&self.ui_dirs) || self.ui_extensions.iter().any(|e| e == ext)
    }

    pub fn is_rule_table_path(&self, path: &str) -> bool {
        let parts = PathParts::new(path);
        self.rule_table_markers
            .iter()
            .any(|m| parts.normalized.contains(m.as_str()))
    }

    /// Paths skipped by the fake, fraud and redline scans.
    pub fn is_scan_excluded(&self, path: &str) -> bool {
        self.is_test_path(path) || self.is_mock_path(path) || self.is_ui_path(path)
    }
}
