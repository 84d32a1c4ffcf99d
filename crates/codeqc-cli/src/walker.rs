//! Source walker — .gitignore-respecting file discovery using the `ignore` crate

use anyhow::{Context, Result};
use codeqc::SourceFile;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extensions read as source text.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "java", "kt", "swift", "c", "h",
    "cc", "cpp", "hpp", "cs", "rb", "php", "sh", "bash", "toml", "yaml", "yml", "vue", "svelte",
    "html", "css", "scss",
];

/// Files larger than this are skipped.
const MAX_FILE_BYTES: u64 = 1024 * 1024;

pub struct SourceWalker {
    root: PathBuf,
}

impl SourceWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Source files under root with paths relative to it, sorted.
    pub fn collect(&self) -> Result<Vec<SourceFile>> {
        let mut paths = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true) // skip hidden dirs
            .git_ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_source(path) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > MAX_FILE_BYTES {
                tracing::debug!(path = %path.display(), size, "Skipping oversized file");
                continue;
            }
            paths.push(path.to_path_buf());
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let Ok(content) = String::from_utf8(bytes) else {
                tracing::warn!(path = %path.display(), "Skipping non-UTF-8 file");
                continue;
            };
            files.push(SourceFile::new(self.relative(&path), content));
        }
        Ok(files)
    }

    /// Path relative to root with forward slashes.
    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
