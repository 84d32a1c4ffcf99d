//! Writes the evidence logs of a run to disk.

use anyhow::{Context, Result};
use codeqc::manifest::MANIFEST_FILE;
use codeqc::{ManifestEnv, ProofManifest, RunResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Write every evidence record plus `delivery.log` and the proof-pack
/// manifest, resolving relative record paths against `base`. Returns the
/// written paths in order, the manifest last.
pub fn write_evidence(result: &RunResult, base: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut packed: Vec<(String, String)> = Vec::new();
    for record in result.evidence.iter() {
        let path = base.join(&record.path);
        write_file(&path, &record.content)?;
        written.push(path);
        packed.push((record.path.clone(), record.content.clone()));
    }

    if let Some(delivery) = result.step(10) {
        let mut content = format!(
            "# delivery\nstatus: {}\nsummary: {}\nnonce: {}\nevidence_hash: {}\n",
            if delivery.passed { "CLEAN" } else { "VIOLATIONS" },
            delivery.details,
            result.nonce,
            result.evidence_hash
        );
        if let Some(raw) = &delivery.raw_log {
            content.push_str(raw);
            content.push('\n');
        }
        let rel = delivery
            .evidence_path
            .clone()
            .unwrap_or_else(|| "evidence/delivery.log".to_string());
        let path = base.join(&rel);
        write_file(&path, &content)?;
        written.push(path);
        packed.push((rel, content));
    }

    let dir = evidence_dir(result);
    let files = packed
        .iter()
        .map(|(rel, content)| (manifest_key(&dir, rel), content.as_bytes()));
    let manifest = ProofManifest::build(result, files, ManifestEnv::detect());
    let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    let path = base.join(&dir).join(MANIFEST_FILE);
    write_file(&path, &json)?;
    written.push(path);

    tracing::info!(
        count = written.len(),
        run_id = %manifest.run_id,
        merkle_root = %manifest.merkle_root,
        "Evidence logs written"
    );
    Ok(written)
}

/// Directory holding the evidence records, relative to the write base.
fn evidence_dir(result: &RunResult) -> PathBuf {
    result
        .evidence
        .iter()
        .next()
        .and_then(|r| Path::new(&r.path).parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("evidence"))
}

fn manifest_key(dir: &Path, rel: &str) -> String {
    let path = Path::new(rel);
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
