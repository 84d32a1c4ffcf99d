//! Proof-pack manifest: per-file SHA-256 digests sealed by a Merkle root.
//!
//! The manifest sits beside the evidence logs it lists. Anyone holding the
//! pack can rehash the files and recompute the root without rerunning the gate.

use crate::report::RunResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const MANIFEST_VERSION: &str = "codeqc-proofpack-3";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Digest and size of one evidence file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub sha256: String,
    pub bytes: u64,
}

impl FileDigest {
    pub fn of(data: &[u8]) -> Self {
        Self {
            sha256: hex::encode(Sha256::digest(data)),
            bytes: data.len() as u64,
        }
    }
}

/// Where the pack was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEnv {
    pub os: String,
    pub ci: bool,
}

impl ManifestEnv {
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            ci: std::env::var("CI").is_ok_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofManifest {
    pub version: String,
    pub run_id: String,
    pub nonce: String,
    pub evidence_hash: String,
    pub timestamp: DateTime<Utc>,
    /// Keyed by forward-slash path relative to the evidence directory
    pub hashes: BTreeMap<String, FileDigest>,
    pub merkle_root: String,
    pub env: ManifestEnv,
}

impl ProofManifest {
    /// Digest `files` for `result`. An entry named like the manifest itself
    /// is skipped.
    pub fn build<'a, I>(result: &RunResult, files: I, env: ManifestEnv) -> Self
    where
        I: IntoIterator<Item = (String, &'a [u8])>,
    {
        let hashes: BTreeMap<String, FileDigest> = files
            .into_iter()
            .map(|(path, data)| (path.replace('\\', "/"), data))
            .filter(|(path, _)| path != MANIFEST_FILE)
            .map(|(path, data)| (path, FileDigest::of(data)))
            .collect();
        let merkle_root = merkle_root(hashes.values().map(|d| d.sha256.as_str()));

        Self {
            version: MANIFEST_VERSION.to_string(),
            run_id: run_id(result.timestamp),
            nonce: result.nonce.clone(),
            evidence_hash: result.evidence_hash.clone(),
            timestamp: result.timestamp,
            hashes,
            merkle_root,
            env,
        }
    }

    /// True when the recorded root matches the listed digests.
    pub fn verify_root(&self) -> bool {
        merkle_root(self.hashes.values().map(|d| d.sha256.as_str())) == self.merkle_root
    }
}

/// `RUN-YYYYmmdd-HHMMSS-` followed by eight random hex digits.
pub fn run_id(at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("RUN-{}-{}", at.format("%Y%m%d-%H%M%S"), &suffix[..8])
}

/// Merkle root over hex digests, taken in sorted order. Each parent hashes the
/// raw bytes of its two children; an odd last node pairs with itself. No
/// digests at all yield the hash of `b"empty"`.
pub fn merkle_root<'a>(digests: impl IntoIterator<Item = &'a str>) -> String {
    let mut sorted: Vec<&str> = digests.into_iter().collect();
    if sorted.is_empty() {
        return hex::encode(Sha256::digest(b"empty"));
    }
    sorted.sort_unstable();

    // Undecodable entries hash as their text
    let mut level: Vec<Vec<u8>> = sorted
        .iter()
        .map(|h| hex::decode(h).unwrap_or_else(|_| h.as_bytes().to_vec()))
        .collect();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().cloned() {
                level.push(last);
            }
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(&pair[0]);
                hasher.update(&pair[1]);
                hasher.finalize().to_vec()
            })
            .collect();
    }
    hex::encode(&level[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QcConfig, QualityGate, RunInput};

    fn digest(data: &[u8]) -> String {
        FileDigest::of(data).sha256
    }

    fn parent(left: &str, right: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(hex::decode(left).unwrap());
        hasher.update(hex::decode(right).unwrap());
        hex::encode(hasher.finalize())
    }

    #[test]
    fn test_empty_and_single_leaf() {
        assert_eq!(merkle_root(std::iter::empty()), digest(b"empty"));
        let leaf = digest(b"scan");
        assert_eq!(merkle_root([leaf.as_str()]), leaf);
    }

    #[test]
    fn test_pairs_in_sorted_order() {
        let mut leaves = [digest(b"a"), digest(b"b")];
        leaves.sort();
        let expected = parent(&leaves[0], &leaves[1]);
        assert_eq!(merkle_root([leaves[1].as_str(), leaves[0].as_str()]), expected);
        assert_eq!(merkle_root([leaves[0].as_str(), leaves[1].as_str()]), expected);
    }

    #[test]
    fn test_odd_node_pairs_with_itself() {
        let mut leaves = [digest(b"a"), digest(b"b"), digest(b"c")];
        leaves.sort();
        let expected = parent(
            &parent(&leaves[0], &leaves[1]),
            &parent(&leaves[2], &leaves[2]),
        );
        assert_eq!(merkle_root(leaves.iter().map(String::as_str)), expected);
    }

    #[test]
    fn test_build_lists_files_and_seals_root() {
        let result = QualityGate::new(QcConfig::default()).run(&RunInput::default());
        let files = vec![
            ("scan.log".to_string(), b"# scan\n".as_slice()),
            ("nested\\audit.log".to_string(), b"# audit\n".as_slice()),
            (MANIFEST_FILE.to_string(), b"{}".as_slice()),
        ];
        let mut manifest = ProofManifest::build(&result, files, ManifestEnv::default());

        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert_eq!(manifest.nonce, result.nonce);
        assert_eq!(manifest.evidence_hash, result.evidence_hash);
        let keys: Vec<&str> = manifest.hashes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["nested/audit.log", "scan.log"]);
        assert_eq!(manifest.hashes["scan.log"].bytes, 7);
        assert!(manifest.verify_root());

        manifest.hashes.insert("late.log".to_string(), FileDigest::of(b"x"));
        assert!(!manifest.verify_root());
    }

    #[test]
    fn test_run_id_shape() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T09:08:07Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = run_id(at);
        assert!(id.starts_with("RUN-20260301-090807-"), "{id}");
        let suffix = &id["RUN-20260301-090807-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
