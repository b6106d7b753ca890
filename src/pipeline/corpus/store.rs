//! Versioned, checksummed on-disk form of a `PatternCorpus`.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers never observe a partial artifact.

use std::io::Write;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::types::PatternCorpus;
use super::CorpusError;

pub const CORPUS_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusArtifact {
    pub format_version: u32,
    /// RFC 3339 build timestamp.
    pub built_at: String,
    pub sample_count: usize,
    /// Base64 SHA-256 of the compact JSON encoding of `corpus`.
    pub checksum: String,
    pub corpus: PatternCorpus,
}

impl CorpusArtifact {
    pub fn new(corpus: PatternCorpus, sample_count: usize) -> Result<Self, CorpusError> {
        let checksum = corpus_checksum(&corpus)?;
        Ok(Self {
            format_version: CORPUS_FORMAT_VERSION,
            built_at: chrono::Utc::now().to_rfc3339(),
            sample_count,
            checksum,
            corpus,
        })
    }
}

/// Checksum over the canonical JSON encoding. Map keys are ordered, so the
/// encoding is stable across save/load.
pub fn corpus_checksum(corpus: &PatternCorpus) -> Result<String, CorpusError> {
    let bytes = serde_json::to_vec(corpus).map_err(|e| CorpusError::Malformed(e.to_string()))?;
    let hash = Sha256::digest(&bytes);
    Ok(base64::engine::general_purpose::STANDARD.encode(hash))
}

/// Write the corpus atomically to `path`, replacing any previous artifact.
pub fn save_corpus(
    path: &Path,
    corpus: &PatternCorpus,
    sample_count: usize,
) -> Result<CorpusArtifact, CorpusError> {
    let artifact = CorpusArtifact::new(corpus.clone(), sample_count)?;
    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|e| CorpusError::Malformed(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(json.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| CorpusError::Io(e.error))?;

    tracing::info!(
        path = %path.display(),
        patterns = artifact.corpus.pattern_count(),
        samples = sample_count,
        "Pattern corpus written"
    );
    Ok(artifact)
}

/// Load and verify a corpus artifact. Any defect is fatal: a runtime with an
/// empty corpus would detect zero sections in every document.
pub fn load_corpus(path: &Path) -> Result<PatternCorpus, CorpusError> {
    if !path.exists() {
        return Err(CorpusError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    let artifact: CorpusArtifact =
        serde_json::from_str(&text).map_err(|e| CorpusError::Malformed(e.to_string()))?;

    if artifact.format_version != CORPUS_FORMAT_VERSION {
        return Err(CorpusError::UnsupportedVersion(artifact.format_version));
    }

    let actual = corpus_checksum(&artifact.corpus)?;
    if actual != artifact.checksum {
        return Err(CorpusError::ChecksumMismatch {
            expected: artifact.checksum,
            actual,
        });
    }

    if artifact.corpus.is_empty() {
        return Err(CorpusError::Empty);
    }

    tracing::info!(
        path = %path.display(),
        built_at = %artifact.built_at,
        patterns = artifact.corpus.pattern_count(),
        "Pattern corpus loaded"
    );
    Ok(artifact.corpus)
}
