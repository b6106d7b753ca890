//! Per-document dump of every analysis stage, for offline inspection of
//! why a document segmented the way it did.
//!
//! Off unless `REFERRAL_INTAKE_DUMP_DIR` is set (see `config::dump_dir`) or
//! a base directory is given to `IntakePipeline::with_dump_dir`. Layout:
//!
//! ```text
//! {base}/{document_id}/
//!   00-input.txt
//!   01-classification.json
//!   02-strategy.json
//!   03-sections.json
//!   04-record.json
//!   05-suggestions.json
//! ```
//!
//! Every write is best effort: failures are logged and analysis continues.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

/// Analysis stages in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Classification,
    Strategy,
    Sections,
    Record,
    Suggestions,
}

impl Stage {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Input => "00-input.txt",
            Self::Classification => "01-classification.json",
            Self::Strategy => "02-strategy.json",
            Self::Sections => "03-sections.json",
            Self::Record => "04-record.json",
            Self::Suggestions => "05-suggestions.json",
        }
    }
}

/// Open dump target for one document.
#[derive(Debug, Clone)]
pub struct StageDump {
    dir: PathBuf,
}

impl StageDump {
    /// Create `{base}/{document_id}`. `None` when the directory cannot be
    /// created.
    pub fn open(base: &Path, document_id: &Uuid) -> Option<Self> {
        let dir = base.join(document_id.to_string());
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(Self { dir }),
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Stage dump disabled for document");
                None
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn text(&self, stage: Stage, text: &str) {
        self.write(stage, text.as_bytes());
    }

    /// Pretty-printed JSON of `value`.
    pub fn json<T: Serialize>(&self, stage: Stage, value: &T) {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.write(stage, &bytes),
            Err(e) => tracing::warn!(
                stage = stage.file_name(),
                error = %e,
                "Stage dump serialization failed"
            ),
        }
    }

    fn write(&self, stage: Stage, bytes: &[u8]) {
        let path = self.dir.join(stage.file_name());
        if let Err(e) = std::fs::write(&path, bytes) {
            tracing::warn!(path = %path.display(), error = %e, "Stage dump write failed");
        } else {
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stage dumped");
        }
    }
}
