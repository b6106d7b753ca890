use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "referral-intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment overrides.
pub const CORPUS_ENV: &str = "REFERRAL_INTAKE_CORPUS";
pub const RULES_ENV: &str = "REFERRAL_INTAKE_RULES";
pub const DUMP_DIR_ENV: &str = "REFERRAL_INTAKE_DUMP_DIR";

/// File name of the corpus artifact inside the data directory.
pub const CORPUS_FILE: &str = "pattern-corpus.json";

/// Debug builds are dev builds.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "referral_intake=debug"
    } else {
        "referral_intake=info"
    }
}

/// Application data directory; the working directory when the platform
/// has none.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Corpus artifact path: `REFERRAL_INTAKE_CORPUS`, else the data directory.
pub fn corpus_path() -> PathBuf {
    env_path(CORPUS_ENV).unwrap_or_else(|| data_dir().join(CORPUS_FILE))
}

/// Suggestion rules file, if one is configured.
pub fn rules_path() -> Option<PathBuf> {
    env_path(RULES_ENV)
}

/// Diagnostic dump base directory, if enabled.
pub fn dump_dir() -> Option<PathBuf> {
    env_path(DUMP_DIR_ENV)
}

/// Paths the pipeline is assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub corpus_path: PathBuf,
    /// Built-in rules are used when unset.
    pub rules_path: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            corpus_path: corpus_path(),
            rules_path: rules_path(),
            dump_dir: dump_dir(),
        }
    }
}
