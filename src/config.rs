//! Pipeline configuration with reference defaults and environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::ingestion::retry::RetryPolicy;

/// Tunable knobs for ingestion, retrieval and memory.
///
/// `Default` carries the reference constants; [`Settings::from_env`] layers
/// environment overrides on top (reading a `.env` file when present).
#[derive(Clone, Debug)]
pub struct Settings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one document.
    pub chunk_overlap: usize,
    /// Result cap for semantic-only retrieval.
    pub semantic_top_k: usize,
    /// Lexical sub-search size in hybrid mode.
    pub hybrid_lexical_k: usize,
    /// Semantic sub-search size in hybrid mode.
    pub hybrid_semantic_k: usize,
    /// Static fusion weight for the lexical ranking.
    pub lexical_weight: f32,
    /// Static fusion weight for the semantic ranking.
    pub semantic_weight: f32,
    /// Exchanges retained per user in the conversation window.
    pub memory_capacity: usize,
    /// Per-attempt network timeout for URL fetches.
    pub fetch_timeout: Duration,
    /// Retry schedule for transient fetch failures.
    pub retry: RetryPolicy,
    /// Identifying header sent with every fetch.
    pub user_agent: String,
    /// Directory where uploaded PDFs are written.
    pub pdfs_directory: PathBuf,
    /// Character cap for source-chunk previews in answers.
    pub source_preview_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
            semantic_top_k: 5,
            hybrid_lexical_k: 2,
            hybrid_semantic_k: 3,
            lexical_weight: 0.4,
            semantic_weight: 0.6,
            memory_capacity: 3,
            fetch_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            user_agent: "docchat/0.1".to_string(),
            pdfs_directory: PathBuf::from("./pdfs"),
            source_preview_len: 300,
        }
    }
}

impl Settings {
    /// Builds settings from the environment, falling back to the defaults.
    ///
    /// Reads `.env` first so local overrides work the same way they do in
    /// the deployed service.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut settings = Self::default();

        if let Some(value) = env_parse("DOCCHAT_CHUNK_SIZE") {
            settings.chunk_size = value;
        }
        if let Some(value) = env_parse("DOCCHAT_CHUNK_OVERLAP") {
            settings.chunk_overlap = value;
        }
        if let Some(value) = env_parse("DOCCHAT_MEMORY_CAPACITY") {
            settings.memory_capacity = value;
        }
        if let Some(value) = env_parse::<u64>("DOCCHAT_FETCH_TIMEOUT_SECS") {
            settings.fetch_timeout = Duration::from_secs(value);
        }
        if let Ok(value) = std::env::var("USER_AGENT") {
            if !value.is_empty() {
                settings.user_agent = value;
            }
        }
        if let Ok(value) = std::env::var("PDFS_DIRECTORY") {
            if !value.is_empty() {
                settings.pdfs_directory = PathBuf::from(value);
            }
        }

        settings
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
