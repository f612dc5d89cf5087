//! Configuration for the correction engine and the scorer collaborator.
//!
//! All configuration types are serde-serializable and can be read from a
//! single JSON file through [`AppConfig::from_file`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JiaoduiError, Result};

/// What to do when a mandatory probe fails inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the failed block's original text, record the failure and go on
    /// with the remaining blocks.
    #[default]
    IsolateBlock,

    /// Fail the whole `correct` call.
    AbortCall,
}

/// Configuration for the correction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// A character whose own substitution probability reaches this value is
    /// accepted as-is.
    pub accept_threshold: f64,

    /// A candidate must score above this to replace a character.
    pub substitution_threshold: f64,

    /// An insertion-derived candidate must score above this to extend a
    /// character.
    pub extension_threshold: f64,

    /// The next character must score above this, once the current one is
    /// removed, for the current one to be deleted.
    pub deletion_threshold: f64,

    /// Pass separator spans through the correction loop.
    pub include_symbols: bool,

    /// Cut blocks longer than this many characters into chunks.
    pub max_block_chars: Option<usize>,

    /// Handling of blocks whose mandatory probes fail.
    pub failure_policy: FailurePolicy,

    /// Correct blocks concurrently on a thread pool.
    pub parallel_blocks: bool,

    /// Thread pool size for parallel blocks.
    /// If None, uses the number of CPU cores.
    pub num_threads: Option<usize>,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        CorrectorConfig {
            accept_threshold: 0.5,
            substitution_threshold: 0.5,
            extension_threshold: 0.9,
            deletion_threshold: 0.9,
            include_symbols: true,
            max_block_chars: None,
            failure_policy: FailurePolicy::IsolateBlock,
            parallel_blocks: false,
            num_threads: None,
        }
    }
}

impl CorrectorConfig {
    /// Check that every threshold is a probability.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("accept_threshold", self.accept_threshold),
            ("substitution_threshold", self.substitution_threshold),
            ("extension_threshold", self.extension_threshold),
            ("deletion_threshold", self.deletion_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(JiaoduiError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.num_threads == Some(0) {
            return Err(JiaoduiError::config("num_threads must be positive"));
        }
        Ok(())
    }
}

/// How to reach the masked-token scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScorerBackend {
    /// An external process speaking JSON lines over stdin/stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Recorded predictions replayed from a JSON file.
    Fixture { path: PathBuf },
}

/// Configuration for the scorer collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Literal mask marker understood by the scorer.
    pub mask_token: String,

    /// Per-call deadline in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Memoize up to this many masked sentences.
    pub cache_capacity: Option<usize>,

    /// Threads answering probes when a deadline is set.
    pub workers: usize,

    /// Scorer backend.
    pub backend: Option<ScorerBackend>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            mask_token: "[MASK]".to_string(),
            timeout_ms: None,
            cache_capacity: None,
            workers: 1,
            backend: None,
        }
    }
}

impl ScorerConfig {
    /// The per-call deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Everything the command line tool needs, as stored in a config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the five dictionary files.
    pub data_dir: Option<PathBuf>,
    pub corrector: CorrectorConfig,
    pub scorer: ScorerConfig,
}

impl AppConfig {
    /// Read a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            JiaoduiError::config(format!("Cannot read config {}: {e}", path.display()))
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.corrector.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
