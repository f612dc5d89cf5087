//! # Jiaodui
//!
//! Character-level spelling correction for Chinese text, driven by a masked
//! language model and a set of confusion dictionaries.
//!
//! ## Features
//!
//! - Confusion dictionaries: common characters, custom corrections, word
//!   frequencies, same-pinyin and same-stroke groups
//! - Substitution, insertion and deletion probes per character
//! - Pluggable masked-token scorers (subprocess, fixtures, caching, deadlines)
//! - Optional parallel correction of independent blocks

pub mod analysis;
pub mod cli;
pub mod config;
pub mod confusion;
pub mod error;
pub mod scorer;
pub mod spelling;

pub mod prelude {
    pub use crate::analysis::{Block, TextSegmenter};
    pub use crate::config::{AppConfig, CorrectorConfig, FailurePolicy, ScorerConfig};
    pub use crate::confusion::{ConfusionPaths, ConfusionStore, LazyConfusionStore};
    pub use crate::error::{JiaoduiError, Result};
    pub use crate::scorer::{MaskedScorer, Prediction};
    pub use crate::spelling::{CancellationToken, CorrectionEngine, CorrectionResult, Edit};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
