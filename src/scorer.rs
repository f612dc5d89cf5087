//! The masked-token scorer collaborator.
//!
//! The correction engine never runs a language model itself. It builds
//! sentences with exactly one position replaced by the scorer's mask marker
//! and asks a [`MaskedScorer`] for ranked predictions at that position.
//!
//! Adapters in this module reach a real model through a subprocess
//! ([`CommandScorer`]), replay recorded predictions ([`FixtureScorer`]), and
//! wrap any scorer with memoization ([`CachedScorer`]) or a per-call deadline
//! ([`TimeoutScorer`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ScorerBackend, ScorerConfig};
use crate::error::{JiaoduiError, Result};

pub mod cache;
pub mod command;
pub mod fixture;
pub mod timeout;

pub use cache::CachedScorer;
pub use command::CommandScorer;
pub use fixture::FixtureScorer;
pub use timeout::TimeoutScorer;

/// One ranked prediction for the masked position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted token text.
    pub token: String,
    /// Probability in `[0, 1]`.
    pub probability: f64,
}

impl Prediction {
    pub fn new<S: Into<String>>(token: S, probability: f64) -> Self {
        Prediction {
            token: token.into(),
            probability,
        }
    }
}

/// A masked language model queried one masked position at a time.
pub trait MaskedScorer: Send + Sync {
    /// The literal marker this scorer recognises as the masked position.
    fn mask_token(&self) -> &str;

    /// Predict the masked position of `sentence`, best first.
    ///
    /// `sentence` contains exactly one occurrence of [`Self::mask_token`].
    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>>;

    /// Abandon the probe currently being answered, if the scorer can.
    ///
    /// Called after a caller gave up waiting. The abandoned call may return
    /// an error; later calls must be answered normally.
    fn cancel_in_flight(&self) {}

    /// Get the name of this scorer (for logging).
    fn name(&self) -> &'static str {
        "scorer"
    }
}

impl<S: MaskedScorer + ?Sized> MaskedScorer for Arc<S> {
    fn mask_token(&self) -> &str {
        (**self).mask_token()
    }

    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
        (**self).score_masked(sentence)
    }

    fn cancel_in_flight(&self) {
        (**self).cancel_in_flight()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the scorer stack described by `config`.
///
/// The backend is wrapped with a cache when `cache_capacity` is set, and the
/// result with a deadline when `timeout_ms` is set. The deadline is served by
/// `workers` threads.
pub fn from_config(config: &ScorerConfig) -> Result<Arc<dyn MaskedScorer>> {
    let backend = config
        .backend
        .as_ref()
        .ok_or_else(|| JiaoduiError::config("No scorer backend configured"))?;

    let mut scorer: Arc<dyn MaskedScorer> = match backend {
        ScorerBackend::Command { program, args } => Arc::new(CommandScorer::spawn(
            program,
            args.as_slice(),
            config.mask_token.clone(),
        )?),
        ScorerBackend::Fixture { path } => {
            Arc::new(FixtureScorer::from_file(path, config.mask_token.clone())?)
        }
    };

    if let Some(capacity) = config.cache_capacity {
        scorer = Arc::new(CachedScorer::new(scorer, capacity));
    }
    if let Some(timeout) = config.timeout() {
        scorer = Arc::new(TimeoutScorer::with_workers(
            scorer,
            timeout,
            config.workers.max(1),
        )?);
    }

    Ok(scorer)
}
