//! Scorer that replays recorded predictions.
//!
//! A fixture is a JSON object mapping each masked sentence to the
//! predictions the model produced for it:
//!
//! ```text
//! { "国[MASK]院办公厅": [{"token": "务", "probability": 0.97}] }
//! ```
//!
//! Sentences missing from the fixture yield no predictions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ahash::AHashMap;

use crate::error::{JiaoduiError, Result};
use crate::scorer::{MaskedScorer, Prediction};

/// A [`MaskedScorer`] answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct FixtureScorer {
    mask_token: String,
    predictions: AHashMap<String, Vec<Prediction>>,
}

impl FixtureScorer {
    /// Create an empty fixture for `mask_token`.
    pub fn new<S: Into<String>>(mask_token: S) -> Self {
        FixtureScorer {
            mask_token: mask_token.into(),
            predictions: AHashMap::new(),
        }
    }

    /// Parse a fixture from JSON text.
    pub fn from_json_str<S: Into<String>>(json: &str, mask_token: S) -> Result<Self> {
        let table: HashMap<String, Vec<Prediction>> = serde_json::from_str(json)?;
        let mut scorer = Self::new(mask_token);
        for (sentence, predictions) in table {
            scorer.insert(sentence, predictions);
        }
        Ok(scorer)
    }

    /// Load a fixture file.
    pub fn from_file<P: AsRef<Path>, S: Into<String>>(path: P, mask_token: S) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            JiaoduiError::config(format!("Cannot read scorer fixture {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json, mask_token)
    }

    /// Record the predictions for one masked sentence.
    pub fn insert<S: Into<String>>(&mut self, sentence: S, predictions: Vec<Prediction>) {
        self.predictions.insert(sentence.into(), predictions);
    }

    /// Builder-style [`Self::insert`].
    pub fn with<S: Into<String>>(mut self, sentence: S, predictions: Vec<Prediction>) -> Self {
        self.insert(sentence, predictions);
        self
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl MaskedScorer for FixtureScorer {
    fn mask_token(&self) -> &str {
        &self.mask_token
    }

    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
        Ok(self.predictions.get(sentence).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
