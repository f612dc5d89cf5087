//! Masked probe sentences and the prediction tables built from their answers.

use ahash::AHashMap;

use crate::analysis::chinese::is_chinese_string;
use crate::scorer::Prediction;

/// Replace the character at `idx` with the mask.
pub fn substitution_probe(working: &[char], idx: usize, mask: &str) -> String {
    splice(&working[..idx], mask, &working[(idx + 1).min(working.len())..])
}

/// Insert the mask immediately before the character at `idx`.
pub fn insertion_probe(working: &[char], idx: usize, mask: &str) -> String {
    splice(&working[..idx], mask, &working[idx..])
}

/// Remove the character at `idx` and mask the character that moves into its
/// place.
///
/// Returns `None` when there is no character after `idx`.
pub fn deletion_probe(working: &[char], idx: usize, mask: &str) -> Option<String> {
    if idx + 1 >= working.len() {
        return None;
    }
    Some(splice(&working[..idx], mask, &working[idx + 2..]))
}

fn splice(prefix: &[char], mask: &str, suffix: &[char]) -> String {
    let mut sentence = String::with_capacity((prefix.len() + suffix.len()) * 3 + mask.len());
    sentence.extend(prefix);
    sentence.push_str(mask);
    sentence.extend(suffix);
    sentence
}

/// Chinese-only predictions keyed by token, in first-seen order.
///
/// Inserting a token that is already present overwrites its probability but
/// keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    entries: Vec<(String, f64)>,
    index: AHashMap<String, usize>,
}

impl PredictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the Chinese predictions of one probe.
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let mut table = Self::new();
        table.extend(predictions);
        table
    }

    /// Add predictions, dropping tokens that are not Chinese strings.
    pub fn extend<I: IntoIterator<Item = Prediction>>(&mut self, predictions: I) {
        for prediction in predictions {
            self.insert(prediction.token, prediction.probability);
        }
    }

    /// Add one prediction, dropping it if the token is not a Chinese string.
    pub fn insert(&mut self, token: String, probability: f64) {
        if !is_chinese_string(&token) {
            return;
        }
        match self.index.get(&token) {
            Some(&pos) => self.entries[pos].1 = probability,
            None => {
                self.index.insert(token.clone(), self.entries.len());
                self.entries.push((token, probability));
            }
        }
    }

    /// Probability of `token`, 0 when absent.
    pub fn probability(&self, token: &str) -> f64 {
        self.index
            .get(token)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(token, p)| (token.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
