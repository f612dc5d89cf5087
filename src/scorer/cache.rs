//! Memoizing scorer wrapper.
//!
//! Identical masked sentences recur across a document (repeated phrases,
//! re-corrected text), and every probe is a model call. Successful answers are
//! kept per sentence up to a fixed capacity; the table is cleared when full.
//! Errors are never cached.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::scorer::{MaskedScorer, Prediction};

/// A [`MaskedScorer`] that remembers the predictions of an inner scorer.
pub struct CachedScorer {
    inner: Arc<dyn MaskedScorer>,
    capacity: usize,
    entries: RwLock<AHashMap<String, Vec<Prediction>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedScorer {
    pub fn new(inner: Arc<dyn MaskedScorer>, capacity: usize) -> Self {
        CachedScorer {
            inner,
            capacity,
            entries: RwLock::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of probes answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of probes forwarded to the inner scorer.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl MaskedScorer for CachedScorer {
    fn mask_token(&self) -> &str {
        self.inner.mask_token()
    }

    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
        if let Some(predictions) = self.entries.read().get(sentence) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(predictions.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let predictions = self.inner.score_masked(sentence)?;

        if self.capacity > 0 {
            let mut entries = self.entries.write();
            if entries.len() >= self.capacity {
                entries.clear();
            }
            entries.insert(sentence.to_string(), predictions.clone());
        }

        Ok(predictions)
    }

    fn cancel_in_flight(&self) {
        self.inner.cancel_in_flight()
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::error::JiaoduiError;

    struct CountingScorer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MaskedScorer for CountingScorer {
        fn mask_token(&self) -> &str {
            "[MASK]"
        }

        fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(JiaoduiError::scorer("model unavailable"));
            }
            Ok(vec![Prediction::new(sentence.chars().count().to_string(), 1.0)])
        }
    }

    fn counting(fail: bool) -> Arc<CountingScorer> {
        Arc::new(CountingScorer {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[test]
    fn test_repeated_sentence_hits_cache() {
        let inner = counting(false);
        let scorer = CachedScorer::new(inner.clone(), 16);

        let first = scorer.score_masked("国[MASK]院").unwrap();
        let second = scorer.score_masked("国[MASK]院").unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scorer.hits(), 1);
        assert_eq!(scorer.misses(), 1);
        assert_eq!(scorer.mask_token(), "[MASK]");
    }

    #[test]
    fn test_capacity_clears_table() {
        let scorer = CachedScorer::new(counting(false), 2);
        scorer.score_masked("a[MASK]").unwrap();
        scorer.score_masked("b[MASK]").unwrap();
        assert_eq!(scorer.len(), 2);

        scorer.score_masked("c[MASK]").unwrap();
        assert_eq!(scorer.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let inner = counting(true);
        let scorer = CachedScorer::new(inner.clone(), 16);

        assert!(scorer.score_masked("国[MASK]院").is_err());
        assert!(scorer.score_masked("国[MASK]院").is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(scorer.is_empty());
    }
}
