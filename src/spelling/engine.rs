//! The per-block, per-character correction loop.
//!
//! For every character of a block the engine issues up to three probes to the
//! scorer over the working string (corrected prefix followed by the untouched
//! original suffix):
//!
//! 1. substitution: the character itself is masked;
//! 2. insertion: a mask is inserted before the character, and each prediction
//!    `t` becomes the extension candidate `t + c`;
//! 3. deletion: the character is removed and the next one masked (only when
//!    a next character exists; failures here are ignored).
//!
//! A character whose own substitution probability reaches the accept
//! threshold is kept. Otherwise the first matching rule wins: substitution by
//! a confusion candidate, extension by an insertion candidate, deletion, or
//! keep.

use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, trace, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::analysis::segmenter::{Block, TextSegmenter};
use crate::config::{CorrectorConfig, FailurePolicy};
use crate::confusion::ConfusionStore;
use crate::error::{JiaoduiError, Result};
use crate::scorer::{MaskedScorer, Prediction};
use crate::spelling::cancel::CancellationToken;
use crate::spelling::candidate::CandidateGenerator;
use crate::spelling::cursor::BlockCursor;
use crate::spelling::edit::{BlockFailure, CorrectionResult, Edit};
use crate::spelling::probe::{
    PredictionTable, deletion_probe, insertion_probe, substitution_probe,
};

/// What to do with one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Keep the character unchanged.
    Keep,
    /// Replace the character with a confusion candidate.
    Substitute(String),
    /// Replace the character with a longer insertion candidate.
    Extend(String),
    /// Remove the character.
    Delete,
}

/// The scorer answers gathered for one character.
#[derive(Debug, Clone, Default)]
pub struct CharProbes {
    /// Predictions for the masked character.
    pub substitution: PredictionTable,
    /// Substitution predictions merged with the insertion-derived candidates.
    pub extension: PredictionTable,
    /// Predictions for the next character once the current one is removed.
    pub next: PredictionTable,
}

/// A corrected block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCorrection {
    pub text: String,
    pub edits: Vec<Edit>,
}

/// Corrects character-level errors in Chinese text.
pub struct CorrectionEngine {
    generator: CandidateGenerator,
    scorer: Arc<dyn MaskedScorer>,
    segmenter: TextSegmenter,
    config: CorrectorConfig,
    thread_pool: Option<Arc<ThreadPool>>,
}

impl CorrectionEngine {
    /// Create an engine with the default configuration.
    pub fn new(store: Arc<ConfusionStore>, scorer: Arc<dyn MaskedScorer>) -> Self {
        let config = CorrectorConfig::default();
        CorrectionEngine {
            generator: CandidateGenerator::new(store),
            scorer,
            segmenter: Self::segmenter_for(&config),
            config,
            thread_pool: None,
        }
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(
        store: Arc<ConfusionStore>,
        scorer: Arc<dyn MaskedScorer>,
        config: CorrectorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let thread_pool = if config.parallel_blocks {
            let num_threads = config.num_threads.unwrap_or_else(num_cpus::get);
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("jiaodui-block-{i}"))
                .build()
                .map_err(|e| {
                    JiaoduiError::internal(format!("Failed to create thread pool: {e}"))
                })?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(CorrectionEngine {
            generator: CandidateGenerator::new(store),
            scorer,
            segmenter: Self::segmenter_for(&config),
            config,
            thread_pool,
        })
    }

    fn segmenter_for(config: &CorrectorConfig) -> TextSegmenter {
        TextSegmenter::new()
            .with_symbols(config.include_symbols)
            .with_max_block_chars(config.max_block_chars)
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Arc<dyn MaskedScorer> {
        &self.scorer
    }

    /// Correct `text`.
    pub fn correct(&self, text: &str) -> Result<CorrectionResult> {
        self.correct_with_cancel(text, &CancellationToken::new())
    }

    /// Correct `text`, giving up on blocks whose probes start after `cancel`
    /// is set.
    pub fn correct_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<CorrectionResult> {
        let blocks = self.segmenter.segment(text);
        let outcomes = self.correct_blocks(&blocks, cancel)?;

        let original: Vec<char> = text.chars().collect();
        let mut result = CorrectionResult::default();
        let mut copied_to = 0;

        for (block_index, (block, outcome)) in blocks.iter().zip(outcomes).enumerate() {
            // Separator spans skipped by the segmenter are copied through.
            result
                .corrected_text
                .extend(&original[copied_to..block.start]);
            copied_to = block.end();

            match outcome {
                Ok(correction) => {
                    result.corrected_text.push_str(&correction.text);
                    result.edits.extend(correction.edits);
                }
                Err(e) => {
                    warn!(
                        "Block {block_index} at offset {} left uncorrected: {e}",
                        block.start
                    );
                    result.corrected_text.push_str(&block.text);
                    result.failed_blocks.push(BlockFailure {
                        block_index,
                        start: block.start,
                        text: block.text.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        result.corrected_text.extend(&original[copied_to..]);

        result.edits.sort_by_key(|edit| edit.start);
        Ok(result)
    }

    /// Correct every block, applying the failure policy.
    ///
    /// Under [`FailurePolicy::AbortCall`] the first failing block fails the
    /// call; otherwise each block's outcome is returned in block order.
    fn correct_blocks(
        &self,
        blocks: &[Block],
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<BlockCorrection>>> {
        let outcomes: Vec<Result<BlockCorrection>> = match &self.thread_pool {
            Some(pool) => pool.install(|| {
                blocks
                    .par_iter()
                    .map(|block| self.correct_block(block, cancel))
                    .collect()
            }),
            None => {
                let mut outcomes = Vec::with_capacity(blocks.len());
                for block in blocks {
                    let outcome = self.correct_block(block, cancel);
                    let failed = outcome.is_err();
                    outcomes.push(outcome);
                    if failed && self.config.failure_policy == FailurePolicy::AbortCall {
                        break;
                    }
                }
                outcomes
            }
        };

        if self.config.failure_policy == FailurePolicy::AbortCall {
            let mut checked = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                checked.push(Ok(outcome?));
            }
            return Ok(checked);
        }

        Ok(outcomes)
    }

    /// Correct a single block.
    ///
    /// Edits are reported in original-text coordinates using the block's
    /// start offset.
    pub fn correct_block(
        &self,
        block: &Block,
        cancel: &CancellationToken,
    ) -> Result<BlockCorrection> {
        let original: Vec<char> = block.text.chars().collect();
        let mut corrected: Vec<char> = Vec::with_capacity(original.len());
        let mut edits = Vec::new();
        let mut cursor = BlockCursor::new();

        while cursor.original() < original.len() {
            let current = original[cursor.original()].to_string();
            let next = original.get(cursor.original() + 1).map(|c| c.to_string());

            let mut working = corrected.clone();
            working.extend_from_slice(&original[cursor.original()..]);

            let probes = self.probe_char(&working, cursor.working(), &current, cancel)?;
            let decision = self.decide(&current, next.as_deref(), &probes);

            let start = block.start + cursor.original();
            let written = match decision {
                Decision::Keep => {
                    corrected.extend(current.chars());
                    current.chars().count()
                }
                Decision::Substitute(replacement) | Decision::Extend(replacement) => {
                    debug!("Replace {current} with {replacement} at {start}");
                    corrected.extend(replacement.chars());
                    let written = replacement.chars().count();
                    edits.push(Edit::new(current, replacement, start, start + 1));
                    written
                }
                Decision::Delete => {
                    debug!("Delete {current} at {start}");
                    edits.push(Edit::new(current, "", start, start + 1));
                    0
                }
            };
            cursor.advance(written);
        }

        Ok(BlockCorrection {
            text: corrected.into_iter().collect(),
            edits,
        })
    }

    /// Issue the three probes for the character at `idx` of `working`.
    pub fn probe_char(
        &self,
        working: &[char],
        idx: usize,
        current: &str,
        cancel: &CancellationToken,
    ) -> Result<CharProbes> {
        let mask = self.scorer.mask_token();

        let substitutions = self.score(&substitution_probe(working, idx, mask), cancel)?;
        let substitution = PredictionTable::from_predictions(substitutions);

        let mut extension = substitution.clone();
        let insertions = self.score(&insertion_probe(working, idx, mask), cancel)?;
        for prediction in insertions {
            extension.insert(format!("{}{current}", prediction.token), prediction.probability);
        }

        let next = match deletion_probe(working, idx, mask) {
            Some(sentence) => match self.score(&sentence, cancel) {
                Ok(predictions) => PredictionTable::from_predictions(predictions),
                Err(e) => {
                    debug!("Deletion probe failed, not considering deletion: {e}");
                    PredictionTable::new()
                }
            },
            None => PredictionTable::new(),
        };

        Ok(CharProbes {
            substitution,
            extension,
            next,
        })
    }

    fn score(&self, sentence: &str, cancel: &CancellationToken) -> Result<Vec<Prediction>> {
        if cancel.is_cancelled() {
            return Err(JiaoduiError::cancelled("Correction cancelled"));
        }
        trace!("Probe: {sentence}");
        self.scorer.score_masked(sentence)
    }

    /// Decide what to do with `current` given its probe answers.
    pub fn decide(&self, current: &str, next: Option<&str>, probes: &CharProbes) -> Decision {
        if probes.substitution.probability(current) >= self.config.accept_threshold {
            return Decision::Keep;
        }

        let candidates: AHashSet<String> =
            self.generator.generate_candidate(current).into_iter().collect();
        for (token, probability) in probes.substitution.iter() {
            if token != current
                && candidates.contains(token)
                && probability > self.config.substitution_threshold
            {
                return Decision::Substitute(token.to_string());
            }
        }

        let current_len = current.chars().count();
        for (token, probability) in probes.extension.iter() {
            if token.chars().count() > current_len && probability > self.config.extension_threshold
            {
                return Decision::Extend(token.to_string());
            }
        }

        if let Some(next) = next
            && !probes.next.is_empty()
            && probes.next.probability(next) > self.config.deletion_threshold
        {
            return Decision::Delete;
        }

        Decision::Keep
    }
}
