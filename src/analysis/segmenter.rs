//! Symbol-based segmentation of input text into correction blocks.
//!
//! Text is cut into alternating runs of "word-class" characters (Chinese
//! characters, Latin letters, digits and `+`, `#`, `&`) and the separator runs
//! between them. Every block carries its start offset in the original input,
//! counted in Unicode code points, so that each block can be corrected with an
//! independent cursor and still report edits in original coordinates.
//!
//! # Examples
//!
//! ```
//! use jiaodui::analysis::segmenter::TextSegmenter;
//!
//! let blocks = TextSegmenter::new().segment("你好，世界");
//! assert_eq!(blocks.len(), 3);
//! assert_eq!(blocks[2].text, "世界");
//! assert_eq!(blocks[2].start, 3);
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref WORD_PATTERN: Regex =
        Regex::new(r"[\x{4E00}-\x{9FA5}a-zA-Z0-9+#&]+").expect("word pattern is valid");
}

/// A span of the original text together with its start offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The span text.
    pub text: String,
    /// Start offset in the original input, in code points.
    pub start: usize,
    /// Whether the span is a word-class run rather than a separator run.
    pub is_word: bool,
}

impl Block {
    /// Create a new block.
    pub fn new<S: Into<String>>(text: S, start: usize, is_word: bool) -> Self {
        Block {
            text: text.into(),
            start,
            is_word,
        }
    }

    /// Length of the block in code points.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Exclusive end offset in the original input.
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }
}

/// Splits raw input into ordered blocks along symbol boundaries.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    include_symbols: bool,
    max_block_chars: Option<usize>,
}

impl TextSegmenter {
    /// Create a segmenter that keeps separator spans and never sub-splits.
    pub fn new() -> Self {
        TextSegmenter {
            include_symbols: true,
            max_block_chars: None,
        }
    }

    /// Keep (`true`) or drop (`false`) separator spans in the output.
    pub fn with_symbols(mut self, include_symbols: bool) -> Self {
        self.include_symbols = include_symbols;
        self
    }

    /// Cut every block longer than `max` code points into fixed-width chunks.
    ///
    /// A value of zero disables sub-splitting.
    pub fn with_max_block_chars(mut self, max: Option<usize>) -> Self {
        self.max_block_chars = max.filter(|&m| m > 0);
        self
    }

    /// Segment `text` into blocks.
    ///
    /// With symbols included, concatenating the block texts reproduces `text`
    /// exactly.
    pub fn segment(&self, text: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut last_end = 0;
        let mut offset = 0;

        for mat in WORD_PATTERN.find_iter(text) {
            if mat.start() > last_end {
                let gap = &text[last_end..mat.start()];
                offset = self.push_span(&mut blocks, gap, offset, false);
            }
            offset = self.push_span(&mut blocks, mat.as_str(), offset, true);
            last_end = mat.end();
        }

        if last_end < text.len() {
            self.push_span(&mut blocks, &text[last_end..], offset, false);
        }

        blocks
    }

    /// Push one span (possibly as several chunks) and return the offset just
    /// past it.
    fn push_span(
        &self,
        blocks: &mut Vec<Block>,
        span: &str,
        offset: usize,
        is_word: bool,
    ) -> usize {
        let chars: Vec<char> = span.chars().collect();
        let next_offset = offset + chars.len();

        if !is_word && !self.include_symbols {
            return next_offset;
        }

        match self.max_block_chars {
            Some(max) if chars.len() > max => {
                for (i, chunk) in chars.chunks(max).enumerate() {
                    let chunk_text: String = chunk.iter().collect();
                    blocks.push(Block::new(chunk_text, offset + i * max, is_word));
                }
            }
            _ => blocks.push(Block::new(span, offset, is_word)),
        }

        next_offset
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
