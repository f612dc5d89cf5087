//! Text analysis for correction.
//!
//! This module provides character classification helpers used by the
//! candidate filters and the symbol-based segmenter that cuts input text into
//! independently corrected blocks.

pub mod chinese;
pub mod segmenter;

pub use chinese::{is_chinese_char, is_chinese_string, pinyin_key};
pub use segmenter::{Block, TextSegmenter};
