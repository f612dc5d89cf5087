//! Edits and correction results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of corrective action an [`Edit`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// The span was replaced by text of the same length.
    Substitution,
    /// The span was removed.
    Deletion,
    /// Text was inserted, folded into a widened replacement of the span.
    Extension,
}

/// One corrective action in original-text coordinates.
///
/// Offsets count Unicode code points of the original input; `end` is
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// The original span.
    pub original: String,
    /// The replacement span, empty for a deletion.
    pub replacement: String,
    /// Start offset in the original input.
    pub start: usize,
    /// Exclusive end offset in the original input.
    pub end: usize,
}

impl Edit {
    pub fn new<S: Into<String>, R: Into<String>>(
        original: S,
        replacement: R,
        start: usize,
        end: usize,
    ) -> Self {
        Edit {
            original: original.into(),
            replacement: replacement.into(),
            start,
            end,
        }
    }

    /// Classify this edit by comparing span lengths.
    pub fn kind(&self) -> EditKind {
        if self.replacement.is_empty() {
            EditKind::Deletion
        } else if self.replacement.chars().count() > self.original.chars().count() {
            EditKind::Extension
        } else {
            EditKind::Substitution
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.original, self.replacement, self.start, self.end
        )
    }
}

/// A block whose mandatory probes failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFailure {
    /// Position of the block in segmentation order.
    pub block_index: usize,
    /// Start offset of the block in the original input.
    pub start: usize,
    /// The block text, copied unchanged into the output.
    pub text: String,
    /// Description of the failure.
    pub error: String,
}

/// Result of correcting one text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorrectionResult {
    /// The corrected text.
    pub corrected_text: String,
    /// Edits sorted ascending by start offset.
    pub edits: Vec<Edit>,
    /// Blocks left uncorrected because their probes failed.
    pub failed_blocks: Vec<BlockFailure>,
}

impl CorrectionResult {
    /// Whether any edit was made.
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Whether every block was corrected.
    pub fn is_complete(&self) -> bool {
        self.failed_blocks.is_empty()
    }

    /// Split into the corrected text and its edits.
    pub fn into_parts(self) -> (String, Vec<Edit>) {
        (self.corrected_text, self.edits)
    }
}
