//! Position bookkeeping for one block.
//!
//! Correcting a block walks the original characters left to right while the
//! probes are built over the working string `corrected prefix + untouched
//! suffix`. Substitutions, deletions and extensions change the length of the
//! corrected prefix, so the two positions drift apart and are tracked
//! separately.

/// Cursor over a block carrying both the original-text index and the
/// working-string index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockCursor {
    original: usize,
    working: usize,
}

impl BlockCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the current character in the original block.
    pub fn original(&self) -> usize {
        self.original
    }

    /// Index of the current character in the working string, which is also
    /// the length of the corrected prefix.
    pub fn working(&self) -> usize {
        self.working
    }

    /// Move past the current original character, which was written to the
    /// corrected prefix as `written` characters (0 for a deletion).
    pub fn advance(&mut self, written: usize) {
        self.original += 1;
        self.working += written;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_length_changes() {
        let mut cursor = BlockCursor::new();
        cursor.advance(1);
        assert_eq!((cursor.original(), cursor.working()), (1, 1));

        // extension: one original character became two
        cursor.advance(2);
        assert_eq!((cursor.original(), cursor.working()), (2, 3));

        // deletion
        cursor.advance(0);
        assert_eq!((cursor.original(), cursor.working()), (3, 3));
    }
}
