//! Character-level spelling correction for Chinese text.
//!
//! [`CorrectionEngine`] walks every block of the input one character at a
//! time, asks a [`MaskedScorer`](crate::scorer::MaskedScorer) what belongs at
//! that position, and compares the answers with the rule-based candidates of
//! [`CandidateGenerator`].

pub mod cancel;
pub mod candidate;
pub mod cursor;
pub mod edit;
pub mod engine;
pub mod probe;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use candidate::CandidateGenerator;
pub use edit::{BlockFailure, CorrectionResult, Edit, EditKind};
pub use engine::{BlockCorrection, CharProbes, CorrectionEngine, Decision};
pub use probe::PredictionTable;
