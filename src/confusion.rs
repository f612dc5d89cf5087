//! Confusion dictionaries for Chinese spelling correction.
//!
//! Five curated dictionaries feed candidate generation: common characters,
//! custom confusion overrides, word frequencies, same-pinyin groups and
//! same-stroke groups. They are loaded once into an immutable
//! [`ConfusionStore`] that is shared by reference afterwards.

pub mod loader;
pub mod store;

pub use loader::{CommonCharSet, ConfusionSets, CustomConfusionMap, WordFrequency};
pub use store::{
    ConfusionPaths, ConfusionStore, ConfusionStoreBuilder, LazyConfusionStore, StoreStats,
};
