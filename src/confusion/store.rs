//! The immutable confusion store and its one-time loader.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use ahash::AHashSet;
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::confusion::loader::{
    self, CommonCharSet, ConfusionSets, CustomConfusionMap, WordFrequency,
};
use crate::error::{JiaoduiError, Result};

/// Default file name of the common character list.
pub const COMMON_CHAR_FILE: &str = "common_char.txt";
/// Default file name of the custom confusion list.
pub const CUSTOM_CONFUSION_FILE: &str = "custom_confusion.txt";
/// Default file name of the word frequency list.
pub const WORD_FREQ_FILE: &str = "word_freq.txt";
/// Default file name of the same-pinyin groups.
pub const SAME_PINYIN_FILE: &str = "same_pinyin.txt";
/// Default file name of the same-stroke groups.
pub const SAME_STROKE_FILE: &str = "same_stroke.txt";

/// Locations of the five dictionary files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionPaths {
    pub common_char: PathBuf,
    pub custom_confusion: PathBuf,
    pub word_freq: PathBuf,
    pub same_pinyin: PathBuf,
    pub same_stroke: PathBuf,
}

impl ConfusionPaths {
    /// Resolve the default file names under `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        ConfusionPaths {
            common_char: dir.join(COMMON_CHAR_FILE),
            custom_confusion: dir.join(CUSTOM_CONFUSION_FILE),
            word_freq: dir.join(WORD_FREQ_FILE),
            same_pinyin: dir.join(SAME_PINYIN_FILE),
            same_stroke: dir.join(SAME_STROKE_FILE),
        }
    }
}

/// Entry counts of a loaded store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub common_chars: usize,
    pub custom_confusions: usize,
    pub words: usize,
    pub same_pinyin: usize,
    pub same_stroke: usize,
}

/// The five confusion dictionaries, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ConfusionStore {
    common_chars: CommonCharSet,
    custom_confusion: CustomConfusionMap,
    word_freq: WordFrequency,
    same_pinyin: ConfusionSets,
    same_stroke: ConfusionSets,
}

impl ConfusionStore {
    /// Start building a store from in-memory dictionary text.
    pub fn builder() -> ConfusionStoreBuilder {
        ConfusionStoreBuilder::default()
    }

    /// Load all five dictionaries from disk.
    ///
    /// Any missing or unreadable file fails the whole load with a
    /// configuration error; no partially loaded store is returned.
    pub fn load(paths: &ConfusionPaths) -> Result<Self> {
        let store = ConfusionStore {
            common_chars: read_dictionary(&paths.common_char, loader::load_common_chars)?,
            custom_confusion: read_dictionary(
                &paths.custom_confusion,
                loader::load_custom_confusion,
            )?,
            word_freq: read_dictionary(&paths.word_freq, loader::load_word_freq)?,
            same_pinyin: read_dictionary(&paths.same_pinyin, loader::load_same_pinyin)?,
            same_stroke: read_dictionary(&paths.same_stroke, loader::load_same_stroke)?,
        };

        let stats = store.stats();
        info!(
            "Loaded confusion store: {} common chars, {} custom confusions, {} words, {} same-pinyin, {} same-stroke",
            stats.common_chars,
            stats.custom_confusions,
            stats.words,
            stats.same_pinyin,
            stats.same_stroke
        );

        Ok(store)
    }

    /// Load the default file names from a data directory.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load(&ConfusionPaths::from_dir(dir))
    }

    /// The common character alphabet.
    pub fn common_chars(&self) -> &CommonCharSet {
        &self.common_chars
    }

    /// Curated correction for `word`, if any.
    pub fn custom_confusion(&self, word: &str) -> Option<&str> {
        self.custom_confusion.get(word).map(String::as_str)
    }

    /// Frequency of `word`; unknown words have frequency 0.
    pub fn word_frequency(&self, word: &str) -> u64 {
        self.word_freq.get(word).copied().unwrap_or(0)
    }

    /// Whether `word` appears in the frequency table.
    pub fn contains_word(&self, word: &str) -> bool {
        self.word_freq.contains_key(word)
    }

    /// Homophones of `c` (same tone and different tone).
    pub fn same_pinyin(&self, c: &str) -> Option<&AHashSet<String>> {
        self.same_pinyin.get(c)
    }

    /// Visually similar characters of `c`.
    pub fn same_stroke(&self, c: &str) -> Option<&AHashSet<String>> {
        self.same_stroke.get(c)
    }

    /// Entry counts per dictionary.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            common_chars: self.common_chars.len(),
            custom_confusions: self.custom_confusion.len(),
            words: self.word_freq.len(),
            same_pinyin: self.same_pinyin.len(),
            same_stroke: self.same_stroke.len(),
        }
    }
}

fn read_dictionary<T, F>(path: &Path, parse: F) -> Result<T>
where
    F: FnOnce(BufReader<File>) -> Result<T>,
{
    let file = File::open(path).map_err(|e| {
        JiaoduiError::config(format!("Cannot open dictionary {}: {e}", path.display()))
    })?;
    parse(BufReader::new(file)).map_err(|e| {
        JiaoduiError::config(format!("Cannot read dictionary {}: {e}", path.display()))
    })
}

/// Builds a [`ConfusionStore`] from dictionary text held in memory.
///
/// Each method parses its text with the same rules as the file loaders.
#[derive(Debug, Default)]
pub struct ConfusionStoreBuilder {
    store: ConfusionStore,
}

impl ConfusionStoreBuilder {
    pub fn common_chars(mut self, text: &str) -> Result<Self> {
        self.store.common_chars = loader::load_common_chars(text.as_bytes())?;
        Ok(self)
    }

    pub fn custom_confusion(mut self, text: &str) -> Result<Self> {
        self.store.custom_confusion = loader::load_custom_confusion(text.as_bytes())?;
        Ok(self)
    }

    pub fn word_freq(mut self, text: &str) -> Result<Self> {
        self.store.word_freq = loader::load_word_freq(text.as_bytes())?;
        Ok(self)
    }

    pub fn same_pinyin(mut self, text: &str) -> Result<Self> {
        self.store.same_pinyin = loader::load_same_pinyin(text.as_bytes())?;
        Ok(self)
    }

    pub fn same_stroke(mut self, text: &str) -> Result<Self> {
        self.store.same_stroke = loader::load_same_stroke(text.as_bytes())?;
        Ok(self)
    }

    pub fn build(self) -> ConfusionStore {
        self.store
    }
}

/// Loads a [`ConfusionStore`] on first access and publishes it once.
///
/// Concurrent first accesses are serialised around the load; after
/// publication reads are lock-free. A failed load publishes nothing, so the
/// next access tries again.
#[derive(Debug)]
pub struct LazyConfusionStore {
    paths: ConfusionPaths,
    store: OnceLock<Arc<ConfusionStore>>,
    load_lock: Mutex<()>,
}

impl LazyConfusionStore {
    pub fn new(paths: ConfusionPaths) -> Self {
        LazyConfusionStore {
            paths,
            store: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    /// Return the store, loading it if this is the first access.
    pub fn get(&self) -> Result<Arc<ConfusionStore>> {
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        let _guard = self.load_lock.lock();
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(ConfusionStore::load(&self.paths)?);
        let _ = self.store.set(Arc::clone(&store));
        Ok(store)
    }

    /// Whether the store has been published.
    pub fn is_loaded(&self) -> bool {
        self.store.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    fn write_dictionaries(dir: &Path) {
        fs::write(dir.join(COMMON_CHAR_FILE), "务\n物\n院\n").unwrap();
        fs::write(dir.join(CUSTOM_CONFUSION_FILE), "关与 关于\n").unwrap();
        fs::write(dir.join(WORD_FREQ_FILE), "国务院 100\n医院 50\n").unwrap();
        fs::write(dir.join(SAME_PINYIN_FILE), "物\t务误\t\n务\t物\t雾\n").unwrap();
        fs::write(dir.join(SAME_STROKE_FILE), "甲\t乙\t丙\n").unwrap();
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        write_dictionaries(temp_dir.path());

        let store = ConfusionStore::load_from_dir(temp_dir.path()).unwrap();
        let stats = store.stats();
        assert_eq!(stats.common_chars, 3);
        assert_eq!(stats.custom_confusions, 1);
        assert_eq!(stats.words, 2);
        // "物\t务误\t" loses its trailing tab when trimmed and is skipped.
        assert_eq!(stats.same_pinyin, 1);
        assert_eq!(stats.same_stroke, 3);

        assert_eq!(store.custom_confusion("关与"), Some("关于"));
        assert_eq!(store.word_frequency("国务院"), 100);
        assert_eq!(store.word_frequency("不存在"), 0);
        assert!(store.same_pinyin("务").unwrap().contains("雾"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        write_dictionaries(temp_dir.path());
        fs::remove_file(temp_dir.path().join(SAME_STROKE_FILE)).unwrap();

        let err = ConfusionStore::load_from_dir(temp_dir.path()).unwrap_err();
        match err {
            JiaoduiError::Config(msg) => assert!(msg.contains(SAME_STROKE_FILE)),
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_builder() {
        let store = ConfusionStore::builder()
            .common_chars("务\n")
            .unwrap()
            .word_freq("国务院 3\n")
            .unwrap()
            .build();
        assert!(store.common_chars().contains(&'务'));
        assert!(store.contains_word("国务院"));
        assert!(store.same_stroke("甲").is_none());
    }

    #[test]
    fn test_lazy_store_loads_once() {
        let temp_dir = TempDir::new().unwrap();
        write_dictionaries(temp_dir.path());

        let lazy = Arc::new(LazyConfusionStore::new(ConfusionPaths::from_dir(temp_dir.path())));
        assert!(!lazy.is_loaded());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                thread::spawn(move || lazy.get().unwrap())
            })
            .collect();
        let stores: Vec<Arc<ConfusionStore>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(lazy.is_loaded());
        for store in &stores[1..] {
            assert!(Arc::ptr_eq(&stores[0], store));
        }
    }

    #[test]
    fn test_lazy_store_failure_publishes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let lazy = LazyConfusionStore::new(ConfusionPaths::from_dir(temp_dir.path()));

        assert!(lazy.get().is_err());
        assert!(!lazy.is_loaded());

        write_dictionaries(temp_dir.path());
        assert!(lazy.get().is_ok());
        assert!(lazy.is_loaded());
    }
}
