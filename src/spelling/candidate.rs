//! Rule-based candidate generation from the confusion dictionaries.
//!
//! Candidates for a word come from three sources: the curated custom
//! confusions, known words one substitution away (with the common character
//! alphabet as replacement set), and for single characters their same-pinyin
//! and same-stroke groups. Results are ranked by word frequency.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashSet;

use crate::analysis::chinese::{is_chinese_string, pinyin_key};
use crate::confusion::ConfusionStore;
use crate::error::{JiaoduiError, Result};

/// Produces frequency-ranked replacement candidates for words and characters.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    store: Arc<ConfusionStore>,
}

impl CandidateGenerator {
    pub fn new(store: Arc<ConfusionStore>) -> Self {
        CandidateGenerator { store }
    }

    pub fn store(&self) -> &ConfusionStore {
        &self.store
    }

    /// All strings formed by replacing exactly one character of `word` with a
    /// character of `char_set`.
    ///
    /// Only substitutions are generated: no insertions, deletions or
    /// transpositions, so every result has the length of `word`. Replacing a
    /// character by itself yields `word` again.
    pub fn edit_words<'a, I>(word: &str, char_set: I) -> AHashSet<String>
    where
        I: IntoIterator<Item = &'a char> + Copy,
    {
        let chars: Vec<char> = word.chars().collect();
        let mut edits = AHashSet::new();

        for i in 0..chars.len() {
            let mut buffer = chars.clone();
            for &c in char_set {
                buffer[i] = c;
                edits.insert(buffer.iter().collect());
            }
        }

        edits
    }

    /// Confusion set of `word`.
    ///
    /// The custom correction of `word`, if any, is always included. Known
    /// words one substitution away are included when they read the same as
    /// `word`, and also whenever they are longer than one character.
    pub fn confusion_words(&self, word: &str) -> AHashSet<String> {
        let mut confusion = AHashSet::new();

        if let Some(correct) = self.store.custom_confusion(word) {
            confusion.insert(correct.to_string());
        }

        let mut candidates: Vec<String> = Self::edit_words(word, self.store.common_chars())
            .into_iter()
            .filter(|candidate| self.store.contains_word(candidate))
            .collect();
        self.sort_by_frequency(&mut candidates);

        let word_pinyin = pinyin_key(word);
        for candidate in candidates {
            if pinyin_key(&candidate) == word_pinyin || candidate.chars().count() > 1 {
                confusion.insert(candidate);
            }
        }

        confusion
    }

    /// Same-pinyin and same-stroke characters of the character `c`.
    pub fn confusion_chars(&self, c: &str) -> AHashSet<String> {
        let mut confusion = AHashSet::new();
        if let Some(same_pinyin) = self.store.same_pinyin(c) {
            confusion.extend(same_pinyin.iter().cloned());
        }
        if let Some(same_stroke) = self.store.same_stroke(c) {
            confusion.extend(same_stroke.iter().cloned());
        }
        confusion
    }

    /// The full Chinese-only candidate list of `word`, most frequent first.
    pub fn generate_candidate(&self, word: &str) -> Vec<String> {
        let mut candidates = self.candidate_pool(word);
        self.sort_by_frequency(&mut candidates);
        candidates
    }

    /// The first `count / fragment + 1` candidates of `word`, where `count` is
    /// the size of the full candidate list.
    pub fn generate_candidate_fragment(&self, word: &str, fragment: usize) -> Result<Vec<String>> {
        if fragment == 0 {
            return Err(JiaoduiError::invalid_argument("fragment must be positive"));
        }
        let mut candidates = self.generate_candidate(word);
        let keep = candidates.len() / fragment + 1;
        candidates.truncate(keep);
        Ok(candidates)
    }

    fn candidate_pool(&self, word: &str) -> Vec<String> {
        let mut pool = self.confusion_words(word);
        if word.chars().count() == 1 {
            pool.extend(self.confusion_chars(word));
        }
        pool.into_iter()
            .filter(|candidate| is_chinese_string(candidate))
            .collect()
    }

    /// Sort descending by frequency; equal frequencies fall back to text order.
    fn sort_by_frequency(&self, words: &mut [String]) {
        words.sort_by(|a, b| {
            match self
                .store
                .word_frequency(b)
                .cmp(&self.store.word_frequency(a))
            {
                Ordering::Equal => a.cmp(b),
                other => other,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CandidateGenerator {
        let store = ConfusionStore::builder()
            .common_chars("务\n物\n误\n院\n国\n家\n雾\n")
            .unwrap()
            .custom_confusion("关与 关于\nabc ABC\n")
            .unwrap()
            .word_freq("国务院 1000\n国家 900\n国务 800\n务 500\n物 400\n误 300\n")
            .unwrap()
            .same_pinyin("物\t务误\t坞\n")
            .unwrap()
            .same_stroke("未\t末\n")
            .unwrap()
            .build();
        CandidateGenerator::new(Arc::new(store))
    }

    fn set(items: &[&str]) -> AHashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_edit_words_single_position_substitution() {
        let char_set: AHashSet<char> = ['务', '家'].into_iter().collect();
        let edits = CandidateGenerator::edit_words("国物", &char_set);
        assert_eq!(edits, set(&["务物", "家物", "国务", "国家"]));
        assert!(edits.len() <= 2 * char_set.len());
    }

    #[test]
    fn test_edit_words_collapses_identity_replacement() {
        let edits = CandidateGenerator::edit_words("务", &['务', '物']);
        assert_eq!(edits, set(&["务", "物"]));
    }

    #[test]
    fn test_edit_words_keep_length() {
        let edits = CandidateGenerator::edit_words("国务院", &['家', '物', '误']);
        assert_eq!(edits.len(), 9);
        for edit in &edits {
            assert_eq!(edit.chars().count(), 3);
            let differing = edit
                .chars()
                .zip("国务院".chars())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(differing, 1);
        }
    }

    #[test]
    fn test_confusion_words_homophones() {
        let generator = generator();
        assert_eq!(generator.confusion_words("物"), set(&["务", "物", "误"]));
    }

    #[test]
    fn test_confusion_words_accepts_multi_char_words() {
        let generator = generator();
        // 国家 does not read like 国物 but is a known two-character word.
        assert_eq!(generator.confusion_words("国物"), set(&["国务", "国家"]));
    }

    #[test]
    fn test_custom_confusion_always_included() {
        let generator = generator();
        assert!(!generator.store().contains_word("关于"));
        assert!(generator.confusion_words("关与").contains("关于"));
    }

    #[test]
    fn test_confusion_chars() {
        let generator = generator();
        assert_eq!(generator.confusion_chars("物"), set(&["务", "误", "坞"]));
        assert_eq!(generator.confusion_chars("未"), set(&["末"]));
        assert!(generator.confusion_chars("院").is_empty());
    }

    #[test]
    fn test_generate_candidate_ranked_by_frequency() {
        let generator = generator();
        assert_eq!(
            generator.generate_candidate("物"),
            vec!["务", "物", "误", "坞"]
        );
    }

    #[test]
    fn test_generate_candidate_fragment() {
        let generator = generator();
        assert_eq!(
            generator.generate_candidate_fragment("物", 1).unwrap().len(),
            4
        );
        assert_eq!(
            generator.generate_candidate_fragment("物", 2).unwrap(),
            vec!["务", "物", "误"]
        );
        assert_eq!(
            generator.generate_candidate_fragment("物", 10).unwrap(),
            vec!["务"]
        );
        assert!(generator.generate_candidate_fragment("物", 0).is_err());
    }

    #[test]
    fn test_generate_candidate_drops_non_chinese() {
        let generator = generator();
        assert!(generator.generate_candidate("abc").is_empty());
    }

    #[test]
    fn test_multi_char_word_skips_char_confusion() {
        let generator = generator();
        let candidates = generator.generate_candidate("国物");
        assert_eq!(candidates, vec!["国家", "国务"]);
    }
}
