//! Line-oriented loaders for the confusion dictionaries.
//!
//! Every loader reads UTF-8 lines, trims them, and skips blank lines and
//! lines starting with `#`. Malformed lines are skipped, never fatal; only
//! I/O failures are reported.

use std::io::BufRead;

use ahash::{AHashMap, AHashSet};

use crate::error::Result;

/// Alphabet of frequent standalone characters.
pub type CommonCharSet = AHashSet<char>;

/// Curated `wrong -> correct` overrides.
pub type CustomConfusionMap = AHashMap<String, String>;

/// Word frequencies used for ranking.
pub type WordFrequency = AHashMap<String, u64>;

/// Map from a character to the characters it is confusable with.
pub type ConfusionSets = AHashMap<String, AHashSet<String>>;

/// Collect the content lines of a reader: trimmed, non-blank, non-comment.
fn content_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push(line.to_string());
    }
    Ok(lines)
}

/// Load the common character set, one character per line.
///
/// Lines holding more than one character are skipped.
pub fn load_common_chars<R: BufRead>(reader: R) -> Result<CommonCharSet> {
    let mut common_chars = CommonCharSet::new();
    for line in content_lines(reader)? {
        let mut chars = line.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            common_chars.insert(c);
        }
    }
    Ok(common_chars)
}

/// Load custom confusions: `wrongWord correctWord [ignored...]`.
///
/// A later line for the same wrong word replaces the earlier one.
pub fn load_custom_confusion<R: BufRead>(reader: R) -> Result<CustomConfusionMap> {
    let mut custom_confusion = CustomConfusionMap::new();
    for line in content_lines(reader)? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        custom_confusion.insert(parts[0].to_string(), parts[1].to_string());
    }
    Ok(custom_confusion)
}

/// Load word frequencies: `word frequency`.
///
/// Lines whose frequency is not a non-negative integer are skipped.
pub fn load_word_freq<R: BufRead>(reader: R) -> Result<WordFrequency> {
    let mut word_freq = WordFrequency::new();
    for line in content_lines(reader)? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        if let Ok(frequency) = parts[1].parse::<u64>() {
            word_freq.insert(parts[0].to_string(), frequency);
        }
    }
    Ok(word_freq)
}

/// Load same-pinyin groups: `char<TAB>sameToneChars<TAB>diffToneChars`.
///
/// The value is the union of the individual characters of the second and
/// third columns. Lines with fewer than three columns, an empty key or an
/// empty union are skipped.
pub fn load_same_pinyin<R: BufRead>(reader: R) -> Result<ConfusionSets> {
    let mut same_pinyin = ConfusionSets::new();
    for line in content_lines(reader)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            continue;
        }
        let key = parts[0];
        let value: AHashSet<String> = parts[1]
            .chars()
            .chain(parts[2].chars())
            .map(|c| c.to_string())
            .collect();
        if !key.is_empty() && !value.is_empty() {
            same_pinyin.insert(key.to_string(), value);
        }
    }
    Ok(same_pinyin)
}

/// Load same-stroke groups: `char1<TAB>char2<TAB>...<TAB>charN`.
///
/// Every member of a line maps to all other members of that line. A member
/// seen on several lines keeps the set of the last one.
pub fn load_same_stroke<R: BufRead>(reader: R) -> Result<ConfusionSets> {
    let mut same_stroke = ConfusionSets::new();
    for line in content_lines(reader)? {
        let group: Vec<&str> = line.split('\t').filter(|part| !part.is_empty()).collect();
        if group.len() < 2 {
            continue;
        }
        for (i, member) in group.iter().enumerate() {
            let others: AHashSet<String> = group
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, other)| other.to_string())
                .collect();
            same_stroke.insert(member.to_string(), others);
        }
    }
    Ok(same_stroke)
}
