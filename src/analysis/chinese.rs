//! Character classes and phonetic keys for Chinese text.

use pinyin::ToPinyin;

/// First code point of the CJK Unified Ideographs range treated as Chinese.
pub const CJK_START: char = '\u{4e00}';

/// Last code point of the CJK Unified Ideographs range treated as Chinese.
pub const CJK_END: char = '\u{9fa5}';

/// Check whether `c` is a Chinese character (U+4E00..=U+9FA5).
#[inline]
pub fn is_chinese_char(c: char) -> bool {
    (CJK_START..=CJK_END).contains(&c)
}

/// Check whether every character in `s` is Chinese.
///
/// The empty string is not Chinese.
pub fn is_chinese_string(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_chinese_char)
}

/// Plain (toneless) pinyin transcription of `text`, one entry per character.
///
/// Characters without a reading are transcribed as themselves, so two
/// strings have equal keys exactly when they read the same character by
/// character.
pub fn pinyin_key(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| match c.to_pinyin() {
            Some(p) => p.plain().to_string(),
            None => c.to_string(),
        })
        .collect()
}
