use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::rngs::SmallRng;
use thiserror::Error;

const WORDS_EN: &str = include_str!("../assets/words-en.json");

/// Shortest word the game plays with or scores.
pub const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read word list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("word list {path} contains no usable words (alphabetic, 3+ letters)")]
    Empty { path: PathBuf },
}

/// Case-insensitive membership oracle plus the enumerable word set rounds
/// are seeded from. Fully loaded before a round starts; the engine only
/// queries it.
pub struct Dictionary {
    words: Vec<String>,
    index: HashSet<String>,
}

impl Dictionary {
    /// The embedded English list.
    pub fn load() -> Self {
        let words: Vec<String> = serde_json::from_str(WORDS_EN).unwrap_or_default();
        Self::from_words(words)
    }

    /// A newline-delimited word list from disk — the format the classic
    /// public lists ship in.
    pub fn from_file(path: &Path) -> Result<Self, DictionaryError> {
        let content = fs::read_to_string(path).map_err(|source| DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dict = Self::from_words(content.lines().map(str::to_string));
        if dict.is_empty() {
            return Err(DictionaryError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(dict)
    }

    /// Normalizes to lowercase and keeps alphabetic words of 3+ letters,
    /// first occurrence wins.
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut index = HashSet::new();
        let mut kept = Vec::new();
        for raw in words {
            let word = raw.trim().to_lowercase();
            if word.chars().count() < MIN_WORD_LEN || !word.chars().all(char::is_alphabetic) {
                continue;
            }
            if index.insert(word.clone()) {
                kept.push(word);
            }
        }
        Self { words: kept, index }
    }

    /// Membership check; callers pass lowercase.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn random_word(&self, rng: &mut SmallRng) -> Option<&str> {
        if self.words.is_empty() {
            return None;
        }
        Some(&self.words[rng.gen_range(0..self.words.len())])
    }

    /// Uniform pick among words of at most `max_len` letters.
    pub fn random_word_within(&self, max_len: usize, rng: &mut SmallRng) -> Option<&str> {
        let capped: Vec<&str> = self
            .words
            .iter()
            .filter(|w| w.chars().count() <= max_len)
            .map(String::as_str)
            .collect();
        if capped.is_empty() {
            return None;
        }
        Some(capped[rng.gen_range(0..capped.len())])
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn load_filters_to_playable_words() {
        let dict = Dictionary::load();
        assert!(dict.len() > 500);
        for word in dict.words() {
            assert!(word.chars().count() >= MIN_WORD_LEN);
            assert!(word.chars().all(|ch| ch.is_ascii_lowercase()));
        }
    }

    #[test]
    fn from_words_drops_short_and_non_alphabetic_entries() {
        let dict = Dictionary::from_words(
            ["at", "cat", "4th", "don't", "  dog  ", ""]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("cat"));
        assert!(dict.contains("dog"));
        assert!(!dict.contains("at"));
    }

    #[test]
    fn membership_is_case_normalized_at_load() {
        let dict = Dictionary::from_words(["CAT", "Cat", "cat"].into_iter().map(String::from));
        assert_eq!(dict.len(), 1);
        assert!(dict.contains("cat"));
        assert!(!dict.contains("CAT"));
    }

    #[test]
    fn capped_pick_respects_the_length_limit() {
        let dict = Dictionary::from_words(
            ["cat", "elephants", "dog", "mountains"]
                .into_iter()
                .map(String::from),
        );
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let word = dict.random_word_within(6, &mut rng).unwrap();
            assert!(word.chars().count() <= 6);
        }
    }

    #[test]
    fn capped_pick_is_none_when_everything_is_too_long() {
        let dict =
            Dictionary::from_words(["elephants", "mountains"].into_iter().map(String::from));
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(dict.random_word_within(6, &mut rng).is_none());
        assert!(dict.random_word(&mut rng).is_some());
    }

    #[test]
    fn unreadable_file_reports_the_path() {
        let err = Dictionary::from_file(Path::new("/nonexistent/words.txt")).unwrap_err();
        assert!(matches!(err, DictionaryError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/words.txt"));
    }
}
