use std::collections::BTreeSet;

use crate::dictionary::Dictionary;
use crate::engine::word::Word;

/// Shortest substring the dictionary gate accepts.
pub const MIN_MATCH_LEN: usize = 3;

/// A located dictionary word in the post-graft target: half-open `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

/// Outcome of resolving one graft against the dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub cleaned: Word,
    pub points: u32,
    pub ranges: Vec<MatchRange>,
}

/// Finds every dictionary substring of `target` that overlaps at least one
/// inserted position and deletes the union of their letters.
///
/// Ranges are scored individually: nested and overlapping matches each earn
/// one point even though the removal set merges them. One graft that spells
/// several words at once is rewarded for all of them.
pub fn resolve(target: &Word, inserted: &[usize], dict: &Dictionary) -> Resolution {
    let len = target.len();
    let mut ranges = Vec::new();

    for start in 0..len {
        for end in (start + MIN_MATCH_LEN)..=len {
            if !inserted.iter().any(|&i| i >= start && i < end) {
                continue;
            }
            if dict.contains(&target.slice_lower(start, end)) {
                ranges.push(MatchRange { start, end });
            }
        }
    }

    if ranges.is_empty() {
        return Resolution {
            cleaned: target.clone(),
            points: 0,
            ranges,
        };
    }

    let mut removed = BTreeSet::new();
    for range in &ranges {
        removed.extend(range.start..range.end);
    }

    Resolution {
        cleaned: target.without_indices(&removed),
        points: ranges.len() as u32,
        ranges,
    }
}

/// Exhaustive check that some graft could still produce a dictionary word:
/// every contiguous donor fragment, spliced at every target position,
/// scanned for any member substring.
///
/// Membership alone qualifies — the substring is not required to overlap
/// the tested insertion, so a pre-existing word in the target already
/// counts. Quartic in the word lengths; callers treat it as a hint, never
/// as a turn-loop step.
pub fn any_move_exists(donor: &Word, target: &Word, dict: &Dictionary) -> bool {
    for start in 0..donor.len() {
        for end in (start + 1)..=donor.len() {
            let run = &donor.letters()[start..end];
            for position in 0..=target.len() {
                if contains_any_entry(&target.splice(position, run), dict) {
                    return true;
                }
            }
        }
    }
    false
}

fn contains_any_entry(word: &Word, dict: &Dictionary) -> bool {
    let len = word.len();
    for start in 0..len {
        for end in (start + MIN_MATCH_LEN)..=len {
            if dict.contains(&word.slice_lower(start, end)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(words: &[&str]) -> Dictionary {
        Dictionary::from_words(words.iter().map(|w| w.to_string()))
    }

    #[test]
    fn graft_with_no_member_substring_changes_nothing() {
        // "CA" grafted onto "DOG": "cat" is in the dictionary but "CADOG"
        // never spells it, so the word survives intact.
        let dictionary = dict(&["cat", "dog"]);
        let target = Word::new("CADOG");

        let resolution = resolve(&target, &[0, 1], &dictionary);

        assert_eq!(resolution.points, 0);
        assert!(resolution.ranges.is_empty());
        assert_eq!(resolution.cleaned, target);
    }

    #[test]
    fn single_match_covering_the_word_empties_it() {
        let dictionary = dict(&["cat"]);
        let target = Word::new("CAT");

        let resolution = resolve(&target, &[0], &dictionary);

        assert_eq!(resolution.points, 1);
        assert_eq!(
            resolution.ranges,
            vec![MatchRange { start: 0, end: 3 }]
        );
        assert!(resolution.cleaned.is_empty());
    }

    #[test]
    fn member_substring_without_inserted_overlap_does_not_score() {
        // "cat" sits at [0, 3) but the graft only touched index 4.
        let dictionary = dict(&["cat"]);
        let target = Word::new("CATZQ");

        let resolution = resolve(&target, &[4], &dictionary);

        assert_eq!(resolution.points, 0);
        assert_eq!(resolution.cleaned, target);
    }

    #[test]
    fn overlap_on_any_single_index_is_enough() {
        let dictionary = dict(&["cat"]);
        let target = Word::new("CATZQ");

        let resolution = resolve(&target, &[2], &dictionary);

        assert_eq!(resolution.points, 1);
        assert_eq!(resolution.cleaned.to_string(), "ZQ");
    }

    #[test]
    fn overlapping_ranges_each_score_but_letters_delete_once() {
        // "TEAT" holds tea [0,3), eat [1,4) and teat [0,4): three points,
        // four letters gone.
        let dictionary = dict(&["tea", "eat", "teat"]);
        let target = Word::new("TEATXY");

        let resolution = resolve(&target, &[0, 1, 2, 3], &dictionary);

        assert_eq!(resolution.points, 3);
        assert_eq!(resolution.cleaned.to_string(), "XY");
    }

    #[test]
    fn cleaned_length_accounts_for_every_removed_position() {
        let dictionary = dict(&["tea", "eat", "teat"]);
        let target = Word::new("TEATXY");

        let resolution = resolve(&target, &[0, 1, 2, 3], &dictionary);

        let mut removed = BTreeSet::new();
        for range in &resolution.ranges {
            removed.extend(range.start..range.end);
        }
        assert_eq!(resolution.cleaned.len() + removed.len(), target.len());
    }

    #[test]
    fn substrings_below_three_letters_never_match() {
        let dictionary = dict(&["at"]);
        let target = Word::new("ATZ");

        // "at" was filtered out at dictionary load; nothing length-2 can
        // score even when present in the raw input list.
        let resolution = resolve(&target, &[0, 1], &dictionary);
        assert_eq!(resolution.points, 0);
    }

    #[test]
    fn move_exists_when_a_graft_completes_a_word() {
        let dictionary = dict(&["cat"]);
        assert!(any_move_exists(
            &Word::new("C"),
            &Word::new("AT"),
            &dictionary
        ));
    }

    #[test]
    fn move_does_not_exist_when_no_splice_spells_anything() {
        let dictionary = dict(&["cat"]);
        assert!(!any_move_exists(
            &Word::new("Z"),
            &Word::new("AT"),
            &dictionary
        ));
    }

    #[test]
    fn pre_existing_target_word_counts_as_a_move() {
        // The check is membership-only: "cat" already sits in the target,
        // so any fragment placement qualifies even though the graft itself
        // spells nothing.
        let dictionary = dict(&["cat"]);
        assert!(any_move_exists(
            &Word::new("Z"),
            &Word::new("CAT"),
            &dictionary
        ));
    }
}
