use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use rand::rngs::SmallRng;

use crate::dictionary::Dictionary;
use crate::engine::clock::{Clock, TickFn, TickHandle};
use crate::engine::matcher;
use crate::engine::selection::Selection;
use crate::engine::word::Word;

pub const ROUND_SECONDS: u32 = 60;
pub const MAX_SECONDS: u32 = 120;
pub const BONUS_SECONDS_PER_POINT: u32 = 5;
pub const HISTORY_DEPTH: usize = 10;
pub const TARGET_MAX_LEN: usize = 6;

// Placeholder board when the dictionary cannot supply both words.
const FALLBACK_DONOR: &str = "ERROR";
const FALLBACK_TARGET: &str = "WORD";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Active,
    Won,
    Lost,
}

/// One undo step: the committed words and score before a graft. Remaining
/// time and the selection are deliberately not captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub donor: Word,
    pub target: Word,
    pub score: u32,
}

/// One round of the grafting game: donor/target words, score, countdown,
/// selection, and the undo history. Everything mutates through the methods
/// below; the UI only reads between events.
pub struct RoundEngine {
    dict: Dictionary,
    clock: Box<dyn Clock>,
    on_tick: TickFn,
    tick_handle: Option<TickHandle>,
    phase: Phase,
    donor: Word,
    target: Word,
    score: u32,
    time_remaining: u32,
    selection: Selection,
    history: VecDeque<Snapshot>,
    degraded: bool,
    rng: SmallRng,
}

impl RoundEngine {
    pub fn new(dict: Dictionary, clock: Box<dyn Clock>, on_tick: TickFn, rng: SmallRng) -> Self {
        Self {
            dict,
            clock,
            on_tick,
            tick_handle: None,
            phase: Phase::Loading,
            donor: Word::new(""),
            target: Word::new(""),
            score: 0,
            time_remaining: ROUND_SECONDS,
            selection: Selection::default(),
            history: VecDeque::new(),
            degraded: false,
            rng,
        }
    }

    /// Resets the round and picks fresh words: the donor uniformly from the
    /// whole dictionary, the target uniformly from the length-≤6 subset.
    /// When the dictionary has fewer than two usable words or the subset is
    /// empty, the round starts on fixed placeholder words instead of
    /// failing; `is_degraded` reports the condition.
    pub fn start_new_game(&mut self) {
        let donor = self.dict.random_word(&mut self.rng).map(str::to_owned);
        let target = self
            .dict
            .random_word_within(TARGET_MAX_LEN, &mut self.rng)
            .map(str::to_owned);

        match (donor, target) {
            (Some(donor), Some(target)) if self.dict.len() >= 2 => {
                self.begin(&donor, &target, false);
            }
            _ => self.begin(FALLBACK_DONOR, FALLBACK_TARGET, true),
        }
    }

    /// Starts a round on caller-chosen words — the deterministic entry
    /// point `start_new_game` delegates to once it has picked. Lets
    /// scripted boards bypass the random draw.
    pub fn start_with_words(&mut self, donor: &str, target: &str) {
        self.begin(donor, target, false);
    }

    fn begin(&mut self, donor: &str, target: &str, degraded: bool) {
        self.score = 0;
        self.time_remaining = ROUND_SECONDS;
        self.selection.clear();
        self.history.clear();
        self.degraded = degraded;
        self.donor = Word::new(donor);
        self.target = Word::new(target);

        // At most one live timer per engine: an uncancelled predecessor
        // would keep decrementing the fresh round.
        if let Some(handle) = self.tick_handle.take() {
            handle.cancel();
        }
        self.tick_handle = Some(self.clock.subscribe(Arc::clone(&self.on_tick)));

        self.phase = Phase::Active;
    }

    /// Extends or restarts the selection run. Out-of-bounds indices are
    /// ignored — stale UI callbacks may point into a donor that has since
    /// shrunk.
    pub fn select_letter(&mut self, index: usize) {
        if self.phase != Phase::Active || index >= self.donor.len() {
            return;
        }
        self.selection.select(index);
    }

    /// Grafts the selected run into the target before `position`
    /// (`0..=target.len()`), resolves matches, applies score and time
    /// bonus, and settles the round outcome.
    pub fn insert_at(&mut self, position: usize) {
        if self.phase != Phase::Active
            || self.selection.is_empty()
            || position > self.target.len()
        {
            return;
        }

        self.push_history();

        let run = self.donor.letters_at(self.selection.indices());
        let new_target = self.target.splice(position, &run);
        let picked: BTreeSet<usize> = self.selection.indices().iter().copied().collect();
        let new_donor = self.donor.without_indices(&picked);
        let inserted: Vec<usize> = (position..position + run.len()).collect();

        let resolution = matcher::resolve(&new_target, &inserted, &self.dict);
        self.score += resolution.points;
        if resolution.points > 0 {
            self.time_remaining = (self.time_remaining
                + resolution.points * BONUS_SECONDS_PER_POINT)
                .min(MAX_SECONDS);
        }

        if resolution.cleaned.is_empty() {
            // Target fully carved away. The pre-graft words stay on the
            // board behind the victory overlay.
            self.finish(Phase::Won);
            return;
        }

        if new_donor.is_empty() {
            // Donor spent with letters still on the target.
            self.donor = Word::blank();
            self.target = Word::blank();
            self.finish(Phase::Lost);
            return;
        }

        self.donor = new_donor;
        self.target = resolution.cleaned;
        self.selection.clear();
    }

    fn push_history(&mut self) {
        if self.history.len() == HISTORY_DEPTH {
            self.history.pop_back();
        }
        self.history.push_front(Snapshot {
            donor: self.donor.clone(),
            target: self.target.clone(),
            score: self.score,
        });
    }

    /// Restores the most recent snapshot: words and score only. Time spent
    /// is not refunded and a settled outcome stays settled.
    pub fn undo(&mut self) {
        let Some(snapshot) = self.history.pop_front() else {
            return;
        };
        self.donor = snapshot.donor;
        self.target = snapshot.target;
        self.score = snapshot.score;
        self.selection.clear();
    }

    /// One second of round time. Reaching zero consumes the board.
    pub fn tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.donor = Word::blank();
            self.target = Word::blank();
            self.finish(Phase::Lost);
        }
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        if let Some(handle) = self.tick_handle.take() {
            handle.cancel();
        }
    }

    /// Abandons the round: clock stopped, state dropped.
    pub fn quit(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            handle.cancel();
        }
        self.phase = Phase::Loading;
        self.donor = Word::new("");
        self.target = Word::new("");
        self.score = 0;
        self.time_remaining = ROUND_SECONDS;
        self.selection.clear();
        self.history.clear();
        self.degraded = false;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn donor(&self) -> &Word {
        &self.donor
    }

    pub fn target(&self) -> &Word {
        &self.target
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Exhaustive could-anything-still-match search. Expensive; the app
    /// only calls it behind the hint toggle.
    pub fn any_move_exists(&self) -> bool {
        matcher::any_move_exists(&self.donor, &self.target, &self.dict)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use rand::SeedableRng;

    use super::*;

    /// Records every subscription so tests can watch cancellation; ticks
    /// are driven by calling `tick()` directly.
    struct ManualClock {
        subs: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    }

    impl Clock for ManualClock {
        fn subscribe(&self, _on_tick: TickFn) -> TickHandle {
            let flag = Arc::new(AtomicBool::new(false));
            self.subs.lock().unwrap().push(Arc::clone(&flag));
            TickHandle::new(flag)
        }
    }

    fn engine_with(words: &[&str]) -> (RoundEngine, Arc<Mutex<Vec<Arc<AtomicBool>>>>) {
        let dict = Dictionary::from_words(words.iter().map(|w| w.to_string()));
        let subs = Arc::new(Mutex::new(Vec::new()));
        let clock = ManualClock {
            subs: Arc::clone(&subs),
        };
        let engine = RoundEngine::new(
            dict,
            Box::new(clock),
            Arc::new(|| {}),
            SmallRng::seed_from_u64(7),
        );
        (engine, subs)
    }

    fn select_run(engine: &mut RoundEngine, indices: std::ops::RangeInclusive<usize>) {
        for index in indices {
            engine.select_letter(index);
        }
    }

    #[test]
    fn graft_that_spells_a_word_wins_the_round() {
        let (mut engine, subs) = engine_with(&["cat"]);
        engine.start_with_words("C", "AT");

        engine.select_letter(0);
        engine.insert_at(0);

        assert_eq!(engine.phase(), Phase::Won);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.time_remaining(), ROUND_SECONDS + BONUS_SECONDS_PER_POINT);
        // The pre-graft words stay on the board behind the overlay.
        assert_eq!(engine.donor().to_string(), "C");
        assert_eq!(engine.target().to_string(), "AT");
        assert!(subs.lock().unwrap()[0].load(Ordering::Relaxed));

        // A tick already in flight when the round settled changes nothing.
        engine.tick();
        assert_eq!(engine.time_remaining(), ROUND_SECONDS + BONUS_SECONDS_PER_POINT);
    }

    #[test]
    fn spent_donor_with_target_letters_left_loses() {
        let (mut engine, _) = engine_with(&["cat"]);
        engine.start_with_words("Z", "AT");

        engine.select_letter(0);
        engine.insert_at(0);

        assert_eq!(engine.phase(), Phase::Lost);
        assert_eq!(engine.donor().to_string(), " ");
        assert_eq!(engine.target().to_string(), " ");
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn graft_without_a_match_commits_and_stays_active() {
        let (mut engine, _) = engine_with(&["cat", "dog"]);
        engine.start_with_words("CAT", "DOG");

        select_run(&mut engine, 0..=1);
        engine.insert_at(0);

        assert_eq!(engine.phase(), Phase::Active);
        assert_eq!(engine.donor().to_string(), "T");
        assert_eq!(engine.target().to_string(), "CADOG");
        assert_eq!(engine.score(), 0);
        assert!(engine.selection().is_empty());
        assert!(engine.can_undo());
    }

    #[test]
    fn overlapping_matches_each_score_one_point() {
        let (mut engine, _) = engine_with(&["tea", "eat", "teat"]);
        engine.start_with_words("TEATQ", "XY");

        select_run(&mut engine, 0..=3);
        engine.insert_at(0);

        assert_eq!(engine.phase(), Phase::Active);
        assert_eq!(engine.score(), 3);
        assert_eq!(engine.target().to_string(), "XY");
        assert_eq!(engine.donor().to_string(), "Q");
        assert_eq!(
            engine.time_remaining(),
            ROUND_SECONDS + 3 * BONUS_SECONDS_PER_POINT
        );
    }

    #[test]
    fn time_bonus_never_exceeds_the_cap() {
        let (mut engine, _) = engine_with(&["aaa", "aaaa", "aaaaa", "aaaaaa", "aaaaaaa"]);
        engine.start_with_words("AAAAAAAZ", "B");

        // Seven grafted As spell fifteen overlapping runs of a's.
        select_run(&mut engine, 0..=6);
        engine.insert_at(0);

        assert_eq!(engine.phase(), Phase::Active);
        assert_eq!(engine.score(), 15);
        assert_eq!(engine.time_remaining(), MAX_SECONDS);
        assert_eq!(engine.target().to_string(), "B");
        assert_eq!(engine.donor().to_string(), "Z");
    }

    #[test]
    fn undo_restores_words_and_score_but_never_time() {
        let (mut engine, _) = engine_with(&["tea", "eat", "teat"]);
        engine.start_with_words("TEATQ", "XY");

        select_run(&mut engine, 0..=3);
        engine.insert_at(0);
        let boosted = engine.time_remaining();
        assert!(boosted > ROUND_SECONDS);

        engine.undo();

        assert_eq!(engine.donor().to_string(), "TEATQ");
        assert_eq!(engine.target().to_string(), "XY");
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.time_remaining(), boosted);
        assert!(engine.selection().is_empty());
        assert!(!engine.can_undo());
    }

    #[test]
    fn undo_with_empty_history_is_a_noop() {
        let (mut engine, _) = engine_with(&["cat", "dog"]);
        engine.start_with_words("CAT", "DOG");

        engine.undo();

        assert_eq!(engine.donor().to_string(), "CAT");
        assert_eq!(engine.target().to_string(), "DOG");
        assert_eq!(engine.phase(), Phase::Active);
    }

    #[test]
    fn history_keeps_only_the_ten_most_recent_snapshots() {
        let (mut engine, _) = engine_with(&["qqq"]);
        engine.start_with_words("ABCDEFGHIJKL", "Z");

        // Eleven single-letter grafts; the initial-state snapshot falls
        // off the bottom.
        for _ in 0..11 {
            engine.select_letter(0);
            engine.insert_at(0);
        }
        assert_eq!(engine.phase(), Phase::Active);

        let mut undos = 0;
        while engine.can_undo() {
            engine.undo();
            undos += 1;
        }

        assert_eq!(undos, HISTORY_DEPTH);
        // Ten undos land on the board as it stood after the first graft.
        assert_eq!(engine.donor().len(), 11);
        assert_eq!(engine.target().to_string(), "AZ");
    }

    #[test]
    fn insert_with_empty_selection_is_a_noop() {
        let (mut engine, _) = engine_with(&["cat", "dog"]);
        engine.start_with_words("CAT", "DOG");

        engine.insert_at(0);

        assert_eq!(engine.donor().to_string(), "CAT");
        assert_eq!(engine.target().to_string(), "DOG");
        assert!(!engine.can_undo());
    }

    #[test]
    fn out_of_bounds_indices_are_ignored() {
        let (mut engine, _) = engine_with(&["cat", "dog"]);
        engine.start_with_words("CAT", "DOG");

        engine.select_letter(99);
        assert!(engine.selection().is_empty());

        engine.select_letter(0);
        engine.insert_at(engine.target().len() + 1);
        assert_eq!(engine.target().to_string(), "DOG");
        assert!(!engine.can_undo());
        // The selection survives a rejected insert.
        assert_eq!(engine.selection().indices(), &[0]);
    }

    #[test]
    fn timer_expiry_consumes_the_board() {
        let (mut engine, _) = engine_with(&["cat"]);
        engine.start_with_words("CAT", "DOG");

        for _ in 0..(ROUND_SECONDS - 1) {
            engine.tick();
        }
        assert_eq!(engine.phase(), Phase::Active);
        assert_eq!(engine.time_remaining(), 1);

        engine.tick();

        assert_eq!(engine.phase(), Phase::Lost);
        assert_eq!(engine.time_remaining(), 0);
        assert_eq!(engine.donor().to_string(), " ");
        assert_eq!(engine.target().to_string(), " ");
    }

    #[test]
    fn settled_round_ignores_further_input() {
        let (mut engine, _) = engine_with(&["cat"]);
        engine.start_with_words("C", "AT");
        engine.select_letter(0);
        engine.insert_at(0);
        assert_eq!(engine.phase(), Phase::Won);

        let selection_before = engine.selection().clone();
        engine.select_letter(0);
        assert_eq!(engine.selection(), &selection_before);
        engine.insert_at(0);
        assert_eq!(engine.phase(), Phase::Won);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn new_game_cancels_the_previous_subscription() {
        let (mut engine, subs) = engine_with(&["cat", "dog"]);

        engine.start_new_game();
        engine.start_new_game();

        let subs = subs.lock().unwrap();
        assert_eq!(subs.len(), 2);
        assert!(subs[0].load(Ordering::Relaxed));
        assert!(!subs[1].load(Ordering::Relaxed));
    }

    #[test]
    fn quit_cancels_the_subscription_and_drops_the_round() {
        let (mut engine, subs) = engine_with(&["cat", "dog"]);
        engine.start_new_game();

        engine.quit();

        assert_eq!(engine.phase(), Phase::Loading);
        assert!(engine.donor().is_empty());
        assert!(subs.lock().unwrap()[0].load(Ordering::Relaxed));
    }

    #[test]
    fn too_small_dictionary_degrades_to_placeholder_words() {
        let (mut engine, _) = engine_with(&["cat"]);

        engine.start_new_game();

        assert!(engine.is_degraded());
        assert_eq!(engine.phase(), Phase::Active);
        assert_eq!(engine.donor().to_string(), "ERROR");
        assert_eq!(engine.target().to_string(), "WORD");
    }

    #[test]
    fn dictionary_without_short_targets_degrades_too() {
        let (mut engine, _) = engine_with(&["elephants", "mountains"]);

        engine.start_new_game();

        assert!(engine.is_degraded());
        assert_eq!(engine.donor().to_string(), "ERROR");
        assert_eq!(engine.target().to_string(), "WORD");
    }

    #[test]
    fn fresh_start_clears_the_degraded_flag() {
        let (mut engine, _) = engine_with(&["cat"]);
        engine.start_new_game();
        assert!(engine.is_degraded());

        engine.start_with_words("CAT", "DOG");
        assert!(!engine.is_degraded());
    }
}
