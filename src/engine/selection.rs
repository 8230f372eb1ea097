/// The contiguous run of donor indices currently picked up for a graft.
///
/// The entire contiguity rule lives in [`Selection::select`]: growing the
/// run is only possible at its two ends, and any other index restarts the
/// run there. Nothing else ever needs to validate the shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    /// Toggle/extend rule: empty becomes `{index}`; `min - 1` prepends;
    /// `max + 1` appends; anything else resets to `{index}`. Out-of-range
    /// indices are the caller's precondition, not a runtime error.
    pub fn select(&mut self, index: usize) {
        let (Some(&min), Some(&max)) = (self.indices.first(), self.indices.last()) else {
            self.indices.push(index);
            return;
        };

        if index + 1 == min {
            self.indices.insert(0, index);
        } else if index == max + 1 {
            self.indices.push(index);
        } else {
            self.indices.clear();
            self.indices.push(index);
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Ascending, gap-free run of selected indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices
            .first()
            .zip(self.indices.last())
            .is_some_and(|(&min, &max)| index >= min && index <= max)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn first_select_starts_a_run() {
        let mut selection = Selection::default();
        selection.select(3);
        assert_eq!(selection.indices(), &[3]);
    }

    #[test]
    fn adjacent_selects_grow_both_ends() {
        let mut selection = Selection::default();
        selection.select(3);
        selection.select(4);
        selection.select(2);
        assert_eq!(selection.indices(), &[2, 3, 4]);
    }

    #[test]
    fn gap_resets_the_run() {
        let mut selection = Selection::default();
        selection.select(3);
        selection.select(4);
        selection.select(0);
        assert_eq!(selection.indices(), &[0]);
    }

    #[test]
    fn reselecting_inside_the_run_resets_to_that_index() {
        let mut selection = Selection::default();
        selection.select(2);
        selection.select(3);
        selection.select(4);
        selection.select(3);
        assert_eq!(selection.indices(), &[3]);
    }

    #[test]
    fn prepending_below_zero_is_a_reset_not_an_underflow() {
        let mut selection = Selection::default();
        selection.select(0);
        selection.select(5);
        assert_eq!(selection.indices(), &[5]);
    }

    #[test]
    fn contains_spans_the_run() {
        let mut selection = Selection::default();
        selection.select(2);
        selection.select(3);
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(!selection.contains(1));
        assert!(!selection.contains(4));
    }

    #[test]
    fn any_select_sequence_keeps_the_run_contiguous() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut selection = Selection::default();

        for _ in 0..2000 {
            selection.select(rng.gen_range(0..12));

            let indices = selection.indices();
            assert!(!indices.is_empty());
            for pair in indices.windows(2) {
                assert_eq!(pair[0] + 1, pair[1]);
            }
        }
    }
}
