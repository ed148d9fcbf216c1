// src/hid/debounce.rs  —  Newly pressed keys only
//
// The scanner re-sends every still-held usage code on each report until the
// key is released.  Only codes absent from the previous report are new.
use super::report::{KeyCode, PressedKeySet};

/// `sort(current − previous)` — BTreeSet iteration is already ascending.
pub fn debounce(current: &PressedKeySet, previous: &PressedKeySet) -> Vec<KeyCode> {
    current.difference(previous).copied().collect()
}

/// Keeps one report of history between polls.
#[derive(Debug, Default)]
pub struct Debouncer {
    previous: PressedKeySet,
}

impl Debouncer {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, current: PressedKeySet) -> Vec<KeyCode> {
        let fresh = debounce(&current, &self.previous);
        self.previous = current;
        fresh
    }

    /// Forget history (device re-opened)
    pub fn reset(&mut self) { self.previous.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[u8]) -> PressedKeySet { codes.iter().copied().collect() }

    #[test]
    fn set_difference_sorted() {
        assert_eq!(debounce(&set(&[0x10, 0x05, 0x07]), &set(&[0x07])), vec![0x05, 0x10]);
        assert_eq!(debounce(&set(&[]), &set(&[0x04])), Vec::<u8>::new());
        assert_eq!(debounce(&set(&[0x04]), &set(&[0x04])), Vec::<u8>::new());
    }

    #[test]
    fn exhaustive_small_sets() {
        // every pair of subsets of a 5-code universe
        let universe = [0x04u8, 0x05, 0x1E, 0x28, 0x2D];
        let subsets: Vec<PressedKeySet> = (0u32..32)
            .map(|bits| universe.iter().enumerate()
                .filter(|(i, _)| bits & (1 << i) != 0)
                .map(|(_, &c)| c)
                .collect())
            .collect();
        for cur in &subsets {
            for prev in &subsets {
                let out = debounce(cur, prev);
                let mut want: Vec<u8> = cur.iter().filter(|c| !prev.contains(*c)).copied().collect();
                want.sort_unstable();
                want.dedup();
                assert_eq!(out, want);
                assert!(out.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn held_key_reported_once() {
        let mut d = Debouncer::new();
        assert_eq!(d.push(set(&[0x0B])), vec![0x0B]);
        assert_eq!(d.push(set(&[0x0B])), Vec::<u8>::new());
        assert_eq!(d.push(set(&[])), Vec::<u8>::new());
        // released then pressed again → new
        assert_eq!(d.push(set(&[0x0B])), vec![0x0B]);
    }

    #[test]
    fn reset_forgets_history() {
        let mut d = Debouncer::new();
        d.push(set(&[0x28]));
        d.reset();
        assert_eq!(d.push(set(&[0x28])), vec![0x28]);
    }
}
