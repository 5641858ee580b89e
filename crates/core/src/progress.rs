//! Progress reporting for the term reduction
//!
//! Progress is a side effect only; nothing in the computation depends on it.
//! Ticks from different workers may arrive in any order.

use std::io::Write;

/// Markers emitted over a whole reduction
pub const MARKERS: usize = 81;

/// Receives coarse progress events from reduction workers
pub trait ProgressObserver: Sync {
    /// Another `1/MARKERS` of the terms has been claimed
    fn tick(&self);

    /// All terms are claimed and merged
    fn finish(&self);
}

/// Writes one `.` per tick to stderr and a newline when done
#[derive(Debug, Default, Clone, Copy)]
pub struct Dots;

impl ProgressObserver for Dots {
    fn tick(&self) {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(b".");
        let _ = err.flush();
    }

    fn finish(&self) {
        let _ = std::io::stderr().lock().write_all(b"\n");
    }
}

/// Ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressObserver for Silent {
    fn tick(&self) {}

    fn finish(&self) {}
}

/// Spacing of progress markers over `total` terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestones {
    step: usize,
}

impl Milestones {
    pub fn new(total: usize) -> Self {
        Milestones {
            step: total.div_ceil(MARKERS).max(1),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether claiming the `consumed`-th term lands on a marker
    pub fn reached(&self, consumed: usize) -> bool {
        consumed > 0 && consumed % self.step == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_more_than_markers() {
        for total in [1, 80, 81, 82, 343, 10_000, 1_677_721] {
            let m = Milestones::new(total);
            let hits = (1..=total).filter(|&c| m.reached(c)).count();
            assert!(hits <= MARKERS, "{} markers for {} terms", hits, total);
            assert!(hits >= 1);
        }
    }

    #[test]
    fn test_step_rounds_up() {
        assert_eq!(Milestones::new(343).step(), 5);
        assert_eq!(Milestones::new(81).step(), 1);
        assert_eq!(Milestones::new(0).step(), 1);
    }
}
