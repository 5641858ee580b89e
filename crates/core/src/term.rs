//! Term evaluator
//!
//! Each term of the base-2 series is a sum of seven lanes
//! `±2^p / d_j(i)` with affine divisors `d_j`. A term only touches the words
//! from its leading bit downward, so late terms are cheap.
//!
//! ## Digit extraction
//!
//! Instead of dividing an N-word number by `d_j`, each lane is long division
//! one word at a time:
//!
//! ```text
//!   leading word:   dividend = 2^(31-bit)            (or d<<32 - 2^(31-bit))
//!   next words:     dividend = remainder << 32
//!                   quotient -> word sum, dividend % d -> remainder
//! ```
//!
//! A negative lane borrows one unit of the leading word up front
//! (`-x/d = (d·2^32 - x)/d - 2^32`), so every quotient stays non-negative.
//!
//! ## Divisor range
//!
//! Divisors are `u32`. The largest one, `2560i + 2304`, fits only while
//! `i < MAX_TERMS`; callers validate the term count first (see
//! [`crate::config`]).

use crate::accumulator::{Accumulator, WORD_BITS};

/// Number of lanes per term
pub const LANES: usize = 7;

/// Bit offset of term 0's leading bit (counted from the top of word 0)
const FIRST_BIT: usize = 29;

/// Leading bit moves this many places per term
const BITS_PER_TERM: usize = 10;

/// One summand of the series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub index: u32,
}

impl Term {
    pub fn new(index: u32) -> Self {
        Term { index }
    }

    /// Leading bit position p(i) = 29 + 10i
    pub fn leading_bit(&self) -> usize {
        FIRST_BIT + BITS_PER_TERM * self.index as usize
    }

    /// Index of the first word this term touches
    pub fn leading_word(&self) -> usize {
        self.leading_bit() / WORD_BITS as usize
    }

    /// The leading word's single set bit
    fn leading_digit(&self) -> u32 {
        0x8000_0000u32 >> (self.leading_bit() % WORD_BITS as usize)
    }

    /// Lane divisors d_j(i)
    pub fn divisors(&self) -> [u32; LANES] {
        let i = self.index;
        [
            10 * i + 1,
            2560 * i + 2304,
            32 * i + 8,
            1024 * i + 768,
            40 * i + 12,
            640 * i + 320,
            640 * i + 448,
        ]
    }

    /// Whether lane `lane` subtracts for this term
    ///
    /// Even terms subtract in lanes 2-6, odd terms in lanes 0-1.
    pub fn is_negative(&self, lane: usize) -> bool {
        let odd = self.index & 1 == 1;
        odd == (lane < 2)
    }
}

/// Number of terms needed to fill an accumulator of `words` words
///
/// Terms past this point would start beyond the last word.
pub fn term_count(words: usize) -> usize {
    (WORD_BITS as usize * words + 11) / 10
}

/// Add term `index` into `acc` in place
///
/// Terms whose leading word lies past the end of the accumulator contribute
/// nothing.
pub fn evaluate(acc: &mut Accumulator, index: u32) {
    let term = Term::new(index);
    let first = term.leading_word();
    if first >= acc.len() {
        return;
    }

    let divisors = term.divisors();
    let digit = term.leading_digit() as u64;
    let mut remainders = [0u32; LANES];

    let mut sum = acc.words()[first] as i64;
    for (lane, (&divisor, remainder)) in divisors.iter().zip(&mut remainders).enumerate() {
        let divisor = divisor as u64;
        let dividend = if term.is_negative(lane) {
            sum -= 1i64 << WORD_BITS;
            (divisor << WORD_BITS) - digit
        } else {
            digit
        };
        let quotient = dividend / divisor;
        *remainder = (dividend - quotient * divisor) as u32;
        sum += quotient as i64;
    }
    acc.store(first, sum);

    for index in first + 1..acc.len() {
        let mut sum = acc.words()[index] as i64;
        for (&divisor, remainder) in divisors.iter().zip(&mut remainders) {
            let divisor = divisor as u64;
            let dividend = (*remainder as u64) << WORD_BITS;
            let quotient = dividend / divisor;
            *remainder = (dividend - quotient * divisor) as u32;
            sum += quotient as i64;
        }
        acc.store(index, sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_position() {
        let t = Term::new(0);
        assert_eq!(t.leading_bit(), 29);
        assert_eq!(t.leading_word(), 0);
        assert_eq!(t.leading_digit(), 0b100);

        let t = Term::new(3);
        assert_eq!(t.leading_bit(), 59);
        assert_eq!(t.leading_word(), 1);
        assert_eq!(t.leading_digit(), 0x8000_0000 >> 27);
    }

    #[test]
    fn test_sign_alternates_with_parity() {
        let even = Term::new(4);
        let odd = Term::new(5);
        for lane in 0..LANES {
            assert_eq!(even.is_negative(lane), lane >= 2);
            assert_eq!(odd.is_negative(lane), lane < 2);
        }
    }

    #[test]
    fn test_divisors_are_affine() {
        assert_eq!(Term::new(0).divisors(), [1, 2304, 8, 768, 12, 320, 448]);
        assert_eq!(
            Term::new(1).divisors(),
            [11, 4864, 40, 1792, 52, 960, 1088]
        );
    }

    #[test]
    fn test_term_count() {
        assert_eq!(term_count(2), 7);
        assert_eq!(term_count(107), 343);
    }

    #[test]
    fn test_term_past_end_is_skipped() {
        let mut acc = Accumulator::zeroed(2);
        // Term 4 starts at bit 69, word 2
        evaluate(&mut acc, 4);
        assert_eq!(acc.words(), &[0, 0]);
    }

    #[test]
    fn test_first_term_integer_part() {
        // Term 0 alone is already about 3.1417
        let mut acc = Accumulator::zeroed(3);
        evaluate(&mut acc, 0);
        assert_eq!(acc.integer_part(), 3);
        // 0.1417... of 2^32 sits between 0.14 and 0.15
        let frac = acc.words()[1] as f64 / 4_294_967_296.0;
        assert!(frac > 0.14 && frac < 0.15, "fraction was {}", frac);
    }

    #[test]
    fn test_partial_sums_approach_pi() {
        let words = 4;
        let mut acc = Accumulator::zeroed(words);
        for i in 0..term_count(words) as u32 {
            evaluate(&mut acc, i);
        }
        assert_eq!(acc.integer_part(), 3);
        // First fraction word of pi: 0x243F6A88
        assert_eq!(acc.words()[1], 0x243F_6A88);
        assert_eq!(acc.words()[2], 0x85A3_08D3);
    }

    #[test]
    fn test_negative_term_borrows_through_word_zero() {
        // An odd term alone in an empty buffer is net negative at its lead
        // position; the borrow must wrap through word 0 without panicking.
        let mut acc = Accumulator::zeroed(3);
        evaluate(&mut acc, 1);
        assert_eq!(acc.integer_part(), u32::MAX);

        // Adding the same magnitude back restores zero modulo 2^(32N)
        let mut negated = Accumulator::zeroed(3);
        for (dst, &src) in negated.words_mut().iter_mut().zip(acc.words()) {
            *dst = !src;
        }
        negated.add_assign(&Accumulator::from_words(vec![0, 0, 1]));
        acc.add_assign(&negated);
        assert_eq!(acc.words(), &[0, 0, 0]);
    }
}
