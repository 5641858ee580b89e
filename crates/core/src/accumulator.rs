//! Big fixed-point accumulator
//!
//! A binary fraction stored as 32-bit words, most significant first:
//!
//! ```text
//!   word[0]      word[1]        word[2]        ...  word[N-1]
//!   integer  .   2^-32 weight   2^-64 weight        2^-32(N-1) weight
//! ```
//!
//! The integer word is kept modulo 2^32, so the whole buffer is a number
//! modulo 2^(32N). A carry or borrow that would leave word 0 is dropped.
//! That is what lets a worker's private buffer go "negative" while it only
//! holds part of the series: once every private buffer is merged the true sum
//! is back in range.
//!
//! Every mutating operation leaves carries fully propagated; no word is ever
//! left holding an outstanding carry.

/// Number of bits in one accumulator word
pub const WORD_BITS: u32 = 32;

/// Fixed-width binary fraction with an integer word in front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    words: Vec<u32>,
}

impl Accumulator {
    /// Create an accumulator of `len` words, all zero
    pub fn zeroed(len: usize) -> Self {
        Accumulator {
            words: vec![0; len],
        }
    }

    /// Wrap existing words (most significant first)
    pub fn from_words(words: Vec<u32>) -> Self {
        Accumulator { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// The integer part (word 0), or 0 for an empty accumulator
    pub fn integer_part(&self) -> u32 {
        self.words.first().copied().unwrap_or(0)
    }

    /// Store a signed word sum at `index` and ripple its overflow backward
    ///
    /// The low 32 bits of `sum` become the word; the signed high part is
    /// added into the more significant words until nothing is left.
    pub fn store(&mut self, index: usize, sum: i64) {
        self.words[index] = sum as u32;
        self.ripple(index, sum >> WORD_BITS);
    }

    /// Add a signed `carry` into the words before `index`
    ///
    /// Walks toward word 0 and stops as soon as the carry is absorbed.
    /// Never indexes below 0; a carry still pending after word 0 is dropped.
    pub fn ripple(&mut self, index: usize, carry: i64) {
        let mut carry = carry;
        let mut loc = index;
        while carry != 0 && loc > 0 {
            loc -= 1;
            let sum = self.words[loc] as i64 + carry;
            self.words[loc] = sum as u32;
            carry = sum >> WORD_BITS;
        }
    }

    /// Add `other` into `self` word by word with full-width carry
    ///
    /// # Panics
    /// Panics if the two accumulators differ in length.
    pub fn add_assign(&mut self, other: &Accumulator) {
        assert_eq!(
            self.words.len(),
            other.words.len(),
            "add_assign: accumulator widths differ"
        );
        let mut carry = 0u64;
        for (dst, &src) in self.words.iter_mut().zip(&other.words).rev() {
            let sum = *dst as u64 + src as u64 + carry;
            *dst = sum as u32;
            carry = sum >> WORD_BITS;
        }
    }

    pub fn into_words(self) -> Vec<u32> {
        self.words
    }
}

/// Multiply a run of words by `factor`, feeding `carry_in` into the lowest word
///
/// Works from the last (least significant) word to the first and returns the
/// carry that spills out of the first word. With a fractional input the
/// result is always below `factor`.
pub fn scale_segment(words: &mut [u32], factor: u32, carry_in: u32) -> u32 {
    let mut carry = carry_in as u64;
    for word in words.iter_mut().rev() {
        let product = factor as u64 * *word as u64 + carry;
        *word = product as u32;
        carry = product >> WORD_BITS;
    }
    carry as u32
}
