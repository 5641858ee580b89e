//! Decimal conversion pipeline
//!
//! Turns the finished binary accumulator into decimal text, nine digits per
//! pass: multiplying the fraction by 10^9 pushes the next nine digits out of
//! the top word as an integer.
//!
//! ## Segments
//!
//! The fraction words `1..N` are cut into one contiguous segment per worker.
//! Segment 0 is the most significant and owns word 1.
//!
//! ```text
//!   word:   1 ........ a | a+1 ........ b | b+1 ....... N-1
//!           segment 0    | segment 1      | segment 2
//!   carry:      <--------------- <-------------- 0
//!   chunk: <--
//! ```
//!
//! In every pass each segment multiplies its words by 10^9, least
//! significant word first, starting from the carry its less significant
//! neighbour produced in the same pass. Its own leftover carry goes to its
//! more significant neighbour. What falls out of segment 0 is the chunk.
//!
//! ## Hand-off
//!
//! Each edge of the chain is its own bounded channel. A segment blocks when
//! its downstream channel is full and when its upstream channel is empty, so
//! no segment can run more than `capacity` passes ahead of its consumer. The
//! chain only points one way (and the writer at its end always drains), so
//! there is no cycle to wait on.

use crate::accumulator::{Accumulator, scale_segment};
use crate::error::PiError;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::Write;
use std::thread;
use tracing::debug;

/// Decimal digits produced per pass
pub const CHUNK_DIGITS: usize = 9;

/// 10^CHUNK_DIGITS, the largest power of ten below 2^32
pub const CHUNK_SCALE: u32 = 1_000_000_000;

/// A run of fraction words owned by one pipeline worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Index of the segment's most significant word
    pub first: usize,
    /// Number of words
    pub len: usize,
}

impl Segment {
    /// One past the segment's least significant word
    pub fn end(&self) -> usize {
        self.first + self.len
    }
}

/// Partition fraction words `1..words` into `workers` contiguous segments
///
/// The worker count is clamped so that every segment has at least one word.
///
/// # Panics
/// Panics if there is no fraction word (`words < 2`).
pub fn plan_segments(words: usize, workers: usize) -> Vec<Segment> {
    assert!(words >= 2, "plan_segments: accumulator has no fraction words");
    let fraction = words - 1;
    let workers = workers.clamp(1, fraction);
    (0..workers)
        .map(|k| {
            let start = k * fraction / workers;
            let end = (k + 1) * fraction / workers;
            Segment {
                first: 1 + start,
                len: end - start,
            }
        })
        .collect()
}

/// Number of passes needed for `digits` digits
pub fn pass_count(digits: usize) -> usize {
    digits.div_ceil(CHUNK_DIGITS)
}

/// Write the first `keep` digits of a zero-padded chunk
fn write_chunk<W: Write>(out: &mut W, chunk: u32, keep: usize) -> std::io::Result<()> {
    if keep >= CHUNK_DIGITS {
        write!(out, "{:09}", chunk)
    } else {
        let padded = format!("{:09}", chunk);
        out.write_all(&padded.as_bytes()[..keep])
    }
}

/// One pipeline stage: `passes` multiply-and-carry rounds over `words`
///
/// Stops early, without error, if a neighbour has gone away.
fn run_stage(
    segment: usize,
    words: &mut [u32],
    upstream: Option<Receiver<u32>>,
    downstream: Sender<u32>,
    passes: usize,
) {
    for pass in 0..passes {
        let carry_in = match &upstream {
            Some(rx) => match rx.recv() {
                Ok(carry) => carry,
                Err(_) => {
                    debug!(segment, pass, "upstream segment stopped");
                    return;
                }
            },
            None => 0,
        };
        let overflow = scale_segment(words, CHUNK_SCALE, carry_in);
        if downstream.send(overflow).is_err() {
            debug!(segment, pass, "downstream consumer stopped");
            return;
        }
    }
}

/// Destructively convert `acc` to decimal and write `I.DDDD...\n` to `out`
///
/// Exactly `digits` digits follow the point. One scoped thread runs each
/// segment; the calling thread writes the chunks in pass order.
pub fn convert<W: Write>(
    mut acc: Accumulator,
    digits: usize,
    workers: usize,
    capacity: usize,
    out: &mut W,
) -> Result<(), PiError> {
    let segments = plan_segments(acc.len(), workers);
    let passes = pass_count(digits);
    let capacity = capacity.max(1);
    debug!(?segments, passes, capacity, "starting decimal conversion");

    write!(out, "{}.", acc.integer_part())?;

    let mut slices: Vec<&mut [u32]> = Vec::with_capacity(segments.len());
    let mut rest = &mut acc.words_mut()[1..];
    for segment in &segments {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(segment.len);
        slices.push(head);
        rest = tail;
    }

    thread::scope(|scope| -> Result<(), PiError> {
        let (chunk_tx, chunk_rx) = bounded::<u32>(capacity);

        // Spawn from least to most significant so each stage can hand its
        // receiver to the next one up the chain.
        let mut upstream: Option<Receiver<u32>> = None;
        for (index, words) in slices.into_iter().enumerate().rev() {
            let inbound = upstream.take();
            let downstream = if index == 0 {
                chunk_tx.clone()
            } else {
                let (tx, rx) = bounded::<u32>(capacity);
                upstream = Some(rx);
                tx
            };
            scope.spawn(move || run_stage(index, words, inbound, downstream, passes));
        }
        drop(chunk_tx);

        let mut remaining = digits;
        for chunk in chunk_rx.iter() {
            let keep = remaining.min(CHUNK_DIGITS);
            write_chunk(out, chunk, keep)?;
            remaining -= keep;
        }
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    })
}

/// Convert into a `String` (for tests and small precisions)
pub fn convert_to_string(
    acc: Accumulator,
    digits: usize,
    workers: usize,
    capacity: usize,
) -> Result<String, PiError> {
    let mut buf = Vec::new();
    convert(acc, digits, workers, capacity, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Silent;
    use crate::reduce::reduce;
    use crate::term::term_count;

    fn pi_words(words: usize) -> Accumulator {
        reduce(words, term_count(words), 1, &Silent)
    }

    #[test]
    fn test_segments_partition_fraction_words() {
        for words in [2, 3, 13, 107] {
            for workers in 1..words {
                let segments = plan_segments(words, workers);
                assert_eq!(segments.len(), workers);
                assert_eq!(segments[0].first, 1);
                assert_eq!(segments.last().unwrap().end(), words);
                for pair in segments.windows(2) {
                    assert_eq!(pair[0].end(), pair[1].first);
                }
                assert!(segments.iter().all(|s| s.len >= 1));
            }
        }
    }

    #[test]
    fn test_segments_clamp_workers() {
        assert_eq!(plan_segments(3, 10).len(), 2);
        assert_eq!(plan_segments(3, 0).len(), 1);
    }

    #[test]
    #[should_panic(expected = "no fraction words")]
    fn test_segments_need_a_fraction_word() {
        plan_segments(1, 1);
    }

    #[test]
    fn test_pass_count() {
        assert_eq!(pass_count(1), 1);
        assert_eq!(pass_count(9), 1);
        assert_eq!(pass_count(10), 2);
        assert_eq!(pass_count(1000), 112);
    }

    #[test]
    fn test_half() {
        let acc = Accumulator::from_words(vec![0, 0x8000_0000]);
        assert_eq!(convert_to_string(acc, 3, 1, 1).unwrap(), "0.500\n");
    }

    #[test]
    fn test_leading_zeros_inside_chunk_kept() {
        // 2^-32 = 0.00000000023283064365...
        let acc = Accumulator::from_words(vec![7, 1, 0]);
        assert_eq!(
            convert_to_string(acc, 12, 2, 1).unwrap(),
            "7.000000000232\n"
        );
    }

    #[test]
    fn test_partial_last_chunk() {
        let acc = pi_words(5);
        assert_eq!(convert_to_string(acc, 10, 1, 4).unwrap(), "3.1415926535\n");
    }

    #[test]
    fn test_every_worker_count_matches_single_segment() {
        let words = 13;
        let digits = 100;
        let expected = convert_to_string(pi_words(words), digits, 1, 16).unwrap();
        assert_eq!(expected.len(), digits + 3);
        for workers in 2..words {
            for capacity in [1, 2, 16] {
                let got = convert_to_string(pi_words(words), digits, workers, capacity).unwrap();
                assert_eq!(got, expected, "{} workers, capacity {}", workers, capacity);
            }
        }
    }

    #[test]
    fn test_wide_accumulator_split_many_ways() {
        let words = 107;
        let acc = pi_words(words);
        let expected = convert_to_string(acc.clone(), 1000, 1, 16).unwrap();
        for workers in [2, 7, 53, 106] {
            let got = convert_to_string(acc.clone(), 1000, workers, 1).unwrap();
            assert_eq!(got, expected, "{} workers", workers);
        }
    }

    struct FailAfter {
        budget: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.budget < buf.len() {
                return Err(std::io::Error::other("disk full"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_failure_stops_pipeline() {
        let acc = pi_words(107);
        let mut out = FailAfter { budget: 40 };
        let result = convert(acc, 1000, 8, 1, &mut out);
        assert!(matches!(result, Err(PiError::Io(_))));
    }
}
