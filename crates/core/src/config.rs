//! Precision configuration and sizing
//!
//! A [`PiConfig`] is what the caller asks for; [`PiConfig::plan`] validates
//! it and derives everything the computation needs up front, so that no
//! failure can happen once work has started.
//!
//! # Example
//!
//! ```rust,ignore
//! use pi_core::PiConfig;
//!
//! let plan = PiConfig::from_thousands(10)?
//!     .with_threads(4)
//!     .plan()?;
//! assert_eq!(plan.digits, 10_000);
//! ```

use crate::error::PiError;
use crate::term::term_count;
use tracing::debug;

/// Largest supported digit count
pub const MAX_DIGITS: usize = 10_000_000;

/// Largest supported term count
///
/// Term indices stay below this, which keeps `2560i + 2304` inside `u32`.
pub const MAX_TERMS: usize = 1_677_721;

/// Default capacity of each pipeline hand-off channel
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Words kept past the requested precision to absorb truncation error
const GUARD_WORDS: usize = 2;

/// Words needed for `digits` decimal digits, integer word included
///
/// 104/1000 is slightly above 1/log10(2^32).
pub fn word_count(digits: usize) -> usize {
    digits * 104 / 1000 + 1 + GUARD_WORDS
}

/// Requested computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiConfig {
    /// Decimal digits after the point
    pub digits: usize,
    /// Worker count override (None = hardware parallelism)
    pub threads: Option<usize>,
    /// Capacity of each pipeline hand-off channel
    pub queue_capacity: usize,
}

impl PiConfig {
    pub fn new(digits: usize) -> Self {
        PiConfig {
            digits,
            threads: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Configure from a count of thousands of digits, as given on the command line
    pub fn from_thousands(thousands: i64) -> Result<Self, PiError> {
        let digits = thousands
            .checked_mul(1000)
            .ok_or(PiError::OutOfRange { digits: i64::MAX })?;
        if digits < 1 || digits as u64 > MAX_DIGITS as u64 {
            return Err(PiError::OutOfRange { digits });
        }
        Ok(PiConfig::new(digits as usize))
    }

    /// Parse a command-line precision argument (thousands of digits)
    pub fn parse_thousands(arg: &str) -> Result<Self, PiError> {
        let thousands: i64 = arg
            .trim()
            .parse()
            .map_err(|_| PiError::InvalidNumber(arg.to_string()))?;
        Self::from_thousands(thousands)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Validate the request and derive the sizing
    pub fn plan(&self) -> Result<Plan, PiError> {
        if self.digits < 1 || self.digits > MAX_DIGITS {
            return Err(PiError::OutOfRange {
                digits: self.digits as i64,
            });
        }

        let words = word_count(self.digits);
        let terms = term_count(words);
        if terms > MAX_TERMS {
            return Err(PiError::PrecisionTooLarge { terms });
        }

        let requested = self.threads.unwrap_or_else(hardware_threads);
        // Every pipeline segment needs at least one fraction word
        let workers = requested.clamp(1, words - 1);

        let plan = Plan {
            digits: self.digits,
            words,
            terms,
            workers,
            queue_capacity: self.queue_capacity.max(1),
        };
        debug!(?plan, requested_threads = requested, "planned computation");
        Ok(plan)
    }
}

/// Validated sizing for one computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Decimal digits after the point
    pub digits: usize,
    /// Accumulator width in words, integer word included
    pub words: usize,
    /// Number of series terms
    pub terms: usize,
    /// Workers in both phases
    pub workers: usize,
    /// Capacity of each pipeline hand-off channel
    pub queue_capacity: usize,
}

impl Plan {
    /// Same plan with a different worker count, still clamped to the width
    pub fn with_workers(self, workers: usize) -> Self {
        Plan {
            workers: workers.clamp(1, self.words - 1),
            ..self
        }
    }
}

fn hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
