//! Pi Core: parallel digit-extraction computation of π
//!
//! The computation runs in two phases on the same number of workers:
//!
//! 1. **Reduction** - every term of a base-2 series is evaluated into a
//!    fixed-point binary accumulator with chained word-sized divisions, in
//!    parallel, and the partial sums are merged.
//! 2. **Conversion** - the accumulator is split into segments and turned
//!    into decimal by a pipeline of multiply-by-10^9 passes, with carries
//!    flowing from the least to the most significant segment.
//!
//! # Modules
//!
//! - `accumulator`: fixed-point word buffer with carry propagation
//! - `term`: series term evaluator
//! - `reduce`: parallel reduction driver
//! - `pipeline`: segmented decimal conversion
//! - `config`: precision validation and sizing
//! - `progress`: progress observers
//! - `error`: error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use pi_core::{PiConfig, Silent, compute};
//!
//! let plan = PiConfig::new(50).plan()?;
//! let mut out = Vec::new();
//! compute(&plan, &Silent, &mut out)?;
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod reduce;
pub mod term;

pub use accumulator::Accumulator;
pub use config::{MAX_DIGITS, MAX_TERMS, PiConfig, Plan};
pub use error::PiError;
pub use pipeline::{Segment, convert, plan_segments};
pub use progress::{Dots, ProgressObserver, Silent};
pub use reduce::{ComputationContext, reduce};
pub use term::{Term, evaluate, term_count};

use std::io::Write;
use tracing::info;

/// What a finished computation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub digits: usize,
    pub words: usize,
    pub terms: usize,
    pub workers: usize,
}

/// Compute π according to `plan` and write `3.` plus the digits to `out`
pub fn compute<W: Write>(
    plan: &Plan,
    progress: &dyn ProgressObserver,
    out: &mut W,
) -> Result<Summary, PiError> {
    info!(
        digits = plan.digits,
        words = plan.words,
        terms = plan.terms,
        workers = plan.workers,
        "computing pi"
    );

    let sum = reduce(plan.words, plan.terms, plan.workers, progress);
    convert(sum, plan.digits, plan.workers, plan.queue_capacity, out)?;

    Ok(Summary {
        digits: plan.digits,
        words: plan.words,
        terms: plan.terms,
        workers: plan.workers,
    })
}

/// π to `digits` places as a string, newline included
pub fn pi_string(digits: usize) -> Result<String, PiError> {
    let plan = PiConfig::new(digits).plan()?;
    let mut buf = Vec::new();
    compute(&plan, &Silent, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
