//! Parallel reduction of the series
//!
//! A fixed set of symmetric workers sums every term into one accumulator.
//!
//! ## Protocol
//!
//! - Term indices come from one shared counter, one index per claim.
//! - Each worker evaluates its terms into a private accumulator, so
//!   evaluation itself never contends.
//! - When the counter is exhausted the worker adds its private accumulator
//!   into the shared one in a single critical section.
//!
//! Addition modulo 2^(32N) is commutative, so neither the order in which
//! terms are claimed nor the order of the merges changes the result.
//!
//! All workers are scoped threads; the scope join is the barrier that the
//! decimal conversion waits behind.

use crate::accumulator::Accumulator;
use crate::progress::{Milestones, ProgressObserver};
use crate::term::evaluate;
use std::sync::Mutex;
use std::thread;
use tracing::{debug, trace};

/// Shared state of one reduction: term counter, shared sum and progress sink
pub struct ComputationContext<'a> {
    width: usize,
    total: usize,
    next_term: Mutex<usize>,
    sum: Mutex<Accumulator>,
    milestones: Milestones,
    progress: &'a dyn ProgressObserver,
}

impl<'a> ComputationContext<'a> {
    /// Prepare a reduction of `total` terms into `width` words
    pub fn new(width: usize, total: usize, progress: &'a dyn ProgressObserver) -> Self {
        ComputationContext {
            width,
            total,
            next_term: Mutex::new(0),
            sum: Mutex::new(Accumulator::zeroed(width)),
            milestones: Milestones::new(total),
            progress,
        }
    }

    /// Claim the next unevaluated term, or None once all are handed out
    pub fn claim(&self) -> Option<u32> {
        let consumed = {
            let mut next = self
                .next_term
                .lock()
                .expect("claim: term counter mutex poisoned");
            if *next >= self.total {
                return None;
            }
            *next += 1;
            *next
        };
        if self.milestones.reached(consumed) {
            self.progress.tick();
        }
        Some((consumed - 1) as u32)
    }

    /// Add a private partial sum into the shared accumulator
    ///
    /// The whole merge happens under one lock acquisition, so two workers'
    /// word writes never interleave.
    pub fn merge(&self, part: &Accumulator) {
        let mut sum = self
            .sum
            .lock()
            .expect("merge: accumulator mutex poisoned");
        sum.add_assign(part);
    }

    /// Body of one worker: claim and evaluate until exhausted, then merge
    pub fn run_worker(&self, worker: usize) {
        let mut part = Accumulator::zeroed(self.width);
        let mut evaluated = 0usize;
        while let Some(index) = self.claim() {
            trace!(worker, index, "evaluating term");
            evaluate(&mut part, index);
            evaluated += 1;
        }
        self.merge(&part);
        debug!(worker, evaluated, "merged partial sum");
    }

    /// Take the final sum out of the context
    pub fn into_sum(self) -> Accumulator {
        self.sum
            .into_inner()
            .expect("into_sum: accumulator mutex poisoned")
    }
}

/// Sum the first `terms` series terms into a `width`-word accumulator
/// using `workers` threads
pub fn reduce(
    width: usize,
    terms: usize,
    workers: usize,
    progress: &dyn ProgressObserver,
) -> Accumulator {
    let context = ComputationContext::new(width, terms, progress);
    let workers = workers.max(1);

    thread::scope(|scope| {
        for worker in 0..workers {
            let context = &context;
            scope.spawn(move || context.run_worker(worker));
        }
    });
    progress.finish();

    debug!(width, terms, workers, "reduction complete");
    context.into_sum()
}
