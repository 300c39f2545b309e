//! Execution strategies for the per-pixel and per-block query loops.
//!
//! Every query pass is a loop over independent work items (pixels, hash
//! entries, tiles). [`ExecutionStrategy`] runs such a loop either in order
//! on the calling thread or on rayon's pool:
//!
//! ```ignore
//! let strategy = ExecutionStrategy::Parallel;
//!
//! // Independent writes, one output element per item
//! strategy.for_each_mut(&mut pixels, |index, pixel| *pixel = shade(index));
//!
//! // Items that publish through shared atomics (arenas, counters)
//! strategy.for_each_index(entry_count, |entry_id| mesh_block(entry_id));
//! ```
//!
//! Results that are written per element are identical under both strategies.
//! Results published through a [`crate::arena::BoundedArena`] hold the same
//! items, but only the sequential strategy fixes their order.

use rayon::prelude::*;

/// How a query pass distributes its work items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionStrategy {
  /// In order, on the calling thread.
  Sequential,
  /// On rayon's global thread pool.
  #[default]
  Parallel,
}

impl ExecutionStrategy {
  /// Run `work` for every index in `0..count`.
  pub fn for_each_index<F>(self, count: usize, work: F)
  where
    F: Fn(usize) + Sync + Send,
  {
    match self {
      ExecutionStrategy::Sequential => (0..count).for_each(work),
      ExecutionStrategy::Parallel => (0..count).into_par_iter().for_each(work),
    }
  }

  /// Run `work` on every element of `items` with its index.
  pub fn for_each_mut<T, F>(self, items: &mut [T], work: F)
  where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
  {
    match self {
      ExecutionStrategy::Sequential => items
        .iter_mut()
        .enumerate()
        .for_each(|(index, item)| work(index, item)),
      ExecutionStrategy::Parallel => items
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, item)| work(index, item)),
    }
  }

  /// Number of workers this strategy uses.
  pub fn num_threads(self) -> usize {
    match self {
      ExecutionStrategy::Sequential => 1,
      ExecutionStrategy::Parallel => rayon::current_num_threads(),
    }
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use super::*;

  #[test]
  fn test_sequential_runs_in_order() {
    let seen = Mutex::new(Vec::new());
    ExecutionStrategy::Sequential.for_each_index(6, |i| seen.lock().unwrap().push(i));
    assert_eq!(seen.into_inner().unwrap(), vec![0, 1, 2, 3, 4, 5]);
  }

  #[test]
  fn test_parallel_visits_every_index_once() {
    let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
    ExecutionStrategy::Parallel.for_each_index(hits.len(), |i| {
      hits[i].fetch_add(1, Ordering::Relaxed);
    });
    assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
  }

  #[test]
  fn test_for_each_mut_matches_across_strategies() {
    let mut a = vec![0u64; 4096];
    let mut b = vec![0u64; 4096];
    let work = |i: usize, v: &mut u64| *v = (i as u64).wrapping_mul(2_654_435_761) >> 7;
    ExecutionStrategy::Sequential.for_each_mut(&mut a, work);
    ExecutionStrategy::Parallel.for_each_mut(&mut b, work);
    assert_eq!(a, b);
  }

  #[test]
  fn test_num_threads() {
    assert_eq!(ExecutionStrategy::Sequential.num_threads(), 1);
    assert!(ExecutionStrategy::Parallel.num_threads() >= 1);
    assert_eq!(ExecutionStrategy::default(), ExecutionStrategy::Parallel);
  }
}
