//! Fixed-capacity output buffer with atomic slot claims.
//!
//! Workers claim slots with a single `fetch_add` on a shared cursor and
//! write into the claimed slot without further synchronisation. Claims past
//! the capacity are dropped and counted; the cursor keeps counting so the
//! overflow can be reported.
//!
//! ```text
//!  cursor ──► fetch_add(n) ──► start
//!                                │
//!            start + n <= cap ───┼──► write slots[start..start+n]
//!            otherwise ──────────┴──► dropped += n
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Bounded, append-only output shared by parallel workers.
pub struct BoundedArena<T> {
  slots: Box<[OnceLock<T>]>,
  cursor: AtomicUsize,
  written: AtomicUsize,
  dropped: AtomicUsize,
}

impl<T> BoundedArena<T> {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      slots: (0..capacity).map(|_| OnceLock::new()).collect(),
      cursor: AtomicUsize::new(0),
      written: AtomicUsize::new(0),
      dropped: AtomicUsize::new(0),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  /// Number of stored items.
  #[inline]
  pub fn len(&self) -> usize {
    self.written.load(Ordering::Acquire)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Total slots requested, including dropped claims.
  #[inline]
  pub fn claimed(&self) -> usize {
    self.cursor.load(Ordering::Relaxed)
  }

  /// Items rejected because the arena was full.
  #[inline]
  pub fn dropped(&self) -> usize {
    self.dropped.load(Ordering::Relaxed)
  }

  /// Claim one slot and store `item`. Returns the slot index, or `None` when
  /// the arena is full.
  #[inline]
  pub fn push(&self, item: T) -> Option<usize> {
    let index = self.cursor.fetch_add(1, Ordering::Relaxed);
    if index >= self.slots.len() {
      self.dropped.fetch_add(1, Ordering::Relaxed);
      return None;
    }
    // A claimed index is unique, so the slot is always empty here.
    let _ = self.slots[index].set(item);
    self.written.fetch_add(1, Ordering::Release);
    Some(index)
  }

  /// Claim `items.len()` consecutive slots at once. Either every item is
  /// stored or none is.
  pub fn push_all<I>(&self, items: I) -> Option<usize>
  where
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
  {
    let items = items.into_iter();
    let count = items.len();
    if count == 0 {
      return Some(self.cursor.load(Ordering::Relaxed));
    }
    let start = self.cursor.fetch_add(count, Ordering::Relaxed);
    if start + count > self.slots.len() {
      self.dropped.fetch_add(count, Ordering::Relaxed);
      return None;
    }
    for (slot, item) in self.slots[start..start + count].iter().zip(items) {
      let _ = slot.set(item);
    }
    self.written.fetch_add(count, Ordering::Release);
    Some(start)
  }

  /// Item in slot `index`, if written.
  #[inline]
  pub fn get(&self, index: usize) -> Option<&T> {
    self.slots.get(index).and_then(OnceLock::get)
  }

  /// Stored items in slot order.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    let end = self.claimed().min(self.slots.len());
    self.slots[..end].iter().filter_map(OnceLock::get)
  }

  /// Empty the arena, keeping its capacity.
  pub fn reset(&mut self) {
    for slot in self.slots.iter_mut() {
      slot.take();
    }
    *self.cursor.get_mut() = 0;
    *self.written.get_mut() = 0;
    *self.dropped.get_mut() = 0;
  }

  /// Stored items in slot order.
  pub fn into_vec(self) -> Vec<T> {
    self
      .slots
      .into_vec()
      .into_iter()
      .filter_map(OnceLock::into_inner)
      .collect()
  }
}

impl<T: Clone> BoundedArena<T> {
  pub fn to_vec(&self) -> Vec<T> {
    self.iter().cloned().collect()
  }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
