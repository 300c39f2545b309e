//! Single-slot block lookup memo.

use glam::IVec3;

use super::{BlockAddress, FieldStore};

/// Remembers the last block resolved during one traversal.
///
/// Consecutive samples of a ray, or the 8 corners of a cell, mostly land
/// in the same block; the cache turns those into a coordinate compare.
/// Misses are not cached. A cache lives for one ray or one cell and is
/// never shared.
#[derive(Clone, Copy, Debug)]
pub struct LocalityCache {
  block: IVec3,
  address: Option<BlockAddress>,
}

impl Default for LocalityCache {
  fn default() -> Self {
    Self {
      block: IVec3::splat(i32::MAX),
      address: None,
    }
  }
}

impl LocalityCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cached address of `block`, without touching the store.
  #[inline]
  pub fn get(&self, block: IVec3) -> Option<BlockAddress> {
    if self.block == block {
      self.address
    } else {
      None
    }
  }

  /// Resolve `block`, consulting the store only when the memo misses.
  #[inline]
  pub fn resolve<S: FieldStore + ?Sized>(&mut self, store: &S, block: IVec3) -> Option<BlockAddress> {
    if let Some(address) = self.get(block) {
      return Some(address);
    }

    let address = store.lookup_block(block)?;
    self.block = block;
    self.address = Some(address);
    Some(address)
  }

  /// Forget the memo.
  pub fn clear(&mut self) {
    *self = Self::default();
  }
}
