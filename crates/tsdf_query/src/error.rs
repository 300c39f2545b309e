//! Errors raised while building a scene.
//!
//! Query passes never fail; they report "no result" through found flags and
//! sentinel values. Only the reference store and parameter validation return
//! these.

use glam::IVec3;
use thiserror::Error;

/// Scene construction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
  /// Both the ordered bucket and the excess list are full.
  #[error("hash table full: no free entry for block {0}")]
  HashFull(IVec3),

  /// The voxel block pool has no free block left.
  #[error("voxel block pool exhausted ({capacity} blocks)")]
  PoolExhausted {
    /// Pool size in blocks
    capacity: usize,
  },

  /// Configuration value out of range.
  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}
