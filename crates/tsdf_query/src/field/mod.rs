//! Field store contract and the shared read glue.
//!
//! The query engines never see a concrete storage layout. They read the
//! field through [`FieldStore`], a small capability set: a block lookup, a
//! voxel fetch by block address, an entry enumeration and two capability
//! flags. On top of that this module builds the reads every query needs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ point (voxel units, float)                                              │
//! │      │                                                                  │
//! │      ├── round ─────────► read_sdf_uninterpolated   (ray search)        │
//! │      ├── floor + frac ──► read_sdf_interpolated     (trust band, refine)│
//! │      ├── floor + frac ──► read_color_interpolated   (colour mode)       │
//! │      └── round ─────────► read_marker               (marker mode)       │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                 read_voxel ──► LocalityCache ──► lookup_block           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All reads are pure functions of the store and the point; the cache only
//! saves hash lookups and never changes a result.

mod access;
mod cache;

pub use access::{
  field_gradient_normal, read_color_interpolated, read_marker, read_sdf_interpolated,
  read_sdf_uninterpolated, read_voxel,
};
pub use cache::LocalityCache;

use glam::IVec3;

use crate::types::Voxel;

/// Storage address of an allocated voxel block (index into the block pool).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockAddress(pub u32);

/// Read-only view of a sparse voxel-block TSDF.
///
/// Implementors must not be mutated while a query pass is running; the
/// caller serialises writes against reads.
pub trait FieldStore: Sync {
  /// Whether voxels carry a meaningful colour.
  fn has_color(&self) -> bool {
    false
  }

  /// Whether voxels carry a meaningful marker flag.
  fn has_marker(&self) -> bool {
    false
  }

  /// Resolve a block coordinate to its storage address.
  fn lookup_block(&self, block: IVec3) -> Option<BlockAddress>;

  /// Fetch a voxel of an allocated block. `local_index` is in `0..512`.
  fn voxel(&self, address: BlockAddress, local_index: usize) -> Voxel;

  /// Number of hash entries to enumerate with [`FieldStore::allocated_block`].
  fn entry_count(&self) -> usize;

  /// Block coordinate of entry `entry_id` if that entry is allocated.
  fn allocated_block(&self, entry_id: usize) -> Option<IVec3>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
