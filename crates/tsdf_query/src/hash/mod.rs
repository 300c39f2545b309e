//! Reference voxel-block hash.
//!
//! A fixed array of ordered buckets followed by a shared excess list.
//! Colliding blocks chain from their bucket into the excess list:
//!
//! ```text
//! entries: [ bucket 0 | bucket 1 | ... | bucket N-1 | excess 0 | excess 1 | ... ]
//!                         │                              ▲          ▲
//!                         └── next ──────────────────────┘          │
//!                                                  └── next ────────┘
//! ```
//!
//! Blocks are never freed. Allocating a block appends 512 default voxels
//! (empty space) to the pool.

mod config;

pub use config::HashConfig;

use glam::IVec3;

use crate::constants::{voxel_local_index, voxel_to_block, SDF_BLOCK_SIZE3};
use crate::error::StoreError;
use crate::field::{BlockAddress, FieldStore};
use crate::types::Voxel;

/// Spatial hash of a block coordinate, masked to the bucket range.
#[inline]
pub fn hash_index(block: IVec3, mask: u32) -> usize {
  let h = (block.x as u32).wrapping_mul(73_856_093)
    ^ (block.y as u32).wrapping_mul(19_349_669)
    ^ (block.z as u32).wrapping_mul(83_492_791);
  (h & mask) as usize
}

/// One hash slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HashEntry {
  /// Block coordinate stored in this slot.
  pub pos: IVec3,
  /// Excess-list index of the next entry in the chain.
  pub next: Option<u32>,
  /// Pool address; `None` while the slot is unused.
  pub address: Option<BlockAddress>,
}

impl HashEntry {
  #[inline]
  pub fn is_allocated(&self) -> bool {
    self.address.is_some()
  }
}

/// Sparse TSDF: hash entries plus a growable pool of 8³ voxel blocks.
pub struct VoxelBlockHash {
  config: HashConfig,
  entries: Vec<HashEntry>,
  excess_used: usize,
  voxels: Vec<Voxel>,
}

impl VoxelBlockHash {
  pub fn new(config: HashConfig) -> Result<Self, StoreError> {
    config.validate()?;
    let entries = vec![HashEntry::default(); config.bucket_count + config.excess_list_size];
    Ok(Self {
      config,
      entries,
      excess_used: 0,
      voxels: Vec::new(),
    })
  }

  pub fn config(&self) -> &HashConfig {
    &self.config
  }

  /// Number of allocated voxel blocks.
  pub fn allocated_count(&self) -> usize {
    self.voxels.len() / SDF_BLOCK_SIZE3
  }

  /// Number of excess-list entries in use.
  pub fn excess_used(&self) -> usize {
    self.excess_used
  }

  /// Walk the chain of `block`'s bucket. Returns the matching entry index, or
  /// the index of the chain tail when the block is absent.
  fn find(&self, block: IVec3) -> Result<usize, usize> {
    let mut index = hash_index(block, self.config.hash_mask());
    loop {
      let entry = &self.entries[index];
      if entry.is_allocated() && entry.pos == block {
        return Ok(index);
      }
      match entry.next {
        Some(next) => index = self.config.bucket_count + next as usize,
        None => return Err(index),
      }
    }
  }

  fn claim_block(&mut self) -> Result<BlockAddress, StoreError> {
    let count = self.allocated_count();
    if count >= self.config.block_pool_size {
      return Err(StoreError::PoolExhausted {
        capacity: self.config.block_pool_size,
      });
    }
    self
      .voxels
      .resize(self.voxels.len() + SDF_BLOCK_SIZE3, Voxel::default());
    Ok(BlockAddress(count as u32))
  }

  /// Allocate `block` if it is not present yet. Idempotent.
  pub fn allocate_block(&mut self, block: IVec3) -> Result<BlockAddress, StoreError> {
    let tail = match self.find(block) {
      Ok(index) => {
        if let Some(address) = self.entries[index].address {
          return Ok(address);
        }
        index
      }
      Err(tail) => tail,
    };

    let slot = if !self.entries[tail].is_allocated() {
      tail
    } else {
      if self.excess_used >= self.config.excess_list_size {
        return Err(StoreError::HashFull(block));
      }
      self.config.bucket_count + self.excess_used
    };

    let address = self.claim_block()?;
    if slot != tail {
      self.entries[tail].next = Some(self.excess_used as u32);
      self.excess_used += 1;
    }
    let entry = &mut self.entries[slot];
    entry.pos = block;
    entry.address = Some(address);
    Ok(address)
  }

  /// Mutable voxels of an allocated block.
  pub fn block_voxels_mut(&mut self, address: BlockAddress) -> &mut [Voxel] {
    let start = address.0 as usize * SDF_BLOCK_SIZE3;
    &mut self.voxels[start..start + SDF_BLOCK_SIZE3]
  }

  /// Store a voxel, allocating its block on demand.
  pub fn write_voxel(&mut self, voxel: IVec3, value: Voxel) -> Result<(), StoreError> {
    let address = self.allocate_block(voxel_to_block(voxel))?;
    self.block_voxels_mut(address)[voxel_local_index(voxel)] = value;
    Ok(())
  }

  /// Raw hash entry, for inspection.
  pub fn entry(&self, entry_id: usize) -> Option<&HashEntry> {
    self.entries.get(entry_id)
  }
}

impl FieldStore for VoxelBlockHash {
  fn has_color(&self) -> bool {
    self.config.has_color
  }

  fn has_marker(&self) -> bool {
    self.config.has_marker
  }

  #[inline]
  fn lookup_block(&self, block: IVec3) -> Option<BlockAddress> {
    self
      .find(block)
      .ok()
      .and_then(|index| self.entries[index].address)
  }

  #[inline]
  fn voxel(&self, address: BlockAddress, local_index: usize) -> Voxel {
    self.voxels[address.0 as usize * SDF_BLOCK_SIZE3 + local_index]
  }

  fn entry_count(&self) -> usize {
    self.entries.len()
  }

  fn allocated_block(&self, entry_id: usize) -> Option<IVec3> {
    self
      .entries
      .get(entry_id)
      .filter(|entry| entry.is_allocated())
      .map(|entry| entry.pos)
  }
}
