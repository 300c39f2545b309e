//! HashConfig - sizing and capabilities of the reference voxel-block hash.

use crate::constants::{DEFAULT_BUCKET_NUM, DEFAULT_EXCESS_LIST_SIZE, DEFAULT_LOCAL_BLOCK_NUM};
use crate::error::StoreError;

/// Sizing and capability flags for [`super::VoxelBlockHash`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashConfig {
  /// Ordered bucket count. Must be a power of two.
  pub bucket_count: usize,

  /// Overflow entries shared by all buckets.
  pub excess_list_size: usize,

  /// Maximum number of allocated voxel blocks.
  pub block_pool_size: usize,

  /// Voxels carry colour.
  pub has_color: bool,

  /// Voxels carry a marker flag.
  pub has_marker: bool,
}

impl Default for HashConfig {
  fn default() -> Self {
    Self {
      bucket_count: DEFAULT_BUCKET_NUM,
      excess_list_size: DEFAULT_EXCESS_LIST_SIZE,
      block_pool_size: DEFAULT_LOCAL_BLOCK_NUM,
      has_color: false,
      has_marker: false,
    }
  }
}

impl HashConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_bucket_count(mut self, count: usize) -> Self {
    self.bucket_count = count;
    self
  }

  pub fn with_excess_list_size(mut self, size: usize) -> Self {
    self.excess_list_size = size;
    self
  }

  pub fn with_block_pool_size(mut self, size: usize) -> Self {
    self.block_pool_size = size;
    self
  }

  pub fn with_color(mut self, enabled: bool) -> Self {
    self.has_color = enabled;
    self
  }

  pub fn with_marker(mut self, enabled: bool) -> Self {
    self.has_marker = enabled;
    self
  }

  /// Mask applied to the spatial hash.
  #[inline]
  pub fn hash_mask(&self) -> u32 {
    (self.bucket_count - 1) as u32
  }

  pub fn validate(&self) -> Result<(), StoreError> {
    if !self.bucket_count.is_power_of_two() {
      return Err(StoreError::InvalidConfig(
        "bucket_count must be a power of two",
      ));
    }
    if self.bucket_count > u32::MAX as usize {
      return Err(StoreError::InvalidConfig("bucket_count exceeds u32 range"));
    }
    if self.block_pool_size == 0 || self.block_pool_size > u32::MAX as usize {
      return Err(StoreError::InvalidConfig(
        "block_pool_size must be in 1..=u32::MAX",
      ));
    }
    Ok(())
  }
}
