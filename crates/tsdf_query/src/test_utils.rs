//! Shared fixtures for the query tests.
//!
//! Small hand-built fields, a lookup-counting store wrapper and a default
//! camera looking at a sphere.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{IVec2, IVec3, Vec3};

use crate::field::{BlockAddress, FieldStore};
use crate::hash::{HashConfig, VoxelBlockHash};
use crate::sdf_samplers::{fill_scene, SphereSampler, TsdfSampler};
use crate::types::{CameraIntrinsics, CameraPose, SceneParams, Voxel};

// =============================================================================
// Stores
// =============================================================================

/// Wraps a store and counts `lookup_block` calls.
pub struct CountingStore<'a, S: FieldStore> {
  pub inner: &'a S,
  lookups: AtomicUsize,
}

impl<'a, S: FieldStore> CountingStore<'a, S> {
  pub fn new(inner: &'a S) -> Self {
    Self {
      inner,
      lookups: AtomicUsize::new(0),
    }
  }

  pub fn lookups(&self) -> usize {
    self.lookups.load(Ordering::Relaxed)
  }
}

impl<S: FieldStore> FieldStore for CountingStore<'_, S> {
  fn has_color(&self) -> bool {
    self.inner.has_color()
  }

  fn has_marker(&self) -> bool {
    self.inner.has_marker()
  }

  fn lookup_block(&self, block: IVec3) -> Option<BlockAddress> {
    self.lookups.fetch_add(1, Ordering::Relaxed);
    self.inner.lookup_block(block)
  }

  fn voxel(&self, address: BlockAddress, local_index: usize) -> Voxel {
    self.inner.voxel(address, local_index)
  }

  fn entry_count(&self) -> usize {
    self.inner.entry_count()
  }

  fn allocated_block(&self, entry_id: usize) -> Option<IVec3> {
    self.inner.allocated_block(entry_id)
  }
}

/// Small hash suitable for unit tests.
pub fn small_hash() -> VoxelBlockHash {
  match VoxelBlockHash::new(
    HashConfig::new()
      .with_bucket_count(0x1000)
      .with_excess_list_size(0x400)
      .with_block_pool_size(0x2000),
  ) {
    Ok(hash) => hash,
    Err(e) => panic!("test hash config rejected: {e}"),
  }
}

/// Hash holding `f(voxel)` for every voxel in `[min, max)`. Other voxels of
/// the touched blocks keep the empty-space default.
pub fn field_from_fn(min: IVec3, max: IVec3, f: impl Fn(IVec3) -> f32) -> VoxelBlockHash {
  let mut hash = small_hash();
  for z in min.z..max.z {
    for y in min.y..max.y {
      for x in min.x..max.x {
        let voxel = IVec3::new(x, y, z);
        hash.write_voxel(voxel, Voxel::from_sdf(f(voxel))).unwrap();
      }
    }
  }
  hash
}

// =============================================================================
// Scenes
// =============================================================================

/// mu = 2 cm, 1 cm voxels, frustum 0.1..2 m.
pub fn test_params() -> SceneParams {
  SceneParams::new()
    .with_mu(0.02)
    .with_voxel_size(0.01)
    .with_view_frustum(0.1, 2.0)
}

/// Truncated field of `sampler` inside a cube of half-size `extent`.
pub fn sampled_scene(sampler: &dyn TsdfSampler, extent: f32, params: &SceneParams) -> VoxelBlockHash {
  let mut hash = small_hash();
  fill_scene(
    &mut hash,
    sampler,
    params,
    Vec3::splat(-extent),
    Vec3::splat(extent),
  )
  .unwrap();
  hash
}

/// 20 cm sphere at the origin.
pub fn sphere_scene(params: &SceneParams) -> VoxelBlockHash {
  sampled_scene(&SphereSampler::new(0.2), 0.3, params)
}

/// 64x48 pinhole camera one metre in front of the origin, looking at it.
pub fn test_camera() -> (IVec2, CameraIntrinsics, CameraPose) {
  let size = IVec2::new(64, 48);
  let intrinsics = CameraIntrinsics::new(60.0, 60.0, 32.0, 24.0);
  let pose = CameraPose::look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, Vec3::Y);
  (size, intrinsics, pose)
}
