//! Analytic SDF samplers for building synthetic scenes.
//!
//! Real stores are filled by a fusion pipeline; these samplers give tests,
//! benches and the `render_tsdf` tool deterministic surfaces with known
//! geometry. [`fill_scene`] turns any sampler into truncated voxel blocks.

use glam::{IVec3, Vec3};

use crate::constants::{local_coord, SDF_BLOCK_SIZE};
use crate::error::StoreError;
use crate::hash::VoxelBlockHash;
use crate::types::{SceneParams, Voxel};

/// Signed distance source in metres. Negative inside, positive outside.
pub trait TsdfSampler: Sync {
  fn distance(&self, p: Vec3) -> f32;

  /// Surface colour near `p`.
  fn color(&self, _p: Vec3) -> [u8; 3] {
    [0; 3]
  }
}

/// Sphere SDF sampler.
#[derive(Clone, Debug)]
pub struct SphereSampler {
  pub center: Vec3,
  pub radius: f32,
  pub color: [u8; 3],
}

impl SphereSampler {
  pub fn new(radius: f32) -> Self {
    Self {
      center: Vec3::ZERO,
      radius,
      color: [255; 3],
    }
  }

  pub fn with_center(mut self, center: Vec3) -> Self {
    self.center = center;
    self
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }
}

impl TsdfSampler for SphereSampler {
  #[inline]
  fn distance(&self, p: Vec3) -> f32 {
    (p - self.center).length() - self.radius
  }

  fn color(&self, _p: Vec3) -> [u8; 3] {
    self.color
  }
}

/// Half-space SDF sampler.
///
/// SDF: `dot(normal, p) - offset`. Default is the ground plane `y = 0`.
#[derive(Clone, Debug)]
pub struct PlaneSampler {
  pub normal: Vec3,
  pub offset: f32,
  pub color: [u8; 3],
}

impl Default for PlaneSampler {
  fn default() -> Self {
    Self {
      normal: Vec3::Y,
      offset: 0.0,
      color: [255; 3],
    }
  }
}

impl PlaneSampler {
  pub fn new(normal: Vec3, offset: f32) -> Self {
    Self {
      normal: normal.normalize_or_zero(),
      offset,
      ..Self::default()
    }
  }

  /// Plane through the origin tilted around Z by `degrees` from horizontal.
  pub fn tilted(degrees: f32) -> Self {
    let angle = degrees.to_radians();
    Self::new(Vec3::new(-angle.sin(), angle.cos(), 0.0), 0.0)
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }
}

impl TsdfSampler for PlaneSampler {
  #[inline]
  fn distance(&self, p: Vec3) -> f32 {
    self.normal.dot(p) - self.offset
  }

  fn color(&self, _p: Vec3) -> [u8; 3] {
    self.color
  }
}

/// Axis-aligned box SDF sampler.
#[derive(Clone, Debug)]
pub struct BoxSampler {
  pub center: Vec3,
  pub half_extents: Vec3,
  pub color: [u8; 3],
}

impl BoxSampler {
  pub fn new(half_extents: Vec3) -> Self {
    Self {
      center: Vec3::ZERO,
      half_extents,
      color: [255; 3],
    }
  }

  pub fn with_center(mut self, center: Vec3) -> Self {
    self.center = center;
    self
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }
}

impl TsdfSampler for BoxSampler {
  fn distance(&self, p: Vec3) -> f32 {
    let q = (p - self.center).abs() - self.half_extents;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
  }

  fn color(&self, _p: Vec3) -> [u8; 3] {
    self.color
  }
}

/// Union of several samplers. Colour comes from the nearest member.
#[derive(Default)]
pub struct UnionSampler {
  members: Vec<Box<dyn TsdfSampler>>,
}

impl UnionSampler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, sampler: impl TsdfSampler + 'static) -> Self {
    self.members.push(Box::new(sampler));
    self
  }

  pub fn push(&mut self, sampler: Box<dyn TsdfSampler>) {
    self.members.push(sampler);
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  fn nearest(&self, p: Vec3) -> Option<(f32, &dyn TsdfSampler)> {
    self
      .members
      .iter()
      .map(|m| (m.distance(p), m.as_ref()))
      .min_by(|a, b| a.0.total_cmp(&b.0))
  }
}

impl TsdfSampler for UnionSampler {
  fn distance(&self, p: Vec3) -> f32 {
    self.nearest(p).map_or(f32::INFINITY, |(d, _)| d)
  }

  fn color(&self, p: Vec3) -> [u8; 3] {
    self.nearest(p).map_or([0; 3], |(_, m)| m.color(p))
  }
}

/// Write the truncated field of `sampler` inside `[bounds_min, bounds_max]`
/// (metres) into `hash`.
///
/// Every block whose centre lies within `mu` plus one block diagonal of the
/// surface is allocated and filled completely with `clamp(d / mu, -1, 1)`,
/// so allocated blocks never contain stale empty-space voxels and the
/// allocated shell is thicker than the one-block skip of the ray caster.
/// Returns the number of blocks written.
pub fn fill_scene<T: TsdfSampler + ?Sized>(
  hash: &mut VoxelBlockHash,
  sampler: &T,
  params: &SceneParams,
  bounds_min: Vec3,
  bounds_max: Vec3,
) -> Result<usize, StoreError> {
  params.validate()?;
  let vs = params.voxel_size;
  let block_extent = SDF_BLOCK_SIZE as f32 * vs;
  let margin = params.mu + block_extent * 3f32.sqrt();
  let with_color = hash.config().has_color;

  let block_min = (bounds_min / block_extent).floor().as_ivec3();
  let block_max = (bounds_max / block_extent).ceil().as_ivec3();

  let mut written = 0;
  for bz in block_min.z..block_max.z {
    for by in block_min.y..block_max.y {
      for bx in block_min.x..block_max.x {
        let block = IVec3::new(bx, by, bz);
        let origin = block * SDF_BLOCK_SIZE;
        let center = (origin.as_vec3() + Vec3::splat(SDF_BLOCK_SIZE as f32 * 0.5)) * vs;
        if sampler.distance(center).abs() > margin {
          continue;
        }

        let address = hash.allocate_block(block)?;
        let voxels = hash.block_voxels_mut(address);
        for (index, slot) in voxels.iter_mut().enumerate() {
          let (x, y, z) = local_coord(index);
          let p = (origin + IVec3::new(x, y, z)).as_vec3() * vs;
          let sdf = (sampler.distance(p) / params.mu).clamp(-1.0, 1.0);
          let mut voxel = Voxel::from_sdf(sdf);
          if with_color {
            voxel = voxel.with_color(sampler.color(p));
          }
          *slot = voxel;
        }
        written += 1;
      }
    }
  }
  Ok(written)
}

#[cfg(test)]
#[path = "sdf_samplers_test.rs"]
mod sdf_samplers_test;
