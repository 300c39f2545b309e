//! Ray marching to the first zero crossing.
//!
//! ```text
//!   SEARCHING ──(sample <= 0)──► REFINING ──► TERMINAL(found)
//!       │
//!       └──(length >= max)──────────────────► TERMINAL(not found)
//! ```
//!
//! While searching, a sample outside allocated blocks skips one block
//! width. Inside a block the step is the sampled distance in voxels,
//! floored at one voxel. Samples in the trust band `[-0.5, 0.1]` are
//! re-read with trilinear interpolation before the sign test. Refinement
//! applies two linear corrections, re-sampling in between.
//!
//! Positions and lengths are in voxel units.

use glam::{Mat4, Vec2, Vec3, Vec4};
use web_time::Instant;

use super::RenderState;
use crate::constants::SDF_BLOCK_SIZE;
use crate::field::{read_sdf_interpolated, read_sdf_uninterpolated, FieldStore, LocalityCache};
use crate::scene::Scene;
use crate::threading::ExecutionStrategy;
use crate::types::{CameraIntrinsics, CameraPose, SceneParams};

/// Values at or below this lower edge are trusted without interpolation.
const TRUST_BAND_MIN: f32 = -0.5;
/// Values at or above this upper edge are trusted without interpolation.
const TRUST_BAND_MAX: f32 = 0.1;

/// Phase of a single ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RayState {
  Searching,
  Refining,
  Terminal { found: bool },
}

/// One ray walking through the field.
pub struct RayMarcher<'a, S: FieldStore + ?Sized> {
  store: &'a S,
  cache: LocalityCache,
  position: Vec3,
  direction: Vec3,
  total_length: f32,
  total_length_max: f32,
  step_scale: f32,
  sdf_value: f32,
  state: RayState,
}

impl<'a, S: FieldStore + ?Sized> RayMarcher<'a, S> {
  /// Ray from `start` along the unit `direction`, having already covered
  /// `total_length` of `total_length_max`.
  pub fn new(
    store: &'a S,
    start: Vec3,
    direction: Vec3,
    total_length: f32,
    total_length_max: f32,
    step_scale: f32,
  ) -> Self {
    Self {
      store,
      cache: LocalityCache::new(),
      position: start,
      direction,
      total_length,
      total_length_max,
      step_scale,
      sdf_value: 1.0,
      state: RayState::Searching,
    }
  }

  #[inline]
  pub fn state(&self) -> RayState {
    self.state
  }

  #[inline]
  pub fn position(&self) -> Vec3 {
    self.position
  }

  #[inline]
  pub fn total_length(&self) -> f32 {
    self.total_length
  }

  /// Last sampled truncated distance.
  #[inline]
  pub fn sdf_value(&self) -> f32 {
    self.sdf_value
  }

  /// Perform one transition: a single search sample, or the refinement.
  pub fn advance(&mut self) -> RayState {
    match self.state {
      RayState::Searching => self.search_step(),
      RayState::Refining => self.refine(),
      RayState::Terminal { .. } => {}
    }
    self.state
  }

  fn search_step(&mut self) {
    if !(self.total_length < self.total_length_max) {
      self.state = if self.sdf_value <= 0.0 {
        RayState::Refining
      } else {
        RayState::Terminal { found: false }
      };
      return;
    }

    let (value, found) = read_sdf_uninterpolated(self.store, self.position, &mut self.cache);
    self.sdf_value = value;
    let step = if !found {
      SDF_BLOCK_SIZE as f32
    } else {
      if (TRUST_BAND_MIN..=TRUST_BAND_MAX).contains(&value) {
        self.sdf_value = read_sdf_interpolated(self.store, self.position, &mut self.cache).0;
      }
      if self.sdf_value <= 0.0 {
        self.state = RayState::Refining;
        return;
      }
      (self.sdf_value * self.step_scale).max(1.0)
    };

    self.position += step * self.direction;
    self.total_length += step;
  }

  fn refine(&mut self) {
    self.position += self.sdf_value * self.step_scale * self.direction;
    self.sdf_value = read_sdf_interpolated(self.store, self.position, &mut self.cache).0;
    self.position += self.sdf_value * self.step_scale * self.direction;
    self.state = RayState::Terminal { found: true };
  }

  /// March to a terminal state. Returns the position with `w = 1` when the
  /// surface was found, `w = 0` otherwise.
  pub fn run(mut self) -> Vec4 {
    while !matches!(self.advance(), RayState::Terminal { .. }) {}
    self.result()
  }

  /// Current position with the found flag in `w`.
  pub fn result(&self) -> Vec4 {
    let found = matches!(self.state, RayState::Terminal { found: true });
    self.position.extend(if found { 1.0 } else { 0.0 })
  }
}

/// Cast the camera ray through pixel `(x, y)` between the camera-space
/// depths `near_far` (metres).
///
/// `inv_m` maps camera to world and `inv_projection` is
/// `(1/fx, 1/fy, cx, cy)`. Returns the hit in voxel units.
pub fn cast_ray<S: FieldStore + ?Sized>(
  store: &S,
  x: i32,
  y: i32,
  inv_m: &Mat4,
  inv_projection: Vec4,
  params: &SceneParams,
  near_far: Vec2,
) -> Vec4 {
  let one_over_voxel_size = params.one_over_voxel_size();
  let camera_point = |z: f32| {
    Vec3::new(
      z * ((x as f32 - inv_projection.z) * inv_projection.x),
      z * ((y as f32 - inv_projection.w) * inv_projection.y),
      z,
    )
  };

  let near = camera_point(near_far.x);
  let total_length = near.length() * one_over_voxel_size;
  let start = inv_m.transform_point3(near) * one_over_voxel_size;

  let far = camera_point(near_far.y);
  let total_length_max = far.length() * one_over_voxel_size;
  let end = inv_m.transform_point3(far) * one_over_voxel_size;

  let direction = (end - start).normalize_or_zero();
  RayMarcher::new(
    store,
    start,
    direction,
    total_length,
    total_length_max,
    params.step_scale(),
  )
  .run()
}

/// Cast a caller-supplied ray centred on `base` (metres) along
/// `direction`, covering `half_depth` metres on either side.
///
/// The ray starts at `base - half_depth * direction` and walks
/// `2 * half_depth`, all converted to voxel units. Returns the hit in
/// voxel units.
pub fn cast_ray_from<S: FieldStore + ?Sized>(
  store: &S,
  base: Vec3,
  direction: Vec3,
  half_depth: f32,
  params: &SceneParams,
) -> Vec4 {
  let one_over_voxel_size = params.one_over_voxel_size();
  let direction = direction.normalize_or_zero();
  let start = (base - half_depth * direction) * one_over_voxel_size;
  let total_length_max = 2.0 * half_depth * one_over_voxel_size;

  RayMarcher::new(
    store,
    start,
    direction,
    0.0,
    total_length_max,
    params.step_scale(),
  )
  .run()
}

/// Cast one ray per pixel into `state.raycast_result`, bounded by the range
/// image. Returns the number of pixels that met the surface.
pub fn raycast<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  intrinsics: &CameraIntrinsics,
  state: &mut RenderState,
  strategy: ExecutionStrategy,
) -> usize {
  #[cfg(feature = "tracing")]
  let _span = tracing::info_span!("raycast").entered();
  let start = Instant::now();

  let store = scene.store();
  let params = scene.params();
  let inv_projection = intrinsics.inverse_projection();
  let width = state.raycast_result.width();
  let range_image = &state.range_image;

  strategy.for_each_mut(state.raycast_result.pixels_mut(), |index, out| {
    let x = index as i32 % width;
    let y = index as i32 / width;
    *out = cast_ray(
      store,
      x,
      y,
      &pose.inv_m,
      inv_projection,
      params,
      range_image.range_at_pixel(x, y),
    );
  });

  let found = state
    .raycast_result
    .pixels()
    .iter()
    .filter(|p| p.w > 0.0)
    .count();
  #[cfg(feature = "tracing")]
  tracing::debug!(found, "raycast");

  state.stats.found_pixels = found;
  state.stats.elapsed_us += start.elapsed().as_micros() as u64;
  found
}

#[cfg(test)]
#[path = "raycast_test.rs"]
mod raycast_test;
