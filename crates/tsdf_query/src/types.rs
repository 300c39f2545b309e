//! Core data types shared by the ray caster and the mesher.

use glam::{Mat4, Vec3, Vec4};

use crate::error::StoreError;

/// Quantised truncated signed distance.
/// Negative = behind the surface, positive = in front of it.
pub type SdfSample = i16;

/// SDF conversion utilities for quantised storage.
///
/// Maps the truncated distance in `[-1, 1]` (units of mu) to i16
/// `[-32767, +32767]`.
pub mod sdf_conversion {
  /// Scale factor between the float and stored representation.
  pub const SCALE: f32 = 32767.0;

  /// Inverse scale for converting back to float.
  pub const INV_SCALE: f32 = 1.0 / SCALE;

  /// Stored value of an untouched voxel (+1.0, far in front of any surface).
  pub const EMPTY: i16 = 32767;

  /// Convert a truncated distance to quantised storage.
  #[inline(always)]
  pub fn to_storage(sdf: f32) -> i16 {
    (sdf * SCALE).clamp(-SCALE, SCALE).round() as i16
  }

  /// Convert quantised storage back to a truncated distance.
  #[inline(always)]
  pub fn to_float(value: i16) -> f32 {
    value as f32 * INV_SCALE
  }
}

/// A single voxel as stored in a block.
///
/// Stores without colour or marker support leave those fields at zero; the
/// query core checks [`crate::FieldStore::has_color`] and
/// [`crate::FieldStore::has_marker`] before reading them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voxel {
  /// Quantised truncated signed distance.
  pub sdf: SdfSample,
  /// RGB colour.
  pub color: [u8; 3],
  /// Non-zero when the voxel has been flagged.
  pub marker: u8,
}

impl Default for Voxel {
  fn default() -> Self {
    Self {
      sdf: sdf_conversion::EMPTY,
      color: [0; 3],
      marker: 0,
    }
  }
}

impl Voxel {
  /// Voxel holding a truncated distance and nothing else.
  pub fn from_sdf(sdf: f32) -> Self {
    Self {
      sdf: sdf_conversion::to_storage(sdf),
      ..Self::default()
    }
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  pub fn with_marker(mut self, marker: u8) -> Self {
    self.marker = marker;
    self
  }

  /// Truncated distance as float.
  #[inline(always)]
  pub fn sdf_f32(&self) -> f32 {
    sdf_conversion::to_float(self.sdf)
  }
}

/// Mesh triangle in metric coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Triangle {
  pub p0: Vec3,
  pub p1: Vec3,
  pub p2: Vec3,
}

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Global scene parameters shared by every query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneParams {
  /// Truncation margin in metres.
  pub mu: f32,

  /// Voxel edge length in metres.
  pub voxel_size: f32,

  /// Near clip of the view frustum in metres.
  pub view_frustum_min: f32,

  /// Far clip of the view frustum in metres.
  pub view_frustum_max: f32,
}

impl Default for SceneParams {
  fn default() -> Self {
    Self {
      mu: 0.02,
      voxel_size: 0.005,
      view_frustum_min: 0.2,
      view_frustum_max: 3.0,
    }
  }
}

impl SceneParams {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_mu(mut self, mu: f32) -> Self {
    self.mu = mu;
    self
  }

  pub fn with_voxel_size(mut self, size: f32) -> Self {
    self.voxel_size = size;
    self
  }

  pub fn with_view_frustum(mut self, near: f32, far: f32) -> Self {
    self.view_frustum_min = near;
    self.view_frustum_max = far;
    self
  }

  #[inline]
  pub fn one_over_voxel_size(&self) -> f32 {
    1.0 / self.voxel_size
  }

  /// Truncation margin expressed in voxels; scales SDF values into ray steps.
  #[inline]
  pub fn step_scale(&self) -> f32 {
    self.mu * self.one_over_voxel_size()
  }

  pub fn validate(&self) -> Result<(), StoreError> {
    if !(self.voxel_size > 0.0) {
      return Err(StoreError::InvalidConfig("voxel_size must be positive"));
    }
    if !(self.mu > 0.0) {
      return Err(StoreError::InvalidConfig("mu must be positive"));
    }
    if !(self.view_frustum_min > 0.0 && self.view_frustum_max > self.view_frustum_min) {
      return Err(StoreError::InvalidConfig(
        "view frustum must satisfy 0 < near < far",
      ));
    }
    Ok(())
  }
}

/// Pinhole intrinsics in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraIntrinsics {
  pub fx: f32,
  pub fy: f32,
  pub cx: f32,
  pub cy: f32,
}

impl CameraIntrinsics {
  pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
    Self { fx, fy, cx, cy }
  }

  /// Packed `(fx, fy, cx, cy)`.
  #[inline]
  pub fn as_vec4(&self) -> Vec4 {
    Vec4::new(self.fx, self.fy, self.cx, self.cy)
  }

  /// Packed `(1/fx, 1/fy, cx, cy)` used to back-project pixels.
  #[inline]
  pub fn inverse_projection(&self) -> Vec4 {
    Vec4::new(1.0 / self.fx, 1.0 / self.fy, self.cx, self.cy)
  }
}

/// Rigid camera pose.
///
/// `m` maps world to camera coordinates (camera looks down +Z, Y points
/// down the image); `inv_m` maps camera back to world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
  pub m: Mat4,
  pub inv_m: Mat4,
}

impl Default for CameraPose {
  fn default() -> Self {
    Self {
      m: Mat4::IDENTITY,
      inv_m: Mat4::IDENTITY,
    }
  }
}

impl CameraPose {
  pub fn from_world_to_camera(m: Mat4) -> Self {
    Self {
      m,
      inv_m: m.inverse(),
    }
  }

  pub fn from_camera_to_world(inv_m: Mat4) -> Self {
    Self {
      m: inv_m.inverse(),
      inv_m,
    }
  }

  /// Camera at `eye` looking at `target`, with `up` pointing up the image.
  pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
    let forward = (target - eye).normalize();
    let down = -up;
    let right = down.cross(forward).normalize();
    let down = forward.cross(right);
    let inv_m = Mat4::from_cols(
      right.extend(0.0),
      down.extend(0.0),
      forward.extend(0.0),
      eye.extend(1.0),
    );
    Self::from_camera_to_world(inv_m)
  }

  /// Light travels along the viewing direction: the negated camera forward
  /// axis in world space.
  #[inline]
  pub fn light_direction(&self) -> Vec3 {
    -self.inv_m.z_axis.truncate()
  }
}

/// Pixel colouring mode for ray-cast rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
  /// Lambertian grey shading.
  #[default]
  Grey,
  /// Interpolated stored colour.
  Color,
  /// False colour from the surface normal.
  Normal,
  /// Flagged voxels in solid red, everything else grey-shaded.
  Marker,
}

/// Neighbour offset used for image-space normals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalSmoothing {
  /// ±1 pixel differences.
  #[default]
  Off,
  /// ±2 pixel differences, falling back to ±1 across discontinuities.
  Smoothed,
}

impl NormalSmoothing {
  /// Pixel offset of the neighbours sampled by this strategy.
  #[inline]
  pub fn offset(self) -> i32 {
    match self {
      NormalSmoothing::Off => 1,
      NormalSmoothing::Smoothed => 2,
    }
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
