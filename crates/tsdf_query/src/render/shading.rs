//! Normals, lighting and pixel colouring.
//!
//! Two normal estimators feed the same Lambertian angle test:
//!
//! ```text
//!   field gradient  (one world point, reads the store)
//!   point map       (neighbouring ray hits, no store reads)
//!          │
//!          ▼
//!   angle = n · light ── angle > 0 ──► draw_pixel_*
//!                      └─ otherwise ─► background
//! ```
//!
//! The light travels along the viewing direction, so back faces and grazing
//! hits never count as found.

use glam::{Vec3, Vec4};
use web_time::Instant;

use super::raycast::raycast;
use super::{Frame, RenderConfig, RenderState};
use crate::arena::BoundedArena;
use crate::field::{
  field_gradient_normal, read_color_interpolated, read_marker, FieldStore, LocalityCache,
};
use crate::scene::Scene;
use crate::threading::ExecutionStrategy;
use crate::types::{CameraIntrinsics, CameraPose, NormalSmoothing, RenderMode};

/// Squared metric length of a neighbour difference above which the smoothed
/// point-map normal falls back to the one-pixel offsets.
const DISCONTINUITY_SQ: f32 = 0.15 * 0.15;

/// One point-cloud entry: metric location (`w = 1`) and colour in `[0, 1]`
/// (`w = 1`, or all zero for stores without colour).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointSample {
  pub location: Vec4,
  pub color: Vec4,
}

/// One pixel of the tracking maps.
///
/// Found pixels carry a metric point with `w = 1`, a unit normal with
/// `w = 0` and the grey shade. Rejected pixels carry `(0, 0, 0, -1)` in both
/// maps and a zero pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IcpPixel {
  pub point: Vec4,
  pub normal: Vec4,
  pub color: [u8; 4],
}

impl IcpPixel {
  pub const NOT_FOUND: Self = Self {
    point: Vec4::new(0.0, 0.0, 0.0, -1.0),
    normal: Vec4::new(0.0, 0.0, 0.0, -1.0),
    color: [0; 4],
  };

  #[inline]
  pub fn is_found(&self) -> bool {
    self.point.w > 0.0
  }
}

impl Default for IcpPixel {
  fn default() -> Self {
    Self::NOT_FOUND
  }
}

// =============================================================================
// Normals
// =============================================================================

/// Normal and shading angle from the field gradient at `point` (voxel
/// units). `None` when the surface faces away from the light.
pub fn normal_from_field<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  light: Vec3,
  cache: &mut LocalityCache,
) -> Option<(Vec3, f32)> {
  let normal = field_gradient_normal(store, point, cache);
  lit(normal, light)
}

/// Normal and shading angle of pixel `(x, y)` from its neighbours in the
/// point map (voxel units, `w > 0` for hits).
///
/// Pixels within the neighbour offset of the border, or with a missing
/// neighbour, are rejected. Smoothed normals drop back to one-pixel offsets
/// across depth discontinuities.
pub fn normal_from_points(
  points: &Frame<Vec4>,
  x: i32,
  y: i32,
  light: Vec3,
  voxel_size: f32,
  smoothing: NormalSmoothing,
) -> Option<(Vec3, f32)> {
  let margin = smoothing.offset();
  let inside = |v: i32, extent: i32| v > margin && v < extent - margin - 1;
  if !inside(x, points.width()) || !inside(y, points.height()) {
    return None;
  }

  let neighbours = |offset: i32| {
    [
      *points.at(x + offset, y),
      *points.at(x - offset, y),
      *points.at(x, y + offset),
      *points.at(x, y - offset),
    ]
  };
  let all_found = |n: &[Vec4; 4]| n.iter().all(|p| p.w > 0.0);
  let differences = |n: &[Vec4; 4]| ((n[0] - n[1]).truncate(), (n[2] - n[3]).truncate());

  let mut n = neighbours(margin);
  let fall_back = if !all_found(&n) {
    true
  } else {
    let (dx, dy) = differences(&n);
    dx.length_squared().max(dy.length_squared()) * voxel_size * voxel_size > DISCONTINUITY_SQ
  };

  if fall_back {
    if smoothing == NormalSmoothing::Smoothed {
      n = neighbours(1);
    }
    if !all_found(&n) {
      return None;
    }
  }

  let (dx, dy) = differences(&n);
  let normal = (-dx.cross(dy)).normalize_or_zero();
  lit(normal, light)
}

#[inline]
fn lit(normal: Vec3, light: Vec3) -> Option<(Vec3, f32)> {
  let angle = normal.dot(light);
  (angle > 0.0).then_some((normal, angle))
}

// =============================================================================
// Pixel colouring
// =============================================================================

/// Lambertian grey `0.8 * angle + 0.2`, replicated into all four channels.
#[inline]
pub fn draw_pixel_grey(angle: f32) -> [u8; 4] {
  let grey = ((0.8 * angle + 0.2) * 255.0) as u8;
  [grey; 4]
}

/// False colour `0.3 + (1 - n) * 0.35` per channel, opaque.
#[inline]
pub fn draw_pixel_normal(normal: Vec3) -> [u8; 4] {
  let c = (Vec3::splat(0.3) + (Vec3::ONE - normal) * 0.35) * 255.0;
  [c.x as u8, c.y as u8, c.z as u8, 255]
}

/// Interpolated stored colour at `point`, opaque.
pub fn draw_pixel_color<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> [u8; 4] {
  let c = read_color_interpolated(store, point, cache) * 255.0;
  [c.x as u8, c.y as u8, c.z as u8, 255]
}

/// Solid red on flagged voxels, grey shading elsewhere.
pub fn draw_pixel_marker<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  angle: f32,
  cache: &mut LocalityCache,
) -> [u8; 4] {
  if read_marker(store, point, cache) != 0 {
    [255, 0, 0, 255]
  } else {
    draw_pixel_grey(angle)
  }
}

fn shade_pixel<S: FieldStore + ?Sized>(
  store: &S,
  hit: Vec4,
  light: Vec3,
  mode: RenderMode,
) -> Option<[u8; 4]> {
  if hit.w <= 0.0 {
    return None;
  }
  let point = hit.truncate();
  let mut cache = LocalityCache::new();
  let (normal, angle) = normal_from_field(store, point, light, &mut cache)?;
  Some(match mode {
    RenderMode::Grey => draw_pixel_grey(angle),
    RenderMode::Color => draw_pixel_color(store, point, &mut cache),
    RenderMode::Normal => draw_pixel_normal(normal),
    RenderMode::Marker => draw_pixel_marker(store, point, angle, &mut cache),
  })
}

// =============================================================================
// Passes
// =============================================================================

/// Colour every pixel of the last [`raycast`] into `out` using field-gradient
/// normals. Background pixels are zero. Returns the number of lit pixels.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "render_image"))]
pub fn render_image<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  state: &mut RenderState,
  config: &RenderConfig,
  out: &mut Frame<[u8; 4]>,
) -> usize {
  let start = Instant::now();
  let store = scene.store();
  let light = pose.light_direction();
  let points = &state.raycast_result;

  out.resize(points.size(), [0; 4]);
  config.strategy.for_each_mut(out.pixels_mut(), |index, pixel| {
    *pixel = shade_pixel(store, points.pixels()[index], light, config.mode).unwrap_or([0; 4]);
  });

  let lit = out.pixels().iter().filter(|p| p[3] > 0).count();
  #[cfg(feature = "tracing")]
  tracing::debug!(lit, mode = ?config.mode, "render image");
  state.stats.elapsed_us += start.elapsed().as_micros() as u64;
  lit
}

/// Build the metric point map, normal map and grey image used by tracking
/// from the last [`raycast`], with point-map normals. Returns the number of
/// found pixels.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "create_icp_maps"))]
pub fn create_icp_maps<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  state: &mut RenderState,
  config: &RenderConfig,
  out: &mut Frame<IcpPixel>,
) -> usize {
  let start = Instant::now();
  let voxel_size = scene.params().voxel_size;
  let light = pose.light_direction();
  let points = &state.raycast_result;
  let width = points.width();

  out.resize(points.size(), IcpPixel::NOT_FOUND);
  config.strategy.for_each_mut(out.pixels_mut(), |index, pixel| {
    let (x, y) = (index as i32 % width, index as i32 / width);
    let hit = points.pixels()[index];
    let shaded = if hit.w > 0.0 {
      normal_from_points(points, x, y, light, voxel_size, config.smoothing)
    } else {
      None
    };
    *pixel = shaded.map_or(IcpPixel::NOT_FOUND, |(normal, angle)| IcpPixel {
      point: (hit.truncate() * voxel_size).extend(1.0),
      normal: normal.extend(0.0),
      color: draw_pixel_grey(angle),
    });
  });

  let found = out.pixels().iter().filter(|p| p.is_found()).count();
  #[cfg(feature = "tracing")]
  tracing::debug!(found, "icp maps");
  state.stats.elapsed_us += start.elapsed().as_micros() as u64;
  found
}

/// Grey-shade the current point buffer with point-map normals, without
/// touching the store. Returns the number of lit pixels.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "forward_render"))]
pub fn forward_render<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  state: &mut RenderState,
  config: &RenderConfig,
  out: &mut Frame<[u8; 4]>,
) -> usize {
  let start = Instant::now();
  let voxel_size = scene.params().voxel_size;
  let light = pose.light_direction();
  let points = &state.raycast_result;
  let width = points.width();

  out.resize(points.size(), [0; 4]);
  config.strategy.for_each_mut(out.pixels_mut(), |index, pixel| {
    let (x, y) = (index as i32 % width, index as i32 / width);
    let shaded = if points.pixels()[index].w > 0.0 {
      normal_from_points(points, x, y, light, voxel_size, config.smoothing)
    } else {
      None
    };
    *pixel = shaded.map_or([0; 4], |(_, angle)| draw_pixel_grey(angle));
  });

  let lit = out.pixels().iter().filter(|p| p[3] > 0).count();
  state.stats.elapsed_us += start.elapsed().as_micros() as u64;
  lit
}

/// Ray cast the frame and rebuild `points` from every lit hit.
///
/// With `skip_points` only pixels with odd `x` and odd `y` are kept. Slots
/// are claimed atomically, so the parallel strategy fixes the set of points
/// but not their order. Points past the arena capacity are dropped. Returns
/// the number of points written by this pass.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "create_point_cloud"))]
pub fn create_point_cloud<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  intrinsics: &CameraIntrinsics,
  state: &mut RenderState,
  points: &mut BoundedArena<PointSample>,
  skip_points: bool,
  strategy: ExecutionStrategy,
) -> usize {
  raycast(scene, pose, intrinsics, state, strategy);
  points.reset();
  let points = &*points;

  let store = scene.store();
  let voxel_size = scene.params().voxel_size;
  let light = pose.light_direction();
  let hits = &state.raycast_result;
  let width = hits.width();

  strategy.for_each_index(hits.pixels().len(), |index| {
    let (x, y) = (index as i32 % width, index as i32 / width);
    let hit = hits.pixels()[index];
    if hit.w <= 0.0 || (skip_points && (x % 2 == 0 || y % 2 == 0)) {
      return;
    }
    let point = hit.truncate();
    let mut cache = LocalityCache::new();
    if normal_from_field(store, point, light, &mut cache).is_none() {
      return;
    }
    let color = if store.has_color() {
      read_color_interpolated(store, point, &mut cache).extend(1.0)
    } else {
      Vec4::ZERO
    };
    points.push(PointSample {
      location: (point * voxel_size).extend(1.0),
      color,
    });
  });

  #[cfg(feature = "tracing")]
  if points.dropped() > 0 {
    tracing::warn!(
      dropped = points.dropped(),
      capacity = points.capacity(),
      "point cloud full, points dropped"
    );
  }
  points.len()
}

#[cfg(test)]
#[path = "shading_test.rs"]
mod shading_test;
