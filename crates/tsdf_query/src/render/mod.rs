//! Ray-cast rendering of the zero level set.
//!
//! A frame runs in three passes over the same [`RenderState`]:
//!
//! ```text
//! ┌────────────────────┐    ┌──────────────────┐    ┌────────────────────────┐
//! │ create_expected_   │    │ raycast          │    │ render_image           │
//! │ depths             │───►│ one ray / pixel  │───►│ create_icp_maps        │
//! │ blocks ─► tiles ─► │    │ near/far from    │    │ forward_render         │
//! │ range image (÷8)   │    │ the range image  │    │ (shading, colouring)   │
//! └────────────────────┘    └──────────────────┘    └────────────────────────┘
//!                                                     create_point_cloud runs
//!                                                     its own rays per pixel
//! ```
//!
//! Every pass writes one output element per pixel (or per range-image
//! pixel), so sequential and parallel execution give identical frames. The
//! only shared cursors are the tile list and the point-cloud arena.

mod culling;
mod raycast;
mod shading;

pub use culling::{create_expected_depths, create_rendering_blocks, project_single_block};
pub use raycast::{cast_ray, cast_ray_from, raycast, RayMarcher, RayState};
pub use shading::{
  create_icp_maps, create_point_cloud, draw_pixel_color, draw_pixel_grey, draw_pixel_marker,
  draw_pixel_normal, forward_render, normal_from_field, normal_from_points, render_image,
  IcpPixel, PointSample,
};

use glam::{IVec2, Vec2, Vec4};

use crate::arena::BoundedArena;
use crate::constants::{FAR_AWAY, MAX_RENDERING_BLOCKS, MINMAX_IMG_SUBSAMPLE, VERY_CLOSE};
use crate::metrics::RenderStats;
use crate::threading::ExecutionStrategy;
use crate::types::{NormalSmoothing, RenderMode};

/// Row-major 2D buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<T> {
  size: IVec2,
  data: Vec<T>,
}

impl<T: Clone> Frame<T> {
  /// Frame of `size` (negative extents clamp to zero) filled with `value`.
  pub fn new(size: IVec2, value: T) -> Self {
    let size = size.max(IVec2::ZERO);
    Self {
      size,
      data: vec![value; (size.x * size.y) as usize],
    }
  }

  pub fn fill(&mut self, value: T) {
    self.data.fill(value);
  }

  /// Reallocate to `size` filled with `value` when the size differs.
  pub fn resize(&mut self, size: IVec2, value: T) {
    if self.size != size.max(IVec2::ZERO) {
      *self = Self::new(size, value);
    }
  }
}

impl<T> Frame<T> {
  #[inline]
  pub fn size(&self) -> IVec2 {
    self.size
  }

  #[inline]
  pub fn width(&self) -> i32 {
    self.size.x
  }

  #[inline]
  pub fn height(&self) -> i32 {
    self.size.y
  }

  #[inline]
  pub fn index_of(&self, x: i32, y: i32) -> usize {
    (x + y * self.size.x) as usize
  }

  /// Element at `(x, y)`. Panics when out of bounds.
  #[inline]
  pub fn at(&self, x: i32, y: i32) -> &T {
    &self.data[self.index_of(x, y)]
  }

  #[inline]
  pub fn at_mut(&mut self, x: i32, y: i32) -> &mut T {
    let index = self.index_of(x, y);
    &mut self.data[index]
  }

  pub fn pixels(&self) -> &[T] {
    &self.data
  }

  pub fn pixels_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn into_vec(self) -> Vec<T> {
    self.data
  }
}

/// Subsampled per-pixel depth bounds `(near, far)` in metres.
///
/// One range pixel covers an 8x8 patch of the rendered image.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeImage {
  frame: Frame<Vec2>,
}

impl RangeImage {
  /// Range image for an `image_size` frame with every pixel set to the
  /// empty range `(FAR_AWAY, VERY_CLOSE)`.
  pub fn for_image(image_size: IVec2) -> Self {
    let size = IVec2::new(
      (image_size.x + MINMAX_IMG_SUBSAMPLE - 1) / MINMAX_IMG_SUBSAMPLE,
      (image_size.y + MINMAX_IMG_SUBSAMPLE - 1) / MINMAX_IMG_SUBSAMPLE,
    );
    Self {
      frame: Frame::new(size, Vec2::new(FAR_AWAY, VERY_CLOSE)),
    }
  }

  /// Range image bounding every pixel by the same `[near, far]`.
  pub fn uniform(image_size: IVec2, near: f32, far: f32) -> Self {
    let mut range = Self::for_image(image_size);
    range.frame.fill(Vec2::new(near, far));
    range
  }

  /// Back to the empty range.
  pub fn reset(&mut self) {
    self.frame.fill(Vec2::new(FAR_AWAY, VERY_CLOSE));
  }

  #[inline]
  pub fn size(&self) -> IVec2 {
    self.frame.size()
  }

  /// Depth bounds of full-resolution pixel `(x, y)`.
  #[inline]
  pub fn range_at_pixel(&self, x: i32, y: i32) -> Vec2 {
    *self
      .frame
      .at(x / MINMAX_IMG_SUBSAMPLE, y / MINMAX_IMG_SUBSAMPLE)
  }

  pub fn frame(&self) -> &Frame<Vec2> {
    &self.frame
  }

  pub fn frame_mut(&mut self) -> &mut Frame<Vec2> {
    &mut self.frame
  }
}

/// Screen tile in range-image pixels with an inclusive rectangle and the
/// depth range of the block it came from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderingBlock {
  pub upper_left: IVec2,
  pub lower_right: IVec2,
  pub z_range: Vec2,
}

/// Caller-selected rendering options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderConfig {
  pub mode: RenderMode,
  pub smoothing: NormalSmoothing,
  pub strategy: ExecutionStrategy,
}

impl RenderConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_mode(mut self, mode: RenderMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_smoothing(mut self, smoothing: NormalSmoothing) -> Self {
    self.smoothing = smoothing;
    self
  }

  pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
    self.strategy = strategy;
    self
  }
}

/// Per-camera buffers reused across frames.
pub struct RenderState {
  image_size: IVec2,
  /// Expected depth bounds, filled by [`create_expected_depths`].
  pub range_image: RangeImage,
  /// Ray hits in voxel units, `w = 1` found / `w = 0` not found.
  pub raycast_result: Frame<Vec4>,
  /// Tiles of the last [`create_expected_depths`] pass.
  pub(crate) tiles: BoundedArena<RenderingBlock>,
  /// Counters of the last pass.
  pub stats: RenderStats,
}

impl RenderState {
  pub fn new(image_size: IVec2) -> Self {
    Self::with_max_rendering_blocks(image_size, MAX_RENDERING_BLOCKS)
  }

  pub fn with_max_rendering_blocks(image_size: IVec2, max_rendering_blocks: usize) -> Self {
    Self {
      image_size,
      range_image: RangeImage::for_image(image_size),
      raycast_result: Frame::new(image_size, Vec4::ZERO),
      tiles: BoundedArena::with_capacity(max_rendering_blocks),
      stats: RenderStats::default(),
    }
  }

  #[inline]
  pub fn image_size(&self) -> IVec2 {
    self.image_size
  }

  /// Tiles emitted by the last depth pass.
  pub fn rendering_blocks(&self) -> Vec<RenderingBlock> {
    self.tiles.to_vec()
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
