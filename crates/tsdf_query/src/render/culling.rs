//! Block projection and the expected-depth range image.
//!
//! Each allocated block is projected into the subsampled range image. The
//! screen rectangle of a surviving block is cut into 16x16 tiles that all
//! carry the block's depth range; the tiles then widen the per-pixel
//! `(near, far)` bounds the ray caster starts from.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{IVec2, IVec3, Mat4, Vec2};
use web_time::Instant;

use super::{RenderState, RenderingBlock};
use crate::constants::{
  FAR_AWAY, MINMAX_IMG_SUBSAMPLE, RENDERING_BLOCK_SIZE_X, RENDERING_BLOCK_SIZE_Y, SDF_BLOCK_SIZE,
  VERY_CLOSE,
};
use crate::field::FieldStore;
use crate::metrics::RenderStats;
use crate::scene::Scene;
use crate::threading::ExecutionStrategy;
use crate::types::{CameraIntrinsics, CameraPose};

/// Project the 8 corners of `block` and bound them in range-image pixels.
///
/// `pose` maps world to camera. Corners behind the camera are skipped.
/// Returns `None` when the rectangle is empty after clamping to
/// `range_size`, or when the whole block lies closer than `VERY_CLOSE`.
/// The near depth is clamped up to `VERY_CLOSE`.
pub fn project_single_block(
  block: IVec3,
  pose: &Mat4,
  intrinsics: &CameraIntrinsics,
  range_size: IVec2,
  voxel_size: f32,
) -> Option<RenderingBlock> {
  let subsample = MINMAX_IMG_SUBSAMPLE as f32;
  // Starts at range_size / 8 rather than range_size, which can stretch the
  // rectangle towards the origin.
  let mut upper_left = range_size / MINMAX_IMG_SUBSAMPLE;
  let mut lower_right = IVec2::splat(-1);
  let mut z_range = Vec2::new(FAR_AWAY, VERY_CLOSE);

  for corner in 0..8 {
    let offset = IVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
    let world = (block + offset).as_vec3() * SDF_BLOCK_SIZE as f32 * voxel_size;
    let camera = pose.transform_point3(world);
    if camera.z < 1e-6 {
      continue;
    }

    let pt = Vec2::new(
      (intrinsics.fx * camera.x / camera.z + intrinsics.cx) / subsample,
      (intrinsics.fy * camera.y / camera.z + intrinsics.cy) / subsample,
    );
    upper_left = upper_left.min(pt.floor().as_ivec2());
    lower_right = lower_right.max(pt.ceil().as_ivec2());
    z_range.x = z_range.x.min(camera.z);
    z_range.y = z_range.y.max(camera.z);
  }

  let upper_left = upper_left.max(IVec2::ZERO);
  let lower_right = lower_right.min(range_size - IVec2::ONE);
  if upper_left.x > lower_right.x || upper_left.y > lower_right.y {
    return None;
  }
  if z_range.x < VERY_CLOSE {
    z_range.x = VERY_CLOSE;
  }
  if z_range.y < VERY_CLOSE {
    return None;
  }

  Some(RenderingBlock {
    upper_left,
    lower_right,
    z_range,
  })
}

/// Split a projected rectangle into 16x16 tiles, row by row. The last tile
/// of each row and column is clipped to the rectangle.
pub fn create_rendering_blocks(
  rect: &RenderingBlock,
) -> impl ExactSizeIterator<Item = RenderingBlock> {
  let extent = rect.lower_right - rect.upper_left + IVec2::ONE;
  let tiles_x = (extent.x + RENDERING_BLOCK_SIZE_X - 1) / RENDERING_BLOCK_SIZE_X;
  let tiles_y = (extent.y + RENDERING_BLOCK_SIZE_Y - 1) / RENDERING_BLOCK_SIZE_Y;
  let tile_size = IVec2::new(RENDERING_BLOCK_SIZE_X, RENDERING_BLOCK_SIZE_Y);
  let rect = *rect;

  (0..(tiles_x * tiles_y).max(0)).map(move |i| {
    let tile = IVec2::new(i % tiles_x, i / tiles_x);
    let upper_left = rect.upper_left + tile * tile_size;
    RenderingBlock {
      upper_left,
      lower_right: (upper_left + tile_size - IVec2::ONE).min(rect.lower_right),
      z_range: rect.z_range,
    }
  })
}

/// Fill `state.range_image` with the depth bounds of every visible block.
///
/// Pixels no tile covers keep the empty range `(FAR_AWAY, VERY_CLOSE)`, so
/// rays through them terminate without sampling. Returns the number of
/// tiles written; tiles past the tile-list capacity are dropped.
pub fn create_expected_depths<S: FieldStore>(
  scene: &Scene<S>,
  pose: &CameraPose,
  intrinsics: &CameraIntrinsics,
  state: &mut RenderState,
  strategy: ExecutionStrategy,
) -> usize {
  #[cfg(feature = "tracing")]
  let _span = tracing::info_span!("create_expected_depths").entered();
  let start = Instant::now();

  let store = scene.store();
  let voxel_size = scene.params().voxel_size;
  state.range_image.reset();
  state.tiles.reset();
  let range_size = state.range_image.size();

  let visible = AtomicUsize::new(0);
  {
    let tiles = &state.tiles;
    strategy.for_each_index(store.entry_count(), |entry_id| {
      let Some(block) = store.allocated_block(entry_id) else {
        return;
      };
      let Some(rect) = project_single_block(block, &pose.m, intrinsics, range_size, voxel_size)
      else {
        return;
      };
      visible.fetch_add(1, Ordering::Relaxed);
      for tile in create_rendering_blocks(&rect) {
        tiles.push(tile);
      }
    });
  }

  let frame = state.range_image.frame_mut();
  for tile in state.tiles.iter() {
    for y in tile.upper_left.y..=tile.lower_right.y {
      for x in tile.upper_left.x..=tile.lower_right.x {
        let range = frame.at_mut(x, y);
        range.x = range.x.min(tile.z_range.x);
        range.y = range.y.max(tile.z_range.y);
      }
    }
  }

  let written = state.tiles.len();
  let dropped = state.tiles.dropped();
  #[cfg(feature = "tracing")]
  {
    if dropped > 0 {
      tracing::warn!(
        dropped,
        capacity = state.tiles.capacity(),
        "rendering tile list full, tiles dropped"
      );
    }
    tracing::debug!(visible = visible.load(Ordering::Relaxed), tiles = written, "expected depths");
  }

  state.stats = RenderStats {
    visible_blocks: visible.into_inner(),
    rendering_tiles: written,
    dropped_tiles: dropped,
    found_pixels: 0,
    elapsed_us: start.elapsed().as_micros() as u64,
  };
  written
}

#[cfg(test)]
#[path = "culling_test.rs"]
mod culling_test;
