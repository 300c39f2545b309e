//! Voxel block layout constants for 8³ TSDF blocks.
//!
//! The field is split into fixed-size blocks addressed through a spatial
//! hash. Every block holds 8 samples per axis, so block coordinates and
//! in-block offsets fall out of shifts and masks.
//!
//! # Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          VOXEL BLOCK LAYOUT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  voxel (global, integer)  ──►  block = voxel >> 3   (floor division)    │
//! │                                local = voxel & 7    (always 0..8)       │
//! │                                                                         │
//! │  block storage address    ──►  first voxel of the block in the pool     │
//! │  voxel slot               ──►  address + local_index(local)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Memory Layout
//!
//! ```text
//! Voxel memory layout inside a block (X innermost):
//!
//! Address:  0    1   ...   7    8   ...  63   64  ...  511
//! Content: [0,0,0][1,0,0]..[7,0,0][0,1,0]..[7,7,0][0,0,1]..[7,7,7]
//!
//! index = x | y << 3 | z << 6
//! ```
//!
//! # Cube Corners
//!
//! Marching cubes and trilinear reads use the classic corner order, walking
//! the bottom face counter-clockwise then the top face:
//!
//! ```text
//!       7──────6          0 = (0,0,0)   4 = (0,0,1)
//!      /│     /│          1 = (1,0,0)   5 = (1,0,1)
//!     4─┼────5 │          2 = (1,1,0)   6 = (1,1,1)
//!     │ 3────┼─2          3 = (0,1,0)   7 = (0,1,1)
//!     │/     │/
//!     0──────1
//! ```

use glam::IVec3;

/// Voxels per block edge.
pub const SDF_BLOCK_SIZE: i32 = 8;

/// Voxels per block (8³ = 512).
pub const SDF_BLOCK_SIZE3: usize = (SDF_BLOCK_SIZE * SDF_BLOCK_SIZE * SDF_BLOCK_SIZE) as usize;

/// Bit shift for converting voxel coordinates to block coordinates (log2(8)).
pub const BLOCK_SHIFT: u32 = 3;

/// Mask for extracting the in-block offset of a voxel coordinate.
pub const BLOCK_MASK: i32 = SDF_BLOCK_SIZE - 1;

/// Bit shift for Y inside a block.
pub const Y_SHIFT: u32 = 3;

/// Bit shift for Z inside a block.
pub const Z_SHIFT: u32 = 6;

/// Default number of ordered hash buckets.
pub const DEFAULT_BUCKET_NUM: usize = 0x10000;

/// Default number of excess (overflow) hash entries.
pub const DEFAULT_EXCESS_LIST_SIZE: usize = 0x8000;

/// Default number of voxel blocks the pool can hold.
pub const DEFAULT_LOCAL_BLOCK_NUM: usize = 0x4000;

/// Mesh vertices reserved per voxel block.
pub const VERTICES_PER_BLOCK: usize = 12;

/// Mesh triangles reserved per voxel block.
pub const TRIANGLES_PER_BLOCK: usize = 32;

/// Screen-space rendering tile width in pixels.
pub const RENDERING_BLOCK_SIZE_X: i32 = 16;

/// Screen-space rendering tile height in pixels.
pub const RENDERING_BLOCK_SIZE_Y: i32 = 16;

/// Upper bound on rendering tiles emitted per frame.
pub const MAX_RENDERING_BLOCKS: usize = 65536 * 4;

/// Subsampling factor between the rendered image and the depth-range image.
pub const MINMAX_IMG_SUBSAMPLE: i32 = 8;

/// Initial "far" bound of an untouched range image pixel.
pub const FAR_AWAY: f32 = 999_999.9;

/// Near clamp for projected block depths.
pub const VERY_CLOSE: f32 = 0.05;

/// Block coordinate containing a voxel (floor division by the block size).
#[inline(always)]
pub fn voxel_to_block(voxel: IVec3) -> IVec3 {
  IVec3::new(
    voxel.x >> BLOCK_SHIFT,
    voxel.y >> BLOCK_SHIFT,
    voxel.z >> BLOCK_SHIFT,
  )
}

/// In-block linear index of a voxel.
#[inline(always)]
pub fn voxel_local_index(voxel: IVec3) -> usize {
  local_index(
    voxel.x & BLOCK_MASK,
    voxel.y & BLOCK_MASK,
    voxel.z & BLOCK_MASK,
  )
}

/// Linear index of an in-block offset (each component in `0..8`).
#[inline(always)]
pub const fn local_index(x: i32, y: i32, z: i32) -> usize {
  (x | (y << Y_SHIFT) | (z << Z_SHIFT)) as usize
}

/// Inverse of [`local_index`].
#[inline(always)]
pub const fn local_coord(idx: usize) -> (i32, i32, i32) {
  let idx = idx as i32;
  (
    idx & BLOCK_MASK,
    (idx >> Y_SHIFT) & BLOCK_MASK,
    (idx >> Z_SHIFT) & BLOCK_MASK,
  )
}

/// Integer offsets of the 8 cube corners, in marching-cubes order.
pub const CORNER_OFFSETS: [IVec3; 8] = [
  IVec3::new(0, 0, 0),
  IVec3::new(1, 0, 0),
  IVec3::new(1, 1, 0),
  IVec3::new(0, 1, 0),
  IVec3::new(0, 0, 1),
  IVec3::new(1, 0, 1),
  IVec3::new(1, 1, 1),
  IVec3::new(0, 1, 1),
];

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
