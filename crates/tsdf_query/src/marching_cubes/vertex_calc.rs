//! Corner gathering and edge crossing interpolation.

use glam::{IVec3, Vec3};

use crate::constants::CORNER_OFFSETS;
use crate::edge_table::EDGE_CORNERS;
use crate::field::{read_voxel, FieldStore, LocalityCache};

/// Values within this distance of each other or of zero are treated as equal.
const INTERP_EPSILON: f32 = 1e-5;

/// Corner positions (voxel units) and distances of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSamples {
  pub points: [Vec3; 8],
  pub values: [f32; 8],
}

/// Read the 8 corners of the cell whose lowest corner is voxel `cell`.
///
/// Corners may fall in neighbouring blocks. Returns `None` when any corner
/// lies in an unallocated block.
pub fn gather<S: FieldStore + ?Sized>(
  store: &S,
  cell: IVec3,
  cache: &mut LocalityCache,
) -> Option<CellSamples> {
  let mut samples = CellSamples {
    points: [Vec3::ZERO; 8],
    values: [0.0; 8],
  };
  for (i, offset) in CORNER_OFFSETS.iter().enumerate() {
    let corner = cell + *offset;
    let (voxel, found) = read_voxel(store, corner, cache);
    if !found {
      return None;
    }
    samples.points[i] = corner.as_vec3();
    samples.values[i] = voxel.sdf_f32();
  }
  Some(samples)
}

/// Zero crossing between `p1` (value `v1`) and `p2` (value `v2`).
///
/// Snaps to an end whose value is numerically zero, and to `p1` when the
/// two values coincide.
#[inline]
pub fn sdf_interp(p1: Vec3, p2: Vec3, v1: f32, v2: f32) -> Vec3 {
  if v1.abs() < INTERP_EPSILON {
    return p1;
  }
  if v2.abs() < INTERP_EPSILON {
    return p2;
  }
  if (v1 - v2).abs() < INTERP_EPSILON {
    return p1;
  }
  p1 + (-v1 / (v2 - v1)) * (p2 - p1)
}

/// Crossing point on cube edge `edge`.
#[inline]
pub fn edge_crossing(cell: &CellSamples, edge: usize) -> Vec3 {
  let [c0, c1] = EDGE_CORNERS[edge];
  let (c0, c1) = (c0 as usize, c1 as usize);
  sdf_interp(cell.points[c0], cell.points[c1], cell.values[c0], cell.values[c1])
}

/// Crossing points on all 12 edges, needed or not.
#[inline]
pub fn all_crossings(cell: &CellSamples) -> [Vec3; 12] {
  std::array::from_fn(|edge| edge_crossing(cell, edge))
}

#[cfg(test)]
#[path = "vertex_calc_test.rs"]
mod vertex_calc_test;
