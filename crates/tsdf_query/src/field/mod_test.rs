use glam::{IVec3, Vec3};

use super::*;
use crate::hash::HashConfig;
use crate::hash::VoxelBlockHash;
use crate::test_utils::{field_from_fn, small_hash, CountingStore};
use crate::types::Voxel;

fn ramp_x() -> VoxelBlockHash {
  // sdf = (x - 4) / 8 over two blocks along X
  field_from_fn(IVec3::new(0, 0, 0), IVec3::new(16, 8, 8), |v| {
    (v.x as f32 - 4.0) / 8.0
  })
}

#[test]
fn test_missing_block_reads_empty_space() {
  let hash = small_hash();
  let mut cache = LocalityCache::new();
  let (voxel, found) = read_voxel(&hash, IVec3::new(3, 4, 5), &mut cache);
  assert!(!found);
  assert_eq!(voxel, Voxel::default());

  let (v, found) = read_sdf_uninterpolated(&hash, Vec3::new(3.2, 4.0, 5.0), &mut cache);
  assert!(!found);
  assert_eq!(v, 1.0);
}

#[test]
fn test_uninterpolated_rounds_half_away_from_zero() {
  let hash = ramp_x();
  let mut cache = LocalityCache::new();

  let (v, _) = read_sdf_uninterpolated(&hash, Vec3::new(5.5, 1.0, 1.0), &mut cache);
  assert!((v - 2.0 / 8.0).abs() < 1e-4, "5.5 should round to 6, got {v}");

  let (v, _) = read_sdf_uninterpolated(&hash, Vec3::new(5.49, 1.0, 1.0), &mut cache);
  assert!((v - 1.0 / 8.0).abs() < 1e-4);
}

#[test]
fn test_negative_coordinates_use_floor_blocks() {
  let mut hash = small_hash();
  hash
    .write_voxel(IVec3::new(-1, -1, -1), Voxel::from_sdf(-0.25))
    .unwrap();
  let mut cache = LocalityCache::new();

  let (voxel, found) = read_voxel(&hash, IVec3::new(-1, -1, -1), &mut cache);
  assert!(found);
  assert!((voxel.sdf_f32() + 0.25).abs() < 1e-4);

  // Same block, different voxel
  let (voxel, found) = read_voxel(&hash, IVec3::new(-8, -8, -8), &mut cache);
  assert!(found);
  assert_eq!(voxel, Voxel::default());

  // Neighbouring block is not allocated
  let (_, found) = read_voxel(&hash, IVec3::new(0, -1, -1), &mut cache);
  assert!(!found);
}

#[test]
fn test_interpolated_is_linear_on_a_ramp() {
  let hash = ramp_x();
  let mut cache = LocalityCache::new();
  for &x in &[2.0f32, 4.25, 7.5, 8.75, 10.6] {
    let (v, found) = read_sdf_interpolated(&hash, Vec3::new(x, 3.3, 2.7), &mut cache);
    assert!(found);
    assert!(
      (v - (x - 4.0) / 8.0).abs() < 1e-3,
      "ramp at x={x} read {v}"
    );
  }
}

#[test]
fn test_interpolated_unallocated_corners_count_as_empty() {
  let hash = small_hash();
  let mut cache = LocalityCache::new();
  let (v, found) = read_sdf_interpolated(&hash, Vec3::new(0.5, 0.5, 0.5), &mut cache);
  assert!(!found);
  assert_eq!(v, 1.0);
}

#[test]
fn test_cache_skips_repeated_lookups() {
  let hash = ramp_x();
  let counting = CountingStore::new(&hash);
  let mut cache = LocalityCache::new();

  for x in 0..8 {
    read_voxel(&counting, IVec3::new(x, 2, 2), &mut cache);
  }
  assert_eq!(counting.lookups(), 1);

  read_voxel(&counting, IVec3::new(9, 2, 2), &mut cache);
  assert_eq!(counting.lookups(), 2);
}

#[test]
fn test_cache_does_not_change_results() {
  let hash = ramp_x();
  let mut warm = LocalityCache::new();
  for i in 0..40 {
    let p = Vec3::new(i as f32 * 0.37, 2.5, 3.5);
    let with_cache = read_sdf_interpolated(&hash, p, &mut warm);
    let fresh = read_sdf_interpolated(&hash, p, &mut LocalityCache::new());
    assert_eq!(with_cache, fresh);
  }
}

#[test]
fn test_cache_clear_forgets_block() {
  let hash = ramp_x();
  let mut cache = LocalityCache::new();
  let address = cache.resolve(&hash, IVec3::ZERO).unwrap();
  assert_eq!(cache.get(IVec3::ZERO), Some(address));
  cache.clear();
  assert_eq!(cache.get(IVec3::ZERO), None);
}

#[test]
fn test_color_read_requires_capability() {
  let mut plain = small_hash();
  plain
    .write_voxel(IVec3::ZERO, Voxel::from_sdf(0.0).with_color([255, 0, 0]))
    .unwrap();
  let mut cache = LocalityCache::new();
  assert_eq!(read_color_interpolated(&plain, Vec3::ZERO, &mut cache), Vec3::ZERO);

  let mut colored = VoxelBlockHash::new(
    HashConfig::new()
      .with_bucket_count(0x100)
      .with_color(true),
  )
  .unwrap();
  for x in 0..2 {
    for y in 0..2 {
      for z in 0..2 {
        let color = if x == 0 { [255, 0, 0] } else { [0, 0, 255] };
        colored
          .write_voxel(IVec3::new(x, y, z), Voxel::from_sdf(0.0).with_color(color))
          .unwrap();
      }
    }
  }
  let mid = read_color_interpolated(&colored, Vec3::new(0.5, 0.2, 0.7), &mut cache);
  assert!((mid - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-5);
}

#[test]
fn test_marker_read_requires_capability() {
  let config = HashConfig::new().with_bucket_count(0x100).with_marker(true);
  let mut marked = VoxelBlockHash::new(config).unwrap();
  marked
    .write_voxel(IVec3::new(2, 2, 2), Voxel::from_sdf(0.0).with_marker(1))
    .unwrap();
  let mut cache = LocalityCache::new();
  assert_eq!(read_marker(&marked, Vec3::new(2.4, 1.6, 2.0), &mut cache), 1);
  assert_eq!(read_marker(&marked, Vec3::new(3.0, 2.0, 2.0), &mut cache), 0);

  let mut plain = small_hash();
  plain
    .write_voxel(IVec3::new(2, 2, 2), Voxel::from_sdf(0.0).with_marker(1))
    .unwrap();
  assert_eq!(read_marker(&plain, Vec3::new(2.0, 2.0, 2.0), &mut cache), 0);
}

#[test]
fn test_gradient_normal_points_up_the_ramp() {
  let hash = ramp_x();
  let mut cache = LocalityCache::new();
  let n = field_gradient_normal(&hash, Vec3::new(6.0, 3.5, 3.5), &mut cache);
  assert!((n - Vec3::X).length() < 1e-4, "normal {n}");

  let empty = small_hash();
  assert_eq!(
    field_gradient_normal(&empty, Vec3::splat(3.0), &mut cache),
    Vec3::ZERO
  );
}
