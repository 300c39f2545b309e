use super::*;
use crate::field::{read_sdf_uninterpolated, FieldStore, LocalityCache};
use crate::hash::HashConfig;

#[test]
fn test_sphere_distance() {
  let sphere = SphereSampler::new(1.0).with_center(Vec3::new(1.0, 0.0, 0.0));
  assert!((sphere.distance(Vec3::new(3.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
  assert!((sphere.distance(Vec3::new(1.0, 0.0, 0.0)) + 1.0).abs() < 1e-6);
}

#[test]
fn test_tilted_plane_passes_through_origin() {
  let plane = PlaneSampler::tilted(45.0);
  assert!(plane.distance(Vec3::ZERO).abs() < 1e-6);
  assert!(plane.distance(Vec3::new(1.0, 1.0, 0.0)).abs() < 1e-5);
  assert!(plane.distance(Vec3::new(0.0, 1.0, 0.0)) > 0.0);
}

#[test]
fn test_box_distance() {
  let cube = BoxSampler::new(Vec3::splat(1.0));
  assert!((cube.distance(Vec3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
  assert!((cube.distance(Vec3::ZERO) + 1.0).abs() < 1e-6);
  assert!((cube.distance(Vec3::new(2.0, 2.0, 1.0)) - 2f32.sqrt()).abs() < 1e-6);
}

#[test]
fn test_union_takes_nearest_member() {
  let union = UnionSampler::new()
    .with(SphereSampler::new(1.0).with_color([255, 0, 0]))
    .with(
      SphereSampler::new(1.0)
        .with_center(Vec3::new(5.0, 0.0, 0.0))
        .with_color([0, 0, 255]),
    );
  assert_eq!(union.len(), 2);
  assert!((union.distance(Vec3::new(2.5, 0.0, 0.0)) - 1.5).abs() < 1e-6);
  assert_eq!(union.color(Vec3::new(4.5, 0.0, 0.0)), [0, 0, 255]);
  assert_eq!(UnionSampler::new().distance(Vec3::ZERO), f32::INFINITY);
}

#[test]
fn test_fill_scene_allocates_only_near_surface() {
  let params = SceneParams::new().with_mu(0.02).with_voxel_size(0.01);
  let mut hash = VoxelBlockHash::new(HashConfig::new().with_bucket_count(0x1000)).unwrap();
  let plane = PlaneSampler::default();

  let written = fill_scene(
    &mut hash,
    &plane,
    &params,
    Vec3::splat(-0.4),
    Vec3::splat(0.4),
  )
  .unwrap();
  assert_eq!(written, hash.allocated_count());
  assert!(written > 0);

  // Every allocated block straddles or touches the plane band
  for id in 0..hash.entry_count() {
    if let Some(block) = hash.allocated_block(id) {
      assert!((-2..=1).contains(&block.y), "block {block} too far from plane");
    }
  }
}

#[test]
fn test_fill_scene_values_are_truncated() {
  let params = SceneParams::new().with_mu(0.02).with_voxel_size(0.01);
  let mut hash = VoxelBlockHash::new(HashConfig::new().with_bucket_count(0x1000)).unwrap();
  fill_scene(
    &mut hash,
    &PlaneSampler::default(),
    &params,
    Vec3::splat(-0.2),
    Vec3::splat(0.2),
  )
  .unwrap();

  let mut cache = LocalityCache::new();
  // One voxel above the plane: 0.01 / 0.02
  let (v, found) = read_sdf_uninterpolated(&hash, Vec3::new(0.0, 1.0, 0.0), &mut cache);
  assert!(found);
  assert!((v - 0.5).abs() < 1e-3);

  // Far below the band clamps to -1
  let (v, found) = read_sdf_uninterpolated(&hash, Vec3::new(0.0, -6.0, 0.0), &mut cache);
  assert!(found);
  assert!((v + 1.0).abs() < 1e-3);
}

#[test]
fn test_fill_scene_writes_color_when_enabled() {
  let params = SceneParams::new().with_mu(0.02).with_voxel_size(0.01);
  let mut hash = VoxelBlockHash::new(
    HashConfig::new()
      .with_bucket_count(0x1000)
      .with_color(true),
  )
  .unwrap();
  fill_scene(
    &mut hash,
    &PlaneSampler::default().with_color([10, 20, 30]),
    &params,
    Vec3::splat(-0.1),
    Vec3::splat(0.1),
  )
  .unwrap();

  let address = hash.lookup_block(IVec3::ZERO).unwrap();
  assert_eq!(hash.voxel(address, 0).color, [10, 20, 30]);
}

#[test]
fn test_fill_scene_reports_pool_exhaustion() {
  let params = SceneParams::new().with_mu(0.02).with_voxel_size(0.01);
  let mut hash = VoxelBlockHash::new(
    HashConfig::new()
      .with_bucket_count(0x1000)
      .with_block_pool_size(1),
  )
  .unwrap();
  let result = fill_scene(
    &mut hash,
    &PlaneSampler::default(),
    &params,
    Vec3::splat(-0.4),
    Vec3::splat(0.4),
  );
  assert_eq!(result, Err(StoreError::PoolExhausted { capacity: 1 }));
}
