use glam::{IVec3, Vec3, Vec4};

use super::*;
use crate::hash::VoxelBlockHash;
use crate::render::{create_expected_depths, RangeImage, RenderState};
use crate::test_utils::{field_from_fn, small_hash, sphere_scene, test_camera, test_params};

/// Surface at x = 20 voxels, positive for x < 20, truncated at 2 voxels.
fn wall_at_20() -> VoxelBlockHash {
  field_from_fn(IVec3::ZERO, IVec3::new(40, 8, 8), |v| {
    ((20.0 - v.x as f32) / 2.0).clamp(-1.0, 1.0)
  })
}

#[test]
fn test_block_miss_advances_one_block_width() {
  let empty = small_hash();
  let direction = Vec3::new(1.0, 2.0, 2.0).normalize();
  let mut ray = RayMarcher::new(&empty, Vec3::splat(0.25), direction, 0.0, 100.0, 2.0);

  assert_eq!(ray.advance(), RayState::Searching);
  assert!((ray.position() - (Vec3::splat(0.25) + 8.0 * direction)).length() < 1e-5);
  assert_eq!(ray.total_length(), 8.0);
}

#[test]
fn test_ray_through_empty_space_is_not_found() {
  let empty = small_hash();
  let ray = RayMarcher::new(&empty, Vec3::ZERO, Vec3::X, 0.0, 100.0, 2.0);
  let result = ray.run();
  assert_eq!(result.w, 0.0);
}

#[test]
fn test_inverted_span_terminates_immediately() {
  let hash = wall_at_20();
  let mut ray = RayMarcher::new(&hash, Vec3::new(0.0, 4.0, 4.0), Vec3::X, 10.0, 5.0, 2.0);
  assert_eq!(ray.advance(), RayState::Terminal { found: false });
  assert_eq!(ray.position(), Vec3::new(0.0, 4.0, 4.0));
  assert_eq!(ray.result().w, 0.0);
}

#[test]
fn test_wall_hit_is_exact() {
  let hash = wall_at_20();
  let ray = RayMarcher::new(&hash, Vec3::new(0.0, 4.0, 4.0), Vec3::X, 0.0, 39.0, 2.0);
  let hit = ray.run();
  assert_eq!(hit.w, 1.0);
  assert!((hit.truncate() - Vec3::new(20.0, 4.0, 4.0)).length() < 1e-3, "hit {hit}");
}

#[test]
fn test_step_is_floored_at_one_voxel_and_refines() {
  let hash = wall_at_20();
  let mut ray = RayMarcher::new(&hash, Vec3::new(19.6, 4.0, 4.0), Vec3::X, 0.0, 10.0, 2.0);

  // Interpolated value 0.2 would step 0.4 voxels; the floor makes it 1
  assert_eq!(ray.advance(), RayState::Searching);
  assert!((ray.position().x - 20.6).abs() < 1e-4);
  assert!((ray.sdf_value() - 0.2).abs() < 1e-3);

  // Interpolated value -0.3 brackets the crossing
  assert_eq!(ray.advance(), RayState::Refining);
  assert!((ray.sdf_value() + 0.3).abs() < 1e-3);

  assert_eq!(ray.advance(), RayState::Terminal { found: true });
  assert!((ray.position().x - 20.0).abs() < 1e-3);

  // Terminal is absorbing
  assert_eq!(ray.advance(), RayState::Terminal { found: true });
}

#[test]
fn test_cast_ray_from_hits_sphere() {
  let params = test_params();
  let hash = sphere_scene(&params);

  // From inside the sphere out along -Z, spanning 0.5 m each side
  let hit = cast_ray_from(&hash, Vec3::ZERO, Vec3::NEG_Z, 0.5, &params);
  assert_eq!(hit.w, 1.0);
  let metric = hit.truncate() * params.voxel_size;
  assert!((metric - Vec3::new(0.0, 0.0, 0.2)).length() < 0.01, "hit at {metric}");
}

#[test]
fn test_cast_ray_from_missing_sphere() {
  let params = test_params();
  let hash = sphere_scene(&params);
  let hit = cast_ray_from(&hash, Vec3::new(0.5, 0.0, 0.0), Vec3::Z, 0.5, &params);
  assert_eq!(hit.w, 0.0);
}

#[test]
fn test_camera_ray_hits_sphere_front() {
  let params = test_params();
  let hash = sphere_scene(&params);
  let (_, intrinsics, pose) = test_camera();

  let hit = cast_ray(
    &hash,
    32,
    24,
    &pose.inv_m,
    intrinsics.inverse_projection(),
    &params,
    glam::Vec2::new(params.view_frustum_min, params.view_frustum_max),
  );
  assert_eq!(hit.w, 1.0);
  let metric = hit.truncate() * params.voxel_size;
  assert!((metric - Vec3::new(0.0, 0.0, -0.2)).length() < 0.01, "hit at {metric}");
}

#[test]
fn test_raycast_frame() {
  let params = test_params();
  let scene = Scene::new(sphere_scene(&params), params).unwrap();
  let (size, intrinsics, pose) = test_camera();
  let mut state = RenderState::new(size);

  create_expected_depths(&scene, &pose, &intrinsics, &mut state, ExecutionStrategy::Parallel);
  let found = raycast(&scene, &pose, &intrinsics, &mut state, ExecutionStrategy::Parallel);

  assert!(found > 0);
  assert_eq!(state.stats.found_pixels, found);
  assert_eq!(state.raycast_result.at(32, 24).w, 1.0);
  assert_eq!(state.raycast_result.at(0, 0).w, 0.0);
  assert!(state
    .raycast_result
    .pixels()
    .iter()
    .all(|p| p.w == 0.0 || p.w == 1.0));
}

#[test]
fn test_raycast_identical_across_strategies() {
  let params = test_params();
  let scene = Scene::new(sphere_scene(&params), params).unwrap();
  let (size, intrinsics, pose) = test_camera();

  let mut frames = Vec::new();
  for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
    let mut state = RenderState::new(size);
    create_expected_depths(&scene, &pose, &intrinsics, &mut state, strategy);
    raycast(&scene, &pose, &intrinsics, &mut state, strategy);
    frames.push(state.raycast_result);
  }
  assert_eq!(frames[0], frames[1]);
}

#[test]
fn test_uniform_range_finds_same_surface() {
  let params = test_params();
  let scene = Scene::new(sphere_scene(&params), params).unwrap();
  let (size, intrinsics, pose) = test_camera();

  let mut state = RenderState::new(size);
  state.range_image = RangeImage::uniform(size, params.view_frustum_min, params.view_frustum_max);
  raycast(&scene, &pose, &intrinsics, &mut state, ExecutionStrategy::Parallel);

  let center: Vec4 = *state.raycast_result.at(32, 24);
  assert_eq!(center.w, 1.0);
  assert!((center.z * params.voxel_size + 0.2).abs() < 0.01);
}
