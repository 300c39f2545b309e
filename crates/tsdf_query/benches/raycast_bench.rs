//! Frame rendering of a truncated sphere: culling, ray casting and shading.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tsdf_query::{
  create_expected_depths, fill_scene, raycast, render_image, CameraIntrinsics, CameraPose,
  ExecutionStrategy, Frame, HashConfig, IVec2, RenderConfig, RenderState, Scene, SceneParams,
  SphereSampler, Vec3, VoxelBlockHash,
};

const IMAGE_SIZE: IVec2 = IVec2::new(320, 240);

fn sphere_scene() -> Scene<VoxelBlockHash> {
  let params = SceneParams::new();
  let mut hash = VoxelBlockHash::new(HashConfig::new()).expect("default hash config");
  fill_scene(
    &mut hash,
    &SphereSampler::new(0.25),
    &params,
    Vec3::splat(-0.3),
    Vec3::splat(0.3),
  )
  .expect("sphere fits the block pool");
  Scene::new(hash, params).expect("default scene params")
}

fn camera() -> (CameraIntrinsics, CameraPose) {
  (
    CameraIntrinsics::new(300.0, 300.0, 160.0, 120.0),
    CameraPose::look_at(Vec3::new(0.3, 0.2, -1.0), Vec3::ZERO, Vec3::Y),
  )
}

fn bench_expected_depths(c: &mut Criterion) {
  let scene = sphere_scene();
  let (intrinsics, pose) = camera();
  let mut state = RenderState::new(IMAGE_SIZE);

  c.bench_function("create_expected_depths (320x240)", |b| {
    b.iter(|| {
      black_box(create_expected_depths(
        &scene,
        &pose,
        &intrinsics,
        &mut state,
        ExecutionStrategy::Parallel,
      ))
    })
  });
}

fn bench_raycast_strategies(c: &mut Criterion) {
  let mut group = c.benchmark_group("raycast");
  group.sample_size(20);

  let scene = sphere_scene();
  let (intrinsics, pose) = camera();

  for (name, strategy) in [
    ("sequential", ExecutionStrategy::Sequential),
    ("parallel", ExecutionStrategy::Parallel),
  ] {
    let mut state = RenderState::new(IMAGE_SIZE);
    create_expected_depths(&scene, &pose, &intrinsics, &mut state, strategy);

    group.bench_with_input(BenchmarkId::from_parameter(name), &strategy, |b, &strategy| {
      b.iter(|| black_box(raycast(&scene, &pose, &intrinsics, &mut state, strategy)))
    });
  }

  group.finish();
}

fn bench_full_frame(c: &mut Criterion) {
  let scene = sphere_scene();
  let (intrinsics, pose) = camera();
  let mut state = RenderState::new(IMAGE_SIZE);
  let config = RenderConfig::new();
  let mut image = Frame::new(IMAGE_SIZE, [0u8; 4]);

  c.bench_function("full frame grey (320x240)", |b| {
    b.iter(|| {
      create_expected_depths(&scene, &pose, &intrinsics, &mut state, config.strategy);
      raycast(&scene, &pose, &intrinsics, &mut state, config.strategy);
      black_box(render_image(&scene, &pose, &mut state, &config, &mut image))
    })
  });
}

criterion_group!(
  benches,
  bench_expected_depths,
  bench_raycast_strategies,
  bench_full_frame
);
criterion_main!(benches);
