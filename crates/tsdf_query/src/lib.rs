//! tsdf_query - Read-side queries over a sparse voxel-block TSDF
//!
//! This crate answers the two read queries of a volumetric reconstruction
//! system against a hashed, truncated signed distance field: ray-cast
//! rendering of the zero level set from an arbitrary camera, and
//! marching-cubes extraction of a triangle mesh.
//!
//! # Features
//!
//! - **Visibility culling**: projects allocated blocks into a subsampled
//!   depth-range image that bounds every pixel's ray
//! - **Ray marching**: block-skipping sphere tracing with trilinear
//!   refinement of the first zero crossing
//! - **Shading**: field-gradient or point-map normals, grey / colour /
//!   normal / marker images, tracking maps and point clouds
//! - **Marching cubes**: per-cell vertex and triangle passes into
//!   fixed-capacity buffers, with XYZ / OBJ / STL writers
//! - **Execution strategies**: every pass runs sequentially or on rayon
//!   with identical per-pixel results
//!
//! Queries read the field only through [`FieldStore`]; [`VoxelBlockHash`] is
//! the in-memory reference store.
//!
//! # Example
//!
//! ```ignore
//! use tsdf_query::*;
//!
//! let params = SceneParams::new().with_voxel_size(0.01);
//! let mut hash = VoxelBlockHash::new(HashConfig::new())?;
//! fill_scene(&mut hash, &SphereSampler::new(0.2), &params, Vec3::splat(-0.3), Vec3::splat(0.3))?;
//! let scene = Scene::new(hash, params)?;
//!
//! let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
//! let pose = CameraPose::look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, Vec3::Y);
//! let mut state = RenderState::new(IVec2::new(640, 480));
//! let config = RenderConfig::new();
//!
//! create_expected_depths(&scene, &pose, &intrinsics, &mut state, config.strategy);
//! raycast(&scene, &pose, &intrinsics, &mut state, config.strategy);
//! let mut image = Frame::new(state.image_size(), [0u8; 4]);
//! render_image(&scene, &pose, &mut state, &config, &mut image);
//!
//! let mut mesh = Mesh::default();
//! mesh_scene(&scene, &mut mesh, config.strategy);
//! write_stl("sphere.stl", &mesh);
//! ```

pub mod constants;
pub mod edge_table;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::{CORNER_OFFSETS, SDF_BLOCK_SIZE, SDF_BLOCK_SIZE3};
pub use error::StoreError;
pub use glam::{IVec2, IVec3, Mat4, Vec2, Vec3, Vec4};
pub use types::{
  sdf_conversion, CameraIntrinsics, CameraPose, MinMaxAABB, NormalSmoothing, RenderMode,
  SceneParams, SdfSample, Triangle, Voxel,
};

// Store contract, locality cache and field reads
pub mod field;
pub use field::{BlockAddress, FieldStore, LocalityCache};

// Reference voxel block hash
pub mod hash;
pub use hash::{HashConfig, VoxelBlockHash};

// Analytic surfaces for synthetic scenes
pub mod sdf_samplers;
pub use sdf_samplers::{
  fill_scene, BoxSampler, PlaneSampler, SphereSampler, TsdfSampler, UnionSampler,
};

// Bounded atomic-claim output
pub mod arena;
pub use arena::BoundedArena;

// Sequential / rayon execution of per-item loops
pub mod threading;
pub use threading::ExecutionStrategy;

pub mod metrics;
pub use metrics::{MeshStats, QueryMetrics, RenderStats};

pub mod scene;
pub use scene::{Scene, SceneId};

// Ray-cast rendering
pub mod render;
pub use render::{
  cast_ray_from, create_expected_depths, create_icp_maps, create_point_cloud, forward_render,
  raycast, render_image, Frame, IcpPixel, PointSample, RangeImage, RenderConfig, RenderState,
  RenderingBlock,
};

// Isosurface extraction
pub mod marching_cubes;
pub use marching_cubes::{
  mesh_scene, try_write_obj, try_write_stl, try_write_xyz, vertex_scene, write_obj, write_stl,
  write_xyz, Mesh, MeshCapacity,
};

#[cfg(test)]
mod test_utils;
