//! Marching cubes over every allocated block.
//!
//! Each allocated block contributes its 8×8×8 cells; the far corners of the
//! outermost cells are read from the neighbouring blocks through the same
//! field-read path the renderer uses.
//!
//! # Processing Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  for each hash entry (one task per entry)                       │
//! │    skip if unallocated                                          │
//! │    for each cell (z, y, x) in the block                         │
//! │      gather 8 corners ── any unallocated ──► skip cell          │
//! │      cube index from corner signs ── 0x00 / 0xff ──► skip cell  │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────────┐
//! │ vertex_scene                  │ │ mesh_scene                    │
//! │   one crossing per flagged    │ │   all 12 crossings            │
//! │   edge, in edge order         │ │   TRI_TABLE fans ─► triangles │
//! └───────────────────────────────┘ └───────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  × voxel_size, claim one arena slot per item                    │
//! │  claims past capacity are dropped and counted                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both passes clear their own buffer and rebuild it on every call. The
//! sequential strategy emits items in entry, then cell, then table order;
//! the parallel strategy emits the same items in an unspecified order.

mod corner_mask;
mod export;
mod vertex_calc;

pub use export::{
  try_write_obj, try_write_stl, try_write_xyz, write_obj, write_obj_to, write_stl, write_stl_to,
  write_xyz, write_xyz_to,
};
pub use vertex_calc::{sdf_interp, CellSamples};

use glam::{IVec3, Vec3};
use smallvec::SmallVec;
use web_time::Instant;

use crate::arena::BoundedArena;
use crate::constants::{
  local_coord, DEFAULT_LOCAL_BLOCK_NUM, SDF_BLOCK_SIZE, SDF_BLOCK_SIZE3, TRIANGLES_PER_BLOCK,
  VERTICES_PER_BLOCK,
};
use crate::edge_table::{triangles_of, EDGE_TABLE};
use crate::field::{FieldStore, LocalityCache};
use crate::metrics::MeshStats;
use crate::scene::Scene;
use crate::threading::ExecutionStrategy;
use crate::types::{MinMaxAABB, Triangle};

/// Output buffer sizes of a [`Mesh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshCapacity {
  pub max_vertices: usize,
  pub max_triangles: usize,
}

impl MeshCapacity {
  /// Capacity for `block_count` resident blocks at 12 vertices and 32
  /// triangles per block.
  pub fn for_blocks(block_count: usize) -> Self {
    Self {
      max_vertices: block_count * VERTICES_PER_BLOCK,
      max_triangles: block_count * TRIANGLES_PER_BLOCK,
    }
  }

  pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
    self.max_vertices = max_vertices;
    self
  }

  pub fn with_max_triangles(mut self, max_triangles: usize) -> Self {
    self.max_triangles = max_triangles;
    self
  }
}

impl Default for MeshCapacity {
  fn default() -> Self {
    Self::for_blocks(DEFAULT_LOCAL_BLOCK_NUM)
  }
}

/// Fixed-capacity vertex and triangle buffers in metric units.
pub struct Mesh {
  vertices: BoundedArena<Vec3>,
  triangles: BoundedArena<Triangle>,
  /// Counters of the last pass.
  pub stats: MeshStats,
}

impl Mesh {
  pub fn new(capacity: MeshCapacity) -> Self {
    Self {
      vertices: BoundedArena::with_capacity(capacity.max_vertices),
      triangles: BoundedArena::with_capacity(capacity.max_triangles),
      stats: MeshStats::default(),
    }
  }

  /// Mesh holding exactly `triangles` and no vertices.
  pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
    let mesh = Self::new(MeshCapacity {
      max_vertices: 0,
      max_triangles: triangles.len(),
    });
    mesh.triangles.push_all(triangles);
    mesh
  }

  /// Mesh holding exactly `vertices` and no triangles.
  pub fn from_vertices(vertices: Vec<Vec3>) -> Self {
    let mesh = Self::new(MeshCapacity {
      max_vertices: vertices.len(),
      max_triangles: 0,
    });
    mesh.vertices.push_all(vertices);
    mesh
  }

  pub fn capacity(&self) -> MeshCapacity {
    MeshCapacity {
      max_vertices: self.vertices.capacity(),
      max_triangles: self.triangles.capacity(),
    }
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  #[inline]
  pub fn dropped_vertices(&self) -> usize {
    self.vertices.dropped()
  }

  #[inline]
  pub fn dropped_triangles(&self) -> usize {
    self.triangles.dropped()
  }

  pub fn vertices(&self) -> impl Iterator<Item = &Vec3> {
    self.vertices.iter()
  }

  pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
    self.triangles.iter()
  }

  /// Bounds of every stored vertex and triangle corner.
  pub fn bounds(&self) -> MinMaxAABB {
    let mut aabb = MinMaxAABB::empty();
    for v in self.vertices() {
      aabb.encapsulate(v.to_array());
    }
    for t in self.triangles() {
      for p in [t.p0, t.p1, t.p2] {
        aabb.encapsulate(p.to_array());
      }
    }
    aabb
  }
}

impl Default for Mesh {
  fn default() -> Self {
    Self::new(MeshCapacity::default())
  }
}

// =============================================================================
// Per-cell kernels
// =============================================================================

/// Crossings of every edge flagged for `cube_index`, in edge order, in
/// voxel units.
pub fn cell_vertices(cell: &CellSamples, cube_index: u8) -> SmallVec<[Vec3; 12]> {
  let edges = EDGE_TABLE[cube_index as usize];
  (0..12)
    .filter(|edge| edges & (1 << edge) != 0)
    .map(|edge| vertex_calc::edge_crossing(cell, edge))
    .collect()
}

/// Triangles of `cube_index` in table order, in voxel units.
pub fn cell_triangles(cell: &CellSamples, cube_index: u8) -> SmallVec<[Triangle; 5]> {
  let crossings = vertex_calc::all_crossings(cell);
  triangles_of(cube_index)
    .map(|[a, b, c]| Triangle {
      p0: crossings[a],
      p1: crossings[b],
      p2: crossings[c],
    })
    .collect()
}

/// Gather and classify one cell. `None` for incomplete or homogeneous cells.
#[inline]
fn classify<S: FieldStore + ?Sized>(
  store: &S,
  cell: IVec3,
  cache: &mut LocalityCache,
) -> Option<(CellSamples, u8)> {
  let samples = vertex_calc::gather(store, cell, cache)?;
  let cube_index = corner_mask::build(&samples.values);
  if corner_mask::is_homogeneous(cube_index) {
    return None;
  }
  Some((samples, cube_index))
}

/// Visit every mixed cell of the block behind hash entry `entry_id`.
fn for_each_cell<S, F>(store: &S, entry_id: usize, mut visit: F)
where
  S: FieldStore + ?Sized,
  F: FnMut(&CellSamples, u8),
{
  let Some(block) = store.allocated_block(entry_id) else {
    return;
  };
  let origin = block * SDF_BLOCK_SIZE;

  // local_coord walks x fastest, then y, then z
  for idx in 0..SDF_BLOCK_SIZE3 {
    let (x, y, z) = local_coord(idx);
    let mut cache = LocalityCache::new();
    if let Some((samples, cube_index)) = classify(store, origin + IVec3::new(x, y, z), &mut cache) {
      visit(&samples, cube_index);
    }
  }
}

// =============================================================================
// Passes
// =============================================================================

/// Rebuild `mesh`'s vertex buffer with every edge crossing of the scene.
/// Returns the number of vertices written.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "vertex_scene"))]
pub fn vertex_scene<S: FieldStore>(
  scene: &Scene<S>,
  mesh: &mut Mesh,
  strategy: ExecutionStrategy,
) -> usize {
  let start = Instant::now();
  let store = scene.store();
  let factor = scene.params().voxel_size;
  mesh.vertices.reset();

  let vertices = &mesh.vertices;
  strategy.for_each_index(store.entry_count(), |entry_id| {
    for_each_cell(store, entry_id, |cell, cube_index| {
      for v in cell_vertices(cell, cube_index) {
        vertices.push(v * factor);
      }
    });
  });

  let written = mesh.vertices.len();
  let dropped = mesh.vertices.dropped();
  #[cfg(feature = "tracing")]
  {
    if dropped > 0 {
      tracing::warn!(dropped, capacity = mesh.vertices.capacity(), "vertex buffer full, vertices dropped");
    }
    tracing::debug!(vertices = written, "vertex scene");
  }

  mesh.stats.vertices = written;
  mesh.stats.dropped_vertices = dropped;
  mesh.stats.elapsed_us = start.elapsed().as_micros() as u64;
  written
}

/// Rebuild `mesh`'s triangle buffer with the marching-cubes surface of the
/// scene. Returns the number of triangles written.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "mesh_scene"))]
pub fn mesh_scene<S: FieldStore>(
  scene: &Scene<S>,
  mesh: &mut Mesh,
  strategy: ExecutionStrategy,
) -> usize {
  let start = Instant::now();
  let store = scene.store();
  let factor = scene.params().voxel_size;
  mesh.triangles.reset();

  let triangles = &mesh.triangles;
  strategy.for_each_index(store.entry_count(), |entry_id| {
    for_each_cell(store, entry_id, |cell, cube_index| {
      for t in cell_triangles(cell, cube_index) {
        triangles.push(Triangle {
          p0: t.p0 * factor,
          p1: t.p1 * factor,
          p2: t.p2 * factor,
        });
      }
    });
  });

  let written = mesh.triangles.len();
  let dropped = mesh.triangles.dropped();
  #[cfg(feature = "tracing")]
  {
    if dropped > 0 {
      tracing::warn!(dropped, capacity = mesh.triangles.capacity(), "triangle buffer full, triangles dropped");
    }
    tracing::debug!(triangles = written, "mesh scene");
  }

  mesh.stats.triangles = written;
  mesh.stats.dropped_triangles = dropped;
  mesh.stats.elapsed_us = start.elapsed().as_micros() as u64;
  written
}
