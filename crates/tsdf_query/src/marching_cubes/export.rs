//! Mesh file writers.
//!
//! ```text
//! xyz  one "x y z" line per vertex
//! obj  three "v" lines per triangle, then "f" lines with the corners reversed
//! stl  80 spaces, u32 count, per triangle: zero normal, p2 p1 p0, u16 zero
//! ```
//!
//! Floats are printed with six decimals. The `write_*` functions report
//! failures only through a warning; use `try_write_*` to observe them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::Mesh;

const STL_HEADER: [u8; 80] = [b' '; 80];

/// Write the vertex buffer as a point list.
pub fn write_xyz_to<W: Write>(mut writer: W, mesh: &Mesh) -> io::Result<()> {
  for v in mesh.vertices() {
    writeln!(writer, "{:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
  }
  writer.flush()
}

/// Write the triangle buffer as unshared OBJ faces.
pub fn write_obj_to<W: Write>(mut writer: W, mesh: &Mesh) -> io::Result<()> {
  for t in mesh.triangles() {
    for p in [t.p0, t.p1, t.p2] {
      writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
  }
  for i in 0..mesh.triangle_count() {
    let base = i * 3;
    writeln!(writer, "f {} {} {}", base + 3, base + 2, base + 1)?;
  }
  writer.flush()
}

/// Write the triangle buffer as binary STL.
pub fn write_stl_to<W: Write>(mut writer: W, mesh: &Mesh) -> io::Result<()> {
  writer.write_all(&STL_HEADER)?;
  writer.write_all(&(mesh.triangle_count() as u32).to_le_bytes())?;
  for t in mesh.triangles() {
    for value in [0.0f32; 3] {
      writer.write_all(&value.to_le_bytes())?;
    }
    for p in [t.p2, t.p1, t.p0] {
      for value in p.to_array() {
        writer.write_all(&value.to_le_bytes())?;
      }
    }
    writer.write_all(&0u16.to_le_bytes())?;
  }
  writer.flush()
}

fn write_file(
  path: &Path,
  mesh: &Mesh,
  encode: fn(BufWriter<File>, &Mesh) -> io::Result<()>,
) -> io::Result<()> {
  let file = File::create(path)?;
  encode(BufWriter::new(file), mesh)
}

pub fn try_write_xyz(path: impl AsRef<Path>, mesh: &Mesh) -> io::Result<()> {
  write_file(path.as_ref(), mesh, write_xyz_to)
}

pub fn try_write_obj(path: impl AsRef<Path>, mesh: &Mesh) -> io::Result<()> {
  write_file(path.as_ref(), mesh, write_obj_to)
}

pub fn try_write_stl(path: impl AsRef<Path>, mesh: &Mesh) -> io::Result<()> {
  write_file(path.as_ref(), mesh, write_stl_to)
}

fn swallow(path: &Path, result: io::Result<()>) {
  #[cfg(feature = "tracing")]
  if let Err(e) = result {
    tracing::warn!(path = %path.display(), error = %e, "mesh write failed");
  }
  #[cfg(not(feature = "tracing"))]
  let _ = (path, result);
}

/// Point list at `path`. Failures are not reported to the caller.
pub fn write_xyz(path: impl AsRef<Path>, mesh: &Mesh) {
  let path = path.as_ref();
  swallow(path, try_write_xyz(path, mesh));
}

/// OBJ faces at `path`. Failures are not reported to the caller.
pub fn write_obj(path: impl AsRef<Path>, mesh: &Mesh) {
  let path = path.as_ref();
  swallow(path, try_write_obj(path, mesh));
}

/// Binary STL at `path`. Failures are not reported to the caller.
pub fn write_stl(path: impl AsRef<Path>, mesh: &Mesh) {
  let path = path.as_ref();
  swallow(path, try_write_stl(path, mesh));
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
