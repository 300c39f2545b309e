use glam::Vec3;

use super::*;
use crate::types::Triangle;

fn two_triangles() -> Mesh {
  Mesh::from_triangles(vec![
    Triangle {
      p0: Vec3::new(0.0, 0.0, 0.0),
      p1: Vec3::new(1.0, 0.0, 0.0),
      p2: Vec3::new(0.0, 1.0, 0.0),
    },
    Triangle {
      p0: Vec3::new(0.5, -0.25, 2.0),
      p1: Vec3::new(1.0, 1.0, 1.0),
      p2: Vec3::new(-1.0, 0.125, 3.0),
    },
  ])
}

fn le_f32(bytes: &[u8], offset: usize) -> f32 {
  f32::from_le_bytes([
    bytes[offset],
    bytes[offset + 1],
    bytes[offset + 2],
    bytes[offset + 3],
  ])
}

#[test]
fn test_xyz_lines() {
  let mesh = Mesh::from_vertices(vec![Vec3::new(0.5, -0.25, 1.0), Vec3::new(0.1, 2.0, -0.0)]);
  let mut out = Vec::new();
  write_xyz_to(&mut out, &mesh).unwrap();
  assert_eq!(
    String::from_utf8(out).unwrap(),
    "0.500000 -0.250000 1.000000\n0.100000 2.000000 -0.000000\n"
  );
}

#[test]
fn test_obj_reverses_face_order() {
  let mut out = Vec::new();
  write_obj_to(&mut out, &two_triangles()).unwrap();
  let expected = "\
v 0.000000 0.000000 0.000000
v 1.000000 0.000000 0.000000
v 0.000000 1.000000 0.000000
v 0.500000 -0.250000 2.000000
v 1.000000 1.000000 1.000000
v -1.000000 0.125000 3.000000
f 3 2 1
f 6 5 4
";
  assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_stl_layout() {
  let mut out = Vec::new();
  write_stl_to(&mut out, &two_triangles()).unwrap();

  assert_eq!(out.len(), 80 + 4 + 2 * 50);
  assert!(out[..80].iter().all(|&b| b == b' '));
  assert_eq!(&out[80..84], &2u32.to_le_bytes());

  // Second triangle: zero normal, then p2, p1, p0, then a zero attribute
  let t = 84 + 50;
  for i in 0..3 {
    assert_eq!(le_f32(&out, t + 4 * i), 0.0);
  }
  assert_eq!(le_f32(&out, t + 12), -1.0);
  assert_eq!(le_f32(&out, t + 16), 0.125);
  assert_eq!(le_f32(&out, t + 20), 3.0);
  assert_eq!(le_f32(&out, t + 24), 1.0);
  assert_eq!(le_f32(&out, t + 36), 0.5);
  assert_eq!(le_f32(&out, t + 40), -0.25);
  assert_eq!(le_f32(&out, t + 44), 2.0);
  assert_eq!(&out[t + 48..t + 50], &[0, 0]);
}

#[test]
fn test_empty_mesh() {
  let mesh = Mesh::from_triangles(Vec::new());
  let mut stl = Vec::new();
  write_stl_to(&mut stl, &mesh).unwrap();
  assert_eq!(stl.len(), 84);

  let mut obj = Vec::new();
  write_obj_to(&mut obj, &mesh).unwrap();
  assert!(obj.is_empty());
}

#[test]
fn test_file_matches_writer() {
  let path = std::env::temp_dir().join(format!("tsdf_query_export_{}.obj", std::process::id()));
  let mesh = two_triangles();
  try_write_obj(&path, &mesh).unwrap();

  let mut expected = Vec::new();
  write_obj_to(&mut expected, &mesh).unwrap();
  assert_eq!(std::fs::read(&path).unwrap(), expected);
  let _ = std::fs::remove_file(&path);
}

#[test]
fn test_unwritable_path() {
  let path = std::env::temp_dir()
    .join("tsdf_query_missing_dir")
    .join("nested")
    .join("mesh.stl");
  let mesh = two_triangles();
  assert!(try_write_stl(&path, &mesh).is_err());
  // Swallowed
  write_stl(&path, &mesh);
  write_xyz(&path, &mesh);
  assert!(!path.exists());
}
