//! Point reads against a [`FieldStore`].
//!
//! Points are in voxel units. Missing blocks read as empty space (+1.0,
//! zero colour, no marker) and report `found == false`.

use glam::{IVec3, Vec3};

use super::{FieldStore, LocalityCache};
use crate::constants::{voxel_local_index, voxel_to_block};
use crate::types::Voxel;

/// Fetch the voxel at an integer voxel coordinate.
#[inline]
pub fn read_voxel<S: FieldStore + ?Sized>(
  store: &S,
  voxel: IVec3,
  cache: &mut LocalityCache,
) -> (Voxel, bool) {
  let block = voxel_to_block(voxel);
  match cache.resolve(store, block) {
    Some(address) => (store.voxel(address, voxel_local_index(voxel)), true),
    None => (Voxel::default(), false),
  }
}

/// Truncated distance of the nearest voxel (round half away from zero).
#[inline]
pub fn read_sdf_uninterpolated<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> (f32, bool) {
  let (voxel, found) = read_voxel(store, point.round().as_ivec3(), cache);
  (voxel.sdf_f32(), found)
}

/// Corner values of the cell containing `point`, plus the fractional offset.
///
/// Corner `i` sits at `floor(point) + (i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
#[inline]
fn gather_cell<S: FieldStore + ?Sized, T>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
  mut read: impl FnMut(&Voxel) -> T,
) -> ([T; 8], Vec3, bool)
where
  T: Copy + Default,
{
  let base = point.floor();
  let coeff = point - base;
  let base = base.as_ivec3();

  let mut values = [T::default(); 8];
  let mut any_found = false;
  for (i, value) in values.iter_mut().enumerate() {
    let offset = IVec3::new((i & 1) as i32, ((i >> 1) & 1) as i32, ((i >> 2) & 1) as i32);
    let (voxel, found) = read_voxel(store, base + offset, cache);
    any_found |= found;
    *value = read(&voxel);
  }
  (values, coeff, any_found)
}

#[inline]
fn trilinear<T>(v: [T; 8], c: Vec3) -> T
where
  T: Copy + std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
  let x00 = v[0] * (1.0 - c.x) + v[1] * c.x;
  let x10 = v[2] * (1.0 - c.x) + v[3] * c.x;
  let x01 = v[4] * (1.0 - c.x) + v[5] * c.x;
  let x11 = v[6] * (1.0 - c.x) + v[7] * c.x;
  let y0 = x00 * (1.0 - c.y) + x10 * c.y;
  let y1 = x01 * (1.0 - c.y) + x11 * c.y;
  y0 * (1.0 - c.z) + y1 * c.z
}

/// Trilinear truncated distance over the 8 voxels around `point`.
///
/// `found` is true when at least one corner lies in an allocated block;
/// unallocated corners contribute +1.0.
#[inline]
pub fn read_sdf_interpolated<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> (f32, bool) {
  let (values, coeff, found) = gather_cell(store, point, cache, Voxel::sdf_f32);
  (trilinear(values, coeff), found)
}

/// Trilinear colour in `[0, 1]` per channel. Zero for stores without colour.
pub fn read_color_interpolated<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> Vec3 {
  if !store.has_color() {
    return Vec3::ZERO;
  }
  let (values, coeff, _) = gather_cell(store, point, cache, |voxel| {
    Vec3::new(
      voxel.color[0] as f32,
      voxel.color[1] as f32,
      voxel.color[2] as f32,
    )
  });
  trilinear(values, coeff) / 255.0
}

/// Marker of the nearest voxel. Zero for stores without markers.
pub fn read_marker<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> u8 {
  if !store.has_marker() {
    return 0;
  }
  read_voxel(store, point.round().as_ivec3(), cache).0.marker
}

/// Unit surface normal from central differences of interpolated reads one
/// voxel apart. Zero where the gradient vanishes.
pub fn field_gradient_normal<S: FieldStore + ?Sized>(
  store: &S,
  point: Vec3,
  cache: &mut LocalityCache,
) -> Vec3 {
  let mut sample = |p: Vec3| read_sdf_interpolated(store, p, cache).0;
  let gradient = Vec3::new(
    sample(point + Vec3::X) - sample(point - Vec3::X),
    sample(point + Vec3::Y) - sample(point - Vec3::Y),
    sample(point + Vec3::Z) - sample(point - Vec3::Z),
  );
  gradient.normalize_or_zero()
}
