//! Corner sign classification.
//!
//! The corner mask is an 8-bit value where each bit indicates whether a corner
//! of the cell lies behind the surface (negative distance).

/// Build the cube index from the 8 corner distances.
///
/// Bit `i` is set when `values[i] < 0`; zero counts as in front. Corner order
/// follows [`crate::constants::CORNER_OFFSETS`].
#[inline]
pub fn build(values: &[f32; 8]) -> u8 {
  values
    .iter()
    .enumerate()
    .fold(0u8, |mask, (i, &v)| mask | (((v < 0.0) as u8) << i))
}

/// All corners on the same side of the surface.
#[inline]
pub fn is_homogeneous(mask: u8) -> bool {
  mask == 0 || mask == 0xff
}

#[cfg(test)]
#[path = "corner_mask_test.rs"]
mod corner_mask_test;
