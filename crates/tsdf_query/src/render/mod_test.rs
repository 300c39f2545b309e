use glam::{IVec2, Vec2, Vec4};

use super::*;

#[test]
fn test_frame_indexing() {
  let mut frame = Frame::new(IVec2::new(4, 3), 0u32);
  assert_eq!(frame.pixels().len(), 12);
  *frame.at_mut(3, 2) = 7;
  assert_eq!(frame.index_of(3, 2), 11);
  assert_eq!(frame.pixels()[11], 7);
  assert_eq!(*frame.at(3, 2), 7);
}

#[test]
fn test_frame_negative_size_is_empty() {
  let frame = Frame::new(IVec2::new(-4, 3), 0u8);
  assert_eq!(frame.size(), IVec2::new(0, 3));
  assert!(frame.pixels().is_empty());
}

#[test]
fn test_frame_resize_only_reallocates_on_change() {
  let mut frame = Frame::new(IVec2::new(2, 2), 1u8);
  frame.fill(5);
  frame.resize(IVec2::new(2, 2), 0);
  assert_eq!(frame.pixels(), &[5; 4]);

  frame.resize(IVec2::new(3, 1), 0);
  assert_eq!(frame.size(), IVec2::new(3, 1));
  assert_eq!(frame.into_vec(), vec![0; 3]);
}

#[test]
fn test_range_image_rounds_up() {
  let range = RangeImage::for_image(IVec2::new(65, 48));
  assert_eq!(range.size(), IVec2::new(9, 6));
  assert_eq!(range.range_at_pixel(64, 47), Vec2::new(FAR_AWAY, VERY_CLOSE));
}

#[test]
fn test_range_image_uniform_and_reset() {
  let mut range = RangeImage::uniform(IVec2::new(16, 16), 0.2, 3.0);
  assert!(range.frame().pixels().iter().all(|r| *r == Vec2::new(0.2, 3.0)));

  range.reset();
  assert!(range
    .frame()
    .pixels()
    .iter()
    .all(|r| *r == Vec2::new(FAR_AWAY, VERY_CLOSE)));
}

#[test]
fn test_range_lookup_uses_eight_pixel_cells() {
  let mut range = RangeImage::for_image(IVec2::new(32, 32));
  *range.frame_mut().at_mut(1, 2) = Vec2::new(0.5, 0.6);
  assert_eq!(range.range_at_pixel(8, 16), Vec2::new(0.5, 0.6));
  assert_eq!(range.range_at_pixel(15, 23), Vec2::new(0.5, 0.6));
  assert_eq!(range.range_at_pixel(16, 23), Vec2::new(FAR_AWAY, VERY_CLOSE));
}

#[test]
fn test_render_config_builders() {
  let config = RenderConfig::new()
    .with_mode(RenderMode::Marker)
    .with_smoothing(NormalSmoothing::Smoothed)
    .with_strategy(ExecutionStrategy::Sequential);
  assert_eq!(config.mode, RenderMode::Marker);
  assert_eq!(config.smoothing, NormalSmoothing::Smoothed);
  assert_eq!(config.strategy, ExecutionStrategy::Sequential);

  let default = RenderConfig::default();
  assert_eq!(default.mode, RenderMode::Grey);
  assert_eq!(default.smoothing, NormalSmoothing::Off);
  assert_eq!(default.strategy, ExecutionStrategy::Parallel);
}

#[test]
fn test_render_state_buffers() {
  let state = RenderState::new(IVec2::new(640, 480));
  assert_eq!(state.image_size(), IVec2::new(640, 480));
  assert_eq!(state.range_image.size(), IVec2::new(80, 60));
  assert_eq!(state.raycast_result.size(), IVec2::new(640, 480));
  assert!(state.raycast_result.pixels().iter().all(|p| *p == Vec4::ZERO));
  assert_eq!(state.tiles.capacity(), MAX_RENDERING_BLOCKS);
  assert!(state.rendering_blocks().is_empty());
}
