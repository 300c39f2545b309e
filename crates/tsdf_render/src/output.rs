//! Image and mesh file output.

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;
use tsdf_query::{try_write_obj, try_write_stl, try_write_xyz, Frame, Mesh, QueryMetrics};

use crate::config::MeshFormat;

/// Convert a rendered RGBA frame into an opaque RGB image.
///
/// Grey images carry the shade in alpha too, so alpha is dropped rather
/// than composited.
pub fn to_rgb_image(frame: &Frame<[u8; 4]>) -> Result<RgbImage> {
	let (width, height) = (frame.width() as u32, frame.height() as u32);
	let raw: Vec<u8> = frame
		.pixels()
		.iter()
		.flat_map(|[r, g, b, _]| [*r, *g, *b])
		.collect();
	RgbImage::from_raw(width, height, raw)
		.with_context(|| format!("Frame buffer does not match {}x{}", width, height))
}

/// Save a rendered frame as PNG.
pub fn save_png(frame: &Frame<[u8; 4]>, path: &Path) -> Result<()> {
	to_rgb_image(frame)?
		.save(path)
		.with_context(|| format!("Failed to write: {}", path.display()))
}

/// Write `mesh` in `format` to `path`.
pub fn save_mesh(mesh: &Mesh, format: MeshFormat, path: &Path) -> Result<()> {
	let written = match format {
		MeshFormat::Xyz => try_write_xyz(path, mesh),
		MeshFormat::Obj => try_write_obj(path, mesh),
		MeshFormat::Stl => try_write_stl(path, mesh),
	};
	written.with_context(|| format!("Failed to write: {}", path.display()))
}

/// Log a summary of the recorded passes.
pub fn log_metrics(metrics: &QueryMetrics) {
	let render = &metrics.last_render;
	log::info!(
		"render: {} frames, avg {:.0}us, {} visible blocks, {} tiles, {} found pixels",
		metrics.total_frames,
		metrics.avg_render_timing_us(),
		render.visible_blocks,
		render.rendering_tiles,
		render.found_pixels
	);
	let mesh = &metrics.last_mesh;
	if metrics.mesh_timings.last().is_some() {
		log::info!(
			"mesh: {} vertices, {} triangles, avg {:.0}us",
			mesh.vertices,
			mesh.triangles,
			metrics.avg_mesh_timing_us()
		);
	}
	if metrics.total_dropped > 0 {
		log::warn!("{} output items dropped on full buffers", metrics.total_dropped);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tsdf_query::IVec2;

	#[test]
	fn test_rgb_conversion_drops_alpha() {
		let mut frame = Frame::new(IVec2::new(2, 1), [0u8; 4]);
		*frame.at_mut(1, 0) = [10, 20, 30, 40];
		let image = to_rgb_image(&frame).unwrap();
		assert_eq!(image.dimensions(), (2, 1));
		assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
		assert_eq!(image.get_pixel(1, 0).0, [10, 20, 30]);
	}

	#[test]
	fn test_save_mesh_reports_bad_path() {
		let mesh = Mesh::from_triangles(Vec::new());
		let path = Path::new("/nonexistent-dir/mesh.obj");
		let err = save_mesh(&mesh, MeshFormat::Obj, path).unwrap_err();
		assert!(err.to_string().contains("mesh.obj"));
	}
}
