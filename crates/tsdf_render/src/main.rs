//! TSDF scene renderer.
//!
//! Builds a sparse voxel-block TSDF from analytic primitives, ray casts it
//! from a virtual camera and extracts its marching-cubes surface.
//!
//! Outputs, per the config:
//! - `<mode>.png`: grey / color / normal / marker ray-cast images, and
//!   `forward.png` shaded from point-map normals
//! - `vertices.xyz`, `mesh.obj`, `mesh.stl`: marching-cubes output
//! - `points.xyz`: the camera's point cloud

mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tsdf_query::{
	create_expected_depths, create_point_cloud, fill_scene, forward_render, mesh_scene, raycast,
	render_image, vertex_scene, BoundedArena, ExecutionStrategy, Frame, IVec2, Mesh, MeshCapacity,
	PointSample, QueryMetrics, RenderConfig, RenderState, Scene, Vec3, VoxelBlockHash,
};

use config::{Config, MeshFormat};

/// Sparse TSDF renderer and mesher.
#[derive(Parser, Debug)]
#[command(name = "render_tsdf")]
#[command(about = "Ray casts and meshes a synthetic TSDF scene")]
struct Args {
	/// Path to scene TOML file.
	#[arg(short, long)]
	config: PathBuf,

	/// Output directory (default: `output_dir` relative to the config file).
	#[arg(short, long)]
	output_dir: Option<PathBuf>,

	/// Run every pass on the calling thread.
	#[arg(long)]
	sequential: bool,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	log::info!("Loading config from: {}", args.config.display());
	let config = Config::load(&args.config)?;

	let output_dir = args.output_dir.unwrap_or_else(|| {
		args.config
			.parent()
			.unwrap_or(Path::new("."))
			.join(&config.output_dir)
	});
	std::fs::create_dir_all(&output_dir)
		.with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;

	let strategy = if args.sequential {
		ExecutionStrategy::Sequential
	} else {
		ExecutionStrategy::Parallel
	};

	// Build the volume
	let params = config.scene_params();
	let mut hash = VoxelBlockHash::new(config.hash_config()).context("Creating voxel block hash")?;
	let blocks = fill_scene(
		&mut hash,
		&config.sampler(),
		&params,
		Vec3::from(config.scene.bounds_min),
		Vec3::from(config.scene.bounds_max),
	)
	.context("Filling scene")?;
	let scene = Scene::new(hash, params).context("Creating scene")?;
	log::info!(
		"Filled {} blocks from {} primitives ({:?}, {} threads)",
		blocks,
		config.primitives.len(),
		strategy,
		strategy.num_threads()
	);

	let mut metrics = QueryMetrics::new();
	render_images(&config, &scene, strategy, &output_dir, &mut metrics)?;
	write_meshes(&config, &scene, blocks, strategy, &output_dir, &mut metrics)?;
	output::log_metrics(&metrics);

	log::info!("Done! Output written to: {}", output_dir.display());
	Ok(())
}

/// Ray cast once and shade every requested mode from the same hits.
fn render_images(
	config: &Config,
	scene: &Scene<VoxelBlockHash>,
	strategy: ExecutionStrategy,
	output_dir: &Path,
	metrics: &mut QueryMetrics,
) -> Result<()> {
	let size = IVec2::new(config.camera.width as i32, config.camera.height as i32);
	let intrinsics = config.intrinsics();
	let pose = config.pose();
	let mut state = RenderState::new(size);

	create_expected_depths(scene, &pose, &intrinsics, &mut state, strategy);
	let found = raycast(scene, &pose, &intrinsics, &mut state, strategy);
	log::info!("Ray cast {}x{}: {} pixels hit the surface", size.x, size.y, found);

	let mut image = Frame::new(size, [0u8; 4]);
	for &mode in &config.render_modes {
		let render_config = RenderConfig::new()
			.with_smoothing(config.smoothing())
			.with_strategy(strategy);
		let lit = match mode.render_mode() {
			Some(render_mode) => render_image(
				scene,
				&pose,
				&mut state,
				&render_config.with_mode(render_mode),
				&mut image,
			),
			None => forward_render(scene, &pose, &mut state, &render_config, &mut image),
		};

		let path = output_dir.join(mode.file_name());
		output::save_png(&image, &path)?;
		log::info!("  ✓ {} ({} lit pixels)", mode.file_name(), lit);
	}
	metrics.record_render(&state.stats);

	if config.point_cloud {
		let mut points = BoundedArena::<PointSample>::with_capacity(image.pixels().len());
		create_point_cloud(scene, &pose, &intrinsics, &mut state, &mut points, false, strategy);
		let cloud = Mesh::from_vertices(points.iter().map(|p| p.location.truncate()).collect());
		output::save_mesh(&cloud, MeshFormat::Xyz, &output_dir.join("points.xyz"))?;
		log::info!("  ✓ points.xyz ({} points)", cloud.vertex_count());
	}

	Ok(())
}

/// Run the vertex and triangle passes needed by the requested formats.
fn write_meshes(
	config: &Config,
	scene: &Scene<VoxelBlockHash>,
	blocks: usize,
	strategy: ExecutionStrategy,
	output_dir: &Path,
	metrics: &mut QueryMetrics,
) -> Result<()> {
	if config.mesh_formats.is_empty() {
		return Ok(());
	}

	let mut mesh = Mesh::new(MeshCapacity::for_blocks(blocks));
	if config.mesh_formats.contains(&MeshFormat::Xyz) {
		vertex_scene(scene, &mut mesh, strategy);
		metrics.record_mesh(&mesh.stats);
	}
	if config
		.mesh_formats
		.iter()
		.any(|f| matches!(f, MeshFormat::Obj | MeshFormat::Stl))
	{
		mesh_scene(scene, &mut mesh, strategy);
		metrics.record_mesh(&mesh.stats);
	}

	for &format in &config.mesh_formats {
		let path = output_dir.join(format.file_name());
		output::save_mesh(&mesh, format, &path)?;
		log::info!("  ✓ {}", format.file_name());
	}

	Ok(())
}
