//! Scene description parsing for the TSDF renderer.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tsdf_query::{
	BoxSampler, CameraIntrinsics, CameraPose, HashConfig, NormalSmoothing, PlaneSampler, RenderMode,
	SceneParams, SphereSampler, UnionSampler, Vec3,
};

/// Root configuration of one render job.
#[derive(Debug, Deserialize)]
pub struct Config {
	/// Output directory, relative to the config file unless overridden.
	#[serde(default = "default_output_dir")]
	pub output_dir: String,
	/// Volume parameters and allocation bounds.
	#[serde(default)]
	pub scene: SceneConfig,
	/// Virtual camera.
	#[serde(default)]
	pub camera: CameraConfig,
	/// Surfaces written into the volume.
	pub primitives: Vec<PrimitiveConfig>,
	/// Images to render, one PNG each.
	#[serde(default = "default_render_modes")]
	pub render_modes: Vec<ModeName>,
	/// Image-space normal smoothing for the forward render.
	#[serde(default)]
	pub smoothing: SmoothingName,
	/// Mesh files to write.
	#[serde(default)]
	pub mesh_formats: Vec<MeshFormat>,
	/// Also write the camera's point cloud as `points.xyz`.
	#[serde(default)]
	pub point_cloud: bool,
}

/// Volume parameters.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
	/// Voxel edge length in metres.
	pub voxel_size: f32,
	/// Truncation band in metres.
	pub mu: f32,
	/// Near clip in metres.
	pub near: f32,
	/// Far clip in metres.
	pub far: f32,
	/// Minimum corner of the filled region in metres.
	pub bounds_min: [f32; 3],
	/// Maximum corner of the filled region in metres.
	pub bounds_max: [f32; 3],
	/// Voxel block pool size.
	pub block_pool_size: usize,
}

impl Default for SceneConfig {
	fn default() -> Self {
		let params = SceneParams::default();
		Self {
			voxel_size: params.voxel_size,
			mu: params.mu,
			near: params.view_frustum_min,
			far: params.view_frustum_max,
			bounds_min: [-0.5; 3],
			bounds_max: [0.5; 3],
			block_pool_size: HashConfig::default().block_pool_size,
		}
	}
}

/// Pinhole camera placed with a look-at.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
	pub width: u32,
	pub height: u32,
	/// Focal lengths in pixels. Defaults to the image width.
	pub fx: Option<f32>,
	pub fy: Option<f32>,
	/// Principal point in pixels. Defaults to the image centre.
	pub cx: Option<f32>,
	pub cy: Option<f32>,
	pub position: [f32; 3],
	pub look_at: [f32; 3],
	pub up: [f32; 3],
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			width: 640,
			height: 480,
			fx: None,
			fy: None,
			cx: None,
			cy: None,
			position: [0.0, 0.0, -1.0],
			look_at: [0.0; 3],
			up: [0.0, 1.0, 0.0],
		}
	}
}

/// One analytic surface.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveConfig {
	Sphere {
		center: [f32; 3],
		radius: f32,
		color: Option<[u8; 3]>,
	},
	Plane {
		normal: [f32; 3],
		offset: f32,
		color: Option<[u8; 3]>,
	},
	Box {
		center: [f32; 3],
		half_extents: [f32; 3],
		color: Option<[u8; 3]>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeName {
	Grey,
	Color,
	Normal,
	Marker,
	/// Grey shading from point-map normals.
	Forward,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingName {
	#[default]
	Off,
	Smoothed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshFormat {
	Xyz,
	Obj,
	Stl,
}

fn default_output_dir() -> String {
	"out".to_string()
}

fn default_render_modes() -> Vec<ModeName> {
	vec![ModeName::Grey]
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	/// Parse and validate configuration text.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).with_context(|| "Failed to parse config TOML")?;

		if config.primitives.is_empty() {
			anyhow::bail!("Config must have at least one primitive");
		}
		if config.camera.width == 0 || config.camera.height == 0 {
			anyhow::bail!(
				"Image size must be non-zero, got {}x{}",
				config.camera.width,
				config.camera.height
			);
		}
		let (min, max) = (config.scene.bounds_min, config.scene.bounds_max);
		if (0..3).any(|i| min[i] >= max[i]) {
			anyhow::bail!("bounds_min {:?} must be below bounds_max {:?}", min, max);
		}
		config
			.scene_params()
			.validate()
			.with_context(|| "Invalid scene parameters")?;

		Ok(config)
	}

	pub fn scene_params(&self) -> SceneParams {
		SceneParams::new()
			.with_voxel_size(self.scene.voxel_size)
			.with_mu(self.scene.mu)
			.with_view_frustum(self.scene.near, self.scene.far)
	}

	pub fn hash_config(&self) -> HashConfig {
		HashConfig::new()
			.with_block_pool_size(self.scene.block_pool_size)
			.with_color(self.has_color())
			.with_marker(self.render_modes.contains(&ModeName::Marker))
	}

	/// Colour storage is enabled when any primitive carries a colour.
	pub fn has_color(&self) -> bool {
		self.primitives.iter().any(|p| p.color().is_some())
	}

	/// Union of every primitive's sampler.
	pub fn sampler(&self) -> UnionSampler {
		let mut union = UnionSampler::new();
		for primitive in &self.primitives {
			union = primitive.add_to(union);
		}
		union
	}

	pub fn intrinsics(&self) -> CameraIntrinsics {
		let camera = &self.camera;
		let (w, h) = (camera.width as f32, camera.height as f32);
		CameraIntrinsics::new(
			camera.fx.unwrap_or(w),
			camera.fy.unwrap_or(w),
			camera.cx.unwrap_or((w - 1.0) * 0.5),
			camera.cy.unwrap_or((h - 1.0) * 0.5),
		)
	}

	pub fn pose(&self) -> CameraPose {
		CameraPose::look_at(
			Vec3::from(self.camera.position),
			Vec3::from(self.camera.look_at),
			Vec3::from(self.camera.up),
		)
	}

	pub fn smoothing(&self) -> NormalSmoothing {
		match self.smoothing {
			SmoothingName::Off => NormalSmoothing::Off,
			SmoothingName::Smoothed => NormalSmoothing::Smoothed,
		}
	}
}

impl PrimitiveConfig {
	pub fn color(&self) -> Option<[u8; 3]> {
		match self {
			PrimitiveConfig::Sphere { color, .. }
			| PrimitiveConfig::Plane { color, .. }
			| PrimitiveConfig::Box { color, .. } => *color,
		}
	}

	fn add_to(&self, union: UnionSampler) -> UnionSampler {
		let color = self.color().unwrap_or([255; 3]);
		match *self {
			PrimitiveConfig::Sphere { center, radius, .. } => union.with(
				SphereSampler::new(radius)
					.with_center(Vec3::from(center))
					.with_color(color),
			),
			PrimitiveConfig::Plane { normal, offset, .. } => {
				union.with(PlaneSampler::new(Vec3::from(normal), offset).with_color(color))
			}
			PrimitiveConfig::Box {
				center,
				half_extents,
				..
			} => union.with(
				BoxSampler::new(Vec3::from(half_extents))
					.with_center(Vec3::from(center))
					.with_color(color),
			),
		}
	}
}

impl ModeName {
	/// Shading mode of the ray-cast image, `None` for the forward render.
	pub fn render_mode(self) -> Option<RenderMode> {
		match self {
			ModeName::Grey => Some(RenderMode::Grey),
			ModeName::Color => Some(RenderMode::Color),
			ModeName::Normal => Some(RenderMode::Normal),
			ModeName::Marker => Some(RenderMode::Marker),
			ModeName::Forward => None,
		}
	}

	pub fn file_name(self) -> &'static str {
		match self {
			ModeName::Grey => "grey.png",
			ModeName::Color => "color.png",
			ModeName::Normal => "normal.png",
			ModeName::Marker => "marker.png",
			ModeName::Forward => "forward.png",
		}
	}
}

impl MeshFormat {
	pub fn file_name(self) -> &'static str {
		match self {
			MeshFormat::Xyz => "vertices.xyz",
			MeshFormat::Obj => "mesh.obj",
			MeshFormat::Stl => "mesh.stl",
		}
	}
}
