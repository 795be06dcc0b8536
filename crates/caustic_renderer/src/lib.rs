//! CPU path tracer.
//!
//! Scenes of spheres, quads and boxes (plus translated instances) are built
//! through [`SceneBuilder`], committed once, and rendered by one of three
//! integrators:
//!
//! - [`render_scanlines`]: recursive scalar path tracing
//! - [`render_scanlines_sse`]: 4-wide ray packets
//! - [`render_scanlines_avx`]: 8-wide ray packets
//!
//! [`render`] picks the integrator from a [`RenderConfig`] and optionally
//! spreads scanline blocks over worker threads. The result is a
//! [`RenderData`] buffer of per-pixel sample sums, turned into PPM, PNG or
//! JPEG by the [`output`] module.

pub mod camera;
pub mod config;
pub mod geometry;
pub mod hit_info;
pub mod integrator;
pub mod material;
pub mod output;
pub mod packet;
pub mod perlin;
pub mod render_data;
pub mod sampling;
pub mod scene;
pub mod scene_file;
pub mod schedule;
pub mod texture;

pub use caustic_math::{Color, Point3, Ray, Vec3};
pub use caustic_rtc::Device;

pub use camera::Camera;
pub use config::{ConfigError, RenderConfig, Vectorization, MAX_DEPTH_LIMIT};
pub use geometry::{Cuboid, Geometry, Instance, Quad, Sphere};
pub use hit_info::HitInfo;
pub use integrator::{colorize_ray, render_scanlines, sky_color};
pub use material::{Dielectric, Emissive, Lambertian, Material, Metal, ScatterResult};
pub use output::{color_to_256, write_image, write_jpeg, write_ppm, OutputError, OutputFormat, JPEG_QUALITY};
pub use packet::{render_scanlines_avx, render_scanlines_packet, render_scanlines_sse};
pub use render_data::{RenderData, RenderSettings};
pub use scene::{Scene, SceneBuilder, SceneError};
pub use scene_file::{parse_scene_file, ParseError, ParseResult, SceneParser};
pub use schedule::{partition_scanlines, render, RenderError, ScanlineBlock};
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture, TextureError};
