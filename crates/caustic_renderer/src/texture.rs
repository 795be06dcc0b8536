//! Procedural and image textures sampled by materials.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use caustic_math::{Color, Point3};
use rand::RngCore;
use thiserror::Error;

use crate::perlin::Perlin;

/// Environment variable naming a directory searched first for image textures.
pub const IMAGES_ENV: &str = "IMAGES";

/// Octaves summed by the marble turbulence.
const TURBULENCE_DEPTH: usize = 7;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("texture image not found: {0}")]
    NotFound(PathBuf),

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Texture variants sampled at `(u, v, p)`.
#[derive(Debug, Clone)]
pub enum Texture {
    Solid(SolidColor),
    Checker(CheckerTexture),
    Noise(NoiseTexture),
    Image(ImageTexture),
}

impl Texture {
    /// Shorthand for a constant-color texture.
    pub fn solid(color: Color) -> Self {
        Texture::Solid(SolidColor::new(color))
    }

    /// Sample the texture color.
    pub fn value(&self, u: f32, v: f32, p: Point3) -> Color {
        match self {
            Texture::Solid(t) => t.value(),
            Texture::Checker(t) => t.value(u, v, p),
            Texture::Noise(t) => t.value(p),
            Texture::Image(t) => t.value(u, v),
        }
    }
}

/// Constant color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn value(&self) -> Color {
        self.albedo
    }
}

/// 3D checkerboard alternating between two sub-textures.
///
/// The cell is chosen by the parity of `floor(x/scale) + floor(y/scale) +
/// floor(z/scale)`; even cells sample `even`.
#[derive(Debug, Clone)]
pub struct CheckerTexture {
    inv_scale: f32,
    even: Arc<Texture>,
    odd: Arc<Texture>,
}

impl CheckerTexture {
    pub fn new(scale: f32, even: Arc<Texture>, odd: Arc<Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    /// Checkerboard of two solid colors.
    pub fn from_colors(scale: f32, even: Color, odd: Color) -> Self {
        Self::new(scale, Arc::new(Texture::solid(even)), Arc::new(Texture::solid(odd)))
    }

    pub fn value(&self, u: f32, v: f32, p: Point3) -> Color {
        let cell = (p * self.inv_scale).floor();
        let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;

        if sum.rem_euclid(2) == 0 {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// Marble-like Perlin turbulence.
#[derive(Debug, Clone)]
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }

    pub fn value(&self, p: Point3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.noise.turb(self.scale * p, TURBULENCE_DEPTH);
        Color::splat(0.5 * (1.0 + phase.sin()))
    }
}

/// Nearest-pixel lookup into an 8-bit RGB image.
#[derive(Debug, Clone)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    /// Tightly packed RGB rows, top row first
    data: Vec<u8>,
}

impl ImageTexture {
    /// Wrap already decoded RGB pixels (`data.len() == width * height * 3`).
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self { width, height, data }
    }

    /// Load an image, looking in `$IMAGES` first, then at `path` itself,
    /// then relative to `base_dir`.
    pub fn open(path: impl AsRef<Path>, base_dir: Option<&Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let mut candidates = Vec::new();
        if let Some(dir) = std::env::var_os(IMAGES_ENV) {
            candidates.push(PathBuf::from(dir).join(path));
        }
        candidates.push(path.to_path_buf());
        if let Some(dir) = base_dir {
            candidates.push(dir.join(path));
        }

        let found = candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| TextureError::NotFound(path.to_path_buf()))?;

        let img = image::open(&found)?.to_rgb8();
        let (width, height) = img.dimensions();
        log::debug!("Loaded texture {} ({}x{})", found.display(), width, height);

        Ok(Self::from_rgb(width, height, img.into_raw()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample at `(u, v)`; `v = 0` is the bottom of the image.
    pub fn value(&self, u: f32, v: f32) -> Color {
        // Debugging aid for missing image data
        if self.width == 0 || self.height == 0 {
            return Color::new(0.0, 1.0, 1.0);
        }

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let i = ((u * self.width as f32) as u32).min(self.width - 1);
        let j = ((v * self.height as f32) as u32).min(self.height - 1);

        let offset = ((j * self.width + i) * 3) as usize;
        let scale = 1.0 / 255.0;
        Color::new(
            self.data[offset] as f32 * scale,
            self.data[offset + 1] as f32 * scale,
            self.data[offset + 2] as f32 * scale,
        )
    }
}
