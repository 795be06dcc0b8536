//! Image encoders for render results.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use caustic_math::Color;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::config::ConfigError;
use crate::render_data::RenderData;

/// JPEG output is written at full quality.
pub const JPEG_QUALITY: u8 = 100;

/// Errors that can occur while writing an image.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Supported output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain-text PPM (P3)
    #[default]
    Ppm,
    Png,
    Jpg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ppm => "ppm",
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ppm" => Ok(OutputFormat::Ppm),
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            _ => Err(ConfigError::UnknownOutputType(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Average `sum` over `samples`, gamma correct (gamma 2) and quantize.
pub fn color_to_256(sum: Color, samples: u32) -> [u8; 3] {
    let scale = 1.0 / samples.max(1) as f32;
    let channel = |c: f32| {
        let gamma = (c * scale).max(0.0).sqrt();
        (256.0 * gamma.clamp(0.0, 0.999)) as u8
    };
    [channel(sum.x), channel(sum.y), channel(sum.z)]
}

/// Convert the render to an 8-bit image, top scanline first.
pub fn to_rgb_image(data: &RenderData) -> RgbImage {
    let (width, height) = (data.width(), data.height());
    let spp = data.samples_per_pixel();

    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let j = height - 1 - y as usize;
        image::Rgb(color_to_256(data.pixel(x as usize, j), spp))
    })
}

/// Write plain-text PPM, one pixel per line.
pub fn write_ppm<W: Write>(writer: &mut W, data: &RenderData) -> Result<(), OutputError> {
    let (width, height) = (data.width(), data.height());
    let spp = data.samples_per_pixel();

    writeln!(writer, "P3\n{} {}\n255", width, height)?;
    for j in (0..height).rev() {
        for i in 0..width {
            let [r, g, b] = color_to_256(data.pixel(i, j), spp);
            writeln!(writer, "{} {} {}", r, g, b)?;
        }
    }
    Ok(())
}

/// Write a JPEG at [`JPEG_QUALITY`].
pub fn write_jpeg<W: Write>(writer: &mut W, data: &RenderData) -> Result<(), OutputError> {
    let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder.encode_image(&to_rgb_image(data))?;
    Ok(())
}

/// Encode the render to `path` in `format`.
pub fn write_image(path: impl AsRef<Path>, data: &RenderData, format: OutputFormat) -> Result<(), OutputError> {
    let path = path.as_ref();
    match format {
        OutputFormat::Ppm => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_ppm(&mut writer, data)?;
            writer.flush()?;
        }
        OutputFormat::Png => to_rgb_image(data).save_with_format(path, ImageFormat::Png)?,
        OutputFormat::Jpg => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_jpeg(&mut writer, data)?;
            writer.flush()?;
        }
    }
    log::info!("Wrote {} ({})", path.display(), format);
    Ok(())
}
