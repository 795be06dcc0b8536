//! Accumulation buffer and progress state of one render.

use std::sync::atomic::{AtomicUsize, Ordering};

use caustic_math::Color;

use crate::config::RenderConfig;

/// Per-render settings the integrators read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub image_width: usize,
    pub image_height: usize,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub seed: u64,
}

impl From<&RenderConfig> for RenderSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            image_width: config.image_width,
            image_height: config.image_height,
            samples_per_pixel: config.samples_per_pixel,
            max_depth: config.max_depth,
            seed: config.seed,
        }
    }
}

/// Output of a render.
///
/// `buffer[j * width + i]` holds the sum (not the average) of all samples of
/// pixel `(i, j)`; `j = 0` is the bottom row.
#[derive(Debug)]
pub struct RenderData {
    settings: RenderSettings,
    buffer: Vec<Color>,
    completed_lines: AtomicUsize,
}

impl RenderData {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            buffer: vec![Color::ZERO; settings.image_width * settings.image_height],
            settings,
            completed_lines: AtomicUsize::new(0),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn width(&self) -> usize {
        self.settings.image_width
    }

    pub fn height(&self) -> usize {
        self.settings.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.settings.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.settings.max_depth
    }

    /// Summed color of pixel `(i, j)`.
    pub fn pixel(&self, i: usize, j: usize) -> Color {
        self.buffer[j * self.settings.image_width + i]
    }

    pub fn buffer(&self) -> &[Color] {
        &self.buffer
    }

    /// Scanlines finished so far.
    pub fn completed_lines(&self) -> usize {
        self.completed_lines.load(Ordering::Relaxed)
    }

    /// Mutable buffer together with the shared progress counter, for
    /// splitting among workers.
    pub(crate) fn targets(&mut self) -> (&mut [Color], &AtomicUsize) {
        (self.buffer.as_mut_slice(), &self.completed_lines)
    }
}
