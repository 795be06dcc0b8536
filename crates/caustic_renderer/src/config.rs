//! Render configuration.

use thiserror::Error;

/// Hard ceiling on recursion depth; the scalar integrator recurses once per
/// bounce on the call stack.
pub const MAX_DEPTH_LIMIT: u32 = 512;

/// Errors detected before any rendering starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid vectorization width {0}; expected 0, 4, 8 or 16")]
    InvalidVectorization(u32),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("max depth {depth} exceeds the limit of {limit}")]
    DepthLimit { depth: u32, limit: u32 },

    #[error("unknown output type '{0}'; expected ppm, png or jpg")]
    UnknownOutputType(String),
}

/// Integration strategy, selected by SIMD width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vectorization {
    /// Scalar recursive integrator
    #[default]
    None,
    /// 4-wide packets
    Sse,
    /// 8-wide packets
    Avx,
    /// Requested 16-wide; currently traced with 8-wide packets
    Avx512,
}

impl Vectorization {
    /// Width as given on the command line.
    pub fn width(self) -> u32 {
        match self {
            Vectorization::None => 0,
            Vectorization::Sse => 4,
            Vectorization::Avx => 8,
            Vectorization::Avx512 => 16,
        }
    }

    /// Packet width actually traced (`1` for the scalar path).
    pub fn packet_width(self) -> usize {
        match self {
            Vectorization::None => 1,
            Vectorization::Sse => 4,
            Vectorization::Avx | Vectorization::Avx512 => 8,
        }
    }
}

impl TryFrom<u32> for Vectorization {
    type Error = ConfigError;

    fn try_from(width: u32) -> Result<Self, Self::Error> {
        match width {
            0 => Ok(Vectorization::None),
            4 => Ok(Vectorization::Sse),
            8 => Ok(Vectorization::Avx),
            16 => Ok(Vectorization::Avx512),
            other => Err(ConfigError::InvalidVectorization(other)),
        }
    }
}

/// User-facing render settings, immutable once validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub image_width: usize,
    pub image_height: usize,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub multithreading: bool,
    /// Worker count; `None` uses the hardware concurrency minus one
    pub threads: Option<usize>,
    pub vectorization: Vectorization,
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_width: 1200,
            image_height: 675,
            samples_per_pixel: 50,
            max_depth: 50,
            multithreading: false,
            threads: None,
            vectorization: Vectorization::None,
            seed: 0,
        }
    }
}

impl RenderConfig {
    /// Check every setting; rendering never starts with an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_width == 0 {
            return Err(ConfigError::NonPositive("image width"));
        }
        if self.image_height == 0 {
            return Err(ConfigError::NonPositive("image height"));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::NonPositive("samples per pixel"));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::NonPositive("max depth"));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::DepthLimit {
                depth: self.max_depth,
                limit: MAX_DEPTH_LIMIT,
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::NonPositive("thread count"));
        }
        Ok(())
    }

    /// Worker threads a multithreaded render uses.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1)
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.image_width as f32 / self.image_height as f32
    }
}
