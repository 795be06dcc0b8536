//! caustic - render a scene description to an image.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use caustic_renderer::{
    parse_scene_file, render, write_image, Device, OutputFormat, RenderConfig, Vectorization,
};
use clap::Parser;

/// Output path used when `-o` is not given; its extension follows `--type`.
const DEFAULT_OUTPUT: &str = "image.ppm";

#[derive(Parser, Debug)]
#[command(name = "caustic", version, disable_version_flag = true)]
#[command(about = "Path trace a scene description into an image", long_about = None)]
struct Args {
    /// Number of samples per pixel
    #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    samples: u32,

    /// Maximum recursion depth for rays
    #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    depth: u32,

    /// Scene description to render
    #[arg(short, long, default_value = "scene.csr")]
    input: PathBuf,

    /// Path of the rendered image
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Output resolution
    #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [1200, 675])]
    resolution: Vec<usize>,

    /// Output image type [ppm|png|jpg]
    #[arg(short = 't', long = "type", default_value = "ppm")]
    output_type: OutputFormat,

    /// Render scanline blocks on worker threads
    #[arg(short, long)]
    multithreading: bool,

    /// Worker threads when multithreading; -1 or omitted uses available cores minus one
    #[arg(
        short = 'T',
        long,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i64).range(-1..)
    )]
    threads: Option<i64>,

    /// SIMD packet width [0|4|8|16]; 0 traces rays one at a time
    #[arg(long, default_value_t = 0)]
    vectorization: u32,

    /// Seed for sampling and procedural textures
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Log scene and render details
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let vectorization = Vectorization::try_from(self.vectorization)?;
        let (image_width, image_height) = match self.resolution[..] {
            [w, h] => (w, h),
            _ => anyhow::bail!("--resolution takes exactly WIDTH and HEIGHT"),
        };

        let config = RenderConfig {
            image_width,
            image_height,
            samples_per_pixel: self.samples,
            max_depth: self.depth,
            multithreading: self.multithreading,
            threads: self.thread_count(),
            vectorization,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// `-1` asks for the automatic count, like leaving `-T` out.
    fn thread_count(&self) -> Option<usize> {
        match self.threads {
            None | Some(-1) => None,
            Some(n) => usize::try_from(n).ok(),
        }
    }

    /// The `-o` path, or the default name with the extension of `--type`.
    fn output_path(&self) -> PathBuf {
        if self.output == Path::new(DEFAULT_OUTPUT) {
            self.output.with_extension(self.output_type.extension())
        } else {
            self.output.clone()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let config = args.render_config().context("invalid arguments")?;

    let device = Device::new();
    let builder = parse_scene_file(&args.input, &device, config.seed)
        .with_context(|| format!("failed to load scene {}", args.input.display()))?;
    let scene = builder.commit().context("failed to commit scene")?;

    let start = Instant::now();
    let data = render(&scene, &config).context("render failed")?;
    let elapsed = start.elapsed().as_secs_f32();

    let output = args.output_path();
    write_image(&output, &data, args.output_type)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log_render_info(&args, &config, elapsed);
    Ok(())
}

fn log_render_info(args: &Args, config: &RenderConfig, seconds: f32) {
    log::info!("======== {} ========", args.input.display());
    log::info!("Samples: {}", config.samples_per_pixel);
    log::info!("Depth: {}", config.max_depth);
    log::info!("Time: {:.3} seconds", seconds);
    log::info!("Multithreading: {}", if config.multithreading { "YES" } else { "NO" });
    match config.vectorization {
        Vectorization::None => log::info!("Vectorization: NONE"),
        v => log::info!("Vectorization: {}", v.width()),
    }
}
