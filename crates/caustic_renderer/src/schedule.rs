//! Scanline partitioning and render dispatch.

use std::ops::Range;
use std::sync::atomic::AtomicUsize;
use std::time::Instant;

use caustic_math::Color;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::{ConfigError, RenderConfig, Vectorization};
use crate::integrator::render_scanlines;
use crate::packet::{render_scanlines_avx, render_scanlines_sse};
use crate::render_data::{RenderData, RenderSettings};
use crate::scene::Scene;

/// Errors that abort a render before it starts.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Contiguous range of image rows rendered by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanlineBlock {
    /// Lowest row index of the block
    pub start_line: usize,
    /// Number of rows
    pub lines: usize,
}

impl ScanlineBlock {
    pub fn new(start_line: usize, lines: usize) -> Self {
        Self { start_line, lines }
    }

    /// Row indices covered, ascending.
    pub fn rows(&self) -> Range<usize> {
        self.start_line..self.start_line + self.lines
    }
}

/// Signature shared by the scalar and packet integrators.
pub type ScanlineFn = fn(ScanlineBlock, &Scene, &RenderSettings, &mut [Color], &AtomicUsize);

/// Split `height` rows among `threads` workers.
///
/// Every block gets `height / threads` rows and the last one also takes the
/// `height % threads` remainder, so the blocks tile the image exactly once.
/// The remainder is deliberately folded into the last block instead of
/// running on an extra worker: exactly `threads` workers run, and 800 rows on
/// 3 threads split as 266/266/268.
pub fn partition_scanlines(height: usize, threads: usize) -> Vec<ScanlineBlock> {
    let threads = threads.clamp(1, height.max(1));
    let lines_per_thread = height / threads;

    (0..threads)
        .map(|t| {
            let start_line = t * lines_per_thread;
            let lines = if t + 1 == threads {
                height - start_line
            } else {
                lines_per_thread
            };
            ScanlineBlock::new(start_line, lines)
        })
        .collect()
}

/// Integrator for the configured vectorization width.
pub fn select_strategy(vectorization: Vectorization) -> ScanlineFn {
    match vectorization {
        Vectorization::None => render_scanlines,
        Vectorization::Sse => render_scanlines_sse,
        Vectorization::Avx => render_scanlines_avx,
        Vectorization::Avx512 => {
            log::warn!("16-wide vectorization is not available; using 8-wide packets");
            render_scanlines_avx
        }
    }
}

/// Render `scene` according to `config`.
///
/// Without multithreading one call covers every scanline. Otherwise each
/// block runs on its own worker of a pool created for this render, writing
/// to its own disjoint slice of the buffer.
pub fn render(scene: &Scene, config: &RenderConfig) -> Result<RenderData, RenderError> {
    config.validate()?;

    let settings = RenderSettings::from(config);
    let mut data = RenderData::new(settings);
    let strategy = select_strategy(config.vectorization);
    let start = Instant::now();

    let (buffer, progress) = data.targets();
    if config.multithreading {
        let blocks = partition_scanlines(settings.image_height, config.thread_count());
        log::info!(
            "Rendering {}x{} at {} spp with {} threads, vectorization {} ({} rays per query)",
            settings.image_width,
            settings.image_height,
            settings.samples_per_pixel,
            blocks.len(),
            config.vectorization.width(),
            config.vectorization.packet_width()
        );
        for block in &blocks {
            log::debug!("Block rows {}..{}", block.start_line, block.start_line + block.lines);
        }

        let jobs = split_rows(buffer, &blocks, settings.image_width);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(blocks.len())
            .thread_name(|i| format!("caustic-scanlines-{}", i))
            .build()?;
        pool.install(|| {
            jobs.into_par_iter()
                .for_each(|(block, rows)| strategy(block, scene, &settings, rows, progress));
        });
    } else {
        log::info!(
            "Rendering {}x{} at {} spp on one thread, vectorization {} ({} rays per query)",
            settings.image_width,
            settings.image_height,
            settings.samples_per_pixel,
            config.vectorization.width(),
            config.vectorization.packet_width()
        );
        let block = ScanlineBlock::new(0, settings.image_height);
        strategy(block, scene, &settings, buffer, progress);
    }

    log::info!("Render finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(data)
}

/// Carve the buffer into one mutable slice per block.
fn split_rows<'a>(
    mut buffer: &'a mut [Color],
    blocks: &[ScanlineBlock],
    width: usize,
) -> Vec<(ScanlineBlock, &'a mut [Color])> {
    let mut jobs = Vec::with_capacity(blocks.len());
    for block in blocks {
        let (rows, rest) = std::mem::take(&mut buffer).split_at_mut(block.lines * width);
        jobs.push((*block, rows));
        buffer = rest;
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::tests::mixed_scene;

    fn small_config() -> RenderConfig {
        RenderConfig {
            image_width: 8,
            image_height: 6,
            samples_per_pixel: 2,
            max_depth: 5,
            seed: 17,
            ..Default::default()
        }
    }

    #[test]
    fn test_partition_with_remainder() {
        let blocks = partition_scanlines(800, 3);
        let sizes: Vec<usize> = blocks.iter().map(|b| b.lines).collect();

        assert_eq!(sizes, vec![266, 266, 268]);
        assert_eq!(sizes.iter().sum::<usize>(), 800);

        // Contiguous, no row rendered twice
        let mut next = 0;
        for block in &blocks {
            assert_eq!(block.start_line, next);
            next += block.lines;
        }
        assert_eq!(next, 800);

        // Remainder joins the last block; no extra worker
        let sizes: Vec<usize> = partition_scanlines(10, 4).iter().map(|b| b.lines).collect();
        assert_eq!(sizes, vec![2, 2, 2, 4]);
    }

    #[test]
    fn test_partition_edge_cases() {
        assert_eq!(partition_scanlines(10, 1), vec![ScanlineBlock::new(0, 10)]);
        assert_eq!(partition_scanlines(9, 3).len(), 3);

        // More threads than rows: one row each
        let blocks = partition_scanlines(2, 8);
        assert_eq!(blocks, vec![ScanlineBlock::new(0, 1), ScanlineBlock::new(1, 1)]);
    }

    #[test]
    fn test_split_rows_is_disjoint() {
        let mut buffer = vec![Color::ZERO; 4 * 5];
        let blocks = partition_scanlines(5, 2);
        let jobs = split_rows(&mut buffer, &blocks, 4);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].1.len(), 8);
        assert_eq!(jobs[1].1.len(), 12);
    }

    #[test]
    fn test_render_rejects_invalid_config() {
        let scene = mixed_scene();
        let config = RenderConfig {
            max_depth: 0,
            ..small_config()
        };
        assert!(matches!(render(&scene, &config), Err(RenderError::Config(_))));
    }

    #[test]
    fn test_threaded_render_matches_single_thread() {
        let _ = env_logger::builder().is_test(true).try_init();
        let scene = mixed_scene();

        let single = render(&scene, &small_config()).unwrap();
        let threaded = render(
            &scene,
            &RenderConfig {
                multithreading: true,
                threads: Some(3),
                ..small_config()
            },
        )
        .unwrap();

        assert_eq!(single.buffer(), threaded.buffer());
        assert_eq!(single.completed_lines(), 6);
        assert_eq!(threaded.completed_lines(), 6);
    }

    #[test]
    fn test_every_strategy_fills_the_image() {
        let scene = mixed_scene();
        for width in [0, 4, 8, 16] {
            let config = RenderConfig {
                vectorization: Vectorization::try_from(width).unwrap(),
                multithreading: width == 8,
                threads: Some(2),
                ..small_config()
            };
            let data = render(&scene, &config).unwrap();

            assert_eq!(data.completed_lines(), 6);
            assert!(data.buffer().iter().all(|c| c.is_finite() && c.min_element() >= 0.0));
            assert!(data.buffer().iter().any(|c| c.max_element() > 0.0));
        }
    }
}
