//! Packet path tracers.
//!
//! Each sample of a scanline queues one camera ray per pixel and keeps `N`
//! of them in flight. Every round traces all active lanes in one backend
//! call; a lane whose path ends (miss, absorption or depth cutoff) retires
//! its pixel and immediately takes the next queued pixel, so lanes stay busy
//! until the queue drains.
//!
//! The path of each pixel sample draws from the same generator stream and
//! composes emission and attenuation in the same bounce order as
//! [`colorize_ray`](crate::integrator::colorize_ray), so both integrators
//! agree on every pixel.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;

use caustic_math::{Color, Ray};
use caustic_rtc::{LaneMask, RayHit, RayHitN};
use rand_chacha::ChaCha8Rng;

use crate::integrator::{primary_ray, report_progress, sky_color};
use crate::render_data::RenderSettings;
use crate::sampling::pixel_rng;
use crate::scene::{Scene, HIT_WINDOW};
use crate::schedule::ScanlineBlock;

/// In-flight state of one lane.
struct LaneState {
    /// Column of the pixel this lane is tracing
    pixel: usize,
    /// Bounces completed so far
    depth: u32,
    ray: Ray,
    rng: ChaCha8Rng,
}

/// What a lane does after one round.
enum LaneStep {
    Continue,
    Retire,
}

/// Per-pixel accumulators of one scanline.
struct ScanlineBuffers {
    /// Radiance of the current sample's path
    temp: Vec<Color>,
    /// Product of attenuations along the current path
    attenuation: Vec<Color>,
    /// Sum over completed samples
    full: Vec<Color>,
}

impl ScanlineBuffers {
    fn new(width: usize) -> Self {
        Self {
            temp: vec![Color::ZERO; width],
            attenuation: vec![Color::ONE; width],
            full: vec![Color::ZERO; width],
        }
    }

    /// Add light reaching the path at `depth`.
    fn accumulate(&mut self, pixel: usize, depth: u32, radiance: Color) {
        if depth == 0 {
            self.temp[pixel] = radiance;
        } else {
            self.temp[pixel] += self.attenuation[pixel] * radiance;
        }
    }
}

/// Render `block` with 4-wide packets.
pub fn render_scanlines_sse(
    block: ScanlineBlock,
    scene: &Scene,
    settings: &RenderSettings,
    rows: &mut [Color],
    progress: &AtomicUsize,
) {
    render_scanlines_packet::<4>(block, scene, settings, rows, progress);
}

/// Render `block` with 8-wide packets.
pub fn render_scanlines_avx(
    block: ScanlineBlock,
    scene: &Scene,
    settings: &RenderSettings,
    rows: &mut [Color],
    progress: &AtomicUsize,
) {
    render_scanlines_packet::<8>(block, scene, settings, rows, progress);
}

/// Render `block` keeping `N` rays in flight per backend query.
///
/// Each scanline's slice of `rows` is overwritten with the sum over all
/// samples; a call always covers every sample of its rows.
pub fn render_scanlines_packet<const N: usize>(
    block: ScanlineBlock,
    scene: &Scene,
    settings: &RenderSettings,
    rows: &mut [Color],
    progress: &AtomicUsize,
) {
    let width = settings.image_width;

    for j in block.rows().rev() {
        let mut buffers = ScanlineBuffers::new(width);

        if settings.max_depth > 0 {
            for s in 0..settings.samples_per_pixel {
                trace_sample::<N>(scene, settings, j, s, &mut buffers);
            }
        }

        let row_start = (j - block.start_line) * width;
        rows[row_start..row_start + width].copy_from_slice(&buffers.full);
        report_progress(progress, settings.image_height);
    }
}

/// Trace sample `s` of every pixel in row `j`.
fn trace_sample<const N: usize>(
    scene: &Scene,
    settings: &RenderSettings,
    j: usize,
    s: u32,
    buffers: &mut ScanlineBuffers,
) {
    let width = settings.image_width;
    let camera = scene.camera();

    let mut queue: VecDeque<LaneState> = (0..width)
        .map(|i| {
            let mut rng = pixel_rng(settings.seed, (j * width + i) as u64, s, settings.samples_per_pixel);
            let ray = primary_ray(camera, i, j, settings, &mut rng);
            LaneState {
                pixel: i,
                depth: 0,
                ray,
                rng,
            }
        })
        .collect();

    let mut lanes: [Option<LaneState>; N] = std::array::from_fn(|_| None);
    let mut mask = LaneMask::NONE;
    for (lane, slot) in lanes.iter_mut().enumerate() {
        *slot = queue.pop_front();
        if slot.is_some() {
            mask.activate(lane);
        }
    }

    let mut packet = RayHitN::<N>::new();
    while mask.any() {
        for (lane, slot) in lanes.iter().enumerate() {
            if let Some(state) = slot.as_ref().filter(|_| mask.is_active(lane)) {
                packet.set_ray(lane, &state.ray, HIT_WINDOW);
            }
        }
        scene.intersect_packet(mask, &mut packet);

        for lane in 0..N {
            if !mask.is_active(lane) {
                continue;
            }
            let Some(state) = lanes[lane].as_mut() else {
                mask.deactivate(lane);
                continue;
            };

            let step = advance_lane(scene, settings, state, &packet.load(lane), buffers);
            if let LaneStep::Retire = step {
                let pixel = state.pixel;
                buffers.full[pixel] += buffers.temp[pixel];

                lanes[lane] = queue.pop_front();
                if lanes[lane].is_none() {
                    mask.deactivate(lane);
                }
            }
        }
    }
}

/// Shade one lane's hit (or miss) and decide whether its path goes on.
fn advance_lane(
    scene: &Scene,
    settings: &RenderSettings,
    state: &mut LaneState,
    rayhit: &RayHit,
    buffers: &mut ScanlineBuffers,
) -> LaneStep {
    let pixel = state.pixel;

    let Some((info, material)) = scene.resolve(&state.ray, rayhit) else {
        buffers.accumulate(pixel, state.depth, sky_color(&state.ray));
        return LaneStep::Retire;
    };

    let emitted = material.emitted(info.u, info.v, info.position);
    let Some(result) = material.scatter(&state.ray, &info, &mut state.rng) else {
        buffers.accumulate(pixel, state.depth, emitted);
        return LaneStep::Retire;
    };

    if state.depth == 0 {
        buffers.temp[pixel] = emitted;
        buffers.attenuation[pixel] = result.attenuation;
    } else {
        buffers.temp[pixel] += buffers.attenuation[pixel] * emitted;
        buffers.attenuation[pixel] *= result.attenuation;
    }

    if state.depth + 1 == settings.max_depth {
        return LaneStep::Retire;
    }
    state.depth += 1;
    state.ray = result.scattered;
    LaneStep::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::render_scanlines;
    use crate::integrator::tests::{empty_scene, mixed_scene};
    use crate::schedule::ScanlineFn;
    use std::sync::atomic::Ordering;

    fn settings(width: usize, height: usize) -> RenderSettings {
        RenderSettings {
            image_width: width,
            image_height: height,
            samples_per_pixel: 3,
            max_depth: 6,
            seed: 2024,
        }
    }

    fn render_with(strategy: ScanlineFn, scene: &Scene, settings: &RenderSettings) -> Vec<Color> {
        let mut rows = vec![Color::ZERO; settings.image_width * settings.image_height];
        let progress = AtomicUsize::new(0);
        strategy(ScanlineBlock::new(0, settings.image_height), scene, settings, &mut rows, &progress);
        assert_eq!(progress.load(Ordering::Relaxed), settings.image_height);
        rows
    }

    fn assert_close(a: &[Color], b: &[Color]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            let tolerance = 1e-4 * (1.0 + x.abs().max_element());
            assert!((*x - *y).abs().max_element() <= tolerance, "pixel {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_packets_match_scalar() {
        let scene = mixed_scene();
        // Width not a multiple of the packet size to exercise partial packets
        let settings = settings(11, 5);

        let scalar = render_with(render_scanlines, &scene, &settings);
        let sse = render_with(render_scanlines_sse, &scene, &settings);
        let avx = render_with(render_scanlines_avx, &scene, &settings);

        assert_close(&scalar, &sse);
        assert_close(&scalar, &avx);
    }

    #[test]
    fn test_packets_match_scalar_at_depth_one() {
        let scene = mixed_scene();
        let settings = RenderSettings {
            max_depth: 1,
            ..settings(7, 3)
        };

        let scalar = render_with(render_scanlines, &scene, &settings);
        let sse = render_with(render_scanlines_sse, &scene, &settings);
        assert_close(&scalar, &sse);
    }

    #[test]
    fn test_empty_scene_sums_sky() {
        let scene = empty_scene();
        let settings = settings(5, 4);
        let rows = render_with(render_scanlines_avx, &scene, &settings);

        // Every sample misses, so each pixel is at most spp * white
        for c in &rows {
            assert!(c.max_element() <= 3.0 + 1e-5);
            assert!(c.min_element() >= 1.5 - 1e-5);
        }
    }

    #[test]
    fn test_block_slice_is_overwritten() {
        let scene = mixed_scene();
        let settings = settings(4, 6);
        let block = ScanlineBlock::new(2, 3);
        let mut rows = vec![Color::splat(1000.0); 3 * 4];
        let progress = AtomicUsize::new(0);

        render_scanlines_sse(block, &scene, &settings, &mut rows, &progress);

        let full = render_with(render_scanlines_sse, &scene, &settings);
        assert_eq!(&rows[..], &full[2 * 4..5 * 4]);
        assert_eq!(progress.load(Ordering::Relaxed), 3);
    }
}
