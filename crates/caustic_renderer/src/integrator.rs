//! Scalar recursive path tracer.

use std::sync::atomic::{AtomicUsize, Ordering};

use caustic_math::{unit_or_zero, Color, Ray};
use rand::RngCore;

use crate::camera::Camera;
use crate::render_data::RenderSettings;
use crate::sampling::{gen_f32, pixel_rng};
use crate::scene::Scene;
use crate::schedule::ScanlineBlock;

/// Compute the color seen by a ray.
///
/// Recursion stops after `depth` bounces. Emission is added once per bounce
/// and the remainder of the path is weighted by the bounce's attenuation.
pub fn colorize_ray(ray: &Ray, scene: &Scene, depth: u32, rng: &mut dyn RngCore) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rayhit) = scene.intersect(ray) else {
        return sky_color(ray);
    };
    let Some((info, material)) = scene.resolve(ray, &rayhit) else {
        return sky_color(ray);
    };

    let emitted = material.emitted(info.u, info.v, info.position);
    match material.scatter(ray, &info, rng) {
        Some(result) => emitted + result.attenuation * colorize_ray(&result.scattered, scene, depth - 1, rng),
        None => emitted,
    }
}

/// Background gradient: white at the horizon to light blue overhead.
pub fn sky_color(ray: &Ray) -> Color {
    let unit_direction = unit_or_zero(ray.direction());
    let t = 0.5 * (unit_direction.y + 1.0);
    (1.0 - t) * Color::ONE + t * Color::new(0.5, 0.7, 1.0)
}

/// Camera ray for one sample of pixel `(i, j)`.
///
/// Draws the horizontal jitter, the vertical jitter, then the lens sample.
pub fn primary_ray(camera: &Camera, i: usize, j: usize, settings: &RenderSettings, rng: &mut dyn RngCore) -> Ray {
    let u = (i as f32 + gen_f32(rng)) / (settings.image_width.saturating_sub(1).max(1)) as f32;
    let v = (j as f32 + gen_f32(rng)) / (settings.image_height.saturating_sub(1).max(1)) as f32;
    camera.get_ray(u, v, rng)
}

/// Render `block` with the scalar integrator.
///
/// `rows` holds exactly the block's scanlines, lowest row first. Rows are
/// traced top first and each finished row bumps `progress`.
pub fn render_scanlines(
    block: ScanlineBlock,
    scene: &Scene,
    settings: &RenderSettings,
    rows: &mut [Color],
    progress: &AtomicUsize,
) {
    let width = settings.image_width;
    let camera = scene.camera();

    for j in block.rows().rev() {
        let row_start = (j - block.start_line) * width;
        for (i, pixel) in rows[row_start..row_start + width].iter_mut().enumerate() {
            let pixel_index = (j * width + i) as u64;
            let mut sum = Color::ZERO;
            for s in 0..settings.samples_per_pixel {
                let mut rng = pixel_rng(settings.seed, pixel_index, s, settings.samples_per_pixel);
                let ray = primary_ray(camera, i, j, settings, &mut rng);
                sum += colorize_ray(&ray, scene, settings.max_depth, &mut rng);
            }
            *pixel = sum;
        }
        report_progress(progress, settings.image_height);
    }
}

pub(crate) fn report_progress(progress: &AtomicUsize, total: usize) {
    let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
    log::debug!("Scanlines completed: {}/{}", done, total);
}
