//! Materials describing how light interacts with surfaces.

use std::sync::Arc;

use caustic_math::{reflect, refract, unit_or_zero, Color, Point3, Ray};
use rand::RngCore;

use crate::hit_info::HitInfo;
use crate::sampling::{gen_f32, random_in_unit_sphere};
use crate::texture::Texture;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// Per-channel throughput of the bounce
    pub attenuation: Color,
    /// Outgoing ray from the hit point
    pub scattered: Ray,
}

/// Closed set of surface materials.
#[derive(Debug, Clone)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
    Emissive(Emissive),
}

impl Material {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` when the path terminates at this surface.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitInfo, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        match self {
            Material::Lambertian(m) => Some(m.scatter(ray_in, rec, rng)),
            Material::Metal(m) => m.scatter(ray_in, rec, rng),
            Material::Dielectric(m) => Some(m.scatter(ray_in, rec, rng)),
            Material::Emissive(_) => None,
        }
    }

    /// Light emitted at the hit point; black for everything but emitters.
    pub fn emitted(&self, _u: f32, _v: f32, _p: Point3) -> Color {
        match self {
            Material::Emissive(m) => m.radiance,
            _ => Color::ZERO,
        }
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    texture: Arc<Texture>,
}

impl Lambertian {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self { texture }
    }

    /// Diffuse surface with a constant albedo.
    pub fn from_color(albedo: Color) -> Self {
        Self::new(Arc::new(Texture::solid(albedo)))
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitInfo, rng: &mut dyn RngCore) -> ScatterResult {
        let target = rec.normal + random_in_unit_sphere(rng);

        // Catch degenerate scatter direction
        let mut direction = unit_or_zero(target);
        if direction == Color::ZERO {
            direction = rec.normal;
        }

        ScatterResult {
            attenuation: self.texture.value(rec.u, rec.v, rec.position),
            scattered: Ray::new(rec.position, direction, ray_in.time()),
        }
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, clamped to 1.0
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitInfo, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let reflected = reflect(unit_or_zero(ray_in.direction()), rec.normal);
        let direction = reflected + self.fuzz * random_in_unit_sphere(rng);

        // Absorbed if fuzz pushed the ray below the surface
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.position, direction, ray_in.time()),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ref_idx: f32) -> f32 {
        let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitInfo, rng: &mut dyn RngCore) -> ScatterResult {
        let refraction_ratio = if rec.front_face { 1.0 / self.ior } else { self.ior };

        let unit_direction = unit_or_zero(ray_in.direction());
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection forces a reflect
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.position, direction, ray_in.time()),
        }
    }
}

/// Constant-radiance light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emissive {
    radiance: Color,
}

impl Emissive {
    pub fn new(radiance: Color) -> Self {
        Self { radiance }
    }

    /// Light of color `rgb` scaled by `strength`.
    pub fn with_strength(rgb: Color, strength: f32) -> Self {
        Self::new(rgb * strength)
    }
}
