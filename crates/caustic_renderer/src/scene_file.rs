//! Scene description reader.
//!
//! # Format
//!
//! ```text
//! version 0.1.3
//! Camera
//! lookfrom 13 2 3
//! lookat 0 0 0
//! vup 0 1 0
//! vfov 20
//! aspect_ratio 16/9
//! aperture 0.1
//! focus_dist 10
//!
//! Texture[Checker]
//! id checker
//! scale 0.32
//! c1 0.2 0.3 0.1
//! c2 0.9 0.9 0.9
//!
//! Material[Lambertian]
//! id ground
//! texture checker
//!
//! Sphere
//! id ball
//! position 0 -1000 0
//! material ground
//! radius 1000
//!
//! Instance[SpherePrimitive]
//! prim_id ball
//! translate 0 0 2
//! ```
//!
//! Each declaration is a header line followed by a fixed sequence of
//! `key value...` property lines; keys are positional and not checked.
//! `#` starts a comment. Identifiers must be declared before use.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use caustic_math::Vec3;
use caustic_rtc::Device;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::camera::Camera;
use crate::geometry::{Cuboid, Geometry, Instance, Quad, Sphere};
use crate::material::{Dielectric, Emissive, Lambertian, Material, Metal};
use crate::scene::{SceneBuilder, SceneError};
use crate::texture::{CheckerTexture, ImageTexture, NoiseTexture, Texture, TextureError};

/// The only schema version accepted.
pub const SCENE_FILE_VERSION: &str = "version 0.1.3";

/// Errors that can occur while reading a scene description.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported version or missing version marker: '{0}'")]
    Version(String),

    #[error("no Camera block found")]
    MissingCamera,

    #[error("unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unknown {kind} type '{tag}' at line {line}")]
    UnknownType {
        line: usize,
        kind: &'static str,
        tag: String,
    },

    #[error("undefined {kind} '{id}' at line {line}")]
    Undefined {
        line: usize,
        kind: &'static str,
        id: String,
    },

    #[error("instance at line {line}: '{id}' is not a {expected}")]
    WrongPrimitive {
        line: usize,
        id: String,
        expected: &'static str,
    },

    #[error("texture error at line {line}: {source}")]
    Texture {
        line: usize,
        #[source]
        source: TextureError,
    },

    #[error("scene error at line {line}: {source}")]
    Scene {
        line: usize,
        #[source]
        source: SceneError,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Read a scene file into an uncommitted [`SceneBuilder`].
///
/// Relative image paths are also looked up next to the scene file.
pub fn parse_scene_file(path: impl AsRef<Path>, device: &Device, seed: u64) -> ParseResult<SceneBuilder> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    log::info!("Reading scene {}", path.display());

    SceneParser::new(&content, device)
        .with_seed(seed)
        .with_base_dir(path.parent().map(Path::to_path_buf))
        .parse()
}

/// Line-oriented scene description parser.
pub struct SceneParser<'d> {
    lines: VecDeque<(usize, String)>,
    current_line: usize,
    device: &'d Device,
    base_dir: Option<PathBuf>,
    rng: ChaCha8Rng,
    textures: HashMap<String, Arc<Texture>>,
    materials: HashMap<String, Arc<Material>>,
    primitives: HashMap<String, u32>,
}

impl<'d> SceneParser<'d> {
    /// Create a new parser from file contents.
    pub fn new(content: &str, device: &'d Device) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, strip_comment(s).to_string()))
            .filter(|(_, s)| !s.is_empty())
            .collect();

        Self {
            lines,
            current_line: 0,
            device,
            base_dir: None,
            rng: ChaCha8Rng::seed_from_u64(0),
            textures: HashMap::new(),
            materials: HashMap::new(),
            primitives: HashMap::new(),
        }
    }

    /// Seed for procedural textures.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Directory searched for relative image paths.
    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Parse every declaration. Nothing is committed; on error all backend
    /// objects created so far are dropped.
    pub fn parse(mut self) -> ParseResult<SceneBuilder> {
        let version = self.lines.pop_front().map(|(_, s)| s).unwrap_or_default();
        if version != SCENE_FILE_VERSION {
            return Err(ParseError::Version(version));
        }

        let camera = self.read_camera()?;
        let mut builder = SceneBuilder::new(self.device, camera);

        while let Some((line_num, header)) = self.lines.pop_front() {
            self.current_line = line_num;
            if header.starts_with("Material") {
                self.read_material(&header)?;
            } else if header.starts_with("Texture") {
                self.read_texture(&header)?;
            } else if header.starts_with("Sphere") {
                self.read_sphere(&mut builder)?;
            } else if header.starts_with("Quad") {
                self.read_quad(&mut builder)?;
            } else if header.starts_with("Box") {
                self.read_box(&mut builder)?;
            } else if header.starts_with("Instance") {
                self.read_instance(&header, &mut builder)?;
            } else {
                log::warn!("Ignoring unrecognized line {}: {}", line_num, header);
            }
        }

        log::debug!(
            "Parsed {} textures, {} materials, {} primitives",
            self.textures.len(),
            self.materials.len(),
            builder.len()
        );
        Ok(builder)
    }

    fn read_camera(&mut self) -> ParseResult<Camera> {
        loop {
            match self.lines.pop_front() {
                Some((num, line)) if line.starts_with("Camera") => {
                    self.current_line = num;
                    break;
                }
                Some((num, line)) => log::warn!("Ignoring line {} before Camera: {}", num, line),
                None => return Err(ParseError::MissingCamera),
            }
        }

        let look_from = self.xyz("camera lookfrom")?;
        let look_at = self.xyz("camera lookat")?;
        let vup = self.xyz("camera vup")?;
        let vfov = self.number("camera vfov")?;
        let aspect_ratio = self.ratio("camera aspect_ratio")?;
        let aperture = self.number("camera aperture")?;
        let focus_dist = self.number("camera focus_dist")?;

        Ok(Camera::new(look_from, look_at, vup, vfov, aspect_ratio, aperture, focus_dist))
    }

    fn read_material(&mut self, header: &str) -> ParseResult<()> {
        let tag = self.type_tag(header, "material")?;
        let id = self.string("material id")?;

        let material = match tag.as_str() {
            "Lambertian" => {
                let texture_id = self.string("lambertian texture")?;
                let lambertian = if texture_id == "no" {
                    Lambertian::from_color(self.xyz("lambertian albedo")?)
                } else {
                    Lambertian::new(self.lookup_texture(&texture_id)?)
                };
                Material::Lambertian(lambertian)
            }
            "Metal" => {
                let albedo = self.xyz("metal albedo")?;
                let fuzz = self.number("metal fuzz")?;
                Material::Metal(Metal::new(albedo, fuzz))
            }
            "Dielectric" => Material::Dielectric(Dielectric::new(self.number("dielectric ir")?)),
            "Emissive" => {
                let rgb = self.xyz("emissive rgb")?;
                let strength = self.number("emissive strength")?;
                Material::Emissive(Emissive::with_strength(rgb, strength))
            }
            _ => return Err(self.unknown_type("material", tag)),
        };

        self.materials.insert(id, Arc::new(material));
        Ok(())
    }

    fn read_texture(&mut self, header: &str) -> ParseResult<()> {
        let tag = self.type_tag(header, "texture")?;
        let id = self.string("texture id")?;

        let texture = match tag.as_str() {
            "Checker" => {
                let scale = self.number("checker scale")?;
                let even = self.xyz("checker c1")?;
                let odd = self.xyz("checker c2")?;
                Texture::Checker(CheckerTexture::from_colors(scale, even, odd))
            }
            "Image" => {
                let path = self.string("image path")?;
                let line = self.current_line;
                let image = ImageTexture::open(&path, self.base_dir.as_deref())
                    .map_err(|source| ParseError::Texture { line, source })?;
                Texture::Image(image)
            }
            "Noise" => {
                let scale = self.number("noise scale")?;
                Texture::Noise(NoiseTexture::new(scale, &mut self.rng))
            }
            _ => return Err(self.unknown_type("texture", tag)),
        };

        self.textures.insert(id, Arc::new(texture));
        Ok(())
    }

    fn read_sphere(&mut self, builder: &mut SceneBuilder) -> ParseResult<()> {
        let id = self.string("sphere id")?;
        let position = self.xyz("sphere position")?;
        let material = self.material_ref("sphere material")?;
        let radius = self.number("sphere radius")?;

        let sphere = Sphere::new(self.device, position, radius, material).map_err(|e| self.scene_error(e))?;
        self.register(id, sphere, builder)
    }

    fn read_quad(&mut self, builder: &mut SceneBuilder) -> ParseResult<()> {
        let id = self.string("quad id")?;
        let position = self.xyz("quad position")?;
        let u = self.xyz("quad u")?;
        let v = self.xyz("quad v")?;
        let material = self.material_ref("quad material")?;

        let quad = Quad::new(self.device, position, u, v, material).map_err(|e| self.scene_error(e))?;
        self.register(id, quad, builder)
    }

    fn read_box(&mut self, builder: &mut SceneBuilder) -> ParseResult<()> {
        let id = self.string("box id")?;
        let position = self.xyz("box position")?;
        let a = self.xyz("box a")?;
        let b = self.xyz("box b")?;
        let c = self.xyz("box c")?;
        let material = self.material_ref("box material")?;

        let cuboid = Cuboid::new(self.device, position, a, b, c, material).map_err(|e| self.scene_error(e))?;
        self.register(id, cuboid, builder)
    }

    fn read_instance(&mut self, header: &str, builder: &mut SceneBuilder) -> ParseResult<()> {
        let tag = self.type_tag(header, "instance")?;
        let (expected_kind, expected) = match tag.as_str() {
            "SpherePrimitive" => ("sphere", "SpherePrimitive"),
            "QuadPrimitive" => ("quad", "QuadPrimitive"),
            _ => return Err(self.unknown_type("instance", tag)),
        };

        let prim_id = self.string("instance prim_id")?;
        let translate = self.xyz("instance translate")?;
        let line = self.current_line;

        let source = self
            .primitives
            .get(&prim_id)
            .and_then(|id| builder.geometry(*id))
            .cloned()
            .ok_or_else(|| ParseError::Undefined {
                line,
                kind: "primitive",
                id: prim_id.clone(),
            })?;
        if source.kind_name() != expected_kind {
            return Err(ParseError::WrongPrimitive {
                line,
                id: prim_id,
                expected,
            });
        }

        let instance = Instance::new(self.device, source, translate).map_err(|e| self.scene_error(e))?;
        builder
            .add_primitive_instance(instance)
            .map_err(|e| self.scene_error(e))?;
        Ok(())
    }

    fn register(&mut self, id: String, primitive: impl Into<Geometry>, builder: &mut SceneBuilder) -> ParseResult<()> {
        let hit_id = builder.add_primitive(primitive).map_err(|e| self.scene_error(e))?;
        self.primitives.insert(id, hit_id);
        Ok(())
    }

    fn lookup_texture(&self, id: &str) -> ParseResult<Arc<Texture>> {
        self.textures.get(id).cloned().ok_or_else(|| ParseError::Undefined {
            line: self.current_line,
            kind: "texture",
            id: id.to_string(),
        })
    }

    fn material_ref(&mut self, what: &'static str) -> ParseResult<Arc<Material>> {
        let id = self.string(what)?;
        self.materials.get(&id).cloned().ok_or_else(|| ParseError::Undefined {
            line: self.current_line,
            kind: "material",
            id,
        })
    }

    /// `Kind[Tag]` -> `Tag`
    fn type_tag(&self, header: &str, kind: &'static str) -> ParseResult<String> {
        let tag = header
            .find('[')
            .and_then(|start| header[start + 1..].find(']').map(|end| &header[start + 1..start + 1 + end]));
        tag.map(str::to_string).ok_or_else(|| self.error(format!("expected {}[Type]", kind)))
    }

    /// Values of the next property line, without its key.
    fn property(&mut self, what: &'static str) -> ParseResult<Vec<String>> {
        let (num, line) = self.lines.pop_front().ok_or(ParseError::UnexpectedEof(what))?;
        self.current_line = num;

        let values: Vec<String> = line.split_whitespace().skip(1).map(str::to_string).collect();
        if values.is_empty() {
            return Err(self.error(format!("{} has no value", what)));
        }
        Ok(values)
    }

    fn string(&mut self, what: &'static str) -> ParseResult<String> {
        Ok(self.property(what)?.swap_remove(0))
    }

    fn number(&mut self, what: &'static str) -> ParseResult<f32> {
        let value = self.string(what)?;
        self.parse_f32(&value, what)
    }

    fn xyz(&mut self, what: &'static str) -> ParseResult<Vec3> {
        let values = self.property(what)?;
        if values.len() < 3 {
            return Err(self.error(format!("{} needs three components", what)));
        }
        Ok(Vec3::new(
            self.parse_f32(&values[0], what)?,
            self.parse_f32(&values[1], what)?,
            self.parse_f32(&values[2], what)?,
        ))
    }

    /// `w/h` or a plain number.
    fn ratio(&mut self, what: &'static str) -> ParseResult<f32> {
        let value = self.string(what)?;
        match value.split_once('/') {
            Some((w, h)) => {
                let (w, h) = (self.parse_f32(w, what)?, self.parse_f32(h, what)?);
                if h == 0.0 {
                    return Err(self.error(format!("{} has a zero denominator", what)));
                }
                Ok(w / h)
            }
            None => self.parse_f32(&value, what),
        }
    }

    fn parse_f32(&self, s: &str, what: &str) -> ParseResult<f32> {
        s.parse()
            .map_err(|_| self.error(format!("invalid number '{}' for {}", s, what)))
    }

    fn error(&self, message: String) -> ParseError {
        ParseError::Parse {
            line: self.current_line,
            message,
        }
    }

    fn unknown_type(&self, kind: &'static str, tag: String) -> ParseError {
        ParseError::UnknownType {
            line: self.current_line,
            kind,
            tag,
        }
    }

    fn scene_error(&self, source: SceneError) -> ParseError {
        ParseError::Scene {
            line: self.current_line,
            source,
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use caustic_math::{Color, Ray};

    const HEADER: &str = "version 0.1.3
Camera
lookfrom 0 0 5
lookat 0 0 0
vup 0 1 0
vfov 40
aspect_ratio 16/9
aperture 0
focus_dist 5
";

    fn parse(body: &str) -> ParseResult<SceneBuilder> {
        let device = Device::new();
        SceneParser::new(&format!("{}{}", HEADER, body), &device).parse()
    }

    #[test]
    fn test_camera() {
        let builder = parse("").unwrap();
        let camera = builder.camera();

        assert_eq!(camera.look_from(), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.vfov(), 40.0);
        assert!((camera.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(camera.focus_dist(), 5.0);
        assert!(builder.is_empty());
    }

    #[test]
    fn test_full_scene() {
        let body = "
# materials
Texture[Checker]
id check
scale 0.5
c1 0.2 0.3 0.1
c2 0.9 0.9 0.9

Texture[Noise]
id marble
scale 4

Material[Lambertian]
id ground
texture check

Material[Lambertian]
id stone
texture marble

Material[Lambertian]
id red
texture no
albedo 0.8 0.1 0.1

Material[Metal]
id gold # trailing comment
albedo 0.8 0.6 0.2
fuzz 0.1

Material[Dielectric]
id glass
ir 1.5

Material[Emissive]
id lamp
rgb 1 0.5 0.25
strength 4

Sphere
id floor
position 0 -100 0
material ground
radius 100

Sphere
id ball
position 0 0 0
material glass
radius 0.5

Quad
id light
position -1 2 -1
u 2 0 0
v 0 0 2
material lamp

Box
id crate
position 1 0 0
a 1 0 0
b 0 1 0
c 0 0 1
material red

Instance[SpherePrimitive]
prim_id ball
translate 0 0 -3

Instance[QuadPrimitive]
prim_id light
translate 0 1 0
";
        let builder = parse(body).unwrap();
        assert_eq!(builder.len(), 6);

        let scene = builder.commit().unwrap();
        let ray = Ray::new_simple(Vec3::new(0.0, 3.5, 0.0), -Vec3::Y);
        let hit = scene.intersect(&ray).unwrap();
        let (info, material) = scene.resolve(&ray, &hit).unwrap();

        // Instanced light one unit above the original
        assert!(matches!(scene.geometry(hit.hit_id().unwrap()).unwrap().as_ref(), Geometry::Instance(_)));
        assert!((info.position.y - 3.0).abs() < 1e-4);
        assert_eq!(material.emitted(0.0, 0.0, info.position), Color::new(4.0, 2.0, 1.0));
    }

    #[test]
    fn test_version_mismatch() {
        let device = Device::new();
        let result = SceneParser::new("version 0.1.2\nCamera\n", &device).parse();
        assert!(matches!(result, Err(ParseError::Version(v)) if v == "version 0.1.2"));
    }

    #[test]
    fn test_missing_camera() {
        let device = Device::new();
        let result = SceneParser::new("version 0.1.3\n", &device).parse();
        assert!(matches!(result, Err(ParseError::MissingCamera)));
    }

    #[test]
    fn test_unknown_material_type() {
        let result = parse("Material[Plastic]\nid p\n");
        assert!(matches!(result, Err(ParseError::UnknownType { kind: "material", .. })));
    }

    #[test]
    fn test_unknown_texture_and_instance_types() {
        assert!(matches!(
            parse("Texture[Marble]\nid m\n"),
            Err(ParseError::UnknownType { kind: "texture", .. })
        ));
        assert!(matches!(
            parse("Instance[BoxPrimitive]\nprim_id b\ntranslate 0 0 0\n"),
            Err(ParseError::UnknownType { kind: "instance", .. })
        ));
    }

    #[test]
    fn test_undefined_material() {
        let result = parse("Sphere\nid s\nposition 0 0 0\nmaterial nope\nradius 1\n");
        match result {
            Err(ParseError::Undefined { line, kind, id }) => {
                assert_eq!(line, 13);
                assert_eq!(kind, "material");
                assert_eq!(id, "nope");
            }
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_instance_of_wrong_primitive() {
        let body = "Material[Metal]
id m
albedo 1 1 1
fuzz 0
Quad
id q
position 0 0 0
u 1 0 0
v 0 1 0
material m
Instance[SpherePrimitive]
prim_id q
translate 1 0 0
";
        let result = parse(body);
        assert!(matches!(result, Err(ParseError::WrongPrimitive { expected: "SpherePrimitive", .. })));
    }

    #[test]
    fn test_malformed_number() {
        let result = parse("Material[Dielectric]\nid g\nir glassy\n");
        assert!(matches!(result, Err(ParseError::Parse { line: 12, .. })));
    }

    #[test]
    fn test_truncated_block() {
        let result = parse("Material[Metal]\nid m\nalbedo 1 1 1\n");
        assert!(matches!(result, Err(ParseError::UnexpectedEof(_))));
    }

    #[test]
    fn test_missing_image_texture() {
        let result = parse("Texture[Image]\nid img\npath no/such/file.png\n");
        assert!(matches!(result, Err(ParseError::Texture { .. })));
    }

    #[test]
    fn test_failed_parse_releases_backend_objects() {
        let device = Device::new();
        let body = "Material[Metal]\nid m\nalbedo 1 1 1\nfuzz 0\nSphere\nid s\nposition 0 0 0\nmaterial m\nradius 1\nSphere\nid t\n";
        let result = SceneParser::new(&format!("{}{}", HEADER, body), &device).parse();

        assert!(result.is_err());
        assert_eq!(device.live_scenes(), 0);
        assert_eq!(device.live_geometries(), 0);
    }

    #[test]
    fn test_bundled_scene() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes/spheres.csr");
        let device = Device::new();
        let builder = parse_scene_file(&path, &device, 0).unwrap();

        assert_eq!(builder.len(), 7);
        assert!(builder.commit().is_ok());
    }

    #[test]
    fn test_parse_file() {
        let path = std::env::temp_dir().join(format!("caustic_scene_{}.csr", std::process::id()));
        std::fs::write(&path, format!("{}Material[Dielectric]\nid g\nir 1.5\n", HEADER)).unwrap();

        let device = Device::new();
        let builder = parse_scene_file(&path, &device, 1).unwrap();
        assert!(builder.is_empty());

        std::fs::remove_file(&path).unwrap();
    }
}
