use crate::camera::Camera;
use crate::error::ConfigError;
use crate::math::{Color, Vec3};
use crate::mesh;
use crate::scene::Scene;
use crate::texture::{Skybox, Texture};
use crate::triangle::Triangle;
use std::fs;
use std::path::{Path, PathBuf};

/// Parses the whitespace-separated configuration format and builds a fully
/// populated `Scene`. Every required key is consumed in a fixed order; any
/// mismatch is a fatal `ConfigError` naming the offending key.
pub fn load(path: impl AsRef<Path>) -> Result<Scene, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    parse(&text, &base_dir)
}

fn parse(text: &str, base_dir: &Path) -> Result<Scene, ConfigError> {
    let mut tok = Tokens::new(text);

    tok.expect_key("frame")?;
    let width = tok.take_u32("frame")?;
    let height = tok.take_u32("frame")?;

    tok.expect_key("camera")?;
    let origin = tok.take_vec3("camera")?;
    let look_at = tok.take_vec3("camera")?;
    let focal = tok.take_f64("camera")?;
    let rotate = tok.take_f64("camera")?;
    let camera = Camera::new(origin, look_at, focal, rotate, width, height);

    tok.expect_key("background_color")?;
    let background_color = tok.take_color("background_color")?;

    tok.expect_key("max_recursion_depth")?;
    let max_recursion_depth = tok.take_positive_u32("max_recursion_depth")?;

    tok.expect_key("diffuse_ray_number")?;
    let diffuse_ray_number = tok.take_positive_u32("diffuse_ray_number")?;

    tok.expect_key("specular_ray_number")?;
    let specular_ray_number = tok.take_positive_u32("specular_ray_number")?;

    let mut triangles = Vec::new();
    let mut textures = Vec::new();
    let mut skybox = None;
    let render_num;

    loop {
        match tok.peek() {
            Some("skybox") => {
                tok.next();
                skybox = parse_skybox(&mut tok, base_dir)?;
            }
            Some("model_start") => {
                tok.next();
                parse_model(&mut tok, base_dir, &mut triangles, &mut textures)?;
            }
            Some("triangle_start") => {
                tok.next();
                triangles.push(parse_triangle(&mut tok)?);
            }
            Some("render_num") => {
                tok.next();
                render_num = tok.take_positive_u32("render_num")?;
                break;
            }
            Some(other) => {
                return Err(ConfigError::UnexpectedKey {
                    expected: "skybox, model_start, triangle_start, or render_num".into(),
                    found: other.into(),
                });
            }
            None => {
                return Err(ConfigError::UnexpectedEof {
                    key: "render_num".into(),
                });
            }
        }
    }

    Ok(Scene {
        triangles,
        textures,
        skybox,
        camera,
        background_color,
        max_recursion_depth,
        diffuse_ray_number,
        specular_ray_number,
        render_num,
        width,
        height,
    })
}

fn parse_skybox(tok: &mut Tokens, base_dir: &Path) -> Result<Option<Skybox>, ConfigError> {
    let brightness = tok.take_f64("skybox")?;
    let front = resolve(base_dir, tok.take_str("skybox")?);
    let back = resolve(base_dir, tok.take_str("skybox")?);
    let left = resolve(base_dir, tok.take_str("skybox")?);
    let right = resolve(base_dir, tok.take_str("skybox")?);
    let top = resolve(base_dir, tok.take_str("skybox")?);
    let bottom = resolve(base_dir, tok.take_str("skybox")?);
    Ok(Skybox::load(brightness, front, back, left, right, top, bottom))
}

/// Parses a `model_start ... model_end` block, importing the referenced OBJ
/// mesh and appending its triangles (with the block's material attributes
/// applied uniformly) to `triangles`. A mesh or texture load failure is
/// logged and degrades gracefully rather than aborting the parse.
fn parse_model(
    tok: &mut Tokens,
    base_dir: &Path,
    triangles: &mut Vec<Triangle>,
    textures: &mut Vec<Texture>,
) -> Result<(), ConfigError> {
    tok.expect_key("model_path")?;
    let model_path = resolve(base_dir, tok.take_str("model_path")?);

    tok.expect_key("texture_path")?;
    let texture_token = tok.take_str("texture_path")?;

    tok.expect_key("position_offset")?;
    let position_offset = tok.take_vec3("position_offset")?;

    tok.expect_key("is_metal")?;
    let is_metal = tok.take_bool("is_metal")?;
    tok.expect_key("is_light_emitting")?;
    let is_light_emitting = tok.take_bool("is_light_emitting")?;
    tok.expect_key("is_transparent")?;
    let is_transparent = tok.take_bool("is_transparent")?;
    tok.expect_key("specular_roughness")?;
    let specular_roughness = tok.take_f64("specular_roughness")?;
    tok.expect_key("refractive_index")?;
    let refractive_index = tok.take_f64("refractive_index")?;

    let mut override_color = None;
    if tok.peek() == Some("override_color") {
        tok.next();
        override_color = Some(tok.take_color("override_color")?);
    }
    tok.expect_key("model_end")?;

    let texture_index: i32 = if texture_token == "no" {
        -1
    } else {
        match Texture::load(resolve(base_dir, texture_token)) {
            Ok(texture) => {
                textures.push(texture);
                (textures.len() - 1) as i32
            }
            Err(err) => {
                log::warn!("texture load failed for model {model_path:?}: {err}");
                -1
            }
        }
    };

    let loaded = match mesh::load_model(&model_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            log::warn!("mesh load failed for {model_path:?}, contributing 0 triangles: {err}");
            return Ok(());
        }
    };

    let color = override_color
        .or(loaded.diffuse_color)
        .unwrap_or(Color::ones());

    for raw in loaded.triangles {
        let (p0, p1, p2) = raw.positions;
        let (n0, n1, n2) = match raw.normals {
            Some((a, b, c)) => (Some(a), Some(b), Some(c)),
            None => (None, None, None),
        };
        let (uv0, uv1, uv2) = raw.uvs.unwrap_or(((0.0, 0.0), (0.0, 0.0), (0.0, 0.0)));
        triangles.push(Triangle::new(
            p0 + position_offset,
            p1 + position_offset,
            p2 + position_offset,
            n0,
            n1,
            n2,
            uv0,
            uv1,
            uv2,
            color,
            specular_roughness,
            refractive_index,
            texture_index,
            is_metal,
            is_light_emitting,
            is_transparent,
            None,
        ));
    }
    Ok(())
}

/// Parses a `triangle_start ... triangle_end` block describing a single
/// explicit triangle. Unlike mesh-imported triangles, an explicit triangle
/// always supplies a `normal_side` hint and has no texture.
fn parse_triangle(tok: &mut Tokens) -> Result<Triangle, ConfigError> {
    tok.expect_key("vertex_0")?;
    let v0 = tok.take_vec3("vertex_0")?;
    tok.expect_key("vertex_1")?;
    let v1 = tok.take_vec3("vertex_1")?;
    tok.expect_key("vertex_2")?;
    let v2 = tok.take_vec3("vertex_2")?;
    tok.expect_key("normal_side")?;
    let normal_side = tok.take_vec3("normal_side")?;
    tok.expect_key("color")?;
    let color = tok.take_color("color")?;
    tok.expect_key("is_metal")?;
    let is_metal = tok.take_bool("is_metal")?;
    tok.expect_key("is_light_emitting")?;
    let is_light_emitting = tok.take_bool("is_light_emitting")?;
    tok.expect_key("is_transparent")?;
    let is_transparent = tok.take_bool("is_transparent")?;
    tok.expect_key("specular_roughness")?;
    let specular_roughness = tok.take_f64("specular_roughness")?;
    tok.expect_key("refractive_index")?;
    let refractive_index = tok.take_f64("refractive_index")?;
    tok.expect_key("triangle_end")?;

    Ok(Triangle::new(
        v0,
        v1,
        v2,
        None,
        None,
        None,
        (0.0, 0.0),
        (0.0, 0.0),
        (0.0, 0.0),
        color,
        specular_roughness,
        refractive_index,
        -1,
        is_metal,
        is_light_emitting,
        is_transparent,
        Some(normal_side),
    ))
}

fn resolve(base_dir: &Path, raw: &str) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

/// A cursor over the configuration file's whitespace-separated tokens.
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_key(&mut self, expected: &str) -> Result<(), ConfigError> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(ConfigError::UnexpectedKey {
                expected: expected.to_string(),
                found: tok.to_string(),
            }),
            None => Err(ConfigError::UnexpectedEof {
                key: expected.to_string(),
            }),
        }
    }

    fn take_str(&mut self, key: &str) -> Result<&'a str, ConfigError> {
        self.next().ok_or_else(|| ConfigError::UnexpectedEof { key: key.to_string() })
    }

    fn take_f64(&mut self, key: &str) -> Result<f64, ConfigError> {
        let raw = self.take_str(key)?;
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            kind: "float",
            value: raw.to_string(),
        })
    }

    fn take_u32(&mut self, key: &str) -> Result<u32, ConfigError> {
        let raw = self.take_str(key)?;
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            kind: "unsigned integer",
            value: raw.to_string(),
        })
    }

    fn take_positive_u32(&mut self, key: &str) -> Result<u32, ConfigError> {
        let raw = self.take_str(key)?;
        let value: i64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            kind: "integer",
            value: raw.to_string(),
        })?;
        if value < 1 {
            return Err(ConfigError::OutOfRange {
                key: key.to_string(),
                value,
            });
        }
        Ok(value as u32)
    }

    fn take_bool(&mut self, key: &str) -> Result<bool, ConfigError> {
        match self.take_str(key)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                kind: "boolean (0 or 1)",
                value: other.to_string(),
            }),
        }
    }

    fn take_vec3(&mut self, key: &str) -> Result<Vec3, ConfigError> {
        Ok(Vec3::new(
            self.take_f64(key)?,
            self.take_f64(key)?,
            self.take_f64(key)?,
        ))
    }

    fn take_color(&mut self, key: &str) -> Result<Color, ConfigError> {
        self.take_vec3(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
        frame 4 4
        camera 0 0 5 0 0 0 50 0
        background_color 0.2 0.4 0.6
        max_recursion_depth 4
        diffuse_ray_number 2
        specular_ray_number 2
        render_num 1
    ";

    #[test]
    fn minimal_config_parses_with_no_geometry() {
        let scene = parse(MINIMAL, Path::new(".")).expect("minimal config must parse");
        assert_eq!(scene.triangles.len(), 0);
        assert_eq!(scene.textures.len(), 0);
        assert_eq!(scene.render_num, 1);
        assert_eq!(scene.width, 4);
        assert_eq!(scene.height, 4);
    }

    const HEADER: &str = "
        frame 4 4
        camera 0 0 5 0 0 0 50 0
        background_color 0.2 0.4 0.6
        max_recursion_depth 4
        diffuse_ray_number 2
        specular_ray_number 2
    ";

    #[test]
    fn explicit_triangle_block_parses() {
        let text = format!(
            "{HEADER}
            triangle_start
            vertex_0 0 0 0
            vertex_1 1 0 0
            vertex_2 0 1 0
            normal_side 0 0 1
            color 1 1 1
            is_metal 0
            is_light_emitting 1
            is_transparent 0
            specular_roughness 0
            refractive_index 1
            triangle_end
            render_num 2
            "
        );
        let scene = parse(&text, Path::new(".")).expect("config with a triangle must parse");
        assert_eq!(scene.triangles.len(), 1);
        assert!(scene.triangles[0].is_light_emitting);
        assert_eq!(scene.render_num, 2);
    }

    #[test]
    fn out_of_order_key_is_a_config_error() {
        let text = format!(
            "{HEADER}
            triangle_start
            vertex_1 1 0 0
            vertex_0 0 0 0
            vertex_2 0 1 0
            normal_side 0 0 1
            color 1 1 1
            is_metal 0
            is_light_emitting 1
            is_transparent 0
            specular_roughness 0
            refractive_index 1
            triangle_end
            render_num 1
            "
        );
        let err = parse(&text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedKey { .. }));
    }

    #[test]
    fn zero_max_recursion_depth_is_rejected() {
        let text = "
            frame 4 4
            camera 0 0 5 0 0 0 50 0
            background_color 0.2 0.4 0.6
            max_recursion_depth 0
            diffuse_ray_number 2
            specular_ray_number 2
            render_num 1
        ";
        let err = parse(text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }
}
