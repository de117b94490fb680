use crate::error::TextureError;
use crate::math::Color;
use image::GenericImageView;
use std::path::Path;

/// An immutable RGB pixel grid sampled with nearest-neighbor lookup. Sampled
/// colors are linearized from sRGB by raising each channel to γ = 2.2, per
/// the Texture invariant.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    u_max: f64,
    v_max: f64,
    pixels: Vec<[u8; 3]>,
}

impl Texture {
    /// Decodes an image file into a `Texture`. The image is flipped
    /// vertically on load so `v = 0` addresses the bottom row, matching the
    /// original importer's convention.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .flipv();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty {
                path: path.to_path_buf(),
            });
        }
        let rgb = img.to_rgb8();
        let pixels = rgb.pixels().map(|p| p.0).collect();
        Ok(Self {
            width,
            height,
            u_max: (width - 1) as f64,
            v_max: (height - 1) as f64,
            pixels,
        })
    }

    /// Nearest-neighbor sample at barycentric-interpolated `(u, v)`,
    /// returned as a linear-space color.
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let x = (u * self.u_max).round().clamp(0.0, (self.width - 1) as f64) as u32;
        let y = (v * self.v_max).round().clamp(0.0, (self.height - 1) as f64) as u32;
        let [r, g, b] = self.pixels[(y * self.width + x) as usize];
        Color::new(
            (r as f64 / 255.0).powf(2.2),
            (g as f64 / 255.0).powf(2.2),
            (b as f64 / 255.0).powf(2.2),
        )
    }
}

/// An ordered sextet of cube faces plus a scalar brightness. Either all six
/// faces load successfully or the skybox is absent entirely.
#[derive(Debug, Clone)]
pub struct Skybox {
    brightness: f64,
    front: Texture,
    back: Texture,
    left: Texture,
    right: Texture,
    top: Texture,
    bottom: Texture,
}

impl Skybox {
    /// Loads all six faces. Returns `None` (not an error) if any face fails
    /// to decode — the caller falls back to the scene's background color.
    pub fn load(
        brightness: f64,
        front: impl AsRef<Path>,
        back: impl AsRef<Path>,
        left: impl AsRef<Path>,
        right: impl AsRef<Path>,
        top: impl AsRef<Path>,
        bottom: impl AsRef<Path>,
    ) -> Option<Self> {
        let faces = [
            Texture::load(front),
            Texture::load(back),
            Texture::load(left),
            Texture::load(right),
            Texture::load(top),
            Texture::load(bottom),
        ];
        let mut loaded = Vec::with_capacity(6);
        for face in faces {
            match face {
                Ok(tex) => loaded.push(tex),
                Err(err) => {
                    log::warn!("skybox face failed to load, discarding skybox entirely: {err}");
                    return None;
                }
            }
        }
        let mut it = loaded.into_iter();
        Some(Self {
            brightness,
            front: it.next().unwrap(),
            back: it.next().unwrap(),
            left: it.next().unwrap(),
            right: it.next().unwrap(),
            top: it.next().unwrap(),
            bottom: it.next().unwrap(),
        })
    }

    /// Projects `dir` onto whichever of the six cube faces it points toward
    /// and samples that face, scaled by `brightness`.
    pub fn sample(&self, dir: crate::math::Vec3) -> Color {
        // front, ZPos
        if dir.z > 0.0 {
            let p = dir / dir.z;
            let (u, v) = ((1.0 - p.x) * 0.5, (1.0 + p.y) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.front.sample(u, v) * self.brightness;
            }
        }
        // back, ZNeg
        if dir.z < 0.0 {
            let p = dir / -dir.z;
            let (u, v) = ((1.0 + p.x) * 0.5, (1.0 + p.y) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.back.sample(u, v) * self.brightness;
            }
        }
        // left, XNeg
        if dir.x < 0.0 {
            let p = dir / -dir.x;
            let (u, v) = ((1.0 - p.z) * 0.5, (1.0 + p.y) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.left.sample(u, v) * self.brightness;
            }
        }
        // right, XPos
        if dir.x > 0.0 {
            let p = dir / dir.x;
            let (u, v) = ((p.z + 1.0) * 0.5, (p.y + 1.0) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.right.sample(u, v) * self.brightness;
            }
        }
        // top, YPos
        if dir.y > 0.0 {
            let p = dir / dir.y;
            let (u, v) = ((p.x + 1.0) * 0.5, (p.z + 1.0) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.top.sample(u, v) * self.brightness;
            }
        }
        // bottom, YNeg
        if dir.y < 0.0 {
            let p = dir / -dir.y;
            let (u, v) = ((p.x + 1.0) * 0.5, (p.z - 1.0) * 0.5);
            if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
                return self.bottom.sample(u, v) * self.brightness;
            }
        }
        Color::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_texture(r: u8, g: u8, b: u8) -> Texture {
        Texture {
            width: 2,
            height: 2,
            u_max: 1.0,
            v_max: 1.0,
            pixels: vec![[r, g, b]; 4],
        }
    }

    #[test]
    fn sample_linearizes_srgb() {
        let tex = solid_texture(255, 0, 0);
        let c = tex.sample(0.5, 0.5);
        assert!((c.x - 1.0).abs() < 1e-9);
        assert_eq!(c.y, 0.0);
    }

    #[test]
    fn sample_clamps_out_of_range_uv() {
        let tex = solid_texture(128, 64, 32);
        let c = tex.sample(5.0, -5.0);
        assert!(c.x > 0.0);
    }

    #[test]
    fn skybox_top_face_sampled_looking_up() {
        let sky = Skybox {
            brightness: 1.0,
            front: solid_texture(0, 0, 0),
            back: solid_texture(0, 0, 0),
            left: solid_texture(0, 0, 0),
            right: solid_texture(0, 0, 0),
            top: solid_texture(255, 0, 0),
            bottom: solid_texture(0, 0, 0),
        };
        let up = crate::math::Vec3::new(0.0, 1.0, 0.0);
        let c = sky.sample(up);
        assert!(c.x > 0.9);
        assert_eq!(c.y, 0.0);
    }
}
