use crate::camera::Camera;
use crate::math::Color;
use crate::texture::{Skybox, Texture};
use crate::triangle::Triangle;

/// The fully populated, immutable scene description consumed by the
/// renderer. Built incrementally by `config::load` and never mutated once
/// rendering begins.
pub struct Scene {
    pub triangles: Vec<Triangle>,
    pub textures: Vec<Texture>,
    pub skybox: Option<Skybox>,
    pub camera: Camera,
    pub background_color: Color,
    pub max_recursion_depth: u32,
    pub diffuse_ray_number: u32,
    pub specular_ray_number: u32,
    pub render_num: u32,
    pub width: u32,
    pub height: u32,
}

impl Scene {
    /// Samples the background seen by a ray that escapes the scene entirely:
    /// the skybox if one loaded, otherwise the flat `background_color`.
    pub fn background(&self, direction: crate::math::Vec3) -> Color {
        match &self.skybox {
            Some(sky) => sky.sample(direction),
            None => self.background_color,
        }
    }
}
