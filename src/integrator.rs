use crate::bvh::Bvh;
use crate::math::{Color, Ray, Vec3};
use crate::scene::Scene;
use rand::RngCore;

const FIXED_SPECULAR_REFLECTANCE: f64 = 0.04;

/// Recursive shading function. Intersects the BVH, selects the closest hit,
/// and branches on the hit triangle's material tags to produce a radiance
/// estimate. Each recursive call issues exactly one ray; the branching in
/// the metal/transparent/opaque cases is where fan-out happens.
pub fn color(
    scene: &Scene,
    bvh: Option<&Bvh>,
    depth: u32,
    ray: Ray,
    rng: &mut dyn RngCore,
) -> Color {
    let Some((tri_idx, hit)) = bvh.and_then(|bvh| bvh.closest_hit(&ray, &scene.triangles)) else {
        return scene.background(ray.direction);
    };
    let tri = &scene.triangles[tri_idx];

    let weight2 = 1.0 - hit.alpha - hit.beta;
    let n = (tri.n0 * hit.alpha + tri.n1 * hit.beta + tri.n2 * weight2).normalized();

    if depth == scene.max_recursion_depth {
        return Color::zero();
    }

    if !tri.is_transparent && n.dot(ray.direction) >= 0.0 {
        return Color::zero();
    }

    if tri.is_light_emitting {
        return tri.color;
    }

    let hit_point = ray.at(hit.t);

    if tri.is_metal {
        let specular_rays = tri.specular(n, &ray, scene.specular_ray_number, rng);
        let avg = average_radiance(scene, bvh, depth, hit_point, &specular_rays, rng);
        return tri.color.hadamard(avg);
    }

    if tri.is_transparent {
        let specular_rays = tri.specular(n, &ray, scene.specular_ray_number, rng);
        let c_s = average_radiance(scene, bvh, depth, hit_point, &specular_rays, rng);
        let (w, refracted_dir) = tri.refract(n, &ray);
        let c_r = if w > 0.0 {
            color(
                scene,
                bvh,
                depth + 1,
                Ray::new(hit_point, refracted_dir),
                rng,
            )
        } else {
            Color::zero()
        };
        return c_r * w + c_s * (1.0 - w);
    }

    // Opaque dielectric: fixed-reflectance specular lobe plus a textured
    // diffuse lobe.
    let specular_rays = tri.specular(n, &ray, scene.specular_ray_number, rng);
    let c_s = average_radiance(scene, bvh, depth, hit_point, &specular_rays, rng)
        * FIXED_SPECULAR_REFLECTANCE;

    let diffuse_rays = tri.diffuse(n, &ray, scene.diffuse_ray_number, rng);
    let c_d_raw = average_radiance(scene, bvh, depth, hit_point, &diffuse_rays, rng);

    let uv_weight = sample_texture(scene, tri, hit.alpha, hit.beta);
    let c_d = c_d_raw.hadamard(tri.color).hadamard(uv_weight);

    c_s + c_d * n.dot(ray.direction).abs()
}

/// Traces one ray per direction in `directions` from `origin` and averages
/// the resulting radiance.
fn average_radiance(
    scene: &Scene,
    bvh: Option<&Bvh>,
    depth: u32,
    origin: crate::math::Point3,
    directions: &[Vec3],
    rng: &mut dyn RngCore,
) -> Color {
    let sum = directions.iter().fold(Color::zero(), |acc, &dir| {
        acc + color(scene, bvh, depth + 1, Ray::new(origin, dir), rng)
    });
    sum / directions.len() as f64
}

/// Returns the barycentric-interpolated texture sample for the hit, or
/// `Color::ones()` (a no-op multiplier) if the triangle has no texture.
fn sample_texture(scene: &Scene, tri: &crate::triangle::Triangle, alpha: f64, beta: f64) -> Color {
    if tri.texture_index < 0 {
        return Color::ones();
    }
    let Some(texture) = scene.textures.get(tri.texture_index as usize) else {
        return Color::ones();
    };
    let weight2 = 1.0 - alpha - beta;
    let u = tri.uv0.0 * alpha + tri.uv1.0 * beta + tri.uv2.0 * weight2;
    let v = tri.uv0.1 * alpha + tri.uv1.1 * beta + tri.uv2.1 * weight2;
    texture.sample(u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::Point3;
    use crate::triangle::Triangle;

    fn scene_with(triangles: Vec<Triangle>, background: Color) -> Scene {
        Scene {
            triangles,
            textures: Vec::new(),
            skybox: None,
            camera: Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::zero(), 50.0, 0.0, 4, 4),
            background_color: background,
            max_recursion_depth: 4,
            diffuse_ray_number: 4,
            specular_ray_number: 4,
            render_num: 1,
            width: 4,
            height: 4,
        }
    }

    fn facing_emitter() -> Triangle {
        Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            Color::ones(),
            0.0,
            1.0,
            -1,
            false,
            true,
            false,
            Some(Vec3::new(0.0, 0.0, 1.0)),
        )
    }

    #[test]
    fn empty_scene_returns_background() {
        let scene = scene_with(vec![], Color::new(0.2, 0.4, 0.6));
        let mut rng = rand::thread_rng();
        let ray = Ray::new(Point3::new(100.0, 100.0, 100.0), Vec3::new(0.0, 0.0, -1.0));
        let c = color(&scene, None, 0, ray, &mut rng);
        assert_eq!(c, scene.background_color);
    }

    #[test]
    fn emitter_returns_its_own_color_unmodified() {
        let tri = facing_emitter();
        let scene = scene_with(vec![tri.clone()], Color::zero());
        let bvh = Bvh::build(&scene.triangles);
        let mut rng = rand::thread_rng();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let c = color(&scene, Some(&bvh), 0, ray, &mut rng);
        assert_eq!(c, Color::ones());
    }

    #[test]
    fn max_depth_terminates_with_black() {
        let tri = facing_emitter();
        let mut scene = scene_with(vec![tri], Color::zero());
        scene.max_recursion_depth = 0;
        let bvh = Bvh::build(&scene.triangles);
        let mut rng = rand::thread_rng();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let c = color(&scene, Some(&bvh), 0, ray, &mut rng);
        assert_eq!(c, Color::zero());
    }

    #[test]
    fn back_face_hit_on_opaque_surface_is_black() {
        // Ray approaches from behind the oriented normal.
        let tri = Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            Color::ones(),
            0.0,
            1.0,
            -1,
            false,
            false,
            false,
            Some(Vec3::new(0.0, 0.0, -1.0)),
        );
        let scene = scene_with(vec![tri], Color::zero());
        let bvh = Bvh::build(&scene.triangles);
        let mut rng = rand::thread_rng();
        // Ray travels in -z, hitting the triangle whose oriented normal faces -z too.
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let c = color(&scene, Some(&bvh), 0, ray, &mut rng);
        assert_eq!(c, Color::zero());
    }
}
