use crate::math::*;

/// A fixed-sensor pinhole camera modeled on a 36×24mm frame. Given an
/// origin, a look-at target, a focal length in millimeters, and a roll
/// angle about the view axis, the camera precomputes a `left_up_corner`
/// plus per-pixel `right_step`/`down_step` vectors so that `get_rays`
/// is a handful of vector adds per call.
///
/// Unlike a thin-lens model, this camera has no aperture or focus
/// distance: every ray originates at a single point. Depth of field is
/// not modeled.
pub struct Camera {
    origin: Point3,
    left_up_corner: Vec3,
    right_step: Vec3,
    down_step: Vec3,
}

/// Sub-pixel offsets for 4x supersampling, in raster order:
/// ```text
/// 1  2
/// 3  4
/// ```
const X_OFFSET: [f64; 4] = [-0.25, 0.25, -0.25, 0.25];
const Y_OFFSET: [f64; 4] = [-0.25, -0.25, 0.25, 0.25];

impl Camera {
    /// Builds the camera basis from `origin`/`look_at`, a focal length in
    /// millimeters, a roll angle in degrees about the view direction, and
    /// the target image dimensions (needed to size the virtual sensor and
    /// the per-pixel step vectors).
    pub fn new(
        origin: Point3,
        look_at: Point3,
        focal_length_mm: f64,
        roll_degrees: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let f_width = width as f64;
        let f_height = height as f64;

        let direction = (look_at - origin).normalized();
        let right = direction.cross(Vec3::unit_y()).normalized();
        let down = direction.cross(right).normalized();

        let aspect = f_width / f_height;
        let (right_half, up_half) = if aspect >= 1.5 {
            (
                right * (18.0 / focal_length_mm),
                down * (18.0 / focal_length_mm / aspect),
            )
        } else {
            (
                right * (12.0 / focal_length_mm * aspect),
                down * (12.0 / focal_length_mm),
            )
        };

        let mut left_up_corner = direction - right_half - up_half;
        let mut right_step = right_half / (f_width / 2.0);
        let mut down_step = up_half / (f_height / 2.0);

        if roll_degrees != 0.0 {
            let theta = roll_degrees.to_radians();
            left_up_corner = rotate_about_axis(left_up_corner, direction, theta);
            right_step = rotate_about_axis(right_step, direction, theta);
            down_step = rotate_about_axis(down_step, direction, theta);
        }

        Camera {
            origin,
            left_up_corner,
            right_step,
            down_step,
        }
    }

    /// Returns the four supersampled primary rays for pixel `(x, y)`,
    /// normalized so downstream BVH traversal can treat `t` as world-space
    /// distance directly.
    pub fn get_rays(&self, x: u32, y: u32) -> [Ray; 4] {
        std::array::from_fn(|i| {
            let x_temp = x as f64 + X_OFFSET[i];
            let y_temp = y as f64 + Y_OFFSET[i];
            let direction =
                self.left_up_corner + self.right_step * x_temp + self.down_step * y_temp;
            Ray::new(self.origin, direction.normalized())
        })
    }
}

/// Rotates `v` about the unit axis `axis` by `theta` radians (Rodrigues'
/// rotation formula).
fn rotate_about_axis(v: Vec3, axis: Vec3, theta: f64) -> Vec3 {
    let (sin_t, cos_t) = theta.sin_cos();
    v * cos_t + axis.cross(v) * sin_t + axis * axis.dot(v) * (1.0 - cos_t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_toward_look_at() {
        let cam = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            0.0,
            800,
            600,
        );
        let rays = cam.get_rays(400, 300);
        for ray in rays {
            assert!((ray.direction.length() - 1.0).abs() < 1e-9);
            assert!(ray.direction.z < 0.0);
        }
    }

    #[test]
    fn four_samples_are_distinct() {
        let cam = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            0.0,
            800,
            600,
        );
        let rays = cam.get_rays(100, 100);
        assert!(rays[0].direction != rays[1].direction);
        assert!(rays[0].direction != rays[2].direction);
    }

    #[test]
    fn roll_rotates_step_vectors_but_preserves_length() {
        let straight = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            0.0,
            800,
            600,
        );
        let rolled = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            45.0,
            800,
            600,
        );
        let a = straight.get_rays(0, 0)[0].direction;
        let b = rolled.get_rays(0, 0)[0].direction;
        assert!((a.length() - b.length()).abs() < 1e-9);
        assert!((a - b).length() > 1e-6);
    }

    #[test]
    fn wide_aspect_uses_horizontal_sensor_edge() {
        let wide = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            0.0,
            1920,
            1080,
        );
        let tall = Camera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::zero(),
            50.0,
            0.0,
            1080,
            1920,
        );
        let a = wide.get_rays(960, 540)[0].direction;
        let b = tall.get_rays(540, 960)[0].direction;
        assert!((a.length() - 1.0).abs() < 1e-9);
        assert!((b.length() - 1.0).abs() < 1e-9);
    }
}
