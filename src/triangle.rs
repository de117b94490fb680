use crate::math::{Color, Point3, Ray, Vec3};

/// Texture (u, v) coordinate pair for a single vertex.
pub type Uv = (f64, f64);

/// A single triangle primitive plus the material attributes the integrator
/// branches on. Rather than dynamic dispatch over a material trait, the
/// triangle carries three tag bits (`is_metal`, `is_light_emitting`,
/// `is_transparent`) that the integrator matches on directly — see DESIGN.md.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    pub n0: Vec3,
    pub n1: Vec3,
    pub n2: Vec3,
    pub plane_normal: Vec3,
    pub uv0: Uv,
    pub uv1: Uv,
    pub uv2: Uv,
    pub color: Color,
    pub specular_roughness: f64,
    pub refractive_index: f64,
    pub texture_index: i32,
    pub is_metal: bool,
    pub is_light_emitting: bool,
    pub is_transparent: bool,
}

/// The outcome of a successful ray-triangle intersection: the ray parameter
/// and the barycentric weights on `v0` and `v1` (the weight on `v2` is
/// `1 - alpha - beta`).
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    pub t: f64,
    pub alpha: f64,
    pub beta: f64,
}

#[allow(clippy::too_many_arguments)]
impl Triangle {
    /// Constructs a triangle from explicit per-vertex data. `normal_side`,
    /// when given, is used only to orient the plane normal: it is flipped so
    /// that `plane_normal · normal_side >= 0`, per the Triangle invariant.
    pub fn new(
        v0: Point3,
        v1: Point3,
        v2: Point3,
        n0: Option<Vec3>,
        n1: Option<Vec3>,
        n2: Option<Vec3>,
        uv0: Uv,
        uv1: Uv,
        uv2: Uv,
        color: Color,
        specular_roughness: f64,
        refractive_index: f64,
        texture_index: i32,
        is_metal: bool,
        is_light_emitting: bool,
        is_transparent: bool,
        normal_side: Option<Vec3>,
    ) -> Self {
        let mut plane_normal = (v1 - v0).cross(v2 - v0).normalized();
        if let Some(side) = normal_side {
            if plane_normal.dot(side) < 0.0 {
                plane_normal = -plane_normal;
            }
        }
        Self {
            v0,
            v1,
            v2,
            n0: n0.unwrap_or(plane_normal),
            n1: n1.unwrap_or(plane_normal),
            n2: n2.unwrap_or(plane_normal),
            plane_normal,
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
        }
    }

    pub fn centroid(&self) -> Point3 {
        let min = self.min_vertex();
        let max = self.max_vertex();
        (min + max) * 0.5
    }

    pub fn min_vertex(&self) -> Point3 {
        Point3::new(
            self.v0.x.min(self.v1.x).min(self.v2.x),
            self.v0.y.min(self.v1.y).min(self.v2.y),
            self.v0.z.min(self.v1.z).min(self.v2.z),
        )
    }

    pub fn max_vertex(&self) -> Point3 {
        Point3::new(
            self.v0.x.max(self.v1.x).max(self.v2.x),
            self.v0.y.max(self.v1.y).max(self.v2.y),
            self.v0.z.max(self.v1.z).max(self.v2.z),
        )
    }

    /// Ray-plane intersection followed by a barycentric accept/reject test.
    /// Rejects `t <= 1e-3`, which filters both self-intersection at an
    /// emitting surface and the NaN produced by rays parallel to the plane.
    pub fn hit(&self, ray: &Ray) -> Option<TriangleHit> {
        let denom = self.plane_normal.dot(ray.direction);
        let t = self.plane_normal.dot(self.v0 - ray.origin) / denom;
        if !(t > 1e-3) {
            return None;
        }
        let p = ray.at(t);
        let (alpha, beta) = solve_barycentric(self.v0, self.v1, self.v2, p)?;
        if alpha >= 0.0 && beta >= 0.0 && alpha + beta <= 1.0 {
            Some(TriangleHit { t, alpha, beta })
        } else {
            None
        }
    }

    /// Cosine-weighted diffuse lobe: orient `n` against the incoming ray,
    /// then for each sample take `n + u` where `u` is a random direction on
    /// the unit sphere, normalized.
    pub fn diffuse(&self, n: Vec3, ray: &Ray, count: u32, rng: &mut dyn rand::RngCore) -> Vec<Vec3> {
        let n = if ray.direction.dot(n) < 0.0 { n } else { -n };
        (0..count)
            .map(|_| {
                let u = Vec3::random_in_unit_ball(rng).normalized();
                (n + u).normalized()
            })
            .collect()
    }

    /// Ideal mirror direction jittered by `specular_roughness · u`, `u`
    /// uniform in the unit ball.
    pub fn specular(&self, n: Vec3, ray: &Ray, count: u32, rng: &mut dyn rand::RngCore) -> Vec<Vec3> {
        let mirror = ray.direction.reflect(n);
        (0..count)
            .map(|_| {
                let u = Vec3::random_in_unit_ball(rng);
                (mirror + u * self.specular_roughness).normalized()
            })
            .collect()
    }

    /// Schlick-approximated refraction. Returns `(refraction_weight,
    /// transmitted_direction)`; on total internal reflection returns
    /// `(0.0, Vec3::zero())` and the caller should fall back to the
    /// specular term entirely.
    pub fn refract(&self, n: Vec3, ray: &Ray) -> (f64, Vec3) {
        let c = ray.direction.dot(n);
        let eta = if c > 0.0 {
            self.refractive_index
        } else {
            1.0 / self.refractive_index
        };
        let n_prime = if c > 0.0 { -n } else { n };
        let cos_theta = c.abs();
        let sin2_theta_t = eta * eta * (1.0 - cos_theta * cos_theta);
        if sin2_theta_t > 1.0 {
            return (0.0, Vec3::zero());
        }
        let transmitted =
            eta * (ray.direction + n_prime * cos_theta) - n_prime * (1.0 - sin2_theta_t).sqrt();
        let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
        let reflectance = r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5);
        (1.0 - reflectance, transmitted.normalized())
    }
}

/// Solves the 3x2 least-squares system `[v0-v2 | v1-v2] · [alpha; beta] =
/// p-v2` via full-pivot Gaussian elimination over the three rows (one of
/// which is redundant when `p` lies exactly in the triangle's plane).
fn solve_barycentric(v0: Point3, v1: Point3, v2: Point3, p: Point3) -> Option<(f64, f64)> {
    let col_a = v0 - v2;
    let col_b = v1 - v2;
    let col_c = p - v2;
    let mut rows = [
        [col_a.x, col_b.x, col_c.x],
        [col_a.y, col_b.y, col_c.y],
        [col_a.z, col_b.z, col_c.z],
    ];

    let pivot0 = (0..3)
        .max_by(|&i, &j| rows[i][0].abs().partial_cmp(&rows[j][0].abs()).unwrap())
        .unwrap();
    if rows[pivot0][0].abs() < 1e-12 {
        return None;
    }
    rows.swap(0, pivot0);
    let d0 = rows[0][0];
    for c in rows[0].iter_mut() {
        *c /= d0;
    }
    for i in 1..3 {
        let factor = rows[i][0];
        for c in 0..3 {
            rows[i][c] -= factor * rows[0][c];
        }
    }

    let pivot1 = if rows[2][1].abs() > rows[1][1].abs() { 2 } else { 1 };
    if rows[pivot1][1].abs() < 1e-12 {
        return None;
    }
    rows.swap(1, pivot1);
    let d1 = rows[1][1];
    for c in rows[1].iter_mut() {
        *c /= d1;
    }
    let factor = rows[0][1];
    for c in 0..3 {
        rows[0][c] -= factor * rows[1][c];
    }

    Some((rows[0][2], rows[1][2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            Color::new(1.0, 1.0, 1.0),
            0.0,
            1.5,
            -1,
            false,
            false,
            false,
            None,
        )
    }

    #[test]
    fn vertex_normals_default_to_plane_normal() {
        let tri = unit_triangle();
        assert_eq!(tri.n0, tri.plane_normal);
        assert_eq!(tri.n2, tri.plane_normal);
    }

    #[test]
    fn normal_side_flips_plane_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            Color::zero(),
            0.0,
            1.0,
            -1,
            false,
            false,
            false,
            Some(Vec3::new(0.0, 0.0, -1.0)),
        );
        assert!(tri.plane_normal.z < 0.0);
    }

    #[test]
    fn intersection_round_trip_hits_centroid_ray() {
        let tri = unit_triangle();
        let centroid = tri.centroid();
        let d = 3.0;
        let origin = centroid + tri.plane_normal * d;
        let ray = Ray::new(origin, -tri.plane_normal);
        let hit = tri.hit(&ray).expect("ray through centroid must hit");
        assert!((hit.t - d).abs() < 1e-4);
        assert!((hit.alpha - 1.0 / 3.0).abs() < 1e-4);
        assert!((hit.beta - 1.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn parallel_ray_is_rejected() {
        let tri = unit_triangle();
        let ray = Ray::new(Point3::new(0.2, 0.2, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn self_intersection_epsilon_is_rejected() {
        let tri = unit_triangle();
        let p = tri.centroid();
        // A ray originating essentially on the surface must not re-hit it.
        let ray = Ray::new(p - tri.plane_normal * 1e-4, -tri.plane_normal);
        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn diffuse_directions_are_in_oriented_hemisphere() {
        let tri = unit_triangle();
        let n = Vec3::new(0.0, 0.0, 1.0);
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let mut rng = rand::thread_rng();
        for d in tri.diffuse(n, &ray, 200, &mut rng) {
            assert!(d.dot(n) > 0.0);
        }
    }

    #[test]
    fn refract_with_unit_ratio_passes_straight_through() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            Color::zero(),
            0.0,
            1.0,
            -1,
            false,
            false,
            true,
            None,
        );
        let n = Vec3::new(0.0, 0.0, 1.0);
        let incident = Vec3::new(0.3, 0.1, -0.94).normalized();
        let ray = Ray::new(Point3::zero(), incident);
        let (w, dir) = tri.refract(n, &ray);
        assert!((w - 1.0).abs() < 1e-9);
        assert!((dir - incident).length() < 1e-6);
    }

    #[test]
    fn total_internal_reflection_returns_zero_weight() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            None,
            None,
            None,
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            Color::zero(),
            0.0,
            1.5,
            -1,
            false,
            false,
            true,
            None,
        );
        let n = Vec3::new(0.0, 0.0, 1.0);
        // A grazing ray inside the denser medium exceeding the critical angle.
        let incident = Vec3::new(0.99, 0.0, 0.1411).normalized();
        let ray = Ray::new(Point3::zero(), incident);
        let (w, dir) = tri.refract(n, &ray);
        assert_eq!(w, 0.0);
        assert_eq!(dir, Vec3::zero());
    }
}
