use cgmath::InnerSpace;
use skyview_base::{Aabb, Point3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn from_bounds(bounds: &Aabb) -> Self {
        Self {
            center: bounds.center(),
            radius: bounds.size().magnitude() * 0.5,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !self.radius.is_finite() || self.radius <= f64::EPSILON
    }
}

/// Camera distance from the sphere center that fits the whole sphere into a
/// vertical field of view of `fov_deg`. `None` for a degenerate sphere or fov.
pub fn framing_distance(sphere: &BoundingSphere, fov_deg: f64) -> Option<f64> {
    if sphere.is_degenerate() || !(1.0..179.0).contains(&fov_deg) {
        return None;
    }
    let half = (fov_deg * 0.5).to_radians();
    Some(sphere.radius / half.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_encloses_box_diagonal() {
        let bounds = Aabb {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let sphere = BoundingSphere::from_bounds(&bounds);
        assert!((sphere.radius - 3.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(sphere.center, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_sphere_has_no_framing() {
        let point = Point3::new(2.0, 2.0, 2.0);
        let bounds = Aabb {
            min: point,
            max: point,
        };
        let sphere = BoundingSphere::from_bounds(&bounds);
        assert!(framing_distance(&sphere, 60.0).is_none());
    }

    #[test]
    fn framing_grows_with_radius() {
        let small = BoundingSphere {
            center: Point3::new(0.0, 0.0, 0.0),
            radius: 1.0,
        };
        let large = BoundingSphere { radius: 10.0, ..small };
        let near = framing_distance(&small, 60.0).unwrap_or_default();
        let far = framing_distance(&large, 60.0).unwrap_or_default();
        assert!((near - 2.0).abs() < 1e-9);
        assert!(far > near);
    }
}
