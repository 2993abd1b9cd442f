use cgmath::{InnerSpace, Transform as _};
use skyview_base::{NodeId, Point3, Vector3};

use crate::graph::SceneGraph;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub point: Point3,
    pub distance: f64,
}

pub fn ray_intersect_triangle(
    origin: Point3,
    dir: Vector3,
    a: Point3,
    b: Point3,
    c: Point3,
) -> Option<f64> {
    let eps = 1.0e-9;
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(qvec) * inv_det;
    if t > eps { Some(t) } else { None }
}

impl SceneGraph {
    /// Nearest hit of a world-space ray against visible mesh triangles.
    pub fn raycast(&self, origin: Point3, dir: Vector3) -> Option<RayHit> {
        if dir.magnitude2() <= f64::EPSILON {
            return None;
        }
        let dir = dir.normalize();
        let mut best: Option<RayHit> = None;
        for id in self.mesh_ids() {
            if !self.is_effectively_visible(id) {
                continue;
            }
            let (Some(node), Some(world)) = (self.node(id), self.world_matrix(id)) else {
                continue;
            };
            let Some(mesh) = node.mesh() else {
                continue;
            };
            for tri in &mesh.triangles {
                let Some([a, b, c]) = mesh.triangle(*tri) else {
                    continue;
                };
                let (a, b, c) = (
                    world.transform_point(a),
                    world.transform_point(b),
                    world.transform_point(c),
                );
                let Some(t) = ray_intersect_triangle(origin, dir, a, b, c) else {
                    continue;
                };
                if best.is_none_or(|hit| t < hit.distance) {
                    best = Some(RayHit {
                        node: id,
                        point: origin + dir * t,
                        distance: t,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_triangle_from_above() {
        let t = ray_intersect_triangle(
            Point3::new(0.25, 0.25, 5.0),
            Vector3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(t, Some(5.0));
    }

    #[test]
    fn ray_parallel_to_triangle_misses() {
        let t = ray_intersect_triangle(
            Point3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(t, None);
    }
}
