use std::collections::HashMap;
use std::time::Duration;

use cgmath::{InnerSpace, SquareMatrix, Transform as _};
use skyview_base::{Axis, NodeId, Vector3};
use skyview_scene::BoundingSphere;

use crate::store::InteractionStore;

const SETTLE_EPSILON: f64 = 1.0e-4;

/// Clipping plane in renderer convention: points with
/// `normal · p + constant >= 0` stay visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPlane {
    pub normal: Vector3,
    pub constant: f64,
}

impl ClipPlane {
    pub fn for_axis(axis: Axis, offset: f64) -> Self {
        Self {
            normal: -axis.unit(),
            constant: offset,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ExplodeLayout {
    offsets: HashMap<NodeId, Vector3>,
}

/// Per-frame interpolation of the cut plane and explode transitions.
///
/// Targets are read from the store on every call, so a changed axis, a
/// disabled cut or a removed node simply stops the stale animation.
#[derive(Clone, Debug, Default)]
pub struct FrameDriver {
    displayed_cut: Option<(Axis, f64)>,
    layout: Option<ExplodeLayout>,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one frame. Returns `true` while something is still moving.
    pub fn frame(&mut self, store: &mut InteractionStore, dt: Duration) -> bool {
        store.advance_clock(dt);
        let dt = dt.as_secs_f64();
        let cut_moving = self.step_cut(store, dt);
        let explode_moving = self.step_explode(store, dt);
        cut_moving || explode_moving
    }

    pub fn clip_plane(&self) -> Option<ClipPlane> {
        self.displayed_cut
            .map(|(axis, offset)| ClipPlane::for_axis(axis, offset))
    }

    pub fn displayed_cut_offset(&self) -> Option<f64> {
        self.displayed_cut.map(|(_, offset)| offset)
    }

    fn step_cut(&mut self, store: &InteractionStore, dt: f64) -> bool {
        let cut = store.cut();
        if !cut.enabled {
            self.displayed_cut = None;
            return false;
        }
        let target = cut.offset();
        match self.displayed_cut {
            Some((axis, value)) if axis == cut.axis() => {
                let alpha = damping(store.config().cut_damping, dt);
                let mut next = value + (target - value) * alpha;
                if (target - next).abs() < SETTLE_EPSILON {
                    next = target;
                }
                self.displayed_cut = Some((axis, next));
                next != target
            }
            _ => {
                self.displayed_cut = Some((cut.axis(), target));
                false
            }
        }
    }

    fn step_explode(&mut self, store: &mut InteractionStore, dt: f64) -> bool {
        let meshes = store.scene().mesh_ids();
        for id in &meshes {
            store.remember_original_position(*id);
        }

        let exploded = store.exploded();
        if exploded && self.layout.is_none() {
            self.layout = explode_layout(store, &meshes);
        }

        let alpha = damping(store.config().explode_rate, dt);
        let mut moves = Vec::new();
        let mut moving = false;
        for id in &meshes {
            let (Some(original), Some(node)) =
                (store.original_position(*id), store.scene().node(*id))
            else {
                continue;
            };
            let offset = match (&self.layout, exploded) {
                (Some(layout), true) => layout.offsets.get(id).copied(),
                _ => None,
            };
            let target = original + offset.unwrap_or(Vector3::new(0.0, 0.0, 0.0));
            let current = node.transform.position;
            if current == target {
                continue;
            }
            let mut next = current + (target - current) * alpha;
            if (target - next).magnitude() < SETTLE_EPSILON {
                next = target;
            } else {
                moving = true;
            }
            moves.push((*id, next));
        }
        for (id, position) in moves {
            store.tween_node_position(id, position);
        }

        if !exploded && !moving {
            self.layout = None;
        }
        moving
    }
}

fn damping(rate: f64, dt: f64) -> f64 {
    1.0 - (-rate * dt).exp()
}

/// Parent-space offsets pushing each mesh away from the scene center.
fn explode_layout(store: &InteractionStore, meshes: &[NodeId]) -> Option<ExplodeLayout> {
    let scene = store.scene();
    let bounds = scene.scene_bounds()?;
    let center = bounds.center();
    let sphere = BoundingSphere::from_bounds(&bounds);
    if sphere.is_degenerate() {
        return None;
    }
    let distance = sphere.radius * store.config().explode_factor;

    let mut offsets = HashMap::new();
    for id in meshes {
        let Some(part_center) = scene.world_center(*id) else {
            continue;
        };
        let direction = part_center - center;
        if direction.magnitude() < SETTLE_EPSILON {
            continue;
        }
        let Some(to_local) = scene
            .parent_world_matrix(*id)
            .and_then(|parent| parent.invert())
        else {
            continue;
        };
        offsets.insert(
            *id,
            to_local.transform_vector(direction.normalize() * distance),
        );
    }
    Some(ExplodeLayout { offsets })
}
