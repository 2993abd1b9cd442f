use skyview_base::{AnnotationId, NodeId, Point3, Vector3};
use skyview_scene::SceneGraph;

use crate::store::InteractionStore;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerHit {
    pub node: NodeId,
    pub point: Point3,
}

/// Pointer-down on the viewport. `hit` is `None` for the background.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub hit: Option<PointerHit>,
}

impl PointerEvent {
    pub fn on(node: NodeId, point: Point3) -> Self {
        Self {
            hit: Some(PointerHit { node, point }),
        }
    }

    pub fn background() -> Self {
        Self::default()
    }

    pub fn from_ray(scene: &SceneGraph, origin: Point3, dir: Vector3) -> Self {
        Self {
            hit: scene.raycast(origin, dir).map(|hit| PointerHit {
                node: hit.node,
                point: hit.point,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    MeasurementPoint(Point3),
    AnnotationPlaced(AnnotationId),
    Selected(Option<NodeId>),
    SelectionCleared,
}

/// Measurement and annotation modes take precedence over selection.
pub fn route_pointer_down(store: &mut InteractionStore, event: PointerEvent) -> PointerAction {
    let Some(hit) = event.hit else {
        store.select_by_id(None);
        return PointerAction::SelectionCleared;
    };
    if store.measurement_active() {
        store.add_measurement_point(hit.point);
        return PointerAction::MeasurementPoint(hit.point);
    }
    if store.annotation_mode() {
        return PointerAction::AnnotationPlaced(store.add_annotation(hit.point));
    }
    store.select_by_id(Some(hit.node));
    PointerAction::Selected(store.selected_id())
}
