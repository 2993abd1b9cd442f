use std::collections::HashMap;
use std::time::Duration;

use cgmath::{SquareMatrix, Transform as _};
use serde::{Deserialize, Serialize};
use skyview_base::{AnnotationId, Axis, Color, NodeId, Point3, Vector3};
use skyview_scene::{ModelSpec, SceneGraph, SceneNode, Transform};
use tracing::{debug, info, warn};

use crate::annotation::Annotation;
use crate::config::StudioConfig;
use crate::cut::{CutPlane, CutRanges};
use crate::error::Result;
use crate::measure::{Measurement, MeasurementPhase, MeasurementResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    SelectionChanged(Option<NodeId>),
    TransformModeChanged(TransformMode),
    CutPlaneChanged,
    MeasurementChanged,
    AnnotationModeChanged(bool),
    AnnotationsChanged,
    ExplodeChanged(bool),
    GridChanged(bool),
    /// In-place node edits; read `scene_version()` for the current value.
    SceneMutated,
    ModelLoaded(NodeId),
    ModelRemoved(NodeId),
    SceneReplaced,
    SessionRestored,
    Error(String),
}

/// Session-lifetime interaction state. Owns the scene graph; every mutation
/// of node state or interaction state goes through this type.
#[derive(Debug)]
pub struct InteractionStore {
    config: StudioConfig,
    scene: SceneGraph,
    selected: Option<NodeId>,
    transform_mode: TransformMode,
    cut: CutPlane,
    measurement: Measurement,
    annotation_mode: bool,
    annotations: Vec<Annotation>,
    exploded: bool,
    grid_visible: bool,
    original_positions: HashMap<NodeId, Vector3>,
    scene_version: u64,
    revision: u64,
    clock: Duration,
    last_error: Option<String>,
    events: Vec<StoreEvent>,
}

impl Default for InteractionStore {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl InteractionStore {
    pub fn new(config: StudioConfig) -> Self {
        Self::with_scene(config, SceneGraph::new())
    }

    /// Invalid config fields are replaced by their defaults.
    pub fn with_scene(config: StudioConfig, scene: SceneGraph) -> Self {
        if let Err(error) = config.validate() {
            warn!(%error, "studio config out of range, using defaults for invalid fields");
        }
        let mut store = Self {
            config: config.sanitized(),
            scene,
            selected: None,
            transform_mode: TransformMode::default(),
            cut: CutPlane::default(),
            measurement: Measurement::default(),
            annotation_mode: false,
            annotations: Vec::new(),
            exploded: false,
            grid_visible: true,
            original_positions: HashMap::new(),
            scene_version: 0,
            revision: 0,
            clock: Duration::ZERO,
            last_error: None,
            events: Vec::new(),
        };
        store.refresh_cut_ranges();
        store.events.clear();
        store
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_version(&self) -> u64 {
        self.scene_version
    }

    /// Bumped on every state change of any kind.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn emit(&mut self, event: StoreEvent) {
        self.revision += 1;
        if event == StoreEvent::SceneMutated && self.events.last() == Some(&StoreEvent::SceneMutated)
        {
            return;
        }
        self.events.push(event);
    }

    fn touch_scene(&mut self) {
        self.scene_version += 1;
        self.emit(StoreEvent::SceneMutated);
    }

    // selection

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected.filter(|id| self.scene.contains(*id))
    }

    pub fn selected(&self) -> Option<&SceneNode> {
        self.selected.and_then(|id| self.scene.node(id))
    }

    /// Unknown ids clear the selection instead of failing: the graph may be
    /// mid-rebuild.
    pub fn select_by_id(&mut self, id: Option<NodeId>) {
        let resolved = id.filter(|id| self.scene.contains(*id));
        if id.is_some() && resolved.is_none() {
            debug!(node = ?id, "selection target not found");
        }
        if self.selected != resolved {
            self.selected = resolved;
            self.emit(StoreEvent::SelectionChanged(resolved));
        }
    }

    pub fn transform_mode(&self) -> TransformMode {
        self.transform_mode
    }

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        if self.transform_mode != mode {
            self.transform_mode = mode;
            self.emit(StoreEvent::TransformModeChanged(mode));
        }
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        if self.grid_visible != visible {
            self.grid_visible = visible;
            self.emit(StoreEvent::GridChanged(visible));
        }
    }

    // cut plane

    pub fn cut(&self) -> &CutPlane {
        &self.cut
    }

    pub fn set_cut_axis(&mut self, axis: Axis) {
        self.cut.set_axis(axis);
        self.emit(StoreEvent::CutPlaneChanged);
    }

    pub fn set_cut_offset(&mut self, value: f64) {
        let before = self.cut.offset();
        self.cut.set_offset(value);
        if self.cut.offset() != before {
            self.emit(StoreEvent::CutPlaneChanged);
        }
    }

    /// No-op (returns `false`) when `ranges` equal the current ranges.
    pub fn set_cut_ranges(&mut self, ranges: CutRanges) -> bool {
        let changed = self.cut.set_ranges(ranges);
        if changed {
            self.emit(StoreEvent::CutPlaneChanged);
        }
        changed
    }

    /// Derives cut ranges from the scene box. Keeps the current ranges when
    /// the scene has no geometry.
    pub fn refresh_cut_ranges(&mut self) -> bool {
        match self.scene.scene_bounds() {
            Some(bounds) => self.set_cut_ranges(bounds.axis_ranges()),
            None => false,
        }
    }

    pub fn set_cut_enabled(&mut self, enabled: bool) {
        if self.cut.enabled != enabled {
            self.cut.enabled = enabled;
            self.emit(StoreEvent::CutPlaneChanged);
        }
    }

    pub fn set_cut_visible(&mut self, visible: bool) {
        if self.cut.visible != visible {
            self.cut.visible = visible;
            self.emit(StoreEvent::CutPlaneChanged);
        }
    }

    pub fn set_cut_color(&mut self, color: Color) {
        if self.cut.color != color {
            self.cut.color = color;
            self.emit(StoreEvent::CutPlaneChanged);
        }
    }

    pub fn restore_cut(&mut self, axis: Axis, ranges: CutRanges, offset: f64, visible: bool) {
        self.cut.restore(axis, ranges, offset);
        self.cut.visible = visible;
        self.emit(StoreEvent::CutPlaneChanged);
    }

    // measurement

    pub fn measurement_active(&self) -> bool {
        self.measurement.is_active()
    }

    pub fn measurement_phase(&self) -> MeasurementPhase {
        self.measurement.phase()
    }

    pub fn measurement_points(&self) -> &[Point3] {
        self.measurement.points()
    }

    pub fn measurement_result(&self) -> Option<MeasurementResult> {
        self.measurement.result()
    }

    pub fn toggle_measurement(&mut self) {
        self.measurement.toggle();
        self.emit(StoreEvent::MeasurementChanged);
    }

    pub fn add_measurement_point(&mut self, point: Point3) -> bool {
        let timeout = self.config.measurement_timeout();
        if !self.measurement.add_point(point, self.clock, timeout) {
            return false;
        }
        if let Some(result) = self.measurement.result() {
            debug!(distance = result.distance, "measurement resolved");
        }
        self.emit(StoreEvent::MeasurementChanged);
        true
    }

    fn reset_measurement(&mut self) {
        if self.measurement.phase() != MeasurementPhase::Idle {
            self.measurement.reset();
            self.emit(StoreEvent::MeasurementChanged);
        }
    }

    /// Advances the session clock; fires the measurement auto-reset when due.
    pub fn advance_clock(&mut self, dt: Duration) {
        self.clock += dt;
        if self.measurement.expire(self.clock) {
            debug!("measurement display timed out");
            self.emit(StoreEvent::MeasurementChanged);
        }
    }

    // annotations

    pub fn annotation_mode(&self) -> bool {
        self.annotation_mode
    }

    pub fn set_annotation_mode(&mut self, active: bool) {
        if self.annotation_mode != active {
            self.annotation_mode = active;
            self.emit(StoreEvent::AnnotationModeChanged(active));
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn add_annotation(&mut self, position: Point3) -> AnnotationId {
        let annotation = Annotation::new(position);
        let id = annotation.id;
        self.annotations.push(annotation);
        self.emit(StoreEvent::AnnotationsChanged);
        id
    }

    pub fn update_annotation(&mut self, id: AnnotationId, text: impl Into<String>) -> bool {
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        annotation.text = text.into();
        self.emit(StoreEvent::AnnotationsChanged);
        true
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        if self.annotations.len() == before {
            return false;
        }
        self.emit(StoreEvent::AnnotationsChanged);
        true
    }

    pub fn replace_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.emit(StoreEvent::AnnotationsChanged);
    }

    // node edits

    /// Sets visibility on `id` and every mesh below it.
    pub fn set_mesh_visibility(&mut self, id: NodeId, visible: bool) -> bool {
        if !self.scene.contains(id) {
            return false;
        }
        for node_id in self.scene.subtree(id) {
            if let Some(node) = self.scene.node_mut(node_id) {
                if node_id == id || node.is_mesh() {
                    node.visible = visible;
                }
            }
        }
        self.touch_scene();
        true
    }

    pub fn update_material_color(&mut self, id: NodeId, color: Color) -> bool {
        let Some(mesh) = self.scene.node_mut(id).and_then(SceneNode::mesh_mut) else {
            return false;
        };
        mesh.material.color = color;
        self.touch_scene();
        true
    }

    /// Opacity is clamped into `[0, 1]`; below 1 the material turns
    /// transparent.
    pub fn update_material_opacity(&mut self, id: NodeId, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        let Some(mesh) = self.scene.node_mut(id).and_then(SceneNode::mesh_mut) else {
            return false;
        };
        mesh.material.set_opacity(opacity);
        self.touch_scene();
        true
    }

    pub fn set_node_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        let Some(node) = self.scene.node_mut(id) else {
            return false;
        };
        let delta = transform.position - node.transform.position;
        node.transform = transform;
        self.shift_original_position(id, delta);
        self.touch_scene();
        true
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Vector3) -> bool {
        let Some(node) = self.scene.node_mut(id) else {
            return false;
        };
        let delta = position - node.transform.position;
        node.transform.position = position;
        self.shift_original_position(id, delta);
        self.touch_scene();
        true
    }

    /// Explode tween step; leaves the assembled position memo untouched.
    pub(crate) fn tween_node_position(&mut self, id: NodeId, position: Vector3) -> bool {
        let Some(node) = self.scene.node_mut(id) else {
            return false;
        };
        node.transform.position = position;
        self.touch_scene();
        true
    }

    /// Moves `id` (in its parent's space) so that its world box center lands
    /// on the scene box center.
    pub fn snap_object_to_root(&mut self, id: NodeId) -> bool {
        if self.scene.root().is_none() || !self.scene.contains(id) {
            return false;
        }
        let (Some(scene_center), Some(node_center)) =
            (self.scene.scene_bounds().map(|b| b.center()), self.scene.world_center(id))
        else {
            return false;
        };
        let Some(to_local) = self
            .scene
            .parent_world_matrix(id)
            .and_then(|parent| parent.invert())
        else {
            return false;
        };
        let delta = to_local.transform_vector(scene_center - node_center);
        let Some(node) = self.scene.node_mut(id) else {
            return false;
        };
        node.transform.position += delta;
        self.shift_original_position(id, delta);
        self.touch_scene();
        true
    }

    // explode

    pub fn exploded(&self) -> bool {
        self.exploded
    }

    pub fn set_exploded(&mut self, exploded: bool) {
        if self.exploded != exploded {
            self.exploded = exploded;
            self.emit(StoreEvent::ExplodeChanged(exploded));
        }
    }

    /// Records the current local position of `id` as its assembled position,
    /// unless one is already known.
    pub fn remember_original_position(&mut self, id: NodeId) -> Option<Vector3> {
        if let Some(position) = self.original_positions.get(&id) {
            return Some(*position);
        }
        let position = self.scene.node(id)?.transform.position;
        self.original_positions.insert(id, position);
        Some(position)
    }

    pub fn original_position(&self, id: NodeId) -> Option<Vector3> {
        self.original_positions.get(&id).copied()
    }

    pub fn forget_original_positions(&mut self) {
        self.original_positions.clear();
    }

    /// Explicit moves shift the assembled position by the same delta.
    fn shift_original_position(&mut self, id: NodeId, delta: Vector3) {
        if let Some(original) = self.original_positions.get_mut(&id) {
            *original += delta;
        }
    }

    // model lifecycle

    /// Inserts a ready model under the scene root and refreshes derived state.
    pub fn load_model(&mut self, spec: ModelSpec) -> Result<NodeId> {
        let name = spec.name.clone();
        let id = self.scene.insert_model(None, spec)?;
        info!(model = %id, name = %name, "model loaded");
        self.emit(StoreEvent::ModelLoaded(id));
        self.refresh_cut_ranges();
        Ok(id)
    }

    pub fn remove_model(&mut self, id: NodeId) -> bool {
        if self.scene.root() == Some(id) {
            self.clear_workspace();
            return true;
        }
        let removed = self.scene.remove_subtree(id);
        if removed.is_empty() {
            return false;
        }
        self.unregister_nodes(&removed);
        info!(model = %id, nodes = removed.len(), "model removed");
        self.emit(StoreEvent::ModelRemoved(id));
        self.refresh_cut_ranges();
        true
    }

    pub fn clear_workspace(&mut self) {
        let removed = self.scene.clear();
        self.unregister_nodes(&removed);
        self.select_by_id(None);
        self.emit(StoreEvent::SceneReplaced);
    }

    pub fn replace_scene(&mut self, scene: SceneGraph) {
        self.scene = scene;
        self.original_positions.clear();
        self.select_by_id(None);
        self.emit(StoreEvent::SceneReplaced);
        self.refresh_cut_ranges();
    }

    fn unregister_nodes(&mut self, removed: &[NodeId]) {
        for id in removed {
            self.original_positions.remove(id);
        }
        if self.selected.is_some_and(|selected| removed.contains(&selected)) {
            self.select_by_id(None);
        }
    }

    /// A model that failed to decode or render is evicted; selection and
    /// measurement are reset and the message is kept for display.
    pub fn report_render_error(&mut self, model: NodeId, message: impl Into<String>) {
        let message = message.into();
        let name = self
            .scene
            .node(model)
            .map(|node| node.name.clone())
            .unwrap_or_else(|| model.to_string());
        warn!(model = %model, error = %message, "evicting model after render failure");
        let target = self.scene.owning_model(model).unwrap_or(model);
        self.remove_model(target);
        self.select_by_id(None);
        self.reset_measurement();
        let error = crate::error::StudioError::Render {
            model: name,
            message,
        };
        self.report_error(error.to_string());
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.last_error = Some(message.clone());
        self.emit(StoreEvent::Error(message));
    }
}
