use std::time::Duration;

use anyhow::Result;
use skyview_base::{Axis, AxisRange, NodeId, Point3, Vector3};
use skyview_scene::{MeshData, ModelSpec, Transform};
use skyview_studio::{
    CutRanges, FrameDriver, InteractionStore, MeasurementPhase, PointerAction, PointerEvent,
    StoreEvent, StudioConfig, route_pointer_down,
};

fn cube(size: f64) -> MeshData {
    let s = size;
    MeshData::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, 0.0, 0.0),
            Point3::new(s, s, 0.0),
            Point3::new(0.0, s, 0.0),
            Point3::new(0.0, 0.0, s),
            Point3::new(s, 0.0, s),
            Point3::new(s, s, s),
            Point3::new(0.0, s, s),
        ],
        vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]],
    )
}

fn aircraft() -> ModelSpec {
    ModelSpec::group("Aircraft")
        .with_child(ModelSpec::mesh("Fuselage", cube(1.0)))
        .with_child(
            ModelSpec::mesh("Wing", cube(1.0))
                .with_transform(Transform::from_position(Vector3::new(4.0, 0.0, 0.0))),
        )
}

fn ranges() -> CutRanges {
    CutRanges {
        x: AxisRange::new(0.0, 10.0),
        y: AxisRange::new(-2.0, 2.0),
        z: AxisRange::new(5.0, 6.0),
    }
}

#[test]
fn axis_change_recenters_offset() {
    let mut store = InteractionStore::default();
    store.set_cut_ranges(ranges());
    store.set_cut_offset(9.0);

    store.set_cut_axis(Axis::Z);
    assert_eq!(store.cut().axis(), Axis::Z);
    assert_eq!(store.cut().offset(), 5.5);
}

#[test]
fn offset_is_clamped_to_active_range() {
    let mut store = InteractionStore::default();
    store.set_cut_ranges(ranges());

    store.set_cut_offset(42.0);
    assert_eq!(store.cut().offset(), 10.0);
    store.set_cut_offset(-3.0);
    assert_eq!(store.cut().offset(), 0.0);
}

#[test]
fn identical_ranges_do_not_notify() {
    let mut store = InteractionStore::default();
    assert!(store.set_cut_ranges(ranges()));
    store.drain_events();
    let revision = store.revision();

    assert!(!store.set_cut_ranges(ranges()));
    assert_eq!(store.revision(), revision);
    assert!(store.drain_events().is_empty());
}

#[test]
fn loading_a_model_derives_cut_ranges() -> Result<()> {
    let mut store = InteractionStore::default();
    store.load_model(aircraft())?;
    let x = store.cut().ranges().x;
    assert_eq!((x.min, x.max), (0.0, 5.0));
    assert!(x.contains(store.cut().offset()));
    Ok(())
}

#[test]
fn measurement_pairs_slide_and_expire() {
    let mut store = InteractionStore::default();
    assert!(!store.add_measurement_point(Point3::new(0.0, 0.0, 0.0)));

    store.toggle_measurement();
    assert_eq!(store.measurement_phase(), MeasurementPhase::Empty);

    store.add_measurement_point(Point3::new(0.0, 0.0, 0.0));
    assert_eq!(store.measurement_phase(), MeasurementPhase::OnePoint);
    assert!(store.measurement_result().is_none());

    store.add_measurement_point(Point3::new(3.0, 4.0, 0.0));
    let result = store.measurement_result().map(|r| (r.distance, r.midpoint));
    assert_eq!(result, Some((5.0, Point3::new(1.5, 2.0, 0.0))));

    store.add_measurement_point(Point3::new(3.0, 4.0, 12.0));
    assert_eq!(
        store.measurement_points(),
        &[Point3::new(3.0, 4.0, 0.0), Point3::new(3.0, 4.0, 12.0)]
    );
    assert_eq!(store.measurement_result().map(|r| r.distance), Some(12.0));

    store.advance_clock(Duration::from_secs(1));
    assert_eq!(store.measurement_phase(), MeasurementPhase::Resolved);
    store.advance_clock(Duration::from_secs(3));
    assert_eq!(store.measurement_phase(), MeasurementPhase::Idle);
    assert!(store.measurement_points().is_empty());
}

#[test]
fn unknown_selection_clears() -> Result<()> {
    let mut store = InteractionStore::default();
    let model = store.load_model(aircraft())?;
    store.select_by_id(Some(model));
    assert_eq!(store.selected_id(), Some(model));

    store.select_by_id(Some(NodeId::new()));
    assert_eq!(store.selected_id(), None);
    assert!(store.selected().is_none());
    Ok(())
}

#[test]
fn hiding_a_group_hides_its_meshes() -> Result<()> {
    let mut store = InteractionStore::default();
    let model = store.load_model(aircraft())?;
    let version = store.scene_version();

    assert!(store.set_mesh_visibility(model, false));
    let scene = store.scene();
    assert!(
        scene
            .subtree(model)
            .into_iter()
            .all(|id| scene.node(id).is_some_and(|node| !node.visible))
    );
    assert!(store.scene_version() > version);

    assert!(store.set_mesh_visibility(model, true));
    let scene = store.scene();
    assert!(scene.mesh_ids().into_iter().all(|id| scene.is_effectively_visible(id)));
    assert!(!store.set_mesh_visibility(NodeId::new(), true));
    Ok(())
}

#[test]
fn opacity_below_one_turns_transparent() -> Result<()> {
    let mut store = InteractionStore::default();
    let model = store.load_model(ModelSpec::mesh("Cube", cube(1.0)))?;

    assert!(store.update_material_opacity(model, 1.7));
    let material = store.scene().node(model).and_then(|n| n.material().copied());
    assert_eq!(material.map(|m| (m.opacity, m.transparent)), Some((1.0, false)));

    assert!(store.update_material_opacity(model, 0.25));
    let material = store.scene().node(model).and_then(|n| n.material().copied());
    assert_eq!(material.map(|m| (m.opacity, m.transparent)), Some((0.25, true)));
    Ok(())
}

#[test]
fn annotation_edits_on_unknown_ids_are_no_ops() {
    let mut store = InteractionStore::default();
    let id = store.add_annotation(Point3::new(1.0, 2.0, 3.0));
    assert_eq!(store.annotations()[0].text, "New annotation");
    let revision = store.revision();

    assert!(!store.update_annotation(skyview_base::AnnotationId::new(), "Flap"));
    assert!(!store.remove_annotation(skyview_base::AnnotationId::new()));
    assert_eq!(store.revision(), revision);

    assert!(store.update_annotation(id, "Flap hinge"));
    assert_eq!(store.annotations()[0].text, "Flap hinge");
    assert!(store.remove_annotation(id));
    assert!(store.annotations().is_empty());
}

#[test]
fn pointer_routing_prefers_measurement_then_annotation() -> Result<()> {
    let mut store = InteractionStore::default();
    let model = store.load_model(aircraft())?;
    let point = Point3::new(0.5, 0.5, 1.0);

    assert_eq!(
        route_pointer_down(&mut store, PointerEvent::on(model, point)),
        PointerAction::Selected(Some(model))
    );
    assert_eq!(
        route_pointer_down(&mut store, PointerEvent::background()),
        PointerAction::SelectionCleared
    );
    assert_eq!(store.selected_id(), None);

    store.set_annotation_mode(true);
    store.toggle_measurement();
    assert_eq!(
        route_pointer_down(&mut store, PointerEvent::on(model, point)),
        PointerAction::MeasurementPoint(point)
    );
    assert!(store.annotations().is_empty());

    store.toggle_measurement();
    let action = route_pointer_down(&mut store, PointerEvent::on(model, point));
    assert!(matches!(action, PointerAction::AnnotationPlaced(_)));
    assert_eq!(store.annotations().len(), 1);
    assert_eq!(store.selected_id(), None);
    Ok(())
}

#[test]
fn pointer_ray_hits_visible_mesh() -> Result<()> {
    let mut store = InteractionStore::default();
    store.load_model(aircraft())?;
    let wing = store.scene().find_by_name("Wing").map(|n| n.id);

    let event = PointerEvent::from_ray(
        store.scene(),
        Point3::new(4.5, 0.5, 10.0),
        Vector3::new(0.0, 0.0, -1.0),
    );
    assert_eq!(event.hit.map(|hit| hit.node), wing);
    Ok(())
}

#[test]
fn explode_moves_parts_out_and_back() -> Result<()> {
    let mut store = InteractionStore::default();
    store.load_model(aircraft())?;
    let fuselage = store.scene().find_by_name("Fuselage").map(|n| n.id);
    let wing = store.scene().find_by_name("Wing").map(|n| n.id);
    let (Some(fuselage), Some(wing)) = (fuselage, wing) else {
        panic!("parts missing");
    };
    let mut driver = FrameDriver::new();
    let step = Duration::from_millis(16);

    store.set_exploded(true);
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    let position = |store: &InteractionStore, id| store.scene().node(id).map(|n| n.transform.position);
    assert!(position(&store, fuselage).is_some_and(|p| p.x < 0.0));
    assert!(position(&store, wing).is_some_and(|p| p.x > 4.0));

    store.set_exploded(false);
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    assert_eq!(position(&store, fuselage), Some(Vector3::new(0.0, 0.0, 0.0)));
    assert_eq!(position(&store, wing), Some(Vector3::new(4.0, 0.0, 0.0)));
    Ok(())
}

#[test]
fn snapped_node_stays_put_across_frames() -> Result<()> {
    let mut store = InteractionStore::default();
    store.load_model(ModelSpec::mesh("Anchor", cube(2.0)))?;
    let part = store.load_model(
        ModelSpec::mesh("Part", cube(2.0))
            .with_transform(Transform::from_position(Vector3::new(10.0, 0.0, 0.0))),
    )?;
    let mut driver = FrameDriver::new();
    let step = Duration::from_millis(16);
    driver.frame(&mut store, step);

    assert!(store.snap_object_to_root(part));
    let snapped = store.scene().node(part).map(|n| n.transform.position);
    assert_eq!(snapped, Some(Vector3::new(5.0, 0.0, 0.0)));
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    assert_eq!(store.scene().node(part).map(|n| n.transform.position), snapped);

    assert!(store.set_node_position(part, Vector3::new(-3.0, 1.0, 0.0)));
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    assert_eq!(
        store.scene().node(part).map(|n| n.transform.position),
        Some(Vector3::new(-3.0, 1.0, 0.0))
    );
    Ok(())
}

#[test]
fn exploding_after_a_move_reassembles_at_the_moved_position() -> Result<()> {
    let mut store = InteractionStore::default();
    store.load_model(aircraft())?;
    let Some(wing) = store.scene().find_by_name("Wing").map(|n| n.id) else {
        panic!("wing missing");
    };
    let mut driver = FrameDriver::new();
    let step = Duration::from_millis(16);
    driver.frame(&mut store, step);
    assert!(store.set_node_position(wing, Vector3::new(6.0, 0.0, 0.0)));

    store.set_exploded(true);
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    store.set_exploded(false);
    for _ in 0..300 {
        driver.frame(&mut store, step);
    }
    assert_eq!(
        store.scene().node(wing).map(|n| n.transform.position),
        Some(Vector3::new(6.0, 0.0, 0.0))
    );
    Ok(())
}

#[test]
fn negative_timeout_config_falls_back_to_default() -> Result<()> {
    let config: StudioConfig = serde_json::from_str(r#"{"measurement_timeout_secs": -1.0}"#)?;
    let mut store = InteractionStore::new(config);
    assert_eq!(store.config().measurement_timeout_secs, 3.5);

    store.toggle_measurement();
    store.add_measurement_point(Point3::new(0.0, 0.0, 0.0));
    store.add_measurement_point(Point3::new(1.0, 0.0, 0.0));
    assert_eq!(store.measurement_phase(), MeasurementPhase::Resolved);
    store.advance_clock(Duration::from_secs(4));
    assert_eq!(store.measurement_phase(), MeasurementPhase::Idle);
    Ok(())
}

#[test]
fn removing_a_model_reports_events() -> Result<()> {
    let mut store = InteractionStore::default();
    let model = store.load_model(aircraft())?;
    store.drain_events();

    assert!(store.remove_model(model));
    assert!(store.drain_events().contains(&StoreEvent::ModelRemoved(model)));
    assert!(!store.remove_model(model));
    Ok(())
}
