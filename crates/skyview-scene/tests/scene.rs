use anyhow::Result;
use skyview_base::{Axis, NodeId, Point3, Vector3};
use skyview_scene::{MeshData, ModelSpec, SceneGraph, Transform};

fn unit_quad() -> MeshData {
    MeshData::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

fn two_part_model() -> ModelSpec {
    ModelSpec::group("Aircraft")
        .with_child(ModelSpec::mesh("Fuselage", unit_quad()))
        .with_child(
            ModelSpec::mesh("Wing", unit_quad())
                .with_transform(Transform::from_position(Vector3::new(4.0, 0.0, 0.0))),
        )
}

#[test]
fn insert_and_lookup_is_tolerant() -> Result<()> {
    let mut graph = SceneGraph::new();
    let model = graph.insert_model(None, two_part_model())?;

    assert_eq!(graph.len(), 4);
    assert_eq!(graph.models(), vec![model]);
    assert_eq!(graph.mesh_ids().len(), 2);
    assert!(graph.node(NodeId::new()).is_none());
    assert_eq!(graph.descendants(model).len(), 2);
    Ok(())
}

#[test]
fn world_bounds_follow_child_transforms() -> Result<()> {
    let mut graph = SceneGraph::new();
    let model = graph.insert_model(
        None,
        two_part_model().with_transform(Transform::from_position(Vector3::new(0.0, 0.0, 2.0))),
    )?;

    let bounds = graph.world_bounds(model).ok_or_else(|| anyhow::anyhow!("no bounds"))?;
    assert_eq!(bounds.axis_range(Axis::X).max, 5.0);
    assert_eq!(bounds.axis_range(Axis::Z).min, 2.0);
    assert_eq!(graph.scene_bounds(), Some(bounds));
    Ok(())
}

#[test]
fn group_without_geometry_has_no_bounds() -> Result<()> {
    let mut graph = SceneGraph::new();
    let empty = graph.insert_model(None, ModelSpec::group("Empty"))?;
    assert!(graph.world_bounds(empty).is_none());
    assert!(graph.scene_bounds().is_none());
    assert!(SceneGraph::empty().scene_bounds().is_none());
    Ok(())
}

#[test]
fn remove_subtree_detaches_from_parent() -> Result<()> {
    let mut graph = SceneGraph::new();
    let model = graph.insert_model(None, two_part_model())?;
    let removed = graph.remove_subtree(model);

    assert_eq!(removed.len(), 3);
    assert!(graph.models().is_empty());
    assert_eq!(graph.len(), 1);
    assert!(graph.remove_subtree(model).is_empty());
    Ok(())
}

#[test]
fn duplicate_ids_are_rejected() -> Result<()> {
    let mut graph = SceneGraph::new();
    let id = NodeId::new();
    graph.insert_model(None, ModelSpec::group("A").with_id(id))?;
    assert!(graph.insert_model(None, ModelSpec::group("B").with_id(id)).is_err());
    Ok(())
}

#[test]
fn out_of_range_triangle_is_rejected() {
    let mut graph = SceneGraph::new();
    let bad = MeshData::new(vec![Point3::new(0.0, 0.0, 0.0)], vec![[0, 1, 2]]);
    assert!(graph.insert_model(None, ModelSpec::mesh("Bad", bad)).is_err());
    assert!(graph.models().is_empty());
}

#[test]
fn raycast_picks_nearest_visible_mesh() -> Result<()> {
    let mut graph = SceneGraph::new();
    let model = graph.insert_model(None, two_part_model())?;
    let wing = graph
        .find_by_name("Wing")
        .map(|node| node.id)
        .ok_or_else(|| anyhow::anyhow!("wing missing"))?;

    let hit = graph
        .raycast(Point3::new(4.5, 0.5, 10.0), Vector3::new(0.0, 0.0, -1.0))
        .ok_or_else(|| anyhow::anyhow!("expected a hit"))?;
    assert_eq!(hit.node, wing);
    assert!((hit.point.z).abs() < 1e-9);

    if let Some(node) = graph.node_mut(model) {
        node.visible = false;
    }
    assert!(
        graph
            .raycast(Point3::new(4.5, 0.5, 10.0), Vector3::new(0.0, 0.0, -1.0))
            .is_none()
    );
    Ok(())
}

#[test]
fn owning_model_walks_to_top_level() -> Result<()> {
    let mut graph = SceneGraph::new();
    let model = graph.insert_model(None, two_part_model())?;
    let wing = graph
        .find_by_name("Wing")
        .map(|node| node.id)
        .ok_or_else(|| anyhow::anyhow!("wing missing"))?;
    assert_eq!(graph.owning_model(wing), Some(model));
    assert_eq!(graph.owning_model(model), Some(model));
    assert!(graph.descendants(model).contains(&wing));
    Ok(())
}
