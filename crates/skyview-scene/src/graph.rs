use std::collections::HashMap;

use cgmath::{SquareMatrix, Transform as _};
use skyview_base::{Aabb, Matrix4, NodeId, Point3};
use tracing::debug;

use crate::model::ModelSpec;
use crate::node::{NodeKind, SceneNode, Transform};
use crate::{Error, Result};

/// Arena-backed scene graph with a single root group.
///
/// All lookups are tolerant: an unknown id yields `None`, since callers may
/// hold ids of nodes removed by an asynchronous model reload.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    root: Option<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self::default();
        let root = NodeId::new();
        graph.nodes.insert(
            root,
            SceneNode {
                id: root,
                name: "Scene".to_string(),
                kind: NodeKind::Group,
                visible: true,
                transform: Transform::default(),
                parent: None,
                children: Vec::new(),
            },
        );
        graph.root = Some(root);
        graph
    }

    /// A graph without a root, as seen before the renderer created its scene.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.values().find(|node| node.name == name)
    }

    /// Top-level models, i.e. direct children of the root.
    pub fn models(&self) -> Vec<NodeId> {
        self.root
            .and_then(|root| self.nodes.get(&root))
            .map(|root| root.children.clone())
            .unwrap_or_default()
    }

    pub fn mesh_ids(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self
                .subtree(root)
                .into_iter()
                .filter(|id| self.nodes.get(id).is_some_and(SceneNode::is_mesh))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Inserts `spec` below `parent` (the root when `None`) and returns the id
    /// of the model's top node.
    pub fn insert_model(&mut self, parent: Option<NodeId>, spec: ModelSpec) -> Result<NodeId> {
        let parent = match parent {
            Some(parent) => parent,
            None => self.root.ok_or(Error::NoRoot)?,
        };
        if !self.nodes.contains_key(&parent) {
            return Err(Error::UnknownNode(parent));
        }
        let mut ids = Vec::with_capacity(spec.node_count());
        collect_ids(&spec, &mut ids);
        for id in ids.iter().flatten() {
            if self.nodes.contains_key(id) {
                return Err(Error::DuplicateNode(*id));
            }
        }
        validate_meshes(&spec)?;

        let id = self.insert_spec(parent, spec);
        debug!(node = %id, total = self.nodes.len(), "model inserted");
        Ok(id)
    }

    fn insert_spec(&mut self, parent: NodeId, spec: ModelSpec) -> NodeId {
        let id = spec.id.unwrap_or_default();
        self.nodes.insert(
            id,
            SceneNode {
                id,
                name: spec.name,
                kind: spec.kind,
                visible: spec.visible,
                transform: spec.transform,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        for child in spec.children {
            self.insert_spec(id, child);
        }
        id
    }

    /// Removes `id` and its descendants, returning every removed id.
    /// Removing the root clears the whole graph.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let parent = node.parent;
        let removed = self.subtree(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        removed
    }

    /// Removes every model while keeping the root.
    pub fn clear(&mut self) -> Vec<NodeId> {
        self.models()
            .into_iter()
            .flat_map(|model| self.remove_subtree(model))
            .collect()
    }

    /// `id` followed by all of its descendants in depth-first order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut subtree = self.subtree(id);
        if !subtree.is_empty() {
            subtree.remove(0);
        }
        subtree
    }

    /// The top-level model containing `id`, or `id` itself for a model.
    pub fn owning_model(&self, id: NodeId) -> Option<NodeId> {
        let root = self.root?;
        let mut current = id;
        loop {
            let parent = self.nodes.get(&current)?.parent?;
            if parent == root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Visible when the node and all of its ancestors are visible.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(&node_id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4> {
        let node = self.nodes.get(&id)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    pub fn parent_world_matrix(&self, id: NodeId) -> Option<Matrix4> {
        match self.nodes.get(&id)?.parent {
            Some(parent) => self.world_matrix(parent),
            None => Some(Matrix4::identity()),
        }
    }

    /// World-space box over every mesh in the subtree of `id`. `None` means
    /// the subtree carries no usable geometry.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let mut bounds = None;
        for node_id in self.subtree(id) {
            let Some(node) = self.nodes.get(&node_id) else {
                continue;
            };
            let Some(local) = node.mesh().and_then(|mesh| mesh.local_bounds()) else {
                continue;
            };
            let Some(world) = self.world_matrix(node_id) else {
                continue;
            };
            let corners = local.corners().map(|corner| world.transform_point(corner));
            bounds = Aabb::merge(bounds, Aabb::from_points(&corners));
        }
        bounds
    }

    pub fn scene_bounds(&self) -> Option<Aabb> {
        self.root.and_then(|root| self.world_bounds(root))
    }

    pub fn world_center(&self, id: NodeId) -> Option<Point3> {
        self.world_bounds(id).map(|bounds| bounds.center())
    }
}

fn collect_ids(spec: &ModelSpec, out: &mut Vec<Option<NodeId>>) {
    out.push(spec.id);
    for child in &spec.children {
        collect_ids(child, out);
    }
}

fn validate_meshes(spec: &ModelSpec) -> Result<()> {
    if let NodeKind::Mesh(mesh) = &spec.kind {
        let count = mesh.positions.len();
        if let Some(tri) = mesh
            .triangles
            .iter()
            .find(|tri| tri.iter().any(|index| *index as usize >= count))
        {
            return Err(Error::InvalidMesh(format!(
                "'{}' references vertex {:?} but has {count} vertices",
                spec.name, tri
            )));
        }
    }
    spec.children.iter().try_for_each(validate_meshes)
}
