use skyview_base::NodeId;

use crate::node::{MeshData, NodeKind, Transform};

/// Node tree handed over by an asset loader once a model is ready.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub id: Option<NodeId>,
    pub name: String,
    pub kind: NodeKind,
    pub visible: bool,
    pub transform: Transform,
    pub children: Vec<ModelSpec>,
}

impl ModelSpec {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: NodeKind::Group,
            visible: true,
            transform: Transform::default(),
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            kind: NodeKind::Mesh(mesh),
            ..Self::group(name)
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: ModelSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ModelSpec::node_count).sum::<usize>()
    }
}
