use skyview_base::NodeId;
use thiserror::Error;

pub mod bounds;
pub mod graph;
pub mod model;
pub mod node;
pub mod pick;

pub use bounds::{BoundingSphere, framing_distance};
pub use graph::SceneGraph;
pub use model::ModelSpec;
pub use node::{Material, MeshData, NodeKind, SceneNode, Transform};
pub use pick::{RayHit, ray_intersect_triangle};

#[derive(Error, Debug)]
pub enum Error {
    #[error("scene graph has no root")]
    NoRoot,
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} already exists in the scene")]
    DuplicateNode(NodeId),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

pub type Result<T> = std::result::Result<T, Error>;
