use cgmath::{Euler, Rad};
use serde::{Deserialize, Serialize};
use skyview_base::{Aabb, Color, Matrix4, NodeId, Point3, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3,
    /// XYZ Euler angles in radians.
    pub rotation: Vector3,
    pub scale: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Matrix4 {
        let rotation = Euler::new(
            Rad(self.rotation.x),
            Rad(self.rotation.y),
            Rad(self.rotation.z),
        );
        Matrix4::from_translation(self.position)
            * Matrix4::from(rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub opacity: f64,
    pub transparent: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::rgb(0xb8, 0xc2, 0xcc),
            opacity: 1.0,
            transparent: false,
        }
    }
}

impl Material {
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = self.opacity < 1.0;
    }
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<Point3>,
    pub triangles: Vec<[u32; 3]>,
    pub material: Material,
}

impl MeshData {
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn local_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    pub fn triangle(&self, tri: [u32; 3]) -> Option<[Point3; 3]> {
        let a = *self.positions.get(tri[0] as usize)?;
        let b = *self.positions.get(tri[1] as usize)?;
        let c = *self.positions.get(tri[2] as usize)?;
        Some([a, b, c])
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshData),
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub visible: bool,
    pub transform: Transform,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshData> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn material(&self) -> Option<&Material> {
        self.mesh().map(|mesh| &mesh.material)
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh().map_or(0, MeshData::vertex_count)
    }

    pub fn type_label(&self) -> &'static str {
        match self.kind {
            NodeKind::Group => "Group",
            NodeKind::Mesh(_) => "Mesh",
        }
    }
}
