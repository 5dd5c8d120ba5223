//! In-memory scene graph consumed by the exporter.
//!
//! Nodes own their children; meshes are shared through `Rc` so that several
//! nodes can instance the same geometry.

mod geometry;
mod material;

pub use geometry::{Color, Face, Mesh, Topology, Vertex};
pub use material::{
    AlphaMode, Filter, ImageSource, Material, RawImage, SamplerDesc, Texture, VertexColors,
    WrapMode,
};

use glam::{Quat, Vec3};
use std::rc::Rc;

/// What a node carries besides its transform.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Group of child nodes (possibly empty).
    Group(Vec<Node>),
    /// Leaf node drawing a mesh.
    Mesh(Rc<Mesh>),
}

/// A scene graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub kind: NodeKind,
}

impl Node {
    /// Create an empty group node with an identity transform.
    pub fn group() -> Self {
        Self::with_kind(NodeKind::Group(Vec::new()))
    }

    /// Create a mesh node with an identity transform.
    pub fn mesh(mesh: Rc<Mesh>) -> Self {
        Self::with_kind(NodeKind::Mesh(mesh))
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            name: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Append a child. Mesh nodes cannot have children; the node is
    /// converted into a group holding the mesh node as its first child.
    pub fn with_child(mut self, child: Node) -> Self {
        match &mut self.kind {
            NodeKind::Group(children) => children.push(child),
            NodeKind::Mesh(mesh) => {
                let mesh_node = Node::mesh(Rc::clone(mesh));
                self.kind = NodeKind::Group(vec![mesh_node, child]);
            }
        }
        self
    }
}

/// A named list of root nodes.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }
}
