//! Scene graph walk: nodes and scenes become index-linked document entries.

use super::{GltfExporter, ImageEncoder};
use crate::error::Result;
use crate::scene::{Mesh, Node, NodeKind, Scene};
use glam::{Quat, Vec3};
use gltf_json as json;
use std::rc::Rc;

impl<E: ImageEncoder> GltfExporter<E> {
    /// Add a scene and all of its nodes. The first scene added becomes the
    /// document's default scene.
    pub fn add_scene(&mut self, scene: &Scene) -> Result<u32> {
        let mut nodes = Vec::with_capacity(scene.nodes.len());
        for node in &scene.nodes {
            nodes.push(json::Index::new(self.add_node(node)?));
        }

        let index = self.root.scenes.len() as u32;
        self.root.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: scene.name.clone(),
            nodes,
        });
        if self.root.scene.is_none() {
            self.root.scene = Some(json::Index::new(index));
        }
        Ok(index)
    }

    /// Add a node and its subtree. Indices are assigned in pre-order: a
    /// parent always precedes its children.
    pub fn add_node(&mut self, node: &Node) -> Result<u32> {
        let index = self.root.nodes.len() as u32;
        self.root.nodes.push(create_node(node));

        match &node.kind {
            NodeKind::Mesh(mesh) => {
                let mesh_index = self.mesh_index(mesh)?;
                self.root.nodes[index as usize].mesh = mesh_index.map(json::Index::new);
            }
            NodeKind::Group(children) => {
                let mut child_indices = Vec::with_capacity(children.len());
                for child in children {
                    child_indices.push(json::Index::new(self.add_node(child)?));
                }
                if !child_indices.is_empty() {
                    self.root.nodes[index as usize].children = Some(child_indices);
                }
            }
        }
        Ok(index)
    }

    /// Pack a mesh on first use; later references reuse its index.
    fn mesh_index(&mut self, mesh: &Rc<Mesh>) -> Result<Option<u32>> {
        let key = Rc::as_ptr(mesh) as usize;
        if let Some((_, index)) = self.meshes.get(&key) {
            return Ok(Some(*index));
        }

        let index = self.pack_mesh(mesh)?;
        if let Some(index) = index {
            self.meshes.insert(key, (Rc::clone(mesh), index));
        }
        Ok(index)
    }
}

/// Node entry without mesh or children. Identity components are omitted.
fn create_node(node: &Node) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: node.name.clone(),
        rotation: (node.rotation != Quat::IDENTITY)
            .then(|| json::scene::UnitQuaternion(node.rotation.to_array())),
        scale: (node.scale != Vec3::ONE).then(|| node.scale.to_array()),
        translation: (node.translation != Vec3::ZERO).then(|| node.translation.to_array()),
        skin: None,
        weights: None,
    }
}
