//! # Scene glTF
//!
//! A Rust library for serializing in-memory scene graphs to glTF 2.0.
//!
//! ## Overview
//!
//! This library takes a [`Scene`] of nodes, meshes, materials and textures as
//! input, and produces a glTF document plus its binary payload as output. Image
//! payloads can be packed into a GLB binary chunk, inlined as data URIs, or
//! written as external files.
//!
//! ## Quick Start
//!
//! ```ignore
//! use scene_gltf::{export_glb, Face, Mesh, Node, Scene, Vertex};
//! use std::rc::Rc;
//!
//! let mut mesh = Mesh::new();
//! let v = |x, y| Vertex::new([x, y, 0.0], [0.0, 0.0, 1.0], [x, y]);
//! mesh.add_face(Face::new(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)));
//!
//! let scene = Scene::new().with_node(Node::mesh(Rc::new(mesh)));
//! let glb_bytes = export_glb(&scene)?;
//! ```
//!
//! ## Incremental Export
//!
//! [`GltfExporter`] accepts several scenes and custom image encoders. Image
//! encodes run as futures that are joined in [`GltfExporter::finish`]:
//!
//! ```ignore
//! use scene_gltf::{ExportConfig, GltfExporter};
//!
//! let mut exporter = GltfExporter::new(ExportConfig::external("out", "scene"));
//! exporter.add_scene(&scene)?;
//! let output = pollster::block_on(exporter.finish())?;
//! output.write_gltf("out/scene.gltf")?;
//! ```

pub mod error;
pub mod config;
pub mod scene;
pub mod buffer;
pub mod export;

// Re-export main types for convenience
pub use error::{ExportError, Result};
pub use config::{ExportConfig, OutputMode};
pub use scene::{
    AlphaMode, Color, Face, Filter, ImageSource, Material, Mesh, Node, NodeKind, RawImage,
    SamplerDesc, Scene, Texture, Topology, Vertex, VertexColors, WrapMode,
};
pub use buffer::{Buffer, Segment, TypedRegion, ViewId};
pub use export::{EncodeFuture, GltfExporter, GltfOutput, ImageEncoder, PngEncoder};

/// Export a scene with the given configuration, blocking until every image
/// encode has completed.
pub fn export_scene(scene: &Scene, config: ExportConfig) -> Result<GltfOutput> {
    let mut exporter = GltfExporter::new(config);
    exporter.add_scene(scene)?;
    pollster::block_on(exporter.finish())
}

/// Export a scene to GLB format (binary glTF) with embedded textures.
pub fn export_glb(scene: &Scene) -> Result<Vec<u8>> {
    export_scene(scene, ExportConfig::default())?.to_glb()
}
