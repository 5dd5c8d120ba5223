//! Scene graph to glTF export.
//!
//! [`GltfExporter`] builds the document incrementally: every node, mesh,
//! material, texture, image, sampler and accessor gets its index the moment
//! it is first visited. Image encodes are only dispatched during the walk;
//! [`GltfExporter::finish`] joins them, patches their results in by index and
//! finalizes the buffer. Only the resulting [`GltfOutput`] can be serialized.

pub mod encode;
pub mod glb;
mod output;
mod primitive;
mod registrar;
mod walker;

pub use encode::{data_uri, encode_png, join_all, EncodeFuture, ImageEncoder, PngEncoder};
pub use glb::assemble_glb;
pub use output::GltfOutput;

use crate::buffer::{Buffer, ViewId};
use crate::config::ExportConfig;
use crate::scene::{Mesh, RawImage, SamplerDesc};
use gltf_json as json;
use std::collections::HashMap;
use std::rc::Rc;

/// Identity used to recognise an image that was already registered.
#[derive(Debug, Clone)]
enum ImageKey {
    /// Pass-through image, matched by URI string.
    Uri(String),
    /// Raw image, matched by pixel storage identity.
    Raw(RawImage),
}

/// Deferred result of an image encode, applied by index at the join point.
#[derive(Debug)]
enum Completion {
    /// Bytes for a reserved blob view.
    Blob { view: ViewId, bytes: Vec<u8> },
    /// URI for an image entry inserted without one.
    Uri { image: u32, uri: String },
}

/// Incremental glTF document builder.
pub struct GltfExporter<E: ImageEncoder = PngEncoder> {
    config: ExportConfig,
    encoder: E,
    root: json::Root,
    buffer: Buffer,
    /// Parallel to `root.images`.
    image_keys: Vec<ImageKey>,
    /// Parallel to `root.samplers`.
    sampler_descs: Vec<SamplerDesc>,
    /// Packed meshes by `Rc` identity; the `Rc` keeps the address alive.
    meshes: HashMap<usize, (Rc<Mesh>, u32)>,
    pending: Vec<EncodeFuture<Completion>>,
}

impl GltfExporter<PngEncoder> {
    /// Create an exporter encoding images as PNG.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_encoder(config, PngEncoder)
    }
}

impl<E: ImageEncoder> GltfExporter<E> {
    /// Create an exporter with a custom image encoder.
    pub fn with_encoder(config: ExportConfig, encoder: E) -> Self {
        Self {
            config,
            encoder,
            root: json::Root::default(),
            buffer: Buffer::new(),
            image_keys: Vec::new(),
            sampler_descs: Vec::new(),
            meshes: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Number of image encodes dispatched and not yet joined.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
