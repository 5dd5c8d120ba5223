//! Output finalization: the join point and the serializable document.

use super::encode::{data_uri, join_all};
use super::glb::assemble_glb;
use super::{Completion, GltfExporter, ImageEncoder};
use crate::buffer::PackedBuffer;
use crate::config::OutputMode;
use crate::error::{ExportError, Result};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use log::info;
use std::path::Path;

/// A finished document. Every image URI and buffer range is final.
#[derive(Debug, Clone)]
pub struct GltfOutput {
    pub root: json::Root,
    /// Buffer 0 contents in binary mode; `None` otherwise.
    pub binary: Option<Vec<u8>>,
}

impl GltfOutput {
    pub fn to_json_string(&self) -> Result<String> {
        Ok(json::serialize::to_string(&self.root)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(json::serialize::to_string_pretty(&self.root)?)
    }

    /// Frame the document as GLB. Only available in binary mode.
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let binary = self.binary.as_ref().ok_or(ExportError::NotBinaryMode)?;
        assemble_glb(&self.root, binary)
    }

    pub fn write_glb<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_glb()?)?;
        Ok(())
    }

    pub fn write_gltf<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

impl<E: ImageEncoder> GltfExporter<E> {
    /// Join every dispatched image encode, apply the results and seal the
    /// document.
    ///
    /// Completions may arrive in any order; they are applied by index, and
    /// buffer offsets follow view creation order.
    pub async fn finish(mut self) -> Result<GltfOutput> {
        let pending = std::mem::take(&mut self.pending);
        let dispatched = pending.len();
        for completion in join_all(pending).await? {
            self.apply(completion)?;
        }

        let packed = self.buffer.finalize()?;
        let mut root = self.root;
        root.asset.generator = Some(self.config.generator.clone());

        root.buffer_views = packed
            .views
            .iter()
            .map(|range| json::buffer::View {
                buffer: json::Index::new(0),
                byte_length: USize64(range.byte_length as u64),
                byte_offset: Some(USize64(range.byte_offset as u64)),
                byte_stride: range.byte_stride.map(json::buffer::Stride),
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                target: range.target.map(Valid),
            })
            .collect();

        let binary = place_buffer(&mut root, packed, &self.config.output_mode)?;

        info!(
            "Exported {} nodes, {} meshes, {} accessors, {} images ({} encoded)",
            root.nodes.len(),
            root.meshes.len(),
            root.accessors.len(),
            root.images.len(),
            dispatched
        );

        Ok(GltfOutput { root, binary })
    }

    fn apply(&mut self, completion: Completion) -> Result<()> {
        match completion {
            Completion::Blob { view, bytes } => self.buffer.fill_blob(view, bytes),
            Completion::Uri { image, uri } => {
                if uri.is_empty() {
                    return Err(ExportError::EmptyImage(format!(
                        "image {} resolved to an empty URI",
                        image
                    )));
                }
                let entry = self.root.images.get_mut(image as usize).ok_or_else(|| {
                    ExportError::Buffer(format!("completion for unknown image {}", image))
                })?;
                entry.uri = Some(uri);
                Ok(())
            }
        }
    }
}

/// Attach the packed buffer to the document as mandated by the output mode.
fn place_buffer(
    root: &mut json::Root,
    packed: PackedBuffer,
    mode: &OutputMode,
) -> Result<Option<Vec<u8>>> {
    if packed.is_empty() {
        return Ok(match mode {
            OutputMode::Binary => Some(Vec::new()),
            _ => None,
        });
    }

    let byte_length = packed.data.len() as u64;
    let (uri, binary) = match mode {
        OutputMode::Binary => (None, Some(packed.data)),
        OutputMode::Inline => (
            Some(data_uri("application/octet-stream", &packed.data)),
            None,
        ),
        OutputMode::External { directory, stem } => {
            let file_name = format!("{}.bin", stem);
            std::fs::create_dir_all(directory)?;
            std::fs::write(directory.join(&file_name), &packed.data)?;
            (Some(file_name), None)
        }
    };

    root.buffers = vec![json::Buffer {
        byte_length: USize64(byte_length),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri,
    }];
    Ok(binary)
}
