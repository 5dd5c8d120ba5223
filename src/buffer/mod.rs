//! Binary buffer packing.
//!
//! A [`Buffer`] is an ordered list of views. Typed views are filled
//! synchronously through a [`TypedRegion`]; blob views are reserved up front
//! and filled later, when an asynchronous image encode completes. Offsets are
//! assigned in creation order when the buffer is finalized, so the order in
//! which blobs arrive never changes the layout.

mod region;
mod segment;

pub use region::{component_count, component_size, TypedRegion};
pub use segment::Segment;

use crate::error::{ExportError, Result};
use gltf_json as json;

/// Index of a view within its buffer. Equal to the document's buffer view index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u32);

impl ViewId {
    pub fn as_json_index(&self) -> json::Index<json::buffer::View> {
        json::Index::new(self.0)
    }
}

#[derive(Debug)]
enum ViewBody {
    Typed(TypedRegion),
    /// `None` until the bytes arrive.
    Blob(Option<Vec<u8>>),
}

#[derive(Debug)]
struct View {
    target: Option<json::buffer::Target>,
    body: ViewBody,
}

/// Placement of a view inside the finalized buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRange {
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Element stride of vertex attribute views; `None` for blobs.
    pub byte_stride: Option<usize>,
    pub target: Option<json::buffer::Target>,
}

/// A finalized buffer: contiguous bytes plus the range of every view.
#[derive(Debug, Clone, Default)]
pub struct PackedBuffer {
    /// Buffer contents, padded to a 4-byte boundary.
    pub data: Vec<u8>,
    /// View ranges in creation order.
    pub views: Vec<ViewRange>,
}

impl PackedBuffer {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Builder for a single binary buffer.
#[derive(Debug, Default)]
pub struct Buffer {
    views: Vec<View>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn next_id(&self) -> ViewId {
        ViewId(self.views.len() as u32)
    }

    /// Create a typed region; its slot in the buffer is reserved now.
    pub fn create_region(
        &mut self,
        component_type: json::accessor::ComponentType,
        shape: json::accessor::Type,
        normalized: bool,
        target: Option<json::buffer::Target>,
    ) -> ViewId {
        let id = self.next_id();
        self.views.push(View {
            target,
            body: ViewBody::Typed(TypedRegion::new(component_type, shape, normalized)),
        });
        id
    }

    pub fn region(&self, id: ViewId) -> Result<&TypedRegion> {
        match self.views.get(id.0 as usize).map(|v| &v.body) {
            Some(ViewBody::Typed(region)) => Ok(region),
            _ => Err(ExportError::Buffer(format!("view {} is not a typed region", id.0))),
        }
    }

    pub fn region_mut(&mut self, id: ViewId) -> Result<&mut TypedRegion> {
        match self.views.get_mut(id.0 as usize).map(|v| &mut v.body) {
            Some(ViewBody::Typed(region)) => Ok(region),
            _ => Err(ExportError::Buffer(format!("view {} is not a typed region", id.0))),
        }
    }

    /// Reserve a view whose bytes will be supplied later.
    pub fn reserve_blob(&mut self) -> ViewId {
        let id = self.next_id();
        self.views.push(View {
            target: None,
            body: ViewBody::Blob(None),
        });
        id
    }

    /// Supply the bytes of a reserved blob view. Each blob is filled once.
    pub fn fill_blob(&mut self, id: ViewId, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Err(ExportError::EmptyImage(format!(
                "buffer view {} received no bytes",
                id.0
            )));
        }
        match self.views.get_mut(id.0 as usize).map(|v| &mut v.body) {
            Some(ViewBody::Blob(slot @ None)) => {
                *slot = Some(bytes);
                Ok(())
            }
            Some(ViewBody::Blob(Some(_))) => Err(ExportError::Buffer(format!(
                "blob view {} was already filled",
                id.0
            ))),
            _ => Err(ExportError::Buffer(format!("view {} is not a blob", id.0))),
        }
    }

    /// Lay out every view in creation order and concatenate them.
    ///
    /// Each view starts on a 4-byte boundary after the previous one. Fails if
    /// a typed region is unsealed or a blob is still pending.
    pub fn finalize(self) -> Result<PackedBuffer> {
        let mut data = Vec::new();
        let mut views = Vec::with_capacity(self.views.len());

        for (index, view) in self.views.into_iter().enumerate() {
            let vertex_view = view.target == Some(json::buffer::Target::ArrayBuffer);
            let (bytes, byte_stride) = match view.body {
                ViewBody::Typed(region) => {
                    if !region.is_sealed() {
                        return Err(ExportError::Buffer(format!(
                            "view {} was not finalized",
                            index
                        )));
                    }
                    let stride = vertex_view.then(|| region.stride());
                    (region.into_bytes(), stride)
                }
                ViewBody::Blob(Some(bytes)) => (bytes, None),
                ViewBody::Blob(None) => {
                    return Err(ExportError::Buffer(format!(
                        "view {} is still waiting for its data",
                        index
                    )));
                }
            };

            align_buffer(&mut data);
            views.push(ViewRange {
                byte_offset: data.len(),
                byte_length: bytes.len(),
                byte_stride,
                target: view.target,
            });
            data.extend_from_slice(&bytes);
        }
        align_buffer(&mut data);

        Ok(PackedBuffer { data, views })
    }
}

/// Align buffer to 4-byte boundary
pub fn align_buffer(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json::accessor::{ComponentType, Type};

    fn sealed_region(buffer: &mut Buffer, values: &[f32]) -> ViewId {
        let id = buffer.create_region(ComponentType::F32, Type::Scalar, false, None);
        let region = buffer.region_mut(id).unwrap();
        region.start_segment(None).unwrap();
        region.push_element(values).unwrap();
        region.end_segment().unwrap();
        region.finalize().unwrap();
        id
    }

    #[test]
    fn test_offsets_follow_creation_order() {
        let mut buffer = Buffer::new();
        let first = buffer.reserve_blob();
        let second = sealed_region(&mut buffer, &[1.0, 2.0]);
        let third = buffer.reserve_blob();

        // Fill blobs in reverse order.
        buffer.fill_blob(third, vec![9; 3]).unwrap();
        buffer.fill_blob(first, vec![7; 5]).unwrap();

        let packed = buffer.finalize().unwrap();
        assert_eq!(second, ViewId(1));
        assert_eq!(packed.views[0].byte_offset, 0);
        assert_eq!(packed.views[0].byte_length, 5);
        assert_eq!(packed.views[1].byte_offset, 8);
        assert_eq!(packed.views[1].byte_length, 8);
        assert_eq!(packed.views[2].byte_offset, 16);
        assert_eq!(packed.views[2].byte_length, 3);
        assert_eq!(packed.data.len(), 20);
        assert_eq!(&packed.data[16..19], &[9, 9, 9]);
    }

    #[test]
    fn test_vertex_views_carry_stride() {
        let mut buffer = Buffer::new();
        let blob = buffer.reserve_blob();
        let target = Some(json::buffer::Target::ArrayBuffer);
        let position = buffer.create_region(ComponentType::F32, Type::Vec3, false, target);
        let color = buffer.create_region(ComponentType::U8, Type::Vec4, true, target);
        let untargeted = sealed_region(&mut buffer, &[1.0]);
        for id in [position, color] {
            buffer.region_mut(id).unwrap().finalize().unwrap();
        }
        buffer.fill_blob(blob, vec![1, 2]).unwrap();

        let packed = buffer.finalize().unwrap();
        assert_eq!(packed.views[blob.0 as usize].byte_stride, None);
        assert_eq!(packed.views[position.0 as usize].byte_stride, Some(12));
        assert_eq!(packed.views[color.0 as usize].byte_stride, Some(4));
        assert_eq!(packed.views[untargeted.0 as usize].byte_stride, None);
    }

    #[test]
    fn test_pending_blob_blocks_finalize() {
        let mut buffer = Buffer::new();
        buffer.reserve_blob();
        assert!(buffer.finalize().is_err());
    }

    #[test]
    fn test_unsealed_region_blocks_finalize() {
        let mut buffer = Buffer::new();
        buffer.create_region(ComponentType::F32, Type::Vec3, false, None);
        assert!(buffer.finalize().is_err());
    }

    #[test]
    fn test_empty_blob_is_rejected() {
        let mut buffer = Buffer::new();
        let id = buffer.reserve_blob();
        assert!(matches!(
            buffer.fill_blob(id, Vec::new()),
            Err(ExportError::EmptyImage(_))
        ));
    }

    #[test]
    fn test_blob_filled_twice_fails() {
        let mut buffer = Buffer::new();
        let id = buffer.reserve_blob();
        buffer.fill_blob(id, vec![1]).unwrap();
        assert!(buffer.fill_blob(id, vec![2]).is_err());
    }

    #[test]
    fn test_region_lookup_rejects_blob() {
        let mut buffer = Buffer::new();
        let id = buffer.reserve_blob();
        assert!(buffer.region_mut(id).is_err());
        assert!(buffer.region(ViewId(7)).is_err());
    }

    #[test]
    fn test_align_buffer() {
        let mut buffer = vec![1, 2, 3];
        align_buffer(&mut buffer);
        assert_eq!(buffer, vec![1, 2, 3, 0]);

        let mut aligned = vec![1, 2, 3, 4];
        align_buffer(&mut aligned);
        assert_eq!(aligned.len(), 4);
    }
}
