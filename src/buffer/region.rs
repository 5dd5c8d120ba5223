//! Typed buffer regions.

use super::segment::{Segment, SegmentTracker};
use crate::error::{ExportError, Result};
use gltf_json as json;
use json::accessor::{ComponentType, Type};

/// Size in bytes of one component.
pub fn component_size(component_type: ComponentType) -> usize {
    match component_type {
        ComponentType::I8 | ComponentType::U8 => 1,
        ComponentType::I16 | ComponentType::U16 => 2,
        ComponentType::U32 | ComponentType::F32 => 4,
    }
}

/// Number of components per element.
pub fn component_count(shape: Type) -> usize {
    match shape {
        Type::Scalar => 1,
        Type::Vec2 => 2,
        Type::Vec3 => 3,
        Type::Vec4 => 4,
        Type::Mat2 => 4,
        Type::Mat3 => 9,
        Type::Mat4 => 16,
    }
}

/// A growable byte store holding components of one type and shape.
///
/// Components are appended one at a time into the open segment; each
/// closed segment describes one accessor over this region.
#[derive(Debug, Clone)]
pub struct TypedRegion {
    component_type: ComponentType,
    shape: Type,
    normalized: bool,
    bytes: Vec<u8>,
    components: usize,
    segments: Vec<Segment>,
    open: Option<SegmentTracker>,
    sealed: bool,
}

impl TypedRegion {
    pub fn new(component_type: ComponentType, shape: Type, normalized: bool) -> Self {
        Self {
            component_type,
            shape,
            normalized,
            bytes: Vec::new(),
            components: 0,
            segments: Vec::new(),
            open: None,
            sealed: false,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn shape(&self) -> Type {
        self.shape
    }

    /// Element stride in bytes.
    pub fn stride(&self) -> usize {
        component_size(self.component_type) * component_count(self.shape)
    }

    /// Number of complete elements pushed so far.
    pub fn element_count(&self) -> usize {
        self.components / component_count(self.shape)
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Closed segments, in the order they were ended.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Begin a segment at the current element count.
    pub fn start_segment(&mut self, name: Option<String>) -> Result<()> {
        if self.sealed {
            return Err(ExportError::Buffer(
                "cannot start a segment in a sealed region".to_string(),
            ));
        }
        if self.open.is_some() {
            return Err(ExportError::Buffer(
                "previous segment is still open".to_string(),
            ));
        }
        self.open = Some(SegmentTracker::new(
            name,
            self.element_count(),
            component_count(self.shape),
        ));
        Ok(())
    }

    /// Append one component to the open segment.
    pub fn push(&mut self, value: f32) -> Result<()> {
        if self.sealed {
            return Err(ExportError::Buffer("push to a sealed region".to_string()));
        }
        let tracker = self.open.as_mut().ok_or_else(|| {
            ExportError::Buffer("push without an open segment".to_string())
        })?;

        match self.component_type {
            ComponentType::F32 => self.bytes.extend_from_slice(&value.to_le_bytes()),
            ComponentType::U8 => self.bytes.push(value as u8),
            ComponentType::I8 => self.bytes.push(value as i8 as u8),
            ComponentType::U16 => self.bytes.extend_from_slice(&(value as u16).to_le_bytes()),
            ComponentType::I16 => self.bytes.extend_from_slice(&(value as i16).to_le_bytes()),
            ComponentType::U32 => self.bytes.extend_from_slice(&(value as u32).to_le_bytes()),
        }
        tracker.record(stored_value(self.component_type, value));
        self.components += 1;
        Ok(())
    }

    /// Push every component of one element.
    pub fn push_element(&mut self, components: &[f32]) -> Result<()> {
        for &value in components {
            self.push(value)?;
        }
        Ok(())
    }

    /// Close the open segment and return its accessor metadata.
    pub fn end_segment(&mut self) -> Result<Segment> {
        let tracker = self
            .open
            .take()
            .ok_or_else(|| ExportError::Buffer("no open segment to end".to_string()))?;
        if !tracker.is_aligned() {
            return Err(ExportError::Buffer(
                "segment ends in the middle of an element".to_string(),
            ));
        }

        let byte_offset = tracker.start_element() * self.stride();
        let count = tracker.count();
        let (name, min, max) = tracker.into_bounds();
        let segment = Segment {
            name,
            component_type: self.component_type,
            shape: self.shape,
            byte_offset,
            count,
            min,
            max,
            normalized: self.normalized,
        };
        self.segments.push(segment.clone());
        Ok(segment)
    }

    /// Seal the region; its byte length is fixed from here on.
    pub fn finalize(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(ExportError::Buffer(
                "cannot finalize a region with an open segment".to_string(),
            ));
        }
        self.sealed = true;
        Ok(())
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// The value as it reads back from the buffer, used for bounds.
fn stored_value(component_type: ComponentType, value: f32) -> f64 {
    match component_type {
        ComponentType::F32 => value as f64,
        ComponentType::U8 => value as u8 as f64,
        ComponentType::I8 => value as i8 as f64,
        ComponentType::U16 => value as u16 as f64,
        ComponentType::I16 => value as i16 as f64,
        ComponentType::U32 => value as u32 as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_vec3_packing() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Vec3, false);
        region.start_segment(Some("POSITION".into())).unwrap();
        region.push_element(&[1.0, 2.0, 3.0]).unwrap();
        region.push_element(&[-1.0, 0.0, 4.0]).unwrap();
        let segment = region.end_segment().unwrap();

        assert_eq!(region.byte_len(), 24);
        assert_eq!(&region.bytes()[0..4], &1.0f32.to_le_bytes());
        assert_eq!(segment.count, 2);
        assert_eq!(segment.byte_offset, 0);
        assert_eq!(segment.min, vec![-1.0, 0.0, 3.0]);
        assert_eq!(segment.max, vec![1.0, 2.0, 4.0]);
        assert_eq!(segment.name.as_deref(), Some("POSITION"));
    }

    #[test]
    fn test_second_segment_offset() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Vec2, false);
        region.start_segment(None).unwrap();
        region.push_element(&[0.0, 0.0]).unwrap();
        region.push_element(&[1.0, 1.0]).unwrap();
        region.end_segment().unwrap();

        region.start_segment(None).unwrap();
        region.push_element(&[0.5, 0.25]).unwrap();
        let second = region.end_segment().unwrap();

        assert_eq!(second.byte_offset, 16);
        assert_eq!(second.count, 1);
        assert_eq!(second.min, vec![0.5, 0.25]);
        assert_eq!(region.segments().len(), 2);
        assert_eq!(region.element_count(), 3);
    }

    #[test]
    fn test_u8_packing_one_byte_per_component() {
        let mut region = TypedRegion::new(ComponentType::U8, Type::Vec4, true);
        region.start_segment(None).unwrap();
        region.push_element(&[127.0, 255.0, 0.0, 255.0]).unwrap();
        let segment = region.end_segment().unwrap();

        assert_eq!(region.bytes(), &[127, 255, 0, 255]);
        assert_eq!(region.stride(), 4);
        assert!(segment.normalized);
        assert_eq!(segment.max, vec![127.0, 255.0, 0.0, 255.0]);
    }

    #[test]
    fn test_push_without_segment_fails() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Scalar, false);
        assert!(region.push(1.0).is_err());
    }

    #[test]
    fn test_sealed_region_rejects_push() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Scalar, false);
        region.finalize().unwrap();
        assert!(region.is_sealed());
        assert!(region.start_segment(None).is_err());
        assert!(region.push(1.0).is_err());
    }

    #[test]
    fn test_finalize_with_open_segment_fails() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Scalar, false);
        region.start_segment(None).unwrap();
        assert!(region.finalize().is_err());
    }

    #[test]
    fn test_incomplete_element_fails() {
        let mut region = TypedRegion::new(ComponentType::F32, Type::Vec3, false);
        region.start_segment(None).unwrap();
        region.push(1.0).unwrap();
        region.push(2.0).unwrap();
        assert!(region.end_segment().is_err());
    }
}
