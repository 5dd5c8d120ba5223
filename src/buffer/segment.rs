//! Accessor segment tracking.
//!
//! A segment is a run of elements inside a typed region that becomes one
//! accessor. The tracker keeps per-component bounds while the run is open.

use gltf_json as json;

/// A closed segment: everything needed to register an accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: Option<String>,
    pub component_type: json::accessor::ComponentType,
    pub shape: json::accessor::Type,
    /// Byte offset of the first element within the owning view.
    pub byte_offset: usize,
    /// Number of elements.
    pub count: usize,
    /// Per-component minimum, one entry per component of the shape.
    pub min: Vec<f64>,
    /// Per-component maximum, one entry per component of the shape.
    pub max: Vec<f64>,
    pub normalized: bool,
}

/// An open segment.
#[derive(Debug, Clone)]
pub(crate) struct SegmentTracker {
    name: Option<String>,
    start_element: usize,
    width: usize,
    components: usize,
    min: Vec<f64>,
    max: Vec<f64>,
}

impl SegmentTracker {
    pub(crate) fn new(name: Option<String>, start_element: usize, width: usize) -> Self {
        Self {
            name,
            start_element,
            width,
            components: 0,
            min: vec![f64::INFINITY; width],
            max: vec![f64::NEG_INFINITY; width],
        }
    }

    /// Widen the bounds for the slot this component lands in.
    pub(crate) fn record(&mut self, value: f64) {
        let slot = self.components % self.width;
        self.min[slot] = self.min[slot].min(value);
        self.max[slot] = self.max[slot].max(value);
        self.components += 1;
    }

    pub(crate) fn start_element(&self) -> usize {
        self.start_element
    }

    /// Number of complete elements recorded so far.
    pub(crate) fn count(&self) -> usize {
        self.components / self.width
    }

    /// Whether the last element has all of its components.
    pub(crate) fn is_aligned(&self) -> bool {
        self.components % self.width == 0
    }

    /// Consume the tracker. Bounds of an empty segment collapse to zero.
    pub(crate) fn into_bounds(self) -> (Option<String>, Vec<f64>, Vec<f64>) {
        if self.components == 0 {
            return (self.name, vec![0.0; self.width], vec![0.0; self.width]);
        }
        (self.name, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_bounds_per_component() {
        let mut tracker = SegmentTracker::new(None, 0, 3);
        for value in [1.0, -2.0, 3.0, -1.0, 5.0, 0.5] {
            tracker.record(value);
        }
        assert_eq!(tracker.count(), 2);
        assert!(tracker.is_aligned());

        let (_, min, max) = tracker.into_bounds();
        assert_eq!(min, vec![-1.0, -2.0, 0.5]);
        assert_eq!(max, vec![1.0, 5.0, 3.0]);
    }

    #[test]
    fn test_tracker_partial_element() {
        let mut tracker = SegmentTracker::new(Some("uv".into()), 4, 2);
        tracker.record(0.25);
        assert_eq!(tracker.count(), 0);
        assert!(!tracker.is_aligned());
        assert_eq!(tracker.start_element(), 4);
    }

    #[test]
    fn test_empty_tracker_bounds() {
        let (name, min, max) = SegmentTracker::new(Some("p".into()), 0, 2).into_bounds();
        assert_eq!(name.as_deref(), Some("p"));
        assert_eq!(min, vec![0.0, 0.0]);
        assert_eq!(max, vec![0.0, 0.0]);
    }
}
