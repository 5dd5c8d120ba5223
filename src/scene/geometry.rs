//! Mesh geometry types.

use super::material::Material;

/// An RGB color with optional alpha, components in 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Missing alpha is exported as fully opaque.
    pub a: Option<f32>,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: None }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a: Some(a) }
    }

    /// Quantize to RGBA bytes. Components are scaled by 255 and truncated.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            self.a.map(quantize).unwrap_or(255),
        ]
    }
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// A vertex of a triangle face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in 3D space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Per-vertex color, used when the material colors by vertex.
    pub color: Option<Color>,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// A triangle face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Vertices in winding order.
    pub vertices: [Vertex; 3],
    /// Face color, used when the material colors by face.
    pub color: Option<Color>,
    /// Index into the owning mesh's material list. `None` means no material.
    pub material: Option<usize>,
}

impl Face {
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self {
            vertices: [v1, v2, v3],
            color: None,
            material: None,
        }
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Primitive topology of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Unindexed triangle list, three vertices per face.
    #[default]
    Triangles,
    /// Indexed triangle list.
    IndexedTriangles,
    TriangleStrip,
    TriangleFan,
    Lines,
    Points,
}

/// A triangle mesh with its own material list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub topology: Topology,
    /// Faces in output order.
    pub faces: Vec<Face>,
    /// Materials referenced by [`Face::material`].
    pub materials: Vec<Material>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a material and return its index within this mesh.
    pub fn add_material(&mut self, material: Material) -> usize {
        let index = self.materials.len();
        self.materials.push(material);
        index
    }

    /// Add a face.
    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Get the number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_quantization_truncates() {
        assert_eq!(Color::rgb(0.5, 1.0, 0.0).to_rgba8(), [127, 255, 0, 255]);
        assert_eq!(Color::rgba(0.0, 0.0, 0.0, 0.5).to_rgba8(), [0, 0, 0, 127]);
    }

    #[test]
    fn test_color_quantization_clamps() {
        assert_eq!(Color::rgba(-1.0, 2.0, 0.999, 1.5).to_rgba8(), [0, 255, 254, 255]);
    }

    #[test]
    fn test_mesh_material_indices() {
        let mut mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.add_material(Material::default()), 0);
        assert_eq!(mesh.add_material(Material::default()), 1);

        let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]);
        mesh.add_face(Face::new(v, v, v).with_material(1));
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.faces[0].material, Some(1));
    }
}
