//! Error types for the glTF exporter.

use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for scene export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Mesh uses a topology other than an unindexed triangle list.
    #[error("Unsupported mesh topology {topology:?} in mesh {mesh:?}")]
    UnsupportedTopology {
        mesh: Option<String>,
        topology: crate::scene::Topology,
    },

    /// A face references a material the mesh does not have.
    #[error("Face references material {index} but mesh {mesh:?} has {available}")]
    MissingMaterial {
        mesh: Option<String>,
        index: usize,
        available: usize,
    },

    /// An image resource was set to an empty value.
    #[error("Empty image resource: {0}")]
    EmptyImage(String),

    /// Buffer region misuse (sealed region, missing segment, pending views).
    #[error("Buffer error: {0}")]
    Buffer(String),

    /// A custom image encoder reported a failure.
    #[error("Image encode error: {0}")]
    Encode(String),

    /// Raw image pixels do not match the declared dimensions.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// GLB bytes were requested from a non-binary export.
    #[error("GLB output requires binary output mode")]
    NotBinaryMode,

    /// Failed to serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The PNG codec failed to encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
