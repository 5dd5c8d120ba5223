//! Material, texture and image types.

use crate::error::{ExportError, Result};
use image::RgbaImage;
use std::sync::Arc;

/// How a material sources vertex colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexColors {
    /// Material ignores colors; no COLOR_0 attribute.
    #[default]
    None,
    /// Each face's color is written to all three of its vertices.
    Face,
    /// Each vertex carries its own color.
    Vertex,
}

/// Alpha blending mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// Texture wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Sampler parameters. Two samplers with equal fields are the same sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    pub mag_filter: Option<Filter>,
    pub min_filter: Option<Filter>,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl SamplerDesc {
    pub fn new(wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        Self {
            wrap_s,
            wrap_t,
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, mag: Filter, min: Filter) -> Self {
        self.mag_filter = Some(mag);
        self.min_filter = Some(min);
        self
    }
}

/// Shared handle to decoded RGBA pixels.
///
/// Clones share the same pixels and compare equal by identity in [`RawImage::id`].
#[derive(Debug, Clone)]
pub struct RawImage {
    pixels: Arc<RgbaImage>,
}

impl RawImage {
    /// Wrap RGBA8 pixel data. Fails if the data does not match the dimensions.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let pixels = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            ExportError::InvalidImage(format!(
                "pixel data does not match {}x{} RGBA",
                width, height
            ))
        })?;
        Ok(Self::from_rgba(pixels))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Identity of the underlying pixel storage.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.pixels) as usize
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Where a texture's image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Passed through to the document untouched.
    Uri(String),
    /// Encoded according to the output mode.
    Raw(RawImage),
}

/// A texture: image plus sampler.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: ImageSource,
    pub sampler: SamplerDesc,
}

impl Texture {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            sampler: SamplerDesc::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerDesc) -> Self {
        self.sampler = sampler;
        self
    }
}

/// A metallic-roughness material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    pub base_color_texture: Option<Texture>,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub alpha_mode: AlphaMode,
    /// Only meaningful with [`AlphaMode::Mask`].
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
    pub vertex_colors: VertexColors,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: None,
            double_sided: false,
            vertex_colors: VertexColors::None,
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_base_color(mut self, color: [f32; 4]) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_vertex_colors(mut self, mode: VertexColors) -> Self {
        self.vertex_colors = mode;
        self
    }

    pub fn with_alpha_mode(mut self, mode: AlphaMode, cutoff: Option<f32>) -> Self {
        self.alpha_mode = mode;
        self.alpha_cutoff = cutoff;
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    /// Check if primitives using this material need a COLOR_0 attribute.
    pub fn uses_vertex_colors(&self) -> bool {
        self.vertex_colors != VertexColors::None
    }
}
