//! Registration of materials, textures, images, samplers and accessors.
//!
//! Materials and textures always append. Images and samplers are looked up
//! first with a linear scan; the first match wins.

use super::{Completion, EncodeFuture, GltfExporter, ImageEncoder, ImageKey};
use crate::buffer::{Segment, ViewId};
use crate::config::OutputMode;
use crate::error::{ExportError, Result};
use crate::scene::{
    AlphaMode, Filter, ImageSource, Material, RawImage, SamplerDesc, Texture, WrapMode,
};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use log::debug;
use std::path::PathBuf;

impl ImageKey {
    fn matches(&self, source: &ImageSource) -> bool {
        match (self, source) {
            (ImageKey::Uri(a), ImageSource::Uri(b)) => a == b,
            (ImageKey::Raw(a), ImageSource::Raw(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl From<&ImageSource> for ImageKey {
    fn from(source: &ImageSource) -> Self {
        match source {
            ImageSource::Uri(uri) => ImageKey::Uri(uri.clone()),
            ImageSource::Raw(raw) => ImageKey::Raw(raw.clone()),
        }
    }
}

impl<E: ImageEncoder> GltfExporter<E> {
    /// Append a material, registering its base color texture first.
    pub(crate) fn register_material(&mut self, material: &Material) -> Result<u32> {
        let base_color_texture = match &material.base_color_texture {
            Some(texture) => Some(self.register_texture(texture)?),
            None => None,
        };

        let index = self.root.materials.len() as u32;
        self.root.materials.push(create_material(material, base_color_texture));
        Ok(index)
    }

    /// Append a texture, registering its sampler and image.
    pub(crate) fn register_texture(&mut self, texture: &Texture) -> Result<u32> {
        let sampler = self.register_sampler(&texture.sampler);
        let source = self.register_image(&texture.image)?;

        let index = self.root.textures.len() as u32;
        self.root.textures.push(json::Texture {
            name: None,
            sampler: Some(json::Index::new(sampler)),
            source: json::Index::new(source),
            extensions: Default::default(),
            extras: Default::default(),
        });
        Ok(index)
    }

    /// Find or append a sampler. Equal descriptions share one index.
    pub(crate) fn register_sampler(&mut self, desc: &SamplerDesc) -> u32 {
        if let Some(existing) = self.sampler_descs.iter().position(|d| d == desc) {
            return existing as u32;
        }

        let index = self.root.samplers.len() as u32;
        self.root.samplers.push(create_sampler(desc));
        self.sampler_descs.push(*desc);
        index
    }

    /// Find or append an image.
    ///
    /// Pass-through images match by URI, raw images by pixel identity. A new
    /// raw image is encoded according to the output mode.
    pub(crate) fn register_image(&mut self, source: &ImageSource) -> Result<u32> {
        if let Some(existing) = self.image_keys.iter().position(|key| key.matches(source)) {
            debug!("Reusing image {}", existing);
            return Ok(existing as u32);
        }

        let index = self.root.images.len() as u32;
        let image = match source {
            ImageSource::Uri(uri) => {
                if uri.is_empty() {
                    return Err(ExportError::EmptyImage(format!(
                        "image {} has an empty URI",
                        index
                    )));
                }
                create_image(None, None, Some(uri.clone()))
            }
            ImageSource::Raw(raw) => self.dispatch_encode(index, raw)?,
        };

        self.root.images.push(image);
        self.image_keys.push(ImageKey::from(source));
        Ok(index)
    }

    fn dispatch_encode(&mut self, index: u32, raw: &RawImage) -> Result<json::Image> {
        match &self.config.output_mode {
            OutputMode::Binary => {
                let view = self.buffer.reserve_blob();
                let encode = self.encoder.encode(raw);
                self.pending.push(Box::pin(fill_view(encode, view)));
                Ok(create_image(
                    Some(view),
                    Some(self.encoder.mime_type().to_string()),
                    None,
                ))
            }
            OutputMode::Inline => Ok(create_image(None, None, Some(self.encoder.data_uri(raw)?))),
            OutputMode::External { directory, stem } => {
                let file_name = format!("{}_{}.{}", stem, index, self.encoder.extension());
                let path = directory.join(&file_name);
                let encode = self.encoder.encode(raw);
                self.pending
                    .push(Box::pin(write_file(encode, path, index, file_name)));
                Ok(create_image(None, None, None))
            }
        }
    }

    /// Append an accessor describing a closed segment of `view`.
    pub(crate) fn register_accessor(&mut self, view: ViewId, segment: Segment) -> u32 {
        let index = self.root.accessors.len() as u32;
        self.root.accessors.push(json::Accessor {
            buffer_view: Some(view.as_json_index()),
            byte_offset: Some(USize64(segment.byte_offset as u64)),
            count: USize64(segment.count as u64),
            component_type: Valid(json::accessor::GenericComponentType(segment.component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(segment.shape),
            min: Some(json::Value::from(segment.min)),
            max: Some(json::Value::from(segment.max)),
            name: segment.name,
            normalized: segment.normalized,
            sparse: None,
        });
        index
    }
}

async fn fill_view(encode: EncodeFuture<Vec<u8>>, view: ViewId) -> Result<Completion> {
    let bytes = encode.await?;
    Ok(Completion::Blob { view, bytes })
}

async fn write_file(
    encode: EncodeFuture<Vec<u8>>,
    path: PathBuf,
    image: u32,
    uri: String,
) -> Result<Completion> {
    let bytes = encode.await?;
    if bytes.is_empty() {
        return Err(ExportError::EmptyImage(format!(
            "image {} encoded to no bytes",
            image
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &bytes)?;
    debug!("Wrote image {} to {:?}", image, path);
    Ok(Completion::Uri { image, uri })
}

fn create_image(
    buffer_view: Option<ViewId>,
    mime_type: Option<String>,
    uri: Option<String>,
) -> json::Image {
    json::Image {
        buffer_view: buffer_view.map(|view| view.as_json_index()),
        mime_type: mime_type.map(json::image::MimeType),
        name: None,
        uri,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn create_sampler(desc: &SamplerDesc) -> json::texture::Sampler {
    json::texture::Sampler {
        mag_filter: desc.mag_filter.map(|filter| {
            Valid(match filter {
                Filter::Nearest => json::texture::MagFilter::Nearest,
                Filter::Linear => json::texture::MagFilter::Linear,
            })
        }),
        min_filter: desc.min_filter.map(|filter| {
            Valid(match filter {
                Filter::Nearest => json::texture::MinFilter::Nearest,
                Filter::Linear => json::texture::MinFilter::Linear,
            })
        }),
        name: None,
        wrap_s: Valid(wrapping_mode(desc.wrap_s)),
        wrap_t: Valid(wrapping_mode(desc.wrap_t)),
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn wrapping_mode(mode: WrapMode) -> json::texture::WrappingMode {
    match mode {
        WrapMode::Repeat => json::texture::WrappingMode::Repeat,
        WrapMode::ClampToEdge => json::texture::WrappingMode::ClampToEdge,
        WrapMode::MirroredRepeat => json::texture::WrappingMode::MirroredRepeat,
    }
}

fn create_material(material: &Material, base_color_texture: Option<u32>) -> json::Material {
    let alpha_mode = match material.alpha_mode {
        AlphaMode::Opaque => json::material::AlphaMode::Opaque,
        AlphaMode::Mask => json::material::AlphaMode::Mask,
        AlphaMode::Blend => json::material::AlphaMode::Blend,
    };
    let alpha_cutoff = match material.alpha_mode {
        AlphaMode::Mask => material.alpha_cutoff.map(json::material::AlphaCutoff),
        _ => None,
    };

    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: base_color_texture.map(|index| json::texture::Info {
                index: json::Index::new(index),
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }),
            base_color_factor: json::material::PbrBaseColorFactor(material.base_color),
            metallic_factor: json::material::StrengthFactor(material.metallic),
            roughness_factor: json::material::StrengthFactor(material.roughness),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(alpha_mode),
        alpha_cutoff,
        double_sided: material.double_sided,
        name: material.name.clone(),
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor(material.emissive),
        extensions: Default::default(),
        extras: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::export::encode::testing::ScriptedEncoder;
    use crate::export::GltfExporter;
    use crate::scene::VertexColors;

    fn exporter() -> GltfExporter<ScriptedEncoder> {
        GltfExporter::with_encoder(ExportConfig::default(), ScriptedEncoder::default())
    }

    fn pixel() -> RawImage {
        RawImage::new(1, 1, vec![0, 0, 0, 255]).unwrap()
    }

    #[test]
    fn test_same_raw_image_dedups() {
        let mut exporter = exporter();
        let image = pixel();
        let a = exporter.register_image(&ImageSource::Raw(image.clone())).unwrap();
        let b = exporter.register_image(&ImageSource::Raw(image)).unwrap();
        let c = exporter.register_image(&ImageSource::Raw(pixel())).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(exporter.root.images.len(), 2);
        assert_eq!(exporter.pending_count(), 2);
    }

    #[test]
    fn test_same_uri_dedups() {
        let mut exporter = exporter();
        let a = exporter.register_image(&ImageSource::Uri("a.png".into())).unwrap();
        let b = exporter.register_image(&ImageSource::Uri("a.png".into())).unwrap();
        let c = exporter.register_image(&ImageSource::Uri("b.png".into())).unwrap();

        assert_eq!(a, b);
        assert_eq!(c, 1);
        assert_eq!(exporter.root.images[0].uri.as_deref(), Some("a.png"));
        assert_eq!(exporter.pending_count(), 0);
    }

    #[test]
    fn test_empty_uri_is_fatal() {
        let mut exporter = exporter();
        assert!(matches!(
            exporter.register_image(&ImageSource::Uri(String::new())),
            Err(ExportError::EmptyImage(_))
        ));
        assert!(exporter.root.images.is_empty());
    }

    #[test]
    fn test_equal_samplers_dedup() {
        let mut exporter = exporter();
        let repeat = SamplerDesc::new(WrapMode::Repeat, WrapMode::Repeat);
        let clamp = SamplerDesc::new(WrapMode::ClampToEdge, WrapMode::Repeat);

        assert_eq!(exporter.register_sampler(&repeat), 0);
        assert_eq!(exporter.register_sampler(&clamp), 1);
        let repeat_again = SamplerDesc::new(WrapMode::Repeat, WrapMode::Repeat);
        assert_eq!(exporter.register_sampler(&repeat_again), 0);
        assert_eq!(
            exporter.register_sampler(&repeat.with_filters(Filter::Nearest, Filter::Nearest)),
            2
        );
        assert_eq!(exporter.root.samplers.len(), 3);
    }

    #[test]
    fn test_materials_always_append() {
        let mut exporter = exporter();
        let material = Material::new().with_vertex_colors(VertexColors::Face);
        assert_eq!(exporter.register_material(&material).unwrap(), 0);
        assert_eq!(exporter.register_material(&material).unwrap(), 1);
    }

    #[test]
    fn test_textured_material_registers_chain() {
        let mut exporter = exporter();
        let image = pixel();
        let material = Material::new()
            .with_texture(Texture::new(ImageSource::Raw(image.clone())));
        let other = Material::new().with_texture(Texture::new(ImageSource::Raw(image)));

        exporter.register_material(&material).unwrap();
        exporter.register_material(&other).unwrap();

        assert_eq!(exporter.root.materials.len(), 2);
        assert_eq!(exporter.root.textures.len(), 2);
        assert_eq!(exporter.root.images.len(), 1);
        assert_eq!(exporter.root.samplers.len(), 1);
        let info = exporter.root.materials[1]
            .pbr_metallic_roughness
            .base_color_texture
            .as_ref()
            .unwrap();
        assert_eq!(info.index.value(), 1);
    }

    #[test]
    fn test_binary_image_reserves_view() {
        let mut exporter = exporter();
        exporter.register_image(&ImageSource::Raw(pixel())).unwrap();
        let image = &exporter.root.images[0];
        assert_eq!(image.buffer_view.map(|v| v.value()), Some(0));
        assert_eq!(image.mime_type.as_ref().map(|m| m.0.as_str()), Some("image/png"));
        assert!(image.uri.is_none());
    }

    #[test]
    fn test_inline_image_has_data_uri() {
        let mut exporter =
            GltfExporter::with_encoder(ExportConfig::inline(), ScriptedEncoder::default());
        exporter.register_image(&ImageSource::Raw(pixel())).unwrap();
        let uri = exporter.root.images[0].uri.as_deref().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(exporter.pending_count(), 0);
    }

    #[test]
    fn test_mask_cutoff_only_for_mask_mode() {
        let blend = create_material(
            &Material::new().with_alpha_mode(AlphaMode::Blend, Some(0.3)),
            None,
        );
        assert!(blend.alpha_cutoff.is_none());

        let mask = create_material(
            &Material::new().with_alpha_mode(AlphaMode::Mask, Some(0.3)),
            None,
        );
        assert_eq!(mask.alpha_cutoff.map(|c| c.0), Some(0.3));
    }
}
