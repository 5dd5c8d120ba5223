//! Mesh packing: faces into attribute regions, one primitive per material run.

use super::{GltfExporter, ImageEncoder};
use crate::buffer::ViewId;
use crate::error::{ExportError, Result};
use crate::scene::{Color, Face, Material, Mesh, Topology, VertexColors};
use gltf_json as json;
use json::accessor::{ComponentType, Type};
use json::validation::Checked::Valid;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Attribute regions of one mesh. The color region is created on demand.
struct MeshRegions {
    position: ViewId,
    normal: ViewId,
    uv: ViewId,
    color: Option<ViewId>,
}

/// The material run currently being packed.
#[derive(Clone, Copy)]
struct Run {
    /// Index into the mesh's material list.
    material: Option<usize>,
    colors: VertexColors,
    /// Whether the run writes COLOR_0.
    colored: bool,
}

impl<E: ImageEncoder> GltfExporter<E> {
    /// Pack a mesh and append it to the document.
    ///
    /// Returns `None` for a mesh without faces. Only unindexed triangle lists
    /// are accepted.
    pub(crate) fn pack_mesh(&mut self, mesh: &Mesh) -> Result<Option<u32>> {
        if mesh.topology != Topology::Triangles {
            return Err(ExportError::UnsupportedTopology {
                mesh: mesh.name.clone(),
                topology: mesh.topology,
            });
        }
        if mesh.is_empty() {
            warn!("Skipping mesh {:?}: no faces", mesh.name);
            return Ok(None);
        }
        let available = mesh.materials.len();
        let out_of_range = |face: &&Face| face.material.is_some_and(|m| m >= available);
        if let Some(face) = mesh.faces.iter().find(out_of_range) {
            return Err(ExportError::MissingMaterial {
                mesh: mesh.name.clone(),
                index: face.material.unwrap_or_default(),
                available,
            });
        }

        // Mesh-local material index -> document material index.
        let materials = mesh
            .materials
            .iter()
            .map(|material| self.register_material(material))
            .collect::<Result<Vec<u32>>>()?;

        let target = Some(json::buffer::Target::ArrayBuffer);
        let mut regions = MeshRegions {
            position: self.buffer.create_region(ComponentType::F32, Type::Vec3, false, target),
            normal: self.buffer.create_region(ComponentType::F32, Type::Vec3, false, target),
            uv: self.buffer.create_region(ComponentType::F32, Type::Vec2, false, target),
            color: None,
        };

        let mut primitives = Vec::new();
        let mut current: Option<Run> = None;

        for face in &mesh.faces {
            if current.map(|run| run.material) != Some(face.material) {
                if let Some(run) = current {
                    primitives.push(self.close_run(&regions, run, &materials)?);
                }
                let material = face.material.map(|m| &mesh.materials[m]);
                let run = Run {
                    material: face.material,
                    colors: material.map(|m| m.vertex_colors).unwrap_or_default(),
                    colored: material.is_some_and(Material::uses_vertex_colors),
                };
                self.open_run(&mut regions, run)?;
                current = Some(run);
            }
            if let Some(run) = current {
                self.push_face(&regions, run, face)?;
            }
        }
        if let Some(run) = current {
            primitives.push(self.close_run(&regions, run, &materials)?);
        }

        for view in [regions.position, regions.normal, regions.uv]
            .into_iter()
            .chain(regions.color)
        {
            self.buffer.region_mut(view)?.finalize()?;
        }

        debug!(
            "Packed mesh {:?}: {} faces, {} primitives",
            mesh.name,
            mesh.face_count(),
            primitives.len()
        );

        let index = self.root.meshes.len() as u32;
        self.root.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: mesh.name.clone(),
            primitives,
            weights: None,
        });
        Ok(Some(index))
    }

    fn open_run(&mut self, regions: &mut MeshRegions, run: Run) -> Result<()> {
        self.buffer.region_mut(regions.position)?.start_segment(Some("POSITION".to_string()))?;
        self.buffer.region_mut(regions.normal)?.start_segment(Some("NORMAL".to_string()))?;
        self.buffer.region_mut(regions.uv)?.start_segment(Some("TEXCOORD_0".to_string()))?;

        if run.colored {
            let color = match regions.color {
                Some(view) => view,
                None => {
                    let view = self.buffer.create_region(
                        ComponentType::U8,
                        Type::Vec4,
                        true,
                        Some(json::buffer::Target::ArrayBuffer),
                    );
                    regions.color = Some(view);
                    view
                }
            };
            self.buffer.region_mut(color)?.start_segment(Some("COLOR_0".to_string()))?;
        }
        Ok(())
    }

    fn push_face(&mut self, regions: &MeshRegions, run: Run, face: &Face) -> Result<()> {
        for vertex in &face.vertices {
            self.buffer.region_mut(regions.position)?.push_element(&vertex.position)?;
            self.buffer.region_mut(regions.normal)?.push_element(&vertex.normal)?;
            self.buffer.region_mut(regions.uv)?.push_element(&vertex.uv)?;
        }

        let colors = match run.colors {
            VertexColors::None => return Ok(()),
            VertexColors::Face => [face.color; 3],
            VertexColors::Vertex => face.vertices.map(|v| v.color),
        };
        let view = regions
            .color
            .ok_or_else(|| ExportError::Buffer("color region was not allocated".to_string()))?;
        let region = self.buffer.region_mut(view)?;
        for color in colors {
            let rgba = color.unwrap_or(Color::BLACK).to_rgba8();
            region.push_element(&rgba.map(f32::from))?;
        }
        Ok(())
    }

    /// End the run's segments, register their accessors and build the primitive.
    fn close_run(
        &mut self,
        regions: &MeshRegions,
        run: Run,
        materials: &[u32],
    ) -> Result<json::mesh::Primitive> {
        let mut attributes = BTreeMap::new();

        let mut semantic_views = vec![
            (json::mesh::Semantic::Positions, regions.position),
            (json::mesh::Semantic::Normals, regions.normal),
            (json::mesh::Semantic::TexCoords(0), regions.uv),
        ];
        if run.colored {
            if let Some(color) = regions.color {
                semantic_views.push((json::mesh::Semantic::Colors(0), color));
            }
        }

        for (semantic, view) in semantic_views {
            let segment = self.buffer.region_mut(view)?.end_segment()?;
            let accessor = self.register_accessor(view, segment);
            attributes.insert(Valid(semantic), json::Index::new(accessor));
        }

        Ok(json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: None,
            material: run.material.map(|m| json::Index::new(materials[m])),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        })
    }
}
