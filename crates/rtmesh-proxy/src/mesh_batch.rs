//! Mesh batch descriptors and their assembly from a (section, LOD) pair.

use rtmesh_lod::{ScreenSizeBand, ScreenSizeThresholds};

use crate::material::MaterialRenderProxy;
use crate::render_data::SectionRenderAttributes;
use crate::section::{DepthPriorityGroup, GeometryBatch, MeshSection, SectionId};
use crate::view::UniformBufferHandle;

/// One draw call's worth of state, consumed by the host renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBatch {
    /// Section the geometry came from.
    pub section_id: SectionId,
    /// LOD the geometry came from.
    pub lod_index: usize,
    /// LOD shown by LOD-colouration view modes.
    #[cfg(feature = "debug-rendering")]
    pub visualize_lod_index: usize,
    /// Buffers, topology, and shadow flag.
    pub geometry: GeometryBatch,
    /// Material to draw with (the wireframe override when one is active).
    pub material: MaterialRenderProxy,
    /// Drawn with the wireframe override.
    pub wireframe: bool,
    /// Geometry uses adjacency index data.
    pub requires_adjacency: bool,
    /// Reverse triangle winding for mirrored transforms.
    pub reverse_culling: bool,
    /// Dithered cross-fade between LODs.
    pub dithered_lod_transition: bool,
    /// View-mode overrides (lighting only, shader complexity) may replace the material.
    pub can_apply_view_mode_overrides: bool,
    /// Screen-size range this LOD is displayed in.
    pub screen_size: ScreenSizeBand,
    /// Uniform buffer holding the instance transform.
    pub uniform_buffer: UniformBufferHandle,
}

/// Object-wide inputs every batch of one proxy shares.
#[derive(Clone, Copy, Debug)]
pub struct BatchContext<'a> {
    /// The object's LOD screen-size table.
    pub thresholds: &'a ScreenSizeThresholds,
    /// Whether the local-to-world determinant is negative.
    pub reverse_culling: bool,
    /// The object's uniform buffer.
    pub uniform_buffer: UniformBufferHandle,
    /// Depth priority group of the object.
    pub depth_priority: DepthPriorityGroup,
}

/// Assemble the batch for `lod_index` of a section.
///
/// A wireframe override replaces the material and disables adjacency
/// expansion. Returns `None` when the section has no such LOD. No GPU work is
/// done; the result only describes a later draw.
pub fn build_batch(
    section_id: SectionId,
    section: &dyn MeshSection,
    lod_index: usize,
    attrs: &SectionRenderAttributes,
    material: MaterialRenderProxy,
    wireframe_material: Option<&MaterialRenderProxy>,
    ctx: &BatchContext<'_>,
) -> Option<MeshBatch> {
    let lod = section.lod(lod_index)?;

    let wireframe = wireframe_material.is_some();
    let requires_adjacency = !wireframe && attrs.wants_adjacency_info;
    let mut geometry = lod.create_geometry_batch(section.casts_shadow(), requires_adjacency);
    geometry.depth_priority = ctx.depth_priority;

    Some(MeshBatch {
        section_id,
        lod_index,
        #[cfg(feature = "debug-rendering")]
        visualize_lod_index: lod_index,
        geometry,
        material: wireframe_material.copied().unwrap_or(material),
        wireframe,
        requires_adjacency,
        reverse_culling: ctx.reverse_culling,
        dithered_lod_transition: false,
        can_apply_view_mode_overrides: true,
        screen_size: ctx.thresholds.band(lod_index),
        uniform_buffer: ctx.uniform_buffer,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::material::{MaterialId, SurfaceMaterial};
    use crate::section::{
        IndexBufferHandle, LodData, PrimitiveType, SectionData, VertexFactoryHandle,
    };

    fn section() -> SectionData {
        let lods = (0..3)
            .map(|i| {
                LodData::new(VertexFactoryHandle(10 + i), IndexBufferHandle(20 + i), 24, 36)
                    .with_adjacency(IndexBufferHandle(30 + i), 144)
            })
            .collect();
        SectionData::new(lods, true)
    }

    fn attrs(wants_adjacency_info: bool) -> SectionRenderAttributes {
        SectionRenderAttributes {
            material: Arc::new(SurfaceMaterial::opaque(MaterialId(7))),
            wants_adjacency_info,
        }
    }

    fn thresholds() -> ScreenSizeThresholds {
        ScreenSizeThresholds::new(&[0.8, 0.4, 0.1]).unwrap()
    }

    fn ctx(thresholds: &ScreenSizeThresholds) -> BatchContext<'_> {
        BatchContext {
            thresholds,
            reverse_culling: false,
            uniform_buffer: UniformBufferHandle(77),
            depth_priority: DepthPriorityGroup::World,
        }
    }

    #[test]
    fn test_batch_copies_lod_and_band() {
        let t = thresholds();
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let batch = build_batch(SectionId(3), &section(), 1, &attrs(false), material, None, &ctx(&t))
            .unwrap();
        assert_eq!(batch.section_id, SectionId(3));
        assert_eq!(batch.lod_index, 1);
        assert_eq!(batch.geometry.vertex_factory, VertexFactoryHandle(11));
        assert_eq!(batch.screen_size, ScreenSizeBand { min: 0.1, max: 0.4 });
        assert_eq!(batch.material, material);
        assert_eq!(batch.uniform_buffer, UniformBufferHandle(77));
        assert!(batch.geometry.cast_shadow);
        assert!(!batch.wireframe);
        assert!(!batch.dithered_lod_transition);
        assert!(batch.can_apply_view_mode_overrides);
    }

    #[test]
    fn test_adjacency_follows_cached_flag() {
        let t = thresholds();
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let batch = build_batch(SectionId(0), &section(), 0, &attrs(true), material, None, &ctx(&t))
            .unwrap();
        assert!(batch.requires_adjacency);
        assert_eq!(batch.geometry.primitive_type, PrimitiveType::TriangleListAdjacency);
        assert_eq!(batch.geometry.index_buffer, IndexBufferHandle(30));
    }

    #[test]
    fn test_wireframe_never_requests_adjacency() {
        let t = thresholds();
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let wire = MaterialRenderProxy::colored(None, [0.0, 0.5, 1.0, 1.0]);
        for wants in [false, true] {
            let batch = build_batch(
                SectionId(0),
                &section(),
                0,
                &attrs(wants),
                material,
                Some(&wire),
                &ctx(&t),
            )
            .unwrap();
            assert!(!batch.requires_adjacency, "cached flag {wants}");
            assert_eq!(batch.geometry.primitive_type, PrimitiveType::TriangleList);
            assert!(batch.wireframe);
            assert_eq!(batch.material, wire);
        }
    }

    #[test]
    fn test_reverse_culling_from_context() {
        let t = thresholds();
        let mut c = ctx(&t);
        c.reverse_culling = true;
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let batch = build_batch(SectionId(0), &section(), 2, &attrs(false), material, None, &c).unwrap();
        assert!(batch.reverse_culling);
        assert_eq!(batch.screen_size, ScreenSizeBand { min: 0.0, max: 0.1 });
    }

    #[test]
    fn test_depth_priority_from_context() {
        let t = thresholds();
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let world = build_batch(SectionId(0), &section(), 0, &attrs(false), material, None, &ctx(&t))
            .unwrap();
        assert_eq!(world.geometry.depth_priority, DepthPriorityGroup::World);

        let mut c = ctx(&t);
        c.depth_priority = DepthPriorityGroup::Foreground;
        let front = build_batch(SectionId(0), &section(), 0, &attrs(false), material, None, &c).unwrap();
        assert_eq!(front.geometry.depth_priority, DepthPriorityGroup::Foreground);
    }

    #[test]
    fn test_missing_lod_builds_nothing() {
        let t = thresholds();
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        assert!(build_batch(SectionId(0), &section(), 5, &attrs(false), material, None, &ctx(&t)).is_none());
    }

    #[test]
    fn test_non_shadow_section_clears_shadow_flag() {
        let t = thresholds();
        let mut s = section();
        s.cast_shadow = false;
        let material = MaterialRenderProxy::new(MaterialId(7), false);
        let batch = build_batch(SectionId(0), &s, 0, &attrs(false), material, None, &ctx(&t)).unwrap();
        assert!(!batch.geometry.cast_shadow);
    }
}
