//! Per-section render attributes resolved once when render resources are created.

use std::fmt;
use std::mem;

use rustc_hash::FxHashMap;

use crate::material::{
    MaterialRef, MaterialRelevance, SectionMaterials, requires_adjacency_information,
};
use crate::section::{SectionId, SectionRegistry};

/// Resolved material and adjacency requirement of one section.
#[derive(Clone)]
pub struct SectionRenderAttributes {
    /// Assigned material, or the default surface material.
    pub material: MaterialRef,
    /// The material needs adjacency index data on this section's vertex layout.
    pub wants_adjacency_info: bool,
}

impl PartialEq for SectionRenderAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.material.id() == other.material.id()
            && self.wants_adjacency_info == other.wants_adjacency_info
    }
}

impl fmt::Debug for SectionRenderAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionRenderAttributes")
            .field("material", &self.material.id())
            .field("wants_adjacency_info", &self.wants_adjacency_info)
            .finish()
    }
}

/// Render attributes keyed by section, plus the union of their material relevance.
///
/// Only mutated by [`refresh`](Self::refresh); read-only while frames are built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderDataCache {
    entries: FxHashMap<SectionId, SectionRenderAttributes>,
    material_relevance: MaterialRelevance,
}

impl RenderDataCache {
    /// An empty cache; nothing is materialised until the first refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from the registry's current sections.
    ///
    /// Each section's material is its assignment or the default material.
    /// Adjacency is decided against the vertex layout of LOD 0; sections with no
    /// LODs never want adjacency.
    pub fn refresh(&mut self, registry: &dyn SectionRegistry, materials: &SectionMaterials) {
        self.entries.clear();
        self.material_relevance = MaterialRelevance::default();

        for (id, section) in registry.sections() {
            if materials.get(id).is_none() {
                tracing::debug!(section = id.0, "no material assigned, using default");
            }
            let material = materials.resolve(id);
            let wants_adjacency_info = section
                .lod(0)
                .is_some_and(|lod| requires_adjacency_information(&*material, lod.vertex_layout()));

            self.material_relevance |= material.relevance();
            self.entries.insert(
                id,
                SectionRenderAttributes {
                    material,
                    wants_adjacency_info,
                },
            );
        }

        tracing::debug!(sections = self.entries.len(), "render data refreshed");
    }

    /// Attributes of a section, if it existed at the last refresh.
    pub fn lookup(&self, id: SectionId) -> Option<&SectionRenderAttributes> {
        self.entries.get(&id)
    }

    /// Whether a section has been materialised.
    pub fn contains(&self, id: SectionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of cached sections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of every cached material's relevance.
    pub fn material_relevance(&self) -> MaterialRelevance {
        self.material_relevance
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.material_relevance = MaterialRelevance::default();
    }

    /// Lower bound on the heap bytes of the cache's table: one slot plus one
    /// control byte per entry of capacity. Materials are shared with their
    /// owners and not counted.
    pub fn allocated_size(&self) -> usize {
        self.entries.capacity() * (mem::size_of::<(SectionId, SectionRenderAttributes)>() + 1)
    }
}

/// Object-wide section flags, scanned once per resource creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionScan {
    /// Some renderable section prefers the static path.
    pub has_static_sections: bool,
    /// Some renderable section needs the dynamic path.
    pub has_dynamic_sections: bool,
    /// Some renderable section casts shadows.
    pub has_shadowable_sections: bool,
}

impl SectionScan {
    /// Scan every renderable section of a registry.
    pub fn scan(registry: &dyn SectionRegistry) -> Self {
        let mut result = Self::default();
        for (_, section) in registry.sections() {
            if !section.should_render() {
                continue;
            }
            if section.wants_to_render_in_static_path() {
                result.has_static_sections = true;
            } else {
                result.has_dynamic_sections = true;
            }
            if section.casts_shadow() {
                result.has_shadowable_sections = true;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::material::{MaterialId, SurfaceMaterial, TessellationMode};
    use crate::section::{
        IndexBufferHandle, LodData, MeshSectionData, SectionData, VertexFactoryHandle,
        VertexLayout,
    };

    fn lod(layout: VertexLayout) -> LodData {
        LodData::new(VertexFactoryHandle(1), IndexBufferHandle(1), 8, 36).with_layout(layout)
    }

    fn registry() -> MeshSectionData {
        let tess = VertexLayout {
            supports_tessellation: true,
        };
        let mut data = MeshSectionData::default();
        data.insert_section(SectionId(0), SectionData::new(vec![lod(tess)], true));
        data.insert_section(SectionId(1), SectionData::new(vec![lod(tess)], false));
        data.insert_section(SectionId(2), SectionData::new(Vec::new(), false));
        data
    }

    fn pn_material(id: u64) -> MaterialRef {
        Arc::new(SurfaceMaterial {
            tessellation: TessellationMode::PnTriangles,
            ..SurfaceMaterial::opaque(MaterialId(id))
        })
    }

    #[test]
    fn test_lookup_absent_before_refresh() {
        let cache = RenderDataCache::new();
        assert!(cache.lookup(SectionId(0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unassigned_sections_get_default_material() {
        let mut cache = RenderDataCache::new();
        cache.refresh(&registry(), &SectionMaterials::new());
        assert_eq!(cache.len(), 3);
        for id in [0, 1, 2] {
            let attrs = cache.lookup(SectionId(id)).unwrap();
            assert_eq!(attrs.material.id(), MaterialId::DEFAULT);
            assert!(!attrs.wants_adjacency_info);
        }
    }

    #[test]
    fn test_adjacency_resolved_from_lod_zero() {
        let mut materials = SectionMaterials::new();
        materials.set(SectionId(0), pn_material(5));
        materials.set(SectionId(2), pn_material(6));

        let mut cache = RenderDataCache::new();
        cache.refresh(&registry(), &materials);
        assert!(cache.lookup(SectionId(0)).unwrap().wants_adjacency_info);
        assert!(!cache.lookup(SectionId(1)).unwrap().wants_adjacency_info);
        // No LOD 0 to inspect.
        assert!(!cache.lookup(SectionId(2)).unwrap().wants_adjacency_info);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut materials = SectionMaterials::new();
        materials.set(SectionId(1), pn_material(2));
        let data = registry();

        let mut cache = RenderDataCache::new();
        cache.refresh(&data, &materials);
        let first = cache.clone();
        cache.refresh(&data, &materials);
        assert_eq!(cache, first);
    }

    #[test]
    fn test_refresh_drops_removed_sections() {
        let mut data = registry();
        let mut cache = RenderDataCache::new();
        cache.refresh(&data, &SectionMaterials::new());
        data.remove_section(SectionId(1));
        cache.refresh(&data, &SectionMaterials::new());
        assert!(!cache.contains(SectionId(1)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_allocated_size_covers_slots_and_control_bytes() {
        let mut cache = RenderDataCache::new();
        assert_eq!(cache.allocated_size(), 0);

        cache.refresh(&registry(), &SectionMaterials::new());
        let slot = mem::size_of::<(SectionId, SectionRenderAttributes)>();
        assert!(cache.allocated_size() >= cache.len() * (slot + 1));
    }

    #[test]
    fn test_material_relevance_is_unioned() {
        let mut materials = SectionMaterials::new();
        materials.set(
            SectionId(1),
            Arc::new(SurfaceMaterial {
                relevance: MaterialRelevance {
                    translucent: true,
                    ..Default::default()
                },
                ..SurfaceMaterial::opaque(MaterialId(8))
            }),
        );
        let mut cache = RenderDataCache::new();
        cache.refresh(&registry(), &materials);
        let r = cache.material_relevance();
        assert!(r.opaque && r.translucent);

        cache.clear();
        assert_eq!(cache.material_relevance(), MaterialRelevance::default());
    }

    #[test]
    fn test_scan_skips_unrenderable_sections() {
        let scan = SectionScan::scan(&registry());
        assert!(scan.has_static_sections);
        assert!(scan.has_dynamic_sections);
        assert!(scan.has_shadowable_sections);

        let mut only_static = MeshSectionData::default();
        let mut s = SectionData::new(vec![lod(VertexLayout::default())], true);
        s.cast_shadow = false;
        only_static.insert_section(SectionId(0), s);
        only_static.insert_section(SectionId(1), SectionData::new(Vec::new(), false));
        let scan = SectionScan::scan(&only_static);
        assert_eq!(
            scan,
            SectionScan {
                has_static_sections: true,
                has_dynamic_sections: false,
                has_shadowable_sections: false,
            }
        );
    }
}
