//! Section registry interfaces and an in-memory implementation.
//!
//! The registry owns every section's LOD chain and GPU-side handles. The proxy
//! reads it through [`SectionRegistry`] and never mutates it.

use std::collections::BTreeMap;

use rtmesh_lod::{MAX_LODS, ScreenSizeThresholds};

/// Stable identifier of one mesh section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(pub u32);

/// Opaque handle to a host vertex factory (vertex buffers plus layout binding).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexFactoryHandle(pub u64);

/// Opaque handle to a host index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBufferHandle(pub u64);

/// Topology of the index data a batch draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Three indices per triangle.
    TriangleList,
    /// Twelve control points per triangle (triangle plus adjacency), for
    /// tessellation with crack-free displacement.
    TriangleListAdjacency,
}

impl PrimitiveType {
    /// Number of indices consumed per primitive.
    pub fn indices_per_primitive(self) -> u32 {
        match self {
            PrimitiveType::TriangleList => 3,
            PrimitiveType::TriangleListAdjacency => 12,
        }
    }
}

/// Depth priority group a batch is drawn in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthPriorityGroup {
    /// Regular scene depth.
    #[default]
    World,
    /// Drawn over the world (editor gizmos, first-person meshes).
    Foreground,
}

/// Description of the vertex stream a LOD is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Whether the vertex factory can feed hull/domain shaders.
    pub supports_tessellation: bool,
}

/// Geometry part of a mesh batch, produced by a section LOD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryBatch {
    /// Vertex factory to bind.
    pub vertex_factory: VertexFactoryHandle,
    /// Index buffer to draw from.
    pub index_buffer: IndexBufferHandle,
    /// Topology of `index_buffer`.
    pub primitive_type: PrimitiveType,
    /// First index to draw.
    pub first_index: u32,
    /// Number of primitives to draw.
    pub num_primitives: u32,
    /// Smallest vertex index referenced.
    pub min_vertex_index: u32,
    /// Largest vertex index referenced.
    pub max_vertex_index: u32,
    /// Whether the batch renders into shadow depth passes.
    pub cast_shadow: bool,
    /// Depth priority group.
    pub depth_priority: DepthPriorityGroup,
}

/// One level of detail of a section.
pub trait SectionLod {
    /// Whether this LOD has uploaded geometry that can be drawn.
    fn can_render(&self) -> bool;

    /// Layout of the vertex stream.
    fn vertex_layout(&self) -> VertexLayout;

    /// Fill in the geometry for a batch.
    ///
    /// When `wants_adjacency` is set and an adjacency index buffer exists the
    /// batch uses it; otherwise it silently falls back to the regular indices.
    fn create_geometry_batch(&self, casts_shadow: bool, wants_adjacency: bool) -> GeometryBatch;
}

/// A section: an independently toggled piece of the mesh with its own LOD chain.
pub trait MeshSection {
    /// Number of LODs (at most [`MAX_LODS`]).
    fn num_lods(&self) -> usize;

    /// LOD by index; `None` past `num_lods`.
    fn lod(&self, index: usize) -> Option<&dyn SectionLod>;

    /// Whether the section is visible and has something to draw.
    fn should_render(&self) -> bool;

    /// Whether the section's geometry changes rarely enough to be cached on
    /// the static draw path.
    fn wants_to_render_in_static_path(&self) -> bool;

    /// Whether the section casts shadows.
    fn casts_shadow(&self) -> bool;
}

/// Read-only view of a mesh's sections, shared between proxies.
pub trait SectionRegistry: Send + Sync {
    /// All sections, in a stable order.
    fn sections(&self) -> Box<dyn Iterator<Item = (SectionId, &dyn MeshSection)> + '_>;

    /// Object-wide LOD screen-size table.
    fn screen_sizes(&self) -> &ScreenSizeThresholds;

    /// Identifiers of all sections, in the same order as [`sections`](Self::sections).
    fn section_ids(&self) -> Vec<SectionId> {
        self.sections().map(|(id, _)| id).collect()
    }
}

// ---------------------------------------------------------------------------
// In-memory registry
// ---------------------------------------------------------------------------

/// Plain-data LOD with handles to already uploaded buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct LodData {
    /// Vertex factory bound for this LOD.
    pub vertex_factory: VertexFactoryHandle,
    /// Regular triangle-list indices.
    pub index_buffer: IndexBufferHandle,
    /// Optional twelve-point adjacency indices.
    pub adjacency_index_buffer: Option<IndexBufferHandle>,
    /// Number of vertices in the vertex buffers.
    pub num_vertices: u32,
    /// Number of indices in `index_buffer`.
    pub num_indices: u32,
    /// Number of indices in `adjacency_index_buffer`.
    pub num_adjacency_indices: u32,
    /// Vertex stream layout.
    pub vertex_layout: VertexLayout,
}

impl LodData {
    /// A triangle-list LOD without adjacency data.
    pub fn new(
        vertex_factory: VertexFactoryHandle,
        index_buffer: IndexBufferHandle,
        num_vertices: u32,
        num_indices: u32,
    ) -> Self {
        Self {
            vertex_factory,
            index_buffer,
            adjacency_index_buffer: None,
            num_vertices,
            num_indices,
            num_adjacency_indices: 0,
            vertex_layout: VertexLayout::default(),
        }
    }

    /// Attach an adjacency index buffer.
    pub fn with_adjacency(mut self, buffer: IndexBufferHandle, num_indices: u32) -> Self {
        self.adjacency_index_buffer = Some(buffer);
        self.num_adjacency_indices = num_indices;
        self
    }

    /// Replace the vertex layout.
    pub fn with_layout(mut self, layout: VertexLayout) -> Self {
        self.vertex_layout = layout;
        self
    }
}

impl SectionLod for LodData {
    fn can_render(&self) -> bool {
        self.num_vertices > 0 && self.num_indices > 0
    }

    fn vertex_layout(&self) -> VertexLayout {
        self.vertex_layout
    }

    fn create_geometry_batch(&self, casts_shadow: bool, wants_adjacency: bool) -> GeometryBatch {
        let (index_buffer, num_indices, primitive_type) =
            match (wants_adjacency, self.adjacency_index_buffer) {
                (true, Some(adjacency)) if self.num_adjacency_indices > 0 => (
                    adjacency,
                    self.num_adjacency_indices,
                    PrimitiveType::TriangleListAdjacency,
                ),
                _ => (self.index_buffer, self.num_indices, PrimitiveType::TriangleList),
            };

        GeometryBatch {
            vertex_factory: self.vertex_factory,
            index_buffer,
            primitive_type,
            first_index: 0,
            num_primitives: num_indices / primitive_type.indices_per_primitive(),
            min_vertex_index: 0,
            max_vertex_index: self.num_vertices.saturating_sub(1),
            cast_shadow: casts_shadow,
            depth_priority: DepthPriorityGroup::World,
        }
    }
}

/// Plain-data section.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionData {
    lods: Vec<LodData>,
    /// Section visibility toggle.
    pub visible: bool,
    /// Prefer the cached static draw path.
    pub static_path: bool,
    /// Whether the section casts shadows.
    pub cast_shadow: bool,
}

impl SectionData {
    /// A visible, shadow-casting section.
    pub fn new(mut lods: Vec<LodData>, static_path: bool) -> Self {
        lods.truncate(MAX_LODS);
        Self {
            lods,
            visible: true,
            static_path,
            cast_shadow: true,
        }
    }

    /// Mutable LOD by index; `None` past the chain.
    pub fn lod_mut(&mut self, index: usize) -> Option<&mut LodData> {
        self.lods.get_mut(index)
    }
}

impl MeshSection for SectionData {
    fn num_lods(&self) -> usize {
        self.lods.len()
    }

    fn lod(&self, index: usize) -> Option<&dyn SectionLod> {
        self.lods.get(index).map(|lod| lod as &dyn SectionLod)
    }

    fn should_render(&self) -> bool {
        self.visible && self.lods.iter().any(|lod| lod.can_render())
    }

    fn wants_to_render_in_static_path(&self) -> bool {
        self.static_path
    }

    fn casts_shadow(&self) -> bool {
        self.cast_shadow
    }
}

/// Section registry backed by an ordered map.
#[derive(Clone, Debug, Default)]
pub struct MeshSectionData {
    sections: BTreeMap<SectionId, SectionData>,
    screen_sizes: ScreenSizeThresholds,
}

impl MeshSectionData {
    /// Create an empty registry with the given LOD table.
    pub fn new(screen_sizes: ScreenSizeThresholds) -> Self {
        Self {
            sections: BTreeMap::new(),
            screen_sizes,
        }
    }

    /// Insert or replace a section, returning the previous one.
    pub fn insert_section(&mut self, id: SectionId, section: SectionData) -> Option<SectionData> {
        self.sections.insert(id, section)
    }

    /// Remove a section.
    pub fn remove_section(&mut self, id: SectionId) -> Option<SectionData> {
        self.sections.remove(&id)
    }

    /// Mutable access to a section.
    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut SectionData> {
        self.sections.get_mut(&id)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there are no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl SectionRegistry for MeshSectionData {
    fn sections(&self) -> Box<dyn Iterator<Item = (SectionId, &dyn MeshSection)> + '_> {
        Box::new(
            self.sections
                .iter()
                .map(|(id, section)| (*id, section as &dyn MeshSection)),
        )
    }

    fn screen_sizes(&self) -> &ScreenSizeThresholds {
        &self.screen_sizes
    }
}
