//! Material interfaces: render proxies, relevance, and the default fallback material.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

use crate::section::{SectionId, VertexLayout};

// ---------------------------------------------------------------------------
// MaterialId
// ---------------------------------------------------------------------------

/// Host identifier of a material.
///
/// `MaterialId(0)` is reserved for the default surface material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u64);

impl MaterialId {
    /// The default surface material.
    pub const DEFAULT: MaterialId = MaterialId(0);
}

// ---------------------------------------------------------------------------
// MaterialRenderProxy
// ---------------------------------------------------------------------------

/// The render-thread handle a batch draws with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialRenderProxy {
    /// Underlying material. `None` for colour-only proxies.
    pub material: Option<MaterialId>,
    /// Whether the selection-highlight variant is used.
    pub selected: bool,
    /// Flat colour replacing the material's output (wireframe tint).
    pub color_override: Option<[f32; 4]>,
}

impl MaterialRenderProxy {
    /// Proxy for a material, optionally its selected variant.
    pub fn new(material: MaterialId, selected: bool) -> Self {
        Self {
            material: Some(material),
            selected,
            color_override: None,
        }
    }

    /// Colour-tinted proxy wrapping an optional parent.
    pub fn colored(parent: Option<MaterialRenderProxy>, color: [f32; 4]) -> Self {
        Self {
            material: parent.and_then(|p| p.material),
            selected: parent.is_some_and(|p| p.selected),
            color_override: Some(color),
        }
    }

    pub(crate) fn sort_key(&self) -> (u64, bool) {
        (self.material.map_or(u64::MAX, |m| m.0), self.selected)
    }
}

// ---------------------------------------------------------------------------
// MaterialRelevance
// ---------------------------------------------------------------------------

/// What a material needs from the renderer. Union-able across sections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialRelevance {
    /// Opaque blend mode.
    pub opaque: bool,
    /// Masked blend mode.
    pub masked: bool,
    /// Any translucent blend mode.
    pub translucent: bool,
    /// Ignores the depth buffer; the object can then never be occluded.
    pub disable_depth_test: bool,
    /// Moves vertices in the vertex shader.
    pub uses_world_position_offset: bool,
}

impl MaterialRelevance {
    /// Relevance of a plain opaque surface.
    pub const OPAQUE: MaterialRelevance = MaterialRelevance {
        opaque: true,
        masked: false,
        translucent: false,
        disable_depth_test: false,
        uses_world_position_offset: false,
    };
}

impl BitOr for MaterialRelevance {
    type Output = MaterialRelevance;

    fn bitor(self, rhs: Self) -> Self::Output {
        MaterialRelevance {
            opaque: self.opaque | rhs.opaque,
            masked: self.masked | rhs.masked,
            translucent: self.translucent | rhs.translucent,
            disable_depth_test: self.disable_depth_test | rhs.disable_depth_test,
            uses_world_position_offset: self.uses_world_position_offset
                | rhs.uses_world_position_offset,
        }
    }
}

impl BitOrAssign for MaterialRelevance {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Tessellation mode of a material's shading model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TessellationMode {
    /// No tessellation.
    #[default]
    None,
    /// Flat subdivision.
    Flat,
    /// Curved point-normal triangles; needs adjacency for watertight edges.
    PnTriangles,
}

/// A material owned by the host material system.
pub trait Material: Send + Sync + fmt::Debug {
    /// Host identifier.
    fn id(&self) -> MaterialId;

    /// What the material needs from the renderer.
    fn relevance(&self) -> MaterialRelevance;

    /// Tessellation mode of the shading model.
    fn tessellation(&self) -> TessellationMode {
        TessellationMode::None
    }

    /// Whether displacement must stay crack-free across shared edges.
    fn crack_free_displacement(&self) -> bool {
        false
    }

    /// Render-thread proxy, optionally the selection-highlight variant.
    fn render_proxy(&self, selected: bool) -> MaterialRenderProxy {
        MaterialRenderProxy::new(self.id(), selected)
    }
}

/// Shared reference to a host material.
pub type MaterialRef = Arc<dyn Material>;

/// Plain-data material.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMaterial {
    /// Host identifier.
    pub id: MaterialId,
    /// Renderer requirements.
    pub relevance: MaterialRelevance,
    /// Tessellation mode.
    pub tessellation: TessellationMode,
    /// Crack-free displacement flag.
    pub crack_free_displacement: bool,
}

impl SurfaceMaterial {
    /// An opaque, untessellated material.
    pub fn opaque(id: MaterialId) -> Self {
        Self {
            id,
            relevance: MaterialRelevance::OPAQUE,
            tessellation: TessellationMode::None,
            crack_free_displacement: false,
        }
    }
}

impl Material for SurfaceMaterial {
    fn id(&self) -> MaterialId {
        self.id
    }

    fn relevance(&self) -> MaterialRelevance {
        self.relevance
    }

    fn tessellation(&self) -> TessellationMode {
        self.tessellation
    }

    fn crack_free_displacement(&self) -> bool {
        self.crack_free_displacement
    }
}

static DEFAULT_MATERIAL: LazyLock<MaterialRef> =
    LazyLock::new(|| Arc::new(SurfaceMaterial::opaque(MaterialId::DEFAULT)));

/// The process-wide default opaque surface material.
pub fn default_material() -> MaterialRef {
    Arc::clone(&DEFAULT_MATERIAL)
}

/// Whether drawing `material` on `layout` needs adjacency index data.
///
/// Only tessellating materials on a vertex layout that can feed the
/// tessellation stages qualify, and then only PN triangles or crack-free
/// displacement need neighbouring-triangle information.
pub fn requires_adjacency_information(material: &dyn Material, layout: VertexLayout) -> bool {
    if !layout.supports_tessellation {
        return false;
    }
    match material.tessellation() {
        TessellationMode::None => false,
        TessellationMode::PnTriangles => true,
        TessellationMode::Flat => material.crack_free_displacement(),
    }
}

// ---------------------------------------------------------------------------
// SectionMaterials
// ---------------------------------------------------------------------------

/// Per-section material assignments made on the owning component.
#[derive(Clone, Default)]
pub struct SectionMaterials {
    slots: FxHashMap<SectionId, MaterialRef>,
}

impl SectionMaterials {
    /// No assignments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a material to a section, returning the previous assignment.
    pub fn set(&mut self, section: SectionId, material: MaterialRef) -> Option<MaterialRef> {
        self.slots.insert(section, material)
    }

    /// Clear a section's assignment.
    pub fn clear(&mut self, section: SectionId) -> Option<MaterialRef> {
        self.slots.remove(&section)
    }

    /// Assigned material, if any.
    pub fn get(&self, section: SectionId) -> Option<&MaterialRef> {
        self.slots.get(&section)
    }

    /// Assigned material, or the default surface material.
    pub fn resolve(&self, section: SectionId) -> MaterialRef {
        match self.slots.get(&section) {
            Some(material) => Arc::clone(material),
            None => default_material(),
        }
    }
}

impl fmt::Debug for SectionMaterials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(id, m)| (id, m.id())))
            .finish()
    }
}
