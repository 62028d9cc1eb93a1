//! Render-thread scene proxy for runtime-generated, sectioned meshes.
//!
//! Decides per view which sections and LODs are drawn, packages them into
//! [`MeshBatch`] descriptors for the host renderer, and reports view relevance
//! (static vs dynamic path, shadows, wireframe override). All geometry lives in a
//! host-owned [`SectionRegistry`]; this crate only reads it.

pub mod collector;
pub mod collision;
#[cfg(feature = "debug-rendering")]
pub mod debug_draw;
pub mod material;
pub mod mesh_batch;
pub mod relevance;
pub mod render_data;
pub mod scene_proxy;
pub mod section;
pub mod view;

pub use collector::{
    MaterialGroup, MaterialGroupIter, MeshElementCollector, StaticDrawList, StaticLodIter,
    StaticMeshEntry,
};
pub use collision::{BodySetup, CollisionShape, CollisionTraceFlag, SimpleBodySetup};
#[cfg(feature = "debug-rendering")]
pub use debug_draw::{DebugLine, DebugLineBuffer};
pub use material::{
    Material, MaterialId, MaterialRef, MaterialRelevance, MaterialRenderProxy, SectionMaterials,
    SurfaceMaterial, TessellationMode, default_material, requires_adjacency_information,
};
pub use mesh_batch::{BatchContext, MeshBatch, build_batch};
pub use relevance::{ViewRelevance, ViewRelevanceFlags, force_dynamic_path};
pub use render_data::{RenderDataCache, SectionRenderAttributes, SectionScan};
pub use scene_proxy::{PrimitiveSceneProxy, ProxySettings, ProxyState, RuntimeMeshSceneProxy};
pub use section::{
    DepthPriorityGroup, GeometryBatch, IndexBufferHandle, LodData, MeshSection, MeshSectionData,
    PrimitiveType, SectionData, SectionId, SectionLod, SectionRegistry, VertexFactoryHandle,
    VertexLayout,
};
pub use view::{
    DEFAULT_LIGHTING_CHANNEL_MASK, PrimitiveState, PrimitiveUniform, SceneView, ShowFlags,
    UniformBufferHandle, ViewFamily,
};

pub use rtmesh_lod::{BoxSphereBounds, LodSelector, LodView, MAX_LODS, ScreenSizeBand, ScreenSizeThresholds};
