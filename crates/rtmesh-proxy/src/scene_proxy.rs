//! Frame driver: the render-thread proxy the host calls into.
//!
//! The host creates one [`RuntimeMeshSceneProxy`] per component, calls
//! [`create_render_thread_resources`](PrimitiveSceneProxy::create_render_thread_resources)
//! once its buffers are uploaded, then queries relevance and gathers batches
//! every frame. Nothing here blocks, allocates GPU memory or fails.

use std::mem;
use std::sync::Arc;

use rtmesh_lod::LodSelector;

use crate::collector::{MeshElementCollector, StaticDrawList};
use crate::collision::BodySetup;
#[cfg(feature = "debug-rendering")]
use crate::debug_draw;
use crate::material::{MaterialRenderProxy, SectionMaterials};
use crate::mesh_batch::{BatchContext, MeshBatch, build_batch};
use crate::relevance::{ViewRelevance, force_dynamic_path};
use crate::render_data::{RenderDataCache, SectionRenderAttributes, SectionScan};
use crate::section::{MeshSection, SectionId, SectionRegistry};
use crate::view::{PrimitiveState, PrimitiveUniform, SceneView, ViewFamily};

/// Max views addressable by the visibility bitmask.
const MAX_VISIBILITY_VIEWS: usize = u32::BITS as usize;

/// Host-supplied tuning of one proxy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProxySettings {
    /// Finest LOD the selector may return.
    pub min_lod: usize,
    /// Scale applied to the projected screen radius on top of the view's factor.
    pub lod_factor_scale: f32,
    /// Whether debug view modes (wireframe override) may be used.
    pub allow_debug_viewmodes: bool,
    /// Tint of the wireframe override.
    pub wireframe_color: [f32; 4],
    /// Base colour of the collision overlay.
    pub collision_color: [f32; 4],
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            min_lod: 0,
            lod_factor_scale: 1.0,
            allow_debug_viewmodes: true,
            wireframe_color: [0.0, 0.5, 1.0, 1.0],
            collision_color: [157.0 / 255.0, 149.0 / 255.0, 223.0 / 255.0, 1.0],
        }
    }
}

/// Lifecycle of a proxy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProxyState {
    /// Constructed; render resources are not ready yet.
    #[default]
    Uninitialized,
    /// Render data resolved; frames may be built.
    ResourcesCreated,
}

/// The calls a host renderer makes into a primitive's proxy.
pub trait PrimitiveSceneProxy {
    /// Resolve per-section render data. Called once render resources exist.
    fn create_render_thread_resources(&mut self);

    /// Which draw paths this view family needs.
    fn view_relevance(&self, family: &ViewFamily) -> ViewRelevance;

    /// LOD to display in `view`.
    fn lod(&self, view: &SceneView) -> usize;

    /// Submit cached batches for the static path.
    fn draw_static_elements(&self, list: &mut StaticDrawList);

    /// Gather this frame's batches for every view whose bit is set in `visibility_map`.
    fn dynamic_mesh_elements(
        &self,
        views: &[SceneView],
        family: &ViewFamily,
        visibility_map: u32,
        collector: &mut MeshElementCollector,
    );

    /// Whether occlusion culling may hide the primitive.
    fn can_be_occluded(&self) -> bool {
        true
    }

    /// Approximate bytes held by the proxy.
    fn memory_footprint(&self) -> usize;
}

/// Scene proxy of a runtime mesh component.
pub struct RuntimeMeshSceneProxy {
    registry: Arc<dyn SectionRegistry>,
    materials: SectionMaterials,
    body_setup: Option<Arc<dyn BodySetup>>,
    primitive: PrimitiveState,
    settings: ProxySettings,
    selector: LodSelector,
    render_data: RenderDataCache,
    scan: SectionScan,
    state: ProxyState,
}

impl RuntimeMeshSceneProxy {
    /// Create a proxy over shared section data. No render data is resolved
    /// until resources are created.
    pub fn new(
        registry: Arc<dyn SectionRegistry>,
        materials: SectionMaterials,
        body_setup: Option<Arc<dyn BodySetup>>,
        primitive: PrimitiveState,
        settings: ProxySettings,
    ) -> Self {
        let selector = LodSelector::new(settings.min_lod).with_factor_scale(settings.lod_factor_scale);
        Self {
            registry,
            materials,
            body_setup,
            primitive,
            settings,
            selector,
            render_data: RenderDataCache::new(),
            scan: SectionScan::default(),
            state: ProxyState::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// Settings the proxy was created with.
    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    /// Host state of the primitive.
    pub fn primitive(&self) -> &PrimitiveState {
        &self.primitive
    }

    /// Resolved per-section render data.
    pub fn render_data(&self) -> &RenderDataCache {
        &self.render_data
    }

    /// Object-wide section flags from the last refresh.
    pub fn section_scan(&self) -> SectionScan {
        self.scan
    }

    /// Physics body drawn by the collision overlay.
    pub fn body_setup(&self) -> Option<&Arc<dyn BodySetup>> {
        self.body_setup.as_ref()
    }

    /// Re-resolve render data and section flags from the current registry.
    ///
    /// Sections added after resource creation are skipped until this runs.
    pub fn refresh_render_data(&mut self) {
        self.render_data.refresh(&*self.registry, &self.materials);
        self.scan = SectionScan::scan(&*self.registry);
        tracing::debug!(
            sections = self.render_data.len(),
            has_static = self.scan.has_static_sections,
            has_dynamic = self.scan.has_dynamic_sections,
            "proxy render data refreshed"
        );
    }

    /// Point the proxy at a new section snapshot. Render data is not refreshed.
    pub fn replace_section_data(&mut self, registry: Arc<dyn SectionRegistry>) {
        self.registry = registry;
    }

    /// Replace the section material assignments. Takes effect on the next refresh.
    pub fn replace_materials(&mut self, materials: SectionMaterials) {
        self.materials = materials;
    }

    /// Update transform, bounds, and flags pushed by the host.
    pub fn update_primitive(&mut self, primitive: PrimitiveState) {
        self.primitive = primitive;
    }

    /// Uniform contents for the primitive's instance transform binding.
    pub fn primitive_uniform(&self) -> PrimitiveUniform {
        PrimitiveUniform::from(&self.primitive)
    }

    /// View-independent batches of one LOD over every cached, renderable section.
    pub fn mesh_description(&self, lod_index: usize) -> Vec<MeshBatch> {
        let ctx = self.batch_context();
        let mut batches = Vec::new();
        for (id, section, attrs) in self.renderable_sections() {
            if !section.lod(lod_index).is_some_and(|lod| lod.can_render()) {
                continue;
            }
            let material = attrs.material.render_proxy(false);
            if let Some(batch) = build_batch(id, section, lod_index, attrs, material, None, &ctx) {
                batches.push(batch);
            }
        }
        batches
    }

    /// Static batches to draw in `view`: one per section, chosen by
    /// [`StaticDrawList::entries_for_lod`] at the selected LOD.
    pub fn visible_static_batches<'a>(
        &self,
        list: &'a StaticDrawList,
        view: &SceneView,
    ) -> impl Iterator<Item = &'a MeshBatch> + use<'a> {
        list.entries_for_lod(self.lod(view)).map(|entry| &entry.batch)
    }

    fn batch_context(&self) -> BatchContext<'_> {
        BatchContext {
            thresholds: self.registry.screen_sizes(),
            reverse_culling: self.primitive.is_local_to_world_determinant_negative(),
            uniform_buffer: self.primitive.uniform_buffer,
            depth_priority: self.primitive.depth_priority,
        }
    }

    /// Sections that have render data and something to draw.
    fn renderable_sections(
        &self,
    ) -> impl Iterator<Item = (SectionId, &dyn MeshSection, &SectionRenderAttributes)> + '_ {
        self.registry.sections().filter_map(|(id, section)| {
            let Some(attrs) = self.render_data.lookup(id) else {
                tracing::trace!(section = id.0, "section has no render data, skipped");
                return None;
            };
            section.should_render().then_some((id, section, attrs))
        })
    }

    fn is_ready(&self, call: &'static str) -> bool {
        if self.state == ProxyState::ResourcesCreated {
            return true;
        }
        tracing::warn!(call, "render resources not created, nothing drawn");
        false
    }

    /// Wireframe tint for this frame, if the view family asks for one.
    fn wireframe_override(&self, family: &ViewFamily) -> Option<MaterialRenderProxy> {
        if !(self.settings.allow_debug_viewmodes && family.show_flags.wireframe) {
            return None;
        }
        let parent = family
            .wireframe_material
            .as_ref()
            .map(|m| m.render_proxy(self.primitive.selected));
        Some(MaterialRenderProxy::colored(parent, self.settings.wireframe_color))
    }

    #[cfg(feature = "debug-rendering")]
    fn draw_debug_overlay(
        &self,
        view_index: usize,
        family: &ViewFamily,
        collector: &mut MeshElementCollector,
    ) {
        let Some(lines) = collector.pdi(view_index) else {
            return;
        };

        if family.show_flags.collision && self.primitive.collision_enabled {
            if let Some(body) = &self.body_setup {
                let color = debug_draw::selection_color(
                    self.settings.collision_color,
                    self.primitive.selected,
                    self.primitive.hovered,
                );
                if !debug_draw::draw_collision(lines, &**body, &self.primitive.local_to_world, color)
                {
                    tracing::trace!("complex-as-simple collision has no simple shapes to draw");
                }
            }
        }

        if family.show_flags.bounds {
            debug_draw::draw_bounds(lines, &self.primitive.bounds(), self.primitive.selected);
        }
    }
}

impl PrimitiveSceneProxy for RuntimeMeshSceneProxy {
    fn create_render_thread_resources(&mut self) {
        self.refresh_render_data();
        self.state = ProxyState::ResourcesCreated;
    }

    fn view_relevance(&self, family: &ViewFamily) -> ViewRelevance {
        ViewRelevance::compute(
            self.scan,
            &self.primitive,
            family,
            self.render_data.material_relevance(),
        )
    }

    fn lod(&self, view: &SceneView) -> usize {
        self.selector.select_lod(
            &view.lod_view(),
            &self.primitive.bounds(),
            self.registry.screen_sizes(),
        )
    }

    fn draw_static_elements(&self, list: &mut StaticDrawList) {
        if !self.is_ready("draw_static_elements") {
            return;
        }

        let ctx = self.batch_context();
        for (id, section, attrs) in self.renderable_sections() {
            if !section.wants_to_render_in_static_path() {
                continue;
            }
            let material = attrs.material.render_proxy(false);
            for lod_index in 0..section.num_lods() {
                if !section.lod(lod_index).is_some_and(|lod| lod.can_render()) {
                    continue;
                }
                if let Some(batch) = build_batch(id, section, lod_index, attrs, material, None, &ctx) {
                    list.draw_mesh(batch, ctx.thresholds.screen_size(lod_index));
                }
            }
        }
    }

    fn dynamic_mesh_elements(
        &self,
        views: &[SceneView],
        family: &ViewFamily,
        visibility_map: u32,
        collector: &mut MeshElementCollector,
    ) {
        if !self.is_ready("dynamic_mesh_elements") {
            return;
        }

        let wireframe = self.wireframe_override(family);
        if let Some(proxy) = wireframe {
            collector.register_one_frame_material_proxy(proxy);
        }

        let forced = force_dynamic_path(&self.primitive, family);
        let ctx = self.batch_context();

        for view_index in 0..views.len().min(MAX_VISIBILITY_VIEWS) {
            if visibility_map & (1 << view_index) == 0 {
                continue;
            }

            for (id, section, attrs) in self.renderable_sections() {
                if !forced && section.wants_to_render_in_static_path() {
                    continue;
                }
                let material = attrs.material.render_proxy(self.primitive.selected);
                for lod_index in 0..section.num_lods() {
                    if !section.lod(lod_index).is_some_and(|lod| lod.can_render()) {
                        continue;
                    }
                    if let Some(batch) = build_batch(
                        id,
                        section,
                        lod_index,
                        attrs,
                        material,
                        wireframe.as_ref(),
                        &ctx,
                    ) {
                        collector.add_mesh(view_index, batch);
                    }
                }
            }

            #[cfg(feature = "debug-rendering")]
            self.draw_debug_overlay(view_index, family, collector);
        }

        tracing::trace!(batches = collector.total_batches(), forced, "dynamic elements gathered");
    }

    fn can_be_occluded(&self) -> bool {
        !self.render_data.material_relevance().disable_depth_test
    }

    fn memory_footprint(&self) -> usize {
        mem::size_of::<Self>() + self.render_data.allocated_size()
    }
}

#[cfg(test)]
#[path = "scene_proxy_tests.rs"]
mod tests;
