//! Draw collectors: the cached static draw list and the per-frame, per-view mesh collector.
//!
//! Per-view batches can be sorted by material, then vertex factory, then LOD, so
//! that batches sharing a material are submitted back to back.

#[cfg(feature = "debug-rendering")]
use crate::debug_draw::DebugLineBuffer;
use crate::material::MaterialRenderProxy;
use crate::mesh_batch::MeshBatch;

// ---------------------------------------------------------------------------
// Static draw list
// ---------------------------------------------------------------------------

/// A batch on the static path, with the screen size it stops being used at.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticMeshEntry {
    /// The cached batch.
    pub batch: MeshBatch,
    /// Upper screen-size threshold of the batch's LOD.
    pub screen_size: f32,
}

/// Batches built once for the static path and cached by the host.
#[derive(Clone, Debug, Default)]
pub struct StaticDrawList {
    entries: Vec<StaticMeshEntry>,
}

impl StaticDrawList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch.
    pub fn draw_mesh(&mut self, batch: MeshBatch, screen_size: f32) {
        self.entries.push(StaticMeshEntry { batch, screen_size });
    }

    /// All entries in submission order.
    pub fn entries(&self) -> &[StaticMeshEntry] {
        &self.entries
    }

    /// Entries to draw when the object is at `lod_index`, one per section.
    ///
    /// Each section draws its coarsest cached entry at or below `lod_index`. A
    /// section with nothing cached that fine draws its finest cached entry
    /// instead. A section's entries must be contiguous, as
    /// `draw_static_elements` records them.
    pub fn entries_for_lod(&self, lod_index: usize) -> StaticLodIter<'_> {
        StaticLodIter {
            entries: &self.entries,
            cursor: 0,
            lod_index,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (the host invalidated the static list).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Iterator over the [`StaticMeshEntry`]s chosen for one LOD.
pub struct StaticLodIter<'a> {
    entries: &'a [StaticMeshEntry],
    cursor: usize,
    lod_index: usize,
}

impl<'a> Iterator for StaticLodIter<'a> {
    type Item = &'a StaticMeshEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries;
        if self.cursor >= entries.len() {
            return None;
        }

        let start = self.cursor;
        let section = entries[start].batch.section_id;
        while self.cursor < entries.len() && entries[self.cursor].batch.section_id == section {
            self.cursor += 1;
        }

        let run = &entries[start..self.cursor];
        let lod_index = self.lod_index;
        run.iter()
            .filter(|entry| entry.batch.lod_index <= lod_index)
            .max_by_key(|entry| entry.batch.lod_index)
            .or_else(|| run.iter().min_by_key(|entry| entry.batch.lod_index))
    }
}

// ---------------------------------------------------------------------------
// Per-frame collector
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct ViewMeshes {
    batches: Vec<MeshBatch>,
    sorted: bool,
    #[cfg(feature = "debug-rendering")]
    lines: DebugLineBuffer,
}

/// Gathers one frame's dynamic batches for each view.
#[derive(Clone, Debug, Default)]
pub struct MeshElementCollector {
    views: Vec<ViewMeshes>,
    one_frame_materials: Vec<MaterialRenderProxy>,
}

impl MeshElementCollector {
    /// Create a collector for `num_views` views.
    pub fn new(num_views: usize) -> Self {
        Self {
            views: vec![ViewMeshes::default(); num_views],
            one_frame_materials: Vec::new(),
        }
    }

    /// Number of views.
    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    /// Add a batch to a view. Out-of-range views are ignored.
    pub fn add_mesh(&mut self, view_index: usize, batch: MeshBatch) {
        match self.views.get_mut(view_index) {
            Some(view) => {
                view.batches.push(batch);
                view.sorted = false;
            }
            None => tracing::trace!(view_index, "batch for unknown view dropped"),
        }
    }

    /// Keep a material proxy alive until the frame is submitted.
    pub fn register_one_frame_material_proxy(&mut self, proxy: MaterialRenderProxy) {
        self.one_frame_materials.push(proxy);
    }

    /// Material proxies registered this frame.
    pub fn one_frame_material_proxies(&self) -> &[MaterialRenderProxy] {
        &self.one_frame_materials
    }

    /// Batches gathered for a view, in insertion order unless sorted.
    pub fn batches(&self, view_index: usize) -> &[MeshBatch] {
        self.views
            .get(view_index)
            .map_or(&[], |view| view.batches.as_slice())
    }

    /// Total batches over all views.
    pub fn total_batches(&self) -> usize {
        self.views.iter().map(|view| view.batches.len()).sum()
    }

    /// Debug line sink of a view.
    #[cfg(feature = "debug-rendering")]
    pub fn pdi(&mut self, view_index: usize) -> Option<&mut DebugLineBuffer> {
        self.views.get_mut(view_index).map(|view| &mut view.lines)
    }

    /// Debug lines gathered for a view.
    #[cfg(feature = "debug-rendering")]
    pub fn debug_lines(&self, view_index: usize) -> Option<&DebugLineBuffer> {
        self.views.get(view_index).map(|view| &view.lines)
    }

    /// Sort a view's batches: material, then vertex factory, then LOD.
    pub fn sort(&mut self, view_index: usize) {
        if let Some(view) = self.views.get_mut(view_index) {
            view.batches.sort_by(|a, b| {
                a.material
                    .sort_key()
                    .cmp(&b.material.sort_key())
                    .then(a.geometry.vertex_factory.cmp(&b.geometry.vertex_factory))
                    .then(a.lod_index.cmp(&b.lod_index))
            });
            view.sorted = true;
        }
    }

    /// Whether a view has been sorted since its last modification.
    pub fn is_sorted(&self, view_index: usize) -> bool {
        self.views.get(view_index).is_some_and(|view| view.sorted)
    }

    /// Iterate a view's batches in groups sharing a material.
    ///
    /// For correct grouping, call [`sort`](Self::sort) first.
    pub fn groups(&self, view_index: usize) -> MaterialGroupIter<'_> {
        MaterialGroupIter {
            batches: self.batches(view_index),
            cursor: 0,
        }
    }

    /// Reset for the next frame, keeping allocated capacity.
    pub fn clear(&mut self) {
        for view in &mut self.views {
            view.batches.clear();
            view.sorted = false;
            #[cfg(feature = "debug-rendering")]
            view.lines.clear();
        }
        self.one_frame_materials.clear();
    }
}

/// A run of batches sharing one material.
#[derive(Debug)]
pub struct MaterialGroup<'a> {
    /// The shared material.
    pub material: MaterialRenderProxy,
    /// The batches in this group.
    pub batches: &'a [MeshBatch],
}

/// Iterator over [`MaterialGroup`]s of one view.
pub struct MaterialGroupIter<'a> {
    batches: &'a [MeshBatch],
    cursor: usize,
}

impl<'a> Iterator for MaterialGroupIter<'a> {
    type Item = MaterialGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.batches.len() {
            return None;
        }

        let start = self.cursor;
        let material = self.batches[start].material;
        while self.cursor < self.batches.len() && self.batches[self.cursor].material == material {
            self.cursor += 1;
        }

        Some(MaterialGroup {
            material,
            batches: &self.batches[start..self.cursor],
        })
    }
}
