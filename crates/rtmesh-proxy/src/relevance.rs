//! Per-view relevance: which draw paths a view needs from this proxy.

use crate::material::MaterialRelevance;
use crate::render_data::SectionScan;
use crate::view::{DEFAULT_LIGHTING_CHANNEL_MASK, PrimitiveState, ViewFamily};

/// Whether a view must rebuild every batch per frame instead of using the
/// cached static list.
///
/// Forced when the host offers no static path, the view needs per-pixel debug
/// visualisation, the primitive is selected (highlighting), or wireframe is on.
pub fn force_dynamic_path(primitive: &PrimitiveState, family: &ViewFamily) -> bool {
    !primitive.static_path_available
        || family.rich_view
        || primitive.selected
        || family.show_flags.wireframe
}

/// Draw-path flags derived for one view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewRelevanceFlags {
    /// Some section prefers the static path.
    pub has_static_sections: bool,
    /// Some section needs the dynamic path.
    pub has_dynamic_sections: bool,
    /// Some section casts shadows.
    pub has_shadowable_sections: bool,
    /// Static caching is invalid for this view.
    pub force_dynamic_path: bool,
}

impl ViewRelevanceFlags {
    /// Combine the object-wide scan with a view's forcing decision.
    pub fn new(scan: SectionScan, force_dynamic_path: bool) -> Self {
        Self {
            has_static_sections: scan.has_static_sections,
            has_dynamic_sections: scan.has_dynamic_sections,
            has_shadowable_sections: scan.has_shadowable_sections,
            force_dynamic_path,
        }
    }

    /// Static batches are drawn for this view.
    pub fn static_relevance(&self) -> bool {
        !self.force_dynamic_path && self.has_static_sections
    }

    /// Dynamic batches are gathered for this view.
    pub fn dynamic_relevance(&self) -> bool {
        self.force_dynamic_path || self.has_dynamic_sections
    }
}

/// Relevance report handed to the host's culling and sorting stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewRelevance {
    /// The primitive is drawn at all.
    pub draw_relevance: bool,
    /// The primitive contributes to shadow depth passes.
    pub shadow_relevance: bool,
    /// Static batches apply.
    pub static_relevance: bool,
    /// Dynamic batches apply.
    pub dynamic_relevance: bool,
    /// Drawn in the main pass.
    pub render_in_main_pass: bool,
    /// Uses non-default lighting channels.
    pub uses_lighting_channels: bool,
    /// Drawn into custom depth.
    pub render_custom_depth: bool,
    /// Union of the section materials' requirements.
    pub material: MaterialRelevance,
    /// The flags the path decision was made from.
    pub flags: ViewRelevanceFlags,
}

impl ViewRelevance {
    /// Resolve the full report for one view.
    pub fn compute(
        scan: SectionScan,
        primitive: &PrimitiveState,
        family: &ViewFamily,
        material: MaterialRelevance,
    ) -> Self {
        let flags = ViewRelevanceFlags::new(scan, force_dynamic_path(primitive, family));
        Self {
            draw_relevance: primitive.shown,
            shadow_relevance: primitive.cast_shadow && flags.has_shadowable_sections,
            static_relevance: flags.static_relevance(),
            dynamic_relevance: flags.dynamic_relevance(),
            render_in_main_pass: primitive.render_in_main_pass,
            uses_lighting_channels: primitive.lighting_channel_mask
                != DEFAULT_LIGHTING_CHANNEL_MASK,
            render_custom_depth: primitive.render_custom_depth,
            material,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ShowFlags;

    fn scan(has_static: bool, has_dynamic: bool) -> SectionScan {
        SectionScan {
            has_static_sections: has_static,
            has_dynamic_sections: has_dynamic,
            has_shadowable_sections: true,
        }
    }

    #[test]
    fn test_each_trigger_forces_dynamic_path() {
        let family = ViewFamily::default();
        let primitive = PrimitiveState::default();
        assert!(!force_dynamic_path(&primitive, &family));

        let no_static = PrimitiveState {
            static_path_available: false,
            ..primitive
        };
        assert!(force_dynamic_path(&no_static, &family));

        let selected = PrimitiveState {
            selected: true,
            ..primitive
        };
        assert!(force_dynamic_path(&selected, &family));

        let rich = ViewFamily {
            rich_view: true,
            ..Default::default()
        };
        assert!(force_dynamic_path(&primitive, &rich));

        let wireframe = ViewFamily {
            show_flags: ShowFlags {
                wireframe: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(force_dynamic_path(&primitive, &wireframe));
    }

    #[test]
    fn test_forced_dynamic_ignores_section_flags() {
        for (has_static, has_dynamic) in [(false, false), (true, false), (false, true), (true, true)] {
            let flags = ViewRelevanceFlags::new(scan(has_static, has_dynamic), true);
            assert!(!flags.static_relevance(), "static={has_static} dynamic={has_dynamic}");
            assert!(flags.dynamic_relevance(), "static={has_static} dynamic={has_dynamic}");
        }
    }

    #[test]
    fn test_unforced_follows_section_flags() {
        let flags = ViewRelevanceFlags::new(scan(true, false), false);
        assert!(flags.static_relevance());
        assert!(!flags.dynamic_relevance());

        let flags = ViewRelevanceFlags::new(scan(true, true), false);
        assert!(flags.static_relevance());
        assert!(flags.dynamic_relevance());

        let flags = ViewRelevanceFlags::new(scan(false, false), false);
        assert!(!flags.static_relevance());
        assert!(!flags.dynamic_relevance());
    }

    #[test]
    fn test_report_carries_primitive_flags() {
        let primitive = PrimitiveState {
            shown: false,
            render_custom_depth: true,
            lighting_channel_mask: 0b011,
            ..Default::default()
        };
        let material = MaterialRelevance::OPAQUE;
        let r = ViewRelevance::compute(scan(true, false), &primitive, &ViewFamily::default(), material);
        assert!(!r.draw_relevance);
        assert!(r.render_custom_depth);
        assert!(r.uses_lighting_channels);
        assert!(r.shadow_relevance);
        assert!(r.static_relevance);
        assert_eq!(r.material, material);
    }

    #[test]
    fn test_shadow_relevance_needs_shadowable_section() {
        let mut s = scan(true, false);
        s.has_shadowable_sections = false;
        let r = ViewRelevance::compute(
            s,
            &PrimitiveState::default(),
            &ViewFamily::default(),
            MaterialRelevance::default(),
        );
        assert!(!r.shadow_relevance);
    }
}
