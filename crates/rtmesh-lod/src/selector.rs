//! Coarsest-fit LOD selection by projected screen size.

use glam::{Mat4, Vec3};

use crate::{BoxSphereBounds, MAX_LODS, ScreenSizeThresholds, compute_bounds_screen_radius_squared};

/// The parts of a view that LOD selection depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodView {
    /// Eye position in world space.
    pub view_origin: Vec3,
    /// Projection matrix of the view.
    pub projection: Mat4,
    /// Per-view scale on projected size (quality settings, split-screen).
    pub lod_distance_factor: f32,
}

impl LodView {
    /// Create a view with a neutral distance factor.
    pub fn new(view_origin: Vec3, projection: Mat4) -> Self {
        Self {
            view_origin,
            projection,
            lod_distance_factor: 1.0,
        }
    }
}

/// Picks a LOD index for an object from its projected screen radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSelector {
    min_lod: usize,
    factor_scale: f32,
}

impl Default for LodSelector {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LodSelector {
    /// Create a selector that never returns anything finer than `min_lod`.
    ///
    /// `min_lod` is clamped to `MAX_LODS - 1`.
    pub fn new(min_lod: usize) -> Self {
        Self {
            min_lod: min_lod.min(MAX_LODS - 1),
            factor_scale: 1.0,
        }
    }

    /// Scale applied to the projected radius on top of the view's distance factor.
    pub fn with_factor_scale(mut self, factor_scale: f32) -> Self {
        self.factor_scale = factor_scale;
        self
    }

    /// The finest LOD this selector will return.
    pub fn min_lod(&self) -> usize {
        self.min_lod
    }

    /// Squared screen radius of `bounds` in `view`, with both scale factors applied.
    pub fn screen_radius_squared(&self, view: &LodView, bounds: &BoxSphereBounds) -> f32 {
        let factor = self.factor_scale * view.lod_distance_factor;
        compute_bounds_screen_radius_squared(
            bounds.origin,
            bounds.sphere_radius,
            view.view_origin,
            &view.projection,
        ) * factor
            * factor
    }

    /// Select the LOD for `bounds` as seen from `view`.
    pub fn select_lod(
        &self,
        view: &LodView,
        bounds: &BoxSphereBounds,
        thresholds: &ScreenSizeThresholds,
    ) -> usize {
        self.select_lod_for_radius_squared(self.screen_radius_squared(view, bounds), thresholds)
    }

    /// Select the LOD for an already projected squared screen radius.
    ///
    /// Walks from the coarsest slot to the finest and returns the first LOD
    /// whose half-threshold, squared, is strictly greater than the radius. An
    /// exact match is not accepted and falls through to a finer LOD. When no
    /// threshold is large enough the minimum LOD is returned.
    pub fn select_lod_for_radius_squared(
        &self,
        screen_radius_squared: f32,
        thresholds: &ScreenSizeThresholds,
    ) -> usize {
        for lod_index in (0..MAX_LODS).rev() {
            let half = thresholds.screen_size(lod_index) * 0.5;
            if half * half > screen_radius_squared {
                return lod_index.max(self.min_lod);
            }
        }
        self.min_lod
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(values: &[f32]) -> ScreenSizeThresholds {
        ScreenSizeThresholds::new(values).unwrap()
    }

    /// Radius squared for an object covering `size` of the view.
    fn radius_squared_for_size(size: f32) -> f32 {
        let r = size * 0.5;
        r * r
    }

    #[test]
    fn test_large_object_gets_finest_lod() {
        let selector = LodSelector::default();
        let t = thresholds(&[0.8, 0.4, 0.1]);
        assert_eq!(selector.select_lod_for_radius_squared(radius_squared_for_size(0.9), &t), 0);
        assert_eq!(selector.select_lod_for_radius_squared(radius_squared_for_size(0.5), &t), 0);
    }

    #[test]
    fn test_band_sizes_select_matching_lod() {
        let selector = LodSelector::default();
        let t = thresholds(&[0.8, 0.4, 0.1]);
        assert_eq!(selector.select_lod_for_radius_squared(radius_squared_for_size(0.25), &t), 1);
        assert_eq!(selector.select_lod_for_radius_squared(radius_squared_for_size(0.05), &t), 2);
    }

    #[test]
    fn test_tiny_object_gets_coarsest_defined_lod() {
        let selector = LodSelector::default();
        let t = thresholds(&[0.8, 0.4, 0.1]);
        assert_eq!(selector.select_lod_for_radius_squared(0.0, &t), 2);
    }

    #[test]
    fn test_exact_threshold_falls_through_to_finer_lod() {
        let selector = LodSelector::default();
        let t = thresholds(&[1.0, 0.5, 0.25]);
        // (0.5 * 0.5)^2 is exactly representable.
        let r2 = (0.5f32 * 0.5) * (0.5 * 0.5);
        assert_eq!(r2, 0.0625);
        assert_eq!(selector.select_lod_for_radius_squared(r2, &t), 0);
    }

    #[test]
    fn test_no_threshold_exceeds_returns_min_lod() {
        let t = thresholds(&[0.2, 0.1]);
        assert_eq!(LodSelector::default().select_lod_for_radius_squared(10.0, &t), 0);
        assert_eq!(LodSelector::new(3).select_lod_for_radius_squared(10.0, &t), 3);
    }

    #[test]
    fn test_min_lod_clamps_result() {
        let selector = LodSelector::new(2);
        let t = thresholds(&[0.8, 0.4, 0.1]);
        assert_eq!(selector.select_lod_for_radius_squared(radius_squared_for_size(0.9), &t), 2);
        assert_eq!(selector.select_lod_for_radius_squared(0.0, &t), 2);
    }

    #[test]
    fn test_min_lod_never_exceeds_max_lods() {
        assert_eq!(LodSelector::new(100).min_lod(), MAX_LODS - 1);
    }

    #[test]
    fn test_full_table_coarsest_result_is_last_slot() {
        let t = thresholds(&[1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3]);
        assert_eq!(LodSelector::default().select_lod_for_radius_squared(0.0, &t), MAX_LODS - 1);
    }

    #[test]
    fn test_lod_never_gets_finer_as_object_shrinks() {
        let selector = LodSelector::default();
        let t = thresholds(&[1.0, 0.6, 0.3, 0.15, 0.05]);
        let mut prev = 0;
        for step in 0..200 {
            let size = 1.2 - step as f32 * 0.006;
            let lod = selector.select_lod_for_radius_squared(radius_squared_for_size(size.max(0.0)), &t);
            assert!(lod >= prev, "size={size} lod={lod} prev={prev}");
            assert!(lod < MAX_LODS);
            prev = lod;
        }
    }

    #[test]
    fn test_select_lod_through_view_projection() {
        let selector = LodSelector::default();
        let t = thresholds(&[0.8, 0.4, 0.1]);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
        let view = LodView::new(Vec3::ZERO, proj);
        let bounds = BoxSphereBounds::new(Vec3::new(0.0, 0.0, -2.0), Vec3::ONE, 1.0);
        // r2 = (0.5 * 1)^2 / 4 = 0.0625 -> bigger than every half-threshold but LOD 0's.
        assert_eq!(selector.select_lod(&view, &bounds, &t), 0);

        let far = BoxSphereBounds::new(Vec3::new(0.0, 0.0, -4.0), Vec3::ONE, 1.0);
        // r2 = 0.015625 -> LOD 1.
        assert_eq!(selector.select_lod(&view, &far, &t), 1);
    }

    #[test]
    fn test_distance_factor_scales_radius() {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
        let mut view = LodView::new(Vec3::ZERO, proj);
        let bounds = BoxSphereBounds::new(Vec3::new(0.0, 0.0, -4.0), Vec3::ONE, 1.0);
        let selector = LodSelector::default();
        let base = selector.screen_radius_squared(&view, &bounds);
        view.lod_distance_factor = 2.0;
        let scaled = selector.screen_radius_squared(&view, &bounds);
        assert!((scaled - base * 4.0).abs() < 1e-6);

        let doubled = LodSelector::default().with_factor_scale(2.0);
        view.lod_distance_factor = 1.0;
        assert!((doubled.screen_radius_squared(&view, &bounds) - base * 4.0).abs() < 1e-6);
    }
}
