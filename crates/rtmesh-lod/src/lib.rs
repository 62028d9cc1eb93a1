//! Screen-size LOD selection: threshold tables, bounds projection, and coarsest-fit LOD picking.

mod screen_size;
mod selector;
mod thresholds;

pub use screen_size::{BoxSphereBounds, compute_bounds_screen_radius_squared};
pub use selector::{LodSelector, LodView};
pub use thresholds::{LodError, MAX_LODS, ScreenSizeBand, ScreenSizeThresholds};
