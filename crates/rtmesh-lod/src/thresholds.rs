//! Per-object screen-size threshold tables.

use thiserror::Error;

/// Maximum number of LOD levels a single section can carry.
pub const MAX_LODS: usize = 8;

/// Errors returned when building a [`ScreenSizeThresholds`] table.
#[derive(Debug, Error, PartialEq)]
pub enum LodError {
    /// More entries than LOD slots.
    #[error("threshold table has {0} entries, at most {MAX_LODS} are allowed")]
    TooManyLevels(usize),

    /// An entry is negative, NaN, or infinite.
    #[error("threshold {index} is not a finite non-negative fraction: {value}")]
    InvalidThreshold {
        /// Position of the offending entry.
        index: usize,
        /// The rejected value.
        value: f32,
    },

    /// An entry is larger than the one before it.
    #[error("thresholds must be non-increasing: [{index}] = {value} exceeds previous {previous}")]
    Increasing {
        /// Position of the offending entry.
        index: usize,
        /// The rejected value.
        value: f32,
        /// The entry it was compared against.
        previous: f32,
    },
}

/// Normalized screen-size fractions at which LOD transitions happen.
///
/// `screen_size(i)` is the upper bound of LOD `i` (1.0 = the object fills the
/// view). The table always holds `MAX_LODS + 1` slots; slots past the supplied
/// entries are 0.0, so LOD `N` implicitly extends down to nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenSizeThresholds {
    sizes: [f32; MAX_LODS + 1],
}

impl Default for ScreenSizeThresholds {
    /// A single LOD that covers every screen size.
    fn default() -> Self {
        let mut sizes = [0.0; MAX_LODS + 1];
        sizes[0] = 1.0;
        Self { sizes }
    }
}

impl ScreenSizeThresholds {
    /// Build a table from up to [`MAX_LODS`] non-increasing fractions.
    ///
    /// # Errors
    ///
    /// Returns [`LodError`] when the table is too long, contains a non-finite
    /// or negative entry, or increases anywhere.
    pub fn new(thresholds: &[f32]) -> Result<Self, LodError> {
        if thresholds.len() > MAX_LODS {
            return Err(LodError::TooManyLevels(thresholds.len()));
        }

        let mut sizes = [0.0; MAX_LODS + 1];
        for (index, &value) in thresholds.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(LodError::InvalidThreshold { index, value });
            }
            if index > 0 && value > sizes[index - 1] {
                return Err(LodError::Increasing {
                    index,
                    value,
                    previous: sizes[index - 1],
                });
            }
            sizes[index] = value;
        }

        Ok(Self { sizes })
    }

    /// Upper screen-size bound of `lod_index`. Returns 0.0 past the table.
    pub fn screen_size(&self, lod_index: usize) -> f32 {
        self.sizes.get(lod_index).copied().unwrap_or(0.0)
    }

    /// The `[min, max)` band in which `lod_index` is displayed.
    pub fn band(&self, lod_index: usize) -> ScreenSizeBand {
        ScreenSizeBand {
            min: self.screen_size(lod_index + 1),
            max: self.screen_size(lod_index),
        }
    }
}

/// Screen-size range in which a LOD is displayed: `min` inclusive, `max` exclusive.
///
/// Carried on each batch for the renderer's cross-fade and dithering decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenSizeBand {
    /// Lower bound (threshold of the next coarser LOD).
    pub min: f32,
    /// Upper bound (threshold of this LOD).
    pub max: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_table_is_zero_padded() {
        let t = ScreenSizeThresholds::new(&[0.8, 0.4, 0.1]).unwrap();
        assert_eq!(t.screen_size(0), 0.8);
        assert_eq!(t.screen_size(2), 0.1);
        for i in 3..=MAX_LODS {
            assert_eq!(t.screen_size(i), 0.0, "slot {i} should be padded");
        }
    }

    #[test]
    fn test_screen_size_past_table_is_zero() {
        let t = ScreenSizeThresholds::default();
        assert_eq!(t.screen_size(MAX_LODS + 5), 0.0);
    }

    #[test]
    fn test_band_spans_next_threshold_to_own() {
        let t = ScreenSizeThresholds::new(&[0.8, 0.4, 0.1]).unwrap();
        assert_eq!(t.band(0), ScreenSizeBand { min: 0.4, max: 0.8 });
        assert_eq!(t.band(1), ScreenSizeBand { min: 0.1, max: 0.4 });
        assert_eq!(t.band(2), ScreenSizeBand { min: 0.0, max: 0.1 });
    }

    #[test]
    fn test_equal_neighbours_are_accepted() {
        assert!(ScreenSizeThresholds::new(&[0.5, 0.5, 0.2]).is_ok());
    }

    #[test]
    fn test_increasing_table_is_rejected() {
        let err = ScreenSizeThresholds::new(&[0.4, 0.8]).unwrap_err();
        assert_eq!(
            err,
            LodError::Increasing {
                index: 1,
                value: 0.8,
                previous: 0.4
            }
        );
    }

    #[test]
    fn test_too_many_levels_is_rejected() {
        let err = ScreenSizeThresholds::new(&[1.0; MAX_LODS + 1]).unwrap_err();
        assert_eq!(err, LodError::TooManyLevels(MAX_LODS + 1));
    }

    #[test]
    fn test_nan_and_negative_are_rejected() {
        assert!(matches!(
            ScreenSizeThresholds::new(&[f32::NAN]),
            Err(LodError::InvalidThreshold { index: 0, .. })
        ));
        assert!(matches!(
            ScreenSizeThresholds::new(&[1.0, -0.1]),
            Err(LodError::InvalidThreshold { index: 1, .. })
        ));
    }
}
