//! Field-of-view driven pyramid level selection.

use skycube_cube::LevelRange;

/// Reference field of view (degrees) at which level 1 starts.
const BASE_FOV: f64 = 90.0;

/// Map a vertical field of view in degrees to a pyramid level.
///
/// `floor(1 − log2(fov / 90))` clamped to `range`. Wider views give coarser
/// levels. A non-positive field of view maps to the finest level, NaN to the
/// coarsest.
pub fn fov_to_level(fov: f32, range: LevelRange) -> u8 {
    if fov.is_nan() {
        return range.min();
    }
    if fov <= 0.0 {
        return range.max();
    }
    let raw = (1.0 - (fov as f64 / BASE_FOV).log2()).floor();
    // f64 → i64 saturates, so infinities land on the range bounds.
    range.clamp(raw as i64)
}

/// Field of view (degrees) associated with `level`: `90 / 2^level`.
///
/// Only approximately inverse to [`fov_to_level`] because of the floor and clamp.
pub fn level_to_fov(level: u8) -> f32 {
    (BASE_FOV / 2f64.powi(level as i32)) as f32
}

/// Holds the currently selected level and reacts to field of view changes.
#[derive(Clone, Debug)]
pub struct LevelSelector {
    range: LevelRange,
    level: u8,
}

impl LevelSelector {
    /// Start at the coarsest level of `range`.
    pub fn new(range: LevelRange) -> Self {
        Self {
            range,
            level: range.min(),
        }
    }

    /// Currently selected level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Bounds of the pyramid.
    pub fn range(&self) -> LevelRange {
        self.range
    }

    /// Level the given field of view maps to within this selector's range.
    pub fn fov_to_level(&self, fov: f32) -> u8 {
        fov_to_level(fov, self.range)
    }

    /// Select `level`, clamping it into range. Returns the level actually selected.
    pub fn select_level(&mut self, level: i64) -> u8 {
        let clamped = self.range.clamp(level);
        if clamped as i64 != level {
            log::debug!(
                "Level {level} outside {}..={}, clamped to {clamped}",
                self.range.min(),
                self.range.max()
            );
        }
        if clamped != self.level {
            log::debug!("Select new level: {clamped}");
            self.level = clamped;
        }
        clamped
    }

    /// React to a field of view change. Returns the new level if it changed.
    ///
    /// Only the selection is updated; cached tiles of other levels stay.
    pub fn on_fov_changed(&mut self, fov: f32) -> Option<u8> {
        let level = self.fov_to_level(fov);
        if level == self.level {
            return None;
        }
        Some(self.select_level(level as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> LevelRange {
        LevelRange::default()
    }

    #[test]
    fn test_reference_fovs() {
        assert_eq!(fov_to_level(90.0, range()), 1);
        assert_eq!(fov_to_level(45.0, range()), 2);
        assert_eq!(fov_to_level(180.0, range()), 0);
        assert_eq!(fov_to_level(0.1, range()), 10);
    }

    #[test]
    fn test_extreme_fovs_clamp() {
        assert_eq!(fov_to_level(360.0, range()), 0);
        assert_eq!(fov_to_level(f32::INFINITY, range()), 0);
        assert_eq!(fov_to_level(0.0, range()), 10);
        assert_eq!(fov_to_level(-5.0, range()), 10);
        assert_eq!(fov_to_level(f32::NAN, range()), 0);
        assert_eq!(fov_to_level(1e-30, range()), 10);
    }

    #[test]
    fn test_custom_range_clamps() {
        let narrow = LevelRange::new(2, 4).unwrap();
        assert_eq!(fov_to_level(90.0, narrow), 2);
        assert_eq!(fov_to_level(0.1, narrow), 4);
    }

    #[test]
    fn test_monotonic_non_increasing() {
        let mut prev = u8::MAX;
        let mut fov = 0.05f32;
        while fov < 400.0 {
            let level = fov_to_level(fov, range());
            assert!(level <= prev, "fov {fov} gave level {level} after {prev}");
            prev = level;
            fov *= 1.07;
        }
    }

    #[test]
    fn test_level_to_fov() {
        assert_eq!(level_to_fov(0), 90.0);
        assert_eq!(level_to_fov(1), 45.0);
        assert_eq!(level_to_fov(3), 11.25);
        // a level's own threshold fov maps one level finer because of the leading 1
        for level in 0..10 {
            assert_eq!(fov_to_level(level_to_fov(level), range()), level + 1);
        }
    }

    #[test]
    fn test_select_level_clamps_silently() {
        let mut selector = LevelSelector::new(range());
        assert_eq!(selector.select_level(42), 10);
        assert_eq!(selector.level(), 10);
        assert_eq!(selector.select_level(-1), 0);
        assert_eq!(selector.level(), 0);
    }

    #[test]
    fn test_on_fov_changed_reports_only_changes() {
        let mut selector = LevelSelector::new(range());
        assert_eq!(selector.on_fov_changed(90.0), Some(1));
        assert_eq!(selector.on_fov_changed(80.0), None);
        assert_eq!(selector.on_fov_changed(40.0), Some(2));
        assert_eq!(selector.level(), 2);
    }
}
