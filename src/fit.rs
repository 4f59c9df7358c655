//! Fit-to-width font sizing
//!
//! A line is never wrapped or truncated. Instead its font size is stepped down
//! from an initial size until the measured width fits, stopping at a floor.

use crate::metrics::TextMeasure;

/// Initial size of a field line in points
pub const BASE_FONT_SIZE: f32 = 23.0;
/// Smallest size a line is shrunk to in points
pub const MIN_FONT_SIZE: f32 = 14.0;
/// Decrement applied per fitting iteration in points
pub const FONT_SIZE_STEP: f32 = 1.0;

/// Bounds for shrinking a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub initial: f32,
    pub floor: f32,
    pub step: f32,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            initial: BASE_FONT_SIZE,
            floor: MIN_FONT_SIZE,
            step: FONT_SIZE_STEP,
        }
    }
}

/// Largest size in `range` at which `text` fits within `max_width_pt`
///
/// Returns `range.initial` when the text already fits. When even the floor
/// overflows, the floor is returned and the line is allowed to overflow.
/// A floor above the initial size is treated as the initial size, and a
/// non-positive step drops straight to the floor.
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    text: &str,
    max_width_pt: f32,
    range: SizeRange,
    bold: bool,
    measure: &M,
) -> f32 {
    let floor = range.floor.min(range.initial);
    let mut size = range.initial;

    let step = if range.step.is_finite() && range.step > 0.0 {
        range.step
    } else {
        size - floor
    };

    while size > floor && measure.text_width(text, size, bold) > max_width_pt {
        size = (size - step).max(floor);
    }

    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BuiltinMetrics;

    /// Every character is exactly one point wide per point of size
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, size_pt: f32, _bold: bool) -> f32 {
            text.chars().count() as f32 * size_pt
        }
    }

    #[test]
    fn test_short_text_keeps_initial_size() {
        let size = fit_font_size("Acme Corp", 468.0, SizeRange::default(), true, &BuiltinMetrics);
        assert_eq!(size, BASE_FONT_SIZE);
    }

    #[test]
    fn test_shrinks_until_it_fits() {
        // 10 chars at 20pt = 200 wide, must get down to 15pt
        let range = SizeRange { initial: 20.0, floor: 5.0, step: 1.0 };
        let size = fit_font_size("0123456789", 150.0, range, false, &Monospace);
        assert_eq!(size, 15.0);
    }

    #[test]
    fn test_stops_at_floor() {
        let range = SizeRange { initial: 20.0, floor: 12.0, step: 1.0 };
        let size = fit_font_size("0123456789", 10.0, range, false, &Monospace);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn test_step_that_overshoots_lands_on_floor() {
        let range = SizeRange { initial: 20.0, floor: 12.0, step: 5.0 };
        let size = fit_font_size("0123456789", 10.0, range, false, &Monospace);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn test_zero_step_jumps_to_floor() {
        let range = SizeRange { initial: 20.0, floor: 12.0, step: 0.0 };
        let size = fit_font_size("0123456789", 10.0, range, false, &Monospace);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn test_floor_above_initial_is_clamped() {
        let range = SizeRange { initial: 10.0, floor: 30.0, step: 1.0 };
        let size = fit_font_size("0123456789", 1.0, range, false, &Monospace);
        assert_eq!(size, 10.0);
    }

    #[test]
    fn test_overflowing_text_is_strictly_smaller_and_bounded() {
        let text = "J".repeat(80);
        let size = fit_font_size(&text, 468.0, SizeRange::default(), true, &BuiltinMetrics);
        assert!(size < BASE_FONT_SIZE);
        assert!(size >= MIN_FONT_SIZE);
    }

    #[test]
    fn test_result_is_largest_fitting_step() {
        let text = "SL. NO. : LL/25-26/123456-OP999999/BYP";
        let range = SizeRange::default();
        let size = fit_font_size(text, 400.0, range, true, &BuiltinMetrics);
        assert!(BuiltinMetrics.text_width(text, size, true) <= 400.0 || size == range.floor);
        if size < range.initial {
            assert!(BuiltinMetrics.text_width(text, size + range.step, true) > 400.0);
        }
    }
}
