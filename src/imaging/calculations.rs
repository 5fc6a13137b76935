//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Bound `(width, height)` so neither side exceeds `max_dimension`.
///
/// Images already within the bound are returned unchanged. Larger images are
/// scaled uniformly so the longer edge equals `max_dimension`; the shorter
/// edge is rounded and never drops below 1.
///
/// # Examples
/// ```
/// # use avatar_studio::imaging::fit_within;
/// // 1600x1200 landscape → 800x600
/// assert_eq!(fit_within((1600, 1200), 800), (800, 600));
///
/// // Small images are untouched
/// assert_eq!(fit_within((50, 50), 800), (50, 50));
/// ```
pub fn fit_within(original: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if longer_edge <= max_dimension {
        return original;
    }

    let ratio = max_dimension as f64 / longer_edge as f64;
    if orig_w >= orig_h {
        // Landscape or square
        let h = (orig_h as f64 * ratio).round().max(1.0) as u32;
        (max_dimension, h)
    } else {
        // Portrait
        let w = (orig_w as f64 * ratio).round().max(1.0) as u32;
        (w, max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_bound_unchanged() {
        assert_eq!(fit_within((800, 800), 800), (800, 800));
        assert_eq!(fit_within((50, 50), 800), (50, 50));
        assert_eq!(fit_within((799, 200), 800), (799, 200));
    }

    #[test]
    fn landscape_scales_width_to_max() {
        // 2000x1500 → 800x600
        assert_eq!(fit_within((2000, 1500), 800), (800, 600));
    }

    #[test]
    fn portrait_scales_height_to_max() {
        // 1500x2000 → 600x800
        assert_eq!(fit_within((1500, 2000), 800), (600, 800));
    }

    #[test]
    fn square_scales_both() {
        assert_eq!(fit_within((1024, 1024), 800), (800, 800));
    }

    #[test]
    fn extreme_aspect_never_zero() {
        // 10000x3 → 800x0.24, clamped to 1
        assert_eq!(fit_within((10000, 3), 800), (800, 1));
        assert_eq!(fit_within((3, 10000), 800), (1, 800));
    }

    #[test]
    fn aspect_ratio_preserved_within_rounding() {
        for &(w, h) in &[(1920u32, 1080u32), (3000, 2000), (1234, 4321), (801, 799)] {
            let (ow, oh) = fit_within((w, h), 800);
            assert!(ow <= 800 && oh <= 800, "{w}x{h} → {ow}x{oh}");
            assert_eq!(ow.max(oh), 800);
            // Short side is within half a pixel of the exact value
            let exact_short = w.min(h) as f64 * 800.0 / w.max(h) as f64;
            let short = ow.min(oh) as f64;
            assert!((short - exact_short).abs() <= 0.5 + 1e-9, "{w}x{h} → {ow}x{oh}");
        }
    }
}
