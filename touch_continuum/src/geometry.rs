//! Coordinate mapping: raw touch coordinates → bounded keyboard space and
//! key addresses.
//!
//! The keyboard is a horizontal strip of equal-width keys that may be wider
//! than the touch surface and scrolled left or right.  All queries clamp
//! instead of rejecting: a touch can never reference a key that is not on
//! screen.

// ════════════════════════════════════════════════════════════════════════════
// KeyAddress
// ════════════════════════════════════════════════════════════════════════════

/// The key a coordinate falls into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyAddress {
    /// 0 = leftmost key of the keyboard.
    pub key_index:  usize,
    /// Left edge of the key, relative to the keyboard's left edge.
    pub key_origin: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// KeyboardGeometry
// ════════════════════════════════════════════════════════════════════════════

/// Position and size of the keyboard on the touch surface.
///
/// Y grows upward: `bottom` is the lower edge, `bottom + height` the upper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyboardGeometry {
    /// X of the keyboard's left edge on the surface; negative when scrolled
    /// left past the surface origin.
    pub left:          f32,
    pub bottom:        f32,
    pub width:         f32,
    pub height:        f32,
    pub key_width:     f32,
    /// Visible width of the touch surface.
    pub surface_width: f32,
}

impl KeyboardGeometry {
    pub fn top(&self) -> f32 { self.bottom + self.height }

    pub fn right(&self) -> f32 { self.left + self.width }

    /// Number of whole keys on the keyboard.
    pub fn key_count(&self) -> usize {
        (self.width / self.key_width).floor().max(0.0) as usize
    }

    /// Clamp a raw horizontal coordinate to the visible, playable part of
    /// the keyboard.
    ///
    /// * left edge scrolled right of the origin → `[left, surface_width]`
    /// * right edge scrolled left of the surface edge → `[0, left + width]`
    /// * otherwise the keyboard covers the surface and `x` passes through
    ///
    /// The result always lies within `[0, surface_width]`.
    pub fn bound_x(&self, x: f32) -> f32 {
        let bounded = if self.left > 0.0 {
            x.clamp(self.left, self.surface_width.max(self.left))
        } else if self.left < self.surface_width - self.width {
            x.clamp(0.0, self.right().max(0.0))
        } else {
            x
        };
        bounded.clamp(0.0, self.surface_width)
    }

    /// Clamp a raw vertical coordinate to `[bottom, top]`.
    pub fn bound_y(&self, y: f32) -> f32 {
        y.clamp(self.bottom, self.top())
    }

    /// Fraction of the keyboard height below `y` (0.0 bottom, 1.0 top).
    pub fn y_fraction(&self, y: f32) -> f32 {
        (self.bound_y(y) - self.bottom) / self.height
    }

    /// The key under the raw horizontal coordinate `x`.
    ///
    /// The index is clamped to the last key so the right edge itself
    /// (`x == left + width`) still addresses a real key.
    pub fn key_of(&self, x: f32) -> KeyAddress {
        let relative = self.bound_x(x) - self.left;
        let mut key_index = (relative / self.key_width).floor().max(0.0) as usize;
        if let Some(last) = self.key_count().checked_sub(1) {
            key_index = key_index.min(last);
        }
        KeyAddress {
            key_index,
            key_origin: key_index as f32 * self.key_width,
        }
    }

    /// Centre of the key under `x`, relative to the keyboard.
    pub fn key_center_of(&self, x: f32) -> f32 {
        self.key_of(x).key_origin + self.key_width / 2.0
    }

    /// Absolute surface x of a keyboard-relative position.
    pub fn to_surface_x(&self, relative: f32) -> f32 {
        relative + self.left
    }

    /// True when `(x, y)` lies on the keyboard as currently scrolled.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right()
            && y >= self.bottom && y <= self.top()
            && x >= 0.0 && x <= self.surface_width
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 60 keys of 50 px, at the surface origin, on a 1280 px surface.
    fn home() -> KeyboardGeometry {
        KeyboardGeometry {
            left:          0.0,
            bottom:        100.0,
            width:         3000.0,
            height:        400.0,
            key_width:     50.0,
            surface_width: 1280.0,
        }
    }

    #[test]
    fn press_at_120_hits_key_2() {
        let k = home().key_of(120.0);
        assert_eq!(k.key_index, 2);
        assert_eq!(k.key_origin, 100.0);
        assert_eq!(home().key_center_of(120.0), 125.0);
    }

    #[test]
    fn key_boundaries_belong_to_the_right_key() {
        assert_eq!(home().key_of(49.999).key_index, 0);
        assert_eq!(home().key_of(50.0).key_index, 1);
    }

    #[test]
    fn bound_x_left_edge_visible() {
        // keyboard scrolled right: nothing left of its edge is playable
        let g = KeyboardGeometry { left: 200.0, ..home() };
        assert_eq!(g.bound_x(10.0), 200.0);
        assert_eq!(g.bound_x(5000.0), 1280.0);
        assert_eq!(g.key_of(10.0).key_index, 0);
    }

    #[test]
    fn bound_x_right_edge_visible() {
        // keyboard scrolled so its right end sits at x = 1000
        let g = KeyboardGeometry { left: -2000.0, ..home() };
        assert_eq!(g.bound_x(1100.0), 1000.0);
        assert_eq!(g.bound_x(-5.0), 0.0);
        assert_eq!(g.key_of(1100.0).key_index, 59);
    }

    #[test]
    fn bound_x_passes_through_when_keyboard_covers_surface() {
        let g = KeyboardGeometry { left: -540.0, ..home() };
        assert_eq!(g.bound_x(640.5), 640.5);
        // (640.5 + 540) / 50 = 23.61
        assert_eq!(g.key_of(640.5).key_index, 23);
    }

    #[test]
    fn bound_y_clamps_to_keyboard() {
        let g = home();
        assert_eq!(g.bound_y(0.0), 100.0);
        assert_eq!(g.bound_y(1000.0), 500.0);
        assert_eq!(g.bound_y(300.0), 300.0);
        assert_eq!(g.y_fraction(300.0), 0.5);
    }

    #[test]
    fn contains_respects_scroll() {
        let g = KeyboardGeometry { left: 200.0, ..home() };
        assert!(!g.contains(100.0, 300.0));
        assert!(g.contains(250.0, 300.0));
        assert!(!g.contains(250.0, 50.0));
    }

    #[test]
    fn key_count_is_whole_keys() {
        assert_eq!(home().key_count(), 60);
        let g = KeyboardGeometry { width: 3020.0, ..home() };
        assert_eq!(g.key_count(), 60);
    }

    proptest! {
        #[test]
        fn bound_x_stays_on_surface(left in -4000.0f32..1280.0, x in -10_000.0f32..10_000.0) {
            let g = KeyboardGeometry { left, ..home() };
            let b = g.bound_x(x);
            prop_assert!((0.0..=g.surface_width).contains(&b));
        }

        #[test]
        fn key_of_is_a_real_key(left in -1720.0f32..0.0, x in 0.0f32..1280.0) {
            let g = KeyboardGeometry { left, ..home() };
            let k = g.key_of(x);
            prop_assert!(k.key_index < g.key_count());
            prop_assert_eq!(k.key_origin, k.key_index as f32 * g.key_width);
        }
    }
}
