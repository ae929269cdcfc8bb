// SPDX-License-Identifier: MPL-2.0
//! Dehazing newtypes.
//!
//! Type-safe wrappers for the Dark Channel Prior parameters, ensuring they
//! are always within valid ranges.

// =============================================================================
// WindowSize
// =============================================================================

/// Window size bounds (side length of the square erosion element).
pub mod window_bounds {
    /// Smallest window (no erosion beyond the per-pixel channel minimum).
    pub const MIN: usize = 1;
    /// Largest supported window.
    pub const MAX: usize = 255;
    /// Default window size.
    pub const DEFAULT: usize = 15;
}

/// Side length of the square structuring element used by the dark channel.
///
/// Always odd so the window is centered on the pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    /// Creates a new window size, clamping to valid range and rounding even
    /// values up to the next odd value.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let clamped = size.clamp(window_bounds::MIN, window_bounds::MAX);
        if clamped % 2 == 0 {
            Self(clamped + 1)
        } else {
            Self(clamped)
        }
    }

    /// Returns the side length.
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }

    /// Returns the number of pixels on each side of the center.
    #[must_use]
    pub fn radius(self) -> usize {
        self.0 / 2
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self(window_bounds::DEFAULT)
    }
}

// =============================================================================
// HazeCoefficient
// =============================================================================

/// Haze coefficient bounds.
pub mod omega_bounds {
    /// No haze removed.
    pub const MIN: f32 = 0.0;
    /// All haze removed.
    pub const MAX: f32 = 1.0;
    /// Default coefficient (keeps 5% of the haze for depth perception).
    pub const DEFAULT: f32 = 0.95;
}

/// The ω factor in `t = 1 − ω · dark(I / A)`, guaranteed within 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazeCoefficient(f32);

impl HazeCoefficient {
    /// Creates a new coefficient, clamping to valid range.
    /// Non-finite input falls back to the default.
    #[must_use]
    pub fn new(omega: f32) -> Self {
        if omega.is_finite() {
            Self(omega.clamp(omega_bounds::MIN, omega_bounds::MAX))
        } else {
            Self::default()
        }
    }

    /// Returns the coefficient as f32.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for HazeCoefficient {
    fn default() -> Self {
        Self(omega_bounds::DEFAULT)
    }
}

// =============================================================================
// BrightestFraction
// =============================================================================

/// Brightest-pixel fraction bounds.
pub mod fraction_bounds {
    /// Smallest fraction (the one-pixel minimum still applies).
    pub const MIN: f32 = 1e-6;
    /// Every pixel.
    pub const MAX: f32 = 1.0;
    /// Default fraction (top 0.1%).
    pub const DEFAULT: f32 = 0.001;
}

/// Share of pixels, ranked by dark-channel value, averaged into the
/// atmospheric light estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightestFraction(f32);

impl BrightestFraction {
    /// Creates a new fraction, clamping to valid range.
    /// Non-finite input falls back to the default.
    #[must_use]
    pub fn new(fraction: f32) -> Self {
        if fraction.is_finite() {
            Self(fraction.clamp(fraction_bounds::MIN, fraction_bounds::MAX))
        } else {
            Self::default()
        }
    }

    /// Returns the fraction as f32.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Number of pixels to select from `total`, truncated, never below 1.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn pixel_count(self, total: usize) -> usize {
        let count = (total as f64 * f64::from(self.0)).max(1.0) as usize;
        count.min(total.max(1))
    }
}

impl Default for BrightestFraction {
    fn default() -> Self {
        Self(fraction_bounds::DEFAULT)
    }
}

// =============================================================================
// AtmosphericEpsilon
// =============================================================================

/// Atmospheric light floor bounds.
pub mod epsilon_bounds {
    /// Smallest floor.
    pub const MIN: f32 = 1e-12;
    /// Largest floor.
    pub const MAX: f32 = 1.0;
    /// Default floor.
    pub const DEFAULT: f32 = 1e-6;
}

/// Lower bound applied to each atmospheric light component before it is
/// used as a divisor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphericEpsilon(f32);

impl AtmosphericEpsilon {
    /// Creates a new floor, clamping to valid range.
    /// Non-finite input falls back to the default.
    #[must_use]
    pub fn new(epsilon: f32) -> Self {
        if epsilon.is_finite() {
            Self(epsilon.clamp(epsilon_bounds::MIN, epsilon_bounds::MAX))
        } else {
            Self::default()
        }
    }

    /// Returns the floor as f32.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Raises `component` to the floor. NaN maps to the floor as well.
    #[must_use]
    pub fn apply(self, component: f32) -> f32 {
        if component >= self.0 {
            component
        } else {
            self.0
        }
    }
}

impl Default for AtmosphericEpsilon {
    fn default() -> Self {
        Self(epsilon_bounds::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_rounds_even_up() {
        assert_eq!(WindowSize::new(14).value(), 15);
        assert_eq!(WindowSize::new(15).value(), 15);
        assert_eq!(WindowSize::new(0).value(), 1);
        assert_eq!(WindowSize::new(10_000).value(), window_bounds::MAX);
        assert_eq!(WindowSize::default().radius(), 7);
    }

    #[test]
    fn haze_coefficient_clamps() {
        assert!((HazeCoefficient::new(1.5).value() - 1.0).abs() < f32::EPSILON);
        assert!(HazeCoefficient::new(-0.2).value().abs() < f32::EPSILON);
        assert_eq!(HazeCoefficient::new(f32::NAN), HazeCoefficient::default());
    }

    #[test]
    fn brightest_fraction_selects_at_least_one_pixel() {
        let fraction = BrightestFraction::default();
        assert_eq!(fraction.pixel_count(100), 1);
        assert_eq!(fraction.pixel_count(512 * 512), 262);
        assert_eq!(BrightestFraction::new(1.0).pixel_count(7), 7);
    }

    #[test]
    fn epsilon_apply_raises_small_and_nan() {
        let eps = AtmosphericEpsilon::default();
        assert!((eps.apply(0.0) - epsilon_bounds::DEFAULT).abs() < f32::EPSILON);
        assert!((eps.apply(f32::NAN) - epsilon_bounds::DEFAULT).abs() < f32::EPSILON);
        assert!((eps.apply(0.5) - 0.5).abs() < f32::EPSILON);
    }
}
