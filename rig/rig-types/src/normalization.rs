//! Mapping between authored parameter ranges and normalized physics units.
//!
//! Each sub-rig declares a position range and an angle range. An input
//! parameter's value is mapped piecewise-linearly so that the parameter's
//! midpoint lands on the range default and each extreme lands on the
//! matching range extreme.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A normalized range with a default (rest) value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalizationRange {
    /// Lower end of the normalized range.
    pub minimum: f32,
    /// Value the parameter midpoint maps to.
    pub default: f32,
    /// Upper end of the normalized range.
    pub maximum: f32,
}

impl Default for NormalizationRange {
    fn default() -> Self {
        Self {
            minimum: -10.0,
            default: 0.0,
            maximum: 10.0,
        }
    }
}

impl NormalizationRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(minimum: f32, default: f32, maximum: f32) -> Self {
        Self {
            minimum,
            default,
            maximum,
        }
    }

    /// Normalize a parameter value against this range.
    ///
    /// See [`normalize`].
    #[must_use]
    pub fn normalize(&self, value: f32, parameter_min: f32, parameter_max: f32, is_inverted: bool) -> f32 {
        normalize(
            value,
            parameter_min,
            parameter_max,
            self.minimum,
            self.maximum,
            self.default,
            is_inverted,
        )
    }
}

/// Position and angle normalization of one sub-rig.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Normalization {
    /// Range for translation inputs.
    pub position: NormalizationRange,
    /// Range for angle inputs (degrees).
    pub angle: NormalizationRange,
}

impl Normalization {
    /// Create a normalization from its two ranges.
    #[must_use]
    pub const fn new(position: NormalizationRange, angle: NormalizationRange) -> Self {
        Self { position, angle }
    }
}

/// Map a parameter value into normalized units.
///
/// The value is clamped into the parameter range, then measured from the
/// range midpoint. Positive offsets scale towards `norm_max`, negative ones
/// towards `norm_min`. A degenerate half-range yields `norm_default`.
///
/// The result is negated unless `is_inverted` is set.
#[must_use]
pub fn normalize(
    value: f32,
    parameter_min: f32,
    parameter_max: f32,
    norm_min: f32,
    norm_max: f32,
    norm_default: f32,
    is_inverted: bool,
) -> f32 {
    let max_value = parameter_max.max(parameter_min);
    let min_value = parameter_max.min(parameter_min);
    let value = value.clamp(min_value, max_value);

    let max_norm = norm_max.max(norm_min);
    let min_norm = norm_max.min(norm_min);

    let middle = min_value + (max_value - min_value) / 2.0;
    let offset = value - middle;

    let (norm_length, param_length) = if offset > 0.0 {
        (max_norm - norm_default, max_value - middle)
    } else if offset < 0.0 {
        (min_norm - norm_default, min_value - middle)
    } else {
        (0.0, 0.0)
    };

    let result = if param_length == 0.0 {
        norm_default
    } else {
        offset.mul_add(norm_length / param_length, norm_default)
    };

    if is_inverted { result } else { -result }
}
