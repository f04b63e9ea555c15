//! 2D vector helpers used by the pendulum integration.
//!
//! Every function here is total: degenerate input (zero-length vectors)
//! yields a defined value instead of `NaN`.

use std::f32::consts::{PI, TAU};

use nalgebra::{Rotation2, Vector2};

/// Vectors shorter than this are treated as zero length.
pub const DEGENERATE_LENGTH: f32 = 1e-12;

/// Reference authoring frame rate the particle delay is expressed in.
pub const REFERENCE_FRAME_RATE: f32 = 30.0;

/// Fallback "down" for a rig whose gravity is the zero vector.
#[must_use]
pub fn default_down() -> Vector2<f32> {
    Vector2::new(0.0, -1.0)
}

/// Returns the unit vector along `v`, or zero if `v` is degenerate.
#[must_use]
pub fn normalize_or_zero(v: Vector2<f32>) -> Vector2<f32> {
    v.try_normalize(DEGENERATE_LENGTH).unwrap_or_else(Vector2::zeros)
}

/// Returns the unit vector along `gravity`, falling back to [`default_down`].
#[must_use]
pub fn down_direction(gravity: Vector2<f32>) -> Vector2<f32> {
    gravity
        .try_normalize(DEGENERATE_LENGTH)
        .unwrap_or_else(default_down)
}

/// Rotates `v` counter-clockwise by `radians`.
#[must_use]
pub fn rotate(v: Vector2<f32>, radians: f32) -> Vector2<f32> {
    Rotation2::new(radians) * v
}

/// Direction a pendulum hangs when its frame is tilted by `radians`.
///
/// Angle 0 is `down` itself; positive angles rotate clockwise, so with
/// `down = (0, 1)` the result is `(sin θ, cos θ)`.
#[must_use]
pub fn direction_from_angle(down: Vector2<f32>, radians: f32) -> Vector2<f32> {
    rotate(down, -radians)
}

/// Signed angle (radians) that turns `from` onto `to`, wrapped into `[-π, π]`.
///
/// Returns 0 if either vector is degenerate.
#[must_use]
pub fn angle_between(from: Vector2<f32>, to: Vector2<f32>) -> f32 {
    if from.norm_squared() < DEGENERATE_LENGTH || to.norm_squared() < DEGENERATE_LENGTH {
        return 0.0;
    }

    let mut angle = to.y.atan2(to.x) - from.y.atan2(from.x);
    while angle < -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle
}
