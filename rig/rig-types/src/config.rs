//! Configuration types for rig physics.
//!
//! [`PhysicsConfig`] holds the engine-wide defaults a rig is built with.
//! Values carried by a rig definition (fixed rate, gravity, wind) take
//! precedence over the defaults here.

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, RigError};

/// Which clock a host should feed into the rig each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeltaTimeSource {
    /// Use the render frame's (variable) delta time.
    #[default]
    Frame,
    /// Use an externally supplied fixed clock delta.
    Fixed,
}

impl DeltaTimeSource {
    /// Pick the delta this source selects.
    #[must_use]
    pub const fn select(self, frame_delta: f32, fixed_delta: f32) -> f32 {
        match self {
            Self::Frame => frame_delta,
            Self::Fixed => fixed_delta,
        }
    }
}

/// Highest accepted simulation rate (Hz).
///
/// Keeps a sub-step large enough to register against an accumulator of up to
/// `max_delta_time` seconds in `f32`.
pub const MAX_FIXED_RATE: f32 = 1000.0;

/// Engine-wide physics configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicsConfig {
    /// Gravity; its direction is the physics "down".
    pub gravity: Vector2<f32>,
    /// Constant wind force added to every simulated particle.
    pub wind: Vector2<f32>,
    /// Divisor applied to the gravity rotation carried into a chain each step.
    pub air_resistance: f32,
    /// Weight that means "fully replace" (bindings use a 0..100 scale).
    pub maximum_weight: f32,
    /// Fraction of the position normalization maximum below which X jitter is snapped to 0.
    pub movement_threshold: f32,
    /// Accumulated time above which pending simulation time is discarded (seconds).
    pub max_delta_time: f32,
    /// Simulation frequency in Hz; 0 means step with the caller's delta.
    pub fixed_rate: f32,
    /// Clock selection for [`DeltaTimeSource::select`].
    pub delta_time_source: DeltaTimeSource,
    /// Measure the output angle of a chain's first segment against gravity.
    /// Deeper segments are always measured against their parent segment.
    pub use_angle_correction: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -1.0),
            wind: Vector2::zeros(),
            air_resistance: 5.0,
            maximum_weight: 100.0,
            movement_threshold: 0.001,
            max_delta_time: 5.0,
            fixed_rate: 0.0,
            delta_time_source: DeltaTimeSource::Frame,
            use_angle_correction: true,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration simulating at a fixed rate (Hz).
    #[must_use]
    pub fn with_fixed_rate(fixed_rate: f32) -> Self {
        Self {
            fixed_rate,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Vector2<f32>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the wind.
    #[must_use]
    pub fn wind(mut self, wind: Vector2<f32>) -> Self {
        self.wind = wind;
        self
    }

    /// Set the air resistance.
    #[must_use]
    pub fn air_resistance(mut self, air_resistance: f32) -> Self {
        self.air_resistance = air_resistance;
        self
    }

    /// Set the fixed simulation rate (Hz).
    #[must_use]
    pub fn fixed_rate(mut self, fixed_rate: f32) -> Self {
        self.fixed_rate = fixed_rate;
        self
    }

    /// Set the clock the host should feed in.
    #[must_use]
    pub fn delta_time_source(mut self, source: DeltaTimeSource) -> Self {
        self.delta_time_source = source;
        self
    }

    /// Enable or disable angle correction.
    #[must_use]
    pub fn angle_correction(mut self, enabled: bool) -> Self {
        self.use_angle_correction = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.iter().chain(self.wind.iter()).all(|c| c.is_finite()) {
            return Err(RigError::invalid_config("gravity and wind must be finite"));
        }

        if !self.air_resistance.is_finite() || self.air_resistance <= 0.0 {
            return Err(RigError::invalid_config(format!(
                "air resistance must be positive, got {}",
                self.air_resistance
            )));
        }

        if !self.maximum_weight.is_finite() || self.maximum_weight <= 0.0 {
            return Err(RigError::invalid_config(format!(
                "maximum weight must be positive, got {}",
                self.maximum_weight
            )));
        }

        if !self.movement_threshold.is_finite() || self.movement_threshold < 0.0 {
            return Err(RigError::invalid_config(
                "movement threshold must be non-negative",
            ));
        }

        if !self.max_delta_time.is_finite() || self.max_delta_time <= 0.0 {
            return Err(RigError::invalid_config("max delta time must be positive"));
        }

        Self::validate_fixed_rate(self.fixed_rate)
    }

    /// Check a simulation rate: 0 (caller's delta) up to [`MAX_FIXED_RATE`].
    pub fn validate_fixed_rate(fixed_rate: f32) -> Result<()> {
        if !fixed_rate.is_finite() || !(0.0..=MAX_FIXED_RATE).contains(&fixed_rate) {
            return Err(RigError::invalid_config(format!(
                "fixed rate must be in [0, {MAX_FIXED_RATE}] Hz, got {fixed_rate}"
            )));
        }
        Ok(())
    }

    /// Duration of one sub-step, or `None` when stepping with the caller's delta.
    #[must_use]
    pub fn fixed_timestep(&self) -> Option<f32> {
        (self.fixed_rate > 0.0).then(|| 1.0 / self.fixed_rate)
    }
}
