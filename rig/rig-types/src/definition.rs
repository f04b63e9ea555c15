//! Static rig definitions.
//!
//! A [`RigDefinition`] is the authored, immutable description a rig is built
//! from. It is pure data: loaders deserialize it (with the `serde` feature),
//! the physics crate instantiates runtime state from it.

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::normalization::Normalization;
use crate::{Result, RigError};

/// Which component of a translation/angle a binding reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceComponent {
    /// Horizontal translation.
    #[default]
    TranslationX,
    /// Vertical translation.
    TranslationY,
    /// Angle.
    Angle,
}

impl SourceComponent {
    /// Whether this component is a translation axis.
    #[must_use]
    pub const fn is_translation(self) -> bool {
        matches!(self, Self::TranslationX | Self::TranslationY)
    }
}

/// Authored input binding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputDefinition {
    /// Id of the parameter read.
    pub source: String,
    /// Contribution weight on the 0..100 scale.
    pub weight: f32,
    /// Which accumulator the normalized value feeds.
    pub component: SourceComponent,
    /// Keep the normalized sign instead of negating it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_inverted: bool,
}

impl InputDefinition {
    /// Create a non-inverted input.
    #[must_use]
    pub fn new(source: impl Into<String>, component: SourceComponent, weight: f32) -> Self {
        Self {
            source: source.into(),
            weight,
            component,
            is_inverted: false,
        }
    }

    /// Mark the input as inverted.
    #[must_use]
    pub const fn inverted(mut self) -> Self {
        self.is_inverted = true;
        self
    }
}

/// Authored output binding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputDefinition {
    /// Id of the parameter written.
    pub destination: String,
    /// Particle whose offset from its parent is read; at least 1.
    pub particle_index: usize,
    /// Scale for translation components.
    #[cfg_attr(feature = "serde", serde(default = "unit_scale"))]
    pub translation_scale: Vector2<f32>,
    /// Scale for the angle component.
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub angle_scale: f32,
    /// Blend weight on the 0..100 scale.
    pub weight: f32,
    /// Which component of the particle offset is written.
    pub component: SourceComponent,
    /// Negate the computed value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_inverted: bool,
}

#[cfg(feature = "serde")]
fn unit_scale() -> Vector2<f32> {
    Vector2::new(1.0, 1.0)
}

#[cfg(feature = "serde")]
const fn one() -> f32 {
    1.0
}

impl OutputDefinition {
    /// Create a non-inverted output with unit scales.
    #[must_use]
    pub fn new(
        destination: impl Into<String>,
        particle_index: usize,
        component: SourceComponent,
        weight: f32,
    ) -> Self {
        Self {
            destination: destination.into(),
            particle_index,
            translation_scale: Vector2::new(1.0, 1.0),
            angle_scale: 1.0,
            weight,
            component,
            is_inverted: false,
        }
    }

    /// Set the translation scale.
    #[must_use]
    pub fn with_translation_scale(mut self, scale: Vector2<f32>) -> Self {
        self.translation_scale = scale;
        self
    }

    /// Set the angle scale.
    #[must_use]
    pub const fn with_angle_scale(mut self, scale: f32) -> Self {
        self.angle_scale = scale;
        self
    }

    /// Mark the output as inverted.
    #[must_use]
    pub const fn inverted(mut self) -> Self {
        self.is_inverted = true;
        self
    }
}

/// Authored rest parameters of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleDefinition {
    /// Fraction of velocity carried into the next step.
    pub mobility: f32,
    /// Lag factor at the 30 fps authoring rate.
    pub delay: f32,
    /// Gravity force multiplier.
    pub acceleration: f32,
    /// Distance to the previous particle.
    pub radius: f32,
}

impl ParticleDefinition {
    /// Create a particle definition.
    #[must_use]
    pub const fn new(mobility: f32, delay: f32, acceleration: f32, radius: f32) -> Self {
        Self {
            mobility,
            delay,
            acceleration,
            radius,
        }
    }

    /// The chain root; its geometry is ignored.
    #[must_use]
    pub const fn anchor() -> Self {
        Self::new(1.0, 1.0, 1.0, 0.0)
    }
}

/// Authored description of one sub-rig.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubRigDefinition {
    /// Lookup name (e.g. "hair-front").
    pub name: String,
    /// Input bindings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub inputs: Vec<InputDefinition>,
    /// Output bindings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub outputs: Vec<OutputDefinition>,
    /// Particle chain, root first.
    pub particles: Vec<ParticleDefinition>,
    /// Position/angle normalization.
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalization: Normalization,
    /// Simulation rate for this sub-rig alone, overriding the rig's rate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fps: Option<f32>,
}

impl SubRigDefinition {
    /// Create an empty sub-rig definition.
    #[must_use]
    pub fn new(name: impl Into<String>, normalization: Normalization) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            particles: Vec::new(),
            normalization,
            fps: None,
        }
    }

    /// Simulate this sub-rig at its own rate (Hz).
    #[must_use]
    pub const fn with_fps(mut self, fps: f32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Append an input.
    #[must_use]
    pub fn with_input(mut self, input: InputDefinition) -> Self {
        self.inputs.push(input);
        self
    }

    /// Append an output.
    #[must_use]
    pub fn with_output(mut self, output: OutputDefinition) -> Self {
        self.outputs.push(output);
        self
    }

    /// Append a particle.
    #[must_use]
    pub fn with_particle(mut self, particle: ParticleDefinition) -> Self {
        self.particles.push(particle);
        self
    }

    /// Check this sub-rig for structural errors.
    pub fn validate(&self) -> Result<()> {
        let count = self.particles.len();
        if count == 0 {
            return Err(RigError::EmptyChain(self.name.clone()));
        }

        if let Some(fps) = self.fps {
            PhysicsConfig::validate_fixed_rate(fps)
                .map_err(|e| RigError::invalid_definition(&self.name, e.to_string()))?;
        }

        for (i, particle) in self.particles.iter().enumerate().skip(1) {
            if !particle.radius.is_finite() || particle.radius <= 0.0 {
                return Err(RigError::invalid_definition(
                    &self.name,
                    format!("particle {i} radius must be positive, got {}", particle.radius),
                ));
            }
            let finite = [particle.mobility, particle.delay, particle.acceleration]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(RigError::invalid_definition(
                    &self.name,
                    format!("particle {i} has non-finite parameters"),
                ));
            }
        }

        for input in &self.inputs {
            if !input.weight.is_finite() || input.weight < 0.0 {
                return Err(RigError::invalid_definition(
                    &self.name,
                    format!("input '{}' weight {} is invalid", input.source, input.weight),
                ));
            }
        }

        for output in &self.outputs {
            if output.particle_index < 1 || output.particle_index >= count {
                return Err(RigError::InvalidParticleIndex {
                    sub_rig: self.name.clone(),
                    index: output.particle_index,
                    count,
                });
            }
            if !output.weight.is_finite() || output.weight < 0.0 {
                return Err(RigError::invalid_definition(
                    &self.name,
                    format!(
                        "output '{}' weight {} is invalid",
                        output.destination, output.weight
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Authored description of a whole rig.
///
/// # Example
///
/// ```
/// use rig_types::{
///     Normalization, OutputDefinition, ParticleDefinition, RigDefinition, SourceComponent,
///     SubRigDefinition,
/// };
///
/// let hair = SubRigDefinition::new("hair", Normalization::default())
///     .with_particle(ParticleDefinition::anchor())
///     .with_particle(ParticleDefinition::new(0.95, 0.9, 1.5, 3.0))
///     .with_output(OutputDefinition::new("ParamHair", 1, SourceComponent::Angle, 100.0));
///
/// let rig = RigDefinition::new().with_fps(60.0).with_sub_rig(hair);
/// assert!(rig.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigDefinition {
    /// Simulation rate overriding the configured fixed rate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fps: Option<f32>,
    /// Gravity overriding the configured default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub gravity: Option<Vector2<f32>>,
    /// Wind overriding the configured default.
    #[cfg_attr(feature = "serde", serde(default))]
    pub wind: Option<Vector2<f32>>,
    /// Sub-rigs in evaluation order.
    pub sub_rigs: Vec<SubRigDefinition>,
}

impl RigDefinition {
    /// Create an empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulation rate.
    #[must_use]
    pub const fn with_fps(mut self, fps: f32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set the gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector2<f32>) -> Self {
        self.gravity = Some(gravity);
        self
    }

    /// Set the wind.
    #[must_use]
    pub fn with_wind(mut self, wind: Vector2<f32>) -> Self {
        self.wind = Some(wind);
        self
    }

    /// Append a sub-rig.
    #[must_use]
    pub fn with_sub_rig(mut self, sub_rig: SubRigDefinition) -> Self {
        self.sub_rigs.push(sub_rig);
        self
    }

    /// Total number of input bindings across sub-rigs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.inputs.len()).sum()
    }

    /// Total number of output bindings across sub-rigs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.outputs.len()).sum()
    }

    /// Total number of particles across sub-rigs.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.sub_rigs.iter().map(|s| s.particles.len()).sum()
    }

    /// Check the whole definition for structural errors.
    pub fn validate(&self) -> Result<()> {
        if let Some(fps) = self.fps {
            PhysicsConfig::validate_fixed_rate(fps)?;
        }

        let finite = |v: Option<Vector2<f32>>| v.is_none_or(|v| v.iter().all(|c| c.is_finite()));
        if !finite(self.gravity) || !finite(self.wind) {
            return Err(RigError::invalid_config(
                "definition gravity and wind must be finite",
            ));
        }

        self.sub_rigs.iter().try_for_each(SubRigDefinition::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(name: &str) -> SubRigDefinition {
        SubRigDefinition::new(name, Normalization::default())
            .with_particle(ParticleDefinition::anchor())
            .with_particle(ParticleDefinition::new(0.95, 0.9, 1.5, 3.0))
            .with_particle(ParticleDefinition::new(0.95, 0.8, 1.5, 3.0))
    }

    #[test]
    fn test_valid_definition() {
        let def = RigDefinition::new().with_sub_rig(
            chain("hair")
                .with_input(InputDefinition::new("ParamAngleX", SourceComponent::TranslationX, 60.0))
                .with_output(OutputDefinition::new("ParamHair", 2, SourceComponent::Angle, 100.0)),
        );
        assert!(def.validate().is_ok());
        assert_eq!(def.input_count(), 1);
        assert_eq!(def.output_count(), 1);
        assert_eq!(def.particle_count(), 3);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let def = RigDefinition::new().with_sub_rig(SubRigDefinition::new("x", Normalization::default()));
        assert!(matches!(def.validate(), Err(RigError::EmptyChain(_))));
    }

    #[test]
    fn test_output_particle_index_rejected() {
        for index in [0, 3] {
            let def = RigDefinition::new().with_sub_rig(
                chain("hair").with_output(OutputDefinition::new("P", index, SourceComponent::Angle, 100.0)),
            );
            let err = def.validate().err();
            assert!(matches!(err, Some(RigError::InvalidParticleIndex { .. })));
        }
    }

    #[test]
    fn test_bad_radius_rejected() {
        let def = RigDefinition::new().with_sub_rig(
            chain("hair").with_particle(ParticleDefinition::new(0.9, 0.9, 1.0, 0.0)),
        );
        assert!(def.validate().is_err_and(|e| e.is_definition_error()));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let def = RigDefinition::new().with_sub_rig(
            chain("hair").with_input(InputDefinition::new("P", SourceComponent::Angle, -1.0)),
        );
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_bad_fps_rejected() {
        let def = RigDefinition::new().with_fps(-30.0);
        assert!(def.validate().is_err_and(|e| e.is_config_error()));
    }

    #[test]
    fn test_sub_rig_fps_validated() {
        let ok = RigDefinition::new().with_sub_rig(chain("hair").with_fps(30.0));
        assert!(ok.validate().is_ok());

        for fps in [-1.0, f32::NAN, 1.0e7] {
            let def = RigDefinition::new().with_sub_rig(chain("hair").with_fps(fps));
            assert!(def.validate().is_err_and(|e| e.is_definition_error()));
        }
    }

    #[test]
    fn test_component_kind() {
        assert!(SourceComponent::TranslationX.is_translation());
        assert!(SourceComponent::TranslationY.is_translation());
        assert!(!SourceComponent::Angle.is_translation());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_definition_serialization() {
        let def = RigDefinition::new()
            .with_fps(30.0)
            .with_sub_rig(chain("hair").with_fps(20.0).with_output(
                OutputDefinition::new("ParamHair", 1, SourceComponent::Angle, 100.0).inverted(),
            ));

        let json = serde_json::to_string(&def);
        assert!(json.is_ok());

        let parsed: std::result::Result<RigDefinition, _> =
            serde_json::from_str(&json.unwrap_or_default());
        assert!(parsed.is_ok_and(|p| p == def));
    }
}
