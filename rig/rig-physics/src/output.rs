//! Output bindings: particle offsets written back into external parameters.

use nalgebra::Vector2;
use rig_types::math::angle_between;
use rig_types::{OutputDefinition, ParameterHandle, Particle, SourceComponent};

/// Writes one particle's offset from its parent into an external parameter.
///
/// Values are computed raw (unscaled) so snapshots can be interpolated; scale,
/// clamping and weight blending happen in [`OutputBinding::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBinding {
    destination: ParameterHandle,
    particle_index: usize,
    translation_scale: Vector2<f32>,
    angle_scale: f32,
    weight: f32,
    component: SourceComponent,
    is_inverted: bool,
    value_below_minimum: Option<f32>,
    value_exceeded_maximum: Option<f32>,
}

impl OutputBinding {
    /// Create a binding from its definition. The destination resolves on first use.
    #[must_use]
    pub fn from_definition(definition: &OutputDefinition) -> Self {
        Self {
            destination: ParameterHandle::new(definition.destination.as_str()),
            particle_index: definition.particle_index,
            translation_scale: definition.translation_scale,
            angle_scale: definition.angle_scale,
            weight: definition.weight,
            component: definition.component,
            is_inverted: definition.is_inverted,
            value_below_minimum: None,
            value_exceeded_maximum: None,
        }
    }

    /// Destination parameter handle.
    #[must_use]
    pub const fn destination(&self) -> &ParameterHandle {
        &self.destination
    }

    pub(crate) fn destination_mut(&mut self) -> &mut ParameterHandle {
        &mut self.destination
    }

    /// Index of the particle read.
    #[must_use]
    pub const fn particle_index(&self) -> usize {
        self.particle_index
    }

    /// Component written.
    #[must_use]
    pub const fn component(&self) -> SourceComponent {
        self.component
    }

    /// Weight on the 0..100 scale.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    /// Lowest pre-clamp value seen below the destination minimum, if any.
    #[must_use]
    pub const fn value_below_minimum(&self) -> Option<f32> {
        self.value_below_minimum
    }

    /// Highest pre-clamp value seen above the destination maximum, if any.
    #[must_use]
    pub const fn value_exceeded_maximum(&self) -> Option<f32> {
        self.value_exceeded_maximum
    }

    /// Clear the overflow diagnostics.
    pub fn reset_diagnostics(&mut self) {
        self.value_below_minimum = None;
        self.value_exceeded_maximum = None;
    }

    /// Scale matching this binding's component.
    #[must_use]
    pub fn scale(&self) -> f32 {
        match self.component {
            SourceComponent::TranslationX => self.translation_scale.x,
            SourceComponent::TranslationY => self.translation_scale.y,
            SourceComponent::Angle => self.angle_scale,
        }
    }

    /// Raw value of the bound particle, or `None` if it is not in `particles`.
    ///
    /// Angles are measured against the segment between the two preceding
    /// particles. The first segment has no such parent: it is measured
    /// against `gravity`, which is also what `use_angle_correction` selects
    /// for it.
    #[must_use]
    pub fn compute(
        &self,
        particles: &[Particle],
        gravity: Vector2<f32>,
        use_angle_correction: bool,
    ) -> Option<f32> {
        let index = self.particle_index;
        if index < 1 || index >= particles.len() {
            return None;
        }

        let translation = particles[index].offset_from(&particles[index - 1]);
        let value = match self.component {
            SourceComponent::TranslationX => translation.x,
            SourceComponent::TranslationY => translation.y,
            SourceComponent::Angle => {
                let parent = if use_angle_correction && index < 2 {
                    gravity
                } else if index >= 2 {
                    particles[index - 1].offset_from(&particles[index - 2])
                } else {
                    gravity
                };
                angle_between(parent, translation)
            }
        };

        Some(if self.is_inverted { -value } else { value })
    }

    /// Scale, clamp and blend `raw` into the destination's `current` value.
    ///
    /// Values outside `range` are clamped; the overflow is kept in the
    /// diagnostic fields. Returns the new destination value.
    pub fn apply(&mut self, current: f32, raw: f32, range: (f32, f32), maximum_weight: f32) -> f32 {
        let minimum = range.0.min(range.1);
        let maximum = range.0.max(range.1);

        let mut value = raw * self.scale();
        if value < minimum {
            self.value_below_minimum = Some(self.value_below_minimum.map_or(value, |v| v.min(value)));
            value = minimum;
        } else if value > maximum {
            self.value_exceeded_maximum = Some(self.value_exceeded_maximum.map_or(value, |v| v.max(value)));
            value = maximum;
        }

        let weight = self.weight / maximum_weight;
        if weight >= 1.0 {
            value
        } else {
            current * (1.0 - weight) + value * weight
        }
    }
}
