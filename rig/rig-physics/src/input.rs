//! Input bindings: external parameters feeding a sub-rig's pendulum.

use nalgebra::Vector2;
use rig_types::{InputDefinition, Normalization, ParameterHandle, ParameterStore, SourceComponent};
use tracing::{debug, trace};

/// Translation and angle accumulated from a sub-rig's inputs for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputTotals {
    /// Anchor position in normalized position units.
    pub translation: Vector2<f32>,
    /// Frame tilt in normalized angle units (degrees).
    pub angle: f32,
}

impl Default for InputTotals {
    fn default() -> Self {
        Self {
            translation: Vector2::zeros(),
            angle: 0.0,
        }
    }
}

/// Reads one external parameter into a sub-rig's input totals.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    source: ParameterHandle,
    weight: f32,
    component: SourceComponent,
    is_inverted: bool,
}

impl InputBinding {
    /// Create a binding from its definition. The source resolves on first use.
    #[must_use]
    pub fn from_definition(definition: &InputDefinition) -> Self {
        Self {
            source: ParameterHandle::new(definition.source.as_str()),
            weight: definition.weight,
            component: definition.component,
            is_inverted: definition.is_inverted,
        }
    }

    /// Source parameter handle.
    #[must_use]
    pub const fn source(&self) -> &ParameterHandle {
        &self.source
    }

    /// Weight on the 0..100 scale.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    /// Component this input feeds.
    #[must_use]
    pub const fn component(&self) -> SourceComponent {
        self.component
    }

    /// Whether the normalized sign is kept.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.is_inverted
    }

    /// Add this input's contribution to `totals`.
    ///
    /// `values` is the rig's per-slot input cache. Returns false, leaving
    /// `totals` untouched, while the source parameter cannot be resolved.
    pub fn accumulate<S: ParameterStore + ?Sized>(
        &mut self,
        store: &S,
        values: &[f32],
        normalization: &Normalization,
        maximum_weight: f32,
        totals: &mut InputTotals,
    ) -> bool {
        let was_resolved = self.source.is_resolved();
        let Some((index, &value)) = self
            .source
            .resolve(store)
            .and_then(|index| values.get(index).map(|v| (index, v)))
        else {
            trace!(parameter = self.source.id(), "Input parameter unresolved");
            return false;
        };
        if !was_resolved {
            debug!(parameter = self.source.id(), index, "Resolved input parameter");
        }

        let (minimum, maximum) = store.range(index);
        let weight = self.weight / maximum_weight;

        match self.component {
            SourceComponent::TranslationX => {
                totals.translation.x +=
                    normalization.position.normalize(value, minimum, maximum, self.is_inverted) * weight;
            }
            SourceComponent::TranslationY => {
                totals.translation.y +=
                    normalization.position.normalize(value, minimum, maximum, self.is_inverted) * weight;
            }
            SourceComponent::Angle => {
                totals.angle +=
                    normalization.angle.normalize(value, minimum, maximum, self.is_inverted) * weight;
            }
        }
        true
    }
}
