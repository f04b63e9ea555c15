//! One pendulum chain with its bindings.
//!
//! A sub-rig turns accumulated inputs into an anchor translation and a frame
//! tilt, swings its particle chain, and reads the chain back out through its
//! output bindings.
//!
//! ```text
//!   anchor ● particle 0 (follows input translation)
//!          │ radius 1
//!          ● particle 1
//!          │ radius 2
//!          ● particle 2
//!          ↓ gravity (tilted by the input angle)
//! ```

use nalgebra::Vector2;
use rig_types::math::{
    REFERENCE_FRAME_RATE, angle_between, direction_from_angle, down_direction, normalize_or_zero,
    rotate,
};
use rig_types::{Normalization, ParameterStore, Particle, PhysicsConfig, SubRigDefinition};
use tracing::debug;

use crate::input::{InputBinding, InputTotals};
use crate::output::OutputBinding;

/// Rig-wide values one sub-rig step reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Gravity; its direction is the physics "down".
    pub gravity: Vector2<f32>,
    /// Wind force added to every simulated particle.
    pub wind: Vector2<f32>,
    /// Divisor for the gravity rotation carried into the chain.
    pub air_resistance: f32,
    /// Fraction of the position normalization maximum that snaps X to 0.
    pub movement_threshold: f32,
    /// Weight that means "fully replace".
    pub maximum_weight: f32,
    /// See [`OutputBinding::compute`].
    pub use_angle_correction: bool,
}

impl StepContext {
    /// Build a context from a configuration.
    #[must_use]
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity,
            wind: config.wind,
            air_resistance: config.air_resistance,
            movement_threshold: config.movement_threshold,
            maximum_weight: config.maximum_weight,
            use_angle_correction: config.use_angle_correction,
        }
    }

    /// Unit "down" direction.
    #[must_use]
    pub fn down(&self) -> Vector2<f32> {
        down_direction(self.gravity)
    }
}

/// An independent simulation group (e.g. "hair-front", "skirt").
#[derive(Debug, Clone)]
pub struct SubRig {
    name: String,
    inputs: Vec<InputBinding>,
    outputs: Vec<OutputBinding>,
    particles: Vec<Particle>,
    normalization: Normalization,
    previous_outputs: Vec<f32>,
    current_outputs: Vec<f32>,
    fixed_rate: Option<f32>,
}

impl SubRig {
    /// Build an uninitialized sub-rig from its definition.
    ///
    /// The definition is expected to have been validated.
    #[must_use]
    pub fn from_definition(definition: &SubRigDefinition) -> Self {
        let particles = definition
            .particles
            .iter()
            .map(|p| Particle::new(p.mobility, p.delay, p.acceleration, p.radius))
            .collect();

        Self {
            name: definition.name.clone(),
            inputs: definition.inputs.iter().map(InputBinding::from_definition).collect(),
            outputs: definition.outputs.iter().map(OutputBinding::from_definition).collect(),
            particles,
            normalization: definition.normalization,
            previous_outputs: vec![0.0; definition.outputs.len()],
            current_outputs: vec![0.0; definition.outputs.len()],
            fixed_rate: definition.fps,
        }
    }

    /// Lookup name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Particle chain, anchor first.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Input bindings.
    #[must_use]
    pub fn inputs(&self) -> &[InputBinding] {
        &self.inputs
    }

    /// Output bindings.
    #[must_use]
    pub fn outputs(&self) -> &[OutputBinding] {
        &self.outputs
    }

    /// Normalization ranges.
    #[must_use]
    pub const fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// Raw output values of the most recent step.
    #[must_use]
    pub fn current_outputs(&self) -> &[f32] {
        &self.current_outputs
    }

    /// Own simulation rate in Hz, or `None` to follow the rig.
    #[must_use]
    pub const fn fixed_rate(&self) -> Option<f32> {
        self.fixed_rate
    }

    /// Raw output values of the step before the most recent one.
    #[must_use]
    pub fn previous_outputs(&self) -> &[f32] {
        &self.previous_outputs
    }

    /// Hang the chain at rest along gravity and seed the output snapshots.
    pub fn initialize(&mut self, context: &StepContext) {
        let down = context.down();
        let mut position = Vector2::zeros();
        for (i, particle) in self.particles.iter_mut().enumerate() {
            if i > 0 {
                position += down * particle.radius;
            }
            particle.reset_to(position, down);
        }

        self.capture_outputs(context);
        self.previous_outputs.clone_from(&self.current_outputs);
    }

    /// Initialize and clear the output overflow diagnostics.
    pub fn reset(&mut self, context: &StepContext) {
        self.initialize(context);
        self.outputs.iter_mut().for_each(OutputBinding::reset_diagnostics);
    }

    /// Sum this sub-rig's inputs read from `values`.
    pub fn gather_inputs<S: ParameterStore + ?Sized>(
        &mut self,
        store: &S,
        values: &[f32],
        maximum_weight: f32,
    ) -> InputTotals {
        let mut totals = InputTotals::default();
        for input in &mut self.inputs {
            input.accumulate(store, values, &self.normalization, maximum_weight, &mut totals);
        }
        totals
    }

    /// Advance the chain by `dt` seconds.
    pub fn update_particles(&mut self, totals: &InputTotals, context: &StepContext, dt: f32) {
        let threshold = context.movement_threshold * self.normalization.position.maximum;
        let gravity = normalize_or_zero(direction_from_angle(context.down(), totals.angle.to_radians()));

        if let Some(anchor) = self.particles.first_mut() {
            anchor.position = totals.translation;
        }

        for i in 1..self.particles.len() {
            let parent = self.particles[i - 1].position;
            let particle = &mut self.particles[i];

            particle.force = gravity * particle.acceleration + context.wind;
            particle.last_position = particle.position;

            let delay = particle.delay * dt * REFERENCE_FRAME_RATE;

            // Carry part of the frame rotation into the chain.
            let radian = angle_between(particle.last_gravity, gravity) / context.air_resistance;
            let direction = rotate(particle.position - parent, radian);

            particle.position = parent
                + direction
                + particle.velocity * delay
                + particle.force * (delay * delay);

            particle.position = project(parent, particle.position, particle.radius, gravity);
            snap_to_center(&mut particle.position, parent, particle.radius, threshold);

            if delay != 0.0 {
                particle.velocity = (particle.position - particle.last_position) / delay * particle.mobility;
            }

            particle.force = Vector2::zeros();
            particle.last_gravity = gravity;
        }
    }

    /// Place the chain directly in its steady-state pose.
    ///
    /// Each particle hangs from its parent along its constant force, with no
    /// velocity carried over.
    pub fn update_particles_for_stabilization(&mut self, totals: &InputTotals, context: &StepContext) {
        let threshold = context.movement_threshold * self.normalization.position.maximum;
        let gravity = normalize_or_zero(direction_from_angle(context.down(), totals.angle.to_radians()));

        if let Some(anchor) = self.particles.first_mut() {
            anchor.position = totals.translation;
        }

        for i in 1..self.particles.len() {
            let parent = self.particles[i - 1].position;
            let particle = &mut self.particles[i];

            particle.force = gravity * particle.acceleration + context.wind;
            particle.last_position = particle.position;
            particle.velocity = Vector2::zeros();

            let direction = normalize_or_zero(particle.force);
            let direction = if direction == Vector2::zeros() { gravity } else { direction };
            particle.position = parent + direction * particle.radius;
            snap_to_center(&mut particle.position, parent, particle.radius, threshold);

            particle.force = Vector2::zeros();
            particle.last_gravity = gravity;
        }
    }

    /// Run one fixed sub-step.
    ///
    /// Inputs are read from `cache`; each output is blended back into `cache`
    /// so sub-rigs later in the list see this one's result within the step.
    pub fn step<S: ParameterStore + ?Sized>(
        &mut self,
        store: &S,
        cache: &mut [f32],
        context: &StepContext,
        dt: f32,
    ) {
        self.previous_outputs.clone_from(&self.current_outputs);

        let totals = self.gather_inputs(store, cache, context.maximum_weight);
        self.update_particles(&totals, context, dt);
        self.capture_outputs(context);

        for (output, &raw) in self.outputs.iter_mut().zip(&self.current_outputs) {
            let Some(index) = resolve_destination(output, store) else {
                continue;
            };
            if let Some(slot) = cache.get_mut(index) {
                *slot = output.apply(*slot, raw, store.range(index), context.maximum_weight);
            }
        }
    }

    /// Compute the steady-state pose and write it straight into `store`.
    pub fn stabilize<S: ParameterStore + ?Sized>(
        &mut self,
        store: &mut S,
        cache: &mut [f32],
        context: &StepContext,
    ) {
        let totals = self.gather_inputs(&*store, cache, context.maximum_weight);
        self.update_particles_for_stabilization(&totals, context);
        self.capture_outputs(context);
        self.previous_outputs.clone_from(&self.current_outputs);

        for (output, &raw) in self.outputs.iter_mut().zip(&self.current_outputs) {
            let Some(index) = resolve_destination(output, &*store) else {
                continue;
            };
            let value = output.apply(store.value(index), raw, store.range(index), context.maximum_weight);
            store.set_value(index, value);
            if let Some(slot) = cache.get_mut(index) {
                *slot = store.value(index);
            }
        }
    }

    /// Blend the last two snapshots by `alpha` and write them into `store`.
    pub fn interpolate<S: ParameterStore + ?Sized>(
        &mut self,
        store: &mut S,
        alpha: f32,
        maximum_weight: f32,
    ) {
        let snapshots = self.previous_outputs.iter().zip(&self.current_outputs);
        for (output, (&previous, &current)) in self.outputs.iter_mut().zip(snapshots) {
            let Some(index) = resolve_destination(output, &*store) else {
                continue;
            };
            let raw = previous * (1.0 - alpha) + current * alpha;
            let value = output.apply(store.value(index), raw, store.range(index), maximum_weight);
            store.set_value(index, value);
        }
    }

    /// Recompute the raw value of every output from the current chain.
    ///
    /// Outputs bound outside the chain keep their previous value.
    fn capture_outputs(&mut self, context: &StepContext) {
        let gravity = context.down();
        for (output, value) in self.outputs.iter().zip(self.current_outputs.iter_mut()) {
            if let Some(raw) = output.compute(&self.particles, gravity, context.use_angle_correction) {
                *value = raw;
            }
        }
    }
}

fn resolve_destination<S: ParameterStore + ?Sized>(output: &mut OutputBinding, store: &S) -> Option<usize> {
    let was_resolved = output.destination().is_resolved();
    let index = output.destination_mut().resolve(store)?;
    if !was_resolved {
        debug!(parameter = output.destination().id(), index, "Resolved output parameter");
    }
    Some(index)
}

/// Place `position` exactly `radius` from `parent`, keeping its direction.
///
/// A position that collapsed onto the parent falls back to `fallback`.
fn project(
    parent: Vector2<f32>,
    position: Vector2<f32>,
    radius: f32,
    fallback: Vector2<f32>,
) -> Vector2<f32> {
    let direction = normalize_or_zero(position - parent);
    let direction = if direction == Vector2::zeros() { fallback } else { direction };
    parent + direction * radius
}

/// Snap a particle hovering within `threshold` of the vertical center line onto it.
///
/// Only zeroing X would break the chain length, so the particle is moved
/// along its radius circle around `parent` to where that circle crosses
/// x = 0, on the same side of the parent. If the circle never reaches the
/// center line the particle is left alone. Either way the distance to the
/// parent stays exactly `radius`.
fn snap_to_center(position: &mut Vector2<f32>, parent: Vector2<f32>, radius: f32, threshold: f32) {
    if position.x == 0.0 || position.x.abs() >= threshold {
        return;
    }

    let reach = radius * radius - parent.x * parent.x;
    if reach < 0.0 {
        return;
    }

    let side = if position.y >= parent.y { 1.0 } else { -1.0 };
    *position = Vector2::new(0.0, parent.y + side * reach.sqrt());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rig_types::{
        InputDefinition, NormalizationRange, OutputDefinition, ParameterTable, ParticleDefinition,
        SourceComponent,
    };

    fn context() -> StepContext {
        StepContext::from_config(&PhysicsConfig::default())
    }

    fn hair() -> SubRig {
        let definition = SubRigDefinition::new(
            "hair",
            Normalization::new(
                NormalizationRange::new(-10.0, 0.0, 10.0),
                NormalizationRange::new(-10.0, 0.0, 10.0),
            ),
        )
        .with_input(InputDefinition::new("ParamAngleX", SourceComponent::TranslationX, 100.0).inverted())
        .with_input(InputDefinition::new("ParamAngleZ", SourceComponent::Angle, 100.0).inverted())
        .with_output(OutputDefinition::new("ParamHair", 2, SourceComponent::Angle, 100.0))
        .with_particle(ParticleDefinition::anchor())
        .with_particle(ParticleDefinition::new(0.95, 0.9, 1.5, 3.0))
        .with_particle(ParticleDefinition::new(0.9, 0.8, 1.5, 2.0));

        let mut sub_rig = SubRig::from_definition(&definition);
        sub_rig.initialize(&context());
        sub_rig
    }

    fn assert_distances(sub_rig: &SubRig) {
        let particles = sub_rig.particles();
        for i in 1..particles.len() {
            let distance = particles[i].offset_from(&particles[i - 1]).norm();
            assert_relative_eq!(distance, particles[i].radius, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_initialize_hangs_along_gravity() {
        let sub_rig = hair();
        let p = sub_rig.particles();
        assert_eq!(p[0].position, Vector2::zeros());
        assert_relative_eq!(p[1].position, Vector2::new(0.0, -3.0), epsilon = 1e-6);
        assert_relative_eq!(p[2].position, Vector2::new(0.0, -5.0), epsilon = 1e-6);
        assert_relative_eq!(p[2].last_gravity, Vector2::new(0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(sub_rig.current_outputs()[0], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_update_moves_anchor_and_keeps_distances() {
        let mut sub_rig = hair();
        let totals = InputTotals {
            translation: Vector2::new(2.0, 0.0),
            angle: 0.0,
        };

        for _ in 0..30 {
            sub_rig.update_particles(&totals, &context(), 1.0 / 60.0);
            assert_distances(&sub_rig);
        }
        assert_relative_eq!(sub_rig.particles()[0].position, Vector2::new(2.0, 0.0), epsilon = 1e-6);
        assert!(sub_rig.particles()[1].velocity.norm() > 0.0);
    }

    #[test]
    fn test_anchor_ignores_angle() {
        let mut sub_rig = hair();
        let totals = InputTotals {
            translation: Vector2::new(5.0, 0.0),
            angle: 30.0,
        };

        sub_rig.update_particles(&totals, &context(), 1.0 / 60.0);
        assert_eq!(sub_rig.particles()[0].position, Vector2::new(5.0, 0.0));

        sub_rig.update_particles_for_stabilization(&totals, &context());
        assert_eq!(sub_rig.particles()[0].position, Vector2::new(5.0, 0.0));
        assert_distances(&sub_rig);
    }

    #[test]
    fn test_fixed_rate_from_definition() {
        assert_eq!(hair().fixed_rate(), None);

        let definition = SubRigDefinition::new("skirt", Normalization::default())
            .with_fps(30.0)
            .with_particle(ParticleDefinition::anchor());
        assert_eq!(SubRig::from_definition(&definition).fixed_rate(), Some(30.0));
    }

    #[test]
    fn test_tilt_swings_chain() {
        let mut sub_rig = hair();
        let totals = InputTotals {
            translation: Vector2::zeros(),
            angle: 10.0,
        };
        sub_rig.update_particles(&totals, &context(), 1.0 / 60.0);
        assert!(sub_rig.particles()[1].position.x.abs() > 1e-4);
        assert_distances(&sub_rig);
    }

    #[test]
    fn test_stabilization_follows_force() {
        let mut sub_rig = hair();
        let mut ctx = context();
        ctx.wind = Vector2::new(1.5, 0.0);

        sub_rig.update_particles_for_stabilization(&InputTotals::default(), &ctx);
        let p = sub_rig.particles();
        let expected = Vector2::new(1.5, -1.5).normalize() * 3.0;
        assert_relative_eq!(p[1].position, expected, epsilon = 1e-5);
        assert_eq!(p[1].velocity, Vector2::zeros());
        assert_distances(&sub_rig);
    }

    #[test]
    fn test_stabilization_with_no_force_hangs_down() {
        let mut sub_rig = hair();
        let mut ctx = context();
        ctx.wind = Vector2::new(0.0, 1.5);

        // Wind exactly cancels gravity * acceleration.
        sub_rig.update_particles_for_stabilization(&InputTotals::default(), &ctx);
        assert_relative_eq!(sub_rig.particles()[1].position, Vector2::new(0.0, -3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_step_shifts_snapshots() {
        let mut table = ParameterTable::new();
        table.add("ParamAngleX", -30.0, 30.0, 0.0);
        table.add("ParamAngleZ", -30.0, 30.0, 0.0);
        table.add("ParamHair", -1.0, 1.0, 0.0);
        let mut cache = vec![30.0, 0.0, 0.0];

        let mut sub_rig = hair();
        let ctx = context();
        sub_rig.step(&table, &mut cache, &ctx, 1.0 / 60.0);
        let first = sub_rig.current_outputs()[0];
        sub_rig.step(&table, &mut cache, &ctx, 1.0 / 60.0);

        assert_relative_eq!(sub_rig.previous_outputs()[0], first);
        assert!(sub_rig.outputs()[0].destination().is_resolved());
        assert_relative_eq!(cache[2], sub_rig.current_outputs()[0].clamp(-1.0, 1.0));
    }

    #[test]
    fn test_snap_to_center() {
        let mut position = Vector2::new(0.005, -1.0);
        snap_to_center(&mut position, Vector2::zeros(), 1.0, 0.01);
        assert_eq!(position, Vector2::new(0.0, -1.0));

        let mut far = Vector2::new(0.5, -1.0);
        snap_to_center(&mut far, Vector2::zeros(), 1.0, 0.01);
        assert_eq!(far, Vector2::new(0.5, -1.0));

        // Parent too far from the center line for the circle to reach it.
        let mut unreachable = Vector2::new(0.005, -1.0);
        snap_to_center(&mut unreachable, Vector2::new(2.0, 0.0), 1.0, 0.01);
        assert_eq!(unreachable, Vector2::new(0.005, -1.0));
    }

    #[test]
    fn test_snap_keeps_radius_with_offset_parent() {
        let parent = Vector2::new(0.6, 0.0);
        let mut position = Vector2::new(0.004, -0.8);
        snap_to_center(&mut position, parent, 1.0, 0.01);
        assert_eq!(position.x, 0.0);
        assert_relative_eq!((position - parent).norm(), 1.0, epsilon = 1e-6);
        assert!(position.y < 0.0);
    }

    #[test]
    fn test_project() {
        let projected = project(Vector2::new(1.0, 1.0), Vector2::new(1.0, -3.0), 2.0, Vector2::new(0.0, -1.0));
        assert_relative_eq!(projected, Vector2::new(1.0, -1.0), epsilon = 1e-6);

        let collapsed = project(Vector2::zeros(), Vector2::zeros(), 2.0, Vector2::new(0.0, -1.0));
        assert_relative_eq!(collapsed, Vector2::new(0.0, -2.0), epsilon = 1e-6);
    }
}
