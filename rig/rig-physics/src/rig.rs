//! The rig: fixed-timestep driver over all sub-rigs.
//!
//! The host calls [`Rig::evaluate`] once per frame with the elapsed time. The
//! rig accumulates that time and runs zero or more fixed sub-steps. Inputs are
//! interpolated towards their live values across the sub-steps, and outputs
//! are interpolated between the last two sub-steps by the leftover fraction,
//! so the simulation rate and the render rate stay decoupled.
//!
//! Sub-rigs that declare their own rate run on a separate clock with its own
//! accumulator and input cache. Sub-rigs sharing a rate share a clock.

use nalgebra::Vector2;
use rig_types::{ParameterStore, PhysicsConfig, Result, RigDefinition, RigError};
use tracing::{debug, info, warn};

use crate::sub_rig::{StepContext, SubRig};

/// Physics for one animated character.
///
/// # Example
///
/// ```
/// use rig_physics::Rig;
/// use rig_types::{
///     InputDefinition, Normalization, OutputDefinition, ParameterTable, ParticleDefinition,
///     PhysicsConfig, RigDefinition, SourceComponent, SubRigDefinition,
/// };
///
/// let hair = SubRigDefinition::new("hair", Normalization::default())
///     .with_input(InputDefinition::new("ParamAngleX", SourceComponent::TranslationX, 60.0))
///     .with_output(OutputDefinition::new("ParamHairFront", 1, SourceComponent::Angle, 100.0))
///     .with_particle(ParticleDefinition::anchor())
///     .with_particle(ParticleDefinition::new(0.95, 0.9, 1.5, 3.0));
///
/// let mut rig = Rig::new(&RigDefinition::new().with_sub_rig(hair), PhysicsConfig::with_fixed_rate(60.0))?;
///
/// let mut params = ParameterTable::new();
/// params.add("ParamAngleX", -30.0, 30.0, 0.0);
/// params.add("ParamHairFront", -1.0, 1.0, 0.0);
///
/// rig.stabilize(&mut params);
/// params.set_value_of("ParamAngleX", 30.0);
/// for _ in 0..10 {
///     rig.evaluate(&mut params, 1.0 / 60.0);
/// }
///
/// let hair = params.value_of("ParamHairFront").unwrap_or_default();
/// assert!((-1.0..=1.0).contains(&hair));
/// # Ok::<(), rig_types::RigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Rig {
    sub_rigs: Vec<SubRig>,
    config: PhysicsConfig,
    clocks: Vec<Clock>,
}

/// Accumulator and parameter caches for the sub-rigs stepping at one rate.
#[derive(Debug, Clone, Default)]
struct Clock {
    /// Own rate in Hz; `None` follows the rig's configured rate.
    fixed_rate: Option<f32>,
    /// Indices into `Rig::sub_rigs`, in evaluation order.
    members: Vec<usize>,
    remaining_time: f32,
    parameter_cache: Vec<f32>,
    parameter_input_cache: Vec<f32>,
}

impl Clock {
    fn new(fixed_rate: Option<f32>) -> Self {
        Self {
            fixed_rate,
            ..Self::default()
        }
    }

    fn reset(&mut self) {
        self.remaining_time = 0.0;
        self.parameter_cache.clear();
        self.parameter_input_cache.clear();
    }

    /// Grow both caches to `count` slots; new input slots start at live values.
    fn grow_caches<S: ParameterStore + ?Sized>(&mut self, store: &S, count: usize) {
        if self.parameter_cache.len() < count {
            self.parameter_cache.resize(count, 0.0);
        }

        let cached = self.parameter_input_cache.len();
        if cached < count {
            self.parameter_input_cache
                .extend((cached..count).map(|index| store.value(index)));
        }
    }

    /// Accumulate `delta_time`, run the due sub-steps and write interpolated outputs.
    fn advance<S: ParameterStore + ?Sized>(
        &mut self,
        sub_rigs: &mut [SubRig],
        store: &mut S,
        delta_time: f32,
        rig_rate: f32,
        context: &StepContext,
        max_delta_time: f32,
    ) {
        self.remaining_time += delta_time;
        if self.remaining_time > max_delta_time {
            warn!(
                remaining = self.remaining_time,
                limit = max_delta_time,
                "Discarding accumulated physics time"
            );
            self.remaining_time = 0.0;
        }

        let count = store.parameter_count();
        self.grow_caches(&*store, count);

        let rate = self.fixed_rate.unwrap_or(rig_rate);
        // Variable rate: one step over everything pending.
        let physics_dt = if rate > 0.0 { rate.recip() } else { self.remaining_time };
        let mut steps = 0_usize;

        while physics_dt > 0.0 && self.remaining_time >= physics_dt {
            let input_weight = physics_dt / self.remaining_time;
            for index in 0..count {
                let value = self.parameter_input_cache[index] * (1.0 - input_weight)
                    + store.value(index) * input_weight;
                self.parameter_cache[index] = value;
                self.parameter_input_cache[index] = value;
            }

            for &member in &self.members {
                sub_rigs[member].step(&*store, &mut self.parameter_cache, context, physics_dt);
            }

            self.remaining_time -= physics_dt;
            steps += 1;
        }

        let alpha = if physics_dt > 0.0 { self.remaining_time / physics_dt } else { 0.0 };
        for &member in &self.members {
            sub_rigs[member].interpolate(store, alpha, context.maximum_weight);
        }

        debug!(rate, steps, alpha, remaining = self.remaining_time, "Evaluated physics clock");
    }

    fn stabilize<S: ParameterStore + ?Sized>(
        &mut self,
        sub_rigs: &mut [SubRig],
        store: &mut S,
        context: &StepContext,
    ) {
        let count = store.parameter_count();
        self.grow_caches(&*store, count);
        for index in 0..count {
            let value = store.value(index);
            self.parameter_cache[index] = value;
            self.parameter_input_cache[index] = value;
        }

        for &member in &self.members {
            sub_rigs[member].stabilize(store, &mut self.parameter_cache, context);
        }
    }
}

/// Group sub-rigs by rate. Clock 0 always follows the rig's rate.
fn build_clocks(sub_rigs: &[SubRig]) -> Vec<Clock> {
    let mut clocks = vec![Clock::new(None)];
    for (index, sub_rig) in sub_rigs.iter().enumerate() {
        let rate = sub_rig.fixed_rate();
        match clocks.iter_mut().find(|clock| clock.fixed_rate == rate) {
            Some(clock) => clock.members.push(index),
            None => {
                let mut clock = Clock::new(rate);
                clock.members.push(index);
                clocks.push(clock);
            }
        }
    }
    clocks
}

impl Rig {
    /// Build and initialize a rig.
    ///
    /// Values the definition carries (fps, gravity, wind) override `config`.
    /// A sub-rig's own fps overrides both for that sub-rig.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the definition is invalid.
    pub fn new(definition: &RigDefinition, config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        definition.validate()?;

        let config = PhysicsConfig {
            fixed_rate: definition.fps.unwrap_or(config.fixed_rate),
            gravity: definition.gravity.unwrap_or(config.gravity),
            wind: definition.wind.unwrap_or(config.wind),
            ..config
        };

        let sub_rigs: Vec<SubRig> = definition.sub_rigs.iter().map(SubRig::from_definition).collect();
        let clocks = build_clocks(&sub_rigs);

        let mut rig = Self {
            sub_rigs,
            config,
            clocks,
        };
        rig.initialize();

        info!(
            sub_rigs = definition.sub_rigs.len(),
            particles = definition.particle_count(),
            inputs = definition.input_count(),
            outputs = definition.output_count(),
            fixed_rate = rig.config.fixed_rate,
            clocks = rig.clocks.len(),
            "Built physics rig"
        );

        Ok(rig)
    }

    /// Place every chain at rest along gravity.
    pub fn initialize(&mut self) {
        let context = self.context();
        for sub_rig in &mut self.sub_rigs {
            sub_rig.initialize(&context);
        }
    }

    /// Return to the freshly built state.
    ///
    /// Chains are re-initialized, pending time is dropped, the input caches are
    /// cleared (they re-seed from live values on the next evaluation) and
    /// output overflow diagnostics are reset.
    pub fn reset(&mut self) {
        let context = self.context();
        for sub_rig in &mut self.sub_rigs {
            sub_rig.reset(&context);
        }
        self.clocks.iter_mut().for_each(Clock::reset);
    }

    /// Advance the simulation by `delta_time` seconds and write the outputs.
    ///
    /// Non-positive (or non-finite) deltas are ignored. If more than the
    /// configured maximum time has piled up on a clock, it is discarded.
    pub fn evaluate<S: ParameterStore + ?Sized>(&mut self, store: &mut S, delta_time: f32) {
        if !(delta_time > 0.0 && delta_time.is_finite()) {
            return;
        }

        let context = self.context();
        for clock in &mut self.clocks {
            clock.advance(
                &mut self.sub_rigs,
                store,
                delta_time,
                self.config.fixed_rate,
                &context,
                self.config.max_delta_time,
            );
        }
    }

    /// Evaluate with the delta selected by the configured [`DeltaTimeSource`].
    ///
    /// [`DeltaTimeSource`]: rig_types::DeltaTimeSource
    pub fn tick<S: ParameterStore + ?Sized>(&mut self, store: &mut S, frame_delta: f32, fixed_delta: f32) {
        let delta = self.config.delta_time_source.select(frame_delta, fixed_delta);
        self.evaluate(store, delta);
    }

    /// Jump every chain to its steady-state pose for the live parameters.
    ///
    /// Outputs are written straight into `store` (weights still apply) and
    /// the store is asked for an immediate pose update. Used at load time and
    /// after pose resets so characters do not visibly settle.
    pub fn stabilize<S: ParameterStore + ?Sized>(&mut self, store: &mut S) {
        let context = self.context();
        for clock in &mut self.clocks {
            clock.stabilize(&mut self.sub_rigs, store, &context);
        }

        store.request_pose_update();
    }

    /// Sub-rigs in evaluation order.
    #[must_use]
    pub fn sub_rigs(&self) -> &[SubRig] {
        &self.sub_rigs
    }

    /// Sub-rig by name.
    #[must_use]
    pub fn sub_rig(&self, name: &str) -> Option<&SubRig> {
        self.sub_rigs.iter().find(|s| s.name() == name)
    }

    /// Sub-rig by name, or [`RigError::SubRigNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if no sub-rig has this name.
    pub fn try_sub_rig(&self, name: &str) -> Result<&SubRig> {
        self.sub_rig(name)
            .ok_or_else(|| RigError::SubRigNotFound(name.to_string()))
    }

    /// Effective configuration, with definition overrides applied.
    #[must_use]
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Current gravity.
    #[must_use]
    pub fn gravity(&self) -> Vector2<f32> {
        self.config.gravity
    }

    /// Override the gravity.
    pub fn set_gravity(&mut self, gravity: Vector2<f32>) {
        self.config.gravity = gravity;
    }

    /// Current wind.
    #[must_use]
    pub fn wind(&self) -> Vector2<f32> {
        self.config.wind
    }

    /// Override the wind.
    pub fn set_wind(&mut self, wind: Vector2<f32>) {
        self.config.wind = wind;
    }

    /// Simulation rate in Hz (0 = caller's delta).
    ///
    /// Sub-rigs with their own rate ignore this.
    #[must_use]
    pub const fn fixed_rate(&self) -> f32 {
        self.config.fixed_rate
    }

    /// Override the simulation rate.
    ///
    /// # Errors
    ///
    /// Returns an error if `fixed_rate` is negative, not finite or above
    /// [`MAX_FIXED_RATE`](rig_types::MAX_FIXED_RATE).
    pub fn set_fixed_rate(&mut self, fixed_rate: f32) -> Result<()> {
        PhysicsConfig::validate_fixed_rate(fixed_rate)?;
        self.config.fixed_rate = fixed_rate;
        Ok(())
    }

    /// Simulation time accumulated but not yet stepped on the rig's clock.
    #[must_use]
    pub fn remaining_time(&self) -> f32 {
        self.clocks.first().map_or(0.0, |clock| clock.remaining_time)
    }

    /// Simulation time pending on the clock driving `sub_rig`.
    #[must_use]
    pub fn remaining_time_of(&self, sub_rig: &str) -> Option<f32> {
        let index = self.sub_rigs.iter().position(|s| s.name() == sub_rig)?;
        self.clocks
            .iter()
            .find(|clock| clock.members.contains(&index))
            .map(|clock| clock.remaining_time)
    }

    /// Number of separately stepped rates, including the rig's own.
    #[must_use]
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Number of parameter slots the rig clock's caches currently cover.
    #[must_use]
    pub fn cached_parameter_count(&self) -> usize {
        self.clocks.first().map_or(0, |clock| clock.parameter_cache.len())
    }

    fn context(&self) -> StepContext {
        StepContext::from_config(&self.config)
    }
}
