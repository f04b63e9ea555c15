//! Particles of a pendulum chain.

use nalgebra::Vector2;

/// One point mass in a sub-rig chain.
///
/// The rest parameters come from the rig definition and never change; the
/// runtime fields are rewritten by every integration step.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Rest position, seeded by initialization.
    pub initial_position: Vector2<f32>,
    /// Fraction of velocity carried into the next step.
    pub mobility: f32,
    /// Lag factor, expressed at the 30 fps authoring rate.
    pub delay: f32,
    /// Multiplier applied to the gravity force.
    pub acceleration: f32,
    /// Fixed distance to the previous particle.
    pub radius: f32,

    /// Current position.
    pub position: Vector2<f32>,
    /// Position before the most recent step.
    pub last_position: Vector2<f32>,
    /// Gravity direction used by the most recent step.
    pub last_gravity: Vector2<f32>,
    /// Force applied during the current step.
    pub force: Vector2<f32>,
    /// Velocity carried between steps.
    pub velocity: Vector2<f32>,
}

impl Particle {
    /// Create a particle at rest at the origin.
    #[must_use]
    pub fn new(mobility: f32, delay: f32, acceleration: f32, radius: f32) -> Self {
        Self {
            initial_position: Vector2::zeros(),
            mobility,
            delay,
            acceleration,
            radius,
            position: Vector2::zeros(),
            last_position: Vector2::zeros(),
            last_gravity: Vector2::zeros(),
            force: Vector2::zeros(),
            velocity: Vector2::zeros(),
        }
    }

    /// Place the particle at its rest position and clear all motion.
    pub fn reset_to(&mut self, initial_position: Vector2<f32>, gravity: Vector2<f32>) {
        self.initial_position = initial_position;
        self.position = initial_position;
        self.last_position = initial_position;
        self.last_gravity = gravity;
        self.force = Vector2::zeros();
        self.velocity = Vector2::zeros();
    }

    /// Vector from `parent` to this particle.
    #[must_use]
    pub fn offset_from(&self, parent: &Self) -> Vector2<f32> {
        self.position - parent.position
    }
}
