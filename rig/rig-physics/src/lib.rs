//! Secondary-motion physics for 2D rigged characters.
//!
//! Hair, earrings, skirts and similar parts are simulated as chains of
//! particles hanging from an anchor. External parameters (head angle, body
//! sway) drive the anchor and tilt the frame; the chain swings; particle
//! offsets are written back into other parameters.
//!
//! - [`Rig`] - Fixed-timestep driver: accumulator, input and output interpolation
//! - [`SubRig`] - One chain with its input and output bindings
//! - [`InputBinding`] / [`OutputBinding`] - Parameter to chain mapping
//!
//! Data types (definitions, configuration, the parameter boundary) live in
//! [`rig_types`] and are re-exported here.
//!
//! # Quick Start
//!
//! ```
//! use rig_physics::prelude::*;
//!
//! let earring = SubRigDefinition::new("earring", Normalization::default())
//!     .with_input(InputDefinition::new("ParamBodyX", SourceComponent::TranslationX, 100.0))
//!     .with_output(OutputDefinition::new("ParamEarring", 1, SourceComponent::Angle, 100.0))
//!     .with_particle(ParticleDefinition::anchor())
//!     .with_particle(ParticleDefinition::new(0.9, 1.0, 1.0, 2.0));
//!
//! let definition = RigDefinition::new().with_fps(60.0).with_sub_rig(earring);
//! let mut rig = Rig::new(&definition, PhysicsConfig::default())?;
//!
//! let mut params = ParameterTable::new();
//! params.add("ParamBodyX", -10.0, 10.0, 0.0);
//! params.add("ParamEarring", -1.0, 1.0, 0.0);
//!
//! rig.evaluate(&mut params, 1.0 / 30.0);
//! assert!(rig.remaining_time() < 1.0 / 60.0);
//! # Ok::<(), RigError>(())
//! ```
//!
//! # Time
//!
//! With a fixed rate the rig steps in `1 / fixed_rate` increments and carries
//! the remainder to the next call. With no fixed rate each call is one step of
//! the caller's delta. Pauses longer than `max_delta_time` are dropped rather
//! than simulated.

#![doc(html_root_url = "https://docs.rs/rig-physics/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::float_cmp,                 // Exact zero checks guard divisions
)]

mod input;
mod output;
mod rig;
mod sub_rig;

pub use input::{InputBinding, InputTotals};
pub use output::OutputBinding;
pub use rig::Rig;
pub use sub_rig::{StepContext, SubRig};

pub use rig_types;

/// Everything needed to define and run a rig.
pub mod prelude {
    pub use crate::{Rig, SubRig};
    pub use rig_types::{
        DeltaTimeSource, InputDefinition, Normalization, NormalizationRange, OutputDefinition,
        ParameterStore, ParameterTable, ParticleDefinition, PhysicsConfig, RigDefinition,
        RigError, SourceComponent, SubRigDefinition, Vector2,
    };
}
