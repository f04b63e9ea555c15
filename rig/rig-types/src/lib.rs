//! Core types for 2D secondary-motion rigs.
//!
//! This crate provides the pure data and pure math shared by the rig physics
//! engine and its hosts:
//!
//! - [`Particle`] - Rest geometry and runtime state of one chain point
//! - [`Normalization`] / [`normalize`] - Parameter range to physics unit mapping
//! - [`ParameterStore`] / [`ParameterHandle`] - Boundary to the host's parameters
//! - [`RigDefinition`] - Authored description a rig is built from
//! - [`PhysicsConfig`] - Engine-wide defaults (gravity, wind, fixed rate)
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Runtime character players
//! - Authoring and preview tools
//! - Offline batch evaluation
//!
//! # Coordinate System
//!
//! Rig space is 2D. The configured gravity vector is the physics "down"; with
//! the default gravity `(0, -1)` a resting chain hangs along `-Y`.
//!
//! # Example
//!
//! ```
//! use rig_types::{normalize, Normalization, NormalizationRange};
//!
//! let n = Normalization::new(
//!     NormalizationRange::new(-10.0, 0.0, 10.0),
//!     NormalizationRange::new(-10.0, 0.0, 10.0),
//! );
//!
//! // Upper end of a [-30, 30] parameter maps to the range maximum.
//! let x = n.position.normalize(30.0, -30.0, 30.0, true);
//! assert!((x - 10.0).abs() < 1e-6);
//!
//! // Without inversion the sign is flipped.
//! assert!((normalize(30.0, -30.0, 30.0, -10.0, 10.0, 0.0, false) + 10.0).abs() < 1e-6);
//! ```

#![doc(html_root_url = "https://docs.rs/rig-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::float_cmp,                 // Exact zero checks guard divisions
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod config;
mod definition;
mod error;
pub mod math;
mod normalization;
mod parameter;
mod particle;

pub use config::{DeltaTimeSource, MAX_FIXED_RATE, PhysicsConfig};
pub use definition::{
    InputDefinition, OutputDefinition, ParticleDefinition, RigDefinition, SourceComponent,
    SubRigDefinition,
};
pub use error::{Result, RigError};
pub use normalization::{Normalization, NormalizationRange, normalize};
pub use parameter::{ParameterEntry, ParameterHandle, ParameterStore, ParameterTable};
pub use particle::Particle;

// Re-export math types for convenience
pub use nalgebra::Vector2;
