//! Error types for rig construction.
//!
//! Evaluation itself never fails: every degenerate case during a step is
//! defined numerically. These errors only surface while a rig is being built
//! from its definition or configured.

use thiserror::Error;

/// Errors that can occur while building or configuring a rig.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    /// Invalid configuration value.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// The rig definition is malformed.
    #[error("invalid definition for sub-rig '{sub_rig}': {reason}")]
    InvalidDefinition {
        /// Name of the offending sub-rig.
        sub_rig: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// A sub-rig has no particles, so there is nothing to suspend.
    #[error("sub-rig '{0}' has an empty particle chain")]
    EmptyChain(String),

    /// An output references a particle it cannot read.
    #[error("sub-rig '{sub_rig}': output particle index {index} not in [1, {count})")]
    InvalidParticleIndex {
        /// Name of the offending sub-rig.
        sub_rig: String,
        /// The referenced particle index.
        index: usize,
        /// Number of particles in the chain.
        count: usize,
    },

    /// No sub-rig with the requested name.
    #[error("sub-rig not found: {0}")]
    SubRigNotFound(String),
}

impl RigError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid definition error.
    #[must_use]
    pub fn invalid_definition(sub_rig: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            sub_rig: sub_rig.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error stems from the rig definition.
    #[must_use]
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDefinition { .. } | Self::EmptyChain(_) | Self::InvalidParticleIndex { .. }
        )
    }
}

/// Result type for rig operations.
pub type Result<T> = std::result::Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RigError::EmptyChain("hair".to_string());
        assert!(err.to_string().contains("hair"));

        let err = RigError::InvalidParticleIndex {
            sub_rig: "skirt".to_string(),
            index: 4,
            count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("skirt"));
        assert!(msg.contains('4'));

        let err = RigError::invalid_config("air resistance must be positive");
        assert!(err.to_string().contains("air resistance"));
    }

    #[test]
    fn test_error_predicates() {
        let err = RigError::invalid_config("bad value");
        assert!(err.is_config_error());
        assert!(!err.is_definition_error());

        let err = RigError::invalid_definition("bangs", "negative weight");
        assert!(err.is_definition_error());
        assert!(!err.is_config_error());

        assert!(RigError::EmptyChain("x".into()).is_definition_error());
        assert!(!RigError::SubRigNotFound("x".into()).is_definition_error());
    }
}
