// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types shared by every timeline operation.

use std::fmt;

/// Kind of entity referenced by a failed lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The live project
    Project,
    /// A track
    Track,
    /// A layer inside a track
    Layer,
    /// An element inside a layer
    Element,
    /// A named property of an element
    Property,
    /// A keyframe inside a property
    Keyframe,
    /// A project marker
    Marker,
    /// A remote collaborator
    Collaborator,
    /// A render job
    RenderJob,
}

impl EntityKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Track => "Track",
            Self::Layer => "Layer",
            Self::Element => "Element",
            Self::Property => "Property",
            Self::Keyframe => "Keyframe",
            Self::Marker => "Marker",
            Self::Collaborator => "Collaborator",
            Self::RenderJob => "Render job",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timeline engine errors
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// A referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up
        kind: EntityKind,
        /// The id that failed to resolve
        id: String,
    },

    /// The operation needs a live project and none is loaded
    #[error("No project is loaded")]
    NoProject,

    /// A value could not be clamped into its domain
    #[error("Value out of range: {0}")]
    InvalidRange(String),

    /// The operation is not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A persisted record violates the model
    #[error("Invalid project record: {0}")]
    InvalidRecord(String),

    /// History snapshot encoding failed
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON encoding failed
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// RON parsing failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TimelineError {
    /// Build a `NotFound` error for the given entity
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether this error reports a missing entity (including a missing project)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoProject)
    }

    /// Whether this error reports a disallowed state transition
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Reject NaN and infinities before a value reaches a clamp
pub(crate) fn ensure_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TimelineError::InvalidRange(format!("{what} must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = TimelineError::not_found(EntityKind::Layer, "abc");
        assert_eq!(err.to_string(), "Layer not found: abc");
        assert!(err.is_not_found());
        assert!(TimelineError::NoProject.is_not_found());
        assert!(!TimelineError::InvalidState("x".into()).is_not_found());
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("zoom", 2.0).unwrap(), 2.0);
        assert!(matches!(
            ensure_finite("zoom", f64::NAN),
            Err(TimelineError::InvalidRange(_))
        ));
        assert!(ensure_finite("zoom", f64::INFINITY).is_err());
    }
}
