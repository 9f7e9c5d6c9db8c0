// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unique identifiers for timeline entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a project
    ProjectId
);
uuid_id!(
    /// Unique identifier for a track
    TrackId
);
uuid_id!(
    /// Unique identifier for a layer
    LayerId
);
uuid_id!(
    /// Unique identifier for an element
    ElementId
);
uuid_id!(
    /// Unique identifier for a keyframe
    KeyframeId
);
uuid_id!(
    /// Unique identifier for a marker
    MarkerId
);
uuid_id!(
    /// Unique identifier for a history entry
    HistoryEntryId
);
uuid_id!(
    /// Unique identifier for a render job
    RenderJobId
);
uuid_id!(
    /// Handle returned by `TimelineEngine::subscribe`
    SubscriptionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_fresh() {
        let a = ElementId::new();
        let b = ElementId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = TrackId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: TrackId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
