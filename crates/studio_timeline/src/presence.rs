// SPDX-License-Identifier: MIT OR Apache-2.0
//! Remote collaborator presence.
//!
//! Bookkeeping only: the transport delivering join/leave/cursor events lives
//! outside the engine and there is no merge logic here.

use crate::error::{EntityKind, Result, TimelineError};
use crate::ids::{ElementId, LayerId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a collaborator is pointing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteCursor {
    /// Time under the cursor
    pub time: f64,
    /// Layer under the cursor
    pub layer_id: Option<LayerId>,
    /// Element under the cursor
    pub element_id: Option<ElementId>,
}

/// A remote editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    /// Transport-assigned id
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color
    pub color: String,
    /// Last reported cursor
    pub cursor: RemoteCursor,
    /// Last activity (unix ms)
    pub last_activity: u64,
}

impl Collaborator {
    /// Create a collaborator at time zero
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            cursor: RemoteCursor::default(),
            last_activity: 0,
        }
    }
}

/// Membership list
#[derive(Debug, Clone, Default)]
pub struct Presence {
    enabled: bool,
    collaborators: IndexMap<String, Collaborator>,
}

impl Presence {
    /// Whether collaboration is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch collaboration on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Add a collaborator; an existing id is replaced in place
    pub fn add(&mut self, mut collaborator: Collaborator, now: u64) -> bool {
        collaborator.last_activity = now;
        self.collaborators
            .insert(collaborator.id.clone(), collaborator)
            .is_none()
    }

    /// Remove a collaborator
    pub fn remove(&mut self, id: &str) -> Result<Collaborator> {
        self.collaborators
            .shift_remove(id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Collaborator, id))
    }

    /// Move a collaborator's cursor and bump its activity
    pub fn update_cursor(&mut self, id: &str, cursor: RemoteCursor, now: u64) -> Result<()> {
        let collaborator = self
            .collaborators
            .get_mut(id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Collaborator, id))?;
        collaborator.cursor = cursor;
        collaborator.last_activity = now;
        Ok(())
    }

    /// Get a collaborator
    pub fn get(&self, id: &str) -> Option<&Collaborator> {
        self.collaborators.get(id)
    }

    /// Collaborators in join order
    pub fn iter(&self) -> impl Iterator<Item = &Collaborator> {
        self.collaborators.values()
    }

    /// Number of collaborators
    pub fn len(&self) -> usize {
        self.collaborators.len()
    }

    /// Check if nobody is present
    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readd_refreshes() {
        let mut presence = Presence::default();
        assert!(presence.add(Collaborator::new("u1", "Ann", "#f00"), 1));
        assert!(!presence.add(Collaborator::new("u1", "Ann B", "#0f0"), 2));
        assert_eq!(presence.len(), 1);
        assert_eq!(presence.get("u1").unwrap().name, "Ann B");
        assert_eq!(presence.get("u1").unwrap().last_activity, 2);
    }

    #[test]
    fn test_update_cursor() {
        let mut presence = Presence::default();
        presence.add(Collaborator::new("u1", "Ann", "#f00"), 1);
        let cursor = RemoteCursor {
            time: 4.5,
            ..Default::default()
        };
        presence.update_cursor("u1", cursor.clone(), 9).unwrap();
        let c = presence.get("u1").unwrap();
        assert_eq!(c.cursor, cursor);
        assert_eq!(c.last_activity, 9);

        assert!(presence
            .update_cursor("nobody", RemoteCursor::default(), 9)
            .unwrap_err()
            .is_not_found());
        assert!(presence.remove("nobody").is_err());
        presence.remove("u1").unwrap();
        assert!(presence.is_empty());
    }
}
