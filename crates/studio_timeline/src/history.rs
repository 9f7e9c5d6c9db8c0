// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history ledger.
//!
//! Every document mutation appends an entry carrying a typed action plus
//! bincode snapshots of the document before and after it. A cursor points
//! at the last applied entry; undo restores that entry's `before`, redo
//! restores the next entry's `after`. History is linear: recording while the
//! cursor is behind the tail discards the undone entries.

use crate::error::{Result, TimelineError};
use crate::ids::{ElementId, HistoryEntryId, KeyframeId, LayerId, MarkerId, TrackId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default history bound
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Serialized document state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    data: Vec<u8>,
}

impl StateSnapshot {
    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(value)?,
        })
    }

    /// Deserialize to value
    pub fn to_value<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Kind of document mutation, with the ids it touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryAction {
    /// Track added
    AddTrack { track_id: TrackId },
    /// Track renamed or (un)locked
    UpdateTrack { track_id: TrackId },
    /// Track removed with its layers and elements
    DeleteTrack { track_id: TrackId },
    /// Track moved in display order
    ReorderTrack { track_id: TrackId, index: usize },
    /// Layer added
    AddLayer { track_id: TrackId, layer_id: LayerId },
    /// Layer fields changed
    UpdateLayer { layer_id: LayerId },
    /// Layer removed with its elements
    DeleteLayer { layer_id: LayerId },
    /// Layer deep-copied
    DuplicateLayer { source: LayerId, layer_id: LayerId },
    /// Layer stacking order changed
    ReorderLayer { layer_id: LayerId, order: i32 },
    /// Element added
    AddElement { layer_id: LayerId, element_id: ElementId },
    /// Element fields changed
    UpdateElement { element_id: ElementId },
    /// Element removed
    DeleteElement { element_id: ElementId },
    /// Element deep-copied
    DuplicateElement { source: ElementId, element_id: ElementId },
    /// Element relocated in time and/or layer
    MoveElement {
        element_id: ElementId,
        from_layer: LayerId,
        to_layer: LayerId,
        time: f64,
    },
    /// Keyframe added
    AddKeyframe {
        element_id: ElementId,
        property: String,
        keyframe_id: KeyframeId,
    },
    /// Keyframe changed
    UpdateKeyframe {
        element_id: ElementId,
        property: String,
        keyframe_id: KeyframeId,
    },
    /// Keyframe removed
    DeleteKeyframe {
        element_id: ElementId,
        property: String,
        keyframe_id: KeyframeId,
    },
    /// Marker added
    AddMarker { marker_id: MarkerId },
    /// Marker changed
    UpdateMarker { marker_id: MarkerId },
    /// Marker removed
    DeleteMarker { marker_id: MarkerId },
    /// Selected elements cut to the clipboard
    Cut { element_ids: Vec<ElementId> },
    /// Clipboard pasted
    Paste { element_ids: Vec<ElementId> },
    /// Project metadata changed
    UpdateProject,
}

impl HistoryAction {
    /// Stable action tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AddTrack { .. } => "add_track",
            Self::UpdateTrack { .. } => "update_track",
            Self::DeleteTrack { .. } => "delete_track",
            Self::ReorderTrack { .. } => "reorder_track",
            Self::AddLayer { .. } => "add_layer",
            Self::UpdateLayer { .. } => "update_layer",
            Self::DeleteLayer { .. } => "delete_layer",
            Self::DuplicateLayer { .. } => "duplicate_layer",
            Self::ReorderLayer { .. } => "reorder_layer",
            Self::AddElement { .. } => "add_element",
            Self::UpdateElement { .. } => "update_element",
            Self::DeleteElement { .. } => "delete_element",
            Self::DuplicateElement { .. } => "duplicate_element",
            Self::MoveElement { .. } => "move_element",
            Self::AddKeyframe { .. } => "add_keyframe",
            Self::UpdateKeyframe { .. } => "update_keyframe",
            Self::DeleteKeyframe { .. } => "delete_keyframe",
            Self::AddMarker { .. } => "add_marker",
            Self::UpdateMarker { .. } => "update_marker",
            Self::DeleteMarker { .. } => "delete_marker",
            Self::Cut { .. } => "cut",
            Self::Paste { .. } => "paste",
            Self::UpdateProject => "update_project",
        }
    }
}

/// A recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry ID
    pub id: HistoryEntryId,
    /// Monotonic position in call order
    pub sequence: u64,
    /// What happened
    pub action: HistoryAction,
    /// Human-readable description
    pub description: String,
    /// Wall-clock time (unix ms), informational only
    pub timestamp: u64,
    /// Who did it
    pub actor_id: String,
    /// Document before the mutation
    pub before: StateSnapshot,
    /// Document after the mutation
    pub after: StateSnapshot,
}

impl HistoryEntry {
    /// Get memory size of this entry
    pub fn memory_size(&self) -> usize {
        self.before.size() + self.after.size()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries that can be undone
    pub undo_count: usize,
    /// Entries that can be redone
    pub redo_count: usize,
    /// Snapshot bytes held
    pub memory_used: usize,
    /// Maximum entries kept
    pub capacity: usize,
}

/// Capacity-bounded linear history
#[derive(Debug)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    /// Index of the last applied entry
    cursor: Option<usize>,
    capacity: usize,
    next_sequence: u64,
}

impl HistoryLedger {
    /// Create with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create with a custom capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Append an entry, discarding anything after the cursor and evicting
    /// the oldest entries past capacity
    pub fn record(
        &mut self,
        action: HistoryAction,
        description: impl Into<String>,
        actor_id: impl Into<String>,
        timestamp: u64,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> &HistoryEntry {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push_back(HistoryEntry {
            id: HistoryEntryId::new(),
            sequence,
            action,
            description: description.into(),
            timestamp,
            actor_id: actor_id.into(),
            before,
            after,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        let tail = self.entries.len() - 1;
        self.cursor = Some(tail);
        &self.entries[tail]
    }

    /// Decode the state preceding the entry at the cursor and step back
    pub fn undo<T: DeserializeOwned>(&mut self) -> Result<T> {
        let index = self
            .cursor
            .ok_or_else(|| TimelineError::InvalidState("nothing to undo".into()))?;
        let state = self.entries[index].before.to_value()?;
        self.cursor = index.checked_sub(1);
        Ok(state)
    }

    /// Decode the state following the next entry and step forward
    pub fn redo<T: DeserializeOwned>(&mut self) -> Result<T> {
        let index = self.cursor.map_or(0, |c| c + 1);
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| TimelineError::InvalidState("nothing to redo".into()))?;
        let state = entry.after.to_value()?;
        self.cursor = Some(index);
        Ok(state)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    /// Index of the last applied entry
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Maximum entries kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the bound, evicting the oldest entries if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor = self.cursor.and_then(|c| c.checked_sub(1));
        }
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        let undo_count = self.cursor.map_or(0, |c| c + 1);
        HistoryStats {
            undo_count,
            redo_count: self.entries.len() - undo_count,
            memory_used: self.entries.iter().map(HistoryEntry::memory_size).sum(),
            capacity: self.capacity,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.entries.get(c))
            .map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.entries
            .get(self.cursor.map_or(0, |c| c + 1))
            .map(|e| e.description.as_str())
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(ledger: &mut HistoryLedger, before: u32, after: u32) {
        ledger.record(
            HistoryAction::UpdateProject,
            format!("{before} -> {after}"),
            "test",
            0,
            StateSnapshot::from_value(&before).unwrap(),
            StateSnapshot::from_value(&after).unwrap(),
        );
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snap = StateSnapshot::from_value(&(1u32, "abc".to_string())).unwrap();
        let value: (u32, String) = snap.to_value().unwrap();
        assert_eq!(value, (1, "abc".to_string()));
        assert!(snap.size() > 0);
    }

    #[test]
    fn test_undo_redo() {
        let mut ledger = HistoryLedger::new();
        assert!(!ledger.can_undo());
        push(&mut ledger, 0, 1);
        push(&mut ledger, 1, 2);

        assert_eq!(ledger.undo::<u32>().unwrap(), 1);
        assert_eq!(ledger.undo::<u32>().unwrap(), 0);
        assert!(!ledger.can_undo());
        assert!(ledger.undo::<u32>().unwrap_err().is_invalid_state());

        assert_eq!(ledger.redo::<u32>().unwrap(), 1);
        assert_eq!(ledger.redo::<u32>().unwrap(), 2);
        assert!(!ledger.can_redo());
        assert!(ledger.redo::<u32>().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_record_discards_redo() {
        let mut ledger = HistoryLedger::new();
        push(&mut ledger, 0, 1);
        push(&mut ledger, 1, 2);
        ledger.undo::<u32>().unwrap();
        assert!(ledger.can_redo());

        push(&mut ledger, 1, 5);
        assert!(!ledger.can_redo());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.redo_description(), None);
        assert_eq!(ledger.undo_description(), Some("1 -> 5"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut ledger = HistoryLedger::new();
        for i in 0..51 {
            push(&mut ledger, i, i + 1);
        }
        assert_eq!(ledger.len(), 50);
        assert_eq!(ledger.cursor(), Some(49));
        assert_eq!(ledger.entries().next().unwrap().description, "1 -> 2");
        assert_eq!(ledger.entries().last().unwrap().sequence, 50);
    }

    #[test]
    fn test_set_capacity_shifts_cursor() {
        let mut ledger = HistoryLedger::with_capacity(0);
        assert_eq!(ledger.capacity(), 1);
        ledger.set_capacity(10);
        for i in 0..4 {
            push(&mut ledger, i, i + 1);
        }
        ledger.undo::<u32>().unwrap();
        ledger.set_capacity(2);
        assert_eq!(ledger.cursor(), Some(0));
        assert_eq!(ledger.redo::<u32>().unwrap(), 4);

        let stats = ledger.stats();
        assert_eq!(stats.undo_count, 2);
        assert_eq!(stats.redo_count, 0);
    }
}
