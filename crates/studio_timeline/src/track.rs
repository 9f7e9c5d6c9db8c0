// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracks and layers: the upper two levels of the ownership hierarchy.
//!
//! Both are stored flat in the project arena; children are referenced by id
//! and each child stores its parent id.

use crate::ids::{ElementId, LayerId, TrackId};
use serde::{Deserialize, Serialize};

/// A track in the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Whether the track is locked
    pub locked: bool,
    pub(crate) layers: Vec<LayerId>,
}

impl Track {
    /// Create an empty track with a fresh id
    pub fn from_draft(draft: TrackDraft) -> Self {
        Self {
            id: TrackId::new(),
            name: draft.name,
            locked: draft.locked,
            layers: Vec::new(),
        }
    }

    /// Layers owned by this track, in insertion order
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layers
    }
}

/// Track contents supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDraft {
    /// Track name
    pub name: String,
    /// Whether the track starts locked
    pub locked: bool,
}

impl TrackDraft {
    /// Create a track draft
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locked: false,
        }
    }
}

impl Default for TrackDraft {
    fn default() -> Self {
        Self::new("Track")
    }
}

/// Field-level update of a track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPatch {
    /// New name
    pub name: Option<String>,
    /// New lock flag
    pub locked: Option<bool>,
}

impl TrackPatch {
    /// Apply the patch
    pub fn apply(&self, track: &mut Track) {
        if let Some(name) = &self.name {
            track.name = name.clone();
        }
        if let Some(locked) = self.locked {
            track.locked = locked;
        }
    }
}

/// A layer inside a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique layer ID
    pub id: LayerId,
    /// Owning track
    pub track_id: TrackId,
    /// Layer name
    pub name: String,
    /// Stacking order (higher draws on top)
    pub order: i32,
    /// Whether the layer is locked
    pub locked: bool,
    /// Whether the layer is visible
    pub visible: bool,
    pub(crate) elements: Vec<ElementId>,
}

impl Layer {
    /// Create an empty layer with a fresh id
    pub fn from_draft(draft: LayerDraft, track_id: TrackId, default_order: i32) -> Self {
        Self {
            id: LayerId::new(),
            track_id,
            name: draft.name,
            order: draft.order.unwrap_or(default_order),
            locked: draft.locked,
            visible: draft.visible,
            elements: Vec::new(),
        }
    }

    /// Elements owned by this layer, in insertion order
    pub fn element_ids(&self) -> &[ElementId] {
        &self.elements
    }
}

/// Layer contents supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraft {
    /// Layer name
    pub name: String,
    /// Stacking order; defaults to the top of the track
    pub order: Option<i32>,
    /// Whether the layer starts locked
    pub locked: bool,
    /// Whether the layer starts visible
    pub visible: bool,
}

impl LayerDraft {
    /// Create a layer draft
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            locked: false,
            visible: true,
        }
    }

    /// Set an explicit stacking order
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

impl Default for LayerDraft {
    fn default() -> Self {
        Self::new("Layer")
    }
}

/// Field-level update of a layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    /// New name
    pub name: Option<String>,
    /// New stacking order
    pub order: Option<i32>,
    /// New lock flag
    pub locked: Option<bool>,
    /// New visibility flag
    pub visible: Option<bool>,
}

impl LayerPatch {
    /// Apply the patch
    pub fn apply(&self, layer: &mut Layer) {
        if let Some(name) = &self.name {
            layer.name = name.clone();
        }
        if let Some(order) = self.order {
            layer.order = order;
        }
        if let Some(locked) = self.locked {
            layer.locked = locked;
        }
        if let Some(visible) = self.visible {
            layer.visible = visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_default_order() {
        let track = TrackId::new();
        let layer = Layer::from_draft(LayerDraft::new("BG"), track, 3);
        assert_eq!(layer.order, 3);
        assert_eq!(layer.track_id, track);

        let pinned = Layer::from_draft(LayerDraft::new("FG").with_order(-1), track, 3);
        assert_eq!(pinned.order, -1);
    }

    #[test]
    fn test_patches() {
        let mut track = Track::from_draft(TrackDraft::new("Main"));
        TrackPatch {
            locked: Some(true),
            ..Default::default()
        }
        .apply(&mut track);
        assert!(track.locked);
        assert_eq!(track.name, "Main");

        let mut layer = Layer::from_draft(LayerDraft::default(), track.id, 0);
        LayerPatch {
            visible: Some(false),
            name: Some("Hidden".into()),
            ..Default::default()
        }
        .apply(&mut layer);
        assert!(!layer.visible);
        assert_eq!(layer.name, "Hidden");
    }
}
