// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transient editing state: selection, clipboard and drag.
//!
//! None of this is persisted or recorded in history.

use crate::element::Element;
use crate::ids::{ElementId, KeyframeId, LayerId};
use crate::project::Project;
use serde::{Deserialize, Serialize};

/// Reference to a keyframe inside an element property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeRef {
    /// Owning element
    pub element_id: ElementId,
    /// Property name
    pub property: String,
    /// Keyframe ID
    pub keyframe_id: KeyframeId,
}

impl KeyframeRef {
    /// Create a keyframe reference
    pub fn new(element_id: ElementId, property: impl Into<String>, keyframe_id: KeyframeId) -> Self {
        Self {
            element_id,
            property: property.into(),
            keyframe_id,
        }
    }

    fn exists_in(&self, project: &Project) -> bool {
        project
            .element(self.element_id)
            .and_then(|e| e.property(&self.property))
            .and_then(|p| p.keyframe(self.keyframe_id))
            .is_some()
    }
}

/// Add `item` if absent, otherwise remove it
fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|i| *i == item) {
        Some(index) => {
            items.remove(index);
        }
        None => items.push(item),
    }
}

/// Current selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Selected elements in selection order
    pub elements: Vec<ElementId>,
    /// Selected layers in selection order
    pub layers: Vec<LayerId>,
    /// Selected keyframes in selection order
    pub keyframes: Vec<KeyframeRef>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an element; additive calls toggle membership
    pub fn select_element(&mut self, id: ElementId, additive: bool) {
        if additive {
            toggle(&mut self.elements, id);
        } else {
            self.clear();
            self.elements.push(id);
        }
    }

    /// Select a layer; additive calls toggle membership
    pub fn select_layer(&mut self, id: LayerId, additive: bool) {
        if additive {
            toggle(&mut self.layers, id);
        } else {
            self.clear();
            self.layers.push(id);
        }
    }

    /// Select a keyframe; additive calls toggle membership
    pub fn select_keyframe(&mut self, key: KeyframeRef, additive: bool) {
        if additive {
            toggle(&mut self.keyframes, key);
        } else {
            self.clear();
            self.keyframes.push(key);
        }
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.elements.clear();
        self.layers.clear();
        self.keyframes.clear();
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.layers.is_empty() && self.keyframes.is_empty()
    }

    /// Get the number of selected items
    pub fn len(&self) -> usize {
        self.elements.len() + self.layers.len() + self.keyframes.len()
    }

    /// Drop references to entities that no longer exist; returns whether
    /// anything was removed
    pub fn retain_existing(&mut self, project: &Project) -> bool {
        let before = self.len();
        self.elements.retain(|id| project.element(*id).is_some());
        self.layers.retain(|id| project.layer(*id).is_some());
        self.keyframes.retain(|k| k.exists_in(project));
        self.len() != before
    }
}

/// Deep copies of elements, independent of later edits to their sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    elements: Vec<Element>,
}

impl Clipboard {
    /// Replace the contents
    pub fn set(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    /// Clipboard contents
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of copied elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the clipboard is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Earliest start time among copied elements
    pub fn earliest_start(&self) -> Option<f64> {
        self.elements
            .iter()
            .map(|e| e.start_time)
            .min_by(f64::total_cmp)
    }
}

/// In-progress drag gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragData {
    /// Elements being dragged
    pub element_ids: Vec<ElementId>,
    /// Time under the pointer when the drag started
    pub origin_time: f64,
    /// Layer under the pointer when the drag started
    pub origin_layer: Option<LayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_replaces() {
        let mut selection = Selection::new();
        let a = ElementId::new();
        let b = ElementId::new();
        selection.select_layer(LayerId::new(), false);
        selection.select_element(a, false);
        selection.select_element(b, false);
        assert_eq!(selection.elements, vec![b]);
        assert!(selection.layers.is_empty());
    }

    #[test]
    fn test_additive_toggles() {
        let mut selection = Selection::new();
        let a = ElementId::new();
        let b = ElementId::new();
        selection.select_element(a, false);
        selection.select_element(b, true);
        assert_eq!(selection.elements, vec![a, b]);
        selection.select_element(a, true);
        assert_eq!(selection.elements, vec![b]);
    }

    #[test]
    fn test_clear_idempotent() {
        let mut selection = Selection::new();
        selection.select_element(ElementId::new(), false);
        selection.clear();
        let once = selection.clone();
        selection.clear();
        assert_eq!(selection, once);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_existing() {
        let project = Project::new("Test", 10.0, 30.0, Default::default());
        let mut selection = Selection::new();
        selection.select_element(ElementId::new(), false);
        assert!(selection.retain_existing(&project));
        assert!(selection.is_empty());
        assert!(!selection.retain_existing(&project));
    }
}
