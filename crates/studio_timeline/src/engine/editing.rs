// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection, clipboard and drag operations.

use super::{Edit, TimelineEngine};
use crate::element::Element;
use crate::error::{ensure_finite, EntityKind, Result, TimelineError};
use crate::events::TimelineEvent;
use crate::history::HistoryAction;
use crate::ids::{ElementId, LayerId};
use crate::selection::{Clipboard, DragData, KeyframeRef, Selection};

impl TimelineEngine {
    // ---- selection ----

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select an element; additive calls toggle membership
    pub fn select_element(&mut self, id: ElementId, additive: bool) -> Result<()> {
        self.live()?.require_element(id)?;
        self.selection.select_element(id, additive);
        self.emit(TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Select a layer; additive calls toggle membership
    pub fn select_layer(&mut self, id: LayerId, additive: bool) -> Result<()> {
        self.live()?.require_layer(id)?;
        self.selection.select_layer(id, additive);
        self.emit(TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Select a keyframe; additive calls toggle membership
    pub fn select_keyframe(&mut self, key: KeyframeRef, additive: bool) -> Result<()> {
        let property = self.property(key.element_id, &key.property)?;
        if property.keyframe(key.keyframe_id).is_none() {
            return Err(TimelineError::not_found(EntityKind::Keyframe, key.keyframe_id));
        }
        self.selection.select_keyframe(key, additive);
        self.emit(TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Select every element and layer in the project
    pub fn select_all(&mut self) -> Result<()> {
        let project = self.live()?;
        let elements = project.all_elements().map(|e| e.id).collect();
        let layers = project.all_layers().map(|l| l.id).collect();
        self.selection = Selection {
            elements,
            layers,
            keyframes: Vec::new(),
        };
        self.emit(TimelineEvent::SelectionChanged);
        Ok(())
    }

    /// Empty the selection
    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.emit(TimelineEvent::SelectionChanged);
        }
    }

    // ---- clipboard ----

    /// Clipboard contents
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    fn selected_elements(&self) -> Result<Vec<Element>> {
        let project = self.live()?;
        Ok(self
            .selection
            .elements
            .iter()
            .filter_map(|id| project.element(*id))
            .cloned()
            .collect())
    }

    /// Copy the selected elements; later edits to the sources do not reach
    /// the copies. Returns the number copied.
    pub fn copy_selection(&mut self) -> Result<usize> {
        let elements = self.selected_elements()?;
        let count = elements.len();
        self.clipboard.set(elements);
        tracing::debug!(count, "copied selection");
        self.emit(TimelineEvent::ClipboardChanged { count });
        Ok(count)
    }

    /// Copy the selected elements, delete them and clear the selection.
    /// Returns the number cut.
    pub fn cut_selection(&mut self) -> Result<usize> {
        let count = self.copy_selection()?;
        if count > 0 {
            let element_ids: Vec<ElementId> = self.clipboard.elements().iter().map(|e| e.id).collect();
            self.commit(|project| {
                for id in &element_ids {
                    project.remove_element(*id)?;
                }
                let description = format!("Cut {} elements", element_ids.len());
                Ok(Edit::new((), HistoryAction::Cut { element_ids }, description))
            })?;
        }
        self.clear_selection();
        Ok(count)
    }

    /// Paste the clipboard onto a layer. The earliest copied element lands
    /// at `time` and the others keep their offsets from it. The pasted
    /// elements become the selection.
    pub fn paste(&mut self, layer_id: LayerId, time: f64) -> Result<Vec<ElementId>> {
        ensure_finite("time", time)?;
        self.live()?.require_layer(layer_id)?;
        let Some(base) = self.clipboard.earliest_start() else {
            return Ok(Vec::new());
        };

        let pasted: Vec<Element> = self
            .clipboard
            .elements()
            .iter()
            .map(|source| {
                let mut element = source.duplicate();
                element.layer_id = layer_id;
                element.name = format!("{} (Pasted)", source.name);
                element.set_start(time + (source.start_time - base));
                element
            })
            .collect();
        let element_ids: Vec<ElementId> = pasted.iter().map(|e| e.id).collect();

        let ids = element_ids.clone();
        self.commit(move |project| {
            for element in pasted {
                project.insert_element(element)?;
            }
            let description = format!("Pasted {} elements", ids.len());
            Ok(Edit::new((), HistoryAction::Paste { element_ids: ids }, description))
        })?;

        self.selection = Selection {
            elements: element_ids.clone(),
            ..Selection::default()
        };
        self.emit(TimelineEvent::SelectionChanged);
        Ok(element_ids)
    }

    // ---- drag ----

    /// Begin a drag gesture
    pub fn start_drag(&mut self, data: DragData) {
        self.drag = Some(data);
        self.emit(TimelineEvent::DragChanged);
    }

    /// Finish the drag gesture, returning its data
    pub fn end_drag(&mut self) -> Option<DragData> {
        let data = self.drag.take();
        if data.is_some() {
            self.emit(TimelineEvent::DragChanged);
        }
        data
    }

    /// Whether a drag gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current drag gesture
    pub fn drag(&self) -> Option<&DragData> {
        self.drag.as_ref()
    }
}
