// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track, layer, element and marker operations.

use super::{Edit, TimelineEngine};
use crate::element::{Element, ElementDraft, ElementPatch};
use crate::error::{ensure_finite, EntityKind, Result, TimelineError};
use crate::history::HistoryAction;
use crate::ids::{ElementId, LayerId, MarkerId, TrackId};
use crate::marker::{Marker, MarkerDraft, MarkerPatch};
use crate::track::{Layer, LayerDraft, LayerPatch, Track, TrackDraft, TrackPatch};

impl TimelineEngine {
    // ---- lookups ----

    /// Get a track
    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.live()?.require_track(id)
    }

    /// Get a layer
    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.live()?.require_layer(id)
    }

    /// Get an element
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.live()?.require_element(id)
    }

    /// Get a marker
    pub fn marker(&self, id: MarkerId) -> Result<&Marker> {
        self.live()?
            .marker(id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Marker, id))
    }

    /// Elements active at `time` (`start <= time < end`), in display order
    pub fn elements_at_time(&self, time: f64) -> Result<Vec<&Element>> {
        Ok(self.live()?.elements_at_time(time))
    }

    /// Layers of a track sorted bottom to top
    pub fn layers_in_stacking_order(&self, track_id: TrackId) -> Result<Vec<&Layer>> {
        let project = self.live()?;
        project.require_track(track_id)?;
        Ok(project.layers_in_stacking_order(track_id))
    }

    // ---- tracks ----

    /// Append a track
    pub fn add_track(&mut self, draft: TrackDraft) -> Result<TrackId> {
        self.commit(|project| {
            let track = Track::from_draft(draft);
            let description = format!("Added track {}", track.name);
            let track_id = project.insert_track(track);
            Ok(Edit::new(track_id, HistoryAction::AddTrack { track_id }, description))
        })
    }

    /// Change track fields
    pub fn update_track(&mut self, track_id: TrackId, patch: TrackPatch) -> Result<()> {
        self.commit(|project| {
            let track = project.track_mut(track_id)?;
            patch.apply(track);
            let description = format!("Updated track {}", track.name);
            Ok(Edit::new((), HistoryAction::UpdateTrack { track_id }, description))
        })
    }

    /// Remove a track with all of its layers and elements
    pub fn delete_track(&mut self, track_id: TrackId) -> Result<()> {
        self.commit(|project| {
            let name = project.require_track(track_id)?.name.clone();
            let cascade = project.remove_track(track_id)?;
            tracing::debug!(
                layers = cascade.layers.len(),
                elements = cascade.elements.len(),
                "cascaded track delete"
            );
            Ok(Edit::new(
                (),
                HistoryAction::DeleteTrack { track_id },
                format!("Deleted track {name}"),
            ))
        })
    }

    /// Move a track to `new_index` (clamped to the track count)
    pub fn reorder_track(&mut self, track_id: TrackId, new_index: usize) -> Result<usize> {
        self.commit(|project| {
            let index = project.move_track(track_id, new_index)?;
            Ok(Edit::new(
                index,
                HistoryAction::ReorderTrack { track_id, index },
                format!("Moved track to position {index}"),
            ))
        })
    }

    // ---- layers ----

    /// Append a layer to a track; without an explicit order it goes on top
    pub fn add_layer(&mut self, track_id: TrackId, draft: LayerDraft) -> Result<LayerId> {
        self.commit(|project| {
            project.require_track(track_id)?;
            let order = project.next_layer_order(track_id);
            let layer = Layer::from_draft(draft, track_id, order);
            let description = format!("Added layer {}", layer.name);
            let layer_id = project.insert_layer(layer)?;
            Ok(Edit::new(
                layer_id,
                HistoryAction::AddLayer { track_id, layer_id },
                description,
            ))
        })
    }

    /// Change layer fields
    pub fn update_layer(&mut self, layer_id: LayerId, patch: LayerPatch) -> Result<()> {
        self.commit(|project| {
            let layer = project.layer_mut(layer_id)?;
            patch.apply(layer);
            let description = format!("Updated layer {}", layer.name);
            Ok(Edit::new((), HistoryAction::UpdateLayer { layer_id }, description))
        })
    }

    /// Remove a layer with its elements
    pub fn delete_layer(&mut self, layer_id: LayerId) -> Result<()> {
        self.commit(|project| {
            let name = project.require_layer(layer_id)?.name.clone();
            let cascade = project.remove_layer(layer_id)?;
            tracing::debug!(elements = cascade.elements.len(), "cascaded layer delete");
            Ok(Edit::new(
                (),
                HistoryAction::DeleteLayer { layer_id },
                format!("Deleted layer {name}"),
            ))
        })
    }

    /// Deep-copy a layer onto the top of its track. Elements keep their
    /// timing and get fresh ids.
    pub fn duplicate_layer(&mut self, source: LayerId) -> Result<LayerId> {
        self.commit(|project| {
            let original = project.require_layer(source)?;
            let track_id = original.track_id;
            let copy = Layer::from_draft(
                LayerDraft {
                    name: format!("{} (Copy)", original.name),
                    order: None,
                    locked: original.locked,
                    visible: original.visible,
                },
                track_id,
                project.next_layer_order(track_id),
            );
            let elements: Vec<Element> = project.elements_of(source).map(Element::duplicate).collect();

            let layer_id = project.insert_layer(copy)?;
            for mut element in elements {
                element.layer_id = layer_id;
                project.insert_element(element)?;
            }
            let name = project.require_layer(layer_id)?.name.clone();
            Ok(Edit::new(
                layer_id,
                HistoryAction::DuplicateLayer { source, layer_id },
                format!("Duplicated layer as {name}"),
            ))
        })
    }

    /// Set a layer's stacking order
    pub fn reorder_layer(&mut self, layer_id: LayerId, order: i32) -> Result<()> {
        self.commit(|project| {
            project.layer_mut(layer_id)?.order = order;
            Ok(Edit::new(
                (),
                HistoryAction::ReorderLayer { layer_id, order },
                format!("Set layer order to {order}"),
            ))
        })
    }

    // ---- elements ----

    /// Place a new element on a layer
    pub fn add_element(&mut self, layer_id: LayerId, draft: ElementDraft) -> Result<ElementId> {
        draft.ensure_finite()?;
        self.commit(|project| {
            let element = Element::from_draft(draft, layer_id);
            let description = format!("Added {} element {}", element.element_type.name(), element.name);
            let element_id = project.insert_element(element)?;
            Ok(Edit::new(
                element_id,
                HistoryAction::AddElement { layer_id, element_id },
                description,
            ))
        })
    }

    /// Change element fields; timing changes recompute the end time
    pub fn patch_element(&mut self, element_id: ElementId, patch: ElementPatch) -> Result<()> {
        patch.ensure_finite()?;
        self.commit(|project| {
            let element = project.element_mut(element_id)?;
            patch.apply(element);
            let description = format!("Updated element {}", element.name);
            Ok(Edit::new((), HistoryAction::UpdateElement { element_id }, description))
        })
    }

    /// Replace an element with the result of `f`. Identity and ownership
    /// are kept; the end time is recomputed.
    pub fn transform_element(
        &mut self,
        element_id: ElementId,
        f: impl FnOnce(Element) -> Element,
    ) -> Result<()> {
        self.commit(|project| {
            let current = project.require_element(element_id)?.clone();
            let layer_id = current.layer_id;
            let mut updated = f(current);
            updated.id = element_id;
            updated.layer_id = layer_id;
            updated.ensure_finite()?;
            updated.normalize();
            let description = format!("Updated element {}", updated.name);
            *project.element_mut(element_id)? = updated;
            Ok(Edit::new((), HistoryAction::UpdateElement { element_id }, description))
        })
    }

    /// Remove an element
    pub fn delete_element(&mut self, element_id: ElementId) -> Result<()> {
        self.commit(|project| {
            let element = project.remove_element(element_id)?;
            Ok(Edit::new(
                (),
                HistoryAction::DeleteElement { element_id },
                format!("Deleted element {}", element.name),
            ))
        })
    }

    /// Deep-copy an element onto the same layer, right after the original
    pub fn duplicate_element(&mut self, source: ElementId) -> Result<ElementId> {
        let gap = self.config.duplicate_gap;
        self.commit(|project| {
            let original = project.require_element(source)?;
            let mut copy = original.duplicate();
            copy.name = format!("{} (Copy)", original.name);
            copy.set_start(original.end_time() + gap);
            let description = format!("Duplicated element {}", original.name);
            let element_id = project.insert_element(copy)?;
            Ok(Edit::new(
                element_id,
                HistoryAction::DuplicateElement { source, element_id },
                description,
            ))
        })
    }

    /// Relocate an element to another layer and start time. The destination
    /// is checked before the element leaves its current layer.
    pub fn move_element(&mut self, element_id: ElementId, to_layer: LayerId, time: f64) -> Result<()> {
        ensure_finite("time", time)?;
        self.commit(|project| {
            let from_layer = project.relocate_element(element_id, to_layer, time)?;
            Ok(Edit::new(
                (),
                HistoryAction::MoveElement {
                    element_id,
                    from_layer,
                    to_layer,
                    time,
                },
                format!("Moved element to {time:.2}s"),
            ))
        })
    }

    // ---- markers ----

    /// Add a marker
    pub fn add_marker(&mut self, draft: MarkerDraft) -> Result<MarkerId> {
        ensure_finite("marker time", draft.time)?;
        self.commit(|project| {
            let marker = Marker::from_draft(draft);
            let description = format!("Added marker {}", marker.name);
            let marker_id = project.insert_marker(marker);
            Ok(Edit::new(marker_id, HistoryAction::AddMarker { marker_id }, description))
        })
    }

    /// Change marker fields, keeping markers sorted
    pub fn update_marker(&mut self, marker_id: MarkerId, patch: MarkerPatch) -> Result<()> {
        if let Some(time) = patch.time {
            ensure_finite("marker time", time)?;
        }
        self.commit(|project| {
            project.update_marker(marker_id, &patch)?;
            Ok(Edit::new(
                (),
                HistoryAction::UpdateMarker { marker_id },
                "Updated marker",
            ))
        })
    }

    /// Remove a marker
    pub fn delete_marker(&mut self, marker_id: MarkerId) -> Result<()> {
        self.commit(|project| {
            let marker = project.remove_marker(marker_id)?;
            Ok(Edit::new(
                (),
                HistoryAction::DeleteMarker { marker_id },
                format!("Deleted marker {}", marker.name),
            ))
        })
    }
}
