// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project aggregate root.
//!
//! Tracks, layers and elements live in flat id-indexed maps; ownership is
//! expressed through parent ids on the children and ordered child-id lists on
//! the parents. Every structural primitive here validates before it mutates,
//! so a failed call leaves the project untouched.

use crate::element::Element;
use crate::error::{EntityKind, Result, TimelineError};
use crate::ids::{ElementId, LayerId, MarkerId, ProjectId, TrackId};
use crate::marker::{sort_markers, Marker, MarkerPatch};
use crate::playback::{PlaybackSettings, ViewSettings};
use crate::track::{Layer, Track};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Output resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Create a resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Ids removed by a cascading delete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cascade {
    /// Layers removed
    pub layers: Vec<LayerId>,
    /// Elements removed
    pub elements: Vec<ElementId>,
}

/// Field-level update of project metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    /// New name
    pub name: Option<String>,
    /// New duration in seconds
    pub duration: Option<f64>,
    /// New frame rate
    pub fps: Option<f64>,
    /// New resolution
    pub resolution: Option<Resolution>,
}

/// The edited project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,
    /// Project name
    pub name: String,
    /// Duration in seconds
    pub duration: f64,
    /// Frame rate
    pub fps: f64,
    /// Output resolution
    pub resolution: Resolution,
    /// Playback settings
    pub playback: PlaybackSettings,
    /// View settings
    pub view: ViewSettings,
    /// Incremented on every document mutation
    pub revision: u64,
    /// Creation time (unix ms)
    pub created_at: u64,
    /// Last modification time (unix ms)
    pub updated_at: u64,
    track_order: Vec<TrackId>,
    tracks: IndexMap<TrackId, Track>,
    layers: IndexMap<LayerId, Layer>,
    elements: IndexMap<ElementId, Element>,
    markers: Vec<Marker>,
}

impl Project {
    /// Create an empty project
    pub fn new(name: impl Into<String>, duration: f64, fps: f64, resolution: Resolution) -> Self {
        let now = unix_millis();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            duration: duration.max(0.0),
            fps,
            resolution,
            playback: PlaybackSettings::default(),
            view: ViewSettings::default(),
            revision: 0,
            created_at: now,
            updated_at: now,
            track_order: Vec::new(),
            tracks: IndexMap::new(),
            layers: IndexMap::new(),
            elements: IndexMap::new(),
            markers: Vec::new(),
        }
    }

    /// Record a document mutation
    pub(crate) fn touch(&mut self, now: u64) {
        self.revision += 1;
        self.updated_at = now;
    }

    /// Apply a metadata patch; the playhead is re-clamped to the new duration
    pub fn apply_patch(&mut self, patch: &ProjectPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(duration) = patch.duration {
            self.duration = duration.max(0.0);
            let time = self.playback.current_time;
            self.playback.seek(time, self.duration);
        }
        if let Some(fps) = patch.fps {
            self.fps = fps;
        }
        if let Some(resolution) = patch.resolution {
            self.resolution = resolution;
        }
    }

    // ---- lookups ----

    /// Get a track
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Get a layer
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Get an element
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Get a marker
    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Get a track or fail with `NotFound`
    pub fn require_track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .get(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Track, id))
    }

    /// Get a layer or fail with `NotFound`
    pub fn require_layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .get(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Layer, id))
    }

    /// Get an element or fail with `NotFound`
    pub fn require_element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Element, id))
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .get_mut(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Track, id))
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers
            .get_mut(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Layer, id))
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Element, id))
    }

    /// Tracks in display order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.track_order.iter().filter_map(|id| self.tracks.get(id))
    }

    /// Layers of a track in insertion order
    pub fn layers_of(&self, track_id: TrackId) -> impl Iterator<Item = &Layer> {
        self.tracks
            .get(&track_id)
            .into_iter()
            .flat_map(|t| t.layers.iter())
            .filter_map(|id| self.layers.get(id))
    }

    /// Layers of a track sorted by stacking order (bottom first)
    pub fn layers_in_stacking_order(&self, track_id: TrackId) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers_of(track_id).collect();
        layers.sort_by_key(|l| l.order);
        layers
    }

    /// Elements of a layer in insertion order
    pub fn elements_of(&self, layer_id: LayerId) -> impl Iterator<Item = &Element> {
        self.layers
            .get(&layer_id)
            .into_iter()
            .flat_map(|l| l.elements.iter())
            .filter_map(|id| self.elements.get(id))
    }

    /// All layers, walking the hierarchy in display order
    pub fn all_layers(&self) -> impl Iterator<Item = &Layer> {
        self.tracks().flat_map(|t| self.layers_of(t.id))
    }

    /// All elements, walking the hierarchy in display order
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.all_layers().flat_map(|l| self.elements_of(l.id))
    }

    /// Elements active at `time`
    pub fn elements_at_time(&self, time: f64) -> Vec<&Element> {
        self.all_elements().filter(|e| e.contains_time(time)).collect()
    }

    /// Markers sorted by time
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Get track count
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get layer count
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Get element count
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// End of the last element on the timeline
    pub fn content_end(&self) -> f64 {
        self.elements
            .values()
            .map(Element::end_time)
            .fold(0.0, f64::max)
    }

    /// Stacking order one above the current top layer of a track
    pub fn next_layer_order(&self, track_id: TrackId) -> i32 {
        self.layers_of(track_id)
            .map(|l| l.order + 1)
            .max()
            .unwrap_or(0)
    }

    // ---- structural primitives ----

    /// Append a track
    pub(crate) fn insert_track(&mut self, track: Track) -> TrackId {
        let id = track.id;
        self.track_order.push(id);
        self.tracks.insert(id, track);
        id
    }

    /// Append a layer to its track
    pub(crate) fn insert_layer(&mut self, layer: Layer) -> Result<LayerId> {
        let id = layer.id;
        self.track_mut(layer.track_id)?.layers.push(id);
        self.layers.insert(id, layer);
        Ok(id)
    }

    /// Append an element to its layer
    pub(crate) fn insert_element(&mut self, element: Element) -> Result<ElementId> {
        let id = element.id;
        self.layer_mut(element.layer_id)?.elements.push(id);
        self.elements.insert(id, element);
        Ok(id)
    }

    /// Remove an element from its layer
    pub(crate) fn remove_element(&mut self, id: ElementId) -> Result<Element> {
        let element = self
            .elements
            .shift_remove(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Element, id))?;
        if let Some(layer) = self.layers.get_mut(&element.layer_id) {
            layer.elements.retain(|e| *e != id);
        }
        Ok(element)
    }

    /// Remove a layer and every element on it
    pub(crate) fn remove_layer(&mut self, id: LayerId) -> Result<Cascade> {
        let layer = self
            .layers
            .shift_remove(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Layer, id))?;
        if let Some(track) = self.tracks.get_mut(&layer.track_id) {
            track.layers.retain(|l| *l != id);
        }
        for element_id in &layer.elements {
            self.elements.shift_remove(element_id);
        }
        Ok(Cascade {
            layers: vec![id],
            elements: layer.elements,
        })
    }

    /// Remove a track with its layers and their elements
    pub(crate) fn remove_track(&mut self, id: TrackId) -> Result<Cascade> {
        let track = self
            .tracks
            .shift_remove(&id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Track, id))?;
        self.track_order.retain(|t| *t != id);

        let mut cascade = Cascade::default();
        for layer_id in &track.layers {
            if let Some(layer) = self.layers.shift_remove(layer_id) {
                for element_id in &layer.elements {
                    self.elements.shift_remove(element_id);
                }
                cascade.elements.extend(layer.elements);
                cascade.layers.push(*layer_id);
            }
        }
        Ok(cascade)
    }

    /// Move a track to `new_index` (clamped); returns the applied index
    pub(crate) fn move_track(&mut self, id: TrackId, new_index: usize) -> Result<usize> {
        let from = self
            .track_order
            .iter()
            .position(|t| *t == id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Track, id))?;
        let track = self.track_order.remove(from);
        let to = new_index.min(self.track_order.len());
        self.track_order.insert(to, track);
        Ok(to)
    }

    /// Move an element to another layer and start time.
    ///
    /// Both the element and the destination are resolved before anything is
    /// detached. Returns the source layer.
    pub(crate) fn relocate_element(
        &mut self,
        id: ElementId,
        new_layer_id: LayerId,
        new_time: f64,
    ) -> Result<LayerId> {
        let source = self.require_element(id)?.layer_id;
        self.require_layer(new_layer_id)?;

        if source != new_layer_id {
            if let Some(layer) = self.layers.get_mut(&source) {
                layer.elements.retain(|e| *e != id);
            }
            self.layer_mut(new_layer_id)?.elements.push(id);
        }

        let element = self.element_mut(id)?;
        element.layer_id = new_layer_id;
        element.set_start(new_time);
        Ok(source)
    }

    /// Insert a marker keeping time order
    pub(crate) fn insert_marker(&mut self, marker: Marker) -> MarkerId {
        let id = marker.id;
        self.markers.push(marker);
        sort_markers(&mut self.markers);
        id
    }

    /// Apply a marker patch, re-sorting when its time moved
    pub(crate) fn update_marker(&mut self, id: MarkerId, patch: &MarkerPatch) -> Result<()> {
        let marker = self
            .markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Marker, id))?;
        if patch.apply(marker) {
            sort_markers(&mut self.markers);
        }
        Ok(())
    }

    /// Remove a marker
    pub(crate) fn remove_marker(&mut self, id: MarkerId) -> Result<Marker> {
        let index = self
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::Marker, id))?;
        Ok(self.markers.remove(index))
    }

    /// Check the structural invariants of the hierarchy
    pub fn validate(&self) -> Result<()> {
        let broken = |msg: String| Err(TimelineError::InvalidRecord(msg));

        if self.track_order.len() != self.tracks.len() {
            return broken("track order does not match track table".into());
        }
        for track in self.tracks() {
            for layer_id in &track.layers {
                match self.layers.get(layer_id) {
                    Some(layer) if layer.track_id == track.id => {}
                    _ => return broken(format!("track {} lists bad layer {layer_id}", track.id)),
                }
            }
        }
        let listed: usize = self.tracks().map(|t| t.layers.len()).sum();
        if listed != self.layers.len() {
            return broken("orphaned layers in layer table".into());
        }
        for layer in self.layers.values() {
            for element_id in &layer.elements {
                match self.elements.get(element_id) {
                    Some(element) if element.layer_id == layer.id => {}
                    _ => return broken(format!("layer {} lists bad element {element_id}", layer.id)),
                }
            }
        }
        let owned: usize = self.layers.values().map(|l| l.elements.len()).sum();
        if owned != self.elements.len() {
            return broken("orphaned elements in element table".into());
        }
        for element in self.elements.values() {
            if element.end_time() != element.start_time + element.duration {
                return broken(format!("element {} has stale end time", element.id));
            }
            if let Some(property) = element.properties.iter().find(|p| !p.is_sorted()) {
                return broken(format!(
                    "property {} of element {} is not time-sorted",
                    property.name, element.id
                ));
            }
        }
        if !self.markers.windows(2).all(|w| w[0].time <= w[1].time) {
            return broken("markers are not time-sorted".into());
        }
        Ok(())
    }

    /// Deep copy with fresh ids for every track, layer, element, keyframe and marker
    pub fn duplicate(&self, name: impl Into<String>, now: u64) -> Project {
        let mut copy = Project::new(name, self.duration, self.fps, self.resolution);
        copy.playback = self.playback;
        copy.view = self.view;
        copy.created_at = now;
        copy.updated_at = now;

        for track in self.tracks() {
            let mut new_track = track.clone();
            new_track.id = TrackId::new();
            new_track.layers.clear();
            let track_id = copy.insert_track(new_track);

            for layer in self.layers_of(track.id) {
                let mut new_layer = layer.clone();
                new_layer.id = LayerId::new();
                new_layer.track_id = track_id;
                new_layer.elements.clear();
                let layer_id = new_layer.id;
                if let Some(t) = copy.tracks.get_mut(&track_id) {
                    t.layers.push(layer_id);
                }
                copy.layers.insert(layer_id, new_layer);

                for element in self.elements_of(layer.id) {
                    let mut new_element = element.duplicate();
                    new_element.layer_id = layer_id;
                    let element_id = new_element.id;
                    if let Some(l) = copy.layers.get_mut(&layer_id) {
                        l.elements.push(element_id);
                    }
                    copy.elements.insert(element_id, new_element);
                }
            }
        }

        for marker in &self.markers {
            copy.markers.push(Marker {
                id: MarkerId::new(),
                ..marker.clone()
            });
        }
        copy
    }
}
