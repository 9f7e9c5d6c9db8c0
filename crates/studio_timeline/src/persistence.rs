// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project persistence.
//!
//! The in-memory arena is converted to a nested, camelCase record
//! (`project -> tracks -> layers -> elements -> properties -> keyframes`)
//! that is written as JSON or RON by a [`ProjectStore`].

use crate::element::{Element, ElementDraft, ElementType, Transform};
use crate::error::{EntityKind, Result, TimelineError};
use crate::ids::{ElementId, KeyframeId, LayerId, MarkerId, ProjectId, TrackId};
use crate::keyframe::Keyframe;
use crate::marker::Marker;
use crate::playback::{PlaybackSettings, ViewSettings};
use crate::project::{Project, Resolution};
use crate::property::Property;
use crate::track::{Layer, Track};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Persisted project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Project ID
    pub id: ProjectId,
    /// Project name
    pub name: String,
    /// Duration in seconds
    pub duration: f64,
    /// Frame rate
    pub fps: f64,
    /// Output resolution
    pub resolution: Resolution,
    /// Playhead position
    pub current_time: f64,
    /// Zoom factor
    pub zoom: f64,
    /// Scroll offset in pixels
    pub scroll_x: f64,
    /// Output volume
    pub volume: f64,
    /// Loop flag
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Document revision
    pub version: u64,
    /// Creation time (unix ms)
    pub created_at: u64,
    /// Last modification time (unix ms)
    pub updated_at: u64,
    /// Tracks in display order
    pub tracks: Vec<TrackRecord>,
    /// Markers sorted by time
    pub markers: Vec<MarkerRecord>,
}

/// Persisted track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    /// Track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Lock flag
    pub locked: bool,
    /// Layers in insertion order
    pub layers: Vec<LayerRecord>,
}

/// Persisted layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    /// Layer ID
    pub id: LayerId,
    /// Layer name
    pub name: String,
    /// Stacking order
    pub order: i32,
    /// Lock flag
    pub locked: bool,
    /// Visibility flag
    pub visible: bool,
    /// Elements in insertion order
    pub elements: Vec<ElementRecord>,
}

/// Persisted element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Element ID
    pub id: ElementId,
    /// Element type
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Display name
    pub name: String,
    /// Owning layer
    pub layer_id: LayerId,
    /// Start time
    pub start_time: f64,
    /// Duration
    pub duration: f64,
    /// End time; recomputed on load
    pub end_time: f64,
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Horizontal scale
    pub scale_x: f32,
    /// Vertical scale
    pub scale_y: f32,
    /// Opacity
    pub opacity: f32,
    /// Lock flag
    pub locked: bool,
    /// Visibility flag
    pub visible: bool,
    /// Animated properties
    pub properties: Vec<PropertyRecord>,
}

/// Persisted property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Property name
    pub name: String,
    /// Keyframes; sorted on load
    pub keyframes: Vec<Keyframe>,
}

/// Persisted marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    /// Marker ID
    pub id: MarkerId,
    /// Marker name
    pub name: String,
    /// Absolute time
    pub time: f64,
    /// Display color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Insert `id` into `seen`, failing on a repeat
fn claim<T: Hash + Eq + Display>(seen: &mut HashSet<T>, kind: EntityKind, id: T) -> Result<()> {
    let label = id.to_string();
    if seen.insert(id) {
        Ok(())
    } else {
        Err(TimelineError::InvalidRecord(format!("duplicate {kind} id {label}")))
    }
}

impl ProjectRecord {
    /// Capture a project
    pub fn from_project(project: &Project) -> Self {
        let tracks = project
            .tracks()
            .map(|track| TrackRecord {
                id: track.id,
                name: track.name.clone(),
                locked: track.locked,
                layers: project
                    .layers_of(track.id)
                    .map(|layer| LayerRecord {
                        id: layer.id,
                        name: layer.name.clone(),
                        order: layer.order,
                        locked: layer.locked,
                        visible: layer.visible,
                        elements: project.elements_of(layer.id).map(ElementRecord::from_element).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: project.id,
            name: project.name.clone(),
            duration: project.duration,
            fps: project.fps,
            resolution: project.resolution,
            current_time: project.playback.current_time,
            zoom: project.view.zoom,
            scroll_x: project.view.scroll_x,
            volume: project.playback.volume,
            looping: project.playback.looping,
            version: project.revision,
            created_at: project.created_at,
            updated_at: project.updated_at,
            tracks,
            markers: project
                .markers()
                .iter()
                .map(|m| MarkerRecord {
                    id: m.id,
                    name: m.name.clone(),
                    time: m.time,
                    color: m.color.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild the arena, repairing what can be repaired
    pub fn into_project(self) -> Result<Project> {
        let mut project = Project::new(self.name, self.duration, self.fps, self.resolution);
        project.id = self.id;
        project.playback = PlaybackSettings {
            current_time: 0.0,
            volume: 0.0,
            looping: self.looping,
        };
        project.playback.seek(self.current_time, project.duration);
        project.playback.set_volume(self.volume);
        project.view = ViewSettings::default();
        project.view.set_zoom(self.zoom);
        project.view.set_scroll_x(self.scroll_x);
        project.revision = self.version;
        project.created_at = self.created_at;
        project.updated_at = self.updated_at;

        let mut track_ids = HashSet::new();
        let mut layer_ids = HashSet::new();
        let mut element_ids = HashSet::new();
        let mut keyframe_ids: HashSet<KeyframeId> = HashSet::new();
        let mut marker_ids = HashSet::new();

        for track in self.tracks {
            claim(&mut track_ids, EntityKind::Track, track.id)?;
            let track_id = project.insert_track(Track {
                id: track.id,
                name: track.name,
                locked: track.locked,
                layers: Vec::new(),
            });

            for layer in track.layers {
                claim(&mut layer_ids, EntityKind::Layer, layer.id)?;
                let layer_id = project.insert_layer(Layer {
                    id: layer.id,
                    track_id,
                    name: layer.name,
                    order: layer.order,
                    locked: layer.locked,
                    visible: layer.visible,
                    elements: Vec::new(),
                })?;

                for element in layer.elements {
                    claim(&mut element_ids, EntityKind::Element, element.id)?;
                    for keyframe in element.properties.iter().flat_map(|p| &p.keyframes) {
                        claim(&mut keyframe_ids, EntityKind::Keyframe, keyframe.id)?;
                    }
                    if element.layer_id != layer_id {
                        tracing::warn!(
                            element = %element.id,
                            recorded = %element.layer_id,
                            container = %layer_id,
                            "element layerId disagrees with its container, repairing"
                        );
                    }
                    project.insert_element(element.into_element(layer_id)?)?;
                }
            }
        }

        for marker in self.markers {
            claim(&mut marker_ids, EntityKind::Marker, marker.id)?;
            project.insert_marker(Marker {
                id: marker.id,
                name: marker.name,
                time: marker.time.max(0.0),
                color: marker.color,
            });
        }

        project.validate()?;
        Ok(project)
    }
}

impl ElementRecord {
    fn from_element(element: &Element) -> Self {
        let t = &element.transform;
        Self {
            id: element.id,
            element_type: element.element_type,
            name: element.name.clone(),
            layer_id: element.layer_id,
            start_time: element.start_time,
            duration: element.duration,
            end_time: element.end_time(),
            x: t.x,
            y: t.y,
            width: t.width,
            height: t.height,
            rotation: t.rotation,
            scale_x: t.scale_x,
            scale_y: t.scale_y,
            opacity: t.opacity,
            locked: element.locked,
            visible: element.visible,
            properties: element
                .properties
                .iter()
                .map(|p| PropertyRecord {
                    name: p.name.clone(),
                    keyframes: p.keyframes().to_vec(),
                })
                .collect(),
        }
    }

    fn into_element(self, layer_id: LayerId) -> Result<Element> {
        let draft = ElementDraft {
            element_type: self.element_type,
            name: self.name,
            start_time: self.start_time,
            duration: self.duration,
            transform: Transform {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                rotation: self.rotation,
                scale_x: self.scale_x,
                scale_y: self.scale_y,
                opacity: self.opacity,
            },
            locked: self.locked,
            visible: self.visible,
            properties: self
                .properties
                .into_iter()
                .map(|p| Property::from_keyframes(p.name, p.keyframes))
                .collect(),
        };
        draft.ensure_finite()?;
        let mut element = Element::from_draft(draft, layer_id);
        element.id = self.id;
        Ok(element)
    }
}

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFormat {
    /// Pretty JSON (`.json`)
    #[default]
    Json,
    /// Pretty RON (`.ron`)
    Ron,
}

impl StoreFormat {
    /// Pick a format from a file extension; anything but `.ron` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Json,
        }
    }

    /// File extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ron => "ron",
        }
    }

    /// Encode a record
    pub fn encode(self, record: &ProjectRecord) -> Result<String> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(record)?,
            Self::Ron => ron::ser::to_string_pretty(record, ron::ser::PrettyConfig::default())?,
        })
    }

    /// Decode a record
    pub fn decode(self, content: &str) -> Result<ProjectRecord> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Ron => ron::from_str(content)?,
        })
    }
}

/// Storage backend for project records.
///
/// Implementations must not touch the in-memory model; the engine only
/// hands them an exported record.
pub trait ProjectStore {
    /// Persist a record, replacing any previous version
    fn save(&self, record: &ProjectRecord) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a record by project id
    fn load(&self, id: ProjectId) -> impl Future<Output = Result<ProjectRecord>> + Send;
}

/// One file per project under a root directory
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
    format: StoreFormat,
}

impl FileProjectStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>, format: StoreFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the given project
    pub fn path_for(&self, id: ProjectId) -> PathBuf {
        self.root.join(format!("{id}.{}", self.format.extension()))
    }

    /// Read a record from an explicit path, choosing the format by extension
    pub async fn read_path(path: &Path) -> Result<ProjectRecord> {
        let content = tokio::fs::read_to_string(path).await?;
        StoreFormat::from_path(path).decode(&content)
    }

    /// Write a record to an explicit path, choosing the format by extension
    pub async fn write_path(path: &Path, record: &ProjectRecord) -> Result<()> {
        let content = StoreFormat::from_path(path).encode(record)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

impl ProjectStore for FileProjectStore {
    async fn save(&self, record: &ProjectRecord) -> Result<()> {
        let content = self.format.encode(record)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(record.id);
        tokio::fs::write(&path, content).await?;
        tracing::debug!(path = %path.display(), "wrote project record");
        Ok(())
    }

    async fn load(&self, id: ProjectId) -> Result<ProjectRecord> {
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TimelineError::not_found(EntityKind::Project, id));
            }
            Err(e) => return Err(e.into()),
        };
        self.format.decode(&content)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    records: Mutex<HashMap<ProjectId, ProjectRecord>>,
}

impl MemoryProjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Check if a project is stored
    pub fn contains(&self, id: ProjectId) -> bool {
        self.records.lock().contains_key(&id)
    }
}

impl ProjectStore for MemoryProjectStore {
    async fn save(&self, record: &ProjectRecord) -> Result<()> {
        self.records.lock().insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: ProjectId) -> Result<ProjectRecord> {
        self.records
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| TimelineError::not_found(EntityKind::Project, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::keyframe::KeyframeDraft;
    use crate::marker::MarkerDraft;
    use crate::track::{LayerDraft, TrackDraft};

    fn sample() -> Project {
        let mut project = Project::new("Demo", 30.0, 25.0, Resolution::new(1280, 720));
        project.playback.seek(3.0, 30.0);
        project.view.set_zoom(2.0);
        let track = project.insert_track(Track::from_draft(TrackDraft::new("Main")));
        let layer = project
            .insert_layer(Layer::from_draft(LayerDraft::new("BG"), track, 0))
            .unwrap();
        let mut element = Element::from_draft(ElementDraft::new(ElementType::Text, 1.0, 4.0), layer);
        let property = element.property_or_insert("opacity");
        property.insert(Keyframe::from_draft(KeyframeDraft::new(2.0, 0.5)));
        property.insert(Keyframe::from_draft(KeyframeDraft::new(1.0, 0.0)));
        project.insert_element(element).unwrap();
        project.insert_marker(Marker::from_draft(MarkerDraft::new("Intro", 0.5).with_color("#ff0")));
        project.insert_marker(Marker::from_draft(MarkerDraft::new("Outro", 20.0)));
        project
    }

    #[test]
    fn test_record_roundtrip() {
        let project = sample();
        let restored = ProjectRecord::from_project(&project).into_project().unwrap();
        assert_eq!(restored, project);
    }

    #[test]
    fn test_json_shape() {
        let record = ProjectRecord::from_project(&sample());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["loop"], false);
        assert_eq!(json["resolution"]["width"], 1280);
        let element = &json["tracks"][0]["layers"][0]["elements"][0];
        assert_eq!(element["type"], "text");
        assert_eq!(element["endTime"], 5.0);
        assert_eq!(element["scaleX"], 1.0);
        assert!(json["markers"][1].get("color").is_none());
        assert_eq!(json["markers"][0]["color"], "#ff0");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut record = ProjectRecord::from_project(&sample());
        let copy = record.tracks[0].clone();
        record.tracks.push(copy);
        let err = record.into_project().unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRecord(_)));
    }

    #[test]
    fn test_load_repairs() {
        let mut record = ProjectRecord::from_project(&sample());
        let element = &mut record.tracks[0].layers[0].elements[0];
        element.layer_id = LayerId::new();
        element.end_time = 99.0;
        element.properties[0].keyframes.reverse();
        record.markers.reverse();

        let project = record.into_project().unwrap();
        let element = project.all_elements().next().unwrap();
        assert_eq!(element.end_time(), 5.0);
        assert_eq!(element.layer_id, project.all_layers().next().unwrap().id);
        assert!(element.properties[0].is_sorted());
        assert_eq!(project.markers()[0].name, "Intro");
    }

    #[test]
    fn test_non_finite_record_rejected() {
        let mut record = ProjectRecord::from_project(&sample());
        record.tracks[0].layers[0].elements[0].rotation = f32::NAN;
        let err = record.into_project().unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
    }

    #[tokio::test]
    async fn test_file_store_json_and_ron() {
        let dir = std::env::temp_dir().join(format!("studio-timeline-{}", uuid::Uuid::new_v4()));
        let project = sample();
        let record = ProjectRecord::from_project(&project);

        for format in [StoreFormat::Json, StoreFormat::Ron] {
            let store = FileProjectStore::new(&dir, format);
            store.save(&record).await.unwrap();
            assert!(store.path_for(project.id).exists());
            let loaded = store.load(project.id).await.unwrap();
            assert_eq!(loaded.into_project().unwrap(), project);
        }

        let missing = FileProjectStore::new(&dir, StoreFormat::Json)
            .load(ProjectId::new())
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryProjectStore::new();
        let record = ProjectRecord::from_project(&sample());
        store.save(&record).await.unwrap();
        assert!(store.contains(record.id));
        assert_eq!(store.load(record.id).await.unwrap(), record);
        assert!(store.load(ProjectId::new()).await.is_err());
    }
}
