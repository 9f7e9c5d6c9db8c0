// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline engine for a non-linear video/animation editor.
//!
//! This crate provides the in-memory model and operation set behind the
//! editor timeline:
//! - Tracks, layers and time-positioned elements
//! - Keyframed element properties with easing
//! - Markers
//! - Selection, clipboard and drag state
//! - Snapshot-based undo/redo history
//! - Playback transport and view state
//! - Collaborator presence and render job bookkeeping
//! - JSON/RON persistence
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A flat id-indexed arena ([`Project`]) with parent-id links
//! - Atomic mutations that record bincode snapshots in a [`HistoryLedger`]
//! - A callback registry for change notifications ([`TimelineEvent`])
//! - An async [`ProjectStore`] seam for storage backends

pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod ids;
pub mod keyframe;
pub mod marker;
pub mod persistence;
pub mod playback;
pub mod presence;
pub mod project;
pub mod property;
pub mod render_queue;
pub mod selection;
pub mod track;

pub use config::EngineConfig;
pub use element::{Element, ElementDraft, ElementPatch, ElementType, Transform};
pub use engine::TimelineEngine;
pub use error::{EntityKind, Result, TimelineError};
pub use events::{EventCallback, TimelineEvent};
pub use history::{HistoryAction, HistoryEntry, HistoryLedger, HistoryStats, StateSnapshot};
pub use ids::{
    ElementId, HistoryEntryId, KeyframeId, LayerId, MarkerId, ProjectId, RenderJobId,
    SubscriptionId, TrackId,
};
pub use keyframe::{
    Easing, Interpolation, InterpolationMode, Keyframe, KeyframeDraft, KeyframePatch,
    KeyframeValue,
};
pub use marker::{Marker, MarkerDraft, MarkerPatch};
pub use persistence::{
    FileProjectStore, MemoryProjectStore, ProjectRecord, ProjectStore, StoreFormat,
};
pub use playback::{PlaybackSettings, ViewSettings, MAX_ZOOM, MIN_ZOOM};
pub use presence::{Collaborator, RemoteCursor};
pub use project::{Cascade, Project, ProjectPatch, Resolution};
pub use property::Property;
pub use render_queue::{RenderJob, RenderJobPatch, RenderQueue, RenderSpec, RenderStatus};
pub use selection::{Clipboard, DragData, KeyframeRef, Selection};
pub use track::{Layer, LayerDraft, LayerPatch, Track, TrackDraft, TrackPatch};
