// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline engine.
//!
//! A [`TimelineEngine`] owns the live [`Project`] together with the transient
//! editing state around it (selection, clipboard, drag, history, presence and
//! the render queue). It is an ordinary value owned by its caller; embedders
//! observe it through [`TimelineEngine::subscribe`].
//!
//! Every document mutation goes through `commit`, which edits a clone of the
//! project and swaps it in only on success. A failed operation therefore never
//! leaves a half-applied hierarchy behind, and every successful one appends
//! exactly one history entry.

mod animation;
mod editing;
mod external;
mod hierarchy;
mod transport;

use crate::config::EngineConfig;
use crate::error::{ensure_finite, Result, TimelineError};
use crate::events::{Observers, TimelineEvent};
use crate::history::{HistoryAction, HistoryEntry, HistoryLedger, StateSnapshot};
use crate::ids::{ProjectId, SubscriptionId};
use crate::playback::{PlaybackSettings, ViewSettings};
use crate::presence::Presence;
use crate::project::{unix_millis, Project, ProjectPatch};
use crate::render_queue::RenderQueue;
use crate::selection::{Clipboard, DragData, Selection};

/// Outcome of a document mutation: its return value plus what to record
pub(crate) struct Edit<T> {
    value: T,
    action: HistoryAction,
    description: String,
}

impl<T> Edit<T> {
    pub(crate) fn new(value: T, action: HistoryAction, description: impl Into<String>) -> Self {
        Self {
            value,
            action,
            description: description.into(),
        }
    }
}

/// Timeline editing engine
#[derive(Debug)]
pub struct TimelineEngine {
    config: EngineConfig,
    project: Option<Project>,
    is_playing: bool,
    selection: Selection,
    clipboard: Clipboard,
    drag: Option<DragData>,
    history: HistoryLedger,
    presence: Presence,
    render_queue: RenderQueue,
    observers: Observers,
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineEngine {
    /// Create an engine with the default configuration and no project
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with a custom configuration and no project
    pub fn with_config(config: EngineConfig) -> Self {
        let config = config.normalized();
        Self {
            history: HistoryLedger::with_capacity(config.history_capacity),
            config,
            project: None,
            is_playing: false,
            selection: Selection::new(),
            clipboard: Clipboard::default(),
            drag: None,
            presence: Presence::default(),
            render_queue: RenderQueue::default(),
            observers: Observers::default(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live project, if any
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Whether a project is loaded
    pub fn is_project_loaded(&self) -> bool {
        self.project.is_some()
    }

    pub(crate) fn live(&self) -> Result<&Project> {
        self.project.as_ref().ok_or(TimelineError::NoProject)
    }

    pub(crate) fn live_mut(&mut self) -> Result<&mut Project> {
        self.project.as_mut().ok_or(TimelineError::NoProject)
    }

    // ---- events ----

    /// Register a change callback
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&TimelineEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    /// Remove a change callback; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, event: TimelineEvent) {
        self.observers.emit(&event);
    }

    fn emit_history(&mut self) {
        self.emit(TimelineEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    // ---- project lifecycle ----

    /// Start a fresh project using the configured defaults
    pub fn new_project(&mut self, name: impl Into<String>, duration: Option<f64>) -> Result<ProjectId> {
        let duration = ensure_finite("duration", duration.unwrap_or(self.config.default_duration))?;
        if duration < 0.0 {
            return Err(TimelineError::InvalidRange(format!(
                "duration must not be negative, got {duration}"
            )));
        }
        let project = Project::new(
            name,
            duration,
            self.config.default_fps,
            self.config.default_resolution,
        );
        let id = project.id;
        tracing::info!(project = %id, name = %project.name, duration, "created new project");
        self.replace_project(Some(project));
        Ok(id)
    }

    /// Make `project` the live project. History, selection and drag state
    /// are reset; the clipboard survives.
    pub fn load_project(&mut self, mut project: Project) -> Result<()> {
        project.validate()?;
        let time = project.playback.current_time;
        project.playback.seek(time, project.duration);
        tracing::info!(project = %project.id, name = %project.name, "loaded project");
        self.replace_project(Some(project));
        Ok(())
    }

    /// Replace the live project with a deep copy carrying fresh ids
    pub fn duplicate_project(&mut self) -> Result<ProjectId> {
        let source = self.live()?;
        let copy = source.duplicate(format!("{} (Copy)", source.name), unix_millis());
        let id = copy.id;
        tracing::info!(source = %source.id, project = %id, "duplicated project");
        self.replace_project(Some(copy));
        Ok(id)
    }

    /// Unload the live project
    pub fn close_project(&mut self) -> Option<Project> {
        let project = self.project.take();
        if let Some(p) = &project {
            tracing::info!(project = %p.id, "closed project");
            self.replace_project(None);
        }
        project
    }

    fn replace_project(&mut self, project: Option<Project>) {
        let project_id = project.as_ref().map(|p| p.id);
        self.project = project;
        self.is_playing = false;
        self.history.clear();
        self.selection.clear();
        self.drag = None;
        self.emit(TimelineEvent::ProjectLoaded { project_id });
        self.emit(TimelineEvent::SelectionChanged);
        self.emit_history();
    }

    /// Change project metadata
    pub fn update_project(&mut self, patch: ProjectPatch) -> Result<()> {
        if let Some(duration) = patch.duration {
            if ensure_finite("duration", duration)? < 0.0 {
                return Err(TimelineError::InvalidRange(format!(
                    "duration must not be negative, got {duration}"
                )));
            }
        }
        if let Some(fps) = patch.fps {
            if ensure_finite("fps", fps)? <= 0.0 {
                return Err(TimelineError::InvalidRange(format!("fps must be positive, got {fps}")));
            }
        }
        self.commit(|project| {
            project.apply_patch(&patch);
            Ok(Edit::new((), HistoryAction::UpdateProject, "Updated project settings"))
        })
    }

    // ---- mutation protocol ----

    /// Apply a document mutation atomically and record it
    pub(crate) fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Project) -> Result<Edit<T>>,
    ) -> Result<T> {
        let current = self.live()?;
        let mut draft = current.clone();
        let Edit {
            value,
            action,
            description,
        } = mutate(&mut draft)?;

        let now = unix_millis();
        draft.touch(now);
        let before = StateSnapshot::from_value(current)?;
        let after = StateSnapshot::from_value(&draft)?;
        let tag = action.tag();
        let revision = draft.revision;

        let entry = self.history.record(
            action,
            description,
            self.config.actor_id.clone(),
            now,
            before,
            after,
        );
        tracing::debug!(
            action = tag,
            sequence = entry.sequence,
            revision,
            "{}",
            entry.description
        );

        self.project = Some(draft);
        self.after_document_change(tag, revision);
        Ok(value)
    }

    fn after_document_change(&mut self, action: &'static str, revision: u64) {
        if self.prune_transient() {
            self.emit(TimelineEvent::SelectionChanged);
        }
        self.emit(TimelineEvent::ProjectChanged { action, revision });
        self.emit_history();
    }

    /// Drop selection and drag references to entities that no longer exist
    fn prune_transient(&mut self) -> bool {
        let Some(project) = self.project.as_ref() else {
            return false;
        };
        if let Some(drag) = self.drag.as_mut() {
            drag.element_ids.retain(|id| project.element(*id).is_some());
        }
        self.selection.retain_existing(project)
    }

    // ---- history ----

    /// Restore the document to its state before the entry at the cursor
    pub fn undo(&mut self) -> Result<()> {
        let current = self.live()?;
        let keep = (current.playback, current.view, current.revision);
        let description = self.history.undo_description().map(str::to_owned);
        let restored: Project = self.history.undo()?;
        tracing::debug!(description = ?description, "undo");
        self.restore(restored, keep, "undo");
        Ok(())
    }

    /// Reapply the entry after the cursor
    pub fn redo(&mut self) -> Result<()> {
        let current = self.live()?;
        let keep = (current.playback, current.view, current.revision);
        let description = self.history.redo_description().map(str::to_owned);
        let restored: Project = self.history.redo()?;
        tracing::debug!(description = ?description, "redo");
        self.restore(restored, keep, "redo");
        Ok(())
    }

    fn restore(
        &mut self,
        mut project: Project,
        (playback, view, revision): (PlaybackSettings, ViewSettings, u64),
        action: &'static str,
    ) {
        project.playback = playback;
        project.view = view;
        let time = project.playback.current_time;
        project.playback.seek(time, project.duration);
        project.revision = revision;
        project.touch(unix_millis());
        let revision = project.revision;
        self.project = Some(project);
        self.after_document_change(action, revision);
    }

    /// Forget all history
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.emit_history();
    }

    /// The history ledger
    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// History entries oldest first
    pub fn history_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.entries()
    }

    /// Index of the last applied history entry
    pub fn history_cursor(&self) -> Option<usize> {
        self.history.cursor()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Description of the entry `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    /// Description of the entry `redo` would reapply
    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }
}
