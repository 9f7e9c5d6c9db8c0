// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operations driven by collaborators outside the engine: collaboration
//! transport, render pipeline and persistence.

use super::TimelineEngine;
use crate::error::{ensure_finite, Result};
use crate::events::TimelineEvent;
use crate::ids::{ElementId, LayerId, ProjectId, RenderJobId};
use crate::persistence::{ProjectRecord, ProjectStore};
use crate::presence::{Collaborator, RemoteCursor};
use crate::project::unix_millis;
use crate::render_queue::{RenderJob, RenderJobPatch, RenderQueue, RenderSpec};

impl TimelineEngine {
    // ---- collaboration ----

    /// Whether collaboration is switched on
    pub fn is_collaboration_enabled(&self) -> bool {
        self.presence.is_enabled()
    }

    /// Switch collaboration on or off
    pub fn set_collaboration_enabled(&mut self, enabled: bool) {
        self.presence.set_enabled(enabled);
        self.emit(TimelineEvent::CollaboratorsChanged);
    }

    /// Register a collaborator; re-adding an id refreshes it. Returns
    /// whether the id was new.
    pub fn add_collaborator(&mut self, collaborator: Collaborator) -> bool {
        let added = self.presence.add(collaborator, unix_millis());
        self.emit(TimelineEvent::CollaboratorsChanged);
        added
    }

    /// Remove a collaborator
    pub fn remove_collaborator(&mut self, id: &str) -> Result<Collaborator> {
        let removed = self.presence.remove(id)?;
        self.emit(TimelineEvent::CollaboratorsChanged);
        Ok(removed)
    }

    /// Record a collaborator's cursor position
    pub fn update_collaborator_cursor(
        &mut self,
        id: &str,
        time: f64,
        layer_id: Option<LayerId>,
        element_id: Option<ElementId>,
    ) -> Result<()> {
        let time = ensure_finite("cursor time", time)?;
        let cursor = RemoteCursor {
            time,
            layer_id,
            element_id,
        };
        self.presence.update_cursor(id, cursor, unix_millis())?;
        self.emit(TimelineEvent::CollaboratorsChanged);
        Ok(())
    }

    /// Collaborators in join order
    pub fn collaborators(&self) -> impl Iterator<Item = &Collaborator> {
        self.presence.iter()
    }

    /// Get a collaborator
    pub fn collaborator(&self, id: &str) -> Option<&Collaborator> {
        self.presence.get(id)
    }

    // ---- render queue ----

    /// Queue a render request
    pub fn add_render_job(&mut self, spec: RenderSpec) -> RenderJobId {
        let id = self.render_queue.enqueue(spec, unix_millis());
        tracing::debug!(job = %id, "queued render job");
        self.emit(TimelineEvent::RenderQueueChanged { job: Some(id) });
        id
    }

    /// Apply a progress or status report from the render pipeline
    pub fn update_render_job(&mut self, id: RenderJobId, patch: RenderJobPatch) -> Result<()> {
        let job = self.render_queue.update(id, patch)?;
        tracing::debug!(job = %id, status = %job.status, progress = job.progress, "render job updated");
        self.emit(TimelineEvent::RenderQueueChanged { job: Some(id) });
        Ok(())
    }

    /// Cancel a job that has not finished
    pub fn cancel_render_job(&mut self, id: RenderJobId) -> Result<()> {
        self.render_queue.cancel(id)?;
        tracing::info!(job = %id, "cancelled render job");
        self.emit(TimelineEvent::RenderQueueChanged { job: Some(id) });
        Ok(())
    }

    /// Drop every render job. In-flight encodes are the pipeline's concern.
    pub fn clear_render_queue(&mut self) {
        self.render_queue.clear();
        self.emit(TimelineEvent::RenderQueueChanged { job: None });
    }

    /// The render queue
    pub fn render_queue(&self) -> &RenderQueue {
        &self.render_queue
    }

    /// The job the pipeline should work on
    pub fn current_render_job(&self) -> Option<&RenderJob> {
        self.render_queue.current()
    }

    // ---- persistence ----

    /// Capture the live project as a persistable record
    pub fn export_record(&self) -> Result<ProjectRecord> {
        Ok(ProjectRecord::from_project(self.live()?))
    }

    /// Replace the live project with one rebuilt from a record
    pub fn import_record(&mut self, record: ProjectRecord) -> Result<ProjectId> {
        let project = record.into_project()?;
        let id = project.id;
        self.load_project(project)?;
        Ok(id)
    }

    /// Write the live project to `store`. On failure the in-memory project
    /// is left exactly as it was.
    pub async fn save<S: ProjectStore>(&mut self, store: &S) -> Result<()> {
        let mut record = self.export_record()?;
        let now = unix_millis();
        record.updated_at = now;

        if let Err(e) = store.save(&record).await {
            tracing::error!(project = %record.id, error = %e, "failed to save project");
            return Err(e);
        }

        let project = self.live_mut()?;
        project.updated_at = now;
        tracing::info!(project = %project.id, name = %project.name, "saved project");
        Ok(())
    }

    /// Load a project from `store` and make it live
    pub async fn load<S: ProjectStore>(&mut self, store: &S, id: ProjectId) -> Result<ProjectId> {
        let record = store.load(id).await?;
        self.import_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementDraft, ElementType};
    use crate::error::TimelineError;
    use crate::keyframe::{KeyframeDraft, KeyframeValue};
    use crate::persistence::MemoryProjectStore;
    use crate::render_queue::RenderStatus;
    use crate::track::{LayerDraft, TrackDraft};
    use std::future::Future;

    struct FailingStore;

    impl ProjectStore for FailingStore {
        fn save(&self, _record: &ProjectRecord) -> impl Future<Output = Result<()>> + Send {
            async { Err(TimelineError::Io(std::io::Error::other("disk full"))) }
        }

        fn load(&self, id: ProjectId) -> impl Future<Output = Result<ProjectRecord>> + Send {
            async move {
                Err(TimelineError::not_found(crate::error::EntityKind::Project, id))
            }
        }
    }

    fn populated() -> TimelineEngine {
        let mut engine = TimelineEngine::new();
        engine.new_project("Saved", Some(20.0)).unwrap();
        let track = engine.add_track(TrackDraft::default()).unwrap();
        let layer = engine.add_layer(track, LayerDraft::default()).unwrap();
        let element = engine
            .add_element(layer, ElementDraft::new(ElementType::Avatar, 1.0, 3.0))
            .unwrap();
        engine
            .add_keyframe(element, "x", KeyframeDraft::new(0.5, KeyframeValue::Vec2([1.0, 2.0])))
            .unwrap();
        engine.set_volume(0.25).unwrap();
        engine
    }

    #[test]
    fn test_collaborators() {
        let mut engine = TimelineEngine::new();
        engine.set_collaboration_enabled(true);
        assert!(engine.is_collaboration_enabled());
        assert!(engine.add_collaborator(Collaborator::new("c1", "Ann", "#f00")));
        assert!(!engine.add_collaborator(Collaborator::new("c1", "Ann", "#f00")));
        assert_eq!(engine.collaborators().count(), 1);

        let layer = LayerId::new();
        engine
            .update_collaborator_cursor("c1", 3.5, Some(layer), None)
            .unwrap();
        let cursor = &engine.collaborator("c1").unwrap().cursor;
        assert_eq!(cursor.time, 3.5);
        assert_eq!(cursor.layer_id, Some(layer));

        assert!(engine
            .update_collaborator_cursor("ghost", 0.0, None, None)
            .unwrap_err()
            .is_not_found());
        engine.remove_collaborator("c1").unwrap();
        assert!(engine.remove_collaborator("c1").is_err());
    }

    #[test]
    fn test_render_jobs() {
        let mut engine = TimelineEngine::new();
        let id = engine.add_render_job(RenderSpec::default());
        assert_eq!(engine.current_render_job().unwrap().id, id);
        engine
            .update_render_job(
                id,
                RenderJobPatch {
                    status: Some(RenderStatus::Completed),
                    progress: Some(100.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(engine.cancel_render_job(id).unwrap_err().is_invalid_state());
        assert_eq!(
            engine.render_queue().get(id).unwrap().status,
            RenderStatus::Completed
        );
        assert!(!engine.can_undo());
        engine.clear_render_queue();
        assert!(engine.render_queue().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryProjectStore::new();
        let mut engine = populated();
        engine.save(&store).await.unwrap();
        let saved = engine.project().unwrap().clone();

        let mut other = TimelineEngine::new();
        other.load(&store, saved.id).await.unwrap();
        assert_eq!(other.project().unwrap(), &saved);
        assert!(!other.can_undo());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_model() {
        let mut engine = populated();
        let before = engine.project().unwrap().clone();
        assert!(engine.save(&FailingStore).await.is_err());
        assert_eq!(engine.project().unwrap(), &before);
        assert!(engine.load(&FailingStore, before.id).await.unwrap_err().is_not_found());
        assert_eq!(engine.project().unwrap(), &before);
    }

    #[test]
    fn test_export_without_project() {
        let engine = TimelineEngine::new();
        assert!(engine.export_record().unwrap_err().is_not_found());
    }
}
