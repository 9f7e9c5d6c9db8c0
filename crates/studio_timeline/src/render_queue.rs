// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render job bookkeeping.
//!
//! The engine never encodes anything. An external render pipeline reads the
//! job descriptors, reports progress through `update`, and observes
//! cancellation by polling the status.

use crate::error::{EntityKind, Result, TimelineError};
use crate::ids::RenderJobId;
use crate::project::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a render job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    /// Waiting for the pipeline
    #[default]
    Queued,
    /// Being encoded
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled by the user
    Cancelled,
}

impl RenderStatus {
    /// Whether the job can no longer change
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Get the display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output description handed to the render pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    /// Container format (e.g. `mp4`)
    pub format: String,
    /// Encoder quality hint
    pub quality: String,
    /// Output resolution
    pub resolution: Resolution,
    /// Output frame rate
    pub fps: f64,
    /// Destination path
    pub output_path: String,
    /// Time range to render; `None` renders the whole project
    pub range: Option<(f64, f64)>,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            quality: "high".to_string(),
            resolution: Resolution::default(),
            fps: 30.0,
            output_path: String::new(),
            range: None,
        }
    }
}

/// A queued render request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    /// Unique job ID
    pub id: RenderJobId,
    /// What to render
    pub spec: RenderSpec,
    /// Current status
    pub status: RenderStatus,
    /// Progress percentage in `[0, 100]`
    pub progress: f64,
    /// Failure reason reported by the pipeline
    pub error: Option<String>,
    /// Enqueue time (unix ms)
    pub created_at: u64,
}

/// Field-level update reported by the render pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderJobPatch {
    /// New status
    pub status: Option<RenderStatus>,
    /// New progress (clamped)
    pub progress: Option<f64>,
    /// Failure reason
    pub error: Option<String>,
}

/// Ordered job list with at most one current job
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    jobs: Vec<RenderJob>,
    current: Option<RenderJobId>,
}

impl RenderQueue {
    /// Enqueue a job; it becomes current when no job is current
    pub fn enqueue(&mut self, spec: RenderSpec, now: u64) -> RenderJobId {
        let id = RenderJobId::new();
        self.jobs.push(RenderJob {
            id,
            spec,
            status: RenderStatus::Queued,
            progress: 0.0,
            error: None,
            created_at: now,
        });
        if self.current.is_none() {
            self.current = Some(id);
        }
        id
    }

    /// Merge a patch into a job. Terminal jobs reject status changes.
    pub fn update(&mut self, id: RenderJobId, patch: RenderJobPatch) -> Result<&RenderJob> {
        let index = self.index_of(id)?;
        let job = &mut self.jobs[index];

        if let Some(status) = patch.status {
            if job.status.is_terminal() && status != job.status {
                return Err(TimelineError::InvalidState(format!(
                    "render job {id} is already {}",
                    job.status
                )));
            }
            job.status = status;
        }
        if let Some(progress) = patch.progress {
            if progress.is_finite() {
                job.progress = progress.clamp(0.0, 100.0);
            }
        }
        if patch.error.is_some() {
            job.error = patch.error;
        }

        self.advance();
        Ok(&self.jobs[index])
    }

    /// Cancel a job. Completed or failed jobs cannot be cancelled; a job
    /// that is already cancelled is left as is.
    pub fn cancel(&mut self, id: RenderJobId) -> Result<&RenderJob> {
        let index = self.index_of(id)?;
        let job = &mut self.jobs[index];
        match job.status {
            RenderStatus::Completed | RenderStatus::Failed => {
                return Err(TimelineError::InvalidState(format!(
                    "cannot cancel render job {id}: already {}",
                    job.status
                )));
            }
            RenderStatus::Cancelled => {
                tracing::warn!(job = %id, "render job already cancelled");
            }
            RenderStatus::Queued | RenderStatus::Processing => {
                job.status = RenderStatus::Cancelled;
            }
        }
        self.advance();
        Ok(&self.jobs[index])
    }

    /// Drop every job
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.current = None;
    }

    /// Get a job
    pub fn get(&self, id: RenderJobId) -> Option<&RenderJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// The job the pipeline should work on
    pub fn current(&self) -> Option<&RenderJob> {
        self.current.and_then(|id| self.get(id))
    }

    /// Jobs in enqueue order
    pub fn jobs(&self) -> &[RenderJob] {
        &self.jobs
    }

    /// Number of jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn index_of(&self, id: RenderJobId) -> Result<usize> {
        self.jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| TimelineError::not_found(EntityKind::RenderJob, id))
    }

    /// Move `current` to the next queued job once the current one is done
    fn advance(&mut self) {
        let finished = self.current().map_or(true, |j| j.status.is_terminal());
        if finished {
            self.current = self
                .jobs
                .iter()
                .find(|j| j.status == RenderStatus::Queued)
                .map(|j| j.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: RenderStatus) -> RenderJobPatch {
        RenderJobPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_job_is_current() {
        let mut queue = RenderQueue::default();
        let a = queue.enqueue(RenderSpec::default(), 0);
        let _b = queue.enqueue(RenderSpec::default(), 0);
        assert_eq!(queue.current().unwrap().id, a);
        assert_eq!(queue.get(a).unwrap().progress, 0.0);
    }

    #[test]
    fn test_cancel_completed_rejected() {
        let mut queue = RenderQueue::default();
        let id = queue.enqueue(RenderSpec::default(), 0);
        queue.update(id, status(RenderStatus::Completed)).unwrap();
        let err = queue.cancel(id).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(queue.get(id).unwrap().status, RenderStatus::Completed);
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let mut queue = RenderQueue::default();
        let id = queue.enqueue(RenderSpec::default(), 0);
        queue.cancel(id).unwrap();
        assert_eq!(queue.cancel(id).unwrap().status, RenderStatus::Cancelled);
    }

    #[test]
    fn test_advance_on_terminal() {
        let mut queue = RenderQueue::default();
        let a = queue.enqueue(RenderSpec::default(), 0);
        let b = queue.enqueue(RenderSpec::default(), 0);
        queue.update(a, status(RenderStatus::Processing)).unwrap();
        assert_eq!(queue.current().unwrap().id, a);
        queue.update(a, status(RenderStatus::Failed)).unwrap();
        assert_eq!(queue.current().unwrap().id, b);
        queue.cancel(b).unwrap();
        assert!(queue.current().is_none());

        let c = queue.enqueue(RenderSpec::default(), 0);
        assert_eq!(queue.current().unwrap().id, c);
    }

    #[test]
    fn test_progress_clamped() {
        let mut queue = RenderQueue::default();
        let id = queue.enqueue(RenderSpec::default(), 0);
        let job = queue
            .update(
                id,
                RenderJobPatch {
                    progress: Some(140.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(job.progress, 100.0);
        assert!(queue.update(RenderJobId::new(), RenderJobPatch::default()).is_err());
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
    }
}
