// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications for embedders.

use crate::ids::{ProjectId, RenderJobId, SubscriptionId};
use std::fmt;

/// Something observable changed in the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A project was created, loaded or closed
    ProjectLoaded {
        /// The live project, `None` after close
        project_id: Option<ProjectId>,
    },
    /// The document was mutated (including undo/redo)
    ProjectChanged {
        /// Action tag of the mutation
        action: &'static str,
        /// Project revision after the mutation
        revision: u64,
    },
    /// Playhead, play state, volume or loop changed
    PlaybackChanged,
    /// Zoom or scroll changed
    ViewChanged,
    /// Selection changed
    SelectionChanged,
    /// Clipboard contents replaced
    ClipboardChanged {
        /// Elements now on the clipboard
        count: usize,
    },
    /// Undo/redo availability may have changed
    HistoryChanged {
        /// Whether undo is available
        can_undo: bool,
        /// Whether redo is available
        can_redo: bool,
    },
    /// Collaborator membership or cursors changed
    CollaboratorsChanged,
    /// A render job was added, updated or removed
    RenderQueueChanged {
        /// The affected job, `None` when the queue was cleared
        job: Option<RenderJobId>,
    },
    /// A drag gesture started or ended
    DragChanged,
}

/// Callback type for engine notifications
pub type EventCallback = Box<dyn FnMut(&TimelineEvent) + Send>;

/// Registered callbacks, fired in registration order
#[derive(Default)]
pub struct Observers {
    callbacks: Vec<(SubscriptionId, EventCallback)>,
}

impl Observers {
    /// Register a callback
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.callbacks.push((id, callback));
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    /// Deliver an event to every callback
    pub fn emit(&mut self, event: &TimelineEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::default();
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            observers.subscribe(Box::new(move |_| seen.lock().unwrap().push(tag)));
        }
        observers.emit(&TimelineEvent::ViewChanged);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut observers = Observers::default();
        let id = observers.subscribe(Box::new(|_| {}));
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        assert!(observers.is_empty());
    }
}
