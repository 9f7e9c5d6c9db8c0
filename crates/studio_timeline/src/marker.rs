// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named points in time on the project.

use crate::ids::MarkerId;
use serde::{Deserialize, Serialize};

/// Time marker in the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique marker ID
    pub id: MarkerId,
    /// Marker name
    pub name: String,
    /// Absolute project time in seconds
    pub time: f64,
    /// Optional display color (e.g. `#ff8800`)
    pub color: Option<String>,
}

impl Marker {
    /// Create a marker with a fresh id
    pub fn from_draft(draft: MarkerDraft) -> Self {
        Self {
            id: MarkerId::new(),
            name: draft.name,
            time: draft.time.max(0.0),
            color: draft.color,
        }
    }
}

/// Marker contents supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDraft {
    /// Marker name
    pub name: String,
    /// Absolute project time in seconds
    pub time: f64,
    /// Optional display color
    pub color: Option<String>,
}

impl MarkerDraft {
    /// Create a marker draft without a color
    pub fn new(name: impl Into<String>, time: f64) -> Self {
        Self {
            name: name.into(),
            time,
            color: None,
        }
    }

    /// Set the color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Field-level update of a marker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPatch {
    /// New name
    pub name: Option<String>,
    /// New time
    pub time: Option<f64>,
    /// New color; `Some(None)` clears it
    pub color: Option<Option<String>>,
}

impl MarkerPatch {
    /// Apply the patch; returns whether the time changed
    pub fn apply(&self, marker: &mut Marker) -> bool {
        if let Some(name) = &self.name {
            marker.name = name.clone();
        }
        if let Some(color) = &self.color {
            marker.color = color.clone();
        }
        match self.time {
            Some(time) => {
                marker.time = time.max(0.0);
                true
            }
            None => false,
        }
    }
}

/// Sort markers ascending by time, keeping insertion order for ties
pub(crate) fn sort_markers(markers: &mut [Marker]) {
    markers.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_clears_color() {
        let mut marker = Marker::from_draft(MarkerDraft::new("Intro", 1.0).with_color("#fff"));
        let moved = MarkerPatch {
            color: Some(None),
            ..Default::default()
        }
        .apply(&mut marker);
        assert!(!moved);
        assert_eq!(marker.color, None);
    }

    #[test]
    fn test_sort_markers() {
        let mut markers = vec![
            Marker::from_draft(MarkerDraft::new("b", 2.0)),
            Marker::from_draft(MarkerDraft::new("a", 1.0)),
        ];
        sort_markers(&mut markers);
        assert_eq!(markers[0].name, "a");
    }
}
