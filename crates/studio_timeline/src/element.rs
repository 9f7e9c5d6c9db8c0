// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-positioned elements and their spatial transform.

use crate::error::{ensure_finite, Result};
use crate::ids::{ElementId, LayerId};
use crate::property::Property;
use serde::{Deserialize, Serialize};

/// Type of element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    /// Video clip
    Video,
    /// Audio clip
    Audio,
    /// Text block
    Text,
    /// Still image
    Image,
    /// Vector shape
    #[default]
    Shape,
    /// Transition between clips
    Transition,
    /// Effect applied to the layer below
    Effect,
    /// Talking avatar
    Avatar,
    /// Imported presentation slide
    PptxSlide,
}

impl ElementType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Shape => "Shape",
            Self::Transition => "Transition",
            Self::Effect => "Effect",
            Self::Avatar => "Avatar",
            Self::PptxSlide => "Slide",
        }
    }
}

/// Spatial transform of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
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
    /// Opacity in `[0, 1]`
    pub opacity: f32,
}

impl Transform {
    /// Reject NaN and infinite components
    pub fn ensure_finite(&self) -> Result<()> {
        for (what, value) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("opacity", self.opacity),
        ] {
            ensure_finite(what, f64::from(value))?;
        }
        Ok(())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
        }
    }
}

/// An element placed on a layer.
///
/// `end_time` is derived: it always equals `start_time + duration` and is only
/// written through [`Element::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique element ID
    pub id: ElementId,
    /// Element type
    pub element_type: ElementType,
    /// Display name
    pub name: String,
    /// Owning layer
    pub layer_id: LayerId,
    /// Start time in seconds
    pub start_time: f64,
    /// Duration in seconds
    pub duration: f64,
    end_time: f64,
    /// Spatial transform
    pub transform: Transform,
    /// Whether the element is locked
    pub locked: bool,
    /// Whether the element is visible
    pub visible: bool,
    /// Animated properties
    pub properties: Vec<Property>,
}

impl Element {
    /// Create an element with a fresh id on `layer_id`
    pub fn from_draft(draft: ElementDraft, layer_id: LayerId) -> Self {
        let mut element = Self {
            id: ElementId::new(),
            element_type: draft.element_type,
            name: draft.name,
            layer_id,
            start_time: draft.start_time,
            duration: draft.duration,
            end_time: 0.0,
            transform: draft.transform,
            locked: draft.locked,
            visible: draft.visible,
            properties: draft.properties,
        };
        element.normalize();
        element
    }

    /// End time in seconds
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Clamp timing to non-negative values and opacity into `[0, 1]`, then
    /// recompute `end_time`
    pub fn normalize(&mut self) {
        self.start_time = self.start_time.max(0.0);
        self.duration = self.duration.max(0.0);
        self.end_time = self.start_time + self.duration;
        self.transform.opacity = self.transform.opacity.clamp(0.0, 1.0);
    }

    /// Move the element so it starts at `start_time`
    pub fn set_start(&mut self, start_time: f64) {
        self.start_time = start_time;
        self.normalize();
    }

    /// Reject NaN and infinities in timing, transform and keyframes
    pub fn ensure_finite(&self) -> Result<()> {
        check_finite(self.start_time, self.duration, &self.transform, &self.properties)
    }

    /// Whether the element is active at `time` (`start <= time < end`)
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Get a property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Get a mutable property by name
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Get a property by name, creating it if missing
    pub fn property_or_insert(&mut self, name: &str) -> &mut Property {
        let index = match self.properties.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.properties.push(Property::new(name));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    /// Deep copy with a fresh element id and fresh keyframe ids
    pub fn duplicate(&self) -> Self {
        Self {
            id: ElementId::new(),
            properties: self.properties.iter().map(Property::with_fresh_ids).collect(),
            ..self.clone()
        }
    }
}

fn check_finite(
    start_time: f64,
    duration: f64,
    transform: &Transform,
    properties: &[Property],
) -> Result<()> {
    ensure_finite("start time", start_time)?;
    ensure_finite("duration", duration)?;
    transform.ensure_finite()?;
    properties.iter().try_for_each(Property::ensure_finite)
}

/// Element contents supplied by the caller; the engine assigns id and layer
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDraft {
    /// Element type
    pub element_type: ElementType,
    /// Display name
    pub name: String,
    /// Start time in seconds
    pub start_time: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Spatial transform
    pub transform: Transform,
    /// Whether the element is locked
    pub locked: bool,
    /// Whether the element is visible
    pub visible: bool,
    /// Initial properties
    pub properties: Vec<Property>,
}

impl Default for ElementDraft {
    fn default() -> Self {
        Self {
            element_type: ElementType::default(),
            name: "Element".to_string(),
            start_time: 0.0,
            duration: 5.0,
            transform: Transform::default(),
            locked: false,
            visible: true,
            properties: Vec::new(),
        }
    }
}

impl ElementDraft {
    /// Create a draft of the given type and timing
    pub fn new(element_type: ElementType, start_time: f64, duration: f64) -> Self {
        Self {
            element_type,
            name: element_type.name().to_string(),
            start_time,
            duration,
            ..Default::default()
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Add an initial property
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Reject NaN and infinities in timing, transform and keyframes
    pub fn ensure_finite(&self) -> Result<()> {
        check_finite(self.start_time, self.duration, &self.transform, &self.properties)
    }
}

/// Field-level update of an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New type
    pub element_type: Option<ElementType>,
    /// New name
    pub name: Option<String>,
    /// New start time
    pub start_time: Option<f64>,
    /// New duration
    pub duration: Option<f64>,
    /// New X position
    pub x: Option<f32>,
    /// New Y position
    pub y: Option<f32>,
    /// New width
    pub width: Option<f32>,
    /// New height
    pub height: Option<f32>,
    /// New rotation
    pub rotation: Option<f32>,
    /// New horizontal scale
    pub scale_x: Option<f32>,
    /// New vertical scale
    pub scale_y: Option<f32>,
    /// New opacity
    pub opacity: Option<f32>,
    /// New lock flag
    pub locked: Option<bool>,
    /// New visibility flag
    pub visible: Option<bool>,
}

impl ElementPatch {
    /// Reject NaN and infinities among the supplied fields
    pub fn ensure_finite(&self) -> Result<()> {
        for (what, value) in [("start time", self.start_time), ("duration", self.duration)] {
            if let Some(value) = value {
                ensure_finite(what, value)?;
            }
        }
        for (what, value) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("opacity", self.opacity),
        ] {
            if let Some(value) = value {
                ensure_finite(what, f64::from(value))?;
            }
        }
        Ok(())
    }

    /// Apply the patch and renormalize the element
    pub fn apply(&self, element: &mut Element) {
        if let Some(element_type) = self.element_type {
            element.element_type = element_type;
        }
        if let Some(name) = &self.name {
            element.name = name.clone();
        }

        let t = &mut element.transform;
        for (slot, value) in [
            (&mut t.x, self.x),
            (&mut t.y, self.y),
            (&mut t.width, self.width),
            (&mut t.height, self.height),
            (&mut t.rotation, self.rotation),
            (&mut t.scale_x, self.scale_x),
            (&mut t.scale_y, self.scale_y),
            (&mut t.opacity, self.opacity),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(visible) = self.visible {
            element.visible = visible;
        }

        element.start_time = self.start_time.unwrap_or(element.start_time);
        element.duration = self.duration.unwrap_or(element.duration);
        element.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{Keyframe, KeyframeDraft};

    #[test]
    fn test_end_time_derived() {
        let el = Element::from_draft(ElementDraft::new(ElementType::Video, 2.0, 3.5), LayerId::new());
        assert_eq!(el.end_time(), 5.5);
    }

    #[test]
    fn test_negative_timing_clamped() {
        let el = Element::from_draft(ElementDraft::new(ElementType::Text, -1.0, -2.0), LayerId::new());
        assert_eq!(el.start_time, 0.0);
        assert_eq!(el.duration, 0.0);
        assert_eq!(el.end_time(), 0.0);
    }

    #[test]
    fn test_patch_recomputes_end() {
        let mut el = Element::from_draft(ElementDraft::default(), LayerId::new());
        ElementPatch {
            start_time: Some(4.0),
            ..Default::default()
        }
        .apply(&mut el);
        assert_eq!(el.end_time(), 9.0);

        ElementPatch {
            duration: Some(1.0),
            opacity: Some(3.0),
            ..Default::default()
        }
        .apply(&mut el);
        assert_eq!(el.end_time(), 5.0);
        assert_eq!(el.transform.opacity, 1.0);
    }

    #[test]
    fn test_draft_opacity_clamped() {
        let draft = ElementDraft::new(ElementType::Video, 0.0, 5.0).with_transform(Transform {
            opacity: 1.5,
            ..Default::default()
        });
        let el = Element::from_draft(draft, LayerId::new());
        assert_eq!(el.transform.opacity, 1.0);
    }

    #[test]
    fn test_non_finite_fields_rejected() {
        let patch = ElementPatch {
            x: Some(f32::NAN),
            ..Default::default()
        };
        assert!(patch.ensure_finite().is_err());

        let draft = ElementDraft::default().with_transform(Transform {
            rotation: f32::INFINITY,
            ..Default::default()
        });
        assert!(draft.ensure_finite().is_err());
        assert!(ElementDraft::default().ensure_finite().is_ok());

        let property = Property::from_keyframes(
            "opacity",
            vec![Keyframe::from_draft(KeyframeDraft::new(0.0, f32::NAN))],
        );
        assert!(ElementDraft::default().with_property(property).ensure_finite().is_err());
    }

    #[test]
    fn test_contains_time_half_open() {
        let el = Element::from_draft(ElementDraft::new(ElementType::Audio, 1.0, 2.0), LayerId::new());
        assert!(!el.contains_time(0.5));
        assert!(el.contains_time(1.0));
        assert!(el.contains_time(2.9));
        assert!(!el.contains_time(3.0));
    }

    #[test]
    fn test_duplicate_fresh_ids() {
        let mut el = Element::from_draft(ElementDraft::default(), LayerId::new());
        el.property_or_insert("opacity")
            .insert(Keyframe::from_draft(KeyframeDraft::new(0.0, 1.0)));
        let copy = el.duplicate();
        assert_ne!(copy.id, el.id);
        assert_ne!(
            copy.properties[0].keyframes()[0].id,
            el.properties[0].keyframes()[0].id
        );
        assert_eq!(copy.end_time(), el.end_time());
    }

    #[test]
    fn test_property_or_insert_reuses() {
        let mut el = Element::from_draft(ElementDraft::default(), LayerId::new());
        el.property_or_insert("x");
        el.property_or_insert("x");
        assert_eq!(el.properties.len(), 1);
    }
}
