// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe operations on element properties.

use super::{Edit, TimelineEngine};
use crate::error::{ensure_finite, EntityKind, Result, TimelineError};
use crate::history::HistoryAction;
use crate::ids::{ElementId, KeyframeId};
use crate::keyframe::{Keyframe, KeyframeDraft, KeyframePatch, KeyframeValue};
use crate::property::Property;

fn missing_property(element_id: ElementId, property: &str) -> TimelineError {
    TimelineError::not_found(EntityKind::Property, format!("{element_id}/{property}"))
}

impl TimelineEngine {
    /// Add a keyframe to a property, creating the property if needed
    pub fn add_keyframe(
        &mut self,
        element_id: ElementId,
        property: &str,
        draft: KeyframeDraft,
    ) -> Result<KeyframeId> {
        ensure_finite("keyframe time", draft.time)?;
        draft.value.ensure_finite()?;
        self.commit(|project| {
            let element = project.element_mut(element_id)?;
            let keyframe = Keyframe::from_draft(draft);
            let keyframe_id = keyframe.id;
            let time = keyframe.time;
            element.property_or_insert(property).insert(keyframe);
            Ok(Edit::new(
                keyframe_id,
                HistoryAction::AddKeyframe {
                    element_id,
                    property: property.to_string(),
                    keyframe_id,
                },
                format!("Added {property} keyframe at {time:.2}s"),
            ))
        })
    }

    /// Change a keyframe; the property is re-sorted if its time moved
    pub fn update_keyframe(
        &mut self,
        element_id: ElementId,
        property: &str,
        keyframe_id: KeyframeId,
        patch: KeyframePatch,
    ) -> Result<()> {
        if let Some(time) = patch.time {
            ensure_finite("keyframe time", time)?;
        }
        if let Some(value) = &patch.value {
            value.ensure_finite()?;
        }
        self.commit(|project| {
            project
                .element_mut(element_id)?
                .property_mut(property)
                .ok_or_else(|| missing_property(element_id, property))?
                .update(keyframe_id, &patch)
                .ok_or_else(|| TimelineError::not_found(EntityKind::Keyframe, keyframe_id))?;
            Ok(Edit::new(
                (),
                HistoryAction::UpdateKeyframe {
                    element_id,
                    property: property.to_string(),
                    keyframe_id,
                },
                format!("Updated {property} keyframe"),
            ))
        })
    }

    /// Remove a keyframe
    pub fn delete_keyframe(
        &mut self,
        element_id: ElementId,
        property: &str,
        keyframe_id: KeyframeId,
    ) -> Result<()> {
        self.commit(|project| {
            project
                .element_mut(element_id)?
                .property_mut(property)
                .ok_or_else(|| missing_property(element_id, property))?
                .remove(keyframe_id)
                .ok_or_else(|| TimelineError::not_found(EntityKind::Keyframe, keyframe_id))?;
            Ok(Edit::new(
                (),
                HistoryAction::DeleteKeyframe {
                    element_id,
                    property: property.to_string(),
                    keyframe_id,
                },
                format!("Deleted {property} keyframe"),
            ))
        })
    }

    /// Get a property of an element
    pub fn property(&self, element_id: ElementId, property: &str) -> Result<&Property> {
        self.element(element_id)?
            .property(property)
            .ok_or_else(|| missing_property(element_id, property))
    }

    /// Evaluate a property at `time` seconds from the element start.
    /// `None` when the property has no keyframes.
    pub fn property_value_at(
        &self,
        element_id: ElementId,
        property: &str,
        time: f64,
    ) -> Result<Option<KeyframeValue>> {
        Ok(self.property(element_id, property)?.evaluate(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementDraft;
    use crate::keyframe::Easing;
    use crate::track::{LayerDraft, TrackDraft};

    fn setup() -> (TimelineEngine, ElementId) {
        let mut engine = TimelineEngine::new();
        engine.new_project("Test", None).unwrap();
        let track = engine.add_track(TrackDraft::default()).unwrap();
        let layer = engine.add_layer(track, LayerDraft::default()).unwrap();
        let element = engine.add_element(layer, ElementDraft::default()).unwrap();
        (engine, element)
    }

    fn times(engine: &TimelineEngine, element: ElementId) -> Vec<f64> {
        engine
            .property(element, "opacity")
            .unwrap()
            .keyframes()
            .iter()
            .map(|k| k.time)
            .collect()
    }

    #[test]
    fn test_add_sorts() {
        let (mut engine, element) = setup();
        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(2.0, 0.5))
            .unwrap();
        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(1.0, 0.0))
            .unwrap();
        assert_eq!(times(&engine, element), vec![1.0, 2.0]);
    }

    #[test]
    fn test_update_resorts() {
        let (mut engine, element) = setup();
        let first = engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(1.0, 0.0))
            .unwrap();
        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(2.0, 1.0))
            .unwrap();
        engine
            .update_keyframe(
                element,
                "opacity",
                first,
                KeyframePatch {
                    time: Some(3.0),
                    easing: Some(Easing::EaseIn),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(times(&engine, element), vec![2.0, 3.0]);
    }

    #[test]
    fn test_missing_targets() {
        let (mut engine, element) = setup();
        let err = engine
            .delete_keyframe(element, "scale", KeyframeId::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TimelineError::NotFound {
                kind: EntityKind::Property,
                ..
            }
        ));

        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(0.0, 1.0))
            .unwrap();
        let err = engine
            .delete_keyframe(element, "opacity", KeyframeId::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TimelineError::NotFound {
                kind: EntityKind::Keyframe,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let (mut engine, element) = setup();
        let err = engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(0.0, f32::NAN))
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
        assert!(engine.property(element, "opacity").is_err());

        let id = engine
            .add_keyframe(element, "position", KeyframeDraft::new(0.0, KeyframeValue::Vec2([0.0, 0.0])))
            .unwrap();
        let history = engine.history().len();
        let err = engine
            .update_keyframe(
                element,
                "position",
                id,
                KeyframePatch {
                    value: Some(KeyframeValue::Vec2([f32::INFINITY, 0.0])),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidRange(_)));
        assert_eq!(engine.history().len(), history);
    }

    #[test]
    fn test_value_at() {
        let (mut engine, element) = setup();
        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(0.0, 0.0))
            .unwrap();
        engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(2.0, 1.0))
            .unwrap();
        let value = engine.property_value_at(element, "opacity", 1.0).unwrap();
        assert_eq!(value, Some(KeyframeValue::Number(0.5)));
        let held = engine.property_value_at(element, "opacity", 9.0).unwrap();
        assert_eq!(held, Some(KeyframeValue::Number(1.0)));
    }

    #[test]
    fn test_delete_keyframe_purges_selection() {
        let (mut engine, element) = setup();
        let id = engine
            .add_keyframe(element, "opacity", KeyframeDraft::new(0.0, 1.0))
            .unwrap();
        engine
            .select_keyframe(crate::selection::KeyframeRef::new(element, "opacity", id), false)
            .unwrap();
        assert_eq!(engine.selection().keyframes.len(), 1);
        engine.delete_keyframe(element, "opacity", id).unwrap();
        assert!(engine.selection().keyframes.is_empty());
    }
}
