// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable properties: a named, time-sorted list of keyframes.

use crate::error::{ensure_finite, Result};
use crate::ids::KeyframeId;
use crate::keyframe::{Keyframe, KeyframePatch, KeyframeValue};
use serde::{Deserialize, Serialize};

/// A named animatable attribute of an element.
///
/// Keyframes are kept sorted ascending by time after every mutation. The sort is
/// stable, so keyframes sharing a time keep their insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name (e.g. `opacity`)
    pub name: String,
    keyframes: Vec<Keyframe>,
}

impl Property {
    /// Create an empty property
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyframes: Vec::new(),
        }
    }

    /// Create a property from arbitrary keyframes, sorting them
    pub fn from_keyframes(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        let mut property = Self {
            name: name.into(),
            keyframes,
        };
        property.sort_keyframes();
        property
    }

    /// Add a keyframe
    pub fn insert(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
        self.sort_keyframes();
    }

    /// Remove a keyframe
    pub fn remove(&mut self, keyframe_id: KeyframeId) -> Option<Keyframe> {
        let index = self.keyframes.iter().position(|k| k.id == keyframe_id)?;
        Some(self.keyframes.remove(index))
    }

    /// Apply a patch to a keyframe; `None` if it does not exist
    pub fn update(&mut self, keyframe_id: KeyframeId, patch: &KeyframePatch) -> Option<()> {
        let keyframe = self.keyframes.iter_mut().find(|k| k.id == keyframe_id)?;
        if patch.apply(keyframe) {
            self.sort_keyframes();
        }
        Some(())
    }

    fn sort_keyframes(&mut self) {
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Get keyframe by ID
    pub fn keyframe(&self, keyframe_id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == keyframe_id)
    }

    /// Get all keyframes in time order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Whether keyframe times are non-decreasing
    pub fn is_sorted(&self) -> bool {
        self.keyframes.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Reject NaN and infinities in keyframe times and values
    pub fn ensure_finite(&self) -> Result<()> {
        for keyframe in &self.keyframes {
            ensure_finite("keyframe time", keyframe.time)?;
            keyframe.value.ensure_finite()?;
        }
        Ok(())
    }

    /// Evaluate the property at `time` (relative to the element start).
    ///
    /// Between two keyframes the leading keyframe's easing and interpolation mode
    /// shape the blend. Before the first or after the last keyframe the nearest
    /// value is held. When several keyframes share `time`, the last one wins.
    pub fn evaluate(&self, time: f64) -> Option<KeyframeValue> {
        let next_idx = self.keyframes.iter().position(|k| k.time > time);

        match next_idx {
            None => self.keyframes.last().map(|k| k.value.clone()),
            Some(0) => self.keyframes.first().map(|k| k.value.clone()),
            Some(idx) => {
                let a = &self.keyframes[idx - 1];
                let b = &self.keyframes[idx];
                let t = ((time - a.time) / (b.time - a.time)) as f32;
                match a.shape_progress(t) {
                    Some(progress) => Some(a.value.blend(&b.value, progress)),
                    None => Some(a.value.clone()),
                }
            }
        }
    }

    /// Deep copy with fresh keyframe ids
    pub fn with_fresh_ids(&self) -> Self {
        Self {
            name: self.name.clone(),
            keyframes: self
                .keyframes
                .iter()
                .map(|k| Keyframe {
                    id: KeyframeId::new(),
                    ..k.clone()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{Easing, InterpolationMode, KeyframeDraft};

    fn kf(time: f64, value: f32) -> Keyframe {
        Keyframe::from_draft(KeyframeDraft::new(time, value))
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut prop = Property::new("opacity");
        prop.insert(kf(2.0, 0.5));
        prop.insert(kf(1.0, 0.0));
        prop.insert(kf(3.0, 1.0));
        let times: Vec<f64> = prop.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
        assert!(prop.is_sorted());
    }

    #[test]
    fn test_update_resorts() {
        let mut prop = Property::new("x");
        let first = kf(1.0, 0.0);
        let first_id = first.id;
        prop.insert(first);
        prop.insert(kf(2.0, 1.0));

        let patch = KeyframePatch {
            time: Some(5.0),
            ..Default::default()
        };
        prop.update(first_id, &patch).unwrap();
        assert_eq!(prop.keyframes().last().unwrap().id, first_id);
        assert!(prop.is_sorted());
        assert!(prop.update(KeyframeId::new(), &patch).is_none());
    }

    #[test]
    fn test_evaluate_linear_and_hold() {
        let mut prop = Property::new("opacity");
        prop.insert(kf(1.0, 0.0));
        prop.insert(kf(3.0, 1.0));

        assert_eq!(prop.evaluate(0.0), Some(KeyframeValue::Number(0.0)));
        assert_eq!(prop.evaluate(2.0), Some(KeyframeValue::Number(0.5)));
        assert_eq!(prop.evaluate(10.0), Some(KeyframeValue::Number(1.0)));
        assert_eq!(Property::new("empty").evaluate(1.0), None);
    }

    #[test]
    fn test_evaluate_step_and_easing() {
        let mut prop = Property::new("opacity");
        prop.insert(Keyframe::from_draft(
            KeyframeDraft::new(0.0, 0.0).with_easing(Easing::Step),
        ));
        prop.insert(kf(2.0, 1.0));
        assert_eq!(prop.evaluate(1.9), Some(KeyframeValue::Number(0.0)));
        assert_eq!(prop.evaluate(2.0), Some(KeyframeValue::Number(1.0)));

        let mut eased = Property::new("opacity");
        eased.insert(Keyframe::from_draft(
            KeyframeDraft::new(0.0, 0.0).with_easing(Easing::EaseIn),
        ));
        eased.insert(kf(1.0, 1.0));
        assert_eq!(eased.evaluate(0.5), Some(KeyframeValue::Number(0.25)));

        let mut smooth = Property::new("opacity");
        smooth.insert(Keyframe::from_draft(
            KeyframeDraft::new(0.0, 0.0).with_interpolation(InterpolationMode::Smooth),
        ));
        smooth.insert(kf(1.0, 1.0));
        let v = smooth.evaluate(0.25).unwrap().as_number().unwrap();
        assert!(v < 0.25 && v > 0.0);
    }

    #[test]
    fn test_duplicate_times_later_wins() {
        let mut prop = Property::new("x");
        prop.insert(kf(1.0, 0.0));
        prop.insert(kf(1.0, 7.0));
        prop.insert(kf(2.0, 9.0));
        assert_eq!(prop.evaluate(1.0), Some(KeyframeValue::Number(7.0)));
    }

    #[test]
    fn test_fresh_ids() {
        let mut prop = Property::new("x");
        prop.insert(kf(1.0, 0.0));
        let copy = prop.with_fresh_ids();
        assert_ne!(copy.keyframes()[0].id, prop.keyframes()[0].id);
        assert_eq!(copy.keyframes()[0].time, 1.0);
    }
}
