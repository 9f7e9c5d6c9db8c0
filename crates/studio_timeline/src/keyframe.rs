// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and interpolation primitives.

use crate::error::{ensure_finite, Result};
use crate::ids::KeyframeId;
use serde::{Deserialize, Serialize};

/// Easing applied to the progress between a keyframe and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant speed
    #[default]
    Linear,
    /// Slow start
    EaseIn,
    /// Slow end
    EaseOut,
    /// Slow start and end
    EaseInOut,
    /// Hold the value until the next keyframe
    Step,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::Step => 0.0,
        }
    }
}

/// Interpolation mode between a keyframe and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Constant (hold)
    Constant,
    /// Linear interpolation
    #[default]
    Linear,
    /// Hermite smoothing on top of the easing curve
    Smooth,
}

/// Value stored in a keyframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyframeValue {
    /// Scalar value (opacity, rotation, volume...)
    Number(f32),
    /// 2D vector (position, scale)
    Vec2([f32; 2]),
    /// Color (RGBA)
    Color([f32; 4]),
    /// Boolean
    Bool(bool),
    /// Text
    Text(String),
}

impl KeyframeValue {
    /// Blend towards `other` by `t`. Non-numeric or mismatched values hold `self`.
    pub fn blend(&self, other: &KeyframeValue, t: f32) -> KeyframeValue {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Self::Number(Interpolation::lerp(*a, *b, t)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(Interpolation::lerp_vec2(*a, *b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(Interpolation::lerp_vec4(*a, *b, t)),
            _ => self.clone(),
        }
    }

    /// Get as number if possible
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Reject NaN and infinite numeric components
    pub fn ensure_finite(&self) -> Result<()> {
        let components: &[f32] = match self {
            Self::Number(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v,
            Self::Color(v) => v,
            Self::Bool(_) | Self::Text(_) => &[],
        };
        for value in components {
            ensure_finite("keyframe value", f64::from(*value))?;
        }
        Ok(())
    }
}

impl From<f32> for KeyframeValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

/// A keyframe inside a property. `time` is relative to the owning element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Time in seconds from the element start
    pub time: f64,
    /// Value at this keyframe
    pub value: KeyframeValue,
    /// Easing towards the next keyframe
    #[serde(default)]
    pub easing: Easing,
    /// Interpolation mode towards the next keyframe
    #[serde(default)]
    pub interpolation: InterpolationMode,
}

impl Keyframe {
    /// Create a keyframe with a fresh id from a draft
    pub fn from_draft(draft: KeyframeDraft) -> Self {
        Self {
            id: KeyframeId::new(),
            time: draft.time.max(0.0),
            value: draft.value,
            easing: draft.easing,
            interpolation: draft.interpolation,
        }
    }

    /// Progress-shaped blend factor for a point `t` of the way to the next keyframe,
    /// or `None` when this keyframe holds its value
    pub fn shape_progress(&self, t: f32) -> Option<f32> {
        if self.interpolation == InterpolationMode::Constant || self.easing == Easing::Step {
            return None;
        }
        let eased = self.easing.apply(t);
        Some(match self.interpolation {
            InterpolationMode::Smooth => Interpolation::hermite(0.0, 0.0, 1.0, 0.0, eased),
            _ => eased,
        })
    }
}

/// Keyframe contents supplied by the caller; the engine assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeDraft {
    /// Time in seconds from the element start
    pub time: f64,
    /// Value at this keyframe
    pub value: KeyframeValue,
    /// Easing towards the next keyframe
    pub easing: Easing,
    /// Interpolation mode towards the next keyframe
    pub interpolation: InterpolationMode,
}

impl KeyframeDraft {
    /// Create a linear keyframe draft
    pub fn new(time: f64, value: impl Into<KeyframeValue>) -> Self {
        Self {
            time,
            value: value.into(),
            easing: Easing::Linear,
            interpolation: InterpolationMode::Linear,
        }
    }

    /// Set the easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the interpolation mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }
}

/// Field-level update of a keyframe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyframePatch {
    /// New time
    pub time: Option<f64>,
    /// New value
    pub value: Option<KeyframeValue>,
    /// New easing
    pub easing: Option<Easing>,
    /// New interpolation mode
    pub interpolation: Option<InterpolationMode>,
}

impl KeyframePatch {
    /// Apply the patch; returns whether the time changed
    pub fn apply(&self, keyframe: &mut Keyframe) -> bool {
        if let Some(value) = &self.value {
            keyframe.value = value.clone();
        }
        if let Some(easing) = self.easing {
            keyframe.easing = easing;
        }
        if let Some(mode) = self.interpolation {
            keyframe.interpolation = mode;
        }
        match self.time {
            Some(time) => {
                keyframe.time = time.max(0.0);
                true
            }
            None => false,
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Hermite spline interpolation
    pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Interpolate Vec2
    pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
        [Self::lerp(a[0], b[0], t), Self::lerp(a[1], b[1], t)]
    }

    /// Interpolate Vec4 / color
    pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }
}
