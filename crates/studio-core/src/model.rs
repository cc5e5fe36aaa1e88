//! The editor's internal project model.
//!
//! A project is a flat list of layers plus a flat list of keyframes. Layers
//! refer to their parent and keyframes to their layer by id only; lookups go
//! through an id index, so removing a layer is a filter over both lists.

use crate::interpolate;
use crate::path;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Two keyframe times closer than this are the same time.
pub const TIME_EPSILON: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Layer already exists: {id}")]
    DuplicateLayer { id: String },

    #[error("Layer not found: {id}")]
    UnknownLayer { id: String },

    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: f64 },

    #[error("Unknown animatable property: {name}")]
    UnknownProperty { name: String },
}

/// Properties that can carry keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimProperty {
    X,
    Y,
    Rotation,
    ScaleX,
    ScaleY,
    Opacity,
    Fill,
    Stroke,
    StrokeWidth,
}

impl AnimProperty {
    pub const ALL: [AnimProperty; 9] = [
        AnimProperty::X,
        AnimProperty::Y,
        AnimProperty::Rotation,
        AnimProperty::ScaleX,
        AnimProperty::ScaleY,
        AnimProperty::Opacity,
        AnimProperty::Fill,
        AnimProperty::Stroke,
        AnimProperty::StrokeWidth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimProperty::X => "x",
            AnimProperty::Y => "y",
            AnimProperty::Rotation => "rotation",
            AnimProperty::ScaleX => "scaleX",
            AnimProperty::ScaleY => "scaleY",
            AnimProperty::Opacity => "opacity",
            AnimProperty::Fill => "fill",
            AnimProperty::Stroke => "stroke",
            AnimProperty::StrokeWidth => "strokeWidth",
        }
    }

    pub fn is_color(self) -> bool {
        matches!(self, AnimProperty::Fill | AnimProperty::Stroke)
    }
}

impl fmt::Display for AnimProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimProperty {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimProperty::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownProperty {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Hold,
    Custom,
}

/// One side of an easing segment, one entry per value dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TangentAxis {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Out (`o`) and in (`i`) control points of one easing segment in
/// normalized space. Time components live in [0, 1]; value components may
/// overshoot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BezierTangents {
    pub o: TangentAxis,
    pub i: TangentAxis,
}

impl BezierTangents {
    pub fn new(o: (f64, f64), i: (f64, f64)) -> Self {
        BezierTangents {
            o: TangentAxis {
                x: vec![o.0],
                y: vec![o.1],
            },
            i: TangentAxis {
                x: vec![i.0],
                y: vec![i.1],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframeValue {
    Number(f64),
    Color(String),
}

impl KeyframeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            KeyframeValue::Number(n) => Some(*n),
            KeyframeValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<&str> {
        match self {
            KeyframeValue::Color(c) => Some(c),
            KeyframeValue::Number(_) => None,
        }
    }
}

impl fmt::Display for KeyframeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyframeValue::Number(n) => write!(f, "{n}"),
            KeyframeValue::Color(c) => f.write_str(c),
        }
    }
}

impl From<f64> for KeyframeValue {
    fn from(v: f64) -> Self {
        KeyframeValue::Number(v)
    }
}

impl From<&str> for KeyframeValue {
    fn from(v: &str) -> Self {
        KeyframeValue::Color(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub id: String,
    pub layer_id: String,
    pub property: AnimProperty,
    /// Seconds from the start of the project.
    pub time: f64,
    pub value: KeyframeValue,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing_bezier: Option<BezierTangents>,
}

impl Keyframe {
    pub fn new(
        id: impl Into<String>,
        layer_id: impl Into<String>,
        property: AnimProperty,
        time: f64,
        value: impl Into<KeyframeValue>,
    ) -> Self {
        Keyframe {
            id: id.into(),
            layer_id: layer_id.into(),
            property,
            time,
            value: value.into(),
            easing: Easing::Linear,
            easing_bezier: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        if easing != Easing::Custom {
            self.easing_bezier = None;
        }
        self
    }

    pub fn with_bezier(mut self, tangents: BezierTangents) -> Self {
        self.easing = Easing::Custom;
        self.easing_bezier = Some(tangents);
        self
    }
}

/// Static transform: the value at time 0 when nothing is animated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Style {
    pub fn stroke_width_or_default(&self) -> f64 {
        self.stroke_width.unwrap_or(1.0)
    }

    pub fn opacity_or_default(&self) -> f64 {
        self.opacity.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        rx: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Path {
        d: String,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
    Polyline {
        points: Vec<[f64; 2]>,
    },
    Group {
        children: Vec<Element>,
    },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Rect { .. } => "rect",
            Geometry::Circle { .. } => "circle",
            Geometry::Ellipse { .. } => "ellipse",
            Geometry::Path { .. } => "path",
            Geometry::Polygon { .. } => "polygon",
            Geometry::Polyline { .. } => "polyline",
            Geometry::Group { .. } => "group",
        }
    }

    /// Bounding box in element space. Group children are offset by their
    /// own static translation. `None` for empty paths and empty groups.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Geometry::Rect {
                x,
                y,
                width,
                height,
                ..
            } => Some(Rect::new(*x, *y, x + width, y + height)),
            Geometry::Circle { cx, cy, r } => Some(Rect::new(cx - r, cy - r, cx + r, cy + r)),
            Geometry::Ellipse { cx, cy, rx, ry } => {
                Some(Rect::new(cx - rx, cy - ry, cx + rx, cy + ry))
            }
            Geometry::Path { d } => path::bounds(&path::parse_subpaths(d)),
            Geometry::Polygon { points } => path::bounds(&[path::polyline(points, true)]),
            Geometry::Polyline { points } => path::bounds(&[path::polyline(points, false)]),
            Geometry::Group { children } => children
                .iter()
                .filter_map(|child| {
                    let offset = Vec2::new(child.transform.x, child.transform.y);
                    child.geometry.bounds().map(|r| r + offset)
                })
                .reduce(|a, b| a.union(b)),
        }
    }

    /// Center of [`Geometry::bounds`], or the origin when there are none.
    pub fn center(&self) -> [f64; 2] {
        self.bounds()
            .map(|r| {
                let c = r.center();
                [c.x, c.y]
            })
            .unwrap_or([0.0, 0.0])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub style: Style,
}

impl Element {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        let id = id.into();
        Element {
            name: id.clone(),
            id,
            geometry,
            transform: Transform::default(),
            style: Style::default(),
        }
    }

    /// The non-animated value of `property`.
    pub fn static_value(&self, property: AnimProperty) -> KeyframeValue {
        let t = &self.transform;
        match property {
            AnimProperty::X => KeyframeValue::Number(t.x),
            AnimProperty::Y => KeyframeValue::Number(t.y),
            AnimProperty::Rotation => KeyframeValue::Number(t.rotation),
            AnimProperty::ScaleX => KeyframeValue::Number(t.scale_x),
            AnimProperty::ScaleY => KeyframeValue::Number(t.scale_y),
            AnimProperty::Opacity => KeyframeValue::Number(self.style.opacity_or_default()),
            AnimProperty::StrokeWidth => {
                KeyframeValue::Number(self.style.stroke_width_or_default())
            }
            AnimProperty::Fill => {
                KeyframeValue::Color(self.style.fill.clone().unwrap_or_else(|| "none".into()))
            }
            AnimProperty::Stroke => {
                KeyframeValue::Color(self.style.stroke.clone().unwrap_or_else(|| "none".into()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub element: Element,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, element: Element) -> Self {
        let id = id.into();
        Layer {
            name: element.name.clone(),
            id,
            element,
            visible: true,
            locked: false,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: f64,
        duration: f64,
    ) -> Result<Self, ModelError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ModelError::InvalidFrameRate { fps });
        }
        Ok(Project {
            name: name.into(),
            width,
            height,
            fps,
            duration: duration.max(0.0),
            layers: Vec::new(),
            keyframes: Vec::new(),
        })
    }

    /// Map from layer id to its position in `layers`.
    pub fn layer_index(&self) -> HashMap<&str, usize> {
        self.layers
            .iter()
            .enumerate()
            .map(|(idx, layer)| (layer.id.as_str(), idx))
            .collect()
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        let idx = *self.layer_index().get(id)?;
        self.layers.get(idx)
    }

    /// Check the invariants `new` and `add_layer` enforce, for projects that
    /// were deserialized rather than built.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ModelError::InvalidFrameRate { fps: self.fps });
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(ModelError::DuplicateLayer {
                    id: layer.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn add_layer(&mut self, layer: Layer) -> Result<(), ModelError> {
        if self.layer(&layer.id).is_some() {
            return Err(ModelError::DuplicateLayer { id: layer.id });
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Insert `keyframe`, replacing the keyframe of the same layer and
    /// property at the same time if there is one.
    pub fn upsert_keyframe(&mut self, keyframe: Keyframe) -> Result<(), ModelError> {
        if self.layer(&keyframe.layer_id).is_none() {
            return Err(ModelError::UnknownLayer {
                id: keyframe.layer_id,
            });
        }

        let existing = self.keyframes.iter().position(|k| {
            k.layer_id == keyframe.layer_id
                && k.property == keyframe.property
                && (k.time - keyframe.time).abs() < TIME_EPSILON
        });
        match existing {
            Some(idx) => self.keyframes[idx] = keyframe,
            None => self.keyframes.push(keyframe),
        }
        Ok(())
    }

    pub fn remove_keyframe(&mut self, id: &str) -> Option<Keyframe> {
        let idx = self.keyframes.iter().position(|k| k.id == id)?;
        Some(self.keyframes.remove(idx))
    }

    /// Remove a layer, every layer parented (directly or transitively) to it,
    /// and all of their keyframes. Returns the removed layer ids.
    pub fn remove_layer(&mut self, id: &str) -> Vec<String> {
        if self.layer(id).is_none() {
            return Vec::new();
        }

        let mut doomed: HashSet<String> = HashSet::new();
        doomed.insert(id.to_string());
        loop {
            let before = doomed.len();
            for layer in &self.layers {
                if let Some(parent) = &layer.parent_id {
                    if doomed.contains(parent) {
                        doomed.insert(layer.id.clone());
                    }
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        let removed: Vec<String> = self
            .layers
            .iter()
            .filter(|l| doomed.contains(&l.id))
            .map(|l| l.id.clone())
            .collect();
        self.layers.retain(|l| !doomed.contains(&l.id));
        self.keyframes.retain(|k| !doomed.contains(&k.layer_id));
        removed
    }

    /// Keyframes of one property on one layer, sorted by time.
    pub fn track(&self, layer_id: &str, property: AnimProperty) -> Vec<&Keyframe> {
        let mut track: Vec<&Keyframe> = self
            .keyframes
            .iter()
            .filter(|k| k.layer_id == layer_id && k.property == property)
            .collect();
        interpolate::sort_by_time(&mut track);
        track
    }

    /// Value of `property` on `layer_id` at `time` seconds, falling back to
    /// the element's static value when the property has no keyframes.
    pub fn sample(
        &self,
        layer_id: &str,
        property: AnimProperty,
        time: f64,
    ) -> Option<KeyframeValue> {
        let layer = self.layer(layer_id)?;
        let track = self.track(layer_id, property);
        if track.is_empty() {
            return Some(layer.element.static_value(property));
        }
        Some(if property.is_color() {
            KeyframeValue::Color(interpolate::color_at(&track, time))
        } else {
            KeyframeValue::Number(interpolate::value_at(&track, time))
        })
    }

    fn sample_number(&self, layer_id: &str, property: AnimProperty, time: f64) -> Option<f64> {
        self.sample(layer_id, property, time)?.as_number()
    }

    /// The layer's transform with animated values applied at `time`.
    pub fn evaluated_transform(&self, layer_id: &str, time: f64) -> Option<Transform> {
        let base = self.layer(layer_id)?.element.transform;
        Some(Transform {
            x: self.sample_number(layer_id, AnimProperty::X, time).unwrap_or(base.x),
            y: self.sample_number(layer_id, AnimProperty::Y, time).unwrap_or(base.y),
            scale_x: self
                .sample_number(layer_id, AnimProperty::ScaleX, time)
                .unwrap_or(base.scale_x),
            scale_y: self
                .sample_number(layer_id, AnimProperty::ScaleY, time)
                .unwrap_or(base.scale_y),
            rotation: self
                .sample_number(layer_id, AnimProperty::Rotation, time)
                .unwrap_or(base.rotation),
        })
    }

    /// The layer's style with animated values applied at `time`.
    pub fn evaluated_style(&self, layer_id: &str, time: f64) -> Option<Style> {
        let base = &self.layer(layer_id)?.element.style;
        let color = |property: AnimProperty, fallback: &Option<String>| {
            if self.track(layer_id, property).is_empty() {
                fallback.clone()
            } else {
                self.sample(layer_id, property, time)
                    .and_then(|v| v.as_color().map(str::to_string))
            }
        };
        let number = |property: AnimProperty, fallback: Option<f64>| {
            if self.track(layer_id, property).is_empty() {
                fallback
            } else {
                self.sample_number(layer_id, property, time)
            }
        };
        Some(Style {
            fill: color(AnimProperty::Fill, &base.fill),
            stroke: color(AnimProperty::Stroke, &base.stroke),
            stroke_width: number(AnimProperty::StrokeWidth, base.stroke_width),
            opacity: number(AnimProperty::Opacity, base.opacity),
        })
    }
}
