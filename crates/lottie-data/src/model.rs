use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    pub fr: f64,
    pub ip: f64,
    pub op: f64,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    #[serde(default)]
    pub ddd: u8,
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
    pub layers: Vec<Layer>,
}

/// Layer type codes as used by the `ty` field.
pub mod layer_type {
    pub const PRECOMP: u8 = 0;
    pub const SOLID: u8 = 1;
    pub const IMAGE: u8 = 2;
    pub const NULL: u8 = 3;
    pub const SHAPE: u8 = 4;
    pub const TEXT: u8 = 5;
    pub const AUDIO: u8 = 6;
    pub const VIDEO_PLACEHOLDER: u8 = 7;
    pub const IMAGE_SEQUENCE: u8 = 8;
    pub const VIDEO: u8 = 9;
    pub const IMAGE_PLACEHOLDER: u8 = 10;
    pub const GUIDE: u8 = 11;
    pub const ADJUSTMENT: u8 = 12;
    pub const CAMERA: u8 = 13;
    pub const LIGHT: u8 = 14;
    pub const DATA: u8 = 15;

    /// Human readable name of a layer type, used in import warnings.
    pub fn name(ty: u8) -> &'static str {
        match ty {
            PRECOMP => "Precomp",
            SOLID => "Solid",
            IMAGE => "Image",
            NULL => "Null",
            SHAPE => "Shape",
            TEXT => "Text",
            AUDIO => "Audio",
            VIDEO_PLACEHOLDER => "Video Placeholder",
            IMAGE_SEQUENCE => "Image Sequence",
            VIDEO => "Video",
            IMAGE_PLACEHOLDER => "Image Placeholder",
            GUIDE => "Guide",
            ADJUSTMENT => "Adjustment",
            CAMERA => "Camera",
            LIGHT => "Light",
            DATA => "Data",
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ind: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default)]
    pub ip: f64,
    #[serde(default)]
    pub op: f64,
    #[serde(default)]
    pub st: f64, // Start time
    #[serde(default = "default_one")]
    pub sr: f64, // Time stretch
    #[serde(default)]
    pub ddd: u8,
    #[serde(default)]
    pub ao: u8,
    #[serde(default)]
    pub bm: u8, // Blend mode: 0=Normal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<bool>, // Hidden - if true, layer should not be rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ks: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Shape>>, // Shape Layer
}

fn default_one() -> f64 {
    1.0
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "tr")]
    Transform(TransformShape),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub np: Option<u32>,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    pub p: Property<Vec<f64>>,
    pub s: Property<Vec<f64>>,
    #[serde(default)]
    pub r: Property<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    pub p: Property<Vec<f64>>,
    pub s: Property<Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    pub ks: Property<BezierPath>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    pub c: Property<Vec<f64>>,
    #[serde(default)]
    pub o: Property<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>, // Fill rule: 1=non-zero, 2=even-odd
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<String>,
    pub c: Property<Vec<f64>>,
    #[serde(default)]
    pub o: Property<f64>,
    #[serde(default)]
    pub w: Property<f64>,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default, skip_serializing_if = "PositionProperty::is_default")]
    pub p: PositionProperty,
    #[serde(default, skip_serializing_if = "Property::is_default")]
    pub a: Property<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Property::is_default")]
    pub s: Property<Vec<f64>>,
    #[serde(default, alias = "rz", skip_serializing_if = "Property::is_default")]
    pub r: Property<f64>,
    #[serde(default, skip_serializing_if = "Property::is_default")]
    pub o: Property<f64>,
}

impl Transform {
    /// The no-op transform every shape group has to carry.
    pub fn identity() -> Self {
        Transform {
            p: PositionProperty::Unified(Property::fixed(vec![0.0, 0.0])),
            a: Property::fixed(vec![0.0, 0.0]),
            s: Property::fixed(vec![100.0, 100.0]),
            r: Property::fixed(0.0),
            o: Property::fixed(100.0),
        }
    }
}

/// Position is either one 2D property or two separated scalar ones.
///
/// `Split` is listed first so that an object carrying `x`/`y` sub-properties
/// is never mistaken for a plain property with default fields.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Split {
        #[serde(default)]
        s: bool,
        x: Property<f64>,
        y: Property<f64>,
    },
    Unified(Property<Vec<f64>>),
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

impl PositionProperty {
    pub fn is_default(&self) -> bool {
        matches!(self, PositionProperty::Unified(prop) if prop.is_default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ix: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

impl<T> Property<T> {
    /// A non-animated property (`a: 0`).
    pub fn fixed(value: T) -> Self {
        Property {
            a: 0,
            k: Value::Static(value),
            ix: None,
            x: None,
        }
    }

    /// An animated property (`a: 1`).
    pub fn animated(keyframes: Vec<Keyframe<T>>) -> Self {
        Property {
            a: 1,
            k: Value::Animated(keyframes),
            ix: None,
            x: None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self.k, Value::Default)
    }

    pub fn is_animated(&self) -> bool {
        matches!(&self.k, Value::Animated(kfs) if !kfs.is_empty())
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        match &self.k {
            Value::Animated(kfs) => kfs,
            _ => &[],
        }
    }

    /// Static value, or the start value of the first keyframe.
    pub fn first_value(&self) -> Option<&T> {
        match &self.k {
            Value::Default => None,
            Value::Static(v) => Some(v),
            Value::Animated(kfs) => kfs.iter().find_map(|kf| kf.s.as_ref()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Default => serializer.serialize_none(),
            Value::Static(v) => v.serialize(serializer),
            Value::Animated(kfs) => kfs.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
            return Ok(Value::Animated(keyframes));
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned", serialize = "T: Serialize"))]
pub struct Keyframe<T> {
    pub t: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_keyframe_value",
        serialize_with = "serialize_keyframe_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub s: Option<T>,
    #[serde(
        default,
        deserialize_with = "deserialize_keyframe_value",
        serialize_with = "serialize_keyframe_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub e: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i: Option<BezierTangent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o: Option<BezierTangent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ti: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u8>,
}

impl<T> Keyframe<T> {
    /// A keyframe at frame `t` holding `s`, with no easing data yet.
    pub fn at(t: f64, s: T) -> Self {
        Keyframe {
            t,
            s: Some(s),
            e: None,
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.h == Some(1)
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

// Keyframe values are always written as arrays: scalars become `[v]` and
// shape keyframes become `[{..}]`, which is what Bodymovin emits.
fn serialize_keyframe_value<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let json = serde_json::to_value(value).map_err(serde::ser::Error::custom)?;
    match json {
        serde_json::Value::Array(_) | serde_json::Value::Null => json.serialize(serializer),
        other => [other].serialize(serializer),
    }
}

/// Bezier tangent control points for keyframe easing
/// Matches the JSON format: {"x": [0.48], "y": [1]}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BezierTangent {
    #[serde(deserialize_with = "deserialize_scalar_or_vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "deserialize_scalar_or_vec")]
    pub y: Vec<f64>,
}

impl BezierTangent {
    /// One tangent component per dimension of the animated value.
    pub fn uniform(x: f64, y: f64, dims: usize) -> Self {
        BezierTangent {
            x: vec![x; dims.max(1)],
            y: vec![y; dims.max(1)],
        }
    }
}

fn deserialize_scalar_or_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScalarOrVec {
        Scalar(f64),
        Vec(Vec<f64>),
    }

    Ok(match ScalarOrVec::deserialize(deserializer)? {
        ScalarOrVec::Scalar(v) => vec![v],
        ScalarOrVec::Vec(v) => v,
    })
}

pub type Vec2 = [f64; 2];

/// A single bezier path. `i`/`o` are tangent offsets relative to the vertex
/// at the same index, not absolute control points.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn static_and_animated_properties_are_detected() {
        let stat: Property<Vec<f64>> =
            serde_json::from_value(json!({ "a": 0, "k": [250, 250, 0] })).unwrap();
        assert!(!stat.is_animated());
        assert_eq!(stat.first_value(), Some(&vec![250.0, 250.0, 0.0]));

        let anim: Property<f64> = serde_json::from_value(json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [10], "e": [20], "i": { "x": [1], "y": [1] }, "o": { "x": [0], "y": [0] } },
                { "t": 30, "s": [20] }
            ]
        }))
        .unwrap();
        assert!(anim.is_animated());
        assert_eq!(anim.keyframes().len(), 2);
        assert_eq!(anim.first_value(), Some(&10.0));
        assert_eq!(anim.keyframes()[0].e, Some(20.0));
    }

    #[test]
    fn scalar_keyframe_values_serialize_as_arrays() {
        let mut kf = Keyframe::at(0.0, 45.0);
        kf.h = Some(1);
        let prop = Property::animated(vec![kf, Keyframe::at(30.0, 90.0)]);
        let out = serde_json::to_value(&prop).unwrap();
        assert_eq!(out["a"], json!(1));
        assert_eq!(out["k"][0]["s"], json!([45.0]));
        assert_eq!(out["k"][0]["h"], json!(1));
        assert!(out["k"][0].get("i").is_none());
        assert!(out["k"][0].get("e").is_none());
        assert_eq!(out["k"][1]["s"], json!([90.0]));
    }

    #[test]
    fn split_position_is_parsed() {
        let t: Transform = serde_json::from_value(json!({
            "p": { "s": true, "x": { "a": 0, "k": 12 }, "y": { "a": 0, "k": 34 } }
        }))
        .unwrap();
        match t.p {
            PositionProperty::Split { x, y, .. } => {
                assert_eq!(x.first_value(), Some(&12.0));
                assert_eq!(y.first_value(), Some(&34.0));
            }
            PositionProperty::Unified(_) => panic!("expected split position"),
        }
    }

    #[test]
    fn tangent_components_accept_scalars() {
        let t: BezierTangent = serde_json::from_value(json!({ "x": 0.42, "y": [0] })).unwrap();
        assert_eq!(t.x, vec![0.42]);
        assert_eq!(t.y, vec![0.0]);
    }

    #[test]
    fn unknown_shape_items_do_not_fail_the_layer() {
        let layer: Layer = serde_json::from_value(json!({
            "ty": 4,
            "shapes": [
                { "ty": "zz", "nm": "ZigZag" },
                { "ty": "el", "p": { "a": 0, "k": [0, 0] }, "s": { "a": 0, "k": [10, 10] } }
            ]
        }))
        .unwrap();
        let shapes = layer.shapes.unwrap();
        assert!(matches!(shapes[0], Shape::Unknown));
        assert!(matches!(shapes[1], Shape::Ellipse(_)));
        assert!(layer.ks.is_none());
    }

    #[test]
    fn identity_transform_serializes_every_channel() {
        let out = serde_json::to_value(Shape::Transform(TransformShape {
            t: Transform::identity(),
        }))
        .unwrap();
        assert_eq!(out["ty"], json!("tr"));
        assert_eq!(out["s"]["k"], json!([100.0, 100.0]));
        assert_eq!(out["o"]["k"], json!(100.0));
    }
}
