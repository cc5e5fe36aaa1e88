//! Lottie to project conversion.
//!
//! Only shape layers are imported. Other layer types, and shape layers
//! without a transform, are skipped with a warning while the rest of the
//! document still imports.

use crate::error::ImportError;
use crate::export::preset_tangents;
use lottie_data::model::{
    self as lottie, layer_type, FillShape, LottieJson, PositionProperty, Property, Shape,
    StrokeShape,
};
use std::collections::HashMap;
use studio_core::model::{
    AnimProperty, BezierTangents, Easing, Element, Geometry, Keyframe, KeyframeValue, Layer,
    Project, Style, Transform,
};
use studio_core::{color, path, time};

/// Tangents this close to the diagonal ease linearly.
const IDENTITY_TOLERANCE: f64 = 0.01;
/// Per-component tolerance when matching tangents to a preset.
const PRESET_TOLERANCE: f64 = 0.05;
const REQUIRED_FIELDS: [&str; 6] = ["fr", "ip", "op", "w", "h", "layers"];

#[derive(Debug, Clone)]
pub struct ImportedProject {
    pub project: Project,
    /// One entry per skipped layer or dropped reference.
    pub warnings: Vec<String>,
}

pub fn import_str(text: &str) -> Result<ImportedProject, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    import_value(value)
}

/// Import a raw document. Layers are decoded one at a time, so a layer that
/// does not decode is skipped with a warning instead of failing the import.
pub fn import_value(mut value: serde_json::Value) -> Result<ImportedProject, ImportError> {
    for field in REQUIRED_FIELDS {
        if value.get(field).map_or(true, serde_json::Value::is_null) {
            return Err(ImportError::MissingField { field });
        }
    }
    let raw_layers = match value
        .as_object_mut()
        .and_then(|obj| obj.insert("layers".to_string(), serde_json::Value::Array(Vec::new())))
    {
        Some(serde_json::Value::Array(layers)) => layers,
        _ => {
            return Err(ImportError::InvalidField {
                field: "layers",
                reason: "expected an array".to_string(),
            })
        }
    };
    let doc: LottieJson = serde_json::from_value(value)?;

    let decoded: Vec<Result<lottie::Layer, String>> = raw_layers
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let label = raw
                .get("nm")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| format!("#{}", idx + 1), str::to_string);
            let ty = raw.get("ty").and_then(serde_json::Value::as_u64);
            serde_json::from_value(raw).map_err(|err| match ty {
                Some(ty) if ty != u64::from(layer_type::SHAPE) => {
                    unsupported_layer(&label, u8::try_from(ty).unwrap_or(u8::MAX))
                }
                _ => format!("Skipped layer \"{}\": {}", label, err),
            })
        })
        .collect();
    convert(&doc, decoded.iter().map(|layer| layer.as_ref().map_err(Clone::clone)))
}

fn unsupported_layer(label: &str, ty: u8) -> String {
    format!(
        "Skipped layer \"{}\": {} layers are not supported",
        label,
        layer_type::name(ty)
    )
}

/// Recover the easing label of the segment starting at `kf`, for tangent
/// component `dim`. Tangents that match no preset are kept as a custom
/// easing.
pub fn classify_easing<T>(
    kf: &lottie::Keyframe<T>,
    dim: usize,
) -> (Easing, Option<BezierTangents>) {
    if kf.is_hold() {
        return (Easing::Hold, None);
    }
    let (Some(o), Some(i)) = (&kf.o, &kf.i) else {
        return (Easing::Linear, None);
    };
    // Tangents with fewer components than the value apply to every axis.
    let component = |v: &[f64]| v.get(dim).or_else(|| v.first()).copied();
    let (Some(ox), Some(oy), Some(ix), Some(iy)) =
        (component(&o.x), component(&o.y), component(&i.x), component(&i.y))
    else {
        return (Easing::Linear, None);
    };

    if (ox - oy).abs() <= IDENTITY_TOLERANCE && (ix - iy).abs() <= IDENTITY_TOLERANCE {
        return (Easing::Linear, None);
    }

    let close = |a: f64, b: f64| (a - b).abs() <= PRESET_TOLERANCE;
    for preset in [Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
        if let Some(((pox, poy), (pix, piy))) = preset_tangents(preset) {
            if close(ox, pox) && close(oy, poy) && close(ix, pix) && close(iy, piy) {
                return (preset, None);
            }
        }
    }

    (Easing::Custom, Some(BezierTangents::new((ox, oy), (ix, iy))))
}

fn hex(channels: &[f64]) -> String {
    color::to_hex(color::from_normalized(channels))
}

/// Geometry and paint found by walking the shape tree.
#[derive(Default)]
struct ShapeScan<'a> {
    geometry: Option<Geometry>,
    fill: Option<&'a FillShape>,
    stroke: Option<&'a StrokeShape>,
}

impl<'a> ShapeScan<'a> {
    /// Depth-first, in item order. The first geometry wins, and so does the
    /// first fill and the first stroke.
    fn visit(&mut self, items: &'a [Shape]) {
        for item in items {
            match item {
                Shape::Group(group) => self.visit(&group.it),
                Shape::Rect(_) | Shape::Ellipse(_) | Shape::Path(_) if self.geometry.is_none() => {
                    self.geometry = geometry_of(item, items);
                }
                Shape::Fill(fill) if self.fill.is_none() => self.fill = Some(fill),
                Shape::Stroke(stroke) if self.stroke.is_none() => self.stroke = Some(stroke),
                _ => {}
            }
        }
    }
}

fn pair(prop: &Property<Vec<f64>>, default: [f64; 2]) -> [f64; 2] {
    match prop.first_value() {
        Some(v) => [
            v.first().copied().unwrap_or(default[0]),
            v.get(1).copied().unwrap_or(default[1]),
        ],
        None => default,
    }
}

/// Geometry of one item. A path item is joined with every other path item
/// among its siblings.
fn geometry_of(item: &Shape, siblings: &[Shape]) -> Option<Geometry> {
    match item {
        Shape::Rect(rect) => {
            let [cx, cy] = pair(&rect.p, [0.0, 0.0]);
            let [width, height] = pair(&rect.s, [0.0, 0.0]);
            Some(Geometry::Rect {
                x: cx - width / 2.0,
                y: cy - height / 2.0,
                width,
                height,
                rx: rect.r.first_value().copied().unwrap_or(0.0),
            })
        }
        Shape::Ellipse(ellipse) => {
            let [cx, cy] = pair(&ellipse.p, [0.0, 0.0]);
            let [w, h] = pair(&ellipse.s, [0.0, 0.0]);
            if (w - h).abs() < 1e-9 {
                Some(Geometry::Circle { cx, cy, r: w / 2.0 })
            } else {
                Some(Geometry::Ellipse {
                    cx,
                    cy,
                    rx: w / 2.0,
                    ry: h / 2.0,
                })
            }
        }
        Shape::Path(_) => {
            let paths: Vec<lottie::BezierPath> = siblings
                .iter()
                .filter_map(|item| match item {
                    Shape::Path(p) => p.ks.first_value().cloned(),
                    _ => None,
                })
                .collect();
            Some(Geometry::Path {
                d: path::to_path_string(&paths),
            })
        }
        _ => None,
    }
}

fn default_geometry() -> Geometry {
    Geometry::Circle {
        cx: 0.0,
        cy: 0.0,
        r: 50.0,
    }
}

/// Converts one document's keyframes into project keyframes for one layer.
struct TrackReader<'a> {
    layer_id: &'a str,
    ip: f64,
    fps: f64,
    counters: HashMap<AnimProperty, usize>,
    out: Vec<Keyframe>,
}

impl<'a> TrackReader<'a> {
    fn new(layer_id: &'a str, doc: &LottieJson) -> Self {
        TrackReader {
            layer_id,
            ip: doc.ip,
            fps: doc.fr,
            counters: HashMap::new(),
            out: Vec::new(),
        }
    }

    fn seconds(&self, frame: f64) -> f64 {
        time::frame_to_seconds(frame - self.ip, self.fps).max(0.0)
    }

    fn push(
        &mut self,
        property: AnimProperty,
        time: f64,
        value: KeyframeValue,
        easing: (Easing, Option<BezierTangents>),
    ) {
        let n = {
            let counter = self.counters.entry(property).or_insert(0);
            *counter += 1;
            *counter
        };
        let id = format!("{}-{}-{}", self.layer_id, property, n);
        let mut kf = Keyframe::new(id, self.layer_id, property, time, value).with_easing(easing.0);
        if let Some(tangents) = easing.1 {
            kf = kf.with_bezier(tangents);
        }
        self.out.push(kf);
    }

    /// Read every keyframe of `prop`. `convert` maps a wire value to the
    /// project properties it feeds, one per value component, and each takes
    /// the easing of its own tangent component. A keyframe without `s` takes
    /// the previous keyframe's `e`.
    fn read<T: Clone>(
        &mut self,
        prop: &Property<T>,
        convert: impl Fn(&T) -> Vec<(AnimProperty, KeyframeValue)>,
    ) {
        let keyframes = prop.keyframes();
        for (k, kf) in keyframes.iter().enumerate() {
            let start = kf
                .s
                .clone()
                .or_else(|| k.checked_sub(1).and_then(|prev| keyframes[prev].e.clone()));
            let Some(start) = start else {
                continue;
            };
            let time = self.seconds(kf.t);
            for (dim, (property, value)) in convert(&start).into_iter().enumerate() {
                self.push(property, time, value, classify_easing(kf, dim));
            }
        }
    }
}

/// Split a 2D wire value into two scalar properties as `v / scale - offset`.
fn split(
    v: &[f64],
    properties: (AnimProperty, AnimProperty),
    scale: f64,
    offset: [f64; 2],
) -> Vec<(AnimProperty, KeyframeValue)> {
    [(properties.0, 0), (properties.1, 1)]
        .into_iter()
        .filter_map(|(property, idx)| {
            v.get(idx)
                .map(|c| (property, KeyframeValue::Number(c / scale - offset[idx])))
        })
        .collect()
}

struct LayerImport {
    layer: Layer,
    keyframes: Vec<Keyframe>,
    ind: Option<u32>,
    parent: Option<u32>,
}

fn import_layer(
    doc: &LottieJson,
    src: &lottie::Layer,
    ks: &lottie::Transform,
    id: String,
) -> LayerImport {
    let mut reader = TrackReader::new(&id, doc);

    let anchor = pair(&ks.a, [0.0, 0.0]);
    let (x, y) = match &ks.p {
        PositionProperty::Unified(p) => {
            reader.read(p, |v| split(v, (AnimProperty::X, AnimProperty::Y), 1.0, anchor));
            let [px, py] = pair(p, [0.0, 0.0]);
            (px - anchor[0], py - anchor[1])
        }
        PositionProperty::Split { x, y, .. } => {
            reader.read(x, |v| vec![(AnimProperty::X, KeyframeValue::Number(v - anchor[0]))]);
            reader.read(y, |v| vec![(AnimProperty::Y, KeyframeValue::Number(v - anchor[1]))]);
            (
                x.first_value().copied().unwrap_or(0.0) - anchor[0],
                y.first_value().copied().unwrap_or(0.0) - anchor[1],
            )
        }
    };

    reader.read(&ks.s, |v| {
        split(v, (AnimProperty::ScaleX, AnimProperty::ScaleY), 100.0, [0.0, 0.0])
    });
    reader.read(&ks.r, |v| vec![(AnimProperty::Rotation, KeyframeValue::Number(*v))]);
    reader.read(&ks.o, |v| vec![(AnimProperty::Opacity, KeyframeValue::Number(v / 100.0))]);

    let [scale_x, scale_y] = pair(&ks.s, [100.0, 100.0]);
    let transform = Transform {
        x,
        y,
        scale_x: scale_x / 100.0,
        scale_y: scale_y / 100.0,
        rotation: ks.r.first_value().copied().unwrap_or(0.0),
    };

    let mut scan = ShapeScan::default();
    if let Some(shapes) = &src.shapes {
        scan.visit(shapes);
    }

    let mut style = Style {
        opacity: ks.o.first_value().map(|o| o / 100.0),
        ..Style::default()
    };
    if let Some(fill) = scan.fill {
        style.fill = fill.c.first_value().map(|c| hex(c));
        reader.read(&fill.c, |c| vec![(AnimProperty::Fill, KeyframeValue::Color(hex(c)))]);
    }
    if let Some(stroke) = scan.stroke {
        style.stroke = stroke.c.first_value().map(|c| hex(c));
        style.stroke_width = stroke.w.first_value().copied();
        reader.read(&stroke.c, |c| vec![(AnimProperty::Stroke, KeyframeValue::Color(hex(c)))]);
        reader.read(&stroke.w, |w| vec![(AnimProperty::StrokeWidth, KeyframeValue::Number(*w))]);
    }

    let name = src.nm.clone().unwrap_or_else(|| id.clone());
    let geometry = scan.geometry.unwrap_or_else(|| {
        tracing::debug!("Layer {} has no geometry, using a default circle", name);
        default_geometry()
    });
    let element = Element {
        id: format!("{id}-element"),
        name: name.clone(),
        geometry,
        transform,
        style,
    };

    let keyframes = reader.out;
    LayerImport {
        layer: Layer {
            id,
            name,
            element,
            visible: src.hd != Some(true),
            locked: false,
            parent_id: None,
        },
        keyframes,
        ind: src.ind,
        parent: src.parent,
    }
}

/// Convert a parsed document into a fresh project.
pub fn import_document(doc: &LottieJson) -> Result<ImportedProject, ImportError> {
    convert(doc, doc.layers.iter().map(Ok))
}

/// `layers` holds each document layer in order, or the warning explaining
/// why it could not be decoded.
fn convert<'a>(
    doc: &LottieJson,
    layers: impl Iterator<Item = Result<&'a lottie::Layer, String>>,
) -> Result<ImportedProject, ImportError> {
    if !(doc.fr.is_finite() && doc.fr > 0.0) {
        return Err(ImportError::InvalidField {
            field: "fr",
            reason: format!("frame rate must be positive, got {}", doc.fr),
        });
    }

    let duration = time::frame_to_seconds(doc.op - doc.ip, doc.fr).max(0.0);
    let name = doc.nm.clone().unwrap_or_else(|| "Imported".to_string());
    let mut project = Project::new(name, doc.w, doc.h, doc.fr, duration)?;
    let mut warnings = Vec::new();
    let mut imported = Vec::new();

    for (idx, src) in layers.enumerate() {
        let src = match src {
            Ok(src) => src,
            Err(warning) => {
                tracing::warn!("{}", warning);
                warnings.push(warning);
                continue;
            }
        };
        let label = src.nm.clone().unwrap_or_else(|| format!("#{}", idx + 1));
        if src.ty != layer_type::SHAPE {
            let warning = unsupported_layer(&label, src.ty);
            tracing::warn!("{}", warning);
            warnings.push(warning);
            continue;
        }
        let Some(ks) = &src.ks else {
            let warning = format!("Skipped layer \"{}\": missing transform", label);
            tracing::warn!("{}", warning);
            warnings.push(warning);
            continue;
        };
        let id = format!("layer-{}", imported.len() + 1);
        imported.push(import_layer(doc, src, ks, id));
    }

    let by_ind: HashMap<u32, String> = imported
        .iter()
        .filter_map(|l| Some((l.ind?, l.layer.id.clone())))
        .collect();

    for mut entry in imported {
        if let Some(parent) = entry.parent {
            match by_ind.get(&parent) {
                Some(parent_id) if *parent_id != entry.layer.id => {
                    entry.layer.parent_id = Some(parent_id.clone());
                }
                _ => {
                    let warning = format!(
                        "Layer \"{}\" references parent {} which was not imported",
                        entry.layer.name, parent
                    );
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
        project.add_layer(entry.layer)?;
        for kf in entry.keyframes {
            project.upsert_keyframe(kf)?;
        }
    }

    tracing::debug!(
        "Imported {} layers and {} keyframes with {} warnings",
        project.layers.len(),
        project.keyframes.len(),
        warnings.len()
    );

    Ok(ImportedProject { project, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(layers: serde_json::Value) -> serde_json::Value {
        json!({ "v": "5.7.4", "fr": 30, "ip": 0, "op": 60, "w": 200, "h": 100, "layers": layers })
    }

    fn shape_layer(ks: serde_json::Value, shapes: serde_json::Value) -> serde_json::Value {
        json!({ "ty": 4, "nm": "Shape", "ind": 1, "ip": 0, "op": 60, "st": 0, "ks": ks, "shapes": shapes })
    }

    #[test]
    fn missing_top_level_field_is_fatal() {
        let mut value = doc(json!([]));
        value.as_object_mut().unwrap().remove("fr");
        assert!(matches!(
            import_value(value),
            Err(ImportError::MissingField { field: "fr" })
        ));
        assert!(matches!(import_str("{ not json"), Err(ImportError::Malformed(_))));
    }

    #[test]
    fn non_positive_frame_rate_is_fatal() {
        let mut value = doc(json!([]));
        value["fr"] = json!(0);
        assert!(matches!(
            import_value(value),
            Err(ImportError::InvalidField { field: "fr", .. })
        ));
    }

    #[test]
    fn static_transform_undoes_anchor() {
        let value = doc(json!([shape_layer(
            json!({
                "p": { "a": 0, "k": [120, 60, 0] },
                "a": { "a": 0, "k": [20, 10, 0] },
                "s": { "a": 0, "k": [50, 200, 100] },
                "r": { "a": 0, "k": 45 },
                "o": { "a": 0, "k": 80 }
            }),
            json!([{ "ty": "gr", "it": [
                { "ty": "rc", "p": { "a": 0, "k": [20, 10] }, "s": { "a": 0, "k": [40, 20] }, "r": { "a": 0, "k": 4 } },
                { "ty": "fl", "c": { "a": 0, "k": [1, 0.5, 0, 1] }, "o": { "a": 0, "k": 100 } },
                { "ty": "tr" }
            ]}])
        )]));
        let imported = import_value(value).unwrap();
        assert!(imported.warnings.is_empty());
        let layer = &imported.project.layers[0];
        assert_eq!(layer.id, "layer-1");
        let t = layer.element.transform;
        assert_eq!((t.x, t.y), (100.0, 50.0));
        assert_eq!((t.scale_x, t.scale_y), (0.5, 2.0));
        assert_eq!(t.rotation, 45.0);
        assert_eq!(layer.element.style.opacity, Some(0.8));
        assert_eq!(layer.element.style.fill.as_deref(), Some("#ff8000"));
        assert_eq!(
            layer.element.geometry,
            Geometry::Rect { x: 0.0, y: 0.0, width: 40.0, height: 20.0, rx: 4.0 }
        );
        assert!(imported.project.keyframes.is_empty());
    }

    #[test]
    fn split_position_and_legacy_end_values() {
        let value = doc(json!([shape_layer(
            json!({
                "p": { "s": true,
                    "x": { "a": 1, "k": [
                        { "t": 0, "s": [10], "e": [50], "i": { "x": [0.58], "y": [1] }, "o": { "x": [0.42], "y": [0] } },
                        { "t": 30 }
                    ]},
                    "y": { "a": 0, "k": 5 }
                }
            }),
            json!([])
        )]));
        let imported = import_value(value).unwrap();
        let project = &imported.project;
        let xs = project.track("layer-1", AnimProperty::X);
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].easing, Easing::EaseInOut);
        assert_eq!(xs[1].value, KeyframeValue::Number(50.0));
        assert_eq!(xs[1].time, 1.0);
        assert_eq!(xs[0].id, "layer-1-x-1");
        assert_eq!(project.layers[0].element.transform.y, 5.0);
        assert_eq!(
            project.layers[0].element.geometry,
            Geometry::Circle { cx: 0.0, cy: 0.0, r: 50.0 }
        );
    }

    #[test]
    fn frames_are_relative_to_in_point() {
        let mut value = doc(json!([shape_layer(
            json!({ "r": { "a": 1, "k": [ { "t": 5, "s": [0], "h": 1 }, { "t": 25, "s": [90] } ] } }),
            json!([])
        )]));
        value["ip"] = json!(10);
        let imported = import_value(value).unwrap();
        let rs = imported.project.track("layer-1", AnimProperty::Rotation);
        assert_eq!(rs[0].time, 0.0);
        assert_eq!(rs[0].easing, Easing::Hold);
        assert!((rs[1].time - 0.5).abs() < 1e-12);
        assert!((imported.project.duration - 50.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn easing_classifier() {
        let kf = |o: (f64, f64), i: (f64, f64)| -> lottie::Keyframe<f64> {
            serde_json::from_value(json!({
                "t": 0, "s": [0],
                "o": { "x": [o.0], "y": [o.1] },
                "i": { "x": [i.0], "y": [i.1] }
            }))
            .unwrap()
        };
        assert_eq!(classify_easing(&kf((0.0, 0.0), (1.0, 1.0)), 0).0, Easing::Linear);
        assert_eq!(classify_easing(&kf((0.3, 0.3), (0.7, 0.7)), 0).0, Easing::Linear);
        assert_eq!(classify_easing(&kf((0.42, 0.0), (1.0, 1.0)), 0).0, Easing::EaseIn);
        assert_eq!(classify_easing(&kf((0.0, 0.0), (0.6, 1.0)), 0).0, Easing::EaseOut);
        assert_eq!(classify_easing(&kf((0.4, 0.03), (0.55, 0.98)), 0).0, Easing::EaseInOut);

        let (easing, tangents) = classify_easing(&kf((0.33, 0.0), (0.67, 1.0)), 0);
        assert_eq!(easing, Easing::Custom);
        assert_eq!(tangents, Some(BezierTangents::new((0.33, 0.0), (0.67, 1.0))));

        // A single tangent component covers every axis.
        assert_eq!(classify_easing(&kf((0.42, 0.0), (1.0, 1.0)), 1).0, Easing::EaseIn);

        let bare: lottie::Keyframe<f64> = serde_json::from_value(json!({ "t": 0, "s": [1] })).unwrap();
        assert_eq!(classify_easing(&bare, 0), (Easing::Linear, None));
    }

    #[test]
    fn tangent_components_classify_per_axis() {
        let kf: lottie::Keyframe<Vec<f64>> = serde_json::from_value(json!({
            "t": 0, "s": [0, 0],
            "o": { "x": [0, 0.42], "y": [0, 0] },
            "i": { "x": [1, 1], "y": [1, 1] }
        }))
        .unwrap();
        assert_eq!(classify_easing(&kf, 0), (Easing::Linear, None));
        assert_eq!(classify_easing(&kf, 1), (Easing::EaseIn, None));

        let custom: lottie::Keyframe<Vec<f64>> = serde_json::from_value(json!({
            "t": 0, "s": [0, 0],
            "o": { "x": [0.42, 0.2], "y": [0, 0.1] },
            "i": { "x": [0.58, 0.9], "y": [1, 0.6] }
        }))
        .unwrap();
        assert_eq!(classify_easing(&custom, 0).0, Easing::EaseInOut);
        assert_eq!(
            classify_easing(&custom, 1),
            (Easing::Custom, Some(BezierTangents::new((0.2, 0.1), (0.9, 0.6))))
        );
    }

    #[test]
    fn undecodable_layers_are_skipped() {
        let mut broken = shape_layer(
            json!({}),
            json!([{ "ty": "fl", "o": { "a": 0, "k": 100 } }]),
        );
        broken["nm"] = json!("Broken");
        let text = json!({ "ty": 5, "nm": "Title", "ks": { "p": "bogus" } });
        let value = doc(json!([shape_layer(json!({}), json!([])), broken, text]));

        let imported = import_value(value).unwrap();
        assert_eq!(imported.project.layers.len(), 1);
        assert_eq!(imported.warnings.len(), 2);
        assert!(imported.warnings[0].contains("Broken"));
        assert!(imported.warnings[0].contains("`c`"));
        assert!(imported.warnings[1].contains("Text"));
    }

    #[test]
    fn nested_groups_and_path_joining() {
        let square = json!({ "c": true, "v": [[0, 0], [10, 0], [10, 10]], "i": [[0, 0], [0, 0], [0, 0]], "o": [[0, 0], [0, 0], [0, 0]] });
        let line = json!({ "c": false, "v": [[20, 20], [30, 20]], "i": [[0, 0], [0, 0]], "o": [[0, 0], [0, 0]] });
        let value = doc(json!([shape_layer(
            json!({}),
            json!([
                { "ty": "st", "c": { "a": 0, "k": [0, 0, 1] }, "o": { "a": 0, "k": 100 }, "w": { "a": 0, "k": 4 } },
                { "ty": "gr", "it": [
                    { "ty": "gr", "it": [
                        { "ty": "sh", "ks": { "a": 0, "k": square } },
                        { "ty": "sh", "ks": { "a": 0, "k": line } },
                        { "ty": "fl", "c": { "a": 0, "k": [0, 1, 0] } }
                    ]},
                    { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0] } }
                ]}
            ])
        )]));
        let imported = import_value(value).unwrap();
        let element = &imported.project.layers[0].element;
        assert_eq!(
            element.geometry,
            Geometry::Path { d: "M 0 0 L 10 0 L 10 10 Z M 20 20 L 30 20".into() }
        );
        assert_eq!(element.style.stroke.as_deref(), Some("#0000ff"));
        assert_eq!(element.style.stroke_width, Some(4.0));
        // The outer group's fill is listed after the nested group, so the
        // nested fill is found first.
        assert_eq!(element.style.fill.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn equal_axis_ellipse_is_a_circle() {
        let value = doc(json!([shape_layer(
            json!({}),
            json!([
                { "ty": "el", "p": { "a": 0, "k": [5, 5] }, "s": { "a": 0, "k": [10, 10] } },
                { "ty": "el", "p": { "a": 0, "k": [0, 0] }, "s": { "a": 0, "k": [4, 8] } }
            ])
        )]));
        let imported = import_value(value).unwrap();
        assert_eq!(
            imported.project.layers[0].element.geometry,
            Geometry::Circle { cx: 5.0, cy: 5.0, r: 5.0 }
        );
    }

    #[test]
    fn skipped_layers_warn_and_parents_map_back() {
        let mut parent = shape_layer(json!({}), json!([]));
        parent["ind"] = json!(7);
        let mut child = shape_layer(json!({}), json!([]));
        child["ind"] = json!(8);
        child["parent"] = json!(7);
        child["hd"] = json!(true);
        let mut orphan = shape_layer(json!({}), json!([]));
        orphan["ind"] = json!(9);
        orphan["parent"] = json!(3);
        let mut no_ks = shape_layer(json!({}), json!([]));
        no_ks.as_object_mut().unwrap().remove("ks");
        let value = doc(json!([
            { "ty": 3, "nm": "Null", "ind": 3 },
            parent,
            child,
            orphan,
            no_ks
        ]));

        let imported = import_value(value).unwrap();
        let layers = &imported.project.layers;
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[1].parent_id.as_deref(), Some("layer-1"));
        assert!(!layers[1].visible);
        assert!(layers[0].visible);
        assert_eq!(layers[2].parent_id, None);
        assert_eq!(imported.warnings.len(), 3);
        assert!(imported.warnings[0].contains("Null"));
        assert!(imported.warnings[1].contains("missing transform"));
        assert!(imported.warnings[2].contains("parent 3"));
    }
}
