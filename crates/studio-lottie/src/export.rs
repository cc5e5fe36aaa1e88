//! Project to Lottie conversion.
//!
//! Every layer becomes one shape layer holding a single group with the
//! layer's geometry, paint and an identity transform. Keyframes are grouped
//! per property into Lottie animated properties; x/y and scaleX/scaleY are
//! bundled into 2D properties over the union of both tracks' times.

use lottie_data::model::{
    self as lottie, layer_type, BezierTangent, EllipseShape, FillShape, GroupShape, LottieJson,
    PathShape, PositionProperty, Property, RectShape, Shape, StrokeShape, TransformShape,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use studio_core::model::{
    AnimProperty, BezierTangents, Easing, Element, Geometry, Keyframe, Layer, Project, Style,
    Transform, TIME_EPSILON,
};
use studio_core::{color, path, time};

pub const DEFAULT_LOTTIE_VERSION: &str = "5.7.4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Written to the document's `v` field.
    pub version: String,
    /// Document name; the project name when unset.
    pub name: Option<String>,
    /// Stroke line cap: 1 butt, 2 round, 3 square.
    pub line_cap: u8,
    /// Stroke line join: 1 miter, 2 round, 3 bevel.
    pub line_join: u8,
    pub miter_limit: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            version: DEFAULT_LOTTIE_VERSION.to_string(),
            name: None,
            line_cap: 2,
            line_join: 2,
            miter_limit: 4.0,
        }
    }
}

/// Out and in tangents of the preset easings.
pub fn preset_tangents(easing: Easing) -> Option<((f64, f64), (f64, f64))> {
    match easing {
        Easing::Linear => Some(((0.0, 0.0), (1.0, 1.0))),
        Easing::EaseIn => Some(((0.42, 0.0), (1.0, 1.0))),
        Easing::EaseOut => Some(((0.0, 0.0), (0.58, 1.0))),
        Easing::EaseInOut => Some(((0.42, 0.0), (0.58, 1.0))),
        Easing::Hold | Easing::Custom => None,
    }
}

/// One keyframe of an outgoing track, already converted to wire values.
struct TrackPoint<T> {
    time: f64,
    value: T,
    easing: Easing,
    bezier: Option<BezierTangents>,
}

impl<T> TrackPoint<T> {
    fn new(kf: &Keyframe, value: T) -> Self {
        TrackPoint {
            time: kf.time,
            value,
            easing: kf.easing,
            bezier: kf.easing_bezier.clone(),
        }
    }
}

fn tangent_axis(x: &[f64], y: &[f64], dims: usize) -> Option<BezierTangent> {
    if x.len() == dims && y.len() == dims {
        return Some(BezierTangent {
            x: x.to_vec(),
            y: y.to_vec(),
        });
    }
    Some(BezierTangent::uniform(*x.first()?, *y.first()?, dims))
}

fn segment_tangents(
    easing: Easing,
    bezier: Option<&BezierTangents>,
    dims: usize,
) -> (BezierTangent, BezierTangent) {
    if easing == Easing::Custom {
        let custom = bezier.and_then(|b| {
            Some((
                tangent_axis(&b.o.x, &b.o.y, dims)?,
                tangent_axis(&b.i.x, &b.i.y, dims)?,
            ))
        });
        if let Some(tangents) = custom {
            return tangents;
        }
        tracing::debug!("Custom easing without tangents, exporting as linear");
    }
    let ((ox, oy), (ix, iy)) = preset_tangents(easing).unwrap_or(((0.0, 0.0), (1.0, 1.0)));
    (
        BezierTangent::uniform(ox, oy, dims),
        BezierTangent::uniform(ix, iy, dims),
    )
}

/// Encode sorted track points as an animated property. Hold keyframes carry
/// only `h`; other non-final keyframes carry `o`, `i` and the next value as
/// `e`; the final keyframe carries neither.
fn encode_track<T: Clone>(points: &[TrackPoint<T>], fps: f64, dims: usize) -> Property<T> {
    let keyframes = points
        .iter()
        .enumerate()
        .map(|(k, point)| {
            let frame = time::seconds_to_frame(point.time, fps) as f64;
            let mut kf = lottie::Keyframe::at(frame, point.value.clone());
            if point.easing == Easing::Hold {
                kf.h = Some(1);
            } else if let Some(next) = points.get(k + 1) {
                let (o, i) = segment_tangents(point.easing, point.bezier.as_ref(), dims);
                kf.o = Some(o);
                kf.i = Some(i);
                kf.e = Some(next.value.clone());
            }
            kf
        })
        .collect();
    Property::animated(keyframes)
}

fn number(kf: &Keyframe) -> f64 {
    kf.value.as_number().unwrap_or(0.0)
}

fn rgb(color: &str) -> Vec<f64> {
    color::to_normalized(color::parse_color_or_black(color)).to_vec()
}

struct LayerExporter<'a> {
    project: &'a Project,
    layer: &'a Layer,
    options: &'a ExportOptions,
}

impl<'a> LayerExporter<'a> {
    fn track(&self, property: AnimProperty) -> Vec<&'a Keyframe> {
        self.project.track(&self.layer.id, property)
    }

    fn scalar(&self, property: AnimProperty, fallback: f64, scale: f64) -> Property<f64> {
        let track = self.track(property);
        if track.is_empty() {
            return Property::fixed(fallback * scale);
        }
        let points: Vec<_> = track
            .iter()
            .map(|kf| TrackPoint::new(kf, number(kf) * scale))
            .collect();
        encode_track(&points, self.project.fps, 1)
    }

    /// Bundle two scalar tracks into one 2D property. A time present on only
    /// one axis holds the other at its last keyframed value before that
    /// time, or at its static value.
    fn pair(
        &self,
        properties: (AnimProperty, AnimProperty),
        base: [f64; 2],
        scale: f64,
        offset: [f64; 2],
    ) -> Property<Vec<f64>> {
        let xs = self.track(properties.0);
        let ys = self.track(properties.1);
        let wire = |x: f64, y: f64| vec![x * scale + offset[0], y * scale + offset[1]];
        if xs.is_empty() && ys.is_empty() {
            return Property::fixed(wire(base[0], base[1]));
        }

        let mut times: Vec<f64> = xs.iter().chain(ys.iter()).map(|kf| kf.time).collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        times.dedup_by(|a, b| (*a - *b).abs() < TIME_EPSILON);

        let at = |track: &[&'a Keyframe], t: f64| {
            track
                .iter()
                .copied()
                .find(|kf| (kf.time - t).abs() < TIME_EPSILON)
        };
        let last_known = |track: &[&'a Keyframe], t: f64, fallback: f64| {
            track
                .iter()
                .rev()
                .find(|kf| kf.time < t)
                .map_or(fallback, |kf| number(kf))
        };

        let points: Vec<_> = times
            .iter()
            .filter_map(|&t| {
                let on_x = at(&xs, t);
                let on_y = at(&ys, t);
                let source = on_x.or(on_y)?;
                let x = on_x.map_or_else(|| last_known(&xs, t, base[0]), number);
                let y = on_y.map_or_else(|| last_known(&ys, t, base[1]), number);
                Some(TrackPoint {
                    time: source.time,
                    value: wire(x, y),
                    easing: source.easing,
                    bezier: source.easing_bezier.clone(),
                })
            })
            .collect();
        encode_track(&points, self.project.fps, 2)
    }

    fn color(&self, property: AnimProperty, fallback: Option<&str>) -> Property<Vec<f64>> {
        let track = self.track(property);
        if track.is_empty() {
            return Property::fixed(rgb(fallback.unwrap_or("#000000")));
        }
        let points: Vec<_> = track
            .iter()
            .map(|kf| TrackPoint::new(kf, rgb(&kf.value.to_string())))
            .collect();
        encode_track(&points, self.project.fps, 1)
    }

    fn transform(&self, anchor: [f64; 2]) -> lottie::Transform {
        let element = &self.layer.element;
        let t = &element.transform;
        lottie::Transform {
            p: PositionProperty::Unified(self.pair(
                (AnimProperty::X, AnimProperty::Y),
                [t.x, t.y],
                1.0,
                anchor,
            )),
            a: Property::fixed(anchor.to_vec()),
            s: self.pair(
                (AnimProperty::ScaleX, AnimProperty::ScaleY),
                [t.scale_x, t.scale_y],
                100.0,
                [0.0, 0.0],
            ),
            r: self.scalar(AnimProperty::Rotation, t.rotation, 1.0),
            o: self.scalar(AnimProperty::Opacity, element.style.opacity_or_default(), 100.0),
        }
    }

    fn paint_items(&self) -> Vec<Shape> {
        let style = &self.layer.element.style;
        let mut items = Vec::new();

        let has_fill = color::is_paint(style.fill.as_deref());
        if has_fill || !self.track(AnimProperty::Fill).is_empty() {
            items.push(fill_item(self.color(AnimProperty::Fill, style.fill.as_deref())));
        }

        let has_stroke = color::is_paint(style.stroke.as_deref());
        if has_stroke || !self.track(AnimProperty::Stroke).is_empty() {
            items.push(stroke_item(
                self.color(AnimProperty::Stroke, style.stroke.as_deref()),
                self.scalar(AnimProperty::StrokeWidth, style.stroke_width_or_default(), 1.0),
                self.options,
            ));
        }
        items
    }

    fn export(&self, ind: u32, parent: Option<u32>, op: f64) -> lottie::Layer {
        let element = &self.layer.element;
        let anchor = element.geometry.center();

        let mut items = geometry_items(element, self.options);
        items.extend(self.paint_items());
        items.push(identity_transform());

        lottie::Layer {
            ty: layer_type::SHAPE,
            nm: Some(self.layer.name.clone()),
            ind: Some(ind),
            parent,
            ip: 0.0,
            op,
            st: 0.0,
            sr: 1.0,
            ddd: 0,
            ao: 0,
            bm: 0,
            hd: (!self.layer.visible).then_some(true),
            ks: Some(self.transform(anchor)),
            shapes: Some(vec![group(Some(element.name.clone()), items)]),
        }
    }
}

fn group(nm: Option<String>, it: Vec<Shape>) -> Shape {
    Shape::Group(GroupShape {
        nm,
        np: Some(it.len() as u32),
        it,
    })
}

fn identity_transform() -> Shape {
    Shape::Transform(TransformShape {
        t: lottie::Transform::identity(),
    })
}

fn fill_item(c: Property<Vec<f64>>) -> Shape {
    Shape::Fill(FillShape {
        nm: Some("Fill".to_string()),
        c,
        o: Property::fixed(100.0),
        r: Some(1),
    })
}

fn stroke_item(c: Property<Vec<f64>>, w: Property<f64>, options: &ExportOptions) -> Shape {
    Shape::Stroke(StrokeShape {
        nm: Some("Stroke".to_string()),
        c,
        o: Property::fixed(100.0),
        w,
        lc: options.line_cap,
        lj: options.line_join,
        ml: Some(options.miter_limit),
    })
}

fn path_item(nm: Option<String>, path: lottie::BezierPath) -> Shape {
    Shape::Path(PathShape {
        nm,
        ks: Property::fixed(path),
    })
}

/// Static paint of a group child; only the layer's own style is animated.
fn static_paint_items(style: &Style, options: &ExportOptions) -> Vec<Shape> {
    let mut items = Vec::new();
    if let Some(fill) = style.fill.as_deref().filter(|f| color::is_paint(Some(f))) {
        items.push(fill_item(Property::fixed(rgb(fill))));
    }
    if let Some(stroke) = style.stroke.as_deref().filter(|s| color::is_paint(Some(s))) {
        items.push(stroke_item(
            Property::fixed(rgb(stroke)),
            Property::fixed(style.stroke_width_or_default()),
            options,
        ));
    }
    items
}

/// A group child's static transform, pivoting about the child's own center.
fn child_transform(t: &Transform, opacity: f64, center: [f64; 2]) -> Shape {
    Shape::Transform(TransformShape {
        t: lottie::Transform {
            p: PositionProperty::Unified(Property::fixed(vec![t.x + center[0], t.y + center[1]])),
            a: Property::fixed(center.to_vec()),
            s: Property::fixed(vec![t.scale_x * 100.0, t.scale_y * 100.0]),
            r: Property::fixed(t.rotation),
            o: Property::fixed(opacity * 100.0),
        },
    })
}

fn geometry_items(element: &Element, options: &ExportOptions) -> Vec<Shape> {
    let nm = Some(element.name.clone());
    match &element.geometry {
        Geometry::Rect {
            x,
            y,
            width,
            height,
            rx,
        } => vec![Shape::Rect(RectShape {
            nm,
            p: Property::fixed(vec![x + width / 2.0, y + height / 2.0]),
            s: Property::fixed(vec![*width, *height]),
            r: Property::fixed(*rx),
        })],
        Geometry::Circle { cx, cy, r } => vec![Shape::Ellipse(EllipseShape {
            nm,
            p: Property::fixed(vec![*cx, *cy]),
            s: Property::fixed(vec![r * 2.0, r * 2.0]),
        })],
        Geometry::Ellipse { cx, cy, rx, ry } => vec![Shape::Ellipse(EllipseShape {
            nm,
            p: Property::fixed(vec![*cx, *cy]),
            s: Property::fixed(vec![rx * 2.0, ry * 2.0]),
        })],
        Geometry::Path { d } => {
            let parsed = path::parse(d);
            if !parsed.skipped.is_empty() {
                tracing::warn!(
                    "Element {} lost {} unsupported path commands on export",
                    element.id,
                    parsed.skipped.len()
                );
            }
            parsed
                .subpaths
                .into_iter()
                .map(|sub| path_item(nm.clone(), sub))
                .collect()
        }
        Geometry::Polygon { points } => vec![path_item(nm, path::polyline(points, true))],
        Geometry::Polyline { points } => vec![path_item(nm, path::polyline(points, false))],
        Geometry::Group { children } => children
            .iter()
            .map(|child| {
                let mut items = geometry_items(child, options);
                items.extend(static_paint_items(&child.style, options));
                items.push(child_transform(
                    &child.transform,
                    child.style.opacity_or_default(),
                    child.geometry.center(),
                ));
                group(Some(child.name.clone()), items)
            })
            .collect(),
    }
}

/// Convert a project into a Lottie document. Layers are converted in
/// parallel and keep the project's order.
pub fn export_project(project: &Project, options: &ExportOptions) -> LottieJson {
    let op = time::frame_count(project.duration, project.fps) as f64;
    let index = project.layer_index();

    let layers: Vec<lottie::Layer> = project
        .layers
        .par_iter()
        .enumerate()
        .map(|(idx, layer)| {
            let parent = layer
                .parent_id
                .as_deref()
                .and_then(|id| index.get(id).copied())
                .filter(|&parent_idx| parent_idx != idx)
                .map(|parent_idx| parent_idx as u32 + 1);
            LayerExporter {
                project,
                layer,
                options,
            }
            .export(idx as u32 + 1, parent, op)
        })
        .collect();

    tracing::debug!(
        "Exported {} layers and {} keyframes over {} frames at {} fps",
        layers.len(),
        project.keyframes.len(),
        op,
        project.fps
    );

    LottieJson {
        v: Some(options.version.clone()),
        fr: project.fps,
        ip: 0.0,
        op,
        w: project.width,
        h: project.height,
        nm: Some(options.name.clone().unwrap_or_else(|| project.name.clone())),
        ddd: 0,
        assets: Vec::new(),
        layers,
    }
}
