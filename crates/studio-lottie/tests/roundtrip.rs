use serde_json::{json, Value};
use studio_core::model::{AnimProperty, Easing, Element, Geometry, Keyframe, Layer, Project};
use studio_lottie::{export_project, import_value, validate, ExportOptions, ValidationStatus};

fn sliding_box() -> Project {
    let mut project = Project::new("slide", 640, 360, 30.0, 2.0).unwrap();
    let mut element = Element::new(
        "box",
        Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 20.0,
            rx: 0.0,
        },
    );
    element.style.fill = Some("#3366ff".into());
    project.add_layer(Layer::new("box", element)).unwrap();
    project
        .upsert_keyframe(Keyframe::new("x0", "box", AnimProperty::X, 0.0, 100.0))
        .unwrap();
    project
        .upsert_keyframe(Keyframe::new("x1", "box", AnimProperty::X, 1.0, 300.0))
        .unwrap();
    project
}

fn to_json(project: &Project) -> Value {
    serde_json::to_value(export_project(project, &ExportOptions::default())).unwrap()
}

fn track(project: &Project, property: AnimProperty) -> Vec<(f64, f64, Easing)> {
    let layer = &project.layers[0].id;
    project
        .track(layer, property)
        .into_iter()
        .map(|kf| (kf.time, kf.value.as_number().unwrap(), kf.easing))
        .collect()
}

#[test]
fn linear_position_survives_a_round_trip() {
    let doc = to_json(&sliding_box());

    let kfs = doc["layers"][0]["ks"]["p"]["k"].as_array().unwrap().clone();
    assert_eq!(kfs.len(), 2);
    assert_eq!(kfs[0]["t"], json!(0.0));
    assert_eq!(kfs[0]["s"], json!([120.0, 10.0]));
    assert_eq!(kfs[0]["e"], json!([320.0, 10.0]));
    assert_eq!(kfs[0]["o"], json!({ "x": [0.0, 0.0], "y": [0.0, 0.0] }));
    assert_eq!(kfs[0]["i"], json!({ "x": [1.0, 1.0], "y": [1.0, 1.0] }));
    assert!(kfs[0].get("h").is_none());
    assert_eq!(kfs[1]["t"], json!(30.0));
    assert_eq!(kfs[1]["s"], json!([320.0, 10.0]));

    let imported = import_value(doc).unwrap();
    assert!(imported.warnings.is_empty());
    let project = imported.project;
    assert_eq!(project.fps, 30.0);
    assert_eq!(project.duration, 2.0);
    assert_eq!(
        track(&project, AnimProperty::X),
        vec![(0.0, 100.0, Easing::Linear), (1.0, 300.0, Easing::Linear)]
    );
    assert_eq!(project.layers[0].element.style.fill.as_deref(), Some("#3366ff"));

    let mid = project
        .sample(&project.layers[0].id, AnimProperty::X, 0.5)
        .and_then(|v| v.as_number())
        .unwrap();
    assert!((mid - 200.0).abs() < 1e-9);
}

#[test]
fn hold_keyframes_export_without_interpolation() {
    let mut project = sliding_box();
    project
        .upsert_keyframe(
            Keyframe::new("r0", "box", AnimProperty::Rotation, 0.0, 0.0).with_easing(Easing::Hold),
        )
        .unwrap();
    project
        .upsert_keyframe(Keyframe::new("r1", "box", AnimProperty::Rotation, 1.0, 45.0))
        .unwrap();

    let doc = to_json(&project);
    let first = &doc["layers"][0]["ks"]["r"]["k"][0];
    assert_eq!(first["h"], json!(1));
    for field in ["i", "o", "e"] {
        assert!(first.get(field).is_none(), "hold keyframe carries {field}");
    }

    let project = import_value(doc).unwrap().project;
    let rotation = track(&project, AnimProperty::Rotation);
    assert_eq!(rotation[0], (0.0, 0.0, Easing::Hold));
    assert_eq!(rotation[1].1, 45.0);
}

#[test]
fn eased_segments_keep_their_label() {
    let mut project = sliding_box();
    project
        .upsert_keyframe(
            Keyframe::new("x0", "box", AnimProperty::X, 0.0, 100.0).with_easing(Easing::EaseInOut),
        )
        .unwrap();

    let project = import_value(to_json(&project)).unwrap().project;
    assert_eq!(track(&project, AnimProperty::X)[0].2, Easing::EaseInOut);
}

#[test]
fn unsupported_layers_are_skipped_with_one_warning() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let mut doc = to_json(&sliding_box());
    doc["layers"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "ty": 5, "nm": "Caption", "ind": 2, "ks": {} }));

    let imported = import_value(doc).unwrap();
    assert_eq!(imported.project.layers.len(), 1);
    assert_eq!(imported.warnings.len(), 1);
    assert!(imported.warnings[0].contains("Text"));
}

#[test]
fn exported_documents_validate_cleanly() {
    let mut project = sliding_box();
    let mut ring = Element::new("ring", Geometry::Circle { cx: 0.0, cy: 0.0, r: 12.0 });
    ring.style.stroke = Some("black".into());
    ring.style.stroke_width = Some(2.0);
    project
        .add_layer(Layer::new("ring", ring).with_parent("box"))
        .unwrap();
    project
        .upsert_keyframe(Keyframe::new("o0", "ring", AnimProperty::Opacity, 0.0, 1.0))
        .unwrap();
    project
        .upsert_keyframe(
            Keyframe::new("o1", "ring", AnimProperty::Opacity, 1.5, 0.0).with_easing(Easing::Hold),
        )
        .unwrap();

    let report = validate(&to_json(&project));
    assert_eq!(report.status, ValidationStatus::Valid, "{:?}", report);
}

#[test]
fn position_values_are_written_at_the_shape_center() {
    let mut project = Project::new("dot", 100, 100, 30.0, 1.0).unwrap();
    let dot = Element::new("dot", Geometry::Circle { cx: 0.0, cy: 0.0, r: 5.0 });
    project.add_layer(Layer::new("dot", dot)).unwrap();
    project
        .upsert_keyframe(Keyframe::new("x0", "dot", AnimProperty::X, 0.0, 100.0))
        .unwrap();
    project
        .upsert_keyframe(Keyframe::new("x1", "dot", AnimProperty::X, 1.0, 300.0))
        .unwrap();

    let doc = to_json(&project);
    let kfs = &doc["layers"][0]["ks"]["p"]["k"];
    assert_eq!(kfs[0]["t"], json!(0.0));
    assert_eq!(kfs[0]["s"][0], json!(100.0));
    assert_eq!(kfs[1]["t"], json!(30.0));
    assert_eq!(kfs[1]["s"][0], json!(300.0));
}

#[test]
fn one_axis_scale_animation_round_trips() {
    let mut project = sliding_box();
    project
        .upsert_keyframe(Keyframe::new("sy0", "box", AnimProperty::ScaleY, 0.0, 1.0))
        .unwrap();
    project
        .upsert_keyframe(Keyframe::new("sy1", "box", AnimProperty::ScaleY, 1.0, 2.0))
        .unwrap();

    let doc = to_json(&project);
    let kfs = &doc["layers"][0]["ks"]["s"]["k"];
    assert_eq!(kfs[0]["s"], json!([100.0, 100.0]));
    assert_eq!(kfs[0]["e"], json!([100.0, 200.0]));
    assert_eq!(kfs[1]["s"], json!([100.0, 200.0]));

    let project = import_value(doc).unwrap().project;
    let values = |property| -> Vec<f64> {
        track(&project, property).into_iter().map(|(_, v, _)| v).collect()
    };
    assert_eq!(values(AnimProperty::ScaleX), vec![1.0, 1.0]);
    assert_eq!(values(AnimProperty::ScaleY), vec![1.0, 2.0]);
}

fn lottie_doc(layers: Value) -> Value {
    json!({ "v": "5.7.4", "fr": 30, "ip": 0, "op": 30, "w": 100, "h": 100, "layers": layers })
}

#[test]
fn animated_fill_colors_import_as_a_track() {
    let doc = lottie_doc(json!([{
        "ty": 4,
        "ks": {},
        "shapes": [{
            "ty": "fl",
            "c": { "a": 1, "k": [
                { "t": 0, "s": [1, 0, 0], "e": [0, 0, 1],
                  "o": { "x": [0.42], "y": [0] }, "i": { "x": [0.58], "y": [1] } },
                { "t": 30, "s": [0, 0, 1] }
            ]}
        }]
    }]));

    let project = import_value(doc).unwrap().project;
    let layer = &project.layers[0].id;
    assert_eq!(project.layers[0].element.style.fill.as_deref(), Some("#ff0000"));
    let fills: Vec<(String, Easing)> = project
        .track(layer, AnimProperty::Fill)
        .into_iter()
        .map(|kf| (kf.value.to_string(), kf.easing))
        .collect();
    assert_eq!(
        fills,
        vec![
            ("#ff0000".to_string(), Easing::EaseInOut),
            ("#0000ff".to_string(), Easing::Linear)
        ]
    );
    let mid = project.sample(layer, AnimProperty::Fill, 0.5).unwrap();
    assert_eq!(mid.as_color(), Some("#800080"));
}

#[test]
fn position_tangents_ease_each_axis_separately() {
    let doc = lottie_doc(json!([{
        "ty": 4,
        "ks": { "p": { "a": 1, "k": [
            { "t": 0, "s": [0, 0], "e": [100, 100],
              "o": { "x": [0, 0.42], "y": [0, 0] }, "i": { "x": [1, 1], "y": [1, 1] } },
            { "t": 30, "s": [100, 100] }
        ]}},
        "shapes": []
    }]));

    let project = import_value(doc).unwrap().project;
    assert_eq!(track(&project, AnimProperty::X)[0].2, Easing::Linear);
    assert_eq!(track(&project, AnimProperty::Y)[0].2, Easing::EaseIn);

    let layer = &project.layers[0].id;
    let at = |property| {
        project
            .sample(layer, property, 0.5)
            .and_then(|v| v.as_number())
            .unwrap()
    };
    assert!((at(AnimProperty::X) - 50.0).abs() < 1e-9);
    assert!((at(AnimProperty::Y) - 25.0).abs() < 1e-9);
}

#[test]
fn a_layer_that_fails_to_decode_is_skipped() {
    let doc = lottie_doc(json!([
        { "ty": 4, "nm": "Good", "ks": {}, "shapes": [] },
        { "ty": 4, "nm": "Bad", "ks": {}, "shapes": [{ "ty": "fl", "o": { "a": 0, "k": 100 } }] }
    ]));

    let imported = import_value(doc).unwrap();
    assert_eq!(imported.project.layers.len(), 1);
    assert_eq!(imported.project.layers[0].name, "Good");
    assert_eq!(imported.warnings.len(), 1);
    assert!(imported.warnings[0].contains("Bad"));
}
