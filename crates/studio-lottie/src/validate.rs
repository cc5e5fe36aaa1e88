//! Structural validation of Lottie documents.
//!
//! Works on raw JSON so that it can report problems the typed model would
//! silently default away, such as `null` numbers left behind by NaN or
//! infinite values.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationStatus {
    Valid,
    ValidWithWarnings,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    // Errors
    MissingField,
    WrongType,
    InvalidFrameRate,
    EmptyTimeline,
    MissingLayerType,
    MissingLayerContent,
    NonFiniteNumber,
    HoldWithInterpolation,
    MissingTangents,
    EndValueMismatch,
    // Warnings
    ColorLength,
    ColorRange,
    UnorderedKeyframes,
    NoLayers,
    UnknownShapeType,
}

impl IssueKind {
    pub fn is_error(self) -> bool {
        !matches!(
            self,
            IssueKind::ColorLength
                | IssueKind::ColorRange
                | IssueKind::UnorderedKeyframes
                | IssueKind::NoLayers
                | IssueKind::UnknownShapeType
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// JSON pointer to the offending value.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.status != ValidationStatus::Invalid
    }
}

// Every shape item type Lottie defines; anything else is reported.
const KNOWN_SHAPE_TYPES: &[&str] = &[
    "gr", "rc", "el", "sr", "sh", "fl", "st", "gf", "gs", "tr", "tm", "rd", "mm", "rp", "op",
    "pb", "tw", "zz", "no",
];

#[derive(Default)]
struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    fn report(&mut self, kind: IssueKind, path: &str, message: impl Into<String>) {
        self.issues.push(Issue {
            kind,
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn number(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<f64> {
        let at = format!("{path}/{key}");
        match obj.get(key) {
            None => {
                self.report(IssueKind::MissingField, &at, format!("missing `{key}`"));
                None
            }
            Some(Value::Null) => {
                self.report(IssueKind::NonFiniteNumber, &at, "null where a number is required");
                None
            }
            Some(Value::Number(n)) => n.as_f64(),
            Some(_) => {
                self.report(IssueKind::WrongType, &at, format!("`{key}` must be a number"));
                None
            }
        }
    }

    /// Flag `null` anywhere inside a numeric value.
    fn finite(&mut self, value: &Value, path: &str) {
        match value {
            Value::Null => {
                self.report(IssueKind::NonFiniteNumber, path, "null where a number is required")
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.finite(item, &format!("{path}/{idx}"));
                }
            }
            _ => {}
        }
    }

    fn color(&mut self, value: &Value, path: &str) {
        let Value::Array(channels) = value else {
            return;
        };
        if channels.len() != 3 {
            self.report(
                IssueKind::ColorLength,
                path,
                format!("color has {} components, expected 3", channels.len()),
            );
        }
        if channels
            .iter()
            .filter_map(Value::as_f64)
            .any(|c| !(0.0..=1.0).contains(&c))
        {
            self.report(IssueKind::ColorRange, path, "color component outside [0, 1]");
        }
    }

    fn document(&mut self, doc: &Value) {
        let Some(root) = doc.as_object() else {
            self.report(IssueKind::WrongType, "", "document must be an object");
            return;
        };

        let fr = self.number(root, "fr", "");
        let ip = self.number(root, "ip", "");
        let op = self.number(root, "op", "");
        self.number(root, "w", "");
        self.number(root, "h", "");

        if let Some(fr) = fr.filter(|fr| *fr <= 0.0) {
            self.report(
                IssueKind::InvalidFrameRate,
                "/fr",
                format!("frame rate must be positive, got {fr}"),
            );
        }
        if let (Some(ip), Some(op)) = (ip, op) {
            if op <= ip {
                self.report(
                    IssueKind::EmptyTimeline,
                    "/op",
                    format!("out point {op} is not after in point {ip}"),
                );
            }
        }

        match root.get("layers") {
            None => self.report(IssueKind::MissingField, "/layers", "missing `layers`"),
            Some(Value::Array(layers)) => {
                if layers.is_empty() {
                    self.report(IssueKind::NoLayers, "/layers", "document has no layers");
                }
                for (idx, layer) in layers.iter().enumerate() {
                    self.layer(layer, &format!("/layers/{idx}"));
                }
            }
            Some(_) => self.report(IssueKind::WrongType, "/layers", "`layers` must be an array"),
        }
    }

    fn layer(&mut self, layer: &Value, path: &str) {
        let Some(obj) = layer.as_object() else {
            self.report(IssueKind::WrongType, path, "layer must be an object");
            return;
        };
        let ty = match obj.get("ty") {
            None => {
                self.report(IssueKind::MissingLayerType, &format!("{path}/ty"), "layer has no `ty`");
                None
            }
            Some(ty) => ty.as_u64(),
        };

        match obj.get("ks") {
            Some(ks) => self.transform(ks, &format!("{path}/ks")),
            None if ty == Some(4) => self.report(
                IssueKind::MissingLayerContent,
                &format!("{path}/ks"),
                "shape layer has no transform",
            ),
            None => {}
        }

        match obj.get("shapes") {
            Some(Value::Array(items)) => self.shapes(items, &format!("{path}/shapes")),
            Some(_) => self.report(
                IssueKind::WrongType,
                &format!("{path}/shapes"),
                "`shapes` must be an array",
            ),
            None if ty == Some(4) => self.report(
                IssueKind::MissingLayerContent,
                &format!("{path}/shapes"),
                "shape layer has no shapes",
            ),
            None => {}
        }
    }

    fn transform(&mut self, ks: &Value, path: &str) {
        let Some(obj) = ks.as_object() else {
            self.report(IssueKind::WrongType, path, "transform must be an object");
            return;
        };
        for key in ["a", "s", "r", "rz", "o"] {
            if let Some(prop) = obj.get(key) {
                self.property(prop, &format!("{path}/{key}"), false);
            }
        }
        if let Some(p) = obj.get("p") {
            let split = p.get("s").and_then(Value::as_bool).unwrap_or(false);
            if split {
                for key in ["x", "y"] {
                    if let Some(prop) = p.get(key) {
                        self.property(prop, &format!("{path}/p/{key}"), false);
                    }
                }
            } else {
                self.property(p, &format!("{path}/p"), false);
            }
        }
    }

    fn shapes(&mut self, items: &[Value], path: &str) {
        for (idx, item) in items.iter().enumerate() {
            let at = format!("{path}/{idx}");
            let ty = item.get("ty").and_then(Value::as_str).unwrap_or("");
            if !KNOWN_SHAPE_TYPES.contains(&ty) {
                self.report(
                    IssueKind::UnknownShapeType,
                    &format!("{at}/ty"),
                    format!("unknown shape item type {ty:?}"),
                );
                continue;
            }
            match ty {
                "gr" => {
                    if let Some(Value::Array(children)) = item.get("it") {
                        self.shapes(children, &format!("{at}/it"));
                    }
                }
                "tr" => self.transform(item, &at),
                "fl" | "st" => {
                    if let Some(c) = item.get("c") {
                        self.property(c, &format!("{at}/c"), true);
                    }
                    for key in ["o", "w"] {
                        if let Some(prop) = item.get(key) {
                            self.property(prop, &format!("{at}/{key}"), false);
                        }
                    }
                }
                "rc" | "el" | "sr" => {
                    for key in ["p", "s", "r"] {
                        if let Some(prop) = item.get(key) {
                            self.property(prop, &format!("{at}/{key}"), false);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn property(&mut self, prop: &Value, path: &str, is_color: bool) {
        let Some(obj) = prop.as_object() else {
            self.report(IssueKind::WrongType, path, "animated property must be an object");
            return;
        };
        let Some(k) = obj.get("k") else {
            self.report(IssueKind::MissingField, &format!("{path}/k"), "missing `k`");
            return;
        };

        let animated = obj.get("a").and_then(Value::as_u64) == Some(1)
            || k.as_array()
                .and_then(|items| items.first())
                .is_some_and(|first| first.get("t").is_some());
        if !animated {
            self.finite(k, &format!("{path}/k"));
            if is_color {
                self.color(k, &format!("{path}/k"));
            }
            return;
        }

        let Some(keyframes) = k.as_array() else {
            self.report(
                IssueKind::WrongType,
                &format!("{path}/k"),
                "animated property needs a keyframe array",
            );
            return;
        };
        self.keyframes(keyframes, &format!("{path}/k"), is_color);
    }

    fn keyframes(&mut self, keyframes: &[Value], path: &str, is_color: bool) {
        let mut previous: Option<f64> = None;
        for (idx, kf) in keyframes.iter().enumerate() {
            let at = format!("{path}/{idx}");
            let Some(obj) = kf.as_object() else {
                self.report(IssueKind::WrongType, &at, "keyframe must be an object");
                continue;
            };

            if let Some(t) = self.number(obj, "t", &at) {
                if previous.is_some_and(|p| t < p) {
                    self.report(
                        IssueKind::UnorderedKeyframes,
                        &format!("{at}/t"),
                        "keyframe time goes backwards",
                    );
                }
                previous = Some(t);
            }

            for key in ["s", "e"] {
                if let Some(v) = obj.get(key) {
                    self.finite(v, &format!("{at}/{key}"));
                    if is_color {
                        self.color(v, &format!("{at}/{key}"));
                    }
                }
            }

            let is_final = idx + 1 == keyframes.len();
            let hold = obj.get("h").and_then(Value::as_u64) == Some(1);
            if hold {
                let stray: Vec<&str> = ["i", "o", "e"]
                    .into_iter()
                    .filter(|key| obj.contains_key(*key))
                    .collect();
                if !stray.is_empty() {
                    self.report(
                        IssueKind::HoldWithInterpolation,
                        &at,
                        format!("hold keyframe carries {}", stray.join(", ")),
                    );
                }
            } else if !is_final && !(obj.contains_key("i") && obj.contains_key("o")) {
                self.report(
                    IssueKind::MissingTangents,
                    &at,
                    "interpolated keyframe is missing `i`/`o` tangents",
                );
            }

            if let (Some(Value::Array(s)), Some(Value::Array(e))) = (obj.get("s"), obj.get("e")) {
                if s.len() != e.len() {
                    self.report(
                        IssueKind::EndValueMismatch,
                        &format!("{at}/e"),
                        format!("end value has {} components, start has {}", e.len(), s.len()),
                    );
                }
            }
        }
    }
}

/// Check a Lottie document for structural problems.
pub fn validate(doc: &Value) -> ValidationReport {
    let mut validator = Validator::default();
    validator.document(doc);

    let (errors, warnings): (Vec<Issue>, Vec<Issue>) = validator
        .issues
        .into_iter()
        .partition(|issue| issue.kind.is_error());
    let status = if !errors.is_empty() {
        ValidationStatus::Invalid
    } else if !warnings.is_empty() {
        ValidationStatus::ValidWithWarnings
    } else {
        ValidationStatus::Valid
    };
    ValidationReport {
        status,
        errors,
        warnings,
    }
}
