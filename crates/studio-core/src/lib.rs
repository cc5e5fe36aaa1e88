pub mod bezier;
pub mod color;
pub mod interpolate;
pub mod model;
pub mod path;
pub mod playback;
pub mod time;

pub use interpolate::{angle_at, color_at, value_at};
pub use model::{
    AnimProperty, BezierTangents, Easing, Element, Geometry, Keyframe, KeyframeValue, Layer,
    ModelError, Project, Style, TangentAxis, Transform,
};
pub use path::PathError;
pub use playback::{Clock, LoopMode, PlaybackEngine, PlaybackState, SystemClock};
