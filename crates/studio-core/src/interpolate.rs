//! Keyframe interpolation: numeric, color and shortest-path angle tracks.
//!
//! All functions take the keyframes of a single track in any order and sort
//! them by time (stable, so equal times keep their insertion order). Outside
//! the keyframe span the nearest end value is held.

use crate::bezier;
use crate::color;
use crate::model::{BezierTangents, Easing, Keyframe};
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Where a time falls within a sorted track.
enum Segment<'a> {
    /// Before the first keyframe, after the last one, or a single keyframe.
    Held(&'a Keyframe),
    /// Between two keyframes; `t` is the raw local progress in [0, 1).
    Between {
        before: &'a Keyframe,
        after: &'a Keyframe,
        t: f64,
    },
}

pub(crate) fn sort_by_time(keyframes: &mut [&Keyframe]) {
    keyframes.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
}

fn sorted<K: Borrow<Keyframe>>(keyframes: &[K]) -> Vec<&Keyframe> {
    let mut refs: Vec<&Keyframe> = keyframes.iter().map(Borrow::borrow).collect();
    sort_by_time(&mut refs);
    refs
}

fn locate<'a>(sorted: &[&'a Keyframe], time: f64) -> Option<Segment<'a>> {
    let first = *sorted.first()?;
    let last = *sorted.last()?;

    if sorted.len() == 1 || !(time > first.time) {
        return Some(Segment::Held(first));
    }
    if time >= last.time {
        return Some(Segment::Held(last));
    }

    // First keyframe strictly after `time`; a time equal to an interior
    // keyframe therefore starts the next segment.
    let idx = sorted.partition_point(|kf| kf.time <= time);
    let before = sorted[idx - 1];
    let after = sorted[idx];
    let span = after.time - before.time;
    if span <= 0.0 {
        return Some(Segment::Held(before));
    }

    Some(Segment::Between {
        before,
        after,
        t: (time - before.time) / span,
    })
}

/// Map linear local progress `t` through an easing curve.
pub fn apply_easing(easing: Easing, bezier: Option<&BezierTangents>, t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => t * (2.0 - t),
        Easing::EaseInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        // Stair step: the value only jumps once the segment is complete.
        Easing::Hold => {
            if t >= 1.0 {
                1.0
            } else {
                0.0
            }
        }
        Easing::Custom => bezier
            .and_then(|tangents| bezier::ease_with_tangents(t, tangents))
            .unwrap_or(t),
    }
}

fn eased(before: &Keyframe, t: f64) -> f64 {
    apply_easing(before.easing, before.easing_bezier.as_ref(), t)
}

fn number(kf: &Keyframe) -> f64 {
    kf.value.as_number().unwrap_or(0.0)
}

/// Numeric value of a track at `time` seconds. An empty track yields `0`.
pub fn value_at<K: Borrow<Keyframe>>(keyframes: &[K], time: f64) -> f64 {
    let sorted = sorted(keyframes);
    match locate(&sorted, time) {
        None => 0.0,
        Some(Segment::Held(kf)) => number(kf),
        Some(Segment::Between { before, after, t }) => {
            let from = number(before);
            let to = number(after);
            from + (to - from) * eased(before, t)
        }
    }
}

/// Color of a track at `time` seconds as `#rrggbb`. An empty track yields
/// black; held values are returned exactly as stored.
pub fn color_at<K: Borrow<Keyframe>>(keyframes: &[K], time: f64) -> String {
    let sorted = sorted(keyframes);
    match locate(&sorted, time) {
        None => "#000000".to_string(),
        Some(Segment::Held(kf)) => kf.value.to_string(),
        Some(Segment::Between { before, after, t }) => {
            let from = color::parse_color_or_black(&before.value.to_string());
            let to = color::parse_color_or_black(&after.value.to_string());
            color::to_hex(color::lerp_rgb(from, to, eased(before, t)))
        }
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Interpolate between two angles along the shorter arc.
pub fn interpolate_angle(from: f64, to: f64, t: f64) -> f64 {
    let from = normalize_angle(from);
    let to = normalize_angle(to);
    let mut delta = to - from;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    normalize_angle(from + delta * t)
}

/// Angle of a rotation track at `time`, taking the shortest rotational path
/// between keyframes. Result is in `[0, 360)`.
pub fn angle_at<K: Borrow<Keyframe>>(keyframes: &[K], time: f64) -> f64 {
    let sorted = sorted(keyframes);
    match locate(&sorted, time) {
        None => 0.0,
        Some(Segment::Held(kf)) => normalize_angle(number(kf)),
        Some(Segment::Between { before, after, t }) => {
            interpolate_angle(number(before), number(after), eased(before, t))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnimProperty;

    fn kf(time: f64, value: f64, easing: Easing) -> Keyframe {
        Keyframe::new(format!("k{time}"), "layer", AnimProperty::X, time, value).with_easing(easing)
    }

    fn color_kf(time: f64, value: &str) -> Keyframe {
        Keyframe::new(format!("c{time}"), "layer", AnimProperty::Fill, time, value)
    }

    #[test]
    fn empty_and_single_tracks() {
        let empty: Vec<Keyframe> = Vec::new();
        assert_eq!(value_at(&empty, 3.0), 0.0);

        let single = vec![kf(1.0, 7.5, Easing::EaseIn)];
        for time in [-1.0, 0.0, 1.0, 2.0, f64::NAN] {
            assert_eq!(value_at(&single, time), 7.5);
        }
    }

    #[test]
    fn clamps_outside_the_track_and_sorts_input() {
        let track = vec![
            kf(2.0, 200.0, Easing::Linear),
            kf(0.0, 0.0, Easing::Linear),
            kf(1.0, 100.0, Easing::Linear),
        ];
        assert_eq!(value_at(&track, -5.0), 0.0);
        assert_eq!(value_at(&track, 5.0), 200.0);
        assert_eq!(value_at(&track, 0.5), 50.0);
        assert_eq!(value_at(&track, 1.5), 150.0);
    }

    #[test]
    fn interior_keyframe_time_belongs_to_next_segment() {
        // Hold on the middle keyframe: at exactly t=1 the segment [1, 2]
        // starts, so its own value is used rather than the jump target.
        let track = vec![
            kf(0.0, 0.0, Easing::Linear),
            kf(1.0, 10.0, Easing::Hold),
            kf(2.0, 20.0, Easing::Linear),
        ];
        assert_eq!(value_at(&track, 1.0), 10.0);
        assert_eq!(value_at(&track, 1.999), 10.0);
        assert_eq!(value_at(&track, 2.0), 20.0);
    }

    #[test]
    fn preset_easings() {
        assert_eq!(apply_easing(Easing::Linear, None, 0.25), 0.25);
        assert_eq!(apply_easing(Easing::Linear, None, 1.5), 1.0);
        assert_eq!(apply_easing(Easing::EaseIn, None, 0.5), 0.25);
        assert_eq!(apply_easing(Easing::EaseOut, None, 0.5), 0.75);
        assert_eq!(apply_easing(Easing::EaseInOut, None, 0.25), 0.0625);
        assert_eq!(apply_easing(Easing::EaseInOut, None, 0.75), 0.9375);
        assert_eq!(apply_easing(Easing::Hold, None, 0.99), 0.0);
        assert_eq!(apply_easing(Easing::Hold, None, 1.0), 1.0);
    }

    #[test]
    fn custom_easing_uses_tangents_or_falls_back_to_linear() {
        assert_eq!(apply_easing(Easing::Custom, None, 0.3), 0.3);

        let ease_in = BezierTangents::new((0.42, 0.0), (1.0, 1.0));
        let y = apply_easing(Easing::Custom, Some(&ease_in), 0.5);
        assert!(y < 0.5 && y > 0.2, "y = {}", y);
    }

    #[test]
    fn eased_segment_uses_before_keyframe_easing() {
        let track = vec![kf(0.0, 0.0, Easing::EaseIn), kf(1.0, 100.0, Easing::Linear)];
        assert!((value_at(&track, 0.5) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn color_midpoint_is_per_channel() {
        let track = vec![color_kf(0.0, "#ff0000"), color_kf(1.0, "#0000ff")];
        assert_eq!(color_at(&track, 0.5), "#800080");
        assert_eq!(color_at(&track, -1.0), "#ff0000");
        assert_eq!(color_at(&track, 3.0), "#0000ff");
    }

    #[test]
    fn color_defaults() {
        let empty: Vec<Keyframe> = Vec::new();
        assert_eq!(color_at(&empty, 0.0), "#000000");
        let single = vec![color_kf(0.5, "tomato")];
        assert_eq!(color_at(&single, 10.0), "tomato");
    }

    #[test]
    fn named_colors_interpolate() {
        let track = vec![color_kf(0.0, "black"), color_kf(1.0, "white")];
        assert_eq!(color_at(&track, 0.5), "#808080");
    }

    #[test]
    fn angles_take_the_short_way_round() {
        assert_eq!(interpolate_angle(350.0, 10.0, 0.5), 0.0);
        assert_eq!(interpolate_angle(10.0, 350.0, 0.5), 0.0);
        assert_eq!(interpolate_angle(0.0, 90.0, 0.5), 45.0);
        assert_eq!(interpolate_angle(-90.0, 90.0, 0.5), 0.0);
        assert_eq!(normalize_angle(-30.0), 330.0);
        assert_eq!(normalize_angle(720.0), 0.0);

        let track = vec![kf(0.0, 350.0, Easing::Linear), kf(1.0, 10.0, Easing::Linear)];
        assert_eq!(angle_at(&track, 0.5), 0.0);
        assert!((angle_at(&track, 0.25) - 355.0).abs() < 1e-9);
    }
}
