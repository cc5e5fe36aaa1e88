//! Frame/second conversion shared by the codec and playback.

/// Number of frames covering `duration` seconds, rounding partial frames up.
pub fn frame_count(duration: f64, fps: f64) -> u32 {
    if !(duration > 0.0) || !(fps > 0.0) {
        return 0;
    }
    (duration * fps).ceil() as u32
}

/// Nearest whole frame for a time in seconds.
pub fn seconds_to_frame(time: f64, fps: f64) -> i64 {
    (time * fps).round() as i64
}

pub fn frame_to_seconds(frame: f64, fps: f64) -> f64 {
    if fps > 0.0 {
        frame / fps
    } else {
        0.0
    }
}

/// Length of one frame in seconds.
pub fn frame_duration(fps: f64) -> f64 {
    frame_to_seconds(1.0, fps)
}
