//! Timeline playback: a small state machine advancing the current time.

use crate::model::ModelError;
use crate::time;
use std::time::Instant;

/// Monotonic time source, in seconds from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall-clock time since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Paused,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Loop,
    PlayOnce,
}

type UpdateCallback = Box<dyn FnMut(f64)>;

pub struct PlaybackEngine<C: Clock = SystemClock> {
    clock: C,
    state: PlaybackState,
    current_time: f64,
    duration: f64,
    fps: f64,
    loop_mode: LoopMode,
    last_tick: Option<f64>,
    on_update: Option<UpdateCallback>,
}

impl PlaybackEngine<SystemClock> {
    pub fn new(duration: f64, fps: f64) -> Result<Self, ModelError> {
        Self::with_clock(SystemClock::new(), duration, fps)
    }
}

impl<C: Clock> PlaybackEngine<C> {
    pub fn with_clock(clock: C, duration: f64, fps: f64) -> Result<Self, ModelError> {
        validate_fps(fps)?;
        Ok(PlaybackEngine {
            clock,
            state: PlaybackState::Stopped,
            current_time: 0.0,
            duration: duration.max(0.0),
            fps,
            loop_mode: LoopMode::Loop,
            last_tick: None,
            on_update: None,
        })
    }

    /// Register the callback invoked with the current time after every
    /// tick, seek, step and stop.
    pub fn on_update(&mut self, callback: impl FnMut(f64) + 'static) {
        self.on_update = Some(Box::new(callback));
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn current_frame(&self) -> i64 {
        time::seconds_to_frame(self.current_time, self.fps)
    }

    pub fn total_frames(&self) -> u32 {
        time::frame_count(self.duration, self.fps)
    }

    /// Start playing from the current time. Does nothing at the end of the
    /// timeline or when already playing.
    pub fn play(&mut self) {
        if self.is_playing() || self.current_time >= self.duration {
            return;
        }
        self.state = PlaybackState::Playing;
        self.last_tick = Some(self.clock.now());
        tracing::debug!("Playback started at {:.3}s", self.current_time);
    }

    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = PlaybackState::Paused;
            self.last_tick = None;
        }
    }

    /// Stop and rewind to the start.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.last_tick = None;
        self.current_time = 0.0;
        self.notify();
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance by the wall-clock time elapsed since the previous tick.
    pub fn tick(&mut self) {
        if !self.is_playing() {
            return;
        }
        let now = self.clock.now();
        let dt = self.last_tick.map_or(0.0, |last| now - last);
        self.last_tick = Some(now);
        self.advance(dt);
    }

    /// Advance a playing timeline by `dt` seconds, wrapping or stopping at
    /// the end depending on the loop mode.
    pub fn advance(&mut self, dt: f64) {
        if !self.is_playing() {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.current_time += dt;

        if self.current_time >= self.duration {
            match self.loop_mode {
                LoopMode::Loop if self.duration > 0.0 => {
                    self.current_time %= self.duration;
                }
                LoopMode::Loop | LoopMode::PlayOnce => {
                    self.current_time = self.duration;
                    self.state = PlaybackState::Paused;
                    self.last_tick = None;
                    tracing::debug!("Playback reached the end at {:.3}s", self.duration);
                }
            }
        }
        self.notify();
    }

    pub fn seek(&mut self, time: f64) {
        self.current_time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration)
        };
        self.notify();
    }

    pub fn step_forward(&mut self) {
        self.seek(self.current_time + time::frame_duration(self.fps));
    }

    pub fn step_backward(&mut self) {
        self.seek(self.current_time - time::frame_duration(self.fps));
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        if self.current_time > self.duration {
            self.current_time = self.duration;
        }
    }

    pub fn set_fps(&mut self, fps: f64) -> Result<(), ModelError> {
        validate_fps(fps)?;
        self.fps = fps;
        Ok(())
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    fn notify(&mut self) {
        let time = self.current_time;
        if let Some(callback) = self.on_update.as_mut() {
            callback(time);
        }
    }
}

fn validate_fps(fps: f64) -> Result<(), ModelError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidFrameRate { fps })
    }
}
