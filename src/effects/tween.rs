//! Entrance tween for newly opened windows
//!
//! A tween is advanced by the host's per-frame update with the elapsed
//! frame time; it never reads a clock itself, which keeps it deterministic
//! under test.

use cgmath::Vector2;
use log::debug;
use std::str::FromStr;
use std::time::Duration;

use crate::config::TweenConfig;

/// Easing curves for animations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EasingCurve {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl EasingCurve {
    /// Map linear progress in [0, 1] through the curve
    pub fn apply(self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);

        match self {
            EasingCurve::Linear => t,
            EasingCurve::EaseIn => t * t,
            EasingCurve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            EasingCurve::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

impl FromStr for EasingCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(EasingCurve::Linear),
            "ease-in" => Ok(EasingCurve::EaseIn),
            "ease-out" => Ok(EasingCurve::EaseOut),
            "ease-in-out" => Ok(EasingCurve::EaseInOut),
            other => Err(format!("unknown easing curve '{}'", other)),
        }
    }
}

/// Values to push onto the content for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenFrame {
    pub alpha: f32,
    pub scale: Vector2<f32>,
    pub finished: bool,
}

/// Alpha/scale 0 -> 1 entrance animation
#[derive(Debug, Clone)]
pub struct EntranceTween {
    elapsed: Duration,
    duration: Duration,
    curve: EasingCurve,
    start_scale: f32,
}

impl EntranceTween {
    pub fn new(duration: Duration, curve: EasingCurve, start_scale: f32) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
            curve,
            start_scale,
        }
    }

    /// Build from configuration; an unknown curve name falls back to ease-out
    pub fn from_config(config: &TweenConfig) -> Self {
        let curve = config.curve.parse().unwrap_or_else(|err| {
            debug!("{}, using ease-out", err);
            EasingCurve::EaseOut
        });
        Self::new(config.duration(), curve, config.start_scale)
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Values at the current progress without advancing
    pub fn current(&self) -> TweenFrame {
        let eased = self.curve.apply(self.progress());
        let scale = self.start_scale + (1.0 - self.start_scale) * eased;
        TweenFrame {
            alpha: eased,
            scale: Vector2::new(scale, scale),
            finished: self.is_finished(),
        }
    }

    /// Advance by one frame
    pub fn advance(&mut self, dt: Duration) -> TweenFrame {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }
}
