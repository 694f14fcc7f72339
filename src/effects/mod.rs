//! Visual effects for view transitions
//!
//! Only the entrance tween lives here: alpha and scale driven from their
//! start values to 1.0 when a window first appears.

pub mod tween;

pub use tween::{EasingCurve, EntranceTween, TweenFrame};
