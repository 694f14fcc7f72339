//! Shared dimming mask placement
//!
//! The mask sits directly below the top-most visible, non-bordered window
//! and takes the strongest mask request among the windows of that
//! window's layer band, walking down until the band ends or an opaque
//! full-size window is reached.

use crate::controller::ViewController;
use crate::layer::Layer;

/// Where the mask is attached and how dark it is
#[derive(Debug, Clone, PartialEq)]
pub struct MaskState {
    pub layer: Layer,
    /// Control key of the window the mask sits under
    pub anchor: String,
    pub alpha: f32,
}

/// What mask placement needs to know about one entry
#[derive(Debug, Clone, PartialEq)]
pub struct MaskProbe {
    pub control_key: String,
    pub layer: Layer,
    /// Loaded, requested visible and done tweening in; occlusion does not
    /// matter here
    pub shown: bool,
    pub mask: Option<f32>,
    pub opaque_full: bool,
}

impl MaskProbe {
    pub fn of(controller: &ViewController) -> Self {
        let descriptor = controller.descriptor();
        Self {
            control_key: controller.control_key().to_string(),
            layer: descriptor.layer,
            shown: controller.state().has_content()
                && controller.is_shown()
                && !controller.is_tweening(),
            mask: descriptor.mask,
            opaque_full: descriptor.is_opaque_full(),
        }
    }
}

/// Compute the mask for a bottom-to-top list of probes given the position
/// of the top visible window. `None` means the mask should be detached.
pub fn compute(probes: &[MaskProbe], top: Option<usize>) -> Option<MaskState> {
    let top = top?;
    let anchor = probes.get(top)?;

    let mut alpha: Option<f32> = None;
    for probe in probes[..=top].iter().rev() {
        if probe.layer != anchor.layer {
            break;
        }
        if !probe.shown {
            continue;
        }
        if let Some(requested) = probe.mask {
            alpha = Some(alpha.map_or(requested, |current| current.max(requested)));
        }
        if probe.opaque_full {
            break;
        }
    }

    alpha.map(|alpha| MaskState {
        layer: anchor.layer,
        anchor: anchor.control_key.clone(),
        alpha,
    })
}
