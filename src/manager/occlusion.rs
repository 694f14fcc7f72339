//! Per-layer occlusion culling
//!
//! Walks one layer's entries from the top down and decides which of them
//! can be hidden because shown windows above already cover them. This is
//! a conservative bounding-box heuristic, not a pixel test: a window is
//! hidden only when the accumulated covered area fully contains it.

use crate::config::OcclusionConfig;
use crate::controller::ViewController;
use crate::geometry::{Rect, Size};

/// What occlusion needs to know about one entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionInput {
    /// Loaded, shown, not bordered and not mask-ignoring
    pub participates: bool,
    /// Entrance tween done; only settled entries add to the covered area
    pub settled: bool,
    /// Not lucent and sized full or mix-full
    pub opaque_full: bool,
    pub bounds: Rect,
}

impl OcclusionInput {
    pub fn of(controller: &ViewController, stage: Size) -> Self {
        let descriptor = controller.descriptor();
        let participates = controller.state().has_content()
            && controller.is_shown()
            && !descriptor.border
            && !descriptor.mask_ignore;

        // Full-size content covers the stage whatever its node reports
        let bounds = if descriptor.size_mode.is_full() {
            Rect::stage(stage)
        } else {
            controller.bounds().unwrap_or_else(|| Rect::stage(stage))
        };

        Self {
            participates,
            settled: !controller.is_tweening(),
            opaque_full: descriptor.is_opaque_full(),
            bounds,
        }
    }
}

/// Resolve one layer. `entries` are ordered top-most first; the result has
/// one slot per entry: `Some(occluded)` for participants, `None` for
/// entries that were skipped.
pub fn resolve_layer(entries: &[OcclusionInput], policy: &OcclusionConfig) -> Vec<Option<bool>> {
    let margin = policy.inflation();
    let mut blocked = false;
    let mut covered: Option<Rect> = None;

    entries
        .iter()
        .map(|entry| {
            if !entry.participates {
                return None;
            }
            if !policy.enabled {
                return Some(false);
            }
            if blocked {
                return Some(true);
            }
            if covered.map_or(false, |area| area.contains_rect(&entry.bounds)) {
                return Some(true);
            }
            if !entry.settled {
                return Some(false);
            }

            if entry.opaque_full && policy.opaque_full_blocks {
                blocked = true;
            }
            let grown = entry.bounds.inflate(margin);
            covered = Some(match covered {
                Some(area) => area.union(&grown),
                None => grown,
            });
            Some(false)
        })
        .collect()
}
