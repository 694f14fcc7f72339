//! Per-window lifecycle controller
//!
//! ```text
//! Unloaded ──open──► Loading ──content bound──► Loaded ──next tick──► Opened
//!                       │
//!                       └──load/content error──► Failed
//! any live state ──close──► Closed
//! ```
//!
//! `Closed` and `Failed` are terminal. The controller only mutates its own
//! state and content; stack placement, occlusion and the mask belong to
//! the [`ViewManager`](crate::manager::ViewManager).

use cgmath::Point2;
use log::debug;
use std::fmt;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::TweenConfig;
use crate::effects::EntranceTween;
use crate::error::ViewError;
use crate::geometry::Rect;
use crate::host::{PackageHandle, ViewContent};
use crate::layer::Layer;
use crate::registry::{SizeMode, ViewDescriptor};
use crate::stack::StackEntry;

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    Unloaded,
    Loading,
    Loaded,
    Opened,
    Closed,
    Failed,
}

impl ViewState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ViewState::Closed | ViewState::Failed)
    }

    /// Content exists and can take part in occlusion
    pub fn has_content(self) -> bool {
        matches!(self, ViewState::Loaded | ViewState::Opened)
    }
}

/// Unique per controller instance, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an `open()` future resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub key: String,
    pub control_key: String,
    pub id: ControllerId,
    /// Host should run its post-open screen effect for this window
    pub after_effect: bool,
}

/// Arguments to `open()`
#[derive(Debug, Clone, PartialEq)]
pub struct OpenParams {
    /// Payload handed to the open hook
    pub data: serde_json::Value,
    /// Distinguishes several live instances of the same window class
    pub control_key: Option<String>,
    /// Overrides the registered size mode for this instance
    pub size_mode: Option<SizeMode>,
    /// Overrides the content position once it is bound
    pub position: Option<Point2<f32>>,
    /// Caller-requested visibility, applied on every open including
    /// re-opens of a live window
    pub show: bool,
}

impl Default for OpenParams {
    fn default() -> Self {
        Self {
            data: serde_json::Value::Null,
            control_key: None,
            size_mode: None,
            position: None,
            show: true,
        }
    }
}

impl OpenParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn control_key(mut self, control_key: impl Into<String>) -> Self {
        self.control_key = Some(control_key.into());
        self
    }

    pub fn size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = Some(size_mode);
        self
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Point2::new(x, y));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show = false;
        self
    }
}

/// Outcome of calling `open` on an existing controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// First open: acquisition must start
    StartLoad,
    /// Already loading; params replaced
    Coalesced,
    /// Already opened; the open hook ran again
    Reopened,
    /// Terminal controller; nothing happened
    Ignored,
}

/// What is left to tear down after a close
pub struct Teardown {
    pub content: Option<Box<dyn ViewContent>>,
    pub package: Option<PackageHandle>,
    pub loading_shown: bool,
}

type Waiter = oneshot::Sender<Result<ViewHandle, ViewError>>;

pub struct ViewController {
    id: ControllerId,
    control_key: String,
    descriptor: ViewDescriptor,
    state: ViewState,
    /// Caller-requested visibility
    show: bool,
    /// Hidden by occlusion
    occluded: bool,
    /// Last effective visibility reported by `sync_visibility`
    synced_visible: bool,
    content: Option<Box<dyn ViewContent>>,
    package: Option<PackageHandle>,
    params: OpenParams,
    tween: Option<EntranceTween>,
    generation: u64,
    loading_shown: bool,
    waiters: Vec<Waiter>,
}

impl ViewController {
    pub fn new(id: ControllerId, control_key: impl Into<String>, descriptor: ViewDescriptor) -> Self {
        Self {
            id,
            control_key: control_key.into(),
            descriptor,
            state: ViewState::Unloaded,
            show: true,
            occluded: false,
            synced_visible: false,
            content: None,
            package: None,
            params: OpenParams::default(),
            tween: None,
            generation: 0,
            loading_shown: false,
            waiters: Vec::new(),
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn control_key(&self) -> &str {
        &self.control_key
    }

    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &OpenParams {
        &self.params
    }

    pub fn is_shown(&self) -> bool {
        self.show
    }

    pub fn is_occluded(&self) -> bool {
        self.occluded
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_some()
    }

    pub fn handle(&self) -> ViewHandle {
        ViewHandle {
            key: self.descriptor.key.clone(),
            control_key: self.control_key.clone(),
            id: self.id,
            after_effect: self.descriptor.after_effect,
        }
    }

    /// Content bound, requested visible and not occluded
    pub fn is_visible(&self) -> bool {
        self.state.has_content() && self.show && !self.occluded
    }

    pub fn content(&self) -> Option<&dyn ViewContent> {
        self.content.as_deref()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.content.as_ref().map(|content| content.bounds())
    }

    pub fn open(&mut self, params: OpenParams) -> OpenOutcome {
        match self.state {
            ViewState::Unloaded => {
                self.show = params.show;
                self.params = params;
                self.state = ViewState::Loading;
                OpenOutcome::StartLoad
            }
            ViewState::Loading | ViewState::Loaded => {
                self.show = params.show;
                self.params = params;
                OpenOutcome::Coalesced
            }
            ViewState::Opened => {
                if let Some(content) = self.content.as_mut() {
                    content.on_open(&params.data);
                }
                self.show = params.show;
                self.params = params;
                OpenOutcome::Reopened
            }
            ViewState::Closed | ViewState::Failed => OpenOutcome::Ignored,
        }
    }

    pub fn mark_loading_shown(&mut self) {
        self.loading_shown = true;
    }

    /// Returns `true` if the indicator was still shown for this controller
    pub fn take_loading_shown(&mut self) -> bool {
        std::mem::take(&mut self.loading_shown)
    }

    /// Bind freshly created content. Only valid while `Loading`; returns the
    /// generation a deferred open must match.
    pub fn bind_content(&mut self, mut content: Box<dyn ViewContent>, package: PackageHandle) -> Option<u64> {
        if self.state != ViewState::Loading {
            return None;
        }
        if let Some(position) = self.params.position {
            content.set_position(position);
        }
        content.set_visible(self.show && !self.occluded);
        self.content = Some(content);
        self.package = Some(package);
        self.state = ViewState::Loaded;
        Some(self.generation)
    }

    /// Finish a deferred open. Fires only if no close happened since the
    /// open was scheduled.
    pub fn finish_open(&mut self, generation: u64) -> bool {
        if self.state != ViewState::Loaded || self.generation != generation {
            debug!(
                "Dropping stale open for '{}' (generation {} != {})",
                self.control_key, generation, self.generation
            );
            return false;
        }
        if let Some(content) = self.content.as_mut() {
            content.on_open(&self.params.data);
            content.on_opened();
        }
        self.state = ViewState::Opened;
        true
    }

    /// Move to `Failed`. Only valid while `Loading`.
    pub fn fail(&mut self) -> bool {
        if self.state != ViewState::Loading {
            return false;
        }
        self.state = ViewState::Failed;
        self.generation += 1;
        true
    }

    /// Close from any live state. Returns `None` if already terminal.
    pub fn close(&mut self, on_close: Option<Box<dyn FnOnce()>>) -> Option<Teardown> {
        if self.state.is_terminal() {
            return None;
        }

        if self.state == ViewState::Opened {
            if let Some(content) = self.content.as_mut() {
                content.on_close();
            }
            if let Some(callback) = on_close {
                callback();
            }
        }

        if let Some(content) = self.content.as_mut() {
            content.dispose();
        }

        self.state = ViewState::Closed;
        self.generation += 1;
        self.tween = None;

        Some(Teardown {
            content: self.content.take(),
            package: self.package.take(),
            loading_shown: std::mem::take(&mut self.loading_shown),
        })
    }

    pub fn set_show(&mut self, show: bool) -> bool {
        let changed = self.show != show;
        self.show = show;
        changed
    }

    pub fn set_occluded(&mut self, occluded: bool) {
        self.occluded = occluded;
    }

    /// Push the effective visibility onto the content. Returns the new
    /// value when it differs from the last sync.
    pub fn sync_visibility(&mut self) -> Option<bool> {
        let visible = self.is_visible();
        if let Some(content) = self.content.as_mut() {
            content.set_visible(visible);
        }
        if visible == self.synced_visible {
            return None;
        }
        self.synced_visible = visible;
        Some(visible)
    }

    pub fn start_tween(&mut self, config: &TweenConfig) {
        let tween = EntranceTween::from_config(config);
        if let Some(content) = self.content.as_mut() {
            let frame = tween.current();
            content.set_alpha(frame.alpha);
            content.set_scale(frame.scale.x);
        }
        self.tween = Some(tween);
    }

    /// Advance the entrance tween; returns `true` when it just finished
    pub fn advance_tween(&mut self, dt: Duration) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        let frame = tween.advance(dt);
        if let Some(content) = self.content.as_mut() {
            content.set_alpha(frame.alpha);
            content.set_scale(frame.scale.x);
        }
        if frame.finished {
            self.tween = None;
        }
        frame.finished
    }

    pub fn add_waiter(&mut self, waiter: Waiter) {
        self.waiters.push(waiter);
    }

    pub fn resolve_waiters(&mut self, result: Result<ViewHandle, ViewError>) {
        for waiter in self.waiters.drain(..) {
            // A dropped receiver just means nobody is awaiting
            let _ = waiter.send(result.clone());
        }
    }
}

impl StackEntry for ViewController {
    fn control_key(&self) -> &str {
        &self.control_key
    }

    fn layer(&self) -> Layer {
        self.descriptor.layer
    }
}

impl fmt::Debug for ViewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewController")
            .field("id", &self.id)
            .field("control_key", &self.control_key)
            .field("layer", &self.descriptor.layer)
            .field("state", &self.state)
            .field("show", &self.show)
            .field("occluded", &self.occluded)
            .field("generation", &self.generation)
            .finish()
    }
}
