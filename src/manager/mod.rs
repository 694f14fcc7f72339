//! View stack manager
//!
//! Owns the ordered stack of live window controllers, drives their
//! lifecycle against the host collaborators, and recomputes occlusion and
//! the shared mask whenever the stack changes.
//!
//! The manager is single-threaded and cooperative. The host drives it with:
//! - [`ViewManager::complete_load`] when a package request settles,
//! - [`ViewManager::tick`] to drain deferred work (opened hooks, node
//!   destruction),
//! - [`ViewManager::update`] once per frame to advance entrance tweens.

pub mod mask;
pub mod occlusion;

use cgmath::Point2;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::ViewConfig;
use crate::controller::{
    ControllerId, OpenOutcome, OpenParams, ViewController, ViewHandle, ViewState,
};
use crate::error::ViewError;
use crate::events::{EventBus, ListenerId, ViewEvent};
use crate::host::{PackageHandle, ViewContext};
use crate::layer::Layer;
use crate::registry::{ViewRegistry, WindowDescriptor, WindowSpec};
use crate::stack::{StackEntry, ViewStack};
use crate::tasks::{TaskQueue, DESTROY_QUEUE};

pub use mask::MaskState;

/// Identifies one pending package request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub control_key: String,
    pub controller: ControllerId,
}

/// Resolves once the window is opened, or with the reason it never will be
#[must_use = "dropping the future does not cancel the open"]
#[derive(Debug)]
pub struct OpenFuture {
    key: String,
    receiver: oneshot::Receiver<Result<ViewHandle, ViewError>>,
}

impl OpenFuture {
    fn ready(key: &str, result: Result<ViewHandle, ViewError>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Self {
            key: key.to_string(),
            receiver,
        }
    }

    fn pending(key: &str) -> (Self, oneshot::Sender<Result<ViewHandle, ViewError>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                key: key.to_string(),
                receiver,
            },
            sender,
        )
    }

    /// Non-blocking check; `None` while the window is still on its way
    pub fn try_result(&mut self) -> Option<Result<ViewHandle, ViewError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(ViewError::Cancelled(self.key.clone())))
            }
        }
    }
}

impl Future for OpenFuture {
    type Output = Result<ViewHandle, ViewError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let key = self.key.clone();
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(ViewError::Cancelled(key))))
    }
}

/// Work deferred to the next tick
#[derive(Debug, Clone)]
enum Deferred {
    Opened {
        control_key: String,
        controller: ControllerId,
        generation: u64,
    },
}

pub struct ViewManager {
    config: ViewConfig,
    context: ViewContext,
    registry: ViewRegistry,
    stack: ViewStack<ViewController>,
    microtasks: VecDeque<Deferred>,
    tasks: TaskQueue,
    events: EventBus,
    mask: Option<MaskState>,
    next_controller: u64,
}

impl ViewManager {
    pub fn new(config: ViewConfig, context: ViewContext) -> Self {
        info!(
            "Initializing view manager (stage {}x{})",
            config.stage.width, config.stage.height
        );
        Self {
            config,
            context,
            registry: ViewRegistry::new(),
            stack: ViewStack::new(),
            microtasks: VecDeque::new(),
            tasks: TaskQueue::new(),
            events: EventBus::new(),
            mask: None,
            next_controller: 1,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    pub fn register(&mut self, spec: WindowSpec) -> &WindowDescriptor {
        self.registry.register(spec)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open a registered window. Re-opening a live control key reuses its
    /// controller and moves it to the top of its layer band.
    pub fn open(&mut self, key: &str, params: OpenParams) -> OpenFuture {
        let Some(descriptor) = self.registry.resolve(key) else {
            warn!("Cannot open unknown window '{}'", key);
            return OpenFuture::ready(key, Err(ViewError::UnknownWindow(key.to_string())));
        };

        let control_key = params
            .control_key
            .clone()
            .unwrap_or_else(|| key.to_string());

        if self.stack.contains(&control_key) {
            return self.reopen(&control_key, params);
        }

        let id = ControllerId(self.next_controller);
        self.next_controller += 1;

        let view = descriptor.instantiate(params.size_mode, &self.config);
        let package = view.package.clone();
        let mut controller = ViewController::new(id, control_key.clone(), view);

        let (future, waiter) = OpenFuture::pending(&control_key);
        controller.open(params);
        controller.add_waiter(waiter);

        self.context
            .loading
            .show_loading(self.config.loading.max_duration());
        controller.mark_loading_shown();

        debug!("Opening '{}' as {} (package '{}')", key, id, package);
        self.stack.push(controller);
        self.events.emit(ViewEvent::Opening {
            key: control_key.clone(),
        });

        self.context.loader.request(
            &package,
            LoadTicket {
                control_key,
                controller: id,
            },
        );

        future
    }

    /// Open by legacy numeric id
    pub fn open_by_id(&mut self, id: u32, params: OpenParams) -> OpenFuture {
        match self.registry.resolve_id(id).map(|d| d.key.clone()) {
            Some(key) => self.open(&key, params),
            None => {
                warn!("Cannot open unknown window id {}", id);
                OpenFuture::ready(&id.to_string(), Err(ViewError::UnknownWindowId(id)))
            }
        }
    }

    fn reopen(&mut self, control_key: &str, params: OpenParams) -> OpenFuture {
        let (future, waiter) = OpenFuture::pending(control_key);

        let Some(controller) = self.stack.get_mut(control_key) else {
            return OpenFuture::ready(control_key, Err(ViewError::Cancelled(control_key.to_string())));
        };
        let layer = controller.layer();

        match controller.open(params) {
            OpenOutcome::Reopened => {
                let _ = waiter.send(Ok(controller.handle()));
            }
            OpenOutcome::Coalesced => controller.add_waiter(waiter),
            OpenOutcome::StartLoad | OpenOutcome::Ignored => {
                let _ = waiter.send(Err(ViewError::Cancelled(control_key.to_string())));
            }
        }

        debug!("Re-opening '{}'", control_key);
        self.stack.reinsert(control_key);
        self.refresh_layer(layer);
        self.refresh_mask();

        future
    }

    /// Report the outcome of a package request made through the loader.
    ///
    /// Completions for controllers that were closed (or replaced) in the
    /// meantime are discarded and their package reference released.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<PackageHandle, String>) {
        let live = self
            .stack
            .get(&ticket.control_key)
            .map(|controller| (controller.id(), controller.state()));

        if live != Some((ticket.controller, ViewState::Loading)) {
            debug!(
                "Discarding stale load completion for '{}' ({})",
                ticket.control_key, ticket.controller
            );
            if let Ok(handle) = result {
                self.context.loader.release(&handle);
            }
            return;
        }

        let package = match result {
            Ok(package) => package,
            Err(reason) => {
                error!("Failed to load package for '{}': {}", ticket.control_key, reason);
                let failure = ViewError::LoadFailed {
                    key: ticket.control_key.clone(),
                    reason,
                };
                self.fail(&ticket.control_key, failure);
                return;
            }
        };

        let Some(controller) = self.stack.get_mut(&ticket.control_key) else {
            return;
        };

        let content = match self.context.factory.create(controller.descriptor(), &package) {
            Ok(content) => content,
            Err(reason) => {
                error!("Failed to create content for '{}': {}", ticket.control_key, reason);
                self.context.loader.release(&package);
                let failure = ViewError::ContentFailed {
                    key: ticket.control_key.clone(),
                    reason,
                };
                self.fail(&ticket.control_key, failure);
                return;
            }
        };

        let Some(generation) = controller.bind_content(content, package) else {
            return;
        };
        let layer = controller.layer();

        let tween = controller.descriptor().tween && self.config.tween.enabled && controller.is_shown();
        if tween {
            controller.start_tween(&self.config.tween);
        } else if controller.take_loading_shown() {
            self.context.loading.hide_loading();
        }

        self.microtasks.push_back(Deferred::Opened {
            control_key: ticket.control_key.clone(),
            controller: ticket.controller,
            generation,
        });

        debug!("Loaded '{}' into layer {}", ticket.control_key, layer);
        self.events.emit(ViewEvent::Loaded {
            key: ticket.control_key,
        });

        // A tweening window is still occludable but adds no cover and no
        // mask until `update` sees its tween finish
        self.refresh_layer(layer);
        if !tween {
            self.refresh_mask();
        }
    }

    fn fail(&mut self, control_key: &str, failure: ViewError) {
        let Some(mut controller) = self.stack.remove(control_key) else {
            return;
        };
        controller.fail();
        if controller.take_loading_shown() {
            self.context.loading.hide_loading();
        }
        controller.resolve_waiters(Err(failure.clone()));

        self.events.emit(ViewEvent::Failed {
            key: control_key.to_string(),
            reason: failure.to_string(),
        });

        self.refresh_layer(controller.layer());
        self.refresh_mask();
    }

    /// Close a live window. Returns `false` when nothing was open under
    /// that control key.
    pub fn close(&mut self, control_key: &str) -> bool {
        self.close_with(control_key, None)
    }

    /// Close with a callback that runs after the close hook, only if the
    /// window had reached `Opened`
    pub fn close_with(&mut self, control_key: &str, on_close: Option<Box<dyn FnOnce()>>) -> bool {
        let Some(mut controller) = self.stack.remove(control_key) else {
            debug!("Ignoring close for '{}': not open", control_key);
            return false;
        };
        let layer = controller.layer();

        let Some(teardown) = controller.close(on_close) else {
            return false;
        };

        if teardown.loading_shown {
            self.context.loading.hide_loading();
        }
        if let Some(package) = teardown.package {
            self.context.loader.release(&package);
        }
        if let Some(mut content) = teardown.content {
            self.tasks.enqueue(DESTROY_QUEUE, move || content.destroy());
        }

        controller.resolve_waiters(Err(ViewError::Cancelled(control_key.to_string())));

        info!("Closed '{}'", control_key);
        self.events.emit(ViewEvent::Closed {
            key: control_key.to_string(),
        });

        self.refresh_layer(layer);
        self.refresh_mask();
        true
    }

    /// Close every window in a layer, top-most first. Returns how many closed.
    pub fn close_layer(&mut self, layer: Layer) -> usize {
        let keys: Vec<String> = self
            .stack
            .layer_positions(layer)
            .into_iter()
            .filter_map(|pos| self.stack.at(pos).map(|c| c.control_key().to_string()))
            .collect();

        keys.iter().filter(|key| self.close(key)).count()
    }

    /// Close everything, top-most first. Returns how many closed.
    pub fn close_all(&mut self) -> usize {
        let keys: Vec<String> = self
            .stack
            .iter()
            .rev()
            .map(|c| c.control_key().to_string())
            .collect();

        keys.iter().filter(|key| self.close(key)).count()
    }

    /// Caller-driven show/hide. Returns `false` for unknown keys.
    pub fn set_visible(&mut self, control_key: &str, show: bool) -> bool {
        let Some(controller) = self.stack.get_mut(control_key) else {
            return false;
        };
        let layer = controller.layer();
        if controller.set_show(show) {
            self.refresh_layer(layer);
            self.refresh_mask();
        }
        true
    }

    pub fn show(&mut self, control_key: &str) -> bool {
        self.set_visible(control_key, true)
    }

    pub fn hide(&mut self, control_key: &str) -> bool {
        self.set_visible(control_key, false)
    }

    /// Dismiss the top visible window if the click landed outside it and it
    /// allows click-out. Returns the closed control key.
    pub fn click_outside(&mut self, point: Point2<f32>) -> Option<String> {
        let position = self.top_visible_position(None, false)?;
        let controller = self.stack.at(position)?;

        if !controller.descriptor().clickout {
            return None;
        }
        let inside = controller
            .bounds()
            .map_or(false, |bounds| bounds.contains_point(point));
        if inside {
            return None;
        }

        let key = controller.control_key().to_string();
        self.close(&key).then_some(key)
    }

    /// Drain deferred work: opened hooks first, then node destruction
    pub fn tick(&mut self) {
        let pending: Vec<Deferred> = self.microtasks.drain(..).collect();

        for task in pending {
            match task {
                Deferred::Opened {
                    control_key,
                    controller,
                    generation,
                } => {
                    let Some(entry) = self.stack.get_mut(&control_key) else {
                        debug!("Deferred open for '{}' found no controller", control_key);
                        continue;
                    };
                    if entry.id() != controller || !entry.finish_open(generation) {
                        continue;
                    }
                    entry.resolve_waiters(Ok(entry.handle()));

                    info!("Opened '{}'", control_key);
                    self.events.emit(ViewEvent::Opened { key: control_key });
                }
            }
        }

        self.tasks.run_pending();
    }

    /// Per-frame update: advance entrance tweens, then tick
    pub fn update(&mut self, dt: Duration) {
        let mut finished = Vec::new();
        for controller in self.stack.iter_mut() {
            if controller.advance_tween(dt) {
                finished.push(controller.control_key().to_string());
            }
        }

        let mut layers = Vec::new();
        for key in &finished {
            if let Some(controller) = self.stack.get_mut(key) {
                if controller.take_loading_shown() {
                    self.context.loading.hide_loading();
                }
                if !layers.contains(&controller.layer()) {
                    layers.push(controller.layer());
                }
            }
            self.events.emit(ViewEvent::TweenFinished { key: key.clone() });
        }
        for layer in layers {
            self.refresh_layer(layer);
        }
        if !finished.is_empty() {
            self.refresh_mask();
        }

        self.tick();
    }

    /// Scan from the top (or `from`) down for the first visible window,
    /// skipping bordered windows unless asked and mask-ignoring ones always
    pub fn top_visible(&self, from: Option<usize>, include_bordered: bool) -> Option<&ViewController> {
        self.top_visible_position(from, include_bordered)
            .and_then(|pos| self.stack.at(pos))
    }

    fn top_visible_position(&self, from: Option<usize>, include_bordered: bool) -> Option<usize> {
        let start = match from {
            Some(index) if index >= self.stack.len() => return None,
            Some(index) => index,
            None => self.stack.len().checked_sub(1)?,
        };

        (0..=start).rev().find(|&pos| {
            self.stack.at(pos).map_or(false, |controller| {
                let descriptor = controller.descriptor();
                controller.is_visible()
                    && (include_bordered || !descriptor.border)
                    && !descriptor.mask_ignore
            })
        })
    }

    /// Top visible window that has finished tweening in
    fn settled_top_position(&self) -> Option<usize> {
        let mut from = self.stack.len().checked_sub(1)?;
        loop {
            let pos = self.top_visible_position(Some(from), false)?;
            if self.stack.at(pos).map_or(false, |c| !c.is_tweening()) {
                return Some(pos);
            }
            from = pos.checked_sub(1)?;
        }
    }

    /// Recompute occlusion for one layer and push visibility to content
    fn refresh_layer(&mut self, layer: Layer) {
        let stage = self.config.stage.size();
        let positions = self.stack.layer_positions(layer);
        let inputs: Vec<_> = positions
            .iter()
            .filter_map(|&pos| self.stack.at(pos))
            .map(|controller| occlusion::OcclusionInput::of(controller, stage))
            .collect();

        let resolved = occlusion::resolve_layer(&inputs, &self.config.occlusion);

        let mut changes = Vec::new();
        for (&pos, occluded) in positions.iter().zip(resolved) {
            let Some(controller) = self.stack.at_mut(pos) else {
                continue;
            };
            controller.set_occluded(occluded.unwrap_or(false));
            if let Some(visible) = controller.sync_visibility() {
                changes.push((controller.control_key().to_string(), visible));
            }
        }

        debug!("Occlusion for layer {}: {} change(s)", layer, changes.len());
        for (key, visible) in changes {
            self.events.emit(ViewEvent::VisibilityChanged { key, visible });
        }
    }

    /// Re-place the shared mask and notify the surface on change
    fn refresh_mask(&mut self) {
        let probes: Vec<_> = self.stack.iter().map(mask::MaskProbe::of).collect();
        let next = mask::compute(&probes, self.settled_top_position());

        if next == self.mask {
            return;
        }

        match (&self.mask, &next) {
            (_, None) => {
                debug!("Detaching mask");
                self.context.mask.detach();
            }
            (previous, Some(state)) => {
                let moved = previous
                    .as_ref()
                    .map_or(true, |p| p.layer != state.layer || p.anchor != state.anchor);
                if moved {
                    debug!("Attaching mask under '{}' in layer {}", state.anchor, state.layer);
                    self.context.mask.attach(state.layer, &state.anchor);
                }
                self.context.mask.set_alpha(state.alpha);
            }
        }

        self.events.emit(ViewEvent::MaskChanged {
            anchor: next.as_ref().map(|s| (s.layer, s.anchor.clone())),
            alpha: next.as_ref().map_or(0.0, |s| s.alpha),
        });
        self.mask = next;
    }

    pub fn mask(&self) -> Option<&MaskState> {
        self.mask.as_ref()
    }

    pub fn controller(&self, control_key: &str) -> Option<&ViewController> {
        self.stack.get(control_key)
    }

    /// State of the live controller, `None` when nothing is open under the key
    pub fn state(&self, control_key: &str) -> Option<ViewState> {
        self.stack.get(control_key).map(ViewController::state)
    }

    pub fn is_open(&self, control_key: &str) -> bool {
        self.state(control_key) == Some(ViewState::Opened)
    }

    pub fn is_effectively_visible(&self, control_key: &str) -> bool {
        self.stack
            .get(control_key)
            .map_or(false, ViewController::is_visible)
    }

    /// Control keys bottom to top
    pub fn stack_keys(&self) -> Vec<&str> {
        self.stack.keys()
    }

    pub fn controllers(&self) -> impl DoubleEndedIterator<Item = &ViewController> {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Destruction tasks still waiting for the next tick
    pub fn pending_destroys(&self) -> usize {
        self.tasks.pending(DESTROY_QUEUE)
    }
}

impl std::fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewManager")
            .field("stack", &self.stack)
            .field("mask", &self.mask)
            .field("microtasks", &self.microtasks.len())
            .field("tasks", &self.tasks)
            .finish()
    }
}
