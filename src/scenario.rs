//! Scripted, headless runs of the view manager
//!
//! A scenario is a TOML file that registers window classes and replays a
//! list of steps against a [`ViewManager`] wired to in-process
//! collaborators. Package loads settle after each step unless
//! `auto_settle` is turned off, in which case an explicit `settle` step
//! completes them.
//!
//! ```toml
//! [[windows]]
//! key = "Inventory"
//! mask = { opacity = 0.8 }
//!
//! [bounds.Inventory]
//! x = 340.0
//! y = 160.0
//! width = 600.0
//! height = 400.0
//!
//! [[steps]]
//! action = "open"
//! key = "Inventory"
//! ```

use anyhow::{Context, Result};
use cgmath::Point2;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::config::ViewConfig;
use crate::controller::{OpenParams, ViewState};
use crate::geometry::Rect;
use crate::host::{ContentFactory, PackageHandle, PackageLoader, ViewContent, ViewContext};
use crate::layer::Layer;
use crate::manager::{LoadTicket, MaskState, OpenFuture, ViewManager};
use crate::registry::{SizeMode, ViewDescriptor, WindowSpec};
use crate::stack::StackEntry;

/// Content size used when a scenario gives no bounds for a window
const DEFAULT_CONTENT_SIZE: (f32, f32) = (640.0, 360.0);

fn default_frame_ms() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Open {
        key: String,
        #[serde(default)]
        control_key: Option<String>,
        #[serde(default)]
        size_mode: Option<SizeMode>,
        #[serde(default)]
        data: Option<serde_json::Value>,
        #[serde(default)]
        hidden: bool,
    },
    Close {
        key: String,
    },
    CloseAll,
    CloseLayer {
        layer: Layer,
    },
    Show {
        key: String,
    },
    Hide {
        key: String,
    },
    Click {
        x: f32,
        y: f32,
    },
    Frame {
        #[serde(default = "default_frame_ms")]
        ms: u64,
    },
    /// Complete every pending package load, then tick
    Settle,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Open {
                key, control_key, ..
            } => match control_key {
                Some(control_key) => write!(f, "open {} as {}", key, control_key),
                None => write!(f, "open {}", key),
            },
            Step::Close { key } => write!(f, "close {}", key),
            Step::CloseAll => write!(f, "close all"),
            Step::CloseLayer { layer } => write!(f, "close layer {}", layer),
            Step::Show { key } => write!(f, "show {}", key),
            Step::Hide { key } => write!(f, "hide {}", key),
            Step::Click { x, y } => write!(f, "click ({}, {})", x, y),
            Step::Frame { ms } => write!(f, "frame {}ms", ms),
            Step::Settle => write!(f, "settle"),
        }
    }
}

/// A scenario script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub windows: Vec<WindowSpec>,

    /// Content bounds per window key
    #[serde(default)]
    pub bounds: HashMap<String, Rect>,

    /// Packages whose load fails
    #[serde(default)]
    pub failing: Vec<String>,

    /// Settle loads after every step
    #[serde(default = "default_true")]
    pub auto_settle: bool,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        for window in &scenario.windows {
            if window.key.is_empty() {
                anyhow::bail!("Window entries need a non-empty key");
            }
        }
        Ok(scenario)
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    pending: Vec<(String, LoadTicket)>,
    failing: HashSet<String>,
    next_id: u64,
    loaded: usize,
    released: usize,
}

/// Package loader that queues requests until [`ScriptedLoader::drain`]
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoader {
    state: Rc<RefCell<LoaderState>>,
}

impl ScriptedLoader {
    pub fn with_failing<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let loader = Self::default();
        loader.state.borrow_mut().failing = packages.into_iter().map(Into::into).collect();
        loader
    }

    /// Settle every queued request in submission order
    pub fn drain(&self) -> Vec<(LoadTicket, Result<PackageHandle, String>)> {
        let mut state = self.state.borrow_mut();
        let pending = std::mem::take(&mut state.pending);

        pending
            .into_iter()
            .map(|(package, ticket)| {
                if state.failing.contains(&package) {
                    return (ticket, Err(format!("package '{}' not found", package)));
                }
                state.next_id += 1;
                state.loaded += 1;
                (ticket, Ok(PackageHandle::new(package, state.next_id)))
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Package references currently held
    pub fn held(&self) -> usize {
        let state = self.state.borrow();
        state.loaded.saturating_sub(state.released)
    }
}

impl PackageLoader for ScriptedLoader {
    fn request(&mut self, package: &str, ticket: LoadTicket) {
        debug!("Queueing load of '{}' for {}", package, ticket.controller);
        self.state
            .borrow_mut()
            .pending
            .push((package.to_string(), ticket));
    }

    fn release(&mut self, handle: &PackageHandle) {
        debug!("Releasing package '{}' ({})", handle.name, handle.id);
        self.state.borrow_mut().released += 1;
    }
}

/// Content node that only tracks geometry and visibility
#[derive(Debug)]
pub struct ScriptedContent {
    bounds: Rect,
    visible: bool,
}

impl ScriptedContent {
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl ViewContent for ScriptedContent {
    fn on_open(&mut self, params: &serde_json::Value) {
        if !params.is_null() {
            debug!("Content opened with {}", params);
        }
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_position(&mut self, position: Point2<f32>) {
        self.bounds = Rect::new(position.x, position.y, self.bounds.width, self.bounds.height);
    }
}

/// Builds [`ScriptedContent`] with per-key bounds
#[derive(Debug, Clone, Default)]
pub struct ScriptedContentFactory {
    bounds: HashMap<String, Rect>,
}

impl ScriptedContentFactory {
    pub fn new(bounds: HashMap<String, Rect>) -> Self {
        Self { bounds }
    }
}

impl ContentFactory for ScriptedContentFactory {
    fn create(
        &mut self,
        descriptor: &ViewDescriptor,
        _package: &PackageHandle,
    ) -> Result<Box<dyn ViewContent>, String> {
        let (width, height) = DEFAULT_CONTENT_SIZE;
        let bounds = self
            .bounds
            .get(&descriptor.key)
            .copied()
            .unwrap_or_else(|| Rect::new(0.0, 0.0, width, height));

        Ok(Box::new(ScriptedContent {
            bounds,
            visible: false,
        }))
    }
}

/// One stack entry as seen after a step
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub control_key: String,
    pub layer: Layer,
    pub state: ViewState,
    pub visible: bool,
}

/// Manager state after a step
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: String,
    /// Bottom to top
    pub stack: Vec<EntrySnapshot>,
    pub mask: Option<MaskState>,
    /// Open results that resolved during the step
    pub notes: Vec<String>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "> {}", self.step)?;
        for note in &self.notes {
            writeln!(f, "  ! {}", note)?;
        }
        for (index, entry) in self.stack.iter().enumerate() {
            writeln!(
                f,
                "  {:>2} {:<20} {:<15} {:<9} {}",
                index,
                entry.control_key,
                entry.layer.to_string(),
                format!("{:?}", entry.state).to_lowercase(),
                if entry.visible { "visible" } else { "hidden" }
            )?;
        }
        match &self.mask {
            Some(mask) => writeln!(
                f,
                "  mask: {} under '{}' alpha {:.2}",
                mask.layer, mask.anchor, mask.alpha
            ),
            None => writeln!(f, "  mask: detached"),
        }
    }
}

/// Drives a [`ViewManager`] through a scenario
pub struct ScenarioRunner {
    manager: ViewManager,
    loader: ScriptedLoader,
    auto_settle: bool,
    waiting: Vec<OpenFuture>,
}

impl ScenarioRunner {
    pub fn new(config: ViewConfig, scenario: &Scenario) -> Result<Self> {
        config.validate()?;

        let loader = ScriptedLoader::with_failing(scenario.failing.iter().cloned());
        let context = ViewContext::new(
            Box::new(loader.clone()),
            Box::new(ScriptedContentFactory::new(scenario.bounds.clone())),
        );

        let mut manager = ViewManager::new(config, context);
        for window in &scenario.windows {
            manager.register(window.clone());
        }
        info!("Registered {} window(s)", manager.registry().len());

        Ok(Self {
            manager,
            loader,
            auto_settle: scenario.auto_settle,
            waiting: Vec::new(),
        })
    }

    pub fn manager(&self) -> &ViewManager {
        &self.manager
    }

    pub fn loader(&self) -> &ScriptedLoader {
        &self.loader
    }

    /// Run every step, returning a snapshot after each
    pub fn run(&mut self, steps: &[Step]) -> Vec<Snapshot> {
        steps.iter().map(|step| self.apply(step)).collect()
    }

    pub fn apply(&mut self, step: &Step) -> Snapshot {
        debug!("Step: {}", step);

        match step {
            Step::Open {
                key,
                control_key,
                size_mode,
                data,
                hidden,
            } => {
                let mut params = OpenParams::with_data(data.clone().unwrap_or_default());
                params.control_key = control_key.clone();
                params.size_mode = *size_mode;
                if *hidden {
                    params = params.hidden();
                }
                let future = self.manager.open(key, params);
                self.waiting.push(future);
            }
            Step::Close { key } => {
                if !self.manager.close(key) {
                    warn!("'{}' is not open", key);
                }
            }
            Step::CloseAll => {
                self.manager.close_all();
            }
            Step::CloseLayer { layer } => {
                self.manager.close_layer(*layer);
            }
            Step::Show { key } => {
                self.manager.show(key);
            }
            Step::Hide { key } => {
                self.manager.hide(key);
            }
            Step::Click { x, y } => {
                if let Some(closed) = self.manager.click_outside(Point2::new(*x, *y)) {
                    info!("Click dismissed '{}'", closed);
                }
            }
            Step::Frame { ms } => self.manager.update(Duration::from_millis(*ms)),
            Step::Settle => self.settle(),
        }

        if self.auto_settle {
            self.settle();
        }

        self.snapshot(step.to_string())
    }

    /// Complete pending loads and drain deferred work
    pub fn settle(&mut self) {
        for (ticket, result) in self.loader.drain() {
            self.manager.complete_load(ticket, result);
        }
        self.manager.tick();
    }

    fn collect_notes(&mut self) -> Vec<String> {
        let mut notes = Vec::new();
        self.waiting.retain_mut(|future| match future.try_result() {
            None => true,
            Some(Ok(handle)) => {
                notes.push(format!("{} opened ({})", handle.control_key, handle.id));
                false
            }
            Some(Err(error)) => {
                notes.push(error.to_string());
                false
            }
        });
        notes
    }

    fn snapshot(&mut self, step: String) -> Snapshot {
        let notes = self.collect_notes();
        let stack = self
            .manager
            .controllers()
            .map(|controller| EntrySnapshot {
                control_key: controller.control_key().to_string(),
                layer: controller.layer(),
                state: controller.state(),
                visible: controller.is_visible(),
            })
            .collect();

        Snapshot {
            step,
            stack,
            mask: self.manager.mask().cloned(),
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVENTORY: &str = r#"
[[windows]]
key = "MainHUD"
layer = "main"
border = true

[[windows]]
key = "Inventory"
layer = "pop-window"
size_mode = "normal"
mask = { opacity = 0.8 }

[[steps]]
action = "open"
key = "MainHUD"

[[steps]]
action = "open"
key = "Inventory"
data = { tab = "weapons" }

[[steps]]
action = "frame"
ms = 250
"#;

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::parse(INVENTORY).unwrap();
        assert_eq!(scenario.windows.len(), 2);
        assert!(scenario.auto_settle);
        assert_eq!(scenario.steps[0].to_string(), "open MainHUD");
        assert!(matches!(
            &scenario.steps[1],
            Step::Open { data: Some(data), .. } if data["tab"] == "weapons"
        ));
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        assert!(Scenario::parse("[[windows]]\nlayer = \"dialog\"\n").is_err());
    }

    #[test]
    fn test_inventory_over_hud() {
        let scenario = Scenario::parse(INVENTORY).unwrap();
        let mut runner = ScenarioRunner::new(ViewConfig::default(), &scenario).unwrap();

        let snapshots = runner.run(&scenario.steps);
        let last = snapshots.last().unwrap();

        let keys: Vec<_> = last.stack.iter().map(|e| e.control_key.as_str()).collect();
        assert_eq!(keys, vec!["MainHUD", "Inventory"]);
        assert!(last.stack.iter().all(|e| e.state == ViewState::Opened));

        let mask = last.mask.as_ref().unwrap();
        assert_eq!(mask.anchor, "Inventory");
        assert_eq!(mask.layer, Layer::PopWindow);
        assert!((mask.alpha - 0.8).abs() < 1e-6);
        assert_eq!(snapshots[1].notes, vec!["Inventory opened (#2)"]);
        assert!(snapshots[1].mask.is_none());
    }

    #[test]
    fn test_failing_package_is_reported() {
        let mut scenario = Scenario::parse(INVENTORY).unwrap();
        scenario.failing.push("Inventory".to_string());
        let mut runner = ScenarioRunner::new(ViewConfig::default(), &scenario).unwrap();

        let snapshots = runner.run(&scenario.steps);
        let failed = &snapshots[1];
        assert_eq!(failed.stack.len(), 1);
        assert!(failed.notes[0].contains("not found"));
    }

    #[test]
    fn test_manual_settle() {
        let mut scenario = Scenario::parse(INVENTORY).unwrap();
        scenario.auto_settle = false;
        let mut runner = ScenarioRunner::new(ViewConfig::default(), &scenario).unwrap();

        let snapshot = runner.apply(&scenario.steps[0]);
        assert_eq!(snapshot.stack[0].state, ViewState::Loading);
        assert_eq!(runner.loader().pending(), 1);

        let snapshot = runner.apply(&Step::Settle);
        assert_eq!(snapshot.stack[0].state, ViewState::Opened);
        assert_eq!(runner.loader().held(), 1);

        runner.apply(&Step::CloseAll);
        assert_eq!(runner.loader().held(), 0);
    }

    #[test]
    fn test_snapshot_display() {
        let scenario = Scenario::parse(INVENTORY).unwrap();
        let mut runner = ScenarioRunner::new(ViewConfig::default(), &scenario).unwrap();
        let snapshots = runner.run(&scenario.steps);

        assert!(snapshots[1].to_string().starts_with("> open Inventory"));
        let text = snapshots[2].to_string();
        assert!(text.starts_with("> frame 250ms"));
        assert!(text.contains("pop-window"));
        assert!(text.contains("mask: pop-window under 'Inventory' alpha 0.80"));
    }
}
