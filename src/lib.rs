//! # Viewstack
//!
//! A layered UI window stack: a registry of window classes, per-window
//! lifecycle controllers, and a stack manager that keeps windows ordered by
//! layer, culls windows hidden behind others and places a single shared
//! dimming mask.
//!
//! ## Architecture
//!
//! - `layer`: Ordered layer bands windows live in
//! - `registry`: Window class registration and default resolution
//! - `controller`: Per-window lifecycle state machine
//! - `stack`: Layer-sorted stack with constant-time key lookup
//! - `manager`: Stack manager, occlusion and mask placement
//! - `effects`: Entrance tweens
//! - `host`: Collaborator traits implemented by the embedding engine
//! - `config`: Configuration parsing and management
//! - `scenario`: Scripted, headless runs of the manager
//!
//! ## Usage
//!
//! ```rust,no_run
//! use viewstack::host::ViewContext;
//! use viewstack::scenario::{ScriptedContentFactory, ScriptedLoader};
//! use viewstack::{OpenParams, ViewConfig, ViewManager, WindowSpec};
//!
//! let loader = ScriptedLoader::default();
//! let context = ViewContext::new(
//!     Box::new(loader.clone()),
//!     Box::new(ScriptedContentFactory::default()),
//! );
//! let mut manager = ViewManager::new(ViewConfig::default(), context);
//! manager.register(WindowSpec::new("Inventory"));
//!
//! let _opened = manager.open("Inventory", OpenParams::new());
//! for (ticket, result) in loader.drain() {
//!     manager.complete_load(ticket, result);
//! }
//! manager.tick();
//! assert!(manager.is_open("Inventory"));
//! ```

pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod layer;
pub mod manager;
pub mod registry;
pub mod scenario;
pub mod stack;
pub mod tasks;

// Re-export main types for easy access
pub use config::ViewConfig;
pub use controller::{ControllerId, OpenParams, ViewController, ViewHandle, ViewState};
pub use error::ViewError;
pub use events::ViewEvent;
pub use layer::Layer;
pub use manager::{LoadTicket, OpenFuture, ViewManager};
pub use registry::{SizeMode, ViewRegistry, WindowSpec};

/// Version information for viewstack
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
