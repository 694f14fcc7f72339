//! Collaborator contracts consumed by the view manager
//!
//! The manager never talks to an engine directly. Package loading,
//! content construction, the loading spinner and the dimming overlay are
//! supplied by the host through these traits and bundled in a
//! [`ViewContext`] handed to [`ViewManager::new`](crate::manager::ViewManager::new).

use cgmath::Point2;
use std::time::Duration;

use crate::geometry::Rect;
use crate::layer::Layer;
use crate::manager::LoadTicket;
use crate::registry::ViewDescriptor;

/// A loaded package holding one reference for its owner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageHandle {
    pub name: String,
    pub id: u64,
}

impl PackageHandle {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Asynchronous, reference-counted package acquisition.
///
/// `request` must not complete synchronously; the host reports the result
/// later through [`ViewManager::complete_load`](crate::manager::ViewManager::complete_load)
/// with the same ticket.
pub trait PackageLoader {
    fn request(&mut self, package: &str, ticket: LoadTicket);

    /// Drop the reference taken by a successful load
    fn release(&mut self, handle: &PackageHandle);
}

/// Builds window content from a loaded package
pub trait ContentFactory {
    fn create(
        &mut self,
        descriptor: &ViewDescriptor,
        package: &PackageHandle,
    ) -> Result<Box<dyn ViewContent>, String>;
}

/// A window's content node with its behavior bound
pub trait ViewContent {
    /// Open hook; runs on first open and on every re-open while opened
    fn on_open(&mut self, params: &serde_json::Value);

    /// Runs once, one tick after the content is bound
    fn on_opened(&mut self) {}

    fn on_close(&mut self) {}

    /// Detach observers and timers; the node itself stays alive
    fn dispose(&mut self) {}

    /// Destroy the node; runs from the serialized destruction queue
    fn destroy(&mut self) {}

    /// Bounds in stage coordinates
    fn bounds(&self) -> Rect;

    fn set_visible(&mut self, visible: bool);

    fn set_alpha(&mut self, _alpha: f32) {}

    fn set_scale(&mut self, _scale: f32) {}

    fn set_position(&mut self, _position: Point2<f32>) {}
}

/// Spinner shown while packages load
#[cfg_attr(test, mockall::automock)]
pub trait LoadingIndicator {
    fn show_loading(&mut self, max_duration: Duration);
    fn hide_loading(&mut self);
}

/// The single shared dimming overlay
#[cfg_attr(test, mockall::automock)]
pub trait MaskSurface {
    /// Re-parent the mask into `layer`, directly below the window `below`
    fn attach(&mut self, layer: Layer, below: &str);
    fn set_alpha(&mut self, alpha: f32);
    fn detach(&mut self);
}

/// Indicator that does nothing, for headless hosts
#[derive(Debug, Default)]
pub struct NoLoadingIndicator;

impl LoadingIndicator for NoLoadingIndicator {
    fn show_loading(&mut self, _max_duration: Duration) {}
    fn hide_loading(&mut self) {}
}

/// Mask surface that does nothing, for headless hosts
#[derive(Debug, Default)]
pub struct NoMaskSurface;

impl MaskSurface for NoMaskSurface {
    fn attach(&mut self, _layer: Layer, _below: &str) {}
    fn set_alpha(&mut self, _alpha: f32) {}
    fn detach(&mut self) {}
}

/// Collaborators the manager is constructed with
pub struct ViewContext {
    pub loader: Box<dyn PackageLoader>,
    pub factory: Box<dyn ContentFactory>,
    pub loading: Box<dyn LoadingIndicator>,
    pub mask: Box<dyn MaskSurface>,
}

impl ViewContext {
    pub fn new(loader: Box<dyn PackageLoader>, factory: Box<dyn ContentFactory>) -> Self {
        Self {
            loader,
            factory,
            loading: Box::new(NoLoadingIndicator),
            mask: Box::new(NoMaskSurface),
        }
    }

    pub fn with_loading(mut self, loading: Box<dyn LoadingIndicator>) -> Self {
        self.loading = loading;
        self
    }

    pub fn with_mask(mut self, mask: Box<dyn MaskSurface>) -> Self {
        self.mask = mask;
        self
    }
}
