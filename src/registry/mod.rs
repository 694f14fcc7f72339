//! Window registry
//!
//! Maps a logical window key to its declarative metadata. Registration
//! fills in defaults once; a few of them depend on the size mode and are
//! left open until a controller takes its own per-instance copy with
//! [`WindowDescriptor::instantiate`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ViewConfig;
use crate::layer::Layer;

/// How a window is sized against its layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMode {
    Normal,
    /// Stretched to the full stage
    Full,
    /// Full-size background with a normally sized body
    MixFull,
}

impl SizeMode {
    pub fn is_full(self) -> bool {
        matches!(self, SizeMode::Full | SizeMode::MixFull)
    }
}

/// Requested dimming behind a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MaskSetting {
    /// Use the configured default unless the window is full-size
    #[default]
    Inherit,
    Disabled,
    Opacity(f32),
}

/// Registration input; unset fields receive defaults in [`ViewRegistry::register`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    pub key: String,
    /// Package to acquire before content can be built (defaults to the key)
    pub package: Option<String>,
    /// Component inside the package (defaults to the key)
    pub component: Option<String>,
    /// Legacy numeric id
    pub id: Option<u32>,
    pub layer: Option<Layer>,
    pub size_mode: Option<SizeMode>,
    pub mask: MaskSetting,
    /// Full-frame window (HUD style); excluded from mask and occlusion
    pub border: bool,
    /// Partially transparent; never blocks what lies below
    pub lucent: bool,
    /// Skipped when looking for the topmost window
    pub mask_ignore: bool,
    pub tween: Option<bool>,
    pub after_effect: Option<bool>,
    pub clickout: Option<bool>,
}

impl WindowSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = Some(size_mode);
        self
    }

    pub fn mask(mut self, opacity: f32) -> Self {
        self.mask = MaskSetting::Opacity(opacity);
        self
    }

    pub fn no_mask(mut self) -> Self {
        self.mask = MaskSetting::Disabled;
        self
    }

    pub fn border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    pub fn lucent(mut self, lucent: bool) -> Self {
        self.lucent = lucent;
        self
    }

    pub fn mask_ignore(mut self, mask_ignore: bool) -> Self {
        self.mask_ignore = mask_ignore;
        self
    }

    pub fn tween(mut self, tween: bool) -> Self {
        self.tween = Some(tween);
        self
    }

    pub fn after_effect(mut self, after_effect: bool) -> Self {
        self.after_effect = Some(after_effect);
        self
    }

    pub fn clickout(mut self, clickout: bool) -> Self {
        self.clickout = Some(clickout);
        self
    }
}

/// Registered metadata for one window class
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDescriptor {
    pub key: String,
    pub package: String,
    pub component: String,
    pub id: Option<u32>,
    pub layer: Layer,
    /// `None` until the caller or the first instance decides it
    pub size_mode: Option<SizeMode>,
    pub mask: MaskSetting,
    pub border: bool,
    pub lucent: bool,
    pub mask_ignore: bool,
    pub tween: Option<bool>,
    /// Host-facing flag; the manager only carries it through
    pub after_effect: bool,
    pub clickout: Option<bool>,
}

impl WindowDescriptor {
    fn from_spec(spec: WindowSpec) -> Self {
        let package = spec.package.unwrap_or_else(|| spec.key.clone());
        let component = spec.component.unwrap_or_else(|| spec.key.clone());

        if spec.border {
            return Self {
                key: spec.key,
                package,
                component,
                id: spec.id,
                layer: spec.layer.unwrap_or(Layer::Main),
                size_mode: Some(spec.size_mode.unwrap_or(SizeMode::Normal)),
                mask: match spec.mask {
                    MaskSetting::Inherit => MaskSetting::Disabled,
                    other => other,
                },
                border: true,
                lucent: spec.lucent,
                mask_ignore: spec.mask_ignore,
                tween: Some(spec.tween.unwrap_or(false)),
                after_effect: spec.after_effect.unwrap_or(false),
                clickout: Some(spec.clickout.unwrap_or(false)),
            };
        }

        let layer = spec.layer.unwrap_or(Layer::PopWindow);
        let size_mode = match spec.size_mode {
            Some(mode) => Some(mode),
            None if layer == Layer::PopWindow => Some(SizeMode::Normal),
            None => None,
        };
        // Tween and clickout follow the size mode when it is already known
        let full_default = size_mode.map(|mode| !mode.is_full());

        Self {
            key: spec.key,
            package,
            component,
            id: spec.id,
            layer,
            size_mode,
            mask: spec.mask,
            border: false,
            lucent: spec.lucent,
            mask_ignore: spec.mask_ignore,
            tween: spec.tween.or(full_default),
            after_effect: spec.after_effect.unwrap_or(true),
            clickout: spec.clickout.or(full_default),
        }
    }

    /// Per-instance copy with every lazy default resolved
    pub fn instantiate(&self, size_override: Option<SizeMode>, config: &ViewConfig) -> ViewDescriptor {
        let size_mode = size_override
            .or(self.size_mode)
            .unwrap_or(SizeMode::Normal);
        let full = size_mode.is_full();

        let mask = match self.mask {
            MaskSetting::Opacity(opacity) => Some(opacity.clamp(0.0, 1.0)),
            MaskSetting::Disabled => None,
            MaskSetting::Inherit if full || self.border => None,
            MaskSetting::Inherit => Some(config.mask.default_opacity),
        };

        ViewDescriptor {
            key: self.key.clone(),
            package: self.package.clone(),
            component: self.component.clone(),
            id: self.id,
            layer: self.layer,
            size_mode,
            mask,
            border: self.border,
            lucent: self.lucent,
            mask_ignore: self.mask_ignore,
            tween: self.tween.unwrap_or(!full),
            after_effect: self.after_effect,
            clickout: self.clickout.unwrap_or(!full),
        }
    }
}

/// Resolved descriptor owned by a single controller
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDescriptor {
    pub key: String,
    pub package: String,
    pub component: String,
    pub id: Option<u32>,
    pub layer: Layer,
    pub size_mode: SizeMode,
    /// Requested mask alpha, `None` when the window does not dim
    pub mask: Option<f32>,
    pub border: bool,
    pub lucent: bool,
    pub mask_ignore: bool,
    pub tween: bool,
    /// Read by the content factory at creation and reported on the
    /// [`ViewHandle`](crate::ViewHandle) so the host can run its post-open
    /// screen effect
    pub after_effect: bool,
    pub clickout: bool,
}

impl ViewDescriptor {
    /// Covers its whole layer and hides what lies below
    pub fn is_opaque_full(&self) -> bool {
        !self.lucent && self.size_mode.is_full()
    }
}

/// Registered window classes by key, plus the legacy id index
#[derive(Debug, Default)]
pub struct ViewRegistry {
    descriptors: HashMap<String, WindowDescriptor>,
    ids: HashMap<u32, String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window class; a later registration for the same key wins
    pub fn register(&mut self, spec: WindowSpec) -> &WindowDescriptor {
        let descriptor = WindowDescriptor::from_spec(spec);
        let key = descriptor.key.clone();

        if let Some(previous) = self.descriptors.remove(&key) {
            debug!("Replacing registration for window '{}'", key);
            if let Some(id) = previous.id {
                self.ids.remove(&id);
            }
        }

        if let Some(id) = descriptor.id {
            if let Some(owner) = self.ids.insert(id, key.clone()) {
                if owner != key {
                    warn!("Window id {} moved from '{}' to '{}'", id, owner, key);
                    if let Some(old) = self.descriptors.get_mut(&owner) {
                        old.id = None;
                    }
                }
            }
        }

        self.descriptors.entry(key).or_insert(descriptor)
    }

    pub fn resolve(&self, key: &str) -> Option<&WindowDescriptor> {
        self.descriptors.get(key)
    }

    pub fn resolve_id(&self, id: u32) -> Option<&WindowDescriptor> {
        self.ids.get(&id).and_then(|key| self.descriptors.get(key))
    }

    /// Decide the size mode of a class before its first open.
    /// Returns `false` for unknown keys.
    pub fn set_size_mode(&mut self, key: &str, size_mode: SizeMode) -> bool {
        match self.descriptors.get_mut(key) {
            Some(descriptor) => {
                descriptor.size_mode = Some(size_mode);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.descriptors.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }
}
