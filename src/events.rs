//! Typed view events and the observer list that dispatches them
//!
//! Listeners live in an arena indexed by [`ListenerId`]; unsubscribing
//! frees the slot for reuse so ids stay small over long sessions.

use log::debug;

use crate::layer::Layer;

/// Notifications emitted by the view manager
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Content acquisition started for a control key
    Opening { key: String },
    /// Content instantiated and bound into its layer
    Loaded { key: String },
    /// The opened hook ran
    Opened { key: String },
    /// The controller was torn down
    Closed { key: String },
    /// Acquisition or content creation failed
    Failed { key: String, reason: String },
    /// Effective visibility changed after occlusion or a show/hide call
    VisibilityChanged { key: String, visible: bool },
    /// The shared mask moved or changed alpha; `None` means detached
    MaskChanged { anchor: Option<(Layer, String)>, alpha: f32 },
    /// The entrance tween completed
    TweenFinished { key: String },
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&ViewEvent)>;

/// Arena of listener records
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Option<Listener>>,
    free: Vec<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        let record: Listener = Box::new(listener);
        match self.free.pop() {
            Some(slot) => {
                self.listeners[slot] = Some(record);
                ListenerId(slot)
            }
            None => {
                self.listeners.push(Some(record));
                ListenerId(self.listeners.len() - 1)
            }
        }
    }

    /// Returns `false` if the id was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        match self.listeners.get_mut(id.0) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free.push(id.0);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&mut self, event: ViewEvent) {
        debug!("event: {:?}", event);
        for listener in self.listeners.iter_mut().flatten() {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}
