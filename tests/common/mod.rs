// Shared fakes for the integration tests
//
// A recording host: the loader queues requests until the test settles them,
// content nodes log every hook they receive, and every manager event is kept.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use viewstack::geometry::Rect;
use viewstack::host::{ContentFactory, PackageHandle, PackageLoader, ViewContent, ViewContext};
use viewstack::registry::ViewDescriptor;
use viewstack::{LoadTicket, ViewConfig, ViewEvent, ViewManager};

#[derive(Debug, Default)]
pub struct HostLog {
    pub requests: Vec<(String, LoadTicket)>,
    pub released: Vec<PackageHandle>,
    pub loaded: usize,
    pub created: usize,
    pub calls: Vec<String>,
    pub events: Vec<ViewEvent>,
}

#[derive(Clone, Default)]
pub struct Host {
    pub log: Rc<RefCell<HostLog>>,
    pub bounds: Rc<RefCell<HashMap<String, Rect>>>,
}

struct Loader(Host);

impl PackageLoader for Loader {
    fn request(&mut self, package: &str, ticket: LoadTicket) {
        self.0
            .log
            .borrow_mut()
            .requests
            .push((package.to_string(), ticket));
    }

    fn release(&mut self, handle: &PackageHandle) {
        self.0.log.borrow_mut().released.push(handle.clone());
    }
}

struct Factory(Host);

impl ContentFactory for Factory {
    fn create(
        &mut self,
        descriptor: &ViewDescriptor,
        _package: &PackageHandle,
    ) -> Result<Box<dyn ViewContent>, String> {
        self.0.log.borrow_mut().created += 1;
        let bounds = self
            .0
            .bounds
            .borrow()
            .get(&descriptor.key)
            .copied()
            .unwrap_or(Rect::new(0.0, 0.0, 200.0, 200.0));

        Ok(Box::new(Content {
            key: descriptor.key.clone(),
            bounds,
            host: self.0.clone(),
        }))
    }
}

struct Content {
    key: String,
    bounds: Rect,
    host: Host,
}

impl Content {
    fn record(&self, call: &str) {
        self.host
            .log
            .borrow_mut()
            .calls
            .push(format!("{}:{}", self.key, call));
    }
}

impl ViewContent for Content {
    fn on_open(&mut self, _params: &serde_json::Value) {
        self.record("open");
    }
    fn on_opened(&mut self) {
        self.record("opened");
    }
    fn on_close(&mut self) {
        self.record("close");
    }
    fn destroy(&mut self) {
        self.record("destroy");
    }
    fn bounds(&self) -> Rect {
        self.bounds
    }
    fn set_visible(&mut self, _visible: bool) {}
}

impl Host {
    pub fn manager(&self, config: ViewConfig) -> ViewManager {
        let context = ViewContext::new(
            Box::new(Loader(self.clone())),
            Box::new(Factory(self.clone())),
        );
        let mut manager = ViewManager::new(config, context);

        let log = Rc::clone(&self.log);
        manager.subscribe(move |event| log.borrow_mut().events.push(event.clone()));
        manager
    }

    pub fn set_bounds(&self, key: &str, bounds: Rect) {
        self.bounds.borrow_mut().insert(key.to_string(), bounds);
    }

    pub fn take_requests(&self) -> Vec<(String, LoadTicket)> {
        std::mem::take(&mut self.log.borrow_mut().requests)
    }

    /// Complete every queued request successfully, then tick
    pub fn settle(&self, manager: &mut ViewManager) {
        for (package, ticket) in self.take_requests() {
            let id = {
                let mut log = self.log.borrow_mut();
                log.loaded += 1;
                log.loaded as u64
            };
            manager.complete_load(ticket, Ok(PackageHandle::new(package, id)));
        }
        manager.tick();
    }

    pub fn released(&self) -> usize {
        self.log.borrow().released.len()
    }

    pub fn created(&self) -> usize {
        self.log.borrow().created
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().calls.clone()
    }

    pub fn count_events(&self, matches: impl Fn(&ViewEvent) -> bool) -> usize {
        self.log.borrow().events.iter().filter(|e| matches(e)).count()
    }
}

pub fn quiet_config() -> ViewConfig {
    let mut config = ViewConfig::default();
    config.tween.enabled = false;
    config
}
