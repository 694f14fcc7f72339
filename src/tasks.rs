//! Named, serialized FIFO task queues
//!
//! Tasks are queued while the stack is being mutated and run later from
//! [`TaskQueue::run_pending`], one at a time in submission order.

use log::trace;
use std::collections::{HashMap, VecDeque};

/// Queue used to defer destruction of closed window content
pub const DESTROY_QUEUE: &str = "view.destroy";

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
pub struct TaskQueue {
    queues: HashMap<String, VecDeque<Task>>,
    /// Queue names in first-use order so draining is deterministic
    order: Vec<String>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue<F>(&mut self, queue: &str, task: F)
    where
        F: FnOnce() + 'static,
    {
        if !self.queues.contains_key(queue) {
            self.order.push(queue.to_string());
        }
        self.queues
            .entry(queue.to_string())
            .or_default()
            .push_back(Box::new(task));
    }

    pub fn pending(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Run every queued task, queue by queue. Returns the number run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        for name in &self.order {
            if let Some(queue) = self.queues.get_mut(name) {
                while let Some(task) = queue.pop_front() {
                    trace!("running task from queue '{}'", name);
                    task();
                    ran += 1;
                }
            }
        }
        ran
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending: Vec<_> = self
            .order
            .iter()
            .map(|name| (name.as_str(), self.pending(name)))
            .collect();
        f.debug_struct("TaskQueue").field("pending", &pending).finish()
    }
}
