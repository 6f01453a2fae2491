//! A small event emitter. Callbacks are bound to an event name under a
//! binding name (so they can be replaced or unbound later) and get the event's
//! JSON `Value` when it fires.
//!
//! The bindings live behind an RwLock so one emitter can be shared between
//! threads. Callbacks run *after* the lock is released, so a callback is free
//! to bind, unbind or trigger on the same emitter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jedi::Value;

/// Defines what type of binding we have
#[derive(Clone, Copy, PartialEq)]
enum BindType {
    Every,
    Once,
}

/// Anything callable with an event's data
pub trait EventThunk: Send + Sync + 'static {
    fn call_box(&self, data: &Value);
}
impl<F: Fn(&Value) + Send + Sync + 'static> EventThunk for F {
    fn call_box(&self, data: &Value) {
        (*self)(data);
    }
}

/// Holds information about a callback.
struct Callback {
    cb: Arc<dyn EventThunk>,
    binding: BindType,
    name: String,
}

/// An alias to make returning the bindings object easier
type Bindings = RwLock<HashMap<String, Vec<Callback>>>;

pub struct EventEmitter {
    bindings: Bindings,
}

impl EventEmitter {
    pub fn new() -> EventEmitter {
        EventEmitter { bindings: RwLock::new(HashMap::new()) }
    }

    fn do_bind(&self, event_name: &str, cb: Callback) {
        // same event/binding name pair *replaces* the existing binding
        self.unbind(event_name, cb.name.as_str());
        let mut guard = lockw!(self.bindings);
        guard.entry(String::from(event_name))
            .or_insert_with(|| Vec::with_capacity(2))
            .push(cb);
    }

    /// Bind a callback to an event under `bind_name`
    pub fn bind<F>(&self, event_name: &str, cb: F, bind_name: &str)
        where F: Fn(&Value) + Send + Sync + 'static
    {
        self.do_bind(event_name, Callback {
            cb: Arc::new(cb),
            binding: BindType::Every,
            name: String::from(bind_name),
        });
    }

    /// Bind a callback that unbinds itself after firing once
    pub fn bind_once<F>(&self, event_name: &str, cb: F, bind_name: &str)
        where F: Fn(&Value) + Send + Sync + 'static
    {
        self.do_bind(event_name, Callback {
            cb: Arc::new(cb),
            binding: BindType::Once,
            name: String::from(bind_name),
        });
    }

    /// Remove a binding. Returns whether anything was removed.
    pub fn unbind(&self, event_name: &str, bind_name: &str) -> bool {
        let mut guard = lockw!(self.bindings);
        match guard.get_mut(event_name) {
            Some(callbacks) => {
                let before = callbacks.len();
                callbacks.retain(|c| c.name != bind_name);
                callbacks.len() != before
            }
            None => false,
        }
    }

    /// Fire an event. Every callback bound to `event_name` gets `data`.
    pub fn trigger(&self, event_name: &str, data: &Value) {
        let fire: Vec<Arc<dyn EventThunk>> = {
            let mut guard = lockw!(self.bindings);
            match guard.get_mut(event_name) {
                Some(callbacks) => {
                    let fire = callbacks.iter().map(|c| c.cb.clone()).collect::<Vec<_>>();
                    callbacks.retain(|c| c.binding != BindType::Once);
                    fire
                }
                None => return,
            }
        };
        trace!("event::trigger() -- {} ({} bindings)", event_name, fire.len());
        for cb in fire {
            cb.call_box(data);
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        EventEmitter::new()
    }
}
