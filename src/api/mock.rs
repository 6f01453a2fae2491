//! A scripted `Transport`. Routes are keyed on method + resource (query
//! string included) and answer with canned JSON, an API error or a transport
//! failure. Every call is recorded. A route can also be *held*: the call
//! parks until the test releases it, which is how we get a request to stay
//! in flight on purpose.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use jedi::Value;

use crate::api::{ApiReq, Method, Transport};
use crate::error::{RError, RResult};

/// How long a held call waits for its release before giving up
const HOLD_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
enum Canned {
    Json(Value),
    Api(u16, String),
    Down(String),
}

/// A recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: Method,
    pub resource: String,
    pub body: Option<Value>,
}

/// The test's end of a held route
pub struct Hold {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl Hold {
    /// Block until the held call has reached the transport
    pub fn wait_entered(&self) -> RResult<()> {
        self.entered.recv_timeout(Duration::new(HOLD_TIMEOUT_SECS, 0))
            .map_err(|_| RError::Msg(String::from("mock: held call never arrived")))
    }

    /// Let the held call finish
    pub fn release(&self) {
        try_or!(self.release.send(()), e, warn!("mock::Hold::release() -- call already gone: {}", e));
    }
}

/// The transport's end of a held route
struct Parked {
    entered: Sender<()>,
    release: Receiver<()>,
}

pub struct MockTransport {
    routes: RwLock<HashMap<(Method, String), Canned>>,
    holds: Mutex<HashMap<(Method, String), Parked>>,
    calls: RwLock<Vec<MockCall>>,
    auth: RwLock<Option<String>>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport {
            routes: RwLock::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            auth: RwLock::new(None),
        }
    }

    fn route(&self, method: Method, resource: &str, canned: Canned) {
        lockw!(self.routes).insert((method, String::from(resource)), canned);
    }

    /// Answer `method resource` with this JSON
    pub fn on(&self, method: Method, resource: &str, response: Value) {
        self.route(method, resource, Canned::Json(response));
    }

    /// Answer `method resource` with a non-2xx status and message
    pub fn on_api_error(&self, method: Method, resource: &str, status: u16, msg: &str) {
        self.route(method, resource, Canned::Api(status, String::from(msg)));
    }

    /// Act like the server can't be reached
    pub fn on_failure(&self, method: Method, resource: &str, msg: &str) {
        self.route(method, resource, Canned::Down(String::from(msg)));
    }

    /// Park the next call to `method resource` until the returned `Hold` is
    /// released
    pub fn hold(&self, method: Method, resource: &str) -> Hold {
        let (entered_tx, entered_rx) = channel::bounded(1);
        let (release_tx, release_rx) = channel::bounded(1);
        lock!(self.holds).insert((method, String::from(resource)), Parked {
            entered: entered_tx,
            release: release_rx,
        });
        Hold { entered: entered_rx, release: release_tx }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lockr!(self.calls).clone()
    }

    pub fn call_count(&self, method: Method, resource: &str) -> usize {
        lockr!(self.calls).iter()
            .filter(|c| c.method == method && c.resource == resource)
            .count()
    }

    /// The token the last `set_auth()` gave us
    pub fn auth(&self) -> Option<String> {
        lockr!(self.auth).clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport::new()
    }
}

impl Transport for MockTransport {
    fn call(&self, method: Method, resource: &str, req: ApiReq) -> RResult<Value> {
        debug!("mock::call() -- {} {}", method, resource);
        let key = (method, String::from(resource));
        lockw!(self.calls).push(MockCall {
            method: method,
            resource: String::from(resource),
            body: req.body().cloned(),
        });

        let parked = lock!(self.holds).remove(&key);
        if let Some(parked) = parked {
            try_or!(parked.entered.send(()), e, warn!("mock::call() -- nobody waiting on hold: {}", e));
            if parked.release.recv_timeout(Duration::new(HOLD_TIMEOUT_SECS, 0)).is_err() {
                return RErr!(RError::Transport(format!("mock: hold on {} {} never released", method, resource)));
            }
        }

        let canned = lockr!(self.routes).get(&key).cloned();
        match canned {
            Some(Canned::Json(val)) => Ok(val),
            Some(Canned::Api(status, msg)) => RErr!(RError::Api(status, msg)),
            Some(Canned::Down(msg)) => RErr!(RError::Transport(msg)),
            None => RErr!(RError::Transport(format!("mock: no route for {} {}", method, resource))),
        }
    }

    fn set_auth(&self, token: &str) {
        *lockw!(self.auth) = Some(String::from(token));
    }

    fn clear_auth(&self) {
        *lockw!(self.auth) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn canned_routes() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/event/1/invitations", json!({"success": true, "data": []}));
        mock.on_api_error(Method::Delete, "/event/invitations/3", 403, "Non autorisé");
        mock.on_failure(Method::Get, "/event/invitations/user", "unable to reach the server");

        let val = mock.get("/event/1/invitations", ApiReq::new()).unwrap();
        assert_eq!(val, json!({"success": true, "data": []}));
        match mock.delete("/event/invitations/3", ApiReq::new()) {
            Err(RError::Api(403, ref msg)) if msg == "Non autorisé" => {}
            x => panic!("unexpected: {:?}", x),
        }
        match mock.get("/event/invitations/user", ApiReq::new()) {
            Err(RError::Transport(_)) => {}
            x => panic!("unexpected: {:?}", x),
        }
        assert!(mock.get("/nowhere", ApiReq::new()).is_err());
        assert_eq!(mock.calls().len(), 4);
        assert_eq!(mock.call_count(Method::Get, "/event/1/invitations"), 1);
    }

    #[test]
    fn records_bodies() {
        let mock = MockTransport::new();
        mock.on(Method::Post, "/event/2/invite", json!({"success": true}));
        mock.post("/event/2/invite", ApiReq::new().data(json!({"userId": 9}))).unwrap();
        assert_eq!(mock.calls()[0].body, Some(json!({"userId": 9})));
    }

    #[test]
    fn holds_calls() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/slow", json!(1));
        let hold = mock.hold(Method::Get, "/slow");
        let mock2 = mock.clone();
        let handle = thread::spawn(move || mock2.get("/slow", ApiReq::new()).unwrap());
        hold.wait_entered().unwrap();
        assert_eq!(mock.call_count(Method::Get, "/slow"), 1);
        hold.release();
        assert_eq!(handle.join().unwrap(), json!(1));
        // holds are one-shot
        assert_eq!(mock.get("/slow", ApiReq::new()).unwrap(), json!(1));
    }
}
