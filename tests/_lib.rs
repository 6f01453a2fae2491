#[macro_use]
extern crate serde_json;

use std::sync::{Arc, RwLock};

use jedi::Value;
use rsvp_core::api::Method;
use rsvp_core::api::mock::MockTransport;
use rsvp_core::rsvp::{Response, Rsvp};

pub const INBOX: &str = "/event/invitations/user";

/// An app core wired to a scripted transport
pub struct Harness {
    pub mock: Arc<MockTransport>,
    pub rsvp: Rsvp,
    mid: RwLock<u64>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Harness {
        let mock = Arc::new(MockTransport::new());
        let rsvp = Rsvp::new(mock.clone());
        Harness { mock: mock, rsvp: rsvp, mid: RwLock::new(0) }
    }

    /// Send `[cmd, args...]` through the dispatcher (we add the message id)
    pub fn dispatch(&self, args: Value) -> Response {
        let msg_id = {
            let mut mid_guard = self.mid.write().unwrap();
            *mid_guard += 1;
            mid_guard.to_string()
        };
        let mut msg_args = vec![jedi::to_val(&msg_id).unwrap()];
        let mut vals = jedi::from_val::<Vec<Value>>(args).unwrap();
        msg_args.append(&mut vals);
        let msg = jedi::stringify(&msg_args).unwrap();
        let res: Response = jedi::parse(&rsvp_core::dispatch::process(&self.rsvp, &msg).unwrap()).unwrap();
        assert_eq!(res.id, msg_id);
        res
    }

    /// Dispatch and insist it worked
    pub fn dispatch_ass(&self, args: Value) -> Value {
        let res = self.dispatch(args);
        if res.e != 0 {
            panic!("dispatch: {}", res.d);
        }
        res.d
    }

    /// Dispatch and insist it failed, handing back the error string
    pub fn dispatch_err(&self, args: Value) -> String {
        let res = self.dispatch(args);
        if res.e != 1 {
            panic!("dispatch: expected an error, got {}", res.d);
        }
        jedi::from_val(res.d).unwrap()
    }

    pub fn inbox(&self, invitations: Vec<Value>) {
        self.mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": invitations}));
    }

    pub fn login(&self) {
        self.dispatch_ass(json!(["auth:login", {"id": 7, "username": "margot", "token": "s3cr3t"}]));
    }
}

#[allow(dead_code)]
pub fn invitation(id: i64, user_id: i64, status: &str, expires_at: &str) -> Value {
    json!({
        "id": id,
        "event_id": 10,
        "user_id": user_id,
        "inviter_id": 1,
        "status": status,
        "created_at": "2024-05-01T09:00:00.000Z",
        "expires_at": expires_at,
        "event": {"id": 10, "title": "Pique-nique au parc"},
    })
}
