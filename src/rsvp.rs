//! The Rsvp module is the container for the state of the app. Whoever embeds
//! the core makes one of these and hands it to `dispatch::process()` along
//! with each message from the UI.

use std::sync::Arc;

use jedi::Value;

use crate::api::{Api, Transport};
use crate::error::{RError, RResult};
use crate::gateway::InvitationGateway;
use crate::notifications::NotificationCenter;
use crate::session::Session;
use crate::store::{InvitationList, ListSource};
use crate::util::event::EventEmitter;

/// What goes back to the UI for each message: the message id, an error flag
/// (`e`: 0 ok, 1 error) and the payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub id: String,
    pub e: i64,
    pub d: Value,
}

impl Response {
    pub fn success(mid: &str, data: Value) -> Response {
        Response { id: String::from(mid), e: 0, d: data }
    }

    pub fn error(mid: &str, err: &RError) -> Response {
        Response { id: String::from(mid), e: 1, d: Value::String(err.human()) }
    }
}

/// Defines a container for our app's state. Most operations the UI has
/// access to via dispatch get this object passed to them.
pub struct Rsvp {
    /// App-wide events (`auth:login`, `auth:logout`, ...)
    pub events: Arc<EventEmitter>,
    /// Whatever carries our requests to the server
    pub api: Arc<dyn Transport>,
    /// Who's signed in
    pub session: Arc<Session>,
    pub gateway: Arc<InvitationGateway>,
    /// The badge count. Wired to the session's auth events on creation.
    pub notifications: Arc<NotificationCenter>,
}

impl Rsvp {
    /// Build our state around a transport
    pub fn new(api: Arc<dyn Transport>) -> Rsvp {
        let events = Arc::new(EventEmitter::new());
        let session = Arc::new(Session::new(api.clone(), events.clone()));
        let gateway = Arc::new(InvitationGateway::new(api.clone()));
        let notifications = Arc::new(NotificationCenter::new(gateway.clone(), session.clone()));
        NotificationCenter::attach(&notifications, &events);
        Rsvp {
            events: events,
            api: api,
            session: session,
            gateway: gateway,
            notifications: notifications,
        }
    }

    /// Build our state around the real HTTP api
    pub fn with_api() -> RResult<Rsvp> {
        let api: Arc<dyn Transport> = Arc::new(Api::new()?);
        Ok(Rsvp::new(api))
    }

    /// A fresh list for one consumer. Lists never share state.
    pub fn invitation_list(&self, source: ListSource) -> InvitationList {
        InvitationList::new(self.gateway.clone(), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::mock::MockTransport;
    use crate::session::SessionUser;

    #[test]
    fn wires_notifications_to_session() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/event/invitations/user", json!({"user_id": 7, "invitations": [{
            "id": 1, "event_id": 10, "user_id": 7, "inviter_id": 1, "status": "pending",
            "created_at": "2024-05-01T09:00:00.000Z", "expires_at": "2099-01-01",
        }]}));
        let rsvp = Rsvp::new(mock.clone());
        rsvp.session.sign_in(SessionUser { id: 7, username: String::from("margot"), token: None });
        assert_eq!(rsvp.notifications.count(), 1);
        rsvp.session.sign_out();
        assert_eq!(rsvp.notifications.count(), 0);
    }

    #[test]
    fn lists_are_independent() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/event/invitations/user", json!({"user_id": 7, "invitations": []}));
        let rsvp = Rsvp::new(mock.clone());
        let list1 = rsvp.invitation_list(ListSource::User);
        let list2 = rsvp.invitation_list(ListSource::User);
        list1.load();
        assert_eq!(mock.call_count(Method::Get, "/event/invitations/user"), 1);
        list2.unmount();
        assert!(list1.is_mounted());
    }

    #[test]
    fn responses() {
        let res = Response::success("12", json!({"count": 3}));
        assert_eq!(jedi::stringify(&res).unwrap(), r#"{"id":"12","e":0,"d":{"count":3}}"#);
        let res = Response::error("13", &RError::MissingCommand(String::from("invite:nope")));
        assert_eq!(res.e, 1);
        assert_eq!(res.d, json!("unknown command: invite:nope"));
    }
}
