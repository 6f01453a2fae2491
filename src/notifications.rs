//! The app-wide badge count: how many invitations are still waiting on an
//! answer. It lives as long as the app does, reloads when someone signs in,
//! and drops to zero when they sign out. Other pushed notifications are kept
//! (see `unread_count()`) but never show up in the badge.
//!
//! The count is not shared with any `InvitationList`; the two can disagree
//! until this one is refreshed again.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::{RError, RResult};
use crate::gateway::InvitationGateway;
use crate::models::notification::{self, Notification};
use crate::session::Session;
use crate::util::event::EventEmitter;

/// Binding name for our auth listeners, so they can be found/unbound
const AUTH_BINDING: &str = "notifications:auth";

#[derive(Default)]
struct NotificationState {
    count: u32,
    /// Built from the user's invitations on the last good refresh
    derived: Vec<Notification>,
    /// Came in from somewhere else (push payloads and the like)
    pushed: Vec<Notification>,
}

impl NotificationState {
    fn merged(&self) -> Vec<Notification> {
        notification::merge(self.derived.clone(), self.pushed.clone())
    }

    fn recount(&mut self) {
        self.count = notification::pending_invitation_count(&self.merged());
    }
}

pub struct NotificationCenter {
    gateway: Arc<InvitationGateway>,
    session: Arc<Session>,
    state: RwLock<NotificationState>,
}

impl NotificationCenter {
    pub fn new(gateway: Arc<InvitationGateway>, session: Arc<Session>) -> NotificationCenter {
        NotificationCenter {
            gateway: gateway,
            session: session,
            state: RwLock::new(NotificationState::default()),
        }
    }

    /// Listen for auth changes: a login refreshes, a logout resets. The
    /// callbacks only hold a weak ref; the emitter belongs to the session we
    /// point at, and a strong ref would make a cycle.
    pub fn attach(center: &Arc<NotificationCenter>, events: &EventEmitter) {
        let weak = Arc::downgrade(center);
        events.bind("auth:login", move |_| {
            if let Some(center) = weak.upgrade() {
                try_or!(center.refresh(), e, warn!("notifications::attach() -- refresh on login failed: {}", e));
            }
        }, AUTH_BINDING);
        let weak = Arc::downgrade(center);
        events.bind("auth:logout", move |_| {
            if let Some(center) = weak.upgrade() {
                center.reset();
            }
        }, AUTH_BINDING);
    }

    pub fn count(&self) -> u32 {
        lockr!(self.state).count
    }

    /// Everything we know about, merged by key
    pub fn notifications(&self) -> Vec<Notification> {
        lockr!(self.state).merged()
    }

    /// Unread notifications of any kind, not just invitations
    pub fn unread_count(&self) -> u32 {
        notification::unread_count(&lockr!(self.state).merged())
    }

    /// Reload the count from the user's invitations
    pub fn refresh(&self) -> RResult<u32> {
        self.refresh_at(&Utc::now())
    }

    /// `refresh()` against a given clock. Signed out means zero, no call. A
    /// failed call keeps whatever count we had.
    pub fn refresh_at(&self, now: &DateTime<Utc>) -> RResult<u32> {
        if !self.session.is_authenticated() {
            debug!("notifications::refresh() -- signed out, resetting");
            self.reset();
            return Ok(0);
        }
        let res = self.gateway.get_user_invitations();
        if !res.success {
            let err = res.error_message();
            warn!("notifications::refresh() -- keeping old count: {}", err);
            return RErr!(RError::Msg(err));
        }
        let derived: Vec<Notification> = res.data.unwrap_or_default().iter()
            .map(|inv| Notification::from_invitation(inv, now))
            .collect();
        let mut guard = lockw!(self.state);
        // the server's inbox is the truth for invitations: a pushed one it no
        // longer lists (cancelled, dropped) goes away
        guard.pushed.retain(|n| !n.is_invitation() || derived.iter().any(|d| d.key == n.key));
        guard.derived = derived;
        guard.recount();
        debug!("notifications::refresh() -- count: {}", guard.count);
        Ok(guard.count)
    }

    /// The user looked at everything. No network call.
    pub fn clear(&self) {
        let mut guard = lockw!(self.state);
        let state = &mut *guard;
        for n in state.derived.iter_mut().chain(state.pushed.iter_mut()) {
            n.read = true;
        }
        state.count = 0;
    }

    /// Someone else knows better (a push payload with a badge number, say)
    pub fn set_count(&self, count: u32) {
        lockw!(self.state).count = count;
    }

    /// Record a notification from outside the invitation list. If we already
    /// have one with the same key, the invitation-derived one wins.
    pub fn push(&self, notification: Notification) {
        let mut guard = lockw!(self.state);
        let existing = guard.pushed.iter().position(|n| n.key == notification.key);
        match existing {
            Some(idx) => guard.pushed[idx] = notification,
            None => guard.pushed.push(notification),
        }
        guard.recount();
    }

    /// Forget everything
    pub fn reset(&self) {
        let mut guard = lockw!(self.state);
        *guard = NotificationState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jedi::Value;
    use crate::api::Method;
    use crate::api::mock::MockTransport;
    use crate::models::notification::NotificationKind;
    use crate::session::SessionUser;
    use crate::util::ser::parse_timestamp;

    const INBOX: &str = "/event/invitations/user";

    fn inv(id: i64, status: &str, expires_at: &str) -> Value {
        json!({
            "id": id,
            "event_id": 10,
            "user_id": 7,
            "inviter_id": 1,
            "status": status,
            "created_at": "2024-05-01T09:00:00.000Z",
            "expires_at": expires_at,
        })
    }

    fn pushed(key: &str) -> Notification {
        let kind = if key.starts_with("inv_") { NotificationKind::Invitation } else { NotificationKind::Message };
        Notification {
            key: String::from(key),
            kind: kind,
            title: None,
            read: false,
            created_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-06-01").unwrap()
    }

    fn user() -> SessionUser {
        SessionUser { id: 7, username: String::from("margot"), token: Some(String::from("tok")) }
    }

    fn setup() -> (Arc<MockTransport>, Arc<EventEmitter>, Arc<Session>, Arc<NotificationCenter>) {
        let mock = Arc::new(MockTransport::new());
        let events = Arc::new(EventEmitter::new());
        let session = Arc::new(Session::new(mock.clone(), events.clone()));
        let gateway = Arc::new(InvitationGateway::new(mock.clone()));
        let center = Arc::new(NotificationCenter::new(gateway, session.clone()));
        NotificationCenter::attach(&center, &events);
        (mock, events, session, center)
    }

    #[test]
    fn counts_unanswered_invitations() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [
            inv(1, "pending", "2099-01-01"),
            inv(2, "pending", "2020-01-01"),
            inv(3, "accepted", "2099-01-01"),
        ]}));
        session.sign_in(user());
        assert_eq!(mock.call_count(Method::Get, INBOX), 1);
        assert_eq!(center.refresh_at(&now()).unwrap(), 1);
        assert_eq!(center.count(), 1);
    }

    #[test]
    fn logout_resets_without_calling() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [inv(1, "pending", "2099-01-01")]}));
        session.sign_in(user());
        assert_eq!(center.count(), 1);
        session.sign_out();
        assert_eq!(center.count(), 0);
        assert_eq!(mock.call_count(Method::Get, INBOX), 1);

        // still signed out: refresh is a no-op zero
        assert_eq!(center.refresh().unwrap(), 0);
        assert_eq!(mock.call_count(Method::Get, INBOX), 1);
    }

    #[test]
    fn failure_keeps_count() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [
            inv(1, "pending", "2099-01-01"), inv(2, "pending", "2099-01-01"),
        ]}));
        session.sign_in(user());
        assert_eq!(center.count(), 2);
        mock.on_api_error(Method::Get, INBOX, 500, "Erreur serveur");
        match center.refresh() {
            Err(RError::Msg(ref msg)) if msg == "Erreur serveur" => {}
            x => panic!("unexpected: {:?}", x),
        }
        assert_eq!(center.count(), 2);
    }

    #[test]
    fn pushed_invitations_count_once() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [inv(1, "pending", "2099-01-01")]}));
        session.sign_in(user());
        center.push(pushed("inv_1"));
        assert_eq!(center.count(), 1);
        // other kinds are kept, but aren't invitations waiting on an answer
        center.push(pushed("msg_44"));
        assert_eq!(center.count(), 1);
        assert_eq!(center.unread_count(), 2);
        // same key again replaces
        center.push(pushed("msg_44"));
        assert_eq!(center.unread_count(), 2);
        assert_eq!(center.notifications().len(), 2);
        // an invitation the inbox hasn't caught up with yet
        center.push(pushed("inv_2"));
        assert_eq!(center.count(), 2);

        // once answered, the pushed copy can't resurrect it
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [inv(1, "accepted", "2099-01-01")]}));
        assert_eq!(center.refresh_at(&now()).unwrap(), 0);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn refresh_drops_invitations_the_server_forgot() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [inv(1, "pending", "2099-01-01")]}));
        session.sign_in(user());
        center.push(pushed("inv_1"));
        center.push(pushed("inv_5"));
        center.push(pushed("msg_3"));
        assert_eq!(center.count(), 2);

        // invitation 1 was cancelled, 5 never made it
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": []}));
        assert_eq!(center.refresh_at(&now()).unwrap(), 0);
        assert_eq!(center.count(), 0);
        let keys = center.notifications().into_iter().map(|n| n.key).collect::<Vec<_>>();
        assert_eq!(keys, vec![String::from("msg_3")]);
    }

    #[test]
    fn clear_and_set() {
        let (mock, _events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": [inv(1, "pending", "2099-01-01")]}));
        session.sign_in(user());
        center.push(pushed("msg_1"));
        assert_eq!(center.count(), 1);
        assert_eq!(center.unread_count(), 2);
        center.clear();
        assert_eq!(center.count(), 0);
        assert!(center.notifications().iter().all(|n| n.read));
        assert_eq!(mock.call_count(Method::Get, INBOX), 1);
        center.set_count(12);
        assert_eq!(center.count(), 12);
    }

    #[test]
    fn no_leak_once_dropped() {
        let (mock, events, session, center) = setup();
        mock.on(Method::Get, INBOX, json!({"user_id": 7, "invitations": []}));
        drop(center);
        // the bindings are still there, they just have nobody to call
        session.sign_in(user());
        events.trigger("auth:logout", &jedi::obj());
        assert_eq!(mock.call_count(Method::Get, INBOX), 0);
    }
}
