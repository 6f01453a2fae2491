//! The signed-in user, as far as the invitation core cares. Logging in and
//! out themselves happen elsewhere; whoever does it tells us here, and we pass
//! the token to the api and let everyone listening know via `auth:login` /
//! `auth:logout`.

use std::sync::{Arc, RwLock};

use crate::api::Transport;
use crate::util::event::EventEmitter;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionUser {
    #[serde(with = "crate::util::ser::id_converter")]
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

pub struct Session {
    user: RwLock<Option<SessionUser>>,
    api: Arc<dyn Transport>,
    events: Arc<EventEmitter>,
}

impl Session {
    pub fn new(api: Arc<dyn Transport>, events: Arc<EventEmitter>) -> Session {
        Session {
            user: RwLock::new(None),
            api: api,
            events: events,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        lockr!(self.user).is_some()
    }

    pub fn user(&self) -> Option<SessionUser> {
        lockr!(self.user).clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        lockr!(self.user).as_ref().map(|u| u.id)
    }

    /// A user signed in (or a stored session was restored)
    pub fn sign_in(&self, user: SessionUser) {
        info!("session::sign_in() -- user {}", user.id);
        match user.token.as_ref() {
            Some(token) => self.api.set_auth(token),
            None => self.api.clear_auth(),
        }
        let payload = json!({"id": user.id, "username": user.username});
        {
            let mut guard = lockw!(self.user);
            *guard = Some(user);
        }
        self.events.trigger("auth:login", &payload);
    }

    /// The user signed out (or the session died)
    pub fn sign_out(&self) {
        let previous = lockw!(self.user).take();
        self.api.clear_auth();
        match previous {
            Some(user) => info!("session::sign_out() -- user {}", user.id),
            None => debug!("session::sign_out() -- nobody was signed in"),
        }
        self.events.trigger("auth:logout", &jedi::obj());
    }
}
