//! Dispatch takes messages sent from the UI and runs the needed core code to
//! generate the response. Essentially, it's the RPC endpoint for the core.
//!
//! Each message sent in is in the following format (JSON):
//!
//!     ["<message id>", "<command>", arg1, arg2, ...]
//!
//! where the arg\* can be any valid JSON value. The response is always
//! `{"id": "<message id>", "e": 0|1, "d": <data>}`; a failing command is an
//! `e: 1` response, not an `Err`.

use chrono::Utc;
use jedi::{Serialize, Value};

use crate::error::{RError, RResult};
use crate::gateway::{ApiResult, InviteRequest, MIN_SEARCH_LEN};
use crate::models::invitation::{Invitation, InvitationView, ResponseAction};
use crate::models::notification::Notification;
use crate::models::user::UserSearchResult;
use crate::rsvp::{Response, Rsvp};
use crate::session::SessionUser;

/// Process one message from the UI. Only a message we can't parse, or one
/// without an id to answer to, is an `Err`.
pub fn process(rsvp: &Rsvp, msg: &str) -> RResult<String> {
    let data: Value = jedi::parse(msg)?;

    // grab the request id from the data
    let mid = match jedi::walk(&["0"], &data) {
        Ok(&Value::String(ref x)) => x.clone(),
        Ok(&Value::Number(ref x)) => x.to_string(),
        _ => return RErr!(RError::MissingField(String::from("missing mid (0)"))),
    };
    let res = match jedi::get::<String>(&["1"], &data) {
        Ok(cmd) => {
            info!("dispatch({}): {}", mid, cmd);
            match dispatch(rsvp, &cmd, &data) {
                Ok(val) => Response::success(&mid, val),
                Err(e) => {
                    warn!("dispatch({}) -- {}: {}", mid, cmd, e);
                    Response::error(&mid, &e)
                }
            }
        }
        Err(_) => Response::error(&mid, &RError::MissingField(String::from("missing cmd (1)"))),
    };
    Ok(jedi::stringify(&res)?)
}

fn api_val<T: Serialize>(res: &ApiResult<T>) -> RResult<Value> {
    Ok(jedi::to_val(res)?)
}

fn dispatch(rsvp: &Rsvp, cmd: &str, data: &Value) -> RResult<Value> {
    match cmd {
        "ping" => {
            Ok(Value::String(String::from("pong")))
        }
        "auth:login" => {
            let user: SessionUser = jedi::get(&["2"], data)?;
            rsvp.session.sign_in(user);
            Ok(jedi::obj())
        }
        "auth:logout" => {
            rsvp.session.sign_out();
            Ok(jedi::obj())
        }
        "app:api:set-endpoint" => {
            let endpoint: String = jedi::get(&["2"], data)?;
            url::Url::parse(&endpoint)?;
            config::set(&["api", "endpoint"], &endpoint)?;
            Ok(jedi::obj())
        }
        "invite:search-users" => {
            let query: String = jedi::get(&["2", "query"], data)?;
            let event_id: Option<i64> = jedi::get_opt(&["2", "event_id"], data);
            let exclude: Option<bool> = jedi::get_opt(&["2", "exclude_participants"], data);
            if query.trim().chars().count() < MIN_SEARCH_LEN {
                debug!("dispatch -- invite:search-users: query too short, not searching");
                return api_val(&ApiResult::ok(Vec::<UserSearchResult>::new(), None));
            }
            api_val(&rsvp.gateway.search_users(query.trim(), event_id, exclude))
        }
        "invite:send" => {
            let event_id: i64 = jedi::get(&["2"], data)?;
            let req: InviteRequest = jedi::get(&["3"], data)?;
            api_val(&rsvp.gateway.invite_user(event_id, &req))
        }
        "invite:list-event" => {
            let event_id: i64 = jedi::get(&["2"], data)?;
            api_val(&rsvp.gateway.get_event_invitations(event_id))
        }
        "invite:list-user" => {
            api_val(&rsvp.gateway.get_user_invitations())
        }
        "invite:respond" => {
            let invitation_id: i64 = jedi::get(&["2"], data)?;
            let action: ResponseAction = jedi::get::<String>(&["3"], data)?.parse()?;
            api_val(&rsvp.gateway.respond_to_invitation(invitation_id, action))
        }
        "invite:cancel" => {
            let invitation_id: i64 = jedi::get(&["2"], data)?;
            api_val(&rsvp.gateway.cancel_invitation(invitation_id))
        }
        "invite:is-invited" => {
            let event_id: i64 = jedi::get(&["2"], data)?;
            let user_id: i64 = jedi::get(&["3"], data)?;
            Ok(Value::Bool(rsvp.gateway.is_user_invited(event_id, user_id)))
        }
        "invite:view" => {
            let invitation: Invitation = jedi::get(&["2"], data)?;
            let view = InvitationView::derive(&invitation, &Utc::now());
            Ok(jedi::to_val(&view)?)
        }
        "notifications:count" => {
            Ok(json!(rsvp.notifications.count()))
        }
        "notifications:refresh" => {
            let count = rsvp.notifications.refresh()?;
            Ok(json!(count))
        }
        "notifications:clear" => {
            rsvp.notifications.clear();
            Ok(jedi::obj())
        }
        "notifications:set" => {
            let count: u32 = jedi::get(&["2"], data)?;
            rsvp.notifications.set_count(count);
            Ok(jedi::obj())
        }
        "notifications:push" => {
            let notification: Notification = jedi::get(&["2"], data)?;
            rsvp.notifications.push(notification);
            Ok(json!(rsvp.notifications.count()))
        }
        _ => {
            RErr!(RError::MissingCommand(String::from(cmd)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::api::mock::MockTransport;

    fn run(rsvp: &Rsvp, msg: Value) -> Response {
        let out = process(rsvp, &jedi::stringify(&msg).unwrap()).unwrap();
        jedi::parse(&out).unwrap()
    }

    #[test]
    fn bad_messages() {
        let rsvp = Rsvp::new(Arc::new(MockTransport::new()));
        assert!(process(&rsvp, "not json").is_err());
        assert!(process(&rsvp, r#"[null, "ping"]"#).is_err());

        let res = run(&rsvp, json!(["1"]));
        assert_eq!(res, Response { id: String::from("1"), e: 1, d: json!("missing field: missing cmd (1)") });
        let res = run(&rsvp, json!([2, "invite:teleport"]));
        assert_eq!(res.id, "2");
        assert_eq!(res.e, 1);
        assert_eq!(res.d, json!("unknown command: invite:teleport"));
    }

    #[test]
    fn ping() {
        let rsvp = Rsvp::new(Arc::new(MockTransport::new()));
        assert_eq!(run(&rsvp, json!(["5", "ping"])), Response::success("5", json!("pong")));
    }

    #[test]
    fn short_searches_stay_local() {
        let mock = Arc::new(MockTransport::new());
        let rsvp = Rsvp::new(mock.clone());
        let res = run(&rsvp, json!(["1", "invite:search-users", {"query": " m "}]));
        assert_eq!(res.d, json!({"success": true, "data": []}));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn bad_actions() {
        let mock = Arc::new(MockTransport::new());
        let rsvp = Rsvp::new(mock.clone());
        let res = run(&rsvp, json!(["1", "invite:respond", 3, "maybe"]));
        assert_eq!(res.e, 1);
        assert!(mock.calls().is_empty());
        let res = run(&rsvp, json!(["2", "invite:cancel", "three"]));
        assert_eq!(res.e, 1);
    }
}
