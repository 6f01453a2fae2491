//! The gateway turns each invitation-related API call into an `ApiResult`.
//!
//! The server speaks in envelopes (`{success, data, error, message}`), except
//! when it doesn't: the user inbox comes back as `{user_id, invitations}`.
//! Every response goes through an explicit shape check here, and every
//! failure (transport, HTTP status, parse, weird shape) is folded into
//! `success: false` with a message. Nothing leaves this module as an `Err`.

use std::sync::Arc;

use jedi::{DeserializeOwned, Value};
use url::form_urlencoded;

use crate::api::{ApiReq, Method, Transport};
use crate::error::{RError, RResult};
use crate::models::invitation::{Invitation, InvitationStatus, ResponseAction};
use crate::models::user::UserSearchResult;

/// Callers shouldn't search for users with fewer characters than this
pub const MIN_SEARCH_LEN: usize = 2;

/// The one result shape every gateway call returns
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T, message: Option<String>) -> ApiResult<T> {
        ApiResult { success: true, data: Some(data), error: None, message: message }
    }

    pub fn fail(error: String) -> ApiResult<T> {
        ApiResult { success: false, data: None, error: Some(error), message: None }
    }

    /// Convert into a plain Result, handy when the caller wants `?`
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(String::from("the server sent no data")),
            (false, _) => Err(self.error.unwrap_or_else(|| String::from("request failed"))),
        }
    }

    /// The error string, or a generic one for a failure that didn't say why
    pub fn error_message(&self) -> String {
        self.error.clone().unwrap_or_else(|| String::from("request failed"))
    }

    fn from_rresult(res: RResult<(T, Option<String>)>) -> ApiResult<T> {
        match res {
            Ok((data, message)) => ApiResult::ok(data, message),
            Err(e) => ApiResult::fail(e.human()),
        }
    }
}

/// The standard `{success, data, error, message}` envelope. Every field is
/// optional because the server is not consistent about any of them.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    fn decode(val: Value) -> RResult<Envelope<T>> {
        if !val.is_object() {
            return RErr!(RError::BadValue(format!("expected a response envelope, got {}", kind_of(&val))));
        }
        Ok(jedi::from_val(val)?)
    }

    /// Is this envelope telling us something went wrong? An explicit
    /// `success: false` always is; otherwise an `error` with no `success:
    /// true` next to it is.
    fn failure(&self) -> Option<String> {
        let failed = match self.success {
            Some(false) => true,
            Some(true) => false,
            None => self.error.is_some(),
        };
        if !failed {
            return None;
        }
        Some(self.error.clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| String::from("request failed")))
    }

    /// Unwrap the payload, treating a missing one as an error
    fn require(self) -> RResult<(T, Option<String>)> {
        if let Some(err) = self.failure() {
            return RErr!(RError::Msg(err));
        }
        match self.data {
            Some(data) => Ok((data, self.message)),
            None => RErr!(RError::MissingField(String::from("data"))),
        }
    }
}

impl<T: DeserializeOwned> Envelope<Vec<T>> {
    /// Unwrap a list payload. No list means an empty list, not an error.
    fn list(self) -> RResult<(Vec<T>, Option<String>)> {
        if let Some(err) = self.failure() {
            return RErr!(RError::Msg(err));
        }
        Ok((self.data.unwrap_or_default(), self.message))
    }
}

fn kind_of(val: &Value) -> &'static str {
    match *val {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The shapes `GET /event/invitations/user` has been seen answering with
#[derive(Debug)]
enum InboxShape {
    /// `{user_id, invitations: [...]}`, no `success` key
    Inbox(Value),
    /// the usual `{success, data, ...}`
    Standard(Value),
    /// `{}`, `null`, or anything else that carries no invitations and no error
    Empty,
}

impl InboxShape {
    fn detect(val: Value) -> InboxShape {
        if jedi::has_key("invitations", &val) {
            InboxShape::Inbox(val)
        } else if ["success", "data", "error"].iter().any(|k| jedi::has_key(k, &val)) {
            InboxShape::Standard(val)
        } else {
            InboxShape::Empty
        }
    }

    fn decode(self) -> RResult<(Vec<Invitation>, Option<String>)> {
        match self {
            InboxShape::Inbox(mut val) => {
                let invitations: Option<Vec<Invitation>> = jedi::from_val(val["invitations"].take())?;
                Ok((invitations.unwrap_or_default(), None))
            }
            InboxShape::Standard(val) => Envelope::<Vec<Invitation>>::decode(val)?.list(),
            InboxShape::Empty => Ok((Vec::new(), None)),
        }
    }
}

#[derive(Deserialize, Debug)]
struct SearchData {
    #[serde(default)]
    users: Option<Vec<UserSearchResult>>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default, rename = "searchTerm")]
    search_term: Option<String>,
}

/// What the organizer sends to invite someone
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InviteRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What the server says after deleting an invitation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CancelReceipt {
    pub message: String,
}

pub struct InvitationGateway {
    api: Arc<dyn Transport>,
}

impl InvitationGateway {
    pub fn new(api: Arc<dyn Transport>) -> InvitationGateway {
        InvitationGateway { api: api }
    }

    /// Search users to invite. Always hands back a list, even on failure, so
    /// callers can iterate without checking.
    pub fn search_users(&self, query: &str, event_id: Option<i64>, exclude_participants: Option<bool>) -> ApiResult<Vec<UserSearchResult>> {
        match self.do_search_users(query, event_id, exclude_participants) {
            Ok((users, message)) => ApiResult::ok(users, message),
            Err(e) => {
                warn!("gateway::search_users() -- {}", e);
                let mut res = ApiResult::fail(e.human());
                res.data = Some(Vec::new());
                res
            }
        }
    }

    fn do_search_users(&self, query: &str, event_id: Option<i64>, exclude_participants: Option<bool>) -> RResult<(Vec<UserSearchResult>, Option<String>)> {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        qs.append_pair("q", query);
        if let Some(id) = event_id {
            qs.append_pair("event_id", &id.to_string());
        }
        if let Some(exclude) = exclude_participants {
            qs.append_pair("excludeParticipants", if exclude { "true" } else { "false" });
        }
        let resource = format!("/event/search/users?{}", qs.finish());
        let val = self.api.get(&resource, ApiReq::new())?;
        let (data, message) = Envelope::<SearchData>::decode(val)?.require()?;
        let SearchData { users, count, search_term } = data;
        let users = match users {
            Some(x) => x,
            None => return RErr!(RError::MissingField(String::from("data.users"))),
        };
        debug!("gateway::search_users() -- {:?}: {} of {:?} users", search_term, users.len(), count);
        Ok((users, message))
    }

    /// Make a call and decode the standard envelope out of the response
    fn envelope<T: DeserializeOwned>(&self, method: Method, resource: &str, req: ApiReq) -> RResult<Envelope<T>> {
        self.api.call(method, resource, req)
            .and_then(|val| Envelope::decode(val))
    }

    /// Invite a user to an event. The server creates a pending invitation.
    pub fn invite_user(&self, event_id: i64, req: &InviteRequest) -> ApiResult<Invitation> {
        let resource = format!("/event/{}/invite", event_id);
        let res = jedi::to_val(req)
            .map_err(|e| torerr!(e))
            .and_then(|body| self.envelope::<Invitation>(Method::Post, &resource, ApiReq::new().data(body)))
            .and_then(|envelope| envelope.require());
        log_failure("invite_user", &res);
        ApiResult::from_rresult(res)
    }

    /// Every invitation sent for an event (the organizer's view)
    pub fn get_event_invitations(&self, event_id: i64) -> ApiResult<Vec<Invitation>> {
        let resource = format!("/event/{}/invitations", event_id);
        let res = self.envelope::<Vec<Invitation>>(Method::Get, &resource, ApiReq::new())
            .and_then(|envelope| envelope.list());
        log_failure("get_event_invitations", &res);
        ApiResult::from_rresult(res)
    }

    /// Invitations addressed to the signed-in user. An empty inbox is a
    /// success.
    pub fn get_user_invitations(&self) -> ApiResult<Vec<Invitation>> {
        let res = self.api.get("/event/invitations/user", ApiReq::new())
            .and_then(|val| InboxShape::detect(val).decode());
        log_failure("get_user_invitations", &res);
        ApiResult::from_rresult(res)
    }

    /// Accept or decline. The record that comes back is the new truth for
    /// this invitation; don't patch the old one.
    pub fn respond_to_invitation(&self, invitation_id: i64, action: ResponseAction) -> ApiResult<Invitation> {
        let resource = format!("/event/invitations/{}/respond", invitation_id);
        let body = json!({"invitation_id": invitation_id, "action": action});
        let res = self.envelope::<Invitation>(Method::Put, &resource, ApiReq::new().data(body))
            .and_then(|envelope| envelope.require());
        log_failure("respond_to_invitation", &res);
        ApiResult::from_rresult(res)
    }

    /// Withdraw an invitation. Only the inviter of a pending invitation can,
    /// and only the server checks that.
    pub fn cancel_invitation(&self, invitation_id: i64) -> ApiResult<CancelReceipt> {
        let resource = format!("/event/invitations/{}", invitation_id);
        let res = self.envelope::<CancelReceipt>(Method::Delete, &resource, ApiReq::new())
            .and_then(|envelope| {
                if let Some(err) = envelope.failure() {
                    return RErr!(RError::Msg(err));
                }
                let Envelope { data, message, .. } = envelope;
                let receipt = match data {
                    Some(x) => x,
                    None => CancelReceipt { message: message.clone().unwrap_or_default() },
                };
                Ok((receipt, message))
            });
        log_failure("cancel_invitation", &res);
        ApiResult::from_rresult(res)
    }

    /// Does `user_id` have a live (pending or accepted) invitation to the
    /// event? Any failure reads as `false`, which means "not invited" and
    /// "couldn't tell" look the same to the caller.
    pub fn is_user_invited(&self, event_id: i64, user_id: i64) -> bool {
        let res = self.get_event_invitations(event_id);
        if !res.success {
            warn!("gateway::is_user_invited() -- treating failure as not invited: {}", res.error_message());
            return false;
        }
        res.data.unwrap_or_default().iter().any(|inv| {
            inv.user_id == user_id
                && (inv.status == InvitationStatus::Pending || inv.status == InvitationStatus::Accepted)
        })
    }
}

fn log_failure<T>(op: &str, res: &RResult<T>) {
    if let Err(ref e) = *res {
        warn!("gateway::{}() -- {}", op, e);
    }
}
