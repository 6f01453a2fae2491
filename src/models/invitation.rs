use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::RError;
use crate::models::user::UserSummary;
use crate::util::reltime;

/// Where an invitation is in its life. The server moves `pending` to
/// `accepted`/`declined`; `pending` to `expired` happens on our side, at read
/// time, by looking at the clock (see `effective_status()`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    /// Every status, in the order the UI shows its tabs
    pub fn all() -> [InvitationStatus; 4] {
        [
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
            InvitationStatus::Expired,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an invitee can say back
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseAction {
    Accept,
    Decline,
}

impl ResponseAction {
    pub fn as_str(&self) -> &'static str {
        match *self {
            ResponseAction::Accept => "accept",
            ResponseAction::Decline => "decline",
        }
    }
}

impl FromStr for ResponseAction {
    type Err = RError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(ResponseAction::Accept),
            "decline" => Ok(ResponseAction::Decline),
            _ => Err(RError::BadValue(format!("invitation action must be accept or decline, got {:?}", s))),
        }
    }
}

/// Just enough of the event to label an invitation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventSummary {
    #[serde(with = "crate::util::ser::id_converter")]
    pub id: i64,
    pub title: String,
    #[serde(default, with = "crate::util::ser::timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An offer for a user to join an event. Always created by the server; we only
/// ever swap a whole record for a fresher one, never edit fields in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Invitation {
    #[serde(with = "crate::util::ser::id_converter")]
    pub id: i64,
    #[serde(with = "crate::util::ser::id_converter")]
    pub event_id: i64,
    #[serde(with = "crate::util::ser::id_converter")]
    pub user_id: i64,
    #[serde(with = "crate::util::ser::id_converter")]
    pub inviter_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: InvitationStatus,
    #[serde(with = "crate::util::ser::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::util::ser::timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::util::ser::timestamp")]
    pub expires_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Has `expires_at` passed? Expiring exactly at `now` is not expired yet.
pub fn is_expired(expires_at: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
    now > expires_at
}

/// The status we show: a pending invitation past its expiry is expired, no
/// matter what the server still says.
pub fn effective_status(invitation: &Invitation, now: &DateTime<Utc>) -> InvitationStatus {
    match invitation.status {
        InvitationStatus::Pending if is_expired(&invitation.expires_at, now) => InvitationStatus::Expired,
        status => status,
    }
}

impl Invitation {
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        is_expired(&self.expires_at, now)
    }

    pub fn effective_status(&self, now: &DateTime<Utc>) -> InvitationStatus {
        effective_status(self, now)
    }

    /// Can the invitee still accept or decline this?
    pub fn is_actionable(&self, now: &DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }

    /// Key shared by every representation of this invitation (the record
    /// itself, a push notification about it...)
    pub fn notification_key(&self) -> String {
        notification_key(self.id)
    }
}

/// Every invitation notification key starts with this
pub const NOTIFICATION_KEY_PREFIX: &str = "inv_";

pub fn notification_key(invitation_id: i64) -> String {
    format!("{}{}", NOTIFICATION_KEY_PREFIX, invitation_id)
}

/// What a list row needs, derived fresh from a record and the clock
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvitationView {
    pub id: i64,
    pub effective_status: InvitationStatus,
    pub relative_time: String,
    pub expiry_label: String,
    pub actionable: bool,
}

impl InvitationView {
    pub fn derive(invitation: &Invitation, now: &DateTime<Utc>) -> InvitationView {
        let effective_status = invitation.effective_status(now);
        InvitationView {
            id: invitation.id,
            effective_status: effective_status,
            relative_time: reltime::relative_time_label(&invitation.created_at, now),
            expiry_label: reltime::expiry_label(&invitation.expires_at, now),
            actionable: effective_status == InvitationStatus::Pending,
        }
    }
}
