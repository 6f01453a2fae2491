//! Notifications reach us two ways: synthesized from the invitation list, and
//! pushed from elsewhere (a push payload, a websocket message). Both can be
//! about the same invitation, so everything is keyed and merged before we
//! count anything.

use chrono::{DateTime, Utc};

use crate::models::invitation::{Invitation, InvitationStatus, NOTIFICATION_KEY_PREFIX};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Invitation,
    Reminder,
    Message,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// Stable identity. Invitation notifications use `inv_<invitation id>`.
    pub key: String,
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, with = "crate::util::ser::timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// An invitation is "unread" for as long as it's waiting on an answer
    pub fn from_invitation(invitation: &Invitation, now: &DateTime<Utc>) -> Notification {
        let title = invitation.event.as_ref().map(|ev| ev.title.clone());
        Notification {
            key: invitation.notification_key(),
            kind: NotificationKind::Invitation,
            title: title,
            read: invitation.effective_status(now) != InvitationStatus::Pending,
            created_at: Some(invitation.created_at),
        }
    }

    /// About an invitation, whichever way it reached us
    pub fn is_invitation(&self) -> bool {
        self.kind == NotificationKind::Invitation || self.key.starts_with(NOTIFICATION_KEY_PREFIX)
    }
}

/// Merge two notification sources by key. Entries from `primary` win, and
/// come first; `secondary` entries with a key already seen are dropped.
pub fn merge(primary: Vec<Notification>, secondary: Vec<Notification>) -> Vec<Notification> {
    let mut merged: Vec<Notification> = Vec::with_capacity(primary.len() + secondary.len());
    for notification in primary.into_iter().chain(secondary.into_iter()) {
        if merged.iter().any(|n| n.key == notification.key) {
            continue;
        }
        merged.push(notification);
    }
    merged
}

/// Everything unread, whatever it's about
pub fn unread_count(notifications: &[Notification]) -> u32 {
    notifications.iter().filter(|n| !n.read).count() as u32
}

/// Unread invitation notifications only: the invitations still waiting on an
/// answer. This is what the badge shows.
pub fn pending_invitation_count(notifications: &[Notification]) -> u32 {
    notifications.iter().filter(|n| n.is_invitation() && !n.read).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ser::parse_timestamp;

    fn pushed(key: &str, read: bool) -> Notification {
        Notification {
            key: String::from(key),
            kind: NotificationKind::Invitation,
            title: None,
            read: read,
            created_at: None,
        }
    }

    #[test]
    fn from_invitations() {
        let now = parse_timestamp("2024-06-01T00:00:00Z").unwrap();
        let inv: Invitation = jedi::from_val(json!({
            "id": 5, "event_id": 1, "user_id": 2, "inviter_id": 3, "status": "pending",
            "created_at": "2024-05-30", "expires_at": "2024-06-30",
            "event": {"id": 1, "title": "Anniversaire"},
        })).unwrap();
        let n = Notification::from_invitation(&inv, &now);
        assert_eq!(n.key, "inv_5");
        assert_eq!(n.title.as_ref().map(|x| x.as_str()), Some("Anniversaire"));
        assert!(!n.read);
        let later = parse_timestamp("2024-07-01T00:00:00Z").unwrap();
        assert!(Notification::from_invitation(&inv, &later).read);
    }

    #[test]
    fn merge_never_double_counts() {
        let primary = vec![pushed("inv_1", false), pushed("inv_2", true)];
        let secondary = vec![pushed("inv_1", false), pushed("inv_2", false), pushed("msg_9", false)];
        let merged = merge(primary, secondary);
        let keys = merged.iter().map(|n| n.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["inv_1", "inv_2", "msg_9"]);
        // inv_2 kept the primary's read flag
        assert_eq!(unread_count(&merged), 2);
    }

    #[test]
    fn only_invitations_are_pending() {
        let mut message = pushed("msg_9", false);
        message.kind = NotificationKind::Message;
        // an invitation key is enough, even with the wrong kind
        let mut keyed = pushed("inv_3", false);
        keyed.kind = NotificationKind::Other;
        let all = vec![pushed("inv_1", false), pushed("inv_2", true), message, keyed];
        assert_eq!(unread_count(&all), 3);
        assert_eq!(pending_invitation_count(&all), 2);
        assert!(!all[2].is_invitation());
        assert!(all[3].is_invitation());
    }
}
