//! A per-consumer invitation list. Each screen or widget that shows
//! invitations makes its own `InvitationList`; they don't share state, so two
//! lists of the same invitations can disagree until one of them reloads.
//!
//! Responding to or cancelling an invitation is serialized across the *whole*
//! list: while one action is in flight (`responding_to` is set) every other
//! respond/cancel on this list is ignored, not just ones on the same row.
//!
//! Locks are only held to read or patch the state, never across a network
//! call.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::gateway::{InvitationGateway, InviteRequest};
use crate::models::invitation::{Invitation, InvitationStatus, ResponseAction};

/// Which invitations a list holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// The signed-in user's inbox
    User,
    /// Everything sent for one event (organizer's view)
    Event(i64),
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub invitations: Vec<Invitation>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    pub responding_to: Option<i64>,
    /// False once the consumer is gone. Checked under the same lock that
    /// applies a result, so an `unmount()` can't slip in between.
    #[serde(skip)]
    pub mounted: bool,
}

/// How a respond/cancel/invite went
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T> {
    /// The server said yes and the list was updated
    Applied(T),
    /// Another action was in flight (or the list is gone), nothing was sent
    Ignored,
    /// The server (or the network) said no; the list is untouched
    Failed(String),
}

impl<T> StoreOutcome<T> {
    pub fn is_applied(&self) -> bool {
        match *self {
            StoreOutcome::Applied(_) => true,
            _ => false,
        }
    }
}

/// Bucket sizes, for tab badges
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub pending: usize,
    pub accepted: usize,
    pub declined: usize,
    pub expired: usize,
}

#[derive(Clone, Copy)]
enum LoadFlag {
    Loading,
    Refreshing,
}

pub struct InvitationList {
    gateway: Arc<InvitationGateway>,
    source: ListSource,
    state: RwLock<ListState>,
}

impl InvitationList {
    pub fn new(gateway: Arc<InvitationGateway>, source: ListSource) -> InvitationList {
        InvitationList {
            gateway: gateway,
            source: source,
            state: RwLock::new(ListState { mounted: true, ..ListState::default() }),
        }
    }

    pub fn source(&self) -> ListSource {
        self.source
    }

    /// A copy of the whole state
    pub fn snapshot(&self) -> ListState {
        lockr!(self.state).clone()
    }

    pub fn invitations(&self) -> Vec<Invitation> {
        lockr!(self.state).invitations.clone()
    }

    pub fn is_loading(&self) -> bool {
        lockr!(self.state).loading
    }

    pub fn is_refreshing(&self) -> bool {
        lockr!(self.state).refreshing
    }

    pub fn error(&self) -> Option<String> {
        lockr!(self.state).error.clone()
    }

    pub fn responding_to(&self) -> Option<i64> {
        lockr!(self.state).responding_to
    }

    /// The consumer went away. Anything that finishes after this is dropped on
    /// the floor instead of being applied.
    pub fn unmount(&self) {
        lockw!(self.state).mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        lockr!(self.state).mounted
    }

    /// Initial load
    pub fn load(&self) {
        self.reload(LoadFlag::Loading)
    }

    /// Pull-to-refresh. Same as `load()`, tracked under its own flag.
    pub fn refresh(&self) {
        self.reload(LoadFlag::Refreshing)
    }

    fn set_flag(&self, flag: LoadFlag, val: bool) {
        let mut guard = lockw!(self.state);
        match flag {
            LoadFlag::Loading => guard.loading = val,
            LoadFlag::Refreshing => guard.refreshing = val,
        }
    }

    fn reload(&self, flag: LoadFlag) {
        self.set_flag(flag, true);
        let res = match self.source {
            ListSource::User => self.gateway.get_user_invitations(),
            ListSource::Event(event_id) => self.gateway.get_event_invitations(event_id),
        };
        let mut guard = lockw!(self.state);
        if guard.mounted {
            if res.success {
                guard.invitations = res.data.unwrap_or_default();
                guard.error = None;
                debug!("store::reload() -- {:?}: {} invitations", self.source, guard.invitations.len());
            } else {
                // a failed load doesn't keep stale data around
                guard.invitations = Vec::new();
                guard.error = Some(res.error_message());
                warn!("store::reload() -- {:?}: {}", self.source, res.error_message());
            }
        } else {
            debug!("store::reload() -- {:?}: unmounted, dropping result", self.source);
        }
        match flag {
            LoadFlag::Loading => guard.loading = false,
            LoadFlag::Refreshing => guard.refreshing = false,
        }
    }

    /// Claim the list-wide action lock. False if someone already has it.
    fn claim(&self, invitation_id: i64) -> bool {
        let mut guard = lockw!(self.state);
        if guard.responding_to.is_some() {
            return false;
        }
        guard.responding_to = Some(invitation_id);
        true
    }

    fn release(&self) {
        lockw!(self.state).responding_to = None;
    }

    /// Accept or decline an invitation. On success the record with the same
    /// id is swapped for the server's copy, in place.
    pub fn respond(&self, invitation_id: i64, action: ResponseAction) -> StoreOutcome<Invitation> {
        if !self.claim(invitation_id) {
            debug!("store::respond() -- {} ignored, another action is in flight", invitation_id);
            return StoreOutcome::Ignored;
        }
        let res = self.gateway.respond_to_invitation(invitation_id, action);
        let outcome = if !res.success {
            StoreOutcome::Failed(res.error_message())
        } else {
            match res.data {
                Some(updated) => {
                    let mut guard = lockw!(self.state);
                    if guard.mounted {
                        for inv in guard.invitations.iter_mut() {
                            if inv.id == updated.id {
                                *inv = updated.clone();
                            }
                        }
                    }
                    StoreOutcome::Applied(updated)
                }
                None => StoreOutcome::Failed(String::from("the server sent no invitation back")),
            }
        };
        self.release();
        outcome
    }

    /// Withdraw an invitation. On success it leaves the list entirely.
    pub fn cancel(&self, invitation_id: i64) -> StoreOutcome<String> {
        if !self.claim(invitation_id) {
            debug!("store::cancel() -- {} ignored, another action is in flight", invitation_id);
            return StoreOutcome::Ignored;
        }
        let res = self.gateway.cancel_invitation(invitation_id);
        let outcome = if res.success {
            let mut guard = lockw!(self.state);
            if guard.mounted {
                guard.invitations.retain(|inv| inv.id != invitation_id);
            }
            let message = res.data.map(|x| x.message).or(res.message).unwrap_or_default();
            StoreOutcome::Applied(message)
        } else {
            StoreOutcome::Failed(res.error_message())
        };
        self.release();
        outcome
    }

    /// Send an invitation from an event list. The new record is appended (or
    /// replaces one with the same id).
    pub fn invite(&self, req: &InviteRequest) -> StoreOutcome<Invitation> {
        let event_id = match self.source {
            ListSource::Event(id) => id,
            ListSource::User => return StoreOutcome::Failed(String::from("invitations can only be sent from an event's list")),
        };
        let res = self.gateway.invite_user(event_id, req);
        if !res.success {
            return StoreOutcome::Failed(res.error_message());
        }
        match res.data {
            Some(created) => {
                let mut guard = lockw!(self.state);
                if guard.mounted {
                    let existing = guard.invitations.iter().position(|inv| inv.id == created.id);
                    match existing {
                        Some(idx) => guard.invitations[idx] = created.clone(),
                        None => guard.invitations.push(created.clone()),
                    }
                }
                StoreOutcome::Applied(created)
            }
            None => StoreOutcome::Failed(String::from("the server sent no invitation back")),
        }
    }

    /// Invitations whose effective status at `now` is `status`. Recomputed on
    /// every call.
    pub fn bucket(&self, status: InvitationStatus, now: &DateTime<Utc>) -> Vec<Invitation> {
        lockr!(self.state).invitations.iter()
            .filter(|inv| inv.effective_status(now) == status)
            .cloned()
            .collect()
    }

    pub fn pending(&self, now: &DateTime<Utc>) -> Vec<Invitation> {
        self.bucket(InvitationStatus::Pending, now)
    }

    pub fn accepted(&self, now: &DateTime<Utc>) -> Vec<Invitation> {
        self.bucket(InvitationStatus::Accepted, now)
    }

    pub fn declined(&self, now: &DateTime<Utc>) -> Vec<Invitation> {
        self.bucket(InvitationStatus::Declined, now)
    }

    /// Both stale pending invitations and ones the server marked expired
    pub fn expired(&self, now: &DateTime<Utc>) -> Vec<Invitation> {
        self.bucket(InvitationStatus::Expired, now)
    }

    pub fn counts(&self, now: &DateTime<Utc>) -> BucketCounts {
        let guard = lockr!(self.state);
        let mut counts = BucketCounts::default();
        for inv in guard.invitations.iter() {
            match inv.effective_status(now) {
                InvitationStatus::Pending => counts.pending += 1,
                InvitationStatus::Accepted => counts.accepted += 1,
                InvitationStatus::Declined => counts.declined += 1,
                InvitationStatus::Expired => counts.expired += 1,
            }
        }
        counts
    }
}
