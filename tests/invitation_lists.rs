include!("./_lib.rs");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rsvp_core::models::invitation::{InvitationStatus, ResponseAction};
    use rsvp_core::store::{ListSource, StoreOutcome};
    use rsvp_core::util::ser::parse_timestamp;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-06-01T12:00:00Z").unwrap()
    }

    #[test]
    fn accepting_moves_between_buckets() {
        let harness = Harness::new();
        harness.inbox(vec![invitation(1, 7, "pending", "2099-01-01")]);
        let list = harness.rsvp.invitation_list(ListSource::User);
        list.load();
        assert_eq!(list.pending(&now()).len(), 1);
        assert!(list.accepted(&now()).is_empty());

        harness.mock.on(Method::Put, "/event/invitations/1/respond", json!({
            "success": true,
            "data": invitation(1, 7, "accepted", "2099-01-01"),
        }));
        match list.respond(1, ResponseAction::Accept) {
            StoreOutcome::Applied(inv) => assert_eq!(inv.status, InvitationStatus::Accepted),
            x => panic!("unexpected: {:?}", x),
        }
        assert!(list.pending(&now()).is_empty());
        assert_eq!(list.accepted(&now()).len(), 1);
        assert_eq!(list.invitations().len(), 1);
    }

    #[test]
    fn stale_pending_reads_as_expired() {
        let harness = Harness::new();
        harness.inbox(vec![invitation(1, 7, "pending", "2024-05-31T12:00:00Z")]);
        let list = harness.rsvp.invitation_list(ListSource::User);
        list.load();
        assert!(list.pending(&now()).is_empty());
        assert_eq!(list.expired(&now()).len(), 1);
        // the record itself still says what the server said
        assert_eq!(list.invitations()[0].status, InvitationStatus::Pending);
        // earlier, it was still pending
        let before = parse_timestamp("2024-05-31T12:00:00Z").unwrap();
        assert_eq!(list.pending(&before).len(), 1);
    }

    #[test]
    fn lists_drift_until_reloaded() {
        let harness = Harness::new();
        harness.inbox(vec![invitation(1, 7, "pending", "2099-01-01")]);
        let inbox = harness.rsvp.invitation_list(ListSource::User);
        let badge_list = harness.rsvp.invitation_list(ListSource::User);
        inbox.load();
        badge_list.load();

        harness.mock.on(Method::Put, "/event/invitations/1/respond", json!({
            "success": true,
            "data": invitation(1, 7, "declined", "2099-01-01"),
        }));
        assert!(inbox.respond(1, ResponseAction::Decline).is_applied());
        assert_eq!(inbox.declined(&now()).len(), 1);
        assert_eq!(badge_list.pending(&now()).len(), 1);

        harness.inbox(vec![invitation(1, 7, "declined", "2099-01-01")]);
        badge_list.refresh();
        assert_eq!(badge_list.declined(&now()).len(), 1);
    }

    #[test]
    fn organizer_list() {
        let harness = Harness::new();
        harness.mock.on(Method::Get, "/event/10/invitations", json!({
            "success": true,
            "data": [invitation(5, 8, "pending", "2099-01-01"), invitation(6, 9, "accepted", "2099-01-01")],
        }));
        let list = harness.rsvp.invitation_list(ListSource::Event(10));
        list.load();
        let counts = list.counts(&now());
        assert_eq!((counts.pending, counts.accepted, counts.declined, counts.expired), (1, 1, 0, 0));

        harness.mock.on(Method::Delete, "/event/invitations/5", json!({"success": true, "message": "Invitation annulée"}));
        assert_eq!(list.cancel(5), StoreOutcome::Applied(String::from("Invitation annulée")));
        assert_eq!(list.invitations().len(), 1);
        assert_eq!(list.invitations()[0].id, 6);
    }
}
