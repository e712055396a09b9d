use chrono::Duration;

use crate::workflows::rota::domain::StaffRole;
use crate::workflows::rota::draft::DraftKey;
use crate::workflows::rota::exchange::ExchangeError;
use crate::workflows::rota::schedule::{
    EntryId, ExchangeMarker, NoticeKind, ScheduleRepository, SwapStatus, VolunteerStatus,
};

use super::common::{
    build_services, day_before, manager, publish_bartender_week, sid, week, TestServices,
};

fn assign_thabo_waiter_friday(services: &TestServices) {
    let key = DraftKey {
        role: StaffRole::Waiter,
        week: week(),
    };
    services
        .drafts
        .assign(
            &key,
            sid("u-thabo"),
            week().dates()[4],
            "Night",
            Some("17:00".to_string()),
            Some("Close".to_string()),
        )
        .expect("waiter assignment accepted");
    services
        .drafts
        .publish(&manager(services), &key)
        .expect("waiter rota publishes");
}

#[test]
fn swap_requests_compute_the_conflict_checked_eligible_set() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);
    let friday_entry = &published[0];
    assert_eq!(friday_entry.user_id, sid("u-jonas"));

    // Thabo picks up a waiter shift the same Friday, so only Nadia is left.
    assign_thabo_waiter_friday(&services);

    let request = services
        .exchanges
        .request_swap(&friday_entry.id, &sid("u-jonas"), None, day_before(friday_entry.date))
        .expect("swap request accepted");

    assert_eq!(request.status, SwapStatus::Pending);
    assert_eq!(request.eligible_coverers, vec![sid("u-nadia")]);
}

#[test]
fn swap_requests_mark_the_entry_as_mid_exchange() {
    let (services, schedule, _) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    services
        .exchanges
        .request_swap(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("swap request accepted");

    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert!(entry.is_mid_exchange());
    match entry.exchange {
        Some(ExchangeMarker::Swap { status, requested_by }) => {
            assert_eq!(status, SwapStatus::Pending);
            assert_eq!(requested_by, "Jonas Meyer");
        }
        other => panic!("expected swap marker, got {other:?}"),
    }

    let again = services
        .exchanges
        .request_swap(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect_err("second request rejected");
    assert!(matches!(again, ExchangeError::AlreadyInExchange { .. }));
}

#[test]
fn only_the_owner_may_request_a_swap() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);

    let error = services
        .exchanges
        .request_swap(
            &published[0].id,
            &sid("u-nadia"),
            None,
            day_before(published[0].date),
        )
        .expect_err("non-owner rejected");
    assert!(matches!(error, ExchangeError::NotOwner { .. }));
}

#[test]
fn yesterdays_shift_cannot_be_swapped_but_todays_can() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);
    let friday = published[0].date;

    let error = services
        .exchanges
        .request_swap(
            &published[0].id,
            &sid("u-jonas"),
            None,
            (friday + Duration::days(1))
                .and_hms_opt(0, 30, 0)
                .expect("valid time"),
        )
        .expect_err("past shift rejected");
    assert!(matches!(error, ExchangeError::ShiftInPast { .. }));

    services
        .exchanges
        .request_swap(
            &published[0].id,
            &sid("u-jonas"),
            None,
            friday.and_hms_opt(23, 0, 0).expect("valid time"),
        )
        .expect("same-day request accepted");
}

#[test]
fn suggested_coverers_must_pass_the_authoritative_check() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);

    let error = services
        .exchanges
        .request_swap(
            &published[0].id,
            &sid("u-jonas"),
            Some(sid("u-lena")),
            day_before(published[0].date),
        )
        .expect_err("waiter cannot cover a bartender shift");
    assert!(matches!(error, ExchangeError::IneligibleCoverer { .. }));
}

#[test]
fn approving_a_swap_reassigns_the_shift_exactly_once() {
    let (services, schedule, notifier) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    let request = services
        .exchanges
        .request_swap(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("swap request accepted");

    let resolved = services
        .exchanges
        .approve_swap(&request.id, &sid("u-nadia"))
        .expect("approval succeeds");
    assert_eq!(resolved.status, SwapStatus::Approved);

    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert_eq!(entry.user_id, sid("u-nadia"));
    assert!(!entry.is_mid_exchange());

    // The losing side of two concurrent resolutions observes AlreadyResolved.
    let error = services
        .exchanges
        .approve_swap(&request.id, &sid("u-nadia"))
        .expect_err("second resolution loses");
    assert!(matches!(error, ExchangeError::AlreadyResolved { .. }));

    let kinds: Vec<NoticeKind> = notifier.events().iter().map(|event| event.kind).collect();
    assert!(kinds.contains(&NoticeKind::SwapRequested));
    assert!(kinds.contains(&NoticeKind::SwapApproved));
}

#[test]
fn approval_rechecks_eligibility_instead_of_trusting_the_stored_set() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    let request = services
        .exchanges
        .request_swap(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("swap request accepted");
    assert!(request.eligible_coverers.contains(&sid("u-thabo")));

    // Thabo becomes double-booked between request and approval.
    assign_thabo_waiter_friday(&services);

    let error = services
        .exchanges
        .approve_swap(&request.id, &sid("u-thabo"))
        .expect_err("stale eligibility rejected");
    assert!(matches!(error, ExchangeError::IneligibleCoverer { .. }));
}

#[test]
fn denying_a_swap_leaves_the_assignment_untouched() {
    let (services, schedule, _) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    let request = services
        .exchanges
        .request_swap(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("swap request accepted");
    let resolved = services
        .exchanges
        .deny_swap(&request.id)
        .expect("denial succeeds");
    assert_eq!(resolved.status, SwapStatus::Denied);

    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert_eq!(entry.user_id, sid("u-jonas"));
    assert!(!entry.is_mid_exchange());
}

#[test]
fn relinquish_volunteer_approve_reassigns_ownership() {
    let (services, schedule, notifier) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    let request = services
        .exchanges
        .relinquish(
            &entry_id,
            &sid("u-jonas"),
            Some("family commitment".to_string()),
            day_before(published[0].date),
        )
        .expect("relinquish accepted");
    assert_eq!(request.status, VolunteerStatus::Open);

    services
        .exchanges
        .volunteer(&request.id, &sid("u-thabo"))
        .expect("thabo volunteers");
    let listed = services
        .exchanges
        .volunteer(&request.id, &sid("u-nadia"))
        .expect("nadia volunteers");
    assert_eq!(listed.volunteers, vec![sid("u-thabo"), sid("u-nadia")]);
    assert_eq!(listed.status, VolunteerStatus::Open);

    // The published entry surfaces the pending adjudication to managers.
    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert!(matches!(
        entry.exchange,
        Some(ExchangeMarker::Volunteer {
            status: VolunteerStatus::PendingApproval,
            ..
        })
    ));

    let error = services
        .exchanges
        .approve_volunteer(&request.id, &sid("u-sipho"))
        .expect_err("sipho never volunteered");
    assert!(matches!(error, ExchangeError::NotAVolunteer { .. }));

    let resolved = services
        .exchanges
        .approve_volunteer(&request.id, &sid("u-nadia"))
        .expect("approval succeeds");
    assert_eq!(resolved.status, VolunteerStatus::Approved);

    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert_eq!(entry.user_id, sid("u-nadia"));

    let kinds: Vec<NoticeKind> = notifier.events().iter().map(|event| event.kind).collect();
    assert!(kinds.contains(&NoticeKind::ShiftRelinquished));
    assert!(kinds.contains(&NoticeKind::VolunteerJoined));
    assert!(kinds.contains(&NoticeKind::VolunteerApproved));
}

#[test]
fn volunteering_twice_is_a_quiet_no_op() {
    let (services, _, notifier) = build_services();
    let published = publish_bartender_week(&services);

    let request = services
        .exchanges
        .relinquish(
            &published[0].id,
            &sid("u-jonas"),
            None,
            day_before(published[0].date),
        )
        .expect("relinquish accepted");

    services
        .exchanges
        .volunteer(&request.id, &sid("u-nadia"))
        .expect("first volunteer");
    let joined_events = notifier
        .events()
        .iter()
        .filter(|event| event.kind == NoticeKind::VolunteerJoined)
        .count();

    let repeated = services
        .exchanges
        .volunteer(&request.id, &sid("u-nadia"))
        .expect("duplicate volunteer is a no-op");
    assert_eq!(repeated.volunteers, vec![sid("u-nadia")]);
    let after = notifier
        .events()
        .iter()
        .filter(|event| event.kind == NoticeKind::VolunteerJoined)
        .count();
    assert_eq!(joined_events, after);
}

#[test]
fn ineligible_staff_cannot_volunteer() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);

    let request = services
        .exchanges
        .relinquish(
            &published[0].id,
            &sid("u-jonas"),
            None,
            day_before(published[0].date),
        )
        .expect("relinquish accepted");

    let error = services
        .exchanges
        .volunteer(&request.id, &sid("u-lena"))
        .expect_err("waiter is not role-matched");
    assert!(matches!(error, ExchangeError::IneligibleCoverer { .. }));
}

#[test]
fn cancel_is_requester_only_and_terminal() {
    let (services, schedule, _) = build_services();
    let published = publish_bartender_week(&services);
    let entry_id = published[0].id.clone();

    let request = services
        .exchanges
        .relinquish(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("relinquish accepted");

    let error = services
        .exchanges
        .cancel_request(&request.id, &sid("u-thabo"))
        .expect_err("only the requester may cancel");
    assert!(matches!(error, ExchangeError::NotOwner { .. }));

    let resolved = services
        .exchanges
        .cancel_request(&request.id, &sid("u-jonas"))
        .expect("cancel succeeds");
    assert_eq!(resolved.status, VolunteerStatus::Cancelled);

    let entry = schedule
        .fetch_entry(&entry_id)
        .expect("schedule readable")
        .expect("entry still published");
    assert_eq!(entry.user_id, sid("u-jonas"));
    assert!(!entry.is_mid_exchange());

    let error = services
        .exchanges
        .volunteer(&request.id, &sid("u-nadia"))
        .expect_err("cancelled requests accept no volunteers");
    assert!(matches!(error, ExchangeError::AlreadyResolved { .. }));

    // A settled marker frees the entry for a fresh exchange.
    services
        .exchanges
        .relinquish(&entry_id, &sid("u-jonas"), None, day_before(published[0].date))
        .expect("entry can be relinquished again");
}

#[test]
fn concurrent_volunteer_resolutions_pick_exactly_one_winner() {
    let (services, _, _) = build_services();
    let published = publish_bartender_week(&services);

    let request = services
        .exchanges
        .relinquish(
            &published[0].id,
            &sid("u-jonas"),
            None,
            day_before(published[0].date),
        )
        .expect("relinquish accepted");
    services
        .exchanges
        .volunteer(&request.id, &sid("u-nadia"))
        .expect("volunteer accepted");

    services
        .exchanges
        .approve_volunteer(&request.id, &sid("u-nadia"))
        .expect("first resolution wins");
    let error = services
        .exchanges
        .cancel_request(&request.id, &sid("u-jonas"))
        .expect_err("second resolution loses");
    assert!(matches!(error, ExchangeError::AlreadyResolved { .. }));
}

#[test]
fn role_match_hint_skips_conflict_checks_but_still_filters_roles() {
    use crate::directory::StaffMember;
    use crate::workflows::rota::exchange::role_match_hint;
    use std::collections::BTreeSet;

    let bartender_roles: BTreeSet<StaffRole> = [StaffRole::Bartender].into_iter().collect();
    let candidates = vec![
        StaffMember {
            id: sid("u-jonas"),
            full_name: "Jonas Meyer".to_string(),
            roles: bartender_roles.clone(),
            active: true,
        },
        StaffMember {
            id: sid("u-nadia"),
            full_name: "Nadia Fourie".to_string(),
            roles: bartender_roles.clone(),
            active: true,
        },
        StaffMember {
            id: sid("u-old"),
            full_name: "Retired Bartender".to_string(),
            roles: bartender_roles.clone(),
            active: false,
        },
        StaffMember {
            id: sid("u-lena"),
            full_name: "Lena van Wyk".to_string(),
            roles: [StaffRole::Waiter].into_iter().collect(),
            active: true,
        },
    ];

    let hint = role_match_hint(&candidates, &bartender_roles, &sid("u-jonas"));
    assert_eq!(hint, vec![sid("u-nadia")]);
}

#[test]
fn exchange_operations_fail_cleanly_on_unknown_ids() {
    let (services, _, _) = build_services();
    publish_bartender_week(&services);

    let error = services
        .exchanges
        .request_swap(
            &EntryId("bartender:2030-01-07:2030-01-10:u-ghost".to_string()),
            &sid("u-jonas"),
            None,
            day_before(week().dates()[4]),
        )
        .expect_err("unknown entry rejected");
    assert!(matches!(error, ExchangeError::EntryNotFound { .. }));
}
