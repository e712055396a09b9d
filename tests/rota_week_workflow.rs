//! Integration specifications for the weekly rota cycle: availability
//! submission inside the window, staffing requirements (including the CSV
//! import path), draft assembly, publication, and the consolidated view.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use chrono::{Duration, NaiveDate};

use rotaflow::directory::StaffDirectory;
use rotaflow::infra::{demo_roster, in_memory_services};
use rotaflow::workflows::rota::availability::SubmissionWindow;
use rotaflow::workflows::rota::draft::DraftKey;
use rotaflow::workflows::rota::{
    AvailabilitySlot, RequirementScope, RequirementsCsvImporter, RotaWeek, StaffId, StaffRole,
    StaffingLevel, ViewType,
};

fn sid(raw: &str) -> StaffId {
    StaffId(raw.to_string())
}

fn week() -> RotaWeek {
    RotaWeek::containing(NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date"))
}

#[test]
fn availability_flows_into_the_ledger_inside_the_window() {
    let services = in_memory_services(demo_roster());
    let window = SubmissionWindow::for_week(week());
    let friday = week().dates()[4];

    let mut days = BTreeMap::new();
    days.insert(
        friday,
        [AvailabilitySlot::Day, AvailabilitySlot::Night]
            .into_iter()
            .collect::<BTreeSet<_>>(),
    );
    services
        .availability
        .submit(
            &sid("u-jonas"),
            week(),
            days,
            window.opens_at + Duration::hours(6),
        )
        .expect("submission inside the window");

    let stored = services
        .availability
        .get(&sid("u-jonas"), week())
        .expect("ledger readable");
    let friday_slots = stored.get(&friday).expect("friday recorded");
    assert!(friday_slots.contains(&AvailabilitySlot::Double));
}

#[test]
fn imported_requirements_drive_staffing_classification() {
    let services = in_memory_services(demo_roster());
    let manager = services
        .directory
        .get_user(&sid("u-marcus"))
        .expect("directory reachable")
        .expect("manager in roster");

    let csv = "Scope,Date,Min Staff,Max Staff\n\
bartender,2024-06-14,2,3\n\
all_staff,2024-06-14,5,\n";
    let imported =
        RequirementsCsvImporter::from_reader(Cursor::new(csv)).expect("import succeeds");
    for requirement in imported {
        services
            .requirements
            .set_requirement(
                &manager,
                requirement.scope,
                requirement.date,
                requirement.min_staff,
                requirement.max_staff,
            )
            .expect("manager applies imported rows");
    }

    let friday = NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date");
    let scope = RequirementScope::Role(StaffRole::Bartender);
    assert_eq!(
        services
            .requirements
            .classify(&scope, friday, 1)
            .expect("classification succeeds"),
        StaffingLevel::Understaffed
    );
    assert_eq!(
        services
            .requirements
            .classify(&scope, friday, 4)
            .expect("classification succeeds"),
        StaffingLevel::Overstaffed
    );
    assert_eq!(
        services
            .requirements
            .classify(&RequirementScope::AllStaff, friday, 6)
            .expect("classification succeeds"),
        StaffingLevel::Good
    );
}

#[test]
fn published_drafts_surface_in_the_consolidated_view() {
    let services = in_memory_services(demo_roster());
    let manager = services
        .directory
        .get_user(&sid("u-marcus"))
        .expect("directory reachable")
        .expect("manager in roster");
    let dates = week().dates();

    let key = DraftKey {
        role: StaffRole::Bartender,
        week: week(),
    };
    services
        .drafts
        .assign(&key, sid("u-jonas"), dates[4], "Night", None, None)
        .expect("catalog times cover friday night");
    services
        .drafts
        .assign(
            &key,
            sid("u-thabo"),
            dates[2],
            "Day",
            Some("11:00".to_string()),
            Some("16:00".to_string()),
        )
        .expect("custom times accepted");
    let published = services.drafts.publish(&manager, &key).expect("publish succeeds");
    assert_eq!(published.len(), 2);

    let view = services
        .views
        .week_view(ViewType::FrontOfHouse, week())
        .expect("view builds");
    let bartenders = view
        .groups
        .iter()
        .find(|group| group.label == "Bartenders")
        .expect("bartenders group present");

    let thabo = bartenders
        .members
        .iter()
        .find(|member| member.full_name == "Thabo Nkosi")
        .expect("thabo listed");
    assert_eq!(thabo.days[2].display(), "Day (11:00 - 16:00)");
    assert_eq!(thabo.days[3].display(), "OFF");
}

#[test]
fn republishing_after_edits_supersedes_dropped_assignments() {
    let services = in_memory_services(demo_roster());
    let manager = services
        .directory
        .get_user(&sid("u-marcus"))
        .expect("directory reachable")
        .expect("manager in roster");
    let dates = week().dates();

    let key = DraftKey {
        role: StaffRole::Bartender,
        week: week(),
    };
    services
        .drafts
        .assign(&key, sid("u-jonas"), dates[4], "Night", None, None)
        .expect("assignment accepted");
    services
        .drafts
        .assign(&key, sid("u-thabo"), dates[5], "Night", None, None)
        .expect("assignment accepted");
    services.drafts.publish(&manager, &key).expect("first publish");

    services
        .drafts
        .clear(&key, &sid("u-jonas"), dates[4])
        .expect("cell cleared");
    let republished = services.drafts.publish(&manager, &key).expect("second publish");

    assert_eq!(republished.len(), 1);
    assert_eq!(republished[0].user_id, sid("u-thabo"));

    let view = services
        .views
        .week_view(ViewType::AllStaff, week())
        .expect("view builds");
    let bartenders = view
        .groups
        .iter()
        .find(|group| group.label == "Bartenders")
        .expect("bartenders group present");
    let jonas = bartenders
        .members
        .iter()
        .find(|member| member.full_name == "Jonas Meyer")
        .expect("jonas still listed");
    assert_eq!(jonas.days[4].display(), "OFF");
}
