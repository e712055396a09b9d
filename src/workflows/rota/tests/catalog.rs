use chrono::Weekday;

use crate::workflows::rota::catalog::{DisplayTime, ShiftCatalog};
use crate::workflows::rota::domain::StaffRole;

#[test]
fn bartender_friday_night_resolves_from_the_definition_table() {
    let catalog = ShiftCatalog::standard();
    let display = catalog.resolve_display_time(
        &StaffRole::Bartender,
        Weekday::Fri,
        "Night",
        None,
        None,
    );
    assert_eq!(display, DisplayTime::Range("(18:00 - Close)".to_string()));
}

#[test]
fn custom_times_win_outright() {
    let catalog = ShiftCatalog::standard();
    let display = catalog.resolve_display_time(
        &StaffRole::Bartender,
        Weekday::Fri,
        "Night",
        Some("19:00"),
        Some("23:00"),
    );
    assert_eq!(display, DisplayTime::Range("(19:00 - 23:00)".to_string()));

    let close = catalog.resolve_display_time(
        &StaffRole::Waiter,
        Weekday::Tue,
        "Night",
        Some("17:00"),
        Some("Close"),
    );
    assert_eq!(close, DisplayTime::Range("(17:00 - Close)".to_string()));
}

#[test]
fn scheduler_specified_slots_require_custom_input() {
    let catalog = ShiftCatalog::standard();
    let display =
        catalog.resolve_display_time(&StaffRole::Waiter, Weekday::Tue, "Night", None, None);
    assert!(display.requires_custom());
    assert_eq!(display.label(), "custom input required");
}

#[test]
fn one_custom_bound_is_not_enough_to_override() {
    let catalog = ShiftCatalog::standard();
    let display = catalog.resolve_display_time(
        &StaffRole::Waiter,
        Weekday::Tue,
        "Night",
        Some("17:00"),
        None,
    );
    assert!(display.requires_custom());
}

#[test]
fn unknown_roles_fall_back_to_the_manager_rows() {
    let catalog = ShiftCatalog::standard();
    let display = catalog.resolve_display_time(
        &StaffRole::Other("sommelier".to_string()),
        Weekday::Fri,
        "Day",
        None,
        None,
    );
    assert_eq!(display, DisplayTime::Range("(08:00 - 17:00)".to_string()));
}

#[test]
fn specific_day_rows_shadow_the_default_rows() {
    let catalog = ShiftCatalog::standard();

    let friday =
        catalog.resolve_display_time(&StaffRole::Bartender, Weekday::Fri, "Day", None, None);
    assert_eq!(friday, DisplayTime::Range("(10:00 - 18:00)".to_string()));

    let tuesday =
        catalog.resolve_display_time(&StaffRole::Bartender, Weekday::Tue, "Day", None, None);
    assert!(tuesday.requires_custom());
}

#[test]
fn assignable_shift_types_follow_the_same_fallback() {
    let catalog = ShiftCatalog::standard();

    assert_eq!(
        catalog.assignable_shift_types(&StaffRole::Bartender, Weekday::Fri),
        vec!["Day".to_string(), "Night".to_string()]
    );
    assert_eq!(
        catalog.assignable_shift_types(&StaffRole::Waiter, Weekday::Tue),
        vec!["Day".to_string(), "Night".to_string(), "Double".to_string()]
    );
    // No rows for the role anywhere: manager defaults answer.
    assert_eq!(
        catalog.assignable_shift_types(&StaffRole::Other("runner".to_string()), Weekday::Mon),
        vec!["Day".to_string(), "Night".to_string()]
    );
}

#[test]
fn empty_catalog_answers_with_the_generic_list() {
    let catalog = ShiftCatalog::new(
        Vec::new(),
        vec!["Day".to_string(), "Night".to_string(), "Double".to_string()],
    );
    assert_eq!(
        catalog.assignable_shift_types(&StaffRole::Bartender, Weekday::Fri),
        vec!["Day".to_string(), "Night".to_string(), "Double".to_string()]
    );
    assert!(catalog
        .resolve_display_time(&StaffRole::Bartender, Weekday::Fri, "Night", None, None)
        .requires_custom());
}
