use crate::workflows::rota::consolidated::{ViewError, ViewType};

use super::common::{build_services, publish_bartender_week, week};

#[test]
fn view_types_parse_by_name() {
    assert_eq!(
        ViewType::from_name("front_of_house").expect("known view"),
        ViewType::FrontOfHouse
    );
    assert_eq!(
        ViewType::from_name(" Managers ").expect("known view"),
        ViewType::Managers
    );

    let error = ViewType::from_name("kitchen_only").expect_err("unknown view");
    assert!(matches!(error, ViewError::UnknownViewType(_)));
}

#[test]
fn groups_follow_the_fixed_priority_order() {
    let (services, _, _) = build_services();
    publish_bartender_week(&services);

    let view = services
        .views
        .week_view(ViewType::AllStaff, week())
        .expect("view builds");

    let labels: Vec<&str> = view.groups.iter().map(|group| group.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Hostess", "Managers", "Bartenders", "Waiters", "Skullers"]
    );
}

#[test]
fn unassigned_days_render_off() {
    let (services, _, _) = build_services();
    publish_bartender_week(&services);

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
        .expect("jonas listed");
    assert_eq!(jonas.days[4].display(), "Night (18:00 - Close)");
    assert_eq!(jonas.days[0].display(), "OFF");

    // Nadia has no assignments at all but still appears in her group.
    let nadia = bartenders
        .members
        .iter()
        .find(|member| member.full_name == "Nadia Fourie")
        .expect("nadia listed");
    assert!(nadia.days.iter().all(|day| day.display() == "OFF"));
}

#[test]
fn slices_restrict_the_listed_roles() {
    let (services, _, _) = build_services();
    publish_bartender_week(&services);

    let front = services
        .views
        .week_view(ViewType::FrontOfHouse, week())
        .expect("view builds");
    assert!(front.groups.iter().all(|group| group.label != "Skullers"));
    assert!(front.groups.iter().all(|group| group.label != "Managers"));

    let managers = services
        .views
        .week_view(ViewType::Managers, week())
        .expect("view builds");
    assert_eq!(managers.groups.len(), 1);
    assert_eq!(managers.groups[0].label, "Managers");
    assert_eq!(managers.groups[0].members.len(), 1);
}

#[test]
fn members_within_a_group_sort_by_name() {
    let (services, _, _) = build_services();
    publish_bartender_week(&services);

    let view = services
        .views
        .week_view(ViewType::AllStaff, week())
        .expect("view builds");
    let bartenders = view
        .groups
        .iter()
        .find(|group| group.label == "Bartenders")
        .expect("bartenders group present");

    let names: Vec<&str> = bartenders
        .members
        .iter()
        .map(|member| member.full_name.as_str())
        .collect();
    assert_eq!(names, vec!["Jonas Meyer", "Nadia Fourie", "Thabo Nkosi"]);
}
