use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::directory::{DirectoryError, StaffDirectory, StaffMember};

use super::catalog::ShiftCatalog;
use super::domain::{ErrorKind, RotaWeek, StaffId, StaffRole};
use super::schedule::{RepositoryError, ScheduleEntry, ScheduleRepository};

/// A named staff slice renderable as one consolidated weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    FrontOfHouse,
    BackOfHouse,
    Managers,
    AllStaff,
}

impl ViewType {
    pub fn from_name(value: &str) -> Result<Self, ViewError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front_of_house" => Ok(Self::FrontOfHouse),
            "back_of_house" => Ok(Self::BackOfHouse),
            "managers" => Ok(Self::Managers),
            "all_staff" => Ok(Self::AllStaff),
            other => Err(ViewError::UnknownViewType(other.to_string())),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FrontOfHouse => "Front of House",
            Self::BackOfHouse => "Back of House",
            Self::Managers => "Managers",
            Self::AllStaff => "All Staff",
        }
    }

    fn includes(self, role: &StaffRole) -> bool {
        match self {
            Self::FrontOfHouse => matches!(
                role,
                StaffRole::Hostess | StaffRole::Bartender | StaffRole::Waiter
            ),
            Self::BackOfHouse => matches!(role, StaffRole::Skuller),
            Self::Managers => role.is_manager_tier(),
            Self::AllStaff => true,
        }
    }
}

/// Errors raised while building a consolidated view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("unknown view type '{0}'")]
    UnknownViewType(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl ViewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownViewType(_) => ErrorKind::Validation,
            Self::Repository(_) | Self::Directory(_) => ErrorKind::Dependency,
        }
    }
}

/// One day cell for one staff member; no entries renders as "OFF".
#[derive(Debug, Clone, Serialize)]
pub struct DayCellView {
    pub date: NaiveDate,
    pub shifts: Vec<String>,
}

impl DayCellView {
    pub fn display(&self) -> String {
        if self.shifts.is_empty() {
            "OFF".to_string()
        } else {
            self.shifts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberWeekView {
    pub user_id: StaffId,
    pub full_name: String,
    pub days: Vec<DayCellView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleGroupView {
    pub label: String,
    pub members: Vec<MemberWeekView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedWeekView {
    pub view_type: ViewType,
    pub week: RotaWeek,
    pub groups: Vec<RoleGroupView>,
}

/// Read-only weekly grid grouped by role priority: Hostess first, then
/// Managers, Bartenders, Waiters, Skullers, then unclassified roles
/// alphabetically.
pub struct ConsolidatedViewService<S, D> {
    schedule: Arc<S>,
    directory: Arc<D>,
    catalog: Arc<ShiftCatalog>,
}

impl<S, D> ConsolidatedViewService<S, D>
where
    S: ScheduleRepository,
    D: StaffDirectory,
{
    pub fn new(schedule: Arc<S>, directory: Arc<D>, catalog: Arc<ShiftCatalog>) -> Self {
        Self {
            schedule,
            directory,
            catalog,
        }
    }

    pub fn week_view(
        &self,
        view_type: ViewType,
        week: RotaWeek,
    ) -> Result<ConsolidatedWeekView, ViewError> {
        let staff = self.directory.list_active_staff()?;
        let entries = self.schedule.entries_for_week(week)?;

        let mut by_user: BTreeMap<StaffId, Vec<&ScheduleEntry>> = BTreeMap::new();
        for entry in &entries {
            by_user.entry(entry.user_id.clone()).or_default().push(entry);
        }

        let mut grouped: BTreeMap<(u8, String), Vec<MemberWeekView>> = BTreeMap::new();
        for member in staff
            .iter()
            .filter(|member| member.roles.iter().any(|role| view_type.includes(role)))
        {
            let (rank, group_label) = group_slot(member);
            let days = week
                .dates()
                .iter()
                .map(|date| DayCellView {
                    date: *date,
                    shifts: by_user
                        .get(&member.id)
                        .map(|user_entries| {
                            user_entries
                                .iter()
                                .filter(|entry| entry.date == *date)
                                .map(|entry| shift_label(entry, &self.catalog))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();

            grouped.entry((rank, group_label)).or_default().push(MemberWeekView {
                user_id: member.id.clone(),
                full_name: member.full_name.clone(),
                days,
            });
        }

        let groups = grouped
            .into_iter()
            .map(|((_, label), mut members)| {
                members.sort_by(|a, b| a.full_name.cmp(&b.full_name));
                RoleGroupView { label, members }
            })
            .collect();

        Ok(ConsolidatedWeekView {
            view_type,
            week,
            groups,
        })
    }
}

fn shift_label(entry: &ScheduleEntry, catalog: &ShiftCatalog) -> String {
    format!("{} {}", entry.shift_type, entry.display_time(catalog).label())
}

/// The group a member sorts under is their highest-priority role.
fn group_slot(member: &StaffMember) -> (u8, String) {
    let primary = member
        .roles
        .iter()
        .min_by_key(|role| (role.display_rank(), role.label()))
        .expect("directory members hold at least one role");

    let label = match primary.display_rank() {
        0 => "Hostess".to_string(),
        1 => "Managers".to_string(),
        2 => "Bartenders".to_string(),
        3 => "Waiters".to_string(),
        4 => "Skullers".to_string(),
        _ => primary.label(),
    };
    (primary.display_rank(), label)
}
