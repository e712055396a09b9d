use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::directory::StaffMember;

use super::catalog::ShiftCatalog;
use super::domain::{ErrorKind, RotaWeek, StaffId, StaffRole};
use super::schedule::{
    EntryId, NoticeKind, NotificationSink, RepositoryError, RotaNotice, ScheduleEntry,
    ScheduleRepository,
};

/// A draft is scoped to one role and one week; this is its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub role: StaffRole,
    pub week: RotaWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    Drafting,
    SavedDraft,
    Published,
}

/// One cell of the assignment grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAssignment {
    pub shift_type: String,
    pub custom_start: Option<String>,
    pub custom_end: Option<String>,
}

/// The in-progress weekly assignment grid for one (role, week).
#[derive(Debug, Clone)]
pub struct RotaDraft {
    pub key: DraftKey,
    pub state: DraftState,
    pub cells: BTreeMap<(NaiveDate, StaffId), DraftAssignment>,
}

impl RotaDraft {
    pub fn empty(key: DraftKey) -> Self {
        Self {
            key,
            state: DraftState::Empty,
            cells: BTreeMap::new(),
        }
    }
}

/// Draft persistence, invisible to staff until published.
pub trait DraftRepository: Send + Sync {
    fn save(&self, draft: RotaDraft) -> Result<(), RepositoryError>;
    fn load(&self, key: &DraftKey) -> Result<Option<RotaDraft>, RepositoryError>;
}

/// Errors raised while editing or publishing a draft.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("date {date} does not fall in {week}")]
    DateOutsideWeek { date: NaiveDate, week: RotaWeek },
    #[error("shift type '{shift_type}' is not assignable for {role}")]
    UnknownShiftType { shift_type: String, role: StaffRole },
    #[error("shift '{shift_type}' on {date} requires scheduler-specified start and end times")]
    MissingCustomTime { shift_type: String, date: NaiveDate },
    #[error("{user} does not hold an adjudicator role")]
    NotAdjudicator { user: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DraftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DateOutsideWeek { .. }
            | Self::UnknownShiftType { .. }
            | Self::MissingCustomTime { .. } => ErrorKind::Validation,
            Self::NotAdjudicator { .. } => ErrorKind::Policy,
            Self::Repository(_) => ErrorKind::Dependency,
        }
    }
}

/// Server-held draft grids plus the publish boundary. Edits within one
/// process serialize on the working-set mutex; concurrent adjudicators are
/// last-write-wins by arrival order.
pub struct SchedulerDraftService<D, S, N> {
    drafts: Arc<D>,
    schedule: Arc<S>,
    notifier: Arc<N>,
    catalog: Arc<ShiftCatalog>,
    working: Mutex<HashMap<DraftKey, RotaDraft>>,
}

impl<D, S, N> SchedulerDraftService<D, S, N>
where
    D: DraftRepository,
    S: ScheduleRepository,
    N: NotificationSink,
{
    pub fn new(drafts: Arc<D>, schedule: Arc<S>, notifier: Arc<N>, catalog: Arc<ShiftCatalog>) -> Self {
        Self {
            drafts,
            schedule,
            notifier,
            catalog,
            working: Mutex::new(HashMap::new()),
        }
    }

    fn with_draft<T>(
        &self,
        key: &DraftKey,
        apply: impl FnOnce(&mut RotaDraft) -> Result<T, DraftError>,
    ) -> Result<T, DraftError> {
        let mut working = self.working.lock().expect("draft mutex poisoned");
        if !working.contains_key(key) {
            let draft = self
                .drafts
                .load(key)?
                .unwrap_or_else(|| RotaDraft::empty(key.clone()));
            working.insert(key.clone(), draft);
        }
        let draft = working.get_mut(key).expect("draft just inserted");
        apply(draft)
    }

    /// Write or overwrite one (date, user) cell. Shift types the catalog
    /// resolves to "custom input required" must arrive with both custom
    /// times.
    pub fn assign(
        &self,
        key: &DraftKey,
        user_id: StaffId,
        date: NaiveDate,
        shift_type: &str,
        custom_start: Option<String>,
        custom_end: Option<String>,
    ) -> Result<(), DraftError> {
        if !key.week.contains(date) {
            return Err(DraftError::DateOutsideWeek {
                date,
                week: key.week,
            });
        }

        let assignable = self.catalog.assignable_shift_types(&key.role, date.weekday());
        if !assignable.iter().any(|name| name == shift_type) {
            return Err(DraftError::UnknownShiftType {
                shift_type: shift_type.to_string(),
                role: key.role.clone(),
            });
        }

        let display = self.catalog.resolve_display_time(
            &key.role,
            date.weekday(),
            shift_type,
            custom_start.as_deref(),
            custom_end.as_deref(),
        );
        if display.requires_custom() {
            return Err(DraftError::MissingCustomTime {
                shift_type: shift_type.to_string(),
                date,
            });
        }

        self.with_draft(key, |draft| {
            draft.cells.insert(
                (date, user_id),
                DraftAssignment {
                    shift_type: shift_type.to_string(),
                    custom_start,
                    custom_end,
                },
            );
            draft.state = DraftState::Drafting;
            Ok(())
        })
    }

    /// Remove one cell; a no-op when the cell is absent.
    pub fn clear(&self, key: &DraftKey, user_id: &StaffId, date: NaiveDate) -> Result<(), DraftError> {
        self.with_draft(key, |draft| {
            if draft.cells.remove(&(date, user_id.clone())).is_some() {
                draft.state = DraftState::Drafting;
            }
            Ok(())
        })
    }

    /// Persist the current grid without making it visible to staff. Safe to
    /// call repeatedly.
    pub fn save_draft(&self, key: &DraftKey) -> Result<(), DraftError> {
        self.with_draft(key, |draft| {
            draft.state = DraftState::SavedDraft;
            Ok(draft.clone())
        })
        .and_then(|draft| {
            self.drafts.save(draft)?;
            Ok(())
        })
    }

    /// Atomically materialize the grid as published schedule entries.
    /// Previously published rows for this (role, week) that are absent from
    /// the grid are superseded by the replacement. Entry ids are
    /// deterministic per cell, so republishing an unchanged draft yields an
    /// identical entry set.
    pub fn publish(
        &self,
        actor: &StaffMember,
        key: &DraftKey,
    ) -> Result<Vec<ScheduleEntry>, DraftError> {
        if !actor.roles.iter().any(StaffRole::is_manager_tier) {
            return Err(DraftError::NotAdjudicator {
                user: actor.id.to_string(),
            });
        }

        let draft = self.with_draft(key, |draft| {
            draft.state = DraftState::Published;
            Ok(draft.clone())
        })?;

        let entries: Vec<ScheduleEntry> = draft
            .cells
            .iter()
            .map(|((date, user_id), cell)| ScheduleEntry {
                id: EntryId::for_assignment(&key.role, key.week, *date, user_id),
                user_id: user_id.clone(),
                role: key.role.clone(),
                date: *date,
                shift_type: cell.shift_type.clone(),
                custom_start: cell.custom_start.clone(),
                custom_end: cell.custom_end.clone(),
                exchange: None,
                on_leave: false,
            })
            .collect();

        let published = self.schedule.replace_week(&key.role, key.week, entries)?;
        self.drafts.save(draft)?;

        info!(role = %key.role, week = %key.week, entries = published.len(), "rota published");

        let recipients: BTreeSet<StaffId> =
            published.iter().map(|entry| entry.user_id.clone()).collect();
        if !recipients.is_empty() {
            let mut details = BTreeMap::new();
            details.insert("week_start".to_string(), key.week.start().to_string());
            details.insert("role".to_string(), key.role.name().to_string());
            let notice = RotaNotice {
                recipients: recipients.into_iter().collect(),
                kind: NoticeKind::RotaPublished,
                details,
            };
            if let Err(err) = self.notifier.notify(notice) {
                warn!(error = %err, "rota publish notification failed");
            }
        }

        Ok(published)
    }
}
