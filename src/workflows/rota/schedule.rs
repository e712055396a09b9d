use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityAtom;
use super::catalog::{DisplayTime, ShiftCatalog};
use super::domain::{RotaWeek, StaffId, StaffRole};
use super::requirements::{RequirementScope, StaffingRequirement};

/// Identifier for a published schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Deterministic id for a published assignment, so republishing an
    /// unchanged draft yields the same entry set.
    pub fn for_assignment(
        role: &StaffRole,
        week: RotaWeek,
        date: NaiveDate,
        user_id: &StaffId,
    ) -> Self {
        Self(format!("{}:{}:{}:{}", role.name(), week.start(), date, user_id))
    }
}

/// Swap request lifecycle. Terminal on `Approved` and `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Approved,
    Denied,
}

impl SwapStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Denied)
    }
}

/// Relinquish/volunteer lifecycle. Terminal on `Approved` and `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolunteerStatus {
    Open,
    PendingApproval,
    Approved,
    Cancelled,
}

impl VolunteerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Cancelled)
    }
}

/// Exchange participation of a published entry, tagged per workflow kind so
/// swap and volunteer semantics never share one overloaded status field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeMarker {
    Swap {
        status: SwapStatus,
        requested_by: String,
    },
    Volunteer {
        status: VolunteerStatus,
        requested_by: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ExchangeMarker {
    pub fn is_settled(&self) -> bool {
        match self {
            Self::Swap { status, .. } => status.is_terminal(),
            Self::Volunteer { status, .. } => status.is_terminal(),
        }
    }
}

/// A published shift assignment, visible to staff and to the exchange
/// workflows. Created by publishing a draft; mutated only by exchange
/// transitions; superseded (never deleted) by the next publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub user_id: StaffId,
    pub role: StaffRole,
    pub date: NaiveDate,
    pub shift_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeMarker>,
    #[serde(default)]
    pub on_leave: bool,
}

impl ScheduleEntry {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// An entry is mid-exchange while it carries an unsettled marker.
    pub fn is_mid_exchange(&self) -> bool {
        self.exchange
            .as_ref()
            .map(|marker| !marker.is_settled())
            .unwrap_or(false)
    }

    pub fn display_time(&self, catalog: &ShiftCatalog) -> DisplayTime {
        catalog.resolve_display_time(
            &self.role,
            self.weekday(),
            &self.shift_type,
            self.custom_start.as_deref(),
            self.custom_end.as_deref(),
        )
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("row version conflict")]
    Conflict,
    #[error("row not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Published-assignment store. `replace_week` is the publish boundary:
/// everything previously published for the (role, week) and absent from the
/// new set is superseded.
pub trait ScheduleRepository: Send + Sync {
    fn replace_week(
        &self,
        role: &StaffRole,
        week: RotaWeek,
        entries: Vec<ScheduleEntry>,
    ) -> Result<Vec<ScheduleEntry>, RepositoryError>;
    fn fetch_entry(&self, id: &EntryId) -> Result<Option<ScheduleEntry>, RepositoryError>;
    fn update_entry(&self, entry: ScheduleEntry) -> Result<(), RepositoryError>;
    fn entries_on(&self, date: NaiveDate) -> Result<Vec<ScheduleEntry>, RepositoryError>;
    fn entries_for_week(&self, week: RotaWeek) -> Result<Vec<ScheduleEntry>, RepositoryError>;
}

/// Availability atom store, keyed per user and date.
pub trait AvailabilityRepository: Send + Sync {
    fn replace_day(
        &self,
        user_id: &StaffId,
        date: NaiveDate,
        atoms: std::collections::BTreeSet<AvailabilityAtom>,
    ) -> Result<(), RepositoryError>;
    fn atoms_for_week(
        &self,
        user_id: &StaffId,
        week: RotaWeek,
    ) -> Result<BTreeMap<NaiveDate, std::collections::BTreeSet<AvailabilityAtom>>, RepositoryError>;
}

/// Staffing requirement rows keyed by (scope, date).
pub trait RequirementRepository: Send + Sync {
    fn upsert(&self, requirement: StaffingRequirement) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        scope: &RequirementScope,
        date: NaiveDate,
    ) -> Result<Option<StaffingRequirement>, RepositoryError>;
}

/// Notification event kinds emitted on rota state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    RotaPublished,
    SwapRequested,
    SwapApproved,
    SwapDenied,
    ShiftRelinquished,
    VolunteerJoined,
    VolunteerApproved,
    RequestCancelled,
}

impl NoticeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RotaPublished => "rota_published",
            Self::SwapRequested => "swap_requested",
            Self::SwapApproved => "swap_approved",
            Self::SwapDenied => "swap_denied",
            Self::ShiftRelinquished => "shift_relinquished",
            Self::VolunteerJoined => "volunteer_joined",
            Self::VolunteerApproved => "volunteer_approved",
            Self::RequestCancelled => "request_cancelled",
        }
    }
}

/// Payload handed to the notification collaborator. Delivery mechanics
/// (push/SMS/email fan-out) live entirely behind the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotaNotice {
    pub recipients: Vec<StaffId>,
    pub kind: NoticeKind,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notification hook. Transitions fire-and-forget into this; a
/// failed send is logged by the caller and never fails the operation.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: RotaNotice) -> Result<(), NotifyError>;
}
