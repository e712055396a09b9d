use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::directory::{DirectoryError, StaffDirectory, StaffMember};
use crate::workflows::rota::domain::{ErrorKind, StaffId};
use crate::workflows::rota::schedule::{
    EntryId, ExchangeMarker, NoticeKind, NotificationSink, RepositoryError, RotaNotice,
    ScheduleEntry, ScheduleRepository, SwapStatus, VolunteerStatus,
};

use super::domain::{SwapRequest, SwapRequestId, VolunteerRequest, VolunteerRequestId};
use super::eligibility::eligible_staff;
use super::repository::ExchangeRepository;

static SWAP_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static VOLUNTEER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_swap_id() -> SwapRequestId {
    let id = SWAP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SwapRequestId(format!("swap-{id:06}"))
}

fn next_volunteer_id() -> VolunteerRequestId {
    let id = VOLUNTEER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VolunteerRequestId(format!("relinquish-{id:06}"))
}

/// Errors raised by the exchange workflows.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("schedule entry {id:?} not found")]
    EntryNotFound { id: EntryId },
    #[error("exchange request {id} not found")]
    RequestNotFound { id: String },
    #[error("staff member {id} not found in directory")]
    StaffNotFound { id: StaffId },
    #[error("{user} does not own this shift")]
    NotOwner { user: StaffId },
    #[error("shift on {date} is in the past")]
    ShiftInPast { date: NaiveDate },
    #[error("entry {id:?} is already part of an exchange")]
    AlreadyInExchange { id: EntryId },
    #[error("request {id} was already resolved")]
    AlreadyResolved { id: String },
    #[error("{user} is not eligible to cover this shift")]
    IneligibleCoverer { user: StaffId },
    #[error("{user} never volunteered for this shift")]
    NotAVolunteer { user: StaffId },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntryNotFound { .. }
            | Self::RequestNotFound { .. }
            | Self::StaffNotFound { .. } => ErrorKind::NotFound,
            Self::NotOwner { .. } | Self::ShiftInPast { .. } => ErrorKind::Policy,
            Self::AlreadyInExchange { .. }
            | Self::AlreadyResolved { .. }
            | Self::IneligibleCoverer { .. }
            | Self::NotAVolunteer { .. } => ErrorKind::StateConflict,
            Self::Repository(_) | Self::Directory(_) => ErrorKind::Dependency,
        }
    }
}

/// Swap and relinquish/volunteer workflows over published schedule entries.
/// Every state transition re-runs the authoritative eligibility check and
/// notifies the affected users through the sink.
pub struct ExchangeService<S, X, D, N> {
    schedule: Arc<S>,
    requests: Arc<X>,
    directory: Arc<D>,
    notifier: Arc<N>,
}

impl<S, X, D, N> ExchangeService<S, X, D, N>
where
    S: ScheduleRepository,
    X: ExchangeRepository,
    D: StaffDirectory,
    N: NotificationSink,
{
    pub fn new(schedule: Arc<S>, requests: Arc<X>, directory: Arc<D>, notifier: Arc<N>) -> Self {
        Self {
            schedule,
            requests,
            directory,
            notifier,
        }
    }

    fn fetch_entry(&self, id: &EntryId) -> Result<ScheduleEntry, ExchangeError> {
        self.schedule
            .fetch_entry(id)?
            .ok_or_else(|| ExchangeError::EntryNotFound { id: id.clone() })
    }

    /// Ownership, date, and mid-exchange guards shared by both request
    /// creation paths. Returns the owner's directory record.
    fn guard_new_exchange(
        &self,
        entry: &ScheduleEntry,
        requester_id: &StaffId,
        today: NaiveDate,
    ) -> Result<StaffMember, ExchangeError> {
        if entry.user_id != *requester_id {
            return Err(ExchangeError::NotOwner {
                user: requester_id.clone(),
            });
        }
        if entry.date < today {
            return Err(ExchangeError::ShiftInPast { date: entry.date });
        }
        if entry.is_mid_exchange() {
            return Err(ExchangeError::AlreadyInExchange {
                id: entry.id.clone(),
            });
        }
        self.directory
            .get_user(requester_id)?
            .ok_or_else(|| ExchangeError::StaffNotFound {
                id: requester_id.clone(),
            })
    }

    fn notify_or_log(&self, recipients: Vec<StaffId>, kind: NoticeKind, entry: &ScheduleEntry) {
        if recipients.is_empty() {
            return;
        }
        let mut details = BTreeMap::new();
        details.insert("date".to_string(), entry.date.to_string());
        details.insert("shift_type".to_string(), entry.shift_type.clone());
        let notice = RotaNotice {
            recipients,
            kind,
            details,
        };
        if let Err(err) = self.notifier.notify(notice) {
            warn!(kind = kind.label(), error = %err, "exchange notification failed");
        }
    }

    /// Request a swap of a published, future shift for a manager-approved
    /// coverer. A suggested coverer must already pass the authoritative
    /// eligibility check.
    pub fn request_swap(
        &self,
        entry_id: &EntryId,
        requester_id: &StaffId,
        suggested_coverer: Option<StaffId>,
        now: NaiveDateTime,
    ) -> Result<SwapRequest, ExchangeError> {
        let mut entry = self.fetch_entry(entry_id)?;
        let owner = self.guard_new_exchange(&entry, requester_id, now.date())?;

        let eligible =
            eligible_staff(self.schedule.as_ref(), self.directory.as_ref(), &entry, requester_id)?;
        if let Some(suggested) = &suggested_coverer {
            if !eligible.contains(suggested) {
                return Err(ExchangeError::IneligibleCoverer {
                    user: suggested.clone(),
                });
            }
        }

        let request = self.requests.insert_swap(SwapRequest {
            id: next_swap_id(),
            entry_id: entry_id.clone(),
            requester_id: requester_id.clone(),
            suggested_coverer: suggested_coverer.clone(),
            eligible_coverers: eligible.clone(),
            status: SwapStatus::Pending,
            requested_at: now,
        })?;

        entry.exchange = Some(ExchangeMarker::Swap {
            status: SwapStatus::Pending,
            requested_by: owner.full_name,
        });
        self.schedule.update_entry(entry.clone())?;

        info!(request = %request.id, entry = ?entry_id, "swap requested");
        let recipients = match suggested_coverer {
            Some(suggested) => vec![suggested],
            None => eligible,
        };
        self.notify_or_log(recipients, NoticeKind::SwapRequested, &entry);

        Ok(request)
    }

    /// Approve a swap for a chosen coverer. Eligibility is recomputed here;
    /// the set stored on the request is only the view shown to the manager.
    /// Of two concurrent resolutions exactly one wins the compare-and-set,
    /// the other receives `AlreadyResolved`.
    pub fn approve_swap(
        &self,
        id: &SwapRequestId,
        chosen_coverer: &StaffId,
    ) -> Result<SwapRequest, ExchangeError> {
        let request =
            self.requests
                .fetch_swap(id)?
                .ok_or_else(|| ExchangeError::RequestNotFound {
                    id: id.to_string(),
                })?;
        if request.status.is_terminal() {
            return Err(ExchangeError::AlreadyResolved {
                id: id.to_string(),
            });
        }
        let mut entry = self.fetch_entry(&request.entry_id)?;

        let eligible = eligible_staff(
            self.schedule.as_ref(),
            self.directory.as_ref(),
            &entry,
            &request.requester_id,
        )?;
        if !eligible.contains(chosen_coverer) {
            return Err(ExchangeError::IneligibleCoverer {
                user: chosen_coverer.clone(),
            });
        }

        let resolved = self
            .requests
            .transition_swap(id, SwapStatus::Pending, SwapStatus::Approved)
            .map_err(|err| match err {
                RepositoryError::Conflict => ExchangeError::AlreadyResolved {
                    id: id.to_string(),
                },
                other => ExchangeError::Repository(other),
            })?;

        entry.user_id = chosen_coverer.clone();
        entry.exchange = Some(ExchangeMarker::Swap {
            status: SwapStatus::Approved,
            requested_by: requested_by_label(&entry, &request.requester_id),
        });
        self.schedule.update_entry(entry.clone())?;

        info!(request = %id, coverer = %chosen_coverer, "swap approved");
        self.notify_or_log(
            vec![request.requester_id.clone(), chosen_coverer.clone()],
            NoticeKind::SwapApproved,
            &entry,
        );

        Ok(resolved)
    }

    /// Deny a swap; the original assignment is untouched.
    pub fn deny_swap(&self, id: &SwapRequestId) -> Result<SwapRequest, ExchangeError> {
        let request =
            self.requests
                .fetch_swap(id)?
                .ok_or_else(|| ExchangeError::RequestNotFound {
                    id: id.to_string(),
                })?;

        let resolved = self
            .requests
            .transition_swap(id, SwapStatus::Pending, SwapStatus::Denied)
            .map_err(|err| match err {
                RepositoryError::Conflict => ExchangeError::AlreadyResolved {
                    id: id.to_string(),
                },
                other => ExchangeError::Repository(other),
            })?;

        if let Some(mut entry) = self.schedule.fetch_entry(&request.entry_id)? {
            entry.exchange = Some(ExchangeMarker::Swap {
                status: SwapStatus::Denied,
                requested_by: requested_by_label(&entry, &request.requester_id),
            });
            self.schedule.update_entry(entry.clone())?;
            self.notify_or_log(
                vec![request.requester_id.clone()],
                NoticeKind::SwapDenied,
                &entry,
            );
        }

        info!(request = %id, "swap denied");
        Ok(resolved)
    }

    /// Relinquish a shift to the open pool of eligible staff.
    pub fn relinquish(
        &self,
        entry_id: &EntryId,
        requester_id: &StaffId,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> Result<VolunteerRequest, ExchangeError> {
        let mut entry = self.fetch_entry(entry_id)?;
        let owner = self.guard_new_exchange(&entry, requester_id, now.date())?;

        let eligible =
            eligible_staff(self.schedule.as_ref(), self.directory.as_ref(), &entry, requester_id)?;

        let request = self.requests.insert_volunteer(VolunteerRequest {
            id: next_volunteer_id(),
            entry_id: entry_id.clone(),
            requester_id: requester_id.clone(),
            reason: reason.clone(),
            eligible_pool: eligible.clone(),
            volunteers: Vec::new(),
            status: VolunteerStatus::Open,
            requested_at: now,
        })?;

        entry.exchange = Some(ExchangeMarker::Volunteer {
            status: VolunteerStatus::Open,
            requested_by: owner.full_name,
            reason,
        });
        self.schedule.update_entry(entry.clone())?;

        info!(request = %request.id, entry = ?entry_id, "shift relinquished");
        self.notify_or_log(eligible, NoticeKind::ShiftRelinquished, &entry);

        Ok(request)
    }

    /// Volunteer for an open relinquished shift. The request's status is
    /// left untouched; the published entry's marker moves to
    /// `PendingApproval` so manager views surface it. Volunteering twice is
    /// a no-op.
    pub fn volunteer(
        &self,
        id: &VolunteerRequestId,
        volunteer_id: &StaffId,
    ) -> Result<VolunteerRequest, ExchangeError> {
        let request = self
            .requests
            .fetch_volunteer(id)?
            .ok_or_else(|| ExchangeError::RequestNotFound {
                id: id.to_string(),
            })?;
        if request.status != VolunteerStatus::Open {
            return Err(ExchangeError::AlreadyResolved {
                id: id.to_string(),
            });
        }
        let mut entry = self.fetch_entry(&request.entry_id)?;

        let eligible = eligible_staff(
            self.schedule.as_ref(),
            self.directory.as_ref(),
            &entry,
            &request.requester_id,
        )?;
        if !eligible.contains(volunteer_id) {
            return Err(ExchangeError::IneligibleCoverer {
                user: volunteer_id.clone(),
            });
        }

        if request.volunteers.contains(volunteer_id) {
            return Ok(request);
        }

        let updated = self.requests.add_volunteer(id, volunteer_id.clone())?;

        entry.exchange = Some(ExchangeMarker::Volunteer {
            status: VolunteerStatus::PendingApproval,
            requested_by: requested_by_label(&entry, &request.requester_id),
            reason: request.reason.clone(),
        });
        self.schedule.update_entry(entry.clone())?;

        info!(request = %id, volunteer = %volunteer_id, "volunteer joined");
        self.notify_or_log(
            vec![request.requester_id.clone()],
            NoticeKind::VolunteerJoined,
            &entry,
        );

        Ok(updated)
    }

    /// Approve a relinquish for one of the listed volunteers, reassigning
    /// ownership of the shift.
    pub fn approve_volunteer(
        &self,
        id: &VolunteerRequestId,
        chosen_volunteer: &StaffId,
    ) -> Result<VolunteerRequest, ExchangeError> {
        let request = self
            .requests
            .fetch_volunteer(id)?
            .ok_or_else(|| ExchangeError::RequestNotFound {
                id: id.to_string(),
            })?;
        if request.status != VolunteerStatus::Open {
            return Err(ExchangeError::AlreadyResolved {
                id: id.to_string(),
            });
        }
        let mut entry = self.fetch_entry(&request.entry_id)?;

        if !request.volunteers.contains(chosen_volunteer) {
            return Err(ExchangeError::NotAVolunteer {
                user: chosen_volunteer.clone(),
            });
        }
        let eligible = eligible_staff(
            self.schedule.as_ref(),
            self.directory.as_ref(),
            &entry,
            &request.requester_id,
        )?;
        if !eligible.contains(chosen_volunteer) {
            return Err(ExchangeError::IneligibleCoverer {
                user: chosen_volunteer.clone(),
            });
        }

        let resolved = self
            .requests
            .transition_volunteer(id, VolunteerStatus::Open, VolunteerStatus::Approved)
            .map_err(|err| match err {
                RepositoryError::Conflict => ExchangeError::AlreadyResolved {
                    id: id.to_string(),
                },
                other => ExchangeError::Repository(other),
            })?;

        entry.user_id = chosen_volunteer.clone();
        entry.exchange = Some(ExchangeMarker::Volunteer {
            status: VolunteerStatus::Approved,
            requested_by: requested_by_label(&entry, &request.requester_id),
            reason: request.reason.clone(),
        });
        self.schedule.update_entry(entry.clone())?;

        info!(request = %id, volunteer = %chosen_volunteer, "relinquish approved");
        self.notify_or_log(
            vec![request.requester_id.clone(), chosen_volunteer.clone()],
            NoticeKind::VolunteerApproved,
            &entry,
        );

        Ok(resolved)
    }

    /// Cancel an open relinquish request; requester-only, and only while no
    /// resolution has happened. The assignment stays with its owner.
    pub fn cancel_request(
        &self,
        id: &VolunteerRequestId,
        caller_id: &StaffId,
    ) -> Result<VolunteerRequest, ExchangeError> {
        let request = self
            .requests
            .fetch_volunteer(id)?
            .ok_or_else(|| ExchangeError::RequestNotFound {
                id: id.to_string(),
            })?;
        if request.requester_id != *caller_id {
            return Err(ExchangeError::NotOwner {
                user: caller_id.clone(),
            });
        }

        let resolved = self
            .requests
            .transition_volunteer(id, VolunteerStatus::Open, VolunteerStatus::Cancelled)
            .map_err(|err| match err {
                RepositoryError::Conflict => ExchangeError::AlreadyResolved {
                    id: id.to_string(),
                },
                other => ExchangeError::Repository(other),
            })?;

        if let Some(mut entry) = self.schedule.fetch_entry(&request.entry_id)? {
            entry.exchange = Some(ExchangeMarker::Volunteer {
                status: VolunteerStatus::Cancelled,
                requested_by: requested_by_label(&entry, &request.requester_id),
                reason: request.reason.clone(),
            });
            self.schedule.update_entry(entry.clone())?;
            self.notify_or_log(
                request.volunteers.clone(),
                NoticeKind::RequestCancelled,
                &entry,
            );
        }

        info!(request = %id, "relinquish cancelled");
        Ok(resolved)
    }
}

/// Preserve the requester name already stamped on the entry's marker; fall
/// back to the raw id when the marker is gone.
fn requested_by_label(entry: &ScheduleEntry, requester_id: &StaffId) -> String {
    match &entry.exchange {
        Some(ExchangeMarker::Swap { requested_by, .. })
        | Some(ExchangeMarker::Volunteer { requested_by, .. }) => requested_by.clone(),
        None => requester_id.to_string(),
    }
}
