//! In-memory implementations of the rota collaborators: repositories, the
//! staff directory, and a logging notification sink. These back the demo
//! and development server modes and double as integration-test fixtures;
//! production deployments swap in store-backed implementations of the same
//! traits.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::info;

use crate::directory::{DirectoryError, StaffDirectory, StaffMember};
use crate::workflows::rota::availability::{AvailabilityAtom, AvailabilityLedger};
use crate::workflows::rota::catalog::ShiftCatalog;
use crate::workflows::rota::consolidated::ConsolidatedViewService;
use crate::workflows::rota::domain::{RotaWeek, StaffId, StaffRole};
use crate::workflows::rota::draft::{DraftKey, DraftRepository, RotaDraft, SchedulerDraftService};
use crate::workflows::rota::exchange::domain::{
    SwapRequest, SwapRequestId, VolunteerRequest, VolunteerRequestId,
};
use crate::workflows::rota::exchange::{ExchangeRepository, ExchangeService};
use crate::workflows::rota::requirements::{
    RequirementScope, StaffingRequirement, StaffingRequirementsService,
};
use crate::workflows::rota::router::RotaServices;
use crate::workflows::rota::schedule::{
    AvailabilityRepository, EntryId, NotificationSink, NotifyError, RepositoryError,
    RequirementRepository, RotaNotice, ScheduleEntry, ScheduleRepository, SwapStatus,
    VolunteerStatus,
};

#[derive(Default)]
pub struct InMemoryAvailabilityRepository {
    atoms: Mutex<HashMap<(StaffId, NaiveDate), BTreeSet<AvailabilityAtom>>>,
}

impl AvailabilityRepository for InMemoryAvailabilityRepository {
    fn replace_day(
        &self,
        user_id: &StaffId,
        date: NaiveDate,
        atoms: BTreeSet<AvailabilityAtom>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.atoms.lock().expect("availability mutex poisoned");
        if atoms.is_empty() {
            guard.remove(&(user_id.clone(), date));
        } else {
            guard.insert((user_id.clone(), date), atoms);
        }
        Ok(())
    }

    fn atoms_for_week(
        &self,
        user_id: &StaffId,
        week: RotaWeek,
    ) -> Result<BTreeMap<NaiveDate, BTreeSet<AvailabilityAtom>>, RepositoryError> {
        let guard = self.atoms.lock().expect("availability mutex poisoned");
        Ok(guard
            .iter()
            .filter(|((user, date), _)| user == user_id && week.contains(*date))
            .map(|((_, date), atoms)| (*date, atoms.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryRequirementRepository {
    rows: Mutex<HashMap<(RequirementScope, NaiveDate), StaffingRequirement>>,
}

impl RequirementRepository for InMemoryRequirementRepository {
    fn upsert(&self, requirement: StaffingRequirement) -> Result<(), RepositoryError> {
        let mut guard = self.rows.lock().expect("requirement mutex poisoned");
        guard.insert(
            (requirement.scope.clone(), requirement.date),
            requirement,
        );
        Ok(())
    }

    fn fetch(
        &self,
        scope: &RequirementScope,
        date: NaiveDate,
    ) -> Result<Option<StaffingRequirement>, RepositoryError> {
        let guard = self.rows.lock().expect("requirement mutex poisoned");
        Ok(guard.get(&(scope.clone(), date)).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleRepository {
    entries: Mutex<HashMap<EntryId, ScheduleEntry>>,
}

impl ScheduleRepository for InMemoryScheduleRepository {
    fn replace_week(
        &self,
        role: &StaffRole,
        week: RotaWeek,
        entries: Vec<ScheduleEntry>,
    ) -> Result<Vec<ScheduleEntry>, RepositoryError> {
        let mut guard = self.entries.lock().expect("schedule mutex poisoned");
        guard.retain(|_, entry| !(entry.role == *role && week.contains(entry.date)));
        for entry in &entries {
            guard.insert(entry.id.clone(), entry.clone());
        }
        Ok(entries)
    }

    fn fetch_entry(&self, id: &EntryId) -> Result<Option<ScheduleEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("schedule mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_entry(&self, entry: ScheduleEntry) -> Result<(), RepositoryError> {
        let mut guard = self.entries.lock().expect("schedule mutex poisoned");
        if !guard.contains_key(&entry.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn entries_on(&self, date: NaiveDate) -> Result<Vec<ScheduleEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("schedule mutex poisoned");
        let mut matches: Vec<ScheduleEntry> = guard
            .values()
            .filter(|entry| entry.date == date)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }

    fn entries_for_week(&self, week: RotaWeek) -> Result<Vec<ScheduleEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("schedule mutex poisoned");
        let mut matches: Vec<ScheduleEntry> = guard
            .values()
            .filter(|entry| week.contains(entry.date))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }
}

#[derive(Default)]
pub struct InMemoryDraftRepository {
    drafts: Mutex<HashMap<DraftKey, RotaDraft>>,
}

impl DraftRepository for InMemoryDraftRepository {
    fn save(&self, draft: RotaDraft) -> Result<(), RepositoryError> {
        let mut guard = self.drafts.lock().expect("draft mutex poisoned");
        guard.insert(draft.key.clone(), draft);
        Ok(())
    }

    fn load(&self, key: &DraftKey) -> Result<Option<RotaDraft>, RepositoryError> {
        let guard = self.drafts.lock().expect("draft mutex poisoned");
        Ok(guard.get(key).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryExchangeRepository {
    swaps: Mutex<HashMap<SwapRequestId, SwapRequest>>,
    volunteers: Mutex<HashMap<VolunteerRequestId, VolunteerRequest>>,
}

impl ExchangeRepository for InMemoryExchangeRepository {
    fn insert_swap(&self, request: SwapRequest) -> Result<SwapRequest, RepositoryError> {
        let mut guard = self.swaps.lock().expect("swap mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch_swap(&self, id: &SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError> {
        let guard = self.swaps.lock().expect("swap mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn transition_swap(
        &self,
        id: &SwapRequestId,
        expected: SwapStatus,
        next: SwapStatus,
    ) -> Result<SwapRequest, RepositoryError> {
        let mut guard = self.swaps.lock().expect("swap mutex poisoned");
        let request = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if request.status != expected {
            return Err(RepositoryError::Conflict);
        }
        request.status = next;
        Ok(request.clone())
    }

    fn insert_volunteer(
        &self,
        request: VolunteerRequest,
    ) -> Result<VolunteerRequest, RepositoryError> {
        let mut guard = self.volunteers.lock().expect("volunteer mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch_volunteer(
        &self,
        id: &VolunteerRequestId,
    ) -> Result<Option<VolunteerRequest>, RepositoryError> {
        let guard = self.volunteers.lock().expect("volunteer mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn add_volunteer(
        &self,
        id: &VolunteerRequestId,
        volunteer: StaffId,
    ) -> Result<VolunteerRequest, RepositoryError> {
        let mut guard = self.volunteers.lock().expect("volunteer mutex poisoned");
        let request = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !request.volunteers.contains(&volunteer) {
            request.volunteers.push(volunteer);
        }
        Ok(request.clone())
    }

    fn transition_volunteer(
        &self,
        id: &VolunteerRequestId,
        expected: VolunteerStatus,
        next: VolunteerStatus,
    ) -> Result<VolunteerRequest, RepositoryError> {
        let mut guard = self.volunteers.lock().expect("volunteer mutex poisoned");
        let request = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if request.status != expected {
            return Err(RepositoryError::Conflict);
        }
        request.status = next;
        Ok(request.clone())
    }
}

#[derive(Default)]
pub struct InMemoryStaffDirectory {
    members: HashMap<StaffId, StaffMember>,
}

impl InMemoryStaffDirectory {
    pub fn with_members(members: Vec<StaffMember>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|member| (member.id.clone(), member))
                .collect(),
        }
    }
}

impl StaffDirectory for InMemoryStaffDirectory {
    fn get_user(&self, id: &StaffId) -> Result<Option<StaffMember>, DirectoryError> {
        Ok(self.members.get(id).cloned())
    }

    fn list_active_staff(&self) -> Result<Vec<StaffMember>, DirectoryError> {
        let mut active: Vec<StaffMember> = self
            .members
            .values()
            .filter(|member| member.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }
}

/// Sink that logs each notice; the development stand-in for the push/SMS
/// fan-out service.
#[derive(Default)]
pub struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn notify(&self, notice: RotaNotice) -> Result<(), NotifyError> {
        info!(
            kind = notice.kind.label(),
            recipients = notice.recipients.len(),
            "notification dispatched"
        );
        Ok(())
    }
}

pub type InMemoryRotaServices = RotaServices<
    InMemoryAvailabilityRepository,
    InMemoryRequirementRepository,
    InMemoryDraftRepository,
    InMemoryScheduleRepository,
    InMemoryExchangeRepository,
    InMemoryStaffDirectory,
    LoggingNotificationSink,
>;

fn member(id: &str, name: &str, roles: &[StaffRole]) -> StaffMember {
    StaffMember {
        id: StaffId(id.to_string()),
        full_name: name.to_string(),
        roles: roles.iter().cloned().collect(),
        active: true,
    }
}

/// The roster the demo and development server boot with.
pub fn demo_roster() -> Vec<StaffMember> {
    vec![
        member("u-ana", "Ana Dlamini", &[StaffRole::Hostess]),
        member("u-marcus", "Marcus Botha", &[StaffRole::Manager]),
        member("u-priya", "Priya Naidoo", &[StaffRole::GeneralManager]),
        member("u-jonas", "Jonas Meyer", &[StaffRole::Bartender]),
        member("u-thabo", "Thabo Nkosi", &[StaffRole::Bartender, StaffRole::Waiter]),
        member("u-lena", "Lena van Wyk", &[StaffRole::Waiter]),
        member("u-sipho", "Sipho Dube", &[StaffRole::Skuller]),
    ]
}

/// Wire the full service bundle over fresh in-memory collaborators.
pub fn in_memory_services(roster: Vec<StaffMember>) -> Arc<InMemoryRotaServices> {
    let availability = Arc::new(InMemoryAvailabilityRepository::default());
    let requirements = Arc::new(InMemoryRequirementRepository::default());
    let drafts = Arc::new(InMemoryDraftRepository::default());
    let schedule = Arc::new(InMemoryScheduleRepository::default());
    let exchanges = Arc::new(InMemoryExchangeRepository::default());
    let directory = Arc::new(InMemoryStaffDirectory::with_members(roster));
    let notifier = Arc::new(LoggingNotificationSink);
    let catalog = Arc::new(ShiftCatalog::standard());

    Arc::new(RotaServices {
        availability: AvailabilityLedger::new(availability),
        requirements: StaffingRequirementsService::new(requirements),
        drafts: SchedulerDraftService::new(drafts, schedule.clone(), notifier.clone(), catalog.clone()),
        exchanges: ExchangeService::new(schedule.clone(), exchanges, directory.clone(), notifier),
        views: ConsolidatedViewService::new(schedule, directory.clone(), catalog),
        directory,
    })
}
