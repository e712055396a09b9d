use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::directory::{StaffDirectory, StaffMember};
use crate::infra::{
    InMemoryAvailabilityRepository, InMemoryDraftRepository, InMemoryExchangeRepository,
    InMemoryRequirementRepository, InMemoryScheduleRepository, InMemoryStaffDirectory,
};
use crate::workflows::rota::availability::{AvailabilityLedger, SubmissionWindow};
use crate::workflows::rota::catalog::ShiftCatalog;
use crate::workflows::rota::consolidated::ConsolidatedViewService;
use crate::workflows::rota::domain::{RotaWeek, StaffId, StaffRole};
use crate::workflows::rota::draft::{DraftKey, SchedulerDraftService};
use crate::workflows::rota::exchange::ExchangeService;
use crate::workflows::rota::requirements::StaffingRequirementsService;
use crate::workflows::rota::router::RotaServices;
use crate::workflows::rota::schedule::{
    NotificationSink, NotifyError, RotaNotice, ScheduleEntry,
};

/// Sink that records every notice so tests can assert on transitions.
#[derive(Default)]
pub(super) struct RecordingNotificationSink {
    events: Mutex<Vec<RotaNotice>>,
}

impl RecordingNotificationSink {
    pub(super) fn events(&self) -> Vec<RotaNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notice: RotaNotice) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) type TestServices = RotaServices<
    InMemoryAvailabilityRepository,
    InMemoryRequirementRepository,
    InMemoryDraftRepository,
    InMemoryScheduleRepository,
    InMemoryExchangeRepository,
    InMemoryStaffDirectory,
    RecordingNotificationSink,
>;

pub(super) fn sid(raw: &str) -> StaffId {
    StaffId(raw.to_string())
}

fn member(id: &str, name: &str, roles: &[StaffRole]) -> StaffMember {
    StaffMember {
        id: sid(id),
        full_name: name.to_string(),
        roles: roles.iter().cloned().collect(),
        active: true,
    }
}

pub(super) fn roster() -> Vec<StaffMember> {
    vec![
        member("u-ana", "Ana Dlamini", &[StaffRole::Hostess]),
        member("u-marcus", "Marcus Botha", &[StaffRole::Manager]),
        member("u-jonas", "Jonas Meyer", &[StaffRole::Bartender]),
        member("u-nadia", "Nadia Fourie", &[StaffRole::Bartender]),
        member("u-thabo", "Thabo Nkosi", &[StaffRole::Bartender, StaffRole::Waiter]),
        member("u-lena", "Lena van Wyk", &[StaffRole::Waiter]),
        member("u-sipho", "Sipho Dube", &[StaffRole::Skuller]),
    ]
}

pub(super) fn build_services() -> (
    Arc<TestServices>,
    Arc<InMemoryScheduleRepository>,
    Arc<RecordingNotificationSink>,
) {
    let availability = Arc::new(InMemoryAvailabilityRepository::default());
    let requirements = Arc::new(InMemoryRequirementRepository::default());
    let drafts = Arc::new(InMemoryDraftRepository::default());
    let schedule = Arc::new(InMemoryScheduleRepository::default());
    let exchanges = Arc::new(InMemoryExchangeRepository::default());
    let directory = Arc::new(InMemoryStaffDirectory::with_members(roster()));
    let notifier = Arc::new(RecordingNotificationSink::default());
    let catalog = Arc::new(ShiftCatalog::standard());

    let services = Arc::new(RotaServices {
        availability: AvailabilityLedger::new(availability),
        requirements: StaffingRequirementsService::new(requirements),
        drafts: SchedulerDraftService::new(
            drafts,
            schedule.clone(),
            notifier.clone(),
            catalog.clone(),
        ),
        exchanges: ExchangeService::new(
            schedule.clone(),
            exchanges,
            directory.clone(),
            notifier.clone(),
        ),
        views: ConsolidatedViewService::new(schedule.clone(), directory.clone(), catalog),
        directory,
    });

    (services, schedule, notifier)
}

pub(super) fn manager(services: &TestServices) -> StaffMember {
    services
        .directory
        .get_user(&sid("u-marcus"))
        .expect("directory reachable")
        .expect("manager in roster")
}

/// Week of Monday 2024-06-10; all fixtures use it unless a test needs a
/// different anchor.
pub(super) fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date")
}

pub(super) fn week() -> RotaWeek {
    RotaWeek::containing(monday())
}

/// An instant safely inside the week's submission window.
pub(super) fn in_window(week: RotaWeek) -> NaiveDateTime {
    SubmissionWindow::for_week(week).opens_at + Duration::hours(12)
}

/// Publish Jonas on Friday night and Thabo on Saturday night through the
/// real draft workflow, returning the published entries.
pub(super) fn publish_bartender_week(services: &TestServices) -> Vec<ScheduleEntry> {
    let key = DraftKey {
        role: StaffRole::Bartender,
        week: week(),
    };
    let dates = week().dates();
    services
        .drafts
        .assign(&key, sid("u-jonas"), dates[4], "Night", None, None)
        .expect("friday night has catalog times");
    services
        .drafts
        .assign(&key, sid("u-thabo"), dates[5], "Night", None, None)
        .expect("saturday night has catalog times");
    services
        .drafts
        .publish(&manager(services), &key)
        .expect("bartender rota publishes")
}

/// A "now" one day before the given date, so shifts on it are in the future.
pub(super) fn day_before(date: NaiveDate) -> NaiveDateTime {
    (date - Duration::days(1))
        .and_hms_opt(12, 0, 0)
        .expect("midday is always valid")
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
