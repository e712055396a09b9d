//! Weekly rota coordination: availability submission, shift-time
//! resolution, staffing requirements, the draft→publish assignment cycle,
//! and post-publication shift exchanges.

pub mod availability;
pub mod catalog;
pub mod consolidated;
pub mod domain;
pub mod draft;
pub mod exchange;
pub mod import;
pub mod requirements;
pub mod router;
pub mod schedule;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityAtom, AvailabilityError, AvailabilityLedger, AvailabilitySlot, SubmissionWindow,
};
pub use catalog::{
    DaySelector, DisplayTime, ShiftBound, ShiftCatalog, ShiftTypeDefinition, ShiftWindow,
};
pub use consolidated::{ConsolidatedViewService, ConsolidatedWeekView, ViewError, ViewType};
pub use domain::{ErrorKind, RotaWeek, StaffId, StaffRole};
pub use draft::{
    DraftAssignment, DraftError, DraftKey, DraftRepository, DraftState, RotaDraft,
    SchedulerDraftService,
};
pub use exchange::{
    ExchangeError, ExchangeRepository, ExchangeService, SwapRequest, SwapRequestId,
    VolunteerRequest, VolunteerRequestId,
};
pub use import::{RequirementsCsvImporter, RequirementsImportError};
pub use requirements::{
    RequirementError, RequirementScope, StaffingLevel, StaffingRequirement,
    StaffingRequirementsService,
};
pub use router::{rota_router, RotaServices};
pub use schedule::{
    AvailabilityRepository, EntryId, ExchangeMarker, NoticeKind, NotificationSink, NotifyError,
    RepositoryError, RequirementRepository, RotaNotice, ScheduleEntry, ScheduleRepository,
    SwapStatus, VolunteerStatus,
};
