use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::rota::domain::StaffId;
use crate::workflows::rota::schedule::{EntryId, SwapStatus, VolunteerStatus};

/// Identifier for a swap request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapRequestId(pub String);

impl fmt::Display for SwapRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a relinquish/volunteer request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolunteerRequestId(pub String);

impl fmt::Display for VolunteerRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to exchange one published shift for one named coverer,
/// manager-approved. Terminal on `Approved`/`Denied`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: SwapRequestId,
    pub entry_id: EntryId,
    pub requester_id: StaffId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_coverer: Option<StaffId>,
    /// Authoritative eligible set computed at creation; recomputed again at
    /// approval before any reassignment.
    pub eligible_coverers: Vec<StaffId>,
    pub status: SwapStatus,
    pub requested_at: NaiveDateTime,
}

/// A shift given up to an open pool of eligible staff; the manager picks
/// the final coverer from those who volunteered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerRequest {
    pub id: VolunteerRequestId,
    pub entry_id: EntryId,
    pub requester_id: StaffId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Eligible pool at creation, shown to staff as the volunteering hint.
    pub eligible_pool: Vec<StaffId>,
    pub volunteers: Vec<StaffId>,
    pub status: VolunteerStatus,
    pub requested_at: NaiveDateTime,
}
