use crate::workflows::rota::domain::StaffId;
use crate::workflows::rota::schedule::{RepositoryError, SwapStatus, VolunteerStatus};

use super::domain::{SwapRequest, SwapRequestId, VolunteerRequest, VolunteerRequestId};

/// Exchange-request store with per-row compare-and-set. The `transition_*`
/// operations succeed only when the stored status equals `expected`;
/// otherwise they return `RepositoryError::Conflict`, which the service
/// surfaces as `AlreadyResolved`. This is the one hard concurrency
/// invariant: of two concurrent resolutions, exactly one wins.
pub trait ExchangeRepository: Send + Sync {
    fn insert_swap(&self, request: SwapRequest) -> Result<SwapRequest, RepositoryError>;
    fn fetch_swap(&self, id: &SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError>;
    fn transition_swap(
        &self,
        id: &SwapRequestId,
        expected: SwapStatus,
        next: SwapStatus,
    ) -> Result<SwapRequest, RepositoryError>;

    fn insert_volunteer(&self, request: VolunteerRequest)
        -> Result<VolunteerRequest, RepositoryError>;
    fn fetch_volunteer(
        &self,
        id: &VolunteerRequestId,
    ) -> Result<Option<VolunteerRequest>, RepositoryError>;
    /// Idempotent append; a volunteer already listed leaves the row as-is.
    fn add_volunteer(
        &self,
        id: &VolunteerRequestId,
        volunteer: StaffId,
    ) -> Result<VolunteerRequest, RepositoryError>;
    fn transition_volunteer(
        &self,
        id: &VolunteerRequestId,
        expected: VolunteerStatus,
        next: VolunteerStatus,
    ) -> Result<VolunteerRequest, RepositoryError>;
}
