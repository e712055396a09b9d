//! Post-publication shift exchange: swap requests against a named coverer
//! and relinquish/volunteer requests against an open pool, both adjudicated
//! by a manager over the published schedule.

pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod service;

pub use domain::{SwapRequest, SwapRequestId, VolunteerRequest, VolunteerRequestId};
pub use eligibility::{eligible_staff, role_match_hint};
pub use repository::ExchangeRepository;
pub use service::{ExchangeError, ExchangeService};
