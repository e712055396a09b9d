//! Core library for the rotaflow staff scheduling service.
//!
//! The rota workflow under [`workflows::rota`] owns the scheduling rules:
//! availability windows, shift-time resolution, staffing requirements, the
//! draft→publish assignment cycle, and post-publication shift exchanges.
//! Persistence, identity, and notification delivery are consumed through
//! traits so the service layer can be exercised against in-memory fakes.

pub mod config;
pub mod directory;
pub mod error;
pub mod infra;
pub mod telemetry;
pub mod workflows;
