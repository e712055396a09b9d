use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::workflows::rota::domain::{StaffId, StaffRole};

/// Directory view of a staff member, as the identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub full_name: String,
    pub roles: BTreeSet<StaffRole>,
    pub active: bool,
}

impl StaffMember {
    pub fn holds_any_role(&self, other: &BTreeSet<StaffRole>) -> bool {
        self.roles.iter().any(|role| other.contains(role))
    }
}

/// User/role directory consumed by the rota workflows. Backed by the
/// identity provider in production and by an in-memory roster in tests.
pub trait StaffDirectory: Send + Sync {
    fn get_user(&self, id: &StaffId) -> Result<Option<StaffMember>, DirectoryError>;
    fn list_active_staff(&self) -> Result<Vec<StaffMember>, DirectoryError>;
}

/// Directory lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}
