use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::directory::StaffMember;

use super::domain::{ErrorKind, StaffRole};
use super::schedule::{RepositoryError, RequirementRepository};

/// Scope of a staffing requirement row: one role, or the whole floor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequirementScope {
    AllStaff,
    Role(StaffRole),
}

impl RequirementScope {
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "all_staff" => Self::AllStaff,
            other => Self::Role(StaffRole::from_name(other)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::AllStaff => "all_staff",
            Self::Role(role) => role.name(),
        }
    }
}

impl fmt::Display for RequirementScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RequirementScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RequirementScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw))
    }
}

/// Minimum/maximum headcount policy for a scope on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingRequirement {
    pub scope: RequirementScope,
    pub date: NaiveDate,
    pub min_staff: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_staff: Option<u32>,
}

impl StaffingRequirement {
    pub fn classify(&self, assigned_count: u32) -> StaffingLevel {
        if assigned_count < self.min_staff {
            return StaffingLevel::Understaffed;
        }
        if let Some(max) = self.max_staff {
            if assigned_count > max {
                return StaffingLevel::Overstaffed;
            }
        }
        StaffingLevel::Good
    }
}

/// Staffing classification for a date. `Overstaffed` maps to `warning`
/// canonically across every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffingLevel {
    Good,
    Overstaffed,
    Understaffed,
    NoRequirement,
}

impl StaffingLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Overstaffed => "Overstaffed",
            Self::Understaffed => "Understaffed",
            Self::NoRequirement => "No requirement",
        }
    }

    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Good => "success",
            Self::Overstaffed => "warning",
            Self::Understaffed => "danger",
            Self::NoRequirement => "muted",
        }
    }
}

/// Errors raised when editing or evaluating staffing requirements.
#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("invalid staffing range: max {max} is below min {min}")]
    InvalidRange { min: u32, max: u32 },
    #[error("{user} does not hold an adjudicator role")]
    NotAdjudicator { user: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RequirementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. } => ErrorKind::Validation,
            Self::NotAdjudicator { .. } => ErrorKind::Policy,
            Self::Repository(_) => ErrorKind::Dependency,
        }
    }
}

/// Service owning requirement mutation and staffing classification.
pub struct StaffingRequirementsService<R> {
    repository: Arc<R>,
}

impl<R> StaffingRequirementsService<R>
where
    R: RequirementRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Upsert a requirement row. Only manager-tier callers may mutate; the
    /// range is validated before anything is written.
    pub fn set_requirement(
        &self,
        actor: &StaffMember,
        scope: RequirementScope,
        date: NaiveDate,
        min_staff: u32,
        max_staff: Option<u32>,
    ) -> Result<StaffingRequirement, RequirementError> {
        if !actor.roles.iter().any(StaffRole::is_manager_tier) {
            return Err(RequirementError::NotAdjudicator {
                user: actor.id.to_string(),
            });
        }
        if let Some(max) = max_staff {
            if max < min_staff {
                return Err(RequirementError::InvalidRange {
                    min: min_staff,
                    max,
                });
            }
        }

        let requirement = StaffingRequirement {
            scope,
            date,
            min_staff,
            max_staff,
        };
        self.repository.upsert(requirement.clone())?;
        Ok(requirement)
    }

    /// Classify a date's staffing level for a scope given the assigned
    /// headcount. A missing row is `NoRequirement`, never an error.
    pub fn classify(
        &self,
        scope: &RequirementScope,
        date: NaiveDate,
        assigned_count: u32,
    ) -> Result<StaffingLevel, RequirementError> {
        match self.repository.fetch(scope, date)? {
            Some(requirement) => Ok(requirement.classify(assigned_count)),
            None => Ok(StaffingLevel::NoRequirement),
        }
    }
}
