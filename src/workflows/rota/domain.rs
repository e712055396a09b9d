use chrono::{Datelike, Duration, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier wrapper for staff members, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a staff member can hold. The house roles are closed; anything else
/// the directory reports is carried as `Other` so consolidated views can
/// still place it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StaffRole {
    Hostess,
    Manager,
    GeneralManager,
    SystemAdmin,
    Bartender,
    Waiter,
    Skuller,
    Other(String),
}

impl StaffRole {
    pub fn from_name(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hostess" => Self::Hostess,
            "manager" => Self::Manager,
            "general_manager" => Self::GeneralManager,
            "system_admin" => Self::SystemAdmin,
            "bartender" => Self::Bartender,
            "waiter" => Self::Waiter,
            "skuller" => Self::Skuller,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Hostess => "hostess",
            Self::Manager => "manager",
            Self::GeneralManager => "general_manager",
            Self::SystemAdmin => "system_admin",
            Self::Bartender => "bartender",
            Self::Waiter => "waiter",
            Self::Skuller => "skuller",
            Self::Other(name) => name,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Hostess => "Hostess".to_string(),
            Self::Manager => "Manager".to_string(),
            Self::GeneralManager => "General Manager".to_string(),
            Self::SystemAdmin => "System Admin".to_string(),
            Self::Bartender => "Bartender".to_string(),
            Self::Waiter => "Waiter".to_string(),
            Self::Skuller => "Skuller".to_string(),
            Self::Other(name) => name.clone(),
        }
    }

    /// Roles allowed to adjudicate: edit requirements, publish rotas, and
    /// resolve exchange requests.
    pub fn is_manager_tier(&self) -> bool {
        matches!(self, Self::Manager | Self::GeneralManager | Self::SystemAdmin)
    }

    /// Display ordering for consolidated views: Hostess, then managers,
    /// bartenders, waiters, skullers, then unclassified roles alphabetically.
    pub fn display_rank(&self) -> u8 {
        match self {
            Self::Hostess => 0,
            Self::Manager | Self::GeneralManager | Self::SystemAdmin => 1,
            Self::Bartender => 2,
            Self::Waiter => 3,
            Self::Skuller => 4,
            Self::Other(_) => 5,
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for StaffRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for StaffRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Err(D::Error::custom("role name must not be empty"));
        }
        Ok(Self::from_name(&raw))
    }
}

/// A rota week, anchored on its Monday. All week-scoped state (availability,
/// drafts, published rotas) is keyed by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotaWeek {
    monday: NaiveDate,
}

impl RotaWeek {
    /// The week containing `date`, normalized back to its Monday.
    pub fn containing(date: NaiveDate) -> Self {
        let back = date.weekday().num_days_from_monday() as i64;
        Self {
            monday: date - Duration::days(back),
        }
    }

    pub fn with_offset(self, weeks: i64) -> Self {
        Self {
            monday: self.monday + Duration::weeks(weeks),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.monday
    }

    pub fn end(&self) -> NaiveDate {
        self.monday + Duration::days(6)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    pub fn dates(&self) -> [NaiveDate; 7] {
        let mut dates = [self.monday; 7];
        for (offset, slot) in dates.iter_mut().enumerate() {
            *slot = self.monday + Duration::days(offset as i64);
        }
        dates
    }
}

impl fmt::Display for RotaWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week of {}", self.monday)
    }
}

/// Classification every service error maps into, mirrored onto HTTP statuses
/// by the router. Callers use it to decide whether correcting input, a
/// refetch-and-retry, or surfacing the message as-is is appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    StateConflict,
    Policy,
    NotFound,
    Dependency,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::StateConflict => "state_conflict",
            Self::Policy => "policy",
            Self::NotFound => "not_found",
            Self::Dependency => "dependency",
        }
    }
}
