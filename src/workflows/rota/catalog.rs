use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};

use super::domain::StaffRole;

/// One bound of a shift's time window. `SpecifiedByScheduler` marks slots
/// whose times the scheduler must type in when assigning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftBound {
    At(NaiveTime),
    Close,
    SpecifiedByScheduler,
}

impl ShiftBound {
    fn render(&self) -> Option<String> {
        match self {
            Self::At(time) => Some(time.format("%H:%M").to_string()),
            Self::Close => Some("Close".to_string()),
            Self::SpecifiedByScheduler => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: ShiftBound,
    pub end: ShiftBound,
}

impl ShiftWindow {
    pub const fn new(start: ShiftBound, end: ShiftBound) -> Self {
        Self { start, end }
    }

    pub const fn scheduler_specified() -> Self {
        Self {
            start: ShiftBound::SpecifiedByScheduler,
            end: ShiftBound::SpecifiedByScheduler,
        }
    }

    fn display(&self) -> Option<String> {
        match (self.start.render(), self.end.render()) {
            (Some(start), Some(end)) => Some(format!("({start} - {end})")),
            _ => None,
        }
    }
}

/// Which day a definition applies to; `Default` is the wildcard row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaySelector {
    On(Weekday),
    Default,
}

/// One row of the shift-type table: (role, day-or-default, name) → window.
#[derive(Debug, Clone)]
pub struct ShiftTypeDefinition {
    pub role: StaffRole,
    pub day: DaySelector,
    pub name: String,
    pub window: ShiftWindow,
}

/// Resolved display outcome for a shift's time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTime {
    Range(String),
    CustomRequired,
}

impl DisplayTime {
    pub fn label(&self) -> &str {
        match self {
            Self::Range(range) => range,
            Self::CustomRequired => "custom input required",
        }
    }

    pub fn requires_custom(&self) -> bool {
        matches!(self, Self::CustomRequired)
    }
}

/// Per-role, per-day shift-type definitions plus the generic assignable
/// list. Lookup always falls back role→manager, then day→default, before
/// giving up.
#[derive(Debug, Clone)]
pub struct ShiftCatalog {
    definitions: HashMap<(StaffRole, DaySelector), Vec<(String, ShiftWindow)>>,
    generic_shift_types: Vec<String>,
}

impl ShiftCatalog {
    pub fn new(rows: Vec<ShiftTypeDefinition>, generic_shift_types: Vec<String>) -> Self {
        let mut definitions: HashMap<(StaffRole, DaySelector), Vec<(String, ShiftWindow)>> =
            HashMap::new();
        for row in rows {
            definitions
                .entry((row.role, row.day))
                .or_default()
                .push((row.name, row.window));
        }
        Self {
            definitions,
            generic_shift_types,
        }
    }

    /// The house defaults. Staff slots default to scheduler-specified times;
    /// the fixed rows cover the slots the operation runs every week.
    pub fn standard() -> Self {
        let day = |h: u32, m: u32| {
            ShiftBound::At(NaiveTime::from_hms_opt(h, m, 0).expect("valid catalog time"))
        };
        let rows = vec![
            ShiftTypeDefinition {
                role: StaffRole::Manager,
                day: DaySelector::Default,
                name: "Day".to_string(),
                window: ShiftWindow::new(day(8, 0), day(17, 0)),
            },
            ShiftTypeDefinition {
                role: StaffRole::Manager,
                day: DaySelector::Default,
                name: "Night".to_string(),
                window: ShiftWindow::new(day(16, 0), ShiftBound::Close),
            },
            ShiftTypeDefinition {
                role: StaffRole::Hostess,
                day: DaySelector::Default,
                name: "Day".to_string(),
                window: ShiftWindow::new(day(9, 0), day(15, 0)),
            },
            ShiftTypeDefinition {
                role: StaffRole::Hostess,
                day: DaySelector::Default,
                name: "Night".to_string(),
                window: ShiftWindow::new(day(15, 0), day(21, 0)),
            },
            ShiftTypeDefinition {
                role: StaffRole::Bartender,
                day: DaySelector::On(Weekday::Fri),
                name: "Day".to_string(),
                window: ShiftWindow::new(day(10, 0), day(18, 0)),
            },
            ShiftTypeDefinition {
                role: StaffRole::Bartender,
                day: DaySelector::On(Weekday::Fri),
                name: "Night".to_string(),
                window: ShiftWindow::new(day(18, 0), ShiftBound::Close),
            },
            ShiftTypeDefinition {
                role: StaffRole::Bartender,
                day: DaySelector::On(Weekday::Sat),
                name: "Night".to_string(),
                window: ShiftWindow::new(day(18, 0), ShiftBound::Close),
            },
            ShiftTypeDefinition {
                role: StaffRole::Bartender,
                day: DaySelector::Default,
                name: "Day".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Bartender,
                day: DaySelector::Default,
                name: "Night".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Waiter,
                day: DaySelector::Default,
                name: "Day".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Waiter,
                day: DaySelector::Default,
                name: "Night".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Waiter,
                day: DaySelector::Default,
                name: "Double".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Skuller,
                day: DaySelector::Default,
                name: "Day".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
            ShiftTypeDefinition {
                role: StaffRole::Skuller,
                day: DaySelector::Default,
                name: "Night".to_string(),
                window: ShiftWindow::scheduler_specified(),
            },
        ];

        Self::new(
            rows,
            vec!["Day".to_string(), "Night".to_string(), "Double".to_string()],
        )
    }

    fn lookup_chain(&self, role: &StaffRole, day: Weekday) -> Vec<(StaffRole, DaySelector)> {
        let mut chain = vec![
            (role.clone(), DaySelector::On(day)),
            (role.clone(), DaySelector::Default),
        ];
        if *role != StaffRole::Manager {
            chain.push((StaffRole::Manager, DaySelector::On(day)));
            chain.push((StaffRole::Manager, DaySelector::Default));
        }
        chain
    }

    fn resolve_definition(
        &self,
        role: &StaffRole,
        day: Weekday,
        shift_type: &str,
    ) -> Option<&ShiftWindow> {
        for key in self.lookup_chain(role, day) {
            if let Some(slots) = self.definitions.get(&key) {
                if let Some((_, window)) = slots.iter().find(|(name, _)| name == shift_type) {
                    return Some(window);
                }
            }
        }
        None
    }

    /// Display time for a shift. Custom times, when both are present, win
    /// outright; otherwise the definition table is consulted through the
    /// fallback chain. A scheduler-specified (or missing) definition reports
    /// `CustomRequired`.
    pub fn resolve_display_time(
        &self,
        role: &StaffRole,
        day: Weekday,
        shift_type: &str,
        custom_start: Option<&str>,
        custom_end: Option<&str>,
    ) -> DisplayTime {
        if let (Some(start), Some(end)) = (custom_start, custom_end) {
            return DisplayTime::Range(format!("({start} - {end})"));
        }

        match self
            .resolve_definition(role, day, shift_type)
            .and_then(ShiftWindow::display)
        {
            Some(range) => DisplayTime::Range(range),
            None => DisplayTime::CustomRequired,
        }
    }

    /// Ordered assignable shift-type names for a role and day, falling back
    /// through the same chain, then to the generic catalog list.
    pub fn assignable_shift_types(&self, role: &StaffRole, day: Weekday) -> Vec<String> {
        for key in self.lookup_chain(role, day) {
            if let Some(slots) = self.definitions.get(&key) {
                return slots.iter().map(|(name, _)| name.clone()).collect();
            }
        }
        self.generic_shift_types.clone()
    }
}
