use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::domain::{ErrorKind, RotaWeek, StaffId};
use super::schedule::{AvailabilityRepository, RepositoryError};

/// Stored availability atom. `Double` is never stored; it is synthesized on
/// read when both atoms are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityAtom {
    Day,
    Night,
}

/// Read-side availability slot, including the consolidated `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilitySlot {
    Day,
    Night,
    Double,
}

impl AvailabilitySlot {
    /// The atoms a submitted slot stands for. Submitting `Double` is
    /// equivalent to submitting both `Day` and `Night`.
    pub fn atoms(self) -> &'static [AvailabilityAtom] {
        match self {
            Self::Day => &[AvailabilityAtom::Day],
            Self::Night => &[AvailabilityAtom::Night],
            Self::Double => &[AvailabilityAtom::Day, AvailabilityAtom::Night],
        }
    }
}

/// The submission window for a target week. Submissions open once the prior
/// week's rota is final (Monday of the week prior) and close by end of
/// Wednesday the week prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionWindow {
    pub opens_at: NaiveDateTime,
    pub closes_at: NaiveDateTime,
}

const OPENS_DAYS_BEFORE_WEEK_START: i64 = 7;
const CLOSES_DAYS_BEFORE_WEEK_START: i64 = 4;

impl SubmissionWindow {
    /// Pure function of the target week; defined for every week.
    pub fn for_week(week: RotaWeek) -> Self {
        let start = week.start();
        Self {
            opens_at: midnight(start - Duration::days(OPENS_DAYS_BEFORE_WEEK_START)),
            closes_at: midnight(start - Duration::days(CLOSES_DAYS_BEFORE_WEEK_START)),
        }
    }

    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        now >= self.opens_at && now < self.closes_at
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

/// Errors raised by availability submission and reads.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("availability window for {week} closed at {closes_at}")]
    WindowClosed {
        week: RotaWeek,
        closes_at: NaiveDateTime,
    },
    #[error("date {date} does not fall in {week}")]
    DateOutsideWeek { date: NaiveDate, week: RotaWeek },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AvailabilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WindowClosed { .. } => ErrorKind::Policy,
            Self::DateOutsideWeek { .. } => ErrorKind::Validation,
            Self::Repository(_) => ErrorKind::Dependency,
        }
    }
}

/// Stores per-day shift-type preferences for a target week, gated by the
/// submission window.
pub struct AvailabilityLedger<A> {
    repository: Arc<A>,
}

impl<A> AvailabilityLedger<A>
where
    A: AvailabilityRepository,
{
    pub fn new(repository: Arc<A>) -> Self {
        Self { repository }
    }

    /// Partial upsert: only the dates named in `days` are replaced; an empty
    /// slot set retracts a date entirely. Dates outside the target week are
    /// rejected before anything is written, and a closed window rejects the
    /// whole submission deterministically.
    pub fn submit(
        &self,
        user_id: &StaffId,
        week: RotaWeek,
        days: BTreeMap<NaiveDate, BTreeSet<AvailabilitySlot>>,
        now: NaiveDateTime,
    ) -> Result<(), AvailabilityError> {
        let window = SubmissionWindow::for_week(week);
        if !window.is_open(now) {
            return Err(AvailabilityError::WindowClosed {
                week,
                closes_at: window.closes_at,
            });
        }

        if let Some(date) = days.keys().find(|date| !week.contains(**date)) {
            return Err(AvailabilityError::DateOutsideWeek { date: *date, week });
        }

        for (date, slots) in days {
            let atoms: BTreeSet<AvailabilityAtom> = slots
                .into_iter()
                .flat_map(|slot| slot.atoms().iter().copied())
                .collect();
            self.repository.replace_day(user_id, date, atoms)?;
        }

        Ok(())
    }

    /// Per-date slot sets for the week. When both atoms are stored for a
    /// date the result carries `Day`, `Night`, and the synthesized `Double`.
    pub fn get(
        &self,
        user_id: &StaffId,
        week: RotaWeek,
    ) -> Result<BTreeMap<NaiveDate, BTreeSet<AvailabilitySlot>>, AvailabilityError> {
        let stored = self.repository.atoms_for_week(user_id, week)?;
        let mut consolidated = BTreeMap::new();

        for (date, atoms) in stored {
            if atoms.is_empty() {
                continue;
            }
            let mut slots = BTreeSet::new();
            if atoms.contains(&AvailabilityAtom::Day) {
                slots.insert(AvailabilitySlot::Day);
            }
            if atoms.contains(&AvailabilityAtom::Night) {
                slots.insert(AvailabilitySlot::Night);
            }
            if slots.contains(&AvailabilitySlot::Day) && slots.contains(&AvailabilitySlot::Night) {
                slots.insert(AvailabilitySlot::Double);
            }
            consolidated.insert(date, slots);
        }

        Ok(consolidated)
    }
}
