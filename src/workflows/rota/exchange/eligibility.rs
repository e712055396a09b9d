use std::collections::BTreeSet;

use crate::directory::{StaffDirectory, StaffMember};
use crate::workflows::rota::domain::{StaffId, StaffRole};
use crate::workflows::rota::schedule::{ScheduleEntry, ScheduleRepository};

use super::service::ExchangeError;

/// Cheap role-only pre-filter for responsive UIs. This is a hint: it skips
/// the conflict check entirely, so state-changing calls must go through
/// [`eligible_staff`] instead.
pub fn role_match_hint(
    candidates: &[StaffMember],
    owner_roles: &BTreeSet<StaffRole>,
    exclude: &StaffId,
) -> Vec<StaffId> {
    candidates
        .iter()
        .filter(|member| member.active && member.id != *exclude)
        .filter(|member| member.holds_any_role(owner_roles))
        .map(|member| member.id.clone())
        .collect()
}

/// Authoritative eligibility: active staff sharing a role with the entry's
/// owner, minus `exclude`, minus anyone already assigned on the entry's
/// date. Re-run at every state-changing exchange operation; the client-side
/// hint is never trusted.
pub fn eligible_staff<S, D>(
    schedule: &S,
    directory: &D,
    entry: &ScheduleEntry,
    exclude: &StaffId,
) -> Result<Vec<StaffId>, ExchangeError>
where
    S: ScheduleRepository,
    D: StaffDirectory,
{
    let owner = directory
        .get_user(&entry.user_id)?
        .ok_or_else(|| ExchangeError::StaffNotFound {
            id: entry.user_id.clone(),
        })?;

    let busy: BTreeSet<StaffId> = schedule
        .entries_on(entry.date)?
        .into_iter()
        .map(|existing| existing.user_id)
        .collect();

    let candidates = directory.list_active_staff()?;
    let mut eligible = role_match_hint(&candidates, &owner.roles, exclude);
    eligible.retain(|id| !busy.contains(id));
    Ok(eligible)
}
