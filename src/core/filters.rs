use std::collections::HashSet;
use crate::models::{BreedingPlan, DbId, MatchLink, MatchReason, WaitlistEntry};

/// True when the reason set can qualify a pair as a suggestion.
///
/// Species and deposit reasons alone never do.
#[inline]
pub fn is_meaningful(reasons: &[MatchReason]) -> bool {
    reasons.iter().any(MatchReason::is_meaningful)
}

/// Entry ids already linked to `plan_id` at a stage other than suggestion.
///
/// Those entries are owned by the confirmation workflow and are never suggested again.
pub fn excluded_entry_ids(plan_id: DbId, links: &[MatchLink]) -> HashSet<DbId> {
    links
        .iter()
        .filter(|link| link.plan_id == plan_id && !link.stage.is_suggestion())
        .map(|link| link.entry_id)
        .collect()
}

/// Candidate filter for one plan
///
/// Keeps entries in an eligible status that are not excluded by a
/// non-suggestion link. Entries already suggested stay in so their rows
/// get re-scored.
pub fn candidate_entries<'a>(
    plan: &BreedingPlan,
    entries: &'a [WaitlistEntry],
    links: &[MatchLink],
) -> impl Iterator<Item = &'a WaitlistEntry> {
    let excluded = excluded_entry_ids(plan.id, links);
    let tenant_id = plan.tenant_id;
    entries.iter().filter(move |entry| {
        entry.tenant_id == tenant_id
            && entry.status.is_eligible()
            && !excluded.contains(&entry.id)
    })
}

/// Whether a change to `entry` can affect the candidate set of `plan`.
///
/// Parking-lot entries (no program) reach every active plan in the tenant;
/// other entries reach the plans of their own program.
#[inline]
pub fn entry_reaches_plan(entry: &WaitlistEntry, plan: &BreedingPlan) -> bool {
    if entry.tenant_id != plan.tenant_id || !plan.is_active() {
        return false;
    }
    entry.is_parking_lot() || entry.program_id == plan.program_id()
}

/// Plans to reconcile after `changed` entries were modified
///
/// A plan is affected when any changed entry reaches it, or when it already
/// holds a suggestion for one of the changed entries (`suggested_plan_ids`),
/// which covers entries whose program moved away from the plan. Each plan
/// appears once, in the order of `active_plans`.
pub fn affected_plans<'a>(
    changed: &[WaitlistEntry],
    active_plans: &'a [BreedingPlan],
    suggested_plan_ids: &HashSet<DbId>,
) -> Vec<&'a BreedingPlan> {
    let mut seen = HashSet::new();
    active_plans
        .iter()
        .filter(|plan| plan.is_active())
        .filter(|plan| {
            suggested_plan_ids.contains(&plan.id)
                || changed.iter().any(|entry| entry_reaches_plan(entry, plan))
        })
        .filter(|plan| seen.insert(plan.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkStage, PlanStatus, ProgramRef, Species, WaitlistStatus};

    fn create_test_entry(id: DbId, program_id: Option<DbId>, status: WaitlistStatus) -> WaitlistEntry {
        WaitlistEntry {
            id,
            tenant_id: 1,
            status,
            program_id,
            species_pref: None,
            breed_prefs: vec![],
            sire_pref_id: None,
            sire_pref_name: None,
            dam_pref_id: None,
            dam_pref_name: None,
            notes: None,
        }
    }

    fn create_test_plan(id: DbId, program_id: Option<DbId>, status: PlanStatus) -> BreedingPlan {
        BreedingPlan {
            id,
            tenant_id: 1,
            species: Species::Dog,
            breed_text: None,
            sire_id: None,
            dam_id: None,
            program: program_id.map(|id| ProgramRef { id, name: format!("Program {}", id) }),
            status,
        }
    }

    fn create_link(plan_id: DbId, entry_id: DbId, stage: LinkStage) -> MatchLink {
        MatchLink {
            id: plan_id * 1000 + entry_id,
            tenant_id: 1,
            plan_id,
            entry_id,
            stage,
            score: None,
            reasons: vec![],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_meaningful_reasons() {
        assert!(!is_meaningful(&[MatchReason::SpeciesMatch, MatchReason::DepositPaid]));
        assert!(is_meaningful(&[MatchReason::SpeciesMatch, MatchReason::DamPreference]));
        assert!(!is_meaningful(&[]));
    }

    #[test]
    fn test_confirmed_links_exclude_entry() {
        let plan = create_test_plan(10, Some(1), PlanStatus::Committed);
        let entries = vec![
            create_test_entry(1, Some(1), WaitlistStatus::Approved),
            create_test_entry(2, Some(1), WaitlistStatus::Approved),
            create_test_entry(3, Some(1), WaitlistStatus::DepositPaid),
        ];
        let links = vec![
            create_link(10, 1, LinkStage::Assigned),
            create_link(10, 2, LinkStage::PossibleMatch),
            create_link(11, 3, LinkStage::Declined), // other plan
        ];

        let ids: Vec<DbId> = candidate_entries(&plan, &entries, &links).map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_ineligible_status_filtered() {
        let plan = create_test_plan(10, Some(1), PlanStatus::Committed);
        let entries = vec![
            create_test_entry(1, Some(1), WaitlistStatus::Pending),
            create_test_entry(2, Some(1), WaitlistStatus::Rejected),
        ];

        assert_eq!(candidate_entries(&plan, &entries, &[]).count(), 0);
    }

    #[test]
    fn test_parking_lot_reaches_every_active_plan() {
        let entry = create_test_entry(1, None, WaitlistStatus::Approved);
        assert!(entry_reaches_plan(&entry, &create_test_plan(10, Some(1), PlanStatus::Bred)));
        assert!(entry_reaches_plan(&entry, &create_test_plan(11, None, PlanStatus::Planning)));
        assert!(!entry_reaches_plan(&entry, &create_test_plan(12, Some(1), PlanStatus::Complete)));
    }

    #[test]
    fn test_program_entry_reaches_own_program_only() {
        let entry = create_test_entry(1, Some(1), WaitlistStatus::Approved);
        assert!(entry_reaches_plan(&entry, &create_test_plan(10, Some(1), PlanStatus::Bred)));
        assert!(!entry_reaches_plan(&entry, &create_test_plan(11, Some(2), PlanStatus::Bred)));
        assert!(!entry_reaches_plan(&entry, &create_test_plan(12, None, PlanStatus::Bred)));
    }

    #[test]
    fn test_affected_plans_deduplicated() {
        let plans = vec![
            create_test_plan(10, Some(1), PlanStatus::Committed),
            create_test_plan(11, Some(2), PlanStatus::Committed),
            create_test_plan(12, Some(3), PlanStatus::Committed),
        ];
        let changed = vec![
            create_test_entry(1, Some(1), WaitlistStatus::Approved),
            create_test_entry(2, Some(1), WaitlistStatus::Rejected),
        ];
        let suggested: HashSet<DbId> = [12].into_iter().collect();

        let ids: Vec<DbId> = affected_plans(&changed, &plans, &suggested)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![10, 12]);
    }
}
