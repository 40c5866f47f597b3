use std::collections::{HashMap, HashSet};
use crate::models::{DbId, MatchLink, MatchResult, NewSuggestion, SuggestionUpdate};

/// Minimal set of writes that converges one plan's stored suggestions to its
/// current candidate set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDiff {
    pub plan_id: DbId,
    pub to_delete: Vec<DbId>,
    pub to_insert: Vec<NewSuggestion>,
    pub to_update: Vec<SuggestionUpdate>,
}

impl PlanDiff {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_insert.is_empty() && self.to_update.is_empty()
    }
}

/// Diff the stored links of `plan_id` against `candidates`
///
/// Only suggestion-stage rows of the plan take part; links at any other stage
/// are ignored here and never written. Rows are keyed by entry id:
/// - stored row without a candidate is deleted
/// - candidate without a stored row is inserted
/// - candidate with a stored row is updated only when the score changed
///
/// A second suggestion row for an entry that already has one is deleted.
pub fn diff_plan(plan_id: DbId, stored: &[MatchLink], candidates: &[MatchResult]) -> PlanDiff {
    let wanted: HashMap<DbId, &MatchResult> =
        candidates.iter().map(|c| (c.entry_id, c)).collect();

    let mut diff = PlanDiff {
        plan_id,
        ..PlanDiff::default()
    };
    let mut kept: HashSet<DbId> = HashSet::with_capacity(stored.len());

    for link in stored
        .iter()
        .filter(|link| link.plan_id == plan_id && link.stage.is_suggestion())
    {
        let candidate = match wanted.get(&link.entry_id) {
            Some(candidate) if kept.insert(link.entry_id) => candidate,
            _ => {
                diff.to_delete.push(link.id);
                continue;
            }
        };

        if link.score != Some(candidate.score) {
            diff.to_update.push(SuggestionUpdate {
                link_id: link.id,
                entry_id: link.entry_id,
                score: candidate.score,
                reasons: candidate.reasons.clone(),
            });
        }
    }

    diff.to_insert = candidates
        .iter()
        .filter(|c| !kept.contains(&c.entry_id))
        .map(|c| NewSuggestion {
            plan_id,
            entry_id: c.entry_id,
            score: c.score,
            reasons: c.reasons.clone(),
        })
        .collect();

    diff
}
