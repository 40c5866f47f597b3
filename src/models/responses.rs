use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use crate::models::domain::{DbId, MatchResult};

/// Outcome of reconciling one plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

impl RefreshSummary {
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.updated == 0
    }
}

/// Outcome of reconciling every plan touched by a set of changed entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub plans_refreshed: usize,
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

impl AddAssign<RefreshSummary> for BatchSummary {
    fn add_assign(&mut self, rhs: RefreshSummary) {
        self.plans_refreshed += 1;
        self.added += rhs.added;
        self.removed += rhs.removed;
        self.updated += rhs.updated;
    }
}

/// Read-only preview of the candidate set for a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPreviewResponse {
    pub tenant_id: DbId,
    pub plan_id: DbId,
    pub matches: Vec<MatchResult>,
    pub total_results: usize,
}

impl MatchPreviewResponse {
    pub fn new(tenant_id: DbId, plan_id: DbId, matches: Vec<MatchResult>) -> Self {
        let total_results = matches.len();
        Self {
            tenant_id,
            plan_id,
            matches,
            total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary_accumulates() {
        let mut batch = BatchSummary::default();
        batch += RefreshSummary { added: 2, removed: 1, updated: 0 };
        batch += RefreshSummary::default();

        assert_eq!(batch.plans_refreshed, 2);
        assert_eq!(batch.added, 2);
        assert_eq!(batch.removed, 1);
        assert!(RefreshSummary::default().is_noop());
    }
}
