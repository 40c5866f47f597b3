use std::cmp::Ordering;
use crate::models::{BreedingPlan, MatchLink, MatchResult, ScoringWeights, WaitlistEntry};
use crate::core::{
    filters::{candidate_entries, is_meaningful},
    scoring::score_entry,
};

/// Candidate-set orchestrator for one breeding plan
///
/// # Pipeline Stages
/// 1. Eligibility and exclusion filtering
/// 2. Scoring
/// 3. Meaningful-reason cut
/// 4. Ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Compute the full candidate set for `plan`
    ///
    /// # Arguments
    /// * `plan` - The plan being matched
    /// * `entries` - Tenant-wide eligible waitlist entries
    /// * `links` - Every stored link of the plan, at any stage
    ///
    /// # Returns
    /// Candidates with a positive score and at least one meaningful reason,
    /// ranked by [`rank_matches`]. Terminal plans yield nothing.
    pub fn find_matches(
        &self,
        plan: &BreedingPlan,
        entries: &[WaitlistEntry],
        links: &[MatchLink],
    ) -> Vec<MatchResult> {
        if !plan.is_active() {
            return Vec::new();
        }

        let mut matches: Vec<MatchResult> = candidate_entries(plan, entries, links)
            .filter_map(|entry| {
                let (score, reasons) = score_entry(entry, plan, &self.weights);
                if score > 0 && is_meaningful(&reasons) {
                    Some(MatchResult {
                        entry_id: entry.id,
                        score,
                        reasons,
                    })
                } else {
                    None
                }
            })
            .collect();

        rank_matches(&mut matches);
        matches
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Preview ordering: score descending, deposit-paid first within a tie,
/// then entry id so repeated calls return the same order.
pub fn rank_matches(matches: &mut [MatchResult]) {
    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| match (a.has_deposit(), b.has_deposit()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            })
            .then_with(|| a.entry_id.cmp(&b.entry_id))
    });
}
