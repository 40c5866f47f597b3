use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use crate::core::{
    diff::{diff_plan, PlanDiff},
    filters::affected_plans,
    matcher::Matcher,
};
use crate::models::{BatchSummary, BreedingPlan, DbId, MatchLink, MatchResult, RefreshSummary, WaitlistEntry};
use crate::services::store::{MatchStore, StoreError};

/// Keeps stored suggestion rows in step with waitlist and plan data
///
/// Every operation re-derives the candidate set from current data, so any of
/// them can be retried after a failure. Plans that vanished or reached a
/// terminal status are skipped rather than reported as errors.
pub struct Reconciler<S> {
    store: Arc<S>,
    matcher: Matcher,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            matcher: self.matcher.clone(),
        }
    }
}

impl<S: MatchStore> Reconciler<S> {
    pub fn new(store: Arc<S>, matcher: Matcher) -> Self {
        Self { store, matcher }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ranked candidate set for a plan without writing anything
    pub async fn find_possible_matches(
        &self,
        plan_id: DbId,
        tenant_id: DbId,
    ) -> Result<Vec<MatchResult>, StoreError> {
        let Some(plan) = self.load_active_plan(plan_id, tenant_id).await? else {
            return Ok(Vec::new());
        };

        let entries = self.store.eligible_entries(tenant_id).await?;
        let links = self.store.links_for_plans(tenant_id, &[plan.id]).await?;

        Ok(self.matcher.find_matches(&plan, &entries, &links))
    }

    /// Converge the stored suggestions of one plan to its current candidate set
    pub async fn refresh_plan_matches(
        &self,
        plan_id: DbId,
        tenant_id: DbId,
    ) -> Result<RefreshSummary, StoreError> {
        let Some(plan) = self.load_active_plan(plan_id, tenant_id).await? else {
            return Ok(RefreshSummary::default());
        };
        self.refresh_loaded_plan(&plan).await
    }

    /// Refresh every plan a single changed entry can affect
    ///
    /// Runs the batch path with a one-element id list, so a single entry costs
    /// the same fixed number of reads as a batch.
    pub async fn refresh_matching_plans_for_entry(
        &self,
        entry_id: DbId,
        tenant_id: DbId,
    ) -> Result<(), StoreError> {
        self.refresh_matching_plans_for_entries(&[entry_id], tenant_id).await?;
        Ok(())
    }

    /// Refresh every plan touched by a set of changed entries
    ///
    /// Shared data (eligible entries, links of every affected plan) is loaded
    /// once up front and each plan is diffed in memory, so the number of reads
    /// does not grow with the number of plans. A read failure aborts before
    /// anything is written. A write failure stops the batch at that plan;
    /// plans already written stay written.
    pub async fn refresh_matching_plans_for_entries(
        &self,
        entry_ids: &[DbId],
        tenant_id: DbId,
    ) -> Result<BatchSummary, StoreError> {
        let mut ids = entry_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(BatchSummary::default());
        }

        let changed = self.store.entries_by_ids(tenant_id, &ids).await?;
        if changed.is_empty() {
            debug!(tenant_id, requested = ids.len(), "No changed entries found, nothing to refresh");
            return Ok(BatchSummary::default());
        }

        let active = self.store.active_plans(tenant_id).await?;
        let suggested: HashSet<DbId> = self
            .store
            .suggested_plan_ids(tenant_id, &ids)
            .await?
            .into_iter()
            .collect();

        let plans = affected_plans(&changed, &active, &suggested);
        if plans.is_empty() {
            return Ok(BatchSummary::default());
        }

        let plan_ids: Vec<DbId> = plans.iter().map(|p| p.id).collect();
        let eligible = self.store.eligible_entries(tenant_id).await?;
        let links = self.store.links_for_plans(tenant_id, &plan_ids).await?;
        let links_by_plan = group_links_by_plan(links);

        let mut summary = BatchSummary::default();
        for plan in plans {
            let plan_links = links_by_plan.get(&plan.id).map(Vec::as_slice).unwrap_or(&[]);
            summary += self.reconcile(plan, &eligible, plan_links).await?;
        }

        info!(
            tenant_id,
            changed_entries = changed.len(),
            plans = summary.plans_refreshed,
            added = summary.added,
            removed = summary.removed,
            updated = summary.updated,
            "Batch match refresh complete"
        );
        Ok(summary)
    }

    async fn load_active_plan(
        &self,
        plan_id: DbId,
        tenant_id: DbId,
    ) -> Result<Option<BreedingPlan>, StoreError> {
        match self.store.plan_by_id(tenant_id, plan_id).await? {
            Some(plan) if plan.is_active() => Ok(Some(plan)),
            Some(plan) => {
                debug!(tenant_id, plan_id, status = plan.status.as_str(), "Plan is terminal, skipping");
                Ok(None)
            }
            None => {
                debug!(tenant_id, plan_id, "Plan not found, skipping");
                Ok(None)
            }
        }
    }

    async fn refresh_loaded_plan(&self, plan: &BreedingPlan) -> Result<RefreshSummary, StoreError> {
        let entries = self.store.eligible_entries(plan.tenant_id).await?;
        let links = self.store.links_for_plans(plan.tenant_id, &[plan.id]).await?;
        self.reconcile(plan, &entries, &links).await
    }

    /// Diff one plan against already-loaded data and apply the writes
    async fn reconcile(
        &self,
        plan: &BreedingPlan,
        entries: &[WaitlistEntry],
        links: &[MatchLink],
    ) -> Result<RefreshSummary, StoreError> {
        let candidates = self.matcher.find_matches(plan, entries, links);
        let diff = diff_plan(plan.id, links, &candidates);
        let summary = self.apply(plan.tenant_id, diff).await?;

        debug!(
            tenant_id = plan.tenant_id,
            plan_id = plan.id,
            candidates = candidates.len(),
            added = summary.added,
            removed = summary.removed,
            updated = summary.updated,
            "Plan matches reconciled"
        );
        Ok(summary)
    }

    /// Write a plan diff: one bulk delete, one bulk insert, then concurrent updates.
    ///
    /// A failing phase stops the remaining phases for this plan. Counts are
    /// what the store actually changed, so rows a concurrent refresh already
    /// wrote, or rows another workflow promoted meanwhile, are not counted.
    async fn apply(&self, tenant_id: DbId, diff: PlanDiff) -> Result<RefreshSummary, StoreError> {
        let mut summary = RefreshSummary::default();
        if diff.is_empty() {
            return Ok(summary);
        }

        if !diff.to_delete.is_empty() {
            summary.removed = self.store.delete_suggestions(tenant_id, &diff.to_delete).await? as usize;
        }

        if !diff.to_insert.is_empty() {
            let inserted = self.store.insert_suggestions(tenant_id, &diff.to_insert).await? as usize;
            let skipped = diff.to_insert.len().saturating_sub(inserted);
            if skipped > 0 {
                warn!(
                    tenant_id,
                    plan_id = diff.plan_id,
                    skipped,
                    "Suggestion rows already written by a concurrent refresh"
                );
            }
            summary.added = inserted;
        }

        if !diff.to_update.is_empty() {
            let store = &self.store;
            let applied = try_join_all(
                diff.to_update
                    .iter()
                    .map(|update| store.update_suggestion(tenant_id, update)),
            )
            .await?;
            summary.updated = applied.into_iter().sum::<u64>() as usize;
        }

        Ok(summary)
    }
}

fn group_links_by_plan(links: Vec<MatchLink>) -> HashMap<DbId, Vec<MatchLink>> {
    let mut grouped: HashMap<DbId, Vec<MatchLink>> = HashMap::new();
    for link in links {
        grouped.entry(link.plan_id).or_default().push(link);
    }
    grouped
}
