use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use crate::models::{
    BreedingPlan, DbId, LinkStage, MatchLink, NewSuggestion, SuggestionUpdate, WaitlistEntry,
};
use crate::services::store::{BreedingPlanReader, MatchLinkStore, StoreError, WaitlistReader};

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<WaitlistEntry>,
    plans: Vec<BreedingPlan>,
    links: Vec<MatchLink>,
    next_link_id: DbId,
    faults: Faults,
}

#[derive(Debug, Default)]
struct Faults {
    fail_reads: bool,
    fail_writes_for_plan: Option<DbId>,
    race_next_insert: Vec<DbId>,
    promote_next_update: Option<LinkStage>,
}

/// In-memory persistence gateway
///
/// Behaves like the PostgreSQL gateway, including the uniqueness of
/// suggestion rows, and counts every read call so callers can check how many
/// round trips an operation made. Used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a waitlist entry
    pub async fn put_entry(&self, entry: WaitlistEntry) {
        let mut state = self.state.write().await;
        match state.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => state.entries.push(entry),
        }
    }

    pub async fn remove_entry(&self, entry_id: DbId) {
        self.state.write().await.entries.retain(|e| e.id != entry_id);
    }

    /// Insert or replace a breeding plan
    pub async fn put_plan(&self, plan: BreedingPlan) {
        let mut state = self.state.write().await;
        match state.plans.iter_mut().find(|p| p.id == plan.id) {
            Some(existing) => *existing = plan,
            None => state.plans.push(plan),
        }
    }

    /// Store a link at any stage, as another workflow would. Returns its id.
    pub async fn put_link(
        &self,
        tenant_id: DbId,
        plan_id: DbId,
        entry_id: DbId,
        stage: LinkStage,
        score: Option<i32>,
    ) -> DbId {
        let mut state = self.state.write().await;
        state.next_link_id += 1;
        let id = state.next_link_id;
        state.links.push(MatchLink {
            id,
            tenant_id,
            plan_id,
            entry_id,
            stage,
            score,
            reasons: vec![],
            created_at: Some(Utc::now()),
            updated_at: None,
        });
        id
    }

    /// Move a stored link to another stage, as the confirmation workflow would
    pub async fn set_link_stage(&self, link_id: DbId, stage: LinkStage) {
        let mut state = self.state.write().await;
        if let Some(link) = state.links.iter_mut().find(|l| l.id == link_id) {
            link.stage = stage;
        }
    }

    /// Every stored link, ordered by id
    pub async fn links(&self) -> Vec<MatchLink> {
        let mut links = self.state.read().await.links.clone();
        links.sort_by_key(|l| l.id);
        links
    }

    /// Suggestion rows of one plan, ordered by entry id
    pub async fn suggestions_for_plan(&self, plan_id: DbId) -> Vec<MatchLink> {
        let mut links: Vec<MatchLink> = self
            .state
            .read()
            .await
            .links
            .iter()
            .filter(|l| l.plan_id == plan_id && l.stage.is_suggestion())
            .cloned()
            .collect();
        links.sort_by_key(|l| l.entry_id);
        links
    }

    /// Number of read calls served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls served so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Make every read fail with [`StoreError::Unavailable`]
    pub async fn fail_reads(&self, fail: bool) {
        self.state.write().await.faults.fail_reads = fail;
    }

    /// Make every write touching `plan_id` fail with [`StoreError::Unavailable`]
    pub async fn fail_writes_for_plan(&self, plan_id: Option<DbId>) {
        self.state.write().await.faults.fail_writes_for_plan = plan_id;
    }

    /// Have the next insert find the rows for `entry_ids` already written by a
    /// concurrent refresh
    pub async fn race_next_insert(&self, entry_ids: &[DbId]) {
        self.state.write().await.faults.race_next_insert = entry_ids.to_vec();
    }

    /// Have the next update find its row moved to `stage` by another workflow
    pub async fn promote_next_update(&self, stage: LinkStage) {
        self.state.write().await.faults.promote_next_update = Some(stage);
    }

    async fn begin_read(&self) -> Result<tokio::sync::RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        if state.faults.fail_reads {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(state)
    }
}

fn check_write(state: &MemoryState, plan_ids: impl IntoIterator<Item = DbId>) -> Result<(), StoreError> {
    if let Some(failing) = state.faults.fail_writes_for_plan {
        if plan_ids.into_iter().any(|id| id == failing) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for plan {}",
                failing
            )));
        }
    }
    Ok(())
}

fn push_suggestion(state: &mut MemoryState, tenant_id: DbId, row: &NewSuggestion) {
    state.next_link_id += 1;
    let id = state.next_link_id;
    state.links.push(MatchLink {
        id,
        tenant_id,
        plan_id: row.plan_id,
        entry_id: row.entry_id,
        stage: LinkStage::PossibleMatch,
        score: Some(row.score),
        reasons: row.reasons.clone(),
        created_at: Some(Utc::now()),
        updated_at: None,
    });
}

#[async_trait]
impl WaitlistReader for InMemoryStore {
    async fn entries_by_ids(
        &self,
        tenant_id: DbId,
        entry_ids: &[DbId],
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let state = self.begin_read().await?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.tenant_id == tenant_id && entry_ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn eligible_entries(&self, tenant_id: DbId) -> Result<Vec<WaitlistEntry>, StoreError> {
        let state = self.begin_read().await?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.status.is_eligible())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BreedingPlanReader for InMemoryStore {
    async fn plan_by_id(
        &self,
        tenant_id: DbId,
        plan_id: DbId,
    ) -> Result<Option<BreedingPlan>, StoreError> {
        let state = self.begin_read().await?;
        Ok(state
            .plans
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.id == plan_id)
            .cloned())
    }

    async fn active_plans(&self, tenant_id: DbId) -> Result<Vec<BreedingPlan>, StoreError> {
        let state = self.begin_read().await?;
        Ok(state
            .plans
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.is_active())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MatchLinkStore for InMemoryStore {
    async fn links_for_plans(
        &self,
        tenant_id: DbId,
        plan_ids: &[DbId],
    ) -> Result<Vec<MatchLink>, StoreError> {
        let state = self.begin_read().await?;
        Ok(state
            .links
            .iter()
            .filter(|l| l.tenant_id == tenant_id && plan_ids.contains(&l.plan_id))
            .cloned()
            .collect())
    }

    async fn suggested_plan_ids(
        &self,
        tenant_id: DbId,
        entry_ids: &[DbId],
    ) -> Result<Vec<DbId>, StoreError> {
        let state = self.begin_read().await?;
        let mut seen = HashSet::new();
        Ok(state
            .links
            .iter()
            .filter(|l| {
                l.tenant_id == tenant_id && l.stage.is_suggestion() && entry_ids.contains(&l.entry_id)
            })
            .map(|l| l.plan_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }

    async fn delete_suggestions(&self, tenant_id: DbId, link_ids: &[DbId]) -> Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        let plan_ids: Vec<DbId> = state
            .links
            .iter()
            .filter(|l| link_ids.contains(&l.id))
            .map(|l| l.plan_id)
            .collect();
        check_write(&state, plan_ids)?;

        let before = state.links.len();
        state.links.retain(|l| {
            !(l.tenant_id == tenant_id && l.stage.is_suggestion() && link_ids.contains(&l.id))
        });
        Ok((before - state.links.len()) as u64)
    }

    async fn insert_suggestions(
        &self,
        tenant_id: DbId,
        rows: &[NewSuggestion],
    ) -> Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        check_write(&state, rows.iter().map(|r| r.plan_id))?;

        let raced = std::mem::take(&mut state.faults.race_next_insert);
        for row in rows.iter().filter(|r| raced.contains(&r.entry_id)) {
            push_suggestion(&mut state, tenant_id, row);
        }

        let mut inserted = 0;
        for row in rows {
            let exists = state.links.iter().any(|l| {
                l.tenant_id == tenant_id
                    && l.plan_id == row.plan_id
                    && l.entry_id == row.entry_id
                    && l.stage.is_suggestion()
            });
            if !exists {
                push_suggestion(&mut state, tenant_id, row);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update_suggestion(
        &self,
        tenant_id: DbId,
        update: &SuggestionUpdate,
    ) -> Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        let plan_id = state
            .links
            .iter()
            .find(|l| l.id == update.link_id)
            .map(|l| l.plan_id);
        check_write(&state, plan_id)?;

        if let Some(stage) = state.faults.promote_next_update.take() {
            if let Some(link) = state.links.iter_mut().find(|l| l.id == update.link_id) {
                link.stage = stage;
            }
        }

        match state.links.iter_mut().find(|l| {
            l.id == update.link_id && l.tenant_id == tenant_id && l.stage.is_suggestion()
        }) {
            Some(link) => {
                link.score = Some(update.score);
                link.reasons = update.reasons.clone();
                link.updated_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
