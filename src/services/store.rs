use async_trait::async_trait;
use thiserror::Error;
use crate::models::{BreedingPlan, DbId, MatchLink, NewSuggestion, SuggestionUpdate, WaitlistEntry};

/// Errors raised by the persistence gateway
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness or integrity rule other than the suggestion key was broken
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to waitlist entries
#[async_trait]
pub trait WaitlistReader: Send + Sync {
    /// Fetch entries by id regardless of status. Missing ids are skipped.
    async fn entries_by_ids(
        &self,
        tenant_id: DbId,
        entry_ids: &[DbId],
    ) -> Result<Vec<WaitlistEntry>, StoreError>;

    /// Fetch every entry of the tenant whose status is approved or deposit-paid,
    /// with sire/dam preference names resolved.
    async fn eligible_entries(&self, tenant_id: DbId) -> Result<Vec<WaitlistEntry>, StoreError>;
}

/// Read access to breeding plans
#[async_trait]
pub trait BreedingPlanReader: Send + Sync {
    async fn plan_by_id(
        &self,
        tenant_id: DbId,
        plan_id: DbId,
    ) -> Result<Option<BreedingPlan>, StoreError>;

    /// Fetch every plan of the tenant outside the terminal statuses, with its program resolved.
    async fn active_plans(&self, tenant_id: DbId) -> Result<Vec<BreedingPlan>, StoreError>;
}

/// Read/write access to plan-entry links
#[async_trait]
pub trait MatchLinkStore: Send + Sync {
    /// All links (any stage) for the given plans.
    async fn links_for_plans(
        &self,
        tenant_id: DbId,
        plan_ids: &[DbId],
    ) -> Result<Vec<MatchLink>, StoreError>;

    /// Ids of plans holding a suggestion-stage row for any of the given entries.
    async fn suggested_plan_ids(
        &self,
        tenant_id: DbId,
        entry_ids: &[DbId],
    ) -> Result<Vec<DbId>, StoreError>;

    /// Delete suggestion-stage rows by id. Rows at other stages are left alone.
    async fn delete_suggestions(&self, tenant_id: DbId, link_ids: &[DbId]) -> Result<u64, StoreError>;

    /// Insert suggestion-stage rows in one statement.
    ///
    /// Pairs that already hold a suggestion row, such as rows written by a
    /// concurrent refresh of the same plan, are skipped. Returns the number of
    /// rows actually inserted.
    async fn insert_suggestions(
        &self,
        tenant_id: DbId,
        rows: &[NewSuggestion],
    ) -> Result<u64, StoreError>;

    /// Overwrite score and reasons of one suggestion row.
    ///
    /// Returns 0 when the row is gone or has left the suggestion stage.
    async fn update_suggestion(
        &self,
        tenant_id: DbId,
        update: &SuggestionUpdate,
    ) -> Result<u64, StoreError>;
}

/// Full gateway the reconciler runs against
pub trait MatchStore: WaitlistReader + BreedingPlanReader + MatchLinkStore {}

impl<T> MatchStore for T where T: WaitlistReader + BreedingPlanReader + MatchLinkStore {}
