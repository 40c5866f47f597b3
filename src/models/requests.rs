use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::DbId;

/// Request to preview or refresh the suggestions of one plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPlanRequest {
    #[validate(range(min = 1))]
    pub tenant_id: DbId,
    #[validate(range(min = 1))]
    pub plan_id: DbId,
}

/// Request to refresh every plan touched by a set of changed waitlist entries
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshEntriesRequest {
    #[validate(range(min = 1))]
    pub tenant_id: DbId,
    #[validate(length(min = 1, max = 10000))]
    #[serde(alias = "entry_ids")]
    pub entry_ids: Vec<DbId>,
}
