// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BreedingPlan, DbId, LinkStage, MatchLink, MatchReason, MatchResult, NewSuggestion, PlanStatus,
    ProgramRef, ScoringWeights, Species, SuggestionUpdate, WaitlistEntry, WaitlistStatus,
};
pub use requests::{RefreshEntriesRequest, RefreshPlanRequest};
pub use responses::{BatchSummary, MatchPreviewResponse, RefreshSummary};
