//! Breeder Match - waitlist-to-breeding-plan matching engine
//!
//! Scores approved waitlist entries against active breeding plans and keeps
//! the stored suggestion rows of each plan reconciled with the current data,
//! either one plan at a time or in batches driven by many changed entries.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, Reconciler, score_entry};
pub use models::{BreedingPlan, WaitlistEntry, MatchLink, MatchResult, MatchReason, ScoringWeights, RefreshSummary, BatchSummary};
pub use services::{InMemoryStore, PostgresClient, StoreError};
