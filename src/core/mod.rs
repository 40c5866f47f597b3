// Core algorithm exports
pub mod diff;
pub mod filters;
pub mod matcher;
pub mod program_note;
pub mod reconciler;
pub mod scoring;

pub use diff::{diff_plan, PlanDiff};
pub use filters::{affected_plans, candidate_entries, entry_reaches_plan, excluded_entry_ids, is_meaningful};
pub use matcher::{rank_matches, Matcher};
pub use program_note::{notes_reference_program, parse_program_name};
pub use reconciler::Reconciler;
pub use scoring::score_entry;
