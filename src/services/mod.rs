// Service exports
pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::{PostgresClient, PostgresError};
pub use store::{BreedingPlanReader, MatchLinkStore, MatchStore, StoreError, WaitlistReader};
