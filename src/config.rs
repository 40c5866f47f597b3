use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_program_weight")]
    pub program: i32,
    #[serde(default = "default_program_notes_weight")]
    pub program_from_notes: i32,
    #[serde(default = "default_species_weight")]
    pub species: i32,
    #[serde(default = "default_breed_weight")]
    pub breed: i32,
    #[serde(default = "default_no_breed_weight")]
    pub no_breed_preference: i32,
    #[serde(default = "default_parent_weight")]
    pub sire: i32,
    #[serde(default = "default_parent_weight")]
    pub dam: i32,
    #[serde(default = "default_deposit_weight")]
    pub deposit_paid: i32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            program: default_program_weight(),
            program_from_notes: default_program_notes_weight(),
            species: default_species_weight(),
            breed: default_breed_weight(),
            no_breed_preference: default_no_breed_weight(),
            sire: default_parent_weight(),
            dam: default_parent_weight(),
            deposit_paid: default_deposit_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(w: &WeightsConfig) -> Self {
        Self {
            program: w.program,
            program_from_notes: w.program_from_notes,
            species: w.species,
            breed: w.breed,
            no_breed_preference: w.no_breed_preference,
            sire: w.sire,
            dam: w.dam,
            deposit_paid: w.deposit_paid,
        }
    }
}

fn default_program_weight() -> i32 { 50 }
fn default_program_notes_weight() -> i32 { 40 }
fn default_species_weight() -> i32 { 10 }
fn default_breed_weight() -> i32 { 15 }
fn default_no_breed_weight() -> i32 { 5 }
fn default_parent_weight() -> i32 { 25 }
fn default_deposit_weight() -> i32 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BREEDER_MATCH__)
    /// 5. DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BREEDER_MATCH__DATABASE__URL -> database.url
            .add_source(env_source())
            .build()?;

        with_database_url_override(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        with_database_url_override(settings)?.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("BREEDER_MATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional `DATABASE_URL` variable on top of the loaded sources
fn with_database_url_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        _ => Ok(settings),
    }
}
