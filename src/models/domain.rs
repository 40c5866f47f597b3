use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key type shared by every table this engine touches.
pub type DbId = i64;

/// Lifecycle status of a waitlist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "waitlist_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    Inquiry,
    Pending,
    Approved,
    DepositDue,
    DepositPaid,
    Allocated,
    Completed,
    Rejected,
    Canceled,
}

impl WaitlistStatus {
    /// Statuses whose entries are candidates for matching.
    pub const ELIGIBLE: [WaitlistStatus; 2] = [WaitlistStatus::Approved, WaitlistStatus::DepositPaid];

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Inquiry => "INQUIRY",
            WaitlistStatus::Pending => "PENDING",
            WaitlistStatus::Approved => "APPROVED",
            WaitlistStatus::DepositDue => "DEPOSIT_DUE",
            WaitlistStatus::DepositPaid => "DEPOSIT_PAID",
            WaitlistStatus::Allocated => "ALLOCATED",
            WaitlistStatus::Completed => "COMPLETED",
            WaitlistStatus::Rejected => "REJECTED",
            WaitlistStatus::Canceled => "CANCELED",
        }
    }

    #[inline]
    pub fn is_eligible(&self) -> bool {
        Self::ELIGIBLE.contains(self)
    }
}

/// Lifecycle status of a breeding plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "breeding_plan_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Planning,
    Committed,
    Bred,
    Pregnant,
    Birthed,
    Weaned,
    PlacementStarted,
    Complete,
    Canceled,
    Unsuccessful,
}

impl PlanStatus {
    /// Statuses that end a plan's lifecycle. Plans here are never reconciled.
    pub const TERMINAL: [PlanStatus; 3] =
        [PlanStatus::Complete, PlanStatus::Canceled, PlanStatus::Unsuccessful];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Planning => "PLANNING",
            PlanStatus::Committed => "COMMITTED",
            PlanStatus::Bred => "BRED",
            PlanStatus::Pregnant => "PREGNANT",
            PlanStatus::Birthed => "BIRTHED",
            PlanStatus::Weaned => "WEANED",
            PlanStatus::PlacementStarted => "PLACEMENT_STARTED",
            PlanStatus::Complete => "COMPLETE",
            PlanStatus::Canceled => "CANCELED",
            PlanStatus::Unsuccessful => "UNSUCCESSFUL",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "species", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Species {
    Dog,
    Cat,
    Horse,
    Goat,
    Sheep,
    Rabbit,
}

/// A prospective buyer's registered interest and stated preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: DbId,
    pub tenant_id: DbId,
    pub status: WaitlistStatus,
    #[serde(default)]
    pub program_id: Option<DbId>,
    #[serde(default)]
    pub species_pref: Option<Species>,
    #[serde(default)]
    pub breed_prefs: Vec<String>,
    #[serde(default)]
    pub sire_pref_id: Option<DbId>,
    #[serde(default)]
    pub sire_pref_name: Option<String>,
    #[serde(default)]
    pub dam_pref_id: Option<DbId>,
    #[serde(default)]
    pub dam_pref_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WaitlistEntry {
    /// A parking-lot entry has no program reference and is matched tenant-wide.
    #[inline]
    pub fn is_parking_lot(&self) -> bool {
        self.program_id.is_none()
    }

    /// Breed preferences with blank strings removed
    pub fn breed_preferences(&self) -> impl Iterator<Item = &str> {
        self.breed_prefs
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
    }
}

/// Breeding program a plan belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub id: DbId,
    pub name: String,
}

/// A tracked breeding event expected to produce offspring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedingPlan {
    pub id: DbId,
    pub tenant_id: DbId,
    pub species: Species,
    #[serde(default)]
    pub breed_text: Option<String>,
    #[serde(default)]
    pub sire_id: Option<DbId>,
    #[serde(default)]
    pub dam_id: Option<DbId>,
    #[serde(default)]
    pub program: Option<ProgramRef>,
    pub status: PlanStatus,
}

impl BreedingPlan {
    #[inline]
    pub fn program_id(&self) -> Option<DbId> {
        self.program.as_ref().map(|p| p.id)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Stage of a plan/entry link. Only `PossibleMatch` rows are owned by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStage {
    PossibleMatch,
    Inquiry,
    Reserved,
    Assigned,
    Matched,
    Declined,
    #[serde(other)]
    Unknown,
}

impl LinkStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStage::PossibleMatch => "POSSIBLE_MATCH",
            LinkStage::Inquiry => "INQUIRY",
            LinkStage::Reserved => "RESERVED",
            LinkStage::Assigned => "ASSIGNED",
            LinkStage::Matched => "MATCHED",
            LinkStage::Declined => "DECLINED",
            LinkStage::Unknown => "UNKNOWN",
        }
    }

    #[inline]
    pub fn is_suggestion(&self) -> bool {
        matches!(self, LinkStage::PossibleMatch)
    }
}

impl FromStr for LinkStage {
    type Err = std::convert::Infallible;

    /// Stages written by other workflows that this crate does not know about
    /// parse as `Unknown`, which still counts as a non-suggestion stage.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "POSSIBLE_MATCH" => LinkStage::PossibleMatch,
            "INQUIRY" => LinkStage::Inquiry,
            "RESERVED" => LinkStage::Reserved,
            "ASSIGNED" => LinkStage::Assigned,
            "MATCHED" => LinkStage::Matched,
            "DECLINED" => LinkStage::Declined,
            _ => LinkStage::Unknown,
        })
    }
}

/// Why an entry was scored against a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchReason {
    ProgramMatch,
    SpeciesMatch,
    BreedMatch,
    SirePreference,
    DamPreference,
    DepositPaid,
}

impl MatchReason {
    /// Reasons that qualify a pair on their own
    pub const MEANINGFUL: [MatchReason; 4] = [
        MatchReason::ProgramMatch,
        MatchReason::BreedMatch,
        MatchReason::SirePreference,
        MatchReason::DamPreference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::ProgramMatch => "PROGRAM_MATCH",
            MatchReason::SpeciesMatch => "SPECIES_MATCH",
            MatchReason::BreedMatch => "BREED_MATCH",
            MatchReason::SirePreference => "SIRE_PREFERENCE",
            MatchReason::DamPreference => "DAM_PREFERENCE",
            MatchReason::DepositPaid => "DEPOSIT_PAID",
        }
    }

    #[inline]
    pub fn is_meaningful(&self) -> bool {
        Self::MEANINGFUL.contains(self)
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReason(pub String);

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown match reason: {}", self.0)
    }
}

impl std::error::Error for UnknownReason {}

impl FromStr for MatchReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROGRAM_MATCH" => Ok(MatchReason::ProgramMatch),
            "SPECIES_MATCH" => Ok(MatchReason::SpeciesMatch),
            "BREED_MATCH" => Ok(MatchReason::BreedMatch),
            "SIRE_PREFERENCE" => Ok(MatchReason::SirePreference),
            "DAM_PREFERENCE" => Ok(MatchReason::DamPreference),
            "DEPOSIT_PAID" => Ok(MatchReason::DepositPaid),
            other => Err(UnknownReason(other.to_string())),
        }
    }
}

/// A stored link between a plan and a waitlist entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLink {
    pub id: DbId,
    pub tenant_id: DbId,
    pub plan_id: DbId,
    pub entry_id: DbId,
    pub stage: LinkStage,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub reasons: Vec<MatchReason>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Scored candidate for one plan. Not persisted until reconciliation writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub entry_id: DbId,
    pub score: i32,
    pub reasons: Vec<MatchReason>,
}

impl MatchResult {
    #[inline]
    pub fn has_deposit(&self) -> bool {
        self.reasons.contains(&MatchReason::DepositPaid)
    }
}

/// Suggestion row to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSuggestion {
    pub plan_id: DbId,
    pub entry_id: DbId,
    pub score: i32,
    pub reasons: Vec<MatchReason>,
}

/// In-place score refresh for an existing suggestion row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionUpdate {
    pub link_id: DbId,
    pub entry_id: DbId,
    pub score: i32,
    pub reasons: Vec<MatchReason>,
}

/// Additive weights for each scoring rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub program: i32,
    pub program_from_notes: i32,
    pub species: i32,
    pub breed: i32,
    pub no_breed_preference: i32,
    pub sire: i32,
    pub dam: i32,
    pub deposit_paid: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            program: 50,
            program_from_notes: 40,
            species: 10,
            breed: 15,
            no_breed_preference: 5,
            sire: 25,
            dam: 25,
            deposit_paid: 10,
        }
    }
}
