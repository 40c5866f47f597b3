use crate::core::program_note::notes_reference_program;
use crate::models::{
    BreedingPlan, DbId, MatchReason, ScoringWeights, WaitlistEntry, WaitlistStatus,
};

/// Score a waitlist entry against a breeding plan
///
/// Rules are additive and evaluated in a fixed order, so the reason list is
/// always ordered and free of duplicates:
///
/// | rule | reason | default |
/// |---|---|---|
/// | explicit program reference equals plan program | PROGRAM_MATCH | 50 |
/// | no program reference, notes `Program: <name>` equals plan program name | PROGRAM_MATCH | 40 |
/// | no species preference, or preference equals plan species | SPECIES_MATCH | 10 |
/// | a breed preference is a substring of the plan breed | BREED_MATCH | 15 |
/// | no breed preference at all | - | 5 |
/// | sire preference equals plan sire | SIRE_PREFERENCE | 25 |
/// | dam preference equals plan dam | DAM_PREFERENCE | 25 |
/// | entry status is deposit-paid | DEPOSIT_PAID | 10 |
pub fn score_entry(
    entry: &WaitlistEntry,
    plan: &BreedingPlan,
    weights: &ScoringWeights,
) -> (i32, Vec<MatchReason>) {
    let mut score = 0;
    let mut reasons = Vec::with_capacity(4);

    // Program: an explicit reference always wins over the notes fallback
    if let Some(points) = program_points(entry, plan, weights) {
        score += points;
        reasons.push(MatchReason::ProgramMatch);
    }

    if entry.species_pref.map_or(true, |s| s == plan.species) {
        score += weights.species;
        reasons.push(MatchReason::SpeciesMatch);
    }

    match breed_match(entry, plan) {
        BreedOutcome::Matched => {
            score += weights.breed;
            reasons.push(MatchReason::BreedMatch);
        }
        BreedOutcome::NoPreference => score += weights.no_breed_preference,
        BreedOutcome::Mismatch => {}
    }

    if same_animal(entry.sire_pref_id, plan.sire_id) {
        score += weights.sire;
        reasons.push(MatchReason::SirePreference);
    }

    if same_animal(entry.dam_pref_id, plan.dam_id) {
        score += weights.dam;
        reasons.push(MatchReason::DamPreference);
    }

    if entry.status == WaitlistStatus::DepositPaid {
        score += weights.deposit_paid;
        reasons.push(MatchReason::DepositPaid);
    }

    (score, reasons)
}

#[inline]
fn program_points(entry: &WaitlistEntry, plan: &BreedingPlan, weights: &ScoringWeights) -> Option<i32> {
    let program = plan.program.as_ref()?;
    match entry.program_id {
        Some(program_id) => (program_id == program.id).then_some(weights.program),
        None => entry
            .notes
            .as_deref()
            .filter(|notes| notes_reference_program(notes, &program.name))
            .map(|_| weights.program_from_notes),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreedOutcome {
    Matched,
    Mismatch,
    NoPreference,
}

#[inline]
fn breed_match(entry: &WaitlistEntry, plan: &BreedingPlan) -> BreedOutcome {
    let mut prefs = entry.breed_preferences().peekable();
    if prefs.peek().is_none() {
        return BreedOutcome::NoPreference;
    }

    let breed = match plan.breed_text.as_deref() {
        Some(text) if !text.trim().is_empty() => text.to_lowercase(),
        _ => return BreedOutcome::Mismatch,
    };

    if prefs.any(|pref| breed.contains(&pref.to_lowercase())) {
        BreedOutcome::Matched
    } else {
        BreedOutcome::Mismatch
    }
}

#[inline]
fn same_animal(preferred: Option<DbId>, actual: Option<DbId>) -> bool {
    matches!((preferred, actual), (Some(p), Some(a)) if p == a)
}
