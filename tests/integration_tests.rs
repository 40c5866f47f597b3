// Integration tests for Breeder Match

use std::sync::Arc;
use breeder_match::core::{filters::is_meaningful, Matcher, Reconciler};
use breeder_match::models::{
    BatchSummary, BreedingPlan, DbId, LinkStage, MatchReason, PlanStatus, ProgramRef, RefreshSummary, Species,
    WaitlistEntry, WaitlistStatus,
};
use breeder_match::services::InMemoryStore;

const TENANT: DbId = 1;

fn create_test_entry(id: DbId, program_id: Option<DbId>, breeds: &[&str]) -> WaitlistEntry {
    WaitlistEntry {
        id,
        tenant_id: TENANT,
        status: WaitlistStatus::Approved,
        program_id,
        species_pref: Some(Species::Dog),
        breed_prefs: breeds.iter().map(|b| b.to_string()).collect(),
        sire_pref_id: None,
        sire_pref_name: None,
        dam_pref_id: None,
        dam_pref_name: None,
        notes: None,
    }
}

fn create_test_plan(id: DbId, program_id: DbId, breed: &str) -> BreedingPlan {
    BreedingPlan {
        id,
        tenant_id: TENANT,
        species: Species::Dog,
        breed_text: Some(breed.to_string()),
        sire_id: Some(id * 10),
        dam_id: Some(id * 10 + 1),
        program: Some(ProgramRef { id: program_id, name: format!("Program {}", program_id) }),
        status: PlanStatus::Committed,
    }
}

/// Two programs, three active plans, one terminal plan and a mix of entries
async fn seed(store: &InMemoryStore) {
    store.put_plan(create_test_plan(10, 1, "Golden Retriever")).await;
    store.put_plan(create_test_plan(11, 1, "Labrador Retriever")).await;
    store.put_plan(create_test_plan(12, 2, "Border Collie")).await;
    let mut done = create_test_plan(13, 1, "Golden Retriever");
    done.status = PlanStatus::Complete;
    store.put_plan(done).await;

    store.put_entry(create_test_entry(100, Some(1), &[])).await;
    store.put_entry(create_test_entry(101, Some(1), &["golden"])).await;
    store.put_entry(create_test_entry(102, None, &["collie"])).await;
    store.put_entry(create_test_entry(103, None, &[])).await; // species only, never meaningful
    let mut paid = create_test_entry(104, Some(2), &[]);
    paid.status = WaitlistStatus::DepositPaid;
    store.put_entry(paid).await;
    let mut pending = create_test_entry(105, Some(1), &["golden"]);
    pending.status = WaitlistStatus::Pending;
    store.put_entry(pending).await;
}

async fn seeded_reconciler() -> Reconciler<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    seed(&store).await;
    Reconciler::new(store, Matcher::with_default_weights())
}

/// (plan, entry, score, reasons) for every suggestion row, sorted
async fn suggestion_set(store: &InMemoryStore) -> Vec<(DbId, DbId, Option<i32>, Vec<MatchReason>)> {
    let mut rows: Vec<_> = store
        .links()
        .await
        .into_iter()
        .filter(|l| l.stage.is_suggestion())
        .map(|l| (l.plan_id, l.entry_id, l.score, l.reasons))
        .collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let reconciler = seeded_reconciler().await;

    let first = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(first, RefreshSummary { added: 2, removed: 0, updated: 0 });

    let second = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(second, RefreshSummary { added: 0, removed: 0, updated: 0 });
}

#[tokio::test]
async fn test_preview_is_deterministic_and_read_only() {
    let reconciler = seeded_reconciler().await;

    let first = reconciler.find_possible_matches(10, TENANT).await.unwrap();
    let second = reconciler.find_possible_matches(10, TENANT).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(reconciler.store().writes(), 0);
    // 101: program + species + breed (75), 100: program + species + no breed (65)
    let ids: Vec<DbId> = first.iter().map(|m| m.entry_id).collect();
    assert_eq!(ids, vec![101, 100]);
    assert_eq!(first[0].score, 75);
    assert_eq!(first[1].score, 65);
}

#[tokio::test]
async fn test_every_match_has_meaningful_reason() {
    let reconciler = seeded_reconciler().await;

    for plan_id in [10, 11, 12] {
        let matches = reconciler.find_possible_matches(plan_id, TENANT).await.unwrap();
        assert!(matches.iter().all(|m| m.score > 0 && is_meaningful(&m.reasons)));
        assert!(matches.iter().all(|m| m.entry_id != 103 && m.entry_id != 105));
    }
}

#[tokio::test]
async fn test_confirmed_entry_excluded_and_untouched() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    let assigned = store.put_link(TENANT, 10, 101, LinkStage::Assigned, None).await;

    let matches = reconciler.find_possible_matches(10, TENANT).await.unwrap();
    assert!(matches.iter().all(|m| m.entry_id != 101));

    reconciler.refresh_plan_matches(10, TENANT).await.unwrap();

    let links = store.links().await;
    let confirmed = links.iter().find(|l| l.id == assigned).unwrap();
    assert_eq!(confirmed.stage, LinkStage::Assigned);
    assert!(links
        .iter()
        .all(|l| !(l.plan_id == 10 && l.entry_id == 101 && l.stage.is_suggestion())));
}

#[tokio::test]
async fn test_promoted_suggestion_is_never_resuggested() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    reconciler.refresh_plan_matches(10, TENANT).await.unwrap();

    let row = store
        .suggestions_for_plan(10)
        .await
        .into_iter()
        .find(|l| l.entry_id == 100)
        .unwrap();
    store.set_link_stage(row.id, LinkStage::Reserved).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert!(summary.is_noop());
    assert!(store.suggestions_for_plan(10).await.iter().all(|l| l.entry_id != 100));
}

#[tokio::test]
async fn test_score_change_updates_in_place() {
    let store = Arc::new(InMemoryStore::new());
    store.put_plan(create_test_plan(10, 1, "Golden Retriever")).await;

    // species + no breed preference + sire = 40
    let mut e = create_test_entry(200, Some(7), &[]);
    e.sire_pref_id = Some(100);
    store.put_entry(e.clone()).await;

    let reconciler = Reconciler::new(store.clone(), Matcher::with_default_weights());
    reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    let before = store.suggestions_for_plan(10).await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].score, Some(40));

    // program + species + no breed preference = 65
    e.program_id = Some(1);
    e.sire_pref_id = None;
    store.put_entry(e).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(summary, RefreshSummary { added: 0, removed: 0, updated: 1 });

    let after = store.suggestions_for_plan(10).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].score, Some(65));
    assert_eq!(after[0].reasons, vec![MatchReason::ProgramMatch, MatchReason::SpeciesMatch]);
    assert!(after[0].updated_at.is_some());
}

#[tokio::test]
async fn test_row_promoted_before_update_is_not_counted() {
    let store = Arc::new(InMemoryStore::new());
    store.put_plan(create_test_plan(10, 1, "Golden Retriever")).await;
    let mut e = create_test_entry(200, Some(7), &[]);
    e.sire_pref_id = Some(100);
    store.put_entry(e.clone()).await;

    let reconciler = Reconciler::new(store.clone(), Matcher::with_default_weights());
    reconciler.refresh_plan_matches(10, TENANT).await.unwrap();

    e.program_id = Some(1);
    store.put_entry(e).await;
    store.promote_next_update(LinkStage::Reserved).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(summary, RefreshSummary { added: 0, removed: 0, updated: 0 });

    let links = store.links().await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].stage, LinkStage::Reserved);
    assert_eq!(links[0].score, Some(40));
}

#[tokio::test]
async fn test_status_change_drops_suggestion() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    reconciler.refresh_plan_matches(10, TENANT).await.unwrap();

    let mut e = create_test_entry(101, Some(1), &["golden"]);
    e.status = WaitlistStatus::Rejected;
    store.put_entry(e).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(summary, RefreshSummary { added: 0, removed: 1, updated: 0 });
    assert!(store.suggestions_for_plan(10).await.iter().all(|l| l.entry_id != 101));
}

#[tokio::test]
async fn test_missing_or_terminal_plan_is_noop() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    store.put_link(TENANT, 13, 100, LinkStage::PossibleMatch, Some(5)).await;

    assert!(reconciler.refresh_plan_matches(999, TENANT).await.unwrap().is_noop());
    assert!(reconciler.refresh_plan_matches(13, TENANT).await.unwrap().is_noop());
    assert!(reconciler.find_possible_matches(999, TENANT).await.unwrap().is_empty());
    assert_eq!(store.suggestions_for_plan(13).await.len(), 1);

    reconciler.refresh_matching_plans_for_entry(999, TENANT).await.unwrap();
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_other_tenant_is_invisible() {
    let reconciler = seeded_reconciler().await;

    assert!(reconciler.refresh_plan_matches(10, 2).await.unwrap().is_noop());
    assert!(reconciler.find_possible_matches(10, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_matches_sequential_single_entry_refreshes() {
    let batch = seeded_reconciler().await;
    let sequential = seeded_reconciler().await;
    let changed: Vec<DbId> = vec![100, 101, 102, 103, 104, 105];

    let summary = batch
        .refresh_matching_plans_for_entries(&changed, TENANT)
        .await
        .unwrap();
    for id in &changed {
        sequential.refresh_matching_plans_for_entry(*id, TENANT).await.unwrap();
    }

    let batch_rows = suggestion_set(batch.store()).await;
    assert_eq!(batch_rows, suggestion_set(sequential.store()).await);
    assert_eq!(summary.plans_refreshed, 3);
    assert_eq!(summary.added, batch_rows.len());
    assert!(batch_rows.iter().all(|(plan_id, _, _, _)| *plan_id != 13));
}

#[tokio::test]
async fn test_batch_reads_do_not_grow_with_plans() {
    let store = Arc::new(InMemoryStore::new());
    for plan_id in 1..=25 {
        store.put_plan(create_test_plan(plan_id, 1, "Golden Retriever")).await;
    }
    for entry_id in 100..140 {
        store.put_entry(create_test_entry(entry_id, Some(1), &["golden"])).await;
    }
    let reconciler = Reconciler::new(store.clone(), Matcher::with_default_weights());
    let ids: Vec<DbId> = (100..140).collect();

    let summary = reconciler.refresh_matching_plans_for_entries(&ids, TENANT).await.unwrap();

    assert_eq!(summary.plans_refreshed, 25);
    assert_eq!(summary.added, 25 * 40);
    // entries, active plans, suggested plans, eligible entries, links
    assert_eq!(store.reads(), 5);
    // one bulk insert per plan
    assert_eq!(store.writes(), 25);
}

#[tokio::test]
async fn test_single_entry_reads_do_not_grow_with_plans() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();

    // parking-lot entry, reaches every active plan
    reconciler.refresh_matching_plans_for_entry(102, TENANT).await.unwrap();

    assert_eq!(store.reads(), 5);
    let rows = suggestion_set(store).await;
    assert!(rows.iter().any(|(plan_id, entry_id, _, _)| (*plan_id, *entry_id) == (12, 102)));
    assert!(rows.iter().all(|(plan_id, entry_id, _, _)| *entry_id != 102 || *plan_id == 12));
}

#[tokio::test]
async fn test_batch_deduplicates_plans_and_ids() {
    let reconciler = seeded_reconciler().await;

    let summary = reconciler
        .refresh_matching_plans_for_entries(&[100, 101, 100, 101], TENANT)
        .await
        .unwrap();

    assert_eq!(summary.plans_refreshed, 2); // plans 10 and 11 of program 1
    let empty = reconciler
        .refresh_matching_plans_for_entries(&[], TENANT)
        .await
        .unwrap();
    assert_eq!(empty, BatchSummary::default());
}

#[tokio::test]
async fn test_program_move_clears_stale_suggestion() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    reconciler.refresh_matching_plans_for_entries(&[100], TENANT).await.unwrap();
    assert!(store.suggestions_for_plan(10).await.iter().any(|l| l.entry_id == 100));

    store.put_entry(create_test_entry(100, Some(2), &[])).await;
    reconciler.refresh_matching_plans_for_entries(&[100], TENANT).await.unwrap();

    assert!(store.suggestions_for_plan(10).await.iter().all(|l| l.entry_id != 100));
    assert!(store.suggestions_for_plan(12).await.iter().any(|l| l.entry_id == 100));
}

#[tokio::test]
async fn test_load_failure_writes_nothing() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    store.fail_reads(true).await;

    let result = reconciler
        .refresh_matching_plans_for_entries(&[100, 102], TENANT)
        .await;

    assert!(result.is_err());
    assert_eq!(store.writes(), 0);
    assert!(store.links().await.is_empty());
}

#[tokio::test]
async fn test_write_failure_keeps_completed_plans() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    store.fail_writes_for_plan(Some(11)).await;

    let result = reconciler
        .refresh_matching_plans_for_entries(&[100, 101], TENANT)
        .await;

    assert!(result.is_err());
    assert!(!store.suggestions_for_plan(10).await.is_empty());
    assert!(store.suggestions_for_plan(11).await.is_empty());

    store.fail_writes_for_plan(None).await;
    let retry = reconciler
        .refresh_matching_plans_for_entries(&[100, 101], TENANT)
        .await
        .unwrap();
    assert!(retry.added > 0);
    assert!(!store.suggestions_for_plan(11).await.is_empty());
}

#[tokio::test]
async fn test_racing_insert_is_benign() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    store.race_next_insert(&[100, 101]).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();
    assert_eq!(summary.added, 0);
    assert_eq!(store.suggestions_for_plan(10).await.len(), 2);

    assert!(reconciler.refresh_plan_matches(10, TENANT).await.unwrap().is_noop());
}

#[tokio::test]
async fn test_partially_raced_insert_keeps_remaining_rows() {
    let reconciler = seeded_reconciler().await;
    let store = reconciler.store();
    store.put_entry(create_test_entry(106, Some(1), &["retriever"])).await;
    store.race_next_insert(&[101]).await;

    let summary = reconciler.refresh_plan_matches(10, TENANT).await.unwrap();

    assert_eq!(summary, RefreshSummary { added: 2, removed: 0, updated: 0 });
    let stored: Vec<DbId> = store
        .suggestions_for_plan(10)
        .await
        .iter()
        .map(|l| l.entry_id)
        .collect();
    assert_eq!(stored, vec![100, 101, 106]);
    assert!(reconciler.refresh_plan_matches(10, TENANT).await.unwrap().is_noop());
}

#[tokio::test]
async fn test_concurrent_refreshes_of_same_plan() {
    let reconciler = seeded_reconciler().await;
    let other = reconciler.clone();

    let (a, b) = tokio::join!(
        reconciler.refresh_plan_matches(10, TENANT),
        other.refresh_plan_matches(10, TENANT)
    );
    a.unwrap();
    b.unwrap();

    let rows = reconciler.store().suggestions_for_plan(10).await;
    let mut entry_ids: Vec<DbId> = rows.iter().map(|l| l.entry_id).collect();
    entry_ids.dedup();
    assert_eq!(entry_ids.len(), rows.len());
    assert_eq!(rows.len(), 2);
}
