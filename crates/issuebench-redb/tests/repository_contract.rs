//! Contract and index-fallback tests for the redb adapter

use issuebench_core::test_support::contract;
use issuebench_core::{ArtifactLocation, Issue, IssueGenerator, IssueRepository};
use issuebench_redb::{RedbIssueRepository, Tables};
use tempfile::TempDir;

fn temp_repo() -> RedbIssueRepository {
    RedbIssueRepository::new(ArtifactLocation::Temp)
}

fn seeded_repo() -> (RedbIssueRepository, Vec<Issue>) {
    let mut repo = temp_repo();
    repo.init().unwrap();
    let data = IssueGenerator::new(11, ["java:S100", "java:S101", "java:S106"])
        .unwrap()
        .generate(150);
    repo.insert_all(&data).unwrap();
    (repo, data)
}

fn assert_search_matches(repo: &RedbIssueRepository, data: &[Issue], key: &str) {
    let expected = data.iter().filter(|i| i.rule_key == key).count();
    let found = repo.search_by_rule(key).unwrap();
    assert_eq!(found.len(), expected, "cardinality for {key}");
    assert!(found.iter().all(|i| i.rule_key == key));
}

#[test]
fn redb_contract() {
    contract::roundtrip_single_issue(&mut temp_repo());
    contract::roundtrip_edge_cases(&mut temp_repo());
    contract::search_matches_full_scan(&mut temp_repo());
    contract::close_is_idempotent(&mut temp_repo(), &mut temp_repo());
    contract::operations_before_init_fail(&mut temp_repo());
}

#[test]
fn search_falls_back_when_index_table_deleted() {
    let (mut repo, data) = seeded_repo();

    let db = repo.database().unwrap();
    let txn = db.begin_write().unwrap();
    assert!(txn.delete_multimap_table(Tables::RULE_INDEX).unwrap());
    txn.commit().unwrap();

    assert_search_matches(&repo, &data, "java:S101");
    repo.close();
}

#[test]
fn search_falls_back_when_index_emptied() {
    let (mut repo, data) = seeded_repo();

    let db = repo.database().unwrap();
    let txn = db.begin_write().unwrap();
    txn.delete_multimap_table(Tables::RULE_INDEX).unwrap();
    txn.open_multimap_table(Tables::RULE_INDEX).unwrap();
    txn.commit().unwrap();

    for key in ["java:S100", "java:S101", "java:S106", "java:S999"] {
        assert_search_matches(&repo, &data, key);
    }
    repo.close();
}

#[test]
fn reopen_sees_previous_writes() {
    let dir = TempDir::new().unwrap();
    let location = ArtifactLocation::path(dir.path().join("nested/issues.redb"));
    let data = IssueGenerator::with_defaults().generate(40);

    let mut first = RedbIssueRepository::new(location.clone());
    first.init().unwrap();
    first.insert_all(&data).unwrap();
    first.close();

    let mut second = RedbIssueRepository::new(location);
    second.init().unwrap();
    assert_eq!(second.read_all().unwrap().len(), 40);
    assert!(second.integrity_check().unwrap().is_ok());
    second.close();

    assert!(dir.path().join("nested/issues.redb").exists());
}

#[test]
fn duplicate_id_is_rejected_and_index_unchanged() {
    let mut repo = temp_repo();
    repo.init().unwrap();

    let mut original = IssueGenerator::with_defaults().generate(1).remove(0);
    original.rule_key = "java:S100".to_string();
    repo.insert_all(std::slice::from_ref(&original)).unwrap();

    let mut moved = original.clone();
    moved.rule_key = "java:S101".to_string();
    let mut chunk = IssueGenerator::new(5, ["java:S101"]).unwrap().generate(3);
    chunk.push(moved);

    let err = repo.insert_all(&chunk).unwrap_err();
    assert_eq!(err.classification(), "BackendError");
    assert!(err.to_string().contains(&original.id));

    // The failed chunk left nothing behind
    assert_eq!(repo.read_all().unwrap().len(), 1);
    assert!(repo.search_by_rule("java:S101").unwrap().is_empty());

    let found = repo.search_by_rule("java:S100").unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].deep_eq(&original));
    repo.close();
}

#[test]
fn stale_index_entries_are_filtered_from_search() {
    let (mut repo, data) = seeded_repo();
    let victim = data.iter().find(|i| i.rule_key == "java:S100").unwrap();

    // Point a second rule at an issue stored under java:S100
    let db = repo.database().unwrap();
    let txn = db.begin_write().unwrap();
    {
        let mut index = txn.open_multimap_table(Tables::RULE_INDEX).unwrap();
        index.insert("java:S101", victim.id.as_str()).unwrap();
    }
    txn.commit().unwrap();

    assert_search_matches(&repo, &data, "java:S101");
    assert_search_matches(&repo, &data, "java:S100");
    repo.close();
}
