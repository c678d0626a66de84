//! Contract and fallback tests for both SQLite journal flavors

use issuebench_core::test_support::{assert_issue_deep_eq, contract};
use issuebench_core::{ArtifactLocation, IssueGenerator, IssueRepository};
use issuebench_sqlite::{JournalMode, SqliteIssueRepository};

fn temp_repo(mode: JournalMode) -> SqliteIssueRepository {
    SqliteIssueRepository::new(mode, ArtifactLocation::Temp)
}

#[test]
fn wal_contract() {
    contract::roundtrip_single_issue(&mut temp_repo(JournalMode::Wal));
    contract::roundtrip_edge_cases(&mut temp_repo(JournalMode::Wal));
    contract::search_matches_full_scan(&mut temp_repo(JournalMode::Wal));
    contract::close_is_idempotent(
        &mut temp_repo(JournalMode::Wal),
        &mut temp_repo(JournalMode::Wal),
    );
    contract::operations_before_init_fail(&mut temp_repo(JournalMode::Wal));
}

#[test]
fn rollback_contract() {
    contract::roundtrip_single_issue(&mut temp_repo(JournalMode::Rollback));
    contract::roundtrip_edge_cases(&mut temp_repo(JournalMode::Rollback));
    contract::search_matches_full_scan(&mut temp_repo(JournalMode::Rollback));
    contract::close_is_idempotent(
        &mut temp_repo(JournalMode::Rollback),
        &mut temp_repo(JournalMode::Rollback),
    );
    contract::operations_before_init_fail(&mut temp_repo(JournalMode::Rollback));
}

#[test]
fn search_without_rule_index_still_filters() {
    let mut repo = temp_repo(JournalMode::Wal);
    repo.init().unwrap();

    let data = IssueGenerator::new(9, ["java:S100", "java:S101"])
        .unwrap()
        .generate(120);
    repo.insert_all(&data).unwrap();

    repo.pool()
        .unwrap()
        .with_connection(|conn| {
            conn.execute_batch("DROP INDEX idx_issues_rule_key;")?;
            Ok(())
        })
        .unwrap();

    let expected = data.iter().filter(|i| i.rule_key == "java:S101").count();
    let found = repo.search_by_rule("java:S101").unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|i| i.rule_key == "java:S101"));

    repo.close();
}

#[test]
fn corrupted_details_degrade_to_empty_nested_fields() {
    let mut repo = temp_repo(JournalMode::Wal);
    repo.init().unwrap();

    let issue = IssueGenerator::with_defaults().generate(1).remove(0);
    repo.insert_all(std::slice::from_ref(&issue)).unwrap();

    repo.pool()
        .unwrap()
        .with_connection(|conn| {
            conn.execute(
                "UPDATE issues SET details = 'X|not a record' WHERE id = ?1",
                [&issue.id],
            )?;
            Ok(())
        })
        .unwrap();

    let fetched = repo.get_by_id(&issue.id).unwrap().unwrap();
    assert_eq!(fetched.rule_key, issue.rule_key);
    assert_eq!(fetched.tags, issue.tags);
    assert!(fetched.primary_location.is_none());
    assert!(fetched.flows.is_empty());
    assert!(fetched.quick_fixes.is_empty());

    repo.close();
}

#[test]
fn generated_batch_roundtrips_through_read_all() {
    let mut repo = temp_repo(JournalMode::Rollback);
    repo.init().unwrap();

    let data = IssueGenerator::with_defaults().generate(50);
    repo.insert_all(&data).unwrap();

    let mut stored = repo.read_all().unwrap();
    stored.sort_by(|a, b| a.id.cmp(&b.id));
    let mut expected = data.clone();
    expected.sort_by(|a, b| a.id.cmp(&b.id));

    for (ex, ac) in expected.iter().zip(&stored) {
        assert_issue_deep_eq(ex, ac);
    }

    repo.close();
}
