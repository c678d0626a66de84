//! Contract checks shared by every backend's test suite
//!
//! Each adapter crate runs these against its own repository so all backends
//! are held to the same round-trip, search and lifecycle guarantees.
//!
//! ```rust,ignore
//! use issuebench_core::test_support::contract;
//!
//! let mut repo = MyRepository::new(ArtifactLocation::Temp);
//! contract::roundtrip_single_issue(&mut repo);
//! ```

use crate::model::{Issue, IssueLocation};

/// Panic with a field path when two issues differ anywhere
pub fn assert_issue_deep_eq(expected: &Issue, actual: &Issue) {
    assert_eq!(expected.id, actual.id, "id");
    assert_eq!(expected.rule_key, actual.rule_key, "rule_key");
    assert_eq!(expected.severity, actual.severity, "severity");
    assert_eq!(expected.message, actual.message, "message");
    assert_eq!(expected.file_path, actual.file_path, "file_path");
    assert_eq!(expected.line, actual.line, "line");
    assert_eq!(expected.creation_date, actual.creation_date, "creation_date");
    assert_eq!(expected.assignee, actual.assignee, "assignee");
    assert_eq!(expected.tags, actual.tags, "tags");

    assert_location_eq(
        expected.primary_location.as_ref(),
        actual.primary_location.as_ref(),
        "primary_location",
    );

    assert_eq!(expected.flows.len(), actual.flows.len(), "flows.len");
    for (i, (ex, ac)) in expected.flows.iter().zip(&actual.flows).enumerate() {
        assert_eq!(
            ex.locations.len(),
            ac.locations.len(),
            "flows[{i}].locations.len"
        );
        for (j, (el, al)) in ex.locations.iter().zip(&ac.locations).enumerate() {
            assert_location_eq(Some(el), Some(al), &format!("flows[{i}].locations[{j}]"));
        }
    }

    assert_eq!(
        expected.quick_fixes.len(),
        actual.quick_fixes.len(),
        "quick_fixes.len"
    );
    for (i, (ex, ac)) in expected.quick_fixes.iter().zip(&actual.quick_fixes).enumerate() {
        assert_eq!(ex.message, ac.message, "quick_fixes[{i}].message");
        assert_eq!(
            ex.locations.len(),
            ac.locations.len(),
            "quick_fixes[{i}].locations.len"
        );
        for (j, (el, al)) in ex.locations.iter().zip(&ac.locations).enumerate() {
            assert_location_eq(
                Some(el),
                Some(al),
                &format!("quick_fixes[{i}].locations[{j}]"),
            );
        }
    }
}

fn assert_location_eq(expected: Option<&IssueLocation>, actual: Option<&IssueLocation>, ctx: &str) {
    match (expected, actual) {
        (None, None) => {}
        (Some(ex), Some(ac)) => {
            assert_eq!(ex.file_path, ac.file_path, "{ctx}.file_path");
            assert_eq!(ex.start_line, ac.start_line, "{ctx}.start_line");
            assert_eq!(ex.end_line, ac.end_line, "{ctx}.end_line");
            assert_eq!(ex.start_offset, ac.start_offset, "{ctx}.start_offset");
            assert_eq!(ex.end_offset, ac.end_offset, "{ctx}.end_offset");
            assert_eq!(ex.message, ac.message, "{ctx}.message");
        }
        (ex, ac) => panic!("{ctx}: expected {ex:?}, got {ac:?}"),
    }
}

/// An issue exercising every awkward corner of the model: delimiters in
/// text, empty vs. absent strings, zero vs. absent integers, empty flows
pub fn edge_case_issue(id: &str) -> Issue {
    use crate::model::{IssueFlow, QuickFix, Severity};

    let mut issue = Issue::new(
        id,
        "java:S1234",
        Severity::Blocker,
        "pipes | semis ; newline\n tilde ~ comma , quote ' \"",
        Some("src/a|b;c.java".to_string()),
        None,
        0,
    )
    .with_tags(vec![
        "with,comma".to_string(),
        String::new(),
        "bug".to_string(),
        "bug".to_string(),
    ]);
    issue.primary_location = Some(IssueLocation {
        file_path: None,
        start_line: Some(0),
        end_line: None,
        start_offset: Some(0),
        end_offset: None,
        message: Some(String::new()),
    });
    issue.flows = vec![
        IssueFlow::default(),
        IssueFlow::new(vec![
            IssueLocation::lines("F;L|x", 1, 2, "step|1"),
            IssueLocation::default(),
        ]),
    ];
    issue.quick_fixes = vec![
        QuickFix::new("", vec![]),
        QuickFix::new("Q;fix\n", vec![IssueLocation::lines("y", 3, 3, "").with_offsets(0, 0)]),
    ];
    issue
}

/// Contract checks run against a freshly constructed repository
pub mod contract {
    use std::collections::HashSet;

    use super::{assert_issue_deep_eq, edge_case_issue};
    use crate::generator::IssueGenerator;
    use crate::repository::IssueRepository;

    /// Insert one generated issue and fetch it back by id
    pub fn roundtrip_single_issue(repo: &mut dyn IssueRepository) {
        let mut generator = IssueGenerator::new(123, ["java:S100", "java:S101"]).unwrap();
        let input = generator.generate(1).remove(0);

        repo.init().expect("init");
        repo.insert_all(std::slice::from_ref(&input)).expect("insert");
        let fetched = repo
            .get_by_id(&input.id)
            .expect("get_by_id")
            .expect("fetched issue must exist");
        assert_issue_deep_eq(&input, &fetched);
        assert!(repo.get_by_id("no-such-id").expect("get_by_id").is_none());
        repo.close();
    }

    /// Round-trip the hand-built edge case issue
    pub fn roundtrip_edge_cases(repo: &mut dyn IssueRepository) {
        let input = edge_case_issue("edge-1");

        repo.init().expect("init");
        repo.insert_all(std::slice::from_ref(&input)).expect("insert");
        let fetched = repo
            .get_by_id(&input.id)
            .expect("get_by_id")
            .expect("fetched issue must exist");
        assert_issue_deep_eq(&input, &fetched);
        repo.close();
    }

    /// `read_all` returns everything and `search_by_rule` equals a scan filter
    pub fn search_matches_full_scan(repo: &mut dyn IssueRepository) {
        let mut generator = IssueGenerator::new(7, ["java:S100", "java:S101", "java:S106"]).unwrap();
        let data = generator.generate(250);

        repo.init().expect("init");
        repo.insert_all(&data[..100]).expect("insert first chunk");
        repo.insert_all(&data[100..]).expect("insert second chunk");

        let all = repo.read_all().expect("read_all");
        assert_eq!(all.len(), data.len());
        let ids: HashSet<_> = all.iter().map(|i| i.id.clone()).collect();
        assert!(data.iter().all(|i| ids.contains(&i.id)));

        for key in ["java:S100", "java:S101", "java:S106", "java:S999"] {
            let expected: HashSet<_> = data
                .iter()
                .filter(|i| i.rule_key == key)
                .map(|i| i.id.clone())
                .collect();
            let found = repo.search_by_rule(key).expect("search");
            assert_eq!(found.len(), expected.len(), "cardinality for {key}");
            assert!(found.iter().all(|i| i.rule_key == key));
            assert!(found.iter().all(|i| expected.contains(&i.id)));
        }
        repo.close();
    }

    /// `close` twice, and `close` without `init`, must not panic
    pub fn close_is_idempotent(fresh: &mut dyn IssueRepository, used: &mut dyn IssueRepository) {
        fresh.close();
        fresh.close();

        used.init().expect("init");
        used.close();
        used.close();
    }

    /// Operations before `init` fail instead of panicking
    pub fn operations_before_init_fail(repo: &mut dyn IssueRepository) {
        assert!(repo.read_all().is_err());
        assert!(repo.search_by_rule("java:S100").is_err());
        assert!(repo.get_by_id("x").is_err());
    }
}
