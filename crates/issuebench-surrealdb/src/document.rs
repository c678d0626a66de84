//! Mapping between [`Issue`] and its stored document

use issuebench_core::{Issue, IssueFlow, IssueLocation, QuickFix, RepositoryError, Severity};
use serde::{Deserialize, Serialize};

/// Table holding one document per issue
pub const TABLE: &str = "issue";

/// Fields selected when reading documents back; leaves out the record id
pub const FIELDS: &str = "issue_id, rule_key, severity, message, file_path, line, \
     creation_date, assignee, tags, primary_location, flows, quick_fixes";

/// Table and index definitions, safe to run on every open
pub const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS issue SCHEMALESS;
DEFINE INDEX IF NOT EXISTS issue_rule ON issue FIELDS rule_key;
DEFINE INDEX IF NOT EXISTS issue_key ON issue FIELDS issue_id UNIQUE;
"#;

/// Stored form of an issue
///
/// The issue id lives in `issue_id`; the record id is left to SurrealDB so
/// arbitrary id strings never need escaping. Nested fields are stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDocument {
    pub issue_id: String,
    pub rule_key: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    pub creation_date: i64,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub primary_location: Option<IssueLocation>,
    #[serde(default)]
    pub flows: Vec<IssueFlow>,
    #[serde(default)]
    pub quick_fixes: Vec<QuickFix>,
}

impl From<&Issue> for IssueDocument {
    fn from(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id.clone(),
            rule_key: issue.rule_key.clone(),
            severity: issue.severity.as_str().to_string(),
            message: issue.message.clone(),
            file_path: issue.file_path.clone(),
            line: issue.line,
            creation_date: issue.creation_date,
            assignee: issue.assignee.clone(),
            tags: issue.tags.clone(),
            primary_location: issue.primary_location.clone(),
            flows: issue.flows.clone(),
            quick_fixes: issue.quick_fixes.clone(),
        }
    }
}

impl TryFrom<IssueDocument> for Issue {
    type Error = RepositoryError;

    fn try_from(doc: IssueDocument) -> Result<Self, Self::Error> {
        let severity: Severity = doc.severity.parse()?;
        Ok(Issue {
            id: doc.issue_id,
            rule_key: doc.rule_key,
            severity,
            message: doc.message,
            file_path: doc.file_path,
            line: doc.line,
            creation_date: doc.creation_date,
            assignee: doc.assignee,
            tags: doc.tags,
            primary_location: doc.primary_location,
            flows: doc.flows,
            quick_fixes: doc.quick_fixes,
        })
    }
}
