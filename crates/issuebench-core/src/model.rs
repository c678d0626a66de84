//! Issue record model
//!
//! The nested entity graph that is generated, stored and verified:
//!
//! - [`Issue`] - the record itself, keyed by an opaque `id`
//! - [`IssueLocation`] - a span in a file, every positional field optional
//! - [`IssueFlow`] - an ordered reporting path of locations
//! - [`QuickFix`] - a suggested fix with the locations it touches
//!
//! Equality on [`Issue`] is identity equality (by `id`). Use
//! [`Issue::deep_eq`] when every field must match, e.g. after a round trip
//! through a backend.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

// ============================================================================
// Severity
// ============================================================================

/// Issue severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
}

impl Severity {
    /// Every severity, in declaration order
    pub const ALL: [Severity; 5] = [
        Severity::Blocker,
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Info,
    ];

    /// Stable textual form used by scalar-column backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RepositoryError::Serialization(format!("unknown severity: {s}")))
    }
}

// ============================================================================
// Locations, flows, quick fixes
// ============================================================================

/// A location of an issue in a file
///
/// Absence of any positional field is meaningful and distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLocation {
    pub file_path: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub start_offset: Option<u32>,
    pub end_offset: Option<u32>,
    pub message: Option<String>,
}

impl IssueLocation {
    /// Location spanning whole lines, without offsets
    pub fn lines(
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_path: Some(file_path.into()),
            start_line: Some(start_line),
            end_line: Some(end_line),
            start_offset: None,
            end_offset: None,
            message: Some(message.into()),
        }
    }

    /// Builder-style: set both offsets
    #[must_use]
    pub fn with_offsets(mut self, start: u32, end: u32) -> Self {
        self.start_offset = Some(start);
        self.end_offset = Some(end);
        self
    }
}

/// One reporting path (e.g. a taint flow)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFlow {
    pub locations: Vec<IssueLocation>,
}

impl IssueFlow {
    pub fn new(locations: Vec<IssueLocation>) -> Self {
        Self { locations }
    }
}

/// A suggested fix and the locations it edits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickFix {
    pub message: String,
    pub locations: Vec<IssueLocation>,
}

impl QuickFix {
    pub fn new(message: impl Into<String>, locations: Vec<IssueLocation>) -> Self {
        Self {
            message: message.into(),
            locations,
        }
    }
}

// ============================================================================
// Issue
// ============================================================================

/// A static-analysis issue with primary location, flows and quick fixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier, immutable after creation
    pub id: String,
    pub rule_key: String,
    pub severity: Severity,
    pub message: String,

    /// Legacy flat location, kept alongside `primary_location`
    pub file_path: Option<String>,
    pub line: Option<u32>,

    /// Creation time in epoch milliseconds
    pub creation_date: i64,
    pub assignee: Option<String>,
    pub tags: Vec<String>,

    pub primary_location: Option<IssueLocation>,
    pub flows: Vec<IssueFlow>,
    pub quick_fixes: Vec<QuickFix>,
}

impl Issue {
    /// Create an issue whose primary location mirrors the legacy fields
    pub fn new(
        id: impl Into<String>,
        rule_key: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        file_path: Option<String>,
        line: Option<u32>,
        creation_date: i64,
    ) -> Self {
        let message = message.into();
        let primary_location = IssueLocation {
            file_path: file_path.clone(),
            start_line: line,
            end_line: line,
            start_offset: None,
            end_offset: None,
            message: Some(message.clone()),
        };
        Self {
            id: id.into(),
            rule_key: rule_key.into(),
            severity,
            message,
            file_path,
            line,
            creation_date,
            assignee: None,
            tags: Vec::new(),
            primary_location: Some(primary_location),
            flows: Vec::new(),
            quick_fixes: Vec::new(),
        }
    }

    /// Builder-style: set the assignee
    #[must_use]
    pub fn with_assignee(mut self, assignee: Option<String>) -> Self {
        self.assignee = assignee;
        self
    }

    /// Builder-style: set tags
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Builder-style: set flows
    #[must_use]
    pub fn with_flows(mut self, flows: Vec<IssueFlow>) -> Self {
        self.flows = flows;
        self
    }

    /// Builder-style: set quick fixes
    #[must_use]
    pub fn with_quick_fixes(mut self, quick_fixes: Vec<QuickFix>) -> Self {
        self.quick_fixes = quick_fixes;
        self
    }

    /// Field-by-field comparison, unlike `==` which only compares ids
    pub fn deep_eq(&self, other: &Issue) -> bool {
        self.id == other.id
            && self.rule_key == other.rule_key
            && self.severity == other.severity
            && self.message == other.message
            && self.file_path == other.file_path
            && self.line == other.line
            && self.creation_date == other.creation_date
            && self.assignee == other.assignee
            && self.tags == other.tags
            && self.primary_location == other.primary_location
            && self.flows == other.flows
            && self.quick_fixes == other.quick_fixes
    }
}

impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Issue {}

impl Hash for Issue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
