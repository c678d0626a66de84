//! redb configuration

/// Settings for [`crate::RedbIssueRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedbConfig {
    /// Records written per write transaction
    pub commit_interval: usize,
}

impl RedbConfig {
    /// Builder-style: set records per commit
    #[must_use]
    pub fn with_commit_interval(mut self, records: usize) -> Self {
        self.commit_interval = records.max(1);
        self
    }
}

impl Default for RedbConfig {
    fn default() -> Self {
        Self {
            commit_interval: 5_000,
        }
    }
}
