//! SurrealDB configuration

/// Namespace, database and write batching for [`crate::SurrealIssueRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrealConfig {
    pub namespace: String,
    pub database: String,
    /// Documents per `INSERT` statement
    pub insert_chunk: usize,
}

impl SurrealConfig {
    #[must_use]
    pub fn with_insert_chunk(mut self, docs: usize) -> Self {
        self.insert_chunk = docs.max(1);
        self
    }
}

impl Default for SurrealConfig {
    fn default() -> Self {
        Self {
            namespace: "issuebench".to_string(),
            database: "issues".to_string(),
            insert_chunk: 1_000,
        }
    }
}
