//! Table definitions for redb storage.

use redb::{MultimapTableDefinition, TableDefinition};

/// Table definitions for issue storage.
pub struct Tables;

impl Tables {
    /// Issue storage: id → bincode-encoded Issue
    pub const ISSUES: TableDefinition<'static, &'static str, &'static [u8]> =
        TableDefinition::new("issues");

    /// Secondary index: rule key → issue ids
    /// Written in the same transaction as `ISSUES`
    pub const RULE_INDEX: MultimapTableDefinition<'static, &'static str, &'static str> =
        MultimapTableDefinition::new("rule_index");
}
