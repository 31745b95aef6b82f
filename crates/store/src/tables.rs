//! Table locators: which physical tables an entity's statements target.

use crate::{Result, StoreError};

/// MySQL's identifier length limit.
const MAX_IDENT_LEN: usize = 64;

/// Supplies the record table and content table names for one entity kind.
pub trait Tables: Send + Sync {
    fn record_table(&self) -> &str;
    fn content_table(&self) -> &str;
}

/// The standard locator: a validated pair of table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePair {
    record: String,
    content: String,
}

impl TablePair {
    /// Create a pair, rejecting empty, over-long or identical names.
    pub fn new(record: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let record = record.into();
        let content = content.into();
        validate_pair(&record, &content)?;
        Ok(Self { record, content })
    }
}

impl Tables for TablePair {
    fn record_table(&self) -> &str {
        &self.record
    }

    fn content_table(&self) -> &str {
        &self.content
    }
}

/// Check two table names that one statement joins.
pub(crate) fn validate_pair(first: &str, second: &str) -> Result<()> {
    validate(first)?;
    validate(second)?;
    if first == second {
        return Err(StoreError::InvalidTable(format!(
            "'{first}' named for both tables"
        )));
    }
    Ok(())
}

fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreError::InvalidTable("empty name".into()));
    }
    if name.len() > MAX_IDENT_LEN {
        return Err(StoreError::InvalidTable(format!(
            "'{name}' exceeds {MAX_IDENT_LEN} bytes"
        )));
    }
    Ok(())
}

/// Render `name` as a back-tick quoted MySQL identifier.
///
/// Embedded back-ticks are doubled, so the result is always a single identifier.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_exposes_both_names() {
        let tables = TablePair::new("pages", "page_contents").unwrap();
        assert_eq!(tables.record_table(), "pages");
        assert_eq!(tables.content_table(), "page_contents");
    }

    #[test]
    fn rejects_bad_pairs() {
        assert!(TablePair::new("", "c").is_err());
        assert!(TablePair::new("r", "r").is_err());
        assert!(TablePair::new("r", "x".repeat(65)).is_err());
    }

    #[test]
    fn quoting_neutralises_backticks() {
        assert_eq!(quote_ident("pages"), "`pages`");
        assert_eq!(quote_ident("a`; DROP TABLE b; --"), "`a``; DROP TABLE b; --`");
    }
}
