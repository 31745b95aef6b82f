//! The `Entity` trait: the contract every record+content type must fulfil.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{Decode, MySql, Row, Type};

use crate::query::Statement;
use crate::tables::Tables;
use crate::{Result, StoreError};

/// A content entity stored as one record row joined to one content row.
///
/// Implementors describe their own statements and row conversions; the
/// generic [`CrudEngine`](crate::CrudEngine) drives them. Statements must bind
/// every field value rather than format it into the SQL text.
pub trait Entity: Clone + Send + Sync + Unpin + Sized {
    /// Label used in logs and `NotFound` errors.
    const KIND: &'static str;

    /// Stringified record id; empty before the entity has been inserted.
    fn id(&self) -> &str;

    /// An instance carrying only `id`, enough to address an existing row.
    fn for_id(id: &str) -> Self;

    /// Metadata projection of every row, ordered by content creation time.
    fn query_list(tables: &dyn Tables) -> Statement;

    /// Full projection of the row with record id `id`.
    fn query_single(tables: &dyn Tables, id: u64) -> Statement;

    fn query_insert_content(&self, tables: &dyn Tables, ts: DateTime<Utc>) -> Statement;

    fn query_insert_record(&self, tables: &dyn Tables, content_id: u64) -> Statement;

    /// One joined statement updating both tables for record id `id`.
    fn query_update(&self, tables: &dyn Tables, ts: DateTime<Utc>, id: u64) -> Statement;

    /// One joined statement deleting both rows for record id `id`.
    fn query_delete(&self, tables: &dyn Tables, id: u64) -> Statement;

    fn from_list_row(row: &MySqlRow) -> Result<Self>;

    fn from_single_row(row: &MySqlRow) -> Result<Self>;

    /// The instance as stored by a fresh insert.
    fn from_inserted(&self, ts: DateTime<Utc>, record_id: u64) -> Self;

    /// The instance as stored by an update.
    fn from_updated(&self, ts: DateTime<Utc>) -> Self;

    /// Instance form of [`Entity::query_single`].
    ///
    /// `None` when [`Entity::id`] is not a record id.
    fn query_single_for(&self, tables: &dyn Tables) -> Option<Statement> {
        parse_identity(self.id()).map(|id| Self::query_single(tables, id))
    }
}

/// The record id spelled by `id`, in canonical decimal form only.
///
/// Signs, padding, leading zeros, fractions and exponents are rejected, so
/// every accepted string names exactly one row.
pub fn parse_identity(id: &str) -> Option<u64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let parsed: u64 = id.parse().ok()?;
    (parsed.to_string() == id).then_some(parsed)
}

/// Current time at `DATETIME(6)` resolution.
///
/// Stamps are truncated to microseconds so a value read back from the store
/// compares equal to the one the engine returned.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fail with `RowDecode` unless `row` has exactly `expected` columns.
pub fn expect_columns(kind: &'static str, row: &MySqlRow, expected: usize) -> Result<()> {
    let found = row.len();
    if found != expected {
        return Err(StoreError::RowDecode {
            kind,
            source: sqlx::Error::Decode(
                format!("expected {expected} columns, found {found}").into(),
            ),
        });
    }
    Ok(())
}

/// Decode column `index`, mapping failures to `RowDecode`.
pub fn decode<'r, T>(kind: &'static str, row: &'r MySqlRow, index: usize) -> Result<T>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get(index).map_err(StoreError::decode(kind))
}
