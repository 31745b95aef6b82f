//! `Page`: an article: title, subtitle and tag over a text body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;

use crate::entity::{decode, expect_columns, Entity};
use crate::query::{self, Arg, Statement};
use crate::tables::Tables;
use crate::Result;

const META: &[&str] = &["title", "subtitle", "tag"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub tag: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub body: String,
}

impl Page {
    /// A page that has not been stored yet.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        tag: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            tag: tag.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// A page addressing an existing row by id, e.g. for delete.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    fn fields(&self) -> Vec<(&'static str, Arg)> {
        vec![
            ("title", self.title.as_str().into()),
            ("subtitle", self.subtitle.as_str().into()),
            ("tag", self.tag.as_str().into()),
        ]
    }

    fn decode_meta(row: &MySqlRow) -> Result<Self> {
        let id: u64 = decode(Self::KIND, row, 0)?;
        Ok(Self {
            id: id.to_string(),
            title: decode(Self::KIND, row, 1)?,
            subtitle: decode(Self::KIND, row, 2)?,
            tag: decode(Self::KIND, row, 3)?,
            created: decode(Self::KIND, row, 4)?,
            updated: decode(Self::KIND, row, 5)?,
            body: String::new(),
        })
    }
}

impl Entity for Page {
    const KIND: &'static str = "page";

    fn id(&self) -> &str {
        &self.id
    }

    fn for_id(id: &str) -> Self {
        Self::with_id(id)
    }

    fn query_list(tables: &dyn Tables) -> Statement {
        query::list(tables, META)
    }

    fn query_single(tables: &dyn Tables, id: u64) -> Statement {
        query::single(tables, META, id)
    }

    fn query_insert_content(&self, tables: &dyn Tables, ts: DateTime<Utc>) -> Statement {
        query::insert_content(tables, ts, self.body.as_str().into())
    }

    fn query_insert_record(&self, tables: &dyn Tables, content_id: u64) -> Statement {
        query::insert_record(tables, self.fields(), content_id)
    }

    fn query_update(&self, tables: &dyn Tables, ts: DateTime<Utc>, id: u64) -> Statement {
        query::update(tables, self.fields(), ts, self.body.as_str().into(), id)
    }

    fn query_delete(&self, tables: &dyn Tables, id: u64) -> Statement {
        query::delete(tables, id)
    }

    fn from_list_row(row: &MySqlRow) -> Result<Self> {
        expect_columns(Self::KIND, row, META.len() + 3)?;
        Self::decode_meta(row)
    }

    fn from_single_row(row: &MySqlRow) -> Result<Self> {
        expect_columns(Self::KIND, row, META.len() + 4)?;
        let mut page = Self::decode_meta(row)?;
        page.body = decode(Self::KIND, row, 6)?;
        Ok(page)
    }

    fn from_inserted(&self, ts: DateTime<Utc>, record_id: u64) -> Self {
        Self {
            id: record_id.to_string(),
            created: ts,
            updated: ts,
            ..self.clone()
        }
    }

    fn from_updated(&self, ts: DateTime<Utc>) -> Self {
        Self { updated: ts, ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::timestamp;
    use crate::TablePair;

    fn tables() -> TablePair {
        TablePair::new("pages", "page_contents").unwrap()
    }

    #[test]
    fn insert_record_binds_metadata_in_column_order() {
        let page = Page::new("T", "S", "x", "hello");
        let stmt = page.query_insert_record(&tables(), 5);
        assert_eq!(
            stmt.sql,
            "INSERT INTO `pages` (`title`, `subtitle`, `tag`, `content_id`) VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            stmt.args,
            vec![
                Arg::Text("T".into()),
                Arg::Text("S".into()),
                Arg::Text("x".into()),
                Arg::Id(5),
            ]
        );
    }

    #[test]
    fn quotes_in_fields_are_bound_verbatim() {
        let page = Page::new("it's", "\"quoted\"", "x", "'); DROP TABLE pages; --");
        let stmt = page.query_insert_content(&tables(), timestamp());
        assert!(!stmt.sql.contains("DROP"));
        assert_eq!(stmt.args[2], Arg::Text("'); DROP TABLE pages; --".into()));
    }

    #[test]
    fn update_sets_every_field_and_the_stamp() {
        let page = Page::new("T", "S", "x", "world");
        let ts = timestamp();
        let stmt = page.query_update(&tables(), ts, 12);
        assert!(stmt.sql.contains("r.`tag` = ?"));
        assert_eq!(stmt.args.len(), 6);
        assert_eq!(stmt.args[3], Arg::Timestamp(ts));
        assert_eq!(stmt.args[4], Arg::Text("world".into()));
        assert_eq!(stmt.args[5], Arg::Id(12));
    }

    #[test]
    fn list_projection_has_no_body() {
        let stmt = Page::query_list(&tables());
        assert!(!stmt.sql.contains("body"));
        assert!(stmt.sql.contains("r.`subtitle`"));
    }

    #[test]
    fn inserted_copy_has_equal_stamps_and_new_id() {
        let ts = timestamp();
        let page = Page::new("T", "S", "x", "hello").from_inserted(ts, 17);
        assert_eq!(page.id, "17");
        assert_eq!(page.created, ts);
        assert_eq!(page.created, page.updated);
        assert_eq!(page.body, "hello");
    }

    #[test]
    fn updated_copy_only_moves_updated() {
        let first = timestamp();
        let page = Page::new("T", "S", "x", "hello").from_inserted(first, 1);
        let later = first + chrono::Duration::seconds(1);
        let updated = page.from_updated(later);
        assert_eq!(updated.created, first);
        assert_eq!(updated.updated, later);
        assert_eq!(updated.id, page.id);
        assert_eq!(updated.title, page.title);
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let page = Page::with_id("3");
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["id"], "3");
        assert!(json.get("subtitle").is_some());
    }
}
