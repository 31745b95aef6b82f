//! `Paste`: an uploaded file: filename and filetype over raw bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;

use crate::entity::{decode, expect_columns, Entity};
use crate::query::{self, Arg, Statement};
use crate::tables::Tables;
use crate::Result;

const META: &[&str] = &["filename", "filetype"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paste {
    pub id: String,
    pub filename: String,
    pub filetype: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub body: Vec<u8>,
}

impl Paste {
    pub fn new(
        filename: impl Into<String>,
        filetype: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            filetype: filetype.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    fn fields(&self) -> Vec<(&'static str, Arg)> {
        vec![
            ("filename", self.filename.as_str().into()),
            ("filetype", self.filetype.as_str().into()),
        ]
    }

    fn decode_meta(row: &MySqlRow) -> Result<Self> {
        let id: u64 = decode(Self::KIND, row, 0)?;
        Ok(Self {
            id: id.to_string(),
            filename: decode(Self::KIND, row, 1)?,
            filetype: decode(Self::KIND, row, 2)?,
            created: decode(Self::KIND, row, 3)?,
            updated: decode(Self::KIND, row, 4)?,
            body: Vec::new(),
        })
    }
}

impl Entity for Paste {
    const KIND: &'static str = "paste";

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
        query::insert_content(tables, ts, self.body.as_slice().into())
    }

    fn query_insert_record(&self, tables: &dyn Tables, content_id: u64) -> Statement {
        query::insert_record(tables, self.fields(), content_id)
    }

    fn query_update(&self, tables: &dyn Tables, ts: DateTime<Utc>, id: u64) -> Statement {
        query::update(tables, self.fields(), ts, self.body.as_slice().into(), id)
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
        let mut paste = Self::decode_meta(row)?;
        paste.body = decode(Self::KIND, row, 5)?;
        Ok(paste)
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
