//! Statement builders: one pure function per operation.
//!
//! Every builder renders SQL text containing only quoted identifiers and `?`
//! placeholders; values travel separately as [`Arg`]s and are bound by the
//! driver. Record rows are aliased `r`, content rows `c`.

use chrono::{DateTime, Utc};
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

use crate::tables::{quote_ident, Tables};

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Id(u64),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// SQL text plus its arguments, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Short description used in errors and logs instead of the SQL itself.
    pub intent: &'static str,
    pub sql: String,
    pub args: Vec<Arg>,
}

impl Statement {
    /// Build an executable query with every argument bound.
    pub(crate) fn bind(&self) -> Query<'_, MySql, MySqlArguments> {
        self.args
            .iter()
            .fold(sqlx::query(&self.sql), |query, arg| match arg {
                Arg::Text(s) => query.bind(s.as_str()),
                Arg::Bytes(b) => query.bind(b.as_slice()),
                Arg::Timestamp(ts) => query.bind(*ts),
                Arg::Id(id) => query.bind(*id),
            })
    }
}

struct Names {
    record: String,
    content: String,
}

fn names(tables: &dyn Tables) -> Names {
    Names {
        record: quote_ident(tables.record_table()),
        content: quote_ident(tables.content_table()),
    }
}

fn projection(meta: &[&str], with_body: bool) -> String {
    let mut cols = vec!["r.`id`".to_string()];
    cols.extend(meta.iter().map(|c| format!("r.{}", quote_ident(c))));
    cols.push("c.`created`".into());
    cols.push("c.`updated`".into());
    if with_body {
        cols.push("c.`body`".into());
    }
    cols.join(", ")
}

/// Metadata projection of every row, oldest content first.
pub fn list(tables: &dyn Tables, meta: &[&str]) -> Statement {
    let t = names(tables);
    Statement {
        intent: "list rows",
        sql: format!(
            "SELECT {} FROM {} AS r INNER JOIN {} AS c ON r.`content_id` = c.`id` \
             ORDER BY c.`created` ASC, r.`id` ASC",
            projection(meta, false),
            t.record,
            t.content,
        ),
        args: Vec::new(),
    }
}

/// Full projection of the row with record id `id`.
pub fn single(tables: &dyn Tables, meta: &[&str], id: u64) -> Statement {
    let t = names(tables);
    Statement {
        intent: "fetch row",
        sql: format!(
            "SELECT {} FROM {} AS r INNER JOIN {} AS c ON r.`content_id` = c.`id` \
             WHERE r.`id` = ?",
            projection(meta, true),
            t.record,
            t.content,
        ),
        args: vec![Arg::Id(id)],
    }
}

/// New content row stamped `ts` for both created and updated.
pub fn insert_content(tables: &dyn Tables, ts: DateTime<Utc>, body: Arg) -> Statement {
    let t = names(tables);
    Statement {
        intent: "insert content row",
        sql: format!(
            "INSERT INTO {} (`created`, `updated`, `body`) VALUES (?, ?, ?)",
            t.content
        ),
        args: vec![Arg::Timestamp(ts), Arg::Timestamp(ts), body],
    }
}

/// New record row carrying `fields` and linked to `content_id`.
pub fn insert_record(
    tables: &dyn Tables,
    fields: Vec<(&'static str, Arg)>,
    content_id: u64,
) -> Statement {
    let t = names(tables);
    let mut cols: Vec<String> = fields.iter().map(|(c, _)| quote_ident(c)).collect();
    cols.push("`content_id`".into());
    let marks = vec!["?"; cols.len()].join(", ");

    let mut args: Vec<Arg> = fields.into_iter().map(|(_, v)| v).collect();
    args.push(Arg::Id(content_id));

    Statement {
        intent: "insert record row",
        sql: format!("INSERT INTO {} ({}) VALUES ({})", t.record, cols.join(", "), marks),
        args,
    }
}

/// Joined update of metadata, `updated` and body for record id `id`.
pub fn update(
    tables: &dyn Tables,
    fields: Vec<(&'static str, Arg)>,
    ts: DateTime<Utc>,
    body: Arg,
    id: u64,
) -> Statement {
    let t = names(tables);
    let mut sets: Vec<String> = fields
        .iter()
        .map(|(c, _)| format!("r.{} = ?", quote_ident(c)))
        .collect();
    sets.push("c.`updated` = ?".into());
    sets.push("c.`body` = ?".into());

    let mut args: Vec<Arg> = fields.into_iter().map(|(_, v)| v).collect();
    args.push(Arg::Timestamp(ts));
    args.push(body);
    args.push(Arg::Id(id));

    Statement {
        intent: "update row",
        sql: format!(
            "UPDATE {} AS r INNER JOIN {} AS c ON r.`content_id` = c.`id` SET {} \
             WHERE r.`id` = ?",
            t.record,
            t.content,
            sets.join(", "),
        ),
        args,
    }
}

/// Joined delete of the record row and its content row.
pub fn delete(tables: &dyn Tables, id: u64) -> Statement {
    let t = names(tables);
    Statement {
        intent: "delete row",
        sql: format!(
            "DELETE r, c FROM {} AS r INNER JOIN {} AS c ON r.`content_id` = c.`id` \
             WHERE r.`id` = ?",
            t.record, t.content,
        ),
        args: vec![Arg::Id(id)],
    }
}
