//! Static lookup: fetch a content body by the hash of a human-readable name.
//!
//! Kept apart from the `Entity` contract: it is a plain key → body read.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::Row;
use tracing::{debug, instrument};

use crate::engine::Deadline;
use crate::tables::{quote_ident, validate_pair};
use crate::{Result, StoreError};

const KIND: &str = "static page";

/// Resolves a name to the raw body stored for it.
#[async_trait]
pub trait StaticLookup: Send + Sync {
    async fn body(&self, name: &str, deadline: Deadline) -> Result<Vec<u8>>;
}

/// The 16-byte key the hash table stores for `name`.
///
/// Matches the store's `UNHEX(MD5(name))`.
pub fn name_key(name: &str) -> [u8; 16] {
    md5::compute(name.as_bytes()).0
}

/// [`StaticLookup`] over a hash table (`url_hash` → `content_id`) and a
/// content table (`id` → `body`).
#[derive(Debug, Clone)]
pub struct HashedLookup {
    pool: MySqlPool,
    content_table: String,
    hash_table: String,
}

impl HashedLookup {
    /// Rejects table names [`TablePair`](crate::TablePair) would reject.
    pub fn new(
        pool: MySqlPool,
        content_table: impl Into<String>,
        hash_table: impl Into<String>,
    ) -> Result<Self> {
        let content_table = content_table.into();
        let hash_table = hash_table.into();
        validate_pair(&content_table, &hash_table)?;
        Ok(Self { pool, content_table, hash_table })
    }

    fn sql(&self) -> String {
        format!(
            "SELECT `body` FROM {} WHERE `id` = \
             (SELECT `content_id` FROM {} WHERE `url_hash` = ?)",
            quote_ident(&self.content_table),
            quote_ident(&self.hash_table),
        )
    }
}

#[async_trait]
impl StaticLookup for HashedLookup {
    #[instrument(skip(self, deadline))]
    async fn body(&self, name: &str, deadline: Deadline) -> Result<Vec<u8>> {
        let sql = self.sql();
        let key = name_key(name);
        let row = deadline
            .run(
                "look up static page",
                sqlx::query(&sql).bind(&key[..]).fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(|| StoreError::NotFound { kind: KIND, id: name.to_owned() })?;

        let body: Vec<u8> = row.try_get(0).map_err(StoreError::decode(KIND))?;
        debug!(bytes = body.len(), "static page resolved");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_md5_digest() {
        // MD5("abc") = 900150983cd24fb0d6963f7d28e17f72
        let key = name_key("abc");
        assert_eq!(&key[..4], &[0x90, 0x01, 0x50, 0x98]);
        assert_eq!(key[15], 0x72);
    }

    fn lazy_pool() -> MySqlPool {
        sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://user@localhost/db")
            .unwrap()
    }

    #[tokio::test]
    async fn sql_reads_body_through_hash_table() {
        let lookup = HashedLookup::new(lazy_pool(), "page_contents", "page_hashes").unwrap();
        assert_eq!(
            lookup.sql(),
            "SELECT `body` FROM `page_contents` WHERE `id` = \
             (SELECT `content_id` FROM `page_hashes` WHERE `url_hash` = ?)"
        );
    }

    #[tokio::test]
    async fn rejects_bad_table_names() {
        for (content, hash) in [
            ("", "page_hashes"),
            ("page_contents", ""),
            ("page_contents", "page_contents"),
        ] {
            let err = HashedLookup::new(lazy_pool(), content, hash).unwrap_err();
            assert!(matches!(err, StoreError::InvalidTable(_)), "{content:?}/{hash:?}");
        }
        let err = HashedLookup::new(lazy_pool(), "x".repeat(65), "page_hashes").unwrap_err();
        assert!(matches!(err, StoreError::InvalidTable(_)));
    }
}
