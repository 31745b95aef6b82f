//! Generic CRUD engine.
//!
//! `CrudEngine` runs the five operations for any [`Entity`]:
//! 1. Asks the entity for a bound [`Statement`](crate::query::Statement).
//! 2. Executes it on the pool, or inside a transaction for insert.
//! 3. Verifies affected-row counts against the one-to-one pairing of
//!    record and content rows.
//! 4. Materialises rows back into entities.
//!
//! Every await is bounded by the caller's [`Deadline`]. A connection or
//! transaction lives only for the duration of one operation.

use std::future::Future;
use std::time::Duration;

use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

use crate::entity::{parse_identity, timestamp, Entity};
use crate::tables::Tables;
use crate::{Result, StoreError};

/// Rows a joined delete must remove: the record row and its content row.
const DELETED_PER_ENTITY: u64 = 2;

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// Point in time after which an operation gives up.
///
/// Expiry inside a transaction rolls it back before `DeadlineExceeded` is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline; the operation waits as long as the store does.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// Await `fut` within the deadline, tagging failures with `intent`.
    pub(crate) async fn run<F, T>(self, intent: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        let outcome = match self.0 {
            Some(at) => timeout_at(at, fut)
                .await
                .map_err(|_| StoreError::DeadlineExceeded { intent })?,
            None => fut.await,
        };
        outcome.map_err(StoreError::query(intent))
    }
}

// ---------------------------------------------------------------------------
// Affected-row checks
// ---------------------------------------------------------------------------

/// An update matched nothing iff it affected zero rows.
///
/// A joined update may touch one or both tables, so any positive count passes.
pub fn check_updated(kind: &'static str, id: &str, affected: u64) -> Result<()> {
    if affected == 0 {
        return Err(StoreError::NotFound { kind, id: id.to_owned() });
    }
    Ok(())
}

/// A joined delete must remove exactly the record row and its content row.
pub fn check_deleted(affected: u64) -> Result<()> {
    if affected != DELETED_PER_ENTITY {
        return Err(StoreError::Consistency {
            intent: "delete row",
            expected: DELETED_PER_ENTITY,
            affected,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CrudEngine
// ---------------------------------------------------------------------------

/// Cheap-to-clone handle running entity operations on a shared pool.
///
/// Safe to use from many tasks at once; the pool multiplexes connections.
#[derive(Debug, Clone)]
pub struct CrudEngine {
    pool: MySqlPool,
}

impl CrudEngine {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Every entity's metadata projection, oldest first.
    ///
    /// An empty table yields an empty vector.
    #[instrument(skip_all, fields(kind = E::KIND))]
    pub async fn list<E: Entity>(&self, tables: &dyn Tables, deadline: Deadline) -> Result<Vec<E>> {
        let stmt = E::query_list(tables);
        let rows = deadline
            .run(stmt.intent, stmt.bind().fetch_all(&self.pool))
            .await?;
        debug!(rows = rows.len(), "listed");
        rows.iter().map(E::from_list_row).collect()
    }

    /// The full projection of the entity with record id `id`.
    ///
    /// An `id` that is not a canonical record id is `NotFound` without a round trip.
    #[instrument(skip_all, fields(kind = E::KIND, id = %id))]
    pub async fn get<E: Entity>(
        &self,
        tables: &dyn Tables,
        id: &str,
        deadline: Deadline,
    ) -> Result<E> {
        let Some(record_id) = parse_identity(id) else {
            debug!("not a record id");
            return Err(StoreError::NotFound { kind: E::KIND, id: id.to_owned() });
        };
        let stmt = E::query_single(tables, record_id);
        let row = deadline
            .run(stmt.intent, stmt.bind().fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| StoreError::NotFound { kind: E::KIND, id: id.to_owned() })?;
        E::from_single_row(&row)
    }

    /// Store `entity` as a new content row plus a record row linked to it.
    ///
    /// Both rows are written in one transaction, content first. One timestamp
    /// stamps the content row and the returned entity, so `created == updated`.
    ///
    /// The deadline bounds `BEGIN` and both writes. Once `COMMIT` is sent it is
    /// awaited to completion, so `DeadlineExceeded` always means nothing was stored.
    #[instrument(skip_all, fields(kind = E::KIND))]
    pub async fn insert<E: Entity>(
        &self,
        tables: &dyn Tables,
        entity: &E,
        deadline: Deadline,
    ) -> Result<E> {
        let ts = timestamp();
        let mut tx = deadline.run("begin transaction", self.pool.begin()).await?;

        let content = entity.query_insert_content(tables, ts);
        let written = deadline
            .run(content.intent, content.bind().execute(&mut *tx))
            .await;
        let content_id = match written {
            Ok(done) => done.last_insert_id(),
            Err(err) => return Err(abort(tx, err).await),
        };

        let record = entity.query_insert_record(tables, content_id);
        let written = deadline
            .run(record.intent, record.bind().execute(&mut *tx))
            .await;
        let record_id = match written {
            Ok(done) => done.last_insert_id(),
            Err(err) => return Err(abort(tx, err).await),
        };

        // `commit` consumes the transaction; if it fails the store discards it.
        tx.commit()
            .await
            .map_err(StoreError::query("commit transaction"))?;

        info!(record_id, content_id, "inserted");
        Ok(entity.from_inserted(ts, record_id))
    }

    /// Rewrite metadata and body of `entity`, stamping a fresh `updated`.
    #[instrument(skip_all, fields(kind = E::KIND, id = %entity.id()))]
    pub async fn update<E: Entity>(
        &self,
        tables: &dyn Tables,
        entity: &E,
        deadline: Deadline,
    ) -> Result<E> {
        let Some(record_id) = parse_identity(entity.id()) else {
            debug!("not a record id");
            return Err(StoreError::NotFound { kind: E::KIND, id: entity.id().to_owned() });
        };
        let ts = timestamp();
        let stmt = entity.query_update(tables, ts, record_id);
        let done = deadline
            .run(stmt.intent, stmt.bind().execute(&self.pool))
            .await?;
        check_updated(E::KIND, entity.id(), done.rows_affected())?;
        info!(rows = done.rows_affected(), "updated");
        Ok(entity.from_updated(ts))
    }

    /// Remove `entity`'s record row and content row in one statement.
    ///
    /// An id that is not a record id removes nothing and fails like an absent one.
    #[instrument(skip_all, fields(kind = E::KIND, id = %entity.id()))]
    pub async fn delete<E: Entity>(
        &self,
        tables: &dyn Tables,
        entity: &E,
        deadline: Deadline,
    ) -> Result<()> {
        let Some(record_id) = parse_identity(entity.id()) else {
            warn!("not a record id");
            return check_deleted(0);
        };
        let stmt = entity.query_delete(tables, record_id);
        let done = deadline
            .run(stmt.intent, stmt.bind().execute(&self.pool))
            .await?;
        if let Err(err) = check_deleted(done.rows_affected()) {
            warn!(rows = done.rows_affected(), "delete left tables unpaired");
            return Err(err);
        }
        info!("deleted");
        Ok(())
    }
}

/// Roll `tx` back and hand back the error that caused it.
///
/// A failed rollback is logged; the original cause is what the caller sees.
async fn abort(tx: Transaction<'static, MySql>, cause: StoreError) -> StoreError {
    warn!(error = %cause, "rolling back transaction");
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "rollback failed");
    }
    cause
}
