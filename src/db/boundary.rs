//! Transaction boundary management.
//!
//! A [`TransactionBoundary`] is a scope within which multiple writes either
//! all become durable (commit) or are all undone (rollback). The boundary
//! owns one dedicated connection from begin to completion and hands it out
//! only as `&mut`, so the same logical call stack that opened the boundary
//! is the one that uses it. Boundaries are not nested: a second `begin` on
//! an already-active boundary fails fast with `InvalidState`.
//!
//! [`with_transaction`] is the scoped form: it opens a boundary, runs the
//! supplied operation on the bound connection, commits on success and rolls
//! back on failure, and releases the connection in all cases.

use crate::error::{LedgerError, LedgerResult};
use futures_util::future::BoxFuture;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

/// Lifecycle of a transaction boundary.
///
/// `Committed` and `RolledBack` are terminal; a completed boundary cannot
/// be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

impl std::fmt::Display for BoundaryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Committed => write!(f, "committed"),
            Self::RolledBack => write!(f, "rolled-back"),
        }
    }
}

/// An explicit transaction boundary over a pooled SQLite connection.
///
/// If the boundary is dropped while still active, the underlying sqlx
/// transaction rolls back when the connection returns to the pool, so an
/// abandoned boundary never leaks a partial write.
pub struct TransactionBoundary {
    id: String,
    state: BoundaryState,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl TransactionBoundary {
    /// Create a boundary in the `Idle` state.
    pub fn new() -> Self {
        Self {
            id: generate_boundary_id(),
            state: BoundaryState::Idle,
            tx: None,
        }
    }

    /// Unique identifier for this boundary, carried through log fields.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BoundaryState {
        self.state
    }

    /// Acquire a connection from the pool and begin the transaction.
    ///
    /// Fails with `InvalidState` if the boundary is already active or has
    /// already completed.
    pub async fn begin(&mut self, pool: &SqlitePool) -> LedgerResult<()> {
        match self.state {
            BoundaryState::Idle => {}
            BoundaryState::Active => {
                return Err(LedgerError::invalid_state(
                    "boundary is already active",
                    &self.id,
                ));
            }
            BoundaryState::Committed | BoundaryState::RolledBack => {
                return Err(LedgerError::invalid_state(
                    format!("boundary already completed ({})", self.state),
                    &self.id,
                ));
            }
        }

        let tx = pool.begin().await.map_err(LedgerError::from)?;
        self.tx = Some(tx);
        self.state = BoundaryState::Active;

        debug!(boundary_id = %self.id, "Transaction boundary opened");
        Ok(())
    }

    /// Borrow the connection bound to this boundary.
    ///
    /// Store operations executed on this connection participate in the
    /// boundary's commit/rollback outcome.
    pub fn connection(&mut self) -> LedgerResult<&mut SqliteConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut *tx),
            None => Err(LedgerError::invalid_state(
                format!("boundary is not active ({})", self.state),
                &self.id,
            )),
        }
    }

    /// Commit the boundary. Terminal.
    pub async fn commit(&mut self) -> LedgerResult<()> {
        let tx = self.take_active("commit")?;
        match tx.commit().await {
            Ok(()) => {
                self.state = BoundaryState::Committed;
                info!(boundary_id = %self.id, "Transaction committed");
                Ok(())
            }
            Err(e) => {
                // The driver has already discarded the transaction; the
                // connection rolls back as it returns to the pool.
                self.state = BoundaryState::RolledBack;
                Err(LedgerError::from(e))
            }
        }
    }

    /// Roll back the boundary. Terminal.
    pub async fn rollback(&mut self) -> LedgerResult<()> {
        let tx = self.take_active("rollback")?;
        let result = tx.rollback().await.map_err(LedgerError::from);
        self.state = BoundaryState::RolledBack;
        match &result {
            Ok(()) => info!(boundary_id = %self.id, "Transaction rolled back"),
            Err(e) => warn!(boundary_id = %self.id, error = %e, "Rollback reported an error"),
        }
        result
    }

    fn take_active(&mut self, operation: &str) -> LedgerResult<Transaction<'static, Sqlite>> {
        self.tx.take().ok_or_else(|| {
            LedgerError::invalid_state(
                format!("cannot {} a boundary that is {}", operation, self.state),
                &self.id,
            )
        })
    }
}

impl Default for TransactionBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBoundary")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Run an operation inside a transaction boundary.
///
/// Opens a boundary on `pool`, invokes `op` with the bound connection,
/// commits if `op` returns `Ok`, rolls back if it returns `Err`. A rollback
/// failure is logged and never masks the original error.
///
/// # Usage
///
/// ```ignore
/// let updated = with_transaction(&pool, |conn| {
///     Box::pin(async move {
///         AccountStore::update_balance_on(&mut *conn, "memberA", 8_000).await
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, F>(pool: &SqlitePool, op: F) -> LedgerResult<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, LedgerResult<T>>,
{
    let mut boundary = TransactionBoundary::new();
    boundary.begin(pool).await?;

    let outcome = op(boundary.connection()?).await;

    match outcome {
        Ok(value) => {
            boundary.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = boundary.rollback().await {
                warn!(
                    boundary_id = %boundary.id(),
                    error = %rollback_err,
                    "Rollback failed after operation error"
                );
            }
            Err(err)
        }
    }
}

/// Generate a unique boundary ID.
fn generate_boundary_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}
