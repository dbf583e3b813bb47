//! Transfer service.
//!
//! Orchestrates a two-record balance transfer inside one transaction
//! boundary: read both records, debit the source, validate the destination,
//! credit the destination, then commit. Any failure triggers a full rollback
//! and surfaces as a single `TransferFailed` wrapping the original cause.

use crate::db::with_transaction;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;
use crate::store::AccountStore;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

/// Business rules applied to a transfer's destination.
#[derive(Debug, Clone, Default)]
pub struct TransferPolicy {
    blocked_ids: HashSet<String>,
}

impl TransferPolicy {
    /// Create a policy blocking the given destination ids.
    pub fn new(blocked_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            blocked_ids: blocked_ids.into_iter().collect(),
        }
    }

    /// Check whether an id is blocked as a destination.
    pub fn is_blocked(&self, id: &str) -> bool {
        self.blocked_ids.contains(id)
    }

    /// Reject blocked destination records.
    pub fn validate_destination(&self, destination: &Account) -> LedgerResult<()> {
        if self.is_blocked(&destination.id) {
            return Err(LedgerError::validation_failed(format!(
                "destination account '{}' is blocked",
                destination.id
            )));
        }
        Ok(())
    }
}

/// Service orchestrating atomic transfers between two account records.
#[derive(Debug, Clone)]
pub struct TransferService {
    pool: SqlitePool,
    policy: TransferPolicy,
}

impl TransferService {
    /// Create a transfer service over the given pool.
    pub fn new(pool: SqlitePool, policy: TransferPolicy) -> Self {
        Self { pool, policy }
    }

    /// Atomically move `amount` from one account to another.
    ///
    /// All reads and writes run on the single connection bound to one
    /// transaction boundary. On any failure the boundary rolls back and the
    /// error is surfaced as `TransferFailed` carrying the original cause,
    /// so a failed transfer leaves both records exactly as before the call.
    ///
    /// The destination is validated between the debit and the credit: a
    /// blocked destination therefore rolls back an already-applied debit,
    /// which is the behavior the rollback tests exercise.
    pub async fn transfer(&self, from_id: &str, to_id: &str, amount: i64) -> LedgerResult<()> {
        // The transaction closure must own everything it captures.
        let source = from_id.to_string();
        let destination = to_id.to_string();
        let policy = self.policy.clone();

        let result = with_transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let from = AccountStore::find_by_id_on(&mut *conn, &source).await?;
                let to = AccountStore::find_by_id_on(&mut *conn, &destination).await?;

                AccountStore::update_balance_on(&mut *conn, &source, from.balance - amount)
                    .await?;
                policy.validate_destination(&to)?;
                AccountStore::update_balance_on(&mut *conn, &destination, to.balance + amount)
                    .await?;

                Ok(())
            })
        })
        .await;

        match result {
            Ok(()) => {
                info!(from = %from_id, to = %to_id, amount, "Transfer committed");
                Ok(())
            }
            Err(cause) => {
                warn!(from = %from_id, to = %to_id, amount, error = %cause, "Transfer rolled back");
                Err(LedgerError::transfer_failed(cause))
            }
        }
    }
}
