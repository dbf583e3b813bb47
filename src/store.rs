//! Account record store.
//!
//! Issues the four parameterized statements against the `records` table.
//! Every operation is generic over the executor, so a call either checks a
//! fresh connection out of the pool for exactly one statement, or runs on
//! the connection bound to an active transaction boundary. Connection
//! release is guaranteed by the pool in both cases.

use crate::error::{LedgerError, LedgerResult};
use crate::models::Account;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

const SQL_CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS records (id TEXT PRIMARY KEY, balance INTEGER NOT NULL)";
const SQL_INSERT: &str = "INSERT INTO records(id, balance) VALUES (?, ?)";
const SQL_SELECT: &str = "SELECT * FROM records WHERE id = ?";
const SQL_UPDATE: &str = "UPDATE records SET balance = ? WHERE id = ?";
const SQL_DELETE: &str = "DELETE FROM records WHERE id = ?";

/// Store for account records, holding no state between calls beyond the pool.
#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    /// Create a store backed by the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The pool this store draws connections from.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `records` table if it does not exist.
    pub async fn init_schema(&self) -> LedgerResult<()> {
        sqlx::query(SQL_CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(LedgerError::from)?;
        debug!("Schema initialized");
        Ok(())
    }

    /// Insert a new record. Fails with `ConstraintViolation` if the id exists.
    pub async fn create(&self, account: &Account) -> LedgerResult<Account> {
        Self::create_on(&self.pool, account).await
    }

    /// Insert a new record on the given executor.
    pub async fn create_on<'e, E>(executor: E, account: &Account) -> LedgerResult<Account>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(SQL_INSERT)
            .bind(&account.id)
            .bind(account.balance)
            .execute(executor)
            .await
            .map_err(LedgerError::from)?;

        debug!(id = %account.id, balance = account.balance, "Record created");
        Ok(account.clone())
    }

    /// Look up a record by id. Fails with `NotFound` if no row matches.
    pub async fn find_by_id(&self, id: &str) -> LedgerResult<Account> {
        Self::find_by_id_on(&self.pool, id).await
    }

    /// Look up a record by id on the given executor.
    pub async fn find_by_id_on<'e, E>(executor: E, id: &str) -> LedgerResult<Account>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Account>(SQL_SELECT)
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(LedgerError::from)?
            .ok_or_else(|| LedgerError::not_found(id))
    }

    /// Overwrite a record's balance, returning the affected-row count.
    ///
    /// A count of 0 means no row matched; that is not an error.
    pub async fn update_balance(&self, id: &str, new_balance: i64) -> LedgerResult<u64> {
        Self::update_balance_on(&self.pool, id, new_balance).await
    }

    /// Overwrite a record's balance on the given executor.
    pub async fn update_balance_on<'e, E>(
        executor: E,
        id: &str,
        new_balance: i64,
    ) -> LedgerResult<u64>
    where
        E: SqliteExecutor<'e>,
    {
        let rows_affected = sqlx::query(SQL_UPDATE)
            .bind(new_balance)
            .bind(id)
            .execute(executor)
            .await
            .map_err(LedgerError::from)?
            .rows_affected();

        debug!(id = %id, new_balance, rows_affected, "Balance updated");
        Ok(rows_affected)
    }

    /// Delete a record. Idempotent: an absent row is not an error.
    pub async fn delete(&self, id: &str) -> LedgerResult<()> {
        Self::delete_on(&self.pool, id).await
    }

    /// Delete a record on the given executor.
    pub async fn delete_on<'e, E>(executor: E, id: &str) -> LedgerResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        let rows_affected = sqlx::query(SQL_DELETE)
            .bind(id)
            .execute(executor)
            .await
            .map_err(LedgerError::from)?
            .rows_affected();

        debug!(id = %id, rows_affected, "Record deleted");
        Ok(())
    }
}
