//! Account record model.

use serde::{Deserialize, Serialize};

/// A single row of the `records` table.
///
/// The id is immutable once the record is created; the balance is mutated
/// only through the store's update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: String,
    /// Balance in currency minor units.
    pub balance: i64,
}

impl Account {
    /// Create a new account record.
    pub fn new(id: impl Into<String>, balance: i64) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }
}
