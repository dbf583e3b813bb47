//! Integration tests for the account record store.

use ledger_store::config::DatabaseConfig;
use ledger_store::db::create_pool;
use ledger_store::error::LedgerError;
use ledger_store::models::Account;
use ledger_store::store::AccountStore;

// One connection, kept alive: each SQLite `:memory:` connection is its own
// database, so the pool must never rotate it.
async fn memory_store() -> AccountStore {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = AccountStore::new(pool);
    store.init_schema().await.unwrap();
    store
}

#[tokio::test]
async fn test_create_then_find_round_trips() {
    let store = memory_store().await;
    let account = Account::new("memberA", 10_000);

    let created = store.create(&account).await.unwrap();
    assert_eq!(created, account);

    let found = store.find_by_id("memberA").await.unwrap();
    assert_eq!(found, account);
}

#[tokio::test]
async fn test_find_missing_id_raises_not_found() {
    let store = memory_store().await;
    let result = store.find_by_id("nobody").await;
    assert!(matches!(result, Err(LedgerError::NotFound { id }) if id == "nobody"));
}

#[tokio::test]
async fn test_duplicate_id_raises_constraint_violation() {
    let store = memory_store().await;
    store
        .create(&Account::new("memberA", 10_000))
        .await
        .unwrap();

    let result = store.create(&Account::new("memberA", 99)).await;
    assert!(matches!(result, Err(LedgerError::ConstraintViolation { .. })));

    // The original row is untouched.
    assert_eq!(store.find_by_id("memberA").await.unwrap().balance, 10_000);
}

#[tokio::test]
async fn test_delete_twice_does_not_error() {
    let store = memory_store().await;
    store
        .create(&Account::new("memberA", 10_000))
        .await
        .unwrap();

    store.delete("memberA").await.unwrap();
    store.delete("memberA").await.unwrap();
}

#[tokio::test]
async fn test_update_balance_affects_only_matching_row() {
    let store = memory_store().await;
    store
        .create(&Account::new("memberA", 10_000))
        .await
        .unwrap();
    store
        .create(&Account::new("memberB", 10_000))
        .await
        .unwrap();

    let affected = store.update_balance("memberA", 8_000).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(store.find_by_id("memberA").await.unwrap().balance, 8_000);
    assert_eq!(store.find_by_id("memberB").await.unwrap().balance, 10_000);
}

#[tokio::test]
async fn test_update_balance_unmatched_row_returns_zero() {
    let store = memory_store().await;
    let affected = store.update_balance("nobody", 1_234).await.unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn test_records_are_durable_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let url = format!("sqlite:{}", db_path.display());

    let config = DatabaseConfig::parse(&url).unwrap();

    {
        let pool = create_pool(&config).await.unwrap();
        let store = AccountStore::new(pool.clone());
        store.init_schema().await.unwrap();
        store
            .create(&Account::new("memberA", 10_000))
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = create_pool(&config).await.unwrap();
    let store = AccountStore::new(pool.clone());
    let found = store.find_by_id("memberA").await.unwrap();
    assert_eq!(found.balance, 10_000);
    pool.close().await;
}
