//! Ledger store - main entry point.
//!
//! CLI over the account ledger: record CRUD plus atomic two-account
//! transfers, backed by SQLite.

use ledger_store::config::{Command, Config};
use ledger_store::db::create_pool;
use ledger_store::models::Account;
use ledger_store::service::{TransferPolicy, TransferService};
use ledger_store::store::AccountStore;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();

    init_tracing(&config);

    info!("Starting ledger-store v{}", env!("CARGO_PKG_VERSION"));

    let db_config = config.parse_database()?;
    let pool = create_pool(&db_config).await?;
    let store = AccountStore::new(pool.clone());

    let result = run(&config, &store).await;

    pool.close().await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        return Err(e.into());
    }

    Ok(())
}

async fn run(config: &Config, store: &AccountStore) -> ledger_store::LedgerResult<()> {
    match &config.command {
        Command::Init => {
            store.init_schema().await?;
            println!("schema ready");
        }
        Command::Create { id, balance } => {
            let created = store.create(&Account::new(id.clone(), *balance)).await?;
            println!("{}", serde_json::to_string(&created).unwrap_or_default());
        }
        Command::Get { id } => {
            let account = store.find_by_id(id).await?;
            println!("{}", serde_json::to_string(&account).unwrap_or_default());
        }
        Command::SetBalance { id, balance } => {
            let affected = store.update_balance(id, *balance).await?;
            println!("updated {} record(s)", affected);
        }
        Command::Delete { id } => {
            store.delete(id).await?;
            println!("deleted {}", id);
        }
        Command::Transfer { from, to, amount } => {
            let policy = TransferPolicy::new(config.blocked_accounts.iter().cloned());
            let service = TransferService::new(store.pool().clone(), policy);
            service.transfer(from, to, *amount).await?;

            let from_account = store.find_by_id(from).await?;
            let to_account = store.find_by_id(to).await?;
            println!(
                "{}",
                serde_json::to_string(&[from_account, to_account]).unwrap_or_default()
            );
        }
    }
    Ok(())
}
