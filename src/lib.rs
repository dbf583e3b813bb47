//! Transactional account ledger.
//!
//! A minimal SQLite-backed record store plus a transfer service that moves a
//! balance between two records inside one atomic transaction boundary.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};
pub use models::Account;
pub use service::{TransferPolicy, TransferService};
pub use store::AccountStore;
