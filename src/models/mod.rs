//! Data models for the ledger store.

pub mod account;

pub use account::Account;
