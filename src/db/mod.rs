//! Database access layer.
//!
//! This module provides:
//! - Connection pool construction from configuration
//! - Explicit transaction boundaries with a scoped `with_transaction` wrapper

pub mod boundary;
pub mod pool;

pub use boundary::{BoundaryState, TransactionBoundary, with_transaction};
pub use pool::create_pool;
