//! SQLite backends for the Fathom services.
//!
//! Each service owns its own database file: [`SqliteObservationStore`] for
//! the observation service and [`SqliteLedgerStore`] for the account service.
//! Both wrap [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod ledger;
mod observations;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use ledger::SqliteLedgerStore;
pub use observations::SqliteObservationStore;

#[cfg(test)]
mod tests;
