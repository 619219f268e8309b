//! Core types, rules and trait definitions for the Fathom moderation workflow.
//!
//! No HTTP or database code lives here. The observation service and the
//! account service both build on it; the storage backends and the
//! cross-service ledger client implement its traits.

pub mod error;
pub mod ledger;
pub mod moderation;
pub mod observation;
pub mod propagation;
pub mod rarity;
pub mod species;
pub mod store;
pub mod subject;
pub mod taxonomy;
pub mod throttle;
pub mod workflow;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
