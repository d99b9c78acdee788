//! The Hadron integration test harness.
//!
//! Composes stream & job definitions from fixtures, submits them to a runtime's admin server,
//! verifies what they persisted, and cleans up after itself on every exit path.

pub mod cmd;
pub mod config;
pub mod dsl;
pub mod error;
pub mod fixtures;
pub mod probe;
pub mod runtime;
pub mod scenario;
#[cfg(test)]
mod testing;
pub mod utils;

pub use crate::config::Config;
pub use crate::error::HarnessError;
pub use crate::runtime::admin::AdminClient;
pub use crate::runtime::{Runtime, RuntimeClient};
pub use crate::scenario::{Scenario, ScenarioState};
