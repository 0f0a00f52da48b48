//! In-memory store of provisioning outcomes.
//!
//! Lives for the lifetime of the process and is shared by every worker
//! and the status query. No external persistence.

mod store;
mod types;

pub use store::OutcomeStore;
pub use types::*;
