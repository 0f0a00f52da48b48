//! Allocator response types.

use serde::{Deserialize, Serialize};

/// A disposable address, owned by the one pipeline run that allocated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Raw allocator payload.
#[derive(Debug, Deserialize)]
pub(crate) struct AllocatorResponse {
    #[serde(default, alias = "address")]
    pub email: Option<String>,
}
