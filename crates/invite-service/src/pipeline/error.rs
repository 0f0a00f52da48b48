//! Pipeline stage errors.

use connect_client::ConnectError;
use mailbox_client::AllocationError;
use thiserror::Error;

/// Failure to find or create and enroll a tester.
///
/// None of these are retried inside the registrar. Nothing created
/// remotely is rolled back.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Tester lookup failed for {email}: {source}")]
    LookupFailed {
        email: String,
        #[source]
        source: ConnectError,
    },

    #[error("Failed to create tester {email}: {reason}")]
    CreateFailed { email: String, reason: String },

    /// The tester exists remotely but is not in the group.
    #[error("Failed to add tester {tester_id} to group {group_id}: {source}")]
    EnrollFailed {
        tester_id: String,
        group_id: String,
        #[source]
        source: ConnectError,
    },
}

impl RegistrationError {
    /// Remote id of a tester left behind created but unenrolled.
    pub fn orphaned_tester(&self) -> Option<&str> {
        match self {
            RegistrationError::EnrollFailed { tester_id, .. } => Some(tester_id),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Invite link request failed: {0}")]
    Request(#[from] ConnectError),

    #[error("Invite link not available for tester {0}")]
    NotAvailable(String),
}

/// Failure that aborts one pipeline run before an outcome exists.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Mailbox allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Registration failed for {email}: {source}")]
    Registration {
        email: String,
        #[source]
        source: RegistrationError,
    },
}

impl PipelineError {
    /// Address the run was working on, if one was allocated.
    pub fn email(&self) -> Option<&str> {
        match self {
            PipelineError::Allocation(_) => None,
            PipelineError::Registration { email, .. } => Some(email),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Allocation(_) => "allocation",
            PipelineError::Registration { .. } => "registration",
        }
    }
}
