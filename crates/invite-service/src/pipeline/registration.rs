//! Idempotent find-or-create registration and group enrollment.

use super::error::RegistrationError;
use connect_client::{ConnectClient, NewBetaTester};
use mailbox_client::Identity;
use tracing::{error, info, instrument};

/// How the tester came to be in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    /// Found by email; assumed enrolled by an earlier run.
    Existing,
    /// Created and enrolled by this call.
    Enrolled,
}

/// A tester known to the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTester {
    pub remote_id: String,
    pub email: String,
    pub enrollment: Enrollment,
}

/// Registers testers without ever creating a duplicate for an email.
#[derive(Clone)]
pub struct Registrar {
    client: ConnectClient,
}

impl Registrar {
    pub fn new(client: ConnectClient) -> Self {
        Self { client }
    }

    /// Return the tester for `identity`, creating and enrolling it first
    /// if the remote API does not know the address yet.
    ///
    /// An existing tester short-circuits: no creation and no enrollment.
    /// A failed enrollment leaves the new tester in place and is reported
    /// as [`RegistrationError::EnrollFailed`].
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn ensure_registered_and_enrolled(
        &self,
        identity: &Identity,
        group_id: &str,
    ) -> Result<RegisteredTester, RegistrationError> {
        let email = identity.email.as_str();

        let existing = self
            .client
            .find_tester_by_email(email)
            .await
            .map_err(|source| RegistrationError::LookupFailed {
                email: email.to_string(),
                source,
            })?;

        if let Some(tester) = existing {
            info!("Tester {} already exists (ID: {}). Skipping creation.", email, tester.id);
            return Ok(RegisteredTester {
                remote_id: tester.id,
                email: email.to_string(),
                enrollment: Enrollment::Existing,
            });
        }

        let created = match self.client.create_tester(&NewBetaTester::placeholder(email)).await {
            Ok(Some(tester)) => tester,
            Ok(None) => {
                error!("Failed to create tester {}: response contained no data", email);
                return Err(RegistrationError::CreateFailed {
                    email: email.to_string(),
                    reason: "response contained no data".into(),
                });
            }
            Err(e) => {
                error!("Failed to create tester {}: {}", email, e);
                return Err(RegistrationError::CreateFailed {
                    email: email.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        info!("Created new tester: {} (ID: {})", email, created.id);

        if let Err(source) = self.client.add_tester_to_group(group_id, &created.id).await {
            error!(
                "Failed to add tester {} (ID: {}) to group {}: {}",
                email, created.id, group_id, source
            );
            return Err(RegistrationError::EnrollFailed {
                tester_id: created.id,
                group_id: group_id.to_string(),
                source,
            });
        }

        info!("Added tester {} to group {}", email, group_id);
        Ok(RegisteredTester {
            remote_id: created.id,
            email: email.to_string(),
            enrollment: Enrollment::Enrolled,
        })
    }
}
