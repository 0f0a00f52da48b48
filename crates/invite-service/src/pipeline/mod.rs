//! One provisioning run: allocate an address, register it, fetch its link.

mod error;
mod link;
mod registration;

pub use error::{LinkError, PipelineError, RegistrationError};
pub use link::LinkRetriever;
pub use registration::{Enrollment, RegisteredTester, Registrar};

use async_trait::async_trait;
use connect_client::ConnectClient;
use mailbox_client::MailboxClient;
use outcome_store::ProvisioningOutcome;
use tracing::{info, instrument, warn};

/// A unit of work the scheduler runs once per worker per round.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Run to completion and produce the outcome to record.
    ///
    /// An `Err` means the run stopped before the link stage and,
    /// by default, nothing is recorded for it.
    async fn run(&self) -> Result<ProvisioningOutcome, PipelineError>;
}

/// The production pipeline against the mailbox allocator and Connect API.
#[derive(Clone)]
pub struct InvitePipeline {
    mailbox: MailboxClient,
    registrar: Registrar,
    links: LinkRetriever,
    group_id: String,
}

impl InvitePipeline {
    pub fn new(mailbox: MailboxClient, client: ConnectClient, group_id: impl Into<String>) -> Self {
        Self {
            mailbox,
            registrar: Registrar::new(client.clone()),
            links: LinkRetriever::new(client),
            group_id: group_id.into(),
        }
    }
}

#[async_trait]
impl Pipeline for InvitePipeline {
    #[instrument(skip(self), fields(group = %self.group_id))]
    async fn run(&self) -> Result<ProvisioningOutcome, PipelineError> {
        let identity = self.mailbox.allocate().await?;
        info!("Generated email: {}", identity.email);

        let tester = self
            .registrar
            .ensure_registered_and_enrolled(&identity, &self.group_id)
            .await
            .map_err(|source| PipelineError::Registration {
                email: identity.email.clone(),
                source,
            })?;

        match self.links.fetch_link(&tester.remote_id).await {
            Ok(link) => {
                info!("Invitation URL for {}: {}", tester.email, link);
                Ok(ProvisioningOutcome::success(tester.email, link))
            }
            Err(e) => {
                warn!("No invitation URL for {}: {}", tester.email, e);
                Ok(ProvisioningOutcome::link_unavailable(tester.email))
            }
        }
    }
}
