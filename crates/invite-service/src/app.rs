//! Wiring from configuration to application state.

use crate::api::AppState;
use crate::config::Config;
use crate::pipeline::InvitePipeline;
use anyhow::{Context, Result};
use connect_client::{ConnectClient, RetryPolicy, TokenMinter};
use mailbox_client::MailboxClient;
use std::sync::Arc;
use tracing::info;

/// Build the signing client, mailbox client and pipeline.
///
/// Fails if the private key cannot be read or does not sign, so the
/// process never starts serving with a broken key.
pub fn build_state(config: &Config) -> Result<AppState> {
    let minter = TokenMinter::from_pem_file(
        config.connect.issuer_id.clone(),
        config.connect.key_id.clone(),
        &config.connect.private_key_path,
    )
    .with_context(|| {
        format!(
            "Failed to load signing key from {}",
            config.connect.private_key_path.display()
        )
    })?
    .with_audience(config.connect.audience.clone())
    .with_ttl(config.connect.token_ttl);

    minter.mint().context("Signing key cannot produce tokens")?;
    info!(key_id = %minter.key_id(), ttl = ?minter.ttl(), "Signing key loaded");

    let client = ConnectClient::new(
        config.connect.base_url.clone(),
        minter,
        config.connect.request_timeout,
    )
    .context("Failed to create Connect API client")?
    .with_retry_policy(RetryPolicy::new(
        config.connect.max_attempts,
        config.connect.backoff_base,
    ));

    let mailbox = MailboxClient::new(config.mailbox.url.clone(), config.mailbox.timeout)
        .context("Failed to create mailbox client")?;

    let pipeline = InvitePipeline::new(mailbox, client, config.beta.group_id.clone());

    Ok(AppState::new(
        Arc::new(pipeline),
        config.scheduler.clone(),
        config.server.api_key.clone(),
    ))
}
