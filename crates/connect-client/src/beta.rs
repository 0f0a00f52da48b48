//! Beta tester, group and invite link operations.

use crate::client::ConnectClient;
use crate::error::ConnectError;
use crate::types::{tester_linkage, ApiResponse, BetaTester, Document, NewBetaTester};
use tracing::{debug, instrument};
use urlencoding::encode;

impl ConnectClient {
    /// Look up a tester by email address.
    #[instrument(skip(self))]
    pub async fn find_tester_by_email(
        &self,
        email: &str,
    ) -> Result<Option<BetaTester>, ConnectError> {
        let response = self
            .get("/betaTesters", &[("filter[email]", email), ("limit", "1")])
            .await?;

        let Some(body) = response.into_json() else {
            return Ok(None);
        };
        let document: Document<Vec<BetaTester>> = serde_json::from_value(body)?;
        Ok(document.data.into_iter().next())
    }

    /// Create a tester record. `None` means the API answered without data.
    #[instrument(skip(self, tester), fields(email = %tester.email))]
    pub async fn create_tester(
        &self,
        tester: &NewBetaTester,
    ) -> Result<Option<BetaTester>, ConnectError> {
        let response = self.post("/betaTesters", &tester.to_document()).await?;

        let Some(body) = response.into_json() else {
            return Ok(None);
        };
        let document: Document<Option<BetaTester>> = serde_json::from_value(body)?;
        Ok(document.data)
    }

    /// Add an existing tester to a beta group.
    ///
    /// The API answers `204 No Content` on success, which comes back as
    /// [`ApiResponse::NoContent`].
    #[instrument(skip(self))]
    pub async fn add_tester_to_group(
        &self,
        group_id: &str,
        tester_id: &str,
    ) -> Result<ApiResponse, ConnectError> {
        let path = format!("/betaGroups/{}/relationships/betaTesters", encode(group_id));
        self.post(&path, &tester_linkage(&[tester_id])).await
    }

    /// Fetch only the invite link of a tester, if the API has one yet.
    #[instrument(skip(self))]
    pub async fn invite_url(&self, tester_id: &str) -> Result<Option<String>, ConnectError> {
        let path = format!("/betaTesters/{}", encode(tester_id));
        let response = self
            .get(&path, &[("fields[betaTesters]", "inviteUrl")])
            .await?;

        let Some(body) = response.into_json() else {
            debug!("Tester detail returned no content");
            return Ok(None);
        };
        let document: Document<Option<BetaTester>> = serde_json::from_value(body)?;
        Ok(document
            .data
            .and_then(|tester| tester.attributes.invite_url)
            .filter(|url| !url.is_empty()))
    }
}
