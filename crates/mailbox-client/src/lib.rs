//! Client for a disposable mailbox allocator.

mod client;
mod error;
mod types;

pub use client::{MailboxClient, DEFAULT_ALLOCATOR_TIMEOUT, DEFAULT_ALLOCATOR_URL};
pub use error::AllocationError;
pub use types::Identity;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> MailboxClient {
        MailboxClient::new(format!("{}/v1/email", mock_server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_allocate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"email": "a@x.com", "token": "t"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let identity = client.allocate().await.unwrap();
        assert_eq!(identity, Identity::new("a@x.com"));
    }

    #[tokio::test]
    async fn test_allocate_accepts_address_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"address": "b@x.com"})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.allocate().await.unwrap().email, "b@x.com");
    }

    #[tokio::test]
    async fn test_allocate_missing_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t"})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.allocate().await;
        assert!(matches!(result, Err(AllocationError::MissingAddress)));
    }

    #[tokio::test]
    async fn test_allocate_empty_address() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"email": " "})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(matches!(
            client.allocate().await,
            Err(AllocationError::MissingAddress)
        ));
    }

    #[tokio::test]
    async fn test_allocate_server_error_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.allocate().await;
        assert!(matches!(
            result,
            Err(AllocationError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_allocate_invalid_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(matches!(client.allocate().await, Err(AllocationError::Json(_))));
    }

    #[tokio::test]
    async fn test_allocate_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/email"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"email": "a@x.com"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = MailboxClient::new(
            format!("{}/v1/email", mock_server.uri()),
            Duration::from_millis(50),
        )
        .unwrap();
        assert!(matches!(client.allocate().await, Err(AllocationError::Http(_))));
    }
}
