//! End-to-end tests of one provisioning run against mock remotes.

mod common;

use common::{test_connect_client, test_mailbox_client, tester_json};
use invite_service::pipeline::{InvitePipeline, Pipeline, PipelineError};
use outcome_store::LINK_UNAVAILABLE;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_allocator(mock_server: &MockServer, email: &str) {
    Mock::given(method("GET"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": email,
            "token": "ignored"
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_new_address_produces_link() {
    let mock_server = MockServer::start().await;
    mount_allocator(&mock_server, "a@x.com").await;

    Mock::given(method("GET"))
        .and(path("/betaTesters"))
        .and(query_param("filter[email]", "a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/betaTesters"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "data": tester_json("T1", "a@x.com") })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/betaGroups/G1/relationships/betaTesters"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/betaTesters/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "betaTesters",
                "id": "T1",
                "attributes": { "inviteUrl": "https://testflight.apple.com/join/T1" }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = InvitePipeline::new(
        test_mailbox_client(&mock_server),
        test_connect_client(&mock_server),
        "G1",
    );
    let outcome = pipeline.run().await.unwrap();

    assert_eq!(outcome.email, "a@x.com");
    assert_eq!(outcome.link(), Some("https://testflight.apple.com/join/T1"));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_existing_address_skips_create_and_enroll() {
    let mock_server = MockServer::start().await;
    mount_allocator(&mock_server, "b@x.com").await;

    Mock::given(method("GET"))
        .and(path("/betaTesters"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [tester_json("T2", "b@x.com")] })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/betaTesters/T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "betaTesters",
                "id": "T2",
                "attributes": { "inviteUrl": "https://testflight.apple.com/join/T2" }
            }
        })))
        .mount(&mock_server)
        .await;

    let pipeline = InvitePipeline::new(
        test_mailbox_client(&mock_server),
        test_connect_client(&mock_server),
        "G1",
    );
    let outcome = pipeline.run().await.unwrap();

    assert_eq!(outcome.link(), Some("https://testflight.apple.com/join/T2"));
}

#[tokio::test]
async fn test_missing_link_records_placeholder() {
    let mock_server = MockServer::start().await;
    mount_allocator(&mock_server, "c@x.com").await;

    Mock::given(method("GET"))
        .and(path("/betaTesters"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [tester_json("T3", "c@x.com")] })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/betaTesters/T3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "type": "betaTesters", "id": "T3", "attributes": {} }
        })))
        .mount(&mock_server)
        .await;

    let pipeline = InvitePipeline::new(
        test_mailbox_client(&mock_server),
        test_connect_client(&mock_server),
        "G1",
    );
    let outcome = pipeline.run().await.unwrap();

    assert_eq!(outcome.email, "c@x.com");
    assert!(!outcome.is_success());
    assert_eq!(
        serde_json::to_value(&outcome).unwrap()["link"],
        format!("Error: {}", LINK_UNAVAILABLE)
    );
}

#[tokio::test]
async fn test_allocation_failure_stops_before_registration() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/betaTesters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = InvitePipeline::new(
        test_mailbox_client(&mock_server),
        test_connect_client(&mock_server),
        "G1",
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, PipelineError::Allocation(_)));
    assert_eq!(err.stage(), "allocation");
    assert_eq!(err.email(), None);
}

#[tokio::test]
async fn test_registration_failure_carries_email() {
    let mock_server = MockServer::start().await;
    mount_allocator(&mock_server, "d@x.com").await;

    Mock::given(method("GET"))
        .and(path("/betaTesters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/betaTesters"))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let pipeline = InvitePipeline::new(
        test_mailbox_client(&mock_server),
        test_connect_client(&mock_server),
        "G1",
    );
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.stage(), "registration");
    assert_eq!(err.email(), Some("d@x.com"));
}
