//! Publish-flow tests against a mocked GitHub REST API.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use sesh_sync::config::HostingConfig;
use sesh_sync::hosting::GithubClient;

const CONTENT: &str = "<http://example.org/Thing> <http://www.w3.org/2000/01/rdf-schema#label> \"thing\"@en .\n";

fn hosting() -> HostingConfig {
    HostingConfig {
        repository: "acme/ontology".to_string(),
        base_branch: "main".to_string(),
        sync_branch: "wikibase-sync".to_string(),
        file_path: "ontology.ttl".to_string(),
        token_var: "GITHUB_TOKEN".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_creates_branch_file_and_pull_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ontology/branches/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "main",
            "commit": { "sha": "abc123" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/ontology/git/refs"))
        .and(body_string_contains("refs/heads/wikibase-sync"))
        .and(body_string_contains("abc123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ref": "refs/heads/wikibase-sync"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/acme/ontology/contents/ontology.ttl"))
        .and(body_string_contains(BASE64.encode(CONTENT.as_bytes())))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "path": "ontology.ttl" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/ontology/pulls"))
        .and(body_string_contains("wikibase-sync"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/acme/ontology/pull/7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let pull_request = tokio::task::spawn_blocking(move || {
        GithubClient::with_base(base, "test-token").publish(&hosting(), CONTENT)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(pull_request.number, 7);
    assert!(pull_request.url.ends_with("/pull/7"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_base_branch_fails_the_flow_early() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ontology/branches/main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Branch not found"
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        GithubClient::with_base(base, "test-token").publish(&hosting(), CONTENT)
    })
    .await
    .unwrap();

    assert!(result.is_err());
}
