//! End-to-end dispatch tests
//!
//! Drives the full pipeline: JSON-RPC line in, tool dispatch against mocked
//! vendor APIs, envelope-carrying JSON-RPC line out.

use courier_auth::{Credential, CredentialStore, Provider, ProviderConfig};
use courier_mcp::clients::{AdapterConfig, VendorEndpoint};
use courier_mcp::server::{McpServer, ToolContext};
use courier_mcp::stdio::handle_line;
use courier_mcp::tools::all_tools;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_credential_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("courier-e2e-{}.json", uuid::Uuid::now_v7()))
}

fn fresh_credential() -> Credential {
    Credential {
        access_token: "e2e-access-token".to_string(),
        refresh_token: Some("e2e-refresh-token".to_string()),
        token_type: "Bearer".to_string(),
        scope: None,
        expires_in: Some(3600),
        created_at: chrono::Utc::now().timestamp(),
    }
}

/// Build a server wired to the given mock vendor endpoints, with a valid
/// credential already on disk.
async fn setup_server(mail_uri: &str, design_uri: &str) -> McpServer {
    let provider = ProviderConfig::new(
        Provider::Custom,
        "e2e-client",
        "e2e-secret",
        "http://localhost:3000/callback",
    );
    let store = Arc::new(CredentialStore::new(temp_credential_path(), provider));
    store
        .store(fresh_credential())
        .await
        .expect("failed to seed credential");

    let config = AdapterConfig {
        mail: VendorEndpoint::new(mail_uri),
        design: VendorEndpoint::new(design_uri),
        default_timeout_secs: 5,
        poll_interval_ms: 10,
        poll_deadline_ms: 2_000,
    };

    let server = McpServer::courier().with_store(store.clone());
    server.register_tools(all_tools(&config, store)).await;
    server
}

#[tokio::test]
async fn test_tools_list_exposes_all_tools() {
    let server = setup_server("http://localhost:1", "http://localhost:1").await;

    let request = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
    let response = handle_line(&server, request).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();

    let tools = parsed["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"mail_list_messages"));
    assert!(names.contains(&"design_export"));
    assert!(names.contains(&"parse_datetime"));

    // Wire shape: schema goes out camelCased.
    assert!(tools[0].get("inputSchema").is_some());
    assert!(tools[0].get("input_schema").is_none());
}

#[tokio::test]
async fn test_mail_list_happy_path() {
    let mail = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [
                { "id": "m1", "threadId": "t1" },
                { "id": "m2", "threadId": "t1" }
            ],
            "resultSizeEstimate": 2
        })))
        .expect(1)
        .mount(&mail)
        .await;

    let server = setup_server(&mail.uri(), "http://localhost:1").await;

    let result = server
        .call_tool(
            "mail_list_messages",
            serde_json::json!({ "query": "is:unread" }),
            &ToolContext::empty(),
        )
        .await;

    assert!(!result.is_error);
    let envelope = result.envelope().unwrap();
    assert!(envelope.success);
    assert_eq!(envelope.data.unwrap()["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_vendor_error_stays_inside_envelope() {
    let mail = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mail)
        .await;

    let server = setup_server(&mail.uri(), "http://localhost:1").await;

    // Drive it through the full JSON-RPC path: the failure must surface as
    // a successful response carrying an isError result, never as a JSON-RPC
    // error object.
    let request = r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"mail_list_messages","arguments":{}}}"#;
    let response = handle_line(&server, request).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();

    assert!(parsed.get("error").is_none());
    assert_eq!(parsed["result"]["isError"], true);

    let text = parsed["result"]["content"][0]["text"].as_str().unwrap();
    let envelope: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(envelope["success"], false);
    assert!(envelope["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_unknown_tool_reports_name() {
    let server = setup_server("http://localhost:1", "http://localhost:1").await;

    let result = server
        .call_tool("nope", serde_json::json!({}), &ToolContext::empty())
        .await;

    assert!(result.is_error);
    let envelope = result.envelope().unwrap();
    assert!(!envelope.success);
    assert_eq!(envelope.error.unwrap(), "Unknown tool: nope");
}

#[tokio::test]
async fn test_design_export_polls_to_completion() {
    let design = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/exports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job": { "id": "job-1", "status": "in_progress" }
        })))
        .expect(1)
        .mount(&design)
        .await;

    // First two status checks report in_progress, then the job succeeds.
    Mock::given(method("GET"))
        .and(path("/rest/v1/exports/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job": { "id": "job-1", "status": "in_progress" }
        })))
        .up_to_n_times(2)
        .mount(&design)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/exports/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job": {
                "id": "job-1",
                "status": "success",
                "urls": ["https://cdn.example.com/export.png"]
            }
        })))
        .mount(&design)
        .await;

    let server = setup_server("http://localhost:1", &design.uri()).await;

    let result = server
        .call_tool(
            "design_export",
            serde_json::json!({ "design_id": "d-42" }),
            &ToolContext::empty(),
        )
        .await;

    assert!(!result.is_error);
    let envelope = result.envelope().unwrap();
    assert!(envelope.success);

    let data = envelope.data.unwrap();
    assert_eq!(data["status"], "success");
    assert_eq!(data["urls"][0], "https://cdn.example.com/export.png");
}

#[tokio::test]
async fn test_design_export_failure_carries_reason() {
    let design = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/exports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job": { "id": "job-9", "status": "in_progress" }
        })))
        .mount(&design)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/exports/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job": { "id": "job-9", "status": "failed", "error": "render quota exceeded" }
        })))
        .mount(&design)
        .await;

    let server = setup_server("http://localhost:1", &design.uri()).await;

    let result = server
        .call_tool(
            "design_export",
            serde_json::json!({ "design_id": "d-9" }),
            &ToolContext::empty(),
        )
        .await;

    assert!(result.is_error);
    let envelope = result.envelope().unwrap();
    assert!(!envelope.success);
    assert_eq!(
        envelope.error.unwrap(),
        "Job failed: render quota exceeded"
    );
}
