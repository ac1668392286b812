use chrono::Utc;
use serde_json::json;
use stampede_core::{
    DurationStats, ExecuteRequest, PlanDefinition, PlanEnvironmentResult, PollResponse,
    RecurrenceType, RemoteEnvironment, ResultId,
};
use stampede_http::HttpRemote;
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ExecuteRequest {
    let plan = PlanDefinition::from_yaml(
        r#"
name: checkout
initialActivity: wait
activities:
  - name: wait
    className: delay
    config:
      millis: 5
"#,
    )
    .unwrap();

    ExecuteRequest {
        thread_count: 8,
        recurrences: 10,
        recurrence_type: RecurrenceType::Times,
        plan,
    }
}

fn completed_result() -> PlanEnvironmentResult {
    let now = Utc::now();
    PlanEnvironmentResult {
        environment_id: Uuid::new_v4(),
        plan_name: "checkout".to_string(),
        started_at: now,
        finished_at: now,
        executor_ids: (0..8).collect::<BTreeSet<_>>(),
        recurrences_run: 80,
        stats: DurationStats {
            min: Duration::from_millis(5),
            max: Duration::from_millis(40),
            average: Duration::from_millis(12),
            median: Duration::from_millis(11),
        },
        error_count: 1,
        success: false,
    }
}

#[tokio::test]
async fn test_dispatch_posts_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/executions"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"thread_count": 8, "recurrences": 10})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result_id": "run-42"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let remote = HttpRemote::new().unwrap();
    let id = remote.dispatch(&mock_server.uri(), &request()).await.unwrap();

    assert_eq!(id, ResultId::new("run-42"));
}

#[tokio::test]
async fn test_dispatch_failure_names_host() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("draining"))
        .mount(&mock_server)
        .await;

    let remote = HttpRemote::new().unwrap();
    let host = mock_server.uri();
    let err = remote.dispatch(&host, &request()).await.unwrap_err();

    assert_eq!(err.host, host);
    assert!(err.message.contains("503"));
    assert!(err.message.contains("draining"));
}

#[tokio::test]
async fn test_poll_pending_then_completed() {
    let mock_server = MockServer::start().await;
    let result = completed_result();

    // First poll is still running, the second one has the result
    Mock::given(method("GET"))
        .and(path("/executions/run-42"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/executions/run-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&result))
        .mount(&mock_server)
        .await;

    let remote = HttpRemote::new().unwrap();
    let id = ResultId::new("run-42");

    let first = remote.poll(&mock_server.uri(), &id).await.unwrap();
    assert_eq!(first, PollResponse::Pending);

    match remote.poll(&mock_server.uri(), &id).await.unwrap() {
        PollResponse::Completed(polled) => {
            assert_eq!(polled.stats, result.stats);
            assert_eq!(polled.executor_ids.len(), 8);
            assert_eq!(polled.error_count, 1);
        }
        PollResponse::Pending => panic!("expected a completed result"),
    }
}

#[tokio::test]
async fn test_poll_unknown_id_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/executions/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let remote = HttpRemote::new().unwrap();
    let err = remote
        .poll(&mock_server.uri(), &ResultId::new("gone"))
        .await
        .unwrap_err();
    assert!(err.message.contains("404"));
}

#[tokio::test]
async fn test_poll_rejects_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/executions/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let remote = HttpRemote::new().unwrap();
    let err = remote
        .poll(&mock_server.uri(), &ResultId::new("run-1"))
        .await
        .unwrap_err();
    assert!(err.message.contains("Invalid JSON"));
}

#[tokio::test]
async fn test_unreachable_host_is_dispatch_error() {
    let remote = HttpRemote::from_config(&stampede_config::HttpConfig {
        connection_timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let err = remote.dispatch("127.0.0.1:1", &request()).await.unwrap_err();
    assert_eq!(err.host, "127.0.0.1:1");
}
