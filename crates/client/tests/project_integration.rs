//! End-to-end facade tests against a mocked ingestion service.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use roost_client::{Project, ProjectConfig, ThrottlePolicy};
use roost_domain::{
    job_guid, ClientError, Credentials, Job, JobDetail, JobState, ResultSet, ResultSetKind,
    Revision, THROTTLE_WAIT_HEADER,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hawk_project(server: &MockServer, throttle: ThrottlePolicy) -> Project {
    Project::new(
        "gaia",
        ProjectConfig {
            base_url: server.uri(),
            credentials: Some(Credentials::hawk("client-id", "secret")),
            throttle,
            ..ProjectConfig::default()
        },
    )
    .expect("project")
}

fn sample_result_set() -> ResultSet {
    ResultSet {
        revision_hash: "435323".into(),
        push_timestamp: 1387221298.0,
        kind: ResultSetKind::Push,
        revisions: vec![Revision {
            comment: "I did stuff".into(),
            revision: "23333".into(),
            repository: "gaia".into(),
            author: "J Doe <jdoe@example.com>".into(),
            files: vec!["dom/foo/bar".into()],
        }],
        author: None,
    }
}

fn sample_job() -> Job {
    Job {
        project: "gaia".into(),
        revision_hash: "435323".into(),
        job: JobDetail {
            job_guid: job_guid(),
            name: "Testing gaia".into(),
            reason: "scheduler".into(),
            job_symbol: "?".into(),
            submit_timestamp: 1387221298,
            start_timestamp: 1387221345,
            end_timestamp: 1387222817,
            state: JobState::Pending,
            log_references: vec![],
            option_collection: BTreeMap::from([("opt".to_string(), true)]),
        },
    }
}

#[tokio::test]
async fn result_set_round_trip_preserves_revision_hash() {
    let server = MockServer::start().await;
    let posted = sample_result_set();

    Mock::given(method("POST"))
        .and(path("/project/gaia/resultset/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/project/gaia/resultset/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![posted.clone()]))
        .expect(1)
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::Disabled);
    project.post_result_sets(std::slice::from_ref(&posted)).await.expect("post");

    let fetched = project.get_result_sets().await.expect("get");
    assert!(fetched.iter().any(|rs| rs.revision_hash == posted.revision_hash));

    // the write was Hawk-signed, the read was not
    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let auth = post.headers.get("authorization").unwrap().to_str().unwrap();
    assert!(auth.starts_with("Hawk id=\"client-id\""));
    assert_eq!(
        post.headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    let body: Vec<ResultSet> = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(body[0].revision_hash, posted.revision_hash);

    let get = requests.iter().find(|r| r.method.as_str() == "GET").unwrap();
    assert!(get.headers.get("authorization").is_none());
}

#[tokio::test]
async fn write_without_credentials_fails_before_any_network_call() {
    let server = MockServer::start().await;

    let project = Project::new(
        "gaia",
        ProjectConfig { base_url: server.uri(), ..ProjectConfig::default() },
    )
    .expect("project");

    let err = project.post_result_sets(&[sample_result_set()]).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let err = project.post_jobs(&[sample_job()]).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn throttled_write_retries_once_and_succeeds() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/project/gaia/resultset/"))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429).insert_header(THROTTLE_WAIT_HEADER, "2")
            } else {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({}))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::Limited(5));
    let started = Instant::now();
    project.post_result_sets(&[sample_result_set()]).await.expect("post after retry");

    assert_eq!(attempts.load(Ordering::SeqCst), 2, "exactly one retry");
    assert!(started.elapsed() >= Duration::from_secs(2), "server-specified wait honored");
}

#[tokio::test]
async fn throttling_disabled_by_default_propagates_the_429() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/gaia/resultset/"))
        .respond_with(ResponseTemplate::new(429).insert_header(THROTTLE_WAIT_HEADER, "2"))
        .expect(1)
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::default());
    let err = project.post_result_sets(&[sample_result_set()]).await.unwrap_err();

    match err {
        ClientError::Service(service) => {
            assert!(service.is_throttled());
            assert_eq!(service.throttle_wait(), Some(Duration::from_secs(2)));
        }
        other => panic!("expected service error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn exhausted_throttle_budget_surfaces_the_last_429() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/gaia/jobs/"))
        .respond_with(ResponseTemplate::new(429).insert_header(THROTTLE_WAIT_HEADER, "0"))
        .expect(3)
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::Limited(2));
    let err = project.post_jobs(&[sample_job()]).await.unwrap_err();

    match err {
        ClientError::Service(service) => assert!(service.is_throttled()),
        other => panic!("expected service error, got {other:?}"),
    }
    // initial attempt plus two retries
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn oauth_writes_carry_query_parameters_not_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/gaia/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let project = Project::new(
        "gaia",
        ProjectConfig {
            base_url: server.uri(),
            credentials: Some(Credentials::oauth("consumer-key", "consumer-secret")),
            ..ProjectConfig::default()
        },
    )
    .expect("project");

    project.post_jobs(&[sample_job()]).await.expect("post");

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    assert!(request.headers.get("authorization").is_none());

    let query: BTreeMap<String, String> = request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(query.get("oauth_consumer_key").map(String::as_str), Some("consumer-key"));
    assert_eq!(query.get("oauth_signature_method").map(String::as_str), Some("HMAC-SHA1"));
    assert_eq!(query.get("oauth_token").map(String::as_str), Some(""));
    assert_eq!(query.get("user").map(String::as_str), Some("gaia"));
    assert!(!query.get("oauth_signature").unwrap().is_empty());
    assert!(!query.get("oauth_body_hash").unwrap().is_empty());
}

#[tokio::test]
async fn job_round_trip_preserves_the_submission() {
    let server = MockServer::start().await;
    let job = sample_job();

    Mock::given(method("POST"))
        .and(path("/project/gaia/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/project/gaia/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![job.clone()]))
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::Disabled);
    project.post_jobs(std::slice::from_ref(&job)).await.expect("post");

    let jobs = project.get_jobs().await.expect("get");
    assert_eq!(jobs, vec![job]);
}

#[tokio::test]
async fn structured_service_errors_reach_the_caller() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/gaia/resultset/"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({ "message": "maintenance window" })),
        )
        .mount(&server)
        .await;

    let project = hawk_project(&server, ThrottlePolicy::default());
    let err = project.post_result_sets(&[sample_result_set()]).await.unwrap_err();

    match err {
        ClientError::Service(service) => {
            assert_eq!(service.status, Some(503));
            assert!(service.message.contains("maintenance window"));
            assert!(service.path.contains("/project/gaia/resultset/"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}
