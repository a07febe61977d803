use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use jobhands_control::{JobControlService, JobRegistration, JobRegistry};
use jobhands_engine::{EngineConfig, JobContext, JobError, JobHandler, SchedulerEngine};
use jobhands_store::MemoryJobRecordStore;
use serde_json::{Value, json};
use tower::ServiceExt;

struct NoopJob;

#[async_trait]
impl JobHandler for NoopJob {
    async fn execute(&self, _ctx: JobContext) -> Result<(), JobError> {
        Ok(())
    }
}

fn create_test_router() -> Router {
    let registry = JobRegistry::new();
    registry
        .register(JobRegistration::new("reports.daily", Arc::new(NoopJob)))
        .unwrap();
    let service = JobControlService::new(
        Arc::new(MemoryJobRecordStore::new()),
        Arc::new(registry),
        Arc::new(SchedulerEngine::new(EngineConfig::default())),
    );
    create_router(Arc::new(ApiState::new(Arc::new(service))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn daily_job() -> Value {
    json!({
        "id": "job-1",
        "name": "daily",
        "group": "reports",
        "job_class": "reports.daily",
        "data": {"recipients": 3},
        "triggers": [
            {"name": "midnight", "group": "reports", "kind": "CRON", "cron_expression": "0 0 0 * * ?"}
        ]
    })
}

#[tokio::test]
async fn test_health() {
    let app = create_test_router();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scheduler_started"], false);
    assert_eq!(body["scheduled_jobs"], 0);
}

#[tokio::test]
async fn test_list_jobs_empty() {
    let app = create_test_router();
    let (status, body) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["jobs"], json!([]));
}

#[tokio::test]
async fn test_create_and_get_job() {
    let app = create_test_router();
    let (status, body) = send(&app, Method::POST, "/jobs", Some(daily_job())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "job-1");

    let (status, body) = send(&app, Method::GET, "/jobs/job-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "daily");
    assert_eq!(body["data"]["recipients"], 3);
    assert_eq!(body["status"], "UNSCHEDULED");

    let (_, body) = send(&app, Method::GET, "/jobs?group=reports", None).await;
    assert_eq!(body["count"], 1);
    let (_, body) = send(&app, Method::GET, "/jobs?group=other", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_create_job_rejections() {
    let app = create_test_router();

    let mut unknown_class = daily_job();
    unknown_class["job_class"] = json!("reports.weekly");
    let (status, body) = send(&app, Method::POST, "/jobs", Some(unknown_class)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let mut bad_cron = daily_job();
    bad_cron["triggers"][0]["cron_expression"] = json!("not a cron");
    let (status, _) = send(&app, Method::POST, "/jobs", Some(bad_cron)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut empty_name = daily_job();
    empty_name["name"] = json!("  ");
    let (status, _) = send(&app, Method::POST, "/jobs", Some(empty_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected requests store nothing.
    let (_, body) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_create_job_trigger_conflict() {
    let app = create_test_router();
    let (status, _) = send(&app, Method::POST, "/jobs", Some(daily_job())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut clash = daily_job();
    clash["id"] = json!("job-2");
    clash["name"] = json!("nightly");
    let (status, body) = send(&app, Method::POST, "/jobs", Some(clash)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("reports.midnight"));

    let (status, _) = send(&app, Method::GET, "/jobs/job-2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, Method::GET, "/jobs", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = create_test_router();
    for (method, uri) in [
        (Method::GET, "/jobs/missing"),
        (Method::DELETE, "/jobs/missing"),
        (Method::GET, "/jobs/missing/triggers"),
        (Method::PUT, "/jobs/missing/schedule"),
        (Method::PUT, "/jobs/missing/pause"),
        (Method::PUT, "/jobs/missing/fire"),
    ] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_control_actions() {
    let app = create_test_router();
    send(&app, Method::POST, "/jobs", Some(daily_job())).await;

    let (status, body) = send(&app, Method::PUT, "/jobs/job-1/schedule", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));
    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/schedule", None).await;
    assert_eq!(body, json!(false));
    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/reschedule", None).await;
    assert_eq!(body, json!(true));

    let (_, body) = send(&app, Method::GET, "/jobs/job-1/triggers", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["triggers"][0]["status"], "ACTIVE");
    assert!(body["triggers"][0]["next_fire_time"].is_string());

    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/pause", None).await;
    assert_eq!(body, json!(true));
    let (_, body) = send(&app, Method::GET, "/jobs/job-1", None).await;
    assert_eq!(body["status"], "PAUSED");

    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/resume", None).await;
    assert_eq!(body, json!(true));
    let (_, body) = send(&app, Method::GET, "/jobs/job-1", None).await;
    assert_eq!(body["status"], "ACTIVE");

    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(body["scheduled_jobs"], 1);

    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/unschedule", None).await;
    assert_eq!(body, json!(true));
    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/unschedule", None).await;
    assert_eq!(body, json!(false));
    let (_, body) = send(&app, Method::PUT, "/jobs/job-1/fire", None).await;
    assert_eq!(body, json!(false));
}

#[tokio::test]
async fn test_delete_job() {
    let app = create_test_router();
    send(&app, Method::POST, "/jobs", Some(daily_job())).await;
    send(&app, Method::PUT, "/jobs/job-1/schedule", None).await;

    let (status, body) = send(&app, Method::DELETE, "/jobs/job-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, "/jobs/job-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(body["scheduled_jobs"], 0);
}

#[tokio::test]
async fn test_scheduler_monitoring() {
    let app = create_test_router();
    let (status, body) = send(&app, Method::GET, "/scheduler/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fired"], 0);
    assert_eq!(body["failed"], 0);

    let (status, body) = send(&app, Method::GET, "/scheduler/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
