//! HTTP-level tests over the full router with in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use convertly_api::{build_router, AppState};
use convertly_core::config::worker::PoolConfig;
use convertly_core::config::AppConfig;
use convertly_database::{JobStore, MemoryJobStore};
use convertly_entity::{ImagePayload, Job, JobFamily, JobOutput, JobPayload};
use convertly_storage::MemoryObjectStore;
use convertly_worker::transform::{DocumentTransformer, ImageTransformer};
use convertly_worker::{JobDispatcher, WorkerPool};

struct TestApp {
    router: Router,
    job_store: Arc<dyn JobStore>,
    object_store: Arc<MemoryObjectStore>,
}

fn test_app() -> TestApp {
    let config = Arc::new(AppConfig::default());
    let object_store = Arc::new(MemoryObjectStore::new());
    let job_store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());

    let pool_config = PoolConfig {
        workers: 2,
        backlog: 10,
        dispatch_timeout_ms: 1000,
    };
    let document_pool = Arc::new(WorkerPool::new(
        JobFamily::Document,
        &pool_config,
        Arc::new(DocumentTransformer::new(
            object_store.clone(),
            "soffice",
            Duration::from_secs(60),
        )),
    ));
    let image_pool = Arc::new(WorkerPool::new(
        JobFamily::Image,
        &pool_config,
        Arc::new(ImageTransformer::new(object_store.clone())),
    ));
    let dispatcher = Arc::new(JobDispatcher::new(
        job_store.clone(),
        document_pool,
        image_pool,
    ));

    let state = AppState {
        config,
        dispatcher,
        job_store: job_store.clone(),
        object_store: object_store.clone(),
    };

    TestApp {
        router: build_router(state),
        job_store,
        object_store,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_submit_image_job_is_accepted() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/jobs/image",
            json!({ "task": "resize", "key": "in.png", "scale_percent": 50 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["status"], "queued");
    assert!(body["data"]["job_id"].is_string());
}

#[tokio::test]
async fn test_invalid_merge_payload_is_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        post_json("/api/jobs/document", json!({ "task": "merge", "keys": ["one.pdf"] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_job_id_is_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        get("/api/jobs/00000000-0000-0000-0000-000000000000"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_failed_job_surfaces_error_in_status() {
    let app = test_app();
    let (_, body) = send(
        &app.router,
        post_json(
            "/api/jobs/image",
            json!({ "task": "resize", "key": "missing.png", "scale_percent": 50 }),
        ),
    )
    .await;
    let job_id = body["data"]["job_id"].as_str().expect("job id").to_string();

    // Poll until the background task lands the failure.
    for _ in 0..200 {
        let (status, body) = send(&app.router, get(&format!("/api/jobs/{job_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        match body["data"]["status"].as_str() {
            Some("failed") => {
                assert!(body["data"]["error"].is_string());
                assert!(body["data"].get("result").is_none());
                return;
            }
            Some("completed") => panic!("job should have failed"),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn test_completed_job_carries_signed_download_url() {
    let app = test_app();
    app.object_store.insert("outputs/x/out.png", vec![1u8, 2, 3]);

    // Drive a record to completed directly; the projection is what is
    // under test here.
    let payload = JobPayload::Image(ImagePayload::Convert {
        key: "in.png".into(),
        target_format: "png".into(),
    });
    let job = Job::from_payload(&payload).expect("build job");
    app.job_store.create(&job).await.expect("create");
    app.job_store.mark_processing(job.id).await.expect("processing");
    app.job_store
        .mark_completed(job.id, &JobOutput::image("outputs/x/out.png", 3, 8, 8))
        .await
        .expect("completed");

    let (status, body) = send(&app.router, get(&format!("/api/jobs/{}", job.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let url = body["data"]["result"]["download_url"]
        .as_str()
        .expect("signed url");
    assert!(url.contains("outputs/x/out.png"));

    // The signed URL must actually be servable.
    let (status, _) = send(&app.router, get(url)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_download_url_is_rejected() {
    let app = test_app();
    app.object_store.insert("outputs/y/out.png", vec![1u8]);

    let (status, body) = send(
        &app.router,
        get("/api/files/outputs/y/out.png?expires=1000&token=abc"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}
