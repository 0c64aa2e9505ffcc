//! Queue worker: fetch, serialize, store, take

use super::fixtures::{encoded_image, gif};
use super::test_server::{CannedResponse, TestServer};
use bytes::Bytes;
use hachidori::error::ErrorKind;
use hachidori::image_optimizer::{ImageFetcher, Optimizer};
use hachidori::queue::{
    deserialize_result, new_job_id, MemoryResultStore, OptimizeJob, ResultStore, Worker,
};
use image::ImageFormat;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (Worker, Arc<dyn ResultStore>) {
    let store: Arc<dyn ResultStore> =
        Arc::new(MemoryResultStore::with_ttl(Duration::from_secs(60)));
    let fetcher = ImageFetcher::new(Optimizer::default()).expect("Failed to create fetcher");
    (Worker::new(fetcher, store.clone()), store)
}

fn job(url: String, width: u32) -> OptimizeJob {
    OptimizeJob {
        url,
        width,
        quality: 75,
        allow_svg: false,
    }
}

#[tokio::test]
async fn test_job_result_survives_the_store() {
    let server = TestServer::start(
        CannedResponse::ok(encoded_image(40, 40, ImageFormat::Png))
            .header("Content-Type", "image/png")
            .header("Cache-Control", "public, max-age=300"),
    )
    .await;
    let (worker, store) = setup();
    let job_id = new_job_id();

    worker
        .run_job(&job_id, &job(server.url("/a.png"), 10))
        .await
        .unwrap();

    // The stored value is the serialized blob
    let blob = store.get(&job_id).await.unwrap().expect("blob stored");
    let stored = deserialize_result(blob).unwrap();

    let result = worker.take_result(&job_id).await.unwrap().expect("result");
    assert_eq!(result, stored);
    assert_eq!(result.content_type.as_deref(), Some("image/png"));
    assert_eq!(result.cache_control.as_deref(), Some("public, max-age=300"));

    // Taken results are gone
    assert_eq!(worker.take_result(&job_id).await.unwrap(), None);
}

#[tokio::test]
async fn test_rerunning_a_job_overwrites_its_result() {
    let server = TestServer::start(CannedResponse::ok(encoded_image(30, 30, ImageFormat::Png))).await;
    let (worker, store) = setup();
    let payload = job(server.url("/a.png"), 20);

    worker.run_job("job-1", &payload).await.unwrap();
    let first = store.get("job-1").await.unwrap();
    worker.run_job("job-1", &payload).await.unwrap();
    let second = store.get("job-1").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_job_leaves_no_result() {
    let server = TestServer::start(CannedResponse::ok(gif(2))).await;
    let (worker, _store) = setup();

    let err = worker
        .run_job("job-1", &job(server.url("/a.gif"), 20))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedAnimated);
    assert_eq!(worker.take_result("job-1").await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupted_blob_surfaces_malformed_payload() {
    let (worker, store) = setup();
    let mut blob = vec![0u8; 24];
    blob.push(0xFF);
    store.put("job-1", Bytes::from(blob)).await.unwrap();

    let err = worker.take_result("job-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPayload);
    assert_eq!(err.reason(), Some("trailing bytes found"));
}
