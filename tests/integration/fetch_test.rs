//! Fetch-and-optimize against a local upstream
//!
//! Run with:
//!   cargo test --test integration_tests fetch

use super::fixtures::{dimensions, encoded_image, gif, SVG};
use super::test_server::{CannedResponse, TestServer};
use hachidori::error::{ErrorKind, OptimizeError};
use hachidori::image_optimizer::{ImageFetcher, Optimizer};
use image::ImageFormat;

fn fetcher() -> ImageFetcher {
    ImageFetcher::new(Optimizer::default()).expect("Failed to create fetcher")
}

#[tokio::test]
async fn test_fetch_copies_upstream_headers_verbatim() {
    let png = encoded_image(64, 32, ImageFormat::Png);
    let server = TestServer::start(
        CannedResponse::ok(png)
            .header("Content-Type", "image/png")
            .header("Cache-Control", "public, max-age=300"),
    )
    .await;

    let result = fetcher()
        .fetch_and_optimize(&server.url("/a.png"), 16, 75, false)
        .await
        .unwrap();

    assert_eq!(result.content_type.as_deref(), Some("image/png"));
    assert_eq!(result.cache_control.as_deref(), Some("public, max-age=300"));
    assert_eq!(&result.buffer[0..4], &[0x89, 0x50, 0x4E, 0x47]);
    assert_eq!(dimensions(&result.buffer), (16, 8));
}

#[tokio::test]
async fn test_fetch_without_headers_leaves_them_absent() {
    let jpeg = encoded_image(20, 20, ImageFormat::Jpeg);
    let server = TestServer::start(CannedResponse::ok(jpeg)).await;

    let result = fetcher()
        .fetch_and_optimize(&server.url("/a.jpg"), 100, 80, false)
        .await
        .unwrap();

    assert_eq!(result.content_type, None);
    assert_eq!(result.cache_control, None);
    assert_eq!(&result.buffer[0..2], &[0xFF, 0xD8]);
    assert_eq!(dimensions(&result.buffer), (20, 20));
}

#[tokio::test]
async fn test_upstream_error_status_carries_status_and_body() {
    let server = TestServer::start(CannedResponse::status(404, "no such image")).await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/missing.png"), 100, 75, false)
        .await
        .unwrap_err();

    match &err {
        OptimizeError::UpstreamFetchFailed { status, body } => {
            assert_eq!(*status, 404);
            assert_eq!(body, "no such image");
        }
        other => panic!("expected UpstreamFetchFailed, got {:?}", other),
    }
    assert_eq!(err.to_http_status(), 502);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_upstream_server_error_with_empty_body() {
    let server = TestServer::start(CannedResponse::status(503, "")).await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/a.png"), 100, 75, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OptimizeError::UpstreamFetchFailed { status: 503, ref body } if body.is_empty()
    ));
}

#[tokio::test]
async fn test_non_image_body_is_invalid_input() {
    let server = TestServer::start(
        CannedResponse::ok(b"<html>hello</html>".to_vec()).header("Content-Type", "text/html"),
    )
    .await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/page"), 100, 75, false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.to_string(), "The requested resource isn't a valid image.");
}

#[tokio::test]
async fn test_svg_respects_allow_svg() {
    let server = TestServer::start(
        CannedResponse::ok(SVG.to_vec()).header("Content-Type", "image/svg+xml"),
    )
    .await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/a.svg"), 100, 75, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SvgNotAllowed);

    let result = fetcher()
        .fetch_and_optimize(&server.url("/a.svg"), 100, 75, true)
        .await
        .unwrap();
    assert_eq!(result.buffer.as_ref(), SVG);
    assert_eq!(result.content_type.as_deref(), Some("image/svg+xml"));
}

#[tokio::test]
async fn test_animated_gif_is_rejected() {
    let server = TestServer::start(CannedResponse::ok(gif(3))).await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/a.gif"), 100, 75, false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedAnimated);
    assert_eq!(err.to_http_status(), 400);
}

#[tokio::test]
async fn test_invalid_quality_fails_before_fetch() {
    let server = TestServer::start(CannedResponse::ok(gif(1))).await;

    let err = fetcher()
        .fetch_and_optimize(&server.url("/a.gif"), 100, 0, false)
        .await
        .unwrap_err();

    assert!(matches!(err, OptimizeError::InvalidParameter { ref param, .. } if param == "quality"));
}
