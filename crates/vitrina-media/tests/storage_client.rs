//! Integration tests for `StorageClient` against a local `wiremock` server.
//!
//! Covers the upload request shape, status handling, remote read-back, and
//! the timeout race running over real HTTP.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrina_media::{
    upload_cover, upload_with_timeout, CompressionPolicy, CoverError, ImageBlob, RemoteFetcher,
    Storage, StorageClient, StorageError, TransformError, UploadError, UploadOptions,
};

fn test_client(server: &MockServer) -> StorageClient {
    StorageClient::new(&server.uri(), "product-images", "test-key", 5, "vitrina-test/0.1")
        .expect("failed to build test StorageClient")
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode fixture");
    buf
}

#[tokio::test]
async fn upload_posts_blob_with_storage_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/product-images/anillo/oro-1-0.jpg"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("apikey", "test-key"))
        .and(header("cache-control", "max-age=3600"))
        .and(header("x-upsert", "false"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Key": "product-images/anillo/oro-1-0.jpg" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let blob = ImageBlob::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]);
    let stored = client
        .upload("anillo/oro-1-0.jpg", &blob, &UploadOptions::default())
        .await
        .expect("upload succeeds");

    assert_eq!(stored, "anillo/oro-1-0.jpg");
    assert_eq!(
        client.public_url(&stored),
        format!(
            "{}/storage/v1/object/public/product-images/anillo/oro-1-0.jpg",
            server.uri()
        )
    );
}

#[tokio::test]
async fn upload_honours_option_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-upsert", "true"))
        .and(header("cache-control", "max-age=60"))
        .and(header("content-type", "image/webp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = UploadOptions {
        upsert: true,
        content_type: Some("image/webp".to_string()),
        ..UploadOptions::with_cache_secs(60)
    };
    test_client(&server)
        .upload("a/b.webp", &ImageBlob::jpeg(vec![1, 2]), &options)
        .await
        .expect("upload succeeds");
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_string("The resource already exists"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .upload("anillo/x.jpg", &ImageBlob::jpeg(vec![1]), &UploadOptions::default())
        .await
        .unwrap_err();

    match err {
        StorageError::UnexpectedStatus { status, key, body } => {
            assert_eq!(status, 409);
            assert_eq!(key, "anillo/x.jpg");
            assert!(body.contains("already exists"));
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn failed_upload_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server)
        .upload("anillo/x.jpg", &ImageBlob::jpeg(vec![1]), &UploadOptions::default())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn empty_key_or_body_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .upload("/", &ImageBlob::jpeg(vec![1]), &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Rejected { .. }));

    let err = client
        .upload("a/b.jpg", &ImageBlob::jpeg(Vec::<u8>::new()), &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Rejected { ref reason, .. } if reason == "empty body"));
}

#[tokio::test]
async fn fetch_reads_back_and_sniffs_remote_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/public/product-images/anillo/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let blob = client
        .fetch(&client.public_url("anillo/a.png"))
        .await
        .expect("fetch succeeds");
    assert_eq!(blob.content_type(), "image/png");
    assert!(!blob.is_empty());
}

#[tokio::test]
async fn fetch_failure_is_unreadable_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch(&format!("{}/elsewhere/a.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, TransformError::UnreadableSource(msg) if msg.contains("403")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn slow_upload_loses_race_against_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = Arc::new(test_client(&server));
    let err = upload_with_timeout(
        client,
        "novias/cover-1.jpg".to_string(),
        ImageBlob::jpeg(vec![1, 2, 3]),
        UploadOptions::default(),
        Duration::from_millis(100),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, UploadError::Timeout { ref key, .. } if key == "novias/cover-1.jpg"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn cover_upload_lands_in_cover_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/storage/v1/object/collection-covers/novias/cover-\d+\.png$",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let covers = Arc::new(test_client(&server).for_bucket("collection-covers"));
    let cover = upload_cover(
        covers,
        &CompressionPolicy::default(),
        "novias",
        ImageBlob::sniffed(png_bytes()),
        UploadOptions::default(),
        Duration::from_secs(5),
    )
    .await
    .expect("cover upload succeeds");

    assert!(cover.storage_path.starts_with("novias/cover-"));
    assert!(cover
        .url
        .contains("/storage/v1/object/public/collection-covers/novias/cover-"));
}

#[tokio::test]
async fn cover_upload_surfaces_storage_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = upload_cover(
        Arc::new(test_client(&server)),
        &CompressionPolicy::default(),
        "novias",
        ImageBlob::sniffed(png_bytes()),
        UploadOptions::default(),
        Duration::from_secs(5),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        CoverError::Upload(UploadError::Storage {
            source: StorageError::UnexpectedStatus { status: 500, .. },
            ..
        })
    ));
}
