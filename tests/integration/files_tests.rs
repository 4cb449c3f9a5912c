//! Local directory source tests.
//!
//! These run against a temporary directory tree, both directly and through
//! the router.

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};

use dicom_render::error::IoError;
use dicom_render::io::{DicomSource, LocalSource};
use dicom_render::{create_router, RenderService, RouterConfig};

use super::test_utils::*;

fn write(root: &Path, key: &str, data: &[u8]) {
    let path = root.join(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

fn populated_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ct/series-1/IMG0001.dcm", &reference_image());
    write(dir.path(), "ct/series-1/IMG0002.DCM", &reference_image());
    write(dir.path(), "ct/series-1/README.txt", b"notes");
    write(dir.path(), "mr/brain.dcm", &mono16(1, 1, &[5]).build());
    dir
}

fn local_router(root: &Path) -> axum::Router {
    create_router(
        RenderService::new(LocalSource::new(root)),
        RouterConfig::new().with_tracing(false),
    )
}

// =============================================================================
// LocalSource
// =============================================================================

#[tokio::test]
async fn test_list_walks_tree_sorted() {
    let dir = populated_dir();
    let files = LocalSource::new(dir.path()).list(None).await.unwrap();

    assert_eq!(
        files,
        vec![
            "ct/series-1/IMG0001.dcm",
            "ct/series-1/IMG0002.DCM",
            "mr/brain.dcm",
        ]
    );
}

#[tokio::test]
async fn test_list_with_prefix() {
    let dir = populated_dir();
    let files = LocalSource::new(dir.path()).list(Some("mr/")).await.unwrap();
    assert_eq!(files, vec!["mr/brain.dcm"]);
}

#[tokio::test]
async fn test_list_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let source = LocalSource::new(dir.path().join("absent"));
    assert!(matches!(source.list(None).await, Err(IoError::NotFound(_))));
}

#[tokio::test]
async fn test_read_nested_key() {
    let dir = populated_dir();
    let data = LocalSource::new(dir.path())
        .read("ct/series-1/IMG0001.dcm")
        .await
        .unwrap();
    assert_eq!(data.len(), reference_image().len());
}

// =============================================================================
// Through the Router
// =============================================================================

#[tokio::test]
async fn test_render_from_directory() {
    let dir = populated_dir();
    let request = Request::builder()
        .uri("/image/ct/series-1/IMG0001.dcm")
        .body(Body::empty())
        .unwrap();

    let response = send(local_router(dir.path()), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let png = body_bytes(response).await;
    assert_eq!(gray_values(&png), vec![0, 128, 255, 64]);
}

#[tokio::test]
async fn test_files_from_directory() {
    let dir = populated_dir();
    let request = Request::builder()
        .uri("/files?search=img")
        .body(Body::empty())
        .unwrap();

    let response = send(local_router(dir.path()), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["files"],
        serde_json::json!(["ct/series-1/IMG0001.dcm", "ct/series-1/IMG0002.DCM"])
    );
}

#[tokio::test]
async fn test_traversal_rejected() {
    let dir = populated_dir();
    let request = Request::builder()
        .method("POST")
        .uri("/render/file")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"filePath": "../outside.dcm"}"#))
        .unwrap();

    let response = send(local_router(dir.path()), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "invalid_path");
}
