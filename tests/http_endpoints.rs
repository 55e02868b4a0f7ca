//! HTTP endpoint tests driven through the router with `tower::ServiceExt::oneshot`

#![cfg(all(unix, feature = "server"))]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{Sandbox, FAILING_TOOL, FAKE_POTRACE, FAKE_REMBG};
use serde_json::{json, Value};
use std::sync::Arc;
use svgforge::server::router;
use svgforge::{ConversionPipeline, ServiceConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "svgforge-test-boundary";

fn app(config: &ServiceConfig) -> Router {
    let pipeline = Arc::new(ConversionPipeline::new(config).unwrap());
    router(pipeline, config.server.max_upload_bytes)
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn reprocess(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/reprocess")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_upload_red_square_produces_svg() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());
    let png = common::red_png(100);

    let (status, body) = send_json(
        &app,
        multipart(
            &[("mode", "color"), ("colors", "8"), ("detail", "5")],
            Some(("red.png", png.as_slice())),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let input = body["input_filename"].as_str().unwrap();
    assert!(input.ends_with(".png"));
    assert_eq!(body["uploaded_file_url"], format!("/uploads/{input}"));
    let svg_url = body["svg_file_url"].as_str().unwrap();
    assert!(svg_url.starts_with("/output/"));
    let svg_name = svg_url.trim_start_matches("/output/");
    assert_eq!(body["download_url"], format!("/download/{svg_name}"));

    let (status, headers, svg) = send(&app, get(svg_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
    assert!(String::from_utf8(svg).unwrap().contains("<svg"));

    let (status, _, original) = send(&app, get(&format!("/uploads/{input}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(original, png);

    assert_eq!(sandbox.count_files("temp"), 0);
}

#[tokio::test]
async fn test_upload_validation_errors() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());

    let (status, body) = send_json(&app, multipart(&[("mode", "bw")], None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file part");

    let (status, body) = send_json(&app, multipart(&[], Some(("", &b"data"[..])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");

    let (status, body) = send_json(&app, multipart(&[], Some(("notes.pdf", &b"%PDF"[..])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File type not allowed");

    let png = common::red_png(4);
    let (status, _) =
        send_json(&app, multipart(&[("mode", "sepia")], Some(("a.png", png.as_slice())))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(sandbox.count_files("input"), 0);
}

#[tokio::test]
async fn test_upload_tool_failure_is_500() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config_with(FAKE_POTRACE, FAILING_TOOL, FAKE_REMBG));
    let png = common::red_png(10);

    let (status, body) = send_json(&app, multipart(&[], Some(("red.png", png.as_slice())))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Processing failed: vtracer failed"), "{message}");
    assert!(message.contains("tracer exploded"));
    assert_eq!(sandbox.count_files("output"), 0);
    assert_eq!(sandbox.count_files("temp"), 0);
}

#[tokio::test]
async fn test_reprocess_existing_upload() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());
    let png = common::red_png(20);

    let (_, uploaded) = send_json(&app, multipart(&[], Some(("red.png", png.as_slice())))).await;
    let input = uploaded["input_filename"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        reprocess(
            json!({
                "input_filename": input,
                "mode": "bw",
                "bg_threshold": 30,
                "remove_bg": false
            })
            .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_ne!(body["svg_file_url"], uploaded["svg_file_url"]);
    assert!(sandbox.logged_args("potrace").contains("-s -o"));

    // remove_bg defaults to true on reprocess
    let (status, _) = send_json(
        &app,
        reprocess(json!({ "input_filename": input }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sandbox.logged_args("rembg"), "i -a -af 250 -ab 10 -ae 1 - -");

    assert_eq!(sandbox.count_files("output"), 3);
    assert_eq!(sandbox.count_files("temp"), 0);
}

#[tokio::test]
async fn test_reprocess_rejections() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());

    let (status, body) = send_json(
        &app,
        reprocess(json!({ "input_filename": "../../etc/passwd" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input filename");

    let (status, body) = send_json(
        &app,
        reprocess(json!({ "input_filename": "0000.png" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Original input file not found");

    let (status, body) = send_json(&app, reprocess("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data");

    let (status, body) = send_json(&app, reprocess(json!({ "mode": "bw" }).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing input filename");

    let (status, body) = send_json(
        &app,
        reprocess(json!({ "input_filename": "a.png", "mode": "sepia" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sepia"));

    assert_eq!(sandbox.count_files("output"), 0);
}

#[tokio::test]
async fn test_download_and_file_serving() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());
    let png = common::red_png(10);

    let (_, uploaded) = send_json(&app, multipart(&[], Some(("red.png", png.as_slice())))).await;
    let download = uploaded["download_url"].as_str().unwrap();
    let svg_name = download.trim_start_matches("/download/");

    let (status, headers, body) = send(&app, get(download)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{svg_name}\"").as_str()
    );
    assert!(String::from_utf8(body).unwrap().contains("<svg"));

    let (status, _, body) = send(&app, get("/download/..%2F..%2Fetc%2Fpasswd")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"Invalid filename");

    let (status, _, _) = send(&app, get("/output/missing.svg")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = send(&app, get("/uploads/missing.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let sandbox = Sandbox::new();
    let config = ServiceConfig::builder()
        .storage_root(sandbox.storage_root())
        .max_upload_bytes(1024)
        .build()
        .unwrap();
    let app = app(&config);
    let big = vec![0u8; 64 * 1024];

    let (status, _, _) = send(&app, multipart(&[], Some(("big.png", big.as_slice())))).await;
    assert_ne!(status, StatusCode::OK);
    assert_eq!(sandbox.count_files("input"), 0);
}

#[tokio::test]
async fn test_healthz() {
    let sandbox = Sandbox::new();
    let app = app(&sandbox.config());
    let (status, _, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
