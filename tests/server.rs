use std::collections::VecDeque;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use face_distance::camera::{CameraAddress, CameraOpener, FrameSource, ReleasedSource};
use face_distance::{build_router, AlertWindow, AppState};
use http_body_util::BodyExt;
use opencv::core::{self, Scalar};
use opencv::prelude::*;
use tower::ServiceExt;

struct ScriptedSource(VecDeque<Mat>);

impl ScriptedSource {
    fn with_frames(count: usize) -> Self {
        let frames = (0..count)
            .map(|_| {
                Mat::new_rows_cols_with_default(48, 64, core::CV_8UC3, Scalar::all(200.0)).unwrap()
            })
            .collect();
        Self(frames)
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        Ok(self.0.pop_front())
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.0.clear();
        Ok(())
    }
}

struct FakeOpener {
    reachable: bool,
}

impl CameraOpener for FakeOpener {
    fn open(&self, address: &CameraAddress) -> anyhow::Result<Box<dyn FrameSource>> {
        if self.reachable {
            Ok(Box::new(ScriptedSource::with_frames(1)))
        } else {
            anyhow::bail!("Failed to open camera {address}")
        }
    }
}

fn state_with(camera: Box<dyn FrameSource>, reachable: bool) -> AppState {
    AppState::new(
        camera,
        CameraAddress::Device(0),
        Arc::new(FakeOpener { reachable }),
        None,
        AlertWindow::default(),
    )
}

async fn body_text(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let res = app.oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn index_shows_current_window() {
    let app = build_router(state_with(Box::new(ReleasedSource), true));
    let (status, page) = body_text(app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains(r#"src="/video_feed""#));
    assert!(page.contains(r#"name="min_distance" value="50""#));
    assert!(page.contains(r#"name="max_distance" value="70""#));
}

#[tokio::test]
async fn valid_distances_update_window() {
    let state = state_with(Box::new(ReleasedSource), true);
    let app = build_router(state.clone());
    let request = form("/set_distance", "min_distance=30&max_distance=90");
    let (status, page) = body_text(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Updated alert distances: Min = 30 cm, Max = 90 cm"));
    assert_eq!(state.window().await, AlertWindow::new(30.0, 90.0).unwrap());
}

#[tokio::test]
async fn inverted_distances_leave_window_unchanged() {
    let state = state_with(Box::new(ReleasedSource), true);
    let app = build_router(state.clone());
    let (_, page) = body_text(app, form("/set_distance", "min_distance=80&max_distance=50")).await;
    assert!(page.contains("Minimum distance must be less than maximum distance."));
    assert_eq!(state.window().await, AlertWindow::default());
}

#[tokio::test]
async fn non_numeric_distance_leaves_window_unchanged() {
    let state = state_with(Box::new(ReleasedSource), true);
    let app = build_router(state.clone());
    let request = form("/set_distance", "min_distance=abc&max_distance=50");
    let (_, page) = body_text(app.clone(), request).await;
    assert!(page.contains("Invalid distance value entered. Please enter valid integers."));

    let (_, page) = body_text(app, form("/set_distance", "max_distance=50")).await;
    assert!(page.contains("Invalid distance value entered."));
    assert_eq!(state.window().await, AlertWindow::default());
}

#[tokio::test]
async fn empty_camera_yields_empty_video_feed() {
    let app = build_router(state_with(Box::new(ReleasedSource), true));
    let res = app.oneshot(get("/video_feed")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn video_feed_streams_every_frame_then_ends() {
    let app = build_router(state_with(Box::new(ScriptedSource::with_frames(3)), true));
    let res = app.oneshot(get("/video_feed")).await.unwrap();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();

    let header = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    let parts = bytes.windows(header.len()).filter(|w| *w == header).count();
    assert_eq!(parts, 3);
    assert!(bytes.starts_with(header));
    assert!(bytes.ends_with(b"\r\n"));
}

#[tokio::test]
async fn camera_switch_reports_new_address() {
    let state = state_with(Box::new(ReleasedSource), true);
    let app = build_router(state.clone());
    let (_, page) = body_text(
        app.clone(),
        form("/set_camera_ip", "camera_ip=http%3A%2F%2F10.0.0.7%3A8080%2Fvideo"),
    )
    .await;
    assert!(page.contains("Updated camera IP address to: http://10.0.0.7:8080/video"));
    assert_eq!(
        state.camera_address().await,
        CameraAddress::Url("http://10.0.0.7:8080/video".to_string())
    );

    // the freshly opened camera has one frame
    let res = app.oneshot(get("/video_feed")).await.unwrap();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn unreachable_camera_is_reported_not_fatal() {
    let state = state_with(Box::new(ScriptedSource::with_frames(5)), false);
    let app = build_router(state.clone());
    let request = form("/set_camera_ip", "camera_ip=rtsp%3A%2F%2Fnowhere");
    let (status, page) = body_text(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Error setting camera IP: Failed to open camera rtsp://nowhere"));

    // the previous camera was released before the switch
    let res = app.clone().oneshot(get("/video_feed")).await.unwrap();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let (status, _) = body_text(app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn blank_camera_address_is_rejected() {
    let state = state_with(Box::new(ScriptedSource::with_frames(1)), true);
    let app = build_router(state.clone());
    let (_, page) = body_text(app, form("/set_camera_ip", "camera_ip=+")).await;
    assert!(page.contains("Camera address must not be empty."));
    assert_eq!(state.camera_address().await, CameraAddress::Device(0));
}

#[tokio::test]
async fn health_reports_window() {
    let app = build_router(state_with(Box::new(ReleasedSource), true));
    let (status, body) = body_text(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["raw"], true);
    assert_eq!(json["window"]["min_distance"], 50.0);
    assert_eq!(json["window"]["max_distance"], 70.0);
}
