use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;

use crate::alert::AlertWindow;
use crate::camera::CameraAddress;
use crate::page::render_index;
use crate::state::AppState;
use crate::stream;

/// Encoded frames buffered between the capture thread and the client.
const FRAME_BUFFER: usize = 2;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed))
        .route("/set_distance", post(set_distance))
        .route("/set_camera_ip", post(set_camera_ip))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct DistanceForm {
    #[serde(default)]
    pub min_distance: String,
    #[serde(default)]
    pub max_distance: String,
}

#[derive(Debug, Deserialize)]
pub struct CameraForm {
    #[serde(default)]
    pub camera_ip: String,
}

async fn render(state: &AppState, message: &str) -> Html<String> {
    let window = state.window().await;
    let camera = state.camera_address().await;
    Html(render_index(&window, &camera, message))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    render(&state, "").await
}

async fn video_feed(State(state): State<AppState>) -> impl IntoResponse {
    let (tx, rx) = mpsc::channel(FRAME_BUFFER);
    let frames = state.frames();

    tokio::task::spawn_blocking(move || {
        for part in frames {
            if tx.blocking_send(part).is_err() {
                tracing::debug!("Video feed client disconnected");
                return;
            }
        }
        tracing::info!("Video feed ended");
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, stream::CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
}

async fn set_distance(
    State(state): State<AppState>,
    Form(form): Form<DistanceForm>,
) -> Html<String> {
    let message = match AlertWindow::parse(&form.min_distance, &form.max_distance) {
        Ok(window) => {
            state.set_window(window).await;
            let message = format!(
                "Updated alert distances: Min = {} cm, Max = {} cm",
                window.min_distance(),
                window.max_distance()
            );
            tracing::info!("{message}");
            message
        }
        Err(e) => {
            tracing::error!(
                min_distance = %form.min_distance,
                max_distance = %form.max_distance,
                "{e}"
            );
            e.to_string()
        }
    };
    render(&state, &message).await
}

async fn set_camera_ip(
    State(state): State<AppState>,
    Form(form): Form<CameraForm>,
) -> Html<String> {
    let message = match CameraAddress::parse(&form.camera_ip) {
        Ok(address) => match state.switch_camera(address.clone()).await {
            Ok(()) => {
                let message = format!("Updated camera IP address to: {address}");
                tracing::info!("{message}");
                message
            }
            Err(e) => {
                let message = format!("Error setting camera IP: {e}");
                tracing::error!("{message}");
                message
            }
        },
        Err(e) => {
            tracing::error!("{e}");
            e.to_string()
        }
    };
    render(&state, &message).await
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "raw": state.is_raw(),
        "window": state.window().await,
    }))
}
