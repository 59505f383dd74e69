use std::sync::Arc;

use clap::Parser;
use face_distance::camera::{CameraOpener, VideoCaptureOpener};
use face_distance::config::ServerConfig;
use face_distance::logging::init_tracing;
use face_distance::{build_router, AppState, SpeechNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_tracing(&config.log_level);
    tracing::info!("Starting face distance server");

    let window = config.detection.alert_window()?;

    let opener = Arc::new(VideoCaptureOpener);
    let address = config.camera.camera_address();
    let camera = opener.open(&address)?;

    let monitor = if config.raw {
        tracing::info!("Raw mode, face detection disabled");
        None
    } else {
        let notifier = config.detection.speaker()?.map(SpeechNotifier::spawn);
        Some(config.detection.build_monitor(notifier)?)
    };

    let state = AppState::new(camera, address, opener, monitor, window)
        .with_jpeg_quality(config.jpeg_quality);
    let app = build_router(state.clone());

    let addr = config.bind_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    // video feeds only end once the camera stops producing frames
    state.release_camera().await;
}
