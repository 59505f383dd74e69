use std::time::Instant;

use clap::Parser;
use face_distance::camera::{CameraSource, FrameSource};
use face_distance::config::ViewerConfig;
use face_distance::logging::init_tracing;
use face_distance::SpeechNotifier;
use opencv::highgui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ViewerConfig::parse();
    init_tracing(&config.log_level);

    let window = "face distance";
    highgui::named_window_def(window)?;

    let alert_window = config.detection.alert_window()?;
    let notifier = config.detection.speaker()?.map(SpeechNotifier::spawn);
    let mut monitor = config.detection.build_monitor(notifier)?;

    let mut camera_source = CameraSource::open(&config.camera.camera_address())?;

    loop {
        let Some(mut frame) = camera_source.next_frame()? else {
            tracing::error!("Failed to read frame from camera");
            break;
        };

        if let Some(distance) = monitor
            .process_frame(&mut frame, &alert_window, Instant::now())?
            .distance
        {
            tracing::info!("Estimated distance: {distance:.2} CM");
        }

        highgui::imshow(window, &frame)?;
        if highgui::wait_key(1)? == i32::from(b'q') {
            break;
        }
    }

    camera_source.release()?;
    highgui::destroy_all_windows()?;
    Ok(())
}
