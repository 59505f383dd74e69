use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser};

use crate::alert::{AlertWindow, Debouncer, DEFAULT_MAX_DISTANCE, DEFAULT_MIN_DISTANCE};
use crate::camera::{read_camera_index, CameraAddress};
use crate::detector::{measure_reference_width, FaceDetector, DEFAULT_CASCADE};
use crate::distance::{
    Calibration, DistanceEstimator, DEFAULT_KNOWN_DISTANCE, DEFAULT_KNOWN_WIDTH,
    DEFAULT_REFERENCE_PIXEL_WIDTH,
};
use crate::error::SettingsError;
use crate::monitor::DistanceMonitor;
use crate::speech::{CommandSpeaker, Speaker, SpeechNotifier, DEFAULT_TTS_COMMAND};
use crate::stream::DEFAULT_JPEG_QUALITY;

#[derive(Args, Debug, Clone)]
pub struct CameraArgs {
    /// File holding the local camera device index.
    #[arg(long, env = "CAMERA_INDEX_FILE", default_value = "camera_index.txt")]
    pub camera_index_file: PathBuf,

    /// Network stream to open instead of a local device.
    #[arg(long, env = "CAMERA_URL")]
    pub camera_url: Option<String>,
}

impl CameraArgs {
    pub fn camera_address(&self) -> CameraAddress {
        match &self.camera_url {
            Some(url) => CameraAddress::Url(url.clone()),
            None => CameraAddress::Device(read_camera_index(&self.camera_index_file)),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DetectionArgs {
    /// Haar cascade used to find faces.
    #[arg(long, env = "CASCADE_PATH", default_value = DEFAULT_CASCADE)]
    pub cascade: PathBuf,

    /// Distance from camera to face in the reference setup, in centimeters.
    #[arg(long, env = "KNOWN_DISTANCE", default_value_t = DEFAULT_KNOWN_DISTANCE)]
    pub known_distance: f64,

    /// Real face width, in centimeters.
    #[arg(long, env = "KNOWN_WIDTH", default_value_t = DEFAULT_KNOWN_WIDTH)]
    pub known_width: f64,

    /// Image taken at the known distance. Its face width is measured at startup.
    #[arg(long, env = "REFERENCE_IMAGE")]
    pub reference_image: Option<PathBuf>,

    /// Face width in pixels at the known distance, used without a reference image.
    #[arg(long, env = "REFERENCE_PIXEL_WIDTH", default_value_t = DEFAULT_REFERENCE_PIXEL_WIDTH)]
    pub reference_pixel_width: f64,

    #[arg(long, env = "MIN_DISTANCE", default_value_t = DEFAULT_MIN_DISTANCE as i64)]
    pub min_distance: i64,

    #[arg(long, env = "MAX_DISTANCE", default_value_t = DEFAULT_MAX_DISTANCE as i64)]
    pub max_distance: i64,

    /// Minimum seconds between two spoken alerts.
    #[arg(long, env = "SPEECH_INTERVAL_SECS", default_value_t = 5.0)]
    pub speech_interval_secs: f64,

    /// Text-to-speech program; the alert text is appended as last argument.
    #[arg(long, env = "TTS_COMMAND", default_value = DEFAULT_TTS_COMMAND)]
    pub tts_command: String,

    /// Log alerts without speaking them.
    #[arg(long, env = "MUTE")]
    pub mute: bool,
}

impl DetectionArgs {
    pub fn calibration(&self) -> Calibration {
        Calibration {
            known_distance: self.known_distance,
            known_width: self.known_width,
        }
    }

    pub fn alert_window(&self) -> Result<AlertWindow, SettingsError> {
        AlertWindow::new(self.min_distance as f64, self.max_distance as f64)
    }

    pub fn speech_interval(&self) -> anyhow::Result<Duration> {
        Ok(Duration::try_from_secs_f64(self.speech_interval_secs)?)
    }

    pub fn speaker(&self) -> anyhow::Result<Option<Arc<dyn Speaker>>> {
        if self.mute {
            return Ok(None);
        }
        Ok(Some(Arc::new(CommandSpeaker::from_command_line(
            &self.tts_command,
        )?)))
    }

    /// Loads the cascade, calibrates and assembles the per-frame pipeline.
    pub fn build_monitor(
        &self,
        notifier: Option<SpeechNotifier>,
    ) -> anyhow::Result<DistanceMonitor> {
        let mut detector = FaceDetector::new(&self.cascade)?;
        let reference_pixel_width = match &self.reference_image {
            Some(path) => f64::from(measure_reference_width(&mut detector, path)?),
            None => self.reference_pixel_width,
        };
        let estimator = DistanceEstimator::new(self.calibration(), reference_pixel_width)?;
        tracing::info!(
            focal_length = estimator.focal_length().value(),
            reference_pixel_width,
            "Calibrated distance estimator"
        );
        Ok(DistanceMonitor::new(
            Box::new(detector),
            estimator,
            Debouncer::new(self.speech_interval()?),
            notifier,
        ))
    }
}

/// Streams webcam video and announces faces inside the alert distance.
#[derive(Parser, Debug, Clone)]
#[command()]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    #[command(flatten)]
    pub camera: CameraArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// JPEG quality of streamed frames.
    #[arg(long, env = "JPEG_QUALITY", default_value_t = DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(i32).range(1..=100))]
    pub jpeg_quality: i32,

    /// Stream frames without face detection or alerts.
    #[arg(long, env = "RAW")]
    pub raw: bool,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Shows annotated camera frames in a window and announces faces inside the
/// alert distance.
#[derive(Parser, Debug, Clone)]
#[command()]
pub struct ViewerConfig {
    #[command(flatten)]
    pub camera: CameraArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
