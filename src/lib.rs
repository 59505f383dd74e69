pub mod alert;
pub mod camera;
pub mod config;
pub mod detector;
pub mod distance;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod page;
pub mod server;
pub mod speech;
pub mod state;
pub mod stream;

pub use alert::{AlertWindow, Debouncer};
pub use camera::{CameraAddress, CameraOpener, CameraSource, FrameSource, VideoCaptureOpener};
pub use detector::{FaceDetector, FaceLocator};
pub use distance::{calibrate, estimate, Calibration, DistanceEstimator, FocalLength};
pub use error::{FaceDistanceError, SettingsError};
pub use monitor::{DistanceMonitor, FrameReport};
pub use server::build_router;
pub use speech::{CommandSpeaker, Speaker, SpeechNotifier};
pub use state::AppState;
