use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceDistanceError {
    #[error("OpenCV error {0:?}")]
    OpenCv(#[from] opencv::Error),
    #[error("Failed to open camera {0}")]
    CameraNotOpened(String),
    #[error("Failed to load cascade classifier from {0}")]
    CascadeNotLoaded(String),
    #[error("Failed to read reference image {0}")]
    ReferenceImageNotLoaded(String),
    #[error("No face found in reference image {0}")]
    NoFaceInReference(String),
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(&'static str),
}

/// Rejected settings input. The display strings are shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid distance value entered. Please enter valid integers.")]
    InvalidDistanceValue,
    #[error("Minimum distance must be less than maximum distance.")]
    MinNotBelowMax,
    #[error("Camera address must not be empty.")]
    EmptyCameraAddress,
}
