//! Pinhole camera distance estimation.
//!
//! A face of known real width `W` that appears `P` pixels wide at a known
//! distance `D` gives the focal length `F = P * D / W`. Any later observation
//! of `p` pixels is then `W * F / p` away.

use crate::error::FaceDistanceError;

/// Distance from the camera to the face in the reference image, in centimeters.
pub const DEFAULT_KNOWN_DISTANCE: f64 = 76.2;
/// Real width of an average face, in centimeters.
pub const DEFAULT_KNOWN_WIDTH: f64 = 14.3;
/// Face width used when no reference image is measured.
pub const DEFAULT_REFERENCE_PIXEL_WIDTH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalLength(f64);

impl FocalLength {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

pub fn calibrate(
    known_distance: f64,
    known_width: f64,
    reference_pixel_width: f64,
) -> Result<FocalLength, FaceDistanceError> {
    if known_width <= 0.0 {
        return Err(FaceDistanceError::InvalidCalibration(
            "known width must be positive",
        ));
    }
    if reference_pixel_width <= 0.0 {
        return Err(FaceDistanceError::InvalidCalibration(
            "reference pixel width must be positive",
        ));
    }
    let focal_length = reference_pixel_width * known_distance / known_width;
    tracing::debug!(focal_length, "Calculated focal length");
    Ok(FocalLength(focal_length))
}

/// Returns `None` when no face was observed (zero pixel width).
pub fn estimate(
    focal_length: FocalLength,
    known_width: f64,
    observed_pixel_width: f64,
) -> Option<f64> {
    if observed_pixel_width == 0.0 {
        return None;
    }
    Some(known_width * focal_length.0 / observed_pixel_width)
}

/// Real-world constants of the calibration setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub known_distance: f64,
    pub known_width: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            known_distance: DEFAULT_KNOWN_DISTANCE,
            known_width: DEFAULT_KNOWN_WIDTH,
        }
    }
}

impl Calibration {
    pub fn focal_length(
        &self,
        reference_pixel_width: f64,
    ) -> Result<FocalLength, FaceDistanceError> {
        calibrate(self.known_distance, self.known_width, reference_pixel_width)
    }
}

/// Calibrated estimator for a single known object width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    focal_length: FocalLength,
    known_width: f64,
}

impl DistanceEstimator {
    pub fn new(
        calibration: Calibration,
        reference_pixel_width: f64,
    ) -> Result<Self, FaceDistanceError> {
        Ok(Self {
            focal_length: calibration.focal_length(reference_pixel_width)?,
            known_width: calibration.known_width,
        })
    }

    pub fn focal_length(&self) -> FocalLength {
        self.focal_length
    }

    pub fn distance(&self, observed_pixel_width: f64) -> Option<f64> {
        estimate(self.focal_length, self.known_width, observed_pixel_width)
    }
}
