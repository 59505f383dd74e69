use std::fmt;
use std::path::Path;

use opencv::prelude::*;
use opencv::videoio;

use crate::error::{FaceDistanceError, SettingsError};

pub const DEFAULT_CAMERA_INDEX: i32 = 0;

/// Where frames come from: a local device index or a network stream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraAddress {
    Device(i32),
    Url(String),
}

impl CameraAddress {
    /// Plain integers select a local device, anything else is handed to
    /// OpenCV as a stream URL.
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SettingsError::EmptyCameraAddress);
        }
        Ok(match raw.parse::<i32>() {
            Ok(index) => Self::Device(index),
            Err(_) => Self::Url(raw.to_owned()),
        })
    }
}

impl fmt::Display for CameraAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(index) => write!(f, "{index}"),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Reads the device index from a plain-text file.
///
/// A missing or malformed file is logged and the default device is used.
pub fn read_camera_index(path: impl AsRef<Path>) -> i32 {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => match contents.trim().parse::<i32>() {
            Ok(index) => index,
            Err(_) => {
                tracing::error!(path = %path.display(), "Invalid camera index in file");
                DEFAULT_CAMERA_INDEX
            }
        },
        Err(_) => {
            tracing::error!(path = %path.display(), "Camera index file not found");
            DEFAULT_CAMERA_INDEX
        }
    }
}

/// A source of raw BGR frames.
pub trait FrameSource: Send {
    /// `Ok(None)` means the source failed to produce a frame.
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>>;

    fn release(&mut self) -> anyhow::Result<()>;
}

/// Opens frame sources by address.
pub trait CameraOpener: Send + Sync {
    fn open(&self, address: &CameraAddress) -> anyhow::Result<Box<dyn FrameSource>>;
}

pub struct CameraSource {
    capture: videoio::VideoCapture,
}

impl CameraSource {
    pub fn open(address: &CameraAddress) -> anyhow::Result<Self> {
        let capture = match address {
            CameraAddress::Device(index) => videoio::VideoCapture::new(*index, videoio::CAP_ANY)?,
            CameraAddress::Url(url) => videoio::VideoCapture::from_file(url, videoio::CAP_ANY)?,
        };
        if !videoio::VideoCapture::is_opened(&capture)? {
            return Err(FaceDistanceError::CameraNotOpened(address.to_string()).into());
        }
        tracing::info!(camera = %address, "Opened camera");
        Ok(Self { capture })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.size()?.width == 0 {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.capture.release()?;
        Ok(())
    }
}

/// Opens real OpenCV captures.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoCaptureOpener;

impl CameraOpener for VideoCaptureOpener {
    fn open(&self, address: &CameraAddress) -> anyhow::Result<Box<dyn FrameSource>> {
        Ok(Box::new(CameraSource::open(address)?))
    }
}

/// Stand-in for a released camera; never yields a frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleasedSource;

impl FrameSource for ReleasedSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        Ok(None)
    }

    fn release(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn address_parsing() {
        assert_eq!(CameraAddress::parse("1"), Ok(CameraAddress::Device(1)));
        assert_eq!(
            CameraAddress::parse(" http://10.0.0.5:8080/video "),
            Ok(CameraAddress::Url("http://10.0.0.5:8080/video".to_string()))
        );
        assert_eq!(
            CameraAddress::parse("  "),
            Err(SettingsError::EmptyCameraAddress)
        );
    }

    #[test]
    fn address_display_round_trips_input() {
        assert_eq!(CameraAddress::Device(2).to_string(), "2");
        assert_eq!(
            CameraAddress::Url("rtsp://cam/stream".to_string()).to_string(),
            "rtsp://cam/stream"
        );
    }

    #[test]
    fn camera_index_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, " 3 ").unwrap();
        assert_eq!(read_camera_index(file.path()), 3);
    }

    #[test]
    fn malformed_camera_index_falls_back_to_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "front").unwrap();
        assert_eq!(read_camera_index(file.path()), DEFAULT_CAMERA_INDEX);
    }

    #[test]
    fn missing_camera_index_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            read_camera_index(dir.path().join("camera_index.txt")),
            DEFAULT_CAMERA_INDEX
        );
    }

    #[test]
    fn released_source_has_no_frames() {
        let mut source = ReleasedSource;
        assert!(source.next_frame().unwrap().is_none());
    }
}
