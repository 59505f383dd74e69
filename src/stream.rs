use std::iter::FusedIterator;
use std::time::Instant;

use axum::body::Bytes;
use opencv::core::Vector;
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::state::{SharedCamera, SharedMonitor, SharedWindow};

pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";
pub const DEFAULT_JPEG_QUALITY: i32 = 95;

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

pub fn encode_jpeg(frame: &Mat, quality: i32) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vector<u8> = Default::default();
    let params: Vector<i32> = Vector::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, quality]);
    if !imgcodecs::imencode(".jpg", frame, &mut buffer, &params)? {
        anyhow::bail!("JPEG encoder rejected frame");
    }
    Ok(buffer.to_vec())
}

/// Wraps one JPEG image as a part of the `boundary=frame` multipart stream.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let mut part = Vec::with_capacity(PART_HEADER.len() + jpeg.len() + 2);
    part.extend_from_slice(PART_HEADER);
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// Lazy sequence of encoded multipart frames pulled from the shared camera.
///
/// Blocks on the camera, so drive it from a blocking thread. Ends for good on
/// the first failed read.
pub struct MjpegFrames {
    camera: SharedCamera,
    monitor: Option<SharedMonitor>,
    window: SharedWindow,
    jpeg_quality: i32,
    finished: bool,
}

impl MjpegFrames {
    pub fn new(
        camera: SharedCamera,
        monitor: Option<SharedMonitor>,
        window: SharedWindow,
        jpeg_quality: i32,
    ) -> Self {
        Self {
            camera,
            monitor,
            window,
            jpeg_quality,
            finished: false,
        }
    }

    fn finish(&mut self) -> Option<Bytes> {
        self.finished = true;
        None
    }
}

impl Iterator for MjpegFrames {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.finished {
            return None;
        }

        let read = self.camera.blocking_lock().next_frame();
        let mut frame = match read {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::error!("Failed to read frame from camera");
                return self.finish();
            }
            Err(e) => {
                tracing::error!(error = %e, "Camera read failed");
                return self.finish();
            }
        };

        if let Some(monitor) = &self.monitor {
            let window = *self.window.blocking_read();
            if let Err(e) = monitor
                .blocking_lock()
                .process_frame(&mut frame, &window, Instant::now())
            {
                tracing::warn!(error = %e, "Failed to process frame, streaming it unannotated");
            }
        }

        match encode_jpeg(&frame, self.jpeg_quality) {
            Ok(jpeg) => Some(multipart_part(&jpeg)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode frame");
                self.finish()
            }
        }
    }
}

impl FusedIterator for MjpegFrames {}
