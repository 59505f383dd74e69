use std::time::Instant;

use opencv::core::{Point, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

use crate::alert::{AlertWindow, Debouncer};
use crate::detector::{face_width, FaceLocator};
use crate::distance::DistanceEstimator;
use crate::speech::{alert_message, SpeechNotifier};

fn white() -> Scalar {
    Scalar::new(255.0, 255.0, 255.0, 0.0)
}

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub face_width: i32,
    pub distance: Option<f64>,
    pub alerted: bool,
}

/// Per-frame pipeline: locate the face, estimate its distance, annotate the
/// frame and raise a spoken alert when the face is inside the alert window.
pub struct DistanceMonitor {
    locator: Box<dyn FaceLocator>,
    estimator: DistanceEstimator,
    debouncer: Debouncer,
    notifier: Option<SpeechNotifier>,
}

impl DistanceMonitor {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        estimator: DistanceEstimator,
        debouncer: Debouncer,
        notifier: Option<SpeechNotifier>,
    ) -> Self {
        Self {
            locator,
            estimator,
            debouncer,
            notifier,
        }
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn process_frame(
        &mut self,
        frame: &mut Mat,
        window: &AlertWindow,
        now: Instant,
    ) -> anyhow::Result<FrameReport> {
        let faces = self.locator.locate(frame)?;
        for face in &faces {
            imgproc::rectangle(frame, face, white(), 1, imgproc::LINE_8, 0)?;
        }

        let face_width = face_width(&faces);
        let distance = self.estimator.distance(f64::from(face_width));
        let mut alerted = false;

        if let Some(distance) = distance {
            tracing::debug!(face_width, distance, "Estimated distance");
            if self.debouncer.evaluate(distance, window, now) {
                tracing::info!("Intruder detected at {distance:.2} cm");
                if let Some(notifier) = &self.notifier {
                    notifier.notify(alert_message(distance));
                }
                alerted = true;
            }
            draw_distance(frame, distance)?;
        }

        Ok(FrameReport {
            face_width,
            distance,
            alerted,
        })
    }
}

fn draw_distance(frame: &mut Mat, distance: f64) -> anyhow::Result<()> {
    imgproc::put_text(
        frame,
        &format!("Distance = {distance:.2} CM"),
        Point::new(50, 50),
        imgproc::FONT_HERSHEY_COMPLEX,
        1.0,
        white(),
        2,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}
