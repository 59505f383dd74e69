use std::path::Path;

use opencv::core::Rect;
use opencv::prelude::*;
use opencv::types::VectorOfRect;
use opencv::{core, imgcodecs, imgproc, objdetect};

use crate::error::FaceDistanceError;

pub const DEFAULT_CASCADE: &str = "haarcascade_frontalface_default.xml";

/// Finds faces in a BGR frame.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Mat) -> anyhow::Result<VectorOfRect>;
}

pub struct FaceDetector {
    classifier: objdetect::CascadeClassifier,
}

impl FaceDetector {
    /// Loads a Haar cascade from `path`, falling back to the copy bundled with
    /// OpenCV's data directory when the file does not exist locally.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let xml = if path.exists() {
            path.to_string_lossy().into_owned()
        } else {
            let file_name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
            core::find_file(&format!("haarcascades/{file_name}"), false, true)?
        };
        let classifier = objdetect::CascadeClassifier::new(&xml)?;
        if classifier.empty()? {
            return Err(FaceDistanceError::CascadeNotLoaded(xml).into());
        }
        tracing::info!(cascade = %xml, "Loaded face cascade");
        Ok(Self { classifier })
    }

    pub fn detect(&mut self, image: &Mat) -> anyhow::Result<VectorOfRect> {
        let mut faces = VectorOfRect::new();

        self.classifier.detect_multi_scale(
            &image,
            &mut faces,
            1.3,
            5,
            0,
            core::Size {
                width: 0,
                height: 0,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(faces)
    }
}

impl FaceLocator for FaceDetector {
    fn locate(&mut self, frame: &Mat) -> anyhow::Result<VectorOfRect> {
        let frame_grayscale = convert_to_grayscale(frame)?;
        self.detect(&frame_grayscale)
    }
}

pub fn find_largest_face(faces: &VectorOfRect) -> Option<Rect> {
    faces
        .into_iter()
        .max_by(|a, b| (a.height * a.width).cmp(&(b.height * b.width)))
}

/// Pixel width of the largest face, 0 when there is none.
pub fn face_width(faces: &VectorOfRect) -> i32 {
    find_largest_face(faces).map(|face| face.width).unwrap_or(0)
}

/// Measures the face width in a reference image taken at the known distance.
pub fn measure_reference_width(
    locator: &mut dyn FaceLocator,
    path: impl AsRef<Path>,
) -> anyhow::Result<i32> {
    let path = path.as_ref().to_string_lossy().into_owned();
    let image = imgcodecs::imread(&path, imgcodecs::IMREAD_COLOR)?;
    if image.size()?.width == 0 {
        return Err(FaceDistanceError::ReferenceImageNotLoaded(path).into());
    }
    let width = face_width(&locator.locate(&image)?);
    if width == 0 {
        return Err(FaceDistanceError::NoFaceInReference(path).into());
    }
    tracing::info!(reference = %path, width, "Measured reference face width");
    Ok(width)
}

pub fn convert_to_grayscale(image: &Mat) -> anyhow::Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use opencv::core::{Rect, Vector};
    use opencv::prelude::*;
    use opencv::types::VectorOfRect;

    use super::FaceLocator;

    pub fn faces_from(rects: &[Rect]) -> VectorOfRect {
        Vector::from_slice(rects)
    }

    /// Reports the same faces for every frame.
    pub struct FixedFaces(pub Vec<Rect>);

    impl FaceLocator for FixedFaces {
        fn locate(&mut self, _frame: &Mat) -> anyhow::Result<VectorOfRect> {
            Ok(faces_from(&self.0))
        }
    }
}
