use std::{fs::File, io::BufReader, path::Path};

use serde::Serialize;

use crate::{Error, Result};

/// Bounding box of a detected face within an image, in pixel coordinates of
/// that image. `x`/`y` can be slightly negative when the detector extends a
/// box past the frame edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub score: f64,
}

/// Face detection seam. The production backend wraps the SeetaFace engine;
/// tests plug in fixed-box stubs.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion>;
}

/// Run the detector over a decoded image and keep the single most prominent
/// face, if any.
pub fn detect_single_face(detector: &dyn FaceDetector, image: &image::DynamicImage) -> Option<FaceRegion> {
    let (gray, width, height) = crate::tools::image_tools::to_gray(image);
    most_prominent(detector.detect(&gray, width, height))
}

/// Highest-scoring detection wins; ties keep the first one returned.
pub fn most_prominent(faces: Vec<FaceRegion>) -> Option<FaceRegion> {
    faces.into_iter().reduce(|best, candidate| {
        if candidate.score > best.score { candidate } else { best }
    })
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model file is not bundled: it is read once at startup from the path
/// given in the server config, and a fresh detector is built from it per call
/// since the engine itself is not `Sync`.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| Error::Error { message: format!("Unable to load detection model {:?}: {:?}", path, e) })?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prominence_picks_highest_score() {
        let faces = vec![
            FaceRegion { x: 0, y: 0, width: 50, height: 50, score: 3.1 },
            FaceRegion { x: 100, y: 20, width: 80, height: 80, score: 9.4 },
            FaceRegion { x: 10, y: 10, width: 60, height: 60, score: 5.0 },
        ];
        let best = most_prominent(faces).unwrap();
        assert_eq!(best.x, 100);
        assert_eq!(best.width, 80);
    }

    #[test]
    fn prominence_empty_is_none() {
        assert!(most_prominent(vec![]).is_none());
    }

    struct FixedDetector(Vec<FaceRegion>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRegion> {
            self.0.clone()
        }
    }

    #[test]
    fn single_face_from_detector() {
        let image = image::DynamicImage::new_rgb8(320, 240);
        let detector = FixedDetector(vec![
            FaceRegion { x: 10, y: 10, width: 40, height: 40, score: 2.0 },
            FaceRegion { x: 90, y: 60, width: 100, height: 100, score: 7.5 },
        ]);
        let face = detect_single_face(&detector, &image).unwrap();
        assert_eq!(face.x, 90);

        let empty = FixedDetector(vec![]);
        assert!(detect_single_face(&empty, &image).is_none());
    }

    #[test]
    fn prominence_tie_keeps_first() {
        let faces = vec![
            FaceRegion { x: 1, y: 0, width: 50, height: 50, score: 4.0 },
            FaceRegion { x: 2, y: 0, width: 50, height: 50, score: 4.0 },
        ];
        assert_eq!(most_prominent(faces).unwrap().x, 1);
    }
}
