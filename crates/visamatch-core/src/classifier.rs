//! Visa-crop vs personal-photo heuristic.
//!
//! Visa photos on passport scan pages are small head-and-shoulders crops near
//! the top of the page; personal photos have a larger or lower face. The rule
//! looks at one detected face and two ratios:
//!
//! - `size = (w * h) / (image_width * image_height)`
//! - `y = face_top / image_height`
//!
//! An image is a visa iff both ratios are under their thresholds.

use crate::detector::FaceDetect;
use crate::frame::Frame;
use crate::types::{BoundingBox, FaceSelection};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Thresholds and face choice for the classification rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyRule {
    pub size_ratio_threshold: f32,
    pub y_ratio_threshold: f32,
    pub selection: FaceSelection,
}

impl Default for ClassifyRule {
    fn default() -> Self {
        Self {
            size_ratio_threshold: 0.08,
            y_ratio_threshold: 0.35,
            selection: FaceSelection::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceRatios {
    pub size: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum UnknownReason {
    Unreadable(String),
    DetectionFailed(String),
    NoFace,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::Unreadable(e) => write!(f, "couldn't read image: {e}"),
            UnknownReason::DetectionFailed(e) => write!(f, "face detection failed: {e}"),
            UnknownReason::NoFace => f.write_str("no face detected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Classification {
    Visa(FaceRatios),
    Personal(FaceRatios),
    Unknown(UnknownReason),
}

/// The three-valued verdict without its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Visa,
    Personal,
    Unknown,
}

impl Classification {
    pub fn verdict(&self) -> Verdict {
        match self {
            Classification::Visa(_) => Verdict::Visa,
            Classification::Personal(_) => Verdict::Personal,
            Classification::Unknown(_) => Verdict::Unknown,
        }
    }

    pub fn ratios(&self) -> Option<FaceRatios> {
        match self {
            Classification::Visa(r) | Classification::Personal(r) => Some(*r),
            Classification::Unknown(_) => None,
        }
    }
}

/// Apply the rule to detector output for an image of `width` × `height`.
pub fn classify_faces(faces: &[BoundingBox], width: u32, height: u32, rule: &ClassifyRule) -> Classification {
    if width == 0 || height == 0 {
        return Classification::Unknown(UnknownReason::Unreadable("zero-sized image".into()));
    }
    let Some(face) = rule.selection.pick(faces) else {
        return Classification::Unknown(UnknownReason::NoFace);
    };

    let ratios = FaceRatios {
        size: face.area() / (width as f32 * height as f32),
        y: face.y / height as f32,
    };

    if ratios.size < rule.size_ratio_threshold && ratios.y < rule.y_ratio_threshold {
        Classification::Visa(ratios)
    } else {
        Classification::Personal(ratios)
    }
}

/// Decodes images and classifies them with a detector.
pub struct Classifier<D> {
    detector: D,
    rule: ClassifyRule,
}

impl<D: FaceDetect> Classifier<D> {
    pub fn new(detector: D, rule: ClassifyRule) -> Self {
        Self { detector, rule }
    }

    /// Classify the image at `path`. Never fails: read and detection errors
    /// become [`Classification::Unknown`].
    pub fn classify_path(&mut self, path: &Path) -> Classification {
        match Frame::open(path) {
            Ok(frame) => self.classify_frame(&frame),
            Err(e) => Classification::Unknown(UnknownReason::Unreadable(e.to_string())),
        }
    }

    pub fn classify_frame(&mut self, frame: &Frame) -> Classification {
        match self.detector.detect(frame) {
            Ok(faces) => classify_faces(&faces, frame.width, frame.height, &self.rule),
            Err(e) => Classification::Unknown(UnknownReason::DetectionFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorError;

    fn face(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox {
            x, y, width: w, height: h, confidence: 0.9, landmarks: None,
        }
    }

    struct FixedDetector(Vec<BoundingBox>);

    impl FaceDetect for FixedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetect for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError> {
            Err(DetectorError::InferenceFailed("boom".into()))
        }
    }

    #[test]
    fn test_small_high_face_is_visa() {
        // 1000x1000 page, 200x200 face at y=100: size 0.04, y 0.1
        let c = classify_faces(&[face(400.0, 100.0, 200.0, 200.0)], 1000, 1000, &ClassifyRule::default());
        assert_eq!(c.verdict(), Verdict::Visa);
        let r = c.ratios().unwrap();
        assert!((r.size - 0.04).abs() < 1e-6);
        assert!((r.y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_large_face_is_personal() {
        // size 0.09 ≥ 0.08
        let c = classify_faces(&[face(0.0, 0.0, 300.0, 300.0)], 1000, 1000, &ClassifyRule::default());
        assert_eq!(c.verdict(), Verdict::Personal);
    }

    #[test]
    fn test_low_face_is_personal() {
        // size 0.01 but y 0.5
        let c = classify_faces(&[face(0.0, 500.0, 100.0, 100.0)], 1000, 1000, &ClassifyRule::default());
        assert_eq!(c.verdict(), Verdict::Personal);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // size exactly 0.08 and y exactly 0.35 → not visa
        let rule = ClassifyRule::default();
        let on_size = classify_faces(&[face(0.0, 0.0, 80.0, 100.0)], 1000, 100, &rule);
        assert_eq!(on_size.verdict(), Verdict::Personal);
        let on_y = classify_faces(&[face(0.0, 35.0, 1.0, 1.0)], 100, 100, &rule);
        assert_eq!(on_y.verdict(), Verdict::Personal);
    }

    #[test]
    fn test_no_face_is_unknown() {
        let c = classify_faces(&[], 100, 100, &ClassifyRule::default());
        assert_eq!(c, Classification::Unknown(UnknownReason::NoFace));
    }

    #[test]
    fn test_zero_sized_image_is_unknown() {
        let c = classify_faces(&[face(0.0, 0.0, 1.0, 1.0)], 0, 100, &ClassifyRule::default());
        assert_eq!(c.verdict(), Verdict::Unknown);
    }

    #[test]
    fn test_first_face_used_by_default() {
        // First face is large (personal), second small and high (visa).
        let faces = [face(0.0, 0.0, 500.0, 500.0), face(0.0, 0.0, 10.0, 10.0)];
        let c = classify_faces(&faces, 1000, 1000, &ClassifyRule::default());
        assert_eq!(c.verdict(), Verdict::Personal);
    }

    #[test]
    fn test_largest_face_selection() {
        let faces = [face(0.0, 0.0, 10.0, 10.0), face(0.0, 600.0, 100.0, 100.0)];
        let rule = ClassifyRule {
            selection: FaceSelection::Largest,
            ..ClassifyRule::default()
        };
        let c = classify_faces(&faces, 1000, 1000, &rule);
        assert_eq!(c.verdict(), Verdict::Personal);
        assert!((c.ratios().unwrap().y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_classifier_uses_detector() {
        let frame = Frame::from_gray(vec![0u8; 100 * 100], 100, 100).unwrap();
        let mut classifier = Classifier::new(FixedDetector(vec![face(10.0, 10.0, 20.0, 20.0)]), ClassifyRule::default());
        assert_eq!(classifier.classify_frame(&frame).verdict(), Verdict::Visa);
    }

    #[test]
    fn test_detection_failure_is_unknown() {
        let frame = Frame::from_gray(vec![0u8; 16], 4, 4).unwrap();
        let mut classifier = Classifier::new(FailingDetector, ClassifyRule::default());
        assert!(matches!(
            classifier.classify_frame(&frame),
            Classification::Unknown(UnknownReason::DetectionFailed(_))
        ));
    }

    #[test]
    fn test_unreadable_path_is_unknown() {
        let mut classifier = Classifier::new(FixedDetector(vec![]), ClassifyRule::default());
        let c = classifier.classify_path(Path::new("/nonexistent/scan.jpg"));
        assert!(matches!(c, Classification::Unknown(UnknownReason::Unreadable(_))));
    }
}
