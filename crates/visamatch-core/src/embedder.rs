//! Image-path → identity embedding.

use crate::detector::{DetectorError, FaceDetect, FaceDetector};
use crate::frame::{Frame, FrameError};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{Embedding, FaceSelection};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("no face detected")]
    NoFaceDetected,
}

/// Anything that turns an image file into an identity embedding.
pub trait FaceEmbed {
    fn embed(&mut self, path: &Path) -> Result<Embedding, EmbedError>;
}

/// SCRFD + ArcFace embedding pipeline.
pub struct OnnxEmbedder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
    selection: FaceSelection,
    enforce_detection: bool,
}

impl OnnxEmbedder {
    /// With `enforce_detection` off, an image without a detected face is
    /// embedded whole instead of failing.
    pub fn new(
        detector: FaceDetector,
        recognizer: FaceRecognizer,
        selection: FaceSelection,
        enforce_detection: bool,
    ) -> Self {
        Self {
            detector,
            recognizer,
            selection,
            enforce_detection,
        }
    }
}

impl FaceEmbed for OnnxEmbedder {
    fn embed(&mut self, path: &Path) -> Result<Embedding, EmbedError> {
        let frame = Frame::open(path)?;
        let faces = self.detector.detect(&frame)?;

        match self.selection.pick(&faces) {
            Some(face) if face.landmarks.is_some() => Ok(self.recognizer.extract(&frame, face)?),
            _ if self.enforce_detection => Err(EmbedError::NoFaceDetected),
            _ => {
                tracing::debug!(path = %path.display(), "no aligned face, embedding whole image");
                Ok(self.recognizer.extract_whole(&frame)?)
            }
        }
    }
}
