//! ArcFace face recognizer via ONNX Runtime.
//!
//! Extracts 512-dimensional face embeddings from aligned face crops,
//! using the w600k_r50 ArcFace model.

use crate::alignment::{self, ALIGNED_SIZE};
use crate::frame::Frame;
use crate::types::{BoundingBox, Embedding};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (different from SCRFD!) ---
const ARCFACE_INPUT_SIZE: usize = ALIGNED_SIZE;
const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5; // NOT 128.0: ArcFace uses symmetric normalization
const ARCFACE_EMBEDDING_DIM: usize = 512;
const ARCFACE_MODEL_VERSION: &str = "w600k_r50";

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model file not found: {0} (download w600k_r50.onnx from insightface into the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face has no landmarks; detector must return landmarks for alignment")]
    NoLandmarks,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ArcFace-based face recognizer.
pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, RecognizerError> {
        if !model_path.exists() {
            return Err(RecognizerError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded ArcFace model"
        );

        Ok(Self { session })
    }

    /// Extract an embedding for a detected face.
    ///
    /// The face must carry landmarks; it is aligned to the canonical 112×112
    /// position before inference.
    pub fn extract(&mut self, frame: &Frame, face: &BoundingBox) -> Result<Embedding, RecognizerError> {
        let landmarks = face.landmarks.as_ref().ok_or(RecognizerError::NoLandmarks)?;
        let aligned = alignment::align_face(frame, landmarks);
        self.infer(&aligned)
    }

    /// Best-effort embedding of the whole image, used when no face was found.
    pub fn extract_whole(&mut self, frame: &Frame) -> Result<Embedding, RecognizerError> {
        let crop = frame.resized(ARCFACE_INPUT_SIZE, ARCFACE_INPUT_SIZE);
        self.infer(&crop)
    }

    fn infer(&mut self, crop: &[u8]) -> Result<Embedding, RecognizerError> {
        let input = preprocess(crop);
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("embedding extraction: {e}")))?;

        if raw_data.len() != ARCFACE_EMBEDDING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {ARCFACE_EMBEDDING_DIM}-dim embedding, got {}",
                raw_data.len()
            )));
        }

        Ok(Embedding {
            values: l2_normalize(raw_data),
            model_version: Some(ARCFACE_MODEL_VERSION.to_string()),
        })
    }
}

fn l2_normalize(raw: &[f32]) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|x| x / norm).collect()
    } else {
        raw.to_vec()
    }
}

/// Preprocess a 112x112 grayscale crop into a NCHW float tensor.
fn preprocess(crop: &[u8]) -> Array4<f32> {
    let size = ARCFACE_INPUT_SIZE;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = crop.get(y * size + x).copied().unwrap_or(0) as f32;
            let normalized = (pixel - ARCFACE_MEAN) / ARCFACE_STD;
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_output_shape() {
        let crop = vec![128u8; ARCFACE_INPUT_SIZE * ARCFACE_INPUT_SIZE];
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, ARCFACE_INPUT_SIZE, ARCFACE_INPUT_SIZE]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let crop = vec![128u8; ARCFACE_INPUT_SIZE * ARCFACE_INPUT_SIZE];
        let tensor = preprocess(&crop);
        let expected = (128.0 - ARCFACE_MEAN) / ARCFACE_STD;
        let val = tensor[[0, 2, 5, 7]];
        assert!((val - expected).abs() < 1e-6, "got {val}, expected {expected}");
    }

    #[test]
    fn test_preprocess_short_crop_pads_black() {
        let tensor = preprocess(&[]);
        let expected = -ARCFACE_MEAN / ARCFACE_STD;
        assert!((tensor[[0, 0, 111, 111]] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_load_missing_model() {
        let result = FaceRecognizer::load(Path::new("/nonexistent/w600k_r50.onnx"));
        assert!(matches!(result, Err(RecognizerError::ModelNotFound(_))));
    }
}
