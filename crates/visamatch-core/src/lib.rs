//! visamatch-core: face detection, recognition, and the sorting rules.
//!
//! Uses SCRFD for face detection and ArcFace for face recognition, both
//! running via ONNX Runtime for CPU inference. The visa/personal rule and the
//! pairing strategies are pure and work against the [`FaceDetect`] and
//! [`FaceEmbed`] traits.

pub mod alignment;
pub mod classifier;
pub mod detector;
pub mod embedder;
pub mod frame;
pub mod matcher;
pub mod recognizer;
pub mod types;

pub use classifier::{classify_faces, Classification, Classifier, ClassifyRule, FaceRatios, UnknownReason, Verdict};
pub use detector::{DetectorConfig, DetectorError, FaceDetect, FaceDetector};
pub use embedder::{EmbedError, FaceEmbed, OnnxEmbedder};
pub use frame::{Frame, FrameError};
pub use matcher::{candidate_pairs, BestAvailable, CandidatePair, BEST_AVAILABLE_CEILING, GlobalGreedy, PairingStrategy, Strategy};
pub use recognizer::{FaceRecognizer, RecognizerError};
pub use types::{BoundingBox, Embedding, FaceSelection, ImageRecord, MatchGroup, Pairing};

/// File name of the SCRFD detection model inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// File name of the ArcFace recognition model inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";
