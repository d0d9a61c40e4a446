use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Which detected face a stage should act on when several are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceSelection {
    /// The detector's first result.
    #[default]
    First,
    /// The box with the largest area; earlier results win ties.
    Largest,
}

impl FaceSelection {
    pub fn pick<'a>(&self, faces: &'a [BoundingBox]) -> Option<&'a BoundingBox> {
        match self {
            FaceSelection::First => faces.first(),
            FaceSelection::Largest => faces.iter().fold(None, |best, face| match best {
                Some(b) if b.area() >= face.area() => Some(b),
                _ => Some(face),
            }),
        }
    }
}

/// Face embedding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    /// Compute cosine similarity between two embeddings.
    ///
    /// Returns a value in [-1, 1]. Higher = more similar. A zero vector has
    /// similarity 0 with everything.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }

    /// Cosine distance (1 - similarity), in [0, 2]. Lower = more similar.
    pub fn cosine_distance(&self, other: &Embedding) -> f32 {
        1.0 - self.similarity(other)
    }

    /// Compute Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One scanned image with its identity embedding.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// File name, unique within its source directory.
    pub filename: String,
    pub path: PathBuf,
    pub embedding: Embedding,
}

/// An accepted personal/visa pair.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    /// Positive, assigned in acceptance order starting at 1.
    pub id: u32,
    pub distance: f32,
    pub personal: ImageRecord,
    pub visa: ImageRecord,
}

/// Outcome of a pairing pass. Every input record appears exactly once.
#[derive(Debug, Default)]
pub struct Pairing {
    pub groups: Vec<MatchGroup>,
    pub unmatched_personal: Vec<ImageRecord>,
    pub unmatched_visa: Vec<ImageRecord>,
}
