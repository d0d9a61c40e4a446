//! SCRFD face detector via ONNX Runtime.
//!
//! Implements the SCRFD (Sample and Computation Redistribution for Efficient Face
//! Detection) model with 3-stride anchor-free decoding and NMS post-processing.
//! Detection parameters come from [`DetectorConfig`]; the detector canvas is
//! `640 × scale_factor`, snapped to the 32-pixel stride grid.

use crate::frame::{self, Frame};
use crate::types::BoundingBox;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const SCRFD_BASE_INPUT_SIZE: f32 = 640.0;
const SCRFD_MAX_STRIDE: usize = 32;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} (download det_10g.onnx from insightface into the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Anything that can locate faces in a grayscale frame.
///
/// Results are in source-image pixel coordinates. Order is implementation
/// defined; [`FaceDetector`] returns them by descending confidence.
pub trait FaceDetect {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError>;
}

/// Tunables for [`FaceDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Minimum anchor score for a candidate box.
    pub confidence_threshold: f32,
    /// IoU above which a lower-scored candidate is merged into a kept box.
    pub nms_threshold: f32,
    /// Upsampling of the detector canvas relative to 640 px. Values above 1.0
    /// help with small faces on large scans.
    pub scale_factor: f32,
    /// Minimum number of overlapping candidates (besides itself) a detection
    /// needs to survive NMS. 0 disables the vote; SCRFD often yields a single
    /// anchor for small faces, so raise it only for noisy scans.
    pub min_neighbors: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            nms_threshold: 0.4,
            scale_factor: 1.1,
            min_neighbors: 0,
        }
    }
}

impl DetectorConfig {
    /// Square detector input side for this scale factor.
    pub fn input_size(&self) -> usize {
        let raw = SCRFD_BASE_INPUT_SIZE * self.scale_factor.max(0.1);
        let cells = (raw / SCRFD_MAX_STRIDE as f32).round().max(1.0) as usize;
        cells * SCRFD_MAX_STRIDE
    }
}

/// Metadata for coordinate de-mapping after letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx, kps_idx).
type StrideOutputIndices = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    config: DetectorConfig,
    input_size: usize,
    /// Per-stride output indices [(score, bbox, kps)] for strides [8, 16, 32].
    /// Discovered by name at load time; falls back to positional ordering.
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path, config: DetectorConfig) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        let num_outputs = output_names.len();

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if num_outputs < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {num_outputs}"
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        let input_size = config.input_size();
        tracing::debug!(?stride_indices, input_size, "SCRFD output tensor mapping");

        Ok(Self {
            session,
            config,
            input_size,
            stride_indices,
        })
    }

    /// Preprocess a grayscale frame into a NCHW float tensor with letterbox padding.
    fn preprocess(&self, frame: &Frame) -> (Array4<f32>, LetterboxInfo) {
        let size = self.input_size;
        let width = frame.width as usize;
        let height = frame.height as usize;

        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as usize).clamp(1, size);
        let new_h = ((height as f32 * scale).round() as usize).clamp(1, size);
        let pad_x = (size - new_w) as f32 / 2.0;
        let pad_y = (size - new_h) as f32 / 2.0;

        let letterbox = LetterboxInfo { scale, pad_x, pad_y };
        let resized = frame::resize_bilinear(&frame.data, width, height, new_w, new_h);

        // Pad with SCRFD_MEAN so the border normalizes to 0.0
        let pad_x_start = pad_x.floor() as usize;
        let pad_y_start = pad_y.floor() as usize;

        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

        for y in 0..size {
            for x in 0..size {
                let pixel = if y >= pad_y_start
                    && y < pad_y_start + new_h
                    && x >= pad_x_start
                    && x < pad_x_start + new_w
                {
                    resized[(y - pad_y_start) * new_w + (x - pad_x_start)] as f32
                } else {
                    SCRFD_MEAN
                };

                let normalized = (pixel - SCRFD_MEAN) / SCRFD_STD;
                // Grayscale → 3-channel: replicate Y → [R=Y, G=Y, B=Y]
                tensor[[0, 0, y, x]] = normalized;
                tensor[[0, 1, y, x]] = normalized;
                tensor[[0, 2, y, x]] = normalized;
            }
        }

        (tensor, letterbox)
    }
}

impl FaceDetect for FaceDetector {
    /// Detect faces, returning bounding boxes sorted by confidence.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError> {
        let (input, letterbox) = self.preprocess(frame);

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();

        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;
            let (_, kps) = outputs[kps_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("kps stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                scores,
                bboxes,
                kps,
                stride,
                self.input_size,
                &letterbox,
                self.config.confidence_threshold,
            ));
        }

        let candidates = all_detections.len();
        let result = nms(all_detections, self.config.nms_threshold, self.config.min_neighbors);
        tracing::debug!(candidates, kept = result.len(), "SCRFD detection");

        Ok(result)
    }
}

/// Discover output tensor ordering by name.
///
/// SCRFD models may export tensors with named outputs ("score_8", "bbox_16", ...) or
/// generic numeric names. If the named pattern is present, maps them to stride slots.
/// Otherwise falls back to the standard positional ordering:
///   [0-2] = scores (strides 8, 16, 32)
///   [3-5] = bboxes (strides 8, 16, 32)
///   [6-8] = kps    (strides 8, 16, 32)
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&stride| Some((find("score", stride)?, find("bbox", stride)?, find("kps", stride)?)))
        .collect();

    match named {
        Some(indices) => {
            tracing::info!("SCRFD: using name-based output tensor mapping");
            [indices[0], indices[1], indices[2]]
        }
        None => {
            tracing::info!(
                ?names,
                "SCRFD: output names not recognized, using positional mapping [0-2]=scores, [3-5]=bboxes, [6-8]=kps"
            );
            [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
        }
    }
}

/// Decode detections for a single stride level.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    kps: &[f32],
    stride: usize,
    input_size: usize,
    letterbox: &LetterboxInfo,
    threshold: f32,
) -> Vec<BoundingBox> {
    let grid = input_size / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let s = stride as f32;

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let anchor_idx = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_cx = (anchor_idx % grid) as f32 * s;
        let anchor_cy = (anchor_idx / grid) as f32 * s;

        let bbox_off = idx * 4;
        if bbox_off + 3 >= bboxes.len() {
            continue;
        }
        let x1 = anchor_cx - bboxes[bbox_off] * s;
        let y1 = anchor_cy - bboxes[bbox_off + 1] * s;
        let x2 = anchor_cx + bboxes[bbox_off + 2] * s;
        let y2 = anchor_cy + bboxes[bbox_off + 3] * s;

        let unmap_x = |v: f32| (v - letterbox.pad_x) / letterbox.scale;
        let unmap_y = |v: f32| (v - letterbox.pad_y) / letterbox.scale;

        let kps_off = idx * 10;
        let landmarks = if kps_off + 9 < kps.len() {
            let mut lms = [(0.0f32, 0.0f32); 5];
            for (i, lm) in lms.iter_mut().enumerate() {
                *lm = (
                    unmap_x(anchor_cx + kps[kps_off + i * 2] * s),
                    unmap_y(anchor_cy + kps[kps_off + i * 2 + 1] * s),
                );
            }
            Some(lms)
        } else {
            None
        };

        let (ox1, oy1) = (unmap_x(x1), unmap_y(y1));
        detections.push(BoundingBox {
            x: ox1,
            y: oy1,
            width: unmap_x(x2) - ox1,
            height: unmap_y(y2) - oy1,
            confidence: score,
            landmarks,
        });
    }

    detections
}

/// Non-Maximum Suppression with neighbor voting.
///
/// Each kept box counts the candidates it suppresses; boxes with fewer than
/// `min_neighbors` are discarded. Output is sorted by descending confidence.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32, min_neighbors: usize) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }

        let mut neighbors = 0usize;
        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
                neighbors += 1;
            }
        }

        if neighbors >= min_neighbors {
            keep.push(detections[i].clone());
        }
    }

    keep
}

/// Compute Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union_area = a.area() + b.area() - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}
