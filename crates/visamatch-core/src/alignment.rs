//! Face alignment via 4-DOF similarity transform.
//!
//! Maps the five detected landmarks onto the InsightFace reference positions
//! for a 112×112 crop, using the closed-form least-squares similarity.

use crate::frame::Frame;

/// ArcFace reference landmarks for a 112×112 output.
pub(crate) const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub(crate) const ALIGNED_SIZE: usize = 112;

/// Similarity transform `dst = [[a, -b], [b, a]] * src + [tx, ty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Similarity {
    a: f32,
    b: f32,
    tx: f32,
    ty: f32,
}

impl Similarity {
    /// Least-squares fit from `src` to `dst`. Degenerate input (all source
    /// points coincide) yields the identity.
    fn estimate(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> Self {
        let n = src.len() as f32;
        let mean = |pts: &[(f32, f32); 5]| {
            let (sx, sy) = pts.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
            (sx / n, sy / n)
        };
        let (msx, msy) = mean(src);
        let (mdx, mdy) = mean(dst);

        let mut dot = 0.0f32;
        let mut cross = 0.0f32;
        let mut var = 0.0f32;
        for (&(sx, sy), &(dx, dy)) in src.iter().zip(dst.iter()) {
            let (sx, sy) = (sx - msx, sy - msy);
            let (dx, dy) = (dx - mdx, dy - mdy);
            dot += sx * dx + sy * dy;
            cross += sx * dy - sy * dx;
            var += sx * sx + sy * sy;
        }

        if var < 1e-12 {
            return Self { a: 1.0, b: 0.0, tx: 0.0, ty: 0.0 };
        }

        let a = dot / var;
        let b = cross / var;
        Self {
            a,
            b,
            tx: mdx - (a * msx - b * msy),
            ty: mdy - (b * msx + a * msy),
        }
    }

    /// Map an output pixel back into source coordinates.
    fn invert_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let det = self.a * self.a + self.b * self.b;
        if det < 1e-12 {
            return None;
        }
        let dx = x - self.tx;
        let dy = y - self.ty;
        Some((
            (self.a * dx + self.b * dy) / det,
            (-self.b * dx + self.a * dy) / det,
        ))
    }
}

/// Sample with bilinear interpolation; out-of-bounds reads are black.
fn sample_bilinear(frame: &Frame, sx: f32, sy: f32) -> f32 {
    let w = frame.width as i32;
    let h = frame.height as i32;
    let pixel = |x: i32, y: i32| -> f32 {
        if x >= 0 && x < w && y >= 0 && y < h {
            frame.data[y as usize * w as usize + x as usize] as f32
        } else {
            0.0
        }
    };

    let x0 = sx.floor() as i32;
    let y0 = sy.floor() as i32;
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    pixel(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + pixel(x0 + 1, y0) * fx * (1.0 - fy)
        + pixel(x0, y0 + 1) * (1.0 - fx) * fy
        + pixel(x0 + 1, y0 + 1) * fx * fy
}

fn warp(frame: &Frame, transform: &Similarity, out_size: usize) -> Vec<u8> {
    let mut output = vec![0u8; out_size * out_size];
    for oy in 0..out_size {
        for ox in 0..out_size {
            if let Some((sx, sy)) = transform.invert_point(ox as f32, oy as f32) {
                output[oy * out_size + ox] = sample_bilinear(frame, sx, sy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    output
}

/// Align a detected face to a canonical 112×112 grayscale crop suitable for
/// ArcFace embedding extraction.
pub fn align_face(frame: &Frame, landmarks: &[(f32, f32); 5]) -> Vec<u8> {
    let transform = Similarity::estimate(landmarks, &REFERENCE_LANDMARKS_112);
    warp(frame, &transform, ALIGNED_SIZE)
}
