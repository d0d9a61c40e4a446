//! Frame type and image loading: decode to grayscale, bilinear resize.

use std::path::Path;

/// A decoded grayscale image.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Build a frame from raw grayscale bytes, checking the buffer length.
    pub fn from_gray(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if data.len() < expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        if width == 0 || height == 0 {
            return Err(FrameError::Empty);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode an image file of any supported format into a grayscale frame.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let decoded = image::open(path).map_err(|e| FrameError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        Self::from_gray(gray.into_raw(), width, height)
    }

    /// Resize the whole frame to `new_w` × `new_h`.
    pub fn resized(&self, new_w: usize, new_h: usize) -> Vec<u8> {
        resize_bilinear(
            &self.data,
            self.width as usize,
            self.height as usize,
            new_w,
            new_h,
        )
    }
}

/// Resize a grayscale buffer using bilinear interpolation with half-pixel centers.
pub fn resize_bilinear(
    src: &[u8],
    width: usize,
    height: usize,
    new_w: usize,
    new_h: usize,
) -> Vec<u8> {
    let mut resized = vec![0u8; new_w * new_h];
    if width == 0 || height == 0 || new_w == 0 || new_h == 0 {
        return resized;
    }

    let scale_x = width as f32 / new_w as f32;
    let scale_y = height as f32 / new_h as f32;

    for y in 0..new_h {
        let src_y = (y as f32 + 0.5) * scale_y - 0.5;
        let y0 = (src_y.floor() as i32).clamp(0, height as i32 - 1) as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for x in 0..new_w {
            let src_x = (x as f32 + 0.5) * scale_x - 0.5;
            let x0 = (src_x.floor() as i32).clamp(0, width as i32 - 1) as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            let tl = src[y0 * width + x0] as f32;
            let tr = src[y0 * width + x1] as f32;
            let bl = src[y1 * width + x0] as f32;
            let br = src[y1 * width + x1] as f32;

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            resized[y * new_w + x] = val.round().clamp(0.0, 255.0) as u8;
        }
    }

    resized
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("invalid grayscale length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("image has zero width or height")]
    Empty,
}
