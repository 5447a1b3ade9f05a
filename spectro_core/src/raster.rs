//! Rendering a dB matrix as a color-mapped raster.

use std::path::Path;

use image::{ImageBuffer, Rgb};
use ndarray::Array2;

use crate::error::{Error, Result};

/// Anchor colors of the perceptual dark-to-light gradient, evenly spaced
/// over [0, 1]. Quiet cells render near-black, the loudest near-white.
const GRADIENT: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Map a normalized intensity in [0, 1] to a gradient color.
fn color_at(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let scaled = t * (GRADIENT.len() - 1) as f64;
    let idx = (scaled as usize).min(GRADIENT.len() - 2);
    let frac = scaled - idx as f64;

    let lo = GRADIENT[idx];
    let hi = GRADIENT[idx + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    Rgb([lerp(lo[0], hi[0]), lerp(lo[1], hi[1]), lerp(lo[2], hi[2])])
}

/// Render a `(bands, frames)` dB matrix edge-to-edge and write it to `path`.
///
/// One pixel per matrix cell, low bands at the bottom of the image, no axes
/// or margins. The output format follows the file extension.
pub fn save_image(matrix: &Array2<f64>, path: &Path) -> Result<()> {
    let write_err = |reason: String| Error::Write {
        path: path.to_path_buf(),
        reason,
    };

    let (bands, frames) = matrix.dim();
    if bands == 0 || frames == 0 {
        return Err(write_err("spectrogram matrix is empty".into()));
    }

    let min = matrix.iter().copied().fold(f64::INFINITY, f64::min);
    let max = matrix.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    let width = frames as u32;
    let height = bands as u32;
    let mut img = ImageBuffer::<Rgb<u8>, Vec<u8>>::new(width, height);

    for ((band, frame), &value) in matrix.indexed_iter() {
        let t = (value - min) / span;
        // Bottom-up so low bands land at the bottom edge.
        img.put_pixel(frame as u32, height - 1 - band as u32, color_at(t));
    }

    img.save(path).map_err(|e| write_err(e.to_string()))
}
