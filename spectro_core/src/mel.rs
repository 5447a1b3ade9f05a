//! Mel feature extraction and decibel scaling.
//!
//! The streaming STFT feeds one hop of samples at a time; the filter bank
//! spans 0 Hz up to Nyquist, which the pipeline's fixed 16 kHz rate places at
//! exactly 8 kHz.

use mel_spec::prelude::*;
use ndarray::Array2;

use crate::{FFT_SIZE, HOP_SIZE, N_MELS, SAMPLE_RATE_HZ};

/// Values below this floor are treated as silence when converting to dB.
const AMIN: f64 = 1e-10;

/// Dynamic range kept below the reference, in dB.
const TOP_DB: f64 = 80.0;

/// Compute the Mel power spectrogram of a mono clip.
///
/// Returns a matrix of shape `(N_MELS, time_frames)`. The frame count is a
/// pure function of the clip length, so the same audio always yields the
/// same shape.
pub fn mel_spectrogram(samples: &[f32]) -> Array2<f64> {
    let mut stft = Spectrogram::new(FFT_SIZE, HOP_SIZE);
    let mut mel = MelSpectrogram::new(FFT_SIZE, SAMPLE_RATE_HZ as f64, N_MELS);

    let mut columns: Vec<Vec<f64>> = Vec::new();
    for chunk in samples.chunks(HOP_SIZE) {
        // Zero-pad the final hop.
        let mut hop = vec![0.0f32; HOP_SIZE];
        hop[..chunk.len()].copy_from_slice(chunk);

        if let Some(fft_frame) = stft.add(&hop) {
            let (flat, _offset) = mel.add(&fft_frame).into_raw_vec_and_offset();
            columns.push(flat);
        }
    }

    let mut matrix = Array2::zeros((N_MELS, columns.len()));
    for (t, column) in columns.iter().enumerate() {
        for (band, &value) in column.iter().enumerate() {
            matrix[[band, t]] = value;
        }
    }
    matrix
}

/// Rescale a power matrix to dB in place, referenced to its own maximum.
///
/// The loudest cell maps to 0 dB and everything else is negative, clamped to
/// `-TOP_DB`. Because the reference is clip-local, dB values are not
/// comparable across different clips.
pub fn power_to_db(matrix: &mut Array2<f64>) {
    let reference = matrix.iter().copied().fold(AMIN, f64::max);
    let ref_db = 10.0 * reference.log10();
    matrix.mapv_inplace(|p| (10.0 * p.max(AMIN).log10() - ref_db).max(-TOP_DB));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f32::consts::PI;

    fn sine(freq: f32, seconds: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE_HZ as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE_HZ as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn spectrogram_has_fixed_band_count() {
        let m = mel_spectrogram(&sine(440.0, 1.0));
        assert_eq!(m.nrows(), N_MELS);
        assert!(m.ncols() > 0);
    }

    #[test]
    fn spectrogram_shape_is_deterministic() {
        let samples = sine(440.0, 0.5);
        assert_eq!(mel_spectrogram(&samples).dim(), mel_spectrogram(&samples).dim());
    }

    #[test]
    fn longer_clips_produce_more_frames() {
        let short = mel_spectrogram(&sine(440.0, 0.5));
        let long = mel_spectrogram(&sine(440.0, 1.0));
        assert!(long.ncols() > short.ncols());
    }

    #[test]
    fn db_reference_is_the_matrix_maximum() {
        let mut m = array![[1.0, 0.1], [0.01, 0.5]];
        power_to_db(&mut m);
        let max = m.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((max - 0.0).abs() < 1e-9);
        assert!(m.iter().all(|&v| v <= 0.0));
    }

    #[test]
    fn db_floor_is_clamped() {
        let mut m = array![[1.0, 1e-30]];
        power_to_db(&mut m);
        assert!((m[[0, 1]] + TOP_DB).abs() < 1e-9);
    }

    #[test]
    fn db_scale_is_relative_not_absolute() {
        // Scaling all power values by a constant must not change the dB
        // matrix, since the reference scales with it.
        let mut a = array![[4.0, 1.0], [0.25, 2.0]];
        let mut b = a.mapv(|v| v * 1000.0);
        power_to_db(&mut a);
        power_to_db(&mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }
}
