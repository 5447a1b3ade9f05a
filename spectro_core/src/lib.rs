//! Audio to Mel-spectrogram image conversion.
//!
//! Two entry points: [`render`] turns one audio file into one color-mapped
//! spectrogram image, and [`convert_directory`] applies it to every file in a
//! directory. Each call decodes, extracts features, scales, renders, and
//! writes; nothing is cached or shared between calls.

mod decode;
mod error;
mod mel;
mod raster;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

pub use error::{Error, Result};

/// Number of Mel bands, fixed.
pub const N_MELS: usize = 128;

/// Sample rate every decoded clip is brought to. The Mel filter bank tops
/// out at Nyquist, so this pins its ceiling at 8 kHz.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// STFT window size in samples (25 ms at the pipeline rate).
pub const FFT_SIZE: usize = 400;

/// STFT hop size in samples (10 ms at the pipeline rate).
pub const HOP_SIZE: usize = 160;

/// Extension given to batch-converted images.
pub const IMAGE_EXT: &str = "jpg";

/// Render one audio file as a Mel-spectrogram image.
///
/// The image format is inferred from `image_path`'s extension; its parent
/// directory must already exist. Creates or overwrites exactly one file.
pub fn render<A: AsRef<Path>, I: AsRef<Path>>(audio_path: A, image_path: I) -> Result<()> {
    let audio_path = audio_path.as_ref();
    let image_path = image_path.as_ref();

    let samples = decode::load_mono(audio_path)?;
    let mut matrix = mel::mel_spectrogram(&samples);
    if matrix.ncols() == 0 {
        return Err(Error::Decode {
            path: audio_path.to_path_buf(),
            reason: "audio is too short for a single spectrogram frame".into(),
        });
    }

    mel::power_to_db(&mut matrix);
    raster::save_image(&matrix, image_path)
}

/// Convert every file in `input_path` to a spectrogram image in `output_path`.
///
/// The output directory is created if absent. Entries are processed in
/// lexicographic file-name order, each output named after its input with the
/// final extension replaced by [`IMAGE_EXT`]. The batch aborts on the first
/// failure; images written before that point remain on disk.
///
/// Returns the path of the last image written.
pub fn convert_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
) -> Result<PathBuf> {
    let input = input_path.as_ref();
    let output = output_path.as_ref();

    fs::create_dir_all(output).map_err(|e| Error::Io {
        path: output.to_path_buf(),
        source: e,
    })?;

    let read_err = |e: std::io::Error| Error::Io {
        path: input.to_path_buf(),
        source: e,
    };

    // Direct children only, regular files only, in a platform-independent
    // order.
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(input).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(Error::EmptyInputDir(input.to_path_buf()));
    }

    let mut last_written = None;
    for file in &files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = output.join(name).with_extension(IMAGE_EXT);

        info!("rendering {} -> {}", file.display(), target.display());
        render(file, &target)?;
        last_written = Some(target);
    }

    last_written.ok_or_else(|| Error::EmptyInputDir(input.to_path_buf()))
}
