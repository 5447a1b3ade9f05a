//! Audio file decoding.
//!
//! Any container/codec combination Symphonia is built with (WAV, MP3, FLAC,
//! OGG Vorbis here) is accepted. Whatever the source looks like, the output
//! is always mono f32 at [`SAMPLE_RATE_HZ`]: multi-channel input is averaged
//! down and off-rate input is resampled, so the feature extractor never sees
//! anything else.

use std::path::Path;

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{Error, Result};
use crate::SAMPLE_RATE_HZ;

/// Decode an audio file to mono f32 samples at the pipeline sample rate.
pub fn load_mono<P: AsRef<Path>>(path: P) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let decode_err = |reason: String| Error::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path)
        .map_err(|e| decode_err(format!("failed to open file: {e}")))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint from extension (optional but helps the probe).
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(format!("unsupported format or failed to probe container: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no supported audio tracks found".into()))?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("failed to create decoder for selected track: {e}")))?;

    // Decoded interleaved f32 accumulates here.
    let mut interleaved: Vec<f32> = Vec::new();

    // Prefer codec params for rate/channels, fall back to the first decoded
    // buffer's spec when the container does not declare them upfront.
    let mut input_sample_rate: Option<u32> = track.codec_params.sample_rate;
    let mut input_channels: Option<usize> = track.codec_params.channels.map(|c| c.count());

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(SymphoniaError::ResetRequired) => {
                return Err(decode_err("decoder reset required (chained streams)".into()));
            }
            Err(e) => return Err(decode_err(format!("error reading next packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Skip over recoverable per-packet failures.
            Err(SymphoniaError::IoError(_)) => continue,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::ResetRequired) => {
                return Err(decode_err("decoder reset required mid-stream".into()));
            }
            Err(e) => return Err(decode_err(format!("unrecoverable decode error: {e}"))),
        };

        input_sample_rate.get_or_insert(decoded.spec().rate);
        input_channels.get_or_insert(decoded.spec().channels.count());

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sbuf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sbuf.samples());
    }

    let sr_in =
        input_sample_rate.ok_or_else(|| decode_err("could not determine sample rate".into()))?;
    let ch_in =
        input_channels.ok_or_else(|| decode_err("could not determine channel count".into()))?;

    if interleaved.is_empty() {
        return Err(decode_err("decoded audio was empty".into()));
    }

    debug!(
        "decoded {}: {} Hz, {} channel(s), {} frames",
        path.display(),
        sr_in,
        ch_in,
        interleaved.len() / ch_in
    );

    let mono = downmix(interleaved, ch_in);

    if sr_in == SAMPLE_RATE_HZ {
        return Ok(mono);
    }
    resample(&mono, sr_in)
}

/// Average interleaved channels into a single mono channel.
fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved;
    }

    let frames = interleaved.len() / channels;
    let mut out = Vec::with_capacity(frames);
    for f in 0..frames {
        let base = f * channels;
        let sum: f32 = interleaved[base..base + channels].iter().sum();
        out.push(sum / channels as f32);
    }
    out
}

/// Resample a whole mono clip from `sr_in` to the pipeline sample rate.
fn resample(mono: &[f32], sr_in: u32) -> Result<Vec<f32>> {
    // Offline whole-clip resampling with a fixed input chunking; 1024 is a
    // fine chunk size for this.
    let chunk_size: usize = 1024;
    let sub_chunks: usize = 1;

    let mut resampler = Fft::<f32>::new(
        sr_in as usize,
        SAMPLE_RATE_HZ as usize,
        chunk_size,
        sub_chunks,
        1, // mono
        FixedSync::Input,
    )
    .map_err(|e| Error::Resample(format!("failed to construct FFT resampler: {e}")))?;

    let input_frames = mono.len();
    let out_frames = resampler.process_all_needed_output_len(input_frames);
    let mut out = vec![0.0f32; out_frames];

    // One-channel interleaved adapters are plain slices.
    let input_adapter = InterleavedSlice::new(mono, 1, input_frames)
        .map_err(|e| Error::Resample(format!("bad input adapter: {e}")))?;
    let mut output_adapter = InterleavedSlice::new_mut(&mut out, 1, out_frames)
        .map_err(|e| Error::Resample(format!("bad output adapter: {e}")))?;

    let (_frames_read, frames_written) = resampler
        .process_all_into_buffer(&input_adapter, &mut output_adapter, input_frames, None)
        .map_err(|e| Error::Resample(e.to_string()))?;

    out.truncate(frames_written);
    Ok(out)
}
