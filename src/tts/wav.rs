use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

pub const SAMPLE_RATE: u32 = 24_000;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const CHANNELS: u16 = 1;

const BYTES_PER_SECOND: f64 = SAMPLE_RATE as f64 * (BITS_PER_SAMPLE / 8) as f64;

pub fn pcm_duration_secs(pcm_len: usize) -> f64 {
    pcm_len as f64 / BYTES_PER_SECOND
}

/// Wraps raw little-endian 16-bit mono PCM into a WAV file.
pub fn write_wav(path: &Path, pcm: &[u8]) -> Result<u64, hound::Error> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    if pcm.len() % 2 != 0 {
        tracing::warn!("PCM payload has an odd byte count ({}), dropping the last byte", pcm.len());
    }

    let mut writer = WavWriter::create(path, spec)?;
    for frame in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([frame[0], frame[1]]))?;
    }
    writer.finalize()?;

    Ok(std::fs::metadata(path)?.len())
}
