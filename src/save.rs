use crate::audio::{AudioFile, full_scale};
use crate::error::WritingError;
use hound::SampleFormat;
use std::path::Path;

/// Saves a waveform as a WAV file in its own sample format
///
/// Integer formats are rounded to the nearest step and clipped to the format's
/// range, so a waveform decoded from disk and left untouched is written back
/// sample for sample.
///
/// # Arguments
/// * `path` - Output file path
/// * `audio` - Waveform to encode; its spec decides channels, rate and bit depth
///
/// # Returns
/// Result indicating success or a WritingError
pub fn save_as_wav(path: &Path, audio: &AudioFile) -> Result<(), WritingError> {
    let spec = audio.spec();
    let mut writer = hound::WavWriter::create(path, spec)?;
    match spec.sample_format {
        SampleFormat::Float => {
            for &sample in audio.samples() {
                writer.write_sample(sample as f32)?;
            }
        }
        SampleFormat::Int => {
            let scale = full_scale(spec.bits_per_sample);
            let (min, max) = (-scale, scale - 1.0);
            for &sample in audio.samples() {
                writer.write_sample((sample * scale).round().clamp(min, max) as i32)?;
            }
        }
    }
    Ok(writer.finalize()?)
}
