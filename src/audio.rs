use crate::error::FileError;
use hound::{SampleFormat, WavReader, WavSpec};
use log::debug;
use std::path::Path;

/// Decoded PCM waveform.
///
/// Samples are kept interleaved and normalised to full scale, so that integer
/// and float sources share one loudness scale. Integer samples divide by a power
/// of two, which makes the conversion exact in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    spec: WavSpec,
    samples: Vec<f64>,
}

impl AudioFile {
    /// Decodes a WAV file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let decode_err = |source| FileError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let reader = WavReader::open(path).map_err(decode_err)?;
        let spec = reader.spec();
        if !is_supported(spec) {
            return Err(FileError::UnsupportedFormat {
                path: path.to_path_buf(),
                bits: spec.bits_per_sample,
                format: match spec.sample_format {
                    SampleFormat::Int => "integer",
                    SampleFormat::Float => "float",
                },
            });
        }

        let samples = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<Vec<_>, _>>(),
            SampleFormat::Int => {
                let scale = full_scale(spec.bits_per_sample);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| f64::from(v) / scale))
                    .collect::<Result<Vec<_>, _>>()
            }
        }
        .map_err(decode_err)?;

        debug!(
            "Decoded {:?}: {} ch, {} Hz, {}-bit {:?}, {} samples",
            path.file_name().unwrap_or_default(),
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample,
            spec.sample_format,
            samples.len()
        );
        Ok(Self { spec, samples })
    }

    /// Builds a waveform from interleaved samples normalised to full scale
    pub fn from_samples(spec: WavSpec, samples: Vec<f64>) -> Self {
        Self { spec, samples }
    }

    /// An empty waveform sharing `spec`, the start of a concatenation
    pub fn empty(spec: WavSpec) -> Self {
        Self::from_samples(spec, Vec::new())
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn channels(&self) -> usize {
        usize::from(self.spec.channels.max(1))
    }

    /// Number of frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in whole milliseconds, rounded to nearest
    pub fn duration_ms(&self) -> u64 {
        if self.spec.sample_rate == 0 {
            return 0;
        }
        (self.frame_count() as f64 * 1000.0 / f64::from(self.spec.sample_rate)).round() as u64
    }

    /// Frame index that a millisecond position falls on, clamped to the waveform
    pub fn frame_at_ms(&self, ms: u64) -> usize {
        let ms = ms.min(self.duration_ms());
        let frame = (ms as f64 * f64::from(self.spec.sample_rate) / 1000.0) as usize;
        frame.min(self.frame_count())
    }

    /// The `[start_ms, end_ms)` portion of the waveform
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioFile {
        let channels = self.channels();
        let start = self.frame_at_ms(start_ms);
        let end = self.frame_at_ms(end_ms).max(start);
        Self::from_samples(
            self.spec,
            self.samples[start * channels..end * channels].to_vec(),
        )
    }

    /// Appends another waveform of the same layout
    pub fn append(&mut self, other: &AudioFile) {
        debug_assert_eq!(self.spec, other.spec);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Loudness as RMS over every sample of every channel, in dBFS
    pub fn dbfs(&self) -> f64 {
        let sum_of_squares: f64 = self.samples.iter().map(|s| s * s).sum();
        calculate_rms_dbfs(sum_of_squares, self.samples.len() as u64)
    }

    /// Running sum of squared samples per frame; entry `i` covers frames `0..i`
    pub fn energy_prefix_sums(&self) -> Vec<f64> {
        let mut prefix = Vec::with_capacity(self.frame_count() + 1);
        let mut running = 0.0;
        prefix.push(running);
        for frame in self.samples.chunks_exact(self.channels()) {
            running += frame.iter().map(|s| s * s).sum::<f64>();
            prefix.push(running);
        }
        prefix
    }

    /// Scales every sample by `gain_db`
    ///
    /// Integer formats clip at full scale. Float samples are left unclipped,
    /// since the container can carry values beyond ±1.0.
    pub fn apply_gain(mut self, gain_db: f64) -> Self {
        let factor = db_to_linear(gain_db);
        let clip = self.spec.sample_format == SampleFormat::Int;
        for sample in &mut self.samples {
            *sample *= factor;
            if clip {
                *sample = sample.clamp(-1.0, 1.0);
            }
        }
        self
    }
}

/// Whether we can decode and re-encode this sample format without loss
pub fn is_supported(spec: WavSpec) -> bool {
    match spec.sample_format {
        SampleFormat::Int => matches!(spec.bits_per_sample, 8 | 16 | 24 | 32),
        SampleFormat::Float => spec.bits_per_sample == 32,
    }
}

/// Magnitude of full scale for signed integer samples of `bits` width
pub(crate) fn full_scale(bits: u16) -> f64 {
    2f64.powi(i32::from(bits) - 1)
}

/// Converts a level in decibels to a linear amplitude factor. `-inf` maps to 0.
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Calculates RMS value in dBFS, or negative infinity for silence
///
/// # Arguments
/// * `sum_of_squares` - Sum of squared normalised samples
/// * `total_samples` - Total number of samples
pub fn calculate_rms_dbfs(sum_of_squares: f64, total_samples: u64) -> f64 {
    if total_samples == 0 {
        return f64::NEG_INFINITY;
    }
    let mean_square = sum_of_squares / total_samples as f64;
    if mean_square <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * mean_square.sqrt().log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_16(rate: u32, samples: Vec<f64>) -> AudioFile {
        AudioFile::from_samples(
            WavSpec {
                channels: 1,
                sample_rate: rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            samples,
        )
    }

    #[test]
    fn silence_is_negative_infinity() {
        assert_eq!(mono_16(1000, vec![0.0; 100]).dbfs(), f64::NEG_INFINITY);
        assert_eq!(mono_16(1000, vec![]).dbfs(), f64::NEG_INFINITY);
    }

    #[test]
    fn square_wave_dbfs() {
        let audio = mono_16(1000, vec![0.1, -0.1, 0.1, -0.1]);
        assert!((audio.dbfs() - -20.0).abs() < 1e-9);
    }

    #[test]
    fn slicing_maps_milliseconds_to_frames() {
        let audio = mono_16(8000, (0..8000).map(|i| i as f64 / 8000.0).collect());
        assert_eq!(audio.duration_ms(), 1000);
        let slice = audio.slice_ms(100, 250);
        assert_eq!(slice.frame_count(), 1200);
        assert_eq!(slice.samples()[0], 800.0 / 8000.0);
        // past the end clamps instead of panicking
        assert_eq!(audio.slice_ms(900, 5000).frame_count(), 800);
        assert!(audio.slice_ms(300, 200).is_empty());
    }

    #[test]
    fn prefix_sums_cover_all_channels() {
        let audio = AudioFile::from_samples(
            WavSpec {
                channels: 2,
                sample_rate: 1000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            vec![0.5, 0.5, 0.0, 1.0],
        );
        assert_eq!(audio.energy_prefix_sums(), vec![0.0, 0.5, 1.5]);
    }

    #[test]
    fn gain_scales_and_clips() {
        let audio = mono_16(1000, vec![0.1, -0.5, 0.25]).apply_gain(20.0 * 2f64.log10());
        let s = audio.samples();
        assert!((s[0] - 0.2).abs() < 1e-12);
        assert!((s[1] - -1.0).abs() < 1e-12);
        assert!((s[2] - 0.5).abs() < 1e-12);
        let clipped = mono_16(1000, vec![0.9, -0.9]).apply_gain(12.0);
        assert_eq!(clipped.samples(), &[1.0, -1.0]);
    }

    #[test]
    fn float_gain_keeps_over_range_samples() {
        let audio = AudioFile::from_samples(
            WavSpec {
                channels: 1,
                sample_rate: 1000,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            },
            vec![1.5, -0.25],
        )
        .apply_gain(20.0 * 2f64.log10());
        let s = audio.samples();
        assert!((s[0] - 3.0).abs() < 1e-12);
        assert!((s[1] - -0.5).abs() < 1e-12);
    }

    #[test]
    fn supported_formats() {
        let spec = |bits, sample_format| WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: bits,
            sample_format,
        };
        assert!(is_supported(spec(8, SampleFormat::Int)));
        assert!(is_supported(spec(24, SampleFormat::Int)));
        assert!(is_supported(spec(32, SampleFormat::Float)));
        assert!(!is_supported(spec(12, SampleFormat::Int)));
        assert!(!is_supported(spec(64, SampleFormat::Float)));
    }
}
