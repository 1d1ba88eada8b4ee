use crate::audio::AudioFile;
use crate::error::FileError;
use crate::save::save_as_wav;
use crate::silence::{
    Interval, MIN_SILENCE_LEN_MS, SEEK_STEP_MS, SILENCE_THRESHOLD_OFFSET_DB, detect_nonsilent,
};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;
use strum_macros::Display;

/// Loudness of one waveform, taken over its non-silent content
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// dBFS of the whole file
    pub overall_dbfs: f64,
    /// Silence cutoff used for detection
    pub silence_thresh_dbfs: f64,
    /// Non-silent intervals, in time order
    pub nonsilent: Vec<Interval>,
    /// dBFS of the non-silent composite, or of the whole file if nothing was non-silent
    pub effective_dbfs: f64,
}

/// What to do with a measured file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainDecision {
    NoChange,
    /// Always strictly positive
    Amplify { gain_db: f64 },
}

impl GainDecision {
    /// Decides the gain for a file measured at `effective_dbfs`.
    ///
    /// Returns `None` for true digital silence, which no gain can lift, and
    /// for a NaN level, which cannot be compared at all.
    pub fn decide(effective_dbfs: f64, threshold_dbfs: f64) -> Option<Self> {
        if effective_dbfs == f64::NEG_INFINITY || effective_dbfs.is_nan() {
            return None;
        }
        if effective_dbfs < threshold_dbfs {
            Some(Self::Amplify {
                gain_db: threshold_dbfs - effective_dbfs,
            })
        } else {
            Some(Self::NoChange)
        }
    }
}

/// Terminal result of a file that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Amplified { effective_dbfs: f64, gain_db: f64 },
    Unchanged { effective_dbfs: f64 },
    SkippedSilent,
}

/// Concatenates the given intervals of `audio`, in order
pub fn non_silent_composite(audio: &AudioFile, intervals: &[Interval]) -> AudioFile {
    let mut composite = AudioFile::empty(audio.spec());
    for interval in intervals {
        composite.append(&audio.slice_ms(interval.start_ms, interval.end_ms));
    }
    composite
}

/// Measures the effective loudness of `audio`, ignoring its silent stretches
pub fn measure_effective_loudness(audio: &AudioFile) -> Measurement {
    let overall_dbfs = audio.dbfs();
    let silence_thresh_dbfs = overall_dbfs - SILENCE_THRESHOLD_OFFSET_DB;
    let nonsilent = detect_nonsilent(audio, MIN_SILENCE_LEN_MS, silence_thresh_dbfs, SEEK_STEP_MS);

    let effective_dbfs = if nonsilent.is_empty() {
        overall_dbfs
    } else {
        non_silent_composite(audio, &nonsilent).dbfs()
    };
    debug!(
        "  -> Overall: {:.2} dBFS, Silence Threshold: {:.2} dBFS, {} non-silent intervals, Effective: {:.2} dBFS",
        overall_dbfs,
        silence_thresh_dbfs,
        nonsilent.len(),
        effective_dbfs
    );

    Measurement {
        overall_dbfs,
        silence_thresh_dbfs,
        nonsilent,
        effective_dbfs,
    }
}

/// Raises one WAV file to `threshold_dbfs` if its non-silent content is quieter,
/// writing the result to `output_path`.
///
/// Gain is applied to the entire original waveform, silent parts included. A file
/// that is pure digital silence is skipped and nothing is written.
///
/// # Arguments
/// * `input_path` - WAV file to read
/// * `output_path` - Destination; parent directories are created as needed
/// * `threshold_dbfs` - Loudness floor in dBFS
pub fn adjust_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    threshold_dbfs: f64,
) -> Result<Outcome, FileError> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    debug!("Processing: {}", input_path.display());

    let audio = AudioFile::open(input_path)?;
    let measurement = measure_effective_loudness(&audio);
    let effective_dbfs = measurement.effective_dbfs;
    if effective_dbfs.is_nan() {
        return Err(FileError::NonFiniteSamples {
            path: input_path.to_path_buf(),
        });
    }

    let Some(decision) = GainDecision::decide(effective_dbfs, threshold_dbfs) else {
        warn!("Skipping silent file: {}", input_path.display());
        return Ok(Outcome::SkippedSilent);
    };

    let (adjusted, outcome) = match decision {
        GainDecision::Amplify { gain_db } => (
            audio.apply_gain(gain_db),
            Outcome::Amplified {
                effective_dbfs,
                gain_db,
            },
        ),
        GainDecision::NoChange => (audio, Outcome::Unchanged { effective_dbfs }),
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| FileError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    save_as_wav(output_path, &adjusted).map_err(|e| FileError::Write {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    match outcome {
        Outcome::Amplified { gain_db, .. } => info!(
            "Amplified {}: non-silent {:.2} dBFS raised by {:.2} dB to {:.2} dBFS",
            input_path.display(),
            effective_dbfs,
            gain_db,
            threshold_dbfs
        ),
        _ => info!(
            "Unchanged {}: non-silent {:.2} dBFS is at or above {:.2} dBFS",
            input_path.display(),
            effective_dbfs,
            threshold_dbfs
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec};

    fn mono(samples: Vec<f64>) -> AudioFile {
        AudioFile::from_samples(
            WavSpec {
                channels: 1,
                sample_rate: 1000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            samples,
        )
    }

    #[test]
    fn decision_thresholds() {
        assert_eq!(GainDecision::decide(f64::NEG_INFINITY, -20.0), None);
        assert_eq!(GainDecision::decide(f64::NAN, -20.0), None);
        assert_eq!(
            GainDecision::decide(-30.0, -20.0),
            Some(GainDecision::Amplify { gain_db: 10.0 })
        );
        assert_eq!(
            GainDecision::decide(-20.0, -20.0),
            Some(GainDecision::NoChange)
        );
        assert_eq!(
            GainDecision::decide(-10.0, -20.0),
            Some(GainDecision::NoChange)
        );
    }

    #[test]
    fn silence_does_not_dilute_loudness() {
        // 300 ms at -20 dBFS followed by 700 ms of digital silence
        let mut samples: Vec<f64> = (0..300)
            .map(|i| if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        samples.extend(std::iter::repeat_n(0.0, 700));
        let m = measure_effective_loudness(&mono(samples));

        assert!(m.overall_dbfs < -25.0);
        assert_eq!(m.nonsilent, vec![Interval::new(0, 300)]);
        assert!((m.effective_dbfs - -20.0).abs() < 1e-9);
    }

    #[test]
    fn silent_waveform_measures_negative_infinity() {
        let m = measure_effective_loudness(&mono(vec![0.0; 500]));
        assert!(m.nonsilent.is_empty());
        assert_eq!(m.effective_dbfs, f64::NEG_INFINITY);
    }

    #[test]
    fn composite_keeps_order() {
        let audio = mono((0..10).map(|i| i as f64 / 10.0).collect());
        let composite =
            non_silent_composite(&audio, &[Interval::new(1, 3), Interval::new(6, 8)]);
        assert_eq!(composite.samples(), &[0.1, 0.2, 0.6, 0.7]);
    }

    #[test]
    fn outcome_names() {
        assert_eq!(Outcome::SkippedSilent.to_string(), "skipped_silent");
        assert_eq!(
            Outcome::Unchanged {
                effective_dbfs: -3.0
            }
            .to_string(),
            "unchanged"
        );
    }
}
