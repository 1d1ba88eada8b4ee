/// Module for measuring and amplifying a single file
pub mod adjust;
/// Module for the decoded waveform
pub mod audio;
/// Module for error handling
pub mod error;
/// Module for saving audio files
pub mod save;
/// Module for silence detection
pub mod silence;

use crate::adjust::{Outcome, adjust_file};
use crate::error::{Error, FileError};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for a loudness adjustment run
#[derive(Debug, Clone)]
pub struct AdjustOptions {
    /// Input directory scanned recursively for WAV files
    pub input_dir: PathBuf,
    /// Output directory mirroring the input tree
    pub output_dir: PathBuf,
    /// Loudness floor in dBFS for the non-silent content of each file
    pub threshold_dbfs: f64,
}

/// Per-outcome file counts of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub amplified: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Amplified { .. } => self.amplified += 1,
            Outcome::Unchanged { .. } => self.unchanged += 1,
            Outcome::SkippedSilent => self.skipped += 1,
        }
    }

    /// Number of WAV files visited
    pub fn total(&self) -> usize {
        self.amplified + self.unchanged + self.skipped + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} amplified, {} unchanged, {} skipped, {} failed",
            self.amplified, self.unchanged, self.skipped, self.failed
        )
    }
}

/// Raise every quiet WAV file under a folder to the loudness floor
///
/// Files are handled one at a time. A failing file is logged and counted, and
/// the batch moves on; only a missing input directory aborts the run.
pub fn adjust_folder_loudness(options: &AdjustOptions) -> Result<BatchSummary, Error> {
    validate_options(options)?;

    info!("Discovering WAV files in {:?}...", options.input_dir);
    let wav_files = find_wav_files(&options.input_dir)?;
    let mut summary = BatchSummary::default();
    if wav_files.is_empty() {
        info!("No WAV files found.");
        return Ok(summary);
    }
    info!(
        "Found {} WAV files. Raising quiet files to {:.2} dBFS...",
        wav_files.len(),
        options.threshold_dbfs
    );

    let process_pb = ProgressBar::new(wav_files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        process_pb.set_style(style.progress_chars("#>-"));
    }
    process_pb.set_message("Processing files");

    for input_path in wav_files.iter().progress_with(process_pb.clone()) {
        let result = mirror_output_path(input_path, &options.input_dir, &options.output_dir)
            .and_then(|output_path| {
                adjust_file(input_path, output_path, options.threshold_dbfs)
            });
        match result {
            Ok(outcome) => {
                debug!("{}: {}", input_path.display(), outcome);
                summary.record(&outcome);
            }
            Err(e) => {
                error!("Error: {}", e);
                summary.failed += 1;
            }
        }
    }
    process_pb.finish_with_message("Processing done");

    info!("Processing complete. {}.", summary);
    Ok(summary)
}

/// Computes where the adjusted copy of `input_path` goes
///
/// # Arguments
/// * `input_path` - File under `input_root`
/// * `input_root` - Root of the scanned tree
/// * `output_root` - Root the tree is mirrored onto
pub fn mirror_output_path(
    input_path: impl AsRef<Path>,
    input_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
) -> Result<PathBuf, FileError> {
    let input_path = input_path.as_ref();
    let relative_path = pathdiff::diff_paths(input_path, input_root).ok_or_else(|| {
        FileError::RelativePath {
            path: input_path.to_path_buf(),
        }
    })?;
    Ok(output_root.as_ref().join(relative_path))
}

/// Whether the path names a `.wav` file, ignoring case
pub fn has_wav_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Finds all WAV files under a directory, sorted by name within each directory
///
/// Symlinks to files are included; symlinked directories are not descended.
/// Entries that cannot be read are logged and skipped; only a failure on the
/// root itself is an error.
pub fn find_wav_files(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let input_dir = input_dir.as_ref();
    let mut wav_files = Vec::new();

    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::Io {
                    path: input_dir.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && has_wav_extension(entry.path()) {
            wav_files.push(entry.into_path());
        }
    }
    Ok(wav_files)
}

/// Validates adjustment options before any file is touched
fn validate_options(options: &AdjustOptions) -> Result<(), Error> {
    if !options.input_dir.is_dir() {
        return Err(Error::InputRootMissing(options.input_dir.clone()));
    }
    if options.threshold_dbfs > 0.0 {
        warn!(
            "Threshold {:.1} dBFS is above full scale. Amplified files will clip.",
            options.threshold_dbfs
        );
    }
    Ok(())
}
