use std::path::PathBuf;

/// Errors raised while encoding a WAV file
#[derive(thiserror::Error, Debug)]
pub enum WritingError {
    #[error("Writing wav Error: {0}")]
    Wav(#[from] hound::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single file. Never aborts the batch.
#[derive(thiserror::Error, Debug)]
pub enum FileError {
    #[error("Failed to decode {path} as WAV: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("Unsupported sample format in {path}: {bits}-bit {format}")]
    UnsupportedFormat {
        path: PathBuf,
        bits: u16,
        format: &'static str,
    },
    #[error("Loudness of {path} is not a number; the file holds non-finite samples")]
    NonFiniteSamples { path: PathBuf },
    #[error("Failed to compute path of {path} relative to the input directory")]
    RelativePath { path: PathBuf },
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Audio writing failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WritingError,
    },
}

/// Fatal errors that stop the whole run before any file is touched
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input path is not an existing directory: {0:?}")]
    InputRootMissing(PathBuf),
    #[error("I/O error while scanning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
