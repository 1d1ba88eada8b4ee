use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use wav_loudness_floor::{AdjustOptions, adjust_folder_loudness};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// input directory, scanned recursively for .wav files
    #[arg(long = "input_dir")]
    input_dir: PathBuf,

    /// output directory, mirrors the input directory structure
    #[arg(long = "output_dir")]
    output_dir: PathBuf,

    /// target loudness in dBFS for the non-silent part of each file, e.g. -20
    #[arg(long, allow_negative_numbers = true, value_parser = parse_threshold)]
    threshold: f64,
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("threshold must be a finite dBFS value, got {s}"))
    }
}

fn main() -> Result<()> {
    _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();

    let options = AdjustOptions {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        threshold_dbfs: cli.threshold,
    };

    info!("Starting loudness adjustment with options:");
    info!("  Input Directory: {:?}", options.input_dir);
    info!("  Output Directory: {:?}", options.output_dir);
    info!("  Threshold: {:.2} dBFS", options.threshold_dbfs);
    info!("---");

    match adjust_folder_loudness(&options) {
        Ok(summary) => {
            info!(
                "Loudness adjustment finished: {} files visited.",
                summary.total()
            );
            Ok(())
        }
        Err(e) => {
            error!("Loudness adjustment failed: {}", e);
            Err(e)?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_flags() {
        let cli = Cli::try_parse_from([
            "loudness-floor",
            "--input_dir",
            "in",
            "--output_dir",
            "out",
            "--threshold",
            "-20.5",
        ])
        .unwrap();
        assert_eq!(cli.input_dir, PathBuf::from("in"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.threshold, -20.5);
    }

    #[test]
    fn rejects_missing_or_non_finite_threshold() {
        assert!(
            Cli::try_parse_from(["loudness-floor", "--input_dir", "in", "--output_dir", "out"])
                .is_err()
        );
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
        assert_eq!(parse_threshold("-12"), Ok(-12.0));
    }
}
