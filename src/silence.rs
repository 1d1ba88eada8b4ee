//! Silence detection over fixed-length sliding windows.
//!
//! A window of `min_silence_len` milliseconds is slid across the waveform in
//! `seek_step` increments; a window is silent when its RMS does not exceed the
//! threshold. Overlapping silent windows merge into one interval.

use crate::audio::{AudioFile, db_to_linear};
use log::debug;

/// Shortest stretch, in milliseconds, that counts as silence
pub const MIN_SILENCE_LEN_MS: u64 = 100;
/// How far below the file's own loudness the silence threshold sits
pub const SILENCE_THRESHOLD_OFFSET_DB: f64 = 16.0;
/// Window advance in milliseconds
pub const SEEK_STEP_MS: u64 = 1;

/// A `[start_ms, end_ms)` time range within a waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Interval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Finds the silent intervals of `audio`, in time order
///
/// # Arguments
/// * `audio` - Waveform to scan
/// * `min_silence_len` - Window length in milliseconds
/// * `silence_thresh_db` - Windows at or below this RMS level (dBFS) are silent
/// * `seek_step` - Window advance in milliseconds
pub fn detect_silence(
    audio: &AudioFile,
    min_silence_len: u64,
    silence_thresh_db: f64,
    seek_step: u64,
) -> Vec<Interval> {
    let seg_len = audio.duration_ms();
    if seg_len < min_silence_len || seek_step == 0 {
        return Vec::new();
    }
    let thresh = db_to_linear(silence_thresh_db);
    let prefix = audio.energy_prefix_sums();
    let channels = audio.channels() as f64;

    let window_rms = |start_ms: u64| {
        let from = audio.frame_at_ms(start_ms);
        let to = audio.frame_at_ms(start_ms + min_silence_len);
        let count = to.saturating_sub(from) as f64 * channels;
        if count == 0.0 {
            return 0.0;
        }
        // prefix differences can dip just below zero after a loud stretch
        ((prefix[to] - prefix[from]).max(0.0) / count).sqrt()
    };

    let last_slice_start = seg_len - min_silence_len;
    let mut slice_starts: Vec<u64> = (0..=last_slice_start)
        .step_by(seek_step as usize)
        .collect();
    if last_slice_start % seek_step != 0 {
        slice_starts.push(last_slice_start);
    }
    let window_count = slice_starts.len();
    let silence_starts: Vec<u64> = slice_starts
        .into_iter()
        .filter(|&start| window_rms(start) <= thresh)
        .collect();
    debug!(
        "{} of {} windows at or below {:.2} dBFS",
        silence_starts.len(),
        window_count,
        silence_thresh_db
    );

    let mut starts = silence_starts.into_iter();
    let Some(first) = starts.next() else {
        return Vec::new();
    };
    let mut silent_ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for start in starts {
        let continuous = start == prev + seek_step;
        let has_gap = start > prev + min_silence_len;
        if !continuous && has_gap {
            silent_ranges.push(Interval::new(range_start, prev + min_silence_len));
            range_start = start;
        }
        prev = start;
    }
    silent_ranges.push(Interval::new(range_start, prev + min_silence_len));
    silent_ranges
}

/// Finds the intervals of `audio` lying outside every detected silence
///
/// A waveform without silence yields one interval spanning all of it; a
/// waveform that is silent end to end yields none.
pub fn detect_nonsilent(
    audio: &AudioFile,
    min_silence_len: u64,
    silence_thresh_db: f64,
    seek_step: u64,
) -> Vec<Interval> {
    let silent_ranges = detect_silence(audio, min_silence_len, silence_thresh_db, seek_step);
    let len = audio.duration_ms();

    let Some(last) = silent_ranges.last().copied() else {
        return vec![Interval::new(0, len)];
    };
    if silent_ranges[0] == Interval::new(0, len) {
        return Vec::new();
    }

    let mut nonsilent = Vec::with_capacity(silent_ranges.len() + 1);
    let mut prev_end = 0;
    for range in &silent_ranges {
        nonsilent.push(Interval::new(prev_end, range.start_ms));
        prev_end = range.end_ms;
    }
    if last.end_ms != len {
        nonsilent.push(Interval::new(prev_end, len));
    }
    if nonsilent.first() == Some(&Interval::new(0, 0)) {
        nonsilent.remove(0);
    }
    nonsilent
}
