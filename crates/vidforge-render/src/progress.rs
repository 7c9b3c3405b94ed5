//! Engine progress parsing
//!
//! The engine reports progress as unstructured diagnostic lines of the form
//! `frame= 1234 fps= 29.9 q=28.0 size= ...`. Parsing is best-effort and
//! side-channel only: lines that do not match are skipped, and nothing here
//! ever influences whether a job succeeds (the exit code is authoritative).

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;

static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"frame=\s*(\d+)(?:.*?fps=\s*([0-9.]+))?").unwrap());

/// Number of recent samples the rate is computed over. A single-frame delta
/// would make the estimate jump with every I/O stall.
const RATE_WINDOW: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    pub frames_done: u64,
    pub fps: Option<f64>,
    /// Estimated time remaining; present only when the job supplied
    /// `total_frames` and enough samples have accumulated.
    pub eta: Option<Duration>,
}

/// Informational callback invoked once per recognized progress line.
pub type ProgressObserver = Arc<dyn Fn(ProgressSample) + Send + Sync>;

/// Accumulates progress lines for one engine invocation.
pub struct ProgressTracker {
    total_frames: Option<u64>,
    window: VecDeque<(Instant, u64)>,
}

impl ProgressTracker {
    pub fn new(total_frames: Option<u64>) -> Self {
        Self {
            total_frames,
            window: VecDeque::with_capacity(RATE_WINDOW),
        }
    }

    /// Parse one diagnostic line; returns a sample when it carried progress.
    pub fn observe_line(&mut self, line: &str) -> Option<ProgressSample> {
        self.observe_line_at(line, Instant::now())
    }

    fn observe_line_at(&mut self, line: &str, at: Instant) -> Option<ProgressSample> {
        let caps = PROGRESS_RE.captures(line)?;
        let frames_done: u64 = caps[1].parse().ok()?;
        let fps: Option<f64> = caps.get(2).and_then(|m| m.as_str().parse().ok());

        self.window.push_back((at, frames_done));
        while self.window.len() > RATE_WINDOW {
            self.window.pop_front();
        }

        Some(ProgressSample {
            frames_done,
            fps,
            eta: self.estimate_eta(frames_done),
        })
    }

    /// Remaining time from the frame rate across the sample window.
    fn estimate_eta(&self, frames_done: u64) -> Option<Duration> {
        let total = self.total_frames?;
        let remaining = total.saturating_sub(frames_done);

        let (first_at, first_frames) = *self.window.front()?;
        let (last_at, last_frames) = *self.window.back()?;
        if self.window.len() < 2 || last_frames <= first_frames {
            return None;
        }

        let elapsed = last_at.duration_since(first_at).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let rate = (last_frames - first_frames) as f64 / elapsed;
        Some(Duration::from_secs_f64(remaining as f64 / rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_stats_line() {
        let mut tracker = ProgressTracker::new(None);
        let sample = tracker
            .observe_line("frame=  120 fps= 30.0 q=28.0 size=     512KiB time=00:00:04.00")
            .unwrap();
        assert_eq!(sample.frames_done, 120);
        assert_eq!(sample.fps, Some(30.0));
        assert!(sample.eta.is_none());
    }

    #[test]
    fn parses_frame_without_fps() {
        let mut tracker = ProgressTracker::new(None);
        let sample = tracker.observe_line("frame=5").unwrap();
        assert_eq!(sample.frames_done, 5);
        assert_eq!(sample.fps, None);
    }

    #[test]
    fn tolerates_unrelated_lines() {
        let mut tracker = ProgressTracker::new(Some(100));
        assert!(tracker.observe_line("Input #0, mov,mp4 ...").is_none());
        assert!(tracker
            .observe_line("Stream mapping: Stream #0:0 -> #0:0 (h264 -> h264)")
            .is_none());
        assert!(tracker.observe_line("").is_none());
    }

    #[test]
    fn eta_uses_window_rate_not_single_delta() {
        let mut tracker = ProgressTracker::new(Some(1000));
        let start = Instant::now();

        // 100 frames per second across the window.
        for i in 0..5u64 {
            tracker.observe_line_at(
                &format!("frame= {} fps= 0.0", i * 100),
                start + Duration::from_secs(i),
            );
        }
        let sample = tracker
            .observe_line_at("frame= 500 fps= 0.0", start + Duration::from_secs(5))
            .unwrap();

        let eta = sample.eta.expect("eta should be available");
        // 500 frames remain at ~100 fps.
        assert!((eta.as_secs_f64() - 5.0).abs() < 0.5, "eta was {eta:?}");
    }

    #[test]
    fn eta_absent_without_total_frames() {
        let mut tracker = ProgressTracker::new(None);
        let start = Instant::now();
        tracker.observe_line_at("frame= 10", start);
        let sample = tracker
            .observe_line_at("frame= 20", start + Duration::from_secs(1))
            .unwrap();
        assert!(sample.eta.is_none());
    }

    #[test]
    fn eta_absent_when_frames_stall() {
        let mut tracker = ProgressTracker::new(Some(100));
        let start = Instant::now();
        tracker.observe_line_at("frame= 10", start);
        let sample = tracker
            .observe_line_at("frame= 10", start + Duration::from_secs(1))
            .unwrap();
        assert!(sample.eta.is_none());
    }
}
