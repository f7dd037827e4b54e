//! Run progress, reported as a single log line per completed percent
//! block.
//!
//! Completed base-pairs are tracked against the total target size under a
//! mutex; contention is negligible since there is one event per completed
//! region. The ETA comes from a moving window of recent per-block
//! durations with 2σ outlier trimming, which keeps it stable against
//! trivially small regions finishing in bursts.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::variants::GenomicRegion;

const PERCENT_BLOCK_SIZE: f64 = 1.0;
const ETA_WINDOW: usize = 100;

/// Snapshot emitted at each progress block.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub region: GenomicRegion,
    pub completed_bp: u64,
    pub percent_complete: f64,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

struct MeterState {
    completed_bp: u64,
    percent_at_last_log: f64,
    percent_until_log: f64,
    last_log: Instant,
    block_durations: Vec<f64>,
    done: bool,
}

pub struct ProgressMeter {
    total_bp: u64,
    start: Instant,
    state: Mutex<MeterState>,
}

impl ProgressMeter {
    pub fn new(regions: &[GenomicRegion]) -> Self {
        let total_bp = regions.iter().map(GenomicRegion::size).sum();
        let now = Instant::now();
        ProgressMeter {
            total_bp,
            start: now,
            state: Mutex::new(MeterState {
                completed_bp: 0,
                percent_at_last_log: 0.0,
                percent_until_log: PERCENT_BLOCK_SIZE,
                last_log: now,
                block_durations: Vec::new(),
                done: false,
            }),
        }
    }

    pub fn total_bp(&self) -> u64 {
        self.total_bp
    }

    pub fn completed_bp(&self) -> u64 {
        self.state.lock().unwrap().completed_bp
    }

    pub fn percent_complete(&self) -> f64 {
        percent(self.completed_bp(), self.total_bp)
    }

    /// Record a finished region. Returns the progress event when this
    /// completion crossed a log block boundary.
    pub fn report_completed(&self, region: &GenomicRegion) -> Option<ProgressEvent> {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();

        state.completed_bp += region.size();
        let percent_done = percent(state.completed_bp, self.total_bp);
        state.percent_until_log = state.percent_at_last_log + PERCENT_BLOCK_SIZE - percent_done;
        if state.percent_until_log > 0.0 && percent_done < 100.0 {
            return None;
        }

        let blocks_completed =
            ((percent_done - state.percent_at_last_log) / PERCENT_BLOCK_SIZE).floor() as usize;
        if blocks_completed > 0 {
            let per_block =
                now.duration_since(state.last_log).as_secs_f64() * 1e3 / blocks_completed as f64;
            state
                .block_durations
                .extend(std::iter::repeat(per_block).take(blocks_completed));
            let excess = state.block_durations.len().saturating_sub(ETA_WINDOW);
            state.block_durations.drain(..excess);
        }
        trim_outliers(&mut state.block_durations);

        let elapsed = now.duration_since(self.start);
        let eta = if percent_done >= 100.0 {
            Some(Duration::from_secs(0))
        } else {
            let remaining_blocks = (100.0 - percent_done) / PERCENT_BLOCK_SIZE;
            estimate_eta(&state.block_durations, remaining_blocks)
        };

        let event = ProgressEvent {
            region: region.clone(),
            completed_bp: state.completed_bp,
            percent_complete: percent_done,
            elapsed,
            eta,
        };

        if percent_done >= 100.0 {
            if !state.done {
                state.done = true;
                info!("100.0% completed in {}", format_duration(elapsed));
            }
        } else {
            info!(
                "{}:{} {:.1}% completed in {} (eta {})",
                region.contig(),
                region.end(),
                percent_done,
                format_duration(elapsed),
                event
                    .eta
                    .map(format_duration)
                    .unwrap_or_else(|| "-".to_owned()),
            );
        }

        state.last_log = now;
        state.percent_at_last_log = percent_done;
        state.percent_until_log = PERCENT_BLOCK_SIZE;

        Some(event)
    }

    /// Emit the final line if the run stopped before 100%.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.done {
            state.done = true;
            info!(
                "stopped at {:.1}% after {}",
                percent(state.completed_bp, self.total_bp),
                format_duration(self.start.elapsed())
            );
        }
    }
}

fn percent(completed: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        100.0 * completed as f64 / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn stdev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Drop durations outside mean ± 2σ. Windows that are too small or
/// constant are left alone.
fn trim_outliers(durations: &mut Vec<f64>) {
    if durations.len() < 2 {
        return;
    }
    let first = durations[0];
    if durations.iter().all(|&d| d == first) {
        return;
    }
    let m = mean(durations);
    let s = stdev(durations);
    let min = (m - 2.0 * s).max(0.0);
    let max = m + 2.0 * s;
    durations.retain(|&d| d >= min && d <= max);
}

fn estimate_eta(block_durations: &[f64], remaining_blocks: f64) -> Option<Duration> {
    if block_durations.is_empty() {
        return None;
    }
    let remaining_ms = mean(block_durations) * remaining_blocks;
    Some(Duration::from_millis(remaining_ms.max(0.0) as u64))
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}.{:01}s", secs, duration.subsec_millis() / 100)
    }
}
