//! Latency statistics, CSV export and the stdout summary

use crate::error::LoadTestResult;
use crate::scheduler::PhaseSummary;
use crate::sink::FrozenResults;
use bottle_http::{RequestKind, RequestRecord};
use bottle_resilience::CircuitMetrics;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary statistics over a set of latencies, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    /// Element at `n / 2` of the sorted samples
    pub median: i64,
    /// Element at `floor(n * 0.99)` of the sorted samples
    pub p99: i64,
}

impl LatencyStats {
    /// `None` when there are no samples
    pub fn compute(latencies: &[i64]) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();
        let sum: i128 = sorted.iter().map(|&l| l as i128).sum();
        let p99_index = ((n as f64 * 0.99) as usize).min(n - 1);

        Some(Self {
            count: n,
            min: sorted[0],
            max: sorted[n - 1],
            mean: sum as f64 / n as f64,
            median: sorted[n / 2],
            p99: sorted[p99_index],
        })
    }
}

/// Locations of the two CSV files written for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPaths {
    pub response_times: PathBuf,
    pub throughput: PathBuf,
}

#[derive(Serialize)]
struct ResponseTimeRow {
    start_time: i64,
    request_type: RequestKind,
    response_time: i64,
    response_code: u16,
}

impl From<&RequestRecord> for ResponseTimeRow {
    fn from(record: &RequestRecord) -> Self {
        Self {
            start_time: record.start_ms,
            request_type: record.kind,
            response_time: record.latency_ms,
            response_code: record.status,
        }
    }
}

#[derive(Serialize)]
struct ThroughputRow {
    second: i64,
    requests_completed: u64,
}

/// Everything printed and written after the main phase
#[derive(Debug, Clone)]
pub struct Report {
    pub thread_group_size: usize,
    pub num_thread_groups: usize,
    pub wall_secs: i64,
    /// Successful requests per wall-clock second
    pub throughput: f64,
    pub timed_out: bool,
    pub results: FrozenResults,
    pub overall: Option<LatencyStats>,
    pub post: Option<LatencyStats>,
    pub get: Option<LatencyStats>,
    pub breaker: Option<CircuitMetrics>,
}

impl Report {
    /// Pure function of the frozen sink and the phase bounds
    pub fn build(
        thread_group_size: usize,
        num_thread_groups: usize,
        results: FrozenResults,
        phase: &PhaseSummary,
        breaker: Option<CircuitMetrics>,
    ) -> Self {
        let wall_secs = (phase.end_ms - phase.start_ms) / 1000;
        let throughput = results.success_count() as f64 / wall_secs.max(1) as f64;

        Self {
            thread_group_size,
            num_thread_groups,
            wall_secs,
            throughput,
            timed_out: phase.timed_out,
            overall: LatencyStats::compute(&results.latencies(None)),
            post: LatencyStats::compute(&results.latencies(Some(RequestKind::Post))),
            get: LatencyStats::compute(&results.latencies(Some(RequestKind::Get))),
            results,
            breaker,
        }
    }

    /// The preferred directory if it exists, otherwise the current directory
    pub fn resolve_results_dir(preferred: &Path) -> PathBuf {
        if preferred.is_dir() {
            preferred.to_path_buf()
        } else {
            warn!(
                "Results directory {} not found; writing to the current directory",
                preferred.display()
            );
            PathBuf::from(".")
        }
    }

    pub fn response_time_file_name(&self) -> String {
        format!(
            "response_time_size-{}_{}_groups.csv",
            self.thread_group_size, self.num_thread_groups
        )
    }

    pub fn throughput_file_name(&self) -> String {
        format!(
            "throughput_size-{}_{}_groups.csv",
            self.thread_group_size, self.num_thread_groups
        )
    }

    /// Write both CSVs into `dir`, overwriting earlier runs of the same shape
    pub fn write_csvs(&self, dir: &Path) -> LoadTestResult<CsvPaths> {
        let paths = CsvPaths {
            response_times: dir.join(self.response_time_file_name()),
            throughput: dir.join(self.throughput_file_name()),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&paths.response_times)?;
        writer.write_record(["start_time", "request_type", "response_time", "response_code"])?;
        for record in &self.results.records {
            writer.serialize(ResponseTimeRow::from(record))?;
        }
        writer.flush()?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&paths.throughput)?;
        writer.write_record(["second", "requests_completed"])?;
        for (&second, &requests_completed) in &self.results.throughput {
            writer.serialize(ThroughputRow {
                second,
                requests_completed,
            })?;
        }
        writer.flush()?;

        info!(
            "Response times written to {}; throughput written to {}",
            paths.response_times.display(),
            paths.throughput.display()
        );
        Ok(paths)
    }

    /// Print the summary to stdout
    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render(&mut out)?;
        out.flush()
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.timed_out {
            writeln!(out, "Warning: Not all tasks finished before timeout!")?;
        }
        writeln!(out, "Wall Time: {} seconds", self.wall_secs)?;
        writeln!(out, "Throughput: {:.2} requests/sec", self.throughput)?;
        writeln!(out, "Successful requests: {}", self.results.success_count())?;
        writeln!(out, "Failed requests: {}", self.results.failures)?;
        writeln!(out, "Skipped requests: {}", self.results.skipped)?;
        writeln!(out, "Total attempts: {}", self.results.attempts())?;

        render_stats(out, "Overall", self.overall.as_ref())?;
        render_stats(out, "POST", self.post.as_ref())?;
        render_stats(out, "GET", self.get.as_ref())?;

        if let Some(metrics) = &self.breaker {
            writeln!(out, "\nCircuit Breaker:")?;
            writeln!(out, "Trips: {}", metrics.trips)?;
            writeln!(out, "Recoveries: {}", metrics.recoveries)?;
            writeln!(out, "Slow successes: {}", metrics.slow_successes)?;
            writeln!(out, "Skipped by breaker: {}", metrics.total_skipped)?;
        }
        Ok(())
    }
}

fn render_stats<W: Write>(
    out: &mut W,
    label: &str,
    stats: Option<&LatencyStats>,
) -> io::Result<()> {
    let Some(stats) = stats else {
        return writeln!(out, "No {} requests were made.", label);
    };

    writeln!(out, "\n{} Request Statistics:", label)?;
    writeln!(out, "Min: {} ms", stats.min)?;
    writeln!(out, "Max: {} ms", stats.max)?;
    writeln!(out, "Mean: {:.2} ms", stats.mean)?;
    writeln!(out, "Median: {} ms", stats.median)?;
    writeln!(out, "P99: {} ms", stats.p99)
}
