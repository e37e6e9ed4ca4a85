use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;

use super::collector::CycleParams;
use super::process::{ProcessRecord, rank_processes};
use super::snapshot::{CpuStats, LoadAvg, MemoryStats};

/// Upper bound for probes that do not sample over an interval.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Slack on top of the CPU sampling window before the CPU probe is abandoned.
const CPU_TIMEOUT_MARGIN: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("not supported on this host")]
    Unsupported,
    #[error("`{program}` could not be run: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    ExitStatus {
        program: &'static str,
        status: std::process::ExitStatus,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout {
        program: &'static str,
        timeout: Duration,
    },
    #[error("no data: {0}")]
    Empty(&'static str),
}

/// One independently queryable telemetry probe.
///
/// `probe` runs on the blocking pool and may take as long as it needs, but the
/// collector stops waiting after `timeout`. Errors never leave the collector;
/// they only leave this source's slot of the snapshot at its default.
pub trait MetricSource: Send + Sync {
    type Output: Send + 'static;

    fn name(&self) -> &'static str;

    fn timeout(&self, _params: &CycleParams) -> Duration {
        DEFAULT_PROBE_TIMEOUT
    }

    fn probe(&self, params: &CycleParams) -> Result<Self::Output, ProbeError>;
}

// A probe that panicked mid-refresh leaves the table usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Samples over its own `System` each call, so overlapping cycles never wait
/// on each other's sampling window.
#[derive(Default)]
pub struct CpuProbe;

impl MetricSource for CpuProbe {
    type Output = CpuStats;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn timeout(&self, params: &CycleParams) -> Duration {
        sample_window(params.cpu_window) + CPU_TIMEOUT_MARGIN
    }

    fn probe(&self, params: &CycleParams) -> Result<CpuStats, ProbeError> {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        thread::sleep(sample_window(params.cpu_window));
        sys.refresh_cpu_usage();

        let per_core: Vec<f64> = sys.cpus().iter().map(|c| c.cpu_usage() as f64).collect();
        if per_core.is_empty() {
            return Err(ProbeError::Empty("cpu list"));
        }
        Ok(CpuStats::from_per_core(per_core))
    }
}

fn sample_window(requested: Duration) -> Duration {
    requested.max(MINIMUM_CPU_UPDATE_INTERVAL)
}

pub struct MemoryProbe {
    sys: Mutex<System>,
}

impl Default for MemoryProbe {
    fn default() -> Self {
        MemoryProbe {
            sys: Mutex::new(System::new()),
        }
    }
}

impl MetricSource for MemoryProbe {
    type Output = MemoryStats;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn probe(&self, _params: &CycleParams) -> Result<MemoryStats, ProbeError> {
        let mut sys = lock(&self.sys);
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(ProbeError::Empty("memory counters"));
        }
        let used = sys.used_memory();
        let swap_total = sys.total_swap();
        let swap_used = sys.used_swap();

        Ok(MemoryStats {
            total_bytes: total,
            used_bytes: used,
            available_bytes: sys.available_memory(),
            percent: percent_of(used, total),
            swap_total_bytes: swap_total,
            swap_used_bytes: swap_used,
            swap_percent: percent_of(swap_used, swap_total),
        })
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Default)]
pub struct LoadProbe;

impl MetricSource for LoadProbe {
    type Output = LoadAvg;

    fn name(&self) -> &'static str {
        "load"
    }

    fn probe(&self, _params: &CycleParams) -> Result<LoadAvg, ProbeError> {
        let load = System::load_average();
        Ok(LoadAvg {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        })
    }
}

/// Process CPU usage is relative to this probe's previous refresh, so the
/// `System` is kept across cycles. The lock covers only the refresh and the
/// copy out of the table; nothing sleeps while holding it.
pub struct ProcessProbe {
    table: Mutex<ProcessTable>,
}

struct ProcessTable {
    sys: System,
    refreshed_at: Instant,
}

impl ProcessTable {
    fn refresh(&mut self) {
        self.sys.refresh_memory();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        self.refreshed_at = Instant::now();
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        let mut table = ProcessTable {
            sys: System::new(),
            refreshed_at: Instant::now(),
        };
        table.refresh();
        ProcessProbe {
            table: Mutex::new(table),
        }
    }
}

impl MetricSource for ProcessProbe {
    type Output = Vec<ProcessRecord>;

    fn name(&self) -> &'static str {
        "processes"
    }

    fn probe(&self, params: &CycleParams) -> Result<Vec<ProcessRecord>, ProbeError> {
        let mut table = lock(&self.table);
        // Back-to-back cycles reuse the last table; a refresh this soon would
        // report near-zero CPU for every process.
        if table.refreshed_at.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL {
            table.refresh();
        }

        let total_memory = table.sys.total_memory();
        let records: Vec<ProcessRecord> = table
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                cpu_percent: process.cpu_usage(),
                memory_percent: percent_of(process.memory(), total_memory) as f32,
            })
            .collect();
        drop(table);

        if records.is_empty() {
            return Err(ProbeError::Empty("process table"));
        }
        Ok(rank_processes(records, params.sort_key, params.process_limit))
    }
}
