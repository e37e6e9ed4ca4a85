use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::accelerator::AcceleratorProbe;
use super::probe::{CpuProbe, LoadProbe, MemoryProbe, MetricSource, ProcessProbe};
use super::process::{ProcessRecord, SortKey};
use super::snapshot::{AcceleratorStats, CpuStats, LoadAvg, MemoryStats, Snapshot, SnapshotBuilder};

/// Inputs for one collection cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleParams {
    pub cpu_window: Duration,
    pub sort_key: SortKey,
    pub process_limit: usize,
}

/// Fans out to every probe, waits for all of them (or their timeouts), then
/// builds the snapshot in one step. Cheap to clone; clones share the probes.
#[derive(Clone)]
pub struct SnapshotCollector {
    cpu: Arc<dyn MetricSource<Output = CpuStats>>,
    memory: Arc<dyn MetricSource<Output = MemoryStats>>,
    load: Arc<dyn MetricSource<Output = LoadAvg>>,
    processes: Arc<dyn MetricSource<Output = Vec<ProcessRecord>>>,
    accelerator: Arc<dyn MetricSource<Output = AcceleratorStats>>,
}

impl Default for SnapshotCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCollector {
    pub fn new() -> Self {
        SnapshotCollector {
            cpu: Arc::new(CpuProbe::default()),
            memory: Arc::new(MemoryProbe::default()),
            load: Arc::new(LoadProbe),
            processes: Arc::new(ProcessProbe::default()),
            accelerator: Arc::new(AcceleratorProbe::default()),
        }
    }

    pub fn with_sources(
        cpu: Arc<dyn MetricSource<Output = CpuStats>>,
        memory: Arc<dyn MetricSource<Output = MemoryStats>>,
        load: Arc<dyn MetricSource<Output = LoadAvg>>,
        processes: Arc<dyn MetricSource<Output = Vec<ProcessRecord>>>,
        accelerator: Arc<dyn MetricSource<Output = AcceleratorStats>>,
    ) -> Self {
        SnapshotCollector {
            cpu,
            memory,
            load,
            processes,
            accelerator,
        }
    }

    pub async fn collect(&self, params: CycleParams) -> Snapshot {
        let (cpu, memory, load, processes, accelerator) = tokio::join!(
            run_probe(Arc::clone(&self.cpu), params),
            run_probe(Arc::clone(&self.memory), params),
            run_probe(Arc::clone(&self.load), params),
            run_probe(Arc::clone(&self.processes), params),
            run_probe(Arc::clone(&self.accelerator), params),
        );

        let mut builder = SnapshotBuilder::default();
        if let Some(cpu) = cpu {
            builder.cpu(cpu);
        }
        if let Some(memory) = memory {
            builder.memory(memory);
        }
        if let Some(load) = load {
            builder.load(load);
        }
        if let Some(processes) = processes {
            builder.processes(processes);
        }
        if let Some(accelerator) = accelerator {
            builder.accelerator(accelerator);
        }
        builder.build()
    }
}

async fn run_probe<T: Send + 'static>(
    source: Arc<dyn MetricSource<Output = T>>,
    params: CycleParams,
) -> Option<T> {
    let name = source.name();
    let limit = source.timeout(&params);
    let task = tokio::task::spawn_blocking(move || source.probe(&params));

    // On timeout the blocking task is detached, not cancelled.
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(Ok(value))) => Some(value),
        Ok(Ok(Err(err))) => {
            debug!(probe = name, error = %err, "probe failed");
            None
        }
        Ok(Err(err)) => {
            warn!(probe = name, error = %err, "probe task aborted");
            None
        }
        Err(_) => {
            debug!(probe = name, timeout_ms = limit.as_millis() as u64, "probe timed out");
            None
        }
    }
}
