use serde::Serialize;

use super::process::ProcessRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CpuStats {
    pub per_core: Vec<f64>,
    pub total: f64,
}

impl CpuStats {
    /// Aggregate is the mean of the per-core values.
    pub fn from_per_core(per_core: Vec<f64>) -> Self {
        let total = if per_core.is_empty() {
            0.0
        } else {
            per_core.iter().sum::<f64>() / per_core.len() as f64
        };
        CpuStats { per_core, total }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub percent: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_percent: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalState {
    #[default]
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl ThermalState {
    pub fn label(self) -> &'static str {
        match self {
            ThermalState::Nominal => "nominal",
            ThermalState::Fair => "fair",
            ThermalState::Serious => "serious",
            ThermalState::Critical => "critical",
        }
    }

    fn energy_bonus(self) -> f64 {
        match self {
            ThermalState::Nominal => 0.0,
            ThermalState::Fair => 2.0,
            ThermalState::Serious => 4.0,
            ThermalState::Critical => 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineStats {
    pub name: String,
    pub utilization: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AcceleratorStats {
    pub utilization: f64,
    pub frequency_mhz: Option<u32>,
    pub core_count: Option<u32>,
    pub engines: Vec<EngineStats>,
    pub thermal: Option<ThermalState>,
    /// Heuristic 0-100 score filled in at merge time, not by the probe.
    pub energy: Option<f64>,
}

/// Accelerator telemetry is optional per host, so the panel is only drawn for
/// `Available`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Accelerator {
    #[default]
    Unavailable,
    Available(AcceleratorStats),
}

impl Accelerator {
    pub fn stats(&self) -> Option<&AcceleratorStats> {
        match self {
            Accelerator::Available(stats) => Some(stats),
            Accelerator::Unavailable => None,
        }
    }
}

/// One fully merged collection cycle. Never patched in place; the next cycle
/// replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub load: LoadAvg,
    pub processes: Vec<ProcessRecord>,
    pub accelerator: Accelerator,
}

/// Fan-in target for one cycle. Each probe owns exactly one slot; missing
/// slots fall back to their defaults when the snapshot is built.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    cpu: Option<CpuStats>,
    memory: Option<MemoryStats>,
    load: Option<LoadAvg>,
    processes: Option<Vec<ProcessRecord>>,
    accelerator: Option<AcceleratorStats>,
}

impl SnapshotBuilder {
    pub fn cpu(&mut self, cpu: CpuStats) -> &mut Self {
        self.cpu = Some(cpu);
        self
    }

    pub fn memory(&mut self, memory: MemoryStats) -> &mut Self {
        self.memory = Some(memory);
        self
    }

    pub fn load(&mut self, load: LoadAvg) -> &mut Self {
        self.load = Some(load);
        self
    }

    pub fn processes(&mut self, processes: Vec<ProcessRecord>) -> &mut Self {
        self.processes = Some(processes);
        self
    }

    pub fn accelerator(&mut self, accelerator: AcceleratorStats) -> &mut Self {
        self.accelerator = Some(accelerator);
        self
    }

    pub fn build(self) -> Snapshot {
        let cpu = self.cpu.unwrap_or_default();
        let accelerator = match self.accelerator {
            Some(mut stats) => {
                stats.energy = Some(energy_impact(
                    cpu.total,
                    stats.utilization,
                    stats.thermal.unwrap_or_default(),
                ));
                Accelerator::Available(stats)
            }
            None => Accelerator::Unavailable,
        };

        Snapshot {
            cpu,
            memory: self.memory.unwrap_or_default(),
            load: self.load.unwrap_or_default(),
            processes: self.processes.unwrap_or_default(),
            accelerator,
        }
    }
}

/// Rough whole-system energy score in 0..=100. CPU dominates because it is the
/// only signal available everywhere.
pub fn energy_impact(cpu_total: f64, accelerator_util: f64, thermal: ThermalState) -> f64 {
    let score = cpu_total * 0.70 + accelerator_util * 0.25 + thermal.energy_bonus();
    score.clamp(0.0, 100.0)
}
