use std::cmp::Ordering;

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>, cpu_percent: f32, memory_percent: f32) -> Self {
        ProcessRecord {
            pid,
            name: name.into(),
            cpu_percent,
            memory_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    Memory,
    Pid,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Cpu => SortKey::Memory,
            SortKey::Memory => SortKey::Pid,
            SortKey::Pid => SortKey::Cpu,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Cpu => "CPU",
            SortKey::Memory => "Memory",
            SortKey::Pid => "PID",
        }
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mem" | "memory" => SortKey::Memory,
            "pid" => SortKey::Pid,
            _ => SortKey::Cpu,
        }
    }

    fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            SortKey::Cpu => b.cpu_percent.total_cmp(&a.cpu_percent),
            SortKey::Memory => b.memory_percent.total_cmp(&a.memory_percent),
            SortKey::Pid => a.pid.cmp(&b.pid),
        }
    }
}

/// Stable sort by `key`; equal keys keep their incoming relative order.
pub fn sort_processes(processes: &mut [ProcessRecord], key: SortKey) {
    processes.sort_by(|a, b| key.compare(a, b));
}

/// Sort first, then keep the top `limit` rows (0 keeps everything).
pub fn rank_processes(mut processes: Vec<ProcessRecord>, key: SortKey, limit: usize) -> Vec<ProcessRecord> {
    sort_processes(&mut processes, key);
    if limit > 0 {
        processes.truncate(limit);
    }
    processes
}
