use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{LazyLock, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use regex::bytes::Regex;
use tracing::debug;

use super::collector::CycleParams;
use super::platform;
use super::probe::{MetricSource, ProbeError};
use super::snapshot::{AcceleratorStats, EngineStats, ThermalState};

/// Bound on each external command the probe runs.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

static UTILIZATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:device utilization|gpu[- ]utilization)[^"]*"?\s*(?:%\s*)?=\s*(\d+)"#)
        .expect("valid utilization regex")
});
static ENGINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(\w+)\s+Utilization\s+%"\s*=\s*(\d+)"#).expect("valid engine regex")
});
static CORE_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""gpu-core-count"\s*=\s*(\d+)"#).expect("valid core count regex")
});
static ASSIGNED_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*(\d+)").expect("valid number regex"));
static THERMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)thermal\s+pressure\s+is\s+(\w+)").expect("valid thermal regex")
});
static SPEED_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CPU_Speed_Limit\s*=\s*(\d+)").expect("valid speed limit regex")
});

const FREQUENCY_KEYS: [&str; 4] = [
    "gpu-core-clock",
    "gpucoreclockmhz",
    "gpu-freq",
    "gpuclockfrequency",
];

/// Integrated GPU telemetry scraped from `ioreg` and `pmset`. Reports
/// `Unsupported` everywhere but Apple Silicon hosts with `ioreg` on `PATH`.
#[derive(Default)]
pub struct AcceleratorProbe {
    capable: OnceLock<bool>,
}

impl AcceleratorProbe {
    fn capable(&self) -> bool {
        *self
            .capable
            .get_or_init(|| platform::accelerator_supported() && on_path("ioreg"))
    }
}

impl MetricSource for AcceleratorProbe {
    type Output = AcceleratorStats;

    fn name(&self) -> &'static str {
        "accelerator"
    }

    fn timeout(&self, _params: &CycleParams) -> Duration {
        COMMAND_TIMEOUT * 2 + Duration::from_millis(250)
    }

    fn probe(&self, _params: &CycleParams) -> Result<AcceleratorStats, ProbeError> {
        if !self.capable() {
            return Err(ProbeError::Unsupported);
        }

        let mut stats = AcceleratorStats::default();

        // A failed ioreg call still reports the device; values stay zero.
        match run_command("ioreg", &["-r", "-c", "AGXAccelerator"], COMMAND_TIMEOUT) {
            Ok(data) => {
                stats.utilization = parse_utilization(&data).unwrap_or(0.0);
                stats.frequency_mhz = parse_frequency(&data);
                stats.core_count = parse_core_count(&data);
                stats.engines = parse_engines(&data);
            }
            Err(err) => debug!(error = %err, "ioreg unavailable"),
        }

        stats.thermal = match run_command("pmset", &["-g", "therm"], COMMAND_TIMEOUT) {
            Ok(data) => parse_thermal(&data),
            Err(err) => {
                debug!(error = %err, "pmset unavailable");
                None
            }
        };

        Ok(stats)
    }
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Runs `program` and returns its stdout, killing it if it outlives `timeout`.
pub fn run_command(
    program: &'static str,
    args: &[&str],
    timeout: Duration,
) -> Result<Vec<u8>, ProbeError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ProbeError::Spawn { program, source })?;

    // Drain stdout on its own thread so a full pipe cannot stall the child.
    let mut stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout.as_mut() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
            Ok(None) => {
                reap(&mut child);
                return Err(ProbeError::Timeout { program, timeout });
            }
            Err(source) => {
                reap(&mut child);
                return Err(ProbeError::Spawn { program, source });
            }
        }
    };

    let output = reader.join().unwrap_or_default();
    if !status.success() {
        return Err(ProbeError::ExitStatus { program, status });
    }
    Ok(output)
}

/// Kills and waits on `child` so it does not linger as a zombie.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn capture_number(re: &Regex, data: &[u8]) -> Option<u64> {
    let caps = re.captures(data)?;
    std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?.parse().ok()
}

pub fn parse_utilization(data: &[u8]) -> Option<f64> {
    capture_number(&UTILIZATION_RE, data).map(|v| v as f64)
}

pub fn parse_core_count(data: &[u8]) -> Option<u32> {
    capture_number(&CORE_COUNT_RE, data).and_then(|v| u32::try_from(v).ok())
}

/// Per-engine utilization, excluding the `Device` total.
pub fn parse_engines(data: &[u8]) -> Vec<EngineStats> {
    ENGINE_RE
        .captures_iter(data)
        .filter_map(|caps| {
            let name = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
            if name.eq_ignore_ascii_case("device") {
                return None;
            }
            let value: f64 = std::str::from_utf8(caps.get(2)?.as_bytes())
                .ok()?
                .parse()
                .ok()?;
            Some(EngineStats {
                name: name.to_string(),
                utilization: value,
            })
        })
        .collect()
}

/// Clock in MHz; raw values above 100000 are taken to be Hz.
pub fn parse_frequency(data: &[u8]) -> Option<u32> {
    for line in data.split(|&b| b == b'\n') {
        let lower = line.to_ascii_lowercase();
        let lower = String::from_utf8_lossy(&lower);
        if !FREQUENCY_KEYS.iter().any(|key| lower.contains(key)) {
            continue;
        }
        let Some(value) = capture_number(&ASSIGNED_NUMBER_RE, line) else {
            continue;
        };
        let mhz = if value > 100_000 { value / 1_000_000 } else { value };
        if let Ok(mhz) = u32::try_from(mhz) {
            return Some(mhz);
        }
    }
    None
}

pub fn parse_thermal(data: &[u8]) -> Option<ThermalState> {
    if let Some(caps) = THERMAL_RE.captures(data) {
        let level = String::from_utf8_lossy(caps.get(1)?.as_bytes()).to_lowercase();
        return Some(match level.as_str() {
            "heavy" | "serious" => ThermalState::Serious,
            "critical" | "trapping" => ThermalState::Critical,
            _ => ThermalState::Fair,
        });
    }

    if let Some(limit) = capture_number(&SPEED_LIMIT_RE, data) {
        return Some(if limit == 100 {
            ThermalState::Nominal
        } else {
            ThermalState::Fair
        });
    }

    if String::from_utf8_lossy(data)
        .to_lowercase()
        .contains("no thermal warning")
    {
        return Some(ThermalState::Nominal);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOREG: &[u8] = br#"
+-o AGXAcceleratorG13X  <class AGXAcceleratorG13X, id 0x100000a1c>
    {
      "gpu-core-count" = 10
      "PerformanceStatistics" = {"Tiler Utilization %"=12,"Renderer Utilization %"=30,"Device Utilization %"=37}
      "gpu-core-clock" = 1398000000
    }
"#;

    #[test]
    fn parses_total_utilization() {
        assert_eq!(parse_utilization(IOREG), Some(37.0));
        assert_eq!(parse_utilization(b"nothing here"), None);
    }

    #[test]
    fn parses_engines_without_device_total() {
        let engines = parse_engines(IOREG);
        let names: Vec<&str> = engines.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Tiler", "Renderer"]);
        assert_eq!(engines[1].utilization, 30.0);
    }

    #[test]
    fn parses_core_count_and_frequency() {
        assert_eq!(parse_core_count(IOREG), Some(10));
        assert_eq!(parse_frequency(IOREG), Some(1398));
        assert_eq!(parse_frequency(b"\"gpu-freq\" = 1296\n"), Some(1296));
        assert_eq!(parse_frequency(b"\"other\" = 5\n"), None);
    }

    #[test]
    fn parses_thermal_states() {
        assert_eq!(
            parse_thermal(b"Note: No thermal warning level has been recorded"),
            Some(ThermalState::Nominal)
        );
        assert_eq!(
            parse_thermal(b"Thermal pressure is heavy"),
            Some(ThermalState::Serious)
        );
        assert_eq!(
            parse_thermal(b"thermal pressure is moderate"),
            Some(ThermalState::Fair)
        );
        assert_eq!(
            parse_thermal(b"thermal pressure is trapping"),
            Some(ThermalState::Critical)
        );
        assert_eq!(parse_thermal(b"CPU_Speed_Limit = 100"), Some(ThermalState::Nominal));
        assert_eq!(parse_thermal(b"CPU_Speed_Limit = 70"), Some(ThermalState::Fair));
        assert_eq!(parse_thermal(b"garbage"), None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run_command("hidetop-no-such-binary", &[], Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_is_killed_at_timeout() {
        let started = Instant::now();
        let err = run_command("sleep", &["5"], Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn reaped_child_has_an_exit_status() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        reap(&mut child);
        assert!(matches!(child.try_wait(), Ok(Some(_))));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let out = run_command("echo", &["hello"], COMMAND_TIMEOUT).unwrap();
        assert_eq!(out, b"hello\n");
    }
}
