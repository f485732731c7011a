//! Host OS statistics

use anyhow::Context;
use async_trait::async_trait;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::{MetricsProvider, escape_label};

/// Point-in-time host statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostStatistics {
    pub uptime: u64,
    pub total_memory: u64,
    pub free_memory: u64,
    pub used_memory: u64,
    pub load_average: [f64; 3],
    pub cpu_usage: f32,
    pub cpus: Vec<(String, f32)>,
    /// Cumulative time per CPU mode over all cores, in clock ticks
    pub cpu_times: Vec<(String, u64)>,
}

/// Clock ticks per second of `/proc/stat` (`USER_HZ`)
const CLOCK_TICKS: f64 = 100.0;

/// Modes reported from the aggregate `cpu` line of `/proc/stat`, by column
const CPU_MODES: [(&str, usize); 5] = [("user", 0), ("nice", 1), ("sys", 2), ("idle", 3), ("irq", 5)];

/// Parse the aggregate `cpu` line of `/proc/stat`.
pub fn parse_proc_stat(text: &str) -> Option<Vec<(String, u64)>> {
    let line = text
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))?;

    let columns = line
        .split_whitespace()
        .skip(1)
        .map(|value| value.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    CPU_MODES
        .iter()
        .map(|(mode, column)| Some((mode.to_string(), *columns.get(*column)?)))
        .collect()
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> Vec<(String, u64)> {
    std::fs::read_to_string("/proc/stat")
        .ok()
        .and_then(|text| parse_proc_stat(&text))
        .unwrap_or_default()
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_times() -> Vec<(String, u64)> {
    vec![]
}

impl HostStatistics {
    /// Sample the host.
    ///
    /// Blocks for [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`] so CPU usage has
    /// two refreshes to compare; run it off the async executor.
    pub fn sample() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::nothing().with_ram())
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let load = System::load_average();

        HostStatistics {
            uptime: System::uptime(),
            total_memory: sys.total_memory(),
            free_memory: sys.free_memory(),
            used_memory: sys.used_memory(),
            load_average: [load.one, load.five, load.fifteen],
            cpu_usage: sys.global_cpu_usage(),
            cpus: sys
                .cpus()
                .iter()
                .map(|cpu| (cpu.name().to_string(), cpu.cpu_usage()))
                .collect(),
            cpu_times: read_cpu_times(),
        }
    }

    pub fn used_memory_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        self.used_memory as f64 / self.total_memory as f64 * 100.0
    }

    pub fn to_prometheus(&self, hostname: &str) -> String {
        let host = escape_label(hostname);
        let labels = format!("{{hostname=\"{host}\"}}");

        let mut lines = vec![
            format!("host_uptime_seconds{labels} {}", self.uptime),
            format!("host_memory_total_bytes{labels} {}", self.total_memory),
            format!("host_memory_free_bytes{labels} {}", self.free_memory),
            format!("host_memory_used_bytes{labels} {}", self.used_memory),
            format!(
                "host_memory_used_percent{labels} {}",
                self.used_memory_percent()
            ),
        ];

        for (minutes, value) in [1, 5, 15].iter().zip(self.load_average) {
            lines.push(format!("host_load_average_{minutes}min{labels} {value}"));
        }

        lines.push(format!("host_cpu_usage_percent{labels} {}", self.cpu_usage));
        for (name, usage) in &self.cpus {
            lines.push(format!(
                "host_cpu_core_usage_percent{{hostname=\"{host}\",cpu=\"{}\"}} {usage}",
                escape_label(name)
            ));
        }

        let total: u64 = self.cpu_times.iter().map(|(_, ticks)| ticks).sum();
        for (mode, ticks) in &self.cpu_times {
            let percent = if total == 0 {
                0.0
            } else {
                *ticks as f64 / total as f64 * 100.0
            };
            lines.push(format!(
                "host_cpu_time_percentage{{hostname=\"{host}\",mode=\"{mode}\"}} {percent}"
            ));
            lines.push(format!(
                "host_cpu_time_seconds_total{{hostname=\"{host}\",mode=\"{mode}\"}} {}",
                *ticks as f64 / CLOCK_TICKS
            ));
        }

        lines.join("\n")
    }
}

pub struct HostProvider {
    hostname: String,
}

impl HostProvider {
    pub fn new(hostname: String) -> Self {
        Self { hostname }
    }
}

#[async_trait]
impl MetricsProvider for HostProvider {
    fn name(&self) -> &str {
        "host"
    }

    async fn collect(&self) -> anyhow::Result<String> {
        let stats = tokio::task::spawn_blocking(HostStatistics::sample)
            .await
            .context("host sampling task failed")?;

        Ok(stats.to_prometheus(&self.hostname))
    }
}
