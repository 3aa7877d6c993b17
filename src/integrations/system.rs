//! System metrics collector used by the dashboard panels.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::format::percent;

/// File systems that never represent user storage.
const SKIPPED_FILE_SYSTEMS: &[&str] = &[
    "iso9660", "udf", "cdfs", "squashfs", "overlay", "tmpfs", "devtmpfs",
];

/// One mounted partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsage {
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub total: u64,
    pub used: u64,
}

impl DiskUsage {
    pub fn percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

/// Cumulative byte counters summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetCounters {
    pub received: u64,
    pub transmitted: u64,
}

/// Bytes moved since the previous refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetThroughput {
    pub down: u64,
    pub up: u64,
}

/// Snapshot of current system metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f32,
    pub per_core: Vec<f32>,
    pub cpu_frequency_mhz: u64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub disks: Vec<DiskUsage>,
    pub network: NetCounters,
    pub uptime_secs: u64,
}

impl MetricsSnapshot {
    pub fn memory_percent(&self) -> f64 {
        percent(self.memory_used, self.memory_total)
    }

    pub fn swap_percent(&self) -> f64 {
        percent(self.swap_used, self.swap_total)
    }
}

impl NetThroughput {
    /// Scale a delta measured over `elapsed` to bytes per second.
    pub fn per_second(self, elapsed: Duration) -> NetThroughput {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return self;
        }
        NetThroughput {
            down: (self.down as f64 / secs).round() as u64,
            up: (self.up as f64 / secs).round() as u64,
        }
    }
}

/// Turns cumulative network counters into per-refresh deltas.
#[derive(Debug, Default)]
pub struct NetworkTracker {
    previous: Option<NetCounters>,
}

impl NetworkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta against the previous call. The first call and counter resets
    /// report zero.
    pub fn advance(&mut self, current: NetCounters) -> NetThroughput {
        let throughput = match self.previous {
            Some(prev) => NetThroughput {
                down: current.received.saturating_sub(prev.received),
                up: current.transmitted.saturating_sub(prev.transmitted),
            },
            None => NetThroughput::default(),
        };
        self.previous = Some(current);
        throughput
    }
}

pub fn keep_partition(file_system: &str) -> bool {
    let fs = file_system.trim().to_lowercase();
    !fs.is_empty() && !SKIPPED_FILE_SYSTEMS.contains(&fs.as_str())
}

/// Drop pseudo and optical file systems; a device mounted twice keeps its
/// first mount.
pub fn filter_partitions(disks: impl IntoIterator<Item = DiskUsage>) -> Vec<DiskUsage> {
    let mut kept: Vec<DiskUsage> = Vec::new();
    for disk in disks {
        if !keep_partition(&disk.file_system) {
            continue;
        }
        if kept.iter().any(|k| k.device == disk.device) {
            continue;
        }
        kept.push(disk);
    }
    kept
}

/// Maintains reusable sysinfo instances to avoid reallocation on every tick.
pub struct SystemMonitor {
    sys: System,
    disks: Disks,
    networks: Networks,
}

impl SystemMonitor {
    pub fn new() -> Self {
        // Initial refresh so the next sample has a CPU usage baseline.
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let mut disks = Disks::new_with_refreshed_list();
        disks.refresh();

        let networks = Networks::new_with_refreshed_list();

        Self {
            sys,
            disks,
            networks,
        }
    }

    /// Refresh and return a metrics snapshot.
    pub fn sample(&mut self) -> MetricsSnapshot {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_cpu_frequency();
        self.sys.refresh_memory();
        self.disks.refresh();
        if self.disks.list().is_empty() {
            self.disks.refresh_list();
        }
        self.networks.refresh();

        let cpus = self.sys.cpus();
        let per_core: Vec<f32> = cpus.iter().map(|cpu| cpu.cpu_usage()).collect();
        let cpu_frequency_mhz = if cpus.is_empty() {
            0
        } else {
            cpus.iter().map(|cpu| cpu.frequency()).sum::<u64>() / cpus.len() as u64
        };

        let disks = filter_partitions(self.disks.list().iter().map(|disk| {
            let total = disk.total_space();
            DiskUsage {
                device: disk.name().to_string_lossy().into_owned(),
                mount_point: disk.mount_point().display().to_string(),
                file_system: disk.file_system().to_string_lossy().into_owned(),
                total,
                used: total.saturating_sub(disk.available_space()),
            }
        }));

        let network = self
            .networks
            .list()
            .values()
            .fold(NetCounters::default(), |acc, data| NetCounters {
                received: acc.received.saturating_add(data.total_received()),
                transmitted: acc.transmitted.saturating_add(data.total_transmitted()),
            });

        let snapshot = MetricsSnapshot {
            cpu_percent: self.sys.global_cpu_usage(),
            per_core,
            cpu_frequency_mhz,
            memory_total: self.sys.total_memory(),
            memory_used: self.sys.used_memory(),
            swap_total: self.sys.total_swap(),
            swap_used: self.sys.used_swap(),
            disks,
            network,
            uptime_secs: System::uptime(),
        };

        tracing::trace!(
            cpu = snapshot.cpu_percent,
            partitions = snapshot.disks.len(),
            "metrics sampled"
        );
        snapshot
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Take two samples `interval` apart and print the second one.
pub async fn print_snapshot(interval: Duration, json: bool) -> Result<()> {
    let mut monitor = SystemMonitor::new();
    let mut tracker = NetworkTracker::new();

    tracker.advance(monitor.sample().network);
    tokio::time::sleep(interval).await;
    let snapshot = monitor.sample();
    let throughput = tracker.advance(snapshot.network).per_second(interval);

    if json {
        let out = serde_json::json!({
            "metrics": snapshot,
            "throughput": throughput,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    use crate::format::{format_uptime, human_size, rate};

    println!("Uptime:  {}", format_uptime(snapshot.uptime_secs));
    println!(
        "CPU:     Used: {:.1}% | Free: {:.1}% | Clock: {} MHz",
        snapshot.cpu_percent,
        100.0 - snapshot.cpu_percent,
        snapshot.cpu_frequency_mhz
    );
    for (i, load) in snapshot.per_core.iter().take(32).enumerate() {
        println!("  Core {:<3} {:>5.1}%", i, load);
    }
    println!(
        "RAM:     Total: {} | Used: {} ({:.0}%)",
        human_size(snapshot.memory_total),
        human_size(snapshot.memory_used),
        snapshot.memory_percent()
    );
    println!(
        "Swap:    Total: {} | Used: {} ({:.0}%)",
        human_size(snapshot.swap_total),
        human_size(snapshot.swap_used),
        snapshot.swap_percent()
    );

    println!("\n{:<24} {:<8} {:>6}  USED / TOTAL", "MOUNT", "FS", "USE");
    println!("{}", "-".repeat(60));
    for disk in &snapshot.disks {
        println!(
            "{:<24} {:<8} {:>5.0}%  {} / {}",
            disk.mount_point,
            disk.file_system,
            disk.percent(),
            human_size(disk.used),
            human_size(disk.total)
        );
    }

    println!(
        "\nNet:     Down: {} | Up: {}",
        rate(throughput.down),
        rate(throughput.up)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn disk(device: &str, mount: &str, fs: &str) -> DiskUsage {
        DiskUsage {
            device: device.to_string(),
            mount_point: mount.to_string(),
            file_system: fs.to_string(),
            total: 100,
            used: 40,
        }
    }

    #[test]
    fn samples_metrics_without_nan() {
        let mut monitor = SystemMonitor::new();
        let metrics = monitor.sample();

        assert!(
            metrics.cpu_percent.is_finite(),
            "CPU percent should always be finite"
        );
        assert!(
            metrics.memory_percent().is_finite(),
            "Memory percent should always be finite"
        );
        assert!(metrics.disks.iter().all(|d| d.percent().is_finite()));
    }

    #[test]
    fn first_advance_reports_zero() {
        let mut tracker = NetworkTracker::new();
        let first = tracker.advance(NetCounters {
            received: 5_000,
            transmitted: 1_000,
        });
        assert_eq!(first, NetThroughput::default());
    }

    #[test]
    fn advance_reports_delta_since_previous() {
        let mut tracker = NetworkTracker::new();
        tracker.advance(NetCounters {
            received: 5_000,
            transmitted: 1_000,
        });
        let next = tracker.advance(NetCounters {
            received: 7_500,
            transmitted: 1_200,
        });
        assert_eq!(next, NetThroughput { down: 2_500, up: 200 });
    }

    #[test]
    fn counter_reset_never_goes_negative() {
        let mut tracker = NetworkTracker::new();
        tracker.advance(NetCounters {
            received: 9_000,
            transmitted: 9_000,
        });
        let after_reset = tracker.advance(NetCounters {
            received: 100,
            transmitted: 9_050,
        });
        assert_eq!(after_reset, NetThroughput { down: 0, up: 50 });
    }

    #[test]
    fn throughput_scales_to_per_second() {
        let delta = NetThroughput { down: 4_000, up: 1_000 };
        assert_eq!(
            delta.per_second(Duration::from_secs(2)),
            NetThroughput { down: 2_000, up: 500 }
        );
        assert_eq!(delta.per_second(Duration::ZERO), delta);
    }

    #[test]
    fn partitions_skip_optical_and_pseudo_file_systems() {
        let kept = filter_partitions(vec![
            disk("/dev/nvme0n1p2", "/", "ext4"),
            disk("/dev/sr0", "/media/cdrom", "iso9660"),
            disk("overlay", "/var/lib/docker/overlay2/x", "overlay"),
            disk("tmpfs", "/run", "tmpfs"),
            disk("D:\\", "D:\\", ""),
            disk("/dev/nvme0n1p2", "/home", "ext4"),
            disk("C:\\", "C:\\", "NTFS"),
        ]);

        let mounts: Vec<&str> = kept.iter().map(|d| d.mount_point.as_str()).collect();
        assert_eq!(mounts, vec!["/", "C:\\"]);
    }

    #[test]
    fn disk_percent_handles_empty_volume() {
        let mut empty = disk("/dev/loop0", "/snap/x", "ext4");
        empty.total = 0;
        empty.used = 0;
        assert_eq!(empty.percent(), 0.0);
        assert_eq!(disk("/dev/sda1", "/", "ext4").percent(), 40.0);
    }
}
