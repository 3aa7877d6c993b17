//! CPU temperature probe
//!
//! Four sources are tried in fixed priority order:
//!
//! 1. `sensors` - sysinfo components whose label looks like a CPU sensor
//! 2. `perf-counter` - the thermal-zone performance counter (Kelvin or Celsius)
//! 3. `acpi` - the ACPI thermal zone (deci-Kelvin via WMI, millidegrees via sysfs)
//! 4. `hardware-monitor` - the OpenHardwareMonitor WMI bridge, if it is running
//!
//! None of them require elevated privileges. All failures are swallowed and
//! the probe reports `None` when every source misses.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sysinfo::Components;

use super::command::powershell;
use super::{Platform, Probe, ProbeChain, SharedRunner};

const KELVIN_OFFSET: f64 = 273.15;

const PERF_COUNTER_QUERY: &str =
    "(Get-WmiObject Win32_PerfFormattedData_Counters_ThermalZoneInformation).Temperature";
const ACPI_QUERY: &str =
    "(Get-WmiObject MSAcpi_ThermalZoneTemperature -Namespace \"root/wmi\").CurrentTemperature";
const HARDWARE_MONITOR_QUERY: &str =
    "Get-WmiObject -Namespace root\\OpenHardwareMonitor -Class Sensor | Where-Object { $_.SensorType -eq 'Temperature' -and $_.Name -like '*CPU*' } | Select-Object -ExpandProperty Value";

/// Sensor labels that identify a CPU package without containing "cpu".
const CPU_SENSOR_HINTS: &[&str] = &["k10temp", "coretemp", "package id", "tctl", "tdie"];

/// A successful temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub celsius: f64,
    pub source: &'static str,
}

/// One labelled reading from the platform sensor API.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub label: String,
    pub celsius: f32,
}

/// Supplies sensor readings for the first stage of the probe.
pub trait SensorSource: Send {
    fn samples(&mut self) -> Vec<SensorSample>;
}

impl<F> SensorSource for F
where
    F: FnMut() -> Vec<SensorSample> + Send,
{
    fn samples(&mut self) -> Vec<SensorSample> {
        self()
    }
}

/// Sensor source backed by sysinfo components.
pub struct ComponentSensors {
    components: Components,
}

impl ComponentSensors {
    pub fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
        }
    }
}

impl SensorSource for ComponentSensors {
    fn samples(&mut self) -> Vec<SensorSample> {
        self.components.refresh();
        self.components
            .iter()
            .map(|c| SensorSample {
                label: c.label().to_string(),
                celsius: c.temperature(),
            })
            .collect()
    }
}

/// Convert a thermal-zone performance counter value.
///
/// The counter usually reports Kelvin; some firmware reports Celsius directly.
pub fn perf_counter_to_celsius(raw: f64) -> Option<f64> {
    if raw > 200.0 {
        Some(raw - KELVIN_OFFSET)
    } else if raw > 0.0 {
        Some(raw)
    } else {
        None
    }
}

/// Convert an ACPI `CurrentTemperature` value (tenths of a Kelvin).
pub fn deci_kelvin_to_celsius(raw: f64) -> Option<f64> {
    if raw > 0.0 {
        Some(raw / 10.0 - KELVIN_OFFSET)
    } else {
        None
    }
}

/// First line of multi-zone command output that parses as a number.
fn first_number(output: &str) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .find(|v| v.is_finite())
}

/// Pick the first CPU-like sensor with a plausible reading.
pub fn pick_cpu_sensor(samples: &[SensorSample]) -> Option<f64> {
    let plausible = |s: &&SensorSample| s.celsius.is_finite() && s.celsius > 0.0;

    samples
        .iter()
        .filter(plausible)
        .find(|s| s.label.to_lowercase().contains("cpu"))
        .or_else(|| {
            samples.iter().filter(plausible).find(|s| {
                let label = s.label.to_lowercase();
                CPU_SENSOR_HINTS.iter().any(|hint| label.contains(hint))
            })
        })
        .map(|s| f64::from(s.celsius))
}

/// Read the `acpitz` zone from a sysfs thermal directory (millidegrees Celsius).
pub fn read_acpi_zone(thermal_root: &Path) -> Option<f64> {
    let pattern = format!("{}/thermal_zone*", thermal_root.display());
    for zone in glob::glob(&pattern).ok()?.flatten() {
        let Ok(kind) = fs::read_to_string(zone.join("type")) else {
            continue;
        };
        if kind.trim() != "acpitz" {
            continue;
        }
        let Some(milli) = fs::read_to_string(zone.join("temp"))
            .ok()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
        else {
            continue;
        };
        if milli > 0.0 {
            return Some(milli / 1000.0);
        }
    }
    None
}

struct SensorProbe {
    source: Box<dyn SensorSource>,
}

impl Probe<f64> for SensorProbe {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn probe(&mut self) -> Option<f64> {
        pick_cpu_sensor(&self.source.samples())
    }
}

struct PerfCounterProbe {
    runner: SharedRunner,
    platform: Platform,
}

impl Probe<f64> for PerfCounterProbe {
    fn name(&self) -> &'static str {
        "perf-counter"
    }

    fn probe(&mut self) -> Option<f64> {
        if self.platform != Platform::Windows {
            return None;
        }
        let out = powershell(self.runner.as_ref(), PERF_COUNTER_QUERY)?;
        perf_counter_to_celsius(first_number(&out)?)
    }
}

struct AcpiProbe {
    runner: SharedRunner,
    platform: Platform,
    thermal_root: PathBuf,
}

impl Probe<f64> for AcpiProbe {
    fn name(&self) -> &'static str {
        "acpi"
    }

    fn probe(&mut self) -> Option<f64> {
        match self.platform {
            Platform::Windows => {
                let out = powershell(self.runner.as_ref(), ACPI_QUERY)?;
                deci_kelvin_to_celsius(first_number(&out)?)
            }
            Platform::Linux => read_acpi_zone(&self.thermal_root),
            Platform::Other => None,
        }
    }
}

struct HardwareMonitorProbe {
    runner: SharedRunner,
    platform: Platform,
}

impl Probe<f64> for HardwareMonitorProbe {
    fn name(&self) -> &'static str {
        "hardware-monitor"
    }

    fn probe(&mut self) -> Option<f64> {
        if self.platform != Platform::Windows {
            return None;
        }
        let out = powershell(self.runner.as_ref(), HARDWARE_MONITOR_QUERY)?;
        first_number(&out).filter(|c| *c > 0.0)
    }
}

/// The four-stage CPU temperature probe.
pub struct TemperatureProbe {
    chain: ProbeChain<f64>,
}

impl TemperatureProbe {
    /// Probe wired to the real sensor API, shell and sysfs.
    pub fn new(runner: SharedRunner) -> Self {
        Self::build(
            ComponentSensors::new(),
            runner,
            Platform::current(),
            PathBuf::from("/sys/class/thermal"),
        )
    }

    pub fn build(
        sensors: impl SensorSource + 'static,
        runner: SharedRunner,
        platform: Platform,
        thermal_root: PathBuf,
    ) -> Self {
        let chain = ProbeChain::new()
            .with(SensorProbe {
                source: Box::new(sensors),
            })
            .with(PerfCounterProbe {
                runner: Arc::clone(&runner),
                platform,
            })
            .with(AcpiProbe {
                runner: Arc::clone(&runner),
                platform,
                thermal_root,
            })
            .with(HardwareMonitorProbe { runner, platform });

        Self { chain }
    }

    pub fn sources(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Run the chain once. `None` means every source missed.
    pub fn read(&mut self) -> Option<TemperatureReading> {
        let hit = self.chain.first_success()?;
        tracing::trace!(source = hit.source, celsius = hit.value, "temperature read");
        Some(TemperatureReading {
            celsius: hit.value,
            source: hit.source,
        })
    }
}

/// A [`TemperatureProbe`] shared with the blocking pool so slow command-backed
/// sources never run on the caller's thread.
#[derive(Clone)]
pub struct BackgroundTemperature(Arc<parking_lot::Mutex<TemperatureProbe>>);

impl BackgroundTemperature {
    pub fn new(probe: TemperatureProbe) -> Self {
        Self(Arc::new(parking_lot::Mutex::new(probe)))
    }

    /// Read on the blocking pool and hand the result to `deliver`. While an
    /// earlier read is still running the new one is skipped.
    pub fn spawn_read<F>(&self, deliver: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(Option<TemperatureReading>) + Send + 'static,
    {
        let probe = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || {
            let Some(mut probe) = probe.try_lock() else {
                tracing::trace!("temperature read already in flight");
                return;
            };
            deliver(probe.read());
        })
    }
}

/// Run the chain once and print the result with the source that produced it.
pub fn print_temperature(runner: SharedRunner) {
    let mut probe = TemperatureProbe::new(runner);
    let reading = probe.read();
    match reading {
        Some(r) => println!(
            "CPU temperature: {} (source: {})",
            crate::format::format_temperature(reading),
            r.source
        ),
        None => {
            println!("CPU temperature: {}", crate::format::format_temperature(None));
            println!("Tried: {}", probe.sources().join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::command::{CommandError, MockCommandRunner};
    use tempfile::tempdir;

    fn no_sensors() -> Vec<SensorSample> {
        Vec::new()
    }

    fn sample(label: &str, celsius: f32) -> SensorSample {
        SensorSample {
            label: label.to_string(),
            celsius,
        }
    }

    fn script_is(args: &[String], query: &str) -> bool {
        args.last().map(String::as_str) == Some(query)
    }

    #[test]
    fn kelvin_counter_is_converted() {
        let c = perf_counter_to_celsius(310.0).unwrap();
        assert!((c - (310.0 - 273.15)).abs() < 1e-9);
        assert_eq!(perf_counter_to_celsius(45.0), Some(45.0));
        assert_eq!(perf_counter_to_celsius(0.0), None);
    }

    #[test]
    fn deci_kelvin_is_converted() {
        let c = deci_kelvin_to_celsius(3010.0).unwrap();
        assert!((c - (3010.0 / 10.0 - 273.15)).abs() < 1e-9);
        assert_eq!(deci_kelvin_to_celsius(-1.0), None);
    }

    #[test]
    fn sensor_pick_prefers_cpu_labels() {
        let samples = vec![
            sample("nvme Composite", 38.0),
            sample("acpitz temp1", 27.8),
            sample("coretemp Package id 0", 51.0),
            sample("cpu_thermal", 47.5),
        ];
        assert_eq!(pick_cpu_sensor(&samples), Some(47.5));
    }

    #[test]
    fn sensor_pick_falls_back_to_package_hints() {
        let samples = vec![sample("nvme Composite", 38.0), sample("k10temp Tctl", 55.25)];
        assert_eq!(pick_cpu_sensor(&samples), Some(55.25));
    }

    #[test]
    fn sensor_pick_skips_implausible_values() {
        let samples = vec![sample("CPU", f32::NAN), sample("cpu1", 0.0)];
        assert_eq!(pick_cpu_sensor(&samples), None);
    }

    #[test]
    fn sensors_win_without_running_commands() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let mut probe = TemperatureProbe::build(
            || vec![sample("CPU Package", 61.0)],
            Arc::new(runner),
            Platform::Windows,
            PathBuf::from("/nonexistent"),
        );

        let reading = probe.read().expect("reading");
        assert_eq!(reading.source, "sensors");
        assert_eq!(reading.celsius, 61.0);
    }

    fn sensor_only_probe(celsius: f32) -> TemperatureProbe {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        TemperatureProbe::build(
            move || vec![sample("cpu_thermal", celsius)],
            Arc::new(runner),
            Platform::Linux,
            PathBuf::from("/nonexistent"),
        )
    }

    #[tokio::test]
    async fn background_read_delivers_reading() {
        let background = BackgroundTemperature::new(sensor_only_probe(48.0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        background
            .spawn_read(move |reading| {
                let _ = tx.send(reading);
            })
            .await
            .unwrap();

        let reading = rx.recv().await.flatten().expect("reading");
        assert_eq!(reading.celsius, 48.0);
        assert_eq!(reading.source, "sensors");
    }

    #[tokio::test]
    async fn background_read_skips_while_busy() {
        let background = BackgroundTemperature::new(sensor_only_probe(48.0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let busy = background.0.lock();
        background
            .spawn_read(move |reading| {
                let _ = tx.send(reading);
            })
            .await
            .unwrap();
        drop(busy);

        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn perf_counter_kelvin_wins_before_acpi() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|_, args| script_is(args, PERF_COUNTER_QUERY))
            .times(1)
            .returning(|_, _| Ok("310\r\n".to_string()));
        runner
            .expect_run()
            .withf(|_, args| script_is(args, ACPI_QUERY))
            .never();

        let mut probe = TemperatureProbe::build(
            no_sensors,
            Arc::new(runner),
            Platform::Windows,
            PathBuf::from("/nonexistent"),
        );

        let reading = probe.read().expect("reading");
        assert_eq!(reading.source, "perf-counter");
        assert!((reading.celsius - 36.85).abs() < 1e-9);
    }

    #[test]
    fn acpi_deci_kelvin_used_when_counter_fails() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|_, args| script_is(args, PERF_COUNTER_QUERY))
            .returning(|p, _| {
                Err(CommandError::Empty {
                    program: p.to_string(),
                })
            });
        runner
            .expect_run()
            .withf(|_, args| script_is(args, ACPI_QUERY))
            .returning(|_, _| Ok("3132\r\n3010".to_string()));

        let mut probe = TemperatureProbe::build(
            no_sensors,
            Arc::new(runner),
            Platform::Windows,
            PathBuf::from("/nonexistent"),
        );

        let reading = probe.read().expect("reading");
        assert_eq!(reading.source, "acpi");
        assert!((reading.celsius - (313.2 - 273.15)).abs() < 1e-9);
    }

    #[test]
    fn hardware_monitor_is_last_resort() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|_, args| script_is(args, HARDWARE_MONITOR_QUERY))
            .returning(|_, _| Ok("48.5".to_string()));
        runner.expect_run().returning(|_, _| Ok("garbage".to_string()));

        let mut probe = TemperatureProbe::build(
            no_sensors,
            Arc::new(runner),
            Platform::Windows,
            PathBuf::from("/nonexistent"),
        );

        let reading = probe.read().expect("reading");
        assert_eq!(reading.source, "hardware-monitor");
        assert_eq!(reading.celsius, 48.5);
    }

    #[test]
    fn all_sources_missing_reports_none() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|p, _| {
            Err(CommandError::Failed {
                program: p.to_string(),
                status: "exit code: 1".to_string(),
            })
        });

        let mut probe = TemperatureProbe::build(
            no_sensors,
            Arc::new(runner),
            Platform::Windows,
            PathBuf::from("/nonexistent"),
        );
        assert_eq!(probe.read(), None);
        assert_eq!(
            probe.sources(),
            vec!["sensors", "perf-counter", "acpi", "hardware-monitor"]
        );
    }

    #[test]
    fn linux_acpi_zone_is_read_from_sysfs() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("thermal_zone0");
        let acpi = dir.path().join("thermal_zone1");
        fs::create_dir_all(&other).unwrap();
        fs::create_dir_all(&acpi).unwrap();
        fs::write(other.join("type"), "x86_pkg_temp\n").unwrap();
        fs::write(other.join("temp"), "55000\n").unwrap();
        fs::write(acpi.join("type"), "acpitz\n").unwrap();
        fs::write(acpi.join("temp"), "27800\n").unwrap();

        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let mut probe = TemperatureProbe::build(
            no_sensors,
            Arc::new(runner),
            Platform::Linux,
            dir.path().to_path_buf(),
        );

        let reading = probe.read().expect("reading");
        assert_eq!(reading.source, "acpi");
        assert!((reading.celsius - 27.8).abs() < 1e-9);
    }
}
