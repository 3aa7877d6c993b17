//! Display formatting for sizes, rates, durations and probe results.

use humansize::{format_size, BINARY};

use crate::integrations::latency::Latency;
use crate::probe::TemperatureReading;

const TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;
const TB: f64 = 1000.0 * 1000.0 * 1000.0 * 1000.0;
const GB: f64 = 1000.0 * 1000.0 * 1000.0;

pub const TEMPERATURE_UNAVAILABLE: &str = "N/A (Sensor Locked)";

/// Storage capacity as both the OS and the box on the shelf report it.
///
/// Drives above 0.9 TB show binary and decimal units side by side, smaller
/// drives show decimal gigabytes only.
pub fn marketing_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let bytes = bytes as f64;
    let tb = bytes / TB;
    if tb > 0.9 {
        format!("{:.2} TiB ({:.1} TB)", bytes / TIB, tb)
    } else {
        format!("{:.1} GB", bytes / GB)
    }
}

/// 1024-based size, e.g. `15.6 GiB`.
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

pub fn rate(bytes_per_sec: u64) -> String {
    format!("{}/s", human_size(bytes_per_sec))
}

/// `H:MM:SS`, prefixed with the day count once the machine has been up a day.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    match days {
        0 => format!("{hours}:{minutes:02}:{seconds:02}"),
        1 => format!("1 day, {hours}:{minutes:02}:{seconds:02}"),
        n => format!("{n} days, {hours}:{minutes:02}:{seconds:02}"),
    }
}

pub fn format_latency(latency: Latency) -> String {
    match latency {
        Latency::Pending => "-- ms".to_string(),
        Latency::Offline => "Offline".to_string(),
        Latency::Online(rtt) => format!("{:.0} ms", rtt.as_secs_f64() * 1000.0),
    }
}

pub fn format_temperature(reading: Option<TemperatureReading>) -> String {
    match reading {
        Some(r) => format!("{:.1}°C", r.celsius),
        None => TEMPERATURE_UNAVAILABLE.to_string(),
    }
}

pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn marketing_size_shows_both_units_for_large_drives() {
        assert_eq!(marketing_size(4 * 1000 * 1000 * 1000 * 1000), "3.64 TiB (4.0 TB)");
        assert_eq!(marketing_size(1_000_204_886_016), "0.91 TiB (1.0 TB)");
    }

    #[test]
    fn marketing_size_uses_gigabytes_below_threshold() {
        assert_eq!(marketing_size(500_107_862_016), "500.1 GB");
        assert_eq!(marketing_size(900_000_000_000), "900.0 GB");
        assert_eq!(marketing_size(0), "0 B");
    }

    #[test]
    fn sizes_and_rates_are_binary() {
        assert_eq!(human_size(0), "0 B");
        assert!(human_size(1536).starts_with("1.5"));
        assert!(human_size(1536).ends_with(" KiB"));
        assert_eq!(rate(1024 * 1024), "1 MiB/s");
    }

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(59), "0:00:59");
        assert_eq!(format_uptime(3 * 3600 + 7 * 60 + 5), "3:07:05");
        assert_eq!(format_uptime(86_400 + 61), "1 day, 0:01:01");
        assert_eq!(format_uptime(3 * 86_400 + 23 * 3600), "3 days, 23:00:00");
    }

    #[test]
    fn latency_display() {
        assert_eq!(format_latency(Latency::Pending), "-- ms");
        assert_eq!(format_latency(Latency::Offline), "Offline");
        assert_eq!(format_latency(Latency::Online(Duration::from_micros(23_400))), "23 ms");
    }

    #[test]
    fn temperature_display() {
        let reading = TemperatureReading {
            celsius: 36.86,
            source: "perf-counter",
        };
        assert_eq!(format_temperature(Some(reading)), "36.9°C");
        assert_eq!(format_temperature(None), "N/A (Sensor Locked)");
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }
}
