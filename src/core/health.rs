//! Single-number system health summary.

use crate::integrations::latency::Latency;

/// Points deducted while the network is unreachable.
const OFFLINE_PENALTY: i64 = 20;

/// `100 - mean(cpu, ram)`, minus a penalty when offline, clamped to 0..=100.
pub fn health_score(cpu_percent: f64, ram_percent: f64, latency: Latency) -> u8 {
    let load = (100.0 - (cpu_percent + ram_percent) / 2.0).trunc() as i64;
    let penalty = if latency.is_offline() { OFFLINE_PENALTY } else { 0 };
    (load - penalty).clamp(0, 100) as u8
}

pub fn health_label(score: u8) -> &'static str {
    match score {
        80.. => "Excellent",
        60..=79 => "Good",
        40..=59 => "Fair",
        _ => "Critical",
    }
}
