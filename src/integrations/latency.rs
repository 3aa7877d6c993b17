//! Background network latency checker.
//!
//! A named thread opens a TCP connection to the target once per interval and
//! publishes the round-trip time into a [`LatencySlot`]. Readers never block:
//! they perform a single atomic load.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::LatencyConfig;

/// Shortest pause between two probes of the target.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

const PENDING: u64 = u64::MAX;
const OFFLINE: u64 = u64::MAX - 1;

/// Latest connectivity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Latency {
    /// No measurement has completed yet.
    Pending,
    Online(Duration),
    Offline,
}

impl Latency {
    pub fn is_offline(&self) -> bool {
        matches!(self, Latency::Offline)
    }

    pub fn millis(&self) -> Option<f64> {
        match self {
            Latency::Online(rtt) => Some(rtt.as_secs_f64() * 1000.0),
            _ => None,
        }
    }
}

/// Lock-free single-value mailbox holding the latest [`Latency`].
///
/// Round-trip times are stored in microseconds; the two largest values are
/// reserved for `Pending` and `Offline`.
#[derive(Debug)]
pub struct LatencySlot(AtomicU64);

impl LatencySlot {
    pub fn new() -> Self {
        Self(AtomicU64::new(PENDING))
    }

    pub fn store(&self, latency: Latency) {
        let raw = match latency {
            Latency::Pending => PENDING,
            Latency::Offline => OFFLINE,
            Latency::Online(rtt) => u64::try_from(rtt.as_micros())
                .unwrap_or(OFFLINE - 1)
                .min(OFFLINE - 1),
        };
        self.0.store(raw, Ordering::Release);
    }

    pub fn load(&self) -> Latency {
        match self.0.load(Ordering::Acquire) {
            PENDING => Latency::Pending,
            OFFLINE => Latency::Offline,
            micros => Latency::Online(Duration::from_micros(micros)),
        }
    }
}

impl Default for LatencySlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Time a single TCP connect to `host:port`.
pub fn probe_once(host: &str, port: u16, timeout: Duration) -> Latency {
    let addr = match (host, port).to_socket_addrs().map(|mut addrs| addrs.next()) {
        Ok(Some(addr)) => addr,
        Ok(None) => {
            tracing::debug!(host, port, "latency target resolved to no address");
            return Latency::Offline;
        }
        Err(err) => {
            tracing::debug!(host, port, %err, "latency target did not resolve");
            return Latency::Offline;
        }
    };

    let started = Instant::now();
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(stream) => {
            let rtt = started.elapsed();
            drop(stream);
            Latency::Online(rtt)
        }
        Err(err) => {
            tracing::trace!(%addr, %err, "latency probe failed");
            Latency::Offline
        }
    }
}

/// Connect timeout and probe interval from config, floored so a zero value
/// can neither fail every probe nor spin the thread.
fn timings(config: &LatencyConfig) -> (Duration, Duration) {
    let timeout = Duration::from_millis(config.timeout_ms.max(1));
    let interval = Duration::from_millis(config.interval_ms).max(MIN_INTERVAL);
    (timeout, interval)
}

/// Probe the configured target `count` times in the foreground.
pub fn print_ping(config: &LatencyConfig, count: u32) {
    let (timeout, interval) = timings(config);

    for i in 0..count {
        let latency = probe_once(&config.host, config.port, timeout);
        println!(
            "{}:{}  {}",
            config.host,
            config.port,
            crate::format::format_latency(latency)
        );
        if i + 1 < count {
            thread::sleep(interval);
        }
    }
}

/// Handle to the background latency thread.
///
/// Dropping the handle asks the thread to stop after its current cycle; the
/// thread is not joined.
pub struct LatencyMonitor {
    slot: Arc<LatencySlot>,
    stop: Arc<AtomicBool>,
}

impl LatencyMonitor {
    pub fn spawn(config: &LatencyConfig) -> io::Result<Self> {
        let slot = Arc::new(LatencySlot::new());
        let stop = Arc::new(AtomicBool::new(false));

        let host = config.host.clone();
        let port = config.port;
        let (timeout, interval) = timings(config);

        let thread_slot = Arc::clone(&slot);
        let thread_stop = Arc::clone(&stop);

        thread::Builder::new()
            .name("rigscope-latency".into())
            .spawn(move || {
                tracing::debug!(%host, port, "latency checker started");
                while !thread_stop.load(Ordering::Relaxed) {
                    thread_slot.store(probe_once(&host, port, timeout));
                    thread::sleep(interval);
                }
                tracing::debug!("latency checker stopped");
            })?;

        Ok(Self { slot, stop })
    }

    pub fn latest(&self) -> Latency {
        self.slot.load()
    }
}

impl Drop for LatencyMonitor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::TcpListener;

    #[test]
    fn slot_starts_pending_and_keeps_latest() {
        let slot = LatencySlot::new();
        assert_eq!(slot.load(), Latency::Pending);

        slot.store(Latency::Online(Duration::from_micros(12_345)));
        assert_eq!(slot.load(), Latency::Online(Duration::from_micros(12_345)));

        slot.store(Latency::Offline);
        assert_eq!(slot.load(), Latency::Offline);
    }

    #[test]
    fn huge_rtt_never_collides_with_sentinels() {
        let slot = LatencySlot::new();
        slot.store(Latency::Online(Duration::from_secs(u64::MAX)));
        assert!(matches!(slot.load(), Latency::Online(_)));
    }

    #[test]
    fn zero_config_values_are_floored() {
        let config = LatencyConfig {
            host: "127.0.0.1".into(),
            port: 53,
            timeout_ms: 0,
            interval_ms: 0,
        };
        assert_eq!(timings(&config), (Duration::from_millis(1), MIN_INTERVAL));

        let slow = LatencyConfig {
            interval_ms: 5_000,
            ..config
        };
        assert_eq!(timings(&slow).1, Duration::from_secs(5));
    }

    #[test]
    fn connect_to_listener_is_online() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let latency = probe_once("127.0.0.1", port, Duration::from_secs(1));
        let ms = latency.millis().expect("should be online");
        assert!(ms >= 0.0);
    }

    #[test]
    fn refused_connection_is_offline() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let latency = probe_once("127.0.0.1", port, Duration::from_millis(200));
        assert_eq!(latency, Latency::Offline);
        assert!(latency.is_offline());
    }

    #[test]
    fn monitor_publishes_measurements() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = LatencyConfig {
            host: "127.0.0.1".into(),
            port: listener.local_addr().unwrap().port(),
            timeout_ms: 500,
            interval_ms: 20,
        };

        let monitor = LatencyMonitor::spawn(&config).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.latest() == Latency::Pending && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(monitor.latest(), Latency::Online(_)));
    }
}
