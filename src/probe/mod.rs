//! Best-effort hardware probing
//!
//! Every probe here follows the same shape: a prioritized list of sources is
//! tried in order and the first one that yields a usable value wins. Sources
//! never surface errors; a miss simply falls through to the next source.

pub mod command;
pub mod identity;
pub mod temperature;

pub use command::{CommandRunner, SystemRunner};
pub use identity::HardwareIdentity;
pub use temperature::{BackgroundTemperature, TemperatureProbe, TemperatureReading};

use std::sync::Arc;

/// Shared runner handle used by every command-backed probe.
pub type SharedRunner = Arc<dyn CommandRunner + Send + Sync>;

/// Operating system family, which decides which sources are worth trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

/// A single capability provider.
pub trait Probe<T> {
    /// Short stable name used in logs and in the UI ("sensors", "acpi", ...).
    fn name(&self) -> &'static str;

    fn probe(&mut self) -> Option<T>;
}

/// Adapts a named closure into a [`Probe`].
pub struct FnProbe<F> {
    name: &'static str,
    f: F,
}

impl<F> FnProbe<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<T, F> Probe<T> for FnProbe<F>
where
    F: FnMut() -> Option<T>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&mut self) -> Option<T> {
        (self.f)()
    }
}

/// Value produced by a chain together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeHit<T> {
    pub source: &'static str,
    pub value: T,
}

/// Ordered providers tried until one returns a value.
pub struct ProbeChain<T> {
    probes: Vec<Box<dyn Probe<T> + Send>>,
}

impl<T> Default for ProbeChain<T> {
    fn default() -> Self {
        Self { probes: Vec::new() }
    }
}

impl<T> ProbeChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with the lowest priority so far.
    pub fn with(mut self, probe: impl Probe<T> + Send + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Run providers in priority order; later providers are not consulted
    /// once one succeeds.
    pub fn first_success(&mut self) -> Option<ProbeHit<T>> {
        for probe in self.probes.iter_mut() {
            match probe.probe() {
                Some(value) => {
                    return Some(ProbeHit {
                        source: probe.name(),
                        value,
                    })
                }
                None => tracing::trace!(source = probe.name(), "probe miss"),
            }
        }
        None
    }
}

/// Collapse whitespace and drop empty strings.
pub(crate) fn clean(value: &str) -> Option<String> {
    let cleaned = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
