//! Application state with fine-grained change notifications

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ThresholdsConfig;
use crate::integrations::latency::Latency;
use crate::integrations::system::{DiskUsage, MetricsSnapshot, NetThroughput};
use crate::probe::{HardwareIdentity, TemperatureReading};
use crate::ui::theme::Theme;

/// Samples kept for sparklines.
const HISTORY_LEN: usize = 60;

/// Top-level application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Normal dashboard view
    #[default]
    Dashboard,
    /// Help overlay showing
    Help,
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T) {
    history.push_back(value);
    if history.len() > HISTORY_LEN {
        history.pop_front();
    }
}

/// CPU panel state
#[derive(Debug, Clone, Default)]
pub struct CpuPanelState {
    pub percent: f32,
    pub history: VecDeque<f32>,
    pub per_core: Vec<f32>,
    pub frequency_mhz: u64,
    pub temperature: Option<TemperatureReading>,
}

impl CpuPanelState {
    pub fn push_load(&mut self, value: f32) {
        push_bounded(&mut self.history, value);
        self.percent = value;
    }
}

/// Memory panel state
#[derive(Debug, Clone, Default)]
pub struct MemoryPanelState {
    pub total: u64,
    pub used: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

/// Storage panel state
#[derive(Debug, Clone, Default)]
pub struct StoragePanelState {
    /// Mounted partitions keyed by device, in first-seen order.
    pub partitions: IndexMap<String, DiskUsage>,
}

impl StoragePanelState {
    /// Replace the partition set, keeping known devices in their slot and
    /// appending new ones.
    pub fn apply(&mut self, disks: Vec<DiskUsage>) {
        self.partitions
            .retain(|device, _| disks.iter().any(|d| &d.device == device));
        for disk in disks {
            self.partitions.insert(disk.device.clone(), disk);
        }
    }
}

/// Network panel state
#[derive(Debug, Clone)]
pub struct NetworkPanelState {
    pub throughput: NetThroughput,
    pub latency: Latency,
    pub down_history: VecDeque<u64>,
    pub up_history: VecDeque<u64>,
}

impl Default for NetworkPanelState {
    fn default() -> Self {
        Self {
            throughput: NetThroughput::default(),
            latency: Latency::Pending,
            down_history: VecDeque::new(),
            up_history: VecDeque::new(),
        }
    }
}

impl NetworkPanelState {
    pub fn push(&mut self, throughput: NetThroughput) {
        push_bounded(&mut self.down_history, throughput.down);
        push_bounded(&mut self.up_history, throughput.up);
        self.throughput = throughput;
    }
}

/// Granular view state for all panels
#[derive(Debug, Clone, Default)]
pub struct PanelStates {
    pub cpu: CpuPanelState,
    pub memory: MemoryPanelState,
    pub storage: StoragePanelState,
    pub network: NetworkPanelState,
}

/// Static facts about the host shown in the header.
#[derive(Debug, Clone, Default)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: uuid::Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    pub host: HostInfo,
    /// `None` until the first identity probe completes.
    pub identity: Option<HardwareIdentity>,
    pub probing: bool,
    pub panels: PanelStates,
    pub uptime_secs: u64,
    pub health: u8,
    pub theme: Theme,
    pub thresholds: ThresholdsConfig,
    pub show_cores: bool,
    pub notifications: Vec<Notification>,
    pub terminal_size: (u16, u16),
}

impl AppState {
    pub fn new(host: HostInfo, theme: Theme, thresholds: ThresholdsConfig) -> Self {
        Self {
            mode: AppMode::Dashboard,
            host,
            identity: None,
            probing: false,
            panels: PanelStates::default(),
            uptime_secs: 0,
            health: 100,
            theme,
            thresholds,
            show_cores: true,
            notifications: Vec::new(),
            terminal_size: (80, 24),
        }
    }

    /// Fold one refresh cycle into the panels.
    pub fn apply_metrics(&mut self, snapshot: MetricsSnapshot, throughput: NetThroughput) {
        let cpu = &mut self.panels.cpu;
        cpu.push_load(snapshot.cpu_percent);
        cpu.frequency_mhz = snapshot.cpu_frequency_mhz;

        self.panels.memory = MemoryPanelState {
            total: snapshot.memory_total,
            used: snapshot.memory_used,
            swap_total: snapshot.swap_total,
            swap_used: snapshot.swap_used,
        };

        self.panels.network.push(throughput);
        self.uptime_secs = snapshot.uptime_secs;
        self.panels.cpu.per_core = snapshot.per_core;
        self.panels.storage.apply(snapshot.disks);
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) -> uuid::Uuid {
        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            message,
            level,
            created_at: chrono::Utc::now(),
            duration_ms: 4000,
        };
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    /// Drop notifications past their display time. Returns true if any were removed.
    pub fn remove_expired_notifications(&mut self) -> bool {
        let now = chrono::Utc::now();
        let before = self.notifications.len();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds();
            elapsed < n.duration_ms as i64
        });
        self.notifications.len() != before
    }
}

/// Reactive state changes via broadcast channel
#[derive(Debug, Clone)]
pub enum StateChange {
    ModeChanged(AppMode),
    MetricsUpdated,
    IdentityUpdated,
    NotificationAdded(uuid::Uuid),
    NotificationsExpired,
    ThemeChanged,
    CoresToggled(bool),
}

/// Thread-safe state store
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
    change_tx: broadcast::Sender<StateChange>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        let (change_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(initial)),
            change_tx,
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }

    /// Atomic state mutation with change notification
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> (R, Option<StateChange>),
    {
        let mut state = self.state.write();
        let (result, change) = mutator(&mut state);
        if let Some(change) = change {
            let _ = self.change_tx.send(change);
        }
        result
    }

    /// Push a notification and announce it.
    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let message = message.into();
        self.update(|s| {
            let id = s.add_notification(message, level);
            ((), Some(StateChange::NotificationAdded(id)))
        });
    }

    /// Read current state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }

    /// Get a clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            change_tx: self.change_tx.clone(),
        }
    }
}
