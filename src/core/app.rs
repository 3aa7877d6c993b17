//! Main application orchestrator

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::System;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::core::events::{Event, EventHandler, EventResult, KeyBindings};
use crate::core::health::health_score;
use crate::core::state::{AppMode, AppState, HostInfo, NotificationLevel, StateChange, StateStore};
use crate::integrations::latency::{Latency, LatencyMonitor};
use crate::integrations::system::{NetworkTracker, SystemMonitor};
use crate::probe::{
    BackgroundTemperature, HardwareIdentity, SharedRunner, SystemRunner, TemperatureProbe,
};
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: StateStore,
    changes: broadcast::Receiver<StateChange>,
    event_tx: Option<mpsc::UnboundedSender<Event>>,
    runner: SharedRunner,
    system_monitor: SystemMonitor,
    network: NetworkTracker,
    last_sample: Option<Instant>,
    temperature: BackgroundTemperature,
    latency: Option<LatencyMonitor>,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;

        let mut theme = Theme::from_name(&config.display.theme);
        if let Some(accent) = &config.display.accent {
            theme = theme.with_accent(accent);
        }

        let host = HostInfo {
            hostname: System::host_name().unwrap_or_else(|| "localhost".to_string()),
            os: System::long_os_version()
                .or_else(System::name)
                .unwrap_or_else(|| "Unknown OS".to_string()),
        };

        let mut initial_state = AppState::new(host, theme, config.thresholds.clone());
        initial_state.show_cores = config.display.show_cores;
        let state = StateStore::new(initial_state);
        let changes = state.subscribe();

        let runner: SharedRunner = Arc::new(SystemRunner);
        let temperature = BackgroundTemperature::new(TemperatureProbe::new(Arc::clone(&runner)));
        let latency = match LatencyMonitor::spawn(&config.latency) {
            Ok(monitor) => Some(monitor),
            Err(err) => {
                tracing::error!(%err, "failed to start latency checker");
                state.notify("Latency checker unavailable", NotificationLevel::Warning);
                None
            }
        };

        Ok(Self {
            terminal,
            state,
            changes,
            event_tx: None,
            runner,
            system_monitor: SystemMonitor::new(),
            network: NetworkTracker::new(),
            last_sample: None,
            temperature,
            latency,
            config,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let result = self.run_inner().await;

        // Restore the terminal even when the loop failed.
        let restored = self.shutdown();
        result.and(restored)
    }

    async fn run_inner(&mut self) -> Result<()> {
        let (mut event_handler, event_tx) = EventHandler::new();
        self.event_tx = Some(event_tx.clone());

        // Prime data before the first render
        self.refresh_metrics();
        self.start_identity_probe(false);

        let refresh = Duration::from_millis(self.config.general.refresh_interval_ms.max(100));
        EventHandler::spawn_sources(event_tx, refresh);

        self.render()?;
        self.event_loop(&mut event_handler).await
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        self.terminal.clear()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        loop {
            let Some(event) = event_handler.next().await else {
                break;
            };

            match self.handle_event(event)? {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => Ok(self.handle_key(key)),
            Event::Resize(w, h) => {
                self.state.update(|s| {
                    s.terminal_size = (w, h);
                    ((), None)
                });
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::Tick => {
                self.state.update(|s| {
                    let expired = s.remove_expired_notifications();
                    ((), expired.then_some(StateChange::NotificationsExpired))
                });
                if self.drain_changes() {
                    self.render()?;
                }
                Ok(EventResult::Continue)
            }
            Event::Refresh => {
                self.refresh_metrics();
                Ok(EventResult::Continue)
            }
            Event::IdentityReady(identity) => {
                let reprobe = self.state.read().identity.is_some();
                self.state.update(|s| {
                    s.identity = Some(*identity);
                    s.probing = false;
                    ((), Some(StateChange::IdentityUpdated))
                });
                if reprobe {
                    self.state
                        .notify("Hardware identity refreshed", NotificationLevel::Success);
                }
                Ok(EventResult::Continue)
            }
            Event::TemperatureReady(reading) => {
                self.state.update(|s| {
                    s.panels.cpu.temperature = reading;
                    ((), Some(StateChange::MetricsUpdated))
                });
                Ok(EventResult::Continue)
            }
            Event::Quit => Ok(EventResult::Quit),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }

        let mode = self.state.read().mode;
        match mode {
            AppMode::Dashboard => self.handle_dashboard_key(key),
            AppMode::Help => self.handle_help_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit().matches(&key) {
            return EventResult::Quit;
        }

        if KeyBindings::help().matches(&key) {
            self.set_mode(AppMode::Help);
        } else if KeyBindings::reprobe().matches(&key) {
            self.start_identity_probe(true);
        } else if KeyBindings::cycle_theme().matches(&key) {
            let name = self.state.update(|s| {
                s.theme = s.theme.next();
                (s.theme.name.clone(), Some(StateChange::ThemeChanged))
            });
            tracing::info!(theme = %name, "theme changed");
            self.state
                .notify(format!("Theme: {name}"), NotificationLevel::Info);
        } else if KeyBindings::toggle_cores().matches(&key) {
            self.state.update(|s| {
                s.show_cores = !s.show_cores;
                ((), Some(StateChange::CoresToggled(s.show_cores)))
            });
        }

        EventResult::Continue
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::escape().matches(&key)
            || KeyBindings::help().matches(&key)
            || KeyBindings::quit().matches(&key)
        {
            self.set_mode(AppMode::Dashboard);
        }
        EventResult::Continue
    }

    fn set_mode(&self, mode: AppMode) {
        self.state.update(|s| {
            s.mode = mode;
            ((), Some(StateChange::ModeChanged(mode)))
        });
    }

    /// Run the identity probe off the event loop; the result arrives as
    /// [`Event::IdentityReady`].
    fn start_identity_probe(&mut self, user_requested: bool) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };

        let already_running = self.state.update(|s| {
            let running = s.probing;
            s.probing = true;
            (running, None)
        });
        if already_running {
            return;
        }
        if user_requested {
            self.state
                .notify("Re-probing hardware…", NotificationLevel::Info);
        }

        let runner = Arc::clone(&self.runner);
        let state = self.state.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || HardwareIdentity::detect(runner)).await {
                Ok(identity) => {
                    let _ = tx.send(Event::IdentityReady(Box::new(identity)));
                }
                Err(err) => {
                    tracing::error!(%err, "identity probe task failed");
                    state.update(|s| {
                        s.probing = false;
                        ((), None)
                    });
                    state.notify("Hardware probe failed", NotificationLevel::Error);
                }
            }
        });
    }

    /// Read the temperature chain on the blocking pool; the result arrives
    /// as [`Event::TemperatureReady`].
    fn start_temperature_read(&self) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        self.temperature.spawn_read(move |reading| {
            let _ = tx.send(Event::TemperatureReady(reading));
        });
    }

    /// Consume queued change notifications. Returns true when a redraw is due.
    fn drain_changes(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.changes.try_recv() {
                Ok(change) => {
                    match &change {
                        StateChange::ModeChanged(mode) => tracing::debug!(?mode, "mode changed"),
                        StateChange::CoresToggled(visible) => {
                            tracing::debug!(visible, "per-core grid toggled")
                        }
                        StateChange::NotificationAdded(id) => {
                            tracing::trace!(%id, "notification shown")
                        }
                        _ => tracing::trace!(?change, "state changed"),
                    }
                    dirty = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::trace!(skipped, "state change receiver lagged");
                    dirty = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        dirty
    }

    fn refresh_metrics(&mut self) {
        let snapshot = self.system_monitor.sample();
        let now = Instant::now();
        let elapsed = self
            .last_sample
            .replace(now)
            .map(|prev| now.duration_since(prev))
            .unwrap_or_default();
        let throughput = self.network.advance(snapshot.network).per_second(elapsed);

        if self.config.general.probe_temperature {
            self.start_temperature_read();
        }

        let latency = self
            .latency
            .as_ref()
            .map_or(Latency::Pending, LatencyMonitor::latest);
        let health = health_score(
            f64::from(snapshot.cpu_percent),
            snapshot.memory_percent(),
            latency,
        );

        self.state.update(|s| {
            s.apply_metrics(snapshot, throughput);
            s.panels.network.latency = latency;
            s.health = health;
            ((), Some(StateChange::MetricsUpdated))
        });
    }

    fn render(&mut self) -> Result<()> {
        let state = self.state.snapshot();
        self.terminal.draw(|frame| {
            Renderer::render(frame, &state);
        })?;
        Ok(())
    }
}
