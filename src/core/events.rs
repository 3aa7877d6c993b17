//! Unified event handling system

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::probe::{HardwareIdentity, TemperatureReading};

/// Render cadence (~30fps).
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// All possible events in the system
#[derive(Debug, Clone)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize(u16, u16),

    // System events
    Tick,    // Render tick
    Refresh, // Metrics refresh

    // Async completion events
    IdentityReady(Box<HardwareIdentity>),
    TemperatureReady(Option<TemperatureReading>),

    // Lifecycle
    Quit,
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start all event source tasks
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>, refresh_interval: Duration) {
        tokio::spawn(Self::terminal_events(event_tx.clone()));
        tokio::spawn(Self::tick_events(event_tx.clone(), RENDER_INTERVAL, Event::Tick));
        tokio::spawn(Self::tick_events(event_tx, refresh_interval, Event::Refresh));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!(%err, "terminal event stream failed");
                    let _ = tx.send(Event::Quit);
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(tx: mpsc::UnboundedSender<Event>, interval: Duration, event: Event) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; the caller has already primed state.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(event.clone()).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Key binding helper
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        // Shifted punctuation such as '?' arrives with SHIFT on some terminals.
        let modifiers = match self.key {
            KeyCode::Char(_) if self.modifiers == KeyModifiers::NONE => {
                event.modifiers - KeyModifiers::SHIFT
            }
            _ => event.modifiers,
        };
        event.code == self.key && modifiers == self.modifiers
    }
}

/// Standard key bindings
pub struct KeyBindings;

impl KeyBindings {
    pub fn quit() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('q'))
    }

    pub fn quit_alt() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('c'))
    }

    pub fn help() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('?'))
    }

    pub fn escape() -> KeyBinding {
        KeyBinding::new(KeyCode::Esc)
    }

    pub fn reprobe() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('r'))
    }

    pub fn cycle_theme() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('t'))
    }

    pub fn toggle_cores() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('c'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_c_is_not_plain_c() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);

        assert!(KeyBindings::quit_alt().matches(&ctrl_c));
        assert!(!KeyBindings::quit_alt().matches(&plain_c));
        assert!(KeyBindings::toggle_cores().matches(&plain_c));
        assert!(!KeyBindings::toggle_cores().matches(&ctrl_c));
    }

    #[test]
    fn shifted_question_mark_opens_help() {
        let shifted = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert!(KeyBindings::help().matches(&shifted));
    }

    #[tokio::test]
    async fn refresh_ticks_are_delivered() {
        let (mut handler, tx) = EventHandler::new();
        tokio::spawn(EventHandler::tick_events(
            tx,
            Duration::from_millis(5),
            Event::Refresh,
        ));

        let event = tokio::time::timeout(Duration::from_secs(2), handler.next())
            .await
            .expect("tick in time");
        assert!(matches!(event, Some(Event::Refresh)));
    }
}
