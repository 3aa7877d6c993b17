//! Application core: orchestration, events and state

pub mod app;
pub mod events;
pub mod health;
pub mod state;
