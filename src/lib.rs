//! reachwatch: reachability monitor with debounced alerting
//!
//! A library for probing groups of hosts and notifying Telegram chats
//! only when a host's up/down status has changed and held for a
//! confirmation window.

pub mod alert;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod state;
pub mod target;
pub mod time;
