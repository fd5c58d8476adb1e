//! Core domain types for espwatch.
//!
//! This crate provides the types shared by the relay and the viewer:
//! - `TelemetrySnapshot`: the latest record pushed by the ESP32
//! - `truthy`: boolean-like coercion for LED and sleep flags
//! - `resolve_sleep_state`: tri-state sleep derivation with signal precedence
//! - `RelayMessage`: WebSocket frames pushed from relay to viewers
//! - `format`: display helpers for angles and voltage

pub mod coerce;
pub mod error;
pub mod format;
pub mod message;
pub mod resolver;
pub mod snapshot;

pub use coerce::{numeric, truthy};
pub use error::{CoreError, Result};
pub use format::{angle_fill_percent, angle_label, voltage_label, PLACEHOLDER};
pub use message::RelayMessage;
pub use resolver::{resolve_sleep_state, SleepState};
pub use snapshot::{Led, TelemetrySnapshot, MAX_ANGLE, MIN_ANGLE, SERVO_COUNT};
