//! Sleep-state resolution.
//!
//! The device reports its power state through several redundant signals.
//! Precedence, first applicable rule wins:
//!
//! 1. LED pattern, if any of `led_y`/`led_b`/`led_r` is present.
//!    Yellow alone lit means asleep, any other pattern means awake.
//! 2. Explicit flags: `sleep` (1/0, true/false) or `status`
//!    (`"sleep"`, `"wake_up"`, `"awake"`, case-insensitive).
//!
//! LEDs win even when they contradict `sleep`/`status`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{Led, TelemetrySnapshot};

/// Derived power state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepState {
    Asleep,
    Awake,
    /// No signal could decide the state.
    Indeterminate,
}

impl SleepState {
    /// `Some(true)` for asleep, `Some(false)` for awake.
    pub fn as_asleep(self) -> Option<bool> {
        match self {
            SleepState::Asleep => Some(true),
            SleepState::Awake => Some(false),
            SleepState::Indeterminate => None,
        }
    }
}

impl fmt::Display for SleepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SleepState::Asleep => "asleep",
            SleepState::Awake => "awake",
            SleepState::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Resolve the sleep state of a snapshot.
pub fn resolve_sleep_state(snapshot: &TelemetrySnapshot) -> SleepState {
    led_pattern(snapshot).unwrap_or_else(|| explicit_flags(snapshot))
}

fn led_pattern(snapshot: &TelemetrySnapshot) -> Option<SleepState> {
    let [yellow, blue, red] = Led::ALL.map(|led| snapshot.led(led));
    if yellow.is_none() && blue.is_none() && red.is_none() {
        return None;
    }

    let yellow_on = yellow.unwrap_or(false);
    let blue_on = blue.unwrap_or(false);
    let red_on = red.unwrap_or(false);

    if yellow_on && !blue_on && !red_on {
        Some(SleepState::Asleep)
    } else {
        Some(SleepState::Awake)
    }
}

fn explicit_flags(snapshot: &TelemetrySnapshot) -> SleepState {
    let sleep = snapshot.sleep_flag();
    let status = snapshot.status();

    if sleep == Some(true) || status.as_deref() == Some("sleep") {
        SleepState::Asleep
    } else if sleep == Some(false) || matches!(status.as_deref(), Some("wake_up" | "awake")) {
        SleepState::Awake
    } else {
        SleepState::Indeterminate
    }
}
