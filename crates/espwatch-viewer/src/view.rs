//! Display state of the dashboard widgets.

use espwatch_core::{angle_fill_percent, angle_label, Led, PLACEHOLDER};
use serde::Serialize;

/// Moon, shown while the device sleeps.
pub const SLEEP_ICON: &str = "\u{1F319}";
/// Antenna bars, shown while the device is active.
pub const ACTIVE_ICON: &str = "\u{1F4F6}";

/// One servo gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeView {
    pub name: String,
    /// e.g. "90.0°" or "--".
    pub label: String,
    /// Progress bar fill, 0 to 100.
    pub fill_percent: f64,
}

impl GaugeView {
    pub fn new(index: usize, angle: Option<f64>) -> Self {
        Self {
            name: format!("Servo {index}"),
            label: angle_label(angle),
            fill_percent: angle_fill_percent(angle),
        }
    }

    pub fn awaiting(index: usize) -> Self {
        Self::new(index, None)
    }
}

/// One LED indicator with its styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedIndicator {
    #[serde(skip)]
    pub led: Led,
    pub on: bool,
    /// "ON" or "OFF".
    pub label: &'static str,
    pub label_opacity: f32,
    pub circle_opacity: f32,
    pub brightness: f32,
    /// Box-shadow glow, present only while lit.
    pub glow: Option<String>,
}

impl LedIndicator {
    /// Absent or non-boolean values render as off.
    pub fn new(led: Led, state: Option<bool>) -> Self {
        let on = state == Some(true);
        if on {
            Self {
                led,
                on,
                label: "ON",
                label_opacity: 1.0,
                circle_opacity: 1.0,
                brightness: 1.3,
                glow: Some(format!("0 0 22px var(--{})", led.display_color())),
            }
        } else {
            Self {
                led,
                on,
                label: "OFF",
                label_opacity: 0.5,
                circle_opacity: 0.35,
                brightness: 0.6,
                glow: None,
            }
        }
    }
}

/// Watchdog widget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogMode {
    Sleeping,
    Active,
    Unknown,
    Disconnected,
}

/// Watchdog widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchdogView {
    pub mode: WatchdogMode,
    pub icon: &'static str,
    pub status_text: &'static str,
    pub progress_percent: f64,
    pub css_class: &'static str,
}

impl WatchdogView {
    pub fn new(mode: WatchdogMode) -> Self {
        let (icon, status_text, progress_percent, css_class) = match mode {
            WatchdogMode::Sleeping => (SLEEP_ICON, "sleep", 100.0, "is-sleeping"),
            WatchdogMode::Active => (ACTIVE_ICON, "active", 0.0, "is-active"),
            WatchdogMode::Unknown => (PLACEHOLDER, "Awaiting sleep status", 0.0, "is-unknown"),
            WatchdogMode::Disconnected => (PLACEHOLDER, "Disconnected", 0.0, "is-disconnected"),
        };
        Self {
            mode,
            icon,
            status_text,
            progress_percent,
            css_class,
        }
    }
}

/// Heartbeat label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Heartbeat {
    Sleeping,
    Active,
    Pending,
    Disconnected,
}

impl Heartbeat {
    pub fn label(self) -> &'static str {
        match self {
            Heartbeat::Sleeping => "Sleeping",
            Heartbeat::Active => "Active",
            Heartbeat::Pending => "Pending",
            Heartbeat::Disconnected => "Disconnected",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Heartbeat::Sleeping => "#f39c12",
            Heartbeat::Active => "#2ecc71",
            Heartbeat::Pending => "#adb5bd",
            Heartbeat::Disconnected => "#dc3545",
        }
    }
}

impl std::fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
