//! Dashboard state machine.
//!
//! Each tick feeds either a snapshot or a transport failure into
//! [`Dashboard::apply`]. Logging is edge-triggered:
//! - "waiting" is logged once per stretch of empty snapshots
//! - sleep transitions are logged only when the determinate state changes
//! - a disconnect leaves the remembered sleep state untouched, so the same
//!   state after reconnecting is not logged again

use espwatch_core::{
    resolve_sleep_state, voltage_label, Led, SleepState, TelemetrySnapshot, SERVO_COUNT,
};
use tracing::debug;

use crate::activity::{ActivityLog, LogEntry};
use crate::error::ViewerResult;
use crate::view::{GaugeView, Heartbeat, LedIndicator, WatchdogMode, WatchdogView};

pub const DASHBOARD_INITIALIZED: &str = "Dashboard initialized.";
pub const WAITING_FOR_TELEMETRY: &str = "Waiting for ESP32 telemetry...";
pub const WAITING_FOR_DATA: &str = "Waiting for ESP32 data...";
pub const ENTERED_SLEEP: &str = "ESP32 entered sleep mode.";
pub const EXITED_SLEEP: &str = "ESP32 exited sleep mode.";

/// What one tick showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Real data; carries the resolved sleep state.
    Data(SleepState),
    /// Relay has not received anything from the device yet.
    Empty,
    /// Transport failed.
    Disconnected,
}

impl TickOutcome {
    /// Metric label.
    pub fn label(self) -> &'static str {
        match self {
            TickOutcome::Data(_) => "data",
            TickOutcome::Empty => "empty",
            TickOutcome::Disconnected => "disconnected",
        }
    }
}

/// Result of one tick: the outcome plus log lines appended during it.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Oldest first.
    pub new_entries: Vec<LogEntry>,
}

/// Headless dashboard.
#[derive(Debug, Clone)]
pub struct Dashboard {
    gauges: Vec<GaugeView>,
    voltage: String,
    leds: Vec<LedIndicator>,
    watchdog: WatchdogView,
    heartbeat: Heartbeat,
    log: ActivityLog,
    /// Last logged determinate state (`true` = asleep).
    last_sleep_state: Option<bool>,
    waiting_logged: bool,
    pending: Vec<LogEntry>,
}

impl Dashboard {
    pub fn new(log_capacity: usize) -> Self {
        let mut dashboard = Self {
            gauges: awaiting_gauges(),
            voltage: voltage_label(None),
            leds: awaiting_leds(),
            watchdog: WatchdogView::new(WatchdogMode::Unknown),
            heartbeat: Heartbeat::Pending,
            log: ActivityLog::new(log_capacity),
            last_sleep_state: None,
            waiting_logged: false,
            pending: Vec::new(),
        };
        dashboard.log(DASHBOARD_INITIALIZED);
        dashboard.log(WAITING_FOR_TELEMETRY);
        dashboard
    }

    /// Render one tick.
    pub fn apply(&mut self, fetched: &ViewerResult<TelemetrySnapshot>) -> TickReport {
        let outcome = match fetched {
            Ok(snapshot) => self.render_snapshot(snapshot),
            Err(e) => {
                debug!(error = %e, "Dashboard update failed");
                self.render_disconnected()
            }
        };
        TickReport {
            outcome,
            new_entries: std::mem::take(&mut self.pending),
        }
    }

    fn render_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> TickOutcome {
        if snapshot.is_empty() {
            if !self.waiting_logged {
                self.log(WAITING_FOR_DATA);
                self.waiting_logged = true;
            }
            self.gauges = awaiting_gauges();
            self.voltage = voltage_label(None);
            self.leds = awaiting_leds();
            self.set_display(WatchdogMode::Unknown, Heartbeat::Pending);
            return TickOutcome::Empty;
        }

        self.waiting_logged = false;

        self.gauges = snapshot
            .servo_angles()
            .iter()
            .enumerate()
            .map(|(i, angle)| GaugeView::new(i + 1, *angle))
            .collect();
        self.voltage = voltage_label(snapshot.voltage());
        self.leds = Led::ALL
            .iter()
            .map(|&led| LedIndicator::new(led, snapshot.led(led)))
            .collect();

        let state = resolve_sleep_state(snapshot);
        match state.as_asleep() {
            None => self.set_display(WatchdogMode::Unknown, Heartbeat::Pending),
            Some(asleep) => {
                if self.last_sleep_state != Some(asleep) {
                    self.log(if asleep { ENTERED_SLEEP } else { EXITED_SLEEP });
                    self.last_sleep_state = Some(asleep);
                }
                if asleep {
                    self.set_display(WatchdogMode::Sleeping, Heartbeat::Sleeping);
                } else {
                    self.set_display(WatchdogMode::Active, Heartbeat::Active);
                }
            }
        }
        TickOutcome::Data(state)
    }

    fn render_disconnected(&mut self) -> TickOutcome {
        self.waiting_logged = false;
        self.set_display(WatchdogMode::Disconnected, Heartbeat::Disconnected);
        TickOutcome::Disconnected
    }

    fn set_display(&mut self, mode: WatchdogMode, heartbeat: Heartbeat) {
        self.watchdog = WatchdogView::new(mode);
        self.heartbeat = heartbeat;
    }

    fn log(&mut self, message: &str) {
        let entry = self.log.push(message).clone();
        self.pending.push(entry);
    }

    pub fn gauges(&self) -> &[GaugeView] {
        &self.gauges
    }

    pub fn voltage(&self) -> &str {
        &self.voltage
    }

    pub fn leds(&self) -> &[LedIndicator] {
        &self.leds
    }

    pub fn watchdog(&self) -> &WatchdogView {
        &self.watchdog
    }

    pub fn heartbeat(&self) -> Heartbeat {
        self.heartbeat
    }

    pub fn log_entries(&self) -> &ActivityLog {
        &self.log
    }

    /// One-line summary for terminal output.
    pub fn status_line(&self) -> String {
        let servos: Vec<&str> = self.gauges.iter().map(|g| g.label.as_str()).collect();
        let leds: Vec<String> = self
            .leds
            .iter()
            .map(|l| format!("{}={}", l.led.code(), l.label))
            .collect();
        format!(
            "servos [{}] voltage {} leds [{}] watchdog {} heartbeat {}",
            servos.join(" "),
            self.voltage,
            leds.join(" "),
            self.watchdog.status_text,
            self.heartbeat
        )
    }
}

fn awaiting_gauges() -> Vec<GaugeView> {
    (1..=SERVO_COUNT).map(GaugeView::awaiting).collect()
}

fn awaiting_leds() -> Vec<LedIndicator> {
    Led::ALL.iter().map(|&led| LedIndicator::new(led, None)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;
    use serde_json::{json, Value};

    fn data(value: Value) -> ViewerResult<TelemetrySnapshot> {
        Ok(TelemetrySnapshot::try_from(value).unwrap())
    }

    fn failure() -> ViewerResult<TelemetrySnapshot> {
        Err(ViewerError::Status(503))
    }

    /// Dashboard whose startup lines have already been reported.
    fn started() -> Dashboard {
        let mut dashboard = Dashboard::new(30);
        dashboard.pending.clear();
        dashboard
    }

    fn messages(report: &TickReport) -> Vec<&str> {
        report.new_entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_initial_state() {
        let dashboard = Dashboard::new(30);
        assert_eq!(dashboard.watchdog().mode, WatchdogMode::Unknown);
        assert_eq!(dashboard.heartbeat(), Heartbeat::Pending);
        assert_eq!(
            dashboard.log_entries().messages(),
            vec![WAITING_FOR_TELEMETRY, DASHBOARD_INITIALIZED]
        );
    }

    #[test]
    fn test_empty_snapshot_logs_waiting_once() {
        let mut dashboard = Dashboard::new(30);
        for _ in 0..5 {
            let report = dashboard.apply(&data(json!({})));
            assert_eq!(report.outcome, TickOutcome::Empty);
        }
        assert_eq!(dashboard.watchdog().status_text, "Awaiting sleep status");
        assert_eq!(dashboard.heartbeat().label(), "Pending");
        assert_eq!(dashboard.log_entries().count(WAITING_FOR_DATA), 1);
        assert!(dashboard.gauges().iter().all(|g| g.label == "--"));
        assert_eq!(dashboard.voltage(), "--");
    }

    #[test]
    fn test_waiting_rearmed_after_real_data() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({})));
        dashboard.apply(&data(json!({"servo1": 10})));
        dashboard.apply(&data(json!({})));
        assert_eq!(dashboard.log_entries().count(WAITING_FOR_DATA), 2);
    }

    #[test]
    fn test_waiting_rearmed_after_disconnect() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({})));
        dashboard.apply(&failure());
        dashboard.apply(&data(json!({})));
        assert_eq!(dashboard.log_entries().count(WAITING_FOR_DATA), 2);
    }

    #[test]
    fn test_sleep_then_wake_logs_each_edge_once() {
        let mut dashboard = started();

        let report = dashboard.apply(&data(json!({"led_y": 1, "led_b": 0, "led_r": 0})));
        assert_eq!(report.outcome, TickOutcome::Data(SleepState::Asleep));
        assert_eq!(messages(&report), vec![ENTERED_SLEEP]);
        assert_eq!(dashboard.watchdog().mode, WatchdogMode::Sleeping);
        assert_eq!(dashboard.heartbeat(), Heartbeat::Sleeping);

        let report = dashboard.apply(&data(json!({"led_y": 1, "led_b": 1, "led_r": 0})));
        assert_eq!(report.outcome, TickOutcome::Data(SleepState::Awake));
        assert_eq!(messages(&report), vec![EXITED_SLEEP]);
        assert_eq!(dashboard.watchdog().status_text, "active");
        assert_eq!(dashboard.heartbeat(), Heartbeat::Active);

        assert_eq!(dashboard.log_entries().count(EXITED_SLEEP), 1);
        assert_eq!(dashboard.log_entries().count(ENTERED_SLEEP), 1);
    }

    #[test]
    fn test_same_snapshot_twice_logs_once() {
        let mut dashboard = Dashboard::new(30);
        let snapshot = data(json!({"sleep": 1}));
        dashboard.apply(&snapshot);
        let second = dashboard.apply(&snapshot);
        assert!(second.new_entries.is_empty());
        assert_eq!(dashboard.log_entries().count(ENTERED_SLEEP), 1);
    }

    #[test]
    fn test_indeterminate_shows_pending_without_logging() {
        let mut dashboard = started();
        let report = dashboard.apply(&data(json!({"servo1": 90, "voltage": 3.3})));
        assert_eq!(report.outcome, TickOutcome::Data(SleepState::Indeterminate));
        assert!(report.new_entries.is_empty());
        assert_eq!(dashboard.watchdog().mode, WatchdogMode::Unknown);
        assert_eq!(dashboard.heartbeat(), Heartbeat::Pending);
    }

    #[test]
    fn test_indeterminate_does_not_reset_memory() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({"sleep": 1})));
        dashboard.apply(&data(json!({"servo1": 1})));
        let report = dashboard.apply(&data(json!({"sleep": 1})));
        assert!(report.new_entries.is_empty());
    }

    #[test]
    fn test_disconnect_preserves_sleep_memory() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({"led_y": 1, "led_b": 0, "led_r": 0})));

        let report = dashboard.apply(&failure());
        assert_eq!(report.outcome, TickOutcome::Disconnected);
        assert_eq!(dashboard.watchdog().mode, WatchdogMode::Disconnected);
        assert_eq!(dashboard.watchdog().status_text, "Disconnected");
        assert_eq!(dashboard.heartbeat(), Heartbeat::Disconnected);

        let report = dashboard.apply(&data(json!({"led_y": true})));
        assert!(report.new_entries.is_empty());
        assert_eq!(dashboard.log_entries().count(ENTERED_SLEEP), 1);
        assert_eq!(dashboard.watchdog().mode, WatchdogMode::Sleeping);
    }

    #[test]
    fn test_disconnect_keeps_last_readings() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({"servo1": 42, "voltage": 3.3})));
        dashboard.apply(&failure());
        assert_eq!(dashboard.gauges()[0].label, "42.0°");
        assert_eq!(dashboard.voltage(), "3.30 V");
    }

    #[test]
    fn test_widgets_rendered_from_snapshot() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({
            "servo1": 185,
            "servo2": -5,
            "servo3": "abc",
            "servo6": 90,
            "voltage": 3.7,
            "led_y": 0,
            "led_b": 1,
        })));

        let labels: Vec<&str> = dashboard.gauges().iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["180.0°", "0.0°", "--", "--", "--", "90.0°"]);
        assert_eq!(dashboard.gauges()[5].fill_percent, 50.0);
        assert_eq!(dashboard.voltage(), "3.70 V");

        let leds: Vec<&str> = dashboard.leds().iter().map(|l| l.label).collect();
        assert_eq!(leds, vec!["OFF", "ON", "OFF"]);
    }

    #[test]
    fn test_initial_entries_reported_on_first_tick() {
        let mut dashboard = Dashboard::new(30);
        let report = dashboard.apply(&data(json!({})));
        assert_eq!(
            messages(&report),
            vec![DASHBOARD_INITIALIZED, WAITING_FOR_TELEMETRY, WAITING_FOR_DATA]
        );
    }

    #[test]
    fn test_status_line() {
        let mut dashboard = Dashboard::new(30);
        dashboard.apply(&data(json!({"servo1": 90, "led_y": 1})));
        let line = dashboard.status_line();
        assert!(line.contains("90.0°"));
        assert!(line.contains("y=ON"));
        assert!(line.contains("heartbeat Sleeping"));
    }
}
