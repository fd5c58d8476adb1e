//! Telemetry snapshot as pushed by the ESP32.
//!
//! The device sends a flat JSON object. Field types are not validated at the
//! boundary: accessors coerce on read and report `None` for anything they
//! cannot interpret.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{numeric, truthy};
use crate::error::{CoreError, Result};

/// Number of servo channels reported by the device.
pub const SERVO_COUNT: usize = 6;

/// Lower bound of the displayable servo angle (degrees).
pub const MIN_ANGLE: f64 = 0.0;

/// Upper bound of the displayable servo angle (degrees).
pub const MAX_ANGLE: f64 = 180.0;

/// Status LEDs on the device board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// `led_y` (rendered green on the dashboard).
    Yellow,
    /// `led_b`.
    Blue,
    /// `led_r` (rendered orange on the dashboard).
    Red,
}

impl Led {
    /// All LEDs in display order.
    pub const ALL: [Led; 3] = [Led::Yellow, Led::Blue, Led::Red];

    /// Snapshot field name for this LED.
    pub fn field(self) -> &'static str {
        match self {
            Led::Yellow => "led_y",
            Led::Blue => "led_b",
            Led::Red => "led_r",
        }
    }

    /// Short color code used by indicator ids.
    pub fn code(self) -> &'static str {
        match self {
            Led::Yellow => "y",
            Led::Blue => "b",
            Led::Red => "r",
        }
    }

    /// Indicator color the dashboard paints this LED with.
    pub fn display_color(self) -> &'static str {
        match self {
            Led::Yellow => "green",
            Led::Blue => "blue",
            Led::Red => "orange",
        }
    }
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Latest telemetry record.
///
/// An empty snapshot means "no data yet" and is distinct from a snapshot
/// whose fields are all false. Snapshots are replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetrySnapshot(Map<String, Value>);

impl TelemetrySnapshot {
    /// The "no data yet" snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a request body, accepting only a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::try_from(value)
    }

    /// Whether no fields have been received.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Servo angle for channel `index` (1-based), clamped to [0, 180].
    ///
    /// Returns `None` when the field is absent or non-numeric.
    pub fn servo_angle(&self, index: usize) -> Option<f64> {
        self.get(&format!("servo{index}"))
            .and_then(numeric)
            .map(|angle| angle.clamp(MIN_ANGLE, MAX_ANGLE))
    }

    /// All six servo angles in channel order.
    pub fn servo_angles(&self) -> [Option<f64>; SERVO_COUNT] {
        std::array::from_fn(|i| self.servo_angle(i + 1))
    }

    /// Supply voltage in volts.
    pub fn voltage(&self) -> Option<f64> {
        self.get("voltage").and_then(numeric)
    }

    /// LED state; `None` when the field is absent or not boolean-like.
    pub fn led(&self, led: Led) -> Option<bool> {
        self.get(led.field()).and_then(truthy)
    }

    /// Legacy `sleep` flag.
    pub fn sleep_flag(&self) -> Option<bool> {
        self.get("sleep").and_then(truthy)
    }

    /// Lowercased `status` string, if it is a string.
    pub fn status(&self) -> Option<String> {
        self.get("status")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
    }
}

impl TryFrom<Value> for TelemetrySnapshot {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(CoreError::NotAnObject("null")),
            Value::Bool(_) => Err(CoreError::NotAnObject("boolean")),
            Value::Number(_) => Err(CoreError::NotAnObject("number")),
            Value::String(_) => Err(CoreError::NotAnObject("string")),
            Value::Array(_) => Err(CoreError::NotAnObject("array")),
        }
    }
}

impl From<Map<String, Value>> for TelemetrySnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
