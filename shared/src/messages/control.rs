//! Controller ↔ vehicle firmware frames
//!
//! Every frame is one self-describing JSON object. There is no request id and
//! no acknowledgement; the firmware dispatches on which keys are present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{SharedError, SharedResult};
use crate::types::{ConfigData, ConfigField, JoystickVector, OperatingMode};

/// Route payload that starts execution of the stored route
pub const ROUTE_START: &str = "Start";

/// Route payload that resets execution on the vehicle
pub const ROUTE_RESET: &str = "reset";

/// Wire value for a config field the operator left empty
pub const CONFIG_UNSET: i32 = -1;

/// Outbound frames sent to the vehicle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ControlMessage {
    Mode {
        mode: OperatingMode,
    },
    Joystick {
        joy1: JoystickVector,
        joy2: JoystickVector,
    },
    Route {
        route: String,
    },
    Config {
        sensor: i32,
        stop: i32,
        turn: i32,
        referent_line_width: i32,
    },
}

impl ControlMessage {
    pub fn mode(mode: OperatingMode) -> Self {
        ControlMessage::Mode { mode }
    }

    pub fn joystick(joy1: JoystickVector, joy2: JoystickVector) -> Self {
        ControlMessage::Joystick { joy1, joy2 }
    }

    pub fn route(letters: impl Into<String>) -> Self {
        ControlMessage::Route { route: letters.into() }
    }

    pub fn start_route() -> Self {
        Self::route(ROUTE_START)
    }

    pub fn reset_route() -> Self {
        Self::route(ROUTE_RESET)
    }

    /// Config push where every zero field is replaced by the unset sentinel
    pub fn config(desired: &ConfigData) -> Self {
        let encode = |value: i32| if value == 0 { CONFIG_UNSET } else { value };
        ControlMessage::Config {
            sensor: encode(desired.sensor),
            stop: encode(desired.stop),
            turn: encode(desired.turn),
            referent_line_width: encode(desired.referent_line_width),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Mode { .. } => "mode",
            ControlMessage::Joystick { .. } => "joystick",
            ControlMessage::Route { .. } => "route",
            ControlMessage::Config { .. } => "config",
        }
    }

    /// Serialize into one text frame
    pub fn to_frame(&self) -> SharedResult<String> {
        serde_json::to_string(self).map_err(|e| SharedError::SerializationError { message: e.to_string() })
    }
}

/// Inbound frames the controller understands
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Configuration currently applied on the vehicle
    ObservedConfig(ConfigData),
}

impl InboundMessage {
    /// Parse a text frame from the vehicle.
    ///
    /// A frame is a config report when it is an object carrying at least one
    /// recognized config key. Missing or non-integer fields read as 0.
    pub fn parse(frame: &str) -> SharedResult<Self> {
        let value: Value = serde_json::from_str(frame)
            .map_err(|e| SharedError::malformed(format!("not JSON: {e}")))?;

        let Value::Object(fields) = value else {
            return Err(SharedError::malformed("payload is not an object"));
        };

        let recognized = ConfigField::ALL
            .iter()
            .any(|field| fields.contains_key(field.wire_name()));
        if !recognized {
            return Err(SharedError::malformed("object matches no known shape"));
        }

        let mut observed = ConfigData::default();
        for field in ConfigField::ALL {
            let value = fields.get(field.wire_name()).and_then(integral_i32).unwrap_or(0);
            observed.set(field, value);
        }

        Ok(InboundMessage::ObservedConfig(observed))
    }
}

/// Integer field value; `40.0` counts, `40.5` does not
fn integral_i32(value: &Value) -> Option<i32> {
    if let Some(v) = value.as_i64() {
        return i32::try_from(v).ok();
    }
    let v = value.as_f64()?;
    let in_range = v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX);
    (v.fract() == 0.0 && in_range).then_some(v as i32)
}
