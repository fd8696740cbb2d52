//! Core types used throughout the vehicle control system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::errors::SharedError;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Reported when no binary has claimed an identity (library use, tests)
static EMBEDDED: ProcessId = ProcessId::Embedded;

/// Process identifier used to tag log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Operator-side controller process
    Controller,
    /// Peer activity tracker (HTTP side-channel)
    Tracker,
    /// Library code running without an initialized identity
    Embedded,
}

impl ProcessId {
    /// Initialize the global process ID for the controller
    pub fn init_controller() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Controller)
    }

    /// Initialize the global process ID for the tracker
    pub fn init_tracker() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Tracker)
    }

    /// Get the global process ID, `Embedded` until a binary initializes it
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&EMBEDDED)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Controller => write!(f, "controller"),
            ProcessId::Tracker => write!(f, "tracker"),
            ProcessId::Embedded => write!(f, "embedded"),
        }
    }
}

/// Link state of the one socket to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Operating context announced to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Connect,
    Route,
    Manual,
    Config,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 4] = [
        OperatingMode::Connect,
        OperatingMode::Route,
        OperatingMode::Manual,
        OperatingMode::Config,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Connect => "connect",
            OperatingMode::Route => "route",
            OperatingMode::Manual => "manual",
            OperatingMode::Config => "config",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connect" => Ok(OperatingMode::Connect),
            "route" => Ok(OperatingMode::Route),
            "manual" => Ok(OperatingMode::Manual),
            "config" => Ok(OperatingMode::Config),
            _ => Err(SharedError::unknown("mode", s)),
        }
    }
}

/// One discrete navigation instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStepKind {
    Left,
    Right,
    Straight,
    #[serde(rename = "u-turn")]
    UTurn,
    Pick,
    Drop,
    Stop,
}

impl RouteStepKind {
    /// Letter the firmware expects for this step.
    ///
    /// Straight and Stop share "S"; the firmware alphabet has no separate
    /// stop letter.
    pub fn wire_letter(self) -> char {
        match self {
            RouteStepKind::Left => 'L',
            RouteStepKind::Right => 'R',
            RouteStepKind::Straight => 'S',
            RouteStepKind::UTurn => 'U',
            RouteStepKind::Pick => 'P',
            RouteStepKind::Drop => 'D',
            RouteStepKind::Stop => 'S',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RouteStepKind::Left => "Turn Left",
            RouteStepKind::Right => "Turn Right",
            RouteStepKind::Straight => "Go Straight",
            RouteStepKind::UTurn => "U-Turn",
            RouteStepKind::Pick => "Pick Up",
            RouteStepKind::Drop => "Drop Off",
            RouteStepKind::Stop => "Stop",
        }
    }
}

impl fmt::Display for RouteStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RouteStepKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Ok(RouteStepKind::Left),
            "right" | "r" => Ok(RouteStepKind::Right),
            "straight" => Ok(RouteStepKind::Straight),
            "u-turn" | "uturn" | "u" => Ok(RouteStepKind::UTurn),
            "pick" | "p" => Ok(RouteStepKind::Pick),
            "drop" | "d" => Ok(RouteStepKind::Drop),
            "stop" => Ok(RouteStepKind::Stop),
            _ => Err(SharedError::unknown("route step", s)),
        }
    }
}

/// Opaque unique token identifying a route step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StepId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| SharedError::unknown("step id", s))
    }
}

/// Route step as held by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub id: StepId,
    pub kind: RouteStepKind,
}

/// Numeric configuration fields understood by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Sensor,
    Stop,
    Turn,
    ReferentLineWidth,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::Sensor,
        ConfigField::Stop,
        ConfigField::Turn,
        ConfigField::ReferentLineWidth,
    ];

    /// Key used on the wire
    pub fn wire_name(self) -> &'static str {
        match self {
            ConfigField::Sensor => "sensor",
            ConfigField::Stop => "stop",
            ConfigField::Turn => "turn",
            ConfigField::ReferentLineWidth => "referent_line_width",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Sensor => "Distance Ultra Sonic Sensor",
            ConfigField::Stop => "Distance to Stop",
            ConfigField::Turn => "Delay before Turn",
            ConfigField::ReferentLineWidth => "Referent Line width",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ConfigField {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sensor" => Ok(ConfigField::Sensor),
            "stop" => Ok(ConfigField::Stop),
            "turn" => Ok(ConfigField::Turn),
            "referent_line_width" | "line_width" => Ok(ConfigField::ReferentLineWidth),
            _ => Err(SharedError::unknown("config field", s)),
        }
    }
}

/// Four independent integer settings; zero means "no value"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigData {
    pub sensor: i32,
    pub stop: i32,
    pub turn: i32,
    pub referent_line_width: i32,
}

impl ConfigData {
    pub fn get(&self, field: ConfigField) -> i32 {
        match field {
            ConfigField::Sensor => self.sensor,
            ConfigField::Stop => self.stop,
            ConfigField::Turn => self.turn,
            ConfigField::ReferentLineWidth => self.referent_line_width,
        }
    }

    pub fn set(&mut self, field: ConfigField, value: i32) {
        match field {
            ConfigField::Sensor => self.sensor = value,
            ConfigField::Stop => self.stop = value,
            ConfigField::Turn => self.turn = value,
            ConfigField::ReferentLineWidth => self.referent_line_width = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigData::default()
    }
}

/// Normalized joystick deflection, up is positive Y
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JoystickVector {
    pub x: f64,
    pub y: f64,
}

impl JoystickVector {
    pub const ZERO: JoystickVector = JoystickVector { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Peer seen by the activity tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedUser {
    pub ip: String,
    pub user_agent: String,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConnectedUser {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
            connected_at: now,
            last_activity: now,
        }
    }
}
