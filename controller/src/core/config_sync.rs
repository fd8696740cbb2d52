//! Desired and observed vehicle configuration

use shared::{ConfigData, ConfigField, ControlMessage};

/// Reduce raw operator text to an integer.
///
/// Anything other than digits and '-' is dropped, '-' survives only in
/// leading position, and empty, lone "-" or out-of-range input reads as 0.
pub fn sanitize_input(raw: &str) -> i32 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .enumerate()
        .filter(|(index, c)| *c != '-' || *index == 0)
        .map(|(_, c)| c)
        .collect();

    cleaned.parse::<i32>().unwrap_or(0)
}

/// Editing buffer for the next config push plus the vehicle's last report
#[derive(Debug, Clone, Default)]
pub struct ConfigSync {
    desired: ConfigData,
    observed: ConfigData,
    reports_received: u64,
}

impl ConfigSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desired(&self) -> &ConfigData {
        &self.desired
    }

    pub fn observed(&self) -> &ConfigData {
        &self.observed
    }

    /// How many config reports the vehicle has sent
    pub fn reports_received(&self) -> u64 {
        self.reports_received
    }

    pub fn set_field(&mut self, field: ConfigField, value: i32) {
        self.desired.set(field, value);
    }

    /// Set a field from operator text, returning the value that was stored
    pub fn set_field_from_input(&mut self, field: ConfigField, raw: &str) -> i32 {
        let value = sanitize_input(raw);
        self.desired.set(field, value);
        value
    }

    /// Frame for the current desired buffer, empty fields as the unset sentinel
    pub fn encode_desired(&self) -> ControlMessage {
        ControlMessage::config(&self.desired)
    }

    /// The push went out; start the next edit from a clean buffer
    pub fn mark_sent(&mut self) {
        self.desired = ConfigData::default();
    }

    /// Replace the observed view wholesale with a vehicle report
    pub fn apply_observed(&mut self, report: ConfigData) {
        self.observed = report;
        self.reports_received += 1;
    }
}
