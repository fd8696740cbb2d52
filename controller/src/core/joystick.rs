//! Two-stick manual control: pointer normalization and the streamed frame

use shared::{ControlMessage, JoystickVector};

use crate::types::{StickId, DEFAULT_JOYSTICK_SIZE};

/// Gap between the pad edge and the furthest the knob may travel
pub const KNOB_MARGIN: f64 = 25.0;

/// Travel radius in pixels for a pad of this size
pub fn max_radius(size: f64) -> f64 {
    (size / 2.0 - KNOB_MARGIN).max(1.0)
}

/// Round to 4 decimals; never yields negative zero
pub fn round4(value: f64) -> f64 {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Map a pointer displacement to [-1, 1] with up positive.
///
/// `dx`/`dy` are in screen pixels from the pad centre, y growing downward.
/// Displacements past the radius are clamped onto the circle.
pub fn normalize(dx: f64, dy: f64, radius: f64) -> JoystickVector {
    if !dx.is_finite() || !dy.is_finite() {
        return JoystickVector::ZERO;
    }

    let distance = dx.hypot(dy);
    let (clamped_x, clamped_y) = if distance > radius {
        (dx / distance * radius, dy / distance * radius)
    } else {
        (dx, dy)
    };

    JoystickVector::new(clamped_x / radius, -clamped_y / radius)
}

/// Holds the latest wire value of each stick
#[derive(Debug, Clone)]
pub struct JoystickStreamer {
    radius: f64,
    joy1: JoystickVector,
    joy2: JoystickVector,
}

impl Default for JoystickStreamer {
    fn default() -> Self {
        Self::new(DEFAULT_JOYSTICK_SIZE)
    }
}

impl JoystickStreamer {
    pub fn new(pad_size: f64) -> Self {
        Self {
            radius: max_radius(pad_size),
            joy1: JoystickVector::ZERO,
            joy2: JoystickVector::ZERO,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Record a drag and return the value that will go on the wire.
    ///
    /// The firmware reads stick 1 with Y flipped, so its Y is inverted here.
    pub fn move_stick(&mut self, stick: StickId, dx: f64, dy: f64) -> JoystickVector {
        let normalized = normalize(dx, dy, self.radius);
        let wire = match stick {
            StickId::Primary => JoystickVector::new(round4(normalized.x), round4(-normalized.y)),
            StickId::Secondary => JoystickVector::new(round4(normalized.x), round4(normalized.y)),
        };
        *self.slot(stick) = wire;
        wire
    }

    /// Snap a stick back to centre
    pub fn release(&mut self, stick: StickId) {
        *self.slot(stick) = JoystickVector::ZERO;
    }

    pub fn reset(&mut self) {
        self.joy1 = JoystickVector::ZERO;
        self.joy2 = JoystickVector::ZERO;
    }

    pub fn vector(&self, stick: StickId) -> JoystickVector {
        match stick {
            StickId::Primary => self.joy1,
            StickId::Secondary => self.joy2,
        }
    }

    /// The frame emitted on every tick
    pub fn frame(&self) -> ControlMessage {
        ControlMessage::joystick(self.joy1, self.joy2)
    }

    fn slot(&mut self, stick: StickId) -> &mut JoystickVector {
        match stick {
            StickId::Primary => &mut self.joy1,
            StickId::Secondary => &mut self.joy2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_radius() {
        assert_eq!(max_radius(DEFAULT_JOYSTICK_SIZE), 65.0);
        assert_eq!(JoystickStreamer::default().radius(), 65.0);
    }

    #[test]
    fn test_tiny_pad_keeps_positive_radius() {
        assert_eq!(max_radius(20.0), 1.0);
    }

    #[test]
    fn test_drag_beyond_radius_has_unit_magnitude() {
        let vector = normalize(300.0, -400.0, 65.0);
        assert!((vector.magnitude() - 1.0).abs() < 1e-9);
        assert!((vector.x - 0.6).abs() < 1e-9);
        assert!((vector.y - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_drag_inside_radius_scales_linearly() {
        let vector = normalize(32.5, 0.0, 65.0);
        assert_eq!(vector, JoystickVector::new(0.5, 0.0));
    }

    #[test]
    fn test_screen_down_is_negative() {
        let vector = normalize(0.0, 65.0, 65.0);
        assert_eq!(vector.y, -1.0);
    }

    #[test]
    fn test_primary_inverts_y_secondary_does_not() {
        let mut streamer = JoystickStreamer::default();

        let joy1 = streamer.move_stick(StickId::Primary, 0.0, -65.0);
        let joy2 = streamer.move_stick(StickId::Secondary, 0.0, -65.0);

        assert_eq!(joy1, JoystickVector::new(0.0, -1.0));
        assert_eq!(joy2, JoystickVector::new(0.0, 1.0));
    }

    #[test]
    fn test_wire_values_rounded_to_four_decimals() {
        let mut streamer = JoystickStreamer::default();
        let joy2 = streamer.move_stick(StickId::Secondary, 10.0, 0.0);
        // 10 / 65 = 0.153846...
        assert_eq!(joy2.x, 0.1538);
    }

    #[test]
    fn test_rounding_never_yields_negative_zero() {
        assert!(round4(-0.00001).is_sign_positive());
        assert!(round4(-0.0).is_sign_positive());
    }

    #[test]
    fn test_release_recentres_only_that_stick() {
        let mut streamer = JoystickStreamer::default();
        streamer.move_stick(StickId::Primary, 65.0, 0.0);
        streamer.move_stick(StickId::Secondary, -65.0, 0.0);

        streamer.release(StickId::Primary);

        assert_eq!(streamer.vector(StickId::Primary), JoystickVector::ZERO);
        assert_eq!(streamer.vector(StickId::Secondary), JoystickVector::new(-1.0, 0.0));
        assert_eq!(
            streamer.frame(),
            ControlMessage::joystick(JoystickVector::ZERO, JoystickVector::new(-1.0, 0.0))
        );
    }

    #[test]
    fn test_non_finite_input_is_centred() {
        assert_eq!(normalize(f64::NAN, 1.0, 65.0), JoystickVector::ZERO);
    }
}
