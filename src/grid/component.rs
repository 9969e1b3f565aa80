//! Placed circuit parts: wires, resistors, lamps, batteries.

use crate::error::{CircuitError, Result};

/// The electrical role of a placed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Zero-resistance connection; the only kind that may form junctions
    Wire,
    /// Ohmic element; a lamp is a resistor with a target-current band
    Resistor,
    /// Ideal DC voltage source
    Battery,
}

/// One placed element and its solved electrical state.
///
/// The value fields (`resistance`, `source_voltage`, target band) are set at
/// construction or through [`set_main_value`](Component::set_main_value).
/// The solved fields (`current`, `voltage`, `active`) are written by the
/// engine on every solve and must not be mutated by the game shell.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Whether this resistor is a lamp with a target-current band
    pub is_lamp: bool,
    /// Resistance in ohms; meaningful for resistors, always 0 for wires
    pub resistance: f64,
    /// Source voltage in volts; meaningful for batteries
    pub source_voltage: f64,
    /// Target current in amperes (lamps only)
    pub target_current: f64,
    /// Allowed deviation from the target current (lamps only)
    pub target_margin: f64,
    /// Solved signed current in amperes; NaN is the fault sentinel
    pub current: f64,
    /// Solved potential difference across the component in volts
    pub voltage: f64,
    /// Whether a non-negligible current flows through the component
    pub active: bool,
}

impl Component {
    fn of_kind(kind: ComponentKind) -> Self {
        Self {
            kind,
            is_lamp: false,
            resistance: 0.0,
            source_voltage: 0.0,
            target_current: 0.0,
            target_margin: 0.0,
            current: 0.0,
            voltage: 0.0,
            active: false,
        }
    }

    /// Create a wire.
    pub fn wire() -> Self {
        Self::of_kind(ComponentKind::Wire)
    }

    /// Create a resistor. Negative resistances clamp to zero.
    pub fn resistor(ohms: f64) -> Self {
        Self {
            resistance: ohms.max(0.0),
            ..Self::of_kind(ComponentKind::Resistor)
        }
    }

    /// Create a lamp: a resistor that lights when the current through it
    /// stays within `target ± margin`.
    pub fn lamp(ohms: f64, target: f64, margin: f64) -> Self {
        Self {
            is_lamp: true,
            target_current: target,
            target_margin: margin.max(0.0),
            ..Self::resistor(ohms)
        }
    }

    /// Create a battery with the given source voltage.
    pub fn battery(volts: f64) -> Self {
        Self {
            source_voltage: volts,
            ..Self::of_kind(ComponentKind::Battery)
        }
    }

    /// Set the player-tunable value: resistance for resistors and lamps,
    /// source voltage for batteries. Wires have no main value.
    pub fn set_main_value(&mut self, value: f64) -> Result<()> {
        match self.kind {
            ComponentKind::Wire => Err(CircuitError::WireHasNoValue),
            ComponentKind::Resistor => {
                self.resistance = value.max(0.0);
                Ok(())
            }
            ComponentKind::Battery => {
                self.source_voltage = value;
                Ok(())
            }
        }
    }

    /// Clear the solved fields back to their pre-solve state.
    pub fn reset_solution(&mut self) {
        self.current = 0.0;
        self.voltage = 0.0;
        self.active = false;
    }

    /// Whether this lamp's solved current lies within its acceptance band.
    /// Always false for non-lamps and for the NaN fault sentinel.
    pub fn satisfies_target(&self) -> bool {
        self.is_lamp
            && !self.current.is_nan()
            && (self.current - self.target_current).abs() <= self.target_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let w = Component::wire();
        assert_eq!(w.kind, ComponentKind::Wire);
        assert_eq!(w.resistance, 0.0);

        let r = Component::resistor(470.0);
        assert_eq!(r.kind, ComponentKind::Resistor);
        assert!(!r.is_lamp);
        assert_eq!(r.resistance, 470.0);

        let l = Component::lamp(5.0, 1.0, 0.1);
        assert_eq!(l.kind, ComponentKind::Resistor);
        assert!(l.is_lamp);

        let b = Component::battery(9.0);
        assert_eq!(b.kind, ComponentKind::Battery);
        assert_eq!(b.source_voltage, 9.0);
    }

    #[test]
    fn test_set_main_value() {
        let mut r = Component::resistor(1.0);
        r.set_main_value(22.0).unwrap();
        assert_eq!(r.resistance, 22.0);

        let mut b = Component::battery(5.0);
        b.set_main_value(12.0).unwrap();
        assert_eq!(b.source_voltage, 12.0);

        let mut w = Component::wire();
        assert_eq!(w.set_main_value(1.0), Err(CircuitError::WireHasNoValue));
    }

    #[test]
    fn test_negative_resistance_clamps() {
        let r = Component::resistor(-3.0);
        assert_eq!(r.resistance, 0.0);
    }

    #[test]
    fn test_satisfies_target() {
        let mut l = Component::lamp(5.0, 1.0, 0.1);
        l.current = 0.95;
        assert!(l.satisfies_target());

        l.current = 1.2;
        assert!(!l.satisfies_target());

        // A faulted lamp is never lit
        l.current = f64::NAN;
        assert!(!l.satisfies_target());

        // A plain resistor has no target
        let mut r = Component::resistor(5.0);
        r.current = 1.0;
        assert!(!r.satisfies_target());
    }
}
