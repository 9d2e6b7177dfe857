//! Event types that flow from the device to listeners.

use crate::defaults;
use std::fmt;

/// One timestamped vector of per-channel readings.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEvent {
    /// Device timestamp in seconds.
    pub timestamp: f64,
    /// Readings in session channel order.
    pub channels: Vec<f64>,
}

impl SampleEvent {
    pub fn new(timestamp: f64, channels: Vec<f64>) -> Self {
        Self {
            timestamp,
            channels,
        }
    }
}

/// One timestamped trial onset or segment boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEvent {
    pub timestamp: f64,
    pub marker: Marker,
}

impl MarkerEvent {
    pub fn new(timestamp: f64, marker: Marker) -> Self {
        Self { timestamp, marker }
    }
}

/// Marker payload: an integer class, or a string label from older recordings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    Class(i64),
    Legacy(String),
}

impl Marker {
    /// Parses a marker field as written to `markers.csv`.
    ///
    /// Integer literals and integral floats (`"2"`, `"2.0"`) become
    /// [`Marker::Class`]; anything else is kept verbatim as a legacy label.
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        if let Ok(class) = field.parse::<i64>() {
            return Marker::Class(class);
        }
        if let Ok(value) = field.parse::<f64>()
            && value.is_finite()
            && value.fract() == 0.0
        {
            return Marker::Class(value as i64);
        }
        Marker::Legacy(field.to_string())
    }

    /// Class id of this marker, or `None` for an unrecognised legacy label.
    ///
    /// Legacy labels map to their position in `left, right, top, bottom`.
    pub fn class_id(&self) -> Option<i64> {
        match self {
            Marker::Class(class) => Some(*class),
            Marker::Legacy(label) => defaults::LEGACY_LABELS
                .iter()
                .position(|l| *l == label)
                .map(|i| i as i64),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Marker::Legacy(_))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Class(class) => write!(f, "{}", class),
            Marker::Legacy(label) => write!(f, "{}", label),
        }
    }
}

impl From<i64> for Marker {
    fn from(class: i64) -> Self {
        Marker::Class(class)
    }
}

impl From<&str> for Marker {
    fn from(label: &str) -> Self {
        Marker::parse(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_marker() {
        assert_eq!(Marker::parse("3"), Marker::Class(3));
        assert_eq!(Marker::parse(" 12 "), Marker::Class(12));
        assert_eq!(Marker::parse("-1"), Marker::Class(-1));
    }

    #[test]
    fn parse_integral_float_marker() {
        assert_eq!(Marker::parse("2.0"), Marker::Class(2));
    }

    #[test]
    fn parse_fractional_float_stays_legacy() {
        assert_eq!(Marker::parse("2.5"), Marker::Legacy("2.5".to_string()));
        assert_eq!(Marker::parse("2.5").class_id(), None);
    }

    #[test]
    fn legacy_labels_map_in_fixed_order() {
        for (expected, label) in ["left", "right", "top", "bottom"].iter().enumerate() {
            let marker = Marker::parse(label);
            assert!(marker.is_legacy());
            assert_eq!(marker.class_id(), Some(expected as i64));
        }
    }

    #[test]
    fn legacy_mapping_ignores_which_subset_appears() {
        // "bottom" is class 3 even when it is the only label in a file
        assert_eq!(Marker::parse("bottom").class_id(), Some(3));
        assert_eq!(Marker::parse("top").class_id(), Some(2));
    }

    #[test]
    fn unknown_label_has_no_class() {
        assert_eq!(Marker::parse("middle").class_id(), None);
    }

    #[test]
    fn display_renders_as_written() {
        assert_eq!(Marker::Class(4).to_string(), "4");
        assert_eq!(Marker::Legacy("left".to_string()).to_string(), "left");
    }

    #[test]
    fn display_then_parse_keeps_marker() {
        for marker in [Marker::Class(7), Marker::Legacy("right".to_string())] {
            assert_eq!(Marker::parse(&marker.to_string()), marker);
        }
    }
}
