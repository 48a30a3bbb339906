//! Event types delivered to shortcut observers
//!
//! The OS only reports presses and releases. Observers can additionally ask
//! for a double tap, which is synthesized from the gap between two releases.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Raw event kinds reported by the OS hotkey service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotKeyEventKind {
    /// kEventHotKeyPressed
    Pressed,
    /// kEventHotKeyReleased
    Released,
}

/// Event types an observer can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventType {
    /// Shortcut pressed
    KeyDown,

    /// Shortcut released
    KeyUp,

    /// Two releases in a row
    ///
    /// As a subscription, `interval` is the longest gap that still counts.
    /// As a fired event, it is the gap that was actually measured.
    DoubleTap {
        #[serde(with = "secs_f64")]
        interval: Duration,
    },
}

impl EventType {
    /// Double tap subscription with a maximum gap in seconds
    ///
    /// Negative or non-finite values are treated as zero; values too large
    /// for a [`Duration`] saturate.
    pub fn double_tap(max_interval_secs: f64) -> Self {
        let secs = if max_interval_secs.is_finite() {
            max_interval_secs.max(0.0)
        } else {
            0.0
        };
        EventType::DoubleTap {
            interval: Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
        }
    }

    /// Check whether a subscription (`self`) accepts a fired event
    ///
    /// Key down / key up match by variant. A double tap subscription accepts
    /// any fired double tap whose gap is at most its own interval.
    pub fn matches(&self, fired: &EventType) -> bool {
        match (self, fired) {
            (EventType::KeyDown, EventType::KeyDown) => true,
            (EventType::KeyUp, EventType::KeyUp) => true,
            (
                EventType::DoubleTap { interval: max },
                EventType::DoubleTap { interval: measured },
            ) => measured <= max,
            _ => false,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::KeyDown => write!(f, "KEY_DOWN"),
            EventType::KeyUp => write!(f, "KEY_UP"),
            EventType::DoubleTap { interval } => {
                write!(f, "DOUBLE_TAP ({}ms)", interval.as_millis())
            }
        }
    }
}

mod secs_f64 {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_variants_match_exactly() {
        assert!(EventType::KeyDown.matches(&EventType::KeyDown));
        assert!(EventType::KeyUp.matches(&EventType::KeyUp));
        assert!(!EventType::KeyDown.matches(&EventType::KeyUp));
        assert!(!EventType::KeyUp.matches(&EventType::double_tap(0.1)));
    }

    #[test]
    fn test_double_tap_is_a_threshold() {
        let subscription = EventType::double_tap(1.0);
        assert!(subscription.matches(&EventType::double_tap(0.25)));
        assert!(subscription.matches(&EventType::double_tap(1.0)));
        assert!(!subscription.matches(&EventType::double_tap(2.0)));
        assert!(!subscription.matches(&EventType::KeyUp));
    }

    #[test]
    fn test_double_tap_clamps_bad_input() {
        assert_eq!(
            EventType::double_tap(-3.0),
            EventType::DoubleTap {
                interval: Duration::ZERO
            }
        );
        assert_eq!(EventType::double_tap(f64::NAN), EventType::double_tap(0.0));
    }

    #[test]
    fn test_double_tap_saturates_huge_interval() {
        assert_eq!(
            EventType::double_tap(1e300),
            EventType::DoubleTap {
                interval: Duration::MAX
            }
        );
        assert!(EventType::double_tap(1e300).matches(&EventType::double_tap(3600.0)));
    }

    #[test]
    fn test_event_serialization() {
        let event = EventType::double_tap(0.5);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("double_tap"));
        assert!(json.contains("0.5"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"key_down"}"#;
        let event: EventType = serde_json::from_str(json).unwrap();
        assert!(matches!(event, EventType::KeyDown));
    }

    #[test]
    fn test_display() {
        assert_eq!(EventType::KeyDown.to_string(), "KEY_DOWN");
        assert_eq!(EventType::double_tap(0.5).to_string(), "DOUBLE_TAP (500ms)");
    }
}
