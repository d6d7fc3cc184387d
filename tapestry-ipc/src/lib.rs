//! Types for feeding contacts into tapestry and consuming the gestures and actions it recognizes.
#![warn(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one concurrent input contact.
///
/// Identifiers only need to be unique among the contacts that are down at the same time; the
/// input source is free to reuse them afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ContactId(pub u64);

/// Point in surface-local logical pixels.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate, growing to the right.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

/// Raw contact notification from the upstream input source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContactEvent {
    /// A contact touched down.
    Down {
        /// Contact id.
        id: ContactId,
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Id of the element the contact started on, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        /// Event time in milliseconds.
        timestamp_ms: u64,
    },
    /// A contact moved.
    Move {
        /// Contact id.
        id: ContactId,
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// A contact lifted.
    Up {
        /// Contact id.
        id: ContactId,
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
        /// Event time in milliseconds.
        timestamp_ms: u64,
    },
    /// A contact was cancelled by the input source.
    Cancel {
        /// Contact id.
        id: ContactId,
    },
}

/// Contact event scheduled at an offset from the start of a recording.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimedContactEvent {
    /// Offset from the start of the recording in milliseconds.
    pub at_ms: u64,
    /// The contact event.
    #[serde(flatten)]
    pub event: ContactEvent,
}

/// Direction of a swipe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Towards negative x.
    Left,
    /// Towards positive x.
    Right,
    /// Towards negative y.
    Up,
    /// Towards positive y.
    Down,
}

/// Atomic recognized motion, before any context resolution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Gesture {
    /// Short contact without significant movement.
    Tap {
        /// Where the contact lifted.
        position: Point,
    },
    /// Second tap close in time and space to a previous one.
    DoubleTap {
        /// Where the second contact lifted.
        position: Point,
    },
    /// Contact kept down without significant movement.
    Hold {
        /// Where the contact is held.
        position: Point,
        /// How long the contact had been down when the hold fired.
        duration_ms: u64,
    },
    /// Fast single-contact movement.
    Swipe {
        /// Dominant direction of the movement.
        direction: SwipeDirection,
        /// Distance between the down and up positions.
        distance: f64,
        /// Time between down and up.
        duration_ms: u64,
        /// Average velocity in pixels per millisecond.
        velocity: f64,
    },
    /// Two contacts moving towards each other.
    PinchIn {
        /// Current distance divided by the starting distance.
        scale: f64,
        /// Midpoint between the two contacts.
        center: Point,
    },
    /// Two contacts moving away from each other.
    PinchOut {
        /// Current distance divided by the starting distance.
        scale: f64,
        /// Midpoint between the two contacts.
        center: Point,
    },
    /// Two contacts rotating around each other.
    Rotate {
        /// Angle change since the second contact went down, in [-180, 180].
        rotation_degrees: f64,
        /// Midpoint between the two contacts.
        center: Point,
    },
}

/// Primitive gesture together with the element it happened on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrimitiveGesture {
    /// The recognized gesture.
    #[serde(flatten)]
    pub gesture: Gesture,
    /// Id of the element the originating contact started on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Semantic action resolved from a primitive gesture.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassifiedAction {
    /// Action name from the mapping tables.
    pub action: String,
    /// Gesture key the action was resolved from, for example `swipe_left`.
    pub gesture: String,
    /// Recognition certainty in [0, 1].
    pub confidence: f64,
    /// Context that was active during resolution.
    pub context: String,
    /// Element the gesture happened on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Recognizer clock time in milliseconds.
    pub timestamp_ms: u64,
    /// The primitive this action was resolved from.
    pub primitive: PrimitiveGesture,
}

/// Why a primitive gesture did not resolve to an action.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedReason {
    /// Confidence was below the configured threshold.
    LowConfidence,
    /// No element, context or default mapping exists for the gesture.
    NoMapping,
}

/// Notification about a primitive gesture that did not produce an action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnrecognizedGesture {
    /// Gesture key, for example `pinch_in`.
    pub gesture: String,
    /// Context that was active.
    pub context: String,
    /// Element the gesture happened on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Computed confidence.
    pub confidence: f64,
    /// Why resolution failed.
    pub reason: UnrecognizedReason,
}

/// Action triggered by a registered chain of gestures.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SequenceAction {
    /// Action name registered for the sequence.
    pub action: String,
    /// Gesture keys that matched, oldest first.
    pub sequence: Vec<String>,
    /// Always 1.0.
    pub confidence: f64,
    /// Context that was active when the sequence completed.
    pub context: String,
    /// Recognizer clock time in milliseconds.
    pub timestamp_ms: u64,
}

/// Output of the recognizer, in the order it was produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Event {
    /// A primitive gesture was recognized.
    PrimitiveGesture(PrimitiveGesture),
    /// A primitive gesture resolved to an action.
    ClassifiedAction(ClassifiedAction),
    /// A primitive gesture did not resolve to an action.
    UnrecognizedGesture(UnrecognizedGesture),
    /// A registered gesture sequence completed.
    SequenceAction(SequenceAction),
}

impl ContactEvent {
    /// Returns the id of the contact this event refers to.
    pub fn id(&self) -> ContactId {
        match self {
            ContactEvent::Down { id, .. }
            | ContactEvent::Move { id, .. }
            | ContactEvent::Up { id, .. }
            | ContactEvent::Cancel { id } => *id,
        }
    }
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl SwipeDirection {
    /// Returns the snake_case name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDirection {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(r#"invalid direction, can be "left", "right", "up" or "down""#),
        }
    }
}

impl Gesture {
    /// Returns the name of the gesture type, without direction.
    pub fn type_name(&self) -> &'static str {
        match self {
            Gesture::Tap { .. } => "tap",
            Gesture::DoubleTap { .. } => "double_tap",
            Gesture::Hold { .. } => "hold",
            Gesture::Swipe { .. } => "swipe",
            Gesture::PinchIn { .. } => "pinch_in",
            Gesture::PinchOut { .. } => "pinch_out",
            Gesture::Rotate { .. } => "rotate",
        }
    }

    /// Returns the key used for mapping lookups and sequences.
    ///
    /// This is the type name, with the direction appended for swipes, e.g. `swipe_left`.
    pub fn key(&self) -> String {
        match self {
            Gesture::Swipe { direction, .. } => format!("swipe_{direction}"),
            other => other.type_name().to_owned(),
        }
    }
}
