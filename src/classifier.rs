//! Resolution of primitive gestures into contextual actions.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tapestry_config::{Mappings, DEFAULT_CONTEXT};
use tapestry_ipc::{
    ClassifiedAction, Gesture, PrimitiveGesture, UnrecognizedGesture, UnrecognizedReason,
};

/// Swipe velocity that maps onto the lowest recognizable confidence.
const SWIPE_VELOCITY_FLOOR: f64 = 0.3;
/// Swipe velocity range over which confidence grows to 1.
const SWIPE_VELOCITY_SPAN: f64 = 1.7;
/// Scale deviation at which pinch confidence saturates.
const PINCH_SATURATION: f64 = 0.5;
/// Rotation at which rotate confidence saturates, in degrees.
const ROTATION_SATURATION: f64 = 90.;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Recognized(ClassifiedAction),
    Unrecognized(UnrecognizedGesture),
}

#[derive(Debug)]
pub struct Classifier {
    mappings: Rc<RefCell<Mappings>>,
    context: String,
    confidence_threshold: f64,
    last_action: Option<ClassifiedAction>,
}

impl Classifier {
    pub fn new(mappings: Rc<RefCell<Mappings>>, confidence_threshold: f64) -> Self {
        Self {
            mappings,
            context: String::from(DEFAULT_CONTEXT),
            confidence_threshold,
            last_action: None,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.context = context.into();
    }

    pub fn set_confidence_threshold(&mut self, threshold: f64) {
        self.confidence_threshold = threshold;
    }

    pub fn last_action(&self) -> Option<&ClassifiedAction> {
        self.last_action.as_ref()
    }

    pub fn classify(&mut self, primitive: &PrimitiveGesture, now: Duration) -> Classification {
        let _span = tracy_client::span!("Classifier::classify");

        let key = primitive.gesture.key();
        let confidence = confidence(&primitive.gesture);

        let unrecognized = |reason| {
            Classification::Unrecognized(UnrecognizedGesture {
                gesture: key.clone(),
                context: self.context.clone(),
                target: primitive.target.clone(),
                confidence,
                reason,
            })
        };

        if confidence < self.confidence_threshold {
            return unrecognized(UnrecognizedReason::LowConfidence);
        }

        let action = {
            let mappings = self.mappings.borrow();
            mappings
                .resolve(primitive.target.as_deref(), &self.context, &key)
                .map(String::from)
        };
        let Some(action) = action else {
            return unrecognized(UnrecognizedReason::NoMapping);
        };

        let classified = ClassifiedAction {
            action,
            gesture: key,
            confidence,
            context: self.context.clone(),
            target: primitive.target.clone(),
            timestamp_ms: now.as_millis() as u64,
            primitive: primitive.clone(),
        };
        self.last_action = Some(classified.clone());
        Classification::Recognized(classified)
    }
}

/// Recognition certainty of a primitive gesture, in [0, 1].
pub fn confidence(gesture: &Gesture) -> f64 {
    let confidence = match gesture {
        Gesture::Tap { .. } | Gesture::Hold { .. } => 0.95,
        Gesture::DoubleTap { .. } => 0.9,
        Gesture::Swipe { velocity, .. } => {
            0.7 + (velocity - SWIPE_VELOCITY_FLOOR) / SWIPE_VELOCITY_SPAN * 0.3
        }
        Gesture::PinchIn { scale, .. } | Gesture::PinchOut { scale, .. } => {
            0.7 + f64::min((scale - 1.).abs() / PINCH_SATURATION, 1.) * 0.3
        }
        Gesture::Rotate {
            rotation_degrees, ..
        } => 0.7 + f64::min(rotation_degrees.abs() / ROTATION_SATURATION, 1.) * 0.3,
    };

    if confidence.is_nan() {
        0.
    } else {
        confidence.clamp(0., 1.)
    }
}
