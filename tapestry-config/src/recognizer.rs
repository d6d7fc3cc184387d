use std::time::Duration;

use crate::error::ValidationError;
use crate::utils::MergeWith;
use crate::FloatOrInt;

/// Thresholds and timeouts that drive primitive recognition and sequence matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum down-to-up distance of a swipe, in pixels.
    pub min_swipe_distance: f64,
    /// Minimum average velocity of a swipe, in pixels per millisecond.
    pub min_swipe_velocity: f64,
    /// Maximum movement that still counts as a tap, in pixels.
    pub max_tap_distance: f64,
    pub max_tap_duration_ms: u32,
    pub hold_duration_ms: u32,
    pub double_tap_interval_ms: u32,
    /// Minimum two-contact angle change that counts as a rotation, in degrees.
    pub rotation_threshold: f64,
    /// Minimum deviation of the two-contact distance ratio from 1 that counts as a pinch.
    pub pinch_threshold: f64,
    /// Classifications below this confidence are reported as unrecognized.
    pub confidence_threshold: f64,
    pub sequence_timeout_ms: u32,
    pub sequence_capacity: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_swipe_distance: 40.,
            min_swipe_velocity: 0.3,
            max_tap_distance: 10.,
            max_tap_duration_ms: 300,
            hold_duration_ms: 500,
            double_tap_interval_ms: 300,
            rotation_threshold: 15.,
            pinch_threshold: 0.1,
            confidence_threshold: 0.7,
            sequence_timeout_ms: 800,
            sequence_capacity: 5,
        }
    }
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq)]
pub struct ThresholdsPart {
    #[knuffel(child, unwrap(argument))]
    pub min_swipe_distance: Option<FloatOrInt<0, 65535>>,
    #[knuffel(child, unwrap(argument))]
    pub min_swipe_velocity: Option<FloatOrInt<0, 1000>>,
    #[knuffel(child, unwrap(argument))]
    pub max_tap_distance: Option<FloatOrInt<0, 65535>>,
    #[knuffel(child, unwrap(argument))]
    pub max_tap_duration_ms: Option<u32>,
    #[knuffel(child, unwrap(argument))]
    pub hold_duration_ms: Option<u32>,
    #[knuffel(child, unwrap(argument))]
    pub double_tap_interval_ms: Option<u32>,
    #[knuffel(child, unwrap(argument))]
    pub rotation_threshold: Option<FloatOrInt<0, 180>>,
    #[knuffel(child, unwrap(argument))]
    pub pinch_threshold: Option<FloatOrInt<0, 100>>,
    #[knuffel(child, unwrap(argument))]
    pub confidence_threshold: Option<FloatOrInt<0, 1>>,
    #[knuffel(child, unwrap(argument))]
    pub sequence_timeout_ms: Option<u32>,
    #[knuffel(child, unwrap(argument))]
    pub sequence_capacity: Option<usize>,
}

impl MergeWith<ThresholdsPart> for Thresholds {
    fn merge_with(&mut self, part: &ThresholdsPart) {
        merge!(
            (self, part),
            min_swipe_distance,
            min_swipe_velocity,
            max_tap_distance,
            rotation_threshold,
            pinch_threshold,
            confidence_threshold,
        );
        merge_clone!(
            (self, part),
            max_tap_duration_ms,
            hold_duration_ms,
            double_tap_interval_ms,
            sequence_timeout_ms,
            sequence_capacity,
        );
    }
}

impl Thresholds {
    /// Applies `part` if the result is valid, otherwise leaves `self` untouched.
    pub fn update(&mut self, part: &ThresholdsPart) -> Result<(), ValidationError> {
        let updated = self.merged_with(part);
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_negative = [
            ("min-swipe-distance", self.min_swipe_distance),
            ("min-swipe-velocity", self.min_swipe_velocity),
            ("max-tap-distance", self.max_tap_distance),
            ("rotation-threshold", self.rotation_threshold),
            ("pinch-threshold", self.pinch_threshold),
        ];
        for (option, value) in non_negative {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { option, value });
            }
            if value < 0. {
                return Err(ValidationError::Negative { option, value });
            }
        }

        if self.rotation_threshold > 180. {
            return Err(ValidationError::OutOfRange {
                option: "rotation-threshold",
                value: self.rotation_threshold,
                min: 0.,
                max: 180.,
            });
        }

        if !(0. ..=1.).contains(&self.confidence_threshold) {
            return Err(ValidationError::OutOfRange {
                option: "confidence-threshold",
                value: self.confidence_threshold,
                min: 0.,
                max: 1.,
            });
        }

        if self.hold_duration_ms == 0 {
            return Err(ValidationError::Zero {
                option: "hold-duration-ms",
            });
        }
        if self.sequence_timeout_ms == 0 {
            return Err(ValidationError::Zero {
                option: "sequence-timeout-ms",
            });
        }
        if self.sequence_capacity == 0 {
            return Err(ValidationError::Zero {
                option: "sequence-capacity",
            });
        }

        Ok(())
    }

    pub fn max_tap_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.max_tap_duration_ms))
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.hold_duration_ms))
    }

    pub fn double_tap_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.double_tap_interval_ms))
    }

    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.sequence_timeout_ms))
    }
}
