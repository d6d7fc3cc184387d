use approx::assert_abs_diff_eq;
use tapestry_config::{
    ActionTable, Config, FloatOrInt, GestureKey, MappingsPart, Thresholds, ThresholdsPart,
    ValidationError,
};
use tapestry_ipc::{
    ClassifiedAction, Event, PrimitiveGesture, SequenceAction, UnrecognizedReason,
};

use super::fixture::EventLog;
use super::*;
use crate::sink::EventSink;

fn tap_on(f: &mut Fixture, at: u64, target: Option<&str>) {
    f.advance_to(at);
    match target {
        Some(target) => f.down_on(1, 0., 0., target),
        None => f.down(1, 0., 0.),
    }
    f.advance_to(at + 50);
    f.up(1, 0., 0.);
}

#[test]
fn element_beats_context_beats_default() {
    let mut f = Fixture::with_kdl(
        r#"
        actions {
            tap "select"
        }
        context "editor" {
            tap "place-cursor"
        }
        element "save" {
            tap "file.save"
        }
        "#,
    );

    tap_on(&mut f, 0, None);
    f.recognizer.set_context("editor");
    tap_on(&mut f, 1000, None);
    tap_on(&mut f, 2000, Some("save"));
    tap_on(&mut f, 3000, Some("other"));
    f.recognizer.set_context("viewer");
    tap_on(&mut f, 4000, None);

    assert_eq!(
        f.actions(),
        ["select", "place-cursor", "file.save", "place-cursor", "select"]
    );

    let contexts: Vec<_> = f
        .log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::ClassifiedAction(action) => Some((action.context, action.target)),
            _ => None,
        })
        .collect();
    assert_eq!(contexts[2], (String::from("editor"), Some(String::from("save"))));
    assert_eq!(contexts[4], (String::from("viewer"), None));
}

#[test]
fn initial_context_comes_from_config() {
    let f = Fixture::with_kdl(r#"initial-context "editor""#);
    assert_eq!(f.recognizer.context(), "editor");

    let f = Fixture::new();
    assert_eq!(f.recognizer.context(), "default");
}

#[test]
fn slow_swipe_is_low_confidence() {
    let mut f = Fixture::with_kdl(
        r#"
        recognizer {
            min-swipe-velocity 0.1
        }
        actions {
            swipe-right "next"
        }
        "#,
    );

    // 0.2 px/ms.
    f.drag(0, 60., 0., 300);
    // 1.2 px/ms.
    f.drag(1000, 120., 0., 100);

    assert_eq!(f.primitives(), ["swipe_right", "swipe_right"]);
    assert_eq!(f.actions(), ["next"]);

    let unrecognized = f.unrecognized();
    assert_eq!(unrecognized.len(), 1);
    assert_eq!(unrecognized[0].reason, UnrecognizedReason::LowConfidence);
    assert_abs_diff_eq!(unrecognized[0].confidence, 0.7 - 0.1 / 1.7 * 0.3, epsilon = 1e-9);
}

#[test]
fn unmapped_gesture_is_reported() {
    let mut f = Fixture::with_kdl("");
    f.tap_at(0, 10., 10.);

    let unrecognized = f.unrecognized();
    assert_eq!(unrecognized.len(), 1);
    assert_eq!(unrecognized[0].gesture, "tap");
    assert_eq!(unrecognized[0].reason, UnrecognizedReason::NoMapping);
    assert!(f.recognizer.last_action().is_none());
}

#[test]
fn unrecognized_gestures_still_form_sequences() {
    let mut f = Fixture::with_kdl(
        r#"
        sequences {
            sequence "swipe-left" "swipe-right" action="undo"
        }
        "#,
    );

    f.drag(0, -80., 0., 100);
    f.drag(200, 80., 0., 100);

    assert_eq!(f.unrecognized().len(), 2);
    assert_eq!(f.actions(), ["sequence undo"]);
}

#[test]
fn mapping_updates_apply_immediately() {
    let mut f = Fixture::new();
    tap_on(&mut f, 0, None);

    let defaults: ActionTable = [("tap".parse::<GestureKey>().unwrap(), String::from("activate"))]
        .into_iter()
        .collect();
    f.recognizer.update_mappings(&MappingsPart {
        defaults: Some(defaults),
        ..Default::default()
    });
    tap_on(&mut f, 1000, None);

    assert_eq!(f.actions(), ["select", "activate"]);
    assert_eq!(
        f.recognizer.mappings().borrow().defaults.get("hold"),
        Some("menu.context")
    );
    assert_eq!(
        f.recognizer.last_action().map(|action| action.action.as_str()),
        Some("activate")
    );
}

#[test]
fn invalid_threshold_update_is_rejected() {
    let mut f = Fixture::new();

    let err = f
        .recognizer
        .update_thresholds(&ThresholdsPart {
            max_tap_distance: Some(FloatOrInt(-1.)),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::Negative {
            option: "max-tap-distance",
            value: -1.,
        }
    );
    assert_eq!(*f.recognizer.thresholds(), Thresholds::default());

    f.recognizer
        .update_thresholds(&ThresholdsPart {
            max_tap_distance: Some(FloatOrInt(20.)),
            ..Default::default()
        })
        .unwrap();
    f.drag(0, 15., 0., 100);
    assert_eq!(f.primitives(), ["tap"]);
}

#[test]
fn confidence_threshold_update_reaches_classifier() {
    let mut f = Fixture::new();
    f.recognizer
        .update_thresholds(&ThresholdsPart {
            confidence_threshold: Some(FloatOrInt(0.96)),
            ..Default::default()
        })
        .unwrap();

    f.tap_at(0, 0., 0.);
    assert!(f.actions().is_empty());
    assert_eq!(f.unrecognized()[0].reason, UnrecognizedReason::LowConfidence);
}

struct Flaky(EventLog);

impl EventSink for Flaky {
    fn on_primitive_gesture(&mut self, primitive: &PrimitiveGesture) -> anyhow::Result<()> {
        self.0.on_primitive_gesture(primitive)?;
        anyhow::bail!("primitive consumer went away")
    }

    fn on_classified_action(&mut self, _action: &ClassifiedAction) -> anyhow::Result<()> {
        anyhow::bail!("action consumer went away")
    }

    fn on_sequence_action(&mut self, action: &SequenceAction) -> anyhow::Result<()> {
        self.0.on_sequence_action(action)
    }
}

#[test]
fn sink_errors_do_not_stop_recognition() {
    let mut f = Fixture::with_sink(Config::default(), EventLog::default(), |log| {
        Box::new(Flaky(log))
    });

    f.drag(0, -80., 0., 100);
    f.drag(200, 80., 0., 100);

    assert_eq!(f.primitives(), ["swipe_left", "swipe_right"]);
    assert_eq!(f.actions(), ["sequence edit.undo"]);
}

#[test]
fn identical_input_gives_identical_output() {
    let run = || {
        let mut f = Fixture::new();
        f.tap_at(0, 10., 10.);
        f.tap_at(100, 12., 10.);
        f.drag(400, -80., 5., 120);
        f.down(1, 0., 0.);
        f.down(2, 100., 0.);
        f.move_to(2, 0., 150.);
        f.up(2, 0., 150.);
        f.up(1, 0., 0.);
        f.drain();
        f.log.events()
    };

    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}

#[test]
fn reset_drops_contacts_and_sequence() {
    let mut f = Fixture::new();

    f.drag(0, -80., 0., 100);
    f.advance_to(150);
    f.down(1, 0., 0.);
    f.recognizer.reset();
    assert_eq!(f.clock.pending_count(), 0);

    f.advance_to(160);
    f.up(1, 0., 0.);
    // Would complete swipe-left swipe-right without the reset.
    f.drag(200, 80., 0., 100);
    f.advance_to(2000);

    assert_eq!(f.primitives(), ["swipe_left", "swipe_right"]);
    assert_eq!(f.actions(), ["navigate.back", "navigate.forward"]);
}
