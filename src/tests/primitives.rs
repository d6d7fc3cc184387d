use tapestry_ipc::{Event, Gesture, Point};

use super::*;

#[test]
fn tap_and_swipe_boundaries() {
    let cases: &[(f64, u64, &[&str])] = &[
        (9.9, 100, &["tap"]),
        (10., 100, &[]),
        (5., 299, &["tap"]),
        (5., 300, &[]),
        (40., 50, &[]),
        (41., 50, &["swipe_right"]),
        (-41., 50, &["swipe_left"]),
    ];

    for &(dx, duration, expected) in cases {
        let mut f = Fixture::new();
        f.drag(0, dx, 0., duration);
        assert_eq!(f.primitives(), expected, "dx {dx}, duration {duration}");
    }
}

#[test]
fn slow_long_drag_is_nothing() {
    let mut f = Fixture::new();
    f.down(1, 100., 100.);
    f.advance_to(100);
    f.move_to(1, 150., 100.);
    f.advance_to(1000);
    f.up(1, 200., 100.);
    f.drain();

    assert!(f.primitives().is_empty());
}

#[test]
fn vertical_swipes() {
    let mut f = Fixture::new();
    f.drag(0, 10., 80., 100);
    f.drag(1000, -5., -80., 100);
    assert_eq!(f.primitives(), ["swipe_down", "swipe_up"]);
    assert_eq!(f.actions(), ["scroll.down", "scroll.up"]);
}

#[test]
fn double_tap_just_inside_window() {
    let mut f = Fixture::new();
    f.tap_at(0, 50., 50.);

    f.advance_to(250);
    f.down(1, 52., 50.);
    f.advance_to(349);
    f.up(1, 52., 50.);

    assert_eq!(f.primitives(), ["tap", "double_tap"]);
    assert_eq!(f.actions(), ["select", "zoom.toggle"]);
}

#[test]
fn double_tap_just_outside_window() {
    let mut f = Fixture::new();
    f.tap_at(0, 50., 50.);

    f.advance_to(250);
    f.down(1, 52., 50.);
    f.advance_to(351);
    f.up(1, 52., 50.);

    assert_eq!(f.primitives(), ["tap", "tap"]);
}

#[test]
fn taps_far_apart_are_not_double_tap() {
    let mut f = Fixture::new();
    f.tap_at(0, 0., 0.);
    f.tap_at(100, 100., 100.);
    assert_eq!(f.primitives(), ["tap", "tap"]);
}

#[test]
fn third_tap_starts_over() {
    let mut f = Fixture::new();
    f.tap_at(0, 0., 0.);
    f.tap_at(100, 0., 0.);
    f.tap_at(200, 0., 0.);
    assert_eq!(f.primitives(), ["tap", "double_tap", "tap"]);
}

#[test]
fn two_contact_touch_forgets_pending_tap() {
    let mut f = Fixture::new();
    f.tap_at(0, 50., 50.);

    f.advance_to(80);
    f.down(1, 50., 50.);
    f.down(2, 150., 50.);
    f.advance_to(120);
    f.up(2, 150., 50.);
    f.up(1, 50., 50.);

    f.tap_at(150, 50., 50.);
    assert_eq!(f.primitives(), ["tap", "tap"]);
}

#[test]
fn cancelled_contact_forgets_pending_tap() {
    let mut f = Fixture::new();
    f.tap_at(0, 50., 50.);

    f.advance_to(80);
    f.down(1, 50., 50.);
    f.cancel(1);

    f.tap_at(150, 50., 50.);
    assert_eq!(f.primitives(), ["tap", "tap"]);
}

#[test]
fn swipe_forgets_pending_tap() {
    let mut f = Fixture::new();
    f.tap_at(0, 100., 100.);
    f.drag(60, 80., 0., 60);
    f.tap_at(130, 100., 100.);
    assert_eq!(f.primitives(), ["tap", "swipe_right", "tap"]);
}

#[test]
fn hold_fires_after_duration() {
    let mut f = Fixture::new();
    f.down(1, 10., 10.);

    f.advance_to(499);
    assert!(f.primitives().is_empty());

    f.advance_to(500);
    assert_eq!(
        f.log.events()[0],
        Event::PrimitiveGesture(tapestry_ipc::PrimitiveGesture {
            gesture: Gesture::Hold {
                position: Point::new(10., 10.),
                duration_ms: 500,
            },
            target: None,
        })
    );

    f.advance_to(600);
    f.up(1, 10., 10.);
    assert_eq!(f.primitives(), ["hold"]);
    assert_eq!(f.actions(), ["menu.context"]);
}

#[test]
fn hold_does_not_become_tap() {
    let mut f = Fixture::with_kdl("recognizer { max-tap-duration-ms 2000; }");
    f.down(1, 10., 10.);
    f.advance_to(700);
    f.up(1, 10., 10.);
    assert_eq!(f.primitives(), ["hold"]);
}

#[test]
fn movement_cancels_hold() {
    let mut f = Fixture::new();
    f.down(1, 10., 10.);
    f.advance_to(100);
    f.move_to(1, 21., 10.);
    f.move_to(1, 10., 10.);
    f.advance_to(1000);
    f.up(1, 10., 10.);
    assert!(f.primitives().is_empty());
}

#[test]
fn jitter_keeps_hold() {
    let mut f = Fixture::new();
    f.down(1, 10., 10.);
    f.advance_to(100);
    f.move_to(1, 15., 10.);
    f.advance_to(500);

    let Event::PrimitiveGesture(hold) = &f.log.events()[0] else {
        panic!("expected a primitive");
    };
    assert!(matches!(
        hold.gesture,
        Gesture::Hold { position, .. } if position == Point::new(15., 10.)
    ));
}

#[test]
fn pinch_out_resolves_to_zoom_in() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.advance_to(50);
    f.move_to(2, 200., 0.);
    f.up(2, 200., 0.);
    f.up(1, 0., 0.);

    assert_eq!(f.primitives(), ["pinch_out"]);
    assert_eq!(f.actions(), ["zoom.in"]);
}

#[test]
fn rotate_resolves_to_view_rotate() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.move_to(2, 0., 100.);

    assert_eq!(f.primitives(), ["rotate"]);
    assert_eq!(f.actions(), ["view.rotate"]);
}

#[test]
fn pinch_and_rotate_from_one_sample() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.move_to(2, 0., 200.);

    assert_eq!(f.primitives(), ["pinch_out", "rotate"]);
    assert_eq!(f.actions(), ["zoom.in", "view.rotate"]);
}

#[test]
fn pinch_repeats_while_past_threshold() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.move_to(2, 80., 0.);
    f.move_to(2, 60., 0.);
    f.move_to(2, 95., 0.);

    assert_eq!(f.primitives(), ["pinch_in", "pinch_in"]);
}

#[test]
fn two_contacts_never_tap_or_swipe() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 500., 500.);
    f.advance_to(50);
    f.up(2, 600., 500.);
    f.up(1, 0., 0.);
    f.drain();

    assert!(f.primitives().is_empty());
}

#[test]
fn lifting_third_contact_resets_pair_baseline() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.down(3, 300., 300.);

    f.move_to(2, 200., 0.);
    assert!(f.primitives().is_empty());

    f.up(3, 300., 300.);
    f.move_to(2, 210., 0.);
    assert!(f.primitives().is_empty());

    f.move_to(2, 100., 0.);
    assert_eq!(f.primitives(), ["pinch_in"]);
}

#[test]
fn cancelled_contact_emits_nothing() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.cancel(1);
    f.advance_to(1000);
    f.up(1, 0., 0.);
    f.drain();

    assert!(f.log.events().is_empty());
}

#[test]
fn unknown_contacts_are_ignored() {
    let mut f = Fixture::new();
    f.move_to(9, 1., 1.);
    f.up(9, 1., 1.);
    f.cancel(9);
    f.drain();

    assert!(f.log.events().is_empty());
}

#[test]
fn cancel_during_pinch_keeps_session_multi() {
    let mut f = Fixture::new();
    f.down(1, 0., 0.);
    f.down(2, 100., 0.);
    f.cancel(2);
    f.move_to(1, 200., 0.);
    f.advance_to(50);
    f.up(1, 200., 0.);

    assert!(f.primitives().is_empty());
}
