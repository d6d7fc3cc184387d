//! Geometric helpers for contact positions.

use std::time::Duration;

use tapestry_ipc::Point;

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Angle of the vector from `a` to `b` in degrees, in (-180, 180].
pub fn angle(a: Point, b: Point) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Average velocity in pixels per millisecond.
///
/// Durations below one millisecond are treated as one millisecond.
pub fn velocity(distance: f64, duration: Duration) -> f64 {
    let ms = duration.as_secs_f64() * 1000.;
    distance / ms.max(1.)
}

/// Wraps an angle difference into [-180, 180].
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.).rem_euclid(360.) - 180.;
    // rem_euclid maps +180 onto -180; keep the sign of the input for that one case.
    if wrapped == -180. && degrees > 0. {
        180.
    } else {
        wrapped
    }
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2., (a.y + b.y) / 2.)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn distance_and_angle() {
        let a = Point::new(0., 0.);
        let b = Point::new(3., 4.);
        assert_abs_diff_eq!(distance(a, b), 5.);
        assert_abs_diff_eq!(angle(a, Point::new(0., 10.)), 90.);
        assert_abs_diff_eq!(angle(a, Point::new(-10., 0.)), 180.);
        assert_abs_diff_eq!(midpoint(a, b).x, 1.5);
        assert_abs_diff_eq!(midpoint(a, b).y, 2.);
    }

    #[test]
    fn velocity_per_millisecond() {
        assert_abs_diff_eq!(velocity(100., Duration::from_millis(200)), 0.5);
        assert_abs_diff_eq!(velocity(10., Duration::ZERO), 10.);
        assert_abs_diff_eq!(velocity(10., Duration::from_micros(100)), 10.);
    }

    #[test]
    fn normalize() {
        assert_abs_diff_eq!(normalize_degrees(0.), 0.);
        assert_abs_diff_eq!(normalize_degrees(190.), -170.);
        assert_abs_diff_eq!(normalize_degrees(-190.), 170.);
        assert_abs_diff_eq!(normalize_degrees(180.), 180.);
        assert_abs_diff_eq!(normalize_degrees(-180.), -180.);
        assert_abs_diff_eq!(normalize_degrees(720. + 15.), 15.);
    }

    proptest! {
        #[test]
        fn normalized_degrees_stay_in_range(degrees in -10_000f64..10_000.) {
            let normalized = normalize_degrees(degrees);
            prop_assert!((-180. ..=180.).contains(&normalized));

            let turns = (degrees - normalized) / 360.;
            prop_assert!((turns - turns.round()).abs() < 1e-9);
        }

        #[test]
        fn distance_is_symmetric(
            ax in -1000f64..1000., ay in -1000f64..1000.,
            bx in -1000f64..1000., by in -1000f64..1000.,
        ) {
            let a = Point::new(ax, ay);
            let b = Point::new(bx, by);
            prop_assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
            prop_assert!(distance(a, b) >= 0.);
        }
    }
}
