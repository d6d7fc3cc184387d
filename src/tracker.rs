//! Turns raw contact streams into primitive gestures.

use std::time::Duration;

use arrayvec::ArrayVec;
use tapestry_config::Thresholds;
use tapestry_ipc::{ContactId, Gesture, Point, PrimitiveGesture, SwipeDirection};

use crate::geometry::{angle, distance, midpoint, normalize_degrees, velocity};
use crate::scheduler::{Scheduler, TimerId, TimerKind};

/// One contact that is currently down.
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: ContactId,
    pub start: Point,
    pub current: Point,
    /// Input timestamp of the down event.
    pub start_time: Duration,
    pub target: Option<String>,
    /// Whether this contact already produced a hold.
    held: bool,
}

/// Span of time during which at least one contact is down.
#[derive(Debug, Clone, Copy, Default)]
struct Session {
    /// A second contact went down at some point during this session.
    multi: bool,
    /// Distance and angle between the first two contacts when there became exactly two.
    pair: Option<PairBaseline>,
}

#[derive(Debug, Clone, Copy)]
struct PairBaseline {
    distance: f64,
    angle: f64,
}

/// Tap that may still turn into a double tap.
#[derive(Debug, Clone, Copy)]
struct PendingTap {
    position: Point,
    /// Input timestamp of the lift.
    time: Duration,
    timer: TimerId,
}

#[derive(Debug)]
pub struct ContactTracker {
    thresholds: Thresholds,
    /// Active contacts in the order they went down.
    contacts: Vec<Contact>,
    session: Option<Session>,
    hold_timer: Option<(TimerId, ContactId)>,
    pending_tap: Option<PendingTap>,
}

impl ContactTracker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            contacts: Vec::new(),
            session: None,
            hold_timer: None,
            pending_tap: None,
        }
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_pending_tap(&self) -> bool {
        self.pending_tap.is_some()
    }

    pub fn contact_down(
        &mut self,
        scheduler: &mut dyn Scheduler,
        id: ContactId,
        position: Point,
        target: Option<String>,
        timestamp: Duration,
    ) {
        let _span = tracy_client::span!("ContactTracker::contact_down");

        if self.contact(id).is_some() {
            // Treat a repeated down as the old contact being lost.
            trace!("contact {id:?} went down twice, replacing it");
            self.contact_cancel(scheduler, id);
        }

        self.contacts.push(Contact {
            id,
            start: position,
            current: position,
            start_time: timestamp,
            target,
            held: false,
        });

        let session = self.session.get_or_insert_with(Session::default);
        match self.contacts.len() {
            1 => {
                let timer = scheduler.schedule(self.thresholds.hold_duration(), TimerKind::Hold(id));
                self.hold_timer = Some((timer, id));
            }
            2 => {
                session.multi = true;
                self.cancel_hold_timer(scheduler);
                self.clear_pending_tap(scheduler);
                self.update_pair_baseline();
            }
            _ => (),
        }
    }

    pub fn contact_move(
        &mut self,
        scheduler: &mut dyn Scheduler,
        id: ContactId,
        position: Point,
    ) -> ArrayVec<PrimitiveGesture, 2> {
        let _span = tracy_client::span!("ContactTracker::contact_move");

        let mut rv = ArrayVec::new();

        let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) else {
            trace!("ignoring move of unknown contact {id:?}");
            return rv;
        };

        contact.current = position;

        if distance(contact.start, position) > self.thresholds.max_tap_distance
            && matches!(self.hold_timer, Some((_, holder)) if holder == id)
        {
            self.cancel_hold_timer(scheduler);
        }

        if self.contacts.len() != 2 {
            return rv;
        }

        let Some(baseline) = self.session.and_then(|s| s.pair) else {
            return rv;
        };

        let (a, b) = (self.contacts[0].current, self.contacts[1].current);
        let center = midpoint(a, b);
        let target = self.contacts[0].target.clone();

        if baseline.distance > 0. {
            let scale = distance(a, b) / baseline.distance;
            if (scale - 1.).abs() > self.thresholds.pinch_threshold {
                let gesture = if scale < 1. {
                    Gesture::PinchIn { scale, center }
                } else {
                    Gesture::PinchOut { scale, center }
                };
                rv.push(PrimitiveGesture {
                    gesture,
                    target: target.clone(),
                });
            }
        }

        let rotation_degrees = normalize_degrees(angle(a, b) - baseline.angle);
        if rotation_degrees.abs() > self.thresholds.rotation_threshold {
            rv.push(PrimitiveGesture {
                gesture: Gesture::Rotate {
                    rotation_degrees,
                    center,
                },
                target,
            });
        }

        if !rv.is_empty() {
            self.clear_pending_tap(scheduler);
        }

        rv
    }

    pub fn contact_up(
        &mut self,
        scheduler: &mut dyn Scheduler,
        id: ContactId,
        position: Point,
        timestamp: Duration,
    ) -> Option<PrimitiveGesture> {
        let _span = tracy_client::span!("ContactTracker::contact_up");

        let Some(idx) = self.contacts.iter().position(|c| c.id == id) else {
            trace!("ignoring lift of unknown contact {id:?}");
            return None;
        };

        let mut contact = self.contacts.remove(idx);
        contact.current = position;

        if matches!(self.hold_timer, Some((_, holder)) if holder == id) {
            self.cancel_hold_timer(scheduler);
        }

        let multi = self.session.is_some_and(|s| s.multi);
        let gesture = if multi || contact.held {
            None
        } else {
            self.single_contact_lift(scheduler, &contact, timestamp)
        };

        self.contacts_changed();
        gesture
    }

    pub fn contact_cancel(&mut self, scheduler: &mut dyn Scheduler, id: ContactId) {
        let Some(idx) = self.contacts.iter().position(|c| c.id == id) else {
            trace!("ignoring cancel of unknown contact {id:?}");
            return;
        };

        self.contacts.remove(idx);
        if matches!(self.hold_timer, Some((_, holder)) if holder == id) {
            self.cancel_hold_timer(scheduler);
        }
        self.clear_pending_tap(scheduler);

        self.contacts_changed();
    }

    pub fn on_hold_timeout(
        &mut self,
        scheduler: &mut dyn Scheduler,
        timer: TimerId,
    ) -> Option<PrimitiveGesture> {
        let Some((armed, id)) = self.hold_timer else {
            trace!("ignoring stale hold timer {timer:?}");
            return None;
        };
        if armed != timer {
            trace!("ignoring stale hold timer {timer:?}");
            return None;
        }
        self.hold_timer = None;

        if self.session.is_some_and(|s| s.multi) {
            return None;
        }

        let max_tap_distance = self.thresholds.max_tap_distance;
        let contact = self.contacts.iter_mut().find(|c| c.id == id)?;
        if distance(contact.start, contact.current) > max_tap_distance {
            return None;
        }

        contact.held = true;
        let primitive = PrimitiveGesture {
            gesture: Gesture::Hold {
                position: contact.current,
                duration_ms: u64::from(self.thresholds.hold_duration_ms),
            },
            target: contact.target.clone(),
        };

        self.clear_pending_tap(scheduler);
        Some(primitive)
    }

    pub fn on_double_tap_window_timeout(&mut self, timer: TimerId) {
        match self.pending_tap {
            Some(pending) if pending.timer == timer => self.pending_tap = None,
            _ => trace!("ignoring stale double tap timer {timer:?}"),
        }
    }

    /// Forgets all contacts and cancels every armed timer.
    pub fn reset(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_hold_timer(scheduler);
        self.clear_pending_tap(scheduler);
        self.contacts.clear();
        self.session = None;
    }

    fn contact(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    fn single_contact_lift(
        &mut self,
        scheduler: &mut dyn Scheduler,
        contact: &Contact,
        timestamp: Duration,
    ) -> Option<PrimitiveGesture> {
        let thresholds = &self.thresholds;

        let displacement = distance(contact.start, contact.current);
        let duration = timestamp.saturating_sub(contact.start_time);
        let velocity = velocity(displacement, duration);
        let target = contact.target.clone();

        if displacement < thresholds.max_tap_distance && duration < thresholds.max_tap_duration() {
            let position = contact.current;

            let is_double = self.pending_tap.is_some_and(|pending| {
                timestamp.saturating_sub(pending.time) < thresholds.double_tap_interval()
                    && distance(pending.position, position) <= thresholds.max_tap_distance
            });

            if is_double {
                self.clear_pending_tap(scheduler);
                return Some(PrimitiveGesture {
                    gesture: Gesture::DoubleTap { position },
                    target,
                });
            }

            // A new tap replaces the one still waiting for its second half.
            self.clear_pending_tap(scheduler);
            let timer = scheduler.schedule(
                self.thresholds.double_tap_interval(),
                TimerKind::DoubleTapWindow,
            );
            self.pending_tap = Some(PendingTap {
                position,
                time: timestamp,
                timer,
            });

            return Some(PrimitiveGesture {
                gesture: Gesture::Tap { position },
                target,
            });
        }

        if displacement > thresholds.min_swipe_distance && velocity > thresholds.min_swipe_velocity
        {
            let direction = swipe_direction(contact.start, contact.current);
            self.clear_pending_tap(scheduler);
            return Some(PrimitiveGesture {
                gesture: Gesture::Swipe {
                    direction,
                    distance: displacement,
                    duration_ms: duration.as_millis() as u64,
                    velocity,
                },
                target,
            });
        }

        None
    }

    fn contacts_changed(&mut self) {
        match self.contacts.len() {
            0 => self.session = None,
            2 => self.update_pair_baseline(),
            _ => (),
        }
    }

    fn update_pair_baseline(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };

        let (a, b) = (self.contacts[0].current, self.contacts[1].current);
        session.pair = Some(PairBaseline {
            distance: distance(a, b),
            angle: angle(a, b),
        });
    }

    fn cancel_hold_timer(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some((timer, _)) = self.hold_timer.take() {
            scheduler.cancel(timer);
        }
    }

    fn clear_pending_tap(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(pending) = self.pending_tap.take() {
            scheduler.cancel(pending.timer);
        }
    }
}

/// Dominant direction of the movement from `start` to `end` in screen coordinates.
///
/// Horizontal wins when both axes moved the same amount.
pub fn swipe_direction(start: Point, end: Point) -> SwipeDirection {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    if dx.abs() >= dy.abs() {
        if dx > 0. {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    } else if dy > 0. {
        SwipeDirection::Down
    } else {
        SwipeDirection::Up
    }
}
