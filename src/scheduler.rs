//! Cancellable timers for hold detection, the double-tap window and sequence resets.
//!
//! Recognition code never sleeps. It arms a timer through a [`Scheduler`], keeps the returned
//! [`TimerId`] next to the state the timer guards, and cancels it as soon as that state is
//! invalidated. When a timer fires, the owner of the recognizer receives a [`Timeout`] and hands
//! it back to [`Recognizer::on_timeout`](crate::recognizer::Recognizer::on_timeout), which checks
//! the id against the stored one before acting.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tapestry_ipc::ContactId;

use crate::utils::id::IdCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The contact has been down long enough to count as a hold.
    Hold(ContactId),
    /// A pending tap can no longer become a double tap.
    DoubleTapWindow,
    /// No primitive arrived within the sequence timeout.
    SequenceReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    pub id: TimerId,
    pub kind: TimerKind,
}

pub trait Scheduler {
    /// Current time on the scheduler clock.
    fn now(&self) -> Duration;

    /// Arms a one-shot timer that delivers a [`Timeout`] after `delay`.
    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId;

    /// Disarms a timer. Cancelling a timer that already fired is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// Receiver of fired timers.
pub trait TimeoutHandler {
    fn handle_timeout(&mut self, timeout: Timeout);
}

/// Scheduler backed by calloop timer sources.
///
/// Every timer is a separate [`Timer`] source; cancelling removes the source from the loop so
/// its callback can never run.
pub struct LoopScheduler<D: 'static> {
    event_loop: LoopHandle<'static, D>,
    start: Instant,
    ids: IdCounter,
    tokens: Rc<RefCell<HashMap<TimerId, RegistrationToken>>>,
}

impl<D: TimeoutHandler + 'static> LoopScheduler<D> {
    pub fn new(event_loop: LoopHandle<'static, D>) -> Self {
        Self {
            event_loop,
            start: Instant::now(),
            ids: IdCounter::new(),
            tokens: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Returns a handle that reports the number of armed timers.
    pub fn pending(&self) -> PendingTimers {
        PendingTimers(self.tokens.clone())
    }
}

/// Number of timers still armed on a [`LoopScheduler`].
#[derive(Clone)]
pub struct PendingTimers(Rc<RefCell<HashMap<TimerId, RegistrationToken>>>);

impl PendingTimers {
    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }
}

impl<D: TimeoutHandler + 'static> Scheduler for LoopScheduler<D> {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        let id = TimerId(self.ids.next());
        let tokens = self.tokens.clone();

        let timer = Timer::from_duration(delay);
        let res = self.event_loop.insert_source(timer, move |_, _, data| {
            if tokens.borrow_mut().remove(&id).is_none() {
                error!("fired timer {id:?} was not registered");
            }
            data.handle_timeout(Timeout { id, kind });
            TimeoutAction::Drop
        });

        match res {
            Ok(token) => {
                self.tokens.borrow_mut().insert(id, token);
            }
            Err(err) => {
                warn!("error arming {kind:?} timer: {}", err.error);
            }
        }

        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(token) = self.tokens.borrow_mut().remove(&id) {
            self.event_loop.remove(token);
        }
    }
}

/// Scheduler driven by an explicitly advanced clock.
///
/// Used for deterministic replays and tests. Clones share the same clock and timer queue, so
/// one clone can live inside the recognizer while another one advances time.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    now: Rc<Cell<Duration>>,
    ids: Rc<IdCounter>,
    pending: Rc<RefCell<BTreeMap<(Duration, TimerId), TimerKind>>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock towards `time`, stopping at the first timer due on the way.
    ///
    /// Returns that timer, removing it from the queue, or `None` once the clock has reached
    /// `time` with nothing left to fire. Call repeatedly until it returns `None`. The clock never
    /// moves backwards.
    pub fn advance(&self, time: Duration) -> Option<Timeout> {
        let mut pending = self.pending.borrow_mut();

        let due = pending
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
            .filter(|&deadline| deadline <= time);

        match due {
            Some(deadline) => {
                let ((_, id), kind) = pending.pop_first()?;
                self.now.set(self.now.get().max(deadline));
                Some(Timeout { id, kind })
            }
            None => {
                self.now.set(self.now.get().max(time));
                None
            }
        }
    }

    /// Deadline of the earliest armed timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .borrow()
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.pending.borrow().values().any(|k| *k == kind)
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        let id = TimerId(self.ids.next());
        let deadline = self.now.get() + delay;
        self.pending.borrow_mut().insert((deadline, id), kind);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.borrow_mut().retain(|(_, timer), _| *timer != id);
    }
}
