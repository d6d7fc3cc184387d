//! Feeding recorded contact streams through the recognizer.

use std::io::BufRead;
use std::time::Duration;

use anyhow::Context as _;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tapestry_config::Config;
use tapestry_ipc::TimedContactEvent;

use crate::recognizer::Recognizer;
use crate::scheduler::{LoopScheduler, Timeout, TimeoutHandler, VirtualScheduler};
use crate::sink::EventSink;

/// Reads JSON-lines contact events.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_events(reader: impl BufRead) -> anyhow::Result<Vec<TimedContactEvent>> {
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("error reading input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event = serde_json::from_str(line)
            .with_context(|| format!("error parsing contact event on line {}", idx + 1))?;
        events.push(event);
    }

    Ok(events)
}

/// Replays `events` on a virtual clock.
///
/// Timers due before an event fire before it, and timers still armed after the last event are
/// drained, so the output does not depend on wall-clock time.
pub fn replay(config: &Config, events: Vec<TimedContactEvent>, sink: Box<dyn EventSink>) {
    let _span = tracy_client::span!("replay");

    let clock = VirtualScheduler::new();
    let mut recognizer = Recognizer::new(config, Box::new(clock.clone()), sink);

    for timed in events {
        let at = Duration::from_millis(timed.at_ms);
        while let Some(timeout) = clock.advance(at) {
            recognizer.on_timeout(timeout);
        }
        recognizer.handle_contact_event(timed.event);
    }

    while let Some(deadline) = clock.next_deadline() {
        if let Some(timeout) = clock.advance(deadline) {
            recognizer.on_timeout(timeout);
        }
    }
}

struct ReplayState {
    recognizer: Recognizer,
    remaining: usize,
}

impl TimeoutHandler for ReplayState {
    fn handle_timeout(&mut self, timeout: Timeout) {
        self.recognizer.on_timeout(timeout);
    }
}

/// Replays `events` on a calloop event loop in real time.
pub fn replay_realtime(
    config: &Config,
    events: Vec<TimedContactEvent>,
    sink: Box<dyn EventSink>,
) -> anyhow::Result<()> {
    let mut event_loop: EventLoop<'static, ReplayState> =
        EventLoop::try_new().context("error creating event loop")?;
    let handle = event_loop.handle();

    let scheduler = LoopScheduler::new(handle.clone());
    let pending = scheduler.pending();

    let mut state = ReplayState {
        recognizer: Recognizer::new(config, Box::new(scheduler), sink),
        remaining: events.len(),
    };

    for timed in events {
        let mut event = Some(timed.event);
        let timer = Timer::from_duration(Duration::from_millis(timed.at_ms));
        handle
            .insert_source(timer, move |_, _, state| {
                if let Some(event) = event.take() {
                    state.recognizer.handle_contact_event(event);
                    state.remaining -= 1;
                }
                TimeoutAction::Drop
            })
            .map_err(|err| err.error)
            .context("error scheduling contact event")?;
    }

    while state.remaining > 0 || pending.count() > 0 {
        event_loop
            .dispatch(None, &mut state)
            .context("error dispatching event loop")?;
    }

    Ok(())
}
