//! Matching of short-lived chains of primitive gestures.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tapestry_config::{join_keys, Thresholds, SEQUENCE_DELIMITER};
use tapestry_ipc::SequenceAction;

use crate::scheduler::{Scheduler, TimerId, TimerKind};

#[derive(Debug)]
pub struct SequenceMatcher {
    /// Most recent gesture keys, oldest first.
    buffer: VecDeque<String>,
    capacity: usize,
    timeout: Duration,
    reset_timer: Option<TimerId>,
    /// Comma-joined gesture keys to action.
    sequences: BTreeMap<String, String>,
}

impl SequenceMatcher {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            buffer: VecDeque::new(),
            capacity: thresholds.sequence_capacity,
            timeout: thresholds.sequence_timeout(),
            reset_timer: None,
            sequences: BTreeMap::new(),
        }
    }

    pub fn set_limits(&mut self, thresholds: &Thresholds) {
        self.capacity = thresholds.sequence_capacity;
        self.timeout = thresholds.sequence_timeout();
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }

        for sequence in self.sequences.keys() {
            if sequence_len(sequence) > self.capacity {
                warn!(
                    "sequence {sequence} can no longer match with capacity {}",
                    self.capacity
                );
            }
        }
    }

    /// Registers `action` for the comma-joined `sequence`, replacing an existing registration.
    ///
    /// Returns `false` and registers nothing if the sequence cannot fit in the buffer.
    pub fn register(&mut self, sequence: impl Into<String>, action: impl Into<String>) -> bool {
        let sequence = sequence.into();
        if sequence_len(&sequence) > self.capacity {
            warn!(
                "ignoring sequence {sequence}: longer than capacity {}",
                self.capacity
            );
            return false;
        }

        self.sequences.insert(sequence, action.into());
        true
    }

    pub fn unregister(&mut self, sequence: &str) -> Option<String> {
        self.sequences.remove(sequence)
    }

    pub fn buffer(&self) -> impl Iterator<Item = &str> + '_ {
        self.buffer.iter().map(String::as_str)
    }

    /// Appends a gesture key and checks the buffer against the registered sequences.
    pub fn push(
        &mut self,
        scheduler: &mut dyn Scheduler,
        key: String,
        context: &str,
        now: Duration,
    ) -> Option<SequenceAction> {
        let _span = tracy_client::span!("SequenceMatcher::push");

        self.buffer.push_back(key);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }

        self.cancel_reset_timer(scheduler);
        self.reset_timer = Some(scheduler.schedule(self.timeout, TimerKind::SequenceReset));

        if self.buffer.len() < 2 {
            return None;
        }

        let joined = join_keys(self.buffer.iter().map(String::as_str));
        if let Some(action) = self.sequences.get(&joined) {
            let action = SequenceAction {
                action: action.clone(),
                sequence: self.buffer.iter().cloned().collect(),
                confidence: 1.,
                context: String::from(context),
                timestamp_ms: now.as_millis() as u64,
            };
            self.clear(scheduler);
            return Some(action);
        }

        if self.is_partial_match(&joined) {
            debug!("partial gesture sequence: {joined}");
        }

        None
    }

    pub fn on_reset_timeout(&mut self, timer: TimerId) {
        if self.reset_timer != Some(timer) {
            trace!("ignoring stale sequence reset timer {timer:?}");
            return;
        }

        self.reset_timer = None;
        self.buffer.clear();
    }

    pub fn clear(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_reset_timer(scheduler);
        self.buffer.clear();
    }

    fn is_partial_match(&self, joined: &str) -> bool {
        self.sequences.keys().any(|seq| {
            seq.len() > joined.len()
                && seq.starts_with(joined)
                && seq[joined.len()..].starts_with(',')
        })
    }

    fn cancel_reset_timer(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(timer) = self.reset_timer.take() {
            scheduler.cancel(timer);
        }
    }
}

fn sequence_len(sequence: &str) -> usize {
    sequence.split(SEQUENCE_DELIMITER).count()
}
