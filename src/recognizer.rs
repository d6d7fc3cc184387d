use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tapestry_config::{
    join_keys, Config, GestureKey, Mappings, MappingsPart, MergeWith, Sequence, Thresholds,
    ThresholdsPart, ValidationError,
};
use tapestry_ipc::{ClassifiedAction, ContactEvent, ContactId, Point, PrimitiveGesture};

use crate::classifier::{Classification, Classifier};
use crate::scheduler::{Scheduler, Timeout, TimeoutHandler, TimerKind};
use crate::sequence::SequenceMatcher;
use crate::sink::EventSink;
use crate::tracker::ContactTracker;

/// Full recognition pipeline: contacts in, primitives, actions and sequence actions out.
///
/// Every primitive the tracker produces is delivered to the sink first, then classified, then
/// fed to the sequence matcher. All outputs of one input are delivered before the call returns.
pub struct Recognizer {
    tracker: ContactTracker,
    classifier: Classifier,
    matcher: SequenceMatcher,
    mappings: Rc<RefCell<Mappings>>,
    thresholds: Thresholds,
    scheduler: Box<dyn Scheduler>,
    sink: Box<dyn EventSink>,
}

impl Recognizer {
    pub fn new(config: &Config, scheduler: Box<dyn Scheduler>, sink: Box<dyn EventSink>) -> Self {
        let thresholds = config.recognizer;
        let mappings = Rc::new(RefCell::new(config.mappings.clone()));

        let mut classifier = Classifier::new(mappings.clone(), thresholds.confidence_threshold);
        classifier.set_context(config.initial_context.clone());

        let mut matcher = SequenceMatcher::new(&thresholds);
        for sequence in &config.sequences.0 {
            matcher.register(sequence.key(), sequence.action.clone());
        }

        Self {
            tracker: ContactTracker::new(thresholds),
            classifier,
            matcher,
            mappings,
            thresholds,
            scheduler,
            sink,
        }
    }

    pub fn contact_down(
        &mut self,
        id: ContactId,
        x: f64,
        y: f64,
        target: Option<String>,
        timestamp_ms: u64,
    ) {
        self.tracker.contact_down(
            self.scheduler.as_mut(),
            id,
            Point::new(x, y),
            target,
            Duration::from_millis(timestamp_ms),
        );
    }

    pub fn contact_move(&mut self, id: ContactId, x: f64, y: f64) {
        let primitives = self
            .tracker
            .contact_move(self.scheduler.as_mut(), id, Point::new(x, y));
        for primitive in primitives {
            self.dispatch(primitive);
        }
    }

    pub fn contact_up(&mut self, id: ContactId, x: f64, y: f64, timestamp_ms: u64) {
        let primitive = self.tracker.contact_up(
            self.scheduler.as_mut(),
            id,
            Point::new(x, y),
            Duration::from_millis(timestamp_ms),
        );
        if let Some(primitive) = primitive {
            self.dispatch(primitive);
        }
    }

    pub fn contact_cancel(&mut self, id: ContactId) {
        self.tracker.contact_cancel(self.scheduler.as_mut(), id);
    }

    pub fn handle_contact_event(&mut self, event: ContactEvent) {
        match event {
            ContactEvent::Down {
                id,
                x,
                y,
                target,
                timestamp_ms,
            } => self.contact_down(id, x, y, target, timestamp_ms),
            ContactEvent::Move { id, x, y } => self.contact_move(id, x, y),
            ContactEvent::Up {
                id,
                x,
                y,
                timestamp_ms,
            } => self.contact_up(id, x, y, timestamp_ms),
            ContactEvent::Cancel { id } => self.contact_cancel(id),
        }
    }

    /// Delivers a fired timer.
    pub fn on_timeout(&mut self, timeout: Timeout) {
        let _span = tracy_client::span!("Recognizer::on_timeout");

        match timeout.kind {
            TimerKind::Hold(_) => {
                let primitive = self
                    .tracker
                    .on_hold_timeout(self.scheduler.as_mut(), timeout.id);
                if let Some(primitive) = primitive {
                    self.dispatch(primitive);
                }
            }
            TimerKind::DoubleTapWindow => self.tracker.on_double_tap_window_timeout(timeout.id),
            TimerKind::SequenceReset => self.matcher.on_reset_timeout(timeout.id),
        }
    }

    pub fn context(&self) -> &str {
        self.classifier.context()
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        let context = context.into();
        debug!("switching to context {context:?}");
        self.classifier.set_context(context);
    }

    pub fn last_action(&self) -> Option<&ClassifiedAction> {
        self.classifier.last_action()
    }

    /// Returns the mapping tables shared with the classifier.
    pub fn mappings(&self) -> Rc<RefCell<Mappings>> {
        self.mappings.clone()
    }

    pub fn update_mappings(&mut self, part: &MappingsPart) {
        self.mappings.borrow_mut().merge_with(part);
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Applies a partial threshold update; an invalid update changes nothing.
    pub fn update_thresholds(&mut self, part: &ThresholdsPart) -> Result<(), ValidationError> {
        self.thresholds.update(part)?;

        self.tracker.set_thresholds(self.thresholds);
        self.classifier
            .set_confidence_threshold(self.thresholds.confidence_threshold);
        self.matcher.set_limits(&self.thresholds);
        Ok(())
    }

    /// Registers a sequence; returns `false` if it is longer than the sequence capacity.
    pub fn register_sequence(&mut self, sequence: &Sequence) -> bool {
        self.matcher.register(sequence.key(), sequence.action.clone())
    }

    pub fn unregister_sequence(&mut self, gestures: &[GestureKey]) -> Option<String> {
        let key = join_keys(gestures.iter().map(GestureKey::as_str));
        self.matcher.unregister(&key)
    }

    /// Drops all contacts, the pending tap and the sequence buffer, cancelling their timers.
    pub fn reset(&mut self) {
        self.tracker.reset(self.scheduler.as_mut());
        self.matcher.clear(self.scheduler.as_mut());
    }

    fn dispatch(&mut self, primitive: PrimitiveGesture) {
        let _span = tracy_client::span!("Recognizer::dispatch");

        debug!("recognized {}", primitive.gesture.key());
        if let Err(err) = self.sink.on_primitive_gesture(&primitive) {
            warn!("error delivering primitive gesture: {err:?}");
        }

        let now = self.scheduler.now();
        match self.classifier.classify(&primitive, now) {
            Classification::Recognized(action) => {
                if let Err(err) = self.sink.on_classified_action(&action) {
                    warn!("error delivering action {}: {err:?}", action.action);
                }
            }
            Classification::Unrecognized(gesture) => {
                trace!("unrecognized {}: {:?}", gesture.gesture, gesture.reason);
                if let Err(err) = self.sink.on_unrecognized_gesture(&gesture) {
                    warn!("error delivering unrecognized gesture: {err:?}");
                }
            }
        }

        let key = primitive.gesture.key();
        let context = self.classifier.context();
        let sequence = self.matcher.push(self.scheduler.as_mut(), key, context, now);
        if let Some(action) = sequence {
            debug!("completed gesture sequence {:?}", action.sequence);
            if let Err(err) = self.sink.on_sequence_action(&action) {
                warn!("error delivering sequence action {}: {err:?}", action.action);
            }
        }
    }
}

impl TimeoutHandler for Recognizer {
    fn handle_timeout(&mut self, timeout: Timeout) {
        self.on_timeout(timeout);
    }
}
