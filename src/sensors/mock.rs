//! Scripted sensor feed for testing and demos

use crate::algorithms::geodesy::destination;
use crate::core::{GeoPoint, LocationFix};
use crate::sensors::{SensorEvent, SensorKind, SensorSubscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Replays a queue of sensor events and tracks the subscriptions it hands out
pub struct ScriptedSensorFeed {
    events: VecDeque<SensorEvent>,
    issued: Vec<(SensorKind, Arc<AtomicBool>)>,
}

struct ScriptedSubscription {
    kind: SensorKind,
    removed: Arc<AtomicBool>,
}

impl SensorSubscription for ScriptedSubscription {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn remove(&mut self) {
        self.removed.store(true, Ordering::SeqCst);
    }
}

impl Default for ScriptedSensorFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSensorFeed {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            issued: Vec::new(),
        }
    }

    /// Open a stream of the given kind
    pub fn subscribe(&mut self, kind: SensorKind) -> Box<dyn SensorSubscription> {
        let removed = Arc::new(AtomicBool::new(false));
        self.issued.push((kind, Arc::clone(&removed)));
        Box::new(ScriptedSubscription { kind, removed })
    }

    /// Subscriptions for all three streams
    pub fn subscribe_all(&mut self) -> Vec<Box<dyn SensorSubscription>> {
        [SensorKind::Location, SensorKind::Heading, SensorKind::Motion]
            .into_iter()
            .map(|kind| self.subscribe(kind))
            .collect()
    }

    pub fn push(&mut self, event: SensorEvent) {
        self.events.push_back(event);
    }

    pub fn push_location(&mut self, lat: f64, lon: f64) {
        self.push(SensorEvent::Location(LocationFix::new(lat, lon)));
    }

    pub fn push_heading(&mut self, heading_deg: f64) {
        self.push(SensorEvent::Heading(heading_deg));
    }

    pub fn push_pitch(&mut self, pitch_deg: f64) {
        self.push(SensorEvent::Pitch(pitch_deg));
    }

    /// Queue a straight walk: one location fix every `step_m` along `bearing_deg`,
    /// each followed by a compass sample aimed at `look_deg`
    pub fn push_walk(&mut self, start: GeoPoint, bearing_deg: f64, step_m: f64, steps: usize, look_deg: f64) {
        for i in 0..steps {
            let point = destination(&start, bearing_deg, step_m * i as f64);
            let mut fix = LocationFix::new(point.lat, point.lon);
            fix.accuracy_m = Some(5.0);
            fix.timestamp_ms = i as u64 * 1000;
            self.push(SensorEvent::Location(fix));
            self.push_heading(look_deg);
        }
    }

    pub fn next_event(&mut self) -> Option<SensorEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Number of subscriptions not yet removed
    pub fn active_subscriptions(&self) -> usize {
        self.issued
            .iter()
            .filter(|(_, removed)| !removed.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_active(&self, kind: SensorKind) -> bool {
        self.issued
            .iter()
            .any(|(k, removed)| *k == kind && !removed.load(Ordering::SeqCst))
    }
}

impl Iterator for ScriptedSensorFeed {
    type Item = SensorEvent;

    fn next(&mut self) -> Option<SensorEvent> {
        self.next_event()
    }
}
