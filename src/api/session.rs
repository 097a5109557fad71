//! Event-driven AR session
//!
//! The platform pushes sensor samples in; every accepted sample updates the
//! latest-known state and recomputes one `RenderFrame`, which is handed to the
//! registered frame callbacks. Samples are never queued: the newest value of
//! each stream wins.

use crate::api::types::{RenderFrame, SessionStatus};
use crate::core::{GeoFeature, GeoPoint, ScreenSize};
use crate::processing::{FrameInput, MarkerAssembler, OrientationFilter};
use crate::sensors::{SensorEvent, SensorKind, SensorSubscription};
use crate::utils::config::{ArConfig, ConfigurationManager};
use crate::utils::settings::{FeatureStore, TideSettings};
use crate::validation::error::ArResult;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Callback invoked with every recomputed frame
pub type FrameCallback = Box<dyn Fn(&RenderFrame) + Send>;

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u32);

impl CallbackHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

pub struct ArSession {
    filter: OrientationFilter,
    assembler: MarkerAssembler,
    features: Vec<GeoFeature>,
    settings: TideSettings,
    screen: ScreenSize,
    location: Option<GeoPoint>,
    denied: Option<SensorKind>,
    subscriptions: Vec<Box<dyn SensorSubscription>>,
    callback_counter: u32,
    frame_callbacks: HashMap<CallbackHandle, FrameCallback>,
    last_frame: RenderFrame,
    start_time: Instant,
    shut_down: bool,
}

impl ArSession {
    pub fn new(config: ArConfig, features: Vec<GeoFeature>, settings: TideSettings) -> Self {
        Self {
            filter: OrientationFilter::from_config(&config),
            assembler: MarkerAssembler::new(config),
            features,
            settings,
            screen: ScreenSize::default(),
            location: None,
            denied: None,
            subscriptions: Vec::new(),
            callback_counter: 0,
            frame_callbacks: HashMap::new(),
            last_frame: RenderFrame::empty(SessionStatus::WaitingForLocation),
            start_time: Instant::now(),
            shut_down: false,
        }
    }

    /// Session over a saved configuration and landmark store.
    ///
    /// The configuration file must exist; a missing store file falls back to
    /// the bundled landmarks.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(config_path: P, store_path: Q) -> ArResult<Self> {
        let config = ConfigurationManager::from_file(config_path)?.config().clone();
        let mut store = FeatureStore::bundled()?;
        store.load(store_path)?;
        Ok(Self::new(config, store.features().to_vec(), store.settings()))
    }

    /// Hand a platform stream to the session; it is removed on shutdown
    pub fn attach(&mut self, mut subscription: Box<dyn SensorSubscription>) {
        if self.shut_down {
            subscription.remove();
            return;
        }
        log::debug!("attached {:?} stream", subscription.kind());
        self.subscriptions.push(subscription);
    }

    pub fn attach_all(&mut self, subscriptions: Vec<Box<dyn SensorSubscription>>) {
        for subscription in subscriptions {
            self.attach(subscription);
        }
    }

    pub fn on_frame(&mut self, callback: FrameCallback) -> CallbackHandle {
        self.callback_counter += 1;
        let handle = CallbackHandle(self.callback_counter);
        self.frame_callbacks.insert(handle, callback);
        handle
    }

    /// Unregister a frame callback; returns false for an unknown handle
    pub fn remove_callback(&mut self, handle: CallbackHandle) -> bool {
        self.frame_callbacks.remove(&handle).is_some()
    }

    /// Apply a sensor sample at the session clock
    pub fn handle_event(&mut self, event: SensorEvent) -> Option<RenderFrame> {
        let now_ms = self.start_time.elapsed().as_millis() as u64;
        self.handle_event_at(event, now_ms)
    }

    /// Apply a sensor sample at an explicit monotonic time.
    ///
    /// Returns the recomputed frame, or `None` when the sample was ignored.
    pub fn handle_event_at(&mut self, event: SensorEvent, now_ms: u64) -> Option<RenderFrame> {
        if self.shut_down {
            return None;
        }

        match event {
            SensorEvent::Location(fix) => {
                self.location = Some(fix.point);
                self.clear_denial(SensorKind::Location);
            }
            SensorEvent::Heading(raw) => {
                if !raw.is_finite() || raw < 0.0 {
                    log::trace!("ignoring unavailable heading {}", raw);
                    return None;
                }
                self.filter.update_heading(raw);
                self.clear_denial(SensorKind::Heading);
            }
            SensorEvent::Pitch(raw) => {
                if !raw.is_finite() {
                    return None;
                }
                self.filter.update_pitch(raw);
                self.clear_denial(SensorKind::Motion);
            }
            SensorEvent::PermissionDenied(kind) => {
                log::warn!("{:?} permission denied", kind);
                if kind == SensorKind::Location {
                    self.location = None;
                }
                self.denied = Some(kind);
            }
        }

        Some(self.recompute(now_ms))
    }

    /// Replace the feature collection wholesale
    pub fn set_features(&mut self, features: Vec<GeoFeature>) {
        self.features = features;
    }

    pub fn set_settings(&mut self, settings: TideSettings) {
        self.settings = settings;
    }

    pub fn set_screen_size(&mut self, screen: ScreenSize) {
        self.screen = screen;
    }

    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    pub fn settings(&self) -> TideSettings {
        self.settings
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn last_frame(&self) -> &RenderFrame {
        &self.last_frame
    }

    pub fn assembler(&self) -> &MarkerAssembler {
        &self.assembler
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Remove every sensor subscription and drop callbacks. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        for subscription in self.subscriptions.iter_mut() {
            subscription.remove();
        }
        log::info!("session shut down, removed {} streams", self.subscriptions.len());
        self.subscriptions.clear();
        self.frame_callbacks.clear();
        self.shut_down = true;
    }

    /// A sample from a stream proves its permission is granted again
    fn clear_denial(&mut self, kind: SensorKind) {
        if self.denied == Some(kind) {
            log::info!("{:?} stream recovered", kind);
            self.denied = None;
        }
    }

    fn recompute(&mut self, now_ms: u64) -> RenderFrame {
        let heading_deg = self.filter.heading().unwrap_or(0.0);
        let input = FrameInput {
            location: self.location,
            heading_deg,
            pitch_deg: self.filter.pitch(),
            screen: self.screen,
            now_ms,
        };

        let markers = self.assembler.assemble(&self.features, &input, &self.settings);
        let status = match (self.denied, self.location) {
            (Some(kind), _) => SessionStatus::PermissionDenied(kind),
            (None, None) => SessionStatus::WaitingForLocation,
            (None, Some(_)) => SessionStatus::Tracking {
                in_view: markers.len(),
                total: self.features.len(),
                heading_deg,
            },
        };

        let frame = RenderFrame { markers, status };
        for callback in self.frame_callbacks.values() {
            callback(&frame);
        }
        self.last_frame = frame.clone();
        frame
    }
}

impl Drop for ArSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ScriptedSensorFeed;
    use std::sync::{Arc, Mutex};

    fn features() -> Vec<GeoFeature> {
        vec![
            GeoFeature::new("Basse Est", 48.40, -4.48).with_altitude(12.0),
            GeoFeature::new("Roche Nord", 48.41, -4.50).with_altitude(10.0),
        ]
    }

    fn session() -> ArSession {
        ArSession::new(ArConfig::default(), features(), TideSettings::default())
    }

    #[test]
    fn test_waiting_until_location() {
        let mut session = session();
        let frame = session.handle_event_at(SensorEvent::Heading(90.0), 0).unwrap();
        assert_eq!(frame.status, SessionStatus::WaitingForLocation);
        assert!(frame.markers.is_empty());
        assert_eq!(frame.status_line(), "Waiting for location...");
    }

    #[test]
    fn test_end_to_end_tracking() {
        let mut session = session();
        session.handle_event_at(SensorEvent::Heading(90.0), 0);
        let frame = session
            .handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 10)
            .unwrap();

        assert_eq!(frame.markers.len(), 1);
        assert_eq!(frame.markers[0].name, "Basse Est");
        match frame.status {
            SessionStatus::Tracking { in_view, total, heading_deg } => {
                assert_eq!(in_view, 1);
                assert_eq!(total, 2);
                assert!((heading_deg - 90.0).abs() < 1e-9);
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(session.last_frame(), &frame);
    }

    #[test]
    fn test_unavailable_heading_ignored() {
        let mut session = session();
        session.handle_event_at(SensorEvent::Heading(90.0), 0);
        assert!(session.handle_event_at(SensorEvent::Heading(-1.0), 5).is_none());
        assert!(session.handle_event_at(SensorEvent::Heading(f64::NAN), 6).is_none());

        let frame = session
            .handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 10)
            .unwrap();
        assert_eq!(frame.markers.len(), 1);
    }

    #[test]
    fn test_location_permission_denied() {
        let mut session = session();
        session.handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 0);
        let frame = session
            .handle_event_at(SensorEvent::PermissionDenied(SensorKind::Location), 5)
            .unwrap();

        assert_eq!(frame.status, SessionStatus::PermissionDenied(SensorKind::Location));
        assert!(frame.markers.is_empty());
        assert!(session.location().is_none());
        assert_eq!(frame.status_line(), "Location permission denied");

        // A later fix recovers
        let frame = session
            .handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 9)
            .unwrap();
        assert!(matches!(frame.status, SessionStatus::Tracking { .. }));
    }

    #[test]
    fn test_compass_denial_clears_on_sample() {
        let mut session = session();
        session.handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 0);
        let frame = session
            .handle_event_at(SensorEvent::PermissionDenied(SensorKind::Heading), 5)
            .unwrap();
        assert_eq!(frame.status_line(), "Compass permission denied");

        // A pitch sample does not prove the compass is back
        let frame = session.handle_event_at(SensorEvent::Pitch(0.0), 6).unwrap();
        assert_eq!(frame.status, SessionStatus::PermissionDenied(SensorKind::Heading));

        let frame = session.handle_event_at(SensorEvent::Heading(90.0), 7).unwrap();
        assert!(matches!(frame.status, SessionStatus::Tracking { in_view: 1, .. }));
        assert_eq!(frame.markers.len(), 1);
    }

    #[test]
    fn test_frame_callbacks() {
        let mut session = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = session.on_frame(Box::new(move |frame: &RenderFrame| {
            sink.lock().unwrap().push(frame.markers.len());
        }));

        session.handle_event_at(SensorEvent::Heading(90.0), 0);
        session.handle_event_at(SensorEvent::Location(crate::core::LocationFix::new(48.40, -4.50)), 1);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

        assert!(session.remove_callback(handle));
        assert!(!session.remove_callback(handle));
        session.handle_event_at(SensorEvent::Heading(90.0), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_scripted_walk() {
        let mut feed = ScriptedSensorFeed::new();
        let mut session = session();
        session.attach_all(feed.subscribe_all());

        feed.push_walk(GeoPoint::new(48.40, -4.52), 90.0, 200.0, 4, 90.0);
        let frames: Vec<RenderFrame> = feed
            .by_ref()
            .enumerate()
            .filter_map(|(i, event)| session.handle_event_at(event, i as u64 * 100))
            .collect();

        assert_eq!(frames.len(), 8);
        // Walking toward the landmark shortens its distance
        let distances: Vec<f64> = frames
            .iter()
            .filter_map(|f| f.markers.first().map(|m| m.distance_meters))
            .collect();
        assert!(!distances.is_empty());
        assert!(distances.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_shutdown_removes_subscriptions() {
        let mut feed = ScriptedSensorFeed::new();
        let mut session = session();
        session.attach_all(feed.subscribe_all());
        assert_eq!(feed.active_subscriptions(), 3);

        session.shutdown();
        assert_eq!(feed.active_subscriptions(), 0);
        assert!(session.is_shut_down());
        assert!(session.handle_event_at(SensorEvent::Heading(90.0), 0).is_none());

        // Late attachments are closed immediately
        session.attach(feed.subscribe(SensorKind::Motion));
        assert_eq!(feed.active_subscriptions(), 0);
        session.shutdown();
    }

    #[test]
    fn test_from_files() {
        use crate::validation::error::{ArError, StoreError};
        use std::fs;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("ar_config.json");
        let store_path = dir.path().join("myGeoData.json");

        let mut manager = ConfigurationManager::new();
        manager.set_horizontal_fov(60.0).unwrap();
        manager.save_to_file(&config_path).unwrap();

        // No saved store yet: bundled landmarks with default tide settings
        let session = ArSession::from_files(&config_path, &store_path).unwrap();
        assert_eq!(session.features().len(), 8);
        assert_eq!(session.settings(), TideSettings::default());
        assert_eq!(session.assembler().config().horizontal_fov_deg, 60.0);

        let mut store = FeatureStore::bundled().unwrap();
        store.set_settings(TideSettings::new(5.0, 2.0, 700.0));
        store.save(&store_path).unwrap();
        let session = ArSession::from_files(&config_path, &store_path).unwrap();
        assert_eq!(session.settings(), TideSettings::new(5.0, 2.0, 700.0));

        fs::write(&store_path, r#"{ "type": "FeatureCollection" }"#).unwrap();
        assert!(matches!(
            ArSession::from_files(&config_path, &store_path),
            Err(ArError::Store(StoreError::MissingFeatures))
        ));
        assert!(matches!(
            ArSession::from_files(dir.path().join("absent.json"), &store_path),
            Err(ArError::Config(_))
        ));
    }

    #[test]
    fn test_drop_tears_down() {
        let mut feed = ScriptedSensorFeed::new();
        {
            let mut session = session();
            session.attach_all(feed.subscribe_all());
        }
        assert_eq!(feed.active_subscriptions(), 0);
    }
}
