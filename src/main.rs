use seamark_ar::algorithms::elevation::{summarize_tide, EffectiveSeaLevel};
use seamark_ar::api::{ArSession, MarkerLabel};
use seamark_ar::sensors::{ScriptedSensorFeed, SensorEvent, SensorKind};
use seamark_ar::utils::{ConfigurationManager, FeatureStore};
use seamark_ar::GeoPoint;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        eprintln!(
            "Usage: {} [saved_geodata.json]",
            args.first().map_or("seamark-ar", |s| s.as_str())
        );
        return Err("Invalid arguments".into());
    }

    let mut store = FeatureStore::bundled()?;
    if let Some(path) = args.get(1) {
        if !store.load(path)? {
            println!("No saved data at {}, using bundled landmarks", path);
        }
    }

    let settings = store.settings();
    let level = EffectiveSeaLevel::new(settings.sea_level, settings.delta);
    let stats = summarize_tide(store.features(), level);
    println!(
        "Sea level {:.1} m + delta {:.1} m: {} landmarks, {} above water, {} submerged",
        settings.sea_level, settings.delta, stats.total, stats.visible, stats.submerged
    );

    let config = ConfigurationManager::new().config().clone();
    let mut session = ArSession::new(config, store.features().to_vec(), settings);

    let mut feed = ScriptedSensorFeed::new();
    session.attach_all(feed.subscribe_all());

    // Walk east along the north shore of the Goulet, camera on the horizon, facing south-east
    feed.push_pitch(0.0);
    feed.push_walk(GeoPoint::new(48.3450, -4.6000), 90.0, 250.0, 6, 120.0);

    let mut now_ms = 0;
    for event in feed.by_ref() {
        now_ms += 200;
        let is_location = matches!(event, SensorEvent::Location(_));
        let Some(frame) = session.handle_event_at(event, now_ms) else {
            continue;
        };
        if is_location {
            continue;
        }

        println!();
        println!("[{:>5} ms] {}", now_ms, frame.status_line());
        for marker in &frame.markers {
            let label = MarkerLabel::for_marker(marker);
            println!(
                "  x={:>6.1} y={:>6.1} scale={:.2}  {}",
                marker.screen_x, marker.screen_y, marker.scale, label
            );
        }
    }

    session.handle_event(SensorEvent::PermissionDenied(SensorKind::Location));
    println!();
    println!("{}", session.last_frame().status_line());

    session.shutdown();
    println!("Streams still open: {}", feed.active_subscriptions());
    Ok(())
}
