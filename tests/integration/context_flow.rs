//! Screen capture into the context store, observed by concurrent readers.

use crate::integration::test_utils::FixedScreen;
use chrono::Utc;
use sidekick::context::{ContextStore, ScreenAnalyzer};
use sidekick::sensor::{FileTextExtractor, ScreenSensor};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const FRAMES: &[(&str, &str)] = &[
    ("python", "import os\ndef load(path):\n    return open(path).read()\n"),
    ("javascript", "const total = items.reduce((a, b) => a + b, 0);\nconsole.log(total)\n"),
    ("html", "<!DOCTYPE html>\n<html><body><div class=\"x\"></div></body></html>\n"),
];

#[test]
fn test_readers_never_observe_mixed_snapshots() {
    let analyzer = ScreenAnalyzer::new();
    let snapshots: Vec<_> = FRAMES
        .iter()
        .map(|(language, text)| analyzer.analyze_as(text, language, Utc::now()))
        .collect();
    let store = Arc::new(ContextStore::new());
    store.replace(snapshots[0].clone());

    let writer = {
        let store = Arc::clone(&store);
        let snapshots = snapshots.clone();
        thread::spawn(move || {
            for i in 0..3000 {
                store.replace(snapshots[i % snapshots.len()].clone());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let snapshots = snapshots.clone();
            thread::spawn(move || {
                let mut last_version = 0;
                for _ in 0..3000 {
                    let version = store.version();
                    assert!(version >= last_version);
                    last_version = version;

                    let snapshot = store.snapshot();
                    assert!(
                        snapshots.iter().any(|expected| *expected == *snapshot),
                        "observed a snapshot that was never written"
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.version(), 3001);
}

#[tokio::test(start_paused = true)]
async fn test_screen_sensor_keeps_latest_capture() {
    let store = Arc::new(ContextStore::new());
    let sensor = ScreenSensor::new(
        Arc::new(FixedScreen(
            "Error: name 'x' is not defined\nimport sys\ndef main():\n    pass\n"
                .to_string(),
        )),
        Arc::clone(&store),
        Duration::from_secs(2),
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(sensor.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(4100)).await;
    cancel.cancel();
    handle.await.unwrap();

    // Immediate first capture plus one every two seconds.
    assert_eq!(store.version(), 3);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.language.as_deref(), Some("python"));
    assert_eq!(snapshot.file_type.as_deref(), Some(".py"));
    assert!(snapshot.error_indicators.contains("Error"));
    assert!(snapshot.has_errors());
}

#[tokio::test]
async fn test_file_source_feeds_the_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("screen.txt");
    std::fs::write(&path, "function add(a, b) {\n  var sum = a + b;\n  return sum;\n}\n").unwrap();

    let store = Arc::new(ContextStore::new());
    let sensor = ScreenSensor::new(
        Arc::new(FileTextExtractor::new(&path)),
        Arc::clone(&store),
        Duration::from_secs(2),
    );
    assert_eq!(sensor.capture_once().await.unwrap(), 1);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.language.as_deref(), Some("javascript"));
    assert!(snapshot.text_content.contains("var sum"));
    assert!(!snapshot.has_errors());
}
