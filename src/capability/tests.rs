use super::*;
use crate::config::PipelineConfig;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

fn camera(stream_url: &str) -> Arc<CameraConfig> {
    Arc::new(CameraConfig::new(
        "cam_01",
        "Test Camera",
        stream_url,
        "people_counting",
    ))
}

#[test]
fn test_builtin_registry_resolves_all_capabilities() {
    let registry = CapabilityRegistry::with_builtin(&PipelineConfig::default());

    for tag in BUILTIN_CAPABILITIES {
        assert!(registry.contains(tag));
        assert!(registry.resolve(tag).is_ok());
    }
    assert_eq!(registry.tags().len(), BUILTIN_CAPABILITIES.len());
}

#[test]
fn test_unknown_capability_is_typed_error() {
    let registry = CapabilityRegistry::with_builtin(&PipelineConfig::default());

    match registry.resolve("face_recognition") {
        Err(MulticamError::UnknownCapability(tag)) => assert_eq!(tag, "face_recognition"),
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Expected lookup failure"),
    }
}

#[test]
fn test_ensure_resolvable_names_missing_tag() {
    let registry = CapabilityRegistry::with_builtin(&PipelineConfig::default());
    let config = CameraConfig::flexible(
        "cam_09",
        "Gate",
        "rtsp://10.0.0.9/stream1",
        &["people_counting", "licence_plates"],
    );

    match registry.ensure_resolvable(&config) {
        Err(MulticamError::UnknownCapability(message)) => {
            assert!(message.contains("licence_plates"));
            assert!(message.contains("cam_09"));
        }
        other => panic!("Expected unknown capability, got {:?}", other),
    }
}

#[tokio::test]
async fn test_watchdog_stops_on_cancellation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let pipeline = Box::new(StreamWatchdog::new(
        "people_counting",
        Duration::from_millis(20),
        Duration::from_millis(200),
        3,
    ));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(pipeline.run(
        camera(&format!("rtsp://127.0.0.1:{}/stream", port)),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    let result = timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_watchdog_fails_after_consecutive_misses() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let pipeline = Box::new(StreamWatchdog::new(
        "intrusion_zone",
        Duration::from_millis(10),
        Duration::from_millis(200),
        2,
    ));

    let result = timeout(
        Duration::from_secs(2),
        pipeline.run(
            camera(&format!("rtsp://127.0.0.1:{}/stream", port)),
            CancellationToken::new(),
        ),
    )
    .await
    .unwrap();

    match result {
        Err(MulticamError::WorkerFailure { camera_id, message }) => {
            assert_eq!(camera_id, "cam_01");
            assert!(message.contains("intrusion_zone"));
        }
        other => panic!("Expected worker failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_watchdog_rejects_unparsable_locator() {
    let pipeline = Box::new(StreamWatchdog::new(
        "loitering_zone",
        Duration::from_millis(10),
        Duration::from_millis(10),
        1,
    ));

    let result = pipeline
        .run(camera("not a url"), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(MulticamError::MalformedConfig(_))));
}

#[tokio::test]
async fn test_watchdog_watches_device_paths() {
    let device = tempfile::NamedTempFile::new().unwrap();
    let pipeline = Box::new(StreamWatchdog::new(
        "ppe_detection",
        Duration::from_millis(10),
        Duration::from_millis(10),
        1,
    ));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(pipeline.run(
        camera(&device.path().display().to_string()),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());
    cancel.cancel();
    assert!(task.await.unwrap().is_ok());
}
