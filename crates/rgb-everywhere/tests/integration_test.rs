//! Integration tests for the rgb-everywhere pipeline.
//!
//! A scripted screen stands in for the display and a `sh` script records
//! what the controller receives.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rgb_everywhere::{build_pipeline, ExitReason, Scheduler, SchedulerState, ShutdownSignal};
use rgb_everywhere_capture::KMeansExtractor;
use rgb_everywhere_core::{AppConfig, ColorSample, Region};
use rgb_everywhere_sampler::testing::ScriptedScreen;

const RED: ColorSample = ColorSample::new(255, 0, 0);
const GREEN: ColorSample = ColorSample::new(0, 255, 0);
const BLUE: ColorSample = ColorSample::new(0, 0, 255);

/// 60x20 keeps every stripe the same size after extraction.
fn screen() -> Arc<ScriptedScreen> {
    let screen = Arc::new(ScriptedScreen::new(60, 20, ColorSample::BLACK));
    screen.paint_stripes(&Region::new(0, 0, 60, 20).unwrap(), &[RED, GREEN, BLUE]);
    screen
}

fn write_config(dir: &Path, body: &str) -> AppConfig {
    let path = dir.join("rgbeverywhereconf.json");
    std::fs::write(&path, body).unwrap();
    let config = AppConfig::from_file(&path).unwrap();
    config.validate().unwrap();
    config
}

async fn wait_for_file(path: &Path, expected: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if std::fs::read_to_string(path).unwrap_or_default() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_palette_reaches_controller_and_shutdown_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("stdin.txt");
    let config = write_config(
        dir.path(),
        &format!(
            r#"{{
                "refresh": 10,
                "pathToExe": "sh",
                "display": 0,
                "controller": {{
                    "launch": "startup",
                    "args": ["-c", "cat > '{}'"]
                }}
            }}"#,
            output.display()
        ),
    );

    let screen = screen();
    let pipeline =
        build_pipeline(&config, screen.clone(), Arc::new(KMeansExtractor::new())).unwrap();
    assert!(pipeline.link().has_session());

    let shutdown = ShutdownSignal::new();
    let scheduler = Scheduler::new(config.refresh_interval(), pipeline, shutdown.clone());
    let handle = scheduler.handle();
    let task = tokio::spawn(scheduler.run());

    assert!(wait_for_file(&output, "255,0,0,0,255,0,0,0,255\n").await);

    // The probe sits in the middle stripe; repainting it triggers one more push.
    screen.paint_stripes(&Region::new(0, 0, 60, 20).unwrap(), &[BLUE, RED, GREEN]);
    assert!(
        wait_for_file(
            &output,
            "255,0,0,0,255,0,0,0,255\n0,0,255,255,0,0,0,255,0\n"
        )
        .await
    );

    shutdown.trigger();
    let reason = task.await.unwrap();
    assert_eq!(reason, ExitReason::Shutdown);
    assert_eq!(reason.exit_code(), 0);
    assert_eq!(handle.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn test_controller_exit_stops_with_session_lost() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "refresh_interval_ms": 10,
            "controller_executable_path": "true",
            "controller": { "launch": "startup", "on_session_lost": "exit" }
        }"#,
    );

    let pipeline = build_pipeline(&config, screen(), Arc::new(KMeansExtractor::new())).unwrap();
    let scheduler = Scheduler::new(config.refresh_interval(), pipeline, ShutdownSignal::new());
    let handle = scheduler.handle();

    let reason = tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .unwrap();
    assert_eq!(reason, ExitReason::SessionLost);
    assert_eq!(reason.exit_code(), 0);
    assert_eq!(handle.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn test_launch_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{ "refresh": 10, "pathToExe": "/nonexistent/controller" }"#,
    );

    let pipeline = build_pipeline(&config, screen(), Arc::new(KMeansExtractor::new())).unwrap();
    let reason = tokio::time::timeout(
        Duration::from_secs(5),
        Scheduler::new(config.refresh_interval(), pipeline, ShutdownSignal::new()).run(),
    )
    .await
    .unwrap();
    assert!(matches!(reason, ExitReason::Fatal(_)));
    assert_eq!(reason.exit_code(), 1);
}
