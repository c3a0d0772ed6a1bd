//! Display-now integration tests.
//!
//! Fake display executables are small shell scripts, so these tests only run
//! on unix.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use tower::ServiceExt;

use imager::{create_router, AppState, DisplayRunner, ImageReencoder, LocalImageStore, RouterConfig};

use super::test_utils::{body_json, create_test_png, display_request, write_script};

struct Fixture {
    images: tempfile::TempDir,
    bin: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let images = tempfile::tempdir().unwrap();
        std::fs::write(images.path().join("a.png"), create_test_png(4, 4)).unwrap();
        Self {
            images,
            bin: tempfile::tempdir().unwrap(),
        }
    }

    fn image_path(&self, name: &str) -> String {
        self.images.path().join(name).to_string_lossy().into_owned()
    }

    fn marker(&self) -> std::path::PathBuf {
        self.bin.path().join("shown.txt")
    }

    /// A script that records its argument in the marker file and exits with `code`.
    fn recording_script(&self, code: i32) -> std::path::PathBuf {
        write_script(
            self.bin.path(),
            "inky",
            &format!("printf '%s' \"$1\" > '{}'\nexit {}", self.marker().display(), code),
        )
    }

    fn router(&self, program: &Path, timeout: Duration) -> axum::Router {
        let store = Arc::new(LocalImageStore::new(self.images.path()));
        let state = AppState::new(store, ImageReencoder::default())
            .with_display(DisplayRunner::new(program, timeout));
        create_router(state, RouterConfig::new().with_tracing(false))
    }
}

#[tokio::test]
async fn test_display_success() {
    let fixture = Fixture::new();
    let script = fixture.recording_script(0);
    let router = fixture.router(&script, Duration::from_secs(10));

    let path = fixture.image_path("a.png");
    let response = router
        .oneshot(display_request(&serde_json::json!(path)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(std::fs::read_to_string(fixture.marker()).unwrap(), path);
}

#[tokio::test]
async fn test_display_object_body() {
    let fixture = Fixture::new();
    let script = fixture.recording_script(0);
    let router = fixture.router(&script, Duration::from_secs(10));

    let path = fixture.image_path("a.png");
    let response = router
        .oneshot(display_request(&serde_json::json!({ "filePath": path })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(fixture.marker().exists());
}

#[tokio::test]
async fn test_display_nonzero_exit() {
    let fixture = Fixture::new();
    let script = fixture.recording_script(3);
    let router = fixture.router(&script, Duration::from_secs(10));

    let response = router
        .oneshot(display_request(&serde_json::json!(fixture.image_path("a.png"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Failed to update inky display");
}

#[tokio::test]
async fn test_display_outside_directory_does_not_spawn() {
    let fixture = Fixture::new();
    let script = fixture.recording_script(0);
    let router = fixture.router(&script, Duration::from_secs(10));

    let outside = fixture.bin.path().join("a.png");
    std::fs::write(&outside, create_test_png(2, 2)).unwrap();

    let requests = [
        outside.to_string_lossy().into_owned(),
        "/etc/passwd".to_string(),
        format!("{}/../a.png", fixture.images.path().display()),
        "a.png".to_string(),
    ];

    for requested in requests {
        let response = router
            .clone()
            .oneshot(display_request(&serde_json::json!(requested)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", requested);
    }

    assert!(!fixture.marker().exists());
}

#[tokio::test]
async fn test_display_missing_file() {
    let fixture = Fixture::new();
    let script = fixture.recording_script(0);
    let router = fixture.router(&script, Duration::from_secs(10));

    let response = router
        .oneshot(display_request(&serde_json::json!(
            fixture.image_path("missing.png")
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!fixture.marker().exists());
}

#[tokio::test]
async fn test_display_spawn_failure() {
    let fixture = Fixture::new();
    let router = fixture.router(
        &fixture.bin.path().join("does-not-exist"),
        Duration::from_secs(10),
    );

    let response = router
        .oneshot(display_request(&serde_json::json!(fixture.image_path("a.png"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_display_timeout() {
    let fixture = Fixture::new();
    let pid_file = fixture.bin.path().join("pid");
    let script = write_script(
        fixture.bin.path(),
        "slow-inky",
        &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
    );
    let router = fixture.router(&script, Duration::from_secs(1));

    let started = Instant::now();
    let response = router
        .oneshot(display_request(&serde_json::json!(fixture.image_path("a.png"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(started.elapsed() < Duration::from_secs(10));

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();

    #[cfg(target_os = "linux")]
    {
        let mut killed = false;
        for _ in 0..40 {
            if !process_running(pid) {
                killed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(killed, "display process {} still running after timeout", pid);
    }
    #[cfg(not(target_os = "linux"))]
    let _ = pid;
}

/// Whether `pid` names a live process. Zombies awaiting reaping count as dead.
#[cfg(target_os = "linux")]
fn process_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .is_some_and(|state| state != 'Z' && state != 'X'),
        Err(_) => false,
    }
}
