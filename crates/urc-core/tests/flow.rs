//! End-to-end session flows over scripted collaborators.
//!
//! These tests drive the full controller surface the way the CLI does:
//! probe, capture on whichever path the device dictates, normalize, and
//! hand off to persistence.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use urc_core::harness::{inline_payload, normal_payload, ScriptedUpload};
use urc_core::{
    CaptureMode, InMemoryGateway, PersistenceGateway, SessionController, SessionError,
    SessionState, UploadChannel,
};
use urc_proto::events::{ANALYSIS_COMPLETE, CHECK_HARDWARE, HARDWARE_STATUS, TRIGGER_CAPTURE};
use urc_proto::{Role, NOT_DETECTED};
use urc_transport::testing::MockChannel;
use urc_transport::EventChannel;

fn controller(
    channel: Arc<MockChannel>,
    upload: ScriptedUpload,
    gateway: Arc<InMemoryGateway>,
    role: Role,
) -> SessionController {
    SessionController::new(
        channel as Arc<dyn EventChannel>,
        Arc::new(upload) as Arc<dyn UploadChannel>,
        gateway as Arc<dyn PersistenceGateway>,
        role,
    )
    .with_probe_timeout(Duration::from_millis(50))
    .with_capture_timeout(Duration::from_millis(50))
}

/// No device camera: the session falls back to a handheld capture pushed
/// over REST, succeeds, and display-maps every missing analyte.
#[tokio::test]
async fn local_fallback_flow_end_to_end() {
    let channel = Arc::new(MockChannel::new("192.168.4.1").with_reply(
        CHECK_HARDWARE,
        HARDWARE_STATUS,
        json!({ "camera_detected": false }),
    ));
    let gateway = Arc::new(InMemoryGateway::new());
    let payload = inline_payload(50);
    let upload = ScriptedUpload::succeed(json!({
        "diagnosis": {
            "advice_layman": "All normal",
            "advice_medical": "WNL"
        },
        "image": payload.clone(),
        "full_results": {},
        "reference_chart": ""
    }));
    let controller = controller(
        Arc::clone(&channel),
        upload,
        Arc::clone(&gateway),
        Role::Layman,
    );

    let mode = controller.start().await.unwrap();
    assert_eq!(mode, CaptureMode::Local);

    let outcome = controller.capture_local(&payload).await.unwrap();
    assert_eq!(controller.state(), SessionState::Succeeded);
    assert!(outcome.warning.is_none());

    let rows = outcome.result.display_results();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|(_, value)| value == NOT_DETECTED));

    let saved = gateway.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, Role::Layman);
    assert_eq!(saved[0].1.image, payload);
}

/// The device never answers the capability check.
#[tokio::test]
async fn silent_device_fails_the_probe() {
    let channel = Arc::new(MockChannel::new("192.168.4.1"));
    let controller = controller(
        Arc::clone(&channel),
        ScriptedUpload::succeed(normal_payload()),
        Arc::new(InMemoryGateway::new()),
        Role::Layman,
    );

    let result = controller.start().await;
    assert_eq!(result, Err(SessionError::HardwareProbeTimeout));
    assert_eq!(controller.state(), SessionState::Failed);
}

/// The upload completes at the transport level but the device embeds an
/// error in the body; its wording becomes the failure detail.
#[tokio::test]
async fn rejected_upload_carries_the_device_detail() {
    let channel = Arc::new(MockChannel::new("192.168.4.1").with_reply(
        CHECK_HARDWARE,
        HARDWARE_STATUS,
        json!({ "camera_detected": false }),
    ));
    let controller = controller(
        Arc::clone(&channel),
        ScriptedUpload::reject("sensor fault"),
        Arc::new(InMemoryGateway::new()),
        Role::Layman,
    );

    controller.start().await.unwrap();
    let result = controller.capture_local(&inline_payload(50)).await;
    assert_eq!(
        result,
        Err(SessionError::UploadFailed("sensor fault".into()))
    );
    assert_eq!(controller.state(), SessionState::Failed);
}

/// The realtime link drops while a device-side capture is in flight.
#[tokio::test]
async fn link_drop_mid_capture_fails_the_session() {
    let channel = Arc::new(
        MockChannel::new("192.168.4.1")
            .with_reply(CHECK_HARDWARE, HARDWARE_STATUS, json!({ "camera_detected": true }))
            .with_drop_on(TRIGGER_CAPTURE),
    );
    let controller = controller(
        Arc::clone(&channel),
        ScriptedUpload::succeed(normal_payload()),
        Arc::new(InMemoryGateway::new()),
        Role::Medical,
    );

    let mode = controller.start().await.unwrap();
    assert_eq!(mode, CaptureMode::Remote);

    let result = controller.capture_remote().await;
    assert_eq!(result, Err(SessionError::Disconnected));
    assert_eq!(controller.state(), SessionState::Failed);
}

/// Full device-camera flow for the elevated role, with the analysis result
/// delivered asynchronously over the realtime channel.
#[tokio::test]
async fn remote_flow_tags_results_with_the_elevated_role() {
    let mut payload = normal_payload();
    payload["reference_chart"] = json!("chart_0042.jpg");
    let channel = Arc::new(
        MockChannel::new("192.168.4.1")
            .with_reply(CHECK_HARDWARE, HARDWARE_STATUS, json!({ "camera_detected": true }))
            .with_reply(TRIGGER_CAPTURE, ANALYSIS_COMPLETE, payload),
    );
    let gateway = Arc::new(InMemoryGateway::new());
    let controller = controller(
        Arc::clone(&channel),
        ScriptedUpload::succeed(normal_payload()),
        Arc::clone(&gateway),
        Role::Medical,
    );

    controller.start().await.unwrap();
    let outcome = controller.capture_remote().await.unwrap();
    assert_eq!(outcome.result.reference_chart, "chart_0042.jpg");

    let history = gateway.fetch_history(Role::Medical).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].timestamp.is_some());
    assert!(gateway.fetch_history(Role::Layman).await.unwrap().is_empty());
}

/// A failed save after a successful analysis downgrades to a warning; the
/// result stays displayable and the session stays succeeded.
#[tokio::test]
async fn save_failure_is_a_warning_not_a_failure() {
    let channel = Arc::new(
        MockChannel::new("192.168.4.1")
            .with_reply(CHECK_HARDWARE, HARDWARE_STATUS, json!({ "camera_detected": true }))
            .with_reply(TRIGGER_CAPTURE, ANALYSIS_COMPLETE, normal_payload()),
    );
    let gateway = Arc::new(InMemoryGateway::new());
    gateway.fail_saves(true);
    let controller = controller(
        Arc::clone(&channel),
        ScriptedUpload::succeed(normal_payload()),
        Arc::clone(&gateway),
        Role::Layman,
    );

    controller.start().await.unwrap();
    let outcome = controller.capture_remote().await.unwrap();
    assert_eq!(controller.state(), SessionState::Succeeded);
    assert!(outcome.warning.is_some());
    assert_eq!(outcome.result.diagnosis.advice_layman, "All normal");
}
