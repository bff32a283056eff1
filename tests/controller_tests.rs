// Integration tests for the session controller state machine.
//
// A ScriptedProvider with no script emits nothing on its own, so each test
// drives the controller with exactly the command/event sequence it needs.

use companion_sessions::provider::{CallMessage, MessageRole, ProviderError, ProviderEvent};
use companion_sessions::{
    CallStatus, Companion, InMemoryHistory, NewCompanion, ScriptedProvider, SessionController,
    SessionDescriptor, SessionError, SessionHistory, Speaker, VoiceProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn companion() -> Companion {
    Companion::create(NewCompanion {
        name: "Neura".to_string(),
        subject: "maths".to_string(),
        topic: "derivatives".to_string(),
        voice: "female".to_string(),
        style: "formal".to_string(),
        duration_minutes: 30,
        author: "author-1".to_string(),
    })
}

fn descriptor() -> SessionDescriptor {
    SessionDescriptor {
        companion: companion(),
        user_id: "user-1".to_string(),
        user_name: "Sam".to_string(),
        user_image: None,
    }
}

struct Harness {
    provider: Arc<ScriptedProvider>,
    history: Arc<InMemoryHistory>,
    controller: Arc<SessionController>,
}

fn harness() -> Harness {
    let provider = Arc::new(ScriptedProvider::new());
    let history = Arc::new(InMemoryHistory::new());
    let controller = Arc::new(SessionController::new(
        descriptor(),
        provider.clone(),
        history.clone(),
    ));

    Harness {
        provider,
        history,
        controller,
    }
}

/// Let spawned tasks (event pump, history notification) catch up.
async fn settle() {
    sleep(Duration::from_millis(25)).await;
}

fn final_msg(role: MessageRole, text: &str) -> ProviderEvent {
    ProviderEvent::Message(CallMessage::final_transcript(role, text))
}

#[tokio::test]
async fn test_start_transitions_to_connecting() {
    let h = harness();

    h.controller.start().await.unwrap();

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Connecting);
    assert!(snapshot.transcript.is_empty());
    assert_eq!(h.provider.start_requests(), 1);
}

#[tokio::test]
async fn test_call_start_promotes_connecting_to_active() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;

    assert_eq!(h.controller.snapshot().await.status, CallStatus::Active);
}

#[tokio::test]
async fn test_call_start_outside_connecting_is_ignored() {
    let h = harness();

    h.controller.handle_event(ProviderEvent::CallStart).await;

    assert_eq!(h.controller.snapshot().await.status, CallStatus::Idle);
}

#[tokio::test]
async fn test_transcript_is_newest_first() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller
        .handle_event(final_msg(MessageRole::User, "hello"))
        .await;
    h.controller
        .handle_event(final_msg(MessageRole::Assistant, "hi"))
        .await;
    h.controller.handle_event(ProviderEvent::CallEnd).await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Ended);
    assert_eq!(snapshot.transcript.len(), 2);
    assert_eq!(snapshot.transcript[0].speaker, Speaker::Companion);
    assert_eq!(snapshot.transcript[0].text, "hi");
    assert_eq!(snapshot.transcript[1].speaker, Speaker::User);
    assert_eq!(snapshot.transcript[1].text, "hello");
}

#[tokio::test]
async fn test_partial_transcripts_are_discarded() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller
        .handle_event(ProviderEvent::Message(CallMessage::partial_transcript(
            MessageRole::User,
            "hel",
        )))
        .await;
    h.controller
        .handle_event(final_msg(MessageRole::User, "hello"))
        .await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.transcript.len(), 1);
    assert_eq!(snapshot.transcript[0].text, "hello");
}

#[tokio::test]
async fn test_messages_outside_active_are_ignored() {
    let h = harness();

    h.controller.start().await.unwrap();
    // still connecting: no transcript yet
    h.controller
        .handle_event(final_msg(MessageRole::User, "early"))
        .await;

    assert!(h.controller.snapshot().await.transcript.is_empty());
}

#[tokio::test]
async fn test_call_end_clears_speaking() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.handle_event(ProviderEvent::SpeechStart).await;
    assert!(h.controller.snapshot().await.speaking);

    h.controller.handle_event(ProviderEvent::CallEnd).await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Ended);
    assert!(!snapshot.speaking);
}

#[tokio::test]
async fn test_speech_events_require_active_call() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::SpeechStart).await;
    assert!(!h.controller.snapshot().await.speaking);

    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.handle_event(ProviderEvent::SpeechStart).await;
    assert!(h.controller.snapshot().await.speaking);

    h.controller.handle_event(ProviderEvent::SpeechEnd).await;
    assert!(!h.controller.snapshot().await.speaking);
}

#[tokio::test]
async fn test_double_start_issues_one_provider_request() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.start().await.unwrap();

    assert_eq!(h.provider.start_requests(), 1);
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Connecting);

    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.start().await.unwrap();

    assert_eq!(h.provider.start_requests(), 1);
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Active);
}

#[tokio::test]
async fn test_restart_after_end_resets_transcript() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller
        .handle_event(final_msg(MessageRole::User, "first lesson"))
        .await;
    h.controller.handle_event(ProviderEvent::CallEnd).await;

    h.controller.start().await.unwrap();

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Connecting);
    assert!(snapshot.transcript.is_empty());
    assert_eq!(h.provider.start_requests(), 2);
}

#[tokio::test]
async fn test_toggle_mute_requires_active_call() {
    let h = harness();

    assert!(!h.controller.toggle_mute().await);
    assert!(!h.provider.is_muted());

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;

    assert!(h.controller.toggle_mute().await);
    assert!(h.provider.is_muted());
    assert!(h.controller.snapshot().await.muted);

    assert!(!h.controller.toggle_mute().await);
    assert!(!h.provider.is_muted());
}

#[tokio::test]
async fn test_toggle_mute_follows_provider_state() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;

    // the backend was muted out-of-band; toggling unmutes
    h.provider.set_muted(true);
    assert!(!h.controller.toggle_mute().await);
    assert!(!h.provider.is_muted());
}

#[tokio::test]
async fn test_transport_start_failure_yields_idle_with_transport_notice() {
    let h = harness();

    h.provider
        .fail_next_start(ProviderError::classify("WebRTC connection failed"));

    let err = h.controller.start().await.unwrap_err();
    assert!(matches!(err, SessionError::TransportUnavailable(_)));

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Idle);
    let notice = snapshot.notice.expect("notice should be set");
    assert!(notice.contains("microphone access"));
}

#[tokio::test]
async fn test_generic_start_failure_carries_backend_message() {
    let h = harness();

    h.provider
        .fail_next_start(ProviderError::classify("concurrency quota exceeded"));

    let err = h.controller.start().await.unwrap_err();
    assert!(matches!(err, SessionError::StartFailed(_)));

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Idle);
    let notice = snapshot.notice.expect("notice should be set");
    assert!(notice.contains("concurrency quota exceeded"));
}

#[tokio::test]
async fn test_stop_failure_falls_back_to_idle() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.provider
        .fail_next_stop(ProviderError::classify("signaling channel lost"));

    let err = h.controller.stop().await.unwrap_err();
    assert!(matches!(err, SessionError::StopFailed(_)));
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Idle);
}

#[tokio::test]
async fn test_error_event_forces_idle() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller
        .handle_event(ProviderEvent::Error {
            message: "ejection from meeting".to_string(),
        })
        .await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Idle);
    assert!(snapshot.notice.unwrap().contains("ejection from meeting"));
}

#[tokio::test]
async fn test_call_end_records_history_exactly_once() {
    let h = harness();
    let companion_id = h.controller.companion().id;

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.handle_event(ProviderEvent::CallEnd).await;
    settle().await;

    let entries = h.history.recent(10).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].companion_id, companion_id);
    assert_eq!(entries[0].user_id, "user-1");

    // a duplicate call-end must not record again
    h.controller.handle_event(ProviderEvent::CallEnd).await;
    settle().await;
    assert_eq!(h.history.recent(10).await.len(), 1);
}

#[tokio::test]
async fn test_session_with_no_messages_ends_with_empty_transcript() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.handle_event(ProviderEvent::CallEnd).await;
    settle().await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Ended);
    assert!(snapshot.transcript.is_empty());
    assert_eq!(h.history.recent(10).await.len(), 1);
}

#[tokio::test]
async fn test_user_stop_records_history_once() {
    let h = harness();

    h.controller.start().await.unwrap();
    h.controller.handle_event(ProviderEvent::CallStart).await;
    h.controller.stop().await.unwrap();
    settle().await;

    // the stop and the backend's own call-end event together record once
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Ended);
    assert_eq!(h.provider.stop_requests(), 1);
    assert_eq!(h.history.recent(10).await.len(), 1);
}

#[tokio::test]
async fn test_stop_during_connecting_beats_late_start_failure() {
    let h = harness();

    let gate = h.provider.hold_next_start();

    let starter = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.start().await })
    };
    settle().await;
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Connecting);

    h.controller.stop().await.unwrap();
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Ended);

    // the abandoned attempt fails afterwards; it must not disturb the session
    gate.send(Err(ProviderError::classify("ICE negotiation failed")))
        .unwrap();
    let result = starter.await.unwrap();
    assert!(result.is_ok());

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Ended);
    assert!(snapshot.notice.is_none());
}

#[tokio::test]
async fn test_stop_during_connecting_beats_late_start_success() {
    let h = harness();

    let gate = h.provider.hold_next_start();

    let starter = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.start().await })
    };
    settle().await;

    h.controller.stop().await.unwrap();

    gate.send(Ok(())).unwrap();
    starter.await.unwrap().unwrap();
    settle().await;

    // the late acceptance must not resurrect the session
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Ended);
}

#[tokio::test]
async fn test_one_subscription_serves_successive_sessions() {
    let h = harness();

    // first session, driven through the backend's event stream
    h.controller.start().await.unwrap();
    h.provider.emit(ProviderEvent::CallStart);
    settle().await;
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Active);

    h.provider.emit(ProviderEvent::CallEnd);
    settle().await;
    assert_eq!(h.controller.snapshot().await.status, CallStatus::Ended);

    // second session over the same subscription
    h.controller.start().await.unwrap();
    h.provider
        .emit(final_msg(MessageRole::User, "too early, still connecting"));
    h.provider.emit(ProviderEvent::CallStart);
    h.provider.emit(final_msg(MessageRole::Assistant, "welcome back"));
    settle().await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.status, CallStatus::Active);
    assert_eq!(snapshot.transcript.len(), 1);
    assert_eq!(snapshot.transcript[0].text, "welcome back");

    settle().await;
    assert_eq!(h.history.recent(10).await.len(), 1);
}
