use super::snapshot::SessionSnapshot;
use super::transcript::{Speaker, Utterance};
use crate::companion::Companion;
use crate::history::SessionHistory;
use crate::provider::{CallRequest, ProviderError, ProviderEvent, VoiceProvider};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle status of a lesson session.
///
/// Strictly sequential: idle → connecting → active → ended, then back to
/// connecting on the next start. Ended is terminal until the user restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Idle,
    Connecting,
    Active,
    Ended,
}

/// Immutable inputs for one controller: the companion persona and the user
/// on the other side of the call.
#[derive(Debug, Clone)]
pub struct SessionDescriptor {
    pub companion: Companion,
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
}

/// Session command failure, carrying the user-facing message as its
/// Display output.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "unable to start the session: make sure the app is served over a \
         secure origin and microphone access is granted"
    )]
    TransportUnavailable(#[source] ProviderError),

    #[error("failed to start the session: {0}")]
    StartFailed(#[source] ProviderError),

    #[error("failed to end the session: {0}")]
    StopFailed(#[source] ProviderError),
}

impl SessionError {
    fn start_failure(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(_) => SessionError::TransportUnavailable(err),
            ProviderError::Call(_) => SessionError::StartFailed(err),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    status: CallStatus,
    speaking: bool,
    muted: bool,

    /// Bumped by every start and stop; a late completion of an in-flight
    /// start whose epoch no longer matches is discarded.
    epoch: u64,

    /// Guards the once-per-session history notification.
    history_recorded: bool,

    notice: Option<String>,
    transcript: VecDeque<Utterance>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: CallStatus::Idle,
            speaking: false,
            muted: false,
            epoch: 0,
            history_recorded: false,
            notice: None,
            transcript: VecDeque::new(),
        }
    }
}

/// Owns the lifecycle of one voice-lesson session: mediates between user
/// commands, the voice backend's event stream, and the rendered state.
///
/// The event stream is subscribed exactly once, at construction, and the
/// subscription survives any number of start/stop cycles; it is torn down
/// when the controller is dropped.
pub struct SessionController {
    descriptor: SessionDescriptor,
    provider: Arc<dyn VoiceProvider>,
    history: Arc<dyn SessionHistory>,
    state: Arc<Mutex<SessionState>>,
    pump: JoinHandle<()>,
}

impl SessionController {
    pub fn new(
        descriptor: SessionDescriptor,
        provider: Arc<dyn VoiceProvider>,
        history: Arc<dyn SessionHistory>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::new()));

        let mut events = provider.events();
        let pump = tokio::spawn({
            let state = Arc::clone(&state);
            let history = Arc::clone(&history);
            let companion_id = descriptor.companion.id;
            let user_id = descriptor.user_id.clone();
            let backend = provider.name().to_string();

            async move {
                debug!("event pump started for backend {}", backend);

                loop {
                    match events.recv().await {
                        Ok(event) => {
                            Self::apply_event(&state, &history, companion_id, &user_id, event)
                                .await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("event stream lagged, {} events dropped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                debug!("event pump stopped");
            }
        });

        Self {
            descriptor,
            provider,
            history,
            state,
            pump,
        }
    }

    /// Start a new session.
    ///
    /// A no-op unless the session is idle or ended. On a start failure the
    /// session falls back to idle and the error's Display output is the
    /// message to show the user; there are no retries.
    pub async fn start(&self) -> Result<(), SessionError> {
        let (epoch, request) = {
            let mut s = self.state.lock().await;
            if !matches!(s.status, CallStatus::Idle | CallStatus::Ended) {
                debug!("start ignored while {:?}", s.status);
                return Ok(());
            }

            s.status = CallStatus::Connecting;
            s.speaking = false;
            s.muted = self.provider.is_muted();
            s.transcript.clear();
            s.notice = None;
            s.history_recorded = false;
            s.epoch += 1;

            (s.epoch, CallRequest::for_companion(&self.descriptor.companion))
        };

        info!(
            "starting session with companion {}",
            self.descriptor.companion.id
        );

        match self.provider.start_call(request).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut s = self.state.lock().await;
                if s.epoch != epoch {
                    // the user already abandoned this attempt
                    debug!("discarding stale start failure: {}", err);
                    return Ok(());
                }

                s.status = CallStatus::Idle;
                let failure = SessionError::start_failure(err);
                s.notice = Some(failure.to_string());
                Err(failure)
            }
        }
    }

    /// End the current session.
    ///
    /// Allowed from any non-terminal state, including connecting, to abort
    /// an in-flight attempt. If the backend cannot confirm termination the
    /// session falls back to idle rather than ended.
    pub async fn stop(&self) -> Result<(), SessionError> {
        {
            let mut s = self.state.lock().await;
            if matches!(s.status, CallStatus::Idle | CallStatus::Ended) {
                debug!("stop ignored while {:?}", s.status);
                return Ok(());
            }

            // invalidate any in-flight start
            s.epoch += 1;
        }

        info!(
            "stopping session with companion {}",
            self.descriptor.companion.id
        );

        match self.provider.stop_call().await {
            Ok(()) => {
                let mut s = self.state.lock().await;
                if matches!(s.status, CallStatus::Connecting | CallStatus::Active) {
                    s.status = CallStatus::Ended;
                    s.speaking = false;
                    Self::record_usage_once(
                        &mut s,
                        &self.history,
                        self.descriptor.companion.id,
                        &self.descriptor.user_id,
                    );
                }
                Ok(())
            }
            Err(err) => {
                let mut s = self.state.lock().await;
                s.status = CallStatus::Idle;
                s.speaking = false;
                let failure = SessionError::StopFailed(err);
                s.notice = Some(failure.to_string());
                Err(failure)
            }
        }
    }

    /// Invert the local microphone mute state and apply it to the backend.
    ///
    /// A no-op outside an active call. Returns the resulting mute state.
    pub async fn toggle_mute(&self) -> bool {
        let mut s = self.state.lock().await;
        if s.status != CallStatus::Active {
            debug!("mute toggle ignored while {:?}", s.status);
            return s.muted;
        }

        let muted = !self.provider.is_muted();
        self.provider.set_muted(muted);
        s.muted = muted;
        info!("microphone {}", if muted { "muted" } else { "unmuted" });
        muted
    }

    /// Apply one backend event to the session.
    ///
    /// The internal event pump feeds this from the backend's stream; it is
    /// public so callers holding their own receiver can forward events.
    pub async fn handle_event(&self, event: ProviderEvent) {
        Self::apply_event(
            &self.state,
            &self.history,
            self.descriptor.companion.id,
            &self.descriptor.user_id,
            event,
        )
        .await;
    }

    /// Copy of the current observable state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.lock().await;
        SessionSnapshot {
            status: s.status,
            speaking: s.speaking,
            muted: s.muted,
            notice: s.notice.clone(),
            transcript: s.transcript.iter().cloned().collect(),
        }
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn companion(&self) -> &Companion {
        &self.descriptor.companion
    }

    async fn apply_event(
        state: &Arc<Mutex<SessionState>>,
        history: &Arc<dyn SessionHistory>,
        companion_id: Uuid,
        user_id: &str,
        event: ProviderEvent,
    ) {
        let mut s = state.lock().await;

        match event {
            ProviderEvent::CallStart => {
                if s.status == CallStatus::Connecting {
                    s.status = CallStatus::Active;
                    s.transcript.clear();
                    s.notice = None;
                    info!("session active with companion {}", companion_id);
                }
            }
            ProviderEvent::CallEnd => {
                if matches!(s.status, CallStatus::Connecting | CallStatus::Active) {
                    s.status = CallStatus::Ended;
                    s.speaking = false;
                    info!("session ended with companion {}", companion_id);
                    Self::record_usage_once(&mut s, history, companion_id, user_id);
                }
            }
            ProviderEvent::Error { message } => {
                warn!("session error from backend: {}", message);
                s.status = CallStatus::Idle;
                s.speaking = false;
                s.notice = Some(format!("session error: {}", message));
            }
            ProviderEvent::SpeechStart => {
                if s.status == CallStatus::Active {
                    s.speaking = true;
                }
            }
            ProviderEvent::SpeechEnd => {
                if s.status == CallStatus::Active {
                    s.speaking = false;
                }
            }
            ProviderEvent::Message(msg) => {
                if s.status == CallStatus::Active && msg.is_final_transcript() {
                    s.transcript
                        .push_front(Utterance::new(Speaker::from(msg.role), msg.transcript));
                }
            }
        }
    }

    /// Notify the history recorder, at most once per session. Fire and
    /// forget: a recording failure is logged and never affects the session.
    fn record_usage_once(
        state: &mut SessionState,
        history: &Arc<dyn SessionHistory>,
        companion_id: Uuid,
        user_id: &str,
    ) {
        if state.history_recorded {
            return;
        }
        state.history_recorded = true;

        let history = Arc::clone(history);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = history.record_usage(companion_id, &user_id).await {
                warn!(
                    "failed to record session history for companion {}: {:#}",
                    companion_id, err
                );
            }
        });
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
