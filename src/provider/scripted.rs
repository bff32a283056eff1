use super::backend::{ProviderError, VoiceProvider};
use super::call::CallRequest;
use super::events::{CallMessage, MessageRole, ProviderEvent};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::debug;

/// Event channel capacity; a lesson produces a handful of events per turn.
const EVENT_CAPACITY: usize = 64;

/// One turn of a canned lesson.
#[derive(Debug, Clone)]
pub struct ScriptedLine {
    pub role: MessageRole,
    pub text: String,
}

impl ScriptedLine {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn companion(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// Deterministic in-process voice backend.
///
/// With a script, `start_call` replays a full lesson: call-start, one
/// finalized transcript per line (assistant lines wrapped in
/// speech-start/speech-end), then call-end. Without one, nothing is emitted
/// until [`ScriptedProvider::emit`] is called, which lets a caller drive
/// the event stream by hand. Start/stop failures can be injected, and an
/// in-flight start can be held open to observe late completions.
pub struct ScriptedProvider {
    events: broadcast::Sender<ProviderEvent>,
    script: Vec<ScriptedLine>,
    muted: AtomicBool,
    start_requests: AtomicUsize,
    stop_requests: AtomicUsize,
    next_start_error: Mutex<Option<ProviderError>>,
    next_stop_error: Mutex<Option<ProviderError>>,
    start_gate: Mutex<Option<oneshot::Receiver<Result<(), ProviderError>>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: Vec<ScriptedLine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            script,
            muted: AtomicBool::new(false),
            start_requests: AtomicUsize::new(0),
            stop_requests: AtomicUsize::new(0),
            next_start_error: Mutex::new(None),
            next_stop_error: Mutex::new(None),
            start_gate: Mutex::new(None),
        }
    }

    /// A short canned lesson, enough to exercise a full session.
    pub fn with_default_script() -> Self {
        Self::with_script(vec![
            ScriptedLine::companion("Welcome back! Today we are looking at photosynthesis."),
            ScriptedLine::user("Can you remind me what the light reactions produce?"),
            ScriptedLine::companion("They produce ATP and NADPH, which power the Calvin cycle."),
        ])
    }

    /// Push one event to every subscriber.
    pub fn emit(&self, event: ProviderEvent) {
        // send only fails when nobody is subscribed
        let _ = self.events.send(event);
    }

    /// Make the next `start_call` fail with `err`.
    pub fn fail_next_start(&self, err: ProviderError) {
        if let Ok(mut slot) = self.next_start_error.lock() {
            *slot = Some(err);
        }
    }

    /// Make the next `stop_call` fail with `err` (no call-end is emitted).
    pub fn fail_next_stop(&self, err: ProviderError) {
        if let Ok(mut slot) = self.next_stop_error.lock() {
            *slot = Some(err);
        }
    }

    /// Hold the next `start_call` open until the returned sender resolves
    /// it with a result.
    pub fn hold_next_start(&self) -> oneshot::Sender<Result<(), ProviderError>> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut slot) = self.start_gate.lock() {
            *slot = Some(rx);
        }
        tx
    }

    /// Number of start requests issued so far.
    pub fn start_requests(&self) -> usize {
        self.start_requests.load(Ordering::SeqCst)
    }

    /// Number of stop requests issued so far.
    pub fn stop_requests(&self) -> usize {
        self.stop_requests.load(Ordering::SeqCst)
    }

    fn replay_script(&self) {
        let events = self.events.clone();
        let script = self.script.clone();

        tokio::spawn(async move {
            let _ = events.send(ProviderEvent::CallStart);

            for line in script {
                tokio::time::sleep(Duration::from_millis(10)).await;

                if line.role == MessageRole::Assistant {
                    let _ = events.send(ProviderEvent::SpeechStart);
                }
                let _ = events.send(ProviderEvent::Message(CallMessage::final_transcript(
                    line.role, line.text,
                )));
                if line.role == MessageRole::Assistant {
                    let _ = events.send(ProviderEvent::SpeechEnd);
                }
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = events.send(ProviderEvent::CallEnd);
        });
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VoiceProvider for ScriptedProvider {
    async fn start_call(&self, request: CallRequest) -> Result<(), ProviderError> {
        self.start_requests.fetch_add(1, Ordering::SeqCst);
        debug!(
            "scripted start requested: companion={}, transcripts_only={}",
            request.companion_name,
            request.transcripts_only()
        );

        let gate = self.start_gate.lock().ok().and_then(|mut slot| slot.take());
        if let Some(gate) = gate {
            // a dropped gate sender counts as an accepted start
            gate.await.unwrap_or(Ok(()))?;
        }

        let injected = self
            .next_start_error
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(err) = injected {
            return Err(err);
        }

        if !self.script.is_empty() {
            self.replay_script();
        }

        Ok(())
    }

    async fn stop_call(&self) -> Result<(), ProviderError> {
        self.stop_requests.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .next_stop_error
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(err) = injected {
            return Err(err);
        }

        // real transports confirm teardown with their own call-end
        self.emit(ProviderEvent::CallEnd);
        Ok(())
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
