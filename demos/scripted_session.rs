use anyhow::Result;
use companion_sessions::{
    CallStatus, Companion, InMemoryHistory, NewCompanion, ScriptedProvider, SessionController,
    SessionDescriptor, SessionHistory,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let companion = Companion::create(NewCompanion {
        name: "Flora".to_string(),
        subject: "biology".to_string(),
        topic: "photosynthesis".to_string(),
        voice: "female".to_string(),
        style: "casual".to_string(),
        duration_minutes: 15,
        author: "demo-user".to_string(),
    });

    let descriptor = SessionDescriptor {
        companion,
        user_id: "demo-user".to_string(),
        user_name: "Demo User".to_string(),
        user_image: None,
    };

    let provider = Arc::new(ScriptedProvider::with_default_script());
    let history: Arc<InMemoryHistory> = Arc::new(InMemoryHistory::new());
    let controller = SessionController::new(descriptor, provider, history.clone());

    controller.start().await?;
    info!("Session starting, waiting for the scripted lesson to finish...");

    // The canned lesson ends on its own; poll until it does.
    for _ in 0..100 {
        sleep(Duration::from_millis(50)).await;
        if controller.snapshot().await.status == CallStatus::Ended {
            break;
        }
    }

    let snapshot = controller.snapshot().await;
    info!("Final status: {:?}", snapshot.status);

    info!("Transcript (newest first):");
    for utterance in &snapshot.transcript {
        info!("  {:?}: {}", utterance.speaker, utterance.text);
    }

    for entry in history.recent(10).await {
        info!(
            "History: user {} studied with companion {} at {}",
            entry.user_id, entry.companion_id, entry.recorded_at
        );
    }

    Ok(())
}
