//! Runtime for a prompt-builder session
//!
//! One [`SessionRuntime`] owns the [`ClientState`] and is the only writer.
//! Front ends talk to it through a [`SessionHandle`]: events go in over an
//! mpsc channel, UI notifications come out over a broadcast channel and the
//! latest state snapshot is published on a watch channel.

mod executor;


pub use executor::SessionRuntime;

use crate::api::{ImageService, PromptBuilderApi};
use crate::config::AuthContext;
use crate::state_machine::{ChatMode, ClientState, Event, SessionContext, UiEvent};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const UI_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    event_tx: mpsc::Sender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
    state_rx: watch::Receiver<ClientState>,
}

impl SessionHandle {
    pub async fn send(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    /// Latest published state
    pub fn state(&self) -> ClientState {
        self.state_rx.borrow().clone()
    }

    #[cfg(test)]
    pub fn watch_state(&self) -> watch::Receiver<ClientState> {
        self.state_rx.clone()
    }
}

/// Spawn a runtime for a fresh session in `mode`.
///
/// The session is seeded locally; the backend clear endpoint is only called
/// on later resets.
/// The runtime stops once every clone of the returned handle is dropped.
pub fn start_session<A, I>(api: A, images: I, auth: AuthContext, mode: ChatMode) -> SessionHandle
where
    A: PromptBuilderApi + 'static,
    I: ImageService + 'static,
{
    let session_id = uuid::Uuid::new_v4().to_string();
    let context = SessionContext::new(session_id.clone());
    let state = ClientState::new(mode);

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (ui_tx, _) = broadcast::channel(UI_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(state.clone());

    let runtime = SessionRuntime::new(
        context,
        state,
        api,
        images,
        auth,
        event_rx,
        event_tx.downgrade(),
        ui_tx.clone(),
        state_tx,
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        session_id,
        event_tx,
        ui_tx,
        state_rx,
    }
}
