//! Session runtime executor

use crate::api::{ImageService, PromptBuilderApi};
use crate::config::AuthContext;
use crate::state_machine::{
    transition, ClientState, Effect, Event, SessionContext, TransitionError, UiEvent,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Event loop for one session, generic over the backend implementations
pub struct SessionRuntime<A, I>
where
    A: PromptBuilderApi + 'static,
    I: ImageService + 'static,
{
    context: SessionContext,
    state: ClientState,
    api: Arc<A>,
    images: Arc<I>,
    auth: AuthContext,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the loop ends once every handle is dropped
    event_tx: mpsc::WeakSender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
    state_tx: watch::Sender<ClientState>,
}

impl<A, I> SessionRuntime<A, I>
where
    A: PromptBuilderApi + 'static,
    I: ImageService + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: SessionContext,
        state: ClientState,
        api: A,
        images: I,
        auth: AuthContext,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        ui_tx: broadcast::Sender<UiEvent>,
        state_tx: watch::Sender<ClientState>,
    ) -> Self {
        Self {
            context,
            state,
            api: Arc::new(api),
            images: Arc::new(images),
            auth,
            event_rx,
            event_tx,
            ui_tx,
            state_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.context.session_id,
            mode = %self.state.mode(),
            "Starting session runtime"
        );

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let name = event.name();
        tracing::debug!(event = name, epoch = self.state.epoch, "Processing event");

        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                self.report_rejection(name, &e);
                return;
            }
        };

        let previous_epoch = self.state.epoch;
        self.state = result.new_state;
        if self.state.epoch != previous_epoch {
            tracing::info!(
                mode = %self.state.mode(),
                epoch = self.state.epoch,
                "Session reset"
            );
        }
        self.state_tx.send_replace(self.state.clone());

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn report_rejection(&self, event: &str, error: &TransitionError) {
        match error.notice() {
            Some(notice) => {
                tracing::info!(event, error = %error, "Event rejected");
                let _ = self.ui_tx.send(UiEvent::Notice(notice));
            }
            None => tracing::debug!(event, error = %error, "Event ignored"),
        }
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::ClearRemote { mode } => {
                // Fire-and-forget: nothing waits on the clear, and a failure
                // leaves the local reset in place
                let api = self.api.clone();
                let auth = self.auth.clone();
                tokio::spawn(async move {
                    if let Err(e) = api.clear_chat(mode, &auth).await {
                        tracing::warn!(%mode, error = %e, "Failed to clear remote chat history");
                    }
                });
            }

            Effect::RequestChat { epoch, request } => {
                let api = self.api.clone();
                let auth = self.auth.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = api.prompt_chat(&request, &auth).await;
                    deliver(&event_tx, Event::ChatReplied { epoch, result }).await;
                });
            }

            Effect::RequestImage { epoch, prompt } => {
                let images = self.images.clone();
                let auth = self.auth.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = images.generate_image(&prompt, &auth).await;
                    deliver(&event_tx, Event::ImageGenerated { epoch, result }).await;
                });
            }

            Effect::RequestContent {
                epoch,
                kind,
                request,
            } => {
                let api = self.api.clone();
                let auth = self.auth.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = api.generate_content(kind, &request, &auth).await;
                    deliver(
                        &event_tx,
                        Event::ContentGenerated {
                            epoch,
                            kind,
                            result,
                        },
                    )
                    .await;
                });
            }

            Effect::UploadDocument { epoch, document } => {
                let api = self.api.clone();
                let auth = self.auth.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tracing::info!(
                        file_name = %document.file_name,
                        bytes = document.bytes.len(),
                        "Uploading reference document"
                    );
                    let result = api.upload_document(&document, &auth).await;
                    deliver(&event_tx, Event::DocumentUploaded { epoch, result }).await;
                });
            }

            Effect::NotifyClient(ui_event) => {
                // No subscribers is fine
                let _ = self.ui_tx.send(ui_event);
            }
        }
    }
}

/// Send a result back to the loop, unless the session has been dropped
/// while the request was in flight
async fn deliver(event_tx: &mpsc::WeakSender<Event>, event: Event) {
    let name = event.name();
    let Some(event_tx) = event_tx.upgrade() else {
        tracing::debug!(event = name, "Session closed, dropping result");
        return;
    };
    if event_tx.send(event).await.is_err() {
        tracing::debug!(event = name, "Runtime gone, dropping result");
    }
}
