//! Pure state transition function
//!
//! Given the same state and event this always produces the same new state
//! and effects. All network work is described by effects and comes back as
//! result events carrying the epoch it was issued in.

use super::state::{find_last_qualifying, ClientState, Flight, GenerationKind, Message, Session};
use super::{ChatMode, Effect, Event, Notice, SessionContext, UiEvent};
use crate::api::{ApiError, ChatRequest, ContentRequest};
use crate::reference::{text_reference_status, DOCX_MIME, UPLOAD_FAILED_STATUS};
use crate::state_machine::state::APOLOGY_MESSAGE;
use thiserror::Error;

const CHAT_FAILED: &str = "Failed to get response from assistant";
const UPLOAD_SUCCEEDED: &str = "Reference content uploaded successfully";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ClientState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ClientState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events rejected before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A chat request is already in flight")]
    ChatBusy,
    #[error("A {0} generation is already running")]
    GenerationBusy(GenerationKind),
    #[error("No final prompt found to generate from")]
    NoFinalPrompt,
    #[error("Message {0} is not a final prompt")]
    NotFinalPrompt(usize),
    #[error("Please upload a Word document (.docx)")]
    UnsupportedDocument { mime: String },
    #[error("Please enter some text")]
    EmptyReference,
    #[error("A document is already uploading")]
    UploadBusy,
}

impl TransitionError {
    /// What the user sees for this rejection. `None` means the event is
    /// dropped silently (the trigger would have been disabled anyway).
    pub fn notice(&self) -> Option<Notice> {
        match self {
            TransitionError::EmptyMessage | TransitionError::ChatBusy => None,
            TransitionError::UnsupportedDocument { .. } | TransitionError::EmptyReference => {
                Some(Notice::alert(self.to_string()))
            }
            TransitionError::GenerationBusy(_)
            | TransitionError::NoFinalPrompt
            | TransitionError::NotFinalPrompt(_)
            | TransitionError::UploadBusy => Some(Notice::error(self.to_string())),
        }
    }
}

/// Pure transition function
pub fn transition(
    state: &ClientState,
    _context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Session reset
        // ============================================================
        Event::ModeSelected { mode } if mode == state.mode() => {
            Ok(TransitionResult::new(state.clone()))
        }
        Event::ModeSelected { mode } => Ok(reset(state, mode)),
        Event::ClearRequested => Ok(reset(state, state.mode())),

        // ============================================================
        // Send message
        // ============================================================
        Event::UserMessage { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            if state.chat.is_busy() {
                return Err(TransitionError::ChatBusy);
            }

            let mut next = state.clone();
            let message = Message::user(text);
            let index = push_message(&mut next.session, message.clone());
            next.chat = Flight::pending(next.epoch);

            let request = ChatRequest {
                message: text.to_string(),
                mode: next.mode(),
                reference_content: next.session.attached_reference(),
            };
            let epoch = next.epoch;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::message_appended(index, &message))
                .with_effect(Effect::NotifyClient(UiEvent::ChatPending))
                .with_effect(Effect::RequestChat { epoch, request }))
        }

        Event::ChatReplied { epoch, result } => {
            let mut next = state.clone();
            next.chat = release(next.chat, epoch);
            if epoch != state.epoch {
                return Ok(TransitionResult::new(next));
            }

            match result {
                Ok(reply) => {
                    let message = Message {
                        is_final_prompt: reply.is_final_prompt,
                        ..Message::assistant(reply.response)
                    };
                    let index = push_message(&mut next.session, message.clone());
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::message_appended(index, &message)))
                }
                Err(error) => {
                    let message = Message::assistant(APOLOGY_MESSAGE);
                    let index = push_message(&mut next.session, message.clone());
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::message_appended(index, &message))
                        .with_effects(failure_effects(&error, CHAT_FAILED)))
                }
            }
        }

        // ============================================================
        // Generate artifact
        // ============================================================
        Event::GenerateRequested { message_index } => {
            let kind = state.mode().generation_kind();
            if state.generation_flight(kind).is_busy() {
                return Err(TransitionError::GenerationBusy(kind));
            }

            let messages = state.messages();
            if let Some(index) = message_index {
                let qualifies = messages
                    .get(index)
                    .is_some_and(Message::qualifies_for_generation);
                if !qualifies {
                    return Err(TransitionError::NotFinalPrompt(index));
                }
            }

            let (latest, source) =
                find_last_qualifying(messages).ok_or(TransitionError::NoFinalPrompt)?;
            if source.content.trim().is_empty() {
                return Err(TransitionError::NoFinalPrompt);
            }
            let prompt = source.content.clone();
            let owner = message_index.unwrap_or(latest);

            let mut next = state.clone();
            let epoch = next.epoch;
            let action = Message::user(kind.action_text());
            let action_index = push_message(&mut next.session, action.clone());
            let started = [
                Effect::message_appended(action_index, &action),
                Effect::NotifyClient(UiEvent::GenerationStarted { kind, owner }),
            ];

            if kind.is_image() {
                next.image = Flight::pending_for(epoch, owner);
                next.session.generated_image_url.clear();
                Ok(TransitionResult::new(next)
                    .with_effects(started)
                    .with_effect(Effect::RequestImage { epoch, prompt }))
            } else {
                next.content = Flight::pending_for(epoch, owner);
                next.session.generated_content.clear();
                let reference_content = match kind {
                    GenerationKind::Storyboard => next.session.attached_reference(),
                    GenerationKind::Outline | GenerationKind::Image => None,
                };
                let request = ContentRequest {
                    prompt,
                    reference_content,
                };
                Ok(TransitionResult::new(next)
                    .with_effects(started)
                    .with_effect(Effect::RequestContent {
                        epoch,
                        kind,
                        request,
                    }))
            }
        }

        Event::ImageGenerated { epoch, result } => {
            let mut next = state.clone();
            next.image = release(next.image, epoch);
            if epoch != state.epoch {
                return Ok(TransitionResult::new(next));
            }

            match result {
                Ok(url) => {
                    next.session.generated_image_url.clone_from(&url);
                    let message = Message::generated_image(&url);
                    let index = push_message(&mut next.session, message.clone());
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::message_appended(index, &message))
                        .with_effect(Effect::NotifyClient(UiEvent::ImageReady { url })))
                }
                Err(error) => Ok(TransitionResult::new(next).with_effects(failure_effects(
                    &error,
                    GenerationKind::Image.failure_text(),
                ))),
            }
        }

        Event::ContentGenerated {
            epoch,
            kind,
            result,
        } => {
            let mut next = state.clone();
            next.content = release(next.content, epoch);
            if epoch != state.epoch {
                return Ok(TransitionResult::new(next));
            }

            match result {
                Ok(content) => {
                    next.session.generated_content.clone_from(&content);
                    let message = Message::generated_content(kind, &content);
                    let index = push_message(&mut next.session, message.clone());
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::message_appended(index, &message))
                        .with_effect(Effect::NotifyClient(UiEvent::ContentReady { kind, content })))
                }
                Err(error) => Ok(TransitionResult::new(next)
                    .with_effects(failure_effects(&error, kind.failure_text()))),
            }
        }

        // ============================================================
        // Reference content
        // ============================================================
        Event::ReferencePanelOpened => Ok(set_panel(state, true)),
        Event::ReferencePanelClosed => Ok(set_panel(state, false)),

        Event::ReferenceTextSubmitted { text } => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyReference);
            }
            let mut next = state.clone();
            next.session.reference_status = text_reference_status(&text);
            next.session.reference_content = text;
            next.reference_panel_open = false;
            let status = next.session.reference_status.clone();

            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyClient(UiEvent::ReferenceUpdated { status }))
                .with_effect(Effect::NotifyClient(UiEvent::ReferencePanel { open: false })))
        }

        Event::DocumentSelected { document } => {
            if document.mime_type != DOCX_MIME {
                return Err(TransitionError::UnsupportedDocument {
                    mime: document.mime_type,
                });
            }
            if state.upload.is_busy() {
                return Err(TransitionError::UploadBusy);
            }

            let mut next = state.clone();
            next.upload = Flight::pending(next.epoch);
            let epoch = next.epoch;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyClient(UiEvent::UploadStarted))
                .with_effect(Effect::UploadDocument { epoch, document }))
        }

        Event::DocumentUploaded { epoch, result } => {
            let mut next = state.clone();
            next.upload = release(next.upload, epoch);
            if epoch != state.epoch {
                return Ok(TransitionResult::new(next));
            }

            match result {
                Ok(uploaded) => {
                    next.session.reference_content = uploaded.content;
                    next.session.reference_status.clone_from(&uploaded.status);
                    next.reference_panel_open = false;
                    Ok(TransitionResult::new(next)
                        .with_effect(Effect::NotifyClient(UiEvent::ReferenceUpdated {
                            status: uploaded.status,
                        }))
                        .with_effect(Effect::NotifyClient(UiEvent::ReferencePanel { open: false }))
                        .with_effect(Effect::NotifyClient(UiEvent::Notice(Notice::success(
                            UPLOAD_SUCCEEDED,
                        )))))
                }
                Err(error) => {
                    // Prior reference content stays in place
                    next.session.reference_status = UPLOAD_FAILED_STATUS.to_string();
                    let mut result = TransitionResult::new(next).with_effect(
                        Effect::NotifyClient(UiEvent::ReferenceUpdated {
                            status: UPLOAD_FAILED_STATUS.to_string(),
                        }),
                    );
                    if error.is_auth() {
                        result = result.with_effect(Effect::NotifyClient(UiEvent::AuthExpired));
                    }
                    Ok(result)
                }
            }
        }
    }
}

/// Replace the whole session with a freshly seeded one for `mode`.
/// In-flight requests are not cancelled; bumping the epoch makes their
/// results inert when they arrive.
fn reset(state: &ClientState, mode: ChatMode) -> TransitionResult {
    let mut next = state.clone();
    next.epoch = state.epoch.wrapping_add(1);
    next.session = Session::new(mode);
    next.reference_panel_open = false;

    TransitionResult::new(next)
        .with_effect(Effect::NotifyClient(UiEvent::SessionReset { mode }))
        .with_effect(Effect::ClearRemote { mode })
}

fn set_panel(state: &ClientState, open: bool) -> TransitionResult {
    let mut next = state.clone();
    next.reference_panel_open = open;
    TransitionResult::new(next).with_effect(Effect::NotifyClient(UiEvent::ReferencePanel { open }))
}

/// A result for the request issued in `epoch` arrived; free its guard.
fn release(flight: Flight, epoch: u64) -> Flight {
    match flight {
        Flight::Pending { epoch: issued, .. } if issued == epoch => Flight::Idle,
        other => other,
    }
}

fn push_message(session: &mut Session, message: Message) -> usize {
    session.messages.push(message);
    session.messages.len() - 1
}

/// Toast text for a failed request: the server's own message when it
/// rejected the call, the fixed fallback otherwise.
fn failure_effects(error: &ApiError, fallback: &str) -> Vec<Effect> {
    let text = error.server_message().unwrap_or(fallback);
    let mut effects = vec![Effect::toast_error(text)];
    if error.is_auth() {
        effects.push(Effect::NotifyClient(UiEvent::AuthExpired));
    }
    effects
}
