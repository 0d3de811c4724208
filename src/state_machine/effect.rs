//! Effects produced by state transitions

use crate::api::{ChatRequest, ContentRequest};
use crate::reference::Document;
use crate::state_machine::state::{ChatMode, GenerationKind, Message};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Tell the backend to drop its history for `mode`. Fire-and-forget.
    ClearRemote { mode: ChatMode },

    /// Send one chat turn
    RequestChat { epoch: u64, request: ChatRequest },

    /// Generate an image from a final prompt
    RequestImage { epoch: u64, prompt: String },

    /// Generate a storyboard or outline from a final prompt
    RequestContent {
        epoch: u64,
        kind: GenerationKind,
        request: ContentRequest,
    },

    /// Upload a reference document for text extraction
    UploadDocument { epoch: u64, document: Document },

    /// Notify the front end
    NotifyClient(UiEvent),
}

impl Effect {
    pub fn message_appended(index: usize, message: &Message) -> Self {
        Effect::NotifyClient(UiEvent::MessageAppended {
            index,
            message: message.clone(),
        })
    }

    pub fn toast_error(text: impl Into<String>) -> Self {
        Effect::NotifyClient(UiEvent::Notice(Notice::error(text)))
    }
}

/// What the front end needs to know after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SessionReset {
        mode: ChatMode,
    },
    MessageAppended {
        index: usize,
        message: Message,
    },
    ChatPending,
    GenerationStarted {
        kind: GenerationKind,
        owner: usize,
    },
    ImageReady {
        url: String,
    },
    ContentReady {
        kind: GenerationKind,
        content: String,
    },
    UploadStarted,
    ReferenceUpdated {
        status: String,
    },
    ReferencePanel {
        open: bool,
    },
    /// The backend rejected our credentials
    AuthExpired,
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    /// Blocking validation message, shown before any request is made
    Alert,
}

/// Toast or alert text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            text: text.into(),
        }
    }
}
