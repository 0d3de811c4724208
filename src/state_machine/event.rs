//! Events that can occur in a prompt-builder session

use crate::api::{ApiError, ChatReply, UploadedReference};
use crate::reference::Document;
use crate::state_machine::state::{ChatMode, GenerationKind};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    ModeSelected {
        mode: ChatMode,
    },
    ClearRequested,
    UserMessage {
        text: String,
    },
    /// Generate from a final prompt. `message_index` is the transcript entry
    /// the trigger belongs to; `None` means "the latest one".
    GenerateRequested {
        message_index: Option<usize>,
    },
    ReferencePanelOpened,
    ReferencePanelClosed,
    ReferenceTextSubmitted {
        text: String,
    },
    DocumentSelected {
        document: Document,
    },

    // Network results. `epoch` is the session epoch the request was issued in.
    ChatReplied {
        epoch: u64,
        result: Result<ChatReply, ApiError>,
    },
    ImageGenerated {
        epoch: u64,
        result: Result<String, ApiError>,
    },
    ContentGenerated {
        epoch: u64,
        kind: GenerationKind,
        result: Result<String, ApiError>,
    },
    DocumentUploaded {
        epoch: u64,
        result: Result<UploadedReference, ApiError>,
    },
}

impl Event {
    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            Event::ModeSelected { .. } => "mode_selected",
            Event::ClearRequested => "clear_requested",
            Event::UserMessage { .. } => "user_message",
            Event::GenerateRequested { .. } => "generate_requested",
            Event::ReferencePanelOpened => "reference_panel_opened",
            Event::ReferencePanelClosed => "reference_panel_closed",
            Event::ReferenceTextSubmitted { .. } => "reference_text_submitted",
            Event::DocumentSelected { .. } => "document_selected",
            Event::ChatReplied { .. } => "chat_replied",
            Event::ImageGenerated { .. } => "image_generated",
            Event::ContentGenerated { .. } => "content_generated",
            Event::DocumentUploaded { .. } => "document_uploaded",
        }
    }
}
