//! Session state types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NO_REFERENCE_STATUS: &str = "No reference content loaded.";
pub const APOLOGY_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

// ============================================================================
// Modes
// ============================================================================

/// The three fixed generation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Image,
    Elearning,
    Outline,
}

impl ChatMode {
    #[cfg(test)]
    pub const ALL: [ChatMode; 3] = [ChatMode::Image, ChatMode::Elearning, ChatMode::Outline];

    pub fn as_str(self) -> &'static str {
        match self {
            ChatMode::Image => "image",
            ChatMode::Elearning => "elearning",
            ChatMode::Outline => "outline",
        }
    }

    /// Canned user prompt that opens every session in this mode
    pub fn seed_prompt(self) -> &'static str {
        match self {
            ChatMode::Image => {
                "Hi, I want to create an AI-generated image, but I don't know how to describe it well."
            }
            ChatMode::Elearning => "Hi, I need help creating content for an e-learning course.",
            ChatMode::Outline => "Hi, I need help creating an outline for an e-learning course.",
        }
    }

    pub fn greeting(self) -> String {
        format!(
            "I'm here to help you with your {} needs. What would you like to create?",
            self.as_str()
        )
    }

    /// Which artifact a final prompt turns into in this mode
    pub fn generation_kind(self) -> GenerationKind {
        match self {
            ChatMode::Image => GenerationKind::Image,
            ChatMode::Elearning => GenerationKind::Storyboard,
            ChatMode::Outline => GenerationKind::Outline,
        }
    }

    /// Only e-learning requests carry reference content
    pub fn uses_reference(self) -> bool {
        matches!(self, ChatMode::Elearning)
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatMode::Image => "Image Generation",
            ChatMode::Elearning => "E-Learning Content",
            ChatMode::Outline => "E-Learning Outline",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected image, elearning or outline)")]
pub struct UnknownMode(pub String);

impl FromStr for ChatMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ChatMode::Image),
            "elearning" | "e-learning" => Ok(ChatMode::Elearning),
            "outline" => Ok(ChatMode::Outline),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Artifact produced from a final prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Image,
    Storyboard,
    Outline,
}

impl GenerationKind {
    /// Image generation and text generation have separate busy flags
    pub fn is_image(self) -> bool {
        matches!(self, GenerationKind::Image)
    }

    pub fn button_text(self) -> &'static str {
        match self {
            GenerationKind::Image => "Generate Image",
            GenerationKind::Storyboard => "Generate Storyboard",
            GenerationKind::Outline => "Generate Outline",
        }
    }

    pub fn progress_text(self) -> &'static str {
        match self {
            GenerationKind::Image => "Generating image...",
            GenerationKind::Storyboard => "Generating storyboard...",
            GenerationKind::Outline => "Generating outline...",
        }
    }

    /// User line appended to the transcript when generation starts
    pub fn action_text(self) -> &'static str {
        match self {
            GenerationKind::Image => "Generate image from above prompt",
            GenerationKind::Storyboard => "Generate storyboard from above prompt",
            GenerationKind::Outline => "Generate outline from above prompt",
        }
    }

    pub fn result_title(self) -> &'static str {
        match self {
            GenerationKind::Image => "Generated Image:",
            GenerationKind::Storyboard => "Generated Storyboard:",
            GenerationKind::Outline => "Generated Outline:",
        }
    }

    pub fn failure_text(self) -> &'static str {
        match self {
            GenerationKind::Image => "Failed to generate image",
            GenerationKind::Storyboard | GenerationKind::Outline => "Failed to generate content",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GenerationKind::Image => "image",
            GenerationKind::Storyboard => "storyboard",
            GenerationKind::Outline => "outline",
        })
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Content is raw text or HTML; it is rendered through
/// a markdown pass before display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, rename = "isFinalPrompt", skip_serializing_if = "std::ops::Not::not")]
    pub is_final_prompt: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            is_final_prompt: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_final_prompt: false,
        }
    }

    pub fn final_prompt(content: impl Into<String>) -> Self {
        Self {
            is_final_prompt: true,
            ..Self::assistant(content)
        }
    }

    /// Assistant entry showing a generated image inline
    pub fn generated_image(url: &str) -> Self {
        Self::assistant(format!(
            "<div class=\"generated-image-container\">\n<h4>{}</h4>\n<img src=\"{url}\" alt=\"Generated image\" />\n</div>",
            GenerationKind::Image.result_title()
        ))
    }

    /// Assistant entry carrying a generated storyboard or outline. The body
    /// sits between blank lines so it still renders as markdown.
    pub fn generated_content(kind: GenerationKind, content: &str) -> Self {
        Self::assistant(format!(
            "<div class=\"generated-content-container\">\n<h4>{}</h4>\n\n{content}\n\n</div>",
            kind.result_title()
        ))
    }

    /// Assistant messages flagged as a final prompt can trigger generation
    pub fn qualifies_for_generation(&self) -> bool {
        self.role == Role::Assistant && self.is_final_prompt
    }
}

/// Most recent assistant message flagged as a final prompt, with its index.
/// Scans in reverse so the last match wins.
pub fn find_last_qualifying(messages: &[Message]) -> Option<(usize, &Message)> {
    messages
        .iter()
        .enumerate()
        .rev()
        .find(|(_, m)| m.qualifies_for_generation())
}

// ============================================================================
// Session
// ============================================================================

/// Everything a reset replaces in one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub mode: ChatMode,
    pub messages: Vec<Message>,
    pub reference_content: String,
    pub reference_status: String,
    pub generated_content: String,
    pub generated_image_url: String,
}

impl Session {
    /// Fresh session seeded with the mode's canned prompt and greeting
    pub fn new(mode: ChatMode) -> Self {
        Self {
            mode,
            messages: vec![Message::user(mode.seed_prompt()), Message::assistant(mode.greeting())],
            reference_content: String::new(),
            reference_status: NO_REFERENCE_STATUS.to_string(),
            generated_content: String::new(),
            generated_image_url: String::new(),
        }
    }

    /// Reference text to attach to a request, if the mode uses it and any is loaded
    pub fn attached_reference(&self) -> Option<String> {
        if self.mode.uses_reference() && !self.reference_content.is_empty() {
            Some(self.reference_content.clone())
        } else {
            None
        }
    }
}

// ============================================================================
// In-flight guards
// ============================================================================

/// Single-flight guard for one kind of request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Flight {
    #[default]
    Idle,
    /// Request issued in session `epoch`; `owner` is the transcript index
    /// the request was triggered from, when there is one.
    Pending { epoch: u64, owner: Option<usize> },
}

impl Flight {
    pub fn pending(epoch: u64) -> Self {
        Flight::Pending { epoch, owner: None }
    }

    pub fn pending_for(epoch: u64, owner: usize) -> Self {
        Flight::Pending {
            epoch,
            owner: Some(owner),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Flight::Pending { .. })
    }

    pub fn owner(&self) -> Option<usize> {
        match self {
            Flight::Pending { owner, .. } => *owner,
            Flight::Idle => None,
        }
    }
}

/// Complete client state: the active session plus request guards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Incremented on every reset; results from older epochs never touch
    /// the current session
    pub epoch: u64,
    pub session: Session,
    pub chat: Flight,
    pub image: Flight,
    pub content: Flight,
    pub upload: Flight,
    pub reference_panel_open: bool,
}

impl ClientState {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            epoch: 0,
            session: Session::new(mode),
            chat: Flight::Idle,
            image: Flight::Idle,
            content: Flight::Idle,
            upload: Flight::Idle,
            reference_panel_open: false,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.session.mode
    }

    pub fn messages(&self) -> &[Message] {
        &self.session.messages
    }

    pub fn generation_flight(&self, kind: GenerationKind) -> &Flight {
        if kind.is_image() {
            &self.image
        } else {
            &self.content
        }
    }

    pub fn is_generating(&self) -> bool {
        self.image.is_busy() || self.content.is_busy()
    }

    /// True when no request of any kind is outstanding
    pub fn is_quiescent(&self) -> bool {
        !self.chat.is_busy() && !self.is_generating() && !self.upload.is_busy()
    }
}

/// Immutable context for a client session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
