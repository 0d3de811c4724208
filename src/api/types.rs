//! API request and response types
//!
//! Request structs serialize to the exact JSON the backend expects. Response
//! bodies are deserialized leniently and then converted into typed results
//! with a single success path.

use super::ApiError;
use crate::state_machine::{ChatMode, GenerationKind};
use serde::{Deserialize, Serialize};

// ============================================================================
// prompt_chat
// ============================================================================

/// Request to send a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub mode: ChatMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_content: Option<String>,
}

/// Raw `prompt_chat` response body
#[derive(Debug, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub is_final_prompt: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Assistant reply to one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    /// The reply is a finished prompt the user can generate from
    pub is_final_prompt: bool,
}

impl ChatResponseBody {
    pub fn into_reply(self) -> Result<ChatReply, ApiError> {
        if !self.success {
            return Err(ApiError::rejected(self.message.unwrap_or_default()));
        }
        let response = self
            .response
            .ok_or_else(|| ApiError::decode("prompt_chat response has no 'response' field"))?;
        Ok(ChatReply {
            response,
            is_final_prompt: self.is_final_prompt,
        })
    }
}

// ============================================================================
// clear_prompt_chat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearRequest {
    pub mode: ChatMode,
}

// ============================================================================
// generate_storyboard / generate_outline
// ============================================================================

/// Request to turn a final prompt into a storyboard or outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_content: Option<String>,
}

/// Raw content-generation response body. `content` is the only field that
/// carries the generated text.
#[derive(Debug, Deserialize)]
pub struct ContentResponseBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a content generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated { content: String },
    Rejected { message: Option<String> },
    /// `success: true` without any content to show
    Empty,
}

impl From<ContentResponseBody> for GenerationOutcome {
    fn from(body: ContentResponseBody) -> Self {
        match (body.success, body.content) {
            (true, Some(content)) if !content.is_empty() => GenerationOutcome::Generated { content },
            (true, _) => GenerationOutcome::Empty,
            (false, _) => GenerationOutcome::Rejected {
                message: body.message,
            },
        }
    }
}

impl GenerationOutcome {
    pub fn into_result(self) -> Result<String, ApiError> {
        match self {
            GenerationOutcome::Generated { content } => Ok(content),
            GenerationOutcome::Rejected { message } => {
                Err(ApiError::rejected(message.unwrap_or_default()))
            }
            GenerationOutcome::Empty => Err(ApiError::decode("content response has no content")),
        }
    }
}

/// Backend endpoint for a text generation kind
pub fn content_endpoint(kind: GenerationKind) -> Option<&'static str> {
    match kind {
        GenerationKind::Storyboard => Some("generate_storyboard"),
        GenerationKind::Outline => Some("generate_outline"),
        GenerationKind::Image => None,
    }
}

// ============================================================================
// upload_document
// ============================================================================

/// Text extracted from an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedReference {
    pub content: String,
    pub status: String,
}

// ============================================================================
// Image generation service
// ============================================================================

/// Request to the image generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub user_id: String,
    pub style: String,
    pub negative_prompt: String,
    pub prompt: String,
    pub num_images: u32,
}

impl ImageRequest {
    pub fn photo(user_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            style: "photo".to_string(),
            negative_prompt: String::new(),
            prompt: prompt.into(),
            num_images: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageResponseBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ImageData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ImageResponseBody {
    pub fn into_url(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(ApiError::rejected(self.message.unwrap_or_default()));
        }
        self.data
            .and_then(|d| d.image_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::decode("image response has no data.imageUrl"))
    }
}
