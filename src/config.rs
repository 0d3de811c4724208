//! Client configuration
//!
//! Every flag can also be supplied through the environment, so the client
//! can be pointed at a deployment without a wrapper script.

use crate::state_machine::ChatMode;
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Command line flags
#[derive(Debug, Clone, Parser)]
#[command(
    name = "prompt-builder",
    version,
    about = "Chat with an assistant to build image, storyboard and outline prompts"
)]
pub struct ClientConfig {
    /// Base URL of the prompt-builder backend
    #[arg(long, env = "PROMPT_BUILDER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Image generation service URL (defaults to `{api_url}/api/user/generate_image`)
    #[arg(long, env = "PROMPT_BUILDER_IMAGE_URL")]
    pub image_url: Option<String>,

    /// Bearer token for the signed-in user
    #[arg(long, env = "PROMPT_BUILDER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Id of the signed-in user, sent with image generation requests
    #[arg(long, env = "PROMPT_BUILDER_USER_ID", default_value = "")]
    pub user_id: String,

    /// Mode to start in: image, elearning or outline
    #[arg(long, env = "PROMPT_BUILDER_MODE", default_value = "image")]
    pub mode: ChatMode,

    /// Where downloaded images are written
    #[arg(long, env = "PROMPT_BUILDER_DOWNLOAD_DIR", default_value = ".")]
    pub download_dir: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl ClientConfig {
    pub fn image_service_url(&self) -> String {
        self.image_url.clone().unwrap_or_else(|| {
            format!(
                "{}/api/user/generate_image",
                self.api_url.trim_end_matches('/')
            )
        })
    }

    pub fn auth(&self) -> AuthContext {
        AuthContext {
            user_id: self.user_id.clone(),
            token: self.token.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Credentials of the signed-in user, passed explicitly to every API call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub token: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach the bearer token, when there is one
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
