//! Prompt-builder backend access
//!
//! The runtime talks to the backend only through [`PromptBuilderApi`] and
//! [`ImageService`], so tests can swap in queued mocks.

mod error;
mod http;
mod image;
mod types;

pub use error::{ApiError, ApiErrorKind};
pub use http::HttpApi;
pub use image::HttpImageService;
pub use types::*;

use crate::config::AuthContext;
use crate::reference::Document;
use crate::state_machine::{ChatMode, GenerationKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// REST endpoints under `/api/user/prompt_builder`
#[async_trait]
pub trait PromptBuilderApi: Send + Sync {
    /// Send one chat turn
    async fn prompt_chat(
        &self,
        request: &ChatRequest,
        auth: &AuthContext,
    ) -> Result<ChatReply, ApiError>;

    /// Drop the backend's history for a mode
    async fn clear_chat(&self, mode: ChatMode, auth: &AuthContext) -> Result<(), ApiError>;

    /// Generate a storyboard or outline
    async fn generate_content(
        &self,
        kind: GenerationKind,
        request: &ContentRequest,
        auth: &AuthContext,
    ) -> Result<String, ApiError>;

    /// Upload a document and get its extracted text back
    async fn upload_document(
        &self,
        document: &Document,
        auth: &AuthContext,
    ) -> Result<UploadedReference, ApiError>;
}

/// External image generation service
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Generate one image and return its URL
    async fn generate_image(&self, prompt: &str, auth: &AuthContext) -> Result<String, ApiError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: PromptBuilderApi + ?Sized> PromptBuilderApi for Arc<T> {
    async fn prompt_chat(
        &self,
        request: &ChatRequest,
        auth: &AuthContext,
    ) -> Result<ChatReply, ApiError> {
        (**self).prompt_chat(request, auth).await
    }

    async fn clear_chat(&self, mode: ChatMode, auth: &AuthContext) -> Result<(), ApiError> {
        (**self).clear_chat(mode, auth).await
    }

    async fn generate_content(
        &self,
        kind: GenerationKind,
        request: &ContentRequest,
        auth: &AuthContext,
    ) -> Result<String, ApiError> {
        (**self).generate_content(kind, request, auth).await
    }

    async fn upload_document(
        &self,
        document: &Document,
        auth: &AuthContext,
    ) -> Result<UploadedReference, ApiError> {
        (**self).upload_document(document, auth).await
    }
}

#[async_trait]
impl<T: ImageService + ?Sized> ImageService for Arc<T> {
    async fn generate_image(&self, prompt: &str, auth: &AuthContext) -> Result<String, ApiError> {
        (**self).generate_image(prompt, auth).await
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logs duration and outcome of every backend call
pub struct LoggingApi<A> {
    inner: A,
}

impl<A> LoggingApi<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(endpoint: &str, started: Instant, result: &Result<T, ApiError>) {
    let duration_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => tracing::info!(endpoint, %duration_ms, "API request completed"),
        Err(e) => tracing::error!(
            endpoint,
            %duration_ms,
            error = %e.message,
            kind = ?e.kind,
            "API request failed"
        ),
    }
}

#[async_trait]
impl<A: PromptBuilderApi> PromptBuilderApi for LoggingApi<A> {
    async fn prompt_chat(
        &self,
        request: &ChatRequest,
        auth: &AuthContext,
    ) -> Result<ChatReply, ApiError> {
        let started = Instant::now();
        let result = self.inner.prompt_chat(request, auth).await;
        log_outcome("prompt_chat", started, &result);
        result
    }

    async fn clear_chat(&self, mode: ChatMode, auth: &AuthContext) -> Result<(), ApiError> {
        let started = Instant::now();
        let result = self.inner.clear_chat(mode, auth).await;
        log_outcome("clear_prompt_chat", started, &result);
        result
    }

    async fn generate_content(
        &self,
        kind: GenerationKind,
        request: &ContentRequest,
        auth: &AuthContext,
    ) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.inner.generate_content(kind, request, auth).await;
        log_outcome(content_endpoint(kind).unwrap_or("generate"), started, &result);
        result
    }

    async fn upload_document(
        &self,
        document: &Document,
        auth: &AuthContext,
    ) -> Result<UploadedReference, ApiError> {
        let started = Instant::now();
        let result = self.inner.upload_document(document, auth).await;
        log_outcome("upload_document", started, &result);
        result
    }
}

#[async_trait]
impl<A: ImageService> ImageService for LoggingApi<A> {
    async fn generate_image(&self, prompt: &str, auth: &AuthContext) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.inner.generate_image(prompt, auth).await;
        log_outcome("generate_image", started, &result);
        result
    }
}
