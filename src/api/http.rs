//! reqwest implementation of the prompt-builder endpoints

use super::types::{
    content_endpoint, ChatReply, ChatRequest, ChatResponseBody, ClearRequest, ContentRequest,
    ContentResponseBody, GenerationOutcome, UploadedReference,
};
use super::{ApiError, PromptBuilderApi};
use crate::config::AuthContext;
use crate::reference::Document;
use crate::state_machine::{ChatMode, GenerationKind};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

const API_PREFIX: &str = "/api/user/prompt_builder";

/// Backend client. Requests have no timeout: generation calls can take
/// as long as the backend needs.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}{API_PREFIX}/{name}", self.base_url)
    }

    async fn post_json<B, R>(&self, name: &str, body: &B, auth: &AuthContext) -> Result<R, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request = auth.apply(self.client.post(self.endpoint(name)).json(body));
        send(request).await
    }
}

/// Send a request and decode a JSON body, classifying failures
pub(super) async fn send<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::from_reqwest(&e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| ApiError::decode(format!("Failed to parse response: {e} - body: {body}")))
}

#[async_trait]
impl PromptBuilderApi for HttpApi {
    async fn prompt_chat(
        &self,
        request: &ChatRequest,
        auth: &AuthContext,
    ) -> Result<ChatReply, ApiError> {
        let body: ChatResponseBody = self.post_json("prompt_chat", request, auth).await?;
        body.into_reply()
    }

    async fn clear_chat(&self, mode: ChatMode, auth: &AuthContext) -> Result<(), ApiError> {
        // The body is ignored; any JSON counts as success
        let _: serde_json::Value = self
            .post_json("clear_prompt_chat", &ClearRequest { mode }, auth)
            .await?;
        Ok(())
    }

    async fn generate_content(
        &self,
        kind: GenerationKind,
        request: &ContentRequest,
        auth: &AuthContext,
    ) -> Result<String, ApiError> {
        let name = content_endpoint(kind).ok_or_else(|| {
            ApiError::invalid_request(format!("{kind} is not produced by a content endpoint"))
        })?;
        let body: ContentResponseBody = self.post_json(name, request, auth).await?;
        GenerationOutcome::from(body).into_result()
    }

    async fn upload_document(
        &self,
        document: &Document,
        auth: &AuthContext,
    ) -> Result<UploadedReference, ApiError> {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.mime_type)
            .map_err(|e| ApiError::invalid_request(format!("Invalid MIME type: {e}")))?;
        let form = Form::new().part("file", part);

        let request = auth.apply(
            self.client
                .post(self.endpoint("upload_document"))
                .multipart(form),
        );
        send(request).await
    }
}
