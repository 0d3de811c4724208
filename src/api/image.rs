//! Image generation service client and image download

use super::http::send;
use super::types::{ImageRequest, ImageResponseBody};
use super::{ApiError, ImageService};
use crate::config::AuthContext;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct HttpImageService {
    client: Client,
    url: String,
}

impl HttpImageService {
    pub fn new(url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch a generated image and write it into `dir` as
    /// `generated-image-{millis}.png`
    pub async fn download(&self, image_url: &str, dir: &Path) -> Result<PathBuf, ApiError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status, ""));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read image: {e}")))?;

        let path = dir.join(download_file_name(chrono::Utc::now().timestamp_millis()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::unknown(format!("Failed to write {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Image downloaded");
        Ok(path)
    }
}

fn download_file_name(millis: i64) -> String {
    format!("generated-image-{millis}.png")
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate_image(&self, prompt: &str, auth: &AuthContext) -> Result<String, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::invalid_request("Prompt is required"));
        }
        let body = ImageRequest::photo(auth.user_id.clone(), prompt);
        let request = auth.apply(self.client.post(&self.url).json(&body));
        let response: ImageResponseBody = send(request).await?;
        response.into_url()
    }
}
