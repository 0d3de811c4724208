//! Reference content: document selection and status text
//!
//! Only Word documents are accepted for upload. The type is decided from the
//! file name, the same way a browser labels a picked file, and checked by the
//! state machine before any request is made.

use std::path::Path;
use thiserror::Error;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const UPLOAD_FAILED_STATUS: &str = "Error uploading document. Please try again.";

/// A file picked for upload
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is empty")]
    Empty(String),
}

/// MIME type for a file, guessed from its extension
pub fn detect_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read a file from disk into a [`Document`]. The type is not validated here.
pub async fn load_document(path: &Path) -> Result<Document, ReferenceError> {
    let display = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ReferenceError::Io {
            path: display.clone(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(ReferenceError::Empty(display));
    }

    let file_name = path
        .file_name()
        .map_or_else(|| display.clone(), |n| n.to_string_lossy().into_owned());

    Ok(Document {
        file_name,
        mime_type: detect_mime(path),
        bytes,
    })
}

/// Status line after pasting reference text
pub fn text_reference_status(text: &str) -> String {
    format!(
        "Reference content updated! ({} characters)",
        text.chars().count()
    )
}
