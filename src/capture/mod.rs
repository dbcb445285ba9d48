//! Image capture from the file picker, drag-and-drop and clipboard paste.
//!
//! Whatever the channel, the accepted image ends up as a single
//! `data:<mime>;base64,<data>` payload that every provider consumes as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const INVALID_IMAGE_MESSAGE: &str = "Por favor, selecione uma imagem válida.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no image was provided")]
    NoImage,
    #[error("not an image: {mime}")]
    NotAnImage { mime: String },
    #[error("malformed image data URL: {0}")]
    MalformedDataUrl(String),
}

impl CaptureError {
    /// Message shown to the user for any rejected input.
    pub fn user_message(&self) -> &'static str {
        INVALID_IMAGE_MESSAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputChannel {
    FilePicker,
    DragDrop,
    Clipboard,
}

/// A file or clipboard item as reported by the input channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

#[derive(Debug, Clone)]
pub struct CaptureInput {
    pub channel: InputChannel,
    pub files: Vec<CandidateFile>,
}

/// Encoded image shared by every downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data_url: String,
    mime_end: usize,
    data_start: usize,
}

impl ImagePayload {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, CaptureError> {
        if !is_image_mime(mime) {
            return Err(CaptureError::NotAnImage {
                mime: mime.to_string(),
            });
        }
        if bytes.is_empty() {
            return Err(CaptureError::NoImage);
        }
        let mime = mime.trim().to_ascii_lowercase();
        let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        Self::from_data_url(&data_url)
    }

    /// Accepts `data:image/<kind>;base64,<data>`; the base64 body itself is
    /// passed through untouched.
    pub fn from_data_url(data_url: &str) -> Result<Self, CaptureError> {
        let data_url = data_url.trim();
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| CaptureError::MalformedDataUrl("missing data: scheme".to_string()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| CaptureError::MalformedDataUrl("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| CaptureError::MalformedDataUrl("payload is not base64".to_string()))?;
        if !is_image_mime(mime) {
            return Err(CaptureError::NotAnImage {
                mime: mime.to_string(),
            });
        }
        if data.trim().is_empty() {
            return Err(CaptureError::NoImage);
        }

        let mime_start = "data:".len();
        Ok(Self {
            data_url: data_url.to_string(),
            mime_end: mime_start + mime.len(),
            data_start: mime_start + header.len() + 1,
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn mime_type(&self) -> &str {
        &self.data_url["data:".len()..self.mime_end]
    }

    pub fn base64_data(&self) -> &str {
        &self.data_url[self.data_start..]
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} image ({} base64 chars)",
            self.mime_type(),
            self.base64_data().len()
        )
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.data_url)
    }
}

/// Pick the single image a channel delivered and encode it.
///
/// The picker and drag-and-drop only ever look at the first file. The
/// clipboard may carry text alongside the picture, so it takes the first
/// image item and ignores the rest.
pub fn capture(input: CaptureInput) -> Result<ImagePayload, CaptureError> {
    let candidate = match input.channel {
        InputChannel::FilePicker | InputChannel::DragDrop => {
            input.files.into_iter().next().ok_or(CaptureError::NoImage)?
        }
        InputChannel::Clipboard => {
            if input.files.is_empty() {
                return Err(CaptureError::NoImage);
            }
            let first_mime = input.files[0].mime.clone();
            input
                .files
                .into_iter()
                .find(CandidateFile::is_image)
                .ok_or(CaptureError::NotAnImage { mime: first_mime })?
        }
    };

    ImagePayload::from_bytes(&candidate.mime, &candidate.bytes)
}

pub fn is_image_mime(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime.strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// Mime type guessed from a file extension, for files read from disk.
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
