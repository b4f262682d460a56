//! # Shared-File Viewer
//!
//! Resolves a share link to displayable content.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VIEWING FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  share URL or id                                                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate link ──── access denied ──► Denied (metadata may be shown)   │
//! │        │                                                                │
//! │        ├── viewer unauthenticated ──► MetadataOnly (no download)       │
//! │        ▼                                                                │
//! │  download bytes + headers                                               │
//! │        │                                                                │
//! │        ├── flagged encrypted ──► EncryptedRaw (never decrypted here;   │
//! │        │                         key exchange is out of band)          │
//! │        ▼                                                                │
//! │  classify by MIME / extension ──► Viewable { Text | Image | Pdf |      │
//! │                                              Audio | Video | Other }   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The viewer never reconstructs a secret key for files it did not
//! encrypt itself. Encrypted payloads are handed back as raw bytes with
//! a marker; decrypting them is the owner's problem to arrange.

use std::sync::Arc;

use bytes::Bytes;

use crate::api::{share_id_from_url, ApiClient, FileMetadata};
use crate::error::{Error, Result};

/// How downloaded content should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Decode and show as preformatted text.
    Text,
    /// Show as an image.
    Image,
    /// Embed as a PDF document.
    Pdf,
    /// Play as audio.
    Audio,
    /// Play as video.
    Video,
    /// Metadata-only fallback with a download action.
    Other,
}

/// Classify content for rendering.
///
/// The declared content type wins when it is specific; a bare
/// `application/octet-stream` falls back to guessing from the filename
/// extension. No declared type and no recognizable extension lands in
/// [`RenderKind::Other`].
pub fn classify(content_type: Option<&str>, filename: Option<&str>) -> RenderKind {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    let mime = match declared {
        Some(ct) => ct,
        None => match filename.and_then(|name| mime_guess::from_path(name).first()) {
            Some(guessed) => guessed.essence_str().to_string(),
            None => return RenderKind::Other,
        },
    };

    if mime == "application/pdf" {
        return RenderKind::Pdf;
    }
    match mime.split('/').next().unwrap_or("") {
        "text" => RenderKind::Text,
        "image" => RenderKind::Image,
        "audio" => RenderKind::Audio,
        "video" => RenderKind::Video,
        "application" => match mime.as_str() {
            "application/json" | "application/xml" | "application/javascript" => RenderKind::Text,
            _ => RenderKind::Other,
        },
        _ => RenderKind::Other,
    }
}

/// What the viewer resolved a share link into.
#[derive(Debug)]
pub enum SharedFileContent {
    /// The server denied access for this identity.
    Denied,
    /// Valid link, but the viewer is unauthenticated; no download was
    /// attempted.
    MetadataOnly,
    /// Downloaded and classified, ready to render.
    Viewable {
        /// File bytes.
        data: Bytes,
        /// Best-known filename.
        filename: String,
        /// MIME type, when known.
        content_type: Option<String>,
        /// Render dispatch decision.
        render_kind: RenderKind,
    },
    /// Downloaded, but the payload is a sealed envelope. Raw bytes only;
    /// decryption requires key exchange with the owner.
    EncryptedRaw {
        /// The still-encrypted bytes.
        data: Bytes,
        /// Best-known filename.
        filename: String,
    },
}

impl SharedFileContent {
    /// Whether showing this content needs out-of-band key exchange.
    pub fn requires_key_exchange(&self) -> bool {
        matches!(self, SharedFileContent::EncryptedRaw { .. })
    }
}

/// A resolved share link.
#[derive(Debug)]
pub struct SharedFileView {
    /// The share identifier that was resolved.
    pub share_id: String,
    /// Metadata from link validation, when the link resolved to a file.
    pub file: Option<FileMetadata>,
    /// The content outcome.
    pub content: SharedFileContent,
}

/// Shared-file viewing pipeline over an [`ApiClient`].
pub struct SharedFileViewer {
    client: Arc<ApiClient>,
}

impl SharedFileViewer {
    /// Build a viewer on top of an existing client.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Resolve a share link or bare share id into viewable content.
    pub async fn view(&self, link_or_id: &str) -> Result<SharedFileView> {
        let share_id = share_id_from_url(link_or_id)
            .ok_or_else(|| Error::MalformedResponse("Empty share link".into()))?;

        let validation = self.client.validate_share_link(&share_id).await?;
        if !validation.access_granted {
            tracing::info!(share_id, "Share link access denied");
            return Ok(SharedFileView {
                share_id,
                file: validation.file,
                content: SharedFileContent::Denied,
            });
        }

        // The download endpoint wants a bearer; without one, stop at
        // metadata rather than burn a request that will be refused.
        if !self.client.has_token() && !self.client.test_mode() {
            return Ok(SharedFileView {
                share_id,
                file: validation.file,
                content: SharedFileContent::MetadataOnly,
            });
        }

        let download = self.client.download_shared_file(&share_id).await?;

        let filename = download
            .filename
            .clone()
            .or_else(|| validation.file.as_ref().map(|f| f.filename.clone()))
            .unwrap_or_else(|| share_id.clone());
        let flagged_encrypted = download.is_encrypted
            || validation
                .file
                .as_ref()
                .and_then(|f| f.is_encrypted)
                .unwrap_or(false);

        let content = if flagged_encrypted {
            tracing::warn!(share_id, "Shared file is encrypted; returning raw bytes");
            SharedFileContent::EncryptedRaw {
                data: download.data,
                filename,
            }
        } else {
            let content_type = download
                .content_type
                .clone()
                .or_else(|| validation.file.as_ref().and_then(|f| f.content_type.clone()));
            let render_kind = classify(content_type.as_deref(), Some(&filename));
            SharedFileContent::Viewable {
                data: download.data,
                filename,
                content_type,
                render_kind,
            }
        };

        Ok(SharedFileView {
            share_id,
            file: validation.file,
            content,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_declared_type() {
        assert_eq!(classify(Some("text/plain"), None), RenderKind::Text);
        assert_eq!(classify(Some("image/png"), None), RenderKind::Image);
        assert_eq!(classify(Some("application/pdf"), None), RenderKind::Pdf);
        assert_eq!(classify(Some("audio/mpeg"), None), RenderKind::Audio);
        assert_eq!(classify(Some("video/mp4"), None), RenderKind::Video);
        assert_eq!(classify(Some("application/zip"), None), RenderKind::Other);
    }

    #[test]
    fn test_classify_textlike_application_types() {
        assert_eq!(classify(Some("application/json"), None), RenderKind::Text);
        assert_eq!(classify(Some("application/xml"), None), RenderKind::Text);
    }

    #[test]
    fn test_classify_strips_parameters() {
        assert_eq!(
            classify(Some("text/html; charset=utf-8"), None),
            RenderKind::Text
        );
    }

    #[test]
    fn test_classify_extension_fallback() {
        // octet-stream is too generic to trust
        assert_eq!(
            classify(Some("application/octet-stream"), Some("movie.mp4")),
            RenderKind::Video
        );
        assert_eq!(classify(None, Some("notes.txt")), RenderKind::Text);
        assert_eq!(classify(None, Some("scan.pdf")), RenderKind::Pdf);
        assert_eq!(classify(None, Some("song.ogg")), RenderKind::Audio);
    }

    #[test]
    fn test_classify_unknown_falls_through() {
        assert_eq!(classify(None, Some("mystery")), RenderKind::Other);
        assert_eq!(classify(None, None), RenderKind::Other);
        assert_eq!(classify(Some(""), None), RenderKind::Other);
    }

    #[test]
    fn test_encrypted_content_marker() {
        let content = SharedFileContent::EncryptedRaw {
            data: Bytes::from_static(b"sealed"),
            filename: "a.txt.enc".into(),
        };
        assert!(content.requires_key_exchange());

        let content = SharedFileContent::Viewable {
            data: Bytes::from_static(b"hi"),
            filename: "a.txt".into(),
            content_type: Some("text/plain".into()),
            render_kind: RenderKind::Text,
        };
        assert!(!content.requires_key_exchange());
    }
}
