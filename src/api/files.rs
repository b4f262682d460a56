//! File endpoints: list, upload, delete, download.
//!
//! The backend is not consistent about field names across endpoints
//! (`fileCid` vs `cid`, `name` vs `filename`, `size` vs `fileSize`).
//! Everything is normalized into [`FileMetadata`] at this boundary so
//! nothing above it has to know.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::api::client::ApiClient;
use crate::error::{Error, Result};

/// Custom response header flagging server-side-known encryption state.
pub(crate) const ENCRYPTION_STATE_HEADER: &str = "x-file-encrypted";

/// Per-file key pair, attached client-side after upload. The backend
/// never sees `secret_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKeys {
    /// Hex-encoded per-file public key.
    pub public_key: String,
    /// Hex-encoded per-file secret key. Sensitive; local only.
    pub secret_key: String,
}

/// One file known to the backend, with normalized field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Backend-assigned content identifier.
    pub cid: String,
    /// Display filename.
    pub filename: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Upload time (epoch ms), when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<i64>,
    /// Uploader identity, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Whether the caller owns this file. Client-computed.
    #[serde(default)]
    pub is_owner: bool,
    /// MIME type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Whether the stored payload is an encrypted envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_encrypted: Option<bool>,
    /// Keys for the envelope. Attached locally, never round-tripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_keys: Option<EncryptionKeys>,
}

/// Raw list entry as the backend sends it, aliases and all.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFileEntry {
    #[serde(rename = "fileCid", alias = "cid")]
    cid: String,
    #[serde(rename = "name", alias = "filename")]
    filename: String,
    #[serde(rename = "size", alias = "fileSize", default)]
    file_size: u64,
    #[serde(rename = "uploadTimestamp", alias = "timestamp", default)]
    upload_timestamp: Option<i64>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(rename = "contentType", alias = "mimeType", default)]
    content_type: Option<String>,
    #[serde(rename = "isEncrypted", default)]
    is_encrypted: Option<bool>,
}

/// Normalize one raw entry. Ownership is a client-side judgment, so the
/// caller states it.
pub(crate) fn normalize_entry(raw: RawFileEntry, is_owner: bool) -> FileMetadata {
    FileMetadata {
        cid: raw.cid,
        filename: raw.filename,
        file_size: raw.file_size,
        upload_timestamp: raw.upload_timestamp,
        uploader: raw.uploader,
        is_owner,
        content_type: raw.content_type,
        is_encrypted: raw.is_encrypted,
        encryption_keys: None,
    }
}

/// Normalize raw list entries. The list endpoint returns the caller's
/// own files, so ownership is implied.
pub(crate) fn normalize_entries(entries: Vec<RawFileEntry>) -> Vec<FileMetadata> {
    entries
        .into_iter()
        .map(|raw| normalize_entry(raw, true))
        .collect()
}

/// Backend acknowledgment of an upload. The cid here is the source of
/// truth; encryption keys are attached locally afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Content identifier assigned by the backend.
    #[serde(rename = "fileCid", alias = "cid")]
    pub file_cid: String,
    /// On-chain transaction digest, when the backend anchors uploads.
    #[serde(rename = "transactionDigest", default)]
    pub transaction_digest: Option<String>,
}

/// A downloaded shared file plus what the response headers said about it.
#[derive(Debug, Clone)]
pub struct SharedDownload {
    /// Raw body bytes. Still ciphertext when `is_encrypted` is true.
    pub data: Bytes,
    /// Filename from `Content-Disposition`, when present.
    pub filename: Option<String>,
    /// MIME type from `Content-Type`, when present.
    pub content_type: Option<String>,
    /// Server-side-known encryption state.
    pub is_encrypted: bool,
}

impl ApiClient {
    /// List the caller's files, normalized.
    pub async fn list_files(&self) -> Result<Vec<FileMetadata>> {
        let url = self.endpoint("/files", true);
        let request = self.authorize(self.http_get(&url));
        let entries: Vec<RawFileEntry> = self.send_enveloped(request).await?;

        let files = normalize_entries(entries);
        tracing::info!(count = files.len(), "Listed user files");
        Ok(files)
    }

    /// Upload one file as multipart form data.
    ///
    /// `data` is the payload exactly as it should be stored: the caller
    /// substitutes the sealed envelope (and the suffixed filename) for
    /// encrypted uploads before calling this.
    pub async fn upload_file(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse> {
        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| Error::Request(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint("/file/upload", true);
        let request = self.authorize(self.http_post(&url)).multipart(form);
        let response: UploadResponse = self.send_enveloped(request).await?;

        tracing::info!(cid = %response.file_cid, filename, "Uploaded file");
        Ok(response)
    }

    /// Delete one file. Fails locally without a token in non-test mode.
    pub async fn delete_file(&self, cid: &str) -> Result<()> {
        self.require_auth()?;

        let url = self.endpoint(&format!("/file/{}/delete", cid), false);
        let request = self.authorize(self.http_delete(&url));
        self.send_ack(request).await?;

        tracing::info!(cid, "Deleted file");
        Ok(())
    }

    /// Delete every file the caller owns. Fails locally without a token
    /// in non-test mode.
    pub async fn delete_all_files(&self) -> Result<()> {
        self.require_auth()?;

        let url = self.endpoint("/files", false);
        let request = self.authorize(self.http_delete(&url));
        self.send_ack(request).await?;

        tracing::info!("Deleted all user files");
        Ok(())
    }

    /// Download a shared file's bytes plus its descriptive headers.
    pub async fn download_shared_file(&self, share_id: &str) -> Result<SharedDownload> {
        let url = self.endpoint(&format!("/file/shared/{}/download", share_id), false);
        let response = self.authorize(self.http_get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                message: format!("Shared download failed for {}", share_id),
            });
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let is_encrypted = response
            .headers()
            .get(ENCRYPTION_STATE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let data = response.bytes().await?;
        Ok(SharedDownload {
            data,
            filename,
            content_type,
            is_encrypted,
        })
    }

    /// Download a file by cid via the legacy unauthenticated endpoint.
    pub async fn download_file_legacy(&self, cid: &str) -> Result<Bytes> {
        let url = self.endpoint(&format!("/api/file/{}/download", cid), true);
        let response = self.http_get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                message: format!("Download failed for {}", cid),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Extract a filename from a `Content-Disposition` header value.
///
/// Handles quoted and bare `filename=` plus the RFC 5987 `filename*=`
/// form (`UTF-8''percent%20encoded`). The extended form wins when both
/// are present.
pub(crate) fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';') {
        let param = param.trim();
        if let Some(rest) = param.strip_prefix("filename*=") {
            // RFC 5987: charset'language'value. A malformed extended
            // param is skipped, not fatal; a plain filename= elsewhere
            // in the header still counts.
            let mut parts = rest.splitn(3, '\'');
            if let (Some(charset), Some(_language), Some(encoded)) =
                (parts.next(), parts.next(), parts.next())
            {
                if charset.eq_ignore_ascii_case("utf-8") {
                    if let Some(decoded) = percent_decode(encoded) {
                        return Some(decoded);
                    }
                }
            }
        } else if let Some(rest) = param.strip_prefix("filename=") {
            plain = Some(rest.trim_matches('"').to_string());
        }
    }
    plain.filter(|name| !name.is_empty())
}

/// Decode a percent-encoded UTF-8 string. Returns None on truncated
/// escapes or invalid UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_normalization_aliases() {
        // fileCid/name/size spelling
        let raw: Vec<RawFileEntry> =
            serde_json::from_str(r#"[{"fileCid":"x","name":"a.txt","size":10}]"#).unwrap();
        let files = normalize_entries(raw);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].cid, "x");
        assert_eq!(files[0].filename, "a.txt");
        assert_eq!(files[0].file_size, 10);
        assert!(files[0].is_owner);

        // cid/filename/fileSize spelling
        let raw: Vec<RawFileEntry> =
            serde_json::from_str(r#"[{"cid":"y","filename":"b.png","fileSize":20}]"#).unwrap();
        let files = normalize_entries(raw);
        assert_eq!(files[0].cid, "y");
        assert_eq!(files[0].filename, "b.png");
        assert_eq!(files[0].file_size, 20);
    }

    #[test]
    fn test_list_normalization_optional_fields() {
        let raw: Vec<RawFileEntry> = serde_json::from_str(
            r#"[{"cid":"z","name":"c.bin","size":5,"isEncrypted":true,"mimeType":"application/octet-stream"}]"#,
        )
        .unwrap();
        let files = normalize_entries(raw);
        assert_eq!(files[0].is_encrypted, Some(true));
        assert_eq!(
            files[0].content_type.as_deref(),
            Some("application/octet-stream")
        );
        assert!(files[0].encryption_keys.is_none());
    }

    #[test]
    fn test_upload_response_aliases() {
        let r: UploadResponse =
            serde_json::from_str(r#"{"fileCid":"abc","transactionDigest":"0xdd"}"#).unwrap();
        assert_eq!(r.file_cid, "abc");
        assert_eq!(r.transaction_digest.as_deref(), Some("0xdd"));

        let r: UploadResponse = serde_json::from_str(r#"{"cid":"def"}"#).unwrap();
        assert_eq!(r.file_cid, "def");
        assert!(r.transaction_digest.is_none());
    }

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="report.pdf""#),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=plain.txt"),
            Some("plain.txt".to_string())
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }

    #[test]
    fn test_content_disposition_rfc5987() {
        assert_eq!(
            filename_from_content_disposition(
                "attachment; filename*=UTF-8''na%C3%AFve%20file.txt"
            ),
            Some("naïve file.txt".to_string())
        );
        // Extended form wins over plain when both are present
        assert_eq!(
            filename_from_content_disposition(
                r#"attachment; filename="fallback.txt"; filename*=UTF-8''real%20name.txt"#
            ),
            Some("real name.txt".to_string())
        );
    }

    #[test]
    fn test_content_disposition_bad_escapes() {
        // Truncated escape falls through; with no plain fallback this is None
        assert_eq!(
            filename_from_content_disposition("attachment; filename*=UTF-8''bad%2"),
            None
        );
        // With a plain fallback, the fallback survives
        assert_eq!(
            filename_from_content_disposition(
                r#"attachment; filename="ok.txt"; filename*=UTF-8''bad%2"#
            ),
            Some("ok.txt".to_string())
        );
    }

    #[test]
    fn test_content_disposition_malformed_extended_param() {
        // An extended param without the charset'language'value shape is
        // ignored; the plain filename still wins
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="ok.txt"; filename*=garbage"#),
            Some("ok.txt".to_string())
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename*=garbage"),
            None
        );
    }

    #[test]
    fn test_file_metadata_round_trip() {
        let meta = FileMetadata {
            cid: "x".into(),
            filename: "a.txt".into(),
            file_size: 10,
            upload_timestamp: Some(1_700_000_000_000),
            uploader: Some("0xabc".into()),
            is_owner: true,
            content_type: Some("text/plain".into()),
            is_encrypted: Some(false),
            encryption_keys: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"fileSize\":10"));
        let restored: FileMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, meta);
    }
}
