//! Access-control endpoints: rule upsert and fetch, share-link
//! generation and validation.
//!
//! Rule writes go through a single idempotent PUT. The backend creates
//! or replaces as needed; there is no client-side check-then-choose
//! between create and update, so two clients racing on the same file
//! converge on last-write-wins instead of one of them erroring.

use serde::{Deserialize, Serialize};

use crate::access::{validate_access_rule, AccessRule};
use crate::api::client::ApiClient;
use crate::api::files::{normalize_entry, FileMetadata, RawFileEntry};
use crate::error::{Error, Result};

/// Request body for share-link generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShareLinkRequest {
    /// File to share.
    pub file_cid: String,
    /// When the link stops working (epoch ms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    /// How many times the link may be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
}

impl GenerateShareLinkRequest {
    /// A share request with no expiry and no use limit.
    pub fn unlimited(file_cid: impl Into<String>) -> Self {
        Self {
            file_cid: file_cid.into(),
            expiration_time: None,
            max_uses: None,
        }
    }
}

/// A generated share link: a time-bounded capability, no client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    /// Full shareable URL.
    pub share_link: String,
    /// The share identifier embedded in the URL.
    pub share_id: String,
    /// Expiry (epoch ms), when bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    /// Use limit, when bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
}

/// Raw validation response body.
#[derive(Debug, Deserialize)]
struct RawValidation {
    #[serde(rename = "accessGranted")]
    access_granted: bool,
    #[serde(default)]
    file: Option<RawFileEntry>,
}

/// Outcome of validating a share link.
///
/// The access decision is computed server-side for the calling identity
/// and trusted as-is.
#[derive(Debug, Clone)]
pub struct ShareLinkValidation {
    /// Whether the caller satisfies the file's access rule.
    pub access_granted: bool,
    /// Metadata for the shared file, when the link resolves.
    pub file: Option<FileMetadata>,
}

/// Fetched rule state for one file.
#[derive(Debug, Deserialize)]
struct AccessInfo {
    #[serde(rename = "accessRule", alias = "rule")]
    rule: AccessRule,
}

impl ApiClient {
    /// Create or replace the access rule for a file.
    ///
    /// The rule is validated structurally before any network call.
    pub async fn upsert_access_rule(&self, file_cid: &str, rule: &AccessRule) -> Result<()> {
        validate_access_rule(rule)?;
        self.require_auth()?;

        let url = self.endpoint("/access-control", false);
        let body = serde_json::json!({ "fileCid": file_cid, "accessRule": rule });
        let request = self.authorize(self.http_put(&url)).json(&body);
        self.send_ack(request).await?;

        tracing::info!(file_cid, condition = rule.condition_type.as_str(), "Upserted access rule");
        Ok(())
    }

    /// Fetch the access rule for a file. A 404 means no rule exists,
    /// which is not an error.
    pub async fn get_access_info(&self, file_cid: &str) -> Result<Option<AccessRule>> {
        self.require_auth()?;

        let url = self.endpoint(&format!("/access-control/{}", file_cid), false);
        let response = self.authorize(self.http_get(&url)).send().await?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read response body: {}", e)))?;
        let info: AccessInfo = crate::api::client::decode_envelope(status, &body)?;
        Ok(Some(info.rule))
    }

    /// Generate a share link for a file.
    pub async fn generate_share_link(
        &self,
        request: &GenerateShareLinkRequest,
    ) -> Result<ShareLink> {
        self.require_auth()?;

        let url = self.endpoint("/access-control/share-link", false);
        let req = self.authorize(self.http_post(&url)).json(request);
        let link: ShareLink = self.send_enveloped(req).await?;

        tracing::info!(file_cid = %request.file_cid, share_id = %link.share_id, "Generated share link");
        Ok(link)
    }

    /// Validate a share link. Unauthenticated; callers without a session
    /// can still learn what the link points at.
    pub async fn validate_share_link(&self, share_id: &str) -> Result<ShareLinkValidation> {
        let url = self.endpoint(&format!("/access-control/share/{}", share_id), false);
        // Bearer attached when present so the server can grant access,
        // but never required.
        let request = self.authorize(self.http_get(&url));
        let raw: RawValidation = self.send_enveloped(request).await?;

        Ok(ShareLinkValidation {
            access_granted: raw.access_granted,
            file: raw.file.map(|f| normalize_entry(f, false)),
        })
    }
}

/// Extract the share id from a full share URL.
///
/// Accepts both `.../share/{id}` URLs and a bare id. Query strings and
/// fragments are stripped.
pub fn share_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);

    // Look for the marker before touching trailing slashes, so a bare
    // ".../share/" URL has no id rather than the id "share".
    let id = match path.find("/share/") {
        Some(pos) => path[pos + "/share/".len()..]
            .split('/')
            .next()
            .unwrap_or(""),
        None => path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(path),
    };

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::decode_envelope;

    #[test]
    fn test_share_id_from_url() {
        assert_eq!(
            share_id_from_url("https://app.example.com/share/abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            share_id_from_url("https://app.example.com/share/abc123/"),
            Some("abc123".to_string())
        );
        assert_eq!(
            share_id_from_url("https://app.example.com/share/abc?utm=x#top"),
            Some("abc".to_string())
        );
        // Bare id passes through
        assert_eq!(share_id_from_url("abc123"), Some("abc123".to_string()));
        assert_eq!(share_id_from_url(""), None);
    }

    #[test]
    fn test_share_url_without_id_yields_none() {
        // The path ends at the marker; "share" itself is not an id
        assert_eq!(share_id_from_url("https://app.example.com/share/"), None);
        assert_eq!(share_id_from_url("https://app.example.com/share//"), None);
        assert_eq!(share_id_from_url("https://app.example.com/share/?utm=x"), None);
    }

    #[test]
    fn test_share_link_request_serialization() {
        let req = GenerateShareLinkRequest::unlimited("x");
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"fileCid":"x"}"#);

        let req = GenerateShareLinkRequest {
            file_cid: "x".into(),
            expiration_time: Some(1_700_000_000_000),
            max_uses: Some(5),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"expirationTime\":1700000000000"));
        assert!(json.contains("\"maxUses\":5"));
    }

    #[test]
    fn test_share_link_round_trip_payloads() {
        // Generation response
        let body = r#"{"success":true,"data":{
            "shareLink":"https://app.example.com/share/abc",
            "shareId":"abc","expirationTime":null,"maxUses":3}}"#;
        let link: ShareLink = decode_envelope(200, body).unwrap();
        assert_eq!(link.share_id, "abc");
        assert_eq!(link.max_uses, Some(3));
        assert_eq!(share_id_from_url(&link.share_link).as_deref(), Some("abc"));

        // Validation response for the same id
        let body = r#"{"success":true,"data":{
            "accessGranted":true,
            "file":{"fileCid":"x","name":"a.txt","size":10,"isEncrypted":false}}}"#;
        let raw: RawValidation = decode_envelope(200, body).unwrap();
        assert!(raw.access_granted);
        let file = normalize_entry(raw.file.unwrap(), false);
        assert_eq!(file.cid, "x");
        assert_eq!(file.filename, "a.txt");
        assert!(!file.is_owner);
    }

    #[test]
    fn test_validation_denied_payload() {
        let body = r#"{"success":true,"data":{"accessGranted":false}}"#;
        let raw: RawValidation = decode_envelope(200, body).unwrap();
        assert!(!raw.access_granted);
        assert!(raw.file.is_none());
    }

    #[test]
    fn test_access_info_payload_aliases() {
        let body = r#"{"success":true,"data":{"accessRule":{
            "conditionType":"email","allowedEmails":["a@b.co"]}}}"#;
        let info: AccessInfo = decode_envelope(200, body).unwrap();
        assert_eq!(info.rule.allowed_emails, vec!["a@b.co"]);

        let body = r#"{"success":true,"data":{"rule":{
            "conditionType":"time","accessEndTime":99}}}"#;
        let info: AccessInfo = decode_envelope(200, body).unwrap();
        assert_eq!(info.rule.access_end_time, Some(99));
    }
}
