//! # Backend API Client
//!
//! Typed wrappers over the VaultShare backend REST surface. One
//! [`ApiClient`] owns the HTTP connection pool, the base URL, and a
//! token source; the per-domain wrappers (files, access control, auth)
//! are impl blocks on it, one file each.
//!
//! ## REST Surface
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BACKEND ENDPOINTS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Files                                                                  │
//! │  GET    /files                       list caller's files               │
//! │  POST   /file/upload                 multipart upload                  │
//! │  DELETE /files                       delete all (auth gated)           │
//! │  DELETE /file/{cid}/delete           delete one (auth gated)           │
//! │  GET    /file/shared/{id}/download   shared download (headers carry    │
//! │                                      filename + encryption state)      │
//! │  GET    /api/file/{cid}/download     legacy download                   │
//! │                                                                         │
//! │  Access control                                                         │
//! │  PUT    /access-control              idempotent rule upsert            │
//! │  GET    /access-control/{fileCid}    fetch rule                        │
//! │  POST   /access-control/share-link   generate share link               │
//! │  GET    /access-control/share/{id}   validate link (unauthenticated)   │
//! │                                                                         │
//! │  Auth                                                                   │
//! │  GET    /auth/login/{provider}       OAuth login init                  │
//! │  POST   /auth/callback               callback completion               │
//! │  GET    /auth/verify                 token verify                      │
//! │                                                                         │
//! │  Test mode appends "-test" to listed endpoints and skips auth.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Response envelope convention: `{success, data?, message?}`. Any non-2xx
//! status is a failure regardless of body shape; a 2xx with `success: false`
//! is a [`crate::error::Error::Backend`] failure.

mod access;
mod auth;
mod client;
mod files;

pub use access::{share_id_from_url, GenerateShareLinkRequest, ShareLink, ShareLinkValidation};
pub use auth::{AuthCallbackRequest, AuthCallbackResponse, LoginInit};
pub use client::{ApiClient, NoToken, TokenSource};
pub use files::{EncryptionKeys, FileMetadata, SharedDownload, UploadResponse};
