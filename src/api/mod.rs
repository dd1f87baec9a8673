/*!
Remote API collaborator seam.

`RemoteApi` is the capability handle bound to one profile's credentials.
The dispatcher only ever talks to this trait; the concrete reqwest-backed
implementation lives in `http.rs`, and tests substitute `testing::MockApi`.

Every operation is asynchronous and fails with an `ApiError` carrying a
human-readable message. Callers never branch on HTTP status codes — only
the message text crosses this boundary.

Construction of an implementation is offline by contract: no network call
happens until the first operation is invoked.
*/

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;
#[cfg(test)]
pub mod testing;

pub use http::HttpApi;

/// Failure from the remote collaborator: transport errors and remote-side
/// rejections collapse to one message-carrying variant each.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Remote(String),
}

/// Bytes of a downloaded attachment plus the filename the server reported.
#[derive(Debug, Clone)]
pub struct AttachmentData {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Capability-based client for one Confluence connection profile.
#[async_trait]
pub trait RemoteApi: Send + Sync + std::fmt::Debug {
    async fn list_spaces(&self) -> Result<Value, ApiError>;

    async fn get_space(&self, space_key: &str) -> Result<Value, ApiError>;

    /// CQL content search with explicit paging.
    async fn search_content(&self, cql: &str, limit: u32, start: u32) -> Result<Value, ApiError>;

    async fn get_content(&self, content_id: &str) -> Result<Value, ApiError>;

    async fn create_content(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<Value, ApiError>;

    /// `version` is the number the updated content will carry, i.e. the
    /// caller passes current + 1.
    async fn update_content(
        &self,
        content_id: &str,
        title: &str,
        body: &str,
        version: u64,
    ) -> Result<Value, ApiError>;

    async fn add_comment(&self, page_id: &str, body: &str) -> Result<Value, ApiError>;

    async fn delete_content(&self, content_id: &str) -> Result<(), ApiError>;

    async fn download_attachment(&self, attachment_id: &str) -> Result<AttachmentData, ApiError>;

    async fn get_user_by_account_id(&self, account_id: &str) -> Result<Value, ApiError>;

    /// Display-name search; resolves to the first matching user.
    async fn find_user_by_username(&self, username: &str) -> Result<Value, ApiError>;

    async fn current_user(&self) -> Result<Value, ApiError>;
}
