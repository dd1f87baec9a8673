/*!
Mock `RemoteApi` for dispatcher / pool tests.

Records every invocation (operation name + arguments) and replies with
canned JSON per operation; `failing` turns every call into a remote error.
Dispatch is strictly sequential, so a plain `Mutex` is enough.
*/

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ApiError, AttachmentData, RemoteApi};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub op: &'static str,
    pub args: Value,
}

#[derive(Debug, Default)]
pub struct MockApi {
    calls: Mutex<Vec<RecordedCall>>,
    responses: HashMap<&'static str, Value>,
    fail_with: Option<String>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned response for one operation name.
    pub fn with_response(mut self, op: &'static str, value: Value) -> Self {
        self.responses.insert(op, value);
        self
    }

    /// Every operation fails with this remote message.
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, op: &'static str, args: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall { op, args });
        if let Some(msg) = &self.fail_with {
            return Err(ApiError::Remote(msg.clone()));
        }
        Ok(self.responses.get(op).cloned().unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    async fn list_spaces(&self) -> Result<Value, ApiError> {
        self.record("list_spaces", Value::Null)
    }

    async fn get_space(&self, space_key: &str) -> Result<Value, ApiError> {
        self.record("get_space", json!({ "spaceKey": space_key }))
    }

    async fn search_content(&self, cql: &str, limit: u32, start: u32) -> Result<Value, ApiError> {
        self.record(
            "search_content",
            json!({ "cql": cql, "limit": limit, "start": start }),
        )
    }

    async fn get_content(&self, content_id: &str) -> Result<Value, ApiError> {
        self.record("get_content", json!({ "id": content_id }))
    }

    async fn create_content(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.record(
            "create_content",
            json!({ "spaceKey": space_key, "title": title, "body": body, "parentId": parent_id }),
        )
    }

    async fn update_content(
        &self,
        content_id: &str,
        title: &str,
        body: &str,
        version: u64,
    ) -> Result<Value, ApiError> {
        self.record(
            "update_content",
            json!({ "id": content_id, "title": title, "body": body, "version": version }),
        )
    }

    async fn add_comment(&self, page_id: &str, body: &str) -> Result<Value, ApiError> {
        self.record("add_comment", json!({ "pageId": page_id, "body": body }))
    }

    async fn delete_content(&self, content_id: &str) -> Result<(), ApiError> {
        self.record("delete_content", json!({ "id": content_id }))
            .map(|_| ())
    }

    async fn download_attachment(&self, attachment_id: &str) -> Result<AttachmentData, ApiError> {
        self.record("download_attachment", json!({ "id": attachment_id }))?;
        Ok(AttachmentData {
            filename: format!("{attachment_id}.bin"),
            bytes: b"mock-bytes".to_vec(),
        })
    }

    async fn get_user_by_account_id(&self, account_id: &str) -> Result<Value, ApiError> {
        self.record("get_user_by_account_id", json!({ "accountId": account_id }))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Value, ApiError> {
        self.record("find_user_by_username", json!({ "username": username }))
    }

    async fn current_user(&self) -> Result<Value, ApiError> {
        self.record("current_user", Value::Null)
    }
}
