/*!
CommandDispatcher: the single entry point shared by the shell and the
headless runner, so validation and error shaping exist exactly once.

`dispatch` pipeline:
  1. registry lookup (unknown command fails before any client is touched)
  2. resolve effective profile / format:
       override ?? argBag value ?? config default
  3. validate required arguments — ALL missing names are reported in one
     message, not just the first
  4. fetch the profile's client from the pool (lazy construction)
  5. run the per-command operation body
  6. any failure (local or remote) becomes a failure `ResultEnvelope`;
     `dispatch` itself never returns an error

Pool teardown is the caller's job at session/process end (`teardown`);
clearing per call would defeat the pooling.
*/

use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

use super::argbag::{ArgBag, ArgBagError};
use super::envelope::{OutputFormat, ResultEnvelope};
use super::registry::{self, CommandSpec};
use crate::api::RemoteApi;
use crate::config::ProfileConfig;
use crate::log_debug;
use crate::pool::{ClientPool, PoolError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command '{0}' (run 'commands' to see what is available)")]
    UnknownCommand(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("missing required argument(s) for '{cmd}': {list}", cmd = .command, list = .names.join(", "))]
    MissingArguments { command: String, names: Vec<String> },
    #[error(transparent)]
    Arg(#[from] ArgBagError),
    #[error("argument '{key}' must be a string value")]
    InvalidArgument { key: &'static str },
    #[error("unknown format '{0}' (expected json or toon)")]
    UnknownFormat(String),
    #[error("{0}")]
    Remote(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl From<crate::api::ApiError> for DispatchError {
    fn from(e: crate::api::ApiError) -> Self {
        DispatchError::Remote(e.to_string())
    }
}

pub struct Dispatcher {
    config: Arc<ProfileConfig>,
    pool: ClientPool,
}

impl Dispatcher {
    pub fn new(config: Arc<ProfileConfig>, pool: ClientPool) -> Self {
        Self { config, pool }
    }

    /// Dispatcher wired to the reqwest-backed client factory.
    pub fn with_http_pool(config: Arc<ProfileConfig>) -> Self {
        let pool = ClientPool::http(Arc::clone(&config));
        Self::new(config, pool)
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Drop all pooled client handles. Call at session / process end.
    pub fn teardown(&mut self) {
        self.pool.clear();
    }

    /// Resolve and run one command. Every user-triggerable failure comes
    /// back as a failure envelope; this function does not return `Err`.
    pub async fn dispatch(
        &mut self,
        command: &str,
        args: &ArgBag,
        profile_override: Option<&str>,
        format_override: Option<OutputFormat>,
    ) -> ResultEnvelope {
        match self
            .try_dispatch(command, args, profile_override, format_override)
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => ResultEnvelope::failure(e),
        }
    }

    async fn try_dispatch(
        &mut self,
        command: &str,
        args: &ArgBag,
        profile_override: Option<&str>,
        format_override: Option<OutputFormat>,
    ) -> Result<ResultEnvelope, DispatchError> {
        let spec = registry::find(command)
            .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))?;

        let profile = profile_override
            .map(str::to_string)
            .or_else(|| args.get_str("profile"))
            .unwrap_or_else(|| self.config.default_profile.clone());
        let format = match format_override {
            Some(f) => f,
            None => match args.get_str("format") {
                Some(s) => {
                    OutputFormat::from_str_ci(&s).ok_or(DispatchError::UnknownFormat(s))?
                }
                None => self.config.default_format,
            },
        };

        let missing: Vec<String> = spec
            .required
            .iter()
            .filter(|name| !args.has(name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DispatchError::MissingArguments {
                command: spec.name.to_string(),
                names: missing,
            });
        }

        log_debug!("dispatching '{}' via profile '{profile}' as {format}", spec.name);
        let client = self.pool.get(&profile)?;
        let data = run_operation(spec, &client, args).await?;
        Ok(ResultEnvelope::success(data, format))
    }
}

/// A required argument's string value. Validation already proved presence;
/// this guards against non-stringifiable shapes (objects, arrays).
fn required_str(args: &ArgBag, key: &'static str) -> Result<String, DispatchError> {
    args.get_str(key)
        .ok_or(DispatchError::InvalidArgument { key })
}

/// Build the CQL query for `list-pages` from the filters present.
fn build_page_cql(space_key: Option<&str>, title: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(key) = space_key {
        parts.push(format!("space=\"{}\"", key.replace('"', "\\\"")));
    }
    if let Some(t) = title {
        parts.push(format!("title~\"{}\"", t.replace('"', "\\\"")));
    }
    parts.push("type=page".to_string());
    parts.join(" AND ")
}

async fn run_operation(
    spec: &CommandSpec,
    client: &Arc<dyn RemoteApi>,
    args: &ArgBag,
) -> Result<Value, DispatchError> {
    match spec.name {
        "list-spaces" => Ok(client.list_spaces().await?),
        "get-space" => {
            let key = required_str(args, "spaceKey")?;
            Ok(client.get_space(&key).await?)
        }
        "list-pages" => {
            let limit = args.get_u32_or("limit", 25)?;
            let start = args.get_u32_or("start", 0)?;
            let space_key = args.get_str("spaceKey");
            let title = args.get_str("title");
            let cql = build_page_cql(space_key.as_deref(), title.as_deref());
            log_debug!("list-pages cql: {cql} (limit={limit}, start={start})");
            Ok(client.search_content(&cql, limit, start).await?)
        }
        "get-page" => {
            let id = required_str(args, "pageId")?;
            Ok(client.get_content(&id).await?)
        }
        "create-page" => {
            let space_key = required_str(args, "spaceKey")?;
            let title = required_str(args, "title")?;
            let body = required_str(args, "body")?;
            let parent = args.get_str("parentId");
            Ok(client
                .create_content(&space_key, &title, &body, parent.as_deref())
                .await?)
        }
        "update-page" => {
            let id = required_str(args, "pageId")?;
            let title = required_str(args, "title")?;
            let body = required_str(args, "body")?;
            // `version` is the page's current number; the server stores
            // the update as current + 1.
            let current = args
                .get_u64("version")?
                .ok_or(DispatchError::InvalidArgument { key: "version" })?;
            Ok(client.update_content(&id, &title, &body, current + 1).await?)
        }
        "add-comment" => {
            let id = required_str(args, "pageId")?;
            let body = required_str(args, "body")?;
            Ok(client.add_comment(&id, &body).await?)
        }
        "delete-page" => {
            let id = required_str(args, "pageId")?;
            client.delete_content(&id).await?;
            Ok(json!({ "deleted": true, "pageId": id }))
        }
        "download-attachment" => {
            let id = required_str(args, "attachmentId")?;
            let attachment = client.download_attachment(&id).await?;
            let path = args
                .get_str("outputPath")
                .unwrap_or_else(|| attachment.filename.clone());
            tokio::fs::write(&path, &attachment.bytes)
                .await
                .map_err(|source| DispatchError::Io {
                    path: path.clone(),
                    source,
                })?;
            Ok(json!({
                "attachmentId": id,
                "path": path,
                "size": attachment.bytes.len(),
            }))
        }
        "get-user" => {
            // accountId wins over username when both are present.
            if let Some(account_id) = args.get_str("accountId") {
                Ok(client.get_user_by_account_id(&account_id).await?)
            } else if let Some(username) = args.get_str("username") {
                Ok(client.find_user_by_username(&username).await?)
            } else {
                Ok(client.current_user().await?)
            }
        }
        "test-connection" => {
            let user = client.current_user().await?;
            Ok(json!({ "connected": true, "user": user }))
        }
        other => Err(DispatchError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CONFIG: &str = r#"
default_profile = "cloud"

[profiles.cloud]
host = "https://example.atlassian.net"
email = "cloud@example.com"
api_token = "tok"

[profiles.staging]
host = "https://staging.example.com"
email = "staging@example.com"
api_token = "tok2"
"#;

    struct Harness {
        dispatcher: Dispatcher,
        mock: Arc<MockApi>,
        constructions: Arc<AtomicUsize>,
        /// Emails of the profiles handles were constructed for, in order.
        constructed_for: Arc<Mutex<Vec<String>>>,
    }

    fn harness_with(mock: MockApi) -> Harness {
        let config = Arc::new(ProfileConfig::from_toml(CONFIG).unwrap());
        let mock = Arc::new(mock);
        let constructions = Arc::new(AtomicUsize::new(0));
        let constructed_for = Arc::new(Mutex::new(Vec::new()));

        let factory_mock = Arc::clone(&mock);
        let factory_count = Arc::clone(&constructions);
        let factory_profiles = Arc::clone(&constructed_for);
        let pool = ClientPool::new(
            Arc::clone(&config),
            Box::new(move |creds| {
                factory_count.fetch_add(1, Ordering::SeqCst);
                factory_profiles.lock().unwrap().push(creds.email.clone());
                Ok(Arc::clone(&factory_mock) as Arc<dyn RemoteApi>)
            }),
        );

        Harness {
            dispatcher: Dispatcher::new(config, pool),
            mock,
            constructions,
            constructed_for,
        }
    }

    fn harness() -> Harness {
        harness_with(MockApi::new())
    }

    fn bag(json_str: &str) -> ArgBag {
        ArgBag::from_json_str(json_str).unwrap()
    }

    #[tokio::test]
    async fn missing_required_args_are_reported_together() {
        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch("create-page", &bag(r#"{"spaceKey":"DOCS"}"#), None, None)
            .await;

        assert!(!env.success);
        let err = env.error.unwrap();
        assert!(err.starts_with("ERROR:"));
        assert!(err.contains("title") && err.contains("body"), "got: {err}");
        assert_eq!(h.mock.call_count(), 0, "no remote call before validation passes");
    }

    #[tokio::test]
    async fn unknown_command_touches_no_client() {
        let mut h = harness();
        let env = h.dispatcher.dispatch("unknown-cmd", &bag("{}"), None, None).await;

        assert!(!env.success);
        assert!(env.error.unwrap().contains("unknown-cmd"));
        assert_eq!(h.constructions.load(Ordering::SeqCst), 0);
        assert!(h.dispatcher.pool().is_empty());
    }

    #[tokio::test]
    async fn unknown_profile_fails_without_remote_calls() {
        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch("list-spaces", &bag("{}"), Some("nope"), None)
            .await;

        assert!(!env.success);
        assert!(env.error.unwrap().contains("nope"));
        assert_eq!(h.mock.call_count(), 0);
    }

    #[tokio::test]
    async fn list_pages_applies_defaults_and_unscoped_cql() {
        let mut h = harness();
        let env = h.dispatcher.dispatch("list-pages", &bag("{}"), None, None).await;

        assert!(env.success);
        let calls = h.mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].op, "search_content");
        assert_eq!(calls[0].args["cql"], "type=page");
        assert_eq!(calls[0].args["limit"], 25);
        assert_eq!(calls[0].args["start"], 0);
    }

    #[tokio::test]
    async fn list_pages_preserves_explicit_zero_start() {
        let mut h = harness();
        h.dispatcher
            .dispatch(
                "list-pages",
                &bag(r#"{"start":0,"spaceKey":"DOCS"}"#),
                None,
                None,
            )
            .await;

        let calls = h.mock.calls();
        assert_eq!(calls[0].args["start"], 0);
        assert_eq!(calls[0].args["cql"], "space=\"DOCS\" AND type=page");
    }

    #[tokio::test]
    async fn list_pages_title_filter_joins_with_and() {
        let mut h = harness();
        h.dispatcher
            .dispatch(
                "list-pages",
                &bag(r#"{"spaceKey":"DOCS","title":"Setup","limit":5}"#),
                None,
                None,
            )
            .await;

        let calls = h.mock.calls();
        assert_eq!(
            calls[0].args["cql"],
            "space=\"DOCS\" AND title~\"Setup\" AND type=page"
        );
        assert_eq!(calls[0].args["limit"], 5);
    }

    #[tokio::test]
    async fn update_page_sends_incremented_version() {
        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch(
                "update-page",
                &bag(r#"{"pageId":"1","title":"t","body":"b","version":5}"#),
                None,
                None,
            )
            .await;

        assert!(env.success);
        let calls = h.mock.calls();
        assert_eq!(calls[0].op, "update_content");
        assert_eq!(calls[0].args["version"], 6);
    }

    #[tokio::test]
    async fn get_user_account_id_wins_over_username() {
        let mut h = harness();
        h.dispatcher
            .dispatch(
                "get-user",
                &bag(r#"{"accountId":"abc","username":"Ada"}"#),
                None,
                None,
            )
            .await;
        h.dispatcher
            .dispatch("get-user", &bag(r#"{"username":"Ada"}"#), None, None)
            .await;
        h.dispatcher.dispatch("get-user", &bag("{}"), None, None).await;

        let ops: Vec<&str> = h.mock.calls().iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec!["get_user_by_account_id", "find_user_by_username", "current_user"]
        );
    }

    #[tokio::test]
    async fn remote_failure_becomes_error_envelope() {
        let mut h = harness_with(MockApi::failing("boom from remote"));
        let env = h.dispatcher.dispatch("list-spaces", &bag("{}"), None, None).await;

        assert!(!env.success);
        let err = env.error.unwrap();
        assert!(err.starts_with("ERROR:"), "got: {err}");
        assert!(err.contains("boom from remote"));
        assert!(env.data.is_none() && env.result.is_none());
    }

    #[tokio::test]
    async fn profile_resolution_order() {
        let mut h = harness();
        // Bag profile beats the config default.
        h.dispatcher
            .dispatch("list-spaces", &bag(r#"{"profile":"staging"}"#), None, None)
            .await;
        // Explicit override beats the bag.
        h.dispatcher
            .dispatch(
                "list-spaces",
                &bag(r#"{"profile":"staging"}"#),
                Some("cloud"),
                None,
            )
            .await;

        let profiles = h.constructed_for.lock().unwrap().clone();
        assert_eq!(profiles, vec!["staging@example.com", "cloud@example.com"]);
    }

    #[tokio::test]
    async fn client_handles_are_pooled_across_dispatches() {
        let mut h = harness();
        for _ in 0..3 {
            h.dispatcher.dispatch("list-spaces", &bag("{}"), None, None).await;
        }
        assert_eq!(h.constructions.load(Ordering::SeqCst), 1);
        assert_eq!(h.dispatcher.pool().len(), 1);
    }

    #[tokio::test]
    async fn format_resolution_and_toon_rendering() {
        let mock = MockApi::new().with_response("list_spaces", serde_json::json!({ "size": 2 }));
        let mut h = harness_with(mock);

        let from_bag = h
            .dispatcher
            .dispatch("list-spaces", &bag(r#"{"format":"toon"}"#), None, None)
            .await;
        assert_eq!(from_bag.result.as_deref(), Some("size: 2"));

        let overridden = h
            .dispatcher
            .dispatch(
                "list-spaces",
                &bag(r#"{"format":"toon"}"#),
                None,
                Some(OutputFormat::Json),
            )
            .await;
        assert_eq!(overridden.result.as_deref(), Some("{\n  \"size\": 2\n}"));
    }

    #[tokio::test]
    async fn unknown_format_value_is_reported() {
        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch("list-spaces", &bag(r#"{"format":"yaml"}"#), None, None)
            .await;
        assert!(!env.success);
        assert!(env.error.unwrap().contains("yaml"));
        assert_eq!(h.mock.call_count(), 0);
    }

    #[tokio::test]
    async fn delete_page_reports_structured_confirmation() {
        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch("delete-page", &bag(r#"{"pageId":"77"}"#), None, None)
            .await;

        assert!(env.success);
        assert_eq!(env.data.unwrap(), serde_json::json!({ "deleted": true, "pageId": "77" }));
        assert_eq!(h.mock.calls()[0].op, "delete_content");
    }

    #[tokio::test]
    async fn download_attachment_writes_bytes_to_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let path_str = path.display().to_string();

        let mut h = harness();
        let env = h
            .dispatcher
            .dispatch(
                "download-attachment",
                &bag(&format!(
                    r#"{{"attachmentId":"att9","outputPath":"{path_str}"}}"#
                )),
                None,
                None,
            )
            .await;

        assert!(env.success, "error: {:?}", env.error);
        assert_eq!(std::fs::read(&path).unwrap(), b"mock-bytes");
        let data = env.data.unwrap();
        assert_eq!(data["path"], path_str.as_str());
        assert_eq!(data["size"], 10);
    }

    #[tokio::test]
    async fn test_connection_wraps_current_user() {
        let mock = MockApi::new()
            .with_response("current_user", serde_json::json!({ "displayName": "Ada" }));
        let mut h = harness_with(mock);
        let env = h
            .dispatcher
            .dispatch("test-connection", &bag("{}"), None, None)
            .await;

        assert!(env.success);
        let data = env.data.unwrap();
        assert_eq!(data["connected"], true);
        assert_eq!(data["user"]["displayName"], "Ada");
    }

    #[tokio::test]
    async fn end_to_end_list_spaces_and_teardown() {
        let mock = MockApi::new().with_response(
            "list_spaces",
            serde_json::json!({ "results": [{ "key": "DOCS" }, { "key": "ENG" }], "size": 2 }),
        );
        let mut h = harness_with(mock);

        let env = h.dispatcher.dispatch("list-spaces", &bag("{}"), None, None).await;
        assert!(env.success);
        let rendered = env.result.unwrap();
        assert!(rendered.contains("DOCS") && rendered.contains("ENG"));

        h.dispatcher.teardown();
        assert!(h.dispatcher.pool().is_empty());

        h.dispatcher.dispatch("list-spaces", &bag("{}"), None, None).await;
        assert_eq!(h.constructions.load(Ordering::SeqCst), 2);
    }
}
