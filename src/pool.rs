/*!
ClientPool: one live remote-client handle per profile name.

Handles are constructed lazily through an injected factory on the first
`get` for a profile, then reused for every later dispatch to that profile.
`clear` drops every handle; the next `get` constructs a fresh one. The
pool is the only holder of handles — callers receive `Arc` clones whose
identity is stable until the pool is cleared.

Lookup of an undefined profile is a local validation failure
(`PoolError::ProfileNotFound`) and never mutates the pool.
*/

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiError, HttpApi, RemoteApi};
use crate::config::{ProfileConfig, ProfileCredentials};
use crate::log_debug;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("profile '{0}' is not defined in the configuration")]
    ProfileNotFound(String),
    #[error("failed to construct client: {0}")]
    Construction(#[from] ApiError),
}

/// Builds a client handle from a profile's credentials. Construction is
/// offline by contract — no network call happens here.
pub type ClientFactory =
    Box<dyn Fn(&ProfileCredentials) -> Result<Arc<dyn RemoteApi>, ApiError> + Send + Sync>;

pub struct ClientPool {
    config: Arc<ProfileConfig>,
    factory: ClientFactory,
    clients: HashMap<String, Arc<dyn RemoteApi>>,
}

impl ClientPool {
    pub fn new(config: Arc<ProfileConfig>, factory: ClientFactory) -> Self {
        Self {
            config,
            factory,
            clients: HashMap::new(),
        }
    }

    /// Pool with the default reqwest-backed client factory.
    pub fn http(config: Arc<ProfileConfig>) -> Self {
        Self::new(
            config,
            Box::new(|creds| Ok(Arc::new(HttpApi::new(creds)?) as Arc<dyn RemoteApi>)),
        )
    }

    /// Return the cached handle for `profile`, constructing it on first use.
    pub fn get(&mut self, profile: &str) -> Result<Arc<dyn RemoteApi>, PoolError> {
        if let Some(existing) = self.clients.get(profile) {
            log_debug!("client pool hit for profile '{profile}'");
            return Ok(Arc::clone(existing));
        }

        let creds = self
            .config
            .credentials(profile)
            .ok_or_else(|| PoolError::ProfileNotFound(profile.to_string()))?;
        log_debug!("client pool miss for profile '{profile}', constructing handle");
        let handle = (self.factory)(creds)?;
        self.clients.insert(profile.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop every cached handle. Idempotent; an empty pool is a no-op.
    pub fn clear(&mut self) {
        if !self.clients.is_empty() {
            log_debug!("clearing {} pooled client(s)", self.clients.len());
        }
        self.clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
