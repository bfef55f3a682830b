use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStore;
use crate::config::DirectoryConfig;
use crate::connection::ConnectionManager;
use crate::directory::{Connector, DirectoryEntry};
use crate::error::{Error, Result};


/// Caching lookup façade over a people directory.
///
/// Entries found by a lookup are kept in a per-instance result buffer and in the shared
/// [`CacheStore`]; a username found in either is never searched for again. Both are keyed by the
/// lowercased value of the key attribute, so `Alice` and `alice` name the same person.
pub struct PeopleDirectory<C: Connector> {
    pub(crate) config: DirectoryConfig,
    pub(crate) connection: ConnectionManager<C>,
    cache: Arc<dyn CacheStore>,
    results: HashMap<String, DirectoryEntry>,
}
impl<C: Connector> PeopleDirectory<C> {
    pub fn new(config: DirectoryConfig, connector: C, cache: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;
        let bind_password = config.bindpassword.clone()
            .ok_or_else(|| Error::Config("no bind password configured".to_owned()))?;
        let connection = ConnectionManager::new(
            connector,
            config.server_url(),
            config.binddn.clone(),
            bind_password,
        );
        Ok(Self {
            config,
            connection,
            cache,
            results: HashMap::new(),
        })
    }

    pub fn config(&self) -> &DirectoryConfig { &self.config }

    pub fn connection(&self) -> &ConnectionManager<C> { &self.connection }

    /// Unbinds and releases the session.
    pub async fn close(mut self) -> Result<()> {
        self.connection.close().await
    }

    /// Whether the entry for `key` is in the result buffer or the cache.
    pub(crate) async fn in_store(&self, key: &str) -> bool {
        let key = store_key(key);
        self.results.contains_key(&key) || self.cache.has(&key).await
    }

    pub(crate) async fn get_store(&self, key: &str) -> Option<DirectoryEntry> {
        let key = store_key(key);
        match self.results.get(&key) {
            Some(entry) => Some(entry.clone()),
            None => self.cache.get(&key).await,
        }
    }

    pub(crate) async fn store(&mut self, key: &str, entry: DirectoryEntry) {
        let key = store_key(key);
        debug!("storing {} ({})", key, entry.dn);
        self.cache.put(&key, entry.clone(), self.config.cache_ttl()).await;
        self.results.insert(key, entry);
    }

    /// The entry this instance looked up for `key`, without consulting the cache.
    pub fn buffered(&self, key: &str) -> Option<&DirectoryEntry> {
        self.results.get(&store_key(key))
    }
}


fn store_key(key: &str) -> String {
    key.to_lowercase()
}
