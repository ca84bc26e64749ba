//! Local Configuration Storage
//!
//! Abstracts the key-value configuration record in which the access token is
//! persisted. The desktop implementation is a JSON file; hosts may supply
//! anything that can hold string values under string keys.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value configuration store trait
///
/// The store is not locked across processes. Two writers racing on the same
/// location see last-write-wins semantics.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ConfigStore;
///
/// async fn remember(store: &dyn ConfigStore, token: &str) -> Result<()> {
///     store.clear_all().await?;
///     store.set_string("access_token", token).await
/// }
/// ```
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Human-readable location of the store (a path for file-backed stores)
    fn location(&self) -> String;

    /// Store a string value, replacing any previous value for `key`
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Remove every key from the store
    async fn clear_all(&self) -> Result<()>;
}
