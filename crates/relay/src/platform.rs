//! Seams between the relay core and the chat platform client.
//!
//! Implementations map their own errors onto [`crate::Error`]: webhook
//! permission denials become `Permission`, everything else `Transport`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Result,
    types::{ChannelId, Identity},
};

/// Entry point into the platform client.
#[async_trait]
pub trait RelayPlatform: Send + Sync {
    /// Look up a channel. `Ok(None)` means the id does not name a channel the
    /// bot can post webhooks into.
    async fn resolve_channel(&self, id: ChannelId) -> Result<Option<Arc<dyn RelayChannel>>>;
}

/// A live channel reference.
#[async_trait]
pub trait RelayChannel: Send + Sync {
    fn id(&self) -> ChannelId;

    async fn list_webhooks(&self) -> Result<Vec<Arc<dyn ProxyWebhook>>>;

    async fn create_webhook(&self, name: &str) -> Result<Arc<dyn ProxyWebhook>>;

    /// Post as the bot account itself.
    async fn send(&self, text: &str) -> Result<()>;
}

/// A webhook that can post under an arbitrary name and avatar.
#[async_trait]
pub trait ProxyWebhook: Send + Sync {
    fn name(&self) -> Option<&str>;

    async fn post(&self, identity: &Identity) -> Result<()>;
}
