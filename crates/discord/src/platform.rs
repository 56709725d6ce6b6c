//! serenity-backed implementations of the relay platform traits.

use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::{
        Error as SerenityError,
        all::{ChannelId, CreateWebhook, ExecuteWebhook, Http, Webhook},
    },
    tracing::debug,
};

use connecty_relay::{self as relay, Identity, ProxyWebhook, RelayChannel, RelayPlatform};

/// HTTP status code carried by a failed Discord API call, if any.
fn status_of(err: &SerenityError) -> Option<u16> {
    match err {
        SerenityError::Http(http) => http.status_code().map(|code| code.as_u16()),
        _ => None,
    }
}

/// Map a failed webhook list/create call. A 403 means the bot lacks Manage
/// Webhooks in that channel.
fn webhook_error(channel_id: relay::ChannelId, action: &str, err: SerenityError) -> relay::Error {
    if status_of(&err) == Some(403) {
        relay::Error::permission(channel_id, err)
    } else {
        relay::Error::transport(format!("{action} in channel {channel_id}"), err)
    }
}

/// Discord client handle shared by every proxy of a relay service.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RelayPlatform for DiscordPlatform {
    async fn resolve_channel(
        &self,
        id: relay::ChannelId,
    ) -> relay::Result<Option<Arc<dyn RelayChannel>>> {
        // Discord ids are never zero; serenity panics when asked to build one.
        if id.get() == 0 {
            return Ok(None);
        }

        match self.http.get_channel(ChannelId::new(id.get())).await {
            Ok(channel) => {
                let Some(guild_channel) = channel.guild() else {
                    debug!(channel_id = %id, "not a guild channel, webhooks unavailable");
                    return Ok(None);
                };
                Ok(Some(Arc::new(DiscordChannel {
                    id: guild_channel.id,
                    http: Arc::clone(&self.http),
                })))
            },
            // Unknown channel, or one the bot cannot see.
            Err(err) if matches!(status_of(&err), Some(403 | 404)) => {
                debug!(channel_id = %id, error = %err, "channel did not resolve");
                Ok(None)
            },
            Err(err) => Err(relay::Error::transport(format!("resolve channel {id}"), err)),
        }
    }
}

struct DiscordChannel {
    id: ChannelId,
    http: Arc<Http>,
}

impl DiscordChannel {
    fn proxy(&self, webhook: Webhook) -> Arc<dyn ProxyWebhook> {
        Arc::new(DiscordWebhook {
            webhook,
            http: Arc::clone(&self.http),
        })
    }
}

#[async_trait]
impl RelayChannel for DiscordChannel {
    fn id(&self) -> relay::ChannelId {
        relay::ChannelId(self.id.get())
    }

    async fn list_webhooks(&self) -> relay::Result<Vec<Arc<dyn ProxyWebhook>>> {
        let webhooks = self
            .id
            .webhooks(&self.http)
            .await
            .map_err(|err| webhook_error(self.id(), "list webhooks", err))?;
        Ok(webhooks.into_iter().map(|hook| self.proxy(hook)).collect())
    }

    async fn create_webhook(&self, name: &str) -> relay::Result<Arc<dyn ProxyWebhook>> {
        let webhook = self
            .id
            .create_webhook(&self.http, CreateWebhook::new(name))
            .await
            .map_err(|err| webhook_error(self.id(), "create webhook", err))?;
        Ok(self.proxy(webhook))
    }

    async fn send(&self, text: &str) -> relay::Result<()> {
        self.id
            .say(&self.http, text)
            .await
            .map(drop)
            .map_err(|err| relay::Error::transport(format!("send to channel {}", self.id), err))
    }
}

struct DiscordWebhook {
    webhook: Webhook,
    http: Arc<Http>,
}

#[async_trait]
impl ProxyWebhook for DiscordWebhook {
    fn name(&self) -> Option<&str> {
        self.webhook.name.as_deref()
    }

    async fn post(&self, identity: &Identity) -> relay::Result<()> {
        let mut builder = ExecuteWebhook::new()
            .content(identity.content.as_str())
            .username(identity.name.as_str())
            .tts(identity.tts);
        if let Some(avatar_url) = &identity.avatar_url {
            builder = builder.avatar_url(avatar_url.as_str());
        }

        self.webhook
            .execute(&self.http, false, builder)
            .await
            .map(drop)
            .map_err(|err| {
                relay::Error::transport(format!("execute webhook {}", self.webhook.id), err)
            })
    }
}
