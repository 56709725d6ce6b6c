//! One channel's end of a relay circuit.

use std::{future::Future, sync::Arc};

use tracing::{debug, info};

use crate::{
    Result,
    callback::{CallbackSlot, message_callback},
    platform::{ProxyWebhook, RelayChannel},
    policy::RelayPolicy,
    seen::SeenSet,
    types::{BotIdentity, ChannelId, InboundMessage, MessageId, Payload},
};

/// Posts into a single channel through the bot's managed webhook.
pub struct ChannelProxy {
    channel_id: ChannelId,
    channel: Arc<dyn RelayChannel>,
    webhook: Arc<dyn ProxyWebhook>,
    /// Ids already relayed into this channel, shared with every other proxy
    /// bound to it.
    seen: Arc<SeenSet>,
    on_receive: CallbackSlot,
    policy: Arc<RelayPolicy>,
}

impl ChannelProxy {
    /// Bind to `channel`, reusing the webhook named after the bot or creating
    /// one if none exists. `seen` must be the set for `channel`.
    pub async fn create(
        channel: Arc<dyn RelayChannel>,
        bot: &BotIdentity,
        policy: Arc<RelayPolicy>,
        seen: Arc<SeenSet>,
    ) -> Result<Self> {
        let channel_id = channel.id();
        let existing = channel
            .list_webhooks()
            .await?
            .into_iter()
            .find(|hook| hook.name() == Some(bot.name.as_str()));

        let webhook = match existing {
            Some(hook) => {
                debug!(%channel_id, webhook = %bot.name, "reusing relay webhook");
                hook
            },
            None => {
                info!(%channel_id, webhook = %bot.name, "creating relay webhook");
                channel.create_webhook(&bot.name).await?
            },
        };

        Ok(Self {
            channel_id,
            channel,
            webhook,
            seen,
            on_receive: CallbackSlot::default(),
            policy,
        })
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Post `payload` into this channel.
    ///
    /// Only [`Payload::Message`] is subject to echo and duplicate suppression;
    /// a suppressed message is dropped silently.
    pub async fn forward(&self, payload: &Payload) -> Result<()> {
        match payload {
            Payload::Text(text) => self.channel.send(text).await,
            Payload::Identity(identity) => self.webhook.post(identity).await,
            Payload::Message(message) => {
                if !self.admit(message) {
                    return Ok(());
                }
                self.webhook.post(&message.impersonation()).await
            },
        }
    }

    fn admit(&self, message: &InboundMessage) -> bool {
        if self.policy.echo_suppressed() && message.channel_id == self.channel_id {
            debug!(
                channel_id = %self.channel_id,
                message_id = %message.id,
                "echo suppressed"
            );
            return false;
        }

        if self.policy.duplicate_suppressed() && !self.seen.insert(message.id) {
            debug!(
                channel_id = %self.channel_id,
                message_id = %message.id,
                "duplicate suppressed"
            );
            return false;
        }

        true
    }

    /// Fire the per-proxy callback if `message` was posted in this channel.
    pub async fn notify(&self, message: &InboundMessage) -> Result<()> {
        if message.channel_id != self.channel_id {
            return Ok(());
        }
        self.on_receive.fire(message).await
    }

    /// Register the handler for messages posted in this channel. Replaces any
    /// previous handler.
    pub fn on_receive<F, Fut>(&self, callback: F)
    where
        F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_receive.set(message_callback(callback));
    }

    pub fn has_seen(&self, id: MessageId) -> bool {
        self.seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl std::fmt::Debug for ChannelProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelProxy")
            .field("channel_id", &self.channel_id)
            .field("webhook", &self.webhook.name())
            .finish_non_exhaustive()
    }
}
