//! A relay circuit: the set of channels whose traffic is mirrored.

use std::{future::Future, sync::Arc};

use tracing::debug;

use crate::{
    Result,
    callback::{CallbackSlot, message_callback},
    platform::RelayChannel,
    policy::RelayPolicy,
    proxy::ChannelProxy,
    seen::SeenLedger,
    types::{BotIdentity, ChannelId, InboundMessage, Payload},
};

/// Ordered proxies for one circuit plus an optional circuit-wide handler.
pub struct ChannelGroup {
    proxies: Vec<ChannelProxy>,
    on_receive: CallbackSlot,
}

impl ChannelGroup {
    /// Build one proxy per channel, in order. The first failure aborts the
    /// whole group. Each proxy records relayed ids in its channel's set from
    /// `seen`.
    pub async fn create(
        channels: Vec<Arc<dyn RelayChannel>>,
        bot: &BotIdentity,
        policy: Arc<RelayPolicy>,
        seen: &SeenLedger,
    ) -> Result<Self> {
        let mut proxies = Vec::with_capacity(channels.len());
        for channel in channels {
            let channel_seen = seen.channel(channel.id());
            let proxy = ChannelProxy::create(channel, bot, Arc::clone(&policy), channel_seen).await?;
            proxies.push(proxy);
        }
        Ok(Self {
            proxies,
            on_receive: CallbackSlot::default(),
        })
    }

    pub fn proxies(&self) -> &[ChannelProxy] {
        &self.proxies
    }

    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.proxies.iter().map(ChannelProxy::channel_id).collect()
    }

    pub fn contains(&self, channel_id: ChannelId) -> bool {
        self.proxies
            .iter()
            .any(|proxy| proxy.channel_id() == channel_id)
    }

    /// Deliver an inbound message to the group handler and then to each
    /// member proxy. Messages from channels outside the group are ignored.
    pub async fn notify(&self, message: &InboundMessage) -> Result<()> {
        if !self.contains(message.channel_id) {
            return Ok(());
        }
        self.on_receive.fire(message).await?;
        for proxy in &self.proxies {
            proxy.notify(message).await?;
        }
        Ok(())
    }

    /// Post `payload` into every channel of the circuit, one after another
    /// in registration order.
    pub async fn forward(&self, payload: &Payload) -> Result<()> {
        for proxy in &self.proxies {
            proxy.forward(payload).await?;
        }
        Ok(())
    }

    /// Register the handler for messages posted anywhere in the circuit.
    /// Replaces any previous handler.
    pub fn on_receive<F, Fut>(&self, callback: F)
    where
        F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_receive.set(message_callback(callback));
    }

    /// Relay every inbound message to every channel of the circuit.
    ///
    /// With echo suppression on, the origin channel is skipped.
    pub fn mirror(self: &Arc<Self>) {
        let group = Arc::downgrade(self);
        debug!(channels = ?self.channel_ids(), "mirroring relay circuit");
        self.on_receive(move |message| {
            let group = group.clone();
            async move {
                match group.upgrade() {
                    Some(group) => group.forward(&Payload::Message(message)).await,
                    None => Ok(()),
                }
            }
        });
    }
}

impl std::fmt::Debug for ChannelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelGroup")
            .field("proxies", &self.proxies)
            .finish_non_exhaustive()
    }
}
