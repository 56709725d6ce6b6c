//! Routes inbound platform events to the registered relay circuits.

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use {
    futures::future::BoxFuture,
    tracing::{debug, info, trace, warn},
};

use crate::{
    Error, Result,
    group::ChannelGroup,
    platform::RelayPlatform,
    policy::RelayPolicy,
    seen::SeenLedger,
    types::{BotIdentity, ChannelId, InboundMessage},
};

type InitCallback = Box<dyn FnOnce(Arc<RelayService>) -> BoxFuture<'static, Result<()>> + Send>;

/// Platform handle and bot account captured when the connection comes up.
struct Session {
    platform: Arc<dyn RelayPlatform>,
    bot: BotIdentity,
}

/// Owns every relay circuit and the suppression policy they share.
pub struct RelayService {
    policy: Arc<RelayPolicy>,
    groups: RwLock<Vec<Arc<ChannelGroup>>>,
    /// Relayed ids per channel, across every circuit.
    seen: SeenLedger,
    session: RwLock<Option<Arc<Session>>>,
    init: Mutex<Option<InitCallback>>,
}

impl RelayService {
    pub fn new() -> Self {
        Self::with_policy(RelayPolicy::default())
    }

    pub fn with_policy(policy: RelayPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            groups: RwLock::new(Vec::new()),
            seen: SeenLedger::default(),
            session: RwLock::new(None),
            init: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &Arc<RelayPolicy> {
        &self.policy
    }

    pub fn set_echo_suppression(&self, suppressed: bool) {
        self.policy.set_echo_suppression(suppressed);
    }

    pub fn set_duplicate_suppression(&self, suppressed: bool) {
        self.policy.set_duplicate_suppression(suppressed);
    }

    /// Store the setup routine run on the first successful connection.
    /// This is where circuits get registered and wired.
    pub fn configure<F, Fut>(&self, init: F)
    where
        F: FnOnce(Arc<RelayService>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let init: InitCallback = Box::new(move |service| Box::pin(init(service)));
        *self.init.lock().unwrap_or_else(PoisonError::into_inner) = Some(init);
    }

    /// The connected bot account, once ready.
    pub fn bot(&self) -> Option<BotIdentity> {
        self.session().map(|session| session.bot.clone())
    }

    /// Snapshot of the registered circuits in registration order.
    pub fn groups(&self) -> Vec<Arc<ChannelGroup>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve `channel_ids` and build a circuit over them.
    ///
    /// Fails without registering anything if an id does not resolve or a
    /// webhook cannot be set up in one of the channels. A repeated id only
    /// gets one proxy, at its first position.
    pub async fn register(&self, channel_ids: &[ChannelId]) -> Result<Arc<ChannelGroup>> {
        let session = self.session().ok_or(Error::NotReady)?;

        let mut unique = HashSet::with_capacity(channel_ids.len());
        let channel_ids: Vec<ChannelId> = channel_ids
            .iter()
            .copied()
            .filter(|&channel_id| {
                let first = unique.insert(channel_id);
                if !first {
                    warn!(%channel_id, "channel listed twice in one circuit, ignoring repeat");
                }
                first
            })
            .collect();

        let mut channels = Vec::with_capacity(channel_ids.len());
        for &channel_id in &channel_ids {
            let channel = session
                .platform
                .resolve_channel(channel_id)
                .await?
                .ok_or(Error::UnknownChannel { channel_id })?;
            channels.push(channel);
        }

        let policy = Arc::clone(&self.policy);
        let group = Arc::new(ChannelGroup::create(channels, &session.bot, policy, &self.seen).await?);
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&group));

        info!(channels = ?channel_ids, "registered relay circuit");
        Ok(group)
    }

    /// Handle one inbound message.
    ///
    /// Messages from the bot itself or from system/automated accounts are
    /// dropped. Everything else is offered to every circuit in registration
    /// order; circuits that do not contain the channel ignore it.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<()> {
        if self.is_own(message) {
            trace!(message_id = %message.id, "ignoring own message");
            return Ok(());
        }
        if message.author.is_system {
            trace!(
                message_id = %message.id,
                author = %message.author.name,
                "ignoring system author"
            );
            return Ok(());
        }

        debug!(
            message_id = %message.id,
            channel_id = %message.channel_id,
            author = %message.author.name,
            "dispatching inbound message"
        );
        for group in self.groups() {
            group.notify(message).await?;
        }
        Ok(())
    }

    fn is_own(&self, message: &InboundMessage) -> bool {
        self.session()
            .is_some_and(|session| session.bot.user_id == message.author.id)
    }

    /// Record the platform session and run the setup routine.
    ///
    /// Called on every gateway ready event. The session is replaced each time
    /// so reconnects pick up the fresh client; the setup routine only ever
    /// runs once per process.
    pub async fn on_ready(
        self: &Arc<Self>,
        platform: Arc<dyn RelayPlatform>,
        bot: BotIdentity,
    ) -> Result<()> {
        let name = bot.name.clone();
        *self.session.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(Session { platform, bot }));

        let init = self
            .init
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(init) = init {
            init(Arc::clone(self)).await?;
        }

        info!(bot = %name, circuits = self.groups().len(), "relay ready");
        Ok(())
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
