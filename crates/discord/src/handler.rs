//! Discord event handler for serenity.
//!
//! Converts gateway events into relay calls. Errors are logged here and never
//! stop the gateway; only a failed setup routine is escalated to the runner.

use std::sync::Arc;

use {
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Message, Ready},
        async_trait,
    },
    tokio::sync::mpsc,
    tracing::{debug, error, info, warn},
};

use connecty_relay::{
    self as relay, Author, BotIdentity, InboundMessage, MessageId, RelayService, UserId,
};

use crate::platform::DiscordPlatform;

/// Facts about a message author used to decide whether it is automated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorTraits {
    /// The message was posted through a webhook (including our own proxies).
    pub from_webhook: bool,
    /// Discord's official system account.
    pub system: bool,
    /// The account has a legacy `#1234` discriminator.
    pub has_discriminator: bool,
}

impl AuthorTraits {
    fn of(msg: &Message) -> Self {
        Self {
            from_webhook: msg.webhook_id.is_some(),
            system: msg.author.system,
            has_discriminator: msg.author.discriminator.is_some(),
        }
    }

    /// Webhook and system posts are always automated. With
    /// `legacy_discriminator_filter`, so is any author without a
    /// discriminator; that heuristic predates Discord's username migration
    /// and also matches every migrated human account.
    pub fn is_system(self, legacy_discriminator_filter: bool) -> bool {
        self.from_webhook || self.system || (legacy_discriminator_filter && !self.has_discriminator)
    }
}

/// Build the relay's view of a gateway message.
pub fn inbound_message(msg: &Message, legacy_discriminator_filter: bool) -> InboundMessage {
    InboundMessage {
        id: MessageId(msg.id.get()),
        channel_id: relay::ChannelId(msg.channel_id.get()),
        author: Author {
            id: UserId(msg.author.id.get()),
            name: msg
                .author
                .global_name
                .clone()
                .unwrap_or_else(|| msg.author.name.clone()),
            avatar_url: Some(msg.author.face()),
            is_system: AuthorTraits::of(msg).is_system(legacy_discriminator_filter),
        },
        content: msg.content.clone(),
        tts: msg.tts,
    }
}

/// Handler for Discord gateway events.
pub struct RelayHandler {
    service: Arc<RelayService>,
    legacy_discriminator_filter: bool,
    setup_failures: Option<mpsc::UnboundedSender<relay::Error>>,
}

impl RelayHandler {
    pub fn new(service: Arc<RelayService>) -> Self {
        Self {
            service,
            legacy_discriminator_filter: false,
            setup_failures: None,
        }
    }

    pub fn with_legacy_discriminator_filter(mut self, enabled: bool) -> Self {
        self.legacy_discriminator_filter = enabled;
        self
    }

    /// Report setup routine failures on `sender` instead of only logging them.
    pub fn with_setup_failures(mut self, sender: mpsc::UnboundedSender<relay::Error>) -> Self {
        self.setup_failures = Some(sender);
        self
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );

        let platform = Arc::new(DiscordPlatform::new(Arc::clone(&ctx.http)));
        let bot = BotIdentity {
            user_id: UserId(ready.user.id.get()),
            name: ready.user.name.clone(),
        };

        if let Err(e) = self.service.on_ready(platform, bot).await {
            error!(error = %e, "relay setup failed");
            if let Some(sender) = &self.setup_failures {
                let _ = sender.send(e);
            }
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = inbound_message(&msg, self.legacy_discriminator_filter);
        debug!(
            message_id = %msg.id,
            channel_id = %msg.channel_id,
            system = inbound.author.is_system,
            "received discord message"
        );

        if let Err(e) = self.service.dispatch(&inbound).await {
            warn!(
                message_id = %msg.id,
                channel_id = %msg.channel_id,
                error = %e,
                "failed to relay message"
            );
        }
    }
}
