//! In-memory platform used by the unit tests. Records every outbound call in
//! the order it happened.

#![allow(clippy::unwrap_used)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    Error, Result,
    platform::{ProxyWebhook, RelayChannel, RelayPlatform},
    types::{Author, BotIdentity, ChannelId, Identity, InboundMessage, MessageId, UserId},
};

pub(crate) const BOT_USER: UserId = UserId(1);

pub(crate) fn bot() -> BotIdentity {
    BotIdentity {
        user_id: BOT_USER,
        name: "relay".into(),
    }
}

pub(crate) fn message(id: u64, channel: u64, author: &str) -> InboundMessage {
    InboundMessage {
        id: MessageId(id),
        channel_id: ChannelId(channel),
        author: Author {
            id: UserId(1000 + id),
            name: author.into(),
            avatar_url: Some(format!("https://cdn.example/{author}.png")),
            is_system: false,
        },
        content: format!("message {id}"),
        tts: false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    WebhookCreated { channel: ChannelId, name: String },
    Posted { channel: ChannelId, identity: Identity },
    Sent { channel: ChannelId, text: String },
}

#[derive(Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Channels that received a webhook post, in order.
    pub(crate) fn posted_channels(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Posted { channel, .. } => Some(channel.get()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn posts(&self) -> Vec<(u64, Identity)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Posted { channel, identity } => Some((channel.get(), identity)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn webhooks_created(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::WebhookCreated { .. }))
            .count()
    }
}

pub(crate) struct FakeWebhook {
    name: String,
    channel: ChannelId,
    recorder: Recorder,
    fail_posts: Arc<AtomicBool>,
}

#[async_trait]
impl ProxyWebhook for FakeWebhook {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    async fn post(&self, identity: &Identity) -> Result<()> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::transport(
                format!("execute webhook in channel {}", self.channel),
                std::io::Error::other("connection reset"),
            ));
        }
        self.recorder.push(Event::Posted {
            channel: self.channel,
            identity: identity.clone(),
        });
        Ok(())
    }
}

pub(crate) struct FakeChannel {
    id: ChannelId,
    recorder: Recorder,
    webhooks: Mutex<Vec<Arc<FakeWebhook>>>,
    deny_webhooks: AtomicBool,
    fail_posts: Arc<AtomicBool>,
}

impl FakeChannel {
    pub(crate) fn new(id: u64, recorder: Recorder) -> Self {
        Self {
            id: ChannelId(id),
            recorder,
            webhooks: Mutex::new(Vec::new()),
            deny_webhooks: AtomicBool::new(false),
            fail_posts: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Seed a webhook that already exists on the channel.
    pub(crate) fn add_existing_webhook(&self, name: &str) {
        let hook = self.webhook(name);
        self.webhooks.lock().unwrap().push(hook);
    }

    pub(crate) fn deny_webhooks(&self) {
        self.deny_webhooks.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_posts(&self) {
        self.fail_posts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn webhook_count(&self) -> usize {
        self.webhooks.lock().unwrap().len()
    }

    fn webhook(&self, name: &str) -> Arc<FakeWebhook> {
        Arc::new(FakeWebhook {
            name: name.into(),
            channel: self.id,
            recorder: self.recorder.clone(),
            fail_posts: Arc::clone(&self.fail_posts),
        })
    }
}

#[async_trait]
impl RelayChannel for FakeChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn list_webhooks(&self) -> Result<Vec<Arc<dyn ProxyWebhook>>> {
        if self.deny_webhooks.load(Ordering::SeqCst) {
            return Err(Error::permission(self.id, "Missing Permissions"));
        }
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .iter()
            .map(|hook| Arc::clone(hook) as Arc<dyn ProxyWebhook>)
            .collect())
    }

    async fn create_webhook(&self, name: &str) -> Result<Arc<dyn ProxyWebhook>> {
        if self.deny_webhooks.load(Ordering::SeqCst) {
            return Err(Error::permission(self.id, "Missing Permissions"));
        }
        let hook = self.webhook(name);
        self.webhooks.lock().unwrap().push(Arc::clone(&hook));
        self.recorder.push(Event::WebhookCreated {
            channel: self.id,
            name: name.into(),
        });
        Ok(hook)
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.recorder.push(Event::Sent {
            channel: self.id,
            text: text.into(),
        });
        Ok(())
    }
}

/// A platform whose channels outlive any service built on it, so webhooks
/// created by one service are visible to the next.
#[derive(Clone, Default)]
pub(crate) struct FakePlatform {
    channels: Arc<Mutex<HashMap<ChannelId, Arc<FakeChannel>>>>,
    pub(crate) recorder: Recorder,
}

impl FakePlatform {
    pub(crate) fn with_channels(ids: &[u64]) -> Self {
        let platform = Self::default();
        for &id in ids {
            platform.add_channel(id);
        }
        platform
    }

    pub(crate) fn add_channel(&self, id: u64) -> Arc<FakeChannel> {
        let channel = Arc::new(FakeChannel::new(id, self.recorder.clone()));
        self.channels
            .lock()
            .unwrap()
            .insert(ChannelId(id), Arc::clone(&channel));
        channel
    }

    pub(crate) fn channel(&self, id: u64) -> Arc<FakeChannel> {
        Arc::clone(&self.channels.lock().unwrap()[&ChannelId(id)])
    }
}

#[async_trait]
impl RelayPlatform for FakePlatform {
    async fn resolve_channel(&self, id: ChannelId) -> Result<Option<Arc<dyn RelayChannel>>> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .get(&id)
            .map(|channel| Arc::clone(channel) as Arc<dyn RelayChannel>))
    }
}
