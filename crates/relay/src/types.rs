//! Plain data carried between the platform adapter and the relay core.

use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Platform id of a text channel.
    ChannelId
);
snowflake!(
    /// Platform id of a single message.
    MessageId
);
snowflake!(
    /// Platform id of a user account.
    UserId
);

/// A posting persona handed to a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub avatar_url: Option<String>,
    pub content: String,
    pub tts: bool,
}

impl Identity {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_url: None,
            content: content.into(),
            tts: false,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    #[must_use]
    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Set by the adapter for webhook, system, or otherwise automated senders.
    pub is_system: bool,
}

/// A message delivered by the platform's gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
    pub tts: bool,
}

impl InboundMessage {
    /// The persona used to re-post this message elsewhere.
    pub fn impersonation(&self) -> Identity {
        Identity {
            name: self.author.name.clone(),
            avatar_url: self.author.avatar_url.clone(),
            content: self.content.clone(),
            tts: self.tts,
        }
    }
}

/// What a proxy or group is asked to post.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Plain text sent as the bot itself, bypassing the webhook.
    Text(String),
    /// Posted through the webhook as given, with no suppression checks.
    Identity(Identity),
    /// Relayed through the webhook, subject to echo and duplicate suppression.
    Message(InboundMessage),
}

impl From<Identity> for Payload {
    fn from(identity: Identity) -> Self {
        Self::Identity(identity)
    }
}

impl From<InboundMessage> for Payload {
    fn from(message: InboundMessage) -> Self {
        Self::Message(message)
    }
}

/// The connected bot account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: UserId,
    /// Also the name of every webhook the relay manages.
    pub name: String,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impersonation_copies_author_and_body() {
        let message = InboundMessage {
            id: MessageId(1),
            channel_id: ChannelId(100),
            author: Author {
                id: UserId(7),
                name: "alice".into(),
                avatar_url: Some("https://cdn.example/a.png".into()),
                is_system: false,
            },
            content: "hi".into(),
            tts: true,
        };

        let identity = message.impersonation();
        assert_eq!(
            identity,
            Identity::new("alice", "hi")
                .with_avatar("https://cdn.example/a.png")
                .with_tts(true)
        );
    }

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(ChannelId(123456789012345678).to_string(), "123456789012345678");
        assert_eq!(MessageId::from(5).get(), 5);
    }
}
