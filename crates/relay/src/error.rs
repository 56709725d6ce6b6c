use std::error::Error as StdError;

use crate::types::ChannelId;

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the relay core.
///
/// Nothing in the core retries or recovers; every variant reaches the caller
/// of `register`, `forward` or `dispatch` unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bot may not list or create webhooks in the channel.
    #[error("missing webhook permission in channel {channel_id}: {message}")]
    Permission {
        channel_id: ChannelId,
        message: String,
    },

    /// A platform call (post, send, lookup) failed.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A configured channel id does not resolve to a channel the bot can see.
    #[error("unknown channel: {channel_id}")]
    UnknownChannel { channel_id: ChannelId },

    /// Channels were registered before the platform session was established.
    #[error("relay is not connected to the platform yet")]
    NotReady,

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn permission(channel_id: ChannelId, message: impl std::fmt::Display) -> Self {
        Self::Permission {
            channel_id,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl connecty_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

connecty_common::impl_context!();
