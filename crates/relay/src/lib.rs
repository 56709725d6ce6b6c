//! Webhook relay core.
//!
//! Mirrors messages between the channels of a relay circuit, re-posting each
//! one through a per-channel webhook under the original author's name and
//! avatar. The platform client is abstracted behind the traits in
//! [`platform`]; `connecty-discord` provides the serenity implementation.

pub mod callback;
pub mod error;
pub mod group;
pub mod platform;
pub mod policy;
pub mod proxy;
pub mod seen;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    error::{Error, Result},
    group::ChannelGroup,
    platform::{ProxyWebhook, RelayChannel, RelayPlatform},
    policy::RelayPolicy,
    proxy::ChannelProxy,
    seen::{SeenLedger, SeenSet},
    service::RelayService,
    types::{Author, BotIdentity, ChannelId, Identity, InboundMessage, MessageId, Payload, UserId},
};
