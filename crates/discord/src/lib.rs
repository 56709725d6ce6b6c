//! Discord transport for the relay core.
//!
//! Implements the `connecty-relay` platform traits on top of serenity's HTTP
//! client and feeds gateway events into a [`connecty_relay::RelayService`].

pub mod bot;
pub mod handler;
pub mod platform;

pub use {bot::run, handler::RelayHandler, platform::DiscordPlatform};
