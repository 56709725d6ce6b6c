use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use futures::future::BoxFuture;

use crate::{Result, types::InboundMessage};

/// Handler invoked for inbound messages seen by a proxy or group.
pub type MessageCallback =
    Arc<dyn Fn(InboundMessage) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wrap an async closure into a [`MessageCallback`].
pub fn message_callback<F, Fut>(callback: F) -> MessageCallback
where
    F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |message| Box::pin(callback(message)))
}

/// Holds at most one callback. Setting a new one replaces the old.
#[derive(Default)]
pub(crate) struct CallbackSlot {
    inner: RwLock<Option<MessageCallback>>,
}

impl CallbackSlot {
    pub(crate) fn set(&self, callback: MessageCallback) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    /// Run the registered callback, if any.
    pub(crate) async fn fire(&self, message: &InboundMessage) -> Result<()> {
        // Clone out so the lock is not held across the await.
        let callback = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => callback(message.clone()).await,
            None => Ok(()),
        }
    }
}
