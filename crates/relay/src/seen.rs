//! Per-channel record of message ids already relayed.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use crate::types::{ChannelId, MessageId};

/// Message ids relayed into one channel. Never pruned.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: Mutex<HashSet<MessageId>>,
}

impl SeenSet {
    /// Record `id`. Returns `false` if it was already recorded.
    pub fn insert(&self, id: MessageId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One [`SeenSet`] per channel, handed to every proxy bound to that channel
/// so overlapping circuits never post the same message twice into it.
#[derive(Debug, Default)]
pub struct SeenLedger {
    channels: Mutex<HashMap<ChannelId, Arc<SeenSet>>>,
}

impl SeenLedger {
    pub fn channel(&self, channel_id: ChannelId) -> Arc<SeenSet> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(channels.entry(channel_id).or_default())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_channel_shares_one_set() {
        let ledger = SeenLedger::default();
        let first = ledger.channel(ChannelId(100));
        let second = ledger.channel(ChannelId(100));
        let other = ledger.channel(ChannelId(200));

        assert!(first.insert(MessageId(1)));
        assert!(!second.insert(MessageId(1)));
        assert!(second.contains(MessageId(1)));
        assert!(other.is_empty());
        assert!(other.insert(MessageId(1)));
    }
}
