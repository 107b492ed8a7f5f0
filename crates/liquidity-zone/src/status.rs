//! The Status Publisher (§4.6): a periodic summary of one zone's state,
//! emitted to the cluster-wide `zone-status` topic for the Zone Monitor to
//! aggregate. In a single-process rendering there is no second node to
//! aggregate on, so [`BroadcastStatusTopic`] - a `tokio::sync::broadcast`
//! channel - stands in for the real deployment's cluster pub/sub (see
//! `DESIGN.md`).

use async_trait::async_trait;
use indexmap::IndexMap;
use liquidity_crypto::PublicKeyDer;
use liquidity_types::{Account, Member, Transaction, ZoneId};
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::broadcast;

/// One zone's contribution to the cluster-wide active-zone view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveZoneSummary {
    pub zone_id: ZoneId,
    pub members: IndexMap<liquidity_types::MemberId, Member>,
    pub accounts: IndexMap<liquidity_types::AccountId, Account>,
    pub transactions: IndexMap<liquidity_types::TransactionId, Transaction>,
    pub metadata: Option<serde_json::Value>,
    pub connected_client_keys: BTreeSet<PublicKeyDer>,
}

/// The well-known cluster-wide publish/subscribe topic (§4.6, §5 "Shared
/// resources": "need not be ordered").
#[async_trait]
pub trait StatusTopic: Send + Sync {
    async fn publish(&self, summary: ActiveZoneSummary);
}

/// In-process stand-in for the cluster topic.
pub struct BroadcastStatusTopic {
    tx: broadcast::Sender<ActiveZoneSummary>,
}

impl BroadcastStatusTopic {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive every published summary (the Zone Monitor's
    /// role).
    pub fn subscribe(&self) -> broadcast::Receiver<ActiveZoneSummary> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastStatusTopic {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl StatusTopic for BroadcastStatusTopic {
    async fn publish(&self, summary: ActiveZoneSummary) {
        // No subscribers is not an error - nobody is watching yet.
        let _ = self.tx.send(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_types::ZoneId;

    #[tokio::test]
    async fn subscriber_receives_published_summary() {
        let topic = BroadcastStatusTopic::new(8);
        let mut rx = topic.subscribe();
        let summary = ActiveZoneSummary {
            zone_id: ZoneId::new(),
            members: Default::default(),
            accounts: Default::default(),
            transactions: Default::default(),
            metadata: None,
            connected_client_keys: Default::default(),
        };
        topic.publish(summary.clone()).await;
        let received = rx.recv().await.unwrap();
        assert_eq!(received, summary);
    }
}
