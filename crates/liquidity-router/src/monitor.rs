//! The Zone Monitor (§5 "Shared resources"): aggregates the `zone-status`
//! topic into a queryable per-zone view, standing in for the cluster-wide
//! dashboard a multi-node deployment would build on the same topic.

use crate::shard::shard_id;
use dashmap::DashMap;
use liquidity_types::ZoneId;
use liquidity_zone::status::{ActiveZoneSummary, BroadcastStatusTopic};
use serde::Serialize;
use std::sync::Arc;

/// The most recently published summary for one zone, labelled with the
/// shard it would be routed to in a multi-node deployment.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummary {
    pub shard_id: u32,
    pub summary: ActiveZoneSummary,
}

/// Subscribes to a [`BroadcastStatusTopic`] and keeps the latest summary for
/// every zone that has published to it.
pub struct ZoneMonitor {
    summaries: Arc<DashMap<ZoneId, ZoneSummary>>,
}

impl ZoneMonitor {
    /// Spawn a task that drains `topic` for as long as this monitor (or any
    /// clone of it) is alive.
    pub fn spawn(topic: &BroadcastStatusTopic) -> Self {
        let summaries: Arc<DashMap<ZoneId, ZoneSummary>> = Arc::new(DashMap::new());
        let mut rx = topic.subscribe();
        let store = summaries.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(summary) => {
                        let zone_id = summary.zone_id.clone();
                        store.insert(
                            zone_id.clone(),
                            ZoneSummary {
                                shard_id: shard_id(&zone_id),
                                summary,
                            },
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "zone monitor dropped status updates");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { summaries }
    }

    pub fn get(&self, zone_id: &ZoneId) -> Option<ZoneSummary> {
        self.summaries.get(zone_id).map(|entry| entry.clone())
    }

    pub fn active_zones(&self) -> Vec<ZoneSummary> {
        self.summaries.iter().map(|entry| entry.clone()).collect()
    }

    pub fn active_zone_count(&self) -> usize {
        self.summaries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_zone::status::StatusTopic;

    #[tokio::test]
    async fn aggregates_published_summaries() {
        let topic = BroadcastStatusTopic::new(8);
        let monitor = ZoneMonitor::spawn(&topic);
        let zone_id = ZoneId::new();
        topic
            .publish(ActiveZoneSummary {
                zone_id: zone_id.clone(),
                members: Default::default(),
                accounts: Default::default(),
                transactions: Default::default(),
                metadata: None,
                connected_client_keys: Default::default(),
            })
            .await;
        // Give the monitor's task a turn to drain the channel.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let found = monitor.get(&zone_id).expect("summary should be recorded");
        assert_eq!(found.summary.zone_id, zone_id);
    }
}
