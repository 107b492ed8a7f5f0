//! The Sharding Router and Zone Monitor collaborators (§5): look up or spawn
//! the validator task that owns a zone, and aggregate the cluster-wide
//! status topic into a queryable view.

pub mod monitor;
pub mod router;
pub mod shard;

pub use monitor::{ZoneMonitor, ZoneSummary};
pub use router::ShardedZoneRouter;
pub use shard::shard_id;
