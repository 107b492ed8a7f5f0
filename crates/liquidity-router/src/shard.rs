//! Shard id computation (§5 "Sharding Router": `hash(zone_id) mod
//! MAX_NUMBER_OF_SHARDS`).
//!
//! In a single-process rendering there is no second node to route to, so a
//! zone's shard id never changes which task owns it - every zone is owned
//! by this process regardless of its shard. The id is still computed and
//! carried on [`crate::monitor::ZoneSummary`] purely as the observability
//! label a cluster deployment would key its per-shard dashboards on.

use liquidity_types::{ZoneId, MAX_NUMBER_OF_SHARDS};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn shard_id(zone_id: &ZoneId) -> u32 {
    let mut hasher = DefaultHasher::new();
    zone_id.hash(&mut hasher);
    (hasher.finish() % MAX_NUMBER_OF_SHARDS as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_id_is_stable_for_the_same_zone() {
        let zone_id = ZoneId::new();
        assert_eq!(shard_id(&zone_id), shard_id(&zone_id));
    }

    #[test]
    fn shard_id_is_within_range() {
        for _ in 0..100 {
            assert!(shard_id(&ZoneId::new()) < MAX_NUMBER_OF_SHARDS as u32);
        }
    }
}
