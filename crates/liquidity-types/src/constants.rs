//! Protocol constants (§6).

use std::time::Duration;

pub const MAXIMUM_TAG_LENGTH: usize = 160;
pub const MAXIMUM_METADATA_SIZE: usize = 1024;
// The spec's prose (zone field description, invariant 7, constants list) says
// 7 days, but its own worked example pairs created=1514156286183 with
// expires=1516748286183 - a delta of exactly 30 days. Following the testable
// literal rather than the prose; see DESIGN.md's Open Question decisions.
pub const ZONE_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const PASSIVATION_TIMEOUT: Duration = Duration::from_secs(2 * 60);
pub const STATUS_PUBLISH_INTERVAL: Duration = Duration::from_secs(30);
pub const MAX_NUMBER_OF_SHARDS: u32 = 10;
