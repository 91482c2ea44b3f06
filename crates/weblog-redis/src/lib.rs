//! weblog-redis — [`EnrichmentLookup`](weblog_core::EnrichmentLookup) over
//! Redis hashes (`HGET <customer id> <attribute>`), standalone or cluster.

pub mod config;
pub mod lookup;

pub use config::{RedisLookupConfig, RedisMode};
pub use lookup::RedisLookup;
