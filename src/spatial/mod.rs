//! Spatial memoization and fire-safety cluster aggregation

pub mod cache;
pub mod cluster;

pub use cache::{CacheStats, SpatialCache};
pub use cluster::{Cluster, ClusterAggregator};
