use crate::core::config::PlacementConfig;
use crate::entity::EntitySet;
use crate::geometry::GeometryAdapter;
use crate::regions::ReferenceLayers;
use crate::spatial::{ClusterAggregator, SpatialCache};

/// Everything a rule may consult while evaluating one entity.
///
/// The cache is the only mutable part; it is shared by every rule in a
/// pass so rules relying on cluster aggregation reuse each other's work.
pub struct RuleContext<'a> {
    pub adapter: &'a dyn GeometryAdapter,
    pub config: &'a PlacementConfig,
    pub layers: &'a ReferenceLayers,
    pub entities: &'a EntitySet,
    pub cache: &'a mut SpatialCache,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        adapter: &'a dyn GeometryAdapter,
        config: &'a PlacementConfig,
        layers: &'a ReferenceLayers,
        entities: &'a EntitySet,
        cache: &'a mut SpatialCache,
    ) -> Self {
        Self {
            adapter,
            config,
            layers,
            entities,
            cache,
        }
    }

    pub fn aggregator(&self) -> ClusterAggregator<'a> {
        ClusterAggregator::new(self.adapter, self.config)
    }
}
