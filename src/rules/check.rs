//! Predicate families a rule can be built from
//!
//! Each variant is a pure function of the entity, the reference layers and
//! the current cache state. Parameters (which layer, desired containment)
//! live in the variant, so rule sets can be declared in data.

use crate::core::error::Result;
use crate::entity::Entity;
use crate::regions::Layer;
use crate::rules::context::RuleContext;
use crate::rules::regions;
use crate::rules::rule::Outcome;
use serde::{Deserialize, Serialize};

/// Which spatial relations count as contact for intersection rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Contact {
    /// Partial overlap only
    Overlap,
    /// Partial overlap, or the entity lies inside the feature
    OverlapOrInside,
    /// Any shared area, including the feature lying inside the entity
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Check {
    /// Name, contact or people count not filled in
    MissingInfo,
    /// Declared power need above the configured maximum
    PowerAbove,
    /// Flagged as needing power but declares none
    PowerUndeclared,
    /// Area smaller than the people/vehicle/extra-derived need
    AreaBelowNeed,
    /// Area larger than the reasonable upper bound of the need
    AreaAboveReasonable,
    /// Need alone exceeds the maximum cluster size
    NeedAboveCluster,
    /// Outline has more vertices than configured
    TooManyVertices,
    /// Entity must (or must not) be contained by a feature of the layer
    Containment { layer: Layer, should_be_inside: bool },
    /// Entity must not touch any polygon of the layer
    Intersects { layer: Layer, contact: Contact },
    /// Declared amplified sound against zone and spot ceilings
    SoundLimit { layer: Layer },
    /// Fire-buffer cluster larger than allowed
    ClusterSize,
}

impl Check {
    /// Reference layer the check reads, if any
    pub fn layer(&self) -> Option<Layer> {
        match self {
            Check::Containment { layer, .. }
            | Check::Intersects { layer, .. }
            | Check::SoundLimit { layer } => Some(*layer),
            _ => None,
        }
    }

    pub fn evaluate(&self, entity: &Entity, ctx: &mut RuleContext<'_>) -> Result<Outcome> {
        match self {
            Check::MissingInfo => Ok(missing_info(entity)),
            Check::PowerAbove => Ok(power_above(entity, ctx)),
            Check::PowerUndeclared => Ok(power_undeclared(entity)),
            Check::AreaBelowNeed => Ok(area_below_need(entity, ctx)),
            Check::AreaAboveReasonable => Ok(area_above_reasonable(entity, ctx)),
            Check::NeedAboveCluster => Ok(need_above_cluster(entity, ctx)),
            Check::TooManyVertices => Ok(too_many_vertices(entity, ctx)),
            Check::Containment {
                layer,
                should_be_inside,
            } => regions::containment(entity, *layer, *should_be_inside, ctx),
            Check::Intersects { layer, contact } => {
                regions::intersects(entity, *layer, *contact, ctx)
            }
            Check::SoundLimit { layer } => regions::sound_limit(entity, *layer, ctx),
            Check::ClusterSize => Ok(cluster_size(entity, ctx)),
        }
    }
}

fn calculated_need(entity: &Entity, ctx: &RuleContext<'_>) -> f64 {
    let props = &entity.properties;
    ctx.config.calculated_need(
        props.people.unwrap_or(0),
        props.vehicles.unwrap_or(0),
        props.additional_area.unwrap_or(0.0),
    )
}

fn area(entity: &Entity, ctx: &mut RuleContext<'_>) -> Option<f64> {
    if entity.is_degenerate() {
        tracing::debug!("Entity {} has degenerate geometry, skipping area check", entity.id);
        return None;
    }
    let aggregator = ctx.aggregator();
    ctx.cache.refresh(entity);
    Some(aggregator.area(entity, ctx.cache))
}

fn missing_info(entity: &Entity) -> Outcome {
    let props = &entity.properties;
    let mut missing = Vec::new();
    if props.name.trim().is_empty() {
        missing.push("name");
    }
    if props.contact_info.trim().is_empty() {
        missing.push("contact info");
    }
    if props.people.is_none() {
        missing.push("number of people");
    }

    if missing.is_empty() {
        Outcome::pass()
    } else {
        Outcome::trigger().with_message(format!("Missing {}.", missing.join(", ")))
    }
}

fn power_above(entity: &Entity, ctx: &RuleContext<'_>) -> Outcome {
    match entity.properties.power_need {
        Some(power) if power > ctx.config.max_power_watts => Outcome::trigger().with_message(
            format!(
                "Declared power need of {:.0} W is above {:.0} W. Make sure this isn't a typo.",
                power, ctx.config.max_power_watts
            ),
        ),
        _ => Outcome::pass(),
    }
}

fn power_undeclared(entity: &Entity) -> Outcome {
    let declared = entity.properties.power_need.unwrap_or(0.0);
    Outcome::when(entity.properties.needs_power && declared <= 0.0)
}

fn area_below_need(entity: &Entity, ctx: &mut RuleContext<'_>) -> Outcome {
    let need = calculated_need(entity, ctx);
    if need <= 0.0 {
        return Outcome::pass();
    }
    match area(entity, ctx) {
        Some(area) if area < need => Outcome::trigger().with_message(format!(
            "The area is {:.0} m², but the declared people, vehicles and extras need {:.0} m².",
            area, need
        )),
        _ => Outcome::pass(),
    }
}

fn area_above_reasonable(entity: &Entity, ctx: &mut RuleContext<'_>) -> Outcome {
    let need = calculated_need(entity, ctx);
    if need <= 0.0 {
        return Outcome::pass();
    }
    let allowed = ctx.config.max_reasonable_area(need);
    match area(entity, ctx) {
        Some(area) if area > allowed => Outcome::trigger().with_message(format!(
            "The area is {:.0} m², {:.0} m² more than the {:.0} m² reasonable for a need of {:.0} m².",
            area,
            area - allowed,
            allowed,
            need
        )),
        _ => Outcome::pass(),
    }
}

fn need_above_cluster(entity: &Entity, ctx: &RuleContext<'_>) -> Outcome {
    let need = calculated_need(entity, ctx);
    let max = ctx.config.max_cluster_area_sqm;
    if need > max {
        Outcome::trigger().with_message(format!(
            "Declared people and vehicles need {:.0} m², more than the {:.0} m² a whole fire cluster may cover.",
            need, max
        ))
    } else {
        Outcome::pass()
    }
}

fn too_many_vertices(entity: &Entity, ctx: &RuleContext<'_>) -> Outcome {
    let count = entity.vertex_count();
    if count > ctx.config.max_vertices {
        Outcome::trigger().with_message(format!(
            "The outline has {} vertices (more than {}). Simplify it.",
            count, ctx.config.max_vertices
        ))
    } else {
        Outcome::pass()
    }
}

fn cluster_size(entity: &Entity, ctx: &mut RuleContext<'_>) -> Outcome {
    if entity.is_degenerate() {
        tracing::debug!("Entity {} has degenerate geometry, skipping cluster check", entity.id);
        return Outcome::pass();
    }
    let aggregator = ctx.aggregator();
    let cluster = aggregator.cluster(entity, ctx.entities, ctx.cache);
    let max = ctx.config.max_cluster_area_sqm;

    if cluster.total_area > max {
        Outcome::trigger().with_message(format!(
            "This camp and {} neighbour(s) within {} m of each other cover {:.0} m², {:.0} m² over the {:.0} m² limit. Move apart or shrink.",
            cluster.len() - 1,
            ctx.config.fire_buffer_m,
            cluster.total_area,
            cluster.total_area - max,
            max
        ))
    } else {
        Outcome::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PlacementConfig;
    use crate::core::types::EntityId;
    use crate::entity::{EntityProperties, EntitySet};
    use crate::geometry::{GeoAdapter, GeometryAdapter, LocalProjection};
    use crate::regions::ReferenceLayers;
    use crate::spatial::SpatialCache;

    struct Fixture {
        adapter: GeoAdapter,
        config: PlacementConfig,
        layers: ReferenceLayers,
        entities: EntitySet,
        cache: SpatialCache,
    }

    impl Fixture {
        fn new() -> Self {
            let config = PlacementConfig::default();
            Self {
                adapter: GeoAdapter::new(
                    LocalProjection::new(config.venue_latitude, config.venue_longitude),
                    config.buffer_segments,
                ),
                config,
                layers: ReferenceLayers::new(),
                entities: EntitySet::new(),
                cache: SpatialCache::new(),
            }
        }

        fn entity(&self, side: f64, props: EntityProperties) -> Entity {
            let poly = self.adapter.projection().polygon_from_meters(&[
                (0.0, 0.0),
                (side, 0.0),
                (side, side),
                (0.0, side),
            ]);
            Entity::new(EntityId::new(), poly, props)
        }

        fn eval(&mut self, check: Check, entity: &Entity) -> Outcome {
            let mut ctx = RuleContext::new(
                &self.adapter,
                &self.config,
                &self.layers,
                &self.entities,
                &mut self.cache,
            );
            check.evaluate(entity, &mut ctx).unwrap()
        }
    }

    fn complete_props() -> EntityProperties {
        EntityProperties {
            name: "Camp".into(),
            contact_info: "camp@example.org".into(),
            people: Some(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_info_lists_fields() {
        let mut fx = Fixture::new();
        let e = fx.entity(10.0, EntityProperties::default());
        let outcome = fx.eval(Check::MissingInfo, &e);
        assert!(outcome.triggered);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Missing name, contact info, number of people.")
        );

        let e = fx.entity(10.0, complete_props());
        assert!(!fx.eval(Check::MissingInfo, &e).triggered);
    }

    #[test]
    fn test_power_threshold() {
        let mut fx = Fixture::new();
        let loud = fx.entity(10.0, EntityProperties {
            power_need: Some(9000.0),
            ..Default::default()
        });
        let modest = fx.entity(10.0, EntityProperties {
            power_need: Some(7000.0),
            ..Default::default()
        });
        assert!(fx.eval(Check::PowerAbove, &loud).triggered);
        assert!(!fx.eval(Check::PowerAbove, &modest).triggered);
    }

    #[test]
    fn test_power_undeclared() {
        let mut fx = Fixture::new();
        let e = fx.entity(10.0, EntityProperties {
            needs_power: true,
            ..Default::default()
        });
        assert!(fx.eval(Check::PowerUndeclared, &e).triggered);
        let e = fx.entity(10.0, EntityProperties {
            needs_power: true,
            power_need: Some(500.0),
            ..Default::default()
        });
        assert!(!fx.eval(Check::PowerUndeclared, &e).triggered);
    }

    #[test]
    fn test_area_against_need() {
        let mut fx = Fixture::new();
        // 10 people need 100 m²
        let small = fx.entity(9.0, complete_props());
        let fitting = fx.entity(11.0, complete_props());
        let huge = fx.entity(20.0, complete_props());

        assert!(fx.eval(Check::AreaBelowNeed, &small).triggered);
        assert!(!fx.eval(Check::AreaBelowNeed, &fitting).triggered);
        assert!(!fx.eval(Check::AreaAboveReasonable, &fitting).triggered);
        assert!(fx.eval(Check::AreaAboveReasonable, &huge).triggered);
    }

    #[test]
    fn test_no_need_declared_skips_area_checks() {
        let mut fx = Fixture::new();
        let e = fx.entity(50.0, EntityProperties::default());
        assert!(!fx.eval(Check::AreaBelowNeed, &e).triggered);
        assert!(!fx.eval(Check::AreaAboveReasonable, &e).triggered);
    }

    #[test]
    fn test_need_above_cluster_is_numeric_only() {
        let mut fx = Fixture::new();
        let e = fx.entity(1.0, EntityProperties {
            people: Some(200),
            ..Default::default()
        });
        let outcome = fx.eval(Check::NeedAboveCluster, &e);
        assert!(outcome.triggered);
        assert!(outcome.message.unwrap().contains("2000"));
    }

    #[test]
    fn test_vertex_count() {
        let mut fx = Fixture::new();
        fx.config.max_vertices = 3;
        let e = fx.entity(10.0, EntityProperties::default());
        assert!(fx.eval(Check::TooManyVertices, &e).triggered);
        fx.config.max_vertices = 4;
        assert!(!fx.eval(Check::TooManyVertices, &e).triggered);
    }

    #[test]
    fn test_layer_of_check() {
        let check = Check::SoundLimit {
            layer: Layer::SoundZones,
        };
        assert_eq!(check.layer(), Some(Layer::SoundZones));
        assert_eq!(Check::ClusterSize.layer(), None);
    }
}
