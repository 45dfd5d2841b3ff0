//! Rule registry: the rule set applied to every entity

use crate::core::types::Severity;
use crate::entity::Entity;
use crate::regions::{Layer, ReferenceLayers};
use crate::rules::check::{Check, Contact};
use crate::rules::context::RuleContext;
use crate::rules::rule::{Rule, RuleSpec};
use crate::validation::report::EntityReport;
use std::sync::Arc;

/// Builder collecting rule specs; a later spec replaces an earlier one with
/// the same id
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    specs: Vec<RuleSpec>,
}

impl RuleRegistryBuilder {
    pub fn rule(mut self, spec: RuleSpec) -> Self {
        match self.specs.iter_mut().find(|s| s.id == spec.id) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        self
    }

    pub fn rules(self, specs: impl IntoIterator<Item = RuleSpec>) -> Self {
        specs.into_iter().fold(self, |builder, spec| builder.rule(spec))
    }

    pub fn build(self) -> RuleRegistry {
        RuleRegistry {
            specs: self.specs.into_iter().map(Arc::new).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    specs: Vec<Arc<RuleSpec>>,
}

impl RuleRegistry {
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    /// The venue's standard rule set
    pub fn standard() -> Self {
        Self::builder().rules(standard_specs()).build()
    }

    pub fn specs(&self) -> impl Iterator<Item = &RuleSpec> {
        self.specs.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Fresh rule instances, one per spec, with no evaluation state
    pub fn build_rules(&self) -> Vec<Rule> {
        self.specs.iter().cloned().map(Rule::new).collect()
    }

    /// Layers some rule reads that are not loaded
    pub fn missing_layers(&self, layers: &ReferenceLayers) -> Vec<Layer> {
        let mut missing: Vec<Layer> = Vec::new();
        for layer in self.specs.iter().filter_map(|s| s.check.layer()) {
            if layers.get(layer).is_none() && !missing.contains(&layer) {
                missing.push(layer);
            }
        }
        missing
    }

    /// Evaluate every rule for one entity
    pub fn evaluate(&self, entity: &Entity, ctx: &mut RuleContext<'_>) -> EntityReport {
        let mut rules = self.build_rules();
        for rule in &mut rules {
            rule.check_rule(entity, ctx);
        }
        EntityReport::from_rules(entity.id, &rules)
    }
}

fn standard_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(
            "missing-info",
            Severity::High,
            "Missing info!",
            "Name, contact info and number of people are required.",
            Check::MissingInfo,
        ),
        RuleSpec::new(
            "powerful",
            Severity::Low,
            "Powerful.",
            "The declared power need is unusually high. Make sure this isn't a typo.",
            Check::PowerAbove,
        ),
        RuleSpec::new(
            "power-undeclared",
            Severity::Low,
            "No power need?",
            "This area is marked as needing power but declares no power need.",
            Check::PowerUndeclared,
        ),
        RuleSpec::new(
            "too-many-people",
            Severity::High,
            "Too many people!",
            "The declared people and vehicles need more area than a whole fire cluster may cover.",
            Check::NeedAboveCluster,
        ),
        RuleSpec::new(
            "too-small",
            Severity::Low,
            "Too small.",
            "The area is smaller than the declared people, vehicles and extras need.",
            Check::AreaBelowNeed,
        ),
        RuleSpec::new(
            "too-big",
            Severity::Medium,
            "Too big.",
            "The area is much larger than the declared needs justify.",
            Check::AreaAboveReasonable,
        ),
        RuleSpec::new(
            "too-complex",
            Severity::Low,
            "Complex shape.",
            "The outline has many vertices. Simplify it to keep the map responsive.",
            Check::TooManyVertices,
        ),
        RuleSpec::new(
            "outside-border",
            Severity::High,
            "Outside border!",
            "The area must be fully inside the property border.",
            Check::Containment {
                layer: Layer::PropertyBorder,
                should_be_inside: true,
            },
        ),
        RuleSpec::new(
            "outside-neighborhood",
            Severity::Medium,
            "Outside neighborhoods.",
            "The area should be placed inside one of the neighborhoods.",
            Check::Containment {
                layer: Layer::Neighborhoods,
                should_be_inside: true,
            },
        ),
        RuleSpec::new(
            "fire-road",
            Severity::High,
            "On fire road!",
            "The area blocks a fire road. Emergency vehicles must be able to pass.",
            Check::Intersects {
                layer: Layer::FireRoads,
                contact: Contact::Any,
            },
        ),
        RuleSpec::new(
            "forbidden-zone",
            Severity::High,
            "Forbidden zone!",
            "The area is placed in a zone where building is not allowed.",
            Check::Intersects {
                layer: Layer::ForbiddenZones,
                contact: Contact::Any,
            },
        ),
        RuleSpec::new(
            "public-please",
            Severity::Medium,
            "Public area.",
            "This spot should stay open to everyone. Keep camps out of it.",
            Check::Intersects {
                layer: Layer::PublicPlease,
                contact: Contact::OverlapOrInside,
            },
        ),
        RuleSpec::new(
            "minor-road",
            Severity::Medium,
            "On minor road.",
            "The area overlaps a minor road that should stay passable.",
            Check::Intersects {
                layer: Layer::MinorRoads,
                contact: Contact::OverlapOrInside,
            },
        ),
        RuleSpec::new(
            "too-loud",
            Severity::Medium,
            "Too loud.",
            "The declared amplified sound is above what this location allows.",
            Check::SoundLimit {
                layer: Layer::SoundZones,
            },
        ),
        RuleSpec::new(
            "fire-cluster",
            Severity::High,
            "Fire cluster too big!",
            "Camps within the fire safety distance of each other cover too much area together.",
            Check::ClusterSize,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ids_unique() {
        let registry = RuleRegistry::standard();
        let mut ids: Vec<&str> = registry.specs().map(|s| s.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_builder_replaces_same_id() {
        let registry = RuleRegistry::builder()
            .rule(RuleSpec::new("a", Severity::Low, "A", "first", Check::MissingInfo))
            .rule(RuleSpec::new("b", Severity::Low, "B", "b", Check::PowerAbove))
            .rule(RuleSpec::new("a", Severity::High, "A", "second", Check::MissingInfo))
            .build();
        assert_eq!(registry.len(), 2);
        let first = registry.specs().next().unwrap();
        assert_eq!(first.message, "second");
        assert_eq!(first.severity, Severity::High);
    }

    #[test]
    fn test_fresh_rules_have_no_state() {
        let rules = RuleRegistry::standard().build_rules();
        assert!(rules.iter().all(|r| !r.triggered() && r.severity() == Severity::None));
    }

    #[test]
    fn test_missing_layers_reported() {
        let registry = RuleRegistry::standard();
        let layers = ReferenceLayers::new();
        let missing = registry.missing_layers(&layers);
        assert!(missing.contains(&Layer::PropertyBorder));
        assert!(missing.contains(&Layer::SoundZones));
    }
}
