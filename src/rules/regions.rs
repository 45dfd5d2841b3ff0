//! Checks against reference region collections

use crate::core::error::{PlacementError, Result};
use crate::entity::Entity;
use crate::geometry::GeometryKind;
use crate::regions::{Layer, RegionFeature, RegionGeometry};
use crate::rules::check::Contact;
use crate::rules::context::RuleContext;
use crate::rules::rule::Outcome;

fn log_kind_mismatch(entity: &Entity, layer: Layer, feature: &RegionFeature) {
    let err = PlacementError::UnsupportedGeometryKind {
        expected: GeometryKind::Polygon,
        found: feature.geometry.kind(),
    };
    tracing::warn!(
        entity = %entity.id,
        layer = %layer,
        feature = feature.label(),
        "Skipping feature: {}",
        err
    );
}

fn skip_degenerate(entity: &Entity, layer: Layer) -> bool {
    if entity.is_degenerate() {
        tracing::debug!(
            "Entity {} has degenerate geometry, skipping {} check",
            entity.id,
            layer
        );
        return true;
    }
    false
}

/// Triggers when the entity's containment in `layer` differs from the
/// desired state. Inside means fully contained by at least one polygon.
pub fn containment(
    entity: &Entity,
    layer: Layer,
    should_be_inside: bool,
    ctx: &mut RuleContext<'_>,
) -> Result<Outcome> {
    let features = ctx.layers.require(layer)?;
    if skip_degenerate(entity, layer) {
        return Ok(Outcome::pass());
    }

    let mut inside = false;
    for feature in features {
        let polygon = match feature.geometry.as_polygon() {
            Ok(polygon) => polygon,
            Err(_) => {
                log_kind_mismatch(entity, layer, feature);
                continue;
            }
        };
        if ctx.adapter.contains(polygon, entity.geometry()) {
            inside = true;
            break;
        }
    }

    Ok(Outcome::when(inside != should_be_inside))
}

/// Triggers when the entity touches any polygon of `layer` in the way
/// `contact` describes. Features of another kind are logged and skipped.
pub fn intersects(
    entity: &Entity,
    layer: Layer,
    contact: Contact,
    ctx: &mut RuleContext<'_>,
) -> Result<Outcome> {
    let features = ctx.layers.require(layer)?;
    if skip_degenerate(entity, layer) {
        return Ok(Outcome::pass());
    }
    let shape = entity.geometry();

    for feature in features {
        let RegionGeometry::Polygon(polygon) = &feature.geometry else {
            log_kind_mismatch(entity, layer, feature);
            continue;
        };

        let hit = ctx.adapter.overlaps(polygon, shape)
            || match contact {
                Contact::Overlap => false,
                Contact::OverlapOrInside => ctx.adapter.contains(polygon, shape),
                Contact::Any => {
                    ctx.adapter.contains(polygon, shape) || ctx.adapter.contains(shape, polygon)
                }
            };

        if hit {
            return Ok(Outcome::trigger());
        }
    }

    Ok(Outcome::pass())
}

fn tighter<'f>(
    current: Option<(f64, &'f str)>,
    limit: f64,
    label: &'f str,
) -> Option<(f64, &'f str)> {
    match current {
        Some((existing, _)) if existing <= limit => current,
        _ => Some((limit, label)),
    }
}

/// Compares declared amplified sound with the ceiling that applies.
///
/// Sound spots (point features) apply when the entity lies within their
/// radius and take precedence over zones. Zones apply when they share any
/// area with the entity. With several candidates the lowest ceiling wins.
pub fn sound_limit(entity: &Entity, layer: Layer, ctx: &mut RuleContext<'_>) -> Result<Outcome> {
    let features = ctx.layers.require(layer)?;
    let declared = entity.properties.amplified_sound.unwrap_or(0.0);
    if declared <= 0.0 || skip_degenerate(entity, layer) {
        return Ok(Outcome::pass());
    }
    let shape = entity.geometry();

    let mut spot: Option<(f64, &str)> = None;
    let mut zone: Option<(f64, &str)> = None;

    for feature in features {
        let Some(limit) = feature.properties.sound_limit else {
            tracing::debug!("Sound feature {} has no limit, ignoring", feature.label());
            continue;
        };

        match &feature.geometry {
            RegionGeometry::Point(point) => {
                let radius = feature.properties.radius.unwrap_or(0.0);
                if ctx.adapter.point_distance(shape, point) <= radius {
                    spot = tighter(spot, limit, feature.label());
                }
            }
            RegionGeometry::Polygon(polygon) => {
                let touches = ctx.adapter.overlaps(polygon, shape)
                    || ctx.adapter.contains(polygon, shape)
                    || ctx.adapter.contains(shape, polygon);
                if touches {
                    zone = tighter(zone, limit, feature.label());
                }
            }
            RegionGeometry::LineString(_) => log_kind_mismatch(entity, layer, feature),
        }
    }

    match spot.or(zone) {
        Some((limit, label)) if declared > limit => Ok(Outcome::trigger().with_message(format!(
            "Declared amplified sound of {:.0} W exceeds the {:.0} W allowed at {}.",
            declared, limit, label
        ))),
        _ => Ok(Outcome::pass()),
    }
}
