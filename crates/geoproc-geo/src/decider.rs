//! Projection decision chain.
//!
//! Picks a working CRS for an operation from the extent of its input. Rules are
//! evaluated in a fixed order and the first one that selects a CRS wins; every rule
//! that was considered leaves an entry in the decision trace.

use crate::catalog::{polar_crs, utm_crs, Continent};
use crate::metrics::{compute_bbox_metrics_with, compute_utm_zone};
use crate::wkt::{fitted_projection, ProjectionFamily, ProjectionWkt};
use geoproc_core::config::DecisionThresholds;
use geoproc_core::models::{
    BBoxMetrics, BoundingBox, Crs, DecisionInputs, DecisionRule, DecisionStep, OperationType,
    ProjectionDecision, ProjectionProperty, PropertySource,
};
use tracing::{debug, info};

const WEB_MERCATOR_ERROR: &str =
    "areas and distances inflate with latitude (x4 at 60°); suitable for display only";
const UTM_ERROR: &str = "scale error below 0.1% within the zone";
const CONFORMAL_CONIC_ERROR: &str =
    "angles exact; scale error around 1% between the standard parallels, growing outside";
const EQUAL_AREA_CONIC_ERROR: &str =
    "areas exact; shape distortion around 1% between the standard parallels, growing outside";
const CYLINDRICAL_ERROR: &str = "exact along the equator; distortion grows with latitude";
const POLAR_EQUAL_AREA_ERROR: &str = "areas exact; shape distortion grows away from the pole";
const POLAR_CONFORMAL_ERROR: &str = "angles exact; scale error grows away from the pole";

/// Decides working projections using a fixed set of thresholds
#[derive(Debug, Clone, Default)]
pub struct ProjectionDecider {
    thresholds: DecisionThresholds,
}

/// Decide with the default thresholds
pub fn decide_projection(
    bbox: &BoundingBox,
    operation: OperationType,
    projection_priority: Option<ProjectionProperty>,
) -> ProjectionDecision {
    ProjectionDecider::default().decide(bbox, operation, projection_priority)
}

/// Accumulates the trace and inputs while the chain runs
struct Trace {
    steps: Vec<DecisionStep>,
    inputs: DecisionInputs,
}

impl Trace {
    fn fired(&mut self, rule: DecisionRule, detail: impl Into<String>) {
        let step = DecisionStep::fired(rule, detail);
        debug!(rule = rule.as_str(), detail = %step.detail, "Decision rule fired");
        self.steps.push(step);
    }

    fn skipped(&mut self, rule: DecisionRule, detail: impl Into<String>) {
        self.steps.push(DecisionStep::skipped(rule, detail));
    }

    fn finish(
        self,
        crs: Crs,
        projection_property: ProjectionProperty,
        selection_reason: impl Into<String>,
        expected_error: &str,
    ) -> ProjectionDecision {
        let decision = ProjectionDecision {
            crs_name: crs.name.clone(),
            crs,
            projection_property,
            selection_reason: selection_reason.into(),
            expected_error: expected_error.to_string(),
            decision_path: self.steps,
            decision_inputs: self.inputs,
        };
        info!(
            operation = %decision.decision_inputs.operation_type,
            crs = %decision.crs,
            reason = %decision.selection_reason,
            "Projection selected"
        );
        decision
    }

    fn finish_generated(
        self,
        projection: ProjectionWkt,
        requested: ProjectionProperty,
        selection_reason: impl Into<String>,
    ) -> ProjectionDecision {
        let property = projection.family.property().unwrap_or(requested);
        let expected_error = match projection.family {
            ProjectionFamily::LambertConformalConic => CONFORMAL_CONIC_ERROR,
            ProjectionFamily::AlbersEqualArea => EQUAL_AREA_CONIC_ERROR,
            ProjectionFamily::LambertAzimuthalEqualArea => POLAR_EQUAL_AREA_ERROR,
            ProjectionFamily::PolarStereographic => POLAR_CONFORMAL_ERROR,
            _ => CYLINDRICAL_ERROR,
        };
        self.finish(projection.to_crs(), property, selection_reason, expected_error)
    }

    fn web_mercator(
        self,
        property: ProjectionProperty,
        selection_reason: impl Into<String>,
    ) -> ProjectionDecision {
        self.finish(Crs::web_mercator(), property, selection_reason, WEB_MERCATOR_ERROR)
    }
}

impl ProjectionDecider {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Choose a working CRS for `operation` over `bbox`.
    ///
    /// Never fails: an invalid box yields Web Mercator with the validation failure as
    /// the selection reason.
    pub fn decide(
        &self,
        bbox: &BoundingBox,
        operation: OperationType,
        projection_priority: Option<ProjectionProperty>,
    ) -> ProjectionDecision {
        let t = &self.thresholds;
        let (mut property, mut property_source) = match projection_priority {
            Some(priority) => (priority, PropertySource::CallerPriority),
            None => (operation.default_property(), PropertySource::OperationDefault),
        };

        let mut trace = Trace {
            steps: Vec::new(),
            inputs: DecisionInputs {
                bbox: *bbox,
                centroid: None,
                operation_type: operation,
                required_property: property,
                property_source,
                metrics: None,
                utm_zone: None,
                continent: None,
            },
        };

        // 1. validation
        if let Err(reason) = bbox.validate() {
            trace.fired(DecisionRule::ValidateBbox, format!("invalid bbox: {}", reason));
            return trace.web_mercator(property, format!("invalid bbox: {}", reason));
        }
        trace.skipped(DecisionRule::ValidateBbox, "bbox valid");

        let m = compute_bbox_metrics_with(bbox, t.polar_lat);
        trace.inputs.metrics = Some(m);
        trace.inputs.centroid = Some([m.center_lon, m.center_lat]);

        // 2. required property
        let default_property = operation.default_property();
        if property_source == PropertySource::CallerPriority && property != default_property {
            trace.fired(
                DecisionRule::RequiredProperty,
                format!(
                    "caller priority {} overrides {} default {}",
                    property, operation, default_property
                ),
            );
        } else {
            trace.skipped(
                DecisionRule::RequiredProperty,
                format!("{} requires {}", operation, property),
            );
        }

        // 3. global extent
        if m.lon_extent >= t.global_lon_span || m.lat_extent >= t.global_lat_span {
            let detail = format!(
                "too large / global extent ({:.1}° x {:.1}°)",
                m.lon_extent, m.lat_extent
            );
            trace.fired(DecisionRule::GlobalExtent, detail.clone());
            return trace.web_mercator(property, detail);
        }
        trace.skipped(DecisionRule::GlobalExtent, "extent below global thresholds");

        // 4. antimeridian
        if m.crosses_antimeridian {
            if m.is_polar {
                trace.skipped(
                    DecisionRule::Antimeridian,
                    "crosses the antimeridian near a pole; deferring to the polar rule",
                );
            } else {
                trace.fired(
                    DecisionRule::Antimeridian,
                    format!("crosses the antimeridian; centring on {:.2}°", m.center_lon),
                );
                let projection = fitted_projection(bbox, property, "Pacific");
                return trace.finish_generated(
                    projection,
                    property,
                    "Extent crosses the antimeridian",
                );
            }
        } else {
            trace.skipped(DecisionRule::Antimeridian, "does not cross the antimeridian");
        }

        // 5. polar
        if m.is_polar {
            let north = m.center_lat > 0.0;
            let crs = polar_crs(north, property, t.prefer_standard_codes);
            trace.fired(
                DecisionRule::Polar,
                format!("center latitude {:.2}° beyond ±{}°", m.center_lat, t.polar_lat),
            );
            let expected_error = match property {
                ProjectionProperty::EqualArea => POLAR_EQUAL_AREA_ERROR,
                ProjectionProperty::Conformal => POLAR_CONFORMAL_ERROR,
            };
            let hemisphere = if north { "Arctic" } else { "Antarctic" };
            return trace.finish(
                crs,
                property,
                format!("{} polar region", hemisphere),
                expected_error,
            );
        }
        trace.skipped(DecisionRule::Polar, "not a polar extent");

        // 6. local, single UTM zone, not east-west dominant
        let is_local = m.lon_extent < t.local_extent_deg && m.lat_extent < t.local_extent_deg;
        let ew_dominant = m.orientation_ratio >= t.ew_ratio;
        if is_local && m.utm_zone_span == 1 && !ew_dominant {
            let zone = compute_utm_zone(m.center_lon);
            let north = m.center_lat >= 0.0;
            let crs = utm_crs(zone, north);
            trace.inputs.utm_zone = Some(zone);
            trace.fired(DecisionRule::LocalUtm, crs.name.clone());
            return trace.finish(
                crs,
                property,
                "Local extent within a single UTM zone",
                UTM_ERROR,
            );
        } else if is_local && m.utm_zone_span > 1 {
            trace.skipped(
                DecisionRule::LocalUtm,
                format!("local extent spans {} UTM zones; avoid zone seam", m.utm_zone_span),
            );
        } else if is_local {
            trace.skipped(
                DecisionRule::LocalUtm,
                format!(
                    "local extent is east-west dominant (ratio {:.2} >= {})",
                    m.orientation_ratio, t.ew_ratio
                ),
            );
        } else {
            trace.skipped(
                DecisionRule::LocalUtm,
                format!(
                    "not local ({:.2}° x {:.2}°, threshold {}°)",
                    m.lon_extent, m.lat_extent, t.local_extent_deg
                ),
            );
        }

        // 7. east-west dominant
        if ew_dominant {
            if property == ProjectionProperty::EqualArea
                && property_source == PropertySource::OperationDefault
                && !operation.measures_area()
            {
                property = ProjectionProperty::Conformal;
                property_source = PropertySource::RuleOverride;
                trace.inputs.required_property = property;
                trace.inputs.property_source = property_source;
                info!(
                    operation = %operation,
                    "East-west dominant extent: overriding default equal-area requirement with conformal"
                );
            }
            trace.fired(
                DecisionRule::EwDominant,
                format!(
                    "orientation ratio {:.2} >= {}; {} ({})",
                    m.orientation_ratio,
                    t.ew_ratio,
                    property,
                    match property_source {
                        PropertySource::RuleOverride => "overridden from equal_area",
                        PropertySource::CallerPriority => "caller priority",
                        PropertySource::OperationDefault => "operation default",
                    }
                ),
            );
            let projection = fitted_projection(bbox, property, "Custom");
            return trace.finish_generated(projection, property, "East-west dominant extent");
        }
        trace.skipped(
            DecisionRule::EwDominant,
            format!("orientation ratio {:.2} below {}", m.orientation_ratio, t.ew_ratio),
        );

        // 8. large area
        if m.area_km2 > t.large_area_km2 {
            let large_property = match property_source {
                PropertySource::CallerPriority => property,
                _ => ProjectionProperty::EqualArea,
            };
            trace.fired(
                DecisionRule::LargeArea,
                format!("area ~{:.0} km² above {:.0} km²", m.area_km2, t.large_area_km2),
            );
            let projection = fitted_projection(bbox, large_property, "Custom");
            return trace.finish_generated(projection, large_property, "Non-local extent");
        }
        trace.skipped(
            DecisionRule::LargeArea,
            format!("area ~{:.0} km² within {:.0} km²", m.area_km2, t.large_area_km2),
        );

        // 9. continent
        if let Some(continent) = Continent::classify(m.center_lon, m.center_lat) {
            trace.inputs.continent = Some(continent.name().to_string());
            trace.fired(DecisionRule::Continent, format!("center falls in {}", continent));
            let projection = continent.projection(property);
            return trace.finish_generated(
                projection,
                property,
                format!("Regional projection for {}", continent),
            );
        }
        trace.skipped(DecisionRule::Continent, "center outside every continent band");

        // 10. fallback
        trace.fired(DecisionRule::Fallback, "no rule matched");
        trace.web_mercator(property, "fallback")
    }
}

/// Metrics are exposed for callers that need them before deciding (buffer selection)
pub fn metrics_for(thresholds: &DecisionThresholds, bbox: &BoundingBox) -> Option<BBoxMetrics> {
    bbox.validate().ok().map(|_| compute_bbox_metrics_with(bbox, thresholds.polar_lat))
}
