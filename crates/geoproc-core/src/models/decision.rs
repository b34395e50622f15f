//! Projection decision records.
//!
//! A decision carries the chosen CRS together with an ordered trace of every rule the
//! decider considered. The trace is part of the result, not a debugging aid: it is what
//! operators read to understand a choice and what tests assert on.

use super::bbox::{BBoxMetrics, BoundingBox};
use super::crs::Crs;
use super::operation::{OperationType, ProjectionProperty};
use serde::{Deserialize, Serialize};

/// Rules of the projection decision chain, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    ValidateBbox,
    RequiredProperty,
    GlobalExtent,
    Antimeridian,
    Polar,
    LocalUtm,
    EwDominant,
    LargeArea,
    Continent,
    Fallback,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionRule::ValidateBbox => "validate_bbox",
            DecisionRule::RequiredProperty => "required_property",
            DecisionRule::GlobalExtent => "global_extent",
            DecisionRule::Antimeridian => "antimeridian",
            DecisionRule::Polar => "polar",
            DecisionRule::LocalUtm => "local_utm",
            DecisionRule::EwDominant => "ew_dominant",
            DecisionRule::LargeArea => "large_area",
            DecisionRule::Continent => "continent",
            DecisionRule::Fallback => "fallback",
        }
    }
}

/// One entry of the decision trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStep {
    pub rule: DecisionRule,
    /// Whether the rule changed the outcome (selected a CRS or overrode the property)
    pub fired: bool,
    pub detail: String,
}

impl DecisionStep {
    pub fn fired(rule: DecisionRule, detail: impl Into<String>) -> Self {
        Self { rule, fired: true, detail: detail.into() }
    }

    pub fn skipped(rule: DecisionRule, detail: impl Into<String>) -> Self {
        Self { rule, fired: false, detail: detail.into() }
    }

    /// Human readable form, e.g. `[local_utm] fired: UTM zone 33N`
    pub fn line(&self) -> String {
        let status = if self.fired { "fired" } else { "skipped" };
        format!("[{}] {}: {}", self.rule.as_str(), status, self.detail)
    }
}

/// Where the required projection property came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySource {
    OperationDefault,
    CallerPriority,
    /// Changed by a rule of the chain (EW-dominant boxes)
    RuleOverride,
}

/// Every fact the decision was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionInputs {
    pub bbox: BoundingBox,
    pub centroid: Option<[f64; 2]>,
    pub operation_type: OperationType,
    pub required_property: ProjectionProperty,
    pub property_source: PropertySource,
    pub metrics: Option<BBoxMetrics>,
    pub utm_zone: Option<u32>,
    pub continent: Option<String>,
}

/// Outcome of a projection decision. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDecision {
    pub crs: Crs,
    pub crs_name: String,
    pub projection_property: ProjectionProperty,
    pub selection_reason: String,
    pub expected_error: String,
    pub decision_path: Vec<DecisionStep>,
    pub decision_inputs: DecisionInputs,
}

impl ProjectionDecision {
    pub fn epsg_code(&self) -> Option<u32> {
        self.crs.epsg_code()
    }

    pub fn wkt(&self) -> Option<&str> {
        self.crs.wkt_text()
    }

    /// Rule that selected the CRS (the last fired rule of the trace)
    pub fn selected_by(&self) -> Option<DecisionRule> {
        self.decision_path
            .iter()
            .rev()
            .find(|s| s.fired && s.rule != DecisionRule::RequiredProperty)
            .map(|s| s.rule)
    }

    /// Whether the trace contains an entry for `rule`
    pub fn considered(&self, rule: DecisionRule) -> bool {
        self.decision_path.iter().any(|s| s.rule == rule)
    }

    pub fn step(&self, rule: DecisionRule) -> Option<&DecisionStep> {
        self.decision_path.iter().find(|s| s.rule == rule)
    }

    /// The trace as human readable lines
    pub fn path_lines(&self) -> Vec<String> {
        self.decision_path.iter().map(DecisionStep::line).collect()
    }
}
