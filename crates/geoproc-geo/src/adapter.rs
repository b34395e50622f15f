//! Working CRS preparation for operations.
//!
//! Decides (or accepts) a working CRS for one or more tables and returns reprojected
//! copies together with a record of how the CRS was chosen.

use crate::decider::ProjectionDecider;
use crate::table::FeatureTable;
use crate::transform::validate_crs;
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::{BoundingBox, Crs, OperationType, ProjectionDecision, ProjectionProperty};
use serde::Serialize;
use tracing::{debug, info};

/// Caller choices that influence the working CRS
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrsOptions {
    pub auto_optimize_crs: bool,
    pub override_crs: Option<String>,
    pub projection_priority: Option<ProjectionProperty>,
}

impl CrsOptions {
    pub fn auto() -> Self {
        Self { auto_optimize_crs: true, ..Default::default() }
    }
}

/// How the working CRS was chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsSelection {
    pub crs: Crs,
    pub auto_selected: bool,
    pub selection_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ProjectionDecision>,
}

/// Prepare a single table for `operation`
pub fn prepare_table_for_operation(
    table: &FeatureTable,
    operation: OperationType,
    options: &CrsOptions,
    decider: &ProjectionDecider,
) -> Result<(FeatureTable, CrsSelection)> {
    let (mut tables, selection) =
        prepare_tables_for_operation(std::slice::from_ref(table), operation, options, decider)?;
    let prepared = tables.pop().unwrap_or_default();
    Ok((prepared, selection))
}

/// Prepare several tables with one shared working CRS.
///
/// With automatic selection the decision is made over the union of every table's
/// bounds (in WGS 84). Inputs are never mutated.
pub fn prepare_tables_for_operation(
    tables: &[FeatureTable],
    operation: OperationType,
    options: &CrsOptions,
    decider: &ProjectionDecider,
) -> Result<(Vec<FeatureTable>, CrsSelection)> {
    let selection = select_working_crs(tables, operation, options, decider)?;
    debug!(
        operation = %operation,
        crs = %selection.crs,
        auto_selected = selection.auto_selected,
        "Working CRS"
    );

    let prepared = tables
        .iter()
        .map(|t| {
            if t.crs_or_default().same_as(&selection.crs) {
                let mut copy = t.clone();
                copy.ensure_crs();
                Ok(copy)
            } else {
                t.to_crs(&selection.crs)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((prepared, selection))
}

fn select_working_crs(
    tables: &[FeatureTable],
    operation: OperationType,
    options: &CrsOptions,
    decider: &ProjectionDecider,
) -> Result<CrsSelection> {
    if let Some(code) = &options.override_crs {
        let crs = Crs::parse(code)?;
        if !validate_crs(code) {
            return Err(GeoprocError::InvalidCrs {
                code: code.clone(),
                reason: "not a CRS known to the projection engine".to_string(),
            });
        }
        info!(operation = %operation, crs = %crs, "Using manual CRS override");
        return Ok(CrsSelection {
            crs,
            auto_selected: false,
            selection_reason: "Manual override".to_string(),
            decision: None,
        });
    }

    let current = tables.first().map(FeatureTable::crs_or_default).unwrap_or_default();

    if !options.auto_optimize_crs {
        return Ok(CrsSelection {
            crs: current,
            auto_selected: false,
            selection_reason: "Automatic CRS optimization disabled; CRS unchanged".to_string(),
            decision: None,
        });
    }

    let Some(bounds) = geographic_bounds(tables)? else {
        return Ok(CrsSelection {
            crs: current,
            auto_selected: false,
            selection_reason: "No geometries to derive an extent from; CRS unchanged"
                .to_string(),
            decision: None,
        });
    };

    let decision = decider.decide(&bounds, operation, options.projection_priority);
    Ok(CrsSelection {
        crs: decision.crs.clone(),
        auto_selected: true,
        selection_reason: decision.selection_reason.clone(),
        decision: Some(decision),
    })
}

/// Extent of every table together, in WGS 84
fn geographic_bounds(tables: &[FeatureTable]) -> Result<Option<BoundingBox>> {
    let wgs84 = Crs::wgs84();
    let geographic = tables
        .iter()
        .map(|t| if t.crs_or_default().same_as(&wgs84) { Ok(t.clone()) } else { t.to_crs(&wgs84) })
        .collect::<Result<Vec<_>>>()?;
    Ok(FeatureTable::concat(&geographic).wrapped_bounds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use geojson::JsonObject;

    fn points(coords: &[(f64, f64)]) -> FeatureTable {
        let rows = coords
            .iter()
            .map(|(x, y)| {
                crate::table::FeatureRow::new(
                    Some(Geometry::Point(Point::new(*x, *y))),
                    JsonObject::new(),
                )
            })
            .collect();
        FeatureTable::new(rows, None)
    }

    #[test]
    fn test_auto_selects_utm() {
        let table = points(&[(14.2, 50.1), (14.8, 50.9)]);
        let (prepared, selection) = prepare_table_for_operation(
            &table,
            OperationType::Buffer,
            &CrsOptions::auto(),
            &ProjectionDecider::default(),
        )
        .unwrap();
        assert!(selection.auto_selected);
        assert_eq!(selection.crs.epsg_code(), Some(32633));
        assert_eq!(prepared.crs, Some(selection.crs.clone()));
        assert!(table.crs.is_none());
    }

    #[test]
    fn test_disabled_keeps_crs() {
        let table = points(&[(14.2, 50.1)]);
        let options = CrsOptions::default();
        let (prepared, selection) = prepare_table_for_operation(
            &table,
            OperationType::Buffer,
            &options,
            &ProjectionDecider::default(),
        )
        .unwrap();
        assert!(!selection.auto_selected);
        assert_eq!(selection.crs, Crs::wgs84());
        assert_eq!(prepared.rows, table.rows);
    }

    #[test]
    fn test_override() {
        let table = points(&[(14.2, 50.1)]);
        let options =
            CrsOptions { override_crs: Some("EPSG:3035".to_string()), ..CrsOptions::auto() };
        let (_, selection) = prepare_table_for_operation(
            &table,
            OperationType::Area,
            &options,
            &ProjectionDecider::default(),
        )
        .unwrap();
        assert_eq!(selection.selection_reason, "Manual override");
        assert_eq!(selection.crs.epsg_code(), Some(3035));
        assert!(!selection.auto_selected);
    }

    #[test]
    fn test_invalid_override_fails_fast() {
        let table = points(&[(14.2, 50.1)]);
        let options =
            CrsOptions { override_crs: Some("EPSG:999999".to_string()), ..CrsOptions::auto() };
        let result = prepare_table_for_operation(
            &table,
            OperationType::Area,
            &options,
            &ProjectionDecider::default(),
        );
        assert!(matches!(result, Err(GeoprocError::InvalidCrs { .. })));
    }

    #[test]
    fn test_multiple_tables_share_one_decision() {
        let left = points(&[(14.2, 50.1)]);
        let right = points(&[(14.9, 50.8)]);
        let (prepared, selection) = prepare_tables_for_operation(
            &[left, right],
            OperationType::Overlay,
            &CrsOptions::auto(),
            &ProjectionDecider::default(),
        )
        .unwrap();
        assert_eq!(prepared.len(), 2);
        assert!(prepared.iter().all(|t| t.crs.as_ref() == Some(&selection.crs)));
        let bbox = selection.decision.unwrap().decision_inputs.bbox;
        assert_eq!(bbox.to_array(), [14.2, 50.1, 14.9, 50.8]);
    }

    #[test]
    fn test_empty_table_keeps_crs() {
        let (_, selection) = prepare_table_for_operation(
            &FeatureTable::default(),
            OperationType::Buffer,
            &CrsOptions::auto(),
            &ProjectionDecider::default(),
        )
        .unwrap();
        assert!(!selection.auto_selected);
        assert_eq!(selection.crs, Crs::wgs84());
    }
}
