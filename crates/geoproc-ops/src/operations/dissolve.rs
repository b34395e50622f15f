use crate::geometry::{combine, key_string};
use crate::library::{tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::OperationType;
use geoproc_geo::{FeatureRow, FeatureTable};
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// How attribute values of dissolved rows are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggFunc {
    #[default]
    First,
    Last,
    Sum,
    Mean,
    Min,
    Max,
}

impl AggFunc {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Some(AggFunc::First),
            "last" => Some(AggFunc::Last),
            "sum" => Some(AggFunc::Sum),
            "mean" | "avg" | "average" => Some(AggFunc::Mean),
            "min" => Some(AggFunc::Min),
            "max" => Some(AggFunc::Max),
            _ => None,
        }
    }

    /// Combine the values of one column; non-numeric columns fall back to `first`
    fn apply(&self, values: &[&Value]) -> Value {
        let present: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();
        let numbers: Option<Vec<f64>> = present.iter().map(|v| v.as_f64()).collect();
        let first = || present.first().map(|v| (*v).clone()).unwrap_or(Value::Null);
        match (self, numbers) {
            (AggFunc::First, _) => first(),
            (AggFunc::Last, _) => present.last().map(|v| (*v).clone()).unwrap_or(Value::Null),
            (_, None) => first(),
            (_, Some(nums)) if nums.is_empty() => Value::Null,
            (AggFunc::Sum, Some(nums)) => number(nums.iter().sum()),
            (AggFunc::Mean, Some(nums)) => number(nums.iter().sum::<f64>() / nums.len() as f64),
            (AggFunc::Min, Some(nums)) => number(nums.iter().copied().fold(f64::INFINITY, f64::min)),
            (AggFunc::Max, Some(nums)) => {
                number(nums.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
        }
    }
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

impl OperationLibrary {
    /// Merge geometries, grouped by the `by` attributes when they exist
    pub fn dissolve(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.is_empty() {
            return Ok(Vec::new());
        }
        let aggfunc = match params.get_str("aggfunc") {
            Some(s) => AggFunc::parse(s).ok_or_else(|| {
                GeoprocError::invalid_parameter(
                    "aggfunc",
                    format!("'{}' is not one of first, last, sum, mean, min, max", s),
                )
            })?,
            None => AggFunc::First,
        };
        let options = self.options(params)?;
        let input = FeatureTable::concat(&tables(layers)?);
        let (mut working, selection) =
            self.prepare(std::slice::from_ref(&input), OperationType::Dissolve, &options)?;
        let working = working.pop().unwrap_or_default();

        let mut by = params.get_str_list("by");
        let missing: Vec<&String> = by
            .iter()
            .filter(|col| !working.rows.iter().any(|r| r.properties.contains_key(col.as_str())))
            .collect();
        if !missing.is_empty() {
            warn!(columns = ?missing, "Dissolve column not found, dissolving everything");
            by.clear();
        }

        let result = dissolve_rows(&working, &by, aggfunc);
        info!(groups = result.len(), by = ?by, "Dissolved layer");
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }
}

fn dissolve_rows(table: &FeatureTable, by: &[String], aggfunc: AggFunc) -> FeatureTable {
    let mut order: Vec<Vec<Option<String>>> = Vec::new();
    let mut groups: HashMap<Vec<Option<String>>, Vec<&FeatureRow>> = HashMap::new();
    for row in &table.rows {
        let key: Vec<Option<String>> =
            by.iter().map(|col| row.properties.get(col).and_then(key_string)).collect();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(row);
    }

    let rows = order
        .iter()
        .filter_map(|key| groups.get(key))
        .map(|members| {
            let geometries = members.iter().filter_map(|r| r.geometry.clone()).collect();
            FeatureRow::new(combine(geometries), aggregate(members, by, aggfunc))
        })
        .collect();
    FeatureTable::new(rows, table.crs.clone())
}

fn aggregate(members: &[&FeatureRow], by: &[String], aggfunc: AggFunc) -> JsonObject {
    let mut columns: Vec<&String> = Vec::new();
    for row in members {
        for key in row.properties.keys() {
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
    }

    let mut out = JsonObject::new();
    for column in columns {
        let values: Vec<&Value> =
            members.iter().map(|r| r.properties.get(column).unwrap_or(&Value::Null)).collect();
        let value = if by.contains(column) {
            AggFunc::First.apply(&values)
        } else {
            aggfunc.apply(&values)
        };
        out.insert(column.clone(), value);
    }
    out
}
