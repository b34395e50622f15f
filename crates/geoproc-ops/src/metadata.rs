//! Projection metadata attached to operation results

use geojson::{FeatureCollection, JsonObject};
use geoproc_core::error::Result;
use geoproc_core::models::{DecisionStep, ProjectionProperty};
use geoproc_geo::wkt::wkt_hash;
use geoproc_geo::{BufferMethod, CrsSelection};
use serde::Serialize;
use serde_json::Value;

/// Key of the annotation inside `FeatureCollection.properties`
pub const CRS_METADATA_KEY: &str = "_crs_metadata";

/// How the working CRS of an operation was chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsMetadata {
    pub crs_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsg_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkt_hash: Option<String>,
    pub auto_selected: bool,
    pub selection_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_property: Option<ProjectionProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decision_path: Vec<DecisionStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_method: Option<BufferMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_method_reason: Option<String>,
}

impl CrsMetadata {
    pub fn from_selection(selection: &CrsSelection) -> Self {
        let wkt = selection.crs.wkt_text().map(str::to_string);
        let decision = selection.decision.as_ref();
        Self {
            crs_name: selection.crs.name.clone(),
            epsg_code: selection.crs.epsg_code(),
            wkt_hash: wkt.as_deref().map(wkt_hash),
            wkt,
            auto_selected: selection.auto_selected,
            selection_reason: selection.selection_reason.clone(),
            projection_property: decision.map(|d| d.projection_property),
            expected_error: decision.map(|d| d.expected_error.clone()),
            decision_path: decision.map(|d| d.decision_path.clone()).unwrap_or_default(),
            buffer_method: None,
            buffer_method_reason: None,
        }
    }

    pub fn with_buffer_method(mut self, method: BufferMethod, reason: impl Into<String>) -> Self {
        self.buffer_method = Some(method);
        self.buffer_method_reason = Some(reason.into());
        self
    }
}

/// Store `metadata` at `properties._crs_metadata` of a collection
pub fn attach_crs_metadata(fc: &mut FeatureCollection, metadata: &CrsMetadata) -> Result<()> {
    let value = serde_json::to_value(metadata)?;
    let members = fc.foreign_members.get_or_insert_with(JsonObject::new);
    let properties = members
        .entry("properties")
        .or_insert_with(|| Value::Object(JsonObject::new()));
    if !properties.is_object() {
        *properties = Value::Object(JsonObject::new());
    }
    if let Value::Object(map) = properties {
        map.insert(CRS_METADATA_KEY.to_string(), value);
    }
    Ok(())
}

/// Read the annotation back, if present
pub fn crs_metadata(fc: &FeatureCollection) -> Option<&Value> {
    fc.foreign_members.as_ref()?.get("properties")?.get(CRS_METADATA_KEY)
}
