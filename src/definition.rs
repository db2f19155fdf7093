//! Serde models for the labware and module definition documents.
//!
//! Field names follow the JSON documents exactly; anything the crate does not
//! read is ignored on deserialization.

use crate::error::{LabwareError, Result};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An `{x, y, z}` triple as it appears in definition files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Offset> for Point {
    fn from(o: Offset) -> Self {
        Point::new(o.x, o.y, o.z)
    }
}

impl From<Point> for Offset {
    fn from(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WellShapeKind {
    Circular,
    Rectangular,
}

/// Shape and position of one well, relative to the labware's front-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellDefinition {
    pub shape: WellShapeKind,
    pub depth: f64,
    #[serde(default)]
    pub total_liquid_volume: f64,
    #[serde(default)]
    pub diameter: Option<f64>,
    #[serde(default)]
    pub x_dimension: Option<f64>,
    #[serde(default)]
    pub y_dimension: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareParameters {
    #[serde(default)]
    pub is_tiprack: bool,
    #[serde(default)]
    pub load_name: String,
    #[serde(default)]
    pub tip_length: Option<f64>,
    #[serde(default)]
    pub quirks: Vec<String>,
    #[serde(default)]
    pub is_magnetic_module_compatible: bool,
    #[serde(default)]
    pub magnetic_module_engage_height: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareDimensions {
    pub x_dimension: f64,
    pub y_dimension: f64,
    pub z_dimension: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareMetadata {
    pub display_name: String,
}

fn default_namespace() -> String {
    "custom_beta".to_string()
}

fn default_version() -> u32 {
    1
}

/// A complete labware definition document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareDefinition {
    pub wells: BTreeMap<String, WellDefinition>,
    /// Well names grouped by column; the outer order is left to right.
    pub ordering: Vec<Vec<String>>,
    #[serde(default)]
    pub parameters: LabwareParameters,
    pub dimensions: LabwareDimensions,
    #[serde(default)]
    pub corner_offset_from_slot: Offset,
    pub metadata: LabwareMetadata,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl LabwareDefinition {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn uri(&self) -> String {
        uri_from_definition(self)
    }
}

/// Builds the `namespace/load_name/version` identifier of a definition.
pub fn uri_from_details(namespace: &str, load_name: &str, version: u32) -> String {
    format!("{namespace}/{load_name}/{version}")
}

pub fn uri_from_definition(definition: &LabwareDefinition) -> String {
    uri_from_details(
        &definition.namespace,
        &definition.parameters.load_name,
        definition.version,
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDimensions {
    pub bare_overall_height: f64,
    #[serde(default)]
    pub over_labware_height: f64,
}

/// Static placement metadata of a deck module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    #[serde(default)]
    pub display_name: String,
    pub labware_offset: Offset,
    pub dimensions: ModuleDimensions,
}

const BUNDLED_MODULES: &str = include_str!("../data/module_definitions.json");

/// Returns the module definitions shipped with the crate, keyed by model name.
pub fn bundled_module_definitions() -> Result<BTreeMap<String, ModuleDefinition>> {
    Ok(serde_json::from_str(BUNDLED_MODULES)?)
}

/// Looks up a bundled module definition by model name or user-facing alias.
pub fn module_definition(name: &str) -> Result<ModuleDefinition> {
    let model = match name {
        "Temperature Module" | "temperature module" => "tempdeck",
        "Magnetic Module" | "magnetic module" => "magdeck",
        other => other,
    };
    let mut defs = bundled_module_definitions()?;
    let known = defs.keys().cloned().collect();
    defs.remove(model).ok_or_else(|| LabwareError::UnknownModule {
        name: name.to_string(),
        known,
    })
}
