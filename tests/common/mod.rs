// tests/common/mod.rs
#![allow(dead_code)]

use liquid_labware::{LabwareDefinition, Location, Point};
use serde_json::{Map, Value, json};

pub const ROWS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

pub fn slot(x: f64, y: f64, z: f64) -> Location {
    Location::new(Point::new(x, y, z), "Test Slot")
}

pub fn origin() -> Location {
    slot(0.0, 0.0, 0.0)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// A regular 8x12 grid at 9 mm pitch, built the way shipped definitions are laid out.
fn grid_96(
    load_name: &str,
    display_name: &str,
    well: Value,
    z_dimension: f64,
    parameters: Value,
) -> LabwareDefinition {
    let mut wells = Map::new();
    let mut ordering = Vec::new();
    for col in 1..=12 {
        let mut column = Vec::new();
        for (r, row) in ROWS.iter().enumerate() {
            let name = format!("{row}{col}");
            let mut entry = well.clone();
            entry["x"] = json!(14.38 + 9.0 * (col - 1) as f64);
            entry["y"] = json!(74.24 - 9.0 * r as f64);
            wells.insert(name.clone(), entry);
            column.push(name);
        }
        ordering.push(column);
    }
    let mut params = parameters;
    params["loadName"] = json!(load_name);
    let doc = json!({
        "namespace": "opentrons",
        "version": 1,
        "metadata": { "displayName": display_name },
        "parameters": params,
        "dimensions": { "xDimension": 127.76, "yDimension": 85.48, "zDimension": z_dimension },
        "cornerOffsetFromSlot": { "x": 0, "y": 0, "z": 0 },
        "ordering": ordering,
        "wells": wells,
    });
    serde_json::from_value(doc).expect("fixture definition should deserialize")
}

pub fn tiprack_96() -> LabwareDefinition {
    grid_96(
        "opentrons_96_tiprack_300ul",
        "Opentrons 96 Tip Rack 300 µL",
        json!({
            "shape": "circular", "depth": 59.3, "totalLiquidVolume": 300,
            "diameter": 5.23, "z": 5.39
        }),
        64.49,
        json!({ "isTiprack": true, "tipLength": 59.3 }),
    )
}

pub fn plate_96() -> LabwareDefinition {
    grid_96(
        "corning_96_wellplate_360ul_flat",
        "Corning 96 Well Plate 360 µL Flat",
        json!({
            "shape": "circular", "depth": 10.67, "totalLiquidVolume": 360,
            "diameter": 6.86, "z": 3.55
        }),
        14.22,
        json!({ "isTiprack": false }),
    )
}

pub fn pcr_plate_96() -> LabwareDefinition {
    grid_96(
        "biorad_96_wellplate_200ul_pcr",
        "Bio-Rad 96 Well Plate 200 µL PCR",
        json!({
            "shape": "circular", "depth": 14.81, "totalLiquidVolume": 200,
            "diameter": 5.46, "z": 1.25
        }),
        16.06,
        json!({
            "isTiprack": false,
            "isMagneticModuleCompatible": true,
            "magneticModuleEngageHeight": 18
        }),
    )
}

/// Two columns of two circular wells.
pub fn minimal_2x2() -> LabwareDefinition {
    let well = |x: f64, y: f64| {
        json!({
            "depth": 40, "totalLiquidVolume": 100, "diameter": 30,
            "x": x, "y": y, "z": 0, "shape": "circular"
        })
    };
    let doc = json!({
        "metadata": { "displayName": "minimal labware" },
        "cornerOffsetFromSlot": { "x": 0, "y": 0, "z": 0 },
        "parameters": { "isTiprack": false, "isMagneticModuleCompatible": false },
        "ordering": [["A1", "B1"], ["A2", "B2"]],
        "wells": {
            "A1": well(0.0, 0.0),
            "B1": well(0.0, 5.0),
            "A2": well(10.0, 0.0),
            "B2": well(10.0, 5.0),
        },
        "dimensions": { "xDimension": 1.0, "yDimension": 2.0, "zDimension": 3.0 }
    });
    serde_json::from_value(doc).expect("minimal definition should deserialize")
}
