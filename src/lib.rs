//! # liquid-labware
//!
//! The labware model behind a liquid-handling robot's protocol API: well
//! plates and tip racks built from JSON definitions, the geometry of their
//! wells, and the tip tracking a pipette consults before every pick-up.
//!
//! A [`Labware`] owns its wells in physical order and resolves every
//! addressing style a protocol might use (names, indices, slices, rows,
//! columns) to concrete wells. Its tip engine allocates and returns runs of
//! tips for multi-channel heads, and [`select_tiprack_from_list`] walks a
//! list of racks until one can supply the next run. [`LegacyLabware`] keeps
//! older wrap-around range addressing working on top of the current model.

pub mod calibration;
pub mod config;
pub mod definition;
pub mod error;
pub mod geometry;
pub mod labware;
pub mod legacy;
pub mod loader;
pub mod module;
pub mod selector;
pub mod tiprack;
pub mod well;

pub use calibration::{
    CalibrationStore, FileCalibrationStore, MemoryCalibrationStore, load_calibration,
};
pub use config::LabwareConfig;
pub use definition::{
    LabwareDefinition, ModuleDefinition, WellDefinition, uri_from_definition, uri_from_details,
};
pub use error::{LabwareError, OutOfTipsError, Result};
pub use geometry::{LabwareId, Location, LocationOwner, ModuleId, Point, WellId};
pub use labware::Labware;
pub use legacy::{LegacyLabware, LegacyProperties, RangeQuery};
pub use loader::LabwareLoader;
pub use module::{ModuleGeometry, ModuleKind, load_module, load_module_from_definition};
pub use selector::{GroupKey, Selection, WellSelector};
pub use tiprack::{filter_tipracks_to_start, select_tiprack_from_list};
pub use well::{Well, WellShape};
