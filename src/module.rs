//! Deck modules (temperature and magnetic units) and the labware stacked on them.

use crate::definition::{ModuleDefinition, module_definition};
use crate::error::{LabwareError, Result};
use crate::geometry::{LabwareId, Location, ModuleId, Point};
use crate::labware::Labware;
use serde::Serialize;
use std::fmt;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ModuleKind {
    Temperature,
    Magnetic,
    Other,
}

impl ModuleKind {
    fn from_name(name: &str) -> Self {
        match name {
            "tempdeck" | "Temperature Module" | "temperature module" => Self::Temperature,
            "magdeck" | "Magnetic Module" | "magnetic module" => Self::Magnetic,
            _ => Self::Other,
        }
    }
}

/// What a module remembers about the labware sitting on it.
///
/// The module does not own the labware; it keeps the identity and the
/// figures it needs for clearance and magnet height.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StackedLabware {
    pub id: LabwareId,
    pub name: String,
    pub highest_z: f64,
    pub magdeck_engage_height: Option<f64>,
}

impl StackedLabware {
    fn of(labware: &Labware) -> Self {
        Self {
            id: labware.id(),
            name: labware.to_string(),
            highest_z: labware.highest_z(),
            magdeck_engage_height: labware.magdeck_engage_height(),
        }
    }
}

/// A deck module and the one labware it may hold.
///
/// Not `Clone`: a module's identity and its stacked labware belong to exactly
/// one instance.
#[derive(Debug, Serialize)]
pub struct ModuleGeometry {
    id: ModuleId,
    /// Model name (`tempdeck`) or display name it was loaded by.
    name: String,
    kind: ModuleKind,
    /// Usually a deck slot.
    parent: Location,
    /// Where labware placed on the module has its origin.
    location: Location,
    /// Top of the bare module.
    height: f64,
    over_labware: f64,
    labware: Option<StackedLabware>,
}

/// Loads a bundled module definition by model name (`tempdeck`, `magdeck`)
/// or display name and places it relative to `parent`.
pub fn load_module(name: &str, parent: Location) -> Result<ModuleGeometry> {
    let definition = module_definition(name)?;
    Ok(ModuleGeometry::new(name, &definition, parent))
}

/// Places a module described by an explicit definition.
pub fn load_module_from_definition(
    definition: &ModuleDefinition,
    parent: Location,
) -> ModuleGeometry {
    ModuleGeometry::new(&definition.display_name, definition, parent)
}

impl ModuleGeometry {
    /// Places a module described by `definition`, recording `name` as its model.
    pub fn new(name: &str, definition: &ModuleDefinition, parent: Location) -> Self {
        let id = ModuleId::fresh();
        let offset = Point::from(definition.labware_offset);
        Self {
            id,
            name: name.to_string(),
            kind: ModuleKind::from_name(name),
            location: Location::new(parent.point + offset, id),
            height: parent.point.z + definition.dimensions.bare_overall_height,
            over_labware: definition.dimensions.over_labware_height,
            parent,
            labware: None,
        }
    }

    /// Identity unique to this instance.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// The model or display name the module was loaded by.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Where the module itself was placed.
    pub fn parent(&self) -> &Location {
        &self.parent
    }

    /// Origin for labware placed on the module.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Stable name of this module position: model name and the parent's label.
    ///
    /// Labware loaded onto the module uses this to find its stored calibration
    /// again when the same protocol builds a fresh module in the same slot.
    pub fn placement(&self) -> String {
        format!("{}@{}", self.name, self.parent.owner.stable_name())
    }

    /// Clearance the module keeps above whatever labware it holds.
    pub fn over_labware(&self) -> f64 {
        self.over_labware
    }

    /// The labware currently stacked on the module, if any.
    pub fn labware(&self) -> Option<&StackedLabware> {
        self.labware.as_ref()
    }

    /// The highest point of the module stack, used for collision clearance.
    pub fn highest_z(&self) -> f64 {
        match &self.labware {
            Some(stacked) => stacked.highest_z + self.over_labware,
            None => self.height,
        }
    }

    /// Records `labware` as sitting on this module.
    ///
    /// A module holds at most one labware; call
    /// [`reset_labware`](Self::reset_labware) before replacing it.
    pub fn add_labware(&mut self, labware: &Labware) -> Result<()> {
        if let Some(existing) = &self.labware {
            return Err(LabwareError::ModuleOccupied {
                module: self.to_string(),
                labware: existing.name.clone(),
            });
        }
        if self.kind == ModuleKind::Magnetic && labware.magdeck_engage_height().is_none() {
            warn!(
                labware = %labware,
                "labware is not magnetic-module compatible; engage needs an explicit height"
            );
        }
        self.labware = Some(StackedLabware::of(labware));
        Ok(())
    }

    /// Refreshes the stored figures after the stacked labware was recalibrated.
    pub fn update_labware(&mut self, labware: &Labware) {
        if let Some(stacked) = &mut self.labware
            && stacked.id == labware.id()
        {
            *stacked = StackedLabware::of(labware);
        }
    }

    /// Detaches whatever labware the module holds.
    pub fn reset_labware(&mut self) {
        self.labware = None;
    }

    /// Resolves the magnet height for an engage request.
    ///
    /// An explicit `height` wins. Otherwise the stacked labware's engage
    /// height is used, shifted by `offset`.
    pub fn engage_height(&self, height: Option<f64>, offset: Option<f64>) -> Result<f64> {
        if let Some(height) = height {
            return Ok(height);
        }
        match &self.labware {
            Some(StackedLabware {
                magdeck_engage_height: Some(base),
                ..
            }) => Ok(base + offset.unwrap_or(0.0)),
            Some(stacked) => Err(LabwareError::EngageHeightUnknown {
                labware: stacked.name.clone(),
            }),
            None => Err(LabwareError::EngageHeightUnknown {
                labware: "(none)".to_string(),
            }),
        }
    }
}

impl fmt::Display for ModuleGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.name, self.parent.owner)
    }
}
