//! A single well: its shape, where it sits, and whether it holds a tip.

use crate::definition::{WellDefinition, WellShapeKind};
use crate::error::{LabwareError, Result};
use crate::geometry::{LabwareId, Location, LocationOwner, Point, WellId};
use crate::selector::split_well_name;
use bevy_math::primitives::{Cuboid, Cylinder, Measured3d};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cross-section of a well.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WellShape {
    Circular { diameter: f64 },
    /// `length` runs along x, `width` along y.
    Rectangular { length: f64, width: f64 },
}

/// A type-erased wrapper so the volume of any well shape comes from `bevy_math`.
#[derive(Clone, Copy, Debug)]
pub enum WellPrimitive {
    Cylinder(Cylinder),
    Cuboid(Cuboid),
}

impl WellPrimitive {
    pub fn volume(&self) -> f32 {
        match self {
            Self::Cylinder(s) => s.volume(),
            Self::Cuboid(s) => s.volume(),
        }
    }
}

impl WellShape {
    fn from_definition(name: &str, def: &WellDefinition) -> Result<Self> {
        let invalid = |reason: &str| LabwareError::Validation {
            subject: name.to_string(),
            reason: reason.to_string(),
        };
        match def.shape {
            WellShapeKind::Circular => {
                let diameter = def
                    .diameter
                    .ok_or_else(|| invalid("circular well has no diameter"))?;
                if !(diameter.is_finite() && diameter > 0.0) {
                    return Err(invalid("diameter must be a positive number"));
                }
                Ok(Self::Circular { diameter })
            }
            WellShapeKind::Rectangular => {
                let (Some(length), Some(width)) = (def.x_dimension, def.y_dimension) else {
                    return Err(invalid("rectangular well needs xDimension and yDimension"));
                };
                if !(length.is_finite() && length > 0.0 && width.is_finite() && width > 0.0) {
                    return Err(invalid("xDimension and yDimension must be positive numbers"));
                }
                Ok(Self::Rectangular { length, width })
            }
        }
    }

    /// Half of the extent along x and y.
    pub fn half_extents(&self) -> (f64, f64) {
        match *self {
            Self::Circular { diameter } => (diameter / 2.0, diameter / 2.0),
            Self::Rectangular { length, width } => (length / 2.0, width / 2.0),
        }
    }

    /// Convert to the corresponding `bevy_math` primitive, `depth` tall.
    pub fn to_bevy_primitive(self, depth: f64) -> WellPrimitive {
        match self {
            Self::Circular { diameter } => {
                WellPrimitive::Cylinder(Cylinder::new(diameter as f32 / 2.0, depth as f32))
            }
            Self::Rectangular { length, width } => {
                WellPrimitive::Cuboid(Cuboid::new(length as f32, width as f32, depth as f32))
            }
        }
    }
}

/// One well of a labware, or a detached well built on its own.
#[derive(Clone, Debug, Serialize)]
pub struct Well {
    id: WellId,
    /// Row letters then column number, e.g. `"B12"`.
    name: String,
    /// Display name of the owning labware, for messages.
    labware_name: String,
    shape: WellShape,
    depth: f64,
    /// Rated capacity in µL.
    max_volume: f64,
    /// Centre of the well bottom relative to `parent`.
    local: Point,
    parent: Location,
    has_tip: bool,
}

impl Well {
    /// Builds a well from its definition, placed relative to `parent`.
    ///
    /// When `parent` is a labware the well records that labware as its owner;
    /// otherwise it is a detached well with an identity of its own. The name
    /// must be row letters followed by a column number starting at 1.
    pub fn new(
        def: &WellDefinition,
        parent: Location,
        name: impl Into<String>,
        has_tip: bool,
    ) -> Result<Self> {
        let name = name.into();
        if split_well_name(&name).is_none() {
            return Err(LabwareError::Validation {
                reason: format!("well name `{name}` is not a row letter and column number"),
                subject: name,
            });
        }
        let shape = WellShape::from_definition(&name, def)?;
        if !(def.depth.is_finite() && def.depth >= 0.0) {
            return Err(LabwareError::Validation {
                subject: name,
                reason: format!("depth {} is not a non-negative number", def.depth),
            });
        }
        let labware = match parent.owner {
            LocationOwner::Labware(id) => id,
            _ => LabwareId::fresh(),
        };
        Ok(Self {
            id: WellId { labware, index: 0 },
            labware_name: parent.owner.to_string(),
            name,
            shape,
            depth: def.depth,
            max_volume: def.total_liquid_volume,
            local: Point::new(def.x, def.y, def.z),
            parent,
            has_tip,
        })
    }

    pub(crate) fn attach(&mut self, index: usize, labware_name: &str) {
        self.id.index = index;
        self.labware_name = labware_name.to_string();
    }

    /// Moves the well to another labware, keeping its position in order.
    pub(crate) fn reattach(&mut self, labware: LabwareId) {
        self.id.labware = labware;
        self.parent.owner = LocationOwner::Labware(labware);
    }

    pub(crate) fn set_parent_point(&mut self, point: Point) {
        self.parent.point = point;
    }

    /// Owning labware plus position in physical order.
    pub fn id(&self) -> WellId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The calibrated labware corner this well is positioned against.
    pub fn parent(&self) -> &Location {
        &self.parent
    }

    pub fn shape(&self) -> WellShape {
        self.shape
    }

    /// Diameter of a circular well; `None` for rectangular wells.
    pub fn diameter(&self) -> Option<f64> {
        match self.shape {
            WellShape::Circular { diameter } => Some(diameter),
            WellShape::Rectangular { .. } => None,
        }
    }

    /// Extent along x of a rectangular well.
    pub fn length(&self) -> Option<f64> {
        match self.shape {
            WellShape::Rectangular { length, .. } => Some(length),
            WellShape::Circular { .. } => None,
        }
    }

    /// Extent along y of a rectangular well.
    pub fn width(&self) -> Option<f64> {
        match self.shape {
            WellShape::Rectangular { width, .. } => Some(width),
            WellShape::Circular { .. } => None,
        }
    }

    /// Distance from the well floor to its opening.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Rated liquid capacity in µL.
    pub fn max_volume(&self) -> f64 {
        self.max_volume
    }

    /// Volume of the well's solid shape in mm³ (equivalently µL).
    pub fn geometric_volume(&self) -> f64 {
        self.shape.to_bevy_primitive(self.depth).volume() as f64
    }

    /// Whether a tip currently sits in this well.
    pub fn has_tip(&self) -> bool {
        self.has_tip
    }

    pub fn set_has_tip(&mut self, value: bool) {
        self.has_tip = value;
    }

    fn bottom_point(&self) -> Point {
        self.parent.point + self.local
    }

    fn at(&self, point: Point) -> Location {
        Location::new(point, self.id)
    }

    /// The centre of the well's opening, raised by `z`.
    pub fn top(&self, z: f64) -> Location {
        self.at(self.bottom_point() + Point::new(0.0, 0.0, self.depth + z))
    }

    /// The centre of the well's floor, raised by `z`.
    pub fn bottom(&self, z: f64) -> Location {
        self.at(self.bottom_point() + Point::new(0.0, 0.0, z))
    }

    pub fn center(&self) -> Location {
        self.at(self.from_center_cartesian(0.0, 0.0, 0.0))
    }

    /// Maps fractions of the half-extents to an absolute point.
    ///
    /// `1.0` on any axis reaches the wall (or the top, for z) and `-1.0` the
    /// opposite wall (or the floor). Values outside `[-1, 1]` extrapolate.
    pub fn from_center_cartesian(&self, x: f64, y: f64, z: f64) -> Point {
        let (half_x, half_y) = self.shape.half_extents();
        let half_z = self.depth / 2.0;
        let center = self.bottom_point() + Point::new(0.0, 0.0, half_z);
        center + Point::new(x * half_x, y * half_y, z * half_z)
    }
}

impl PartialEq for Well {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.name, self.labware_name)
    }
}
