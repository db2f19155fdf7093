//! Deck coordinates and the identities locations are expressed against.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A position on the deck in millimetres.
pub type Point = DVec3;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of one constructed [`Labware`](crate::Labware).
///
/// Two labware built from the same definition still get distinct ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabwareId(u64);

impl LabwareId {
    pub(crate) fn fresh() -> Self {
        Self(next_id())
    }
}

/// Identity of one well: its owning labware plus its position in physical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellId {
    pub labware: LabwareId,
    pub index: usize,
}

/// Identity of one loaded deck module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(u64);

impl ModuleId {
    pub(crate) fn fresh() -> Self {
        Self(next_id())
    }
}

/// What a [`Location`] is relative to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationOwner {
    Labware(LabwareId),
    Well(WellId),
    Module(ModuleId),
    /// A free-form label such as a deck slot name.
    Label(String),
}

impl From<&str> for LocationOwner {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for LocationOwner {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<LabwareId> for LocationOwner {
    fn from(id: LabwareId) -> Self {
        Self::Labware(id)
    }
}

impl From<WellId> for LocationOwner {
    fn from(id: WellId) -> Self {
        Self::Well(id)
    }
}

impl From<ModuleId> for LocationOwner {
    fn from(id: ModuleId) -> Self {
        Self::Module(id)
    }
}

impl LocationOwner {
    /// A name for this owner that survives reloading: the label itself, or the
    /// kind of object for id-based owners.
    pub fn stable_name(&self) -> &str {
        match self {
            Self::Labware(_) => "labware",
            Self::Well(_) => "well",
            Self::Module(_) => "module",
            Self::Label(label) => label,
        }
    }
}

impl fmt::Display for LocationOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Labware(id) => write!(f, "labware#{}", id.0),
            Self::Well(id) => write!(f, "well#{}.{}", id.labware.0, id.index),
            Self::Module(id) => write!(f, "module#{}", id.0),
            Self::Label(label) => write!(f, "{label}"),
        }
    }
}

/// A point together with the object it was computed against.
///
/// Equality compares both the point and the owner identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub point: Point,
    pub owner: LocationOwner,
}

impl Location {
    pub fn new(point: Point, owner: impl Into<LocationOwner>) -> Self {
        Self {
            point,
            owner: owner.into(),
        }
    }

    /// Returns a copy moved by `offset`, keeping the owner.
    pub fn translated(&self, offset: Point) -> Self {
        Self {
            point: self.point + offset,
            owner: self.owner.clone(),
        }
    }

    /// Returns a copy with only the z coordinate moved.
    pub fn raised(&self, dz: f64) -> Self {
        self.translated(Point::new(0.0, 0.0, dz))
    }
}
