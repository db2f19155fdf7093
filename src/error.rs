//! Error types returned by this crate.

use std::path::PathBuf;

use thiserror::Error;

/// Raised when no rack in a candidate list can supply a run of tips.
///
/// This is an expected end condition of a protocol (every tip has been used),
/// not a programming mistake, so it is kept apart from [`LabwareError::TipState`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no tip rack among [{}] has {channels} contiguous tips left", .racks.join(", "))]
pub struct OutOfTipsError {
    pub channels: usize,
    pub racks: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LabwareError {
    #[error("invalid definition for `{subject}`: {reason}")]
    Validation { subject: String, reason: String },

    #[error("{labware} has no well named `{name}`")]
    UnknownWell { labware: String, name: String },

    #[error("{labware} has {len} wells; index {index} is out of range")]
    IndexOutOfRange {
        labware: String,
        index: usize,
        len: usize,
    },

    #[error("{labware} has no {kind} `{key}`")]
    UnknownGroup {
        labware: String,
        kind: &'static str,
        key: String,
    },

    #[error("{operation} on {labware}: {reason}")]
    InvalidSelector {
        labware: String,
        operation: &'static str,
        reason: String,
    },

    #[error("{operation}: well `{well}` does not belong to {labware}")]
    ForeignWell {
        labware: String,
        well: String,
        operation: &'static str,
    },

    #[error("{operation} at {well} of {labware}: {reason}")]
    TipState {
        labware: String,
        well: String,
        operation: &'static str,
        reason: String,
    },

    #[error("module `{module}` already holds {labware}; reset it before loading another")]
    ModuleOccupied { module: String, labware: String },

    #[error("unknown module `{name}`; expected one of: {known:?}")]
    UnknownModule { name: String, known: Vec<String> },

    #[error("labware {labware} has no known magnetic engage height; pass an explicit height")]
    EngageHeightUnknown { labware: String },

    #[error("starting tip {well} is not in the first rack {rack}")]
    TipSelection { well: String, rack: String },

    #[error(transparent)]
    OutOfTips(#[from] OutOfTipsError),

    #[error(
        "labware definition `{load_name}` (namespace {namespace:?}, version {version}) not found"
    )]
    DefinitionNotFound {
        load_name: String,
        namespace: Option<String>,
        version: u32,
    },

    #[error("failed to access `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LabwareError {
    /// True when the error only signals that the candidate racks are exhausted.
    pub fn is_out_of_tips(&self) -> bool {
        matches!(self, Self::OutOfTips(_))
    }
}

pub type Result<T, E = LabwareError> = std::result::Result<T, E>;
