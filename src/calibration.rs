//! Calibration storage. The labware model only reads offsets through
//! [`CalibrationStore`]; how they are measured is somebody else's concern.

use crate::definition::Offset;
use crate::error::{LabwareError, Result};
use crate::geometry::Point;
use crate::labware::Labware;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where per-labware calibration offsets are kept between runs.
pub trait CalibrationStore {
    /// The stored offset for this labware, if one was ever saved.
    fn load(&self, labware: &Labware) -> Result<Option<Point>>;

    /// Records `delta` as the offset for this labware's placement.
    fn save(&mut self, labware: &Labware, delta: Point) -> Result<()>;
}

/// Identifies a labware's calibration by definition and placement.
///
/// Built only from names that survive a reload (namespace, load name,
/// version and [`Labware::placement`]), never from per-process ids.
pub fn calibration_key(labware: &Labware) -> String {
    let sanitize = |s: &str| {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>()
    };
    format!(
        "{}__{}__{}__{}",
        sanitize(&labware.definition().namespace),
        sanitize(labware.load_name()),
        labware.definition().version,
        sanitize(labware.placement())
    )
}

/// Applies whatever offset `store` holds for `labware`.
pub fn load_calibration(labware: &mut Labware, store: &dyn CalibrationStore) -> Result<()> {
    if let Some(delta) = store.load(labware)? {
        info!(
            labware = %labware,
            x = delta.x,
            y = delta.y,
            z = delta.z,
            "applying stored calibration"
        );
        labware.set_calibration(delta);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct CalibrationEntry {
    offset: Offset,
}

#[derive(Debug, Serialize, Deserialize)]
struct CalibrationFile {
    default: CalibrationEntry,
}

/// One JSON file per labware placement under a directory.
#[derive(Clone, Debug)]
pub struct FileCalibrationStore {
    dir: PathBuf,
}

impl FileCalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, labware: &Labware) -> PathBuf {
        self.dir.join(format!("{}.json", calibration_key(labware)))
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn load(&self, labware: &Labware) -> Result<Option<Point>> {
        let path = self.path_for(labware);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(LabwareError::Io { path, source }),
        };
        let file: CalibrationFile = serde_json::from_str(&text)?;
        Ok(Some(file.default.offset.into()))
    }

    fn save(&mut self, labware: &Labware, delta: Point) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| LabwareError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(labware);
        let file = CalibrationFile {
            default: CalibrationEntry {
                offset: delta.into(),
            },
        };
        let text = serde_json::to_string_pretty(&file)?;
        fs::write(&path, text).map_err(|source| LabwareError::Io { path, source })
    }
}

/// Keeps offsets in memory; useful for simulation and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryCalibrationStore {
    offsets: HashMap<String, Point>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self, labware: &Labware) -> Result<Option<Point>> {
        Ok(self.offsets.get(&calibration_key(labware)).copied())
    }

    fn save(&mut self, labware: &Labware, delta: Point) -> Result<()> {
        self.offsets.insert(calibration_key(labware), delta);
        Ok(())
    }
}
