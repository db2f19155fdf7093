//! Finding labware definitions and turning them into calibrated [`Labware`].
//!
//! The entry point is [`LabwareLoader`]. Configure it with a
//! [`LabwareConfig`], optionally register in-memory definitions with
//! [`LabwareLoader::with_bundle`] or [`LabwareLoader::add_definition`], then
//! call [`LabwareLoader::load`].

use crate::calibration::{
    CalibrationStore, FileCalibrationStore, MemoryCalibrationStore, load_calibration,
};
use crate::config::LabwareConfig;
use crate::definition::{LabwareDefinition, uri_from_details};
use crate::error::{LabwareError, Result};
use crate::geometry::Location;
use crate::labware::Labware;
use crate::legacy::LegacyLabware;
use crate::module::ModuleGeometry;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, info};

/// Finds definitions and builds calibrated labware from them.
pub struct LabwareLoader {
    /// Where definitions and calibration files live.
    config: LabwareConfig,
    /// When set, the only place definitions are looked up.
    bundle: Option<HashMap<String, LabwareDefinition>>,
    /// Searched before the filesystem when no bundle is set.
    extra: HashMap<String, LabwareDefinition>,
    calibration: Box<dyn CalibrationStore>,
}

impl LabwareLoader {
    /// Creates a loader over `config`.
    ///
    /// Calibration comes from files under `config.calibration_dir` when that
    /// is set, and from an empty in-memory store otherwise.
    pub fn new(config: LabwareConfig) -> Self {
        let calibration: Box<dyn CalibrationStore> = match &config.calibration_dir {
            Some(dir) => Box::new(FileCalibrationStore::new(dir)),
            None => Box::new(MemoryCalibrationStore::new()),
        };
        Self {
            config,
            bundle: None,
            extra: HashMap::new(),
            calibration,
        }
    }

    /// Restricts lookups to `definitions` (builder pattern).
    pub fn with_bundle(mut self, definitions: impl IntoIterator<Item = LabwareDefinition>) -> Self {
        self.bundle = Some(definitions.into_iter().map(|d| (d.uri(), d)).collect());
        self
    }

    /// Replaces the calibration store (builder pattern).
    pub fn with_calibration_store(mut self, store: impl CalibrationStore + 'static) -> Self {
        self.calibration = Box::new(store);
        self
    }

    /// Registers a definition searched before the filesystem.
    pub fn add_definition(&mut self, definition: LabwareDefinition) {
        self.extra.insert(definition.uri(), definition);
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &LabwareConfig {
        &self.config
    }

    /// The store stored offsets are read from.
    pub fn calibration_store(&self) -> &dyn CalibrationStore {
        self.calibration.as_ref()
    }

    /// Mutable access to the store, for saving newly measured offsets.
    pub fn calibration_store_mut(&mut self) -> &mut dyn CalibrationStore {
        self.calibration.as_mut()
    }

    fn namespaces<'a>(&'a self, namespace: Option<&'a str>) -> Vec<&'a str> {
        match namespace {
            Some(ns) => vec![ns],
            None => self.config.default_namespaces.iter().map(String::as_str).collect(),
        }
    }

    /// Looks a definition up by load name.
    ///
    /// Without a `namespace`, the configured default namespaces are tried in
    /// order. A bundle, when set, is the only source; otherwise registered
    /// definitions are tried before the search directories.
    pub fn get_definition(
        &self,
        load_name: &str,
        namespace: Option<&str>,
        version: u32,
    ) -> Result<LabwareDefinition> {
        let namespaces = self.namespaces(namespace);
        let not_found = || LabwareError::DefinitionNotFound {
            load_name: load_name.to_string(),
            namespace: namespace.map(str::to_string),
            version,
        };

        if let Some(bundle) = &self.bundle {
            return namespaces
                .iter()
                .find_map(|ns| bundle.get(&uri_from_details(ns, load_name, version)))
                .cloned()
                .ok_or_else(not_found);
        }

        if let Some(found) = namespaces
            .iter()
            .find_map(|ns| self.extra.get(&uri_from_details(ns, load_name, version)))
        {
            return Ok(found.clone());
        }

        for ns in &namespaces {
            for dir in self.config.search_dirs() {
                let path = dir.join(ns).join(load_name).join(format!("{version}.json"));
                match fs::read_to_string(&path) {
                    Ok(text) => {
                        info!(path = %path.display(), "loaded labware definition");
                        return LabwareDefinition::from_json(&text);
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!(path = %path.display(), "no definition here");
                    }
                    Err(source) => return Err(LabwareError::Io { path, source }),
                }
            }
        }
        Err(not_found())
    }

    /// Builds labware from an inline definition and applies stored calibration.
    pub fn load_from_definition(
        &self,
        definition: LabwareDefinition,
        parent: Location,
        label: Option<&str>,
    ) -> Result<Labware> {
        self.build(definition, parent, label, None)
    }

    fn build(
        &self,
        definition: LabwareDefinition,
        parent: Location,
        label: Option<&str>,
        placement: Option<String>,
    ) -> Result<Labware> {
        let mut labware = Labware::new(definition, parent, label)?;
        if let Some(placement) = placement {
            labware = labware.with_placement(placement);
        }
        load_calibration(&mut labware, self.calibration.as_ref())?;
        Ok(labware)
    }

    /// Finds a definition by load name and builds calibrated labware from it.
    pub fn load(
        &self,
        load_name: &str,
        parent: Location,
        label: Option<&str>,
        namespace: Option<&str>,
        version: Option<u32>,
    ) -> Result<Labware> {
        let definition = self.get_definition(load_name, namespace, version.unwrap_or(1))?;
        self.load_from_definition(definition, parent, label)
    }

    /// Like [`load_from_definition`](Self::load_from_definition), wrapped for
    /// legacy addressing.
    pub fn load_legacy_from_definition(
        &self,
        definition: LabwareDefinition,
        parent: Location,
        label: Option<&str>,
    ) -> Result<LegacyLabware> {
        Ok(LegacyLabware::new(self.load_from_definition(definition, parent, label)?))
    }

    /// Like [`load`](Self::load) with default namespace and version, wrapped for
    /// legacy addressing.
    pub fn load_legacy(
        &self,
        load_name: &str,
        parent: Location,
        label: Option<&str>,
    ) -> Result<LegacyLabware> {
        Ok(LegacyLabware::new(self.load(load_name, parent, label, None, None)?))
    }

    /// Loads labware onto `module` and records it there.
    ///
    /// The labware's calibration is keyed on the module's placement, so it is
    /// found again on a fresh module of the same model in the same slot.
    pub fn load_onto_module(
        &self,
        module: &mut ModuleGeometry,
        load_name: &str,
    ) -> Result<Labware> {
        let definition = self.get_definition(load_name, None, 1)?;
        self.load_onto_module_from_definition(module, definition)
    }

    pub fn load_onto_module_from_definition(
        &self,
        module: &mut ModuleGeometry,
        definition: LabwareDefinition,
    ) -> Result<Labware> {
        let parent = module.location().clone();
        let labware = self.build(definition, parent, None, Some(module.placement()))?;
        module.add_labware(&labware)?;
        Ok(labware)
    }
}

impl Default for LabwareLoader {
    fn default() -> Self {
        Self::new(LabwareConfig::default())
    }
}
