//! The labware container: ordered wells, addressing, and the tip engine.
//!
//! Wells are stored in physical order, which is the definition's `ordering`
//! flattened column by column. Each inner list of `ordering` is one physical
//! column; the tip engine never lets a run of channels cross from one column
//! into the next, since a multi-channel head spans a single column.

use crate::definition::{
    LabwareDefinition, LabwareDimensions, LabwareParameters, uri_from_definition,
};
use crate::error::{LabwareError, Result};
use crate::geometry::{LabwareId, Location, LocationOwner, Point, WellId};
use crate::selector::{GroupKey, Selection, WellSelector, split_well_name};
use crate::well::Well;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use tracing::debug;

/// A plate or tip rack built from a definition and placed on the deck.
///
/// Cloning yields a new labware: the copy gets a fresh [`LabwareId`] and its
/// wells are re-attached to it, so well ids taken from the original are
/// foreign to the copy.
#[derive(Debug, Serialize)]
pub struct Labware {
    id: LabwareId,
    definition: LabwareDefinition,
    /// User-facing name overriding the definition's display name.
    label: Option<String>,
    parent: Location,
    /// Where the labware sits, in terms that survive a reload.
    placement: String,
    /// Corner offset from the slot plus the parent point.
    offset: Point,
    calibration: Point,
    wells: Vec<Well>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
    #[serde(skip)]
    rows: Vec<(String, Vec<usize>)>,
    #[serde(skip)]
    columns: Vec<(String, Vec<usize>)>,
    /// Physical columns as ranges of well indices, from `ordering`.
    #[serde(skip)]
    spans: Vec<Range<usize>>,
    #[serde(skip)]
    span_of: Vec<usize>,
    is_tiprack: bool,
}

fn push_group(groups: &mut Vec<(String, Vec<usize>)>, key: &str, index: usize) {
    match groups.iter_mut().find(|(k, _)| k == key) {
        Some((_, members)) => members.push(index),
        None => groups.push((key.to_string(), vec![index])),
    }
}

impl Labware {
    /// Builds a labware from `definition` with its front-left corner placed
    /// relative to `parent`.
    ///
    /// Every well starts with a tip exactly when the definition is a tiprack.
    pub fn new(
        definition: LabwareDefinition,
        parent: Location,
        label: Option<&str>,
    ) -> Result<Self> {
        let id = LabwareId::fresh();
        let is_tiprack = definition.parameters.is_tiprack;
        let offset = Point::from(definition.corner_offset_from_slot) + parent.point;
        let display = label.unwrap_or(&definition.metadata.display_name).to_string();
        let invalid = |reason: String| LabwareError::Validation {
            subject: display.clone(),
            reason,
        };

        let mut wells = Vec::new();
        let mut by_name = HashMap::new();
        let mut rows = Vec::new();
        let mut columns = Vec::new();
        let mut spans = Vec::with_capacity(definition.ordering.len());
        let mut span_of = Vec::new();

        for (span_index, column) in definition.ordering.iter().enumerate() {
            let span_start = wells.len();
            for name in column {
                let Some((row_key, column_key)) = split_well_name(name) else {
                    return Err(invalid(format!(
                        "well name `{name}` is not a row letter and column number"
                    )));
                };
                let well_def = definition.wells.get(name).ok_or_else(|| {
                    invalid(format!(
                        "ordering lists `{name}` but no such well is defined"
                    ))
                })?;
                let index = wells.len();
                if by_name.insert(name.clone(), index).is_some() {
                    return Err(invalid(format!(
                        "well `{name}` appears twice in ordering"
                    )));
                }
                let well_parent = Location::new(offset, id);
                let mut well = Well::new(well_def, well_parent, name.as_str(), is_tiprack)?;
                well.attach(index, &display);
                wells.push(well);
                span_of.push(span_index);
                push_group(&mut rows, row_key, index);
                push_group(&mut columns, column_key, index);
            }
            spans.push(span_start..wells.len());
        }

        Ok(Self {
            id,
            definition,
            label: label.map(str::to_string),
            placement: parent.owner.stable_name().to_string(),
            parent,
            offset,
            calibration: Point::ZERO,
            wells,
            by_name,
            rows,
            columns,
            spans,
            span_of,
            is_tiprack,
        })
    }

    /// Replaces the placement used to key stored calibration (builder pattern).
    pub fn with_placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = placement.into();
        self
    }

    /// Identity unique to this construction.
    pub fn id(&self) -> LabwareId {
        self.id
    }

    /// The definition this labware was built from.
    pub fn definition(&self) -> &LabwareDefinition {
        &self.definition
    }

    /// The user label if one was given, otherwise the load name.
    pub fn name(&self) -> &str {
        match &self.label {
            Some(label) => label.as_str(),
            None if !self.definition.parameters.load_name.is_empty() => {
                self.definition.parameters.load_name.as_str()
            }
            None => self.definition.metadata.display_name.as_str(),
        }
    }

    /// The user label if one was given, otherwise the definition's display name.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .unwrap_or(&self.definition.metadata.display_name)
    }

    /// The definition's `loadName`; empty for definitions that lack one.
    pub fn load_name(&self) -> &str {
        &self.definition.parameters.load_name
    }

    /// `namespace/loadName/version` of the definition.
    pub fn uri(&self) -> String {
        uri_from_definition(&self.definition)
    }

    /// The definition's `parameters` block.
    pub fn parameters(&self) -> &LabwareParameters {
        &self.definition.parameters
    }

    /// Outer dimensions of the labware in millimetres.
    pub fn dimensions(&self) -> LabwareDimensions {
        self.definition.dimensions
    }

    /// Behaviour flags the definition declares.
    pub fn quirks(&self) -> &[String] {
        &self.definition.parameters.quirks
    }

    /// True when wells hold tips rather than liquid.
    pub fn is_tiprack(&self) -> bool {
        self.is_tiprack
    }

    /// Length of the tips held by a tip rack, in millimetres.
    pub fn tip_length(&self) -> Option<f64> {
        self.definition.parameters.tip_length
    }

    /// Magnet height the definition recommends when on a magnetic module.
    pub fn magdeck_engage_height(&self) -> Option<f64> {
        self.definition.parameters.magnetic_module_engage_height
    }

    /// The location this labware was placed relative to.
    pub fn parent(&self) -> &Location {
        &self.parent
    }

    /// Stable description of where the labware sits.
    ///
    /// Defaults to the parent's label; labware loaded onto a module carries
    /// the module model and the module's slot instead.
    pub fn placement(&self) -> &str {
        &self.placement
    }

    /// The calibrated front-left corner, owned by this labware.
    pub fn location(&self) -> Location {
        Location::new(self.calibrated_offset(), self.id)
    }

    /// Corner offset plus parent point plus calibration delta.
    pub fn calibrated_offset(&self) -> Point {
        self.offset + self.calibration
    }

    /// The calibration delta currently applied.
    pub fn calibration(&self) -> Point {
        self.calibration
    }

    /// Replaces the calibration delta and moves every well with it.
    pub fn set_calibration(&mut self, delta: Point) {
        self.calibration = delta;
        let point = self.calibrated_offset();
        for well in &mut self.wells {
            well.set_parent_point(point);
        }
    }

    /// Top of the labware in deck coordinates.
    pub fn highest_z(&self) -> f64 {
        self.definition.dimensions.z_dimension + self.calibrated_offset().z
    }

    // --- Addressing ---

    /// Every well in physical order.
    pub fn all_wells(&self) -> &[Well] {
        &self.wells
    }

    /// Number of wells.
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Resolves any mix of selectors.
    ///
    /// No selectors yields every well; a single name or index yields
    /// [`Selection::One`]; anything else yields the flattened list in the
    /// order given.
    pub fn wells(&self, selectors: &[WellSelector]) -> Result<Selection<&Well>> {
        match selectors {
            [] => Ok(Selection::Many(self.wells.iter().collect())),
            [single] if single.is_single() => {
                let index = self.resolve_one(single, "wells")?;
                Ok(Selection::One(&self.wells[index]))
            }
            many => {
                let mut indices = Vec::new();
                for selector in many {
                    self.resolve_into(selector, &mut indices)?;
                }
                Ok(Selection::Many(indices.into_iter().map(|i| &self.wells[i]).collect()))
            }
        }
    }

    /// Looks up exactly one well by name or index.
    pub fn well(&self, selector: impl Into<WellSelector>) -> Result<&Well> {
        let index = self.resolve_one(&selector.into(), "well")?;
        Ok(&self.wells[index])
    }

    /// Mutable access to one well, for example to mark a tip as taken by hand.
    pub fn well_mut(&mut self, selector: impl Into<WellSelector>) -> Result<&mut Well> {
        let index = self.resolve_one(&selector.into(), "well_mut")?;
        Ok(&mut self.wells[index])
    }

    /// Looks up a well by identity, checking it belongs to this labware.
    pub fn well_by_id(&self, id: WellId) -> Result<&Well> {
        let index = self.owned_index(id, "well_by_id")?;
        Ok(&self.wells[index])
    }

    /// Position of the named well in physical order.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| LabwareError::UnknownWell {
                labware: self.to_string(),
                name: name.to_string(),
            })
    }

    /// Every well keyed by its name.
    pub fn wells_by_name(&self) -> HashMap<&str, &Well> {
        self.wells.iter().map(|w| (w.name(), w)).collect()
    }

    fn resolve_one(&self, selector: &WellSelector, operation: &'static str) -> Result<usize> {
        match selector {
            WellSelector::Name(name) => self.index_of(name),
            WellSelector::Index(index) if *index < self.wells.len() => Ok(*index),
            WellSelector::Index(index) => Err(LabwareError::IndexOutOfRange {
                labware: self.to_string(),
                index: *index,
                len: self.wells.len(),
            }),
            other => Err(LabwareError::InvalidSelector {
                labware: self.to_string(),
                operation,
                reason: format!("expected a well name or index, got {other:?}"),
            }),
        }
    }

    fn resolve_into(&self, selector: &WellSelector, out: &mut Vec<usize>) -> Result<()> {
        match selector {
            WellSelector::Name(_) | WellSelector::Index(_) => {
                out.push(self.resolve_one(selector, "wells")?);
            }
            WellSelector::Slice { start, stop, step } => {
                if *step == 0 {
                    return Err(LabwareError::InvalidSelector {
                        labware: self.to_string(),
                        operation: "wells",
                        reason: "slice step cannot be zero".to_string(),
                    });
                }
                let len = self.wells.len();
                let stop = stop.unwrap_or(len).min(len);
                let start = start.unwrap_or(0).min(stop);
                out.extend((start..stop).step_by(*step));
            }
            WellSelector::List(items) => {
                for item in items {
                    self.resolve_into(item, out)?;
                }
            }
        }
        Ok(())
    }

    /// Rows keyed by letter, in the order they first appear.
    pub fn rows(&self, keys: &[GroupKey]) -> Result<Selection<Vec<&Well>>> {
        self.select_groups(&self.rows, keys, "row")
    }

    /// Columns keyed by number, left to right.
    pub fn columns(&self, keys: &[GroupKey]) -> Result<Selection<Vec<&Well>>> {
        self.select_groups(&self.columns, keys, "column")
    }

    /// Every row with its letter, top to bottom.
    pub fn rows_by_name(&self) -> Vec<(&str, Vec<&Well>)> {
        self.named_groups(&self.rows)
    }

    /// Every column with its number, left to right.
    pub fn columns_by_name(&self) -> Vec<(&str, Vec<&Well>)> {
        self.named_groups(&self.columns)
    }

    fn named_groups<'a>(
        &'a self,
        groups: &'a [(String, Vec<usize>)],
    ) -> Vec<(&'a str, Vec<&'a Well>)> {
        groups
            .iter()
            .map(|(key, members)| (key.as_str(), self.members(members)))
            .collect()
    }

    fn members(&self, members: &[usize]) -> Vec<&Well> {
        members.iter().map(|&i| &self.wells[i]).collect()
    }

    fn lookup_group(
        &self,
        groups: &[(String, Vec<usize>)],
        key: &GroupKey,
        kind: &'static str,
    ) -> Result<Vec<&Well>> {
        let found = match key {
            GroupKey::Name(name) => groups.iter().find(|(k, _)| k == name),
            GroupKey::Index(index) => groups.get(*index),
        };
        match found {
            Some((_, members)) => Ok(self.members(members)),
            None => Err(LabwareError::UnknownGroup {
                labware: self.to_string(),
                kind,
                key: match key {
                    GroupKey::Name(name) => name.clone(),
                    GroupKey::Index(index) => format!("#{index}"),
                },
            }),
        }
    }

    fn select_groups(
        &self,
        groups: &[(String, Vec<usize>)],
        keys: &[GroupKey],
        kind: &'static str,
    ) -> Result<Selection<Vec<&Well>>> {
        match keys {
            [] => Ok(Selection::Many(
                groups.iter().map(|(_, members)| self.members(members)).collect(),
            )),
            [single] => Ok(Selection::One(self.lookup_group(groups, single, kind)?)),
            many => Ok(Selection::Many(
                many.iter()
                    .map(|key| self.lookup_group(groups, key, kind))
                    .collect::<Result<_>>()?,
            )),
        }
    }

    // --- Tip engine ---

    fn owned_index(&self, id: WellId, operation: &'static str) -> Result<usize> {
        if id.labware != self.id || id.index >= self.wells.len() {
            return Err(LabwareError::ForeignWell {
                labware: self.to_string(),
                well: LocationOwner::Well(id).to_string(),
                operation,
            });
        }
        Ok(id.index)
    }

    fn check_channels(&self, channels: usize, operation: &'static str) -> Result<()> {
        if channels == 0 {
            return Err(LabwareError::InvalidSelector {
                labware: self.to_string(),
                operation,
                reason: "channel count must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn tip_error(&self, index: usize, operation: &'static str, reason: String) -> LabwareError {
        LabwareError::TipState {
            labware: self.to_string(),
            well: self.wells[index].name().to_string(),
            operation,
            reason,
        }
    }

    /// The physical column containing well `index`.
    fn span(&self, index: usize) -> Range<usize> {
        self.spans[self.span_of[index]].clone()
    }

    /// Marks `channels` wells down the column from `start` as used.
    ///
    /// Fails without touching any well unless all of them exist in that
    /// column and still hold tips.
    pub fn use_tips(&mut self, start: WellId, channels: usize) -> Result<()> {
        self.check_channels(channels, "use_tips")?;
        let first = self.owned_index(start, "use_tips")?;
        let span = self.span(first);
        let end = first + channels;
        if end > span.end {
            return Err(self.tip_error(
                first,
                "use_tips",
                format!(
                    "{channels} channels requested but only {} wells remain in the column",
                    span.end - first
                ),
            ));
        }
        if let Some(empty) = (first..end).find(|&i| !self.wells[i].has_tip()) {
            return Err(self.tip_error(
                first,
                "use_tips",
                format!("{} has no tip", self.wells[empty].name()),
            ));
        }
        for well in &mut self.wells[first..end] {
            well.set_has_tip(false);
        }
        debug!(labware = %self, start = self.wells[first].name(), channels, "tips used");
        Ok(())
    }

    /// Puts tips back from `start` down its column.
    ///
    /// Wells past the end of the column are dropped rather than wrapped.
    /// Fails without touching any well if a target already holds a tip.
    pub fn return_tips(&mut self, start: WellId, channels: usize) -> Result<()> {
        self.check_channels(channels, "return_tips")?;
        let first = self.owned_index(start, "return_tips")?;
        let end = (first + channels).min(self.span(first).end);
        if let Some(full) = (first..end).find(|&i| self.wells[i].has_tip()) {
            return Err(self.tip_error(
                first,
                "return_tips",
                format!("{} already has a tip", self.wells[full].name()),
            ));
        }
        for well in &mut self.wells[first..end] {
            well.set_has_tip(true);
        }
        debug!(
            labware = %self,
            start = self.wells[first].name(),
            returned = end - first,
            "tips returned"
        );
        Ok(())
    }

    /// Restores every well to its freshly loaded tip state.
    pub fn reset_tips(&mut self) {
        let is_tiprack = self.is_tiprack;
        for well in &mut self.wells {
            well.set_has_tip(is_tiprack);
        }
    }

    /// First well beginning `channels` contiguous tips within one column.
    pub fn next_tip(&self, channels: usize) -> Option<&Well> {
        self.first_run(channels, 0, true).map(|i| &self.wells[i])
    }

    /// Like [`next_tip`](Self::next_tip), but ignoring every well before `start`.
    pub fn next_tip_from(&self, channels: usize, start: WellId) -> Result<Option<&Well>> {
        let from = self.owned_index(start, "next_tip")?;
        Ok(self.first_run(channels, from, true).map(|i| &self.wells[i]))
    }

    /// First well beginning `channels` contiguous empty slots within one column.
    pub fn previous_tip(&self, channels: usize) -> Option<&Well> {
        self.first_run(channels, 0, false).map(|i| &self.wells[i])
    }

    fn first_run(&self, channels: usize, from: usize, has_tip: bool) -> Option<usize> {
        if channels == 0 || from >= self.wells.len() {
            return None;
        }
        let first_span = self.span_of[from];
        for span in &self.spans[first_span..] {
            let mut run_start = span.start.max(from);
            for i in run_start..span.end {
                if self.wells[i].has_tip() != has_tip {
                    run_start = i + 1;
                } else if i + 1 - run_start == channels {
                    return Some(run_start);
                }
            }
        }
        None
    }
}

impl Clone for Labware {
    fn clone(&self) -> Self {
        let id = LabwareId::fresh();
        let wells = self
            .wells
            .iter()
            .map(|well| {
                let mut well = well.clone();
                well.reattach(id);
                well
            })
            .collect();
        Self {
            id,
            definition: self.definition.clone(),
            label: self.label.clone(),
            parent: self.parent.clone(),
            placement: self.placement.clone(),
            offset: self.offset,
            calibration: self.calibration,
            wells,
            by_name: self.by_name.clone(),
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            spans: self.spans.clone(),
            span_of: self.span_of.clone(),
            is_tiprack: self.is_tiprack,
        }
    }
}

impl PartialEq for Labware {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Labware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.display_name(), self.parent.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{LabwareMetadata, Offset, WellDefinition, WellShapeKind};
    use std::collections::BTreeMap;

    /// A 2x3 rack: columns 1..=3, rows A and B.
    fn small_rack(is_tiprack: bool) -> Labware {
        let mut wells = BTreeMap::new();
        let mut ordering = Vec::new();
        for col in 1..=3 {
            let mut column = Vec::new();
            for (r, row) in ["A", "B"].iter().enumerate() {
                let name = format!("{row}{col}");
                wells.insert(
                    name.clone(),
                    WellDefinition {
                        shape: WellShapeKind::Circular,
                        depth: 10.0,
                        total_liquid_volume: 50.0,
                        diameter: Some(5.0),
                        x_dimension: None,
                        y_dimension: None,
                        x: col as f64 * 9.0,
                        y: 20.0 - r as f64 * 9.0,
                        z: 1.0,
                    },
                );
                column.push(name);
            }
            ordering.push(column);
        }
        let definition = LabwareDefinition {
            wells,
            ordering,
            parameters: LabwareParameters {
                is_tiprack,
                load_name: "small_rack".into(),
                ..Default::default()
            },
            dimensions: LabwareDimensions {
                x_dimension: 40.0,
                y_dimension: 30.0,
                z_dimension: 12.0,
            },
            corner_offset_from_slot: Offset { x: 1.0, y: 1.0, z: 0.0 },
            metadata: LabwareMetadata {
                display_name: "Small Rack".into(),
            },
            namespace: "test".into(),
            version: 1,
        };
        Labware::new(definition, Location::new(Point::new(10.0, 0.0, 0.0), "slot"), None)
            .expect("small rack should build")
    }

    #[test]
    fn wells_follow_ordering() {
        let rack = small_rack(false);
        let names: Vec<_> = rack.all_wells().iter().map(|w| w.name()).collect();
        assert_eq!(names, ["A1", "B1", "A2", "B2", "A3", "B3"]);
    }

    #[test]
    fn slices_clamp_like_sequences() {
        let rack = small_rack(false);
        let picked = rack
            .wells(&[WellSelector::slice(Some(1), Some(100), 2)])
            .unwrap()
            .into_vec();
        let names: Vec<_> = picked.iter().map(|w| w.name()).collect();
        assert_eq!(names, ["B1", "B2", "B3"]);
    }

    #[test]
    fn zero_step_is_rejected() {
        let rack = small_rack(false);
        let err = rack.wells(&[WellSelector::slice(None, None, 0)]).unwrap_err();
        assert!(matches!(err, LabwareError::InvalidSelector { .. }));
    }

    #[test]
    fn well_rejects_group_selectors() {
        let rack = small_rack(false);
        assert!(matches!(
            rack.well(0..2),
            Err(LabwareError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn calibration_moves_wells() {
        let mut rack = small_rack(false);
        let before = rack.well("A1").unwrap().bottom(0.0).point;
        rack.set_calibration(Point::new(0.5, -0.5, 2.0));
        let after = rack.well("A1").unwrap().bottom(0.0).point;
        assert_eq!(after - before, Point::new(0.5, -0.5, 2.0));
        assert_eq!(rack.highest_z(), 14.0);
    }

    #[test]
    fn runs_stay_inside_columns() {
        let mut rack = small_rack(true);
        let b1 = rack.well("B1").unwrap().id();
        assert!(rack.use_tips(b1, 2).is_err());
        assert!(rack.well("B1").unwrap().has_tip());
        let a1 = rack.well("A1").unwrap().id();
        rack.use_tips(a1, 1).unwrap();
        assert_eq!(rack.next_tip(2).map(Well::name), Some("A2"));
    }

    #[test]
    fn foreign_wells_are_rejected() {
        let mut rack = small_rack(true);
        let other = small_rack(true);
        let foreign = other.well("A1").unwrap().id();
        assert!(matches!(
            rack.use_tips(foreign, 1),
            Err(LabwareError::ForeignWell { .. })
        ));
    }

    #[test]
    fn reset_restores_tips() {
        let mut rack = small_rack(true);
        let a2 = rack.well("A2").unwrap().id();
        rack.use_tips(a2, 2).unwrap();
        rack.reset_tips();
        assert!(rack.all_wells().iter().all(Well::has_tip));
    }

    #[test]
    fn clones_get_their_own_identity() {
        let rack = small_rack(true);
        let mut copy = rack.clone();
        assert_ne!(copy.id(), rack.id());
        assert!(copy != rack);
        assert!(copy.all_wells().iter().all(|w| w.id().labware == copy.id()));
        assert_eq!(
            copy.well("A1").unwrap().parent().owner,
            LocationOwner::Labware(copy.id())
        );

        let original_a1 = rack.well("A1").unwrap().id();
        assert!(matches!(
            copy.use_tips(original_a1, 1),
            Err(LabwareError::ForeignWell { .. })
        ));
        let own_a1 = copy.well("A1").unwrap().id();
        copy.use_tips(own_a1, 1).unwrap();
        assert!(rack.well("A1").unwrap().has_tip());
    }

    #[test]
    fn placement_defaults_to_parent_label() {
        let rack = small_rack(false);
        assert_eq!(rack.placement(), "slot");
        assert_eq!(rack.with_placement("tempdeck@3").placement(), "tempdeck@3");
    }

    #[test]
    fn duplicate_ordering_is_invalid() {
        let mut def = small_rack(false).definition().clone();
        def.ordering[1][0] = "A1".into();
        let err = Labware::new(def, Location::new(Point::ZERO, "slot"), None).unwrap_err();
        assert!(matches!(err, LabwareError::Validation { .. }));
    }
}
