//! Older addressing conventions layered over a current [`Labware`].
//!
//! The legacy scheme addresses wells by grid coordinates and by
//! start/stop/step/length ranges that wrap past the last well back to the
//! first, which circular dispensing patterns rely on.

use crate::error::{LabwareError, Result};
use crate::labware::Labware;
use crate::selector::{GroupKey, Selection, WellSelector};
use crate::well::Well;
use serde::Serialize;

/// Summary figures older protocols read off a container.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegacyProperties {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub magdeck_engage_height: Option<f64>,
}

/// A range request in the legacy style.
///
/// With [`to`](Self::to), wells run from `start` toward the stop inclusively,
/// and the sign of `step` is corrected to point that way. Without it,
/// `length` wells are taken `step` apart, wrapping around the labware; a
/// negative `length` counts backward but still returns the wells in forward
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeQuery {
    /// First well, by name or index.
    pub start: WellSelector,
    /// Inclusive stop well; when set, `length` is ignored.
    pub to: Option<WellSelector>,
    /// Distance between consecutive wells; never zero.
    pub step: isize,
    /// Number of wells to take when there is no stop; negative counts backward.
    pub length: isize,
}

impl Default for RangeQuery {
    fn default() -> Self {
        Self {
            start: WellSelector::Index(0),
            to: None,
            step: 1,
            length: 1,
        }
    }
}

impl RangeQuery {
    /// A one-well range at `start`.
    pub fn new(start: impl Into<WellSelector>) -> Self {
        Self {
            start: start.into(),
            ..Default::default()
        }
    }

    /// Walk toward `stop` instead of counting wells.
    pub fn to(mut self, stop: impl Into<WellSelector>) -> Self {
        self.to = Some(stop.into());
        self
    }

    /// Take every `step`-th well.
    pub fn step(mut self, step: isize) -> Self {
        self.step = step;
        self
    }

    /// Take `length` wells; negative values count backward from `start`.
    pub fn length(mut self, length: isize) -> Self {
        self.length = length;
        self
    }
}

/// Legacy addressing over a labware it owns.
#[derive(Clone, Debug)]
pub struct LegacyLabware {
    labware: Labware,
    /// Computed once from the labware's definition.
    properties: LegacyProperties,
}

impl LegacyLabware {
    /// Wraps `labware`, deriving its legacy properties.
    pub fn new(labware: Labware) -> Self {
        let dims = labware.dimensions();
        let properties = LegacyProperties {
            length: dims.x_dimension,
            width: dims.y_dimension,
            height: dims.z_dimension,
            type_name: labware.display_name().to_string(),
            magdeck_engage_height: labware.magdeck_engage_height(),
        };
        Self {
            labware,
            properties,
        }
    }

    /// The wrapped labware, for current-style addressing.
    pub fn labware(&self) -> &Labware {
        &self.labware
    }

    /// Mutable access to the wrapped labware, e.g. for tip tracking.
    pub fn labware_mut(&mut self) -> &mut Labware {
        &mut self.labware
    }

    /// Unwraps the labware, dropping the legacy view.
    pub fn into_inner(self) -> Labware {
        self.labware
    }

    /// Summary figures older protocols read off a container.
    pub fn properties(&self) -> &LegacyProperties {
        &self.properties
    }

    /// Position of the named well in physical order.
    pub fn get_index_by_name(&self, name: &str) -> Result<usize> {
        self.labware.index_of(name)
    }

    pub fn well(&self, name: &str) -> Result<&Well> {
        self.labware.well(name)
    }

    pub fn wells(&self, selectors: &[WellSelector]) -> Result<Selection<&Well>> {
        self.labware.wells(selectors)
    }

    pub fn rows(&self, keys: &[GroupKey]) -> Result<Selection<Vec<&Well>>> {
        self.labware.rows(keys)
    }

    pub fn columns(&self, keys: &[GroupKey]) -> Result<Selection<Vec<&Well>>> {
        self.labware.columns(keys)
    }

    /// Alias of [`columns`](Self::columns).
    pub fn cols(&self, keys: &[GroupKey]) -> Result<Selection<Vec<&Well>>> {
        self.columns(keys)
    }

    /// Grid addressing: `x` picks a column, `y` a row, both pick one well.
    pub fn wells_xy(&self, x: Option<usize>, y: Option<usize>) -> Result<Selection<&Well>> {
        match (x, y) {
            (None, Some(y)) => {
                let row = self.labware.rows(&[GroupKey::Index(y)])?;
                Ok(Selection::Many(self.group(row)))
            }
            (Some(x), None) => {
                let column = self.labware.columns(&[GroupKey::Index(x)])?;
                Ok(Selection::Many(self.group(column)))
            }
            (Some(x), Some(y)) => {
                let column = self.group(self.labware.columns(&[GroupKey::Index(x)])?);
                let len = column.len();
                column
                    .get(y)
                    .copied()
                    .map(Selection::One)
                    .ok_or_else(|| LabwareError::IndexOutOfRange {
                        labware: self.labware.to_string(),
                        index: y,
                        len,
                    })
            }
            (None, None) => Err(self.invalid("wells_xy", "expects at least one of x and y")),
        }
    }

    fn group<'a>(&self, selection: Selection<Vec<&'a Well>>) -> Vec<&'a Well> {
        selection.into_vec().into_iter().flatten().collect()
    }

    fn invalid(&self, operation: &'static str, reason: &str) -> LabwareError {
        LabwareError::InvalidSelector {
            labware: self.labware.to_string(),
            operation,
            reason: reason.to_string(),
        }
    }

    fn position(&self, selector: &WellSelector) -> Result<usize> {
        if !selector.is_single() {
            return Err(self.invalid("wells_range", "range bounds must be a well name or index"));
        }
        Ok(self.labware.well(selector.clone())?.id().index)
    }

    /// Resolves a legacy range into well positions.
    pub fn range_indices(&self, query: &RangeQuery) -> Result<Vec<usize>> {
        if query.step == 0 {
            return Err(self.invalid("wells_range", "step cannot be zero"));
        }
        let count = self.labware.len() as isize;
        let start = self.position(&query.start)? as isize;
        let stride = query.step.abs();

        if let Some(stop) = &query.to {
            let stop = self.position(stop)? as isize;
            let step = if stop >= start { stride } else { -stride };
            let walked = (0..)
                .map(|k| start + k * step)
                .take_while(|&i| if step > 0 { i <= stop } else { i >= stop })
                .map(|i| i as usize)
                .collect();
            return Ok(walked);
        }

        let (length, step, backward) = if query.length < 0 {
            (-query.length, -stride, true)
        } else {
            (query.length, query.step, false)
        };
        let mut indices: Vec<usize> = (0..length)
            .map(|k| (start + k * step).rem_euclid(count) as usize)
            .collect();
        if backward {
            indices.reverse();
        }
        Ok(indices)
    }

    /// Legacy range addressing; a single resolved well comes back unwrapped.
    pub fn wells_range(&self, query: &RangeQuery) -> Result<Selection<&Well>> {
        let wells = self.labware.all_wells();
        let mut picked: Vec<&Well> = self
            .range_indices(query)?
            .into_iter()
            .map(|i| &wells[i])
            .collect();
        if picked.len() == 1 {
            return Ok(Selection::One(picked.remove(0)));
        }
        Ok(Selection::Many(picked))
    }
}
