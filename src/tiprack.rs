//! Choosing which rack the next tip comes from.

use crate::error::{LabwareError, OutOfTipsError, Result};
use crate::geometry::{LocationOwner, WellId};
use crate::labware::Labware;
use crate::well::Well;
use tracing::debug;

/// Finds the first rack, in list order, that can supply `channels` contiguous tips.
///
/// When `starting_well` is given it must belong to the first rack, and the
/// search on that rack resumes at it; later racks are searched from their
/// first well.
pub fn select_tiprack_from_list<'a>(
    racks: &[&'a Labware],
    channels: usize,
    starting_well: Option<WellId>,
) -> Result<(&'a Labware, &'a Well)> {
    let out_of_tips = || {
        LabwareError::from(OutOfTipsError {
            channels,
            racks: racks.iter().map(|r| r.to_string()).collect(),
        })
    };
    let Some((&first, rest)) = racks.split_first() else {
        return Err(out_of_tips());
    };

    let found = match starting_well {
        Some(start) if start.labware != first.id() => {
            return Err(LabwareError::TipSelection {
                well: LocationOwner::Well(start).to_string(),
                rack: first.to_string(),
            });
        }
        Some(start) => first.next_tip_from(channels, start)?,
        None => first.next_tip(channels),
    };
    if let Some(well) = found {
        return Ok((first, well));
    }

    for &rack in rest {
        if let Some(well) = rack.next_tip(channels) {
            debug!(rack = %rack, well = well.name(), "moved on to next tip rack");
            return Ok((rack, well));
        }
    }
    Err(out_of_tips())
}

/// Drops every rack before the one that owns `start`.
pub fn filter_tipracks_to_start<'a>(start: WellId, racks: &[&'a Labware]) -> Vec<&'a Labware> {
    racks
        .iter()
        .copied()
        .skip_while(|rack| rack.id() != start.labware)
        .collect()
}
