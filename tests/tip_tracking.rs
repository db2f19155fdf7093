// tests/tip_tracking.rs
mod common;

use common::{origin, plate_96, tiprack_96};
use liquid_labware::{Labware, LabwareError, WellId};

fn tiprack() -> Labware {
    Labware::new(tiprack_96(), origin(), None).expect("tiprack should build")
}

fn id(lw: &Labware, index: usize) -> WellId {
    lw.all_wells()[index].id()
}

fn set_tip(lw: &mut Labware, index: usize, value: bool) {
    lw.well_mut(index).unwrap().set_has_tip(value);
}

fn tip_map(lw: &Labware) -> Vec<bool> {
    lw.all_wells().iter().map(|w| w.has_tip()).collect()
}

#[test]
fn test_tip_tracking_init() {
    let rack = tiprack();
    assert!(rack.is_tiprack());
    assert!(rack.all_wells().iter().all(|w| w.has_tip()));

    let plate = Labware::new(plate_96(), origin(), None).unwrap();
    assert!(!plate.is_tiprack());
    assert!(plate.all_wells().iter().all(|w| !w.has_tip()));
}

#[test]
fn test_use_tips() {
    let mut rack = tiprack();

    // One tip.
    rack.use_tips(id(&rack, 0), 1).unwrap();
    let tips = tip_map(&rack);
    assert!(!tips[0]);
    assert!(tips[1..].iter().all(|&t| t));

    // A whole column.
    rack.use_tips(id(&rack, 8), 8).unwrap();
    let tips = tip_map(&rack);
    assert!(tips[8..16].iter().all(|&t| !t));
    assert!(tips[7]);
    assert!(tips[16]);

    // The top half of a column.
    rack.use_tips(id(&rack, 16), 4).unwrap();
    let tips = tip_map(&rack);
    assert!(tips[16..20].iter().all(|&t| !t));
    assert!(tips[20..24].iter().all(|&t| t));

    // The bottom half of a column.
    rack.use_tips(id(&rack, 28), 4).unwrap();
    let tips = tip_map(&rack);
    assert!(tips[24..28].iter().all(|&t| t));
    assert!(tips[28..32].iter().all(|&t| !t));
    assert!(tips[32..].iter().all(|&t| t));
}

#[test]
fn test_use_tips_needs_a_full_run() {
    let mut rack = tiprack();
    let before = tip_map(&rack);

    // E1 leaves only four wells in the first column.
    let err = rack.use_tips(id(&rack, 4), 8).unwrap_err();
    assert!(matches!(err, LabwareError::TipState { operation: "use_tips", .. }));
    assert_eq!(tip_map(&rack), before);

    // A used tip in the middle of the run blocks it too.
    set_tip(&mut rack, 2, false);
    let before = tip_map(&rack);
    assert!(rack.use_tips(id(&rack, 0), 4).is_err());
    assert_eq!(tip_map(&rack), before);

    // And a used tip cannot be used twice.
    assert!(rack.use_tips(id(&rack, 2), 1).is_err());
}

#[test]
fn test_select_next_tip() {
    let mut rack = tiprack();
    let well = |rack: &Labware, n: usize| rack.next_tip(n).map(|w| w.id().index);

    assert_eq!(well(&rack, 1), Some(0));
    assert_eq!(well(&rack, 5), Some(0));
    assert_eq!(well(&rack, 8), Some(0));
    assert_eq!(well(&rack, 9), None);

    // A1 only.
    rack.use_tips(id(&rack, 0), 1).unwrap();
    assert_eq!(well(&rack, 1), Some(1));
    assert_eq!(well(&rack, 5), Some(1));
    assert_eq!(well(&rack, 8), Some(8));

    // Second column as well.
    rack.use_tips(id(&rack, 8), 8).unwrap();
    assert_eq!(well(&rack, 1), Some(1));
    assert_eq!(well(&rack, 5), Some(1));
    assert_eq!(well(&rack, 8), Some(16));

    // Bottom four of the first column as well.
    rack.use_tips(id(&rack, 4), 4).unwrap();
    assert_eq!(well(&rack, 1), Some(1));
    assert_eq!(well(&rack, 3), Some(1));
    assert_eq!(well(&rack, 5), Some(16));
    assert_eq!(well(&rack, 8), Some(16));
}

#[test]
fn test_next_tip_only_returns_full_runs() {
    let mut rack = tiprack();
    for index in [3, 10, 11, 30, 41, 57, 58, 59, 80] {
        set_tip(&mut rack, index, false);
    }
    let tips = tip_map(&rack);
    for channels in 1..=8 {
        if let Some(well) = rack.next_tip(channels) {
            let start = well.id().index;
            let column_end = (start / 8 + 1) * 8;
            assert!(start + channels <= column_end);
            assert!(tips[start..start + channels].iter().all(|&t| t));
            // Nothing earlier qualifies.
            for earlier in 0..start {
                let end = earlier + channels;
                let fits = end <= (earlier / 8 + 1) * 8 && tips[earlier..end].iter().all(|&t| t);
                assert!(!fits, "{earlier} should have been chosen for {channels}");
            }
        }
    }
}

#[test]
fn test_next_tip_from_skips_earlier_wells() {
    let rack = tiprack();
    let found = rack.next_tip_from(1, id(&rack, 5)).unwrap();
    assert_eq!(found.map(|w| w.name()), Some("F1"));
    // A run that would not fit below the start moves to the next column.
    let found = rack.next_tip_from(4, id(&rack, 5)).unwrap();
    assert_eq!(found.map(|w| w.name()), Some("A2"));
}

#[test]
fn test_previous_tip() {
    let mut rack = tiprack();
    // With every tip present there is no empty slot.
    assert!(rack.previous_tip(1).is_none());

    // One empty well is found wherever it is.
    set_tip(&mut rack, 5, false);
    assert_eq!(rack.previous_tip(1).map(|w| w.id()), Some(id(&rack, 5)));
    assert!(rack.previous_tip(2).is_none());

    // The empties have to be contiguous.
    set_tip(&mut rack, 7, false);
    assert!(rack.previous_tip(2).is_none());

    set_tip(&mut rack, 6, false);
    assert_eq!(rack.previous_tip(3).map(|w| w.id()), Some(id(&rack, 5)));
    assert!(rack.previous_tip(4).is_none());
}

#[test]
fn test_return_tips() {
    let mut rack = tiprack();

    // Every slot is full, so nothing can go back.
    let err = rack.return_tips(id(&rack, 0), 1).unwrap_err();
    assert!(matches!(err, LabwareError::TipState { operation: "return_tips", .. }));

    set_tip(&mut rack, 0, false);
    rack.return_tips(id(&rack, 0), 1).unwrap();
    assert!(rack.all_wells()[0].has_tip());

    // Both targets have to be empty.
    set_tip(&mut rack, 0, false);
    let before = tip_map(&rack);
    assert!(rack.return_tips(id(&rack, 0), 2).is_err());
    assert_eq!(tip_map(&rack), before);

    // Tips past the end of the column are dropped, not wrapped.
    set_tip(&mut rack, 7, false);
    set_tip(&mut rack, 8, false);
    rack.return_tips(id(&rack, 7), 2).unwrap();
    assert!(rack.all_wells()[7].has_tip());
    assert!(!rack.all_wells()[8].has_tip());
}

#[test]
fn test_use_then_return_round_trips() {
    let mut rack = tiprack();
    set_tip(&mut rack, 40, false);
    let before = tip_map(&rack);

    rack.use_tips(id(&rack, 17), 6).unwrap();
    rack.return_tips(id(&rack, 17), 6).unwrap();
    assert_eq!(tip_map(&rack), before);
}

#[test]
fn test_zero_channels_rejected() {
    let mut rack = tiprack();
    assert!(matches!(
        rack.use_tips(id(&rack, 0), 0),
        Err(LabwareError::InvalidSelector { .. })
    ));
    assert!(rack.next_tip(0).is_none());
}
