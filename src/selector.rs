//! Selector types accepted by the addressing methods of [`Labware`](crate::Labware).

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

/// One addressing term for [`Labware::wells`](crate::Labware::wells).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WellSelector {
    /// A well name such as `"B2"`.
    Name(String),
    /// A zero-based position in physical (column-major) order.
    Index(usize),
    /// A half-open range of positions with a positive stride.
    Slice {
        start: Option<usize>,
        stop: Option<usize>,
        step: usize,
    },
    /// A nested group, flattened in order.
    List(Vec<WellSelector>),
}

impl WellSelector {
    pub fn slice(start: Option<usize>, stop: Option<usize>, step: usize) -> Self {
        Self::Slice { start, stop, step }
    }

    /// True when this selector can only ever resolve to one well.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Name(_) | Self::Index(_))
    }
}

impl From<&str> for WellSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for WellSelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for WellSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Range<usize>> for WellSelector {
    fn from(r: Range<usize>) -> Self {
        Self::slice(Some(r.start), Some(r.end), 1)
    }
}

impl From<RangeInclusive<usize>> for WellSelector {
    fn from(r: RangeInclusive<usize>) -> Self {
        Self::slice(Some(*r.start()), Some(*r.end() + 1), 1)
    }
}

impl From<RangeFrom<usize>> for WellSelector {
    fn from(r: RangeFrom<usize>) -> Self {
        Self::slice(Some(r.start), None, 1)
    }
}

impl From<RangeTo<usize>> for WellSelector {
    fn from(r: RangeTo<usize>) -> Self {
        Self::slice(None, Some(r.end), 1)
    }
}

impl From<RangeFull> for WellSelector {
    fn from(_: RangeFull) -> Self {
        Self::slice(None, None, 1)
    }
}

impl<T: Into<WellSelector>> From<Vec<T>> for WellSelector {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// A row or column key for [`Labware::rows`](crate::Labware::rows) and
/// [`Labware::columns`](crate::Labware::columns).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupKey {
    /// A row letter (`"A"`) or column number (`"3"`).
    Name(String),
    /// A zero-based position among the groups.
    Index(usize),
}

impl From<&str> for GroupKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for GroupKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// The result of an addressing call: either one item or an ordered list.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Selection<T> {
    /// The single item, if exactly one was selected by a single-item selector.
    pub fn one(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// Every selected item in order, regardless of shape.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Selection<U> {
        match self {
            Self::One(item) => Selection::One(f(item)),
            Self::Many(items) => Selection::Many(items.into_iter().map(f).collect()),
        }
    }
}

/// Splits a well name into its row letters and column number.
///
/// Returns `None` unless the name matches `[A-Z]+[1-9][0-9]*`.
pub fn split_well_name(name: &str) -> Option<(&str, &str)> {
    let split = name.find(|c: char| !c.is_ascii_uppercase())?;
    let (row, column) = name.split_at(split);
    let mut digits = column.chars();
    let first = digits.next()?;
    if row.is_empty() || !('1'..='9').contains(&first) || !digits.all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((row, column))
}
