//! Error types for tzfile parsing and zone construction.

use alloc::string::String;
use core::fmt;

/// An error raised while parsing a tzfile record or constructing a zone
/// from one.
///
/// Every error names the zone identifier it was raised for; a record that
/// fails any structural check is rejected whole, there is no partially
/// built zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TzFileError {
    zone: String,
    kind: TzFileErrorKind,
}

/// The structural violation behind a [`TzFileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TzFileErrorKind {
    /// The record ended before the advertised data did.
    Truncated,
    /// The four magic bytes were not `"TZif"`.
    InvalidMagic(i32),
    /// The format version byte was not `'2'` or `'3'`.
    UnsupportedVersion(u8),
    /// A header count was negative or exceeded its format-level cap.
    InvalidCount {
        field: &'static str,
        count: i32,
    },
    /// A transition instant was not strictly greater than its predecessor.
    NonMonotonicTransition {
        index: usize,
        value: i64,
        previous: i64,
    },
    /// A transition referenced a type outside the type table.
    TypeIndexOutOfRange {
        index: usize,
        type_index: u8,
        type_count: usize,
    },
    /// A type's is-DST byte was neither 0 nor 1.
    InvalidIsDst { index: usize, value: u8 },
    /// The type table was empty.
    NoOffsetTypes,
    /// The zone has transitions but none of them is a standard-time
    /// transition, so no raw offset can be derived.
    NoStandardTransition,
    /// The transition and type-index tables differ in length.
    MismatchedTableLengths {
        transitions: usize,
        types: usize,
    },
    /// The offset and is-DST tables differ in length.
    MismatchedTypeTables { offsets: usize, is_dsts: usize },
}

impl TzFileError {
    pub(crate) fn new(zone: &str, kind: TzFileErrorKind) -> Self {
        Self {
            zone: String::from(zone),
            kind,
        }
    }

    /// The identifier of the zone the record was being read for.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// The violated invariant.
    pub fn kind(&self) -> &TzFileErrorKind {
        &self.kind
    }
}

impl fmt::Display for TzFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timezone id={}: ", self.zone)?;
        match self.kind {
            TzFileErrorKind::Truncated => write!(f, "record is truncated"),
            TzFileErrorKind::InvalidMagic(value) => {
                write!(f, "has an invalid header={value:#010x}")
            }
            TzFileErrorKind::UnsupportedVersion(value) => {
                write!(
                    f,
                    "has an invalid format version='{}' ({value})",
                    char::from(value)
                )
            }
            TzFileErrorKind::InvalidCount { field, count } => {
                write!(f, "has an invalid number of {field}={count}")
            }
            TzFileErrorKind::NonMonotonicTransition {
                index,
                value,
                previous,
            } => {
                write!(
                    f,
                    "transition at {index} is not sorted correctly, is {value}, previous is {previous}"
                )
            }
            TzFileErrorKind::TypeIndexOutOfRange {
                index,
                type_index,
                type_count,
            } => {
                write!(f, "type at {index} is not < {type_count}, is {type_index}")
            }
            TzFileErrorKind::InvalidIsDst { index, value } => {
                write!(f, "dst at {index} is not 0 or 1, is {value}")
            }
            TzFileErrorKind::NoOffsetTypes => {
                write!(f, "requires at least one offset type but found none")
            }
            TzFileErrorKind::NoStandardTransition => {
                write!(
                    f,
                    "requires at least one non-DST transition when any transition exists but found none"
                )
            }
            TzFileErrorKind::MismatchedTableLengths { transitions, types } => {
                write!(
                    f,
                    "has {transitions} transitions but {types} type indices"
                )
            }
            TzFileErrorKind::MismatchedTypeTables { offsets, is_dsts } => {
                write!(f, "has {offsets} offsets but {is_dsts} is-DST flags")
            }
        }
    }
}

impl core::error::Error for TzFileError {}
