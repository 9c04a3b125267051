//! The `tzfile_rs` crate parses IANA tzfile time zone records and resolves
//! local wall-clock times against them.
//!
//! Three layers build on each other: [`reader`] parses a concatenated
//! legacy+64-bit tzfile record into an immutable [`ZoneInfoData`] transition
//! table; [`ZoneInfoData`] answers "what UTC offset applies at instant X"
//! and related queries; and [`WallTime`] converts between broken-down local
//! date/time fields and Unix-epoch instants, including the ambiguous
//! ("fall back" overlap) and non-existent ("spring forward" gap) wall times
//! that occur at DST transitions. [`CountryTimeZones`] sits alongside,
//! mapping ISO country codes to prioritized zone lists with offset-based
//! disambiguation.
//!
//! ```rust
//! use tzfile_rs::{DstState, WallTime, ZoneInfoData};
//!
//! // America/Los_Angeles across the 2007 DST transitions.
//! let zone = ZoneInfoData::try_new(
//!     "America/Los_Angeles",
//!     vec![0, 1173607200, 1194166800],
//!     vec![0, 1, 0],
//!     vec![-28800, -25200],
//!     vec![false, true],
//! )
//! .unwrap();
//!
//! let mut wall = WallTime::new();
//! wall.localtime(1194166800 - 1800, &zone).unwrap();
//! assert_eq!((wall.hour, wall.minute), (1, 30));
//! assert_eq!(wall.is_dst, DstState::Daylight);
//!
//! // The same wall time occurred again an hour later, in standard time.
//! wall.is_dst = DstState::Standard;
//! assert_eq!(wall.mktime(&zone), Some(1194166800 + 1800));
//! ```
//!
//! The byte source for zone records and the country mapping data are
//! supplied by the caller; this crate performs no I/O.

#![no_std]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc
)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod country;
pub mod error;
pub mod reader;
pub mod wall_time;
pub mod zone;

pub(crate) mod utils;

pub use country::{CountryTimeZones, OffsetResult, TimeZoneMapping};
pub use error::{TzFileError, TzFileErrorKind};
pub use reader::read_zone_info;
pub use wall_time::{DstState, WallTime};
pub use zone::{UtcOffsets, ZoneInfoData, ZoneRegistry};

/// Alias for a `Result` carrying a [`TzFileError`].
pub type TzFileResult<T> = core::result::Result<T, TzFileError>;
