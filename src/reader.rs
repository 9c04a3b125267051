//! Parsing of concatenated legacy+64-bit tzfile records.
//!
//! A record is two sections back to back: the legacy section with 32-bit
//! transition instants, then the 64-bit section with the same layout but
//! wider instants. Only the 64-bit section is parsed; the legacy section is
//! skipped using its header counts, read just far enough to validate the
//! magic and version bytes. All multi-byte integers are big-endian.

use alloc::vec::Vec;

use crate::error::{TzFileError, TzFileErrorKind};
use crate::zone::ZoneInfoData;

/// `"TZif"` as a big-endian 32-bit integer.
const TZ_MAGIC: i32 = 0x545a_6966;

/// Upper bound on transitions per zone. Real zones stay well under this;
/// anything near the cap indicates corrupt data.
const MAX_TRANSITIONS: i32 = 2_000;

/// Type indices are single bytes, so more types than this cannot be
/// referenced.
const MAX_TYPES: i32 = 256;

/// Parses one tzfile record into a [`ZoneInfoData`] for the zone `id`.
///
/// `data` must hold a complete record starting at the legacy header. Any
/// structural violation rejects the whole record; see
/// [`TzFileErrorKind`] for the individual checks.
pub fn read_zone_info(id: &str, data: &[u8]) -> Result<ZoneInfoData, TzFileError> {
    let mut cursor = Cursor::new(id, data);

    // Legacy section: validate the header, then step over the body using
    // the counts alone.
    let legacy_header = Header::read(&mut cursor)?;
    cursor.skip(legacy_header.legacy_body_len())?;

    // 64-bit section: a second identical header, then the data we want.
    let header = Header::read(&mut cursor)?;
    let transition_count =
        checked_count(id, "transitions", header.timecnt, 0, MAX_TRANSITIONS)?;
    let type_count = checked_count(id, "types", header.typecnt, 1, MAX_TYPES)?;

    let mut transitions = Vec::with_capacity(transition_count);
    for index in 0..transition_count {
        let instant = cursor.read_be_i64()?;
        if let Some(&previous) = transitions.last() {
            if instant <= previous {
                return Err(TzFileError::new(
                    id,
                    TzFileErrorKind::NonMonotonicTransition {
                        index,
                        value: instant,
                        previous,
                    },
                ));
            }
        }
        transitions.push(instant);
    }

    let mut types = Vec::with_capacity(transition_count);
    for index in 0..transition_count {
        let type_index = cursor.read_u8()?;
        if usize::from(type_index) >= type_count {
            return Err(TzFileError::new(
                id,
                TzFileErrorKind::TypeIndexOutOfRange {
                    index,
                    type_index,
                    type_count,
                },
            ));
        }
        types.push(type_index);
    }

    let mut offsets = Vec::with_capacity(type_count);
    let mut is_dsts = Vec::with_capacity(type_count);
    for index in 0..type_count {
        offsets.push(cursor.read_be_i32()?);
        let is_dst = cursor.read_u8()?;
        if is_dst > 1 {
            return Err(TzFileError::new(
                id,
                TzFileErrorKind::InvalidIsDst {
                    index,
                    value: is_dst,
                },
            ));
        }
        is_dsts.push(is_dst == 1);
        // The abbreviation index; abbreviation text is never needed.
        cursor.read_u8()?;
    }

    // The abbreviation table, leap seconds, indicator bytes and the TZ
    // footer string follow but nothing in them is used.

    ZoneInfoData::try_new(id, transitions, types, offsets, is_dsts)
}

/// The fixed-size section header shared by both sections.
struct Header {
    ttisgmtcnt: i32,
    ttisstdcnt: i32,
    leapcnt: i32,
    timecnt: i32,
    typecnt: i32,
    charcnt: i32,
}

impl Header {
    fn read(cursor: &mut Cursor<'_>) -> Result<Self, TzFileError> {
        let magic = cursor.read_be_i32()?;
        if magic != TZ_MAGIC {
            return Err(TzFileError::new(
                cursor.zone,
                TzFileErrorKind::InvalidMagic(magic),
            ));
        }
        let version = cursor.read_u8()?;
        if version != b'2' && version != b'3' {
            return Err(TzFileError::new(
                cursor.zone,
                TzFileErrorKind::UnsupportedVersion(version),
            ));
        }
        cursor.skip(15)?;

        let header = Self {
            ttisgmtcnt: cursor.read_be_i32()?,
            ttisstdcnt: cursor.read_be_i32()?,
            leapcnt: cursor.read_be_i32()?,
            timecnt: cursor.read_be_i32()?,
            typecnt: cursor.read_be_i32()?,
            charcnt: cursor.read_be_i32()?,
        };
        // Negative counts would corrupt the skip arithmetic.
        for (field, count) in [
            ("UT/local indicators", header.ttisgmtcnt),
            ("standard/wall indicators", header.ttisstdcnt),
            ("leap seconds", header.leapcnt),
            ("transitions", header.timecnt),
            ("types", header.typecnt),
            ("abbreviation chars", header.charcnt),
        ] {
            if count < 0 {
                return Err(TzFileError::new(
                    cursor.zone,
                    TzFileErrorKind::InvalidCount { field, count },
                ));
            }
        }
        Ok(header)
    }

    /// The length of the legacy section's body: 32-bit transitions plus
    /// type indices, type records, abbreviation text, 8-byte leap entries
    /// and the two indicator tables.
    fn legacy_body_len(&self) -> usize {
        self.timecnt as usize * 5
            + self.typecnt as usize * 6
            + self.charcnt as usize
            + self.leapcnt as usize * 8
            + self.ttisstdcnt as usize
            + self.ttisgmtcnt as usize
    }
}

/// Validates a count against its format-level bounds, returning it as a
/// length.
fn checked_count(
    zone: &str,
    field: &'static str,
    count: i32,
    min: i32,
    max: i32,
) -> Result<usize, TzFileError> {
    if count < min || count > max {
        return Err(TzFileError::new(
            zone,
            TzFileErrorKind::InvalidCount { field, count },
        ));
    }
    Ok(count as usize)
}

/// Bounded single-pass reader over a record. No backtracking; every read
/// past the end is a `Truncated` error.
struct Cursor<'a> {
    zone: &'a str,
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(zone: &'a str, data: &'a [u8]) -> Self {
        Self {
            zone,
            data,
            position: 0,
        }
    }

    fn truncated(&self) -> TzFileError {
        TzFileError::new(self.zone, TzFileErrorKind::Truncated)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], TzFileError> {
        let end = self.position.checked_add(len).ok_or_else(|| self.truncated())?;
        let bytes = self.data.get(self.position..end).ok_or_else(|| self.truncated())?;
        self.position = end;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<(), TzFileError> {
        self.take(len).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, TzFileError> {
        Ok(self.take(1)?[0])
    }

    fn read_be_i32(&mut self) -> Result<i32, TzFileError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_be_i64(&mut self) -> Result<i64, TzFileError> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }
}
