//! Wall-time to instant resolution and its inverse.
//!
//! A wall time maps to zero, one or two instants given rational date/time
//! transitions (rational meaning transitions occur less frequently than the
//! offset differences between them). The instant-to-wall-time direction is
//! always unambiguous.
//!
//! This module deliberately performs its absolute time arithmetic in the
//! signed 32-bit range, mirroring the historical `time_t` limitation of the
//! system it models: dates before late 1901 and after early 2038 fail to
//! resolve rather than silently truncating. Offsets are assumed safe to
//! add, subtract and multiply without overflow checks; absolute times are
//! not.

use alloc::vec;
use alloc::vec::Vec;

use crate::utils;
use crate::zone::ZoneInfoData;

/// No total offset transition in real data shifts the wall clock by more
/// than 24 hours; the radiating search stops once it has looked this far
/// past the target in a given direction.
const MAX_SEARCH_SECONDS: i32 = 24 * 60 * 60;

/// Marker for 32-bit arithmetic overflow, confined to this module and
/// converted to a `None`/unchanged-fields result at the API boundary.
struct Overflow;

fn checked_add_i32(a: i64, b: i32) -> Result<i32, Overflow> {
    i32::try_from(a + i64::from(b)).map_err(|_| Overflow)
}

fn checked_sub_i32(a: i64, b: i32) -> Result<i32, Overflow> {
    i32::try_from(a - i64::from(b)).map_err(|_| Overflow)
}

fn saturating_add_i32(a: i64, b: i32) -> i32 {
    (a + i64::from(b)).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// The daylight-saving state of a wall time.
///
/// Callers set this on [`WallTime`] before `mktime` as an assertion about
/// the wall time they provide; both conversion directions overwrite it
/// with the resolved state on success.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DstState {
    /// No assertion; the first interval matching the wall time wins.
    #[default]
    Unknown,
    Standard,
    Daylight,
}

impl From<bool> for DstState {
    fn from(is_dst: bool) -> Self {
        if is_dst {
            Self::Daylight
        } else {
            Self::Standard
        }
    }
}

/// A mutable "wall time" scratch value, modeled on the C `tm` struct but
/// with a full year rather than years since 1900 and a 0-based month.
///
/// One instance is meant to be reused across many conversions: callers set
/// the input fields, call [`WallTime::localtime`] or [`WallTime::mktime`],
/// and read the resolved fields back. On failure all fields are left
/// untouched. Not for sharing across concurrent conversions; use one
/// instance per thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub year: i32,
    /// 0-based month.
    pub month: i32,
    /// 1-based day of month.
    pub month_day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    /// Derived: day of week, Sunday = 0.
    pub week_day: i32,
    /// Derived: 0-based day of year.
    pub year_day: i32,
    pub is_dst: DstState,
    /// Derived: the total offset from UTC that was applied, in seconds.
    pub gmt_offset_seconds: i32,
}

impl WallTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall time to the local time at `time_seconds` using the
    /// zone provided.
    ///
    /// Going from an instant to a wall time is always unambiguous: exactly
    /// one offset rule is active at any instant. Leap seconds are not
    /// considered. Returns `None` and leaves the fields untouched only when
    /// adding the offset leaves the 32-bit second range.
    pub fn localtime(&mut self, time_seconds: i32, zone: &ZoneInfoData) -> Option<()> {
        let mut offset_seconds = zone.raw_offset_millis() / 1_000;
        let mut is_dst = false;
        if !zone.transitions.is_empty() {
            match zone.find_offset_index_for_seconds(i64::from(time_seconds)) {
                // Before the first recorded transition, which is treated as
                // a transition from non-DST at the earliest known raw
                // offset.
                None => {
                    offset_seconds = zone.earliest_raw_offset_millis() / 1_000;
                }
                Some(type_index) => {
                    offset_seconds += zone.offsets[type_index];
                    is_dst = zone.is_dsts[type_index];
                }
            }
        }

        // Perform the arithmetic that might overflow before touching any
        // field.
        let wall_seconds = checked_add_i32(i64::from(time_seconds), offset_seconds).ok()?;

        self.set_fields_from_wall_seconds(wall_seconds);
        self.is_dst = is_dst.into();
        self.gmt_offset_seconds = offset_seconds;
        Some(())
    }

    /// Resolves the wall time fields against `zone` and returns the
    /// matching instant in seconds since the Unix epoch.
    ///
    /// `is_dst` is read as the caller's assertion: [`DstState::Unknown`]
    /// accepts the first offset interval containing the wall time, which
    /// for an ambiguous "fall back" wall time may be either branch. An
    /// asserted state is matched exactly first; if that fails the assertion
    /// is assumed stale and a second pass looks for an offset adjustment
    /// that lands the wall time inside an interval of the other state.
    ///
    /// Returns `None`, with every field untouched, when the wall time falls
    /// in a "spring forward" gap that both passes fail to resolve, or when
    /// any absolute time arithmetic leaves the 32-bit range.
    pub fn mktime(&mut self, zone: &ZoneInfoData) -> Option<i32> {
        let wall = utils::wall_seconds_from_fields(
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.month_day),
            i64::from(self.hour),
            i64::from(self.minute),
            i64::from(self.second),
        );
        let wall_seconds = i32::try_from(wall).ok()?;
        let raw_offset_seconds = zone.raw_offset_millis() / 1_000;
        let raw_time_seconds =
            checked_sub_i32(i64::from(wall_seconds), raw_offset_seconds).ok()?;

        if zone.transitions.is_empty() {
            // No transition information, just a raw offset for all time.
            if self.is_dst == DstState::Daylight {
                return None;
            }
            self.set_fields_from_wall_seconds(wall_seconds);
            self.is_dst = DstState::Standard;
            self.gmt_offset_seconds = raw_offset_seconds;
            return Some(raw_time_seconds);
        }

        // We cannot know what instant the wall time maps to without the
        // offset, and cannot know the offset without an instant. Estimate
        // an initial transition using the raw offset; that lands on the
        // right offset interval or very close to it.
        let initial_transition_index = match zone.find_transition_index(i64::from(raw_time_seconds))
        {
            Some(index) => index as isize,
            None => -1,
        };

        if self.is_dst == DstState::Unknown {
            // No assertion to honor: the first interval that contains the
            // wall time wins, and a wall time that exists nowhere fails.
            return self
                .wall_time_search(zone, initial_transition_index, wall_seconds, true)
                .unwrap_or(None);
        }

        // With an asserted DST state the search runs twice: first for an
        // interval matching the assertion exactly, then assuming the
        // assertion was stale and adjusting for the offset difference.
        let exact = match self.wall_time_search(zone, initial_transition_index, wall_seconds, true)
        {
            Ok(result) => result,
            Err(Overflow) => return None,
        };
        if exact.is_some() {
            return exact;
        }
        self.wall_time_search(zone, initial_transition_index, wall_seconds, false)
            .unwrap_or(None)
    }

    /// Radiating search for an instant at or close to `wall_time_seconds`.
    ///
    /// Transition indices are visited at increasing distance from the
    /// initial estimate (0, -1, +1, -2, +2, ...) until a direction has
    /// either run out of transitions or searched beyond the 24-hour
    /// wall-clock margin. With `must_match_dst` the interval has to contain
    /// the wall time and satisfy the `is_dst` field; without it, intervals
    /// whose DST state differs from the assertion are probed for an offset
    /// adjustment instead.
    ///
    /// On a match the fields are updated and the instant returned; on no
    /// match the fields are untouched.
    fn wall_time_search(
        &mut self,
        zone: &ZoneInfoData,
        initial_transition_index: isize,
        wall_time_seconds: i32,
        must_match_dst: bool,
    ) -> Result<Option<i32>, Overflow> {
        let mut clamp_top = false;
        let mut clamp_bottom = false;
        let mut loop_count: isize = 0;
        while !(clamp_top && clamp_bottom) {
            // transition_index_delta = 0, -1, 1, -2, 2, ...
            let mut transition_index_delta = (loop_count + 1) / 2;
            if loop_count % 2 == 1 {
                transition_index_delta = -transition_index_delta;
            }
            loop_count += 1;

            if (transition_index_delta > 0 && clamp_top)
                || (transition_index_delta < 0 && clamp_bottom)
            {
                continue;
            }

            let current_transition_index = initial_transition_index + transition_index_delta;
            let Some(interval) = OffsetInterval::create(zone, current_transition_index) else {
                // No transition with this index: stop searching in the
                // current direction.
                clamp_top |= transition_index_delta > 0;
                clamp_bottom |= transition_index_delta < 0;
                continue;
            };

            if must_match_dst {
                if interval.contains_wall_time(wall_time_seconds)
                    && (self.is_dst == DstState::Unknown
                        || self.is_dst == DstState::from(interval.is_dst))
                {
                    // The first interval satisfying the wall time and the
                    // DST requirement wins, which for `Unknown` makes an
                    // ambiguous wall time resolve to whichever branch the
                    // search order reaches first.
                    let total_offset_seconds = interval.total_offset_seconds;
                    let result =
                        checked_sub_i32(i64::from(wall_time_seconds), total_offset_seconds)?;
                    self.set_fields_from_wall_seconds(wall_time_seconds);
                    self.is_dst = interval.is_dst.into();
                    self.gmt_offset_seconds = total_offset_seconds;
                    return Ok(Some(result));
                }
            } else if self.is_dst != DstState::from(interval.is_dst) {
                // An interval of the same DST state as the assertion is
                // deliberately not probed for adjustments; a skipped wall
                // time between two intervals of the asserted state (a
                // DST -> DST or STD -> STD transition) stays unresolvable.
                if let Some(result) = self.try_offset_adjustments(
                    zone,
                    wall_time_seconds,
                    &interval,
                    current_transition_index,
                )? {
                    return Ok(Some(result));
                }
            }

            if transition_index_delta > 0 {
                let past_margin = i64::from(interval.end_wall_seconds)
                    - i64::from(wall_time_seconds)
                    > i64::from(MAX_SEARCH_SECONDS);
                clamp_top |= past_margin;
            } else if transition_index_delta < 0 {
                let past_margin = i64::from(wall_time_seconds)
                    - i64::from(interval.start_wall_seconds)
                    >= i64::from(MAX_SEARCH_SECONDS);
                clamp_bottom |= past_margin;
            }
        }
        Ok(None)
    }

    /// Tries to move the wall time into `target_interval` by compensating
    /// for a stale DST assertion.
    ///
    /// The caller asserted a DST state no containing interval satisfies, so
    /// the wall time was presumably derived from a valid time under an
    /// offset of the asserted state and then mutated out of its interval.
    /// Which offset that was is unknowable, so every offset of the asserted
    /// state is tried: the difference between it and the target interval's
    /// offset is applied, and if the adjusted wall time falls inside the
    /// target interval the adjustment is taken.
    fn try_offset_adjustments(
        &mut self,
        zone: &ZoneInfoData,
        old_wall_time_seconds: i32,
        target_interval: &OffsetInterval,
        transition_index: isize,
    ) -> Result<Option<i32>, Overflow> {
        let asserted_dst = self.is_dst == DstState::Daylight;
        let raw_offset_seconds = zone.raw_offset_millis() / 1_000;
        for offset_delta in offsets_of_type(zone, transition_index, asserted_dst) {
            let candidate_offset_seconds = raw_offset_seconds + offset_delta;
            let adjustment_seconds =
                target_interval.total_offset_seconds - candidate_offset_seconds;
            let adjusted_wall_seconds =
                checked_add_i32(i64::from(old_wall_time_seconds), adjustment_seconds)?;
            if target_interval.contains_wall_time(adjusted_wall_seconds) {
                let result = checked_sub_i32(
                    i64::from(adjusted_wall_seconds),
                    target_interval.total_offset_seconds,
                )?;
                self.set_fields_from_wall_seconds(adjusted_wall_seconds);
                self.is_dst = target_interval.is_dst.into();
                self.gmt_offset_seconds = target_interval.total_offset_seconds;
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn set_fields_from_wall_seconds(&mut self, wall_seconds: i32) {
        let fields = utils::fields_from_wall_seconds(i64::from(wall_seconds));
        self.year = fields.year as i32;
        self.month = i32::from(fields.month);
        self.month_day = i32::from(fields.month_day);
        self.hour = i32::from(fields.hour);
        self.minute = i32::from(fields.minute);
        self.second = i32::from(fields.second);
        self.week_day = i32::from(fields.week_day);
        self.year_day = i32::from(fields.year_day);
    }
}

/// Offset deltas of the requested DST state, nearest to `start_index`
/// first.
///
/// Index -1 stands for the synthetic non-DST interval before the first
/// recorded transition and contributes a delta of 0 when standard offsets
/// are requested. Each type is considered once, at the distance it is first
/// seen.
fn offsets_of_type(zone: &ZoneInfoData, start_index: isize, is_dst: bool) -> Vec<i32> {
    let mut offsets = Vec::with_capacity(zone.offsets.len() + 1);
    let mut seen = vec![false; zone.offsets.len()];

    let mut delta: isize = 0;
    let mut clamp_top = false;
    let mut clamp_bottom = false;
    loop {
        // delta = 1, -1, 2, -2, 3, -3, ...
        delta = -delta;
        if delta >= 0 {
            delta += 1;
        }

        let transition_index = start_index + delta;
        if delta < 0 && transition_index < -1 {
            clamp_bottom = true;
        } else if delta > 0 && transition_index >= zone.types.len() as isize {
            clamp_top = true;
        } else if transition_index == -1 {
            if !is_dst {
                // The synthetic pre-data interval sits at a delta of 0
                // from the raw offset.
                offsets.push(0);
            }
        } else if transition_index >= 0 {
            let type_index = usize::from(zone.types[transition_index as usize]);
            if !seen[type_index] {
                if zone.is_dsts[type_index] == is_dst {
                    offsets.push(zone.offsets[type_index]);
                }
                seen[type_index] = true;
            }
        }

        if clamp_top && clamp_bottom {
            break;
        }
    }
    offsets
}

/// A wall-time view of one timezone offset interval.
///
/// For example, in 2007 in America/Los_Angeles: PST (-8:00) ran until
/// Mar 11, 2:00 AM; PDT (-7:00) from Mar 11, 3:00 AM to Nov 4, 2:00 AM;
/// then PST again from Nov 4, 1:00 AM. So there was a gap of wall time
/// when PDT started and an overlap when it ended.
///
/// Wall-time values are stored as the seconds since the Unix epoch that
/// show that time *in UTC*; subtract `total_offset_seconds` to get the
/// actual instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OffsetInterval {
    /// Inclusive start, in wall-time seconds.
    start_wall_seconds: i32,
    /// Exclusive end, in wall-time seconds.
    end_wall_seconds: i32,
    is_dst: bool,
    total_offset_seconds: i32,
}

impl OffsetInterval {
    /// The interval for `transition_index` in `zone`.
    ///
    /// Index -1 synthesizes a non-DST interval running from the beginning
    /// of 32-bit time to the first recorded transition at the earliest raw
    /// offset; the last index runs to the end of 32-bit time. Returns
    /// `None` for an index outside `-1..len`, and for the zero-length
    /// intervals that saturated arithmetic can produce right at the 32-bit
    /// boundaries.
    fn create(zone: &ZoneInfoData, transition_index: isize) -> Option<Self> {
        if transition_index < -1 || transition_index >= zone.transitions.len() as isize {
            return None;
        }

        if transition_index == -1 {
            let total_offset_seconds = zone.earliest_raw_offset_millis() / 1_000;
            let start_wall_seconds = i32::MIN;
            let end_wall_seconds =
                saturating_add_i32(*zone.transitions.first()?, total_offset_seconds);
            if start_wall_seconds == end_wall_seconds {
                return None;
            }
            return Some(Self {
                start_wall_seconds,
                end_wall_seconds,
                is_dst: false,
                total_offset_seconds,
            });
        }

        let index = transition_index as usize;
        let type_index = usize::from(zone.types[index]);
        let total_offset_seconds = zone.offsets[type_index] + zone.raw_offset_millis() / 1_000;
        let start_wall_seconds = saturating_add_i32(zone.transitions[index], total_offset_seconds);
        let end_wall_seconds = match zone.transitions.get(index + 1) {
            Some(&next) => saturating_add_i32(next, total_offset_seconds),
            None => i32::MAX,
        };
        if start_wall_seconds == end_wall_seconds {
            return None;
        }
        Some(Self {
            start_wall_seconds,
            end_wall_seconds,
            is_dst: zone.is_dsts[type_index],
            total_offset_seconds,
        })
    }

    fn contains_wall_time(&self, wall_seconds: i32) -> bool {
        self.start_wall_seconds <= wall_seconds && wall_seconds < self.end_wall_seconds
    }
}
