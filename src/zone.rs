//! Immutable per-zone transition tables and offset queries.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::error::{TzFileError, TzFileErrorKind};
use crate::utils;

/// The transition data of one time zone. An instance is immutable.
///
/// The table is four parallel arrays: transition instants (seconds since the
/// Unix epoch, strictly increasing), one type index per transition, and the
/// offset / is-DST halves of each type. Offsets are stored as second deltas
/// from the zone's raw offset rather than from UTC, so a copy with a
/// substituted raw offset ([`ZoneInfoData::create_copy_with_raw_offset`])
/// shifts the whole table without re-deriving it.
///
/// A transition is active at time `x` if it is the latest transition whose
/// instant is `<= x`. Times before the first transition use the earliest
/// known non-DST offset rather than the first transition's type, since
/// transition data tends to begin with a change *to* DST.
#[derive(Debug, Clone)]
pub struct ZoneInfoData {
    id: String,
    /// The (best guess) non-DST offset used "today", in milliseconds.
    raw_offset_millis: i32,
    /// The earliest non-DST offset, in milliseconds. Absolute, not a delta.
    earliest_raw_offset_millis: i32,
    pub(crate) transitions: Vec<i64>,
    pub(crate) types: Vec<u8>,
    /// Second deltas from `raw_offset_millis`, one per type.
    pub(crate) offsets: Vec<i32>,
    pub(crate) is_dsts: Vec<bool>,
}

/// The raw and DST components of a total offset, both in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffsets {
    pub raw_millis: i32,
    pub dst_millis: i32,
}

impl UtcOffsets {
    /// The total offset from UTC in milliseconds.
    pub fn total_millis(&self) -> i32 {
        self.raw_millis + self.dst_millis
    }
}

impl ZoneInfoData {
    /// Builds a zone from raw table data, normalizing the offsets.
    ///
    /// `gmt_offsets` are absolute offsets from UTC in seconds; they are
    /// rewritten in place as deltas from the derived raw offset. The raw
    /// offset is the offset of the chronologically last non-DST transition,
    /// or the first defined offset when there are no transitions. A zone
    /// with transitions but no non-DST transition is rejected.
    pub fn try_new(
        id: &str,
        transitions: Vec<i64>,
        types: Vec<u8>,
        mut gmt_offsets: Vec<i32>,
        is_dsts: Vec<bool>,
    ) -> Result<Self, TzFileError> {
        if gmt_offsets.is_empty() {
            return Err(TzFileError::new(id, TzFileErrorKind::NoOffsetTypes));
        }
        if transitions.len() != types.len() {
            return Err(TzFileError::new(
                id,
                TzFileErrorKind::MismatchedTableLengths {
                    transitions: transitions.len(),
                    types: types.len(),
                },
            ));
        }
        if gmt_offsets.len() != is_dsts.len() {
            return Err(TzFileError::new(
                id,
                TzFileErrorKind::MismatchedTypeTables {
                    offsets: gmt_offsets.len(),
                    is_dsts: is_dsts.len(),
                },
            ));
        }
        for (index, &type_index) in types.iter().enumerate() {
            if usize::from(type_index) >= gmt_offsets.len() {
                return Err(TzFileError::new(
                    id,
                    TzFileErrorKind::TypeIndexOutOfRange {
                        index,
                        type_index,
                        type_count: gmt_offsets.len(),
                    },
                ));
            }
        }

        // Use the latest non-DST offset (if any) as the raw offset.
        let raw_offset_seconds = if transitions.is_empty() {
            // Not expected in data produced by zic 2014c or later; kept as
            // a fallback.
            gmt_offsets[0]
        } else {
            let last_std_transition = types
                .iter()
                .rev()
                .find(|&&type_index| !is_dsts[usize::from(type_index)]);
            match last_std_transition {
                Some(&type_index) => gmt_offsets[usize::from(type_index)],
                None => {
                    return Err(TzFileError::new(id, TzFileErrorKind::NoStandardTransition))
                }
            }
        };

        // Cache the offset of the first non-DST type for times that predate
        // the transition data, falling back to the raw offset when the type
        // table is all-DST (assumed rare).
        let earliest_raw_offset_seconds = is_dsts
            .iter()
            .position(|&is_dst| !is_dst)
            .map_or(raw_offset_seconds, |type_index| gmt_offsets[type_index]);

        // Store offsets relative to the raw offset so a substituted raw
        // offset automatically affects the whole table.
        for offset in &mut gmt_offsets {
            *offset -= raw_offset_seconds;
        }

        Ok(Self {
            id: String::from(id),
            raw_offset_millis: raw_offset_seconds * 1_000,
            earliest_raw_offset_millis: earliest_raw_offset_seconds * 1_000,
            transitions,
            types,
            offsets: gmt_offsets,
            is_dsts,
        })
    }

    /// The zone identifier, e.g. `"America/Los_Angeles"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw (non-DST) offset from UTC in milliseconds.
    pub fn raw_offset_millis(&self) -> i32 {
        self.raw_offset_millis
    }

    /// The non-DST offset in effect before the first transition, in
    /// milliseconds.
    pub fn earliest_raw_offset_millis(&self) -> i32 {
        self.earliest_raw_offset_millis
    }

    /// The transition instants in seconds since the Unix epoch.
    pub fn transitions(&self) -> &[i64] {
        &self.transitions
    }

    /// Finds the latest transition at or before `seconds`, or `None` when
    /// the time predates all transitions.
    pub fn find_transition_index(&self, seconds: i64) -> Option<usize> {
        match self.transitions.binary_search(&seconds) {
            Ok(index) => Some(index),
            Err(0) => None,
            Err(insertion) => Some(insertion - 1),
        }
    }

    /// The active type index at `seconds`, or `None` before the first
    /// transition.
    pub(crate) fn find_offset_index_for_seconds(&self, seconds: i64) -> Option<usize> {
        self.find_transition_index(seconds)
            .map(|transition| usize::from(self.types[transition]))
    }

    fn find_offset_index_for_millis(&self, millis: i64) -> Option<usize> {
        self.find_offset_index_for_seconds(utils::round_down_millis_to_seconds(millis))
    }

    /// The total offset from UTC in milliseconds at `when_millis`.
    pub fn get_offset(&self, when_millis: i64) -> i32 {
        match self.find_offset_index_for_millis(when_millis) {
            // All times before the first transition use the oldest known
            // non-DST offset; the current raw offset would be a greater
            // leap of faith.
            None => self.earliest_raw_offset_millis,
            Some(type_index) => self.raw_offset_millis + self.offsets[type_index] * 1_000,
        }
    }

    /// Whether `when_millis` falls in daylight saving time in this zone.
    pub fn is_in_daylight_time(&self, when_millis: i64) -> bool {
        match self.find_offset_index_for_millis(when_millis) {
            // Times before the first transition are taken as non-DST.
            None => false,
            Some(type_index) => self.is_dsts[type_index],
        }
    }

    /// Splits the total offset at `when_millis` into raw and DST components.
    ///
    /// The format stores only deltas from the zone's single canonical raw
    /// offset, not "the raw offset at the time of each transition", so when
    /// the active type is DST this walks backward to the nearest prior
    /// non-DST transition to recover the raw component, falling back to the
    /// earliest raw offset when there is none.
    pub fn get_offsets_by_utc_time(&self, when_millis: i64) -> UtcOffsets {
        let seconds = utils::round_down_millis_to_seconds(when_millis);
        let Some(transition) = self.find_transition_index(seconds) else {
            return UtcOffsets {
                raw_millis: self.earliest_raw_offset_millis,
                dst_millis: 0,
            };
        };

        let type_index = usize::from(self.types[transition]);
        let total_millis = self.raw_offset_millis + self.offsets[type_index] * 1_000;
        if !self.is_dsts[type_index] {
            return UtcOffsets {
                raw_millis: total_millis,
                dst_millis: 0,
            };
        }

        let raw_millis = self.types[..transition]
            .iter()
            .rev()
            .find(|&&prior_type| !self.is_dsts[usize::from(prior_type)])
            .map_or(self.earliest_raw_offset_millis, |&prior_type| {
                self.raw_offset_millis + self.offsets[usize::from(prior_type)] * 1_000
            });
        UtcOffsets {
            raw_millis,
            dst_millis: total_millis - raw_millis,
        }
    }

    /// The DST savings of the latest DST transition at or after
    /// `when_millis`, in milliseconds, or `None` when the zone has no DST
    /// transition in its future.
    ///
    /// A last DST transition that lies in the past is treated as if it did
    /// not exist: the zone is considered to have stopped observing DST.
    pub fn get_latest_dst_savings_millis(&self, when_millis: i64) -> Option<i32> {
        let mut last_std_type = None;
        let mut last_dst_transition = None;
        for transition in (0..self.transitions.len()).rev() {
            let type_index = usize::from(self.types[transition]);
            if !self.is_dsts[type_index] {
                if last_std_type.is_none() {
                    last_std_type = Some(type_index);
                }
            } else if last_dst_transition.is_none() {
                last_dst_transition = Some(transition);
            }
            if last_std_type.is_some() && last_dst_transition.is_some() {
                break;
            }
        }

        let dst_transition = last_dst_transition?;
        // Round up: this asks which transitions apply in the future, unlike
        // the active-transition queries which round down.
        if self.transitions[dst_transition] < utils::round_up_millis_to_seconds(when_millis) {
            return None;
        }

        let std_type = last_std_type?;
        let dst_type = usize::from(self.types[dst_transition]);
        Some((self.offsets[dst_type] - self.offsets[std_type]) * 1_000)
    }

    /// A deep copy of this zone with a substituted raw offset.
    ///
    /// The stored deltas are untouched, so every query against the copy is
    /// shifted by exactly the raw-offset difference. The earliest raw
    /// offset is deliberately kept.
    pub fn create_copy_with_raw_offset(&self, new_raw_offset_millis: i32) -> Self {
        Self {
            raw_offset_millis: new_raw_offset_millis,
            ..self.clone()
        }
    }

    /// Whether two zones use the same rules, ignoring their identifiers.
    pub fn has_same_rules(&self, other: &Self) -> bool {
        self.raw_offset_millis == other.raw_offset_millis
            && self.offsets == other.offsets
            && self.is_dsts == other.is_dsts
            && self.types == other.types
            && self.transitions == other.transitions
    }
}

impl PartialEq for ZoneInfoData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.has_same_rules(other)
    }
}

impl Eq for ZoneInfoData {}

/// The universe of known zones: identifier to transition table.
///
/// Zones are immutable once inserted; the registry doubles as the
/// identifier universe the country catalog validates against. How records
/// are located and read is up to the caller.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: HashMap<String, ZoneInfoData>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a zone under its own identifier, replacing any previous
    /// entry.
    pub fn insert(&mut self, zone: ZoneInfoData) {
        self.zones.insert(String::from(zone.id()), zone);
    }

    pub fn get(&self, id: &str) -> Option<&ZoneInfoData> {
        self.zones.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn simple_zone() -> ZoneInfoData {
        // Raw offset derives from type 0 (the last non-DST transition).
        ZoneInfoData::try_new(
            "Test/Simple",
            vec![1_000, 2_000],
            vec![0, 1],
            vec![0, 3_600],
            vec![false, true],
        )
        .unwrap()
    }

    #[test]
    fn raw_offset_from_last_std_transition() {
        let zone = ZoneInfoData::try_new(
            "Test/Raw",
            vec![100, 200, 300],
            vec![1, 0, 1],
            vec![-28_800, -25_200],
            vec![false, true],
        )
        .unwrap();
        // Type 0 is the last non-DST transition's type.
        assert_eq!(zone.raw_offset_millis(), -28_800_000);
        assert_eq!(zone.earliest_raw_offset_millis(), -28_800_000);
    }

    #[test]
    fn raw_offset_without_transitions() {
        let zone =
            ZoneInfoData::try_new("Test/Fixed", vec![], vec![], vec![7_200], vec![false]).unwrap();
        assert_eq!(zone.raw_offset_millis(), 7_200_000);
        assert_eq!(zone.get_offset(0), 7_200_000);
        assert!(!zone.is_in_daylight_time(0));
    }

    #[test]
    fn all_dst_transitions_rejected() {
        let err = ZoneInfoData::try_new(
            "Test/AllDst",
            vec![100],
            vec![0],
            vec![3_600],
            vec![true],
        )
        .unwrap_err();
        assert_eq!(err.zone(), "Test/AllDst");
        assert_eq!(err.kind(), &TzFileErrorKind::NoStandardTransition);
    }

    #[test]
    fn empty_type_table_rejected() {
        let err = ZoneInfoData::try_new("Test/Empty", vec![], vec![], vec![], vec![]).unwrap_err();
        assert_eq!(err.kind(), &TzFileErrorKind::NoOffsetTypes);
    }

    #[test]
    fn concrete_offset_scenario() {
        let zone = simple_zone();
        // Before any transition the earliest raw offset applies.
        assert_eq!(zone.get_offset(500_000), zone.earliest_raw_offset_millis());
        // Type 0 active.
        assert_eq!(zone.get_offset(1_500_000), 0);
        // Type 1 active.
        assert_eq!(zone.get_offset(2_500_000), 3_600_000);
        assert!(!zone.is_in_daylight_time(1_500_000));
        assert!(zone.is_in_daylight_time(2_500_000));
    }

    #[test]
    fn pre_transition_times_are_not_dst() {
        // The first transition moves *into* DST; earlier times must still
        // report standard time.
        let zone = ZoneInfoData::try_new(
            "Test/DstFirst",
            vec![1_000, 2_000],
            vec![1, 0],
            vec![0, 3_600],
            vec![false, true],
        )
        .unwrap();
        assert!(!zone.is_in_daylight_time(0));
        assert!(zone.is_in_daylight_time(1_500_000));
    }

    #[test]
    fn millisecond_rounding_before_transition() {
        let zone = simple_zone();
        // 999_999 ms rounds down to second 999, one short of the 1_000
        // transition.
        assert_eq!(zone.get_offset(999_999), zone.earliest_raw_offset_millis());
        assert_eq!(zone.get_offset(1_000_000), 0);
    }

    #[test]
    fn offset_decomposition_identity() {
        let zone = simple_zone();
        for when in [-5_000_000, 500_000, 1_500_000, 2_500_000, 10_000_000] {
            let offsets = zone.get_offsets_by_utc_time(when);
            assert_eq!(offsets.total_millis(), zone.get_offset(when));
            if !zone.is_in_daylight_time(when) {
                assert_eq!(offsets.dst_millis, 0);
            }
        }
        let overlap = zone.get_offsets_by_utc_time(2_500_000);
        assert_eq!(overlap.raw_millis, 0);
        assert_eq!(overlap.dst_millis, 3_600_000);
    }

    #[test]
    fn dst_decomposition_without_prior_std_uses_earliest() {
        // First transition is straight into DST; the backward walk finds no
        // prior non-DST transition and must use the earliest raw offset.
        let zone = ZoneInfoData::try_new(
            "Test/DstFirst",
            vec![1_000, 2_000],
            vec![1, 0],
            vec![0, 3_600],
            vec![false, true],
        )
        .unwrap();
        let offsets = zone.get_offsets_by_utc_time(1_500_000);
        assert_eq!(offsets.raw_millis, zone.earliest_raw_offset_millis());
        assert_eq!(offsets.dst_millis, 3_600_000);
    }

    #[test]
    fn latest_dst_savings() {
        let zone = simple_zone();
        // Before the DST transition it is still upcoming.
        assert_eq!(zone.get_latest_dst_savings_millis(1_000_000), Some(3_600_000));
        // At exactly the transition second it still applies.
        assert_eq!(zone.get_latest_dst_savings_millis(2_000_000), Some(3_600_000));
        // Afterwards the zone no longer observes DST.
        assert_eq!(zone.get_latest_dst_savings_millis(2_000_001), None);

        let fixed =
            ZoneInfoData::try_new("Test/Fixed", vec![], vec![], vec![0], vec![false]).unwrap();
        assert_eq!(fixed.get_latest_dst_savings_millis(0), None);
    }

    #[test]
    fn copy_with_raw_offset_shifts_queries() {
        let zone = simple_zone();
        let copy = zone.create_copy_with_raw_offset(1_800_000);
        assert_eq!(copy.get_offset(1_500_000), 1_800_000);
        assert_eq!(copy.get_offset(2_500_000), 1_800_000 + 3_600_000);
        // The pre-transition fallback is deliberately not shifted.
        assert_eq!(copy.get_offset(0), zone.earliest_raw_offset_millis());
        assert!(!copy.has_same_rules(&zone));
    }

    #[test]
    fn rules_equality_ignores_id() {
        let a = simple_zone();
        let mut b = simple_zone();
        b.id = String::from("Test/Other");
        assert!(a.has_same_rules(&b));
        assert_ne!(a, b);
        let c = simple_zone();
        assert_eq!(a, c);
    }

    #[test]
    fn type_index_validated_at_construction() {
        let err = ZoneInfoData::try_new(
            "Test/BadType",
            vec![1_000],
            vec![3],
            vec![0],
            vec![false],
        )
        .unwrap_err();
        assert_eq!(
            err.kind(),
            &TzFileErrorKind::TypeIndexOutOfRange {
                index: 0,
                type_index: 3,
                type_count: 1,
            }
        );
    }
}
