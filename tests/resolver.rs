//! End-to-end tests: records parsed from bytes, then queried through the
//! zone, wall-time and country layers.

use tzfile_rs::{
    read_zone_info, CountryTimeZones, DstState, TimeZoneMapping, TzFileErrorKind, WallTime,
    ZoneRegistry,
};

// America/Los_Angeles around 2007: PST (-8:00) until Mar 11 10:00:00 UTC,
// PDT (-7:00) until Nov 4 09:00:00 UTC, PST again afterwards.
const SPRING_FORWARD: i64 = 1_173_607_200;
const FALL_BACK: i64 = 1_194_166_800;
const PST: i32 = -28_800;
const PDT: i32 = -25_200;

fn header(version: u8, counts: [i32; 6]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TZif");
    bytes.push(version);
    bytes.extend_from_slice(&[0; 15]);
    for count in counts {
        bytes.extend_from_slice(&count.to_be_bytes());
    }
    bytes
}

/// A two-section record with an empty legacy section.
fn build_record(transitions: &[i64], types: &[u8], type_records: &[(i32, u8)]) -> Vec<u8> {
    let mut bytes = header(b'2', [0; 6]);
    bytes.extend(header(
        b'2',
        [
            0,
            0,
            0,
            transitions.len() as i32,
            type_records.len() as i32,
            0,
        ],
    ));
    for &instant in transitions {
        bytes.extend_from_slice(&instant.to_be_bytes());
    }
    bytes.extend_from_slice(types);
    for &(offset, is_dst) in type_records {
        bytes.extend_from_slice(&offset.to_be_bytes());
        bytes.push(is_dst);
        bytes.push(0);
    }
    bytes
}

fn los_angeles_record() -> Vec<u8> {
    build_record(
        &[0, SPRING_FORWARD, FALL_BACK],
        &[0, 1, 0],
        &[(PST, 0), (PDT, 1)],
    )
}

#[test]
fn parsed_zone_round_trips_unambiguous_times() {
    let record = los_angeles_record();
    let zone = read_zone_info("America/Los_Angeles", &record).unwrap();
    let mut wall = WallTime::new();

    // Instants strictly between transitions, away from the boundaries.
    for instant in [
        1_168_891_200, // mid-January, PST
        1_183_316_400, // mid-summer, PDT
        SPRING_FORWARD as i32 + 7_200,
        FALL_BACK as i32 + 7_200,
    ] {
        wall.localtime(instant, &zone).unwrap();
        assert_eq!(wall.mktime(&zone), Some(instant), "instant {instant}");
    }
}

#[test]
fn non_monotonic_record_rejected() {
    let record = build_record(&[2_000, 1_000], &[0, 0], &[(PST, 0)]);
    let err = read_zone_info("Test/Backwards", &record).unwrap_err();
    assert_eq!(err.zone(), "Test/Backwards");
    assert_eq!(
        err.kind(),
        &TzFileErrorKind::NonMonotonicTransition {
            index: 1,
            value: 1_000,
            previous: 2_000,
        }
    );
}

#[test]
fn spring_forward_gap_detection() {
    let zone = read_zone_info("America/Los_Angeles", &los_angeles_record()).unwrap();

    // 02:30 on Mar 11 2007 fell inside the skipped hour.
    let gap = WallTime {
        year: 2007,
        month: 2,
        month_day: 11,
        hour: 2,
        minute: 30,
        ..WallTime::default()
    };

    // With no assertion the wall time genuinely does not exist.
    let mut unresolved = gap;
    let before = unresolved;
    assert_eq!(unresolved.mktime(&zone), None);
    assert_eq!(unresolved, before);

    // An asserted state that cannot hold is compensated by the offset
    // difference instead.
    let mut std_asserted = WallTime {
        is_dst: DstState::Standard,
        ..gap
    };
    assert_eq!(
        std_asserted.mktime(&zone),
        Some(SPRING_FORWARD as i32 + 1_800)
    );
    assert_eq!(std_asserted.hour, 3);
    assert_eq!(std_asserted.is_dst, DstState::Daylight);
}

#[test]
fn fall_back_overlap_resolution() {
    let zone = read_zone_info("America/Los_Angeles", &los_angeles_record()).unwrap();
    let overlap = WallTime {
        year: 2007,
        month: 10,
        month_day: 4,
        hour: 1,
        minute: 30,
        ..WallTime::default()
    };

    let mut daylight = WallTime {
        is_dst: DstState::Daylight,
        ..overlap
    };
    let mut standard = WallTime {
        is_dst: DstState::Standard,
        ..overlap
    };
    let earlier = daylight.mktime(&zone).unwrap();
    let later = standard.mktime(&zone).unwrap();
    assert_eq!(i64::from(earlier), FALL_BACK - 1_800);
    assert_eq!(i64::from(later), FALL_BACK + 1_800);
    assert_eq!(daylight.gmt_offset_seconds, PDT);
    assert_eq!(standard.gmt_offset_seconds, PST);

    // Unspecified DST resolves deterministically to the first interval the
    // search visits, which here is the standard branch.
    let mut unspecified = overlap;
    assert_eq!(unspecified.mktime(&zone), Some(later));
    assert_eq!(unspecified.is_dst, DstState::Standard);
}

#[test]
fn offset_decomposition_identity() {
    let zone = read_zone_info("America/Los_Angeles", &los_angeles_record()).unwrap();
    for when in [
        -1_000_000_000,
        0,
        (SPRING_FORWARD + 7_200) * 1_000,
        (FALL_BACK + 7_200) * 1_000,
    ] {
        let offsets = zone.get_offsets_by_utc_time(when);
        assert_eq!(offsets.total_millis(), zone.get_offset(when), "when {when}");
        if !zone.is_in_daylight_time(when) {
            assert_eq!(offsets.dst_millis, 0, "when {when}");
        }
    }

    let summer = zone.get_offsets_by_utc_time((SPRING_FORWARD + 7_200) * 1_000);
    assert_eq!(summer.raw_millis, PST * 1_000);
    assert_eq!(summer.dst_millis, 3_600_000);
}

#[test]
fn country_catalog_drops_garbage_ids() {
    let mut registry = ZoneRegistry::new();
    registry.insert(read_zone_info("America/Los_Angeles", &los_angeles_record()).unwrap());

    let country = CountryTimeZones::new(
        "us",
        Some("America/Los_Angeles"),
        false,
        false,
        vec![
            TimeZoneMapping::new("America/Los_Angeles", true, None, Vec::new()),
            TimeZoneMapping::new("Not/AZone", true, None, Vec::new()),
        ],
        &registry,
    );
    assert_eq!(country.time_zone_mappings().len(), 1);
    assert_eq!(country.default_time_zone_id(), Some("America/Los_Angeles"));

    let result = country
        .lookup_by_offset_with_bias(&registry, 0, PST * 1_000, Some(false), None)
        .unwrap();
    assert_eq!(result.zone.id(), "America/Los_Angeles");
    assert!(result.is_only_match);
}

#[test]
fn concrete_offset_scenario() {
    // The minimal two-transition zone: type 0 non-DST at +0:00, type 1 DST
    // at +1:00, transitions at 1000s and 2000s.
    let record = build_record(&[1_000, 2_000], &[0, 1], &[(0, 0), (3_600, 1)]);
    let zone = read_zone_info("Test/Concrete", &record).unwrap();
    assert_eq!(zone.raw_offset_millis(), 0);

    assert_eq!(zone.get_offset(500_000), zone.earliest_raw_offset_millis());
    assert_eq!(zone.get_offset(1_500_000), 0);
    assert_eq!(zone.get_offset(2_500_000), 3_600_000);
}
