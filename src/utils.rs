//! Civil calendar equations for wall-time conversion.
//!
//! The resolver works on broken-down local times (year, 0-based month,
//! day-of-month, hour, minute, second) and needs to move between those
//! fields and seconds since the Unix epoch. Fields are treated leniently:
//! out-of-range values (month 12, day 0, hour 25, ...) are normalized
//! arithmetically rather than rejected, because `mktime` relies on being
//! able to hand in a wall time the caller has mutated freely.

pub(crate) const SECONDS_PER_DAY: i64 = 86_400;
pub(crate) const SECONDS_PER_HOUR: i64 = 3_600;
pub(crate) const SECONDS_PER_MINUTE: i64 = 60;

/// A broken-down wall-clock time produced from a seconds value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WallClockFields {
    pub(crate) year: i64,
    /// 0-based month.
    pub(crate) month: u8,
    /// 1-based day of month.
    pub(crate) month_day: u8,
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    /// Day of week, Sunday = 0.
    pub(crate) week_day: u8,
    /// 0-based day of year.
    pub(crate) year_day: u16,
}

/// Days since the Unix epoch for a proleptic Gregorian date.
///
/// `month` is 0-based and may lie outside 0..=11; it is folded into the
/// year first. `day` is 1-based and unbounded, so `day = 0` means the last
/// day of the previous month.
pub(crate) fn epoch_days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = year + month.div_euclid(12);
    // m is the 1-based month in 1..=12.
    let m = month.rem_euclid(12) + 1;

    let y = if m <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of `epoch_days_from_civil`: (year, 0-based month, 1-based day).
pub(crate) fn civil_from_epoch_days(epoch_days: i64) -> (i64, u8, u8) {
    let days = epoch_days + 719_468;
    let era = days.div_euclid(146_097);
    let doe = days - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };
    (year, (m - 1) as u8, day as u8)
}

/// Wall-clock seconds since the epoch for (possibly denormalized) fields.
pub(crate) fn wall_seconds_from_fields(
    year: i64,
    month: i64,
    month_day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> i64 {
    let days = epoch_days_from_civil(year, month, 1) + (month_day - 1);
    days * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR + minute * SECONDS_PER_MINUTE + second
}

/// Decomposes wall-clock seconds since the epoch into calendar fields.
pub(crate) fn fields_from_wall_seconds(wall_seconds: i64) -> WallClockFields {
    let days = wall_seconds.div_euclid(SECONDS_PER_DAY);
    let second_of_day = wall_seconds.rem_euclid(SECONDS_PER_DAY);
    let (year, month, month_day) = civil_from_epoch_days(days);
    // Epoch day zero was a Thursday; Sunday = 0.
    let week_day = (days + 4).rem_euclid(7) as u8;
    let year_day = (days - epoch_days_from_civil(year, 0, 1)) as u16;
    WallClockFields {
        year,
        month,
        month_day,
        hour: (second_of_day / SECONDS_PER_HOUR) as u8,
        minute: ((second_of_day / SECONDS_PER_MINUTE) % 60) as u8,
        second: (second_of_day % 60) as u8,
        week_day,
        year_day,
    }
}

/// Rounds a millisecond instant down to the enclosing second.
///
/// Plain division rounds toward zero, which for negative instants lands one
/// second *after* the time in question and would attribute a pre-transition
/// millisecond to the transition itself.
pub(crate) fn round_down_millis_to_seconds(millis: i64) -> i64 {
    millis.div_euclid(1_000)
}

/// Rounds a millisecond instant up to the nearest following second.
pub(crate) fn round_up_millis_to_seconds(millis: i64) -> i64 {
    let seconds = millis.div_euclid(1_000);
    if millis.rem_euclid(1_000) != 0 {
        seconds + 1
    } else {
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_round_trip() {
        for &days in &[-719_468, -25_567, -1, 0, 1, 10_957, 18_262, 25_201] {
            let (year, month, day) = civil_from_epoch_days(days);
            assert_eq!(
                epoch_days_from_civil(year, i64::from(month), i64::from(day)),
                days
            );
        }
    }

    #[test]
    fn known_dates() {
        // 1970-01-01
        assert_eq!(epoch_days_from_civil(1970, 0, 1), 0);
        // 2000-02-29 (leap year)
        assert_eq!(civil_from_epoch_days(11_016), (2000, 1, 29));
        // 2038-01-19, the last full day of the 32-bit second range.
        assert_eq!(epoch_days_from_civil(2038, 0, 19), 24_855);
        // 1901-12-13, the day containing the minimum 32-bit second.
        assert_eq!(civil_from_epoch_days(-24_856), (1901, 11, 13));
    }

    #[test]
    fn lenient_normalization() {
        // Month 12 of 2006 is January 2007.
        assert_eq!(
            epoch_days_from_civil(2006, 12, 1),
            epoch_days_from_civil(2007, 0, 1)
        );
        // Month -1 of 2007 is December 2006.
        assert_eq!(
            epoch_days_from_civil(2007, -1, 31),
            epoch_days_from_civil(2006, 11, 31)
        );
        // Day 0 is the last day of the previous month.
        assert_eq!(
            epoch_days_from_civil(2007, 2, 0),
            epoch_days_from_civil(2007, 1, 28)
        );
        // Hour 24 rolls into the next day.
        assert_eq!(
            wall_seconds_from_fields(2007, 0, 1, 24, 0, 0),
            wall_seconds_from_fields(2007, 0, 2, 0, 0, 0)
        );
    }

    #[test]
    fn field_decomposition() {
        // 2007-03-11 02:30:00 was a Sunday, day 69 of the year.
        let fields = fields_from_wall_seconds(wall_seconds_from_fields(2007, 2, 11, 2, 30, 0));
        assert_eq!(fields.year, 2007);
        assert_eq!(fields.month, 2);
        assert_eq!(fields.month_day, 11);
        assert_eq!(fields.hour, 2);
        assert_eq!(fields.minute, 30);
        assert_eq!(fields.second, 0);
        assert_eq!(fields.week_day, 0);
        assert_eq!(fields.year_day, 69);
    }

    #[test]
    fn negative_field_decomposition() {
        // 1969-12-31 23:59:59.
        let fields = fields_from_wall_seconds(-1);
        assert_eq!(fields.year, 1969);
        assert_eq!(fields.month, 11);
        assert_eq!(fields.month_day, 31);
        assert_eq!(fields.hour, 23);
        assert_eq!(fields.minute, 59);
        assert_eq!(fields.second, 59);
        // A Wednesday.
        assert_eq!(fields.week_day, 3);
        assert_eq!(fields.year_day, 364);
    }

    #[test]
    fn millis_rounding() {
        assert_eq!(round_down_millis_to_seconds(12_345), 12);
        assert_eq!(round_down_millis_to_seconds(-12_345), -13);
        assert_eq!(round_down_millis_to_seconds(-12_000), -12);
        assert_eq!(round_up_millis_to_seconds(12_345), 13);
        assert_eq!(round_up_millis_to_seconds(12_000), 12);
        assert_eq!(round_up_millis_to_seconds(-12_345), -12);
    }
}
