//! Per-country zone mappings and offset-based disambiguation.
//!
//! The raw country-to-zones data is externally sourced; this module
//! validates it against the known-zone universe and answers "which of this
//! country's zones has offset X at instant T" queries.

use alloc::string::String;
use alloc::vec::Vec;

use log::warn;

use crate::zone::{ZoneInfoData, ZoneRegistry};

/// One entry in a country's prioritized zone list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneMapping {
    time_zone_id: String,
    shown_in_picker: bool,
    /// When set, the instant (milliseconds since the Unix epoch) after
    /// which the zone stopped being distinct for the country, typically
    /// because it was merged into another zone.
    not_used_after_millis: Option<i64>,
    /// Older or aliased identifiers that refer to the same zone.
    alternative_ids: Vec<String>,
}

impl TimeZoneMapping {
    pub fn new(
        time_zone_id: &str,
        shown_in_picker: bool,
        not_used_after_millis: Option<i64>,
        alternative_ids: Vec<String>,
    ) -> Self {
        Self {
            time_zone_id: String::from(time_zone_id),
            shown_in_picker,
            not_used_after_millis,
            alternative_ids,
        }
    }

    pub fn time_zone_id(&self) -> &str {
        &self.time_zone_id
    }

    pub fn is_shown_in_picker(&self) -> bool {
        self.shown_in_picker
    }

    pub fn not_used_after_millis(&self) -> Option<i64> {
        self.not_used_after_millis
    }

    pub fn alternative_ids(&self) -> &[String] {
        &self.alternative_ids
    }

    /// Whether the zone was still in use for the country at `when_millis`.
    fn is_effective_at(&self, when_millis: i64) -> bool {
        match self.not_used_after_millis {
            None => true,
            Some(cutoff) => cutoff >= when_millis,
        }
    }
}

/// The validated zone information for one country. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTimeZones {
    country_iso: String,
    /// `None` when the sourced default was not a recognized zone.
    default_time_zone_id: Option<String>,
    /// Whether the default should be preferred over detection results.
    default_time_zone_boosted: bool,
    /// Whether any of the country's zones ever has a UTC offset of zero.
    /// Precomputed by the data pipeline as a fast reject for
    /// [`CountryTimeZones::has_utc_zone`].
    ever_uses_utc: bool,
    time_zone_mappings: Vec<TimeZoneMapping>,
}

/// A successful [`CountryTimeZones::lookup_by_offset_with_bias`].
#[derive(Debug, Clone, Copy)]
pub struct OffsetResult<'a> {
    /// The matched zone; the bias zone when it was among the matches,
    /// otherwise the first match in priority order.
    pub zone: &'a ZoneInfoData,
    /// Whether no other zone of the country matched. Reflects the true
    /// match count even when the bias zone was preferred.
    pub is_only_match: bool,
}

impl CountryTimeZones {
    /// Builds a validated instance from externally sourced data.
    ///
    /// Mappings naming a zone the registry does not know are dropped with
    /// a warning rather than failing the whole country; an unrecognized
    /// default zone is nulled the same way. Bad data for one country must
    /// not make every other country's data unusable.
    pub fn new(
        country_iso: &str,
        default_time_zone_id: Option<&str>,
        default_time_zone_boosted: bool,
        ever_uses_utc: bool,
        time_zone_mappings: Vec<TimeZoneMapping>,
        registry: &ZoneRegistry,
    ) -> Self {
        let default_time_zone_id = match default_time_zone_id {
            Some(id) if registry.contains(id) => Some(String::from(id)),
            Some(id) => {
                warn!("country {country_iso}: unrecognized default zone id {id}, ignoring");
                None
            }
            None => None,
        };

        let time_zone_mappings = time_zone_mappings
            .into_iter()
            .filter(|mapping| {
                let known = registry.contains(mapping.time_zone_id());
                if !known {
                    warn!(
                        "country {country_iso}: unrecognized zone id {}, dropping mapping",
                        mapping.time_zone_id()
                    );
                }
                known
            })
            .collect();

        Self {
            country_iso: String::from(country_iso),
            default_time_zone_id,
            default_time_zone_boosted,
            ever_uses_utc,
            time_zone_mappings,
        }
    }

    /// The ISO 3166 alpha-2 code, as sourced.
    pub fn country_iso(&self) -> &str {
        &self.country_iso
    }

    pub fn default_time_zone_id(&self) -> Option<&str> {
        self.default_time_zone_id.as_deref()
    }

    pub fn is_default_time_zone_boosted(&self) -> bool {
        self.default_time_zone_boosted
    }

    /// All validated mappings, in priority order.
    pub fn time_zone_mappings(&self) -> &[TimeZoneMapping] {
        &self.time_zone_mappings
    }

    /// The mappings still in use at `when_millis`, in priority order.
    pub fn effective_time_zone_mappings_at(&self, when_millis: i64) -> Vec<&TimeZoneMapping> {
        self.time_zone_mappings
            .iter()
            .filter(|mapping| mapping.is_effective_at(when_millis))
            .collect()
    }

    /// Finds a zone of this country whose total offset at `when_millis` is
    /// `total_offset_millis`, and whose DST state matches `is_dst` when one
    /// is supplied.
    ///
    /// Zones are tested in priority order and the first match wins, except
    /// that a matching `bias_zone_id` is preferred over an earlier match.
    /// Returns `None` when no zone matches.
    pub fn lookup_by_offset_with_bias<'a>(
        &self,
        registry: &'a ZoneRegistry,
        when_millis: i64,
        total_offset_millis: i32,
        is_dst: Option<bool>,
        bias_zone_id: Option<&str>,
    ) -> Option<OffsetResult<'a>> {
        let mut first_match: Option<&'a ZoneInfoData> = None;
        let mut bias_match: Option<&'a ZoneInfoData> = None;
        let mut one_match = true;
        for mapping in self.effective_time_zone_mappings_at(when_millis) {
            let Some(zone) = registry.get(mapping.time_zone_id()) else {
                continue;
            };
            if !offset_matches_at_time(zone, when_millis, total_offset_millis, is_dst) {
                continue;
            }

            if first_match.is_none() {
                first_match = Some(zone);
            } else {
                one_match = false;
            }
            if bias_zone_id == Some(zone.id()) {
                bias_match = Some(zone);
            }

            // Nothing left to learn once the ambiguity is known and the
            // bias has been seen or cannot apply.
            if !one_match && (bias_zone_id.is_none() || bias_match.is_some()) {
                break;
            }
        }

        let zone = bias_match.or(first_match)?;
        Some(OffsetResult {
            zone,
            is_only_match: one_match,
        })
    }

    /// Whether any zone of this country is at UTC (total offset zero) at
    /// `when_millis`.
    pub fn has_utc_zone(&self, registry: &ZoneRegistry, when_millis: i64) -> bool {
        if !self.ever_uses_utc {
            return false;
        }
        self.effective_time_zone_mappings_at(when_millis)
            .iter()
            .filter_map(|mapping| registry.get(mapping.time_zone_id()))
            .any(|zone| zone.get_offset(when_millis) == 0)
    }
}

fn offset_matches_at_time(
    zone: &ZoneInfoData,
    when_millis: i64,
    total_offset_millis: i32,
    is_dst: Option<bool>,
) -> bool {
    if zone.get_offset(when_millis) != total_offset_millis {
        return false;
    }
    match is_dst {
        None => true,
        Some(is_dst) => zone.is_in_daylight_time(when_millis) == is_dst,
    }
}
