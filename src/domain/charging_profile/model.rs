//! ChargingProfile domain entities
//!
//! Field names follow the OCPP 2.0.1 JSON schema so that profiles can be
//! moved in and out of `rust-ocpp` message types with plain serde.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// EVSE id addressing the whole charging station.
pub const STATION_WIDE_ID: i32 = 0;

/// Number of phases assumed when a period on an AC supply omits it.
pub const DEFAULT_AND_MAX_NUMBER_PHASES: i32 = 3;

/// Charging profile purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChargingProfilePurpose {
    ChargingStationExternalConstraints,
    ChargingStationMaxProfile,
    TxDefaultProfile,
    TxProfile,
}

impl ChargingProfilePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChargingStationExternalConstraints => "ChargingStationExternalConstraints",
            Self::ChargingStationMaxProfile => "ChargingStationMaxProfile",
            Self::TxDefaultProfile => "TxDefaultProfile",
            Self::TxProfile => "TxProfile",
        }
    }
}

impl fmt::Display for ChargingProfilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the periods of a schedule are anchored in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargingProfileKind {
    Absolute,
    Recurring,
    Relative,
}

/// Recurrence interval of a `Recurring` profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecurrencyKind {
    Daily,
    Weekly,
}

impl RecurrencyKind {
    /// Length of one recurrence.
    pub fn period(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::weeks(1),
        }
    }
}

/// Unit of a schedule limit: Amperes or Watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargingRateUnit {
    A,
    W,
}

impl ChargingRateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::W => "W",
        }
    }
}

impl fmt::Display for ChargingRateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a charging limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChargingLimitSource {
    #[serde(rename = "EMS")]
    Ems,
    Other,
    #[serde(rename = "SO")]
    So,
    #[default]
    #[serde(rename = "CSO")]
    Cso,
}

/// One step of a charging schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    /// Offset in seconds from the start of the schedule.
    pub start_period: i32,
    /// Limit in the schedule's charging rate unit.
    #[serde(deserialize_with = "deserialize_limit")]
    pub limit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_phases: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_to_use: Option<i32>,
}

impl ChargingSchedulePeriod {
    pub fn new(start_period: i32, limit: f64) -> Self {
        Self {
            start_period,
            limit,
            number_phases: None,
            phase_to_use: None,
        }
    }

    pub fn with_number_phases(mut self, number_phases: i32) -> Self {
        self.number_phases = Some(number_phases);
        self
    }

    pub fn with_phase_to_use(mut self, phase_to_use: i32) -> Self {
        self.phase_to_use = Some(phase_to_use);
        self
    }
}

/// A list of periods together with their anchoring and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_schedule: Option<DateTime<Utc>>,
    /// Duration in seconds; the last period holds until the end of the
    /// schedule when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    pub charging_rate_unit: ChargingRateUnit,
    #[serde(rename = "chargingSchedulePeriod", default)]
    pub periods: Vec<ChargingSchedulePeriod>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_limit"
    )]
    pub min_charging_rate: Option<f64>,
}

impl ChargingSchedule {
    pub fn new(charging_rate_unit: ChargingRateUnit, periods: Vec<ChargingSchedulePeriod>) -> Self {
        Self {
            id: 0,
            start_schedule: None,
            duration: None,
            charging_rate_unit,
            periods,
            min_charging_rate: None,
        }
    }
}

/// Operator-submitted rate limit over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    /// Unique across the charging station once accepted.
    pub id: i32,
    /// Higher overrides lower within the same purpose and scope.
    pub stack_level: i32,
    #[serde(rename = "chargingProfilePurpose")]
    pub purpose: ChargingProfilePurpose,
    #[serde(rename = "chargingProfileKind")]
    pub kind: ChargingProfileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrency_kind: Option<RecurrencyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    /// Required for `TxProfile`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(rename = "chargingSchedule", default)]
    pub schedules: Vec<ChargingSchedule>,
}

impl ChargingProfile {
    /// The schedule the composite calculation operates on.
    pub fn schedule(&self) -> Option<&ChargingSchedule> {
        self.schedules.first()
    }

    pub fn charging_rate_unit(&self) -> Option<ChargingRateUnit> {
        self.schedule().map(|s| s.charging_rate_unit)
    }

    /// Whether the closed validity windows of both profiles intersect.
    /// Missing bounds are unbounded.
    pub fn validity_overlaps(&self, other: &ChargingProfile) -> bool {
        let starts_before_other_ends = match (self.valid_from, other.valid_to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };
        let ends_after_other_starts = match (self.valid_to, other.valid_from) {
            (Some(to), Some(from)) => to >= from,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    /// Whether the validity window intersects the half-open window `[start, end)`.
    pub fn is_valid_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| from < end) && self.valid_to.map_or(true, |to| to > start)
    }
}

/// Resolved limit timeline for one EVSE over a requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSchedule {
    pub evse_id: i32,
    /// Window length in seconds.
    pub duration: i32,
    pub schedule_start: DateTime<Utc>,
    pub charging_rate_unit: ChargingRateUnit,
    /// Ordered and gapless; `startPeriod` is relative to `scheduleStart`.
    #[serde(rename = "chargingSchedulePeriod")]
    pub periods: Vec<ChargingSchedulePeriod>,
}

/// Fallback limits used wherever no profile applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScheduleDefaultLimits {
    pub amps: f64,
    pub watts: f64,
    pub number_phases: i32,
}

impl CompositeScheduleDefaultLimits {
    pub fn limit_for(&self, unit: ChargingRateUnit) -> f64 {
        match unit {
            ChargingRateUnit::A => self.amps,
            ChargingRateUnit::W => self.watts,
        }
    }
}

impl Default for CompositeScheduleDefaultLimits {
    fn default() -> Self {
        Self {
            amps: 48.0,
            watts: 33120.0,
            number_phases: DEFAULT_AND_MAX_NUMBER_PHASES,
        }
    }
}

// ── Limit decoding ─────────────────────────────────────────────

// Decimal limits may arrive as JSON strings. Numbers go through
// `serde_json::Value` so that arbitrary precision numbers decode too.
fn limit_from_value<E: serde::de::Error>(value: serde_json::Value) -> Result<f64, E> {
    match value {
        serde_json::Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| E::custom(format!("limit '{}' is not representable", number))),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| E::custom(format!("invalid limit '{}': {}", text, e))),
        other => Err(E::custom(format!("invalid limit {}", other))),
    }
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    limit_from_value(serde_json::Value::deserialize(deserializer)?)
}

fn deserialize_optional_limit<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<serde_json::Value>::deserialize(deserializer)?
        .map(limit_from_value)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile_with_validity(
        valid_from: Option<DateTime<Utc>>,
        valid_to: Option<DateTime<Utc>>,
    ) -> ChargingProfile {
        ChargingProfile {
            id: 1,
            stack_level: 0,
            purpose: ChargingProfilePurpose::TxDefaultProfile,
            kind: ChargingProfileKind::Absolute,
            recurrency_kind: None,
            valid_from,
            valid_to,
            transaction_id: None,
            schedules: vec![ChargingSchedule::new(
                ChargingRateUnit::A,
                vec![ChargingSchedulePeriod::new(0, 16.0)],
            )],
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn deserializes_ocpp_json() {
        let json = serde_json::json!({
            "id": 7,
            "stackLevel": 2,
            "chargingProfilePurpose": "TxProfile",
            "chargingProfileKind": "Absolute",
            "transactionId": "tx-1",
            "chargingSchedule": [{
                "id": 1,
                "startSchedule": "2024-01-17T00:00:00Z",
                "chargingRateUnit": "A",
                "chargingSchedulePeriod": [
                    {"startPeriod": 0, "limit": 32.0, "numberPhases": 3},
                    {"startPeriod": 3600, "limit": "16.5"}
                ]
            }]
        });

        let profile: ChargingProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.purpose, ChargingProfilePurpose::TxProfile);
        assert_eq!(profile.transaction_id.as_deref(), Some("tx-1"));
        let schedule = profile.schedule().unwrap();
        assert_eq!(schedule.start_schedule, Some(day(17)));
        assert_eq!(schedule.periods[0].number_phases, Some(3));
        assert_eq!(schedule.periods[1].limit, 16.5);
    }

    #[test]
    fn limits_read_back_from_json_text() {
        let mut profile = profile_with_validity(Some(day(1)), None);
        profile.schedules[0].periods.push(ChargingSchedulePeriod::new(1800, 6.5));
        let text = serde_json::to_string_pretty(&profile).unwrap();

        let parsed: ChargingProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, profile);

        let period: ChargingSchedulePeriod =
            serde_json::from_str(r#"{"startPeriod": 60, "limit": 11}"#).unwrap();
        assert_eq!(period.limit, 11.0);
        let period: ChargingSchedulePeriod =
            serde_json::from_str(r#"{"startPeriod": 60, "limit": " 7.25 "}"#).unwrap();
        assert_eq!(period.limit, 7.25);
    }

    #[test]
    fn rejects_non_numeric_limits() {
        let result: Result<ChargingSchedulePeriod, _> =
            serde_json::from_str(r#"{"startPeriod": 0, "limit": "lots"}"#);
        assert!(result.is_err());
        let result: Result<ChargingSchedulePeriod, _> =
            serde_json::from_str(r#"{"startPeriod": 0, "limit": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_with_ocpp_field_names() {
        let profile = profile_with_validity(None, None);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["chargingProfilePurpose"], "TxDefaultProfile");
        assert_eq!(json["chargingSchedule"][0]["chargingRateUnit"], "A");
        assert_eq!(json["chargingSchedule"][0]["chargingSchedulePeriod"][0]["startPeriod"], 0);
        assert!(json.get("validFrom").is_none());
    }

    #[test]
    fn limit_source_uses_protocol_names() {
        let json = serde_json::to_value(ChargingLimitSource::Ems).unwrap();
        assert_eq!(json, "EMS");
        let parsed: ChargingLimitSource = serde_json::from_value(serde_json::json!("CSO")).unwrap();
        assert_eq!(parsed, ChargingLimitSource::Cso);
    }

    #[test]
    fn unbounded_validity_always_overlaps() {
        let open = profile_with_validity(None, None);
        let bounded = profile_with_validity(Some(day(1)), Some(day(2)));
        assert!(open.validity_overlaps(&bounded));
        assert!(bounded.validity_overlaps(&open));
    }

    #[test]
    fn disjoint_validity_does_not_overlap() {
        let january = profile_with_validity(Some(day(1)), Some(day(10)));
        let later = profile_with_validity(Some(day(11)), None);
        assert!(!january.validity_overlaps(&later));
        assert!(!later.validity_overlaps(&january));
    }

    #[test]
    fn touching_validity_overlaps() {
        let first = profile_with_validity(Some(day(1)), Some(day(10)));
        let second = profile_with_validity(Some(day(10)), Some(day(20)));
        assert!(first.validity_overlaps(&second));
    }

    #[test]
    fn validity_window_is_half_open() {
        let profile = profile_with_validity(Some(day(10)), None);
        assert!(!profile.is_valid_within(day(1), day(10)));
        assert!(profile.is_valid_within(day(1), day(11)));

        let expired = profile_with_validity(None, Some(day(5)));
        assert!(!expired.is_valid_within(day(5), day(6)));
    }
}
