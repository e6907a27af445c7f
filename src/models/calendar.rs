use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Some(DayOfWeek::Monday),
            "tuesday" | "tue" => Some(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Some(DayOfWeek::Wednesday),
            "thursday" | "thu" => Some(DayOfWeek::Thursday),
            "friday" | "fri" => Some(DayOfWeek::Friday),
            "saturday" | "sat" => Some(DayOfWeek::Saturday),
            "sunday" | "sun" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OfferStatusType {
    #[default]
    Available,
    TemporarilyUnavailable,
    Unavailable,
}

impl OfferStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatusType::Available => "Available",
            OfferStatusType::TemporarilyUnavailable => "TemporarilyUnavailable",
            OfferStatusType::Unavailable => "Unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(OfferStatusType::Available),
            "temporarilyunavailable" => Some(OfferStatusType::TemporarilyUnavailable),
            "unavailable" => Some(OfferStatusType::Unavailable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OfferStatus {
    #[serde(rename = "type")]
    pub kind: OfferStatusType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<BTreeMap<String, String>>,
}

impl OfferStatus {
    pub fn available() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.kind == OfferStatusType::Available
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BookingAvailabilityType {
    #[default]
    Available,
    Unavailable,
}

impl BookingAvailabilityType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(BookingAvailabilityType::Available),
            "unavailable" => Some(BookingAvailabilityType::Unavailable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BookingAvailability {
    #[serde(rename = "type")]
    pub kind: BookingAvailabilityType,
}

impl BookingAvailability {
    pub fn available() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: String,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub status: OfferStatus,
    pub booking_availability: BookingAvailability,
}

impl Day {
    pub fn new(start_date: DateTime<FixedOffset>, end_date: DateTime<FixedOffset>) -> Self {
        Self {
            id: new_id(),
            start_date,
            end_date,
            status: OfferStatus::available(),
            booking_availability: BookingAvailability::available(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHour {
    #[serde(default = "new_id")]
    pub id: String,
    pub opens: String,
    pub closes: String,
    pub day_of_week: Vec<DayOfWeek>,
}

impl OpeningHour {
    pub fn new(opens: &str, closes: &str, day_of_week: Vec<DayOfWeek>) -> Self {
        Self {
            id: new_id(),
            opens: opens.to_string(),
            closes: closes.to_string(),
            day_of_week,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarContext {
    pub days: Vec<Day>,
    pub opening_hours: Vec<OpeningHour>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl CalendarContext {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
            && self.opening_hours.is_empty()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub fn has_period(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    pub fn day_mut(&mut self, id: &str) -> Option<&mut Day> {
        self.days.iter_mut().find(|d| d.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    #[serde(alias = "SINGLE")]
    Single,
    #[serde(alias = "MULTIPLE")]
    Multiple,
    #[serde(alias = "PERIODIC")]
    Periodic,
    #[serde(alias = "PERMANENT")]
    Permanent,
}

impl CalendarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarType::Single => "single",
            CalendarType::Multiple => "multiple",
            CalendarType::Periodic => "periodic",
            CalendarType::Permanent => "permanent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Some(CalendarType::Single),
            "multiple" => Some(CalendarType::Multiple),
            "periodic" => Some(CalendarType::Periodic),
            "permanent" => Some(CalendarType::Permanent),
            _ => None,
        }
    }

    pub fn uses_sub_events(&self) -> bool {
        matches!(self, CalendarType::Single | CalendarType::Multiple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_parse() {
        assert_eq!(DayOfWeek::parse("Monday"), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::parse("sun"), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::parse("someday"), None);
    }

    #[test]
    fn test_calendar_type_accepts_both_cases() {
        let upper: CalendarType = serde_json::from_str(r#""PERIODIC""#).unwrap();
        let lower: CalendarType = serde_json::from_str(r#""periodic""#).unwrap();
        assert_eq!(upper, CalendarType::Periodic);
        assert_eq!(lower, CalendarType::Periodic);
        assert_eq!(serde_json::to_string(&upper).unwrap(), r#""periodic""#);
    }

    #[test]
    fn test_status_wire_shape() {
        let status = OfferStatus {
            kind: OfferStatusType::TemporarilyUnavailable,
            reason: Some(BTreeMap::from([("nl".to_string(), "Uitgesteld".to_string())])),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], "TemporarilyUnavailable");
        assert_eq!(json["reason"]["nl"], "Uitgesteld");

        let available = serde_json::to_value(OfferStatus::available()).unwrap();
        assert_eq!(available, serde_json::json!({"type": "Available"}));
    }

    #[test]
    fn test_opening_hour_gets_id_when_missing() {
        let rule: OpeningHour = serde_json::from_str(
            r#"{"opens":"09:00","closes":"17:00","dayOfWeek":["monday","friday"]}"#,
        )
        .unwrap();
        assert!(!rule.id.is_empty());
        assert_eq!(rule.day_of_week, vec![DayOfWeek::Monday, DayOfWeek::Friday]);
    }
}
