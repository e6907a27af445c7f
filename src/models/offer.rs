use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::calendar::{BookingAvailability, CalendarType, DayOfWeek, OfferStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OfferScope {
    #[serde(rename = "events")]
    Event,
    #[serde(rename = "places")]
    Place,
}

impl OfferScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferScope::Event => "events",
            OfferScope::Place => "places",
        }
    }
}

// ── Persisted shape (read side) ──
//
// Everything is optional and enum values are kept as raw strings so that a
// malformed record degrades to defaults during hydration instead of failing.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedOffer {
    pub calendar_type: Option<String>,
    pub sub_event: Option<Vec<PersistedSubEvent>>,
    pub opening_hours: Option<Vec<PersistedOpeningHours>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl PersistedOffer {
    pub fn calendar_type(&self) -> Option<CalendarType> {
        self.calendar_type.as_deref().and_then(CalendarType::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.calendar_type().is_none()
            && self.sub_event.as_ref().map_or(true, |s| s.is_empty())
            && self.opening_hours.as_ref().map_or(true, |o| o.is_empty())
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSubEvent {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<PersistedStatus>,
    pub booking_availability: Option<PersistedBookingAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedStatus {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub reason: Option<serde_json::Value>,
}

impl PersistedStatus {
    pub fn reason_map(&self) -> Option<BTreeMap<String, String>> {
        let object = self.reason.as_ref()?.as_object()?;
        let map: BTreeMap<String, String> = object
            .iter()
            .filter_map(|(lang, text)| Some((lang.clone(), text.as_str()?.to_string())))
            .collect();
        if map.is_empty() {
            None
        } else {
            Some(map)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedBookingAvailability {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedOpeningHours {
    pub opens: Option<String>,
    pub closes: Option<String>,
    pub day_of_week: Option<Vec<String>>,
}

// ── Persistence payload (write side) ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPayload {
    pub calendar_type: CalendarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_event: Option<Vec<SubEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<OpeningHoursRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubEvent {
    pub start_date: String,
    pub end_date: String,
    pub booking_availability: BookingAvailability,
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHoursRule {
    pub opens: String,
    pub closes: String,
    pub day_of_week: Vec<DayOfWeek>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_offer_tolerates_missing_and_unknown_fields() {
        let offer: PersistedOffer = serde_json::from_str(
            r#"{"calendarType":"sometimes","subEvent":[{"startDate":"2024-01-01T10:00:00Z"}],"foo":1}"#,
        )
        .unwrap();
        assert_eq!(offer.calendar_type(), None);
        assert_eq!(offer.sub_event.as_ref().map(|s| s.len()), Some(1));
        assert!(offer.opening_hours.is_none());
        assert!(!offer.is_empty());
    }

    #[test]
    fn test_persisted_offer_empty() {
        let offer: PersistedOffer = serde_json::from_str("{}").unwrap();
        assert!(offer.is_empty());
        let offer: PersistedOffer = serde_json::from_str(r#"{"subEvent":[]}"#).unwrap();
        assert!(offer.is_empty());
    }

    #[test]
    fn test_reason_map_drops_non_strings() {
        let status: PersistedStatus = serde_json::from_str(
            r#"{"type":"Unavailable","reason":{"nl":"Geannuleerd","en":42}}"#,
        )
        .unwrap();
        let reason = status.reason_map().unwrap();
        assert_eq!(reason.len(), 1);
        assert_eq!(reason["nl"], "Geannuleerd");

        let status: PersistedStatus = serde_json::from_str(r#"{"reason":"cancelled"}"#).unwrap();
        assert!(status.reason_map().is_none());
    }

    #[test]
    fn test_payload_omits_absent_sections() {
        let payload = CalendarPayload {
            calendar_type: CalendarType::Permanent,
            sub_event: None,
            opening_hours: Some(vec![]),
            start_date: None,
            end_date: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"calendarType": "permanent", "openingHours": []}));
    }
}
