use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::models::{
    BookingAvailability, BookingAvailabilityType, CalendarContext, CalendarPayload, CalendarType,
    Day, DayOfWeek, OfferStatus, OfferStatusType, OpeningHour, OpeningHoursRule, PersistedOffer,
    PersistedOpeningHours, PersistedSubEvent, SubEvent,
};

pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).into());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).into())
}

pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Builds a context from persisted data. Every id is freshly generated and
/// missing fields fall back to defaults; this never fails.
pub fn hydrate(offer: &PersistedOffer) -> CalendarContext {
    let days = offer
        .sub_event
        .iter()
        .flatten()
        .filter_map(hydrate_day)
        .collect();

    let opening_hours = offer
        .opening_hours
        .iter()
        .flatten()
        .map(hydrate_opening_hour)
        .collect();

    CalendarContext {
        days,
        opening_hours,
        start_date: offer.start_date.as_deref().and_then(parse_timestamp),
        end_date: offer.end_date.as_deref().and_then(parse_timestamp),
    }
}

fn hydrate_day(sub_event: &PersistedSubEvent) -> Option<Day> {
    let start = sub_event.start_date.as_deref().and_then(parse_timestamp);
    let end = sub_event.end_date.as_deref().and_then(parse_timestamp);

    let (start_date, end_date) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (None, None) => {
            tracing::warn!(?sub_event, "skipping persisted occurrence without dates");
            return None;
        }
    };

    let status = sub_event
        .status
        .as_ref()
        .map(|s| OfferStatus {
            kind: s
                .kind
                .as_deref()
                .and_then(OfferStatusType::parse)
                .unwrap_or_default(),
            reason: s.reason_map(),
        })
        .unwrap_or_default();

    let booking_availability = BookingAvailability {
        kind: sub_event
            .booking_availability
            .as_ref()
            .and_then(|b| b.kind.as_deref())
            .and_then(BookingAvailabilityType::parse)
            .unwrap_or_default(),
    };

    Some(Day {
        status,
        booking_availability,
        ..Day::new(start_date, end_date)
    })
}

fn hydrate_opening_hour(rule: &PersistedOpeningHours) -> OpeningHour {
    let days: Vec<DayOfWeek> = rule
        .day_of_week
        .iter()
        .flatten()
        .filter_map(|d| DayOfWeek::parse(d))
        .collect();
    OpeningHour::new(
        rule.opens.as_deref().unwrap_or("00:00"),
        rule.closes.as_deref().unwrap_or("23:59"),
        days,
    )
}

pub fn derive(context: &CalendarContext, calendar_type: CalendarType) -> CalendarPayload {
    if calendar_type.uses_sub_events() {
        let sub_event: Vec<SubEvent> = context.days.iter().map(to_wire_occurrence).collect();
        let calendar_type = if sub_event.len() > 1 {
            CalendarType::Multiple
        } else {
            calendar_type
        };
        CalendarPayload {
            calendar_type,
            sub_event: Some(sub_event),
            opening_hours: None,
            start_date: None,
            end_date: None,
        }
    } else {
        let periodic = calendar_type == CalendarType::Periodic;
        CalendarPayload {
            calendar_type,
            sub_event: None,
            opening_hours: Some(context.opening_hours.iter().map(to_wire_rule).collect()),
            start_date: context
                .start_date
                .as_ref()
                .filter(|_| periodic)
                .map(format_timestamp),
            end_date: context
                .end_date
                .as_ref()
                .filter(|_| periodic)
                .map(format_timestamp),
        }
    }
}

fn to_wire_occurrence(day: &Day) -> SubEvent {
    SubEvent {
        start_date: format_timestamp(&day.start_date),
        end_date: format_timestamp(&day.end_date),
        booking_availability: day.booking_availability,
        status: day.status.clone(),
    }
}

fn to_wire_rule(rule: &OpeningHour) -> OpeningHoursRule {
    OpeningHoursRule {
        opens: rule.opens.clone(),
        closes: rule.closes.clone(),
        day_of_week: rule.day_of_week.clone(),
    }
}
