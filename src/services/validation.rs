use chrono::{DateTime, FixedOffset, NaiveTime};

use crate::models::{CalendarContext, CalendarType, OpeningHour};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("opening hours rule {index} has no days selected")]
    NoDaysSelected { index: usize },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("opening hours rule {index} closes before it opens")]
    ClosesBeforeOpens { index: usize },

    #[error("day {id} ends before it starts")]
    DayEndsBeforeStart { id: String },

    #[error("a periodic calendar needs both a start and an end date")]
    MissingPeriod,

    #[error("the period ends before it starts")]
    PeriodEndsBeforeStart,
}

pub fn validate_opening_hours(rules: &[OpeningHour]) -> Result<(), ValidationError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.day_of_week.is_empty() {
            return Err(ValidationError::NoDaysSelected { index });
        }
        let opens = parse_time(&rule.opens)?;
        let closes = parse_time(&rule.closes)?;
        if opens >= closes {
            return Err(ValidationError::ClosesBeforeOpens { index });
        }
    }
    Ok(())
}

pub fn validate_period(
    start: Option<&DateTime<FixedOffset>>,
    end: Option<&DateTime<FixedOffset>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::PeriodEndsBeforeStart),
        (Some(_), Some(_)) => Ok(()),
        _ => Err(ValidationError::MissingPeriod),
    }
}

pub fn validate_for_submit(
    context: &CalendarContext,
    calendar_type: CalendarType,
) -> Result<(), ValidationError> {
    match calendar_type {
        CalendarType::Single | CalendarType::Multiple => {
            for day in &context.days {
                if day.end_date < day.start_date {
                    return Err(ValidationError::DayEndsBeforeStart { id: day.id.clone() });
                }
            }
            Ok(())
        }
        CalendarType::Periodic => {
            validate_period(context.start_date.as_ref(), context.end_date.as_ref())?;
            validate_opening_hours(&context.opening_hours)
        }
        CalendarType::Permanent => validate_opening_hours(&context.opening_hours),
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::InvalidTime(s.to_string());
    let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
