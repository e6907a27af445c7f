use crate::models::{CalendarContext, CalendarType};
use crate::services::machine::{CalendarState, DaysMode, FixedMode, TransitionRules};

pub fn derive_calendar_type(state: &CalendarState) -> Option<CalendarType> {
    match state {
        CalendarState::Idle => None,
        CalendarState::OneOrMoreDays(DaysMode::Single) => Some(CalendarType::Single),
        CalendarState::OneOrMoreDays(DaysMode::Multiple) => Some(CalendarType::Multiple),
        CalendarState::FixedDays(FixedMode::Periodic) => Some(CalendarType::Periodic),
        CalendarState::FixedDays(FixedMode::Permanent) => Some(CalendarType::Permanent),
    }
}

/// State to enter when loading persisted data.
///
/// Day-based types are sized by the actual number of days so the
/// single/multiple tag can never disagree with the context. Without a
/// type, days win over opening hours; opening hours without a bounding
/// period are permanent. Places are always coerced into fixed days.
pub fn map_persisted_type_to_state(
    calendar_type: Option<CalendarType>,
    context: &CalendarContext,
    rules: &TransitionRules,
) -> CalendarState {
    let by_days = CalendarState::OneOrMoreDays(DaysMode::for_count(context.days.len()));
    let by_period = if context.has_period() {
        CalendarState::FixedDays(FixedMode::Periodic)
    } else {
        CalendarState::FixedDays(FixedMode::Permanent)
    };

    match calendar_type {
        Some(CalendarType::Periodic) => CalendarState::FixedDays(FixedMode::Periodic),
        Some(CalendarType::Permanent) => CalendarState::FixedDays(FixedMode::Permanent),
        Some(CalendarType::Single | CalendarType::Multiple) if rules.one_or_more_days => by_days,
        Some(CalendarType::Single | CalendarType::Multiple) => by_period,
        None if context.is_empty() => rules.initial_state(),
        None if !context.days.is_empty() && rules.one_or_more_days => by_days,
        None => by_period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, DayOfWeek, OfferScope, OpeningHour};
    use chrono::DateTime;

    fn day() -> Day {
        Day::new(
            DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap(),
            DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap(),
        )
    }

    fn event_rules() -> TransitionRules {
        TransitionRules::for_scope(OfferScope::Event)
    }

    #[test]
    fn test_derive_calendar_type() {
        assert_eq!(derive_calendar_type(&CalendarState::Idle), None);
        assert_eq!(
            derive_calendar_type(&CalendarState::OneOrMoreDays(DaysMode::Single)),
            Some(CalendarType::Single)
        );
        assert_eq!(
            derive_calendar_type(&CalendarState::OneOrMoreDays(DaysMode::Multiple)),
            Some(CalendarType::Multiple)
        );
        assert_eq!(
            derive_calendar_type(&CalendarState::FixedDays(FixedMode::Periodic)),
            Some(CalendarType::Periodic)
        );
        assert_eq!(
            derive_calendar_type(&CalendarState::FixedDays(FixedMode::Permanent)),
            Some(CalendarType::Permanent)
        );
    }

    #[test]
    fn test_explicit_types_map_one_to_one() {
        let mut ctx = CalendarContext::default();
        ctx.days.push(day());
        let rules = event_rules();
        for calendar_type in [
            CalendarType::Single,
            CalendarType::Periodic,
            CalendarType::Permanent,
        ] {
            let state = map_persisted_type_to_state(Some(calendar_type), &ctx, &rules);
            assert_eq!(derive_calendar_type(&state), Some(calendar_type));
        }

        ctx.days.push(day());
        let state = map_persisted_type_to_state(Some(CalendarType::Multiple), &ctx, &rules);
        assert!(state.is_multiple());
    }

    #[test]
    fn test_untyped_defaults() {
        let rules = event_rules();

        let empty = CalendarContext::default();
        assert!(map_persisted_type_to_state(None, &empty, &rules).is_idle());

        let mut hours = CalendarContext::default();
        hours
            .opening_hours
            .push(OpeningHour::new("09:00", "17:00", vec![DayOfWeek::Monday]));
        assert!(map_persisted_type_to_state(None, &hours, &rules).is_permanent());

        hours.start_date = Some(DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap());
        assert!(map_persisted_type_to_state(None, &hours, &rules).is_periodic());

        let mut both = hours.clone();
        both.days.push(day());
        both.days.push(day());
        assert!(map_persisted_type_to_state(None, &both, &rules).is_multiple());
    }

    #[test]
    fn test_places_are_coerced_to_fixed_days() {
        let rules = TransitionRules::for_scope(OfferScope::Place);
        let mut ctx = CalendarContext::default();
        ctx.days.push(day());
        assert!(map_persisted_type_to_state(Some(CalendarType::Single), &ctx, &rules).is_permanent());
        assert!(map_persisted_type_to_state(None, &ctx, &rules).is_permanent());
        assert!(map_persisted_type_to_state(None, &CalendarContext::default(), &rules).is_permanent());
    }
}
