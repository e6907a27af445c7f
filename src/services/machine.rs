use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Serialize, Serializer};

use crate::models::{
    BookingAvailability, CalendarContext, CalendarType, Day, OfferScope, OfferStatus, OpeningHour,
};
use crate::services::projection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysMode {
    Single,
    Multiple,
}

impl DaysMode {
    pub fn for_count(count: usize) -> Self {
        if count > 1 {
            DaysMode::Multiple
        } else {
            DaysMode::Single
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedMode {
    Periodic,
    Permanent,
}

/// How the offering is scheduled. The sub-mode of `OneOrMoreDays` always
/// matches the number of days in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarState {
    Idle,
    OneOrMoreDays(DaysMode),
    FixedDays(FixedMode),
}

impl CalendarState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarState::Idle => "idle",
            CalendarState::OneOrMoreDays(DaysMode::Single) => "oneOrMoreDays.single",
            CalendarState::OneOrMoreDays(DaysMode::Multiple) => "oneOrMoreDays.multiple",
            CalendarState::FixedDays(FixedMode::Periodic) => "fixedDays.periodic",
            CalendarState::FixedDays(FixedMode::Permanent) => "fixedDays.permanent",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CalendarState::Idle)
    }

    pub fn is_one_or_more_days(&self) -> bool {
        matches!(self, CalendarState::OneOrMoreDays(_))
    }

    pub fn is_single(&self) -> bool {
        matches!(self, CalendarState::OneOrMoreDays(DaysMode::Single))
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, CalendarState::OneOrMoreDays(DaysMode::Multiple))
    }

    pub fn is_fixed_days(&self) -> bool {
        matches!(self, CalendarState::FixedDays(_))
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, CalendarState::FixedDays(FixedMode::Periodic))
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, CalendarState::FixedDays(FixedMode::Permanent))
    }
}

impl Serialize for CalendarState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("{event} is not allowed in state {state}")]
    InvalidTransition {
        event: &'static str,
        state: &'static str,
    },

    #[error("the last remaining day cannot be deleted")]
    LastDay,

    #[error("unknown day: {0}")]
    UnknownDay(String),

    #[error("day {0} is not available and cannot be edited")]
    DayUnavailable(String),

    #[error("invalid time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("places can only be scheduled with opening hours")]
    DisabledForPlaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRules {
    pub one_or_more_days: bool,
}

impl TransitionRules {
    pub fn for_scope(scope: OfferScope) -> Self {
        Self {
            one_or_more_days: scope != OfferScope::Place,
        }
    }

    pub fn initial_state(&self) -> CalendarState {
        if self.one_or_more_days {
            CalendarState::Idle
        } else {
            CalendarState::FixedDays(FixedMode::Permanent)
        }
    }
}

#[derive(Debug, Clone)]
pub enum CalendarEvent {
    ChooseOneOrMoreDays,
    ChooseFixedDays,
    AddDay,
    DeleteDay {
        id: String,
    },
    ChangeStartDateOfDay {
        id: String,
        date: NaiveDate,
    },
    ChangeEndDateOfDay {
        id: String,
        date: NaiveDate,
    },
    ChangeStartTime {
        id: String,
        hour: u32,
        minute: u32,
    },
    ChangeEndTime {
        id: String,
        hour: u32,
        minute: u32,
    },
    ChangeStatusOfDay {
        id: String,
        status: OfferStatus,
    },
    ChangeBookingAvailabilityOfDay {
        id: String,
        availability: BookingAvailability,
    },
    ChangeStartDate {
        date: DateTime<FixedOffset>,
    },
    ChangeEndDate {
        date: DateTime<FixedOffset>,
    },
    ChoosePermanent,
    ChooseWithStartAndEndDate,
    ChangeOpeningHours {
        opening_hours: Vec<OpeningHour>,
    },
    LoadInitialContext {
        context: Option<CalendarContext>,
        calendar_type: Option<CalendarType>,
    },
}

impl CalendarEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CalendarEvent::ChooseOneOrMoreDays => "chooseOneOrMoreDays",
            CalendarEvent::ChooseFixedDays => "chooseFixedDays",
            CalendarEvent::AddDay => "addDay",
            CalendarEvent::DeleteDay { .. } => "deleteDay",
            CalendarEvent::ChangeStartDateOfDay { .. } => "changeStartDateOfDay",
            CalendarEvent::ChangeEndDateOfDay { .. } => "changeEndDateOfDay",
            CalendarEvent::ChangeStartTime { .. } => "changeStartTime",
            CalendarEvent::ChangeEndTime { .. } => "changeEndTime",
            CalendarEvent::ChangeStatusOfDay { .. } => "changeStatusOfDay",
            CalendarEvent::ChangeBookingAvailabilityOfDay { .. } => {
                "changeBookingAvailabilityOfDay"
            }
            CalendarEvent::ChangeStartDate { .. } => "changeStartDate",
            CalendarEvent::ChangeEndDate { .. } => "changeEndDate",
            CalendarEvent::ChoosePermanent => "choosePermanent",
            CalendarEvent::ChooseWithStartAndEndDate => "chooseWithStartAndEndDate",
            CalendarEvent::ChangeOpeningHours { .. } => "changeOpeningHours",
            CalendarEvent::LoadInitialContext { .. } => "loadInitialContext",
        }
    }
}

/// Computes the next state and context. The input context is never touched;
/// a rejected event leaves the caller with exactly what it had.
pub fn transition(
    state: CalendarState,
    context: &CalendarContext,
    event: CalendarEvent,
    rules: &TransitionRules,
    now: DateTime<FixedOffset>,
) -> Result<(CalendarState, CalendarContext), CalendarError> {
    let mut ctx = context.clone();

    let next = match (state, event) {
        (_, CalendarEvent::ChooseOneOrMoreDays) => {
            if !rules.one_or_more_days {
                return Err(CalendarError::DisabledForPlaces);
            }
            if ctx.days.is_empty() {
                ctx.days.push(day_spanning(now));
            }
            days_state(&ctx)
        }

        (CalendarState::FixedDays(mode), CalendarEvent::ChooseFixedDays) => {
            CalendarState::FixedDays(mode)
        }

        (_, CalendarEvent::ChooseFixedDays) => {
            seed_period(&mut ctx, now);
            CalendarState::FixedDays(FixedMode::Periodic)
        }

        (CalendarState::OneOrMoreDays(_), CalendarEvent::AddDay) => {
            let day = match ctx.days.last() {
                Some(last) => Day::new(last.start_date, last.end_date),
                None => day_spanning(now),
            };
            ctx.days.push(day);
            days_state(&ctx)
        }

        (CalendarState::OneOrMoreDays(_), CalendarEvent::DeleteDay { id }) => {
            let index = ctx
                .days
                .iter()
                .position(|d| d.id == id)
                .ok_or(CalendarError::UnknownDay(id))?;
            if ctx.days.len() <= 1 {
                return Err(CalendarError::LastDay);
            }
            ctx.days.remove(index);
            days_state(&ctx)
        }

        (_, CalendarEvent::ChangeStartDateOfDay { id, date }) => {
            let day = ctx.day_mut(&id).ok_or(CalendarError::UnknownDay(id))?;
            day.start_date = with_date(day.start_date, date);
            state
        }

        (_, CalendarEvent::ChangeEndDateOfDay { id, date }) => {
            let day = ctx.day_mut(&id).ok_or(CalendarError::UnknownDay(id))?;
            day.end_date = with_date(day.end_date, date);
            state
        }

        (_, CalendarEvent::ChangeStartTime { id, hour, minute }) => {
            let day = editable_day(&mut ctx, id)?;
            day.start_date = with_time(day.start_date, hour, minute)?;
            state
        }

        (_, CalendarEvent::ChangeEndTime { id, hour, minute }) => {
            let day = editable_day(&mut ctx, id)?;
            day.end_date = with_time(day.end_date, hour, minute)?;
            state
        }

        (CalendarState::OneOrMoreDays(_), CalendarEvent::ChangeStatusOfDay { id, status }) => {
            let day = ctx.day_mut(&id).ok_or(CalendarError::UnknownDay(id))?;
            day.status = status;
            state
        }

        (
            CalendarState::OneOrMoreDays(_),
            CalendarEvent::ChangeBookingAvailabilityOfDay { id, availability },
        ) => {
            let day = ctx.day_mut(&id).ok_or(CalendarError::UnknownDay(id))?;
            day.booking_availability = availability;
            state
        }

        (CalendarState::FixedDays(FixedMode::Periodic), CalendarEvent::ChangeStartDate { date }) => {
            ctx.start_date = Some(date);
            state
        }

        (CalendarState::FixedDays(FixedMode::Periodic), CalendarEvent::ChangeEndDate { date }) => {
            ctx.end_date = Some(date);
            state
        }

        // Bounding dates stay in the context; only the payload drops them.
        (CalendarState::FixedDays(_), CalendarEvent::ChoosePermanent) => {
            CalendarState::FixedDays(FixedMode::Permanent)
        }

        (CalendarState::FixedDays(_), CalendarEvent::ChooseWithStartAndEndDate) => {
            seed_period(&mut ctx, now);
            CalendarState::FixedDays(FixedMode::Periodic)
        }

        (CalendarState::FixedDays(_), CalendarEvent::ChangeOpeningHours { opening_hours }) => {
            ctx.opening_hours = opening_hours;
            state
        }

        (_, CalendarEvent::LoadInitialContext { context, calendar_type }) => match context {
            None => {
                ctx = CalendarContext::default();
                rules.initial_state()
            }
            Some(loaded) => {
                ctx = loaded;
                let next = projection::map_persisted_type_to_state(calendar_type, &ctx, rules);
                if next.is_one_or_more_days() && ctx.days.is_empty() {
                    ctx.days.push(day_spanning(now));
                }
                next
            }
        },

        (state, event) => {
            return Err(CalendarError::InvalidTransition {
                event: event.name(),
                state: state.as_str(),
            })
        }
    };

    Ok((next, ctx))
}

#[derive(Debug, Clone)]
pub struct CalendarMachine {
    state: CalendarState,
    context: CalendarContext,
    rules: TransitionRules,
}

impl CalendarMachine {
    pub fn new(rules: TransitionRules) -> Self {
        Self {
            state: rules.initial_state(),
            context: CalendarContext::default(),
            rules,
        }
    }

    pub fn state(&self) -> CalendarState {
        self.state
    }

    pub fn context(&self) -> &CalendarContext {
        &self.context
    }

    pub fn send(&mut self, event: CalendarEvent) -> Result<(), CalendarError> {
        self.send_at(event, chrono::Local::now().into())
    }

    pub fn send_at(
        &mut self,
        event: CalendarEvent,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CalendarError> {
        let name = event.name();
        match transition(self.state, &self.context, event, &self.rules, now) {
            Ok((state, context)) => {
                tracing::debug!(
                    event = name,
                    from = self.state.as_str(),
                    to = state.as_str(),
                    "calendar transition"
                );
                self.state = state;
                self.context = context;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(
                    event = name,
                    state = self.state.as_str(),
                    reason = %e,
                    "calendar event rejected"
                );
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = self.rules.initial_state();
        self.context = CalendarContext::default();
    }
}

fn days_state(ctx: &CalendarContext) -> CalendarState {
    CalendarState::OneOrMoreDays(DaysMode::for_count(ctx.days.len()))
}

fn editable_day(ctx: &mut CalendarContext, id: String) -> Result<&mut Day, CalendarError> {
    let day = ctx
        .day_mut(&id)
        .ok_or_else(|| CalendarError::UnknownDay(id.clone()))?;
    if !day.status.is_available() {
        return Err(CalendarError::DayUnavailable(id));
    }
    Ok(day)
}

fn at_time(dt: DateTime<FixedOffset>, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
    dt.date_naive()
        .and_time(time)
        .and_local_timezone(*dt.offset())
        .single()
}

fn with_date(dt: DateTime<FixedOffset>, date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_time(dt.time())
        .and_local_timezone(*dt.offset())
        .single()
        .unwrap_or(dt)
}

fn with_time(
    dt: DateTime<FixedOffset>,
    hour: u32,
    minute: u32,
) -> Result<DateTime<FixedOffset>, CalendarError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .and_then(|time| at_time(dt, time))
        .ok_or(CalendarError::InvalidTime { hour, minute })
}

fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    NaiveTime::from_hms_opt(0, 0, 0)
        .and_then(|t| at_time(now, t))
        .unwrap_or(now)
}

fn end_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    NaiveTime::from_hms_opt(23, 59, 59)
        .and_then(|t| at_time(now, t))
        .unwrap_or(now)
}

fn day_spanning(now: DateTime<FixedOffset>) -> Day {
    Day::new(start_of_day(now), end_of_day(now))
}

fn seed_period(ctx: &mut CalendarContext, now: DateTime<FixedOffset>) {
    if ctx.start_date.is_none() {
        ctx.start_date = Some(start_of_day(now));
    }
    if ctx.end_date.is_none() {
        ctx.end_date = Some(end_of_day(now));
    }
}
