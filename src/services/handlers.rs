use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::models::{
    BookingAvailability, CalendarContext, CalendarPayload, CalendarType, Day, OfferScope,
    OfferStatus, OpeningHour, PersistedOffer,
};
use crate::services::conversion;
use crate::services::machine::{
    CalendarError, CalendarEvent, CalendarMachine, CalendarState, TransitionRules,
};
use crate::services::projection;

/// Calendar editing session for one offering.
///
/// Every `handle_*` call either applies completely or returns the reason it
/// was rejected, in which case nothing changed.
#[derive(Debug, Clone)]
pub struct CalendarSession {
    scope: OfferScope,
    machine: CalendarMachine,
}

impl CalendarSession {
    pub fn new(scope: OfferScope) -> Self {
        Self {
            scope,
            machine: CalendarMachine::new(TransitionRules::for_scope(scope)),
        }
    }

    pub fn scope(&self) -> OfferScope {
        self.scope
    }

    pub fn state(&self) -> CalendarState {
        self.machine.state()
    }

    pub fn context(&self) -> &CalendarContext {
        self.machine.context()
    }

    // ── Selectors ──

    pub fn is_idle(&self) -> bool {
        self.state().is_idle()
    }

    pub fn is_one_or_more_days(&self) -> bool {
        self.state().is_one_or_more_days()
    }

    pub fn is_single(&self) -> bool {
        self.state().is_single()
    }

    pub fn is_multiple(&self) -> bool {
        self.state().is_multiple()
    }

    pub fn is_fixed_days(&self) -> bool {
        self.state().is_fixed_days()
    }

    pub fn is_periodic(&self) -> bool {
        self.state().is_periodic()
    }

    pub fn is_permanent(&self) -> bool {
        self.state().is_permanent()
    }

    pub fn days(&self) -> &[Day] {
        &self.context().days
    }

    pub fn opening_hours(&self) -> &[OpeningHour] {
        &self.context().opening_hours
    }

    pub fn start_date(&self) -> Option<DateTime<FixedOffset>> {
        self.context().start_date
    }

    pub fn end_date(&self) -> Option<DateTime<FixedOffset>> {
        self.context().end_date
    }

    pub fn calendar_type(&self) -> Option<CalendarType> {
        projection::derive_calendar_type(&self.state())
    }

    pub fn to_payload(&self) -> Option<CalendarPayload> {
        self.calendar_type()
            .map(|calendar_type| conversion::derive(self.context(), calendar_type))
    }

    pub fn reset(&mut self) {
        self.machine.reset();
    }

    // ── Handlers ──

    pub fn handle_choose_one_or_more_days(&mut self) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChooseOneOrMoreDays)
    }

    pub fn handle_choose_fixed_days(&mut self) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChooseFixedDays)
    }

    pub fn handle_add_day(&mut self) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::AddDay)
    }

    pub fn handle_delete_day(&mut self, id: &str) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::DeleteDay { id: id.to_string() })
    }

    pub fn handle_change_start_date_of_day(
        &mut self,
        id: &str,
        date: NaiveDate,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeStartDateOfDay {
            id: id.to_string(),
            date,
        })
    }

    pub fn handle_change_end_date_of_day(
        &mut self,
        id: &str,
        date: NaiveDate,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeEndDateOfDay {
            id: id.to_string(),
            date,
        })
    }

    pub fn handle_change_start_time(
        &mut self,
        id: &str,
        hour: u32,
        minute: u32,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeStartTime {
            id: id.to_string(),
            hour,
            minute,
        })
    }

    pub fn handle_change_end_time(
        &mut self,
        id: &str,
        hour: u32,
        minute: u32,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeEndTime {
            id: id.to_string(),
            hour,
            minute,
        })
    }

    pub fn handle_change_status_of_day(
        &mut self,
        id: &str,
        status: OfferStatus,
    ) -> Result<(), CalendarError> {
        tracing::debug!(day_id = id, status = status.kind.as_str(), "changing status of day");
        self.machine.send(CalendarEvent::ChangeStatusOfDay {
            id: id.to_string(),
            status,
        })
    }

    pub fn handle_change_booking_availability_of_day(
        &mut self,
        id: &str,
        availability: BookingAvailability,
    ) -> Result<(), CalendarError> {
        self.machine
            .send(CalendarEvent::ChangeBookingAvailabilityOfDay {
                id: id.to_string(),
                availability,
            })
    }

    pub fn handle_change_start_date(
        &mut self,
        date: DateTime<FixedOffset>,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeStartDate { date })
    }

    pub fn handle_change_end_date(
        &mut self,
        date: DateTime<FixedOffset>,
    ) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChangeEndDate { date })
    }

    pub fn handle_choose_permanent(&mut self) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChoosePermanent)
    }

    pub fn handle_choose_with_start_and_end_date(&mut self) -> Result<(), CalendarError> {
        self.machine.send(CalendarEvent::ChooseWithStartAndEndDate)
    }

    pub fn handle_change_opening_hours(
        &mut self,
        opening_hours: Vec<OpeningHour>,
    ) -> Result<(), CalendarError> {
        self.machine
            .send(CalendarEvent::ChangeOpeningHours { opening_hours })
    }

    pub fn handle_load_initial_context(
        &mut self,
        offer: Option<&PersistedOffer>,
    ) -> Result<(), CalendarError> {
        let offer = offer.filter(|o| !o.is_empty());
        self.machine.send(CalendarEvent::LoadInitialContext {
            context: offer.map(conversion::hydrate),
            calendar_type: offer.and_then(|o| o.calendar_type()),
        })
    }
}
