pub mod calendar;
pub mod offer;

pub use calendar::{
    BookingAvailability, BookingAvailabilityType, CalendarContext, CalendarType, Day, DayOfWeek,
    OfferStatus, OfferStatusType, OpeningHour,
};
pub use offer::{
    CalendarPayload, OfferScope, OpeningHoursRule, PersistedOffer, PersistedOpeningHours,
    PersistedSubEvent, SubEvent,
};
