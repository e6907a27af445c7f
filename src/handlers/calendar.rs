use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    BookingAvailability, CalendarContext, CalendarPayload, CalendarType, OfferScope, OfferStatus,
    OpeningHour,
};
use crate::services::handlers::CalendarSession;
use crate::services::machine::CalendarState;
use crate::services::validation;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn session_not_found(scope: OfferScope, offer_id: &str) -> AppError {
    AppError::NotFound(format!(
        "no calendar session for {}/{offer_id}",
        scope.as_str()
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    offer_id: String,
    scope: OfferScope,
    state: CalendarState,
    calendar_type: Option<CalendarType>,
    is_idle: bool,
    is_one_or_more_days: bool,
    is_single: bool,
    is_multiple: bool,
    is_fixed_days: bool,
    is_periodic: bool,
    is_permanent: bool,
    context: CalendarContext,
}

impl CalendarView {
    fn new(offer_id: &str, session: &CalendarSession) -> Self {
        Self {
            offer_id: offer_id.to_string(),
            scope: session.scope(),
            state: session.state(),
            calendar_type: session.calendar_type(),
            is_idle: session.is_idle(),
            is_one_or_more_days: session.is_one_or_more_days(),
            is_single: session.is_single(),
            is_multiple: session.is_multiple(),
            is_fixed_days: session.is_fixed_days(),
            is_periodic: session.is_periodic(),
            is_permanent: session.is_permanent(),
            context: session.context().clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CalendarAction {
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
        #[serde(rename = "bookingAvailability")]
        booking_availability: BookingAvailability,
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
        #[serde(rename = "openingHours")]
        opening_hours: Vec<OpeningHour>,
    },
}

fn apply_action(session: &mut CalendarSession, action: CalendarAction) -> Result<(), AppError> {
    let result = match action {
        CalendarAction::ChooseOneOrMoreDays => session.handle_choose_one_or_more_days(),
        CalendarAction::ChooseFixedDays => session.handle_choose_fixed_days(),
        CalendarAction::AddDay => session.handle_add_day(),
        CalendarAction::DeleteDay { id } => session.handle_delete_day(&id),
        CalendarAction::ChangeStartDateOfDay { id, date } => {
            session.handle_change_start_date_of_day(&id, date)
        }
        CalendarAction::ChangeEndDateOfDay { id, date } => {
            session.handle_change_end_date_of_day(&id, date)
        }
        CalendarAction::ChangeStartTime { id, hour, minute } => {
            session.handle_change_start_time(&id, hour, minute)
        }
        CalendarAction::ChangeEndTime { id, hour, minute } => {
            session.handle_change_end_time(&id, hour, minute)
        }
        CalendarAction::ChangeStatusOfDay { id, status } => {
            session.handle_change_status_of_day(&id, status)
        }
        CalendarAction::ChangeBookingAvailabilityOfDay {
            id,
            booking_availability,
        } => session.handle_change_booking_availability_of_day(&id, booking_availability),
        CalendarAction::ChangeStartDate { date } => session.handle_change_start_date(date),
        CalendarAction::ChangeEndDate { date } => session.handle_change_end_date(date),
        CalendarAction::ChoosePermanent => session.handle_choose_permanent(),
        CalendarAction::ChooseWithStartAndEndDate => {
            session.handle_choose_with_start_and_end_date()
        }
        CalendarAction::ChangeOpeningHours { opening_hours } => {
            // The draft must be complete before it replaces the live rules.
            validation::validate_opening_hours(&opening_hours)?;
            session.handle_change_opening_hours(opening_hours)
        }
    };
    result.map_err(AppError::from)
}

// POST /api/:scope/:id/calendar/session
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
) -> Result<Json<CalendarView>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let persisted = {
        let db = state.db.lock().unwrap();
        queries::get_offer_calendar(&db, scope, &offer_id)?
    };

    let mut session = CalendarSession::new(scope);
    session.handle_load_initial_context(persisted.as_ref())?;

    let view = CalendarView::new(&offer_id, &session);
    let mut sessions = state.sessions.lock().unwrap();
    sessions.insert((scope, offer_id.clone()), session);

    tracing::info!(
        offer_id = %offer_id,
        scope = scope.as_str(),
        state = view.state.as_str(),
        open_sessions = sessions.open_count(),
        "calendar session opened"
    );

    Ok(Json(view))
}

// POST /api/:scope/:id/calendar/session/reset
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
) -> Result<Json<CalendarView>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let mut sessions = state.sessions.lock().unwrap();
    let session = sessions
        .get_mut(&(scope, offer_id.clone()))
        .ok_or_else(|| session_not_found(scope, &offer_id))?;
    session.reset();

    tracing::info!(offer_id = %offer_id, scope = scope.as_str(), "calendar session reset");
    Ok(Json(CalendarView::new(&offer_id, session)))
}

// DELETE /api/:scope/:id/calendar/session
pub async fn discard_session(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let removed = state
        .sessions
        .lock()
        .unwrap()
        .remove(&(scope, offer_id.clone()));
    match removed {
        Some(_) => {
            tracing::info!(offer_id = %offer_id, scope = scope.as_str(), "calendar session discarded");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(scope, &offer_id)),
    }
}

// GET /api/:scope/:id/calendar
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
) -> Result<Json<CalendarView>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let mut sessions = state.sessions.lock().unwrap();
    let session = sessions
        .get_mut(&(scope, offer_id.clone()))
        .ok_or_else(|| session_not_found(scope, &offer_id))?;
    Ok(Json(CalendarView::new(&offer_id, session)))
}

// POST /api/:scope/:id/calendar/actions
pub async fn apply_calendar_action(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
    Json(action): Json<CalendarAction>,
) -> Result<Json<CalendarView>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let mut sessions = state.sessions.lock().unwrap();
    let session = sessions
        .get_mut(&(scope, offer_id.clone()))
        .ok_or_else(|| session_not_found(scope, &offer_id))?;

    tracing::debug!(offer_id = %offer_id, ?action, "applying calendar action");
    apply_action(session, action)?;

    Ok(Json(CalendarView::new(&offer_id, session)))
}

// PUT /api/:scope/:id/calendar
pub async fn submit_calendar(
    State(state): State<Arc<AppState>>,
    Path((scope, offer_id)): Path<(OfferScope, String)>,
    headers: HeaderMap,
) -> Result<Json<CalendarPayload>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let payload = {
        let mut sessions = state.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&(scope, offer_id.clone()))
            .ok_or_else(|| session_not_found(scope, &offer_id))?;
        let calendar_type = session.calendar_type().ok_or(AppError::NothingToSave)?;
        validation::validate_for_submit(session.context(), calendar_type)?;
        session.to_payload().ok_or(AppError::NothingToSave)?
    };

    // Edits may keep landing in the session while this is in flight.
    state
        .sink
        .save_calendar(scope, &offer_id, &payload)
        .await
        .map_err(|e| {
            tracing::error!(offer_id = %offer_id, error = %e, "failed to save calendar");
            AppError::Persistence(e.to_string())
        })?;

    tracing::info!(
        offer_id = %offer_id,
        scope = scope.as_str(),
        calendar_type = payload.calendar_type.as_str(),
        "calendar saved"
    );
    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action: CalendarAction = serde_json::from_str(r#"{"action":"addDay"}"#).unwrap();
        assert!(matches!(action, CalendarAction::AddDay));

        let action: CalendarAction = serde_json::from_str(
            r#"{"action":"changeStartTime","id":"d1","hour":9,"minute":30}"#,
        )
        .unwrap();
        assert!(matches!(
            action,
            CalendarAction::ChangeStartTime { hour: 9, minute: 30, .. }
        ));

        let action: CalendarAction = serde_json::from_str(
            r#"{"action":"changeOpeningHours","openingHours":[{"opens":"09:00","closes":"17:00","dayOfWeek":["monday"]}]}"#,
        )
        .unwrap();
        match action {
            CalendarAction::ChangeOpeningHours { opening_hours } => {
                assert_eq!(opening_hours.len(), 1)
            }
            other => panic!("unexpected action: {other:?}"),
        }

        assert!(serde_json::from_str::<CalendarAction>(r#"{"action":"fly"}"#).is_err());
    }

    #[test]
    fn test_check_auth() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            check_auth(&headers, "secret"),
            Err(AppError::Unauthorized)
        ));
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_ok());
    }

    #[test]
    fn test_invalid_opening_hours_never_reach_the_session() {
        let mut session = CalendarSession::new(OfferScope::Place);
        let err = apply_action(
            &mut session,
            CalendarAction::ChangeOpeningHours {
                opening_hours: vec![OpeningHour::new("09:00", "17:00", vec![])],
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(session.opening_hours().is_empty());
    }
}
