use chrono::Utc;
use rusqlite::{params, Connection};

use crate::models::{CalendarPayload, OfferScope, PersistedOffer};

// ── Offer calendars ──

pub fn get_offer_calendar(
    conn: &Connection,
    scope: OfferScope,
    offer_id: &str,
) -> rusqlite::Result<Option<PersistedOffer>> {
    let mut stmt = conn.prepare("SELECT calendar FROM offers WHERE scope = ?1 AND id = ?2")?;

    let result = stmt.query_row(params![scope.as_str(), offer_id], |row| {
        row.get::<_, String>(0)
    });

    match result {
        Ok(json) => {
            let offer = serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(
                    offer_id,
                    scope = scope.as_str(),
                    error = %e,
                    "stored calendar is malformed, loading it as empty"
                );
                PersistedOffer::default()
            });
            Ok(Some(offer))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn save_offer_calendar(
    conn: &Connection,
    scope: OfferScope,
    offer_id: &str,
    payload: &CalendarPayload,
) -> anyhow::Result<()> {
    let calendar = serde_json::to_string(payload)?;
    let updated_at = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO offers (scope, id, calendar, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(scope, id) DO UPDATE SET
           calendar = excluded.calendar,
           updated_at = excluded.updated_at",
        params![scope.as_str(), offer_id, calendar, updated_at],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{CalendarType, DayOfWeek, OpeningHoursRule};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn permanent_payload() -> CalendarPayload {
        CalendarPayload {
            calendar_type: CalendarType::Permanent,
            sub_event: None,
            opening_hours: Some(vec![OpeningHoursRule {
                opens: "10:00".to_string(),
                closes: "18:00".to_string(),
                day_of_week: vec![DayOfWeek::Saturday, DayOfWeek::Sunday],
            }]),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_missing_offer() {
        let conn = setup_db();
        let offer = get_offer_calendar(&conn, OfferScope::Place, "nope").unwrap();
        assert!(offer.is_none());
    }

    #[test]
    fn test_save_and_read_back() {
        let conn = setup_db();
        save_offer_calendar(&conn, OfferScope::Place, "p1", &permanent_payload()).unwrap();

        let offer = get_offer_calendar(&conn, OfferScope::Place, "p1")
            .unwrap()
            .unwrap();
        assert_eq!(offer.calendar_type(), Some(CalendarType::Permanent));
        let hours = offer.opening_hours.unwrap();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].opens.as_deref(), Some("10:00"));

        // Scope is part of the key.
        assert!(get_offer_calendar(&conn, OfferScope::Event, "p1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let conn = setup_db();
        save_offer_calendar(&conn, OfferScope::Place, "p1", &permanent_payload()).unwrap();
        let mut payload = permanent_payload();
        payload.opening_hours = Some(vec![]);
        save_offer_calendar(&conn, OfferScope::Place, "p1", &payload).unwrap();

        let offer = get_offer_calendar(&conn, OfferScope::Place, "p1")
            .unwrap()
            .unwrap();
        assert_eq!(offer.opening_hours.map(|h| h.len()), Some(0));
    }

    #[test]
    fn test_database_failure_is_an_error() {
        let conn = setup_db();
        conn.execute("DROP TABLE offers", []).unwrap();
        assert!(get_offer_calendar(&conn, OfferScope::Event, "e1").is_err());
    }

    #[test]
    fn test_malformed_record_reads_as_empty() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO offers (scope, id, calendar) VALUES ('events', 'e1', 'not json')",
            [],
        )
        .unwrap();
        let offer = get_offer_calendar(&conn, OfferScope::Event, "e1")
            .unwrap()
            .unwrap();
        assert!(offer.is_empty());
    }
}
