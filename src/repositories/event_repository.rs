// src/repositories/event_repository.rs
//
// Event persistence.
//
// Attendance changes flip the user's flag and move the attendee counter in
// one guarded UPDATE, so a full event or a repeated toggle changes nothing.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::values::{
    encode_optional_timestamp, encode_timestamp, get_optional_timestamp, get_parsed,
    get_timestamp,
};
use crate::db::ConnectionPool;
use crate::domain::{Event, EventCategory, RecordId};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCriteria {
    pub category: Option<EventCategory>,
    pub attending_only: bool,
    pub with_reminder_only: bool,
    /// Events starting strictly after this instant
    pub starts_after: Option<DateTime<Utc>>,
    /// Events whose span overlaps this window
    pub overlapping: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl EventCriteria {
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self {
            starts_after: Some(now),
            ..Self::default()
        }
    }

    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(category) = self.category {
            filter.eq("category", category.as_str().to_string());
        }
        if self.attending_only {
            filter.raw("is_user_attending = 1");
        }
        if self.with_reminder_only {
            filter.raw("has_reminder_set = 1");
        }
        if let Some(after) = self.starts_after {
            filter.with_values("start_date > ?", [encode_timestamp(&after).into()]);
        }
        if let Some((start, end)) = self.overlapping {
            filter.with_values(
                "start_date <= ? AND end_date >= ?",
                [encode_timestamp(&end).into(), encode_timestamp(&start).into()],
            );
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait EventRepository: Send + Sync {
    fn insert(&self, event: &Event) -> AppResult<RecordId>;
    fn update(&self, event: &Event) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Event>>;
    /// Ordered by start date, soonest first
    fn list(&self, criteria: &EventCriteria) -> AppResult<Vec<Event>>;
    fn list_page(
        &self,
        criteria: &EventCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Event>>;
    /// Sets the flag and bumps the counter unless already attending or full.
    /// Returns whether anything changed.
    fn mark_attending(&self, id: RecordId) -> AppResult<bool>;
    /// Clears the flag and lowers the counter (never below zero) if set.
    fn unmark_attending(&self, id: RecordId) -> AppResult<bool>;
    fn set_reminder(&self, id: RecordId, reminder_time: Option<DateTime<Utc>>) -> AppResult<()>;
}

pub struct SqliteEventRepository {
    pool: Arc<ConnectionPool>,
}

const EVENT_COLUMNS: &str = "id, title, description, image_path, location, start_date, end_date, \
     category, organizer, contact_email, contact_phone, website, is_free, ticket_price, \
     has_reminder_set, reminder_time, is_user_attending, max_attendees, current_attendees";

impl SqliteEventRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_event(row: &Row) -> Result<Event, rusqlite::Error> {
        Ok(Event {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            image_path: row.get("image_path")?,
            location: row.get("location")?,
            start_date: get_timestamp(row, "start_date")?,
            end_date: get_timestamp(row, "end_date")?,
            category: get_parsed(row, "category")?,
            organizer: row.get("organizer")?,
            contact_email: row.get("contact_email")?,
            contact_phone: row.get("contact_phone")?,
            website: row.get("website")?,
            is_free: row.get("is_free")?,
            ticket_price: row.get("ticket_price")?,
            has_reminder_set: row.get("has_reminder_set")?,
            reminder_time: get_optional_timestamp(row, "reminder_time")?,
            is_user_attending: row.get("is_user_attending")?,
            max_attendees: row.get("max_attendees")?,
            current_attendees: row.get("current_attendees")?,
        })
    }
}

impl EventRepository for SqliteEventRepository {
    fn insert(&self, event: &Event) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO events (title, description, image_path, location, start_date, end_date,
                 category, organizer, contact_email, contact_phone, website, is_free, ticket_price,
                 has_reminder_set, reminder_time, is_user_attending, max_attendees, current_attendees)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                event.title,
                event.description,
                event.image_path,
                event.location,
                encode_timestamp(&event.start_date),
                encode_timestamp(&event.end_date),
                event.category.as_str(),
                event.organizer,
                event.contact_email,
                event.contact_phone,
                event.website,
                event.is_free,
                event.ticket_price,
                event.has_reminder_set,
                encode_optional_timestamp(&event.reminder_time),
                event.is_user_attending,
                event.max_attendees,
                event.current_attendees,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, event: &Event) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE events SET title = ?2, description = ?3, image_path = ?4, location = ?5,
                 start_date = ?6, end_date = ?7, category = ?8, organizer = ?9,
                 contact_email = ?10, contact_phone = ?11, website = ?12, is_free = ?13,
                 ticket_price = ?14, has_reminder_set = ?15, reminder_time = ?16,
                 is_user_attending = ?17, max_attendees = ?18, current_attendees = ?19
             WHERE id = ?1",
            params![
                event.id,
                event.title,
                event.description,
                event.image_path,
                event.location,
                encode_timestamp(&event.start_date),
                encode_timestamp(&event.end_date),
                event.category.as_str(),
                event.organizer,
                event.contact_email,
                event.contact_phone,
                event.website,
                event.is_free,
                event.ticket_price,
                event.has_reminder_set,
                encode_optional_timestamp(&event.reminder_time),
                event.is_user_attending,
                event.max_attendees,
                event.current_attendees,
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Event>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS))?;
        match stmt.query_row(params![id], Self::row_to_event) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &EventCriteria) -> AppResult<Vec<Event>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM events{} ORDER BY start_date ASC, id ASC",
            EVENT_COLUMNS,
            filter.where_sql()
        ))?;
        let events = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn list_page(
        &self,
        criteria: &EventCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Event>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM events{} ORDER BY start_date ASC, id ASC LIMIT ? OFFSET ?",
            EVENT_COLUMNS,
            filter.where_sql()
        ))?;
        let events = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_event,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn mark_attending(&self, id: RecordId) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE events
             SET is_user_attending = 1, current_attendees = current_attendees + 1
             WHERE id = ?1 AND is_user_attending = 0
               AND (max_attendees IS NULL OR current_attendees < max_attendees)",
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn unmark_attending(&self, id: RecordId) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE events
             SET is_user_attending = 0,
                 current_attendees = CASE WHEN current_attendees > 0
                                          THEN current_attendees - 1 ELSE 0 END
             WHERE id = ?1 AND is_user_attending = 1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn set_reminder(&self, id: RecordId, reminder_time: Option<DateTime<Utc>>) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE events SET has_reminder_set = ?2, reminder_time = ?3 WHERE id = ?1",
            params![id, reminder_time.is_some(), encode_optional_timestamp(&reminder_time)],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
