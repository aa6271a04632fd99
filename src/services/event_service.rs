// src/services/event_service.rs
//
// Gallery events: scheduling, attendance and reminders.
//
// RULES:
// - Attendance and reminders change only through their dedicated calls;
//   a general update keeps the stored values
// - A full event cannot be joined, only left
// - Reminders are stored and logged; nothing is scheduled here

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{validate_event, DomainError, Event, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{AttendanceChanged, EventBus, GalleryEventScheduled, ReminderChanged};
use crate::repositories::{EventCriteria, EventRepository};

pub struct EventService {
    event_repo: Arc<dyn EventRepository>,
    event_bus: Arc<EventBus>,
}

impl EventService {
    pub fn new(event_repo: Arc<dyn EventRepository>, event_bus: Arc<EventBus>) -> Self {
        Self {
            event_repo,
            event_bus,
        }
    }

    pub fn create_event(&self, mut event: Event) -> AppResult<Event> {
        validate_event(&event).map_err(AppError::Domain)?;
        event.id = self.event_repo.insert(&event)?;

        self.event_bus
            .emit(GalleryEventScheduled::new(event.id, event.title.clone()));
        Ok(event)
    }

    pub fn update_event(&self, event: &Event) -> AppResult<Event> {
        let stored = self.require(event.id)?;
        let mut next = event.clone();
        next.is_user_attending = stored.is_user_attending;
        next.current_attendees = stored.current_attendees;
        next.has_reminder_set = stored.has_reminder_set;
        next.reminder_time = stored.reminder_time;

        validate_event(&next).map_err(AppError::Domain)?;
        self.event_repo.update(&next)?;
        Ok(next)
    }

    pub fn delete_event(&self, id: RecordId) -> AppResult<()> {
        self.event_repo.delete(id)
    }

    pub fn get_event(&self, id: RecordId) -> AppResult<Option<Event>> {
        self.event_repo.get_by_id(id)
    }

    pub fn list_events(&self, criteria: &EventCriteria) -> AppResult<Vec<Event>> {
        self.event_repo.list(criteria)
    }

    /// Soonest first
    pub fn list_page(
        &self,
        criteria: &EventCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Event>> {
        self.event_repo.list_page(criteria, limit, offset)
    }

    pub fn upcoming_events(&self, now: DateTime<Utc>) -> AppResult<Vec<Event>> {
        self.event_repo.list(&EventCriteria::upcoming(now))
    }

    /// Whether the attend button is usable for this event
    pub fn attend_enabled(&self, event: &Event) -> bool {
        event.is_attend_enabled()
    }

    /// Join or leave. Joining a full event fails with `EventFull` and
    /// changes nothing. Returns the stored state afterwards.
    pub fn toggle_attendance(&self, id: RecordId) -> AppResult<Event> {
        let event = self.require(id)?;

        let changed = if event.is_user_attending {
            self.event_repo.unmark_attending(id)?
        } else {
            self.event_repo.mark_attending(id)?
        };

        let updated = self.require(id)?;
        if !changed {
            if !event.is_user_attending && updated.is_full() {
                log::debug!("Event {} is full, attendance unchanged", id);
                return Err(AppError::Domain(DomainError::EventFull {
                    event_id: id,
                    max_attendees: updated.max_attendees.unwrap_or_default(),
                }));
            }
            return Ok(updated);
        }

        self.event_bus.emit(AttendanceChanged::new(
            id,
            updated.is_user_attending,
            updated.current_attendees,
        ));
        Ok(updated)
    }

    /// Remind the user at `at`, which must not be after the event starts
    pub fn set_reminder(&self, id: RecordId, at: DateTime<Utc>) -> AppResult<Event> {
        let mut event = self.require(id)?;
        if at > event.start_date {
            return Err(AppError::Domain(DomainError::InvariantViolation(format!(
                "Reminder at {} is after the event starts",
                at
            ))));
        }

        self.event_repo.set_reminder(id, Some(at))?;
        event.has_reminder_set = true;
        event.reminder_time = Some(at);

        log::info!("Reminder for '{}' set at {}", event.title, at);
        self.event_bus
            .emit(ReminderChanged::new(id, event.title.clone(), Some(at)));
        Ok(event)
    }

    pub fn remove_reminder(&self, id: RecordId) -> AppResult<Event> {
        let mut event = self.require(id)?;
        self.event_repo.set_reminder(id, None)?;
        event.has_reminder_set = false;
        event.reminder_time = None;

        log::info!("Reminder for '{}' removed", event.title);
        self.event_bus
            .emit(ReminderChanged::new(id, event.title.clone(), None));
        Ok(event)
    }

    fn require(&self, id: RecordId) -> AppResult<Event> {
        self.event_repo.get_by_id(id)?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::EventCategory;
    use crate::repositories::SqliteEventRepository;
    use chrono::Duration;

    fn service() -> (tempfile::TempDir, EventService) {
        let (dir, pool) = create_test_pool();
        let service = EventService::new(
            Arc::new(SqliteEventRepository::new(pool)),
            Arc::new(EventBus::new()),
        );
        (dir, service)
    }

    fn workshop(days_ahead: i64) -> Event {
        let start = Utc::now() + Duration::days(days_ahead);
        Event::new("Clay workshop", EventCategory::Workshop, start, start + Duration::hours(2))
    }

    #[test]
    fn test_full_event_refuses_attendance() {
        let (_dir, service) = service();
        let event = service.create_event(workshop(3).with_capacity(10, 10)).unwrap();

        assert!(!service.attend_enabled(&event));
        let result = service.toggle_attendance(event.id);
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::EventFull { max_attendees: 10, .. }))
        ));

        let stored = service.get_event(event.id).unwrap().unwrap();
        assert_eq!(stored.current_attendees, 10);
        assert!(!stored.is_user_attending);
    }

    #[test]
    fn test_toggle_joins_and_leaves() {
        let (_dir, service) = service();
        let event = service.create_event(workshop(3).with_capacity(10, 9)).unwrap();

        let joined = service.toggle_attendance(event.id).unwrap();
        assert!(joined.is_user_attending);
        assert_eq!(joined.current_attendees, 10);
        assert!(service.attend_enabled(&joined));

        let left = service.toggle_attendance(event.id).unwrap();
        assert!(!left.is_user_attending);
        assert_eq!(left.current_attendees, 9);
    }

    #[test]
    fn test_update_keeps_attendance() {
        let (_dir, service) = service();
        let event = service.create_event(workshop(3)).unwrap();
        service.toggle_attendance(event.id).unwrap();

        let mut edited = event.clone();
        edited.title = "Clay & glaze workshop".to_string();
        let saved = service.update_event(&edited).unwrap();
        assert!(saved.is_user_attending);
        assert_eq!(saved.current_attendees, 1);
    }

    #[test]
    fn test_reminders() {
        let (_dir, service) = service();
        let event = service.create_event(workshop(3)).unwrap();

        let late = event.start_date + Duration::minutes(5);
        assert!(service.set_reminder(event.id, late).is_err());

        let at = event.start_date - Duration::hours(1);
        let with = service.set_reminder(event.id, at).unwrap();
        assert!(with.has_reminder_set);

        let stored = service.get_event(event.id).unwrap().unwrap();
        assert_eq!(stored.reminder_time.map(|t| t.timestamp()), Some(at.timestamp()));

        let without = service.remove_reminder(event.id).unwrap();
        assert!(!without.has_reminder_set);
        assert!(service.get_event(event.id).unwrap().unwrap().reminder_time.is_none());
    }
}
