use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{labelled_enum, RecordId, UNSAVED_ID};

labelled_enum! {
    /// Kind of gallery event
    EventCategory, "event category" {
        Exhibition => "exhibition",
        Workshop => "workshop",
        Opening => "opening",
        Auction => "auction",
        Performance => "performance",
        Lecture => "lecture",
    }
}

/// A scheduled gathering the user can attend and be reminded of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: EventCategory,
    pub organizer: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub is_free: bool,
    pub ticket_price: Option<f64>,
    pub has_reminder_set: bool,
    pub reminder_time: Option<DateTime<Utc>>,
    pub is_user_attending: bool,
    /// None means unlimited capacity
    pub max_attendees: Option<i64>,
    pub current_attendees: i64,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        category: EventCategory,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            description: String::new(),
            image_path: None,
            location: String::new(),
            start_date,
            end_date,
            category,
            organizer: String::new(),
            contact_email: None,
            contact_phone: None,
            website: None,
            is_free: true,
            ticket_price: None,
            has_reminder_set: false,
            reminder_time: None,
            is_user_attending: false,
            max_attendees: None,
            current_attendees: 0,
        }
    }

    pub fn with_capacity(mut self, max_attendees: i64, current_attendees: i64) -> Self {
        self.max_attendees = Some(max_attendees);
        self.current_attendees = current_attendees;
        self
    }

    pub fn is_full(&self) -> bool {
        matches!(self.max_attendees, Some(max) if self.current_attendees >= max)
    }

    /// Whether the attend control is usable: a full event can still be left,
    /// but not joined.
    pub fn is_attend_enabled(&self) -> bool {
        self.is_user_attending || !self.is_full()
    }

    /// True if the event's span intersects `[start, end]`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_date > now
    }

    /// Label for the ticket line: "Free" or the price
    pub fn admission_label(&self) -> String {
        match (self.is_free, self.ticket_price) {
            (false, Some(price)) => format!("₹{:.2}", price),
            _ => "Free".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> Event {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        Event::new("Open studio", EventCategory::Workshop, start, start + Duration::hours(3))
    }

    #[test]
    fn test_full_event_disables_attend() {
        let event = sample().with_capacity(10, 10);
        assert!(event.is_full());
        assert!(!event.is_attend_enabled());

        let mut attending = event.clone();
        attending.is_user_attending = true;
        assert!(attending.is_attend_enabled());
    }

    #[test]
    fn test_unlimited_event_is_never_full() {
        let mut event = sample();
        event.current_attendees = 10_000;
        assert!(!event.is_full());
        assert!(event.is_attend_enabled());
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let event = sample();
        assert!(event.overlaps(event.end_date, event.end_date + Duration::days(1)));
        assert!(!event.overlaps(event.end_date + Duration::seconds(1), event.end_date + Duration::days(1)));
    }

    #[test]
    fn test_category_labels_parse() {
        assert_eq!("Auction".parse::<EventCategory>().unwrap(), EventCategory::Auction);
        assert!("concert".parse::<EventCategory>().is_err());
        assert_eq!(EventCategory::ALL.len(), 6);
    }
}
