use regex::Regex;
use std::sync::OnceLock;

use super::entity::Event;
use crate::domain::{require_amount, require_text, DomainError, DomainResult};

/// Validates all Event invariants
pub fn validate_event(event: &Event) -> DomainResult<()> {
    require_text("Event title", &event.title)?;
    validate_dates(event)?;
    validate_capacity(event)?;
    require_amount("Ticket price", event.ticket_price)?;
    validate_contact_email(event)?;
    Ok(())
}

fn validate_dates(event: &Event) -> DomainResult<()> {
    if event.start_date > event.end_date {
        return Err(DomainError::InvariantViolation(format!(
            "Event start {} is after its end {}",
            event.start_date, event.end_date
        )));
    }
    Ok(())
}

fn validate_capacity(event: &Event) -> DomainResult<()> {
    if event.current_attendees < 0 {
        return Err(DomainError::InvariantViolation(
            "Attendee count cannot be negative".to_string(),
        ));
    }
    if let Some(max) = event.max_attendees {
        if max < 0 {
            return Err(DomainError::InvariantViolation(
                "Maximum attendees cannot be negative".to_string(),
            ));
        }
        if event.current_attendees > max {
            return Err(DomainError::InvariantViolation(format!(
                "{} attendees exceed the maximum of {}",
                event.current_attendees, max
            )));
        }
    }
    Ok(())
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

fn is_plausible_email(email: &str) -> bool {
    match email_pattern() {
        Some(re) => re.is_match(email.trim()),
        None => email.contains('@'),
    }
}

fn validate_contact_email(event: &Event) -> DomainResult<()> {
    match event.contact_email.as_deref() {
        Some(email) if !is_plausible_email(email) => Err(
            DomainError::InvariantViolation(format!("'{}' is not a valid contact email", email)),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventCategory;
    use chrono::{Duration, Utc};

    fn sample() -> Event {
        let start = Utc::now();
        Event::new("Talk", EventCategory::Lecture, start, start + Duration::hours(1))
    }

    #[test]
    fn test_valid_event() {
        assert!(validate_event(&sample()).is_ok());
    }

    #[test]
    fn test_end_before_start_fails() {
        let mut event = sample();
        event.end_date = event.start_date - Duration::minutes(1);
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn test_over_capacity_fails() {
        assert!(validate_event(&sample().with_capacity(10, 10)).is_ok());
        assert!(validate_event(&sample().with_capacity(10, 11)).is_err());
    }

    #[test]
    fn test_contact_email() {
        let mut event = sample();
        event.contact_email = Some("curator@gallery.in".to_string());
        assert!(validate_event(&event).is_ok());
        event.contact_email = Some("curator at gallery".to_string());
        assert!(validate_event(&event).is_err());
    }
}
