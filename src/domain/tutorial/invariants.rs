use super::entity::Tutorial;
use crate::domain::{require_text, DomainError, DomainResult};

pub fn validate_tutorial(tutorial: &Tutorial) -> DomainResult<()> {
    require_text("Tutorial title", &tutorial.title)?;
    if tutorial.duration < 0 {
        return Err(DomainError::InvariantViolation(
            "Tutorial duration cannot be negative".to_string(),
        ));
    }
    validate_progress(tutorial.user_progress)
}

/// Progress is a percentage
pub fn validate_progress(progress: u8) -> DomainResult<()> {
    if progress > 100 {
        return Err(DomainError::InvariantViolation(format!(
            "Progress {}% is outside 0..=100",
            progress
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, TutorialCategory};

    #[test]
    fn test_progress_bounds() {
        let mut t = Tutorial::new("Washes", 1, TutorialCategory::Painting, Difficulty::Beginner);
        assert!(validate_tutorial(&t).is_ok());
        t.user_progress = 101;
        assert!(validate_tutorial(&t).is_err());
    }

    #[test]
    fn test_in_progress_and_completed() {
        let mut t = Tutorial::new("Washes", 1, TutorialCategory::Painting, Difficulty::Beginner);
        assert!(!t.is_in_progress());
        t.user_progress = 40;
        assert!(t.is_in_progress());
        t.user_progress = 100;
        assert!(t.is_completed() && !t.is_in_progress());
    }
}
