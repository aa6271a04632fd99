use super::entity::ArModel;
use crate::domain::{require_text, DomainError, DomainResult};

pub fn validate_ar_model(model: &ArModel) -> DomainResult<()> {
    require_text("Model name", &model.name)?;

    if !(model.scale.is_finite() && model.scale > 0.0) {
        return Err(DomainError::InvariantViolation(format!(
            "Model scale must be positive, got {}",
            model.scale
        )));
    }

    if let Some(duration) = model.animation_duration_ms {
        if duration < 0 {
            return Err(DomainError::InvariantViolation(
                "Animation duration cannot be negative".to_string(),
            ));
        }
    }

    if let Some(bounds) = model.bounding_box {
        let dims = [bounds.width, bounds.height, bounds.depth];
        if dims.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(DomainError::InvariantViolation(
                "Bounding box dimensions must be non-negative".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArCategory, BoundingBox};

    #[test]
    fn test_scale_must_be_positive() {
        let mut model = ArModel::new("Nataraja", 1, ArCategory::Sculpture);
        assert!(validate_ar_model(&model).is_ok());
        model.scale = 0.0;
        assert!(validate_ar_model(&model).is_err());
    }

    #[test]
    fn test_negative_bounds_fail() {
        let mut model = ArModel::new("Chair", 1, ArCategory::Furniture);
        model.bounding_box = Some(BoundingBox { width: 1.0, height: -0.5, depth: 1.0 });
        assert!(validate_ar_model(&model).is_err());
    }
}
