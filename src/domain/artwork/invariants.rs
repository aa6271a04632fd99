use super::entity::Artwork;
use crate::domain::{require_amount, require_text, DomainError, DomainResult};

/// Validates all Artwork invariants
pub fn validate_artwork(artwork: &Artwork) -> DomainResult<()> {
    require_text("Artwork title", &artwork.title)?;
    require_text("Artwork category", &artwork.category)?;
    require_amount("Artwork price", artwork.price)?;
    validate_listing(artwork)?;
    Ok(())
}

/// A work offered for sale needs a price
fn validate_listing(artwork: &Artwork) -> DomainResult<()> {
    if artwork.is_for_sale && artwork.price.is_none() {
        return Err(DomainError::InvariantViolation(format!(
            "Artwork '{}' is listed for sale without a price",
            artwork.title
        )));
    }
    Ok(())
}
