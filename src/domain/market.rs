use serde::{Deserialize, Serialize};

use crate::domain::{require_amount, require_text, DomainResult, RecordId, UNSAVED_ID};

/// A marketplace listing. Removed with the artwork it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: RecordId,
    pub artwork_id: RecordId,
    pub price: f64,
    pub is_available: bool,
    pub description: String,
    pub contact_info: String,
}

impl MarketItem {
    pub fn new(artwork_id: RecordId, price: f64, contact_info: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            artwork_id,
            price,
            is_available: true,
            description: String::new(),
            contact_info: contact_info.into(),
        }
    }
}

pub fn validate_market_item(item: &MarketItem) -> DomainResult<()> {
    require_amount("Listing price", Some(item.price))?;
    require_text("Listing contact", &item.contact_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_needs_contact_and_price() {
        assert!(validate_market_item(&MarketItem::new(1, 500.0, "+91 98450 00000")).is_ok());
        assert!(validate_market_item(&MarketItem::new(1, 500.0, "")).is_err());
        assert!(validate_market_item(&MarketItem::new(1, f64::NAN, "x")).is_err());
    }
}
