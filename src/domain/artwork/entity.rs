use serde::{Deserialize, Serialize};

use crate::domain::{RecordId, UNSAVED_ID};

/// Category tags offered by the catalogue. Stored categories are free text;
/// these are the ones the browse filters know about.
pub const ARTWORK_CATEGORIES: &[&str] = &["painting", "sculpture", "photography", "digital"];

/// A catalogued work, always owned by one artist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub image_path: String,
    pub artist_id: RecordId,
    pub category: String,
    /// Asking price in rupees, when listed
    pub price: Option<f64>,
    pub is_for_sale: bool,
    pub contact_details: Option<String>,
}

impl Artwork {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        artist_id: RecordId,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            description: description.into(),
            image_path: String::new(),
            artist_id,
            category: category.into(),
            price: None,
            is_for_sale: false,
            contact_details: None,
        }
    }

    /// List the work for sale at a price
    pub fn for_sale(mut self, price: f64, contact: impl Into<String>) -> Self {
        self.price = Some(price);
        self.is_for_sale = true;
        self.contact_details = Some(contact.into());
        self
    }

    /// Price as shown to buyers, e.g. `₹1,25,000.00`
    pub fn formatted_price(&self) -> String {
        match (self.is_for_sale, self.price) {
            (true, Some(price)) => format_rupees(price),
            _ => "Not for sale".to_string(),
        }
    }

    /// Case-insensitive substring match on title or description.
    /// A blank query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Indian digit grouping: the last three digits, then pairs.
fn format_rupees(amount: f64) -> String {
    let paise = (amount * 100.0).round() as i64;
    let negative = paise < 0;
    let paise = paise.abs();
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    format!("{}₹{}.{:02}", if negative { "-" } else { "" }, grouped, fraction)
}
