// src/repositories/sql_filter.rs
//
// Turns a criteria struct into a WHERE clause with positional parameters.
// Column names are always literals from the repository; only values are bound.

use rusqlite::types::Value;

use crate::db::values::like_pattern;

#[derive(Debug, Default)]
pub struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.values.push(value.into());
        self
    }

    /// Adds a literal predicate with no parameters
    pub fn raw(&mut self, clause: &str) -> &mut Self {
        self.clauses.push(clause.to_string());
        self
    }

    /// Adds a predicate with its own `?` placeholders, in order
    pub fn with_values(
        &mut self,
        clause: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        self.clauses.push(clause.to_string());
        self.values.extend(values);
        self
    }

    /// Case-insensitive substring match on any of the columns.
    /// Blank queries add nothing.
    pub fn search(&mut self, columns: &[&str], query: &str) -> &mut Self {
        let query = query.trim();
        if query.is_empty() || columns.is_empty() {
            return self;
        }
        let pattern = like_pattern(query);
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.values.push(Value::Text(pattern.clone()));
        }
        self
    }

    /// `column IN (...)`; an empty set adds nothing
    pub fn in_set<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self;
        }
        let marks = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{} IN ({})", column, marks));
        self.values.extend(values);
        self
    }

    /// " WHERE a AND b", or empty
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Values followed by LIMIT and OFFSET, for `... LIMIT ? OFFSET ?`
    pub fn paged_values(&self, limit: usize, offset: usize) -> Vec<Value> {
        let mut values = self.values.clone();
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset as i64));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_where() {
        let filter = SqlFilter::new();
        assert_eq!(filter.where_sql(), "");
        assert!(filter.values().is_empty());
    }

    #[test]
    fn test_clauses_are_joined_in_order() {
        let mut filter = SqlFilter::new();
        filter
            .eq("category", "painting".to_string())
            .search(&["title", "description"], " sun ")
            .in_set("artist_id", Vec::<i64>::new())
            .raw("is_for_sale = 1");

        assert_eq!(
            filter.where_sql(),
            " WHERE category = ? AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\') AND is_for_sale = 1"
        );
        assert_eq!(filter.values().len(), 3);
        assert_eq!(filter.values()[1], Value::Text("%sun%".to_string()));
    }

    #[test]
    fn test_paged_values_append_limit_offset() {
        let mut filter = SqlFilter::new();
        filter.in_set("category", ["a".to_string(), "b".to_string()]);
        let values = filter.paged_values(20, 40);
        assert_eq!(values.len(), 4);
        assert_eq!(values[2], Value::Integer(20));
        assert_eq!(values[3], Value::Integer(40));
    }
}
