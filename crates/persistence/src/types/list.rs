//! List request options.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The primary sort field of a list request.
///
/// Identity is always appended as a tie-break, so every ordering is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBy {
    /// Order by identity.
    #[default]
    Id,
    /// Order by creation time.
    CreateTime,
    /// Order by last update time.
    LastUpdateTime,
}

impl OrderBy {
    /// Returns the wire spelling of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Id => "ID",
            OrderBy::CreateTime => "CREATE_TIME",
            OrderBy::LastUpdateTime => "LAST_UPDATE_TIME",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction of a list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the wire spelling of this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options accepted by a repository list call.
///
/// At most one selector is honoured: an exact `name`, then an exact
/// `external_id`, then the `filter_query` text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Exact name match.
    pub name: Option<String>,
    /// Exact external id match.
    pub external_id: Option<String>,
    /// Filter expression text.
    pub filter_query: Option<String>,
    /// Primary sort field.
    #[serde(default)]
    pub order_by: OrderBy,
    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Requested page size; zero or negative selects the configured default.
    #[serde(default)]
    pub page_size: i32,
    /// Continuation token from a previous page.
    pub next_page_token: Option<String>,
    /// Restricts child kinds to one parent entity.
    pub parent_resource_id: Option<i64>,
}

impl ListOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects by exact name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Selects by exact external id.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Selects by filter expression.
    pub fn with_filter(mut self, filter_query: impl Into<String>) -> Self {
        self.filter_query = Some(filter_query.into());
        self
    }

    /// Sets the primary sort field.
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the sort direction.
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Continues from a token returned by a previous page.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }

    /// Restricts the listing to children of one parent.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_resource_id = Some(parent_id);
        self
    }

    /// Returns the continuation token, treating an empty string as absent.
    pub fn page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ListOptions::new();
        assert_eq!(opts.order_by, OrderBy::Id);
        assert_eq!(opts.sort_order, SortOrder::Asc);
        assert_eq!(opts.page_size, 0);
        assert!(opts.page_token().is_none());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let opts = ListOptions::new().with_page_token("");
        assert!(opts.page_token().is_none());
    }

    #[test]
    fn test_deserialize_wire_spelling() {
        let opts: ListOptions = serde_json::from_str(
            r#"{"orderBy":"LAST_UPDATE_TIME","sortOrder":"DESC","pageSize":5,"filterQuery":"name = 'a'"}"#,
        )
        .unwrap();
        assert_eq!(opts.order_by, OrderBy::LastUpdateTime);
        assert_eq!(opts.sort_order, SortOrder::Desc);
        assert_eq!(opts.page_size, 5);
        assert_eq!(opts.filter_query.as_deref(), Some("name = 'a'"));
    }
}
