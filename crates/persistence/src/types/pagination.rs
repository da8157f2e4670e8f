//! Pagination types for list results.
//!
//! Lists are paged by keyset: the continuation token records the sort key of
//! the last row handed out, and the next page resumes strictly after it.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use super::list::{OrderBy, SortOrder};
use crate::error::QueryError;

const TOKEN_VERSION: u8 = 1;

/// An opaque continuation token for keyset pagination.
///
/// # Encoding
///
/// Tokens are base64-encoded (URL-safe, unpadded) JSON containing:
/// - The identity of the last returned row (the tie-break key)
/// - That row's value for the primary sort field
/// - The ordering the token was issued under
/// - Version information for token compatibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    /// Token format version.
    version: u8,

    /// Primary sort field the token was issued under.
    order_by: OrderBy,

    /// Direction the token was issued under.
    sort_order: SortOrder,

    /// Identity of the last row on the previous page.
    id: i64,

    /// Primary sort value of the last row on the previous page.
    sort_value: i64,
}

impl PageToken {
    /// Creates a token positioned after the given row.
    pub fn new(order_by: OrderBy, sort_order: SortOrder, id: i64, sort_value: i64) -> Self {
        Self {
            version: TOKEN_VERSION,
            order_by,
            sort_order,
            id,
            sort_value,
        }
    }

    /// Returns the primary sort field.
    pub fn order_by(&self) -> OrderBy {
        self.order_by
    }

    /// Returns the direction.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Returns the tie-break identity.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the primary sort value.
    pub fn sort_value(&self) -> i64 {
        self.sort_value
    }

    /// Encodes the token to an opaque string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(&json)
    }

    /// Decodes a token from an opaque string.
    pub fn decode(s: &str) -> Result<Self, QueryError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| QueryError::invalid_token(s, format!("not base64: {}", e)))?;

        let token: PageToken = serde_json::from_slice(&bytes)
            .map_err(|e| QueryError::invalid_token(s, format!("malformed token: {}", e)))?;

        if token.version != TOKEN_VERSION {
            return Err(QueryError::invalid_token(
                s,
                format!("unsupported token version {}", token.version),
            ));
        }
        Ok(token)
    }

    /// Decodes a token and checks that it was issued for the given ordering.
    pub fn decode_for(s: &str, order_by: OrderBy, sort_order: SortOrder) -> Result<Self, QueryError> {
        let token = Self::decode(s)?;
        if token.order_by != order_by {
            return Err(QueryError::invalid_token(
                s,
                format!(
                    "token was issued for order {}, request orders by {}",
                    token.order_by, order_by
                ),
            ));
        }
        if token.sort_order != sort_order {
            return Err(QueryError::invalid_token(
                s,
                format!(
                    "token was issued for direction {}, request sorts {}",
                    token.sort_order, sort_order
                ),
            ));
        }
        Ok(token)
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWrapper<T> {
    /// The items in this page.
    pub items: Vec<T>,

    /// Token for the next page; empty when this is the last page.
    pub next_page_token: String,

    /// The effective page size used for this request.
    pub page_size: i32,

    /// Number of items in this page.
    pub size: i32,
}

impl<T> ListWrapper<T> {
    /// Creates a page from its items and an optional continuation token.
    pub fn new(items: Vec<T>, next: Option<PageToken>, page_size: i32) -> Self {
        let size = items.len() as i32;
        Self {
            items,
            next_page_token: next.map(|t| t.encode()).unwrap_or_default(),
            page_size,
            size,
        }
    }

    /// Returns true if another page follows this one.
    pub fn has_next(&self) -> bool {
        !self.next_page_token.is_empty()
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> ListWrapper<U>
    where
        F: FnMut(T) -> U,
    {
        ListWrapper {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
            page_size: self.page_size,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_encode_decode() {
        let token = PageToken::new(OrderBy::CreateTime, SortOrder::Desc, 17, 1_700_000_000_000);
        let encoded = token.encode();
        assert!(!encoded.contains('='));

        let decoded = PageToken::decode_for(&encoded, OrderBy::CreateTime, SortOrder::Desc).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(decoded.id(), 17);
        assert_eq!(decoded.sort_value(), 1_700_000_000_000);
    }

    #[test]
    fn test_token_decode_invalid() {
        let err = PageToken::decode("not-valid-base64!!!").unwrap_err();
        assert!(matches!(err, QueryError::InvalidPageToken { .. }));

        let garbage = URL_SAFE_NO_PAD.encode(b"{\"hello\": 1}");
        assert!(PageToken::decode(&garbage).is_err());
    }

    #[test]
    fn test_token_order_mismatch() {
        let encoded = PageToken::new(OrderBy::CreateTime, SortOrder::Asc, 1, 5).encode();
        let err = PageToken::decode_for(&encoded, OrderBy::Id, SortOrder::Asc).unwrap_err();
        assert!(err.to_string().contains("CREATE_TIME"));

        let err = PageToken::decode_for(&encoded, OrderBy::CreateTime, SortOrder::Desc).unwrap_err();
        assert!(err.to_string().contains("direction"));
    }

    #[test]
    fn test_token_version_checked() {
        let mut token = PageToken::new(OrderBy::Id, SortOrder::Asc, 1, 1);
        token.version = 9;
        assert!(PageToken::decode(&token.encode()).is_err());
    }

    #[test]
    fn test_list_wrapper_last_page() {
        let page = ListWrapper::new(vec!["a", "b"], None, 10);
        assert_eq!(page.size, 2);
        assert_eq!(page.page_size, 10);
        assert!(page.next_page_token.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn test_list_wrapper_map() {
        let token = PageToken::new(OrderBy::Id, SortOrder::Asc, 2, 2);
        let page = ListWrapper::new(vec![1, 2], Some(token), 2);

        let mapped = page.map(|x| x * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert!(mapped.has_next());
    }
}
