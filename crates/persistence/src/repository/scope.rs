//! Keyset pagination for list requests.

use crate::config::RepositoryConfig;
use crate::core::NodeQuery;
use crate::error::QueryError;
use crate::filter::{NodeColumn, Predicate};
use crate::types::{ListOptions, Node, OrderBy, PageToken, SortOrder};

/// The ordering, page size and resume position of one list request.
///
/// Ordering is always `(sort field, id)` in the requested direction, so the
/// position after any row is unambiguous. The scope asks the store for one
/// row more than the page size; a full extra row means another page exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PageScope {
    order_by: OrderBy,
    sort_order: SortOrder,
    page_size: i32,
    after: Option<PageToken>,
}

impl PageScope {
    /// Builds the scope for a request.
    ///
    /// Fails with `InvalidPageToken` if the token does not decode or was
    /// issued under another ordering.
    pub fn new(options: &ListOptions, config: &RepositoryConfig) -> Result<Self, QueryError> {
        let after = options
            .page_token()
            .map(|token| PageToken::decode_for(token, options.order_by, options.sort_order))
            .transpose()?;

        Ok(Self {
            order_by: options.order_by,
            sort_order: options.sort_order,
            page_size: config.effective_page_size(options.page_size),
            after,
        })
    }

    /// Returns the effective page size.
    pub fn page_size(&self) -> i32 {
        self.page_size
    }

    /// Returns the number of rows to request from the store.
    pub fn fetch_limit(&self) -> usize {
        self.page_size as usize + 1
    }

    /// Returns the resume predicate, if the request carries a token.
    pub fn keyset_predicate(&self) -> Option<Predicate> {
        self.after.as_ref().map(|token| Predicate::After {
            column: NodeColumn::for_order(self.order_by),
            direction: self.sort_order,
            sort_value: token.sort_value(),
            id: token.id(),
        })
    }

    /// Builds the store scan for this page, combined with a selection predicate.
    pub fn query(&self, type_id: i64, selection: Option<Predicate>) -> NodeQuery {
        NodeQuery {
            type_id,
            predicate: Predicate::all([selection, self.keyset_predicate()]),
            order_by: self.order_by,
            sort_order: self.sort_order,
            limit: self.fetch_limit(),
        }
    }

    /// Trims the look-ahead row and derives the next-page token.
    pub fn finish(&self, mut nodes: Vec<Node>) -> (Vec<Node>, Option<PageToken>) {
        let page_size = self.page_size as usize;
        if nodes.len() <= page_size {
            return (nodes, None);
        }
        nodes.truncate(page_size);
        let next = nodes.last().map(|last| {
            PageToken::new(
                self.order_by,
                self.sort_order,
                last.stored_id(),
                self.sort_value(last),
            )
        });
        (nodes, next)
    }

    fn sort_value(&self, node: &Node) -> i64 {
        match self.order_by {
            OrderBy::Id => node.stored_id(),
            OrderBy::CreateTime => node.create_time_since_epoch,
            OrderBy::LastUpdateTime => node.last_update_time_since_epoch,
        }
    }
}
