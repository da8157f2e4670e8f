//! Node store trait.
//!
//! This module defines the [`NodeStore`] trait, the boundary between the
//! generic repository and a storage backend. The store only ever sees generic
//! [`Node`] and [`PropertyRow`] values plus backend-neutral predicates; it
//! knows nothing about entity kinds beyond their numeric type id.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::StorageResult;
use crate::filter::Predicate;
use crate::types::{Node, OrderBy, PropertyRow, SortOrder};

/// A predicate-filtered, ordered scan over the nodes of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    /// Only nodes of this type are returned.
    pub type_id: i64,
    /// Additional restriction, if any.
    pub predicate: Option<Predicate>,
    /// Primary sort field; identity is always the tie-break.
    pub order_by: OrderBy,
    /// Sort direction, applied to both the sort field and the tie-break.
    pub sort_order: SortOrder,
    /// Maximum number of rows to return.
    pub limit: usize,
}

impl NodeQuery {
    /// Creates an unrestricted scan over one type, ordered by id.
    pub fn new(type_id: i64, limit: usize) -> Self {
        Self {
            type_id,
            predicate: None,
            order_by: OrderBy::Id,
            sort_order: SortOrder::Asc,
            limit,
        }
    }
}

/// Storage capabilities the generic repository is built on.
///
/// # Transactions
///
/// [`NodeStore::save_node`] is the only multi-row write. Implementations must
/// apply the node row and the full property replacement atomically, and must
/// roll back if the request context is cancelled before commit.
///
/// # Errors
///
/// * `ResourceError::AlreadyExists` - A uniqueness constraint was violated
/// * `ResourceError::NotFound` - An update targeted a node that does not exist
/// * `TransactionError::Cancelled` / `DeadlineExceeded` - The request ended first
/// * `BackendError` - The store could not serve the request
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Returns a human-readable name for this store.
    fn backend_name(&self) -> &'static str;

    /// Returns the type id registered under `type_name`, creating it if needed.
    async fn ensure_type(&self, ctx: &RequestContext, type_name: &str) -> StorageResult<i64>;

    /// Inserts or updates a node and replaces all of its properties.
    ///
    /// A node without an id is inserted and receives a new identity. A node
    /// with an id updates the existing row of the same type: its creation
    /// time is preserved and its last update time is refreshed. Returns the
    /// node identity.
    async fn save_node(
        &self,
        ctx: &RequestContext,
        node: Node,
        properties: Vec<PropertyRow>,
    ) -> StorageResult<i64>;

    /// Point lookup by identity within one type.
    async fn node_by_id(
        &self,
        ctx: &RequestContext,
        type_id: i64,
        id: i64,
    ) -> StorageResult<Option<Node>>;

    /// Point lookup by stored name within one type.
    async fn node_by_name(
        &self,
        ctx: &RequestContext,
        type_id: i64,
        name: &str,
    ) -> StorageResult<Option<Node>>;

    /// Returns the nodes matching `query`, in order, up to its limit.
    async fn scan_nodes(&self, ctx: &RequestContext, query: &NodeQuery) -> StorageResult<Vec<Node>>;

    /// Fetches the properties of many nodes at once.
    ///
    /// Nodes without properties may be absent from the map. Rows for one node
    /// keep the order they were written in.
    async fn properties_for(
        &self,
        ctx: &RequestContext,
        node_ids: &[i64],
    ) -> StorageResult<HashMap<i64, Vec<PropertyRow>>>;
}
