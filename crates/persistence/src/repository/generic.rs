//! The generic repository.

use std::sync::Arc;

use chrono::Utc;

use crate::config::RepositoryConfig;
use crate::context::RequestContext;
use crate::core::NodeStore;
use crate::error::{ResourceError, StorageError, StorageResult, ValidationError};
use crate::kinds::{EntityKind, mapping};
use crate::types::{Entity, ListOptions, ListWrapper, Node};

use super::scope::PageScope;

/// Save, get and list for one entity kind.
///
/// The repository holds no per-request state; clones share the store.
pub struct GenericRepository<A: 'static, S> {
    store: Arc<S>,
    kind: &'static EntityKind<A>,
    type_id: i64,
    config: RepositoryConfig,
}

impl<A: 'static, S> Clone for GenericRepository<A, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            kind: self.kind,
            type_id: self.type_id,
            config: self.config.clone(),
        }
    }
}

impl<A: 'static, S> std::fmt::Debug for GenericRepository<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericRepository")
            .field("entity", &self.kind.entity_name())
            .field("type_id", &self.type_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A, S> GenericRepository<A, S>
where
    A: Send + Sync + 'static,
    S: NodeStore,
{
    /// Creates a repository, registering the kind's type if needed.
    pub async fn new(
        ctx: &RequestContext,
        store: Arc<S>,
        kind: &'static EntityKind<A>,
        config: RepositoryConfig,
    ) -> StorageResult<Self> {
        config.validate()?;
        let type_id = store.ensure_type(ctx, kind.info.type_name).await?;
        tracing::debug!(
            entity = kind.entity_name(),
            type_name = kind.info.type_name,
            type_id,
            "Created repository"
        );
        Ok(Self {
            store,
            kind,
            type_id,
            config,
        })
    }

    /// Returns the kind descriptor.
    pub fn kind(&self) -> &'static EntityKind<A> {
        self.kind
    }

    /// Returns the type id of this kind.
    pub fn type_id(&self) -> i64 {
        self.type_id
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Applies the configured timeout to contexts without a deadline.
    fn request_context(&self, ctx: &RequestContext) -> RequestContext {
        match self.config.request_timeout {
            Some(timeout) if ctx.deadline().is_none() => ctx.clone().with_timeout(timeout),
            _ => ctx.clone(),
        }
    }

    fn not_found(&self, key: String) -> StorageError {
        ResourceError::NotFound {
            entity: self.kind.entity_name().to_string(),
            key,
        }
        .into()
    }

    /// Inserts or updates an entity and returns it as persisted.
    ///
    /// An entity without an id is inserted. An entity with an id replaces the
    /// stored node and all of its properties; its creation time is kept.
    pub async fn save(&self, ctx: &RequestContext, mut entity: Entity<A>) -> StorageResult<Entity<A>> {
        let ctx = self.request_context(ctx);
        let entity_name = self.kind.entity_name();

        match entity.type_id {
            Some(actual) if actual != self.type_id => {
                return Err(ValidationError::TypeMismatch {
                    entity: entity_name.to_string(),
                    expected: self.type_id,
                    actual,
                }
                .into());
            }
            _ => entity.type_id = Some(self.type_id),
        }

        let is_new = (self.kind.is_new)(&entity);
        let now = Utc::now().timestamp_millis();
        let node = (self.kind.to_node)(&self.kind.info, &entity, self.type_id, now)?;
        let properties = (self.kind.to_properties)(&self.kind.info, &entity)?;

        let id = self
            .store
            .save_node(&ctx, node, properties)
            .await
            .map_err(|e| e.for_entity(entity_name))?;

        tracing::debug!(entity = entity_name, type_id = self.type_id, id, is_new, "Saved entity");
        self.get_by_id(&ctx, id).await
    }

    /// Fetches an entity by id.
    pub async fn get_by_id(&self, ctx: &RequestContext, id: i64) -> StorageResult<Entity<A>> {
        let ctx = self.request_context(ctx);
        let node = self
            .store
            .node_by_id(&ctx, self.type_id, id)
            .await?
            .ok_or_else(|| self.not_found(format!("id {}", id)))?;
        self.hydrate_one(&ctx, node).await
    }

    /// Fetches an entity by its stored name.
    ///
    /// For child kinds the stored name carries the parent prefix; use
    /// [`GenericRepository::get_by_parent_and_name`] to look up by short name.
    pub async fn get_by_name(&self, ctx: &RequestContext, name: &str) -> StorageResult<Entity<A>> {
        let ctx = self.request_context(ctx);
        let node = self
            .store
            .node_by_name(&ctx, self.type_id, name)
            .await?
            .ok_or_else(|| self.not_found(format!("name '{}'", name)))?;
        self.hydrate_one(&ctx, node).await
    }

    /// Fetches a child entity by parent id and short name.
    ///
    /// Fails with a validation error for kinds that have no parent.
    pub async fn get_by_parent_and_name(
        &self,
        ctx: &RequestContext,
        parent_id: i64,
        name: &str,
    ) -> StorageResult<Entity<A>> {
        if !self.kind.is_child() {
            return Err(ValidationError::InvalidValue {
                entity: self.kind.entity_name().to_string(),
                field: "parent".to_string(),
                message: "kind is not scoped under a parent".to_string(),
            }
            .into());
        }
        let stored = mapping::scoped_name(parent_id, name);
        let ctx = self.request_context(ctx);
        let node = self
            .store
            .node_by_name(&ctx, self.type_id, &stored)
            .await?
            .ok_or_else(|| self.not_found(format!("name '{}' under parent {}", name, parent_id)))?;
        self.hydrate_one(&ctx, node).await
    }

    /// Lists one page of entities.
    ///
    /// Selection is, in order of precedence, an exact name, an exact external
    /// id, or the filter query. Child kinds are further restricted to
    /// `parent_resource_id` when it is set.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> StorageResult<ListWrapper<Entity<A>>> {
        let ctx = self.request_context(ctx);
        let scope = PageScope::new(options, &self.config)?;
        let selection = (self.kind.list_filter)(&self.kind.info, options)?;
        let query = scope.query(self.type_id, selection);

        let nodes = self.store.scan_nodes(&ctx, &query).await?;
        let (nodes, next) = scope.finish(nodes);
        let items = self.hydrate(&ctx, nodes).await?;

        tracing::debug!(
            entity = self.kind.entity_name(),
            type_id = self.type_id,
            size = items.len(),
            has_next = next.is_some(),
            "Listed entities"
        );
        Ok(ListWrapper::new(items, next, scope.page_size()))
    }

    async fn hydrate_one(&self, ctx: &RequestContext, node: Node) -> StorageResult<Entity<A>> {
        let id = node.stored_id();
        let mut properties = self.store.properties_for(ctx, &[id]).await?;
        let rows = properties.remove(&id).unwrap_or_default();
        (self.kind.from_rows)(&self.kind.info, node, rows)
    }

    /// Loads properties for a batch of nodes and maps them to entities.
    async fn hydrate(&self, ctx: &RequestContext, nodes: Vec<Node>) -> StorageResult<Vec<Entity<A>>> {
        let ids: Vec<i64> = nodes.iter().map(Node::stored_id).collect();
        let mut properties = self.store.properties_for(ctx, &ids).await?;

        nodes
            .into_iter()
            .map(|node| {
                let rows = properties.remove(&node.stored_id()).unwrap_or_default();
                (self.kind.from_rows)(&self.kind.info, node, rows)
            })
            .collect()
    }
}
