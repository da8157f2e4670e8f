//! Repositories over the node store.
//!
//! A [`GenericRepository`] serves one entity kind. It maps typed entities to
//! generic node and property rows, compiles list options into a predicate,
//! and pages through results with a [`PageScope`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use model_registry_persistence::backends::sqlite::SqliteBackend;
//! use model_registry_persistence::kinds::REGISTERED_MODEL;
//! use model_registry_persistence::repository::GenericRepository;
//! use model_registry_persistence::types::{ContextAttributes, Entity, ListOptions};
//! use model_registry_persistence::{RepositoryConfig, RequestContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RequestContext::new();
//! let store = Arc::new(SqliteBackend::in_memory()?);
//! let models = GenericRepository::new(&ctx, store, &REGISTERED_MODEL, RepositoryConfig::default()).await?;
//!
//! let saved = models
//!     .save(&ctx, Entity::new(ContextAttributes::named("fraud-detector"))
//!         .with_property("owner", "risk-team"))
//!     .await?;
//!
//! let page = models
//!     .list(&ctx, &ListOptions::new().with_filter("owner = 'risk-team'").with_page_size(10))
//!     .await?;
//! assert_eq!(page.items[0].id, saved.id);
//! # Ok(())
//! # }
//! ```

mod generic;
mod scope;

pub use generic::GenericRepository;
pub use scope::PageScope;
