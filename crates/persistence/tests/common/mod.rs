//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use model_registry_persistence::backends::sqlite::SqliteBackend;
use model_registry_persistence::kinds::EntityKind;
use model_registry_persistence::repository::GenericRepository;
use model_registry_persistence::types::{ContextAttributes, Entity, ListOptions};
use model_registry_persistence::{RepositoryConfig, RequestContext};

pub type Repo<A> = GenericRepository<A, SqliteBackend>;

/// Creates a fresh in-memory backend.
pub fn create_backend() -> Arc<SqliteBackend> {
    Arc::new(SqliteBackend::in_memory().expect("Failed to create SQLite backend"))
}

/// Creates a repository for one kind over a shared backend.
pub async fn repo<A: Send + Sync + 'static>(
    backend: &Arc<SqliteBackend>,
    kind: &'static EntityKind<A>,
) -> Repo<A> {
    GenericRepository::new(
        &RequestContext::new(),
        Arc::clone(backend),
        kind,
        RepositoryConfig::default(),
    )
    .await
    .expect("Failed to create repository")
}

/// An unsaved context-kind entity with a name.
pub fn named(name: &str) -> Entity<ContextAttributes> {
    Entity::new(ContextAttributes::named(name))
}

/// Follows page tokens until exhausted and returns every item name in order.
pub async fn collect_all(repo: &Repo<ContextAttributes>, options: ListOptions) -> Vec<String> {
    let ctx = RequestContext::new();
    let mut options = options;
    let mut names = Vec::new();
    loop {
        let page = repo.list(&ctx, &options).await.expect("list failed");
        assert_eq!(page.size as usize, page.items.len());
        assert!(page.items.len() <= page.page_size as usize);
        names.extend(
            page.items
                .iter()
                .map(|e| e.name().unwrap_or_default().to_string()),
        );
        if !page.has_next() {
            break;
        }
        options = options.with_page_token(page.next_page_token);
    }
    names
}

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
