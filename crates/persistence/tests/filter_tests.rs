//! Filter query tests against a real store.

mod common;

use common::{Repo, create_backend, named, repo};
use model_registry_persistence::kinds::{EXPERIMENT, EXPERIMENT_RUN, REGISTERED_MODEL};
use model_registry_persistence::types::{ContextAttributes, ListOptions};
use model_registry_persistence::RequestContext;

async fn seeded() -> Repo<ContextAttributes> {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    models
        .save(
            &ctx,
            named("foo")
                .with_property("owner", "alice")
                .with_property("description", "Fraud Detector")
                .with_custom_property("catalog.source", "kf-model-catalog")
                .with_custom_property("epochs", 10i64)
                .with_custom_property("accuracy", 0.91)
                .with_custom_property("production", true),
        )
        .await
        .unwrap();
    models
        .save(
            &ctx,
            named("bar")
                .with_property("owner", "bob")
                .with_property("description", "fraud scorer")
                .with_custom_property("catalog.source", "hf")
                .with_custom_property("epochs", 3i64)
                .with_custom_property("accuracy", 0.75)
                .with_custom_property("production", false),
        )
        .await
        .unwrap();
    models
        .save(
            &ctx,
            named("baz")
                .with_property("owner", "alice")
                .with_custom_property("epochs", 25i64),
        )
        .await
        .unwrap();
    models
}

async fn names(models: &Repo<ContextAttributes>, filter: &str) -> Vec<String> {
    let page = models
        .list(&RequestContext::new(), &ListOptions::new().with_filter(filter))
        .await
        .unwrap_or_else(|e| panic!("filter {filter:?} failed: {e}"));
    page.items
        .into_iter()
        .map(|e| e.name().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_filter_by_name() {
    let models = seeded().await;
    assert_eq!(names(&models, "name = 'foo'").await, vec!["foo"]);
    assert_eq!(names(&models, "name != 'foo'").await, vec!["bar", "baz"]);
}

#[tokio::test]
async fn test_filter_by_dotted_custom_property() {
    let models = seeded().await;
    assert_eq!(
        names(&models, "catalog.source = 'kf-model-catalog'").await,
        vec!["foo"]
    );
    assert_eq!(
        names(&models, "customProperties.`catalog.source` = 'hf'").await,
        vec!["bar"]
    );
}

#[tokio::test]
async fn test_filter_declared_property() {
    let models = seeded().await;
    assert_eq!(names(&models, "owner = 'alice'").await, vec!["foo", "baz"]);
    assert_eq!(
        names(&models, "properties.owner = \"bob\"").await,
        vec!["bar"]
    );
}

#[tokio::test]
async fn test_filter_numeric_custom_properties() {
    let models = seeded().await;
    assert_eq!(names(&models, "epochs >= 10").await, vec!["foo", "baz"]);
    assert_eq!(names(&models, "epochs.int_value < 5").await, vec!["bar"]);
    assert_eq!(names(&models, "accuracy > 0.8").await, vec!["foo"]);
    assert_eq!(names(&models, "accuracy.double_value <= 0.8").await, vec!["bar"]);
}

#[tokio::test]
async fn test_filter_boolean_custom_property() {
    let models = seeded().await;
    assert_eq!(names(&models, "production = true").await, vec!["foo"]);
    assert_eq!(names(&models, "production = FALSE").await, vec!["bar"]);
}

#[tokio::test]
async fn test_filter_like_and_ilike() {
    let models = seeded().await;
    assert_eq!(names(&models, "description LIKE 'Fraud%'").await, vec!["foo"]);
    assert_eq!(
        names(&models, "description ILIKE 'fraud%'").await,
        vec!["foo", "bar"]
    );
    assert_eq!(names(&models, "name like 'ba%'").await, vec!["bar", "baz"]);
}

#[tokio::test]
async fn test_filter_and_or_precedence() {
    let models = seeded().await;
    assert_eq!(
        names(&models, "owner = 'bob' OR owner = 'alice' AND epochs > 20").await,
        vec!["bar", "baz"]
    );
    assert_eq!(
        names(&models, "(owner = 'bob' OR owner = 'alice') AND epochs > 5").await,
        vec!["foo", "baz"]
    );
}

#[tokio::test]
async fn test_filter_on_reserved_columns() {
    let models = seeded().await;
    let all = names(&models, "id > 0").await;
    assert_eq!(all, vec!["foo", "bar", "baz"]);
    assert_eq!(names(&models, "create_time > 0").await.len(), 3);
    assert!(names(&models, "externalId = 'missing'").await.is_empty());
}

#[tokio::test]
async fn test_name_takes_precedence_over_filter() {
    let models = seeded().await;
    let page = models
        .list(
            &RequestContext::new(),
            &ListOptions::new()
                .with_name("bar")
                .with_filter("owner = 'alice'"),
        )
        .await
        .unwrap();
    assert_eq!(page.size, 1);
    assert_eq!(page.items[0].name(), Some("bar"));

    // An unparsable filter is never looked at when a name is given.
    let page = models
        .list(
            &RequestContext::new(),
            &ListOptions::new().with_name("foo").with_filter("name ="),
        )
        .await
        .unwrap();
    assert_eq!(page.size, 1);
}

#[tokio::test]
async fn test_unknown_bare_field_is_free_form_custom_key() {
    let models = seeded().await;
    assert!(names(&models, "nobody_set_this = 'x'").await.is_empty());
    assert!(names(&models, "team.owner != 'x'").await.is_empty());
    assert_eq!(
        names(&models, "nobody_set_this = 'x' OR epochs = 3").await,
        vec!["bar"]
    );
}

#[tokio::test]
async fn test_invalid_filters() {
    let models = seeded().await;
    let ctx = RequestContext::new();

    for filter in [
        "name = ",
        "name 'foo'",
        "name = 'foo' AND",
        "(name = 'foo'",
        "name = 'unterminated",
        "create_time = 'yesterday'",
        "name = 5",
        "create_time LIKE '1%'",
        "epochs LIKE 5",
        "properties.nonexistent = 'x'",
        "owner = 1",
        "production > true",
    ] {
        let err = models
            .list(&ctx, &ListOptions::new().with_filter(filter))
            .await
            .unwrap_err();
        assert!(err.is_invalid_filter(), "{filter:?} gave {err}");
    }
}

#[tokio::test]
async fn test_child_name_filter_uses_short_name() {
    let backend = create_backend();
    let experiments = repo(&backend, &EXPERIMENT).await;
    let runs = repo(&backend, &EXPERIMENT_RUN).await;
    let ctx = RequestContext::new();

    let exp = experiments.save(&ctx, named("exp")).await.unwrap().id.unwrap();
    runs.save(
        &ctx,
        named("run-1")
            .with_property("experiment_id", exp)
            .with_property("status", "RUNNING"),
    )
    .await
    .unwrap();
    runs.save(
        &ctx,
        named("run-2")
            .with_property("experiment_id", exp)
            .with_property("status", "FINISHED"),
    )
    .await
    .unwrap();

    let page = runs
        .list(&ctx, &ListOptions::new().with_filter("name = 'run-2'"))
        .await
        .unwrap();
    assert_eq!(page.size, 1);
    assert_eq!(page.items[0].name(), Some("run-2"));

    let page = runs
        .list(
            &ctx,
            &ListOptions::new()
                .with_parent(exp)
                .with_filter("status = 'RUNNING' OR name LIKE '%-2'"),
        )
        .await
        .unwrap();
    assert_eq!(page.size, 2);
}
