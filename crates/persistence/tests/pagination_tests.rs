//! Keyset pagination tests.

mod common;

use std::time::Duration;

use common::{collect_all, create_backend, named, repo};
use model_registry_persistence::kinds::{MODEL_VERSION, REGISTERED_MODEL};
use model_registry_persistence::types::{ListOptions, OrderBy, PageToken, SortOrder};
use model_registry_persistence::RequestContext;

#[tokio::test]
async fn test_three_entities_two_per_page() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for name in ["A", "B", "C"] {
        models.save(&ctx, named(name)).await.unwrap();
    }

    let options = ListOptions::new()
        .with_order_by(OrderBy::Id)
        .with_sort_order(SortOrder::Asc)
        .with_page_size(2);

    let first = models.list(&ctx, &options).await.unwrap();
    let names: Vec<_> = first.items.iter().map(|e| e.name().unwrap()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(first.size, 2);
    assert_eq!(first.page_size, 2);
    assert!(!first.next_page_token.is_empty());

    let second = models
        .list(&ctx, &options.clone().with_page_token(first.next_page_token.clone()))
        .await
        .unwrap();
    let names: Vec<_> = second.items.iter().map(|e| e.name().unwrap()).collect();
    assert_eq!(names, vec!["C"]);
    assert_eq!(second.size, 1);
    assert!(second.next_page_token.is_empty());
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_page() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for name in ["a", "b", "c", "d"] {
        models.save(&ctx, named(name)).await.unwrap();
    }

    let options = ListOptions::new().with_page_size(2);
    let first = models.list(&ctx, &options).await.unwrap();
    let second = models
        .list(&ctx, &options.clone().with_page_token(first.next_page_token))
        .await
        .unwrap();
    assert_eq!(second.size, 2);
    assert!(!second.has_next());
}

#[tokio::test]
async fn test_every_ordering_visits_each_entity_once() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    // Saved in bursts so several rows share a timestamp and the id tie-break
    // decides their order.
    let mut expected = Vec::new();
    for burst in 0..4 {
        for i in 0..3 {
            let name = format!("m{burst}-{i}");
            models.save(&ctx, named(&name)).await.unwrap();
            expected.push(name);
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    for order_by in [OrderBy::Id, OrderBy::CreateTime, OrderBy::LastUpdateTime] {
        for page_size in [1, 2, 5, 12, 50] {
            let options = ListOptions::new()
                .with_order_by(order_by)
                .with_sort_order(SortOrder::Asc)
                .with_page_size(page_size);
            let asc = collect_all(&models, options).await;
            assert_eq!(asc, expected, "{order_by} ASC page size {page_size}");

            let options = ListOptions::new()
                .with_order_by(order_by)
                .with_sort_order(SortOrder::Desc)
                .with_page_size(page_size);
            let mut desc = collect_all(&models, options).await;
            desc.reverse();
            assert_eq!(desc, expected, "{order_by} DESC page size {page_size}");
        }
    }
}

#[tokio::test]
async fn test_last_update_order_follows_updates() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    let a = models.save(&ctx, named("a")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3)).await;
    models.save(&ctx, named("b")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3)).await;
    models.save(&ctx, a).await.unwrap();

    let options = ListOptions::new()
        .with_order_by(OrderBy::LastUpdateTime)
        .with_page_size(1);
    assert_eq!(collect_all(&models, options).await, vec!["b", "a"]);

    let options = ListOptions::new()
        .with_order_by(OrderBy::CreateTime)
        .with_page_size(1);
    assert_eq!(collect_all(&models, options).await, vec!["a", "b"]);
}

#[tokio::test]
async fn test_pagination_combined_with_filter() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for i in 0..10i64 {
        let owner = if i % 2 == 0 { "even" } else { "odd" };
        models
            .save(&ctx, named(&format!("m{i}")).with_property("owner", owner))
            .await
            .unwrap();
    }

    let options = ListOptions::new()
        .with_filter("owner = 'even'")
        .with_page_size(2);
    assert_eq!(
        collect_all(&models, options).await,
        vec!["m0", "m2", "m4", "m6", "m8"]
    );
}

#[tokio::test]
async fn test_child_pagination_within_parent() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let versions = repo(&backend, &MODEL_VERSION).await;
    let ctx = RequestContext::new();

    let a = models.save(&ctx, named("a")).await.unwrap().id.unwrap();
    let b = models.save(&ctx, named("b")).await.unwrap().id.unwrap();
    for i in 0..5 {
        for parent in [a, b] {
            versions
                .save(
                    &ctx,
                    named(&format!("v{i}")).with_property("registered_model_id", parent),
                )
                .await
                .unwrap();
        }
    }

    let options = ListOptions::new().with_parent(b).with_page_size(2);
    assert_eq!(
        collect_all(&versions, options).await,
        vec!["v0", "v1", "v2", "v3", "v4"]
    );
}

#[tokio::test]
async fn test_token_for_other_ordering_is_rejected() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for name in ["a", "b", "c"] {
        models.save(&ctx, named(name)).await.unwrap();
    }

    let page = models
        .list(
            &ctx,
            &ListOptions::new()
                .with_order_by(OrderBy::CreateTime)
                .with_page_size(1),
        )
        .await
        .unwrap();
    assert!(page.has_next());

    let err = models
        .list(
            &ctx,
            &ListOptions::new()
                .with_order_by(OrderBy::Id)
                .with_page_size(1)
                .with_page_token(page.next_page_token.clone()),
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_page_token());

    let err = models
        .list(
            &ctx,
            &ListOptions::new()
                .with_order_by(OrderBy::CreateTime)
                .with_sort_order(SortOrder::Desc)
                .with_page_token(page.next_page_token),
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_page_token());
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for token in ["not a token", "e30", "!!!"] {
        let err = models
            .list(&ctx, &ListOptions::new().with_page_token(token))
            .await
            .unwrap_err();
        assert!(err.is_invalid_page_token(), "token {token:?}");
    }
}

#[tokio::test]
async fn test_token_decodes_to_last_kept_row() {
    let backend = create_backend();
    let models = repo(&backend, &REGISTERED_MODEL).await;
    let ctx = RequestContext::new();

    for name in ["a", "b", "c"] {
        models.save(&ctx, named(name)).await.unwrap();
    }

    let page = models
        .list(
            &ctx,
            &ListOptions::new()
                .with_order_by(OrderBy::CreateTime)
                .with_page_size(2),
        )
        .await
        .unwrap();
    let token = PageToken::decode(&page.next_page_token).unwrap();
    let last = page.items.last().unwrap();
    assert_eq!(Some(token.id()), last.id);
    assert_eq!(Some(token.sort_value()), last.create_time());
    assert_eq!(token.order_by(), OrderBy::CreateTime);
}
