//! Service-level tests: idempotency, compensation, events and concurrency.
//!
//! Run with: cargo test -p wishlist-integration-tests

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use futures::future::join_all;

use wishlist_core::{DEFAULT_WISHLIST_TITLE, WishlistEvent};
use wishlist_integration_tests::{TestContext, channel, customer, variant};
use wishlist_server::db::WishlistStore;

#[tokio::test]
async fn test_add_remove_scenario_emits_events_in_order() {
    let ctx = TestContext::new();

    let wishlist = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    assert_eq!(wishlist.title.as_deref(), Some(DEFAULT_WISHLIST_TITLE));

    let items = ctx.store.inner.list_items(&wishlist.id).await.unwrap();
    assert_eq!(items.len(), 1);

    ctx.service
        .remove_item(&items[0].id, &customer("cus_alice"))
        .await
        .unwrap();

    ctx.events.wait_for(3).await;
    assert_eq!(
        ctx.events.names(),
        vec![
            WishlistEvent::CREATED,
            WishlistEvent::ITEM_ADDED,
            WishlistEvent::ITEM_REMOVED
        ]
    );
    assert!(
        ctx.events
            .events()
            .iter()
            .all(|event| event.wishlist_id() == &wishlist.id)
    );
}

#[tokio::test]
async fn test_repeated_add_is_idempotent() {
    let ctx = TestContext::new();

    let first = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    let second = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(ctx.store.inner.all_items().len(), 1);

    ctx.events.wait_for(2).await;
    // Give a stray third event the chance to show up.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(
        ctx.events.names(),
        vec![WishlistEvent::CREATED, WishlistEvent::ITEM_ADDED]
    );
}

#[tokio::test]
async fn test_re_adding_removed_variant_creates_new_item() {
    let ctx = TestContext::new();

    let wishlist = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    let first = ctx.store.inner.list_items(&wishlist.id).await.unwrap();
    ctx.service
        .remove_item(&first[0].id, &customer("cus_alice"))
        .await
        .unwrap();

    ctx.service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    let second = ctx.store.inner.list_items(&wishlist.id).await.unwrap();

    assert_eq!(second.len(), 1);
    assert_ne!(first[0].id, second[0].id);
}

#[tokio::test]
async fn test_failed_first_add_leaves_no_wishlist() {
    let ctx = TestContext::new();
    ctx.store.fail_item_writes(true);

    let result = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await;

    assert_eq!(result.unwrap_err().kind(), "unexpected_state");
    let contents = ctx
        .service
        .get_wishlist(&customer("cus_alice"), &channel())
        .await
        .unwrap();
    assert!(contents.wishlist.is_none());
    assert!(ctx.store.inner.all_items().is_empty());
}

#[tokio::test]
async fn test_failed_add_keeps_existing_wishlist() {
    let ctx = TestContext::new();
    let wishlist = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    ctx.store.fail_item_writes(true);

    let result = ctx
        .service
        .add_item(&variant("variant_blue"), &customer("cus_alice"), &channel())
        .await;

    assert!(result.is_err());
    let contents = ctx
        .service
        .get_wishlist(&customer("cus_alice"), &channel())
        .await
        .unwrap();
    assert_eq!(contents.wishlist.unwrap().id, wishlist.id);
    assert_eq!(contents.items.len(), 1);
}

#[tokio::test]
async fn test_failing_transport_does_not_fail_writes() {
    let ctx = TestContext::with_failing_events();

    let wishlist = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    let items = ctx.store.inner.list_items(&wishlist.id).await.unwrap();

    ctx.service
        .remove_item(&items[0].id, &customer("cus_alice"))
        .await
        .unwrap();

    assert!(ctx.store.inner.list_items(&wishlist.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_first_adds_create_one_wishlist() {
    let ctx = TestContext::new();

    let adds = (0..16).map(|i| {
        let service = ctx.service.clone();
        let variant_id = variant(["variant_red", "variant_blue", "variant_green"][i % 3]);
        tokio::spawn(async move {
            service
                .add_item(&variant_id, &customer("cus_alice"), &channel())
                .await
        })
    });
    let results = join_all(adds).await;

    let ids: BTreeSet<_> = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().id)
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(ctx.store.inner.all_wishlists().len(), 1);

    let wishlist_id = ids.into_iter().next().unwrap();
    assert_eq!(
        ctx.store.inner.list_items(&wishlist_id).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_wishlists_are_scoped_per_customer() {
    let ctx = TestContext::new();

    let alice = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_alice"), &channel())
        .await
        .unwrap();
    let bob = ctx
        .service
        .add_item(&variant("variant_red"), &customer("cus_bob"), &channel())
        .await
        .unwrap();

    assert_ne!(alice.id, bob.id);

    let counts = ctx
        .service
        .count_items_by_variant(&[variant("variant_red")].into_iter().collect())
        .await
        .unwrap();
    assert_eq!(counts.get(&variant("variant_red")), Some(&2));
}
