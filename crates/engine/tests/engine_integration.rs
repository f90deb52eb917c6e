//! End-to-end tests for the cart-inventory engine over the in-memory store.

use std::time::Duration;

use async_trait::async_trait;
use document_store::{
    DocumentId, DocumentStore, Filter, InMemoryDocumentStore, Result as StoreResult, UpdateSpec,
};
use domain::{Discount, ErrorKind, Item, ItemPatch, Money, NewItem, UserId};
use engine::repository::{CARTS, ITEMS};
use engine::{
    CartService, CatalogService, DualWritePolicy, InventoryActor, InventoryHandle, StockPolicy,
};
use serde_json::Value;

/// Store wrapper that pauses after every single-document read, so concurrent
/// callers all observe the state from before anyone writes.
#[derive(Clone)]
struct SlowReads<S> {
    inner: S,
    delay: Duration,
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for SlowReads<S> {
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Value> {
        let found = self.inner.find_one(collection, filter).await;
        tokio::time::sleep(self.delay).await;
        found
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        self.inner.find(collection, filter).await
    }

    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<DocumentId> {
        self.inner.insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<()> {
        self.inner.update_one(collection, filter, update).await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<()> {
        self.inner.delete_one(collection, filter).await
    }
}

struct Harness<S = InMemoryDocumentStore> {
    store: InMemoryDocumentStore,
    carts: CartService<S>,
    catalog: CatalogService<S>,
    inventory: InventoryHandle,
}

fn harness(stock: StockPolicy, dual_write: DualWritePolicy) -> Harness {
    let store = InMemoryDocumentStore::new();
    let (inventory, _worker) = InventoryActor::spawn(store.clone(), stock);
    Harness {
        carts: CartService::new(store.clone(), inventory.clone(), dual_write),
        catalog: CatalogService::new(store.clone()),
        inventory,
        store,
    }
}

fn slow_harness(stock: StockPolicy) -> Harness<SlowReads<InMemoryDocumentStore>> {
    let store = InMemoryDocumentStore::new();
    let slow = SlowReads {
        inner: store.clone(),
        delay: Duration::from_millis(10),
    };
    let (inventory, _worker) = InventoryActor::spawn(store.clone(), stock);
    Harness {
        carts: CartService::new(slow.clone(), inventory.clone(), DualWritePolicy::AcceptPartial),
        catalog: CatalogService::new(slow),
        inventory,
        store,
    }
}

impl<S> Harness<S>
where
    S: DocumentStore + Clone + 'static,
{
    async fn item(&self, price_dollars: i64, quantity: i64) -> Item {
        self.catalog
            .create_item(NewItem {
                name: "Widget".to_string(),
                description: String::new(),
                category_ids: vec![],
                price: Money::from_dollars(price_dollars),
                discount: Discount::none(),
                quantity,
            })
            .await
            .unwrap()
    }

    async fn stock(&self, item: &Item) -> i64 {
        self.catalog.get_item(item.id).await.unwrap().quantity
    }
}

#[tokio::test]
async fn test_add_reprice_and_remove_scenario() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::AcceptPartial);
    let user = UserId::new();
    let item = h.item(100, 10).await;

    let cart = h.carts.add_to_cart(user, item.id, 3).await.unwrap();
    let line = cart.line(item.id).unwrap();
    assert_eq!(line.quantity, 3);
    assert_eq!(line.total_price, Money::from_dollars(300));
    assert_eq!(h.stock(&item).await, 7);

    h.catalog
        .update_item(
            item.id,
            ItemPatch {
                discount: Discount::new(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The later add re-prices the whole line at the discounted unit price.
    let cart = h.carts.add_to_cart(user, item.id, 2).await.unwrap();
    let line = cart.line(item.id).unwrap();
    assert_eq!(line.quantity, 5);
    assert_eq!(line.unit_price, Money::from_dollars(90));
    assert_eq!(line.total_price, Money::from_dollars(450));
    assert_eq!(h.stock(&item).await, 5);

    let cart = h.carts.remove_from_cart(user, item.id, 5).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_price(), Money::zero());
    assert_eq!(h.stock(&item).await, 10);

    let stored = h.carts.get_cart(user).await.unwrap().unwrap();
    assert_eq!(stored, cart);
}

#[tokio::test]
async fn test_remove_item_not_in_cart() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::AcceptPartial);
    let user = UserId::new();
    let first = h.item(5, 10).await;
    let second = h.item(7, 10).await;
    h.carts.add_to_cart(user, first.id, 1).await.unwrap();

    let err = h
        .carts
        .remove_from_cart(user, second.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.stock(&second).await, 10);
}

#[tokio::test]
async fn test_concurrent_adjustments_are_serialized() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::AcceptPartial);
    let item = h.item(1, 1000).await;

    let deltas: Vec<i64> = (1..=50).map(|i| if i % 3 == 0 { 4 } else { -i % 7 }).collect();
    let expected = 1000 + deltas.iter().sum::<i64>();

    let mut tasks = Vec::new();
    for delta in deltas {
        let inventory = h.inventory.clone();
        let item_id = item.id;
        tasks.push(tokio::spawn(async move {
            inventory.adjust_quantity(item_id, delta).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.stock(&item).await, expected);
}

#[tokio::test]
async fn test_concurrent_carts_can_oversell_under_optimistic_policy() {
    let h = slow_harness(StockPolicy::Optimistic);
    let item = h.item(10, 5).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let carts = h.carts.clone();
        let item_id = item.id;
        tasks.push(tokio::spawn(async move {
            carts.add_to_cart(UserId::new(), item_id, 4).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Every add was checked against the same read of 5 units.
    assert_eq!(h.stock(&item).await, 5 - 16);
    assert!(h.stock(&item).await < 0);
    assert_eq!(h.store.document_count(CARTS).await, 4);
}

#[tokio::test]
async fn test_concurrent_first_adds_for_one_user_create_one_cart() {
    let h = slow_harness(StockPolicy::Optimistic);
    let user = UserId::new();
    let item = h.item(10, 100).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let carts = h.carts.clone();
        let item_id = item.id;
        tasks.push(tokio::spawn(async move {
            carts.add_to_cart(user, item_id, 1).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.store.document_count(CARTS).await, 1);
    let cart = h.carts.get_cart(user).await.unwrap().unwrap();
    assert_eq!(cart.line(item.id).unwrap().quantity, 4);
    assert_eq!(cart.total_price(), Money::from_dollars(40));
    assert_eq!(h.stock(&item).await, 96);
}

#[tokio::test]
async fn test_guarded_policy_never_goes_negative() {
    let h = harness(StockPolicy::Guarded, DualWritePolicy::Compensate);
    let item = h.item(10, 5).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let carts = h.carts.clone();
        let item_id = item.id;
        tasks.push(tokio::spawn(async move {
            carts.add_to_cart(UserId::new(), item_id, 2).await
        }));
    }
    let mut succeeded = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Validation),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(h.stock(&item).await, 1);
    assert_eq!(h.store.document_count(CARTS).await, 2);
}

#[tokio::test]
async fn test_partial_failure_left_in_place_by_default() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::AcceptPartial);
    let user = UserId::new();
    let item = h.item(10, 10).await;
    let before = h.carts.add_to_cart(user, item.id, 1).await.unwrap();
    h.store.fail_writes_on(CARTS).await;

    let err = h.carts.add_to_cart(user, item.id, 3).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.carts.get_cart(user).await.unwrap(), Some(before));
    assert_eq!(h.stock(&item).await, 6);
}

#[tokio::test]
async fn test_cart_store_outage_on_first_add_touches_nothing() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::AcceptPartial);
    let user = UserId::new();
    let item = h.item(10, 10).await;
    h.store.fail_writes_on(CARTS).await;

    let err = h.carts.add_to_cart(user, item.id, 3).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(h.carts.get_cart(user).await.unwrap().is_none());
    assert_eq!(h.stock(&item).await, 10);
}

#[tokio::test]
async fn test_partial_failure_compensated_when_configured() {
    let h = harness(StockPolicy::Optimistic, DualWritePolicy::Compensate);
    let user = UserId::new();
    let item = h.item(10, 10).await;
    let before = h.carts.add_to_cart(user, item.id, 1).await.unwrap();

    h.store.fail_writes_on(CARTS).await;
    let err = h.carts.add_to_cart(user, item.id, 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.stock(&item).await, 9);

    h.store.clear_faults().await;
    h.store.fail_writes_on(ITEMS).await;
    h.carts.add_to_cart(user, item.id, 2).await.unwrap_err();

    h.store.clear_faults().await;
    assert_eq!(h.carts.get_cart(user).await.unwrap(), Some(before));
    assert_eq!(h.stock(&item).await, 9);
}
