//! Cart mutations: read, recompute in memory, then dual-write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use document_store::DocumentStore;
use domain::{Cart, CartError, ItemId, UserId};
use tokio::sync::OwnedMutexGuard;

use crate::coordinator::DualWriteCoordinator;
use crate::error::{EngineError, Result};
use crate::inventory::InventoryHandle;
use crate::policy::DualWritePolicy;
use crate::repository::{CartRepository, ItemRepository};

/// Per-user mutation locks; entries are dropped once no mutation holds them.
#[derive(Clone, Default)]
struct UserLocks {
    inner: Arc<Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Adds items to and removes items from shopper carts.
///
/// Every successful mutation moves the same number of units between the
/// cart and the item's stock, through the [`DualWriteCoordinator`].
/// Mutations of one user's cart run one at a time, so each starts from the
/// cart the previous one stored.
#[derive(Clone)]
pub struct CartService<S> {
    items: ItemRepository<S>,
    carts: CartRepository<S>,
    coordinator: DualWriteCoordinator<S>,
    locks: UserLocks,
}

impl<S> CartService<S>
where
    S: DocumentStore + Clone + 'static,
{
    pub fn new(store: S, inventory: InventoryHandle, policy: DualWritePolicy) -> Self {
        Self {
            items: ItemRepository::new(store.clone()),
            carts: CartRepository::new(store.clone()),
            coordinator: DualWriteCoordinator::new(store, inventory, policy),
            locks: UserLocks::default(),
        }
    }

    /// Returns the user's cart, if they have one.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.find_by_user(user_id).await?)
    }

    /// Adds `quantity` units of an item to the user's cart, creating the cart
    /// on first use, and draws the same amount from stock.
    ///
    /// A cart created by this call is removed again if the write fails and
    /// leaves it empty.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, user_id: UserId, item_id: ItemId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 }.into());
        }

        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("item", item_id))?;
        let snapshot = item.snapshot();

        let _guard = self.locks.acquire(user_id).await;
        let (previous, created) = match self.carts.find_by_user(user_id).await? {
            Some(cart) => (cart, false),
            None => {
                // Reject invalid adds before a cart document is written.
                Cart::for_user(user_id).add(&snapshot, quantity)?;
                self.carts.claim(user_id).await?
            }
        };

        let mut cart = previous.clone();
        if let Err(e) = cart.add(&snapshot, quantity) {
            self.release_if_empty(user_id, created).await;
            return Err(e.into());
        }
        cart.touch(Utc::now());

        if let Err(e) = self
            .coordinator
            .commit(previous, cart.clone(), item_id, -i64::from(quantity))
            .await
        {
            self.release_if_empty(user_id, created).await;
            return Err(e);
        }

        metrics::counter!("cart_mutations_total", "operation" => "add").increment(1);
        tracing::info!(cart_id = %cart.id(), total = %cart.total_price(), "item added to cart");
        Ok(cart)
    }

    /// Removes `quantity` units of an item from the user's cart and returns
    /// them to stock.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 }.into());
        }

        let _guard = self.locks.acquire(user_id).await;
        let previous = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("cart", user_id))?;

        let mut cart = previous.clone();
        cart.remove(item_id, quantity)?;
        cart.touch(Utc::now());

        self.coordinator
            .commit(previous, cart.clone(), item_id, i64::from(quantity))
            .await?;

        metrics::counter!("cart_mutations_total", "operation" => "remove").increment(1);
        tracing::info!(cart_id = %cart.id(), total = %cart.total_price(), "item removed from cart");
        Ok(cart)
    }

    /// Deletes a cart this mutation created if the stored copy is still empty.
    async fn release_if_empty(&self, user_id: UserId, created: bool) {
        if !created {
            return;
        }
        let outcome = match self.carts.find_by_user(user_id).await {
            Ok(Some(cart)) if cart.is_empty() => self.carts.delete(cart.id()).await,
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::warn!(%user_id, error = %e, "failed to release empty cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryActor;
    use crate::policy::StockPolicy;
    use crate::repository::{CARTS, ITEMS};
    use document_store::InMemoryDocumentStore;
    use domain::{ErrorKind, Item, Money, NewItem};

    async fn setup(quantity: i64) -> (InMemoryDocumentStore, CartService<InMemoryDocumentStore>, Item) {
        setup_priced(Money::from_dollars(100), quantity).await
    }

    async fn setup_priced(
        price: Money,
        quantity: i64,
    ) -> (InMemoryDocumentStore, CartService<InMemoryDocumentStore>, Item) {
        let store = InMemoryDocumentStore::new();
        let item = Item::create(
            NewItem {
                name: "Widget".to_string(),
                description: String::new(),
                category_ids: vec![],
                price,
                discount: Default::default(),
                quantity,
            },
            "widget".to_string(),
            Utc::now(),
        );
        ItemRepository::new(store.clone()).insert(&item).await.unwrap();
        let (inventory, _worker) = InventoryActor::spawn(store.clone(), StockPolicy::Optimistic);
        let service = CartService::new(store.clone(), inventory, DualWritePolicy::AcceptPartial);
        (store, service, item)
    }

    async fn stock(store: &InMemoryDocumentStore, item_id: ItemId) -> i64 {
        ItemRepository::new(store.clone())
            .get(item_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn test_add_creates_cart_and_draws_stock() {
        let (store, service, item) = setup(10).await;
        let user = UserId::new();

        let cart = service.add_to_cart(user, item.id, 3).await.unwrap();

        assert_eq!(cart.total_price(), Money::from_dollars(300));
        assert_eq!(service.get_cart(user).await.unwrap(), Some(cart));
        assert_eq!(stock(&store, item.id).await, 7);
    }

    #[tokio::test]
    async fn test_add_rejects_zero_and_unknown_item() {
        let (_store, service, item) = setup(10).await;
        let user = UserId::new();

        let err = service.add_to_cart(user, item.id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.add_to_cart(user, ItemId::new(), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(service.get_cart(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_more_than_available_leaves_everything_untouched() {
        let (store, service, item) = setup(2).await;
        let user = UserId::new();

        let err = service.add_to_cart(user, item.id, 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.get_cart(user).await.unwrap().is_none());
        assert_eq!(stock(&store, item.id).await, 2);
    }

    #[tokio::test]
    async fn test_remove_without_cart_is_not_found() {
        let (_store, service, item) = setup(10).await;
        let err = service
            .remove_from_cart(UserId::new(), item.id, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_returns_stock() {
        let (store, service, item) = setup(10).await;
        let user = UserId::new();
        service.add_to_cart(user, item.id, 4).await.unwrap();

        let cart = service.remove_from_cart(user, item.id, 1).await.unwrap();

        assert_eq!(cart.line(item.id).unwrap().quantity, 3);
        assert_eq!(stock(&store, item.id).await, 7);

        let err = service.remove_from_cart(user, item.id, 4).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stock(&store, item.id).await, 7);
    }

    #[tokio::test]
    async fn test_add_with_out_of_range_total_writes_nothing() {
        let (store, service, item) = setup_priced(Money::from_cents(i64::MAX / 2), 10).await;
        let user = UserId::new();

        let err = service.add_to_cart(user, item.id, 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.get_cart(user).await.unwrap().is_none());
        assert_eq!(stock(&store, item.id).await, 10);
    }

    #[tokio::test]
    async fn test_overflow_on_existing_cart_keeps_stored_cart() {
        let (store, service, item) = setup_priced(Money::from_cents(i64::MAX / 4), 10).await;
        let user = UserId::new();
        let before = service.add_to_cart(user, item.id, 2).await.unwrap();

        let err = service.add_to_cart(user, item.id, 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(service.get_cart(user).await.unwrap(), Some(before));
        assert_eq!(stock(&store, item.id).await, 8);
    }

    #[tokio::test]
    async fn test_concurrent_adds_for_one_user_share_a_cart() {
        let (store, service, item) = setup(100).await;
        let user = UserId::new();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let item_id = item.id;
            tasks.push(tokio::spawn(async move {
                service.add_to_cart(user, item_id, 1).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = service.get_cart(user).await.unwrap().unwrap();
        assert_eq!(cart.line(item.id).unwrap().quantity, 8);
        assert_eq!(store.document_count(CARTS).await, 1);
        assert_eq!(stock(&store, item.id).await, 92);
    }

    #[tokio::test]
    async fn test_compensated_first_add_leaves_no_cart() {
        let (store, _, item) = setup(5).await;
        let (inventory, _worker) = InventoryActor::spawn(store.clone(), StockPolicy::Optimistic);
        let service = CartService::new(store.clone(), inventory, DualWritePolicy::Compensate);
        let user = UserId::new();
        store.fail_writes_on(ITEMS).await;

        let err = service.add_to_cart(user, item.id, 1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(service.get_cart(user).await.unwrap().is_none());
        assert_eq!(store.document_count(CARTS).await, 0);
    }
}
