//! Typed access to the `carts`, `items`, `categories` and `reviews` collections.

use document_store::{
    DocumentStore, DocumentStoreError, DocumentStoreExt, Filter, Result, UpdateSpec,
};
use domain::{Cart, CartId, Category, CategoryId, Item, ItemId, Review, ReviewId, UserId};

pub const CARTS: &str = "carts";
pub const ITEMS: &str = "items";
pub const CATEGORIES: &str = "categories";
pub const REVIEWS: &str = "reviews";

const CLAIM_ATTEMPTS: u32 = 3;

/// Cart documents, one per user.
#[derive(Clone)]
pub struct CartRepository<S> {
    store: S,
}

impl<S: DocumentStore> CartRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the cart owned by a user.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        self.store
            .find_optional_as(CARTS, &Filter::new().eq_id("user_id", user_id))
            .await
    }

    pub async fn insert(&self, cart: &Cart) -> Result<()> {
        self.store.insert_as(CARTS, cart).await.map(|_| ())
    }

    /// Returns the user's cart, inserting an empty one if none exists yet.
    ///
    /// Cart ids are derived from the user id, so a concurrent creator makes
    /// the insert fail with `DuplicateId`; the winner's cart is then re-read.
    /// The flag is true when this call created the cart.
    pub async fn claim(&self, user_id: UserId) -> Result<(Cart, bool)> {
        let mut attempts = 0;
        loop {
            if let Some(cart) = self.find_by_user(user_id).await? {
                return Ok((cart, false));
            }
            let cart = Cart::for_user(user_id);
            match self.insert(&cart).await {
                Ok(()) => return Ok((cart, true)),
                Err(DocumentStoreError::DuplicateId { .. }) if attempts < CLAIM_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(%user_id, attempts, "cart created concurrently, re-reading");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Overwrites the lines, total and timestamp of an existing cart.
    pub async fn save(&self, cart: &Cart) -> Result<()> {
        let update = UpdateSpec::new()
            .set("line_items", serde_json::to_value(cart.line_items())?)
            .set("total_price", cart.total_price().cents())
            .set("updated_at", serde_json::to_value(cart.updated_at())?);
        self.store
            .update_one(CARTS, &Filter::by_id(cart.id()), &update)
            .await
    }

    pub async fn delete(&self, cart_id: CartId) -> Result<()> {
        self.store.delete_one(CARTS, &Filter::by_id(cart_id)).await
    }
}

/// Catalog items and their stock counters.
#[derive(Clone)]
pub struct ItemRepository<S> {
    store: S,
}

impl<S: DocumentStore> ItemRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get(&self, item_id: ItemId) -> Result<Option<Item>> {
        self.store
            .find_optional_as(ITEMS, &Filter::by_id(item_id))
            .await
    }

    pub async fn exists(&self, item_id: ItemId) -> Result<bool> {
        self.store.exists(ITEMS, &Filter::by_id(item_id)).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Item>> {
        self.store
            .find_optional_as(ITEMS, &Filter::new().eq("slug", slug))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Item>> {
        self.store.find_as(ITEMS, &Filter::new()).await
    }

    pub async fn insert(&self, item: &Item) -> Result<()> {
        self.store.insert_as(ITEMS, item).await.map(|_| ())
    }

    /// Writes every field except `quantity`, which belongs to the inventory
    /// worker.
    pub async fn save_details(&self, item: &Item) -> Result<()> {
        let update = UpdateSpec::new()
            .set("name", item.name.as_str())
            .set("slug", item.slug.as_str())
            .set("description", item.description.as_str())
            .set("category_ids", serde_json::to_value(&item.category_ids)?)
            .set("price", item.price.cents())
            .set("discount", item.discount.percent())
            .set("updated_at", serde_json::to_value(item.updated_at)?);
        self.store
            .update_one(ITEMS, &Filter::by_id(item.id), &update)
            .await
    }

    pub async fn delete(&self, item_id: ItemId) -> Result<()> {
        self.store.delete_one(ITEMS, &Filter::by_id(item_id)).await
    }

    /// Atomically adds `delta` to the stock counter.
    ///
    /// With `floor` set, the update only applies while the current quantity
    /// is at least `floor`; otherwise it reports `NotFound`.
    pub async fn increment_quantity(
        &self,
        item_id: ItemId,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<()> {
        let mut filter = Filter::by_id(item_id);
        if let Some(floor) = floor {
            filter = filter.gte("quantity", floor);
        }
        self.store
            .update_one(ITEMS, &filter, &UpdateSpec::new().inc("quantity", delta))
            .await
    }
}

/// Catalog categories.
#[derive(Clone)]
pub struct CategoryRepository<S> {
    store: S,
}

impl<S: DocumentStore> CategoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get(&self, category_id: CategoryId) -> Result<Option<Category>> {
        self.store
            .find_optional_as(CATEGORIES, &Filter::by_id(category_id))
            .await
    }

    pub async fn exists(&self, category_id: CategoryId) -> Result<bool> {
        self.store
            .exists(CATEGORIES, &Filter::by_id(category_id))
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.store
            .find_optional_as(CATEGORIES, &Filter::new().eq("name", name))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        self.store.find_as(CATEGORIES, &Filter::new()).await
    }

    pub async fn insert(&self, category: &Category) -> Result<()> {
        self.store.insert_as(CATEGORIES, category).await.map(|_| ())
    }

    pub async fn save(&self, category: &Category) -> Result<()> {
        let update = UpdateSpec::new()
            .set("name", category.name.as_str())
            .set("slug", category.slug.as_str())
            .set("description", category.description.as_str())
            .set("parent_ids", serde_json::to_value(&category.parent_ids)?)
            .set("updated_at", serde_json::to_value(category.updated_at)?);
        self.store
            .update_one(CATEGORIES, &Filter::by_id(category.id), &update)
            .await
    }

    pub async fn delete(&self, category_id: CategoryId) -> Result<()> {
        self.store
            .delete_one(CATEGORIES, &Filter::by_id(category_id))
            .await
    }
}

/// Item reviews, keyed by author and item.
#[derive(Clone)]
pub struct ReviewRepository<S> {
    store: S,
}

impl<S: DocumentStore> ReviewRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get(&self, review_id: ReviewId) -> Result<Option<Review>> {
        self.store
            .find_optional_as(REVIEWS, &Filter::by_id(review_id))
            .await
    }

    pub async fn list_for_item(&self, item_id: ItemId) -> Result<Vec<Review>> {
        self.store
            .find_as(REVIEWS, &Filter::new().eq_id("item_id", item_id))
            .await
    }

    pub async fn insert(&self, review: &Review) -> Result<()> {
        self.store.insert_as(REVIEWS, review).await.map(|_| ())
    }

    /// Overwrites rating, text, visibility and timestamp of an existing review.
    pub async fn save(&self, review: &Review) -> Result<()> {
        let update = UpdateSpec::new()
            .set("stars", review.stars)
            .set("content", review.content.as_str())
            .set("anonymous", review.anonymous)
            .set("updated_at", serde_json::to_value(review.updated_at)?);
        self.store
            .update_one(REVIEWS, &Filter::by_id(review.id), &update)
            .await
    }
}
