//! Item and category writes. Referenced categories are checked through the
//! validation fan-out before anything is written.

use chrono::Utc;
use document_store::DocumentStore;
use domain::{
    CatalogError, Category, CategoryId, CategoryPatch, Item, ItemId, ItemPatch, NewCategory,
    NewItem, slugify,
};

use crate::error::{EngineError, Result};
use crate::fanout::verify_all_exist;
use crate::repository::{CategoryRepository, ItemRepository};

#[derive(Clone)]
pub struct CatalogService<S> {
    items: ItemRepository<S>,
    categories: CategoryRepository<S>,
}

impl<S> CatalogService<S>
where
    S: DocumentStore + Clone + 'static,
{
    pub fn new(store: S) -> Self {
        Self {
            items: ItemRepository::new(store.clone()),
            categories: CategoryRepository::new(store),
        }
    }

    async fn verify_categories(&self, ids: &[CategoryId]) -> Result<()> {
        let categories = self.categories.clone();
        verify_all_exist(ids, "category", move |id| {
            let categories = categories.clone();
            async move { categories.exists(id).await }
        })
        .await
    }

    #[tracing::instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_category(&self, payload: NewCategory) -> Result<Category> {
        payload.validate()?;
        if self.categories.find_by_name(&payload.name).await?.is_some() {
            return Err(CatalogError::CategoryAlreadyExists {
                name: payload.name,
            }
            .into());
        }
        self.verify_categories(&payload.parent_ids).await?;

        let slug = slugify(&payload.name);
        let category = Category::create(payload, slug, Utc::now());
        self.categories.insert(&category).await?;

        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category> {
        patch.validate(id)?;
        let mut category = self.get_category(id).await?;

        if let Some(parent_ids) = &patch.parent_ids {
            self.verify_categories(parent_ids).await?;
        }
        if let Some(name) = patch.name {
            if let Some(other) = self.categories.find_by_name(&name).await?
                && other.id != id
            {
                return Err(CatalogError::CategoryAlreadyExists { name }.into());
            }
            category.slug = slugify(&name);
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        if let Some(parent_ids) = patch.parent_ids {
            category.parent_ids = parent_ids;
        }
        category.updated_at = Utc::now();

        self.categories.save(&category).await?;
        Ok(category)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.categories
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("category", id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.list().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        match self.categories.delete(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(EngineError::not_found("category", id)),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_item(&self, payload: NewItem) -> Result<Item> {
        payload.validate()?;
        self.verify_categories(&payload.category_ids).await?;

        let slug = self.unique_item_slug(&payload.name, None).await?;
        let item = Item::create(payload, slug, Utc::now());
        self.items.insert(&item).await?;

        tracing::info!(item_id = %item.id, slug = %item.slug, "item created");
        Ok(item)
    }

    /// Applies a patch to an item's details. Stock is never written here.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item> {
        patch.validate()?;
        let mut item = self.get_item(id).await?;

        if let Some(category_ids) = patch.category_ids {
            self.verify_categories(&category_ids).await?;
            item.category_ids = category_ids;
        }
        if let Some(name) = patch.name
            && name != item.name
        {
            item.slug = self.unique_item_slug(&name, Some(id)).await?;
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(discount) = patch.discount {
            item.discount = discount;
        }
        item.updated_at = Utc::now();

        self.items.save_details(&item).await?;
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Item> {
        self.items
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("item", id))
    }

    pub async fn get_item_by_slug(&self, slug: &str) -> Result<Item> {
        self.items
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| EngineError::not_found("item", slug))
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        Ok(self.items.list().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        match self.items.delete(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(EngineError::not_found("item", id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Slug for `name`, suffixed with a fresh id if another item holds it.
    async fn unique_item_slug(&self, name: &str, owner: Option<ItemId>) -> Result<String> {
        let slug = slugify(name);
        match self.items.find_by_slug(&slug).await? {
            Some(existing) if Some(existing.id) != owner => Ok(format!("{slug}-{}", ItemId::new())),
            _ => Ok(slug),
        }
    }
}
