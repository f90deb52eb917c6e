use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::value_objects::{CategoryId, Discount, ItemId, Money};

/// A catalog item and its inventory counter.
///
/// `quantity` is mutated only through atomic increments applied by the
/// inventory worker. It is signed because optimistic reservations can
/// overdraw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub price: Money,
    #[serde(default)]
    pub discount: Discount,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Builds a new item from a validated payload.
    pub fn create(payload: NewItem, slug: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::new(),
            name: payload.name,
            slug,
            description: payload.description,
            category_ids: payload.category_ids,
            price: payload.price,
            discount: payload.discount,
            quantity: payload.quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Captures the fields a cart mutation needs.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            price: self.price,
            discount: self.discount,
            available: self.quantity,
        }
    }
}

/// Point-in-time view of an item used when pricing a cart line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub price: Money,
    pub discount: Discount,
    /// Available quantity as read; may already be stale.
    pub available: i64,
}

impl ItemSnapshot {
    /// Returns the price per unit after discount.
    pub fn unit_price(&self) -> Money {
        if self.discount.is_active() {
            self.price.discounted(self.discount)
        } else {
            self.price
        }
    }
}

/// Payload for creating an item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub price: Money,
    #[serde(default)]
    pub discount: Discount,
    pub quantity: i64,
}

impl NewItem {
    /// Checks the payload's standalone invariants.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::NameRequired);
        }
        if !self.price.is_positive() {
            return Err(CatalogError::InvalidPrice {
                cents: self.price.cents(),
            });
        }
        if self.quantity < 0 {
            return Err(CatalogError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Partial update of an item's descriptive and pricing fields.
///
/// Stock is not patchable; it only changes through inventory deltas.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub price: Option<Money>,
    pub discount: Option<Discount>,
}

impl ItemPatch {
    /// Checks the supplied fields.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(CatalogError::NameRequired);
        }
        if let Some(price) = self.price
            && !price.is_positive()
        {
            return Err(CatalogError::InvalidPrice {
                cents: price.cents(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewItem {
        NewItem {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            category_ids: vec![],
            price: Money::from_dollars(100),
            discount: Discount::none(),
            quantity: 10,
        }
    }

    #[test]
    fn test_new_item_validation() {
        assert!(payload().validate().is_ok());

        let mut blank = payload();
        blank.name = "  ".to_string();
        assert_eq!(blank.validate(), Err(CatalogError::NameRequired));

        let mut free = payload();
        free.price = Money::zero();
        assert_eq!(free.validate(), Err(CatalogError::InvalidPrice { cents: 0 }));

        let mut negative = payload();
        negative.quantity = -1;
        assert_eq!(
            negative.validate(),
            Err(CatalogError::InvalidQuantity { quantity: -1 })
        );
    }

    #[test]
    fn test_snapshot_unit_price() {
        let mut item = Item::create(payload(), "widget".to_string(), Utc::now());
        assert_eq!(item.snapshot().unit_price().cents(), 10000);
        assert_eq!(item.snapshot().available, 10);

        item.discount = Discount::new(25.0).unwrap();
        assert_eq!(item.snapshot().unit_price().cents(), 7500);
    }

    #[test]
    fn test_item_deserializes_from_document() {
        let id = ItemId::new();
        let json = serde_json::json!({
            "_id": id.to_string(),
            "name": "Widget",
            "slug": "widget",
            "description": "",
            "price": 1999,
            "quantity": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });

        let item: Item = serde_json::from_value(json).unwrap();
        assert_eq!(item.id, id);
        assert_eq!(item.discount, Discount::none());
        assert!(item.category_ids.is_empty());
    }
}
