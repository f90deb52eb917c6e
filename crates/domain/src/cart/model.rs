//! Cart document and line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CartError;
use crate::catalog::ItemSnapshot;
use crate::value_objects::{CartId, ItemId, Money, UserId};

/// One item-and-quantity entry within a cart.
///
/// The unit price is captured when the item is added, after discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The referenced catalog item.
    pub item_id: ItemId,

    /// Units held in the cart; always positive.
    pub quantity: u32,

    /// Price per unit as captured at add time.
    pub unit_price: Money,

    /// `unit_price * quantity`.
    pub total_price: Money,
}

impl LineItem {
    fn priced(item_id: ItemId, quantity: u32, unit_price: Money) -> Result<Self, CartError> {
        Ok(Self {
            item_id,
            quantity,
            unit_price,
            total_price: line_total(item_id, unit_price, quantity)?,
        })
    }
}

fn line_total(item_id: ItemId, unit_price: Money, quantity: u32) -> Result<Money, CartError> {
    unit_price
        .checked_multiply(quantity)
        .ok_or(CartError::AmountOverflow { item_id })
}

/// A shopper's cart.
///
/// Holds at most one line per item. The aggregate total is recomputed from
/// the lines on every mutation and therefore always equals their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id")]
    id: CartId,

    user_id: UserId,

    /// Lines in the order they were first added.
    line_items: Vec<LineItem>,

    total_price: Money,

    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    ///
    /// The cart id is derived from the user id, so a user can own at most one
    /// cart document.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            id: CartId::from_uuid(user_id.document_id().as_uuid()),
            user_id,
            line_items: Vec::new(),
            total_price: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Returns the cart ID.
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the line items in order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Returns the line for an item, if present.
    pub fn line(&self, item_id: ItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|line| line.item_id == item_id)
    }

    /// Returns the aggregate total.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the last modification time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Stamps the modification time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Adds `quantity` units of an item.
    ///
    /// The unit price is taken from the snapshot (discount applied) and the
    /// whole line is re-priced at it, including units added earlier at a
    /// different price. The request is checked against the snapshot's
    /// available quantity only; the check is not repeated when stock is
    /// later decremented. Amounts that overflow leave the cart unchanged.
    pub fn add(&mut self, item: &ItemSnapshot, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }
        if i64::from(quantity) > item.available {
            return Err(CartError::InsufficientInventory {
                item_id: item.id,
                requested: quantity,
                available: item.available,
            });
        }

        let unit_price = item.unit_price();
        let mut lines = self.line_items.clone();
        match lines.iter_mut().find(|line| line.item_id == item.id) {
            Some(line) => {
                let merged = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::AmountOverflow { item_id: item.id })?;
                line.total_price = line_total(item.id, unit_price, merged)?;
                line.quantity = merged;
                line.unit_price = unit_price;
            }
            None => lines.push(LineItem::priced(item.id, quantity, unit_price)?),
        }

        self.replace_lines(lines, item.id)
    }

    /// Removes `quantity` units of an item, dropping the line when it empties.
    ///
    /// The remaining units keep their captured unit price.
    pub fn remove(&mut self, item_id: ItemId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }

        let position = self
            .line_items
            .iter()
            .position(|line| line.item_id == item_id)
            .ok_or(CartError::ItemNotInCart { item_id })?;

        let line = &self.line_items[position];
        if quantity > line.quantity {
            return Err(CartError::RemoveExceedsQuantity {
                requested: quantity,
                present: line.quantity,
            });
        }

        let remaining = line.quantity - quantity;
        let mut lines = self.line_items.clone();
        if remaining == 0 {
            lines.remove(position);
        } else {
            let line = &mut lines[position];
            line.total_price = line_total(item_id, line.unit_price, remaining)?;
            line.quantity = remaining;
        }

        self.replace_lines(lines, item_id)
    }

    /// Installs new lines and their total, leaving the cart untouched if the
    /// total does not fit.
    fn replace_lines(&mut self, lines: Vec<LineItem>, item_id: ItemId) -> Result<(), CartError> {
        let total = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.total_price))
            .ok_or(CartError::AmountOverflow { item_id })?;
        self.line_items = lines;
        self.total_price = total;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Discount;

    fn snapshot(price_cents: i64, discount: f64, available: i64) -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId::new(),
            price: Money::from_cents(price_cents),
            discount: Discount::new(discount).unwrap(),
            available,
        }
    }

    #[test]
    fn test_add_to_empty_cart_creates_line() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(10000, 0.0, 10);

        cart.add(&item, 3).unwrap();

        assert_eq!(cart.line_items().len(), 1);
        let line = cart.line(item.id).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.total_price.cents(), 30000);
        assert_eq!(cart.total_price().cents(), 30000);
    }

    #[test]
    fn test_repeated_add_merges_into_one_line() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(250, 0.0, 10);

        cart.add(&item, 2).unwrap();
        cart.add(&item, 3).unwrap();

        assert_eq!(cart.line_items().len(), 1);
        let line = cart.line(item.id).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.total_price.cents(), 250 * 5);
    }

    #[test]
    fn test_later_add_reprices_whole_line() {
        let mut cart = Cart::for_user(UserId::new());
        let mut item = snapshot(10000, 0.0, 10);
        cart.add(&item, 3).unwrap();

        // Discount changes between adds: all five units end up at the new price.
        item.discount = Discount::new(10.0).unwrap();
        cart.add(&item, 2).unwrap();

        let line = cart.line(item.id).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.unit_price.cents(), 9000);
        assert_eq!(line.total_price.cents(), 45000);
        assert_eq!(cart.total_price().cents(), 45000);
    }

    #[test]
    fn test_add_rejects_more_than_available() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(100, 0.0, 2);

        let err = cart.add(&item, 3).unwrap_err();
        assert!(matches!(err, CartError::InsufficientInventory { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::for_user(UserId::new());
        let err = cart.add(&snapshot(100, 0.0, 5), 0).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity { quantity: 0 });
    }

    #[test]
    fn test_remove_partial_keeps_unit_price() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(333, 0.0, 10);
        cart.add(&item, 4).unwrap();

        cart.remove(item.id, 1).unwrap();

        let line = cart.line(item.id).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.total_price.cents(), 999);
        assert_eq!(cart.total_price().cents(), 999);
    }

    #[test]
    fn test_remove_full_quantity_deletes_line() {
        let mut cart = Cart::for_user(UserId::new());
        let first = snapshot(100, 0.0, 10);
        let second = snapshot(500, 0.0, 10);
        cart.add(&first, 2).unwrap();
        cart.add(&second, 1).unwrap();

        cart.remove(first.id, 2).unwrap();

        assert!(cart.line(first.id).is_none());
        assert_eq!(cart.line_items().len(), 1);
        assert_eq!(cart.total_price().cents(), 500);
    }

    #[test]
    fn test_remove_errors() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(100, 0.0, 10);
        cart.add(&item, 2).unwrap();

        let missing = ItemId::new();
        assert_eq!(
            cart.remove(missing, 1).unwrap_err(),
            CartError::ItemNotInCart { item_id: missing }
        );
        assert_eq!(
            cart.remove(item.id, 3).unwrap_err(),
            CartError::RemoveExceedsQuantity {
                requested: 3,
                present: 2
            }
        );
        assert_eq!(cart.line(item.id).unwrap().quantity, 2);
    }

    #[test]
    fn test_cart_id_follows_user() {
        let user = UserId::new();
        assert_eq!(Cart::for_user(user).id(), Cart::for_user(user).id());
        assert_ne!(Cart::for_user(user).id(), Cart::for_user(UserId::new()).id());
    }

    #[test]
    fn test_line_total_overflow_leaves_cart_untouched() {
        let mut cart = Cart::for_user(UserId::new());
        let cheap = snapshot(100, 0.0, 10);
        cart.add(&cheap, 1).unwrap();
        let before = cart.clone();

        let pricey = snapshot(i64::MAX / 2, 0.0, 10);
        assert_eq!(
            cart.add(&pricey, 3).unwrap_err(),
            CartError::AmountOverflow { item_id: pricey.id }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_merged_line_overflow_leaves_cart_untouched() {
        let mut cart = Cart::for_user(UserId::new());
        let item = snapshot(1, 0.0, i64::MAX);
        cart.add(&item, u32::MAX).unwrap();
        let before = cart.clone();

        assert_eq!(
            cart.add(&item, 1).unwrap_err(),
            CartError::AmountOverflow { item_id: item.id }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_cart_total_overflow_leaves_cart_untouched() {
        let mut cart = Cart::for_user(UserId::new());
        let first = snapshot(i64::MAX / 2, 0.0, 10);
        cart.add(&first, 1).unwrap();
        cart.add(&snapshot(i64::MAX / 2, 0.0, 10), 1).unwrap();
        let before = cart.clone();

        let third = snapshot(i64::MAX / 2, 0.0, 10);
        assert_eq!(
            cart.add(&third, 1).unwrap_err(),
            CartError::AmountOverflow { item_id: third.id }
        );
        assert_eq!(cart, before);
        assert_eq!(cart.total_price().cents(), i64::MAX - 1);
    }

    #[test]
    fn test_cart_document_shape() {
        let mut cart = Cart::for_user(UserId::new());
        cart.add(&snapshot(100, 0.0, 10), 1).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["_id"], cart.id().to_string());
        assert_eq!(json["user_id"], cart.user_id().to_string());
        assert_eq!(json["total_price"], 100);
        assert_eq!(json["line_items"][0]["quantity"], 1);

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
