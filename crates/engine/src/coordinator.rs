//! Dual-write coordinator: persists a cart and adjusts stock concurrently.

use std::time::Instant;

use document_store::DocumentStore;
use domain::{Cart, ItemId};
use tokio::sync::mpsc;

use crate::error::{EngineError, Result};
use crate::inventory::InventoryHandle;
use crate::policy::DualWritePolicy;
use crate::repository::CartRepository;

/// One half of a dual write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Cart,
    Inventory,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Cart => "cart",
            Branch::Inventory => "inventory",
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the cart write and the inventory delta side by side.
///
/// Both branches always run to completion and report over a channel with
/// room for both results. The first failure to arrive is returned. Under
/// [`DualWritePolicy::AcceptPartial`] a surviving half stays applied; under
/// [`DualWritePolicy::Compensate`] it is reversed before the error is
/// returned.
#[derive(Clone)]
pub struct DualWriteCoordinator<S> {
    carts: CartRepository<S>,
    inventory: InventoryHandle,
    policy: DualWritePolicy,
}

impl<S> DualWriteCoordinator<S>
where
    S: DocumentStore + Clone + 'static,
{
    pub fn new(store: S, inventory: InventoryHandle, policy: DualWritePolicy) -> Self {
        Self {
            carts: CartRepository::new(store),
            inventory,
            policy,
        }
    }

    /// Persists `cart` and applies `delta` to the item's stock.
    ///
    /// `previous` is the stored cart as loaded before the mutation; the cart
    /// document must already exist.
    #[tracing::instrument(skip(self, previous, cart), fields(cart_id = %cart.id(), policy = %self.policy))]
    pub async fn commit(
        &self,
        previous: Cart,
        cart: Cart,
        item_id: ItemId,
        delta: i64,
    ) -> Result<()> {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<(Branch, Result<()>)>(2);

        let carts = self.carts.clone();
        let cart_tx = tx.clone();
        tokio::spawn(async move {
            let outcome = carts.save(&cart).await;
            let _ = cart_tx.send((Branch::Cart, outcome.map_err(EngineError::from))).await;
        });

        let inventory = self.inventory.clone();
        let inventory_tx = tx;
        tokio::spawn(async move {
            let outcome = inventory.adjust_quantity(item_id, delta).await;
            let _ = inventory_tx.send((Branch::Inventory, outcome)).await;
        });

        let mut cart_ok = false;
        let mut inventory_ok = false;
        let mut first_error = None;
        while let Some((branch, outcome)) = rx.recv().await {
            match outcome {
                Ok(()) => match branch {
                    Branch::Cart => cart_ok = true,
                    Branch::Inventory => inventory_ok = true,
                },
                Err(e) => {
                    tracing::warn!(%branch, error = %e, "dual write branch failed");
                    metrics::counter!("dual_write_failures_total", "branch" => branch.as_str())
                        .increment(1);
                    first_error.get_or_insert(e);
                }
            }
        }

        metrics::histogram!("dual_write_duration_seconds").record(started.elapsed().as_secs_f64());

        let Some(error) = first_error.or_else(|| {
            (!cart_ok || !inventory_ok)
                .then(|| EngineError::Aborted("dual write branch ended without reporting".into()))
        }) else {
            return Ok(());
        };

        if self.policy == DualWritePolicy::Compensate {
            if cart_ok && !inventory_ok {
                self.undo_cart(&previous).await;
            } else if inventory_ok && !cart_ok {
                self.undo_inventory(item_id, delta).await;
            }
        }

        Err(error)
    }

    async fn undo_cart(&self, previous: &Cart) {
        let outcome = self.carts.save(previous).await;
        self.record_compensation(Branch::Cart, outcome.map_err(EngineError::from));
    }

    async fn undo_inventory(&self, item_id: ItemId, delta: i64) {
        let outcome = self.inventory.adjust_quantity(item_id, -delta).await;
        self.record_compensation(Branch::Inventory, outcome);
    }

    fn record_compensation(&self, branch: Branch, outcome: Result<()>) {
        match outcome {
            Ok(()) => {
                tracing::info!(%branch, "dual write compensated");
                metrics::counter!("dual_write_compensations_total", "branch" => branch.as_str())
                    .increment(1);
            }
            Err(e) => {
                tracing::error!(%branch, error = %e, "dual write compensation failed");
            }
        }
    }
}
