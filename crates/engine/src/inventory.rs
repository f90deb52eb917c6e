//! Single worker that applies stock deltas in arrival order.
//!
//! Every inventory change in the process goes through one [`InventoryActor`].
//! Callers hold an [`InventoryHandle`], submit a delta and wait for the
//! outcome on a per-request reply channel. The request queue holds a single
//! pending request, so submitters wait while the worker is busy. A failed
//! delta is reported to its submitter and the worker moves on.

use document_store::DocumentStore;
use domain::ItemId;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{EngineError, Result};
use crate::policy::StockPolicy;
use crate::repository::ItemRepository;

struct AdjustQuantity {
    item_id: ItemId,
    delta: i64,
    respond_to: oneshot::Sender<Result<()>>,
}

/// The worker side. Owns the item repository and drains the request queue.
pub struct InventoryActor<S> {
    items: ItemRepository<S>,
    policy: StockPolicy,
    receiver: mpsc::Receiver<AdjustQuantity>,
}

impl<S> InventoryActor<S>
where
    S: DocumentStore + 'static,
{
    /// Starts the worker on the current runtime.
    ///
    /// The worker stops once every handle has been dropped and the queue is
    /// drained; await the returned task to observe that.
    pub fn spawn(store: S, policy: StockPolicy) -> (InventoryHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(1);
        let actor = Self {
            items: ItemRepository::new(store),
            policy,
            receiver,
        };
        let task = tokio::spawn(actor.run());
        (InventoryHandle { sender }, task)
    }

    async fn run(mut self) {
        tracing::info!(policy = %self.policy, "inventory worker started");
        while let Some(request) = self.receiver.recv().await {
            let outcome = self.apply(request.item_id, request.delta).await;
            if let Err(ref e) = outcome {
                tracing::warn!(item_id = %request.item_id, delta = request.delta, error = %e, "inventory adjustment failed");
                metrics::counter!("inventory_adjustment_failures_total").increment(1);
            } else {
                metrics::counter!("inventory_adjustments_total").increment(1);
            }
            // The submitter may have stopped waiting.
            let _ = request.respond_to.send(outcome);
        }
        tracing::info!("inventory worker stopped");
    }

    async fn apply(&self, item_id: ItemId, delta: i64) -> Result<()> {
        let floor = match self.policy {
            StockPolicy::Guarded if delta < 0 => Some(-delta),
            _ => None,
        };

        match self.items.increment_quantity(item_id, delta, floor).await {
            Ok(()) => {
                tracing::debug!(%item_id, delta, "inventory adjusted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                // Under a floor, a miss means either no such item or too little stock.
                if floor.is_some() && self.items.exists(item_id).await? {
                    Err(EngineError::StockExhausted {
                        item_id,
                        requested: -delta,
                    })
                } else {
                    Err(EngineError::not_found("item", item_id))
                }
            }
            Err(e) => Err(EngineError::Store(e)),
        }
    }
}

/// Submits stock deltas to the inventory worker. Cheap to clone.
#[derive(Clone)]
pub struct InventoryHandle {
    sender: mpsc::Sender<AdjustQuantity>,
}

impl InventoryHandle {
    /// Adds `delta` to an item's stock and waits for the worker's verdict.
    ///
    /// Negative deltas draw stock down, positive ones return it.
    pub async fn adjust_quantity(&self, item_id: ItemId, delta: i64) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(AdjustQuantity {
                item_id,
                delta,
                respond_to,
            })
            .await
            .map_err(|_| EngineError::WorkerUnavailable)?;

        response.await.map_err(|_| EngineError::WorkerUnavailable)?
    }
}
