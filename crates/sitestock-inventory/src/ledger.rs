use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sitestock_core::{
    AllocationError, AllocationResult, Batch, DomainEvent, DomainEventKind, EventEnvelope,
    EventStore,
};
use sitestock_eventstore::InMemoryEventStore;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::allocation::allocate;

pub type InMemoryLedger = StockLedger<InMemoryEventStore>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub batch_id: String,
    pub to_godown_id: String,
    pub to_godown_name: String,
    pub quantity: Decimal,
}

/// Per-item batch book. Every change is journaled to the event store before
/// it is applied.
pub struct StockLedger<S> {
    store: S,
    batches: RwLock<HashMap<String, Vec<Batch>>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(InMemoryEventStore::default())
    }
}

impl<S: EventStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            batches: RwLock::new(HashMap::new()),
        }
    }

    /// Records a purchased batch.
    pub async fn receive(&self, item_id: &str, batch: Batch) -> Result<(), AllocationError> {
        if batch.quantity_remaining <= Decimal::ZERO {
            return Err(AllocationError::InvalidQuantity(format!(
                "received quantity {} must be positive",
                batch.quantity_remaining
            )));
        }
        if batch.unit_price < Decimal::ZERO {
            return Err(AllocationError::InvalidInput(format!(
                "unit price {} is negative",
                batch.unit_price
            )));
        }

        let mut books = self.batches.write().await;
        let item_batches = books.entry(item_id.to_string()).or_default();
        if item_batches
            .iter()
            .any(|existing| existing.batch_id == batch.batch_id)
        {
            return Err(AllocationError::DuplicateBatch {
                item_id: item_id.to_string(),
                batch_id: batch.batch_id,
            });
        }

        self.journal(item_id, DomainEventKind::StockReceived, json!(batch))
            .await?;
        info!(
            item_id,
            batch_id = %batch.batch_id,
            quantity = %batch.quantity_remaining,
            "stock received"
        );
        item_batches.push(batch);

        Ok(())
    }

    pub async fn snapshot(&self, item_id: &str) -> Vec<Batch> {
        let books = self.batches.read().await;
        books.get(item_id).cloned().unwrap_or_default()
    }

    pub async fn preview(
        &self,
        item_id: &str,
        quantity: Decimal,
    ) -> Result<AllocationResult, AllocationError> {
        let books = self.batches.read().await;
        let batches = books.get(item_id).map(Vec::as_slice).unwrap_or_default();
        allocate(quantity, batches)
    }

    /// Applies an allocation computed from an earlier snapshot. Nothing is
    /// applied unless every line still fits the batch it draws from.
    pub async fn commit(
        &self,
        item_id: &str,
        result: &AllocationResult,
    ) -> Result<(), AllocationError> {
        if result.allocations.is_empty() {
            return Ok(());
        }

        let mut drawn: Vec<(&str, Decimal)> = Vec::new();
        for line in &result.allocations {
            match drawn.iter_mut().find(|(batch_id, _)| *batch_id == line.batch_id) {
                Some((_, quantity)) => *quantity += line.quantity,
                None => drawn.push((line.batch_id.as_str(), line.quantity)),
            }
        }

        let mut books = self.batches.write().await;
        let held = books.get(item_id).map(Vec::as_slice).unwrap_or_default();

        for (batch_id, quantity) in &drawn {
            let remaining = held
                .iter()
                .find(|batch| batch.batch_id == *batch_id)
                .map(|batch| batch.quantity_remaining)
                .unwrap_or(Decimal::ZERO);
            if remaining < *quantity {
                warn!(item_id, batch_id, %remaining, allocated = %quantity, "stale allocation refused");
                return Err(AllocationError::StaleAllocation {
                    item_id: item_id.to_string(),
                    batch_id: batch_id.to_string(),
                    allocated: *quantity,
                    remaining,
                });
            }
        }

        self.journal(
            item_id,
            DomainEventKind::StockIssued,
            json!({
                "allocations": result.allocations,
                "total_price": result.total_price,
            }),
        )
        .await?;

        if let Some(item_batches) = books.get_mut(item_id) {
            for (batch_id, quantity) in drawn {
                if let Some(batch) = item_batches
                    .iter_mut()
                    .find(|batch| batch.batch_id == batch_id)
                {
                    batch.quantity_remaining -= quantity;
                }
            }
        }
        info!(item_id, total_price = %result.total_price, "stock issued");

        Ok(())
    }

    /// Moves part of a batch to another godown. The split-off batch keeps the
    /// source's price and purchase date so it ages with its origin.
    pub async fn transfer(
        &self,
        item_id: &str,
        request: TransferRequest,
    ) -> Result<Batch, AllocationError> {
        if request.quantity <= Decimal::ZERO {
            return Err(AllocationError::InvalidQuantity(format!(
                "transfer quantity {} must be positive",
                request.quantity
            )));
        }

        let mut books = self.batches.write().await;
        let unknown = || AllocationError::UnknownBatch {
            item_id: item_id.to_string(),
            batch_id: request.batch_id.clone(),
        };
        let item_batches = books.get_mut(item_id).ok_or_else(unknown)?;
        let position = item_batches
            .iter()
            .position(|batch| batch.batch_id == request.batch_id)
            .ok_or_else(unknown)?;

        let source = &item_batches[position];
        if source.godown_id == request.to_godown_id {
            return Err(AllocationError::InvalidInput(format!(
                "batch {} is already in godown {}",
                source.batch_id, request.to_godown_id
            )));
        }
        if source.quantity_remaining < request.quantity {
            return Err(AllocationError::InsufficientStock {
                item_id: item_id.to_string(),
                requested: request.quantity,
                available: source.quantity_remaining,
            });
        }

        let moved = Batch {
            batch_id: Uuid::new_v4().to_string(),
            godown_id: request.to_godown_id.clone(),
            godown_name: request.to_godown_name.clone(),
            quantity_remaining: request.quantity,
            unit_price: source.unit_price,
            purchase_date: source.purchase_date,
        };

        self.journal(
            item_id,
            DomainEventKind::StockTransferred,
            json!({
                "from_batch_id": source.batch_id,
                "from_godown_id": source.godown_id,
                "to_batch_id": moved.batch_id,
                "to_godown_id": moved.godown_id,
                "quantity": request.quantity,
            }),
        )
        .await?;

        item_batches[position].quantity_remaining -= request.quantity;
        item_batches.insert(position + 1, moved.clone());
        info!(
            item_id,
            from = %request.batch_id,
            to_godown = %request.to_godown_id,
            quantity = %request.quantity,
            "stock transferred"
        );

        Ok(moved)
    }

    /// Items that have had stock received, in id order.
    pub async fn items(&self) -> Vec<String> {
        let books = self.batches.read().await;
        let mut items: Vec<String> = books.keys().cloned().collect();
        items.sort();
        items
    }

    /// Batches received for the item, newest purchase first.
    pub async fn purchase_history(&self, item_id: &str) -> Vec<Batch> {
        let mut history = self.snapshot(item_id).await;
        history.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        history
    }

    pub async fn movements(&self, item_id: &str) -> Result<Vec<EventEnvelope>, AllocationError> {
        Ok(self.store.stream(item_id).await?)
    }

    async fn journal(
        &self,
        item_id: &str,
        kind: DomainEventKind,
        payload: serde_json::Value,
    ) -> Result<EventEnvelope, AllocationError> {
        let event = DomainEvent::new(item_id, kind, payload);
        Ok(self.store.append(item_id, event).await?)
    }
}
