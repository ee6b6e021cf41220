use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A received lot of one item held in a godown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Batch {
    pub batch_id: String,
    pub godown_id: String,
    pub godown_name: String,
    pub quantity_remaining: Decimal,
    pub unit_price: Decimal,
    pub purchase_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchAllocation {
    pub batch_id: String,
    pub godown_id: String,
    pub godown_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationResult {
    pub allocations: Vec<BatchAllocation>,
    pub total_price: Decimal,
    pub fully_satisfied: bool,
}

impl AllocationResult {
    pub fn allocated_quantity(&self) -> Decimal {
        self.allocations.iter().map(|line| line.quantity).sum()
    }
}

/// A quantity of one item to spread over that item's batches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationRequest {
    pub item_id: String,
    pub requested_quantity: Decimal,
    pub batches: Vec<Batch>,
}
